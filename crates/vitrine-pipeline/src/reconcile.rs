//! Seeding an edit draft with the images already stored for the record.

use std::sync::Arc;
use vitrine_core::{ImageBuffer, UploadOutcome};
use vitrine_processing::Transcode;

use crate::draft::DraftMediaSet;
use crate::source::AssetSource;

/// Running record of the stored URLs known to an edit flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteLedger {
    image_urls: Vec<String>,
    thumbnail_urls: Vec<String>,
}

impl RemoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }

    pub fn thumbnail_urls(&self) -> &[String] {
        &self.thumbnail_urls
    }

    pub fn contains(&self, url: &str) -> bool {
        self.image_urls.iter().chain(&self.thumbnail_urls).any(|u| u == url)
    }

    fn record_image(&mut self, url: &str) {
        if !self.image_urls.iter().any(|u| u == url) {
            self.image_urls.push(url.to_string());
        }
    }

    fn record_thumbnail(&mut self, url: &str) {
        if !self.thumbnail_urls.iter().any(|u| u == url) {
            self.thumbnail_urls.push(url.to_string());
        }
    }

    /// Stored URLs no longer referenced once `outcome` is committed.
    pub fn superseded_by(&self, outcome: &UploadOutcome) -> Vec<String> {
        self.image_urls
            .iter()
            .chain(&self.thumbnail_urls)
            .filter(|url| !outcome.contains(url))
            .cloned()
            .collect()
    }
}

/// What one reconciliation did with each URL it considered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Slot index and URL of every image placed into the draft
    pub placed: Vec<(usize, String)>,
    /// URLs whose fetch or decode failed
    pub failed: Vec<String>,
    /// URLs skipped because the draft had no free slot left
    pub dropped: Vec<String>,
    /// Thumbnail URLs not previously known to the ledger
    pub new_thumbnail_urls: Vec<String>,
}

pub struct RemoteReconciler {
    source: Arc<dyn AssetSource>,
    transcoder: Arc<dyn Transcode>,
}

impl RemoteReconciler {
    pub fn new(source: Arc<dyn AssetSource>, transcoder: Arc<dyn Transcode>) -> Self {
        Self { source, transcoder }
    }

    /// Place stored images not yet represented in `draft` into its free slots.
    ///
    /// URLs are processed in list order; once the draft is full the rest are
    /// dropped. Stored images skip moderation. Every URL considered, whether
    /// placed or not, is recorded in `ledger`.
    #[tracing::instrument(skip_all, fields(existing = existing_urls.len()))]
    pub async fn reconcile(
        &self,
        existing_urls: &[String],
        existing_thumbnail_urls: &[String],
        draft: &DraftMediaSet,
        ledger: &mut RemoteLedger,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if draft.is_disposed() {
            return report;
        }

        let represented = draft.remote_urls().await;
        let new_image_urls: Vec<&String> = existing_urls
            .iter()
            .filter(|url| !represented.contains(*url))
            .collect();

        for url in existing_thumbnail_urls {
            if !ledger.thumbnail_urls.contains(url) && !report.new_thumbnail_urls.contains(url) {
                report.new_thumbnail_urls.push(url.clone());
            }
        }

        for url in new_image_urls {
            if draft.is_disposed() {
                break;
            }
            ledger.record_image(url);

            if draft.free_capacity().await == 0 {
                tracing::debug!(url = %url, "Draft full, dropping stored image");
                report.dropped.push(url.clone());
                continue;
            }

            let data = match self.source.fetch(url).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to fetch stored image");
                    report.failed.push(url.clone());
                    continue;
                }
            };

            if let Err(e) = self.transcoder.inspect(data.clone()).await {
                tracing::warn!(url = %url, error = %e, "Stored image could not be decoded");
                report.failed.push(url.clone());
                continue;
            }

            match draft.place_remote(url, ImageBuffer::new(data)).await {
                Some(index) => {
                    tracing::debug!(slot = index, url = %url, "Stored image placed");
                    report.placed.push((index, url.clone()));
                }
                None => report.dropped.push(url.clone()),
            }
        }

        if !draft.is_disposed() {
            for url in &report.new_thumbnail_urls {
                ledger.record_thumbnail(url);
            }
        }

        tracing::info!(
            placed = report.placed.len(),
            failed = report.failed.len(),
            dropped = report.dropped.len(),
            thumbnails = report.new_thumbnail_urls.len(),
            "Reconciliation complete"
        );

        report
    }
}
