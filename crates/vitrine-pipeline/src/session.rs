//! One submit attempt: transcode and upload every occupied slot, then the thumbnail.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use vitrine_core::{
    MediaError, MediaProfile, MediaResult, OccupiedSlot, TranscodeTarget, UploadDestination,
    UploadOutcome,
};
use vitrine_processing::Transcode;
use vitrine_storage::keys::unique_filename;
use vitrine_storage::{ObjectLocation, Storage};

use crate::draft::DraftMediaSet;

const THUMBNAIL_PREFIX: &str = "thumb_";

/// Uploads are strictly sequential. Nothing is rolled back on failure: URLs
/// of images uploaded before the failing one stay readable through
/// [`UploadSession::uploaded_image_urls`]. A session runs at most once; retry
/// with a fresh session.
pub struct UploadSession {
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn Transcode>,
    profile: MediaProfile,
    cancel: CancellationToken,
    progress_tx: watch::Sender<f64>,
    progress: f64,
    uploaded_image_urls: Vec<String>,
    thumbnail_url: Option<String>,
    used: bool,
}

impl UploadSession {
    pub fn new(
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn Transcode>,
        profile: MediaProfile,
    ) -> Self {
        let (progress_tx, _) = watch::channel(0.0);
        Self {
            storage,
            transcoder,
            profile,
            cancel: CancellationToken::new(),
            progress_tx,
            progress: 0.0,
            uploaded_image_urls: Vec::new(),
            thumbnail_url: None,
            used: false,
        }
    }

    /// Session that stops when `draft` is disposed.
    pub fn for_draft(
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn Transcode>,
        draft: &DraftMediaSet,
    ) -> Self {
        let mut session = Self::new(storage, transcoder, draft.profile().clone());
        session.cancel = draft.cancellation_token().child_token();
        session
    }

    /// Receiver observing the session's progress value.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.progress_tx.subscribe()
    }

    /// Stop issuing uploads. The current upload, if any, still completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn uploaded_image_urls(&self) -> &[String] {
        &self.uploaded_image_urls
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    /// Upload the occupied slots of `draft`.
    pub async fn run_draft(
        &mut self,
        draft: &DraftMediaSet,
        destination: &UploadDestination,
    ) -> MediaResult<UploadOutcome> {
        let slots = draft.occupied_slots().await;
        self.run(&slots, destination).await
    }

    /// Upload `slots` in ascending index order, then one thumbnail derived
    /// from the lowest-index slot.
    #[tracing::instrument(
        skip_all,
        fields(
            profile = %self.profile.name,
            bucket = %destination.bucket,
            folder = %destination.folder,
            slots = slots.len()
        )
    )]
    pub async fn run(
        &mut self,
        slots: &[OccupiedSlot],
        destination: &UploadDestination,
    ) -> MediaResult<UploadOutcome> {
        if self.used {
            return Err(MediaError::SessionReused);
        }
        self.used = true;

        if slots.is_empty() {
            return Ok(UploadOutcome::default());
        }

        let start = std::time::Instant::now();
        let mut ordered: Vec<&OccupiedSlot> = slots.iter().collect();
        ordered.sort_by_key(|slot| slot.index);

        let step = self.profile.progress.image_phase / ordered.len() as f64;
        for slot in &ordered {
            let url = self
                .transcode_and_upload(slot, self.profile.image, destination, "")
                .await?;
            self.uploaded_image_urls.push(url);
            self.advance(step);
        }

        let first = ordered[0];
        let thumbnail_url = self
            .transcode_and_upload(first, self.profile.thumbnail, destination, THUMBNAIL_PREFIX)
            .await?;
        self.thumbnail_url = Some(thumbnail_url.clone());
        self.advance(self.profile.progress.thumbnail);

        tracing::info!(
            images = self.uploaded_image_urls.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload session complete"
        );

        Ok(UploadOutcome {
            image_urls: self.uploaded_image_urls.clone(),
            thumbnail_url: Some(thumbnail_url),
        })
    }

    async fn transcode_and_upload(
        &self,
        slot: &OccupiedSlot,
        target: TranscodeTarget,
        destination: &UploadDestination,
        prefix: &str,
    ) -> MediaResult<String> {
        self.ensure_not_cancelled()?;

        let encoded = self
            .transcoder
            .transcode(slot.image.data().clone(), target)
            .await
            .map_err(|e| {
                tracing::error!(slot = slot.index, error = %e, "Transcode failed");
                MediaError::from(e)
            })?;

        self.ensure_not_cancelled()?;

        let filename = format!("{}{}", prefix, unique_filename(target.format.extension()));
        let location = ObjectLocation::new(
            destination.bucket.clone(),
            destination.object_key(&filename),
        );

        let url = self
            .storage
            .upload(&location, encoded.to_vec(), target.format.to_mime_type())
            .await
            .map_err(|e| {
                tracing::error!(
                    slot = slot.index,
                    bucket = %location.bucket,
                    key = %location.key,
                    error = %e,
                    "Upload failed"
                );
                MediaError::UploadFailure(e.to_string())
            })?;

        tracing::debug!(slot = slot.index, url = %url, "Slot uploaded");
        Ok(url)
    }

    fn ensure_not_cancelled(&self) -> MediaResult<()> {
        if self.cancel.is_cancelled() {
            tracing::info!(
                uploaded = self.uploaded_image_urls.len(),
                "Upload session cancelled"
            );
            return Err(MediaError::Cancelled);
        }
        Ok(())
    }

    fn advance(&mut self, amount: f64) {
        self.progress += amount;
        if !self.cancel.is_cancelled() {
            self.progress_tx.send_replace(self.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{png_bytes, png_sized, MemoryStorage};
    use vitrine_core::{ImageBuffer, SourceRef};
    use vitrine_processing::ImageTranscoder;

    fn slot(index: usize, seed: u8) -> OccupiedSlot {
        OccupiedSlot {
            index,
            image: ImageBuffer::new(png_bytes(seed)),
            source: SourceRef::asset(format!("asset-{}", seed)),
        }
    }

    fn session(storage: &Arc<MemoryStorage>) -> UploadSession {
        UploadSession::new(
            storage.clone(),
            Arc::new(ImageTranscoder::new()),
            MediaProfile::listing(),
        )
    }

    fn destination() -> UploadDestination {
        UploadDestination::new("listing-images", "user-1")
    }

    #[tokio::test]
    async fn test_empty_run_makes_no_store_calls() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);

        let outcome = session.run(&[], &destination()).await.unwrap();

        assert_eq!(outcome, UploadOutcome::default());
        assert_eq!(storage.attempts(), 0);
        assert_eq!(session.progress(), 0.0);
    }

    #[tokio::test]
    async fn test_run_uploads_images_then_one_thumbnail() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);

        let outcome = session
            .run(&[slot(0, 1), slot(4, 2)], &destination())
            .await
            .unwrap();

        assert_eq!(outcome.image_urls.len(), 2);
        let thumbnail = outcome.thumbnail_url.clone().unwrap();
        assert_eq!(storage.attempts(), 3);

        let keys: Vec<String> = storage.uploaded().into_iter().map(|l| l.key).collect();
        assert!(keys.iter().all(|k| k.starts_with("user-1/")));
        assert!(keys[2].starts_with("user-1/thumb_"));
        assert!(keys[2].ends_with(".jpg"));
        assert_eq!(storage.content_type(&thumbnail).as_deref(), Some("image/jpeg"));

        assert!((session.progress() - 1.0).abs() < 1e-9);
        assert_eq!(session.uploaded_image_urls(), &outcome.image_urls[..]);
        assert_eq!(session.thumbnail_url(), Some(thumbnail.as_str()));
    }

    #[tokio::test]
    async fn test_images_are_scaled_to_profile_targets() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);
        let big = OccupiedSlot {
            index: 0,
            image: ImageBuffer::new(png_sized(2400, 1200, 3)),
            source: SourceRef::asset("big"),
        };

        let outcome = session.run(&[big], &destination()).await.unwrap();

        let image = storage.object(&outcome.image_urls[0]).unwrap();
        let thumbnail = storage
            .object(outcome.thumbnail_url.as_deref().unwrap())
            .unwrap();
        assert_eq!(image::load_from_memory(&image).unwrap().width(), 1200);
        assert_eq!(image::load_from_memory(&thumbnail).unwrap().width(), 400);
    }

    #[tokio::test]
    async fn test_slots_are_uploaded_in_index_order() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);
        let slots = [slot(5, 10), slot(1, 11)];

        let outcome = session.run(&slots, &destination()).await.unwrap();

        let first_upload = storage.object(&outcome.image_urls[0]).unwrap();
        let expected = ImageTranscoder::transcode_blocking(
            slots[1].image.data(),
            &MediaProfile::listing().image,
        )
        .unwrap();
        assert_eq!(first_upload, expected.to_vec());
    }

    #[tokio::test]
    async fn test_second_run_is_refused() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);
        session.run(&[slot(0, 1)], &destination()).await.unwrap();

        let result = session.run(&[slot(0, 1)], &destination()).await;
        assert_eq!(result, Err(MediaError::SessionReused));
        assert_eq!(storage.attempts(), 2);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_fails_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail_upload_at(2);
        let mut session = session(&storage);

        let result = session
            .run(&[slot(0, 1), slot(1, 2)], &destination())
            .await;

        assert!(matches!(result, Err(MediaError::UploadFailure(_))));
        assert_eq!(session.uploaded_image_urls().len(), 2);
        assert_eq!(session.thumbnail_url(), None);
        assert!((session.progress() - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_transcode_failure() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);
        let data = png_bytes(1);
        let broken = OccupiedSlot {
            index: 0,
            image: ImageBuffer::new(data.slice(..data.len() / 2)),
            source: SourceRef::asset("broken"),
        };

        let result = session.run(&[broken], &destination()).await;

        assert!(matches!(result, Err(MediaError::TranscodeFailure(_))));
        assert_eq!(storage.attempts(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = session(&storage);
        let mut progress = session.subscribe();
        session.cancel();

        let result = session.run(&[slot(0, 1)], &destination()).await;

        assert_eq!(result, Err(MediaError::Cancelled));
        assert_eq!(storage.attempts(), 0);
        assert!(!progress.has_changed().unwrap());
    }
}
