//! Best-effort removal of stored objects that a committed edit no longer references.

use vitrine_storage::Storage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
    /// URLs this storage backend does not serve
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Delete every object behind `urls`. Failures are logged and do not stop
/// the remaining deletions.
#[tracing::instrument(skip_all, fields(urls = urls.len()))]
pub async fn purge_urls(storage: &dyn Storage, urls: &[String]) -> PurgeReport {
    let mut report = PurgeReport::default();

    for url in urls {
        let Some(location) = storage.locate(url) else {
            tracing::warn!(url = %url, "URL not served by this storage backend, skipping");
            report.skipped.push(url.clone());
            continue;
        };

        match storage.delete(&location).await {
            Ok(()) => {
                tracing::info!(bucket = %location.bucket, key = %location.key, "Deleted superseded object");
                report.deleted.push(url.clone());
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %location.bucket,
                    key = %location.key,
                    "Failed to delete superseded object"
                );
                report.failed.push(url.clone());
            }
        }
    }

    tracing::info!(
        deleted = report.deleted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Purge completed"
    );

    report
}
