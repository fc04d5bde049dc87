//! Where picked and previously stored images are read from.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use vitrine_core::{MediaError, MediaResult, SourceRef};
use vitrine_storage::Storage;

/// Reads the raw bytes behind a [`SourceRef`].
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Read a user-picked asset.
    async fn read_asset(&self, location: &str) -> MediaResult<Bytes>;

    /// Download an image that is already stored remotely.
    async fn fetch(&self, url: &str) -> MediaResult<Bytes>;

    async fn read_bytes(&self, source: &SourceRef) -> MediaResult<Bytes> {
        match source {
            SourceRef::Asset(location) => self.read_asset(location).await,
            SourceRef::Remote(url) => self.fetch(url).await,
        }
    }
}

/// Assets are local files. Remote images are downloaded through the
/// object store when it serves the URL, and fetched over HTTP(S) otherwise.
#[derive(Clone)]
pub struct FsHttpAssetSource {
    http_client: reqwest::Client,
    storage: Option<Arc<dyn Storage>>,
}

impl FsHttpAssetSource {
    pub fn new(fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self {
            http_client,
            storage: None,
        })
    }

    /// Read URLs that `storage` resolves straight from the store.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

#[async_trait]
impl AssetSource for FsHttpAssetSource {
    async fn read_asset(&self, location: &str) -> MediaResult<Bytes> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::asset_load(location, e))?;
        Ok(Bytes::from(data))
    }

    async fn fetch(&self, url: &str) -> MediaResult<Bytes> {
        let start = std::time::Instant::now();

        if let Some((storage, location)) = self
            .storage
            .as_ref()
            .and_then(|storage| Some((storage, storage.locate(url)?)))
        {
            let data = storage
                .download(&location)
                .await
                .map_err(|e| MediaError::asset_load(url, e))?;
            tracing::debug!(
                bucket = %location.bucket,
                key = %location.key,
                size_bytes = data.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Downloaded stored image"
            );
            return Ok(Bytes::from(data));
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| MediaError::asset_load(url, e))?;

        let data = response
            .bytes()
            .await
            .map_err(|e| MediaError::asset_load(url, e))?;

        tracing::debug!(
            url = %url,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched remote image"
        );

        Ok(data)
    }
}
