use crate::keys::{decode_key, encode_key, validate_bucket, validate_key};
use crate::traits::{ObjectLocation, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// S3 storage implementation
///
/// One `AmazonS3` client is built lazily per bucket and cached.
pub struct S3Storage {
    stores: Mutex<HashMap<String, AmazonS3>>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://nyc3.digitaloceanspaces.com" for DigitalOcean Spaces)
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            stores: Mutex::new(HashMap::new()),
            region,
            endpoint_url: endpoint_url.map(|e| e.trim_end_matches('/').to_string()),
        }
    }

    /// Get or build the client for `bucket`
    async fn store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        validate_bucket(bucket)?;

        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        // Credentials come from the standard AWS environment variables
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

/// Public URL for an S3 object
///
/// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
/// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
fn object_url(region: &str, endpoint_url: Option<&str>, location: &ObjectLocation) -> String {
    match endpoint_url {
        Some(endpoint) => format!(
            "{}/{}/{}",
            endpoint,
            location.bucket,
            encode_key(&location.key)
        ),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            location.bucket,
            region,
            encode_key(&location.key)
        ),
    }
}

/// Inverse of [`object_url`]
fn parse_object_url(
    region: &str,
    endpoint_url: Option<&str>,
    url: &str,
) -> Option<ObjectLocation> {
    let location = match endpoint_url {
        Some(endpoint) => {
            let rest = url.strip_prefix(endpoint)?.strip_prefix('/')?;
            let (bucket, key) = rest.split_once('/')?;
            ObjectLocation::new(bucket, decode_key(key)?)
        }
        None => {
            let rest = url.strip_prefix("https://")?;
            let (host, key) = rest.split_once('/')?;
            let bucket = host.strip_suffix(&format!(".s3.{}.amazonaws.com", region))?;
            ObjectLocation::new(bucket, decode_key(key)?)
        }
    };
    validate_bucket(&location.bucket).ok()?;
    validate_key(&location.key).ok()?;
    Some(location)
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        location: &ObjectLocation,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        validate_key(&location.key)?;
        let store = self.store(&location.bucket).await?;

        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let path = Path::from(location.key.clone());

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.put(&path, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %location.bucket,
                key = %location.key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.public_url(location);

        tracing::info!(
            bucket = %location.bucket,
            key = %location.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    async fn download(&self, location: &ObjectLocation) -> StorageResult<Vec<u8>> {
        validate_key(&location.key)?;
        let store = self.store(&location.bucket).await?;
        let path = Path::from(location.key.clone());

        let result: ObjectResult<_> = store.get(&path).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(location.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %location.bucket,
                    key = %location.key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, location: &ObjectLocation) -> StorageResult<()> {
        validate_key(&location.key)?;
        let store = self.store(&location.bucket).await?;
        let start = std::time::Instant::now();
        let path = Path::from(location.key.clone());

        let result: ObjectResult<_> = store.delete(&path).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %location.bucket,
                    key = %location.key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %location.bucket,
            key = %location.key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn public_url(&self, location: &ObjectLocation) -> String {
        object_url(&self.region, self.endpoint_url.as_deref(), location)
    }

    fn locate(&self, url: &str) -> Option<ObjectLocation> {
        parse_object_url(&self.region, self.endpoint_url.as_deref(), url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_url_format() {
        let location = ObjectLocation::new("listing-images", "user-1/a.jpg");
        let url = object_url("eu-west-1", None, &location);
        assert_eq!(
            url,
            "https://listing-images.s3.eu-west-1.amazonaws.com/user-1/a.jpg"
        );
        assert_eq!(parse_object_url("eu-west-1", None, &url), Some(location));
    }

    #[test]
    fn test_custom_endpoint_uses_path_style() {
        let location = ObjectLocation::new("listing-images", "user-1/a b.jpg");
        let url = object_url("us-east-1", Some("http://localhost:9000"), &location);
        assert_eq!(url, "http://localhost:9000/listing-images/user-1/a%20b.jpg");
        assert_eq!(
            parse_object_url("us-east-1", Some("http://localhost:9000"), &url),
            Some(location)
        );
    }

    #[test]
    fn test_parse_rejects_other_region_and_hosts() {
        let url = "https://listing-images.s3.us-east-1.amazonaws.com/user-1/a.jpg";
        assert_eq!(parse_object_url("eu-west-1", None, url), None);
        assert_eq!(
            parse_object_url("eu-west-1", None, "https://example.com/a.jpg"),
            None
        );
        assert_eq!(
            parse_object_url("eu-west-1", Some("http://localhost:9000"), url),
            None
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let storage = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        );
        let location = ObjectLocation::new("b", "k.jpg");
        assert_eq!(storage.public_url(&location), "http://localhost:9000/b/k.jpg");
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }
}
