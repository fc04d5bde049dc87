//! Shared key handling for storage backends.
//!
//! Key format: `{folder}/{filename}`. Filenames generated here are random so
//! a retried upload never overwrites an object from an earlier attempt.

use uuid::Uuid;

use crate::{StorageError, StorageResult};

/// Generate a unique object filename with the given extension.
pub fn unique_filename(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension.trim_start_matches('.'))
}

/// Reject keys that could escape their bucket.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Bucket names are single path segments.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

/// Percent-encode every segment of a key for use in a URL path.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`encode_key`]. Returns `None` for malformed escapes.
pub fn decode_key(path: &str) -> Option<String> {
    let segments = path
        .split('/')
        .map(|segment| urlencoding::decode(segment).ok().map(|s| s.into_owned()))
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_filename() {
        let a = unique_filename("jpg");
        let b = unique_filename(".jpg");
        assert!(a.ends_with(".jpg"));
        assert!(b.ends_with(".jpg") && !b.ends_with("..jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user-1/a.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("user-1/../../etc/passwd").is_err());
        // ".." inside a filename is harmless
        assert!(validate_key("user-1/a..jpg").is_ok());
    }

    #[test]
    fn test_validate_bucket() {
        assert!(validate_bucket("listing-images").is_ok());
        assert!(validate_bucket("a/b").is_err());
        assert!(validate_bucket("..").is_err());
    }

    #[test]
    fn test_encode_decode_key() {
        let key = "user 1/photo #1.jpg";
        let encoded = encode_key(key);
        assert_eq!(encoded, "user%201/photo%20%231.jpg");
        assert_eq!(decode_key(&encoded).as_deref(), Some(key));
    }
}
