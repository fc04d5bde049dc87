//! Configuration module
//!
//! Configuration is read from the environment (with `.env` support). Every
//! variable has a default except the credentials of the selected providers.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{BYTES_PER_MB, DEFAULT_MEDIA_BUCKET, MAX_ASSET_SIZE_MB};
use crate::models::QualityPreset;
use crate::profile::MediaProfile;
use crate::storage_types::StorageBackend;

const GOOGLE_VISION_ENDPOINT: &str = "https://vision.googleapis.com";
const GOOGLE_VISION_LIKELIHOOD_THRESHOLD: &str = "likely";
const MODERATION_MIN_CONFIDENCE: f32 = 50.0;
const MODERATION_SAFETY_THRESHOLD: f32 = 70.0;
const MODERATION_TIMEOUT_SECS: u64 = 30;
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Which classifier backs the moderation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationProvider {
    Disabled,
    GoogleVision,
    AwsRekognition,
}

impl FromStr for ModerationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(ModerationProvider::Disabled),
            "google_vision" | "google" => Ok(ModerationProvider::GoogleVision),
            "aws_rekognition" | "rekognition" => Ok(ModerationProvider::AwsRekognition),
            _ => Err(anyhow::anyhow!("Invalid moderation provider: {}", s)),
        }
    }
}

impl Display for ModerationProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ModerationProvider::Disabled => write!(f, "disabled"),
            ModerationProvider::GoogleVision => write!(f, "google_vision"),
            ModerationProvider::AwsRekognition => write!(f, "aws_rekognition"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Default bucket for uploads
    pub bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ModerationConfig {
    pub provider: ModerationProvider,
    pub google_api_key: Option<String>,
    pub google_endpoint: String,
    /// SafeSearch likelihood (`possible`, `likely`, `very_likely`, ...) at which content is unsafe
    pub google_likelihood_threshold: String,
    pub aws_region: Option<String>,
    /// Minimum confidence (0-100) for a label to be reported
    pub min_confidence: f32,
    /// Content is considered unsafe if a label's confidence reaches this (0-100)
    pub safety_threshold: f32,
    pub timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage: StorageConfig,
    pub moderation: ModerationConfig,
    pub listing: MediaProfile,
    pub avatar: MediaProfile,
    pub fetch_timeout_secs: u64,
    /// "pretty" or "json"
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };
        let aws_region = lookup("AWS_REGION");

        let storage = StorageConfig {
            backend,
            bucket: lookup("MEDIA_BUCKET").unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.to_string()),
            s3_region: lookup("S3_REGION").or_else(|| aws_region.clone()),
            s3_endpoint: lookup("S3_ENDPOINT"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
        };

        let provider = match lookup("MODERATION_PROVIDER") {
            Some(value) => value.parse::<ModerationProvider>()?,
            None => ModerationProvider::Disabled,
        };

        let moderation = ModerationConfig {
            provider,
            google_api_key: lookup("GOOGLE_VISION_API_KEY"),
            google_endpoint: lookup("GOOGLE_VISION_ENDPOINT")
                .unwrap_or_else(|| GOOGLE_VISION_ENDPOINT.to_string()),
            google_likelihood_threshold: lookup("GOOGLE_VISION_LIKELIHOOD_THRESHOLD")
                .unwrap_or_else(|| GOOGLE_VISION_LIKELIHOOD_THRESHOLD.to_string()),
            aws_region,
            min_confidence: lookup("MODERATION_MIN_CONFIDENCE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MODERATION_MIN_CONFIDENCE),
            safety_threshold: lookup("MODERATION_SAFETY_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MODERATION_SAFETY_THRESHOLD),
            timeout_secs: lookup("MODERATION_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MODERATION_TIMEOUT_SECS),
        };

        let max_asset_bytes = lookup("MAX_ASSET_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_ASSET_SIZE_MB)
            * BYTES_PER_MB;
        let moderation_required = lookup("MODERATION_REQUIRED")
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(true);
        let keep_rejected_state = lookup("KEEP_REJECTED_STATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let mut listing = MediaProfile::listing();
        if let Some(capacity) = lookup("DRAFT_CAPACITY") {
            listing.capacity = capacity
                .parse()
                .map_err(|_| anyhow::anyhow!("DRAFT_CAPACITY must be a valid number"))?;
        }
        if let Some(dimension) = lookup("IMAGE_MAX_DIMENSION") {
            listing.image.max_dimension = dimension
                .parse()
                .map_err(|_| anyhow::anyhow!("IMAGE_MAX_DIMENSION must be a valid number"))?;
        }
        if let Some(quality) = lookup("IMAGE_QUALITY") {
            listing.image.quality = QualityPreset::parse_quality(&quality)?;
        }
        if let Some(dimension) = lookup("THUMBNAIL_MAX_DIMENSION") {
            listing.thumbnail.max_dimension = dimension
                .parse()
                .map_err(|_| anyhow::anyhow!("THUMBNAIL_MAX_DIMENSION must be a valid number"))?;
        }
        if let Some(quality) = lookup("THUMBNAIL_QUALITY") {
            listing.thumbnail.quality = QualityPreset::parse_quality(&quality)?;
        }

        let mut avatar = MediaProfile::avatar();
        for profile in [&mut listing, &mut avatar] {
            profile.max_asset_bytes = max_asset_bytes;
            profile.moderation_required = moderation_required;
            profile.keep_rejected_state = keep_rejected_state;
        }

        Ok(Config {
            environment,
            storage,
            moderation,
            listing,
            avatar,
            fetch_timeout_secs: lookup("FETCH_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(FETCH_TIMEOUT_SECS),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Look up a built-in profile by name.
    pub fn profile(&self, name: &str) -> Option<&MediaProfile> {
        match name {
            "listing" => Some(&self.listing),
            "avatar" => Some(&self.avatar),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
                if self.storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        match self.moderation.provider {
            ModerationProvider::GoogleVision if self.moderation.google_api_key.is_none() => {
                return Err(anyhow::anyhow!(
                    "GOOGLE_VISION_API_KEY must be set when MODERATION_PROVIDER=google_vision"
                ));
            }
            ModerationProvider::AwsRekognition if self.moderation.aws_region.is_none() => {
                return Err(anyhow::anyhow!(
                    "AWS_REGION must be set when MODERATION_PROVIDER=aws_rekognition"
                ));
            }
            ModerationProvider::Disabled
                if self.is_production() && self.listing.moderation_required =>
            {
                return Err(anyhow::anyhow!(
                    "MODERATION_PROVIDER cannot be disabled in production while MODERATION_REQUIRED is set"
                ));
            }
            _ => {}
        }

        if !(0.0..=100.0).contains(&self.moderation.safety_threshold) {
            return Err(anyhow::anyhow!(
                "MODERATION_SAFETY_THRESHOLD must be between 0 and 100"
            ));
        }

        self.listing.validate()?;
        self.avatar.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.storage.bucket, DEFAULT_MEDIA_BUCKET);
        assert_eq!(config.moderation.provider, ModerationProvider::Disabled);
        assert_eq!(config.moderation.safety_threshold, 70.0);
        assert_eq!(config.moderation.google_likelihood_threshold, "likely");
        assert_eq!(config.listing.capacity, 10);
        assert!(config.listing.moderation_required);
        assert!(!config.is_production());
    }

    #[test]
    fn test_profile_overrides() {
        let config = config_from(&[
            ("DRAFT_CAPACITY", "4"),
            ("IMAGE_QUALITY", "better"),
            ("THUMBNAIL_MAX_DIMENSION", "256"),
            ("MAX_ASSET_SIZE_MB", "5"),
            ("KEEP_REJECTED_STATE", "true"),
        ])
        .unwrap();
        assert_eq!(config.listing.capacity, 4);
        assert_eq!(config.listing.image.quality, 85);
        assert_eq!(config.listing.thumbnail.max_dimension, 256);
        assert_eq!(config.avatar.max_asset_bytes, 5 * BYTES_PER_MB);
        assert!(config.avatar.keep_rejected_state);
        assert_eq!(config.avatar.capacity, 1);
    }

    #[test]
    fn test_invalid_capacity_is_an_error() {
        assert!(config_from(&[("DRAFT_CAPACITY", "many")]).is_err());
    }

    #[test]
    fn test_validate_local_requires_path() {
        let config = config_from(&[]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("LOCAL_STORAGE_PATH", "/tmp/vitrine"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/media"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_google_requires_key() {
        let config = config_from(&[
            ("LOCAL_STORAGE_PATH", "/tmp/vitrine"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/media"),
            ("MODERATION_PROVIDER", "google_vision"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_requires_moderation() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("LOCAL_STORAGE_PATH", "/tmp/vitrine"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/media"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_region_falls_back_to_aws_region() {
        let config = config_from(&[("STORAGE_BACKEND", "s3"), ("AWS_REGION", "eu-west-1")])
            .unwrap();
        assert_eq!(config.storage.s3_region.as_deref(), Some("eu-west-1"));
        assert!(config.validate().is_ok());
    }
}
