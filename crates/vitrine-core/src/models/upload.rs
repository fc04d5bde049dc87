use serde::{Deserialize, Serialize};

use crate::constants::{IMAGE_PHASE_WEIGHT, THUMBNAIL_PHASE_WEIGHT};

/// Bucket and folder an upload session writes into.
///
/// The folder is usually the id of the user owning the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDestination {
    pub bucket: String,
    pub folder: String,
}

impl UploadDestination {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: folder.into(),
        }
    }

    /// Object key of `filename` inside this destination's folder.
    pub fn object_key(&self, filename: &str) -> String {
        let folder = self.folder.trim_matches('/');
        if folder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", folder, filename)
        }
    }
}

/// URLs produced by a successful upload session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub image_urls: Vec<String>,
    pub thumbnail_url: Option<String>,
}

impl UploadOutcome {
    pub fn is_empty(&self) -> bool {
        self.image_urls.is_empty() && self.thumbnail_url.is_none()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.image_urls.iter().any(|u| u == url) || self.thumbnail_url.as_deref() == Some(url)
    }
}

/// How session progress is split between the image phase and the thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressWeights {
    pub image_phase: f64,
    pub thumbnail: f64,
}

impl ProgressWeights {
    /// Progress value reached once the thumbnail has been uploaded.
    pub fn total(&self) -> f64 {
        self.image_phase + self.thumbnail
    }
}

impl Default for ProgressWeights {
    fn default() -> Self {
        Self {
            image_phase: IMAGE_PHASE_WEIGHT,
            thumbnail: THUMBNAIL_PHASE_WEIGHT,
        }
    }
}
