//! Per-call-site parametrisation of the pipeline.
//!
//! Listing creation, listing editing and avatar editing all run the same
//! draft/upload machinery; a [`MediaProfile`] captures what differs between them.

use serde::{Deserialize, Serialize};

use crate::constants::{BYTES_PER_MB, DEFAULT_DRAFT_CAPACITY, MAX_ASSET_SIZE_MB};
use crate::models::{ProgressWeights, TranscodeTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProfile {
    pub name: String,
    /// Number of slots in the draft
    pub capacity: usize,
    /// Target for the full-size uploads
    pub image: TranscodeTarget,
    /// Target for the single thumbnail derived from the first occupied slot
    pub thumbnail: TranscodeTarget,
    /// When false, picked assets skip the moderation gate
    pub moderation_required: bool,
    /// When true, a draft without images is still valid for submit
    pub images_optional: bool,
    /// Keep `Rejected(reason)` on refused picks instead of reverting to `Empty`
    pub keep_rejected_state: bool,
    pub max_asset_bytes: usize,
    pub progress: ProgressWeights,
}

impl MediaProfile {
    /// Listing creation and editing.
    pub fn listing() -> Self {
        Self {
            name: "listing".to_string(),
            capacity: DEFAULT_DRAFT_CAPACITY,
            image: TranscodeTarget::jpeg(1200, 80),
            thumbnail: TranscodeTarget::jpeg(400, 60),
            moderation_required: true,
            images_optional: false,
            keep_rejected_state: false,
            max_asset_bytes: MAX_ASSET_SIZE_MB * BYTES_PER_MB,
            progress: ProgressWeights::default(),
        }
    }

    /// Profile picture editing: a single slot, no picture is acceptable.
    pub fn avatar() -> Self {
        Self {
            name: "avatar".to_string(),
            capacity: 1,
            image: TranscodeTarget::jpeg(512, 85),
            thumbnail: TranscodeTarget::jpeg(128, 70),
            moderation_required: true,
            images_optional: true,
            keep_rejected_state: false,
            max_asset_bytes: MAX_ASSET_SIZE_MB * BYTES_PER_MB,
            progress: ProgressWeights::default(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.capacity == 0 {
            return Err(anyhow::anyhow!(
                "Profile '{}': capacity must be at least 1",
                self.name
            ));
        }
        for (label, target) in [("image", &self.image), ("thumbnail", &self.thumbnail)] {
            if target.max_dimension == 0 {
                return Err(anyhow::anyhow!(
                    "Profile '{}': {} max dimension must be positive",
                    self.name,
                    label
                ));
            }
            if !(1..=100).contains(&target.quality) {
                return Err(anyhow::anyhow!(
                    "Profile '{}': {} quality must be between 1 and 100",
                    self.name,
                    label
                ));
            }
        }
        if self.progress.image_phase < 0.0 || self.progress.thumbnail < 0.0 {
            return Err(anyhow::anyhow!(
                "Profile '{}': progress weights must not be negative",
                self.name
            ));
        }
        if self.max_asset_bytes == 0 {
            return Err(anyhow::anyhow!(
                "Profile '{}': max asset size must be positive",
                self.name
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        assert!(MediaProfile::listing().validate().is_ok());
        assert!(MediaProfile::avatar().validate().is_ok());
        assert_eq!(MediaProfile::listing().capacity, 10);
        assert_eq!(MediaProfile::avatar().capacity, 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let profile = MediaProfile::listing().with_capacity(0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_out_of_range_quality_rejected() {
        let mut profile = MediaProfile::listing();
        profile.thumbnail.quality = 0;
        assert!(profile.validate().is_err());
    }
}
