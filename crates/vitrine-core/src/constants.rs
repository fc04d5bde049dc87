//! Application-wide constants.

/// Number of slots in a listing draft.
pub const DEFAULT_DRAFT_CAPACITY: usize = 10;

/// Bucket used when `MEDIA_BUCKET` is not set.
pub const DEFAULT_MEDIA_BUCKET: &str = "listing-images";

/// Share of the session progress spent on the full-size images.
pub const IMAGE_PHASE_WEIGHT: f64 = 0.9;

/// Share of the session progress spent on the thumbnail.
pub const THUMBNAIL_PHASE_WEIGHT: f64 = 0.1;

/// Largest asset accepted into a slot, before transcoding.
pub const MAX_ASSET_SIZE_MB: usize = 25;

pub const BYTES_PER_MB: usize = 1024 * 1024;
