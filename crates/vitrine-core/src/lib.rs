//! Vitrine Core Library
//!
//! This crate provides the domain models, media profiles, error types and
//! configuration shared by every crate of the media pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod profile;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ModerationConfig, ModerationProvider, StorageConfig};
pub use error::{ErrorMetadata, LogLevel, MediaError, MediaResult};
pub use models::{
    ImageBuffer, ImageOutputFormat, MediaId, ModerationVerdict, OccupiedSlot, ProgressWeights,
    QualityPreset, RejectionReason, Slot, SlotState, SourceRef, TranscodeTarget,
    UploadDestination, UploadOutcome,
};
pub use profile::MediaProfile;
pub use storage_types::StorageBackend;
