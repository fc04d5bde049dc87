pub mod media;
pub mod moderation;
pub mod slot;
pub mod transcode;
pub mod upload;

pub use media::{ImageBuffer, MediaId, SourceRef};
pub use moderation::ModerationVerdict;
pub use slot::{OccupiedSlot, RejectionReason, Slot, SlotState};
pub use transcode::{ImageOutputFormat, QualityPreset, TranscodeTarget};
pub use upload::{ProgressWeights, UploadDestination, UploadOutcome};
