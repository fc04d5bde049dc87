//! Vitrine Moderation Library
//!
//! A moderation gate classifies a raw image buffer into a
//! [`ModerationVerdict`]. Gates never return errors: a classifier that is
//! switched off answers `Unavailable`, and any network or provider failure
//! answers `TransportError`. The draft media set turns verdicts into slot
//! states.

pub mod factory;
pub mod gate;
#[cfg(feature = "moderation-google")]
pub mod google;
#[cfg(feature = "moderation-rekognition")]
pub mod rekognition;

pub use factory::create_moderation_gate;
pub use gate::{DisabledModeration, ModerationGate};
#[cfg(feature = "moderation-google")]
pub use google::{GoogleSafeSearchGate, Likelihood};
#[cfg(feature = "moderation-rekognition")]
pub use rekognition::RekognitionModerationGate;
pub use vitrine_core::ModerationVerdict;
