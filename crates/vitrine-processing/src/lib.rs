//! Vitrine Processing Library
//!
//! Image transcoding for the upload session: every occupied slot is scaled
//! down to its profile target and re-encoded before it reaches storage.
//! Decoding and encoding are CPU-bound and always run on the blocking pool.

pub mod error;
pub mod resize;
pub mod transcoder;
pub mod validator;

pub use error::TranscodeError;
pub use resize::ImageResize;
pub use transcoder::{ImageTranscoder, Transcode};
pub use validator::{decode_check, sniff_format, ImageInfo};
