//! Error types module
//!
//! `MediaError` is the single error type surfaced by the pipeline to the owning
//! form. Per-slot errors come back from `assign`; session errors abort an upload.

use crate::models::RejectionReason;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like a refused pick
    Debug,
    /// Warning level - for recoverable operational issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "SENSITIVE_CONTENT")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action can succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Image was classified as sensitive content")]
    SensitiveContent,

    #[error("Content moderation is not available")]
    ModerationUnavailable,

    #[error("Content moderation could not classify the image")]
    ModerationFailed,

    #[error("Failed to load asset {location}: {message}")]
    AssetLoadFailure { location: String, message: String },

    #[error("Asset too large: {size} bytes exceeds limit of {limit} bytes")]
    AssetTooLarge { size: usize, limit: usize },

    #[error("Image transcoding failed: {0}")]
    TranscodeFailure(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Upload session cancelled")]
    Cancelled,

    #[error("Upload session already ran; create a new session to retry")]
    SessionReused,
}

pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    pub fn asset_load(location: impl Into<String>, message: impl ToString) -> Self {
        MediaError::AssetLoadFailure {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Reason recorded on a slot when this error refuses a pick.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            MediaError::SensitiveContent => Some(RejectionReason::SensitiveContent),
            MediaError::ModerationUnavailable => Some(RejectionReason::ModerationUnavailable),
            MediaError::ModerationFailed => Some(RejectionReason::ModerationFailed),
            MediaError::AssetLoadFailure { .. } | MediaError::AssetTooLarge { .. } => {
                Some(RejectionReason::AssetLoadFailure)
            }
            _ => None,
        }
    }

    /// Errors that abort a whole upload session.
    pub fn is_session_level(&self) -> bool {
        matches!(
            self,
            MediaError::TranscodeFailure(_)
                | MediaError::UploadFailure(_)
                | MediaError::Cancelled
                | MediaError::SessionReused
        )
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn media_error_static_metadata(
    err: &MediaError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        MediaError::SensitiveContent => (
            "SENSITIVE_CONTENT",
            true,
            Some("Pick a different image"),
            LogLevel::Debug,
        ),
        MediaError::ModerationUnavailable => (
            "MODERATION_UNAVAILABLE",
            true,
            Some("Enable content analysis in the device settings and try again"),
            LogLevel::Warn,
        ),
        MediaError::ModerationFailed => (
            "MODERATION_FAILED",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        MediaError::AssetLoadFailure { .. } => (
            "ASSET_LOAD_FAILURE",
            true,
            Some("Check the file and try a different image"),
            LogLevel::Warn,
        ),
        MediaError::AssetTooLarge { .. } => (
            "ASSET_TOO_LARGE",
            true,
            Some("Pick a smaller image"),
            LogLevel::Debug,
        ),
        MediaError::TranscodeFailure(_) => (
            "TRANSCODE_FAILURE",
            true,
            Some("Remove the image that cannot be processed and submit again"),
            LogLevel::Error,
        ),
        MediaError::UploadFailure(_) => (
            "UPLOAD_FAILURE",
            true,
            Some("Check the connection and submit again"),
            LogLevel::Error,
        ),
        MediaError::Cancelled => ("CANCELLED", true, None, LogLevel::Debug),
        MediaError::SessionReused => (
            "SESSION_REUSED",
            true,
            Some("Start a new upload session"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for MediaError {
    fn error_code(&self) -> &'static str {
        media_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        media_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        media_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        media_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            MediaError::SensitiveContent => {
                "This image appears to contain sensitive content".to_string()
            }
            MediaError::ModerationUnavailable => {
                "Images cannot be checked on this device right now".to_string()
            }
            MediaError::ModerationFailed => "The image could not be checked".to_string(),
            MediaError::AssetLoadFailure { .. } => "The image could not be read".to_string(),
            MediaError::AssetTooLarge { limit, .. } => {
                format!("Images must be smaller than {} MB", limit / (1024 * 1024))
            }
            MediaError::TranscodeFailure(_)
            | MediaError::UploadFailure(_)
            | MediaError::SessionReused => "Uploading images failed".to_string(),
            MediaError::Cancelled => "Upload cancelled".to_string(),
        }
    }
}
