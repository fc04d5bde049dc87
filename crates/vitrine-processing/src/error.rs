use vitrine_core::MediaError;

/// Errors produced while decoding, resizing or encoding an image
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Unsupported or unrecognized image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid transcode target: {0}")]
    InvalidTarget(String),

    #[error("Transcode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<TranscodeError> for MediaError {
    fn from(err: TranscodeError) -> Self {
        MediaError::TranscodeFailure(err.to_string())
    }
}
