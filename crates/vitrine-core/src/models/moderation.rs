use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Outcome of running an image through a content-safety classifier.
///
/// Classification never fails with an error: operational problems are
/// represented by [`ModerationVerdict::TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationVerdict {
    NotSensitive,
    Sensitive,
    /// Classifier not enabled or not configured on this platform
    Unavailable,
    /// Loading or classifying the image failed
    TransportError,
}

impl Display for ModerationVerdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ModerationVerdict::NotSensitive => write!(f, "not_sensitive"),
            ModerationVerdict::Sensitive => write!(f, "sensitive"),
            ModerationVerdict::Unavailable => write!(f, "unavailable"),
            ModerationVerdict::TransportError => write!(f, "transport_error"),
        }
    }
}
