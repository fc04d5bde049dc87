use async_trait::async_trait;
use vitrine_core::ModerationVerdict;

/// Content-safety classifier consulted before an image may occupy a slot.
///
/// Implementations hold no per-call mutable state and may be invoked
/// concurrently for different slots.
#[async_trait]
pub trait ModerationGate: Send + Sync {
    /// Classify `image`. Never fails; failures are verdict values.
    async fn classify(&self, image: &[u8]) -> ModerationVerdict;

    /// Provider name used in logs
    fn name(&self) -> &str;
}

/// Gate used when no classifier is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModeration;

#[async_trait]
impl ModerationGate for DisabledModeration {
    async fn classify(&self, _image: &[u8]) -> ModerationVerdict {
        ModerationVerdict::Unavailable
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
