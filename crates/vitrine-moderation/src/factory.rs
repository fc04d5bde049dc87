use std::sync::Arc;
#[cfg(feature = "moderation-google")]
use std::time::Duration;

use anyhow::Result;
use vitrine_core::{ModerationConfig, ModerationProvider};

use crate::gate::{DisabledModeration, ModerationGate};
#[cfg(feature = "moderation-google")]
use crate::google::{GoogleSafeSearchGate, Likelihood};
#[cfg(feature = "moderation-rekognition")]
use crate::rekognition::RekognitionModerationGate;

/// Build the moderation gate selected by configuration
pub async fn create_moderation_gate(config: &ModerationConfig) -> Result<Arc<dyn ModerationGate>> {
    let gate: Arc<dyn ModerationGate> = match config.provider {
        ModerationProvider::Disabled => Arc::new(DisabledModeration),

        #[cfg(feature = "moderation-google")]
        ModerationProvider::GoogleVision => {
            let api_key = config
                .google_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GOOGLE_VISION_API_KEY not configured"))?;
            let threshold: Likelihood = config.google_likelihood_threshold.parse()?;
            Arc::new(
                GoogleSafeSearchGate::new(
                    api_key,
                    config.google_endpoint.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?
                .with_threshold(threshold),
            )
        }

        #[cfg(not(feature = "moderation-google"))]
        ModerationProvider::GoogleVision => {
            return Err(anyhow::anyhow!(
                "Google Vision moderation not available (moderation-google feature not enabled)"
            ))
        }

        #[cfg(feature = "moderation-rekognition")]
        ModerationProvider::AwsRekognition => {
            let region = config
                .aws_region
                .clone()
                .ok_or_else(|| anyhow::anyhow!("AWS_REGION not configured"))?;
            Arc::new(
                RekognitionModerationGate::new(
                    &region,
                    config.min_confidence,
                    config.safety_threshold,
                )
                .await,
            )
        }

        #[cfg(not(feature = "moderation-rekognition"))]
        ModerationProvider::AwsRekognition => {
            return Err(anyhow::anyhow!(
                "Rekognition moderation not available (moderation-rekognition feature not enabled)"
            ))
        }
    };

    tracing::info!(provider = gate.name(), "Moderation gate initialized");
    Ok(gate)
}
