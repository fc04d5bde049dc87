//! AWS Rekognition moderation gate
//!
//! Uses `DetectModerationLabels` on the raw image bytes. Labels below
//! `min_confidence` are not returned by the service; an image is sensitive
//! when the most confident remaining label reaches `safety_threshold`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::Image;
use aws_sdk_rekognition::Client as RekognitionClient;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use vitrine_core::ModerationVerdict;

use crate::gate::ModerationGate;

pub struct RekognitionModerationGate {
    client: RekognitionClient,
    min_confidence: f32,
    safety_threshold: f32,
}

impl Debug for RekognitionModerationGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RekognitionModerationGate")
            .field("min_confidence", &self.min_confidence)
            .field("safety_threshold", &self.safety_threshold)
            .finish()
    }
}

impl RekognitionModerationGate {
    /// Create a gate with a Rekognition client for the given region
    pub async fn new(region: &str, min_confidence: f32, safety_threshold: f32) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: RekognitionClient::new(&config),
            min_confidence,
            safety_threshold,
        }
    }

    async fn max_label_confidence(&self, image: &[u8]) -> Result<(Option<String>, f32)> {
        let rekognition_image = Image::builder().bytes(Blob::new(image)).build();

        let response = self
            .client
            .detect_moderation_labels()
            .image(rekognition_image)
            .min_confidence(self.min_confidence)
            .send()
            .await
            .context("Failed to detect moderation labels")?;

        let top = response
            .moderation_labels()
            .iter()
            .map(|label| {
                (
                    label.name().map(str::to_string),
                    label.confidence().unwrap_or(0.0),
                )
            })
            .fold((None, 0.0_f32), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });

        Ok(top)
    }
}

/// Map the highest label confidence to a verdict.
pub(crate) fn verdict_for_confidence(max_confidence: f32, safety_threshold: f32) -> ModerationVerdict {
    if max_confidence >= safety_threshold {
        ModerationVerdict::Sensitive
    } else {
        ModerationVerdict::NotSensitive
    }
}

#[async_trait]
impl ModerationGate for RekognitionModerationGate {
    async fn classify(&self, image: &[u8]) -> ModerationVerdict {
        let start = std::time::Instant::now();

        match self.max_label_confidence(image).await {
            Ok((label, confidence)) => {
                let verdict = verdict_for_confidence(confidence, self.safety_threshold);
                tracing::debug!(
                    verdict = %verdict,
                    top_label = ?label,
                    confidence = confidence,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Rekognition classification complete"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Rekognition classification failed"
                );
                ModerationVerdict::TransportError
            }
        }
    }

    fn name(&self) -> &str {
        "aws_rekognition"
    }
}
