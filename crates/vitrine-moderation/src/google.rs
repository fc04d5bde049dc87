//! Google Cloud Vision SafeSearch gate

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;
use vitrine_core::ModerationVerdict;

use crate::gate::ModerationGate;

/// SafeSearch likelihood buckets, ordered from least to most likely
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl FromStr for Likelihood {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "unknown" => Ok(Likelihood::Unknown),
            "very_unlikely" => Ok(Likelihood::VeryUnlikely),
            "unlikely" => Ok(Likelihood::Unlikely),
            "possible" => Ok(Likelihood::Possible),
            "likely" => Ok(Likelihood::Likely),
            "very_likely" => Ok(Likelihood::VeryLikely),
            _ => Err(anyhow::anyhow!("Invalid SafeSearch likelihood: {}", s)),
        }
    }
}

/// Classifies images with the Vision API `SAFE_SEARCH_DETECTION` feature.
///
/// An image is sensitive when its adult, violence or racy likelihood reaches
/// the configured threshold (default [`Likelihood::Likely`]).
pub struct GoogleSafeSearchGate {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    threshold: Likelihood,
}

impl Debug for GoogleSafeSearchGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GoogleSafeSearchGate")
            .field("endpoint", &self.endpoint)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl GoogleSafeSearchGate {
    pub fn new(api_key: String, endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Google Vision API")?;

        Ok(Self {
            http_client,
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            threshold: Likelihood::Likely,
        })
    }

    pub fn with_threshold(mut self, threshold: Likelihood) -> Self {
        self.threshold = threshold;
        self
    }

    async fn safe_search(&self, image: &[u8]) -> Result<SafeSearchAnnotation> {
        let url = format!("{}/v1/images:annotate", self.endpoint);

        use base64::Engine;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image);

        let request_body = json!({
            "requests": [{
                "image": { "content": image_base64 },
                "features": [{ "type": "SAFE_SEARCH_DETECTION" }]
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to Google Vision API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Google Vision API request failed: {} - {}",
                status,
                error_text
            ));
        }

        let vision_response: VisionResponse = response
            .json()
            .await
            .context("Failed to parse Google Vision API response")?;

        let first = vision_response
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Google Vision API returned no responses"))?;

        if let Some(error) = first.error {
            return Err(anyhow::anyhow!(
                "Google Vision API error: {:?} - {:?}",
                error.code,
                error.message
            ));
        }

        first
            .safe_search_annotation
            .ok_or_else(|| anyhow::anyhow!("Response has no safeSearchAnnotation"))
    }

    fn verdict(&self, annotation: &SafeSearchAnnotation) -> ModerationVerdict {
        let worst = [annotation.adult, annotation.violence, annotation.racy]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(Likelihood::Unknown);

        if worst >= self.threshold {
            ModerationVerdict::Sensitive
        } else {
            ModerationVerdict::NotSensitive
        }
    }
}

#[async_trait]
impl ModerationGate for GoogleSafeSearchGate {
    async fn classify(&self, image: &[u8]) -> ModerationVerdict {
        let start = std::time::Instant::now();

        match self.safe_search(image).await {
            Ok(annotation) => {
                let verdict = self.verdict(&annotation);
                tracing::debug!(
                    verdict = %verdict,
                    adult = ?annotation.adult,
                    violence = ?annotation.violence,
                    racy = ?annotation.racy,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "SafeSearch classification complete"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "SafeSearch classification failed"
                );
                ModerationVerdict::TransportError
            }
        }
    }

    fn name(&self) -> &str {
        "google_vision"
    }
}

// Google Cloud Vision API response types
#[derive(Debug, Deserialize)]
struct VisionResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    safe_search_annotation: Option<SafeSearchAnnotation>,
    error: Option<VisionError>,
}

#[derive(Debug, Deserialize)]
struct SafeSearchAnnotation {
    adult: Option<Likelihood>,
    violence: Option<Likelihood>,
    racy: Option<Likelihood>,
}

#[derive(Debug, Deserialize)]
struct VisionError {
    code: Option<i32>,
    message: Option<String>,
}
