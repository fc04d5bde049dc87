//! Shared plumbing for the `vitrine` binary.

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use vitrine_core::{Config, ErrorMetadata, MediaResult};
use vitrine_moderation::{create_moderation_gate, ModerationGate};
use vitrine_pipeline::{AssignOutcome, FsHttpAssetSource, PurgeReport};
use vitrine_processing::ImageTranscoder;
use vitrine_storage::{create_storage, Storage};

/// Initialize tracing for the CLI. `log_format` "json" selects the JSON formatter.
pub fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// The external services a pipeline run needs, built from configuration.
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn Storage>,
    pub gate: Arc<dyn ModerationGate>,
    pub source: Arc<FsHttpAssetSource>,
    pub transcoder: Arc<ImageTranscoder>,
}

impl Services {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = create_storage(&config.storage)
            .await
            .context("Failed to initialize storage")?;
        let gate = create_moderation_gate(&config.moderation)
            .await
            .context("Failed to initialize moderation gate")?;
        let source = FsHttpAssetSource::new(Duration::from_secs(config.fetch_timeout_secs))
            .context("Failed to build HTTP client")?
            .with_storage(storage.clone());

        Ok(Self {
            storage,
            gate,
            source: Arc::new(source),
            transcoder: Arc::new(ImageTranscoder::new()),
        })
    }
}

/// Result of assigning one picked file, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickReport {
    pub slot: usize,
    pub file: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PickReport {
    pub fn new(slot: usize, file: &str, result: &MediaResult<AssignOutcome>) -> Self {
        let mut report = Self {
            slot,
            file: file.to_string(),
            status: "accepted",
            media_id: None,
            error_code: None,
            message: None,
        };

        match result {
            Ok(AssignOutcome::Accepted(id)) => report.media_id = Some(id.to_string()),
            Ok(AssignOutcome::Superseded) => report.status = "superseded",
            Ok(AssignOutcome::Discarded) => report.status = "discarded",
            Err(e) => {
                report.status = "rejected";
                report.error_code = Some(e.error_code());
                report.message = Some(e.client_message());
            }
        }
        report
    }

    pub fn accepted(&self) -> bool {
        self.status == "accepted"
    }
}

pub fn purge_report_json(report: &PurgeReport) -> serde_json::Value {
    serde_json::json!({
        "deleted": report.deleted,
        "skipped": report.skipped,
        "failed": report.failed,
    })
}
