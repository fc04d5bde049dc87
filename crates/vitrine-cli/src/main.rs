//! Vitrine CLI: drives the media pipeline the way a listing or avatar form does.
//!
//! Configuration comes from the environment (see `.env.example`). Output is JSON
//! on stdout, logs go to stderr.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitrine_cli::{init_tracing, print_json, purge_report_json, PickReport, Services};
use vitrine_core::{Config, MediaProfile, SourceRef, UploadDestination, UploadOutcome};
use vitrine_moderation::ModerationGate;
use vitrine_pipeline::{
    purge_urls, AssetSource, DraftMediaSet, RemoteLedger, RemoteReconciler, UploadSession,
};

#[derive(Parser)]
#[command(name = "vitrine", about = "Media acquisition, moderation and upload pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single file through the moderation gate
    Classify {
        /// Path to the image
        file: PathBuf,
    },
    /// Pick files into a new draft and upload them
    Submit {
        /// Media profile: listing or avatar
        #[arg(long, default_value = "listing")]
        profile: String,
        /// Destination folder, usually the user id
        #[arg(long)]
        folder: String,
        /// Bucket override
        #[arg(long)]
        bucket: Option<String>,
        /// Images to pick, in slot order
        files: Vec<PathBuf>,
    },
    /// Seed a draft from stored URLs, apply changes and re-upload
    Edit {
        #[arg(long, default_value = "listing")]
        profile: String,
        #[arg(long)]
        folder: String,
        #[arg(long)]
        bucket: Option<String>,
        /// Stored image URL (repeatable)
        #[arg(long = "existing")]
        existing: Vec<String>,
        /// Stored thumbnail URL (repeatable)
        #[arg(long = "thumbnail")]
        thumbnails: Vec<String>,
        /// Stored image URL to remove from the draft (repeatable)
        #[arg(long = "remove")]
        remove: Vec<String>,
        /// Delete superseded objects after a successful upload
        #[arg(long)]
        purge: bool,
        /// Images to add into free slots
        files: Vec<PathBuf>,
    },
    /// Delete stored objects by URL
    Delete {
        urls: Vec<String>,
    },
}

fn resolve_profile(config: &Config, name: &str) -> anyhow::Result<MediaProfile> {
    config
        .profile(name)
        .cloned()
        .with_context(|| format!("Unknown media profile '{}'", name))
}

async fn pick_files(draft: &DraftMediaSet, files: &[PathBuf]) -> Vec<PickReport> {
    let names: Vec<String> = files
        .iter()
        .map(|file| file.to_string_lossy().into_owned())
        .collect();
    let sources = names.iter().map(|name| SourceRef::asset(name.as_str())).collect();

    let results = draft.assign_to_free_slots(sources).await;
    if results.len() < names.len() {
        tracing::warn!(
            picked = names.len(),
            free = results.len(),
            "More files than free slots, extra files ignored"
        );
    }

    results
        .iter()
        .zip(&names)
        .map(|((slot, result), name)| PickReport::new(*slot, name, result))
        .collect()
}

async fn upload_draft(
    services: &Services,
    draft: &DraftMediaSet,
    destination: &UploadDestination,
) -> anyhow::Result<UploadOutcome> {
    let mut session =
        UploadSession::for_draft(services.storage.clone(), services.transcoder.clone(), draft);

    let mut progress = session.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let value = *progress.borrow_and_update();
            tracing::info!(progress = value, "Upload progress");
        }
    });

    let result = session.run_draft(draft, destination).await;
    watcher.abort();

    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            print_json(&serde_json::json!({
                "error": e.to_string(),
                "orphaned_urls": session.uploaded_image_urls(),
            }))?;
            Err(e).context("Upload session failed")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_format);
    config.validate()?;

    let services = Services::from_config(&config).await?;

    match cli.command {
        Commands::Classify { file } => {
            let location = file.to_string_lossy().into_owned();
            let data = services
                .source
                .read_bytes(&SourceRef::asset(location.as_str()))
                .await?;
            let verdict = services.gate.classify(&data).await;
            print_json(&serde_json::json!({
                "file": location,
                "gate": services.gate.name(),
                "verdict": verdict,
            }))?;
        }
        Commands::Submit {
            profile,
            folder,
            bucket,
            files,
        } => {
            let profile = resolve_profile(&config, &profile)?;
            let draft = DraftMediaSet::new(profile, services.gate.clone(), services.source.clone());
            let picks = pick_files(&draft, &files).await;

            if !draft.is_valid().await {
                print_json(&serde_json::json!({ "picks": picks }))?;
                bail!("No image was accepted, nothing to submit");
            }

            let destination =
                UploadDestination::new(bucket.unwrap_or_else(|| config.storage.bucket.clone()), folder);
            let outcome = upload_draft(&services, &draft, &destination).await?;
            draft.mark_committed().await;

            print_json(&serde_json::json!({ "picks": picks, "outcome": outcome }))?;
        }
        Commands::Edit {
            profile,
            folder,
            bucket,
            existing,
            thumbnails,
            remove,
            purge,
            files,
        } => {
            let profile = resolve_profile(&config, &profile)?;
            let draft = DraftMediaSet::new(profile, services.gate.clone(), services.source.clone());

            let reconciler =
                RemoteReconciler::new(services.source.clone(), services.transcoder.clone());
            let mut ledger = RemoteLedger::new();
            let reconciled = reconciler
                .reconcile(&existing, &thumbnails, &draft, &mut ledger)
                .await;

            for url in &remove {
                let id = draft.slots().await.iter().find_map(|slot| {
                    let image = slot.state.image()?;
                    (slot.state.source()?.remote_url() == Some(url.as_str())).then(|| image.id())
                });
                match id {
                    Some(id) => {
                        draft.clear(id).await;
                    }
                    None => tracing::warn!(url = %url, "URL to remove is not in the draft"),
                }
            }

            let picks = pick_files(&draft, &files).await;

            if !draft.has_user_initiated_changes().await {
                print_json(&serde_json::json!({
                    "changed": false,
                    "failed": reconciled.failed,
                    "dropped": reconciled.dropped,
                }))?;
                return Ok(());
            }
            if !draft.is_valid().await {
                print_json(&serde_json::json!({ "picks": picks }))?;
                bail!("Draft has no image left, nothing to submit");
            }

            let destination =
                UploadDestination::new(bucket.unwrap_or_else(|| config.storage.bucket.clone()), folder);
            let outcome = upload_draft(&services, &draft, &destination).await?;
            draft.mark_committed().await;

            let superseded = ledger.superseded_by(&outcome);
            let purged = if purge {
                let report = purge_urls(services.storage.as_ref(), &superseded).await;
                Some(purge_report_json(&report))
            } else {
                None
            };

            print_json(&serde_json::json!({
                "changed": true,
                "picks": picks,
                "outcome": outcome,
                "superseded": superseded,
                "purged": purged,
            }))?;
        }
        Commands::Delete { urls } => {
            let report = purge_urls(services.storage.as_ref(), &urls).await;
            print_json(&purge_report_json(&report))?;
            if !report.failed.is_empty() {
                bail!("{} object(s) could not be deleted", report.failed.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_needs_no_configuration() {
        let err = Cli::try_parse_from(["vitrine", "--help"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = Cli::try_parse_from(["vitrine", "submit", "--help"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn submit_collects_files_in_order() {
        let cli = Cli::try_parse_from(["vitrine", "submit", "--folder", "u1", "a.jpg", "b.jpg"])
            .unwrap();
        match cli.command {
            Commands::Submit {
                profile,
                folder,
                files,
                ..
            } => {
                assert_eq!(profile, "listing");
                assert_eq!(folder, "u1");
                assert_eq!(files, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
            }
            _ => panic!("expected submit"),
        }
    }
}
