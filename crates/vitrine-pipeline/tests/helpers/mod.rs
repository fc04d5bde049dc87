#![allow(dead_code)]

use vitrine_pipeline::AssetSource;

#[path = "../../src/test_helpers/fakes.rs"]
mod fakes;

pub use fakes::*;

use std::sync::Arc;
use vitrine_core::{MediaProfile, SourceRef};
use vitrine_pipeline::{AssignOutcome, DraftMediaSet, UploadSession};
use vitrine_processing::ImageTranscoder;

/// Draft, session and fakes wired together the way the CLI wires the real services.
pub struct Harness {
    pub gate: Arc<FakeGate>,
    pub source: Arc<FakeAssetSource>,
    pub storage: Arc<MemoryStorage>,
    pub draft: Arc<DraftMediaSet>,
}

impl Harness {
    pub fn new(profile: MediaProfile) -> Self {
        let gate = Arc::new(FakeGate::new());
        let source = Arc::new(FakeAssetSource::new());
        let storage = Arc::new(MemoryStorage::new());
        let draft = Arc::new(DraftMediaSet::new(profile, gate.clone(), source.clone()));
        Self {
            gate,
            source,
            storage,
            draft,
        }
    }

    /// Register an asset named `name` and assign it to slot `index`.
    pub async fn pick(&self, index: usize, name: &str, seed: u8) -> AssignOutcome {
        self.source.add_asset(name, png_bytes(seed));
        self.draft
            .assign(index, SourceRef::asset(name))
            .await
            .expect("pick should be accepted")
    }

    pub fn session(&self) -> UploadSession {
        UploadSession::for_draft(
            self.storage.clone(),
            Arc::new(ImageTranscoder::new()),
            &self.draft,
        )
    }
}
