//! Fixed-capacity draft of picked images.
//!
//! Every slot moves through `Empty|Rejected -> Loading -> Occupied|Empty|Rejected`.
//! Assignments to different slots run concurrently; for one slot the most
//! recently started assignment wins. Each `assign` takes a generation number
//! for its slot when it starts and only writes its result if that number is
//! still current when it resolves. An assignment dropped before it resolves
//! hands its slot back as `Empty`.

use bytes::Bytes;
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use vitrine_core::{
    ImageBuffer, MediaError, MediaId, MediaProfile, MediaResult, ModerationVerdict,
    OccupiedSlot, Slot, SlotState, SourceRef,
};
use vitrine_moderation::ModerationGate;
use vitrine_processing::sniff_format;

use crate::source::AssetSource;

/// Result of an assignment that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// The image now occupies the slot
    Accepted(MediaId),
    /// A newer assignment to the same slot started first; nothing was written
    Superseded,
    /// The draft was disposed while the assignment ran; nothing was written
    Discarded,
}

#[derive(Debug)]
struct SlotEntry {
    state: SlotState,
    generation: u64,
}

#[derive(Debug)]
struct DraftState {
    slots: Vec<SlotEntry>,
    has_user_initiated_changes: bool,
}

/// Reverts the slot of an abandoned assignment so it does not stay `Loading`.
struct LoadingGuard<'a> {
    draft: &'a DraftMediaSet,
    index: usize,
    generation: u64,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.draft.is_disposed() {
            return;
        }
        let mut state = self.draft.lock();
        let slot = &mut state.slots[self.index];
        if slot.generation == self.generation && slot.state == SlotState::Loading {
            slot.state = SlotState::Empty;
            tracing::debug!(
                slot = self.index,
                generation = self.generation,
                "Assignment abandoned, slot released"
            );
        }
    }
}

pub struct DraftMediaSet {
    profile: MediaProfile,
    gate: Arc<dyn ModerationGate>,
    source: Arc<dyn AssetSource>,
    state: Mutex<DraftState>,
    cancel: CancellationToken,
}

impl DraftMediaSet {
    pub fn new(
        profile: MediaProfile,
        gate: Arc<dyn ModerationGate>,
        source: Arc<dyn AssetSource>,
    ) -> Self {
        let slots = (0..profile.capacity)
            .map(|_| SlotEntry {
                state: SlotState::Empty,
                generation: 0,
            })
            .collect();

        Self {
            profile,
            gate,
            source,
            state: Mutex::new(DraftState {
                slots,
                has_user_initiated_changes: false,
            }),
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn profile(&self) -> &MediaProfile {
        &self.profile
    }

    pub fn capacity(&self) -> usize {
        self.profile.capacity
    }

    /// Put the asset behind `source` into slot `index`.
    ///
    /// Per-slot failures (`SensitiveContent`, `ModerationUnavailable`,
    /// `ModerationFailed`, `AssetLoadFailure`, `AssetTooLarge`) leave the slot
    /// vacant and are returned to the caller. A stale or post-disposal
    /// resolution returns `Superseded`/`Discarded` even if it failed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the draft capacity.
    #[tracing::instrument(skip_all, fields(slot = index, profile = %self.profile.name))]
    pub async fn assign(&self, index: usize, source: SourceRef) -> MediaResult<AssignOutcome> {
        assert!(
            index < self.profile.capacity,
            "slot index {} out of range for capacity {}",
            index,
            self.profile.capacity
        );

        let generation = {
            let mut state = self.lock();
            if self.cancel.is_cancelled() {
                return Ok(AssignOutcome::Discarded);
            }
            let slot = &mut state.slots[index];
            let displaced = slot.state.is_occupied();
            slot.generation += 1;
            slot.state = SlotState::Loading;
            let generation = slot.generation;
            // A replaced image is gone whatever this pick resolves to
            if displaced {
                state.has_user_initiated_changes = true;
            }
            generation
        };
        let guard = LoadingGuard {
            draft: self,
            index,
            generation,
            armed: true,
        };

        let result = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = self.acquire(&source) => Some(result),
        };
        guard.disarm();
        let Some(result) = result else {
            return Ok(AssignOutcome::Discarded);
        };

        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return Ok(AssignOutcome::Discarded);
        }
        if state.slots[index].generation != generation {
            tracing::debug!(generation, "Discarding superseded assignment");
            return Ok(AssignOutcome::Superseded);
        }

        match result {
            Ok(image) => {
                let id = image.id();
                tracing::info!(
                    generation,
                    media_id = %id,
                    size_bytes = image.len(),
                    "Image accepted into slot"
                );
                state.slots[index].state = SlotState::Occupied { image, source };
                state.has_user_initiated_changes = true;
                Ok(AssignOutcome::Accepted(id))
            }
            Err(err) => {
                tracing::info!(generation, error = %err, "Image refused for slot");
                state.slots[index].state = match err.rejection_reason() {
                    Some(reason) if self.profile.keep_rejected_state => SlotState::Rejected(reason),
                    _ => SlotState::Empty,
                };
                Err(err)
            }
        }
    }

    /// Assign several sources to the free slots in ascending order.
    ///
    /// Sources beyond the free capacity are ignored. Returns the slot each
    /// accepted source was given alongside its outcome.
    pub async fn assign_to_free_slots(
        &self,
        sources: Vec<SourceRef>,
    ) -> Vec<(usize, MediaResult<AssignOutcome>)> {
        let free: Vec<usize> = {
            let state = self.lock();
            state
                .slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.state.is_vacant())
                .map(|(index, _)| index)
                .collect()
        };

        let assignments = free
            .into_iter()
            .zip(sources)
            .map(|(index, source)| async move { (index, self.assign(index, source).await) });

        join_all(assignments).await
    }

    /// Read, size-check, sniff and classify one asset.
    async fn acquire(&self, source: &SourceRef) -> MediaResult<ImageBuffer> {
        let data = self.source.read_bytes(source).await?;
        self.check_asset(source, &data)?;

        if self.profile.moderation_required {
            let start = std::time::Instant::now();
            let verdict = self.gate.classify(&data).await;
            tracing::debug!(
                gate = self.gate.name(),
                verdict = %verdict,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Moderation verdict"
            );

            match verdict {
                ModerationVerdict::NotSensitive => {}
                ModerationVerdict::Sensitive => return Err(MediaError::SensitiveContent),
                ModerationVerdict::Unavailable => return Err(MediaError::ModerationUnavailable),
                ModerationVerdict::TransportError => return Err(MediaError::ModerationFailed),
            }
        }

        Ok(ImageBuffer::new(data))
    }

    fn check_asset(&self, source: &SourceRef, data: &Bytes) -> MediaResult<()> {
        if data.len() > self.profile.max_asset_bytes {
            return Err(MediaError::AssetTooLarge {
                size: data.len(),
                limit: self.profile.max_asset_bytes,
            });
        }
        sniff_format(data).map_err(|e| MediaError::asset_load(source.location(), e))?;
        Ok(())
    }

    /// Empty the slot holding the image `id`. Returns false when no slot holds it.
    pub async fn clear(&self, id: MediaId) -> bool {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return false;
        }

        let Some(index) = state
            .slots
            .iter()
            .position(|slot| slot.state.image().map(ImageBuffer::id) == Some(id))
        else {
            return false;
        };

        state.slots[index].state = SlotState::Empty;
        state.has_user_initiated_changes = true;
        tracing::info!(slot = index, media_id = %id, "Slot cleared");
        true
    }

    /// Occupied slots in ascending index order.
    pub async fn occupied_slots(&self) -> Vec<OccupiedSlot> {
        self.slots()
            .await
            .iter()
            .filter_map(Slot::as_occupied)
            .collect()
    }

    /// Snapshot of every slot.
    pub async fn slots(&self) -> Vec<Slot> {
        let state = self.lock();
        state
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| Slot {
                index,
                state: slot.state.clone(),
            })
            .collect()
    }

    pub async fn count(&self) -> usize {
        let state = self.lock();
        state.slots.iter().filter(|s| s.state.is_occupied()).count()
    }

    /// Slots that are neither occupied nor loading.
    pub async fn free_capacity(&self) -> usize {
        let state = self.lock();
        state.slots.iter().filter(|s| s.state.is_vacant()).count()
    }

    /// Whether the owning form may submit.
    pub async fn is_valid(&self) -> bool {
        self.profile.images_optional || self.count().await > 0
    }

    pub async fn has_user_initiated_changes(&self) -> bool {
        self.lock().has_user_initiated_changes
    }

    /// Reset the change flag after the owning form committed a submit.
    pub async fn mark_committed(&self) {
        self.lock().has_user_initiated_changes = false;
    }

    /// URLs of remote images currently represented by a slot.
    pub async fn remote_urls(&self) -> Vec<String> {
        let state = self.lock();
        state
            .slots
            .iter()
            .filter_map(|slot| slot.state.source()?.remote_url().map(str::to_string))
            .collect()
    }

    /// Place an already vetted remote image into the first vacant slot.
    ///
    /// Skips moderation and does not count as a user change. Returns the slot
    /// used, or `None` when no slot is vacant or the draft was disposed.
    pub async fn place_remote(&self, url: &str, image: ImageBuffer) -> Option<usize> {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return None;
        }

        let index = state.slots.iter().position(|slot| slot.state.is_vacant())?;
        state.slots[index].state = SlotState::Occupied {
            image,
            source: SourceRef::remote(url),
        };
        Some(index)
    }

    /// Abandon the draft. In-flight assignments resolve as `Discarded` and
    /// sessions bound to this draft stop issuing uploads.
    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(profile = %self.profile.name, "Draft disposed");
        }
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token cancelled when the draft is disposed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
