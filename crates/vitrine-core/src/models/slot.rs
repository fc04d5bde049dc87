use serde::{Deserialize, Serialize};

use super::media::{ImageBuffer, SourceRef};

/// Why a slot did not accept the image picked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    SensitiveContent,
    ModerationUnavailable,
    ModerationFailed,
    AssetLoadFailure,
}

/// Lifecycle state of a single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    /// An assignment is reading and classifying the picked asset
    Loading,
    Occupied {
        image: ImageBuffer,
        source: SourceRef,
    },
    /// Terminal display state for a refused pick; behaves like `Empty` otherwise
    Rejected(RejectionReason),
}

impl SlotState {
    pub fn is_occupied(&self) -> bool {
        matches!(self, SlotState::Occupied { .. })
    }

    /// A vacant slot can be filled by the reconciler.
    pub fn is_vacant(&self) -> bool {
        matches!(self, SlotState::Empty | SlotState::Rejected(_))
    }

    pub fn image(&self) -> Option<&ImageBuffer> {
        match self {
            SlotState::Occupied { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<&SourceRef> {
        match self {
            SlotState::Occupied { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Snapshot of one slot of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub state: SlotState,
}

/// An occupied slot, in the shape the upload session consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupiedSlot {
    pub index: usize,
    pub image: ImageBuffer,
    pub source: SourceRef,
}

impl Slot {
    pub fn as_occupied(&self) -> Option<OccupiedSlot> {
        match &self.state {
            SlotState::Occupied { image, source } => Some(OccupiedSlot {
                index: self.index,
                image: image.clone(),
                source: source.clone(),
            }),
            _ => None,
        }
    }
}
