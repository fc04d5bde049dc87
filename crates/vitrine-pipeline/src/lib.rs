//! Vitrine Pipeline Library
//!
//! The bounded-slot media pipeline used by every create and edit flow:
//!
//! - [`DraftMediaSet`] holds up to N picked images, each gated by moderation
//! - [`UploadSession`] transcodes and uploads the occupied slots in order,
//!   plus a single thumbnail, reporting progress as it goes
//! - [`RemoteReconciler`] seeds a draft with images already stored for the
//!   record being edited
//! - [`cleanup`] removes stored objects superseded by a committed edit
//!
//! Services are injected as trait objects so every component runs against
//! fakes in tests.

pub mod cleanup;
pub mod draft;
pub mod reconcile;
pub mod session;
pub mod source;

#[cfg(test)]
mod test_helpers;

pub use cleanup::{purge_urls, PurgeReport};
pub use draft::{AssignOutcome, DraftMediaSet};
pub use reconcile::{ReconcileReport, RemoteLedger, RemoteReconciler};
pub use session::UploadSession;
pub use source::{AssetSource, FsHttpAssetSource};
