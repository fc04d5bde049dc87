//! Vitrine Storage Library
//!
//! This crate provides the object store abstraction used by upload sessions
//! and its implementations for S3 and the local filesystem.
//!
//! # Object locations
//!
//! An object is addressed by a bucket and a key. Keys are `{folder}/{filename}`
//! where the folder is chosen by the owning form (usually the user id). Keys
//! must not contain `..` or a leading `/`; validation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectLocation, Storage, StorageError, StorageResult};
pub use vitrine_core::StorageBackend;
