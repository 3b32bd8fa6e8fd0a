//! Trait definitions for the Stowage object storage library.
//!
//! This crate provides the contract every storage backend implements, plus the
//! boundary trait for the metadata layer that references stored keys.

mod traits;

pub use traits::{Configure, MetadataStore, StorageBackend};
