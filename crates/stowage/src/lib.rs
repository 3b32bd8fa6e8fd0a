//! Stowage - pluggable object storage.
//!
//! Stowage stores binary objects with string attributes behind one contract,
//! whichever backend holds them: a local directory tree or an S3 bucket.
//!
//! # Features
//!
//! - **One contract**: `put`/`get`/`remove`/`get_url` behave the same on every backend
//! - **Any content**: objects are built from files, buffers, strings or streams
//! - **Structured keys**: flat, by-date or by-date-time layouts with collision-free generated names
//! - **Deferred removal**: delete stored content only after the owning transaction commits
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stowage::{StorageService, StowageConfig};
//! use stowage_core::{KeyLayout, StorageObject};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = StorageService::from_options(&StowageConfig::load(None)?)?;
//!
//!     let key = service.new_key(Some("hello.txt"), KeyLayout::ByDate);
//!     let object = StorageObject::from_string(&key, "Hello, world!")?
//!         .with_attribute("content-type", "text/plain");
//!     service.save(&object).await?;
//!
//!     let stored = service.get(&key).await?.expect("just stored");
//!     println!("{}", stored.as_string().await?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `stowage_error` - Error types
//! - `stowage_core` - `StorageObject`, key generation, backend options
//! - `stowage_interface` - `StorageBackend` and related traits
//! - `stowage_storage` - Filesystem and S3 backends, request signing
//!
//! This crate (`stowage`) wires them together and re-exports the common types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod reconcile;
mod removal;
mod service;

pub use config::{ENV_PREFIX, StowageConfig};
pub use reconcile::reconcile_orphans;
pub use removal::{RemovalQueue, RemovalReport};
pub use service::{OPT_BACKEND, StorageService};

pub use stowage_core::{
    ATTR_CONTENT_TYPE, ATTR_FILE_NAME, Attributes, BackendOptions, Content, KeyGenerator,
    KeyLayout, StorageObject,
};
pub use stowage_error::{StowageError, StowageErrorKind, StowageResult};
pub use stowage_interface::{Configure, MetadataStore, StorageBackend};
pub use stowage_storage::{FileSystemStorage, RequestSigner, S3Storage, StorageClass};
