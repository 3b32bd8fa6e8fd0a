//! Storage backends for Stowage.
//!
//! Two implementations of [`StorageBackend`](stowage_interface::StorageBackend):
//!
//! - [`FileSystemStorage`] keeps content under a root directory, one file per
//!   key, with attributes in a `<key>.attr` sidecar
//! - [`S3Storage`] talks to an S3-compatible REST endpoint, signing each
//!   request with [`RequestSigner`]
//!
//! Both are built from a [`BackendOptions`](stowage_core::BackendOptions) map
//! through [`Configure`](stowage_interface::Configure).
//!
//! # Example
//!
//! ```rust
//! use stowage_core::StorageObject;
//! use stowage_interface::StorageBackend;
//! use stowage_storage::FileSystemStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/stowage")?;
//!
//! let object = StorageObject::from_string("notes/hello.txt", "hello")?
//!     .with_attribute("content-type", "text/plain");
//! storage.save(&object).await?;
//!
//! let stored = storage.get("notes/hello.txt").await?.expect("stored");
//! assert_eq!(stored.as_string().await?, "hello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod s3;
mod sidecar;
pub mod signer;
mod storage_class;

pub use filesystem::{FileSystemStorage, OPT_FILE_DIR, OPT_URL_ROOT};
pub use s3::{
    ATTR_STORAGE_CLASS, OPT_BUCKET, OPT_DEFAULT_STORAGE_CLASS, OPT_ENDPOINT, OPT_KEY_ID,
    OPT_KEY_SECRET, OPT_STATIC_WEB_ENDPOINT, S3Storage, SignedRequest,
};
pub use signer::RequestSigner;
pub use storage_class::StorageClass;
