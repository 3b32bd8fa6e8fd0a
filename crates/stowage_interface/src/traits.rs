//! Trait definitions for storage backends and their collaborators.

use async_trait::async_trait;
use stowage_core::{BackendOptions, StorageObject};
use stowage_error::StowageResult;

/// Core trait that all storage backends must implement.
///
/// Keys are `/`-separated on every backend. A key that does not exist is a
/// normal outcome reported as `Ok(None)`, never an error.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend name (e.g., "filesystem", "s3").
    fn name(&self) -> &'static str;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> StowageResult<Option<StorageObject>>;

    /// Store `object`'s content and attributes under `key`, replacing anything
    /// already there.
    async fn put(&self, key: &str, object: &StorageObject) -> StowageResult<()>;

    /// Delete whatever is stored under `key`.
    ///
    /// Returns a copy of the removed object that stays readable after the
    /// stored entry is gone, when the backend can provide one.
    async fn remove(&self, key: &str) -> StowageResult<Option<StorageObject>>;

    /// Public URL for `key`, if the backend serves content externally.
    async fn get_url(&self, key: &str) -> StowageResult<Option<String>>;

    /// Store `object` under its own key.
    async fn save(&self, object: &StorageObject) -> StowageResult<()> {
        self.put(object.key(), object).await
    }
}

/// Backends constructed from a flat option map.
pub trait Configure: Sized {
    /// Option naming this backend in `storage.backend`.
    const BACKEND: &'static str;

    /// Validate `options` and build the backend.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when a required option is missing or
    /// the backend's root resource cannot be prepared.
    fn configure(options: &BackendOptions) -> StowageResult<Self>;
}

/// The persistence layer holding records that reference stored keys.
///
/// Implemented outside this workspace (by the application's database layer).
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Keys of records no longer referenced by anything live.
    async fn find_orphans(&self) -> StowageResult<Vec<String>>;

    /// Delete the records for `keys` and durably commit the deletion.
    async fn delete_records(&self, keys: &[String]) -> StowageResult<()>;
}
