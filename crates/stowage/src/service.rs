//! The storage facade handed to every consumer.

use std::sync::Arc;
use stowage_core::{BackendOptions, KeyGenerator, KeyLayout, StorageObject};
use stowage_error::{ConfigError, StowageResult};
use stowage_interface::{Configure, StorageBackend};
use stowage_storage::{FileSystemStorage, S3Storage};

/// Option selecting the backend.
pub const OPT_BACKEND: &str = "storage.backend";

/// Routes storage calls to the one backend chosen at start-up.
///
/// Cloning is cheap; every clone shares the same backend.
///
/// # Examples
///
/// ```no_run
/// use stowage::StorageService;
/// use stowage_core::{BackendOptions, KeyLayout, StorageObject};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = BackendOptions::new()
///     .with("storage.backend", "filesystem")
///     .with("storage.file.dir", "/var/lib/stowage");
/// let service = StorageService::from_options(&options)?;
///
/// let key = service.new_key(Some("notes.txt"), KeyLayout::ByDate);
/// service.put(&key, &StorageObject::from_string(&key, "hello")?).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
    keys: KeyGenerator,
}

impl StorageService {
    /// Wrap an already configured backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            keys: KeyGenerator::new(),
        }
    }

    /// Use `keys` for [`new_key`](Self::new_key) instead of the system clock.
    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    /// Select and configure the backend named by `storage.backend`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the backend name is missing or
    /// unknown, or when the backend rejects its options.
    #[tracing::instrument(skip(options), fields(options = options.len()))]
    pub fn from_options(options: &BackendOptions) -> StowageResult<Self> {
        let name = options.require(OPT_BACKEND)?;
        let backend: Arc<dyn StorageBackend> = match name.to_ascii_lowercase().as_str() {
            "filesystem" | "file" | "local" => {
                Arc::new(FileSystemStorage::configure(options)?)
            }
            "s3" => Arc::new(S3Storage::configure(options)?),
            other => {
                return Err(ConfigError::new(format!("unknown storage backend: {}", other)).into());
            }
        };

        tracing::info!(backend = backend.name(), "Storage service ready");
        Ok(Self::new(backend))
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The active backend.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Fetch the object stored under `key`.
    pub async fn get(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        self.backend.get(key).await
    }

    /// Store `object` under `key`.
    pub async fn put(&self, key: &str, object: &StorageObject) -> StowageResult<()> {
        self.backend.put(key, object).await
    }

    /// Store `object` under its own key.
    pub async fn save(&self, object: &StorageObject) -> StowageResult<()> {
        self.backend.save(object).await
    }

    /// Delete `key`, returning the removed object when the backend can.
    pub async fn remove(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        self.backend.remove(key).await
    }

    /// Public URL for `key`.
    pub async fn get_url(&self, key: &str) -> StowageResult<Option<String>> {
        self.backend.get_url(key).await
    }

    /// Generate a key for a new object.
    pub fn new_key(&self, name: Option<&str>, layout: KeyLayout) -> String {
        self.keys.new_key(name, layout)
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}
