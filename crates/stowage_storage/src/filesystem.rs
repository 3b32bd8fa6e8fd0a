//! Filesystem-based storage implementation.
//!
//! Keys map onto nested directories under a root; attributes live next to the
//! content in a sidecar file.

use crate::sidecar::{self, SIDECAR_SUFFIX};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use stowage_core::{Attributes, BackendOptions, StorageObject, TempFile};
use stowage_error::{ConfigError, StorageError, StorageErrorKind, StowageResult};
use stowage_interface::{Configure, StorageBackend};
use tokio::io::AsyncWriteExt;

/// Option holding the root directory.
pub const OPT_FILE_DIR: &str = "storage.file.dir";

/// Option holding the public URL prefix for stored keys.
pub const OPT_URL_ROOT: &str = "storage.url.root";

/// Filesystem storage backend.
///
/// A key `2024/03/05/pic.jpg` is stored as:
///
/// ```text
/// {root}/
/// └── 2024/
///     └── 03/
///         └── 05/
///             ├── pic.jpg        (content)
///             └── pic.jpg.attr   (attributes, only when present)
/// ```
///
/// Content is written straight into the destination file. A `get` racing a
/// `put` on the same key may observe a partially written file.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
    url_root: Option<String>,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the root cannot be created, is not a
    /// directory, or is read-only.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> StowageResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            ConfigError::new(format!(
                "cannot create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        let metadata = std::fs::metadata(&root).map_err(|e| {
            ConfigError::new(format!("cannot access storage root {}: {}", root.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(ConfigError::new(format!(
                "storage root {} is not a directory",
                root.display()
            ))
            .into());
        }
        if metadata.permissions().readonly() {
            return Err(ConfigError::new(format!(
                "storage root {} is read-only",
                root.display()
            ))
            .into());
        }

        tracing::info!(path = %root.display(), "Created filesystem storage");
        Ok(Self {
            root,
            url_root: None,
        })
    }

    /// Serve stored keys under `url_root`.
    pub fn with_url_root(mut self, url_root: impl Into<String>) -> Self {
        let mut url_root = url_root.into().replace('\\', "/");
        if !url_root.ends_with('/') {
            url_root.push('/');
        }
        self.url_root = Some(url_root);
        self
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Split a key into path segments.
    ///
    /// Backslashes count as separators and leading or trailing separators are
    /// ignored. Empty, `.` and `..` segments are rejected.
    fn segments(key: &str) -> StowageResult<Vec<&str>> {
        let trimmed = key.trim_matches(|c| c == '/' || c == '\\');
        if trimmed.is_empty() {
            return Err(invalid_key(key, "key is empty"));
        }

        let segments: Vec<&str> = trimmed.split(['/', '\\']).collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(invalid_key(key, "empty or relative path segment"));
        }
        Ok(segments)
    }

    /// Content and sidecar paths for a key, plus the normalized key.
    fn locate(&self, key: &str) -> StowageResult<Located> {
        let segments = Self::segments(key)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| invalid_key(key, "key is empty"))?;

        let dir = parents.iter().fold(self.root.clone(), |dir, s| dir.join(s));
        Ok(Located {
            key: segments.join("/"),
            content: dir.join(name),
            sidecar: dir.join(format!("{}{}", name, SIDECAR_SUFFIX)),
            dir,
        })
    }

    /// Create the directories leading to `dir`, one segment at a time.
    async fn ensure_dir(&self, dir: &Path) -> StowageResult<()> {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        let mut current = self.root.clone();

        for segment in relative.components() {
            current.push(segment);
            match tokio::fs::metadata(&current).await {
                Ok(metadata) if metadata.is_dir() => continue,
                Ok(_) => {
                    return Err(StorageError::new(StorageErrorKind::NotADirectory(
                        current.display().to_string(),
                    ))
                    .into());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                        "{}: {}",
                        current.display(),
                        e
                    )))
                    .into());
                }
            }

            match tokio::fs::create_dir(&current).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                        "{}: {}",
                        current.display(),
                        e
                    )))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// True when a regular file exists at `path`.
    async fn is_stored(path: &Path) -> StowageResult<bool> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(false)
            }
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    /// True when `object` is backed by the very file `path` names.
    async fn is_same_file(object: &StorageObject, path: &Path) -> bool {
        let Some(source) = object.backing_path() else {
            return false;
        };
        match (
            tokio::fs::canonicalize(source).await,
            tokio::fs::canonicalize(path).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    async fn write_content(object: &StorageObject, path: &Path) -> StowageResult<u64> {
        let mut reader = object.as_reader().await?;
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| write_error(path, e))?;

        let size = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| write_error(path, e))?;
        file.flush().await.map_err(|e| write_error(path, e))?;
        Ok(size)
    }

    async fn read_sidecar(path: &Path) -> StowageResult<Attributes> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(sidecar::decode(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Attributes::new()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    async fn remove_if_present(path: &Path) -> StowageResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileDelete(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }
}

struct Located {
    key: String,
    dir: PathBuf,
    content: PathBuf,
    sidecar: PathBuf,
}

impl Configure for FileSystemStorage {
    const BACKEND: &'static str = "filesystem";

    fn configure(options: &BackendOptions) -> StowageResult<Self> {
        let storage = Self::new(options.require(OPT_FILE_DIR)?)?;
        Ok(match options.get(OPT_URL_ROOT) {
            Some(url_root) => storage.with_url_root(url_root),
            None => storage,
        })
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileSystemStorage {
    fn name(&self) -> &'static str {
        Self::BACKEND
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        let located = self.locate(key)?;
        if !Self::is_stored(&located.content).await? {
            tracing::debug!(path = %located.content.display(), "Object not found");
            return Ok(None);
        }

        let attributes = Self::read_sidecar(&located.sidecar).await?;
        tracing::debug!(path = %located.content.display(), attributes = attributes.len(), "Retrieved object");

        Ok(Some(
            StorageObject::from_file(located.key, located.content)?.with_attributes(attributes),
        ))
    }

    #[tracing::instrument(skip(self, object), fields(attributes = object.has_attributes()))]
    async fn put(&self, key: &str, object: &StorageObject) -> StowageResult<()> {
        let located = self.locate(key)?;
        self.ensure_dir(&located.dir).await?;

        if Self::is_same_file(object, &located.content).await {
            tracing::debug!(path = %located.content.display(), "Object already backed by destination, skipping content copy");
        } else {
            let size = Self::write_content(object, &located.content).await?;
            tracing::info!(path = %located.content.display(), size, "Stored object");
        }

        if object.has_attributes() {
            let text = sidecar::encode(&object.attributes());
            tokio::fs::write(&located.sidecar, text)
                .await
                .map_err(|e| write_error(&located.sidecar, e))?;
        } else {
            Self::remove_if_present(&located.sidecar).await?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        let located = self.locate(key)?;
        if !Self::is_stored(&located.content).await? {
            tracing::debug!(path = %located.content.display(), "Nothing to remove");
            return Ok(None);
        }

        let attributes = Self::read_sidecar(&located.sidecar).await?;
        let copy = TempFile::create()?;
        tokio::fs::copy(&located.content, copy.path())
            .await
            .map_err(|e| write_error(copy.path(), e))?;

        tokio::fs::remove_file(&located.content).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileDelete(format!(
                "{}: {}",
                located.content.display(),
                e
            )))
        })?;
        Self::remove_if_present(&located.sidecar).await?;

        tracing::info!(path = %located.content.display(), "Removed object");
        Ok(Some(
            StorageObject::new(located.key, copy)?.with_attributes(attributes),
        ))
    }

    async fn get_url(&self, key: &str) -> StowageResult<Option<String>> {
        let Some(url_root) = &self.url_root else {
            return Ok(None);
        };
        let key = key.replace('\\', "/");
        Ok(Some(format!("{}{}", url_root, key.trim_start_matches('/'))))
    }
}

#[track_caller]
fn invalid_key(key: &str, reason: &str) -> stowage_error::StowageError {
    StorageError::new(StorageErrorKind::InvalidKey(format!("{:?}: {}", key, reason))).into()
}

#[track_caller]
fn write_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::FileWrite(format!(
        "{}: {}",
        path.display(),
        e
    )))
}
