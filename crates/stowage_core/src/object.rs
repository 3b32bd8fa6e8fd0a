//! Storage objects and their content representations.
//!
//! A [`StorageObject`] pairs an immutable key and a mutable attribute map with
//! exactly one kind of [`Content`]. Every content kind can be read back as
//! bytes, a string, a local file or an async reader; the conversions that
//! cannot be served in place materialize a buffer or a temporary file.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use stowage_error::{StorageError, StorageErrorKind, StowageResult};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;

/// Attribute holding the MIME type of the content.
pub const ATTR_CONTENT_TYPE: &str = "content-type";

/// Attribute holding the original file name of the content.
pub const ATTR_FILE_NAME: &str = "filename";

/// String attributes attached to a stored object.
pub type Attributes = HashMap<String, String>;

/// Boxed async reader handed out by [`StorageObject::as_reader`].
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// A temporary file that is deleted when dropped.
///
/// Deletion failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl TempFile {
    /// Create an empty temporary file in the system temp directory.
    pub fn create() -> StowageResult<Self> {
        let guard = tempfile::Builder::new()
            .prefix("sobj_")
            .tempfile()
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "create temporary file: {}",
                    e
                )))
            })?
            .into_temp_path();

        Ok(Self {
            path: guard.to_path_buf(),
            guard: Some(guard),
        })
    }

    /// Location of the temporary file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            if let Err(e) = guard.close() {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to delete temporary file");
            }
        }
    }
}

/// The file behind a file-backed object.
#[derive(Debug)]
pub enum ObjectFile {
    /// A file the object only points at; never deleted by the object
    Persistent(PathBuf),
    /// A private copy deleted together with the object
    Temporary(TempFile),
}

impl ObjectFile {
    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        match self {
            ObjectFile::Persistent(path) => path,
            ObjectFile::Temporary(temp) => temp.path(),
        }
    }
}

/// A file holding an object's content, as returned by [`StorageObject::as_file`].
#[derive(Debug)]
pub enum LocalFile<'a> {
    /// The object's own backing file
    Backing(&'a Path),
    /// A fresh temporary file, deleted when this value is dropped
    Temporary(TempFile),
}

impl LocalFile<'_> {
    /// Location of the file.
    pub fn path(&self) -> &Path {
        match self {
            LocalFile::Backing(path) => path,
            LocalFile::Temporary(temp) => temp.path(),
        }
    }

    /// True if the file was synthesized for this call.
    pub fn is_temporary(&self) -> bool {
        matches!(self, LocalFile::Temporary(_))
    }
}

enum StreamState {
    Pending(ObjectReader),
    Buffered(Vec<u8>),
    Consumed,
}

/// A live reader, buffered on the first full read.
///
/// Handing the reader out through [`StorageObject::as_reader`] consumes it;
/// later reads see an exhausted stream.
pub struct StreamContent {
    state: Mutex<StreamState>,
}

impl StreamContent {
    fn new(reader: ObjectReader) -> Self {
        Self {
            state: Mutex::new(StreamState::Pending(reader)),
        }
    }

    async fn read_all(&self) -> StowageResult<Vec<u8>> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, StreamState::Consumed) {
            StreamState::Pending(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await.map_err(|e| {
                    StorageError::new(StorageErrorKind::FileRead(format!("stream: {}", e)))
                })?;
                *state = StreamState::Buffered(buf.clone());
                Ok(buf)
            }
            StreamState::Buffered(buf) => {
                let copy = buf.clone();
                *state = StreamState::Buffered(buf);
                Ok(copy)
            }
            StreamState::Consumed => {
                tracing::debug!("Reading from an already consumed stream");
                Ok(Vec::new())
            }
        }
    }

    async fn take_reader(&self) -> ObjectReader {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, StreamState::Consumed) {
            StreamState::Pending(reader) => reader,
            StreamState::Buffered(buf) => {
                let reader: ObjectReader = Box::new(Cursor::new(buf.clone()));
                *state = StreamState::Buffered(buf);
                reader
            }
            StreamState::Consumed => Box::new(tokio::io::empty()),
        }
    }
}

impl std::fmt::Debug for StreamContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state.try_lock() {
            Ok(guard) => match &*guard {
                StreamState::Pending(_) => "pending",
                StreamState::Buffered(_) => "buffered",
                StreamState::Consumed => "consumed",
            },
            Err(_) => "busy",
        };
        f.debug_struct("StreamContent").field("state", &state).finish()
    }
}

/// The four ways content can be held.
#[derive(Debug, derive_more::From)]
pub enum Content {
    /// Content lives in a file
    File(ObjectFile),
    /// Content is an in-memory byte buffer
    Buffer(Vec<u8>),
    /// Content is a UTF-8 string
    Text(String),
    /// Content is a live reader
    Stream(StreamContent),
}

impl Content {
    /// Wrap an async reader.
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Content::Stream(StreamContent::new(Box::new(reader)))
    }
}

impl From<PathBuf> for Content {
    fn from(path: PathBuf) -> Self {
        Content::File(ObjectFile::Persistent(path))
    }
}

impl From<&Path> for Content {
    fn from(path: &Path) -> Self {
        Content::File(ObjectFile::Persistent(path.to_path_buf()))
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Content::Buffer(bytes.to_vec())
    }
}

impl From<TempFile> for Content {
    fn from(temp: TempFile) -> Self {
        Content::File(ObjectFile::Temporary(temp))
    }
}

/// An item held by, or headed for, a storage backend.
///
/// # Examples
///
/// ```
/// use stowage_core::{StorageObject, ATTR_CONTENT_TYPE};
///
/// # async fn example() -> stowage_error::StowageResult<()> {
/// let object = StorageObject::from_string("2024/03/05/hello.txt", "Hello, world!")?
///     .with_attribute(ATTR_CONTENT_TYPE, "text/plain");
///
/// assert_eq!(object.len().await?, 13);
/// assert_eq!(object.as_bytes().await?, b"Hello, world!");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StorageObject {
    key: String,
    attributes: Attributes,
    content: Content,
}

impl StorageObject {
    /// Create an object from any content representation.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is blank.
    pub fn new(key: impl Into<String>, content: impl Into<Content>) -> StowageResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(
                "key must not be empty".to_string(),
            ))
            .into());
        }

        Ok(Self {
            key,
            attributes: Attributes::new(),
            content: content.into(),
        })
    }

    /// Create an object backed by an existing file.
    pub fn from_file(key: impl Into<String>, path: impl Into<PathBuf>) -> StowageResult<Self> {
        let path: PathBuf = path.into();
        Self::new(key, path)
    }

    /// Create an object backed by a byte buffer.
    pub fn from_bytes(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> StowageResult<Self> {
        let bytes: Vec<u8> = bytes.into();
        Self::new(key, bytes)
    }

    /// Create an object backed by a string.
    pub fn from_string(key: impl Into<String>, text: impl Into<String>) -> StowageResult<Self> {
        let text: String = text.into();
        Self::new(key, text)
    }

    /// Create an object backed by a live reader.
    pub fn from_reader(
        key: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> StowageResult<Self> {
        Self::new(key, Content::reader(reader))
    }

    /// The key addressing this object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The content representation.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Path of the backing file, for file-backed objects.
    pub fn backing_path(&self) -> Option<&Path> {
        match &self.content {
            Content::File(file) => Some(file.path()),
            _ => None,
        }
    }

    /// Look up one attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Shorthand for the `content-type` attribute.
    pub fn content_type(&self) -> Option<&str> {
        self.attribute(ATTR_CONTENT_TYPE)
    }

    /// Set one attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Remove one attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Replace all attributes.
    pub fn set_attributes(&mut self, attributes: Attributes) {
        self.attributes = attributes;
    }

    /// Builder-style [`set_attributes`](Self::set_attributes).
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.set_attributes(attributes);
        self
    }

    /// True if at least one attribute is set.
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// A copy of the attributes.
    ///
    /// Changes to the returned map do not affect the object.
    pub fn attributes(&self) -> Attributes {
        self.attributes.clone()
    }

    /// Read the whole content into memory.
    ///
    /// For stream-backed objects this exhausts the reader and caches the bytes,
    /// so repeated calls return the same content.
    pub async fn as_bytes(&self) -> StowageResult<Vec<u8>> {
        match &self.content {
            Content::File(file) => read_file(file.path()).await,
            Content::Buffer(buf) => Ok(buf.clone()),
            Content::Text(text) => Ok(text.as_bytes().to_vec()),
            Content::Stream(stream) => stream.read_all().await,
        }
    }

    /// Read the whole content as UTF-8 text.
    pub async fn as_string(&self) -> StowageResult<String> {
        if let Content::Text(text) = &self.content {
            return Ok(text.clone());
        }

        String::from_utf8(self.as_bytes().await?).map_err(|e| {
            StorageError::new(StorageErrorKind::Encoding(format!("{}: {}", self.key, e))).into()
        })
    }

    /// Get the content as a local file.
    ///
    /// File-backed objects return their own file. Every other representation is
    /// written to a new temporary file owned by the returned value.
    pub async fn as_file(&self) -> StowageResult<LocalFile<'_>> {
        if let Content::File(file) = &self.content {
            return Ok(LocalFile::Backing(file.path()));
        }

        let temp = TempFile::create()?;
        let bytes = self.as_bytes().await?;
        tokio::fs::write(temp.path(), &bytes).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp.path().display(),
                e
            )))
        })?;

        tracing::debug!(key = %self.key, path = %temp.path().display(), size = bytes.len(), "Materialized temporary file");
        Ok(LocalFile::Temporary(temp))
    }

    /// Open a reader over the content.
    ///
    /// File-backed objects open a fresh handle on every call. A stream-backed
    /// object hands out its original reader once; later calls get an empty
    /// reader unless the stream was buffered first.
    pub async fn as_reader(&self) -> StowageResult<ObjectReader> {
        match &self.content {
            Content::File(file) => {
                let handle = tokio::fs::File::open(file.path())
                    .await
                    .map_err(|e| file_read_error(file.path(), e))?;
                Ok(Box::new(handle))
            }
            Content::Buffer(buf) => Ok(Box::new(Cursor::new(buf.clone()))),
            Content::Text(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
            Content::Stream(stream) => Ok(stream.take_reader().await),
        }
    }

    /// Content length in bytes.
    ///
    /// Stream-backed objects are fully buffered to answer this.
    pub async fn len(&self) -> StowageResult<u64> {
        match &self.content {
            Content::File(file) => {
                let metadata = tokio::fs::metadata(file.path())
                    .await
                    .map_err(|e| file_read_error(file.path(), e))?;
                Ok(metadata.len())
            }
            Content::Buffer(buf) => Ok(buf.len() as u64),
            Content::Text(text) => Ok(text.len() as u64),
            Content::Stream(stream) => Ok(stream.read_all().await?.len() as u64),
        }
    }
}

async fn read_file(path: &Path) -> StowageResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| file_read_error(path, e).into())
}

fn file_read_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::FileRead(format!(
        "{}: {}",
        path.display(),
        e
    )))
}
