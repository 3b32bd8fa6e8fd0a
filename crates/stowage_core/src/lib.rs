//! Core data types for the Stowage object storage library.
//!
//! This crate provides the value types every backend shares:
//!
//! - [`StorageObject`]: a key, a set of string attributes and content held as a
//!   file, a byte buffer, a string or a live reader
//! - [`KeyGenerator`]: collision-resistant key generation with date layouts
//! - [`BackendOptions`]: the flat option map backends are configured from

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod key;
mod object;
mod options;

pub use key::{KeyGenerator, KeyLayout};
pub use object::{
    ATTR_CONTENT_TYPE, ATTR_FILE_NAME, Attributes, Content, LocalFile, ObjectFile, ObjectReader,
    StorageObject, StreamContent, TempFile,
};
pub use options::BackendOptions;
