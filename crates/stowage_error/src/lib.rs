//! Error types for the Stowage library.
//!
//! This crate provides the foundation error types used throughout the Stowage workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! A missing key is never an error in Stowage: backends return `Ok(None)`.
//!
//! # Examples
//!
//! ```
//! use stowage_error::{StowageResult, HttpError};
//!
//! fn fetch_object() -> StowageResult<Vec<u8>> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_object() {
//!     Ok(data) => println!("Got {} bytes", data.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod storage;

pub use config::ConfigError;
pub use error::{StowageError, StowageErrorKind, StowageResult};
pub use http::HttpError;
pub use storage::{StorageError, StorageErrorKind};
