//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the stowage binary.

mod commands;
mod storage;

pub use commands::{Cli, Commands};
pub use storage::handle_command;
