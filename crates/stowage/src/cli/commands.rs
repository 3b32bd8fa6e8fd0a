//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stowage::KeyLayout;

/// Stowage - store, fetch and remove objects in the configured backend
#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(about = "Store, fetch and remove objects in the configured storage backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to read instead of ./stowage.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file and print its key
    Put {
        /// File to store
        file: PathBuf,

        /// Exact key to store under
        #[arg(long, conflicts_with_all = ["name", "layout"])]
        key: Option<String>,

        /// Name placed after the layout prefix (generated when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Key layout: flat, by-date or by-date-time
        #[arg(long, default_value_t = KeyLayout::ByDate)]
        layout: KeyLayout,

        /// Content type recorded with the object
        #[arg(long)]
        content_type: Option<String>,

        /// Extra attribute as name=value (repeatable)
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Fetch an object
    Get {
        /// Key of the object
        key: String,

        /// Write the content here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove an object
    Remove {
        /// Key of the object
        key: String,
    },

    /// Print the public URL of a key
    Url {
        /// Key of the object
        key: String,
    },

    /// Print a freshly generated key
    NewKey {
        /// Name placed after the layout prefix (generated when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Key layout: flat, by-date or by-date-time
        #[arg(long, default_value_t = KeyLayout::ByDate)]
        layout: KeyLayout,
    },
}

/// Parse `name=value`.
pub fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got {:?}", raw)),
    }
}
