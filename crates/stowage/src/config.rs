//! Layered configuration producing backend options.

use config::{Config, Environment, File, FileFormat};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stowage_core::BackendOptions;
use stowage_error::{ConfigError, StowageError, StowageResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../stowage.toml");

/// Prefix of environment variables overriding configuration.
pub const ENV_PREFIX: &str = "STOWAGE";

/// Builds [`BackendOptions`] from layered configuration sources.
///
/// Sources in order of precedence (later sources override earlier):
/// 1. Bundled defaults (stowage.toml shipped with the crate)
/// 2. User config in home directory (~/.config/stowage/stowage.toml)
/// 3. User config in current directory (./stowage.toml), or an explicit file
/// 4. Environment variables such as `STOWAGE_STORAGE__S3__BUCKET`
///
/// Nested tables become dotted option names, so `[storage.s3] bucket = "x"`
/// yields `storage.s3.bucket`.
#[derive(Debug, Clone)]
pub struct StowageConfig {
    file: Option<PathBuf>,
    user_config: bool,
    environment: Option<HashMap<String, String>>,
}

impl StowageConfig {
    /// Configuration with every default source enabled.
    pub fn new() -> Self {
        Self {
            file: None,
            user_config: true,
            environment: None,
        }
    }

    /// Read `path` instead of `./stowage.toml`. The file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip the config file in the home directory.
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    /// Load options from the default sources, reading `path` when given.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stowage::StowageConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let options = StowageConfig::load(None)?;
    /// println!("backend: {:?}", options.get("storage.backend"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: Option<&Path>) -> StowageResult<BackendOptions> {
        let config = match path {
            Some(path) => Self::new().with_file(path),
            None => Self::new(),
        };
        config.build()
    }

    /// Merge every enabled source into a flat option map.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an explicit file is missing or any
    /// source cannot be parsed.
    #[instrument(skip(self), fields(file = ?self.file))]
    pub fn build(&self) -> StowageResult<BackendOptions> {
        debug!("Loading configuration with precedence: env > file > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = self.user_config.then(dirs::home_dir).flatten() {
            let home_config = home.join(".config/stowage/stowage.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match &self.file {
            Some(path) => builder.add_source(File::from(path.as_path())),
            None => builder.add_source(File::with_name("stowage").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(self.environment.clone()),
        );

        let value: Value = builder
            .build()
            .map_err(|e| {
                StowageError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StowageError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        let mut options = HashMap::new();
        flatten("", &value, &mut options);
        debug!(count = options.len(), "Configuration loaded");
        Ok(options.into())
    }
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect every scalar under `value` keyed by its dotted path.
fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(table) => {
            for (name, child) in table {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                flatten(&path, child, out);
            }
        }
        Value::Null => {}
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
