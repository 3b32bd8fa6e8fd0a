//! Flat backend option map.

use std::collections::HashMap;
use stowage_error::{ConfigError, StowageResult};

/// String options a backend is configured from, keyed by dotted names such as
/// `storage.file.dir`.
///
/// # Examples
///
/// ```
/// use stowage_core::BackendOptions;
///
/// let options: BackendOptions = [("storage.s3.bucket", "media")].into_iter().collect();
/// assert_eq!(options.require("storage.s3.bucket").unwrap(), "media");
/// assert!(options.require("storage.s3.key_id").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOptions {
    values: HashMap<String, String>,
}

impl BackendOptions {
    /// Empty option map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Value of an option; blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of a required option.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the option when it is missing.
    #[track_caller]
    pub fn require(&self, name: &str) -> StowageResult<&str> {
        match self.get(name) {
            Some(value) => Ok(value),
            None => Err(ConfigError::missing_option(name).into()),
        }
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no options are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all options.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for BackendOptions {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for BackendOptions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
