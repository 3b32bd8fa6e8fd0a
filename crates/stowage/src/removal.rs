//! Storage removals deferred until the owning transaction commits.
//!
//! Records referencing stored keys usually live in a database. Deleting the
//! stored content before the record deletion commits would leave dangling
//! records on rollback, so keys are queued and only removed once the caller
//! knows the commit succeeded.

use crate::StorageService;
use tokio::task::JoinHandle;

/// Keys waiting to be removed after a commit.
///
/// # Examples
///
/// ```no_run
/// use stowage::{RemovalQueue, StorageService};
///
/// # async fn example(service: StorageService) {
/// let mut queue = RemovalQueue::new();
/// queue.schedule("2024/03/05/old.jpg");
///
/// // ... commit the transaction that deleted the record ...
///
/// let report = queue.commit(&service).await;
/// assert!(report.is_clean());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RemovalQueue {
    keys: Vec<String>,
}

impl RemovalQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `key` for removal. Scheduling the same key twice is a no-op.
    pub fn schedule(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    /// Keys in scheduling order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of queued keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop every queued key without touching storage (the transaction
    /// rolled back). Returns the discarded keys.
    pub fn cancel(self) -> Vec<String> {
        tracing::debug!(count = self.keys.len(), "Removal queue cancelled");
        self.keys
    }

    /// Remove every queued key through `service`.
    ///
    /// A failed removal is logged and recorded; the remaining keys are still
    /// attempted.
    #[tracing::instrument(skip_all, fields(count = self.keys.len(), backend = service.backend_name()))]
    pub async fn commit(self, service: &StorageService) -> RemovalReport {
        let mut report = RemovalReport::default();
        for key in self.keys {
            match service.remove(&key).await {
                Ok(_) => report.removed.push(key),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Post-commit removal failed");
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Post-commit removals finished"
        );
        report
    }

    /// Run [`commit`](Self::commit) on a spawned task.
    pub fn commit_in_background(self, service: StorageService) -> JoinHandle<RemovalReport> {
        tokio::spawn(async move { self.commit(&service).await })
    }
}

/// Outcome of a [`RemovalQueue::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct RemovalReport {
    /// Keys the backend accepted the removal of, including keys that were
    /// already gone
    removed: Vec<String>,
    /// Keys whose removal failed, with the error message
    failed: Vec<(String, String)>,
}

impl RemovalReport {
    /// True when no removal failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Keys whose removal failed.
    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|(key, _)| key.as_str())
    }
}
