//! Cleanup of stored content whose metadata records were orphaned.

use crate::{RemovalQueue, RemovalReport, StorageService};
use stowage_error::StowageResult;
use stowage_interface::MetadataStore;

/// Delete orphaned records and then the content they referenced.
///
/// The records are deleted first; content is only removed once that deletion
/// has committed. When it fails, nothing is removed from storage and the error
/// is returned.
#[tracing::instrument(skip_all, fields(backend = service.backend_name()))]
pub async fn reconcile_orphans<S>(store: &S, service: &StorageService) -> StowageResult<RemovalReport>
where
    S: MetadataStore + ?Sized,
{
    let orphans = store.find_orphans().await?;
    if orphans.is_empty() {
        tracing::debug!("No orphaned records");
        return Ok(RemovalReport::default());
    }

    let mut queue = RemovalQueue::new();
    for key in &orphans {
        queue.schedule(key.as_str());
    }
    tracing::info!(count = queue.len(), "Reconciling orphaned records");

    if let Err(e) = store.delete_records(&orphans).await {
        let discarded = queue.cancel();
        tracing::warn!(count = discarded.len(), error = %e, "Record deletion failed, keeping stored content");
        return Err(e);
    }

    Ok(queue.commit(service).await)
}
