//! Tests for deferred removal and orphan reconciliation.

use std::sync::{Arc, Mutex};
use stowage::{
    FileSystemStorage, MetadataStore, RemovalQueue, StorageBackend, StorageObject, StorageService,
    StowageResult, reconcile_orphans,
};
use stowage_error::{StorageError, StorageErrorKind};
use tempfile::TempDir;

async fn service_with(keys: &[&str]) -> (TempDir, StorageService) {
    let temp_dir = TempDir::new().unwrap();
    let backend = FileSystemStorage::new(temp_dir.path()).unwrap();
    for key in keys {
        let object = StorageObject::from_string(*key, format!("content of {}", key)).unwrap();
        backend.save(&object).await.unwrap();
    }
    (temp_dir, StorageService::new(Arc::new(backend)))
}

/// Backend that refuses to remove one key.
struct LockedKey {
    inner: FileSystemStorage,
    locked: &'static str,
}

#[async_trait::async_trait]
impl StorageBackend for LockedKey {
    fn name(&self) -> &'static str {
        "locked"
    }

    async fn get(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, object: &StorageObject) -> StowageResult<()> {
        self.inner.put(key, object).await
    }

    async fn remove(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        if key == self.locked {
            return Err(StorageError::new(StorageErrorKind::FileDelete(key.to_string())).into());
        }
        self.inner.remove(key).await
    }

    async fn get_url(&self, key: &str) -> StowageResult<Option<String>> {
        self.inner.get_url(key).await
    }
}

/// In-memory record table.
#[derive(Default)]
struct Records {
    orphans: Vec<String>,
    deleted: Mutex<Vec<String>>,
    fail_delete: bool,
}

#[async_trait::async_trait]
impl MetadataStore for Records {
    async fn find_orphans(&self) -> StowageResult<Vec<String>> {
        Ok(self.orphans.clone())
    }

    async fn delete_records(&self, keys: &[String]) -> StowageResult<()> {
        if self.fail_delete {
            return Err(StorageError::new(StorageErrorKind::FileWrite("records locked".to_string())).into());
        }
        self.deleted.lock().unwrap().extend_from_slice(keys);
        Ok(())
    }
}

#[tokio::test]
async fn test_commit_removes_scheduled_keys() {
    let (_temp_dir, service) = service_with(&["a.txt", "b/c.txt", "keep.txt"]).await;

    let mut queue = RemovalQueue::new();
    queue.schedule("a.txt");
    queue.schedule("b/c.txt");
    queue.schedule("a.txt");
    queue.schedule("never-stored.txt");
    assert_eq!(queue.len(), 3);

    let report = queue.commit(&service).await;
    assert!(report.is_clean());
    assert_eq!(report.removed(), &vec!["a.txt", "b/c.txt", "never-stored.txt"]);

    assert!(service.get("a.txt").await.unwrap().is_none());
    assert!(service.get("b/c.txt").await.unwrap().is_none());
    assert!(service.get("keep.txt").await.unwrap().is_some());
}

#[tokio::test]
async fn test_cancel_leaves_storage_untouched() {
    let (_temp_dir, service) = service_with(&["a.txt"]).await;

    let mut queue = RemovalQueue::new();
    queue.schedule("a.txt");
    assert_eq!(queue.cancel(), vec!["a.txt".to_string()]);

    assert!(service.get("a.txt").await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_removal_does_not_stop_the_rest() {
    let temp_dir = TempDir::new().unwrap();
    let inner = FileSystemStorage::new(temp_dir.path()).unwrap();
    for key in ["first.txt", "locked.txt", "last.txt"] {
        inner
            .save(&StorageObject::from_string(key, "x").unwrap())
            .await
            .unwrap();
    }
    let service = StorageService::new(Arc::new(LockedKey {
        inner,
        locked: "locked.txt",
    }));

    let mut queue = RemovalQueue::new();
    for key in ["first.txt", "locked.txt", "last.txt"] {
        queue.schedule(key);
    }
    let report = queue.commit(&service).await;

    assert!(!report.is_clean());
    assert_eq!(report.removed(), &vec!["first.txt", "last.txt"]);
    assert_eq!(report.failed_keys().collect::<Vec<_>>(), vec!["locked.txt"]);
    assert!(service.get("locked.txt").await.unwrap().is_some());
}

#[tokio::test]
async fn test_commit_in_background() {
    let (_temp_dir, service) = service_with(&["bg.txt"]).await;

    let mut queue = RemovalQueue::new();
    queue.schedule("bg.txt");
    let report = queue.commit_in_background(service.clone()).await.unwrap();

    assert_eq!(report.removed(), &vec!["bg.txt"]);
    assert!(service.get("bg.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reconcile_deletes_records_then_content() {
    let (_temp_dir, service) = service_with(&["orphan-1.jpg", "orphan-2.jpg", "live.jpg"]).await;
    let records = Records {
        orphans: vec!["orphan-1.jpg".to_string(), "orphan-2.jpg".to_string()],
        ..Default::default()
    };

    let report = reconcile_orphans(&records, &service).await.unwrap();

    assert_eq!(report.removed().len(), 2);
    assert_eq!(*records.deleted.lock().unwrap(), records.orphans);
    assert!(service.get("orphan-1.jpg").await.unwrap().is_none());
    assert!(service.get("live.jpg").await.unwrap().is_some());
}

#[tokio::test]
async fn test_reconcile_keeps_content_when_record_deletion_fails() {
    let (_temp_dir, service) = service_with(&["orphan.jpg"]).await;
    let records = Records {
        orphans: vec!["orphan.jpg".to_string()],
        fail_delete: true,
        ..Default::default()
    };

    assert!(reconcile_orphans(&records, &service).await.is_err());
    assert!(service.get("orphan.jpg").await.unwrap().is_some());
}

#[tokio::test]
async fn test_reconcile_without_orphans() {
    let (_temp_dir, service) = service_with(&[]).await;
    let records = Records::default();

    let report = reconcile_orphans(&records, &service).await.unwrap();
    assert!(report.removed().is_empty());
    assert!(records.deleted.lock().unwrap().is_empty());
}
