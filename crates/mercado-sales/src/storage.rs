//! # Voucher Storage
//!
//! The object store that holds voucher files. Engine operations reach it
//! only through the [`VoucherStore`] capability handed to
//! [`SaleEngine::new`](crate::SaleEngine::new).
//!
//! ## Ordering Against the Database
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   BEGIN ──► row writes ──► store.put() ──► COMMIT                       │
//! │                               │              │                          │
//! │                           fails: drop tx  fails: store.delete()         │
//! │                           (rollback)       (compensation, best effort)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A crash between a successful put and the commit leaves an orphaned
//! object. Nothing reclaims it.
//!
//! Objects a committed operation made stale (a replaced receipt, the
//! vouchers of a deleted sale) travel back in a [`Committed`] and are
//! removed by the engine once the operation's deadline no longer applies.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the request.
    #[error("storage backend unavailable: {0}")]
    Transport(String),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Write/delete capability over the voucher object store.
#[async_trait]
pub trait VoucherStore: Send + Sync {
    /// Stores `bytes` under `remote_path`, replacing any existing object.
    async fn put(&self, bytes: &[u8], remote_path: &str) -> Result<(), StorageError>;

    /// Removes the object. Removing a missing object succeeds.
    async fn delete(&self, remote_path: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Naming
// =============================================================================

/// File name of a voucher object: `voucher_{saleId}_{voucherId}.{ext}`.
///
/// A receipt uploaded before it has a voucher id uses `0`.
pub fn voucher_file_name(sale_id: i64, voucher_id: i64, extension: &str) -> String {
    format!("voucher_{sale_id}_{voucher_id}.{extension}")
}

/// Full object path: `vouchers/sale-{saleId}/{fileName}`.
pub fn voucher_remote_path(sale_id: i64, file_name: &str) -> String {
    format!("vouchers/sale-{sale_id}/{file_name}")
}

// =============================================================================
// Post-commit cleanup
// =============================================================================

/// Value of a committed operation and the objects it left unreferenced.
#[derive(Debug)]
pub(crate) struct Committed<T> {
    pub value: T,
    pub sale_id: i64,
    pub stale: Vec<String>,
}

impl<T> Committed<T> {
    pub fn new(value: T, sale_id: i64) -> Self {
        Committed {
            value,
            sale_id,
            stale: Vec::new(),
        }
    }

    pub fn with_stale(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.stale
            .extend(paths.into_iter().filter(|path| !path.is_empty()));
        self
    }
}

/// Deletes objects no row references anymore. A failure leaks the object.
pub(crate) async fn remove_stale(store: &dyn VoucherStore, sale_id: i64, paths: &[String]) {
    for path in paths {
        if let Err(e) = store.delete(path).await {
            warn!(sale_id, path = %path, error = %e, "Failed to delete stale voucher object, leaking it");
        }
    }
}

// =============================================================================
// Local directory store
// =============================================================================

/// Stores objects as files under a root directory.
///
/// Every put writes to a temporary sibling and renames it into place, so a
/// failed put never leaves a partial object behind.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a remote path under the root, rejecting anything that could escape it.
    fn resolve(&self, remote_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(remote_path);
        let is_plain = !remote_path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(StorageError::InvalidPath(remote_path.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl VoucherStore for LocalDirStore {
    async fn put(&self, bytes: &[u8], remote_path: &str) -> Result<(), StorageError> {
        let target = self.resolve(remote_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut temp_name = target.clone().into_os_string();
        temp_name.push(format!(".tmp-{}-{seq}", std::process::id()));
        let temp = PathBuf::from(temp_name);

        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = remote_path, size = bytes.len(), "Stored voucher object");
        Ok(())
    }

    async fn delete(&self, remote_path: &str) -> Result<(), StorageError> {
        let target = self.resolve(remote_path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path = remote_path, "Deleted voucher object");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// In-process object map with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent put fail (or succeed again).
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent delete fail (or succeed again).
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.lock().get(remote_path).cloned()
    }

    pub fn contains(&self, remote_path: &str) -> bool {
        self.lock().contains_key(remote_path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VoucherStore for MemoryStore {
    async fn put(&self, bytes: &[u8], remote_path: &str) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Transport("put rejected".to_string()));
        }
        self.lock().insert(remote_path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, remote_path: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Transport("delete rejected".to_string()));
        }
        self.lock().remove(remote_path);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming() {
        let name = voucher_file_name(12, 0, "pdf");
        assert_eq!(name, "voucher_12_0.pdf");
        assert_eq!(voucher_remote_path(12, &name), "vouchers/sale-12/voucher_12_0.pdf");
    }

    #[tokio::test]
    async fn test_local_store_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(dir.path());

        store.put(b"first", "vouchers/sale-1/voucher_1_0.pdf").await.unwrap();
        store.put(b"second", "vouchers/sale-1/voucher_1_0.pdf").await.unwrap();

        let file = dir.path().join("vouchers/sale-1/voucher_1_0.pdf");
        assert_eq!(std::fs::read(&file).unwrap(), b"second");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("vouchers/sale-1"))
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary files must not survive");

        store.delete("vouchers/sale-1/voucher_1_0.pdf").await.unwrap();
        assert!(!file.exists());
        // Idempotent
        store.delete("vouchers/sale-1/voucher_1_0.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(dir.path());

        for path in ["", "../outside.pdf", "/etc/passwd", "vouchers/../../x"] {
            let err = store.put(b"x", path).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath(_)), "{path}");
        }
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.put(b"a", "vouchers/sale-1/a.png").await.unwrap();
        assert!(store.contains("vouchers/sale-1/a.png"));

        store.fail_puts(true);
        assert!(store.put(b"b", "vouchers/sale-1/b.png").await.is_err());
        assert_eq!(store.len(), 1);

        store.fail_deletes(true);
        assert!(store.delete("vouchers/sale-1/a.png").await.is_err());
        store.fail_deletes(false);
        store.delete("vouchers/sale-1/a.png").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_stale_skips_blank_paths_and_survives_failures() {
        let committed = Committed::new((), 4).with_stale(vec![
            "vouchers/sale-4/voucher_4_1.png".to_string(),
            String::new(),
        ]);
        assert_eq!(committed.stale, vec!["vouchers/sale-4/voucher_4_1.png".to_string()]);

        let store = MemoryStore::new();
        store.put(b"x", &committed.stale[0]).await.unwrap();
        store.fail_deletes(true);
        remove_stale(&store, committed.sale_id, &committed.stale).await;
        assert_eq!(store.len(), 1);

        store.fail_deletes(false);
        remove_stale(&store, committed.sale_id, &committed.stale).await;
        assert!(store.is_empty());
    }
}
