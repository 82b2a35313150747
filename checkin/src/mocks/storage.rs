//! Mock secure storage for testing.

use crate::error::StorageError;
use crate::providers::SecureStorage;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// In-memory secure storage.
///
/// Clones share the same contents, so a "fresh instance" in a test is a new
/// store built from [`MemorySecureStorage::snapshot`]. While the write gate
/// is closed, `set_item` waits before touching the contents.
#[derive(Debug, Clone)]
pub struct MemorySecureStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_gate: Arc<watch::Sender<bool>>,
}

impl Default for MemorySecureStorage {
    fn default() -> Self {
        let (write_gate, _) = watch::channel(true);
        Self {
            items: Arc::default(),
            fail_reads: Arc::default(),
            fail_writes: Arc::default(),
            write_gate: Arc::new(write_gate),
        }
    }
}

impl MemorySecureStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `items`.
    #[must_use]
    pub fn with_items(items: HashMap<String, String>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
            ..Self::default()
        }
    }

    /// Hold every `set_item` until [`MemorySecureStorage::open_write_gate`].
    pub fn close_write_gate(&self) {
        self.write_gate.send_replace(false);
    }

    /// Release held and future writes.
    pub fn open_write_gate(&self) {
        self.write_gate.send_replace(true);
    }

    /// Make every read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write and delete fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }

    fn with_items_mut<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> Result<R, StorageError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| StorageError::Unavailable("Mutex lock failed".to_string()))?;
        Ok(f(&mut items))
    }
}

impl SecureStorage for MemorySecureStorage {
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        let result = if self.fail_reads.load(Ordering::SeqCst) {
            Err(StorageError::Io("injected read failure".to_string()))
        } else {
            self.with_items_mut(|items| items.get(key).cloned())
        };
        async move { result }
    }

    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        let storage = self.clone();
        let (key, value) = (key.to_string(), value.to_string());
        let mut gate = self.write_gate.subscribe();

        async move {
            let _ = gate.wait_for(|open| *open).await;
            if storage.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Io("injected write failure".to_string()));
            }
            storage.with_items_mut(|items| {
                items.insert(key, value);
            })
        }
    }

    fn delete_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Io("injected write failure".to_string()))
        } else {
            self.with_items_mut(|items| {
                items.remove(key);
            })
        };
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::storage::{TOKEN_KEY, persist_session, restore_session};
    use crate::state::Session;
    use serde_json::json;

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user: json!({ "email": "staff@x.pt" }),
        }
    }

    #[tokio::test]
    async fn test_remember_me_round_trip_on_fresh_instance() -> Result<(), StorageError> {
        let storage = MemorySecureStorage::new();
        persist_session(&storage, &session(), true).await?;

        let fresh = MemorySecureStorage::with_items(storage.snapshot());
        assert_eq!(restore_session(&fresh).await, Some(session()));
        Ok(())
    }

    #[tokio::test]
    async fn test_without_remember_me_restore_is_empty() -> Result<(), StorageError> {
        let storage = MemorySecureStorage::new();
        persist_session(&storage, &session(), false).await?;

        let fresh = MemorySecureStorage::with_items(storage.snapshot());
        assert_eq!(restore_session(&fresh).await, None);
        assert!(fresh.snapshot().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_swallows_read_failures() -> Result<(), StorageError> {
        let storage = MemorySecureStorage::new();
        persist_session(&storage, &session(), true).await?;
        storage.set_fail_reads(true);

        assert_eq!(restore_session(&storage).await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_failures_are_reported() {
        let storage = MemorySecureStorage::new();
        storage.set_fail_writes(true);

        assert!(persist_session(&storage, &session(), true).await.is_err());
        assert!(storage.snapshot().get(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_closed_write_gate_holds_writes() {
        let storage = MemorySecureStorage::new();
        storage.close_write_gate();

        let write = tokio::spawn({
            let storage = storage.clone();
            async move { storage.set_item(TOKEN_KEY, "tok").await }
        });
        tokio::task::yield_now().await;
        assert!(storage.snapshot().is_empty());

        storage.open_write_gate();
        assert!(matches!(write.await, Ok(Ok(()))));
        assert_eq!(storage.snapshot().get(TOKEN_KEY).map(String::as_str), Some("tok"));
    }
}
