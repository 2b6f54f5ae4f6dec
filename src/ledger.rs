use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;

use crate::db::DurableStore;
use crate::error::{AppError, Result, StoreFailure};
use crate::models::HistoryItem;

/// Ordered log of completed summaries, newest first, mirrored to a
/// [`DurableStore`] after every mutation.
///
/// The working set is authoritative: a failed flush is reported to the
/// caller but the mutation stays applied in memory, and `persist` can be
/// called again later.
pub struct HistoryLedger {
    items: RwLock<VecDeque<HistoryItem>>,
    store: Arc<dyn DurableStore>,
    write_gate: Mutex<()>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            items: RwLock::new(VecDeque::new()),
            store,
            write_gate: Mutex::new(()),
        }
    }

    /// Replace the working set with the stored collection.
    ///
    /// Any failure leaves the ledger empty and usable; the error is returned
    /// so the host can tell the user their history could not be read.
    pub async fn load_from_store(&self) -> std::result::Result<usize, StoreFailure> {
        let _gate = self.write_gate.lock().await;
        match self.store.load().await {
            Ok(loaded) => {
                let count = loaded.len();
                *self.write() = loaded.into();
                tracing::debug!("Loaded {} history items", count);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Starting with empty history: {}", e);
                self.write().clear();
                Err(e)
            }
        }
    }

    /// Flush the current working set.
    pub async fn persist(&self) -> std::result::Result<(), StoreFailure> {
        let _gate = self.write_gate.lock().await;
        let snapshot = self.list();
        self.flush(&snapshot).await
    }

    /// Insert `item` at the head. A store failure is returned as
    /// [`AppError::Store`] after the item has been accepted in memory.
    pub async fn append(&self, item: HistoryItem) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let mut items = self.write();
            if items.iter().any(|existing| existing.id == item.id) {
                return Err(AppError::DuplicateId(item.id));
            }
            items.push_front(item);
            items.iter().cloned().collect::<Vec<_>>()
        };
        self.flush(&snapshot).await?;
        Ok(())
    }

    /// Delete the item with `id`. Returns whether anything was removed;
    /// an unknown id is not an error and triggers no write.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let mut items = self.write();
            let before = items.len();
            items.retain(|item| item.id != id);
            if items.len() == before {
                return Ok(false);
            }
            items.iter().cloned().collect::<Vec<_>>()
        };
        self.flush(&snapshot).await?;
        Ok(true)
    }

    /// Copy of every item, newest first.
    pub fn list(&self) -> Vec<HistoryItem> {
        self.read().iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<HistoryItem> {
        self.read().iter().find(|item| item.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    async fn flush(&self, snapshot: &[HistoryItem]) -> std::result::Result<(), StoreFailure> {
        self.store.save(snapshot).await.inspect_err(|e| {
            tracing::error!("Failed to persist history: {}", e);
        })
    }

    // A panic while holding the lock cannot leave the deque half-mutated,
    // so a poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<HistoryItem>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<HistoryItem>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }
}
