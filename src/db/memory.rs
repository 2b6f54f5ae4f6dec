use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{decode_history, encode_history, DurableStore};
use crate::error::StoreFailure;
use crate::models::HistoryItem;

/// Process-local store. Holds the serialized collection so it exercises the
/// same encode/decode path as the SQLite store, and can be told to fail
/// writes to simulate a faulty medium.
#[derive(Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-serialized payload, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn load(&self) -> Result<Vec<HistoryItem>, StoreFailure> {
        let raw = self
            .raw
            .lock()
            .map_err(|e| StoreFailure::Read(e.to_string()))?
            .clone();
        match raw {
            Some(raw) => decode_history(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, items: &[HistoryItem]) -> Result<(), StoreFailure> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreFailure::Write("simulated write failure".to_string()));
        }
        let encoded = encode_history(items)?;
        *self
            .raw
            .lock()
            .map_err(|e| StoreFailure::Write(e.to_string()))? = Some(encoded);
        Ok(())
    }
}
