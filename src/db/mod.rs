mod memory;
mod repository;
mod schema;

use async_trait::async_trait;

use crate::error::StoreFailure;
use crate::models::HistoryItem;

pub use memory::MemoryStore;
pub use repository::SqliteStore;

/// Namespace the history collection is stored under.
pub const HISTORY_NAMESPACE: &str = "bookSummaryHistory";

/// Whole-collection durable storage for the history ledger.
///
/// `load` on a store that has never been written returns an empty list.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn load(&self) -> Result<Vec<HistoryItem>, StoreFailure>;

    async fn save(&self, items: &[HistoryItem]) -> Result<(), StoreFailure>;
}

/// Serialize the ledger for storage, newest first.
pub(crate) fn encode_history(items: &[HistoryItem]) -> Result<String, StoreFailure> {
    serde_json::to_string(items).map_err(|e| StoreFailure::Write(e.to_string()))
}

/// Parse a stored collection. Records that fail to parse are skipped so one
/// bad entry does not take the whole history with it; a payload that is not
/// a JSON array at all is reported as corrupt.
pub(crate) fn decode_history(raw: &str) -> Result<Vec<HistoryItem>, StoreFailure> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| StoreFailure::Corrupt(e.to_string()))?;

    let total = values.len();
    let items: Vec<HistoryItem> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping malformed history record: {}", e);
                None
            }
        })
        .collect();

    if items.len() < total {
        tracing::warn!("Loaded {} of {} history records", items.len(), total);
    }
    Ok(items)
}
