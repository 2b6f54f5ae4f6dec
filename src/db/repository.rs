use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio::sync::OnceCell;
use tokio_rusqlite::Connection;

use crate::error::StoreFailure;
use crate::models::HistoryItem;

use super::schema::SCHEMA;
use super::{decode_history, encode_history, DurableStore, HISTORY_NAMESPACE};

/// SQLite-backed key/value store. The history collection lives in a single
/// row keyed by namespace and is always read and written whole.
///
/// The database is opened on first use. A file that cannot be opened or is
/// not a database fails that `load` or `save`, and the next call tries again.
pub struct SqliteStore {
    db_path: String,
    namespace: String,
    conn: OnceCell<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &str) -> Self {
        Self::with_namespace(db_path, HISTORY_NAMESPACE)
    }

    pub fn with_namespace(db_path: &str, namespace: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
            namespace: namespace.to_string(),
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> std::result::Result<&Connection, tokio_rusqlite::Error> {
        self.conn
            .get_or_try_init(|| async {
                let conn = Connection::open(self.db_path.clone()).await?;

                conn.call(|conn| {
                    conn.execute_batch(SCHEMA)?;
                    Ok(())
                })
                .await?;

                Ok::<_, tokio_rusqlite::Error>(conn)
            })
            .await
    }

    async fn read_raw(&self) -> std::result::Result<Option<String>, tokio_rusqlite::Error> {
        let namespace = self.namespace.clone();
        self.connection()
            .await?
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv_store WHERE namespace = ?1",
                        params![namespace],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
    }

    async fn write_raw(&self, value: String) -> std::result::Result<(), tokio_rusqlite::Error> {
        let namespace = self.namespace.clone();
        self.connection()
            .await?
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO kv_store (namespace, value)
                       VALUES (?1, ?2)
                       ON CONFLICT(namespace) DO UPDATE SET
                           value = excluded.value,
                           updated_at = datetime('now')"#,
                    params![namespace, value],
                )?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn load(&self) -> std::result::Result<Vec<HistoryItem>, StoreFailure> {
        let raw = self
            .read_raw()
            .await
            .map_err(|e| StoreFailure::Read(e.to_string()))?;

        match raw {
            Some(raw) => decode_history(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, items: &[HistoryItem]) -> std::result::Result<(), StoreFailure> {
        let encoded = encode_history(items)?;
        self.write_raw(encoded)
            .await
            .map_err(|e| StoreFailure::Write(e.to_string()))
    }
}
