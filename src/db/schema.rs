pub const SCHEMA: &str = r#"
-- kv_store table: one JSON document per namespace
CREATE TABLE IF NOT EXISTS kv_store (
    namespace TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
