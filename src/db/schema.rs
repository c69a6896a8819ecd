//! SQL DDL for initializing the document metadata store.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - `created_at` stored as fixed-width RFC3339 text so it sorts lexically
/// - index on `created_at` for the newest-first listing
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    filepath TEXT NOT NULL,
    size INTEGER NOT NULL,
    created_at TEXT NOT NULL -- RFC3339, UTC, microseconds
);

CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at);
"#;
