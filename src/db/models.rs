use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of upload metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    /// Filename as supplied by the client.
    pub filename: String,
    /// Location of the stored bytes on disk.
    pub filepath: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}
