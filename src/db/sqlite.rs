use crate::db::models::DocumentRecord;
use crate::db::schema::SQLITE_INIT;
use crate::error::PortalError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open a pool for `database_url`, creating the database file if missing.
pub async fn connect(database_url: &str) -> Result<SqlitePool, PortalError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct DocumentStorage {
    pool: SqlitePool,
}

impl DocumentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), PortalError> {
        // sqlx::query runs a single statement, so split the bundle
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a new record and return it as stored.
    pub async fn insert(
        &self,
        filename: &str,
        filepath: &str,
        size: i64,
    ) -> Result<DocumentRecord, PortalError> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let row = sqlx::query(
            r#"INSERT INTO documents (filename, filepath, size, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING id, filename, filepath, size, created_at"#,
        )
        .bind(filename)
        .bind(filepath)
        .bind(size)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_model(row)
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<DocumentRecord>, PortalError> {
        let rows = sqlx::query(
            r#"SELECT id, filename, filepath, size, created_at
               FROM documents ORDER BY created_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<DocumentRecord>, PortalError> {
        let row = sqlx::query(
            r#"SELECT id, filename, filepath, size, created_at
               FROM documents WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Returns whether a row was removed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, PortalError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_model(row: SqliteRow) -> Result<DocumentRecord, PortalError> {
        let id: i64 = row.try_get("id")?;
        let filename: String = row.try_get("filename")?;
        let filepath: String = row.try_get("filepath")?;
        let size: i64 = row.try_get("size")?;
        let created_at_str: String = row.try_get("created_at")?;

        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DocumentRecord {
            id,
            filename,
            filepath,
            size,
            created_at,
        })
    }
}
