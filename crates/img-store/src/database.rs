//! SQLite database for image metadata records.
//!
//! This is the Metadata collection. It never holds image bytes, so `list`
//! and `meta` are served entirely from here.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};

use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// One metadata row, created once per `(group, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MetaRecord {
    pub id: String,
    pub group: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub max_n_colors: u32,
    pub header_byte_count: usize,
    pub creation_time: DateTime<Utc>,
}

impl MetaRecord {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let millis: i64 = row.get("creation_time");
        let creation_time = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| sqlx::Error::Decode(format!("bad creation time {millis}").into()))?;
        Ok(Self {
            id: row.get("id"),
            group: row.get("image_group"),
            name: row.get("name"),
            width: row.get::<i64, _>("width") as u32,
            height: row.get::<i64, _>("height") as u32,
            max_n_colors: row.get::<i64, _>("max_n_colors") as u32,
            header_byte_count: row.get::<i64, _>("header_byte_count") as usize,
            creation_time,
        })
    }
}

/// SQLite database connection pool.
#[derive(Debug, Clone)]
pub(crate) struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection from a file path.
    pub async fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create an in-memory database.
    ///
    /// The pool keeps exactly one connection alive forever; dropping it
    /// would drop the database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert a metadata record. A duplicate id is `StoreError::AlreadyExists`.
    pub async fn insert_meta(&self, record: &MetaRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO image_meta
                (id, image_group, name, width, height, max_n_colors, header_byte_count, creation_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.group)
        .bind(&record.name)
        .bind(i64::from(record.width))
        .bind(i64::from(record.height))
        .bind(i64::from(record.max_n_colors))
        .bind(record.header_byte_count as i64)
        .bind(record.creation_time.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a metadata record by key.
    pub async fn get_meta(&self, id: &str) -> Result<Option<MetaRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, image_group, name, width, height, max_n_colors, header_byte_count, creation_time
            FROM image_meta
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(MetaRecord::from_row).transpose()
    }

    /// Names of all images in `group`, ascending.
    pub async fn list_names(&self, group: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT name FROM image_meta WHERE image_group = ?
            ORDER BY name ASC
            "#,
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    /// Close every pooled connection. Safe to call more than once.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
impl Database {
    /// Count metadata records.
    pub async fn count_meta(&self) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM image_meta
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("count"))
    }
}
