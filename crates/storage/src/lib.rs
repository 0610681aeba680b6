use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::info;

pub const UPLOADED_FILE_KEY: &str = "uploaded_file";
pub const UPLOADED_FILE_NAME_KEY: &str = "uploaded_file_name";
pub const SUBJECT_KEY: &str = "subject";

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";
const UPSERT_STATE_SQL: &str = "INSERT INTO client_state (key, value, updated_at) VALUES (?, ?, ?)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

/// Client-side key/value store holding the most recently selected file.
///
/// The selection is written as a whole by [`UploadStore::save_selection`] and
/// removed as a whole by [`UploadStore::clear`].
#[derive(Clone)]
pub struct UploadStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSelection {
    pub filename: String,
    pub file_b64: String,
    pub subject: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StoredSelection {
    pub fn file_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.file_b64.as_bytes())
            .map_err(|e| anyhow!("stored file '{}' is not valid base64: {e}", self.filename))
    }
}

impl UploadStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every in-memory connection is its own database.
        let max_connections = if database_url.starts_with(MEMORY_DATABASE_URL) {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn save_selection(&self, filename: &str, bytes: &[u8], subject: &str) -> Result<()> {
        let now = Utc::now();
        let file_b64 = STANDARD.encode(bytes);
        let mut tx = self.pool.begin().await?;
        for (key, value) in [
            (UPLOADED_FILE_KEY, file_b64.as_str()),
            (UPLOADED_FILE_NAME_KEY, filename),
            (SUBJECT_KEY, subject),
        ] {
            sqlx::query(UPSERT_STATE_SQL)
                .bind(key)
                .bind(value)
                .bind(now)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to store '{key}'"))?;
        }
        tx.commit().await?;
        info!(%filename, size_bytes = bytes.len(), "stored file selection");
        Ok(())
    }

    pub async fn save_subject(&self, subject: &str) -> Result<()> {
        self.put(SUBJECT_KEY, subject).await
    }

    pub async fn subject(&self) -> Result<Option<String>> {
        Ok(self.get(SUBJECT_KEY).await?.map(|(value, _)| value))
    }

    pub async fn load_selection(&self) -> Result<Option<StoredSelection>> {
        let Some((filename, name_updated_at)) = self.get(UPLOADED_FILE_NAME_KEY).await? else {
            return Ok(None);
        };
        let Some((file_b64, file_updated_at)) = self.get(UPLOADED_FILE_KEY).await? else {
            return Ok(None);
        };
        let subject = self.subject().await?;

        Ok(Some(StoredSelection {
            filename,
            file_b64,
            subject,
            updated_at: name_updated_at.max(file_updated_at),
        }))
    }

    /// Drops every stored key; returns how many rows were removed.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM client_state WHERE key IN (?, ?, ?)")
            .bind(UPLOADED_FILE_KEY)
            .bind(UPLOADED_FILE_NAME_KEY)
            .bind(SUBJECT_KEY)
            .execute(&self.pool)
            .await
            .context("failed to clear stored selection")?;
        info!(removed = result.rows_affected(), "cleared stored selection");
        Ok(result.rows_affected())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT_STATE_SQL)
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to store '{key}'"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<(String, DateTime<Utc>)>> {
        let row = sqlx::query("SELECT value, updated_at FROM client_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read '{key}'"))?;
        row.map(|row| -> Result<_> { Ok((row.try_get("value")?, row.try_get("updated_at")?)) })
            .transpose()
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(parent) = database_file_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };

    fs::create_dir_all(&parent)
        .with_context(|| format!("cannot create '{}' for {database_url}", parent.display()))
}

/// File backing a `sqlite:` URL; `None` for in-memory and non-sqlite URLs.
pub fn database_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url.strip_prefix("sqlite:")?;
    if rest.starts_with(":memory:") {
        return None;
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let file = rest.split_once('?').map_or(rest, |(file, _)| file);
    (!file.is_empty()).then(|| PathBuf::from(file))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
