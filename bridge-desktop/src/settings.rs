//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{debug, error};

#[derive(Debug, Clone)]
enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// SQLite-backed settings store implementation
///
/// Values are stored as text next to a type tag so that reading a key with
/// the wrong accessor is reported instead of silently misparsed.
///
/// The database is opened on first use, so the store can be constructed
/// outside of an async context (e.g. while building `CoreConfig`).
pub struct SqliteSettingsStore {
    location: StoreLocation,
    pool: OnceCell<SqlitePool>,
}

impl SqliteSettingsStore {
    /// Create a settings store backed by the database file at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(db_path.into()),
            pool: OnceCell::new(),
        }
    }

    /// Create an in-memory settings store (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> Result<SqlitePool> {
        let (options, pool_options) = match &self.location {
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(BridgeError::Io)?;
                }
                (
                    SqliteConnectOptions::new()
                        .filename(path)
                        .create_if_missing(true),
                    SqlitePoolOptions::new().max_connections(4),
                )
            }
            // Every connection to :memory: is a separate database; keep exactly one alive.
            StoreLocation::Memory => (
                SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                    BridgeError::OperationFailed(format!("Invalid database URL: {}", e))
                })?,
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            ),
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        debug!(location = ?self.location, "Initialized settings store");

        Ok(pool)
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default()
    }

    async fn set_value(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, value_type, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_type = excluded.value_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .bind(Self::now())
        .execute(self.pool().await?)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to set setting: {}", e)))?;

        debug!(key = key, value_type = value_type, "Stored setting");
        Ok(())
    }

    /// Get a value and verify its type
    async fn get_value(&self, key: &str, expected_type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to get setting: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.get(0);
        let value_type: String = row.get(1);

        if value_type != expected_type {
            error!(
                key = key,
                expected = expected_type,
                actual = value_type,
                "Type mismatch"
            );
            return Err(BridgeError::OperationFailed(format!(
                "Type mismatch: expected {}, got {}",
                expected_type, value_type
            )));
        }

        Ok(Some(value))
    }

    async fn get_parsed<T>(&self, key: &str, expected_type: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(key, expected_type).await? {
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|e| BridgeError::OperationFailed(format!("Parse error: {}", e))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value, "string").await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key, "string").await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, &value.to_string(), "bool").await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_parsed(key, "bool").await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_value(key, &value.to_string(), "i64").await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get_parsed(key, "i64").await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(self.pool().await?)
            .await
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to delete setting: {}", e))
            })?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory();

        store.set_string("test_key", "test_value").await.unwrap();
        let value = store.get_string("test_key").await.unwrap();
        assert_eq!(value, Some("test_value".to_string()));
        assert!(store.has_key("test_key").await.unwrap());

        store.delete("test_key").await.unwrap();
        assert_eq!(store.get_string("test_key").await.unwrap(), None);
        assert!(!store.has_key("test_key").await.unwrap());
    }

    #[tokio::test]
    async fn test_typed_operations() {
        let store = SqliteSettingsStore::in_memory();

        store.set_bool("playback.loop_mode", true).await.unwrap();
        assert_eq!(store.get_bool("playback.loop_mode").await.unwrap(), Some(true));

        store.set_i64("playback.song_id", -3).await.unwrap();
        assert_eq!(store.get_i64("playback.song_id").await.unwrap(), Some(-3));

        store.set_i64("playback.song_id", 12).await.unwrap();
        assert_eq!(store.get_i64("playback.song_id").await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_reported() {
        let store = SqliteSettingsStore::in_memory();

        store.set_bool("flag", false).await.unwrap();
        assert!(store.get_i64("flag").await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = std::env::temp_dir().join(format!("bridge-desktop-settings-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("settings.db");

        {
            let store = SqliteSettingsStore::new(&path);
            store.set_i64("playback.song_position", 4200).await.unwrap();
        }

        let reopened = SqliteSettingsStore::new(&path);
        assert_eq!(
            reopened.get_i64("playback.song_position").await.unwrap(),
            Some(4200)
        );

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
