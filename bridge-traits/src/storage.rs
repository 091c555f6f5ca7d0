//! Persistence bridges: key-value settings and named JSON documents.

use crate::error::Result;
use async_trait::async_trait;

/// Settings storage trait
///
/// Key-value store for small preferences:
/// - **iOS**: UserDefaults
/// - **Android**: SharedPreferences or DataStore
/// - **Desktop**: SQLite
///
/// Keys are plain strings; callers namespace them.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn has_key(&self, key: &str) -> Result<bool>;
}

/// Named JSON documents stored in the app's private files.
///
/// Implementations store `text` verbatim; parsing is the caller's job so
/// that a corrupt document can be detected and discarded by the core.
#[async_trait]
pub trait JsonStore: Send + Sync {
    async fn save_json(&self, name: &str, text: &str) -> Result<()>;

    /// `Ok(None)` when no document with that name was ever saved.
    async fn load_json(&self, name: &str) -> Result<Option<String>>;
}
