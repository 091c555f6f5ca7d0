//! # Desktop Bridge Implementations
//!
//! Default implementations of the host bridges for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using an SQLite-backed key-value table (`sqlx`)
//! - `JsonStore` using one file per document (`tokio::fs`)
//! - `AudioFocusBridge` that always grants focus
//! - `WakeLockBridge` as an in-process registry (desktops do not suspend mid-playback)
//! - `ForegroundService` as in-process flags
//! - `NotificationPresenter` that logs through `tracing`
//!
//! The decoder and media index have no desktop default; hosts inject them.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileJsonStore, SqliteSettingsStore};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(SqliteSettingsStore::new("/data/settings.db")))
//!     .json_store(Arc::new(FileJsonStore::new("/data")))
//!     // ...
//!     .build()?;
//! ```

mod json_store;
mod settings;
mod system;

pub use json_store::FileJsonStore;
pub use settings::SqliteSettingsStore;
pub use system::{
    DesktopAudioFocus, DesktopForegroundService, DesktopWakeLock, TracingNotificationPresenter,
};
