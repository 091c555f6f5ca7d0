//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every host bridge and tunable the core needs. It
//! enforces fail-fast validation so a missing capability is reported at
//! startup instead of on the first play request.
//!
//! ## Required Dependencies
//!
//! - `DecoderFactory` - the OS decoder
//! - `MediaIndexProvider` - the song index used to rebuild queues
//!
//! ## Dependencies with desktop defaults
//!
//! - `AudioFocusBridge` (desktop: always granted)
//! - `WakeLockBridge` (desktop: in-process bookkeeping)
//! - `NotificationPresenter` (desktop: logs through `tracing`)
//! - `ForegroundService` (desktop: in-process flag)
//! - `SettingsStore` (desktop: SQLite file under `data_dir`)
//! - `JsonStore` (desktop: JSON files under `data_dir`)
//!
//! Without the `desktop-shims` feature every bridge must be injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .data_dir("/path/to/app/files")
//!     .decoder_factory(Arc::new(MyDecoderFactory))
//!     .media_index(Arc::new(MyMediaIndex))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with an actionable message naming the missing DecoderFactory
//! let config = CoreConfig::builder()
//!     .data_dir("/tmp/playback")
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioFocusBridge, DecoderFactory, ForegroundService, JsonStore, MediaIndexProvider,
    NotificationPresenter, SettingsStore, WakeLockBridge,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory for the desktop default stores (optional for injected hosts)
    pub data_dir: Option<PathBuf>,

    pub decoder_factory: Arc<dyn DecoderFactory>,

    pub media_index: Arc<dyn MediaIndexProvider>,

    pub audio_focus: Arc<dyn AudioFocusBridge>,

    pub wake_lock: Arc<dyn WakeLockBridge>,

    pub notifications: Arc<dyn NotificationPresenter>,

    pub foreground_service: Arc<dyn ForegroundService>,

    /// Preferences (song id, playing flag, loop mode, position, color)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Queue snapshot and duplicate id map documents
    pub json_store: Arc<dyn JsonStore>,

    pub playback: PlaybackSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("decoder_factory", &"DecoderFactory { ... }")
            .field("media_index", &"MediaIndexProvider { ... }")
            .field("audio_focus", &"AudioFocusBridge { ... }")
            .field("wake_lock", &"WakeLockBridge { ... }")
            .field("notifications", &"NotificationPresenter { ... }")
            .field("foreground_service", &"ForegroundService { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("json_store", &"JsonStore { ... }")
            .field("playback", &self.playback)
            .finish()
    }
}

/// Timing and naming knobs of the playback core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Cadence of position ticks while something plays.
    pub position_update_period: Duration,
    /// How long the foreground service survives a pause.
    pub service_stop_delay: Duration,
    /// Bounded wake lock taken while paused.
    pub timed_wake_lock: Duration,
    /// Lifetime of the bridging lock held while swapping wake lock modes.
    pub wake_lock_bridge: Duration,
    /// Window in which headset hook presses are counted together.
    pub hook_press_window: Duration,
    /// Jump distance for fast-forward and rewind.
    pub seek_step: Duration,
    /// Prefix for every preference key.
    pub prefs_namespace: String,
    pub queue_file: String,
    pub id_map_file: String,
    pub event_buffer_size: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            position_update_period: Duration::from_millis(200),
            service_stop_delay: Duration::from_secs(120),
            timed_wake_lock: Duration::from_secs(60),
            wake_lock_bridge: Duration::from_secs(1),
            hook_press_window: Duration::from_millis(500),
            seek_step: Duration::from_millis(3000),
            prefs_namespace: "playback.".to_string(),
            queue_file: "queue.json".to_string(),
            id_map_file: "id_map.json".to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("position_update_period", self.position_update_period),
            ("service_stop_delay", self.service_stop_delay),
            ("timed_wake_lock", self.timed_wake_lock),
            ("wake_lock_bridge", self.wake_lock_bridge),
            ("hook_press_window", self.hook_press_window),
            ("seek_step", self.seek_step),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| value.is_zero()) {
            return Err(Error::Config(format!("{} must be greater than zero", name)));
        }

        if self.prefs_namespace.is_empty() {
            return Err(Error::Config(
                "Preference namespace cannot be empty".to_string(),
            ));
        }

        if self.queue_file.is_empty() || self.id_map_file.is_empty() {
            return Err(Error::Config(
                "Queue snapshot and id map file names cannot be empty".to_string(),
            ));
        }

        if self.queue_file == self.id_map_file {
            return Err(Error::Config(
                "Queue snapshot and id map must use different files".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("Data directory cannot be empty".to_string()));
            }
        }

        self.playback.validate()
    }
}

fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: ensure the 'desktop-shims' feature is enabled. \
             Mobile: inject the platform-native adapter.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn require_data_dir<'a>(data_dir: Option<&'a Path>, capability: &str) -> Result<&'a Path> {
    data_dir.ok_or_else(|| {
        Error::Config(format!(
            "Data directory is required for the default {}. Use .data_dir() to set it \
             or inject a {} implementation.",
            capability, capability
        ))
    })
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        DesktopAudioFocus, DesktopForegroundService, DesktopWakeLock, FileJsonStore,
        SqliteSettingsStore, TracingNotificationPresenter,
    };

    pub fn audio_focus() -> Result<Arc<dyn AudioFocusBridge>> {
        Ok(Arc::new(DesktopAudioFocus::new()))
    }

    pub fn wake_lock() -> Result<Arc<dyn WakeLockBridge>> {
        Ok(Arc::new(DesktopWakeLock::new()))
    }

    pub fn notifications() -> Result<Arc<dyn NotificationPresenter>> {
        Ok(Arc::new(TracingNotificationPresenter::new()))
    }

    pub fn foreground_service() -> Result<Arc<dyn ForegroundService>> {
        Ok(Arc::new(DesktopForegroundService::new()))
    }

    pub fn settings_store(data_dir: Option<&Path>) -> Result<Arc<dyn SettingsStore>> {
        let dir = require_data_dir(data_dir, "SettingsStore")?;
        Ok(Arc::new(SqliteSettingsStore::new(dir.join("settings.db"))))
    }

    pub fn json_store(data_dir: Option<&Path>) -> Result<Arc<dyn JsonStore>> {
        let dir = require_data_dir(data_dir, "JsonStore")?;
        Ok(Arc::new(FileJsonStore::new(dir)))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub fn audio_focus() -> Result<Arc<dyn AudioFocusBridge>> {
        Err(capability_missing("AudioFocusBridge", "audio focus arbitration"))
    }

    pub fn wake_lock() -> Result<Arc<dyn WakeLockBridge>> {
        Err(capability_missing("WakeLockBridge", "background playback"))
    }

    pub fn notifications() -> Result<Arc<dyn NotificationPresenter>> {
        Err(capability_missing(
            "NotificationPresenter",
            "playback notifications",
        ))
    }

    pub fn foreground_service() -> Result<Arc<dyn ForegroundService>> {
        Err(capability_missing("ForegroundService", "background playback"))
    }

    pub fn settings_store(_data_dir: Option<&Path>) -> Result<Arc<dyn SettingsStore>> {
        Err(capability_missing("SettingsStore", "playback preferences"))
    }

    pub fn json_store(_data_dir: Option<&Path>) -> Result<Arc<dyn JsonStore>> {
        Err(capability_missing("JsonStore", "queue persistence"))
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    data_dir: Option<PathBuf>,
    decoder_factory: Option<Arc<dyn DecoderFactory>>,
    media_index: Option<Arc<dyn MediaIndexProvider>>,
    audio_focus: Option<Arc<dyn AudioFocusBridge>>,
    wake_lock: Option<Arc<dyn WakeLockBridge>>,
    notifications: Option<Arc<dyn NotificationPresenter>>,
    foreground_service: Option<Arc<dyn ForegroundService>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    json_store: Option<Arc<dyn JsonStore>>,
    playback: Option<PlaybackSettings>,
}

impl CoreConfigBuilder {
    /// Sets the directory used by the desktop default stores.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().data_dir("/path/to/app/files");
    /// ```
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the decoder factory (required).
    pub fn decoder_factory(mut self, factory: Arc<dyn DecoderFactory>) -> Self {
        self.decoder_factory = Some(factory);
        self
    }

    /// Sets the media index provider (required).
    pub fn media_index(mut self, index: Arc<dyn MediaIndexProvider>) -> Self {
        self.media_index = Some(index);
        self
    }

    pub fn audio_focus(mut self, focus: Arc<dyn AudioFocusBridge>) -> Self {
        self.audio_focus = Some(focus);
        self
    }

    pub fn wake_lock(mut self, wake_lock: Arc<dyn WakeLockBridge>) -> Self {
        self.wake_lock = Some(wake_lock);
        self
    }

    pub fn notifications(mut self, presenter: Arc<dyn NotificationPresenter>) -> Self {
        self.notifications = Some(presenter);
        self
    }

    pub fn foreground_service(mut self, service: Arc<dyn ForegroundService>) -> Self {
        self.foreground_service = Some(service);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn json_store(mut self, store: Arc<dyn JsonStore>) -> Self {
        self.json_store = Some(store);
        self
    }

    /// Overrides the playback timings and file names.
    ///
    /// Default: [`PlaybackSettings::default()`]
    pub fn playback_settings(mut self, settings: PlaybackSettings) -> Self {
        self.playback = Some(settings);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` when a required bridge has no implementation
    /// - `Config` when a value is invalid or a desktop default has no `data_dir`
    pub fn build(self) -> Result<CoreConfig> {
        let decoder_factory = self
            .decoder_factory
            .ok_or_else(|| capability_missing("DecoderFactory", "audio playback"))?;

        let media_index = self
            .media_index
            .ok_or_else(|| capability_missing("MediaIndexProvider", "queue restoration"))?;

        let data_dir = self.data_dir;

        let audio_focus = match self.audio_focus {
            Some(focus) => focus,
            None => defaults::audio_focus()?,
        };

        let wake_lock = match self.wake_lock {
            Some(lock) => lock,
            None => defaults::wake_lock()?,
        };

        let notifications = match self.notifications {
            Some(presenter) => presenter,
            None => defaults::notifications()?,
        };

        let foreground_service = match self.foreground_service {
            Some(service) => service,
            None => defaults::foreground_service()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => defaults::settings_store(data_dir.as_deref())?,
        };

        let json_store = match self.json_store {
            Some(store) => store,
            None => defaults::json_store(data_dir.as_deref())?,
        };

        let config = CoreConfig {
            data_dir,
            decoder_factory,
            media_index,
            audio_focus,
            wake_lock,
            notifications,
            foreground_service,
            settings_store,
            json_store,
            playback: self.playback.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
