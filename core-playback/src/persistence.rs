//! Persisted playback state.
//!
//! Two stores back queue continuity across process restarts:
//!
//! - [`PlaybackPrefs`]: small scalar values in the host key-value store
//!   (current song id, playing flag, loop mode, position, accent color).
//! - [`QueueSnapshotStore`]: the ordered id list of a custom queue and the
//!   duplicate-id map, as JSON documents.
//!
//! Reads never fail: missing or unreadable values fall back to defaults so a
//! damaged store degrades to "no prior queue" instead of blocking playback.

use crate::error::Result;
use bridge_traits::{JsonStore, SettingsStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Preferences
// ============================================================================

const KEY_SONG_ID: &str = "song_id";
const KEY_SONG_IS_PLAYING: &str = "song_is_playing";
const KEY_LOOP_MODE: &str = "loop_mode";
const KEY_SONG_POSITION: &str = "song_position";
const KEY_PRIMARY_COLOR: &str = "primary_color";

/// Namespaced view over the host settings store.
#[derive(Clone)]
pub struct PlaybackPrefs {
    store: Arc<dyn SettingsStore>,
    namespace: String,
}

impl PlaybackPrefs {
    pub fn new(store: Arc<dyn SettingsStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }

    pub async fn song_id(&self) -> Option<i64> {
        self.read_i64(KEY_SONG_ID).await
    }

    pub async fn set_song_id(&self, id: i64) {
        let key = self.key(KEY_SONG_ID);
        log_write(&key, self.store.set_i64(&key, id).await);
    }

    pub async fn is_playing(&self) -> bool {
        self.read_bool(KEY_SONG_IS_PLAYING).await
    }

    pub async fn set_playing(&self, playing: bool) {
        let key = self.key(KEY_SONG_IS_PLAYING);
        log_write(&key, self.store.set_bool(&key, playing).await);
    }

    pub async fn loop_mode(&self) -> bool {
        self.read_bool(KEY_LOOP_MODE).await
    }

    pub async fn set_loop_mode(&self, looping: bool) {
        let key = self.key(KEY_LOOP_MODE);
        log_write(&key, self.store.set_bool(&key, looping).await);
    }

    pub async fn song_position(&self) -> Duration {
        self.read_i64(KEY_SONG_POSITION)
            .await
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis)
            .unwrap_or_default()
    }

    pub async fn set_song_position(&self, position: Duration) {
        let key = self.key(KEY_SONG_POSITION);
        let ms = i64::try_from(position.as_millis()).unwrap_or(i64::MAX);
        log_write(&key, self.store.set_i64(&key, ms).await);
    }

    /// Accent color as `0xAARRGGBB`.
    pub async fn primary_color(&self) -> Option<u32> {
        self.read_i64(KEY_PRIMARY_COLOR)
            .await
            .and_then(|value| u32::try_from(value).ok())
    }

    pub async fn set_primary_color(&self, color: u32) {
        let key = self.key(KEY_PRIMARY_COLOR);
        log_write(&key, self.store.set_i64(&key, i64::from(color)).await);
    }

    async fn read_i64(&self, name: &str) -> Option<i64> {
        let key = self.key(name);
        match self.store.get_i64(&key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read preference");
                None
            }
        }
    }

    async fn read_bool(&self, name: &str) -> bool {
        let key = self.key(name);
        match self.store.get_bool(&key).await {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read preference");
                false
            }
        }
    }
}

fn log_write(key: &str, result: bridge_traits::error::Result<()>) {
    if let Err(err) = result {
        warn!(key = %key, error = %err, "Failed to write preference");
    }
}

impl std::fmt::Debug for PlaybackPrefs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackPrefs")
            .field("namespace", &self.namespace)
            .finish()
    }
}

// ============================================================================
// Duplicate Id Map
// ============================================================================

/// Maps synthetic (negative) ids to the real track ids they stand for.
///
/// Serialized as a JSON object keyed by the synthetic id in decimal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateIdMap {
    entries: BTreeMap<String, i64>,
}

impl DuplicateIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Real id behind `id`. Non-negative ids resolve to themselves.
    pub fn resolve(&self, id: i64) -> Option<i64> {
        if id >= 0 {
            return Some(id);
        }
        self.entries.get(&id.to_string()).copied()
    }

    /// Allocate a fresh synthetic id for `real_id` and record it.
    ///
    /// The new id is one past both the entry count and the largest magnitude
    /// already present, so ids are never reused even after a partially
    /// recovered map.
    pub fn allocate(&mut self, real_id: i64) -> i64 {
        let largest = self
            .entries
            .keys()
            .filter_map(|key| key.parse::<i64>().ok())
            .map(i64::unsigned_abs)
            .max()
            .unwrap_or(0);
        let next = largest.max(self.entries.len() as u64) + 1;
        let id = -(i64::try_from(next).unwrap_or(i64::MAX));

        self.entries.insert(id.to_string(), real_id);
        id
    }
}

// ============================================================================
// Queue Snapshot
// ============================================================================

/// JSON documents describing the last custom queue.
#[derive(Clone)]
pub struct QueueSnapshotStore {
    store: Arc<dyn JsonStore>,
    queue_file: String,
    id_map_file: String,
}

impl QueueSnapshotStore {
    pub fn new(
        store: Arc<dyn JsonStore>,
        queue_file: impl Into<String>,
        id_map_file: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue_file: queue_file.into(),
            id_map_file: id_map_file.into(),
        }
    }

    /// Ordered queue ids. Empty means "the whole library".
    pub async fn load_queue_ids(&self) -> Vec<i64> {
        self.load_or_default(&self.queue_file).await
    }

    pub async fn save_queue_ids(&self, ids: &[i64]) -> Result<()> {
        let text = serde_json::to_string(ids)?;
        self.store.save_json(&self.queue_file, &text).await?;
        Ok(())
    }

    pub async fn load_id_map(&self) -> DuplicateIdMap {
        self.load_or_default(&self.id_map_file).await
    }

    pub async fn save_id_map(&self, map: &DuplicateIdMap) -> Result<()> {
        let text = serde_json::to_string(map)?;
        self.store.save_json(&self.id_map_file, &text).await?;
        Ok(())
    }

    async fn load_or_default<T>(&self, name: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let text = match self.store.load_json(name).await {
            Ok(Some(text)) => text,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(file = name, error = %err, "Failed to load snapshot");
                return T::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                warn!(file = name, error = %err, "Corrupt snapshot, starting empty");
                T::default()
            }
        }
    }
}

impl std::fmt::Debug for QueueSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSnapshotStore")
            .field("queue_file", &self.queue_file)
            .field("id_map_file", &self.id_map_file)
            .finish()
    }
}
