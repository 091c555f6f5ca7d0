//! # Queue Manager
//!
//! In-memory song queue with circular navigation and duplicate-aware ids.
//!
//! The queue is normally pushed in by the UI (`set_queue`). When the
//! process restarts without a UI, [`QueueManager::restore_queue`] rebuilds
//! it from the persisted id snapshot plus a fresh fetch of the media index.
//!
//! ## Duplicates
//!
//! A track may appear more than once in a custom queue. The second and later
//! occurrences get synthetic negative ids so that "current song" and
//! next/prev navigation stay unambiguous. The synthetic → real mapping is
//! persisted next to the queue snapshot so a restart reproduces the same ids.

use crate::error::{PlaybackError, Result};
use crate::persistence::{DuplicateIdMap, QueueSnapshotStore};
use bridge_traits::{MediaIndexProvider, Track};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct QueueManager {
    media_index: Arc<dyn MediaIndexProvider>,
    snapshots: QueueSnapshotStore,
    /// `None` until the queue is set or restored.
    tracks: Option<Vec<Track>>,
    custom: bool,
    current: Option<Track>,
    id_map: Option<DuplicateIdMap>,
}

impl QueueManager {
    pub fn new(media_index: Arc<dyn MediaIndexProvider>, snapshots: QueueSnapshotStore) -> Self {
        Self {
            media_index,
            snapshots,
            tracks: None,
            custom: false,
            current: None,
            id_map: None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.tracks.is_some()
    }

    /// Whether the queue is a user-built list rather than the whole library.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn tracks(&self) -> &[Track] {
        self.tracks.as_deref().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tracks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks().is_empty()
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Rebuild the queue from the persisted snapshot. No-op when populated.
    pub async fn restore_queue(&mut self) -> Result<()> {
        if self.is_populated() {
            return Ok(());
        }

        let ids = self.snapshots.load_queue_ids().await;
        let library = self.fetch_library().await?;

        if ids.is_empty() {
            info!(tracks = library.len(), "Restored library queue");
            self.tracks = Some(library);
            self.custom = false;
            return Ok(());
        }

        let id_map = self.ensure_id_map().await.clone();
        let mut tracks = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(real_id) = id_map.resolve(id) else {
                warn!(id, "Synthetic id missing from id map, dropping");
                continue;
            };
            match library.iter().find(|track| track.id == real_id) {
                Some(track) if id < 0 => tracks.push(track.with_id(id)),
                Some(track) => tracks.push(track.clone()),
                None => debug!(id, "Queued track no longer in library"),
            }
        }

        info!(tracks = tracks.len(), "Restored custom queue");
        self.tracks = Some(tracks);
        self.custom = true;
        Ok(())
    }

    /// Replace the queue. Custom queues are snapshotted for restore.
    pub async fn set_queue(&mut self, tracks: Vec<Track>, custom: bool) {
        let ids: Vec<i64> = if custom {
            tracks.iter().map(|track| track.id).collect()
        } else {
            Vec::new()
        };

        debug!(tracks = tracks.len(), custom, "Queue replaced");
        self.tracks = Some(tracks);
        self.custom = custom;
        self.persist_queue_ids(&ids).await;
    }

    /// Forget the in-memory queue so the next restore refetches it.
    pub fn reset_queue(&mut self) {
        self.tracks = None;
        self.custom = false;
    }

    // ========================================================================
    // Current Song
    // ========================================================================

    pub fn set_current_song(&mut self, track: Track) {
        self.current = Some(track);
    }

    pub fn current_song(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Restore the current song after a restart, when nothing is current yet.
    pub async fn init_current_song(&mut self, song_id: Option<i64>) -> Result<()> {
        if self.current.is_some() {
            return Ok(());
        }
        self.restore_queue().await?;

        if let Some(track) = song_id.and_then(|id| self.search_by_id(id)).cloned() {
            debug!(id = track.id, "Current song restored");
            self.current = Some(track);
        }
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn search_by_id(&self, id: i64) -> Option<&Track> {
        self.tracks().iter().find(|track| track.id == id)
    }

    /// Track after the current one, wrapping to the start.
    ///
    /// Falls back to the first track when the current one is not queued.
    pub fn next_song(&self) -> Option<Track> {
        self.next_slot().map(|(_, track)| track)
    }

    /// Track before the current one, wrapping to the end.
    pub fn prev_song(&self) -> Option<Track> {
        self.prev_slot().map(|(_, track)| track)
    }

    /// Queue index and track after the current one.
    pub fn next_slot(&self) -> Option<(usize, Track)> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let index = self.current_index().map_or(0, |index| (index + 1) % len);
        self.slot(index)
    }

    /// Queue index and track before the current one.
    pub fn prev_slot(&self) -> Option<(usize, Track)> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let index = self
            .current_index()
            .map_or(0, |index| (index + len - 1) % len);
        self.slot(index)
    }

    fn slot(&self, index: usize) -> Option<(usize, Track)> {
        self.tracks().get(index).cloned().map(|track| (index, track))
    }

    fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.tracks().iter().position(|track| track.id == current.id)
    }

    // ========================================================================
    // Duplicates
    // ========================================================================

    /// Give `track` a synthetic id if it is a repeated occurrence.
    ///
    /// `duplicate` is the UI's verdict. Without one (no UI attached) the
    /// manager decides from the queue itself and remaps the queued slot.
    /// `slot` is the queue index `track` was taken from, when known; only a
    /// slot holding a later occurrence of its id is remapped.
    pub async fn handle_duplicate(
        &mut self,
        track: &mut Track,
        duplicate: Option<bool>,
        slot: Option<usize>,
    ) {
        let target = match (duplicate, slot) {
            (Some(false), _) => return,
            (Some(true), _) => None,
            (None, _) if !self.custom => return,
            (None, Some(slot)) if self.is_repeat_slot(slot, track.id) => Some(slot),
            (None, Some(_)) => return,
            (None, None) => match self.second_occurrence(track.id) {
                Some(index) => Some(index),
                None => return,
            },
        };

        let id_map = self.ensure_id_map().await;
        let real_id = id_map.resolve(track.id).unwrap_or(track.id);
        let synthetic = id_map.allocate(real_id);
        let id_map = id_map.clone();

        debug!(real_id, synthetic, ?target, "Assigned synthetic id to duplicate");

        if let Err(err) = self.snapshots.save_id_map(&id_map).await {
            warn!(error = %err, "Failed to persist id map");
        }

        if let Some(slot) = target {
            if let Some(queued) = self.tracks.as_mut().and_then(|tracks| tracks.get_mut(slot)) {
                queued.id = synthetic;
            }
            let ids: Vec<i64> = self.tracks().iter().map(|track| track.id).collect();
            self.persist_queue_ids(&ids).await;
        }

        track.id = synthetic;
    }

    /// Whether `slot` holds `id` and an earlier slot holds it too.
    fn is_repeat_slot(&self, slot: usize, id: i64) -> bool {
        let tracks = self.tracks();
        tracks.get(slot).is_some_and(|track| track.id == id)
            && tracks[..slot].iter().any(|track| track.id == id)
    }

    fn second_occurrence(&self, id: i64) -> Option<usize> {
        self.tracks()
            .iter()
            .enumerate()
            .filter(|(_, track)| track.id == id)
            .nth(1)
            .map(|(index, _)| index)
    }

    async fn ensure_id_map(&mut self) -> &mut DuplicateIdMap {
        if self.id_map.is_none() {
            self.id_map = Some(self.snapshots.load_id_map().await);
        }
        self.id_map.get_or_insert_with(DuplicateIdMap::new)
    }

    async fn persist_queue_ids(&self, ids: &[i64]) {
        if let Err(err) = self.snapshots.save_queue_ids(ids).await {
            warn!(error = %err, "Failed to persist queue snapshot");
        }
    }

    /// Fetch the full library on a worker task and rejoin before use.
    async fn fetch_library(&self) -> Result<Vec<Track>> {
        let index = Arc::clone(&self.media_index);
        let songs = tokio::spawn(async move { index.retrieve_songs().await })
            .await
            .map_err(|err| PlaybackError::Worker(err.to_string()))??;
        Ok(songs)
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("populated", &self.is_populated())
            .field("len", &self.len())
            .field("custom", &self.custom)
            .field("current", &self.current.as_ref().map(|track| track.id))
            .finish()
    }
}
