//! Track model and the media index collaborator.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One playable track as reported by the host media index.
///
/// `id` may be negative when the core assigned a synthetic id to a repeated
/// occurrence of the same track within a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_id: Option<i64>,
    pub duration_ms: u64,
    /// Filesystem path or URI of the audio data.
    pub location: String,
    pub size: u64,
    pub date_added: i64,
    pub date_modified: i64,
    pub art_uri: Option<String>,
}

impl Track {
    pub fn new(id: i64, title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: String::new(),
            album: String::new(),
            album_id: None,
            duration_ms: 0,
            location: location.into(),
            size: 0,
            date_added: 0,
            date_modified: 0,
            art_uri: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Copy of this track carrying a different id.
    pub fn with_id(&self, id: i64) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id < 0
    }
}

/// Read-only access to the host's media index.
///
/// Queries may be slow (they hit the OS content database); the core never
/// calls them from its dispatcher directly.
#[async_trait]
pub trait MediaIndexProvider: Send + Sync {
    /// Every song in the index, in the index's natural order.
    async fn retrieve_songs(&self) -> Result<Vec<Track>>;
}
