//! Media session integration: notification presenter, foreground service and
//! the transport controls the host delivers back to the core.

use crate::error::Result;
use crate::media::Track;
use serde::{Deserialize, Serialize};

/// Everything the host needs to render the playback notification.
///
/// Visual construction (layout, artwork decoding) is the host's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub track: Option<Track>,
    pub is_playing: bool,
    pub is_looping: bool,
    /// Ongoing notifications cannot be swiped away.
    pub ongoing: bool,
    /// Show the "stopped" icon instead of play/pause.
    pub stopped: bool,
    /// ARGB color for the art placeholder.
    pub accent_color: Option<u32>,
}

pub trait NotificationPresenter: Send + Sync {
    fn update_notification(&self, state: &NotificationState) -> Result<()>;

    fn cancel_notification(&self) -> Result<()>;
}

/// Background service that keeps the process alive while audio plays.
pub trait ForegroundService: Send + Sync {
    /// Start the service if it is not running.
    fn start_service(&self) -> Result<()>;

    /// Promote the running service to the foreground.
    fn start_foreground(&self) -> Result<()>;

    /// Demote to background; the notification becomes dismissible.
    fn stop_foreground(&self) -> Result<()>;

    fn stop_service(&self) -> Result<()>;
}

/// Transport control received from a headset, lock screen or media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaButton {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    FastForward,
    Rewind,
    /// Single headset button; meaning depends on how many times it is pressed.
    Hook,
}

/// Action button pressed on the playback notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Play,
    Pause,
    Next,
    Previous,
    SwitchLoop,
    /// Close button: stop playback and tear the service down.
    Dismiss,
}
