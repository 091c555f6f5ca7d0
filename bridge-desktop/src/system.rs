//! Desktop stand-ins for mobile OS services.
//!
//! Desktops have no audio focus arbitration, no CPU suspend while audio plays
//! and no foreground-service concept. These implementations keep just enough
//! bookkeeping to be observable and log what a mobile host would do.

use bridge_traits::{
    error::{BridgeError, Result},
    AudioFocusBridge, FocusRequestResult, ForegroundService, NotificationPresenter,
    NotificationState, WakeLockBridge, WakeLockId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Audio focus that is always granted.
#[derive(Debug, Default)]
pub struct DesktopAudioFocus {
    held: AtomicBool,
}

impl DesktopAudioFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl AudioFocusBridge for DesktopAudioFocus {
    fn request_focus(&self) -> Result<FocusRequestResult> {
        self.held.store(true, Ordering::SeqCst);
        debug!("Audio focus granted");
        Ok(FocusRequestResult::Granted)
    }

    fn abandon_focus(&self) -> Result<()> {
        self.held.store(false, Ordering::SeqCst);
        debug!("Audio focus abandoned");
        Ok(())
    }
}

/// In-process wake lock registry.
///
/// Hands out ids and tracks expiry so callers can observe what is held.
#[derive(Debug, Default)]
pub struct DesktopWakeLock {
    next_id: AtomicU64,
    held: Mutex<HashMap<WakeLockId, Option<Instant>>>,
}

impl DesktopWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of locks currently held (expired timed locks excluded).
    pub fn held_count(&self) -> usize {
        let now = Instant::now();
        self.held
            .lock()
            .map(|held| {
                held.values()
                    .filter(|deadline| deadline.map_or(true, |at| at > now))
                    .count()
            })
            .unwrap_or_default()
    }

    fn registry(&self) -> Result<std::sync::MutexGuard<'_, HashMap<WakeLockId, Option<Instant>>>> {
        self.held
            .lock()
            .map_err(|_| BridgeError::OperationFailed("Wake lock registry poisoned".to_string()))
    }
}

impl WakeLockBridge for DesktopWakeLock {
    fn acquire(&self, timeout: Option<Duration>) -> Result<WakeLockId> {
        let id = WakeLockId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        self.registry()?.insert(id, deadline);
        debug!(id = id.0, ?timeout, "Wake lock acquired");
        Ok(id)
    }

    fn release(&self, id: WakeLockId) -> Result<()> {
        self.registry()?.remove(&id);
        debug!(id = id.0, "Wake lock released");
        Ok(())
    }
}

/// Tracks whether the (virtual) playback service is running and foreground.
#[derive(Debug, Default)]
pub struct DesktopForegroundService {
    running: AtomicBool,
    foreground: AtomicBool,
}

impl DesktopForegroundService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

impl ForegroundService for DesktopForegroundService {
    fn start_service(&self) -> Result<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("Playback service started");
        }
        Ok(())
    }

    fn start_foreground(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        self.foreground.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_foreground(&self) -> Result<()> {
        self.foreground.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop_service(&self) -> Result<()> {
        self.foreground.store(false, Ordering::SeqCst);
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Playback service stopped");
        }
        Ok(())
    }
}

/// Notification presenter that logs the state it would render.
#[derive(Debug, Default)]
pub struct TracingNotificationPresenter;

impl TracingNotificationPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationPresenter for TracingNotificationPresenter {
    fn update_notification(&self, state: &NotificationState) -> Result<()> {
        debug!(
            track = state.track.as_ref().map(|track| track.title.as_str()),
            is_playing = state.is_playing,
            is_looping = state.is_looping,
            ongoing = state.ongoing,
            stopped = state.stopped,
            "Notification updated"
        );
        Ok(())
    }

    fn cancel_notification(&self) -> Result<()> {
        debug!("Notification cancelled");
        Ok(())
    }
}
