//! Wake lock management.
//!
//! The manager holds at most one host lock, either untimed (something is
//! playing) or timed (paused, letting the device sleep after a grace period).
//! Switching kinds never leaves a gap: a short bridging lock covers the swap.

use bridge_traits::{WakeLockBridge, WakeLockId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Observable wake lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WakeLockState {
    pub held: bool,
    pub timed: bool,
}

#[derive(Debug, Clone, Copy)]
struct HeldLock {
    id: WakeLockId,
    timed: bool,
}

pub struct WakeLockManager {
    bridge: Arc<dyn WakeLockBridge>,
    timed_hold: Duration,
    bridge_hold: Duration,
    held: Option<HeldLock>,
}

impl WakeLockManager {
    pub fn new(bridge: Arc<dyn WakeLockBridge>, timed_hold: Duration, bridge_hold: Duration) -> Self {
        Self {
            bridge,
            timed_hold,
            bridge_hold,
            held: None,
        }
    }

    pub fn state(&self) -> WakeLockState {
        match self.held {
            Some(lock) => WakeLockState {
                held: true,
                timed: lock.timed,
            },
            None => WakeLockState::default(),
        }
    }

    /// Hold the lock indefinitely.
    pub fn acquire(&mut self) {
        match self.held {
            Some(HeldLock { timed: false, .. }) => {}
            Some(current) => self.swap(current, None),
            None => self.held = self.take_lock(None),
        }
    }

    /// Hold the lock for the timed period. Re-arms the deadline if already timed.
    pub fn acquire_timed(&mut self) {
        let timeout = Some(self.timed_hold);
        match self.held {
            Some(current) => self.swap(current, timeout),
            None => self.held = self.take_lock(timeout),
        }
    }

    /// Drop whatever lock is held. Idempotent.
    pub fn release(&mut self) {
        if let Some(lock) = self.held.take() {
            self.drop_lock(lock.id);
            debug!(id = lock.id.0, "Wake lock released");
        }
    }

    fn swap(&mut self, current: HeldLock, timeout: Option<Duration>) {
        let bridge = self.take_lock(Some(self.bridge_hold));
        self.drop_lock(current.id);
        self.held = self.take_lock(timeout);
        if let Some(bridge) = bridge {
            self.drop_lock(bridge.id);
        }
        debug!(from_timed = current.timed, to_timed = timeout.is_some(), "Wake lock converted");
    }

    fn take_lock(&self, timeout: Option<Duration>) -> Option<HeldLock> {
        match self.bridge.acquire(timeout) {
            Ok(id) => Some(HeldLock {
                id,
                timed: timeout.is_some(),
            }),
            Err(err) => {
                warn!(error = %err, ?timeout, "Failed to acquire wake lock");
                None
            }
        }
    }

    fn drop_lock(&self, id: WakeLockId) {
        if let Err(err) = self.bridge.release(id) {
            warn!(id = id.0, error = %err, "Failed to release wake lock");
        }
    }
}

impl std::fmt::Debug for WakeLockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockManager")
            .field("state", &self.state())
            .field("timed_hold", &self.timed_hold)
            .finish()
    }
}
