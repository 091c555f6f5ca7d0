//! CPU wake lock bridge.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-issued identifier for one acquired wake lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WakeLockId(pub u64);

/// Keeps the CPU awake while audio plays with the screen off.
///
/// Each `acquire` creates an independent lock; holding several at once is
/// allowed and the CPU stays awake while any of them is held.
pub trait WakeLockBridge: Send + Sync {
    /// Acquire a lock. `Some(timeout)` makes the host drop it automatically.
    fn acquire(&self, timeout: Option<Duration>) -> Result<WakeLockId>;

    /// Release a lock. Releasing an expired lock is not an error.
    fn release(&self, id: WakeLockId) -> Result<()>;
}
