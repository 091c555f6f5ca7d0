//! Audio focus bridge.
//!
//! Audio focus is the OS-granted right to produce audio output. The core
//! requests it before starting playback and abandons it after a voluntary
//! pause or stop. Involuntary changes are delivered back to the core as
//! [`FocusChange`] values.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Outcome of a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRequestResult {
    Granted,
    /// The OS will grant focus later (e.g. during a phone call).
    Delayed,
    Failed,
}

/// Focus change pushed by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    Gain,
    /// Permanent loss; another app took over.
    Loss,
    /// Short interruption (notification sound, navigation prompt).
    LossTransient,
    /// Short interruption where lowering the volume would be acceptable.
    LossTransientCanDuck,
}

impl FocusChange {
    pub fn is_loss(&self) -> bool {
        !matches!(self, FocusChange::Gain)
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FocusChange::LossTransient | FocusChange::LossTransientCanDuck
        )
    }
}

/// Host audio focus arbitration.
pub trait AudioFocusBridge: Send + Sync {
    fn request_focus(&self) -> Result<FocusRequestResult>;

    fn abandon_focus(&self) -> Result<()>;
}
