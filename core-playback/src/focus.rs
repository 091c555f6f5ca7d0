//! Audio focus coordination.
//!
//! Tracks whether the OS has granted us audio output and translates
//! involuntary focus changes into bare pause/resume actions for the
//! orchestrator. The coordinator never calls back into the orchestrator
//! itself; it returns a [`FocusAction`] and the dispatcher applies it.

use bridge_traits::{AudioFocusBridge, FocusChange, FocusRequestResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusState {
    Loss,
    Gain,
}

/// What the orchestrator must do in response to a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
    None,
    BarePause,
    BareResume,
}

pub struct AudioFocusCoordinator {
    bridge: Arc<dyn AudioFocusBridge>,
    state: FocusState,
    /// A request is outstanding with the OS (granted or delayed).
    requested: bool,
    resume_on_gain: bool,
}

impl AudioFocusCoordinator {
    pub fn new(bridge: Arc<dyn AudioFocusBridge>) -> Self {
        Self {
            bridge,
            state: FocusState::Loss,
            requested: false,
            resume_on_gain: false,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn has_focus(&self) -> bool {
        self.state == FocusState::Gain
    }

    /// Ask the OS for focus unless it is already granted.
    ///
    /// Anything other than an immediate grant leaves the state at `Loss`.
    pub fn request_focus(&mut self) -> FocusState {
        if self.state == FocusState::Gain {
            return self.state;
        }

        self.state = match self.bridge.request_focus() {
            Ok(FocusRequestResult::Granted) => {
                self.requested = true;
                FocusState::Gain
            }
            Ok(FocusRequestResult::Delayed) => {
                self.requested = true;
                debug!("Audio focus request delayed");
                FocusState::Loss
            }
            Ok(FocusRequestResult::Failed) => {
                warn!("Audio focus request denied");
                FocusState::Loss
            }
            Err(err) => {
                warn!(error = %err, "Audio focus request failed");
                FocusState::Loss
            }
        };
        self.state
    }

    /// Give focus back after a voluntary pause, stop or release.
    pub fn abandon(&mut self) {
        self.resume_on_gain = false;
        self.state = FocusState::Loss;
        if !std::mem::take(&mut self.requested) {
            return;
        }
        if let Err(err) = self.bridge.abandon_focus() {
            warn!(error = %err, "Failed to abandon audio focus");
        }
    }

    /// Remember that playback should start once focus arrives.
    pub fn mark_resume_on_gain(&mut self) {
        self.resume_on_gain = true;
    }

    /// Apply a focus change reported by the OS.
    ///
    /// `active` says whether playback was running (or about to start) when
    /// the change arrived.
    pub fn on_focus_change(&mut self, change: FocusChange, active: bool) -> FocusAction {
        debug!(?change, active, "Audio focus changed");

        if change == FocusChange::Gain {
            self.state = FocusState::Gain;
            self.requested = true;
            return if std::mem::take(&mut self.resume_on_gain) {
                FocusAction::BareResume
            } else {
                FocusAction::None
            };
        }

        self.state = FocusState::Loss;
        if !change.is_transient() {
            self.requested = false;
            self.resume_on_gain = false;
        }

        if !active {
            return FocusAction::None;
        }
        if change.is_transient() {
            self.resume_on_gain = true;
        }
        FocusAction::BarePause
    }
}

impl std::fmt::Debug for AudioFocusCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFocusCoordinator")
            .field("state", &self.state)
            .field("requested", &self.requested)
            .field("resume_on_gain", &self.resume_on_gain)
            .finish()
    }
}
