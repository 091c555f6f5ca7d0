//! # Playback Core
//!
//! Turns user intents (play, pause, seek, skip, loop) into single-instance
//! audio playback on top of the host OS decoder, while coordinating audio
//! focus, wake locks, the foreground service, the playback notification and
//! persisted queue state.
//!
//! ## Overview
//!
//! Components, leaves first:
//! - [`Player`](player::Player) - resource state machine around one decoder handle
//! - [`WakeLockManager`](wake_lock::WakeLockManager) - timed/untimed wake lock
//! - [`AudioFocusCoordinator`](focus::AudioFocusCoordinator) - focus requests and changes
//! - [`PositionTicker`](ticker::PositionTicker) - periodic position events
//! - [`QueueManager`](queue::QueueManager) - queue, navigation, duplicate ids
//! - [`PlaybackOrchestrator`](orchestrator::PlaybackOrchestrator) - composed operations
//!
//! [`PlaybackRuntime`] runs the orchestrator on a single dispatcher task and
//! hands out [`PlaybackHandle`]s.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::PlaybackRuntime;
//! use core_runtime::events::EventBus;
//!
//! let (handle, task) = PlaybackRuntime::start(&config, EventBus::new(100));
//! let mut events = handle.subscribe();
//!
//! handle.play(track, None)?;
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.description());
//! }
//! ```

pub mod controls;
pub mod error;
pub mod focus;
pub mod orchestrator;
pub mod persistence;
pub mod player;
pub mod queue;
pub mod runtime;
pub mod ticker;
pub mod timers;
pub mod wake_lock;

#[cfg(test)]
mod mocks;

pub use error::{PlaybackError, Result};
pub use focus::FocusState;
pub use orchestrator::PlaybackSnapshot;
pub use player::{PlayerId, ResourceState};
pub use runtime::{PlaybackHandle, PlaybackRuntime};
pub use wake_lock::WakeLockState;
