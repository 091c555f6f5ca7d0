//! # Event Bus System
//!
//! Outbound event stream of the playback core, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Everything the core wants the UI/RPC layer to know about is a [`CoreEvent`]:
//! - **Playback**: state announcements, position ticks, duration, completion,
//!   errors and loop-mode switches
//! - **Focus**: audio focus changes pushed by the OS
//! - **Control**: requests the core hands to the UI (skip) and transport
//!   controls it received (media buttons, becoming noisy)
//!
//! Events are one tagged union delivered over one channel; there are no
//! listener objects to register.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │  Dispatcher  ├────────────>│ EventBus  ├──────────────>│ UI / RPC   │
//! └──────────────┘             │ (broadcast│               └────────────┘
//!                              │  channel) │   subscribe   ┌────────────┐
//!                              │           ├──────────────>│ Subscriber │
//!                              └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlayerState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::StateChanged {
//!         state: PlayerState::Playing,
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback state changed");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Position ticks arrive five times a second, so slow subscribers will see this.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use bridge_traits::{FocusChange, MediaButton};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Focus(FocusEvent),
    Control(ControlEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Focus(e) => e.description(),
            CoreEvent::Control(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Focus(FocusEvent::Changed {
                change: FocusChange::Loss,
            }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::StateChanged { .. })
            | CoreEvent::Playback(PlaybackEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Playback state announced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Playing => f.write_str("PLAYING"),
            PlayerState::Paused => f.write_str("PAUSED"),
            PlayerState::Stopped => f.write_str("STOPPED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    StateChanged {
        state: PlayerState,
    },
    /// Periodic position tick for one player instance.
    PositionChanged {
        player_id: u32,
        position_ms: u64,
    },
    /// The decoder finished preparing and reported a duration.
    DurationKnown {
        player_id: u32,
        duration_ms: u64,
    },
    /// A non-looping track played to the end.
    Completed {
        player_id: u32,
        track_id: Option<i64>,
    },
    /// Any user-visible failure. `code` carries the decoder's code when the
    /// failure came from the decoder.
    Error {
        code: Option<i32>,
        message: String,
    },
    LoopModeSwitched {
        looping: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::PositionChanged { .. } => "Playback position updated",
            PlaybackEvent::DurationKnown { .. } => "Track duration known",
            PlaybackEvent::Completed { .. } => "Track finished playing",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::LoopModeSwitched { .. } => "Loop mode switched",
        }
    }
}

// ============================================================================
// Focus Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FocusEvent {
    Changed { change: FocusChange },
}

impl FocusEvent {
    fn description(&self) -> &str {
        match self {
            FocusEvent::Changed { .. } => "Audio focus changed",
        }
    }
}

// ============================================================================
// Control Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ControlEvent {
    /// A skip arrived while a UI is attached; the UI decides what plays next.
    SkipRequested { direction: SkipDirection },
    /// A transport control was received from the host.
    MediaButton { button: MediaButton },
    /// A burst of headset hook presses was resolved into an action.
    HookResolved { presses: u32, button: MediaButton },
    /// Audio output is about to become noisy (headphones unplugged).
    BecameNoisy,
}

impl ControlEvent {
    fn description(&self) -> &str {
        match self {
            ControlEvent::SkipRequested { .. } => "Skip requested",
            ControlEvent::MediaButton { .. } => "Media button pressed",
            ControlEvent::HookResolved { .. } => "Headset hook presses resolved",
            ControlEvent::BecameNoisy => "Audio becoming noisy",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for broadcasting events to multiple subscribers.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let focus_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Focus(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::StateChanged {
            state: PlayerState::Playing,
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(playing()).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        assert_eq!(bus.emit(playing()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), playing());
        assert_eq!(sub2.recv().await.unwrap(), playing());
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Focus(_)));

        bus.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
            player_id: 1,
            position_ms: 200,
        }))
        .ok();
        let focus = CoreEvent::Focus(FocusEvent::Changed {
            change: FocusChange::LossTransient,
        });
        bus.emit(focus.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), focus);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
                player_id: 1,
                position_ms: i * 200,
            }))
            .ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            code: Some(1),
            message: "Decoder failed".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(playing().severity(), EventSeverity::Info);

        let tick = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            player_id: 1,
            position_ms: 0,
        });
        assert_eq!(tick.severity(), EventSeverity::Debug);

        let loss = CoreEvent::Focus(FocusEvent::Changed {
            change: FocusChange::Loss,
        });
        assert_eq!(loss.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Control(ControlEvent::SkipRequested {
            direction: SkipDirection::Forward,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Control");
        assert_eq!(json["payload"]["event"], "SkipRequested");
        assert_eq!(json["payload"]["direction"], "forward");

        let state = serde_json::to_value(playing()).unwrap();
        assert_eq!(state["payload"]["state"], "PLAYING");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.description(), "Skip requested");
    }

    #[tokio::test]
    async fn test_try_recv() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(CoreEvent::Control(ControlEvent::BecameNoisy)).ok();
        assert_eq!(
            stream.try_recv().unwrap().unwrap(),
            CoreEvent::Control(ControlEvent::BecameNoisy)
        );
    }
}
