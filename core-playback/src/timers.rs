//! Cancellable one-shot timers for the dispatcher.
//!
//! Timer tasks never touch playback state. They post a [`TimerEvent`] back
//! to the dispatcher through a weak sender; the event carries the
//! generation it was armed with, and the dispatcher drops it if the timer
//! has since been cancelled or re-armed.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Timer notification delivered to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    PositionTick { generation: u64 },
    ServiceStopDue { generation: u64 },
    HookWindowElapsed { generation: u64 },
}

/// A single re-armable delayed event.
pub struct DelayedTask {
    name: &'static str,
    make_event: fn(u64) -> TimerEvent,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl DelayedTask {
    pub fn new(name: &'static str, make_event: fn(u64) -> TimerEvent) -> Self {
        Self {
            name,
            make_event,
            generation: 0,
            task: None,
        }
    }

    pub fn service_stop() -> Self {
        Self::new("service-stop", |generation| TimerEvent::ServiceStopDue { generation })
    }

    pub fn hook_window() -> Self {
        Self::new("hook-window", |generation| TimerEvent::HookWindowElapsed { generation })
    }

    /// Arm the timer, replacing any pending one.
    pub fn schedule(&mut self, delay: Duration, events: &mpsc::UnboundedSender<TimerEvent>) {
        self.cancel();
        let event = (self.make_event)(self.generation);
        let events = events.downgrade();
        trace!(timer = self.name, generation = self.generation, ?delay, "Timer armed");

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(event);
            }
        }));
    }

    /// Disarm the timer. An event already in flight becomes stale.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Consume a fired event. Returns `false` for stale generations.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.task.is_none() || generation != self.generation {
            return false;
        }
        self.task = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for DelayedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedTask")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("pending", &self.is_pending())
            .finish()
    }
}
