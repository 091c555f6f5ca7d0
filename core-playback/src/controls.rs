//! Headset hook button handling.
//!
//! Single-button headsets only report "hook" presses. Presses are counted
//! for a short window opened by the first press; when the window closes the
//! count picks the action.

use crate::timers::{DelayedTask, TimerEvent};
use bridge_traits::MediaButton;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Action chosen once the hook press window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookResolution {
    pub presses: u32,
    pub button: MediaButton,
}

impl HookResolution {
    pub fn from_presses(presses: u32) -> Self {
        let button = match presses {
            0 | 1 => MediaButton::PlayPause,
            2 => MediaButton::Next,
            _ => MediaButton::Previous,
        };
        Self { presses, button }
    }
}

#[derive(Debug)]
pub struct HookButtonTracker {
    window: Duration,
    presses: u32,
    timer: DelayedTask,
}

impl HookButtonTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            presses: 0,
            timer: DelayedTask::hook_window(),
        }
    }

    /// Count a press, opening the window on the first one.
    pub fn press(&mut self, events: &mpsc::UnboundedSender<TimerEvent>) -> u32 {
        self.presses += 1;
        if self.presses == 1 {
            self.timer.schedule(self.window, events);
        }
        debug!(presses = self.presses, "Hook pressed");
        self.presses
    }

    /// Close the window. `None` if `generation` is stale.
    pub fn resolve(&mut self, generation: u64) -> Option<HookResolution> {
        if !self.timer.fire(generation) {
            return None;
        }
        let presses = std::mem::take(&mut self.presses);
        Some(HookResolution::from_presses(presses))
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.presses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const WINDOW: Duration = Duration::from_millis(500);

    async fn resolve_after(presses: u32) -> (HookResolution, Duration) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = HookButtonTracker::new(WINDOW);
        let started = Instant::now();

        for _ in 0..presses {
            tracker.press(&tx);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let TimerEvent::HookWindowElapsed { generation } = rx.recv().await.unwrap() else {
            panic!("unexpected event");
        };
        (tracker.resolve(generation).unwrap(), started.elapsed())
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_counts_select_action() {
        let (single, elapsed) = resolve_after(1).await;
        assert_eq!(single.button, MediaButton::PlayPause);
        assert_eq!(elapsed, WINDOW);

        let (double, _) = resolve_after(2).await;
        assert_eq!(double.button, MediaButton::Next);

        let (triple, _) = resolve_after(3).await;
        assert_eq!(triple.button, MediaButton::Previous);
        assert_eq!(triple.presses, 3);

        assert_eq!(
            HookResolution::from_presses(5).button,
            MediaButton::Previous
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_is_not_extended_by_later_presses() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = HookButtonTracker::new(WINDOW);
        let started = Instant::now();

        tracker.press(&tx);
        tokio::time::sleep(Duration::from_millis(400)).await;
        tracker.press(&tx);

        let TimerEvent::HookWindowElapsed { generation } = rx.recv().await.unwrap() else {
            panic!("unexpected event");
        };
        assert_eq!(started.elapsed(), WINDOW);
        assert_eq!(tracker.resolve(generation).unwrap().presses, 2);

        // Counter starts over after resolution.
        assert_eq!(tracker.press(&tx), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_presses() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = HookButtonTracker::new(WINDOW);
        tracker.press(&tx);
        tracker.cancel();

        assert!(tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .is_err());
        assert_eq!(tracker.press(&tx), 1);
    }
}
