//! Position ticker.
//!
//! One repeating task posts [`TimerEvent::PositionTick`] every period while
//! something is audible. The dispatcher reads positions on each tick and
//! stops the ticker once no player is active.

use crate::timers::TimerEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub struct PositionTicker {
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl PositionTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start ticking. Returns `false` if already running.
    pub fn start(&mut self, events: &mpsc::UnboundedSender<TimerEvent>) -> bool {
        if self.task.is_some() {
            return false;
        }

        let generation = self.generation;
        let period = self.period;
        let events = events.downgrade();

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(events) = events.upgrade() else {
                    break;
                };
                if events.send(TimerEvent::PositionTick { generation }).is_err() {
                    break;
                }
            }
        }));

        debug!(generation, ?period, "Position ticker started");
        true
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "Position ticker stopped");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a tick with this generation belongs to the running ticker.
    pub fn accepts(&self, generation: u64) -> bool {
        self.task.is_some() && generation == self.generation
    }
}

impl Drop for PositionTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for PositionTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionTicker")
            .field("period", &self.period)
            .field("generation", &self.generation)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};

    const PERIOD: Duration = Duration::from_millis(200);

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = PositionTicker::new(PERIOD);
        let started = Instant::now();

        assert!(ticker.start(&tx));
        assert!(!ticker.start(&tx));

        for expected in 0..3u32 {
            let TimerEvent::PositionTick { generation } = rx.recv().await.unwrap() else {
                panic!("unexpected event");
            };
            assert!(ticker.accepts(generation));
            assert_eq!(started.elapsed(), PERIOD * expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_ticks_and_invalidates_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = PositionTicker::new(PERIOD);
        ticker.start(&tx);

        let TimerEvent::PositionTick { generation } = rx.recv().await.unwrap() else {
            panic!("unexpected event");
        };
        ticker.stop();

        assert!(!ticker.accepts(generation));
        // Drain anything posted before the abort landed.
        while rx.try_recv().is_ok() {}
        assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());

        assert!(ticker.start(&tx));
        assert!(!ticker.accepts(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_exits_when_dispatcher_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut ticker = PositionTicker::new(PERIOD);
        ticker.start(&tx);

        drop(rx);
        drop(tx);
        tokio::time::sleep(PERIOD * 3).await;
        tokio::task::yield_now().await;

        let task = ticker.task.take().unwrap();
        assert!(task.is_finished());
    }
}
