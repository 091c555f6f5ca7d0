//! Core service façade.
//!
//! Host applications build a [`CoreConfig`] (injecting their decoder, media
//! index and session bridges, or relying on the `desktop-shims` defaults),
//! hand it to [`CoreService`] and drive playback through the returned
//! [`PlaybackHandle`].
//!
//! ```ignore
//! use core_service::CoreService;
//!
//! let mut core = CoreService::new(config);
//! let playback = core.start()?;
//! let mut events = core.subscribe();
//!
//! playback.play(track, None)?;
//! // ...
//! core.shutdown().await?;
//! ```

pub mod error;

pub use core_playback::{PlaybackHandle, PlaybackSnapshot};
pub use core_runtime::config::{CoreConfig, PlaybackSettings};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};
pub use error::{CoreError, Result};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

use core_playback::PlaybackRuntime;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct Running {
    handle: PlaybackHandle,
    task: JoinHandle<()>,
}

/// Primary façade exposed to host applications.
///
/// Owns the playback dispatcher between [`start`](Self::start) and
/// [`shutdown`](Self::shutdown). The event bus outlives restarts, so
/// subscriptions taken before `start` keep receiving events.
pub struct CoreService {
    config: CoreConfig,
    events: EventBus,
    running: Option<Running>,
}

impl CoreService {
    pub fn new(config: CoreConfig) -> Self {
        let events = EventBus::new(config.playback.event_buffer_size);
        Self {
            config,
            events,
            running: None,
        }
    }

    /// Spawn the dispatcher on the current tokio runtime.
    ///
    /// Fails if called outside a runtime or while already running.
    pub fn start(&mut self) -> Result<PlaybackHandle> {
        if self.is_running() {
            return Err(CoreError::AlreadyRunning);
        }
        tokio::runtime::Handle::try_current()
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

        let (handle, task) = PlaybackRuntime::start(&self.config, self.events.clone());
        info!("Core service started");
        self.running = Some(Running {
            handle: handle.clone(),
            task,
        });
        Ok(handle)
    }

    /// Handle to the running dispatcher.
    pub fn handle(&self) -> Result<PlaybackHandle> {
        self.running
            .as_ref()
            .map(|running| running.handle.clone())
            .ok_or(CoreError::NotRunning)
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Release every held resource and wait for the dispatcher to exit.
    pub async fn shutdown(&mut self) -> Result<()> {
        let Running { handle, task } = self.running.take().ok_or(CoreError::NotRunning)?;

        // The dispatcher may already be gone if every handle was dropped.
        if let Err(err) = handle.shutdown().await {
            warn!(error = %err, "Dispatcher exited before shutdown");
        }
        drop(handle);

        task.await
            .map_err(|err| CoreError::Dispatcher(err.to_string()))?;
        info!("Core service stopped");
        Ok(())
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}
