//! # Dispatcher
//!
//! All playback state lives in one [`PlaybackOrchestrator`] owned by a single
//! tokio task. Everything that can change it (host commands, decoder
//! signals, timer events) arrives as a message and is handled to completion
//! before the next one, in this priority order:
//!
//! 1. decoder notices
//! 2. timer events
//! 3. commands from [`PlaybackHandle`]s
//!
//! The task shuts down on [`PlaybackHandle::shutdown`] or once every handle
//! has been dropped, releasing every held resource either way.

use crate::error::{PlaybackError, Result};
use crate::orchestrator::{PlaybackOrchestrator, PlaybackSnapshot};
use crate::timers::TimerEvent;
use bridge_traits::{DecoderNotice, FocusChange, MediaButton, NotificationAction, Track};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream, SkipDirection};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug)]
pub(crate) enum Command {
    Play {
        track: Track,
        duplicate: Option<bool>,
    },
    Resume,
    Pause,
    Stop,
    Release,
    Seek(Duration),
    SetVolume(f32),
    SetLooping(bool),
    SwitchLoopMode,
    Skip(SkipDirection),
    PlayPause,
    FastForward,
    Rewind,
    FocusChanged(FocusChange),
    MediaButton(MediaButton),
    NotificationAction(NotificationAction),
    BecomingNoisy,
    SetQueue {
        tracks: Vec<Track>,
        custom: bool,
    },
    ResetQueue,
    RestoreQueue,
    SetUiAttached(bool),
    SetAccentColor(u32),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Play { .. } => "play",
            Command::Resume => "resume",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Release => "release",
            Command::Seek(_) => "seek",
            Command::SetVolume(_) => "set_volume",
            Command::SetLooping(_) => "set_looping",
            Command::SwitchLoopMode => "switch_loop_mode",
            Command::Skip(_) => "skip",
            Command::PlayPause => "play_pause",
            Command::FastForward => "fast_forward",
            Command::Rewind => "rewind",
            Command::FocusChanged(_) => "focus_changed",
            Command::MediaButton(_) => "media_button",
            Command::NotificationAction(_) => "notification_action",
            Command::BecomingNoisy => "becoming_noisy",
            Command::SetQueue { .. } => "set_queue",
            Command::ResetQueue => "reset_queue",
            Command::RestoreQueue => "restore_queue",
            Command::SetUiAttached(_) => "set_ui_attached",
            Command::SetAccentColor(_) => "set_accent_color",
            Command::Snapshot(_) => "snapshot",
            Command::Shutdown(_) => "shutdown",
        }
    }
}

/// Spawns the dispatcher task.
pub struct PlaybackRuntime {
    orchestrator: PlaybackOrchestrator,
    commands: mpsc::UnboundedReceiver<Command>,
    notices: mpsc::UnboundedReceiver<DecoderNotice>,
    timers: mpsc::UnboundedReceiver<TimerEvent>,
}

impl PlaybackRuntime {
    /// Start the dispatcher on the current tokio runtime.
    pub fn start(config: &CoreConfig, events: EventBus) -> (PlaybackHandle, JoinHandle<()>) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let (timer_tx, timers) = mpsc::unbounded_channel();

        let orchestrator = PlaybackOrchestrator::new(config, events.clone(), notice_tx, timer_tx);
        let runtime = Self {
            orchestrator,
            commands,
            notices,
            timers,
        };

        let task = tokio::spawn(runtime.run());
        let handle = PlaybackHandle {
            commands: command_tx,
            events,
        };
        (handle, task)
    }

    async fn run(mut self) {
        self.orchestrator.init().await;

        loop {
            tokio::select! {
                biased;

                Some(notice) = self.notices.recv() => {
                    let result = self.orchestrator.on_decoder_notice(notice).await;
                    self.orchestrator.settle("decoder_notice", result);
                }
                Some(event) = self.timers.recv() => {
                    let result = self.orchestrator.on_timer(event).await;
                    self.orchestrator.settle("timer", result);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown(done)) => {
                        self.orchestrator.teardown().await;
                        let _ = done.send(());
                        break;
                    }
                    Some(command) => self.dispatch(command).await,
                    None => {
                        debug!("All playback handles dropped");
                        self.orchestrator.teardown().await;
                        break;
                    }
                },
            }
        }

        info!("Playback dispatcher stopped");
    }

    async fn dispatch(&mut self, command: Command) {
        let name = command.name();
        let orchestrator = &mut self.orchestrator;

        let result = match command {
            Command::Play { track, duplicate } => orchestrator.play(track, duplicate).await,
            Command::Resume => orchestrator.resume().await,
            Command::Pause => orchestrator.pause().await,
            Command::Stop => orchestrator.stop().await,
            Command::Release => {
                orchestrator.release().await;
                Ok(())
            }
            Command::Seek(position) => orchestrator.seek(position),
            Command::SetVolume(volume) => orchestrator.set_volume(volume),
            Command::SetLooping(looping) => orchestrator.set_looping(looping),
            Command::SwitchLoopMode => orchestrator.switch_loop_mode().await,
            Command::Skip(direction) => orchestrator.skip(direction).await,
            Command::PlayPause => orchestrator.play_pause().await,
            Command::FastForward => orchestrator.fast_forward(),
            Command::Rewind => orchestrator.rewind(),
            Command::FocusChanged(change) => orchestrator.on_focus_change(change).await,
            Command::MediaButton(button) => orchestrator.on_media_button(button).await,
            Command::NotificationAction(action) => {
                orchestrator.on_notification_action(action).await
            }
            Command::BecomingNoisy => orchestrator.on_becoming_noisy().await,
            Command::SetQueue { tracks, custom } => {
                orchestrator.set_queue(tracks, custom).await;
                Ok(())
            }
            Command::ResetQueue => {
                orchestrator.reset_queue();
                Ok(())
            }
            Command::RestoreQueue => orchestrator.restore_queue().await,
            Command::SetUiAttached(attached) => {
                orchestrator.set_ui_attached(attached);
                Ok(())
            }
            Command::SetAccentColor(color) => {
                orchestrator.set_accent_color(color).await;
                Ok(())
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(orchestrator.snapshot());
                Ok(())
            }
            // Handled by the run loop.
            Command::Shutdown(_) => Ok(()),
        };

        orchestrator.settle(name, result);
    }
}

/// Cloneable handle for driving playback from the host.
///
/// Commands are queued and applied in order by the dispatcher; failures are
/// reported as `PlaybackEvent::Error` on the event bus rather than returned.
/// Methods only fail with [`PlaybackError::RuntimeClosed`] once the
/// dispatcher has stopped.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: EventBus,
}

impl PlaybackHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::RuntimeClosed)
    }

    // ========================================================================
    // Playback Control
    // ========================================================================

    /// Play `track`. `duplicate` is the UI's verdict on whether this is a
    /// repeated occurrence in the queue; `None` lets the core decide.
    pub fn play(&self, track: Track, duplicate: Option<bool>) -> Result<()> {
        self.send(Command::Play { track, duplicate })
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn release(&self) -> Result<()> {
        self.send(Command::Release)
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(Command::Seek(position))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(Command::SetVolume(volume))
    }

    pub fn set_looping(&self, looping: bool) -> Result<()> {
        self.send(Command::SetLooping(looping))
    }

    pub fn switch_loop_mode(&self) -> Result<()> {
        self.send(Command::SwitchLoopMode)
    }

    pub fn skip_next(&self) -> Result<()> {
        self.send(Command::Skip(SkipDirection::Forward))
    }

    pub fn skip_previous(&self) -> Result<()> {
        self.send(Command::Skip(SkipDirection::Backward))
    }

    pub fn play_pause(&self) -> Result<()> {
        self.send(Command::PlayPause)
    }

    pub fn fast_forward(&self) -> Result<()> {
        self.send(Command::FastForward)
    }

    pub fn rewind(&self) -> Result<()> {
        self.send(Command::Rewind)
    }

    // ========================================================================
    // Host Callbacks
    // ========================================================================

    pub fn focus_changed(&self, change: FocusChange) -> Result<()> {
        self.send(Command::FocusChanged(change))
    }

    pub fn media_button(&self, button: MediaButton) -> Result<()> {
        self.send(Command::MediaButton(button))
    }

    pub fn notification_action(&self, action: NotificationAction) -> Result<()> {
        self.send(Command::NotificationAction(action))
    }

    pub fn becoming_noisy(&self) -> Result<()> {
        self.send(Command::BecomingNoisy)
    }

    // ========================================================================
    // Queue & Session
    // ========================================================================

    pub fn set_queue(&self, tracks: Vec<Track>, custom: bool) -> Result<()> {
        self.send(Command::SetQueue { tracks, custom })
    }

    pub fn reset_queue(&self) -> Result<()> {
        self.send(Command::ResetQueue)
    }

    pub fn restore_queue(&self) -> Result<()> {
        self.send(Command::RestoreQueue)
    }

    pub fn set_ui_attached(&self, attached: bool) -> Result<()> {
        self.send(Command::SetUiAttached(attached))
    }

    /// Accent color (`0xAARRGGBB`) used by the notification.
    pub fn set_accent_color(&self, color: u32) -> Result<()> {
        self.send(Command::SetAccentColor(color))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// State after every previously sent command has been applied.
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        response.await.map_err(|_| PlaybackError::RuntimeClosed)
    }

    pub async fn is_playing(&self) -> Result<bool> {
        Ok(self.snapshot().await?.is_playing)
    }

    pub async fn is_looping(&self) -> Result<bool> {
        Ok(self.snapshot().await?.is_looping)
    }

    pub async fn volume(&self) -> Result<f32> {
        Ok(self.snapshot().await?.volume)
    }

    pub async fn position(&self) -> Result<Duration> {
        Ok(self.snapshot().await?.position)
    }

    pub async fn duration(&self) -> Result<Option<Duration>> {
        Ok(self.snapshot().await?.duration)
    }

    // ========================================================================
    // Events & Lifecycle
    // ========================================================================

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Release everything and stop the dispatcher.
    pub async fn shutdown(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.send(Command::Shutdown(done))?;
        finished.await.map_err(|_| PlaybackError::RuntimeClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
