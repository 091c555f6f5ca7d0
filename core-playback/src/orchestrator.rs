//! # Playback Orchestrator
//!
//! Composes the resource state machine, queue, audio focus, wake lock,
//! timers and host session bridges into the operations a user or the OS can
//! trigger. Each composed operation performs its side effects in a fixed
//! order; see the method docs.
//!
//! The orchestrator is owned by the dispatcher task and only ever mutated
//! there, so none of its components need locks.
//!
//! ## Bare vs normal operations
//!
//! `pause`/`resume` manage audio focus and then delegate to
//! `bare_pause`/`bare_resume`, which never touch focus. Focus-change
//! handling calls the bare variants directly, so focus is never requested
//! or abandoned twice for one transition.

use crate::controls::{HookButtonTracker, HookResolution};
use crate::error::{PlaybackError, Result};
use crate::focus::{AudioFocusCoordinator, FocusAction, FocusState};
use crate::persistence::{PlaybackPrefs, QueueSnapshotStore};
use crate::player::{CompletionOutcome, Player, PlayerId, ResourceState};
use crate::queue::QueueManager;
use crate::ticker::PositionTicker;
use crate::timers::{DelayedTask, TimerEvent};
use crate::wake_lock::{WakeLockManager, WakeLockState};
use bridge_traits::{
    AudioSource, DecoderId, DecoderNotice, DecoderSignal, FocusChange, ForegroundService, MediaButton,
    NotificationAction, NotificationPresenter, NotificationState, Track,
};
use core_runtime::config::{CoreConfig, PlaybackSettings};
use core_runtime::events::{
    ControlEvent, CoreEvent, EventBus, FocusEvent, PlaybackEvent, PlayerState, SkipDirection,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Point-in-time view of the playback core.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub resource_state: ResourceState,
    pub focus: FocusState,
    pub wake_lock: WakeLockState,
    pub is_playing: bool,
    pub is_looping: bool,
    pub volume: f32,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub current_track: Option<Track>,
    pub queue_len: usize,
    pub ui_attached: bool,
    pub service_running: bool,
}

pub struct PlaybackOrchestrator {
    player: Player,
    queue: QueueManager,
    focus: AudioFocusCoordinator,
    wake_lock: WakeLockManager,
    ticker: PositionTicker,
    service_stop: DelayedTask,
    hooks: HookButtonTracker,
    prefs: PlaybackPrefs,
    notifications: Arc<dyn NotificationPresenter>,
    service: Arc<dyn ForegroundService>,
    events: EventBus,
    timers: mpsc::UnboundedSender<TimerEvent>,
    settings: PlaybackSettings,
    ui_attached: bool,
    service_running: bool,
    accent_color: Option<u32>,
}

impl PlaybackOrchestrator {
    pub fn new(
        config: &CoreConfig,
        events: EventBus,
        notices: mpsc::UnboundedSender<DecoderNotice>,
        timers: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let settings = config.playback.clone();
        let snapshots = QueueSnapshotStore::new(
            Arc::clone(&config.json_store),
            settings.queue_file.clone(),
            settings.id_map_file.clone(),
        );

        Self {
            player: Player::new(PlayerId(0), Arc::clone(&config.decoder_factory), notices),
            queue: QueueManager::new(Arc::clone(&config.media_index), snapshots),
            focus: AudioFocusCoordinator::new(Arc::clone(&config.audio_focus)),
            wake_lock: WakeLockManager::new(
                Arc::clone(&config.wake_lock),
                settings.timed_wake_lock,
                settings.wake_lock_bridge,
            ),
            ticker: PositionTicker::new(settings.position_update_period),
            service_stop: DelayedTask::service_stop(),
            hooks: HookButtonTracker::new(settings.hook_press_window),
            prefs: PlaybackPrefs::new(
                Arc::clone(&config.settings_store),
                settings.prefs_namespace.clone(),
            ),
            notifications: Arc::clone(&config.notifications),
            service: Arc::clone(&config.foreground_service),
            events,
            timers,
            settings,
            ui_attached: false,
            service_running: false,
            accent_color: None,
        }
    }

    /// Restore persisted loop mode and accent color.
    pub async fn init(&mut self) {
        let looping = self.prefs.loop_mode().await;
        if let Err(err) = self.player.set_looping(looping) {
            warn!(error = %err, "Failed to restore loop mode");
        }
        self.accent_color = self.prefs.primary_color().await;
        info!(looping, "Playback core initialized");
    }

    // ========================================================================
    // Composed Operations
    // ========================================================================

    /// Play `track` from the start (or wherever a pending seek points).
    ///
    /// Order: wake lock, service, duplicate id, current track, optimistic
    /// notification, bind source, focus. Output starts and `PLAYING` is
    /// announced only once focus is granted.
    #[instrument(skip(self, track), fields(track_id = track.id))]
    pub async fn play(&mut self, track: Track, duplicate: Option<bool>) -> Result<()> {
        self.play_from(track, duplicate, None, None).await
    }

    /// `slot` is the queue index `track` came from when navigating the queue.
    async fn play_from(
        &mut self,
        mut track: Track,
        duplicate: Option<bool>,
        slot: Option<usize>,
        position: Option<Duration>,
    ) -> Result<()> {
        self.wake_lock.acquire();
        self.ensure_service();

        self.queue.handle_duplicate(&mut track, duplicate, slot).await;
        let source = AudioSource::from_location(&track.location);
        self.prefs.set_song_id(track.id).await;
        self.queue.set_current_song(track);
        self.present(true, false);

        if let Err(err) = self.bind(source, position) {
            self.wind_down().await;
            return Err(err);
        }

        if self.focus.request_focus() != FocusState::Gain {
            debug!("Focus not granted, source prepared silently");
            self.focus.mark_resume_on_gain();
            return Ok(());
        }

        if let Err(err) = self.player.play() {
            self.wind_down().await;
            return Err(err);
        }
        self.mark_playing().await;
        Ok(())
    }

    fn bind(&mut self, source: AudioSource, position: Option<Duration>) -> Result<()> {
        self.player.set_source(source)?;
        if let Some(position) = position {
            self.player.seek(position)?;
        }
        Ok(())
    }

    /// Continue the current source if focus can be obtained.
    pub async fn resume(&mut self) -> Result<()> {
        if self.focus.request_focus() != FocusState::Gain {
            self.focus.mark_resume_on_gain();
            return Ok(());
        }

        let resumed = self.bare_resume().await;
        if matches!(&resumed, Err(err) if err.is_illegal_state()) {
            // Nothing to play, so nothing should hold focus.
            self.focus.abandon();
        }
        resumed
    }

    /// Resume without touching audio focus.
    pub async fn bare_resume(&mut self) -> Result<()> {
        self.player.play()?;
        self.wake_lock.acquire();
        self.ensure_service();
        self.mark_playing().await;
        Ok(())
    }

    /// Pause, then give focus back.
    pub async fn pause(&mut self) -> Result<()> {
        let paused = self.bare_pause().await;
        self.focus.abandon();
        paused
    }

    /// Pause without touching audio focus.
    ///
    /// Order: timed wake lock, delayed service stop, pause output,
    /// non-ongoing notification, persisted flags, `PAUSED`.
    pub async fn bare_pause(&mut self) -> Result<()> {
        self.wake_lock.acquire_timed();
        self.service_stop
            .schedule(self.settings.service_stop_delay, &self.timers);
        let paused = self.player.pause();
        self.ticker.stop();
        self.call_service("stop_foreground", self.service.stop_foreground());
        self.present(false, false);

        self.prefs.set_playing(false).await;
        if let Ok(position) = self.player.position() {
            self.prefs.set_song_position(position).await;
        }
        self.emit_state(PlayerState::Paused);
        paused
    }

    /// Pause, rewind to the start and give focus back.
    pub async fn stop(&mut self) -> Result<()> {
        self.wake_lock.acquire_timed();
        self.service_stop
            .schedule(self.settings.service_stop_delay, &self.timers);
        let stopped = self.player.stop();
        self.ticker.stop();
        self.call_service("stop_foreground", self.service.stop_foreground());
        self.present(false, true);

        self.prefs.set_playing(false).await;
        self.prefs.set_song_position(Duration::ZERO).await;
        self.emit_state(PlayerState::Stopped);
        self.focus.abandon();
        stopped
    }

    /// Stop everything and free every held resource.
    pub async fn release(&mut self) {
        self.ticker.stop();
        self.service_stop.cancel();
        self.hooks.cancel();
        self.player.release();
        self.wake_lock.release();
        self.focus.abandon();
        self.present(false, true);
        self.prefs.set_playing(false).await;
        self.emit_state(PlayerState::Stopped);
    }

    pub fn seek(&mut self, position: Duration) -> Result<()> {
        self.player.seek(position)
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.player.set_volume(volume)
    }

    pub fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.player.set_looping(looping)
    }

    /// Toggle looping, persist it and tell listeners.
    pub async fn switch_loop_mode(&mut self) -> Result<()> {
        let looping = !self.player.is_looping();
        self.player.set_looping(looping)?;
        self.prefs.set_loop_mode(looping).await;
        self.emit(CoreEvent::Playback(PlaybackEvent::LoopModeSwitched { looping }));
        self.present(self.player.is_playing(), false);
        Ok(())
    }

    /// Move through the queue, or ask the UI to when one is attached.
    pub async fn skip(&mut self, direction: SkipDirection) -> Result<()> {
        if self.ui_attached {
            self.emit(CoreEvent::Control(ControlEvent::SkipRequested { direction }));
            return Ok(());
        }

        self.queue.restore_queue().await?;
        let (slot, track) = match direction {
            SkipDirection::Forward => self.queue.next_slot(),
            SkipDirection::Backward => self.queue.prev_slot(),
        }
        .ok_or_else(|| PlaybackError::illegal_state("queue is empty"))?;

        self.prefs.set_song_position(Duration::ZERO).await;
        self.play_from(track, None, Some(slot), Some(Duration::ZERO))
            .await
    }

    /// Pause when active, otherwise resume.
    ///
    /// With nothing bound and no UI attached, the persisted current song is
    /// restored and played from its saved position.
    pub async fn play_pause(&mut self) -> Result<()> {
        if self.player.source().is_none() {
            if self.ui_attached {
                return Ok(());
            }
            let song_id = self.prefs.song_id().await;
            self.queue.init_current_song(song_id).await?;
            let track = self
                .queue
                .current_song()
                .cloned()
                .ok_or_else(|| PlaybackError::illegal_state("no song to resume"))?;
            let position = self.prefs.song_position().await;
            return self
                .play_from(track, Some(false), None, Some(position))
                .await;
        }

        if self.player.is_active() {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    pub fn fast_forward(&mut self) -> Result<()> {
        self.seek_by(self.settings.seek_step, true)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.seek_by(self.settings.seek_step, false)
    }

    fn seek_by(&mut self, step: Duration, forward: bool) -> Result<()> {
        let position = self.player.position()?;
        let mut target = if forward {
            position.saturating_add(step)
        } else {
            position.saturating_sub(step)
        };
        if let Some(duration) = self.player.duration()? {
            target = target.min(duration);
        }
        self.player.seek(target)
    }

    // ========================================================================
    // Host Callbacks
    // ========================================================================

    pub async fn on_focus_change(&mut self, change: FocusChange) -> Result<()> {
        self.emit(CoreEvent::Focus(FocusEvent::Changed { change }));
        match self.focus.on_focus_change(change, self.player.is_active()) {
            FocusAction::BarePause => self.bare_pause().await,
            FocusAction::BareResume => self.bare_resume().await,
            FocusAction::None => Ok(()),
        }
    }

    pub async fn on_media_button(&mut self, button: MediaButton) -> Result<()> {
        self.emit(CoreEvent::Control(ControlEvent::MediaButton { button }));
        match button {
            MediaButton::Play => self.resume().await,
            MediaButton::Pause => self.pause().await,
            MediaButton::PlayPause => self.play_pause().await,
            MediaButton::Stop => self.stop().await,
            MediaButton::Next => self.skip(SkipDirection::Forward).await,
            MediaButton::Previous => self.skip(SkipDirection::Backward).await,
            MediaButton::FastForward => self.fast_forward(),
            MediaButton::Rewind => self.rewind(),
            MediaButton::Hook => {
                self.hooks.press(&self.timers);
                Ok(())
            }
        }
    }

    pub async fn on_notification_action(&mut self, action: NotificationAction) -> Result<()> {
        match action {
            NotificationAction::Play => self.resume().await,
            NotificationAction::Pause => self.pause().await,
            NotificationAction::Next => self.skip(SkipDirection::Forward).await,
            NotificationAction::Previous => self.skip(SkipDirection::Backward).await,
            NotificationAction::SwitchLoop => self.switch_loop_mode().await,
            NotificationAction::Dismiss => {
                self.release().await;
                self.stop_service();
                Ok(())
            }
        }
    }

    /// Audio output is about to become noisy (headphones unplugged).
    pub async fn on_becoming_noisy(&mut self) -> Result<()> {
        self.emit(CoreEvent::Control(ControlEvent::BecameNoisy));
        if self.player.is_active() {
            self.pause().await
        } else {
            Ok(())
        }
    }

    pub async fn on_decoder_notice(&mut self, notice: DecoderNotice) -> Result<()> {
        let DecoderNotice { decoder, signal } = notice;
        match signal {
            DecoderSignal::Prepared => {
                let Some(outcome) = self.player.on_prepared(decoder)? else {
                    return Ok(());
                };
                if let Some(duration) = outcome.duration {
                    self.emit(CoreEvent::Playback(PlaybackEvent::DurationKnown {
                        player_id: self.player.id().0,
                        duration_ms: duration_ms(duration),
                    }));
                }
                Ok(())
            }
            DecoderSignal::Completed => self.on_completed(decoder).await,
            DecoderSignal::Error { what, extra } => {
                let Some(err) = self.player.on_error(decoder, what, extra) else {
                    return Ok(());
                };
                self.wind_down().await;
                self.emit_state(PlayerState::Stopped);
                Err(err)
            }
        }
    }

    async fn on_completed(&mut self, decoder: DecoderId) -> Result<()> {
        match self.player.on_completed(decoder) {
            CompletionOutcome::Stale | CompletionOutcome::Looped => return Ok(()),
            CompletionOutcome::Finished => {}
        }

        self.ticker.stop();
        self.emit(CoreEvent::Playback(PlaybackEvent::Completed {
            player_id: self.player.id().0,
            track_id: self.queue.current_song().map(|track| track.id),
        }));

        if !self.ui_attached && !self.player.is_looping() {
            let advanced = self.skip(SkipDirection::Forward).await;
            if advanced.is_err() {
                self.wind_down().await;
            }
            return advanced;
        }

        // The UI decides what plays next.
        self.wind_down().await;
        Ok(())
    }

    pub async fn on_timer(&mut self, event: TimerEvent) -> Result<()> {
        match event {
            TimerEvent::PositionTick { generation } => {
                if self.ticker.accepts(generation) {
                    self.tick();
                }
                Ok(())
            }
            TimerEvent::ServiceStopDue { generation } => {
                if self.service_stop.fire(generation) && !self.player.is_active() {
                    info!("Idle timeout reached, stopping service");
                    self.stop_service();
                    self.wake_lock.release();
                }
                Ok(())
            }
            TimerEvent::HookWindowElapsed { generation } => {
                let Some(HookResolution { presses, button }) = self.hooks.resolve(generation)
                else {
                    return Ok(());
                };
                self.emit(CoreEvent::Control(ControlEvent::HookResolved { presses, button }));
                match button {
                    MediaButton::Next => self.skip(SkipDirection::Forward).await,
                    MediaButton::Previous => self.skip(SkipDirection::Backward).await,
                    _ => self.play_pause().await,
                }
            }
        }
    }

    fn tick(&mut self) {
        if !self.player.is_active() {
            self.ticker.stop();
            return;
        }
        if !self.player.is_playing() {
            return;
        }

        match self.player.position() {
            Ok(position) => self.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
                player_id: self.player.id().0,
                position_ms: duration_ms(position),
            })),
            Err(err) if err.is_unsupported_operation() => {
                debug!(player = %self.player.id(), error = %err, "Position unavailable");
            }
            Err(err) => warn!(player = %self.player.id(), error = %err, "Failed to read position"),
        }
    }

    // ========================================================================
    // Queue & Session
    // ========================================================================

    pub async fn set_queue(&mut self, tracks: Vec<Track>, custom: bool) {
        self.queue.set_queue(tracks, custom).await;
    }

    pub fn reset_queue(&mut self) {
        self.queue.reset_queue();
    }

    pub async fn restore_queue(&mut self) -> Result<()> {
        self.queue.restore_queue().await
    }

    /// A foreground UI attached or detached.
    pub fn set_ui_attached(&mut self, attached: bool) {
        debug!(attached, "UI attachment changed");
        self.ui_attached = attached;
    }

    pub async fn set_accent_color(&mut self, color: u32) {
        self.accent_color = Some(color);
        self.prefs.set_primary_color(color).await;
        self.present(self.player.is_playing(), false);
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            resource_state: self.player.state(),
            focus: self.focus.state(),
            wake_lock: self.wake_lock.state(),
            is_playing: self.player.is_playing(),
            is_looping: self.player.is_looping(),
            volume: self.player.volume(),
            position: self.player.position().unwrap_or_default(),
            duration: self.player.duration().unwrap_or_default(),
            current_track: self.queue.current_song().cloned(),
            queue_len: self.queue.len(),
            ui_attached: self.ui_attached,
            service_running: self.service_running,
        }
    }

    /// Release everything and take the service and notification down.
    pub async fn teardown(&mut self) {
        self.release().await;
        self.stop_service();
        if let Err(err) = self.notifications.cancel_notification() {
            warn!(error = %err, "Failed to cancel notification");
        }
        info!("Playback core torn down");
    }

    // ========================================================================
    // Error Boundary
    // ========================================================================

    /// Settle the outcome of an operation. Errors never escape the dispatcher:
    /// illegal-state errors are logged, everything else becomes an error event.
    pub fn settle(&self, operation: &'static str, result: Result<()>) {
        let Err(err) = result else {
            return;
        };
        if err.is_illegal_state() {
            warn!(operation, error = %err, "Operation ignored");
            return;
        }
        error!(operation, error = %err, "Playback operation failed");
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            code: err.code(),
            message: err.to_string(),
        }));
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Nothing plays until the next user action: let the device sleep and
    /// schedule the service stop.
    async fn wind_down(&mut self) {
        self.ticker.stop();
        self.wake_lock.acquire_timed();
        self.service_stop
            .schedule(self.settings.service_stop_delay, &self.timers);
        self.prefs.set_playing(false).await;
        self.present(false, false);
    }

    async fn mark_playing(&mut self) {
        self.service_stop.cancel();
        self.ticker.start(&self.timers);
        self.call_service("start_foreground", self.service.start_foreground());
        self.prefs.set_playing(true).await;
        self.emit_state(PlayerState::Playing);
        self.present(true, false);
    }

    fn ensure_service(&mut self) {
        self.service_stop.cancel();
        if !self.service_running {
            self.call_service("start_service", self.service.start_service());
            self.service_running = true;
        }
    }

    fn stop_service(&mut self) {
        self.service_stop.cancel();
        if self.service_running {
            self.call_service("stop_service", self.service.stop_service());
            self.service_running = false;
        }
    }

    fn call_service(&self, call: &'static str, result: bridge_traits::error::Result<()>) {
        if let Err(err) = result {
            warn!(call, error = %err, "Foreground service call failed");
        }
    }

    fn present(&self, is_playing: bool, stopped: bool) {
        let state = NotificationState {
            track: self.queue.current_song().cloned(),
            is_playing,
            is_looping: self.player.is_looping(),
            ongoing: is_playing,
            stopped,
            accent_color: self.accent_color,
        };
        if let Err(err) = self.notifications.update_notification(&state) {
            warn!(error = %err, "Failed to update notification");
        }
    }

    fn emit_state(&self, state: PlayerState) {
        self.emit(CoreEvent::Playback(PlaybackEvent::StateChanged { state }));
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is not an error.
        let _ = self.events.emit(event);
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for PlaybackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackOrchestrator")
            .field("player", &self.player)
            .field("queue", &self.queue)
            .field("focus", &self.focus)
            .field("wake_lock", &self.wake_lock)
            .field("ticker", &self.ticker)
            .field("ui_attached", &self.ui_attached)
            .finish()
    }
}
