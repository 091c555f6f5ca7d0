//! # Resource State Machine
//!
//! [`Player`] owns exactly one host decoder handle and walks it through
//! `RELEASED → IDLE → PREPARING → PREPARED`.
//!
//! ```text
//!             set_source                prepared signal
//! RELEASED ───────────────> PREPARING ───────────────────> PREPARED
//!    ^                       │    ^                           │
//!    │ release               │    │ set_source (new source):  │
//!    └───────────────────────┘    │ reset + rebind            │
//!                                 └───────────────────────────┘
//! ```
//!
//! A handle that is still preparing cannot be mutated, so a new source
//! arriving in `PREPARING` releases that handle and creates a fresh one.
//! Prepared signals from discarded handles carry a stale [`DecoderId`] and
//! are ignored, which makes the most recent source the only one that can
//! ever reach `PREPARED`.
//!
//! Seeks issued before `PREPARED` are stashed; the last one wins and is
//! applied once. Volume and looping are remembered and replayed onto every
//! handle created afterwards.

use crate::error::{PlaybackError, Result};
use bridge_traits::{
    AudioSource, DecoderFactory, DecoderHandle, DecoderId, DecoderNotice, DecoderSignalSender,
};
use core_runtime::logging::strip_path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Identifier of a player instance, used in position and completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Lifecycle stage of the decoder handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    /// No handle exists.
    Released,
    /// A handle exists but no source is bound.
    Idle,
    /// Source bound, waiting for the decoder's prepared signal.
    Preparing,
    Prepared,
}

/// Result of handling a prepared signal from the live handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedOutcome {
    pub duration: Option<Duration>,
    /// Output started because play was requested while preparing.
    pub started: bool,
}

/// Result of handling an end-of-track signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Signal came from a handle that is no longer current.
    Stale,
    /// Looping is on; the decoder restarted the track by itself.
    Looped,
    /// Playback stopped at the end of the track.
    Finished,
}

pub struct Player {
    id: PlayerId,
    factory: Arc<dyn DecoderFactory>,
    notices: mpsc::UnboundedSender<DecoderNotice>,
    handle: Option<Box<dyn DecoderHandle>>,
    decoder: Option<DecoderId>,
    handles_created: u64,
    state: ResourceState,
    source: Option<AudioSource>,
    volume: f32,
    looping: bool,
    /// Play was requested and not paused since.
    playing: bool,
    pending_seek: Option<Duration>,
}

impl Player {
    pub fn new(
        id: PlayerId,
        factory: Arc<dyn DecoderFactory>,
        notices: mpsc::UnboundedSender<DecoderNotice>,
    ) -> Self {
        Self {
            id,
            factory,
            notices,
            handle: None,
            decoder: None,
            handles_created: 0,
            state: ResourceState::Released,
            source: None,
            volume: 1.0,
            looping: false,
            playing: false,
            pending_seek: None,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Audio is coming out right now.
    pub fn is_playing(&self) -> bool {
        self.playing && self.state == ResourceState::Prepared
    }

    /// Play was requested and the handle is alive (possibly still preparing).
    pub fn is_active(&self) -> bool {
        self.playing && matches!(self.state, ResourceState::Preparing | ResourceState::Prepared)
    }

    /// Identifier of the live handle, if any.
    pub fn decoder(&self) -> Option<DecoderId> {
        self.decoder
    }

    /// Bind a new source and start preparing it.
    ///
    /// Re-binding the source that is already preparing or prepared is a no-op.
    pub fn set_source(&mut self, source: AudioSource) -> Result<()> {
        let live = matches!(self.state, ResourceState::Preparing | ResourceState::Prepared);
        if live && self.source.as_ref() == Some(&source) {
            debug!(player = %self.id, "Source already bound");
            return Ok(());
        }

        match self.state {
            ResourceState::Released => self.create_handle()?,
            ResourceState::Idle => {}
            ResourceState::Preparing => {
                debug!(player = %self.id, "Source changed mid-prepare, recreating handle");
                self.discard_handle();
                self.create_handle()?;
            }
            ResourceState::Prepared => {
                self.handle_mut()?.reset()?;
                self.state = ResourceState::Idle;
            }
        }

        self.source = Some(source.clone());
        self.bind_and_prepare(&source)
    }

    /// Start or continue output. Idempotent.
    ///
    /// While preparing, output starts once the prepared signal arrives. From
    /// `RELEASED` the last source is bound into a fresh handle.
    pub fn play(&mut self) -> Result<()> {
        if self.playing && self.state != ResourceState::Released {
            return Ok(());
        }

        match self.state {
            ResourceState::Released | ResourceState::Idle => {
                let source = self
                    .source
                    .clone()
                    .ok_or_else(|| PlaybackError::illegal_state("no source has been set"))?;
                if self.state == ResourceState::Released {
                    self.create_handle()?;
                }
                self.bind_and_prepare(&source)?;
                self.playing = true;
            }
            ResourceState::Preparing => self.playing = true,
            ResourceState::Prepared => {
                self.handle_mut()?.start()?;
                self.playing = true;
            }
        }

        debug!(player = %self.id, state = ?self.state, "Play requested");
        Ok(())
    }

    /// Silence output, keeping the prepared buffer.
    pub fn pause(&mut self) -> Result<()> {
        if !self.playing {
            return Ok(());
        }
        self.playing = false;
        if self.state == ResourceState::Prepared {
            self.handle_mut()?.pause()?;
        }
        Ok(())
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) -> Result<()> {
        self.pause()?;
        self.seek(Duration::ZERO)
    }

    /// Seek now if prepared, otherwise remember the position for later.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if self.state == ResourceState::Prepared {
            Ok(self.handle_mut()?.seek_to(position)?)
        } else {
            self.pending_seek = Some(position);
            Ok(())
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(PlaybackError::illegal_state(format!(
                "volume must be finite, got {}",
                volume
            )));
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(self.volume)?;
        }
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.looping = looping;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_looping(looping)?;
        }
        Ok(())
    }

    /// Free the decoder handle. Idempotent; the source is kept so a later
    /// `play` can rebuild the handle.
    pub fn release(&mut self) {
        if self.state == ResourceState::Released {
            return;
        }
        self.discard_handle();
        self.playing = false;
        self.pending_seek = None;
        debug!(player = %self.id, "Released");
    }

    /// Handle the prepared signal of `decoder`.
    ///
    /// Returns `None` for signals from handles that are no longer current.
    pub fn on_prepared(&mut self, decoder: DecoderId) -> Result<Option<PreparedOutcome>> {
        if !self.is_current(decoder) || self.state != ResourceState::Preparing {
            debug!(player = %self.id, %decoder, "Ignoring stale prepared signal");
            return Ok(None);
        }

        self.state = ResourceState::Prepared;
        let pending_seek = self.pending_seek.take();
        let playing = self.playing;
        let handle = self.handle_mut()?;

        if let Some(position) = pending_seek {
            handle.seek_to(position)?;
        }
        if playing {
            handle.start()?;
        }

        let duration = match handle.duration() {
            Ok(duration) => duration,
            Err(err) => {
                warn!(error = %err, "Decoder did not report a duration");
                None
            }
        };

        debug!(player = %self.id, %decoder, ?duration, started = playing, "Prepared");
        Ok(Some(PreparedOutcome {
            duration,
            started: playing,
        }))
    }

    /// Handle the end-of-track signal of `decoder`.
    pub fn on_completed(&mut self, decoder: DecoderId) -> CompletionOutcome {
        if !self.is_current(decoder) {
            return CompletionOutcome::Stale;
        }
        if self.looping {
            return CompletionOutcome::Looped;
        }

        self.playing = false;
        if let Some(handle) = self.handle.as_mut() {
            if let Err(err) = handle.seek_to(Duration::ZERO) {
                warn!(player = %self.id, error = %err, "Failed to rewind after completion");
            }
        }
        CompletionOutcome::Finished
    }

    /// Handle a decoder failure. The handle is released; nothing is retried.
    ///
    /// Returns the error to report, or `None` for a stale signal.
    pub fn on_error(&mut self, decoder: DecoderId, what: i32, extra: i32) -> Option<PlaybackError> {
        if !self.is_current(decoder) {
            return None;
        }
        warn!(player = %self.id, %decoder, what, extra, "Decoder failure");
        self.release();
        Some(PlaybackError::Resource { what, extra })
    }

    /// Current position. Before `PREPARED` this is the pending seek target.
    pub fn position(&self) -> Result<Duration> {
        match (&self.handle, self.state) {
            (Some(handle), ResourceState::Prepared) => Ok(handle.position()?),
            _ => Ok(self.pending_seek.unwrap_or_default()),
        }
    }

    pub fn duration(&self) -> Result<Option<Duration>> {
        match (&self.handle, self.state) {
            (Some(handle), ResourceState::Prepared) => Ok(handle.duration()?),
            _ => Ok(None),
        }
    }

    fn is_current(&self, decoder: DecoderId) -> bool {
        self.decoder == Some(decoder)
    }

    fn handle_mut(&mut self) -> Result<&mut Box<dyn DecoderHandle>> {
        self.handle
            .as_mut()
            .ok_or_else(|| PlaybackError::illegal_state("decoder handle is not alive"))
    }

    fn next_decoder_id(&mut self) -> DecoderId {
        self.handles_created += 1;
        // High bits carry the player id so several players can share one notice channel.
        DecoderId((u64::from(self.id.0) << 32) | self.handles_created)
    }

    fn create_handle(&mut self) -> Result<()> {
        let decoder = self.next_decoder_id();
        let signals = DecoderSignalSender::new(decoder, self.notices.clone());
        let mut handle = self.factory.create(signals)?;
        handle.set_volume(self.volume)?;
        handle.set_looping(self.looping)?;

        self.handle = Some(handle);
        self.decoder = Some(decoder);
        self.state = ResourceState::Idle;
        debug!(player = %self.id, %decoder, "Created decoder handle");
        Ok(())
    }

    fn bind_and_prepare(&mut self, source: &AudioSource) -> Result<()> {
        let bound = self.handle_mut().and_then(|handle| {
            handle.set_source(source)?;
            handle.prepare_async()?;
            Ok(())
        });

        match bound {
            Ok(()) => {
                self.state = ResourceState::Preparing;
                debug!(
                    player = %self.id,
                    source = strip_path(&source.to_string()),
                    "Preparing source"
                );
                Ok(())
            }
            Err(err) => {
                self.discard_handle();
                Err(err)
            }
        }
    }

    fn discard_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.release() {
                warn!(player = %self.id, error = %err, "Decoder release failed");
            }
        }
        self.decoder = None;
        self.state = ResourceState::Released;
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("decoder", &self.decoder)
            .field("playing", &self.playing)
            .field("looping", &self.looping)
            .field("volume", &self.volume)
            .field("pending_seek", &self.pending_seek)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use std::sync::Mutex;

    type BridgeResult<T> = std::result::Result<T, BridgeError>;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(DecoderId),
        SetSource(DecoderId, AudioSource),
        Prepare(DecoderId),
        Start(DecoderId),
        Pause(DecoderId),
        Seek(DecoderId, Duration),
        Volume(DecoderId, f32),
        Looping(DecoderId, bool),
        Reset(DecoderId),
        Release(DecoderId),
    }

    #[derive(Default, Clone)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Recorder {
        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    struct FakeFactory {
        recorder: Recorder,
    }

    impl DecoderFactory for FakeFactory {
        fn create(&self, signals: DecoderSignalSender) -> BridgeResult<Box<dyn DecoderHandle>> {
            self.recorder.push(Call::Create(signals.decoder()));
            Ok(Box::new(FakeHandle {
                id: signals.decoder(),
                recorder: self.recorder.clone(),
                position: Duration::ZERO,
                fail_source: false,
            }))
        }
    }

    struct FakeHandle {
        id: DecoderId,
        recorder: Recorder,
        position: Duration,
        fail_source: bool,
    }

    impl DecoderHandle for FakeHandle {
        fn set_source(&mut self, source: &AudioSource) -> BridgeResult<()> {
            if self.fail_source {
                return Err(BridgeError::OperationFailed("bad source".to_string()));
            }
            self.recorder.push(Call::SetSource(self.id, source.clone()));
            Ok(())
        }

        fn prepare_async(&mut self) -> BridgeResult<()> {
            self.recorder.push(Call::Prepare(self.id));
            Ok(())
        }

        fn start(&mut self) -> BridgeResult<()> {
            self.recorder.push(Call::Start(self.id));
            Ok(())
        }

        fn pause(&mut self) -> BridgeResult<()> {
            self.recorder.push(Call::Pause(self.id));
            Ok(())
        }

        fn seek_to(&mut self, position: Duration) -> BridgeResult<()> {
            self.position = position;
            self.recorder.push(Call::Seek(self.id, position));
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) -> BridgeResult<()> {
            self.recorder.push(Call::Volume(self.id, volume));
            Ok(())
        }

        fn set_looping(&mut self, looping: bool) -> BridgeResult<()> {
            self.recorder.push(Call::Looping(self.id, looping));
            Ok(())
        }

        fn reset(&mut self) -> BridgeResult<()> {
            self.recorder.push(Call::Reset(self.id));
            Ok(())
        }

        fn release(&mut self) -> BridgeResult<()> {
            self.recorder.push(Call::Release(self.id));
            Ok(())
        }

        fn position(&self) -> BridgeResult<Duration> {
            Ok(self.position)
        }

        fn duration(&self) -> BridgeResult<Option<Duration>> {
            Ok(Some(Duration::from_secs(180)))
        }
    }

    fn player() -> (Player, Recorder) {
        let recorder = Recorder::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let factory = Arc::new(FakeFactory {
            recorder: recorder.clone(),
        });
        (Player::new(PlayerId(1), factory, tx), recorder)
    }

    fn file(name: &str) -> AudioSource {
        AudioSource::from_location(&format!("/music/{}.mp3", name))
    }

    #[test]
    fn test_set_source_from_released_prepares_new_handle() {
        let (mut player, recorder) = player();
        assert_eq!(player.state(), ResourceState::Released);

        player.set_source(file("a")).unwrap();

        assert_eq!(player.state(), ResourceState::Preparing);
        let decoder = player.decoder().unwrap();
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Create(decoder),
                Call::Volume(decoder, 1.0),
                Call::Looping(decoder, false),
                Call::SetSource(decoder, file("a")),
                Call::Prepare(decoder),
            ]
        );
    }

    #[test]
    fn test_only_latest_source_survives_repeated_sets_while_preparing() {
        for extra_sets in 1..5 {
            let (mut player, recorder) = player();
            player.set_source(file("first")).unwrap();
            let mut stale = vec![player.decoder().unwrap()];

            for i in 0..extra_sets {
                player.set_source(file(&format!("next-{}", i))).unwrap();
                stale.push(player.decoder().unwrap());
            }
            let current = stale.pop().unwrap();

            for decoder in &stale {
                assert_eq!(player.on_prepared(*decoder).unwrap(), None);
                assert!(recorder.calls().contains(&Call::Release(*decoder)));
            }
            assert_eq!(player.state(), ResourceState::Preparing);

            assert!(player.on_prepared(current).unwrap().is_some());
            assert_eq!(player.state(), ResourceState::Prepared);

            let latest = file(&format!("next-{}", extra_sets - 1));
            assert_eq!(player.source(), Some(&latest));
            assert!(recorder.calls().contains(&Call::SetSource(current, latest)));
        }
    }

    #[test]
    fn test_last_pending_seek_applied_once_when_prepared() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();

        player.seek(Duration::from_secs(1)).unwrap();
        player.seek(Duration::from_secs(7)).unwrap();
        player.seek(Duration::from_secs(3)).unwrap();
        assert_eq!(player.position().unwrap(), Duration::from_secs(3));
        recorder.clear();

        player.on_prepared(decoder).unwrap();
        assert_eq!(
            recorder.calls(),
            vec![Call::Seek(decoder, Duration::from_secs(3))]
        );

        // A duplicate signal must not replay the seek.
        recorder.clear();
        assert_eq!(player.on_prepared(decoder).unwrap(), None);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_new_source_when_prepared_resets_and_replays_pending_seek() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        player.on_prepared(decoder).unwrap();
        recorder.clear();

        player.set_source(file("b")).unwrap();
        assert_eq!(player.state(), ResourceState::Preparing);
        assert_eq!(player.decoder(), Some(decoder));
        player.seek(Duration::from_millis(1500)).unwrap();

        player.on_prepared(decoder).unwrap();
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Reset(decoder),
                Call::SetSource(decoder, file("b")),
                Call::Prepare(decoder),
                Call::Seek(decoder, Duration::from_millis(1500)),
            ]
        );
    }

    #[test]
    fn test_same_source_is_noop() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        recorder.clear();

        player.set_source(file("a")).unwrap();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_play_is_idempotent() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        player.on_prepared(decoder).unwrap();
        recorder.clear();

        player.play().unwrap();
        player.play().unwrap();

        assert_eq!(recorder.calls(), vec![Call::Start(decoder)]);
        assert!(player.is_playing());
    }

    #[test]
    fn test_play_while_preparing_starts_on_prepared() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        player.play().unwrap();
        assert!(player.is_active());
        assert!(!player.is_playing());

        let decoder = player.decoder().unwrap();
        let outcome = player.on_prepared(decoder).unwrap().unwrap();
        assert!(outcome.started);
        assert_eq!(outcome.duration, Some(Duration::from_secs(180)));
        assert!(recorder.calls().contains(&Call::Start(decoder)));
        assert!(player.is_playing());
    }

    #[test]
    fn test_pause_keeps_prepared_and_stop_rewinds() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        player.play().unwrap();
        player.on_prepared(decoder).unwrap();

        player.pause().unwrap();
        assert_eq!(player.state(), ResourceState::Prepared);
        assert!(!player.is_playing());

        player.play().unwrap();
        recorder.clear();
        player.stop().unwrap();
        assert_eq!(
            recorder.calls(),
            vec![Call::Pause(decoder), Call::Seek(decoder, Duration::ZERO)]
        );
        assert_eq!(player.state(), ResourceState::Prepared);
    }

    #[test]
    fn test_volume_and_looping_replayed_onto_new_handle() {
        let (mut player, recorder) = player();
        player.set_volume(0.4).unwrap();
        player.set_looping(true).unwrap();

        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        assert!(recorder.calls().contains(&Call::Volume(decoder, 0.4)));
        assert!(recorder.calls().contains(&Call::Looping(decoder, true)));

        player.set_volume(3.0).unwrap();
        assert_eq!(player.volume(), 1.0);
        assert!(player.set_volume(f32::NAN).is_err());
    }

    #[test]
    fn test_completion_respects_looping() {
        let (mut player, _recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        player.play().unwrap();
        player.on_prepared(decoder).unwrap();

        player.set_looping(true).unwrap();
        assert_eq!(player.on_completed(decoder), CompletionOutcome::Looped);
        assert!(player.is_playing());

        player.set_looping(false).unwrap();
        assert_eq!(player.on_completed(decoder), CompletionOutcome::Finished);
        assert!(!player.is_playing());

        assert_eq!(
            player.on_completed(DecoderId(999)),
            CompletionOutcome::Stale
        );
    }

    #[test]
    fn test_error_releases_and_play_recovers() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();
        player.play().unwrap();

        let err = player.on_error(decoder, 1, -1004).unwrap();
        assert_eq!(err.code(), Some(1));
        assert_eq!(player.state(), ResourceState::Released);
        assert!(!player.is_active());
        assert!(player.on_error(decoder, 1, -1004).is_none());

        player.play().unwrap();
        let recreated = player.decoder().unwrap();
        assert_ne!(recreated, decoder);
        assert!(recorder
            .calls()
            .contains(&Call::SetSource(recreated, file("a"))));
    }

    #[test]
    fn test_play_without_source_is_illegal_state() {
        let (mut player, _recorder) = player();
        assert!(player.play().unwrap_err().is_illegal_state());
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut player, recorder) = player();
        player.set_source(file("a")).unwrap();
        let decoder = player.decoder().unwrap();

        player.release();
        player.release();

        let releases = recorder
            .calls()
            .into_iter()
            .filter(|call| *call == Call::Release(decoder))
            .count();
        assert_eq!(releases, 1);
        assert_eq!(player.state(), ResourceState::Released);
        assert_eq!(player.position().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_failed_bind_discards_handle() {
        struct FailingFactory;

        impl DecoderFactory for FailingFactory {
            fn create(
                &self,
                signals: DecoderSignalSender,
            ) -> BridgeResult<Box<dyn DecoderHandle>> {
                Ok(Box::new(FakeHandle {
                    id: signals.decoder(),
                    recorder: Recorder::default(),
                    position: Duration::ZERO,
                    fail_source: true,
                }))
            }
        }

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut player = Player::new(PlayerId(2), Arc::new(FailingFactory), tx);

        assert!(player.set_source(file("broken")).is_err());
        assert_eq!(player.state(), ResourceState::Released);
        assert_eq!(player.decoder(), None);
    }
}
