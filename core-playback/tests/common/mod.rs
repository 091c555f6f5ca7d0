//! Recording host fakes shared by the dispatcher tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{
    AudioFocusBridge, BridgeError, AudioSource, DecoderFactory, DecoderHandle, DecoderId, DecoderSignal,
    DecoderSignalSender, FocusRequestResult, ForegroundService, JsonStore, MediaIndexProvider,
    NotificationPresenter, NotificationState, SettingsStore, Track, WakeLockBridge, WakeLockId,
};
use core_playback::{PlaybackHandle, PlaybackRuntime};
use core_runtime::config::{CoreConfig, PlaybackSettings};
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Decoder
// ============================================================================

pub const TRACK_LENGTH: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq)]
pub enum DecoderCall {
    Bind(AudioSource),
    Start,
    Pause,
    Seek(Duration),
    Reset,
    Release,
}

#[derive(Default)]
pub struct DecoderLog {
    pub calls: Vec<(DecoderId, DecoderCall)>,
    pub senders: Vec<DecoderSignalSender>,
}

/// Decoder factory whose handles record every call.
///
/// With `auto_prepare` the handle reports `Prepared` as soon as
/// `prepare_async` is called; otherwise tests signal it explicitly.
pub struct FakeDecoders {
    auto_prepare: bool,
    failing_bind: AtomicBool,
    log: Arc<Mutex<DecoderLog>>,
}

impl FakeDecoders {
    pub fn new(auto_prepare: bool) -> Self {
        Self {
            auto_prepare,
            failing_bind: AtomicBool::new(false),
            log: Arc::default(),
        }
    }

    /// Make every later `set_source` fail.
    pub fn fail_bind(&self, fail: bool) {
        self.failing_bind.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(DecoderId, DecoderCall)> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, decoder: DecoderId) -> Vec<DecoderCall> {
        self.calls()
            .into_iter()
            .filter(|(id, _)| *id == decoder)
            .map(|(_, call)| call)
            .collect()
    }

    pub fn count(&self, call: &DecoderCall) -> usize {
        self.calls().iter().filter(|(_, c)| c == call).count()
    }

    pub fn decoders(&self) -> Vec<DecoderId> {
        self.log
            .lock()
            .unwrap()
            .senders
            .iter()
            .map(|sender| sender.decoder())
            .collect()
    }

    pub fn latest(&self) -> DecoderId {
        *self.decoders().last().expect("no decoder created")
    }

    /// Deliver `signal` from every decoder ever created, oldest first.
    pub fn signal_all(&self, signal: DecoderSignal) {
        for sender in &self.log.lock().unwrap().senders {
            sender.send(signal.clone());
        }
    }

    /// Deliver `signal` from the most recently created decoder.
    pub fn signal_latest(&self, signal: DecoderSignal) {
        if let Some(sender) = self.log.lock().unwrap().senders.last() {
            sender.send(signal);
        }
    }
}

impl DecoderFactory for FakeDecoders {
    fn create(&self, signals: DecoderSignalSender) -> Result<Box<dyn DecoderHandle>> {
        self.log.lock().unwrap().senders.push(signals.clone());
        Ok(Box::new(FakeDecoder {
            signals,
            auto_prepare: self.auto_prepare,
            failing_bind: self.failing_bind.load(Ordering::SeqCst),
            log: Arc::clone(&self.log),
            position: Duration::ZERO,
        }))
    }
}

struct FakeDecoder {
    signals: DecoderSignalSender,
    auto_prepare: bool,
    failing_bind: bool,
    log: Arc<Mutex<DecoderLog>>,
    position: Duration,
}

impl FakeDecoder {
    fn record(&self, call: DecoderCall) {
        self.log
            .lock()
            .unwrap()
            .calls
            .push((self.signals.decoder(), call));
    }
}

impl DecoderHandle for FakeDecoder {
    fn set_source(&mut self, source: &AudioSource) -> Result<()> {
        self.record(DecoderCall::Bind(source.clone()));
        if self.failing_bind {
            return Err(BridgeError::OperationFailed("unsupported format".to_string()));
        }
        Ok(())
    }

    fn prepare_async(&mut self) -> Result<()> {
        if self.auto_prepare {
            self.signals.send(DecoderSignal::Prepared);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.record(DecoderCall::Start);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(DecoderCall::Pause);
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.position = position;
        self.record(DecoderCall::Seek(position));
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<()> {
        Ok(())
    }

    fn set_looping(&mut self, _looping: bool) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.record(DecoderCall::Reset);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.record(DecoderCall::Release);
        Ok(())
    }

    fn position(&self) -> Result<Duration> {
        Ok(self.position)
    }

    fn duration(&self) -> Result<Option<Duration>> {
        Ok(Some(TRACK_LENGTH))
    }
}

// ============================================================================
// Session Bridges
// ============================================================================

pub struct FakeFocus {
    pub result: Mutex<FocusRequestResult>,
    pub requests: AtomicUsize,
    pub abandons: AtomicUsize,
}

impl FakeFocus {
    pub fn new(result: FocusRequestResult) -> Self {
        Self {
            result: Mutex::new(result),
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
        }
    }

    pub fn set_result(&self, result: FocusRequestResult) {
        *self.result.lock().unwrap() = result;
    }
}

impl AudioFocusBridge for FakeFocus {
    fn request_focus(&self) -> Result<FocusRequestResult> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(*self.result.lock().unwrap())
    }

    fn abandon_focus(&self) -> Result<()> {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWakeLock {
    next: AtomicU64,
    pub held: Mutex<HashMap<WakeLockId, Option<Duration>>>,
}

impl FakeWakeLock {
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }
}

impl WakeLockBridge for FakeWakeLock {
    fn acquire(&self, timeout: Option<Duration>) -> Result<WakeLockId> {
        let id = WakeLockId(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.held.lock().unwrap().insert(id, timeout);
        Ok(id)
    }

    fn release(&self, id: WakeLockId) -> Result<()> {
        self.held.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifications {
    pub states: Mutex<Vec<NotificationState>>,
    pub cancelled: AtomicBool,
}

impl FakeNotifications {
    pub fn last(&self) -> Option<NotificationState> {
        self.states.lock().unwrap().last().cloned()
    }
}

impl NotificationPresenter for FakeNotifications {
    fn update_notification(&self, state: &NotificationState) -> Result<()> {
        self.states.lock().unwrap().push(state.clone());
        Ok(())
    }

    fn cancel_notification(&self) -> Result<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeService {
    pub running: AtomicBool,
    pub foreground: AtomicBool,
    pub stops: AtomicUsize,
}

impl ForegroundService for FakeService {
    fn start_service(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start_foreground(&self) -> Result<()> {
        self.foreground.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_foreground(&self) -> Result<()> {
        self.foreground.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop_service(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.foreground.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Storage & Index
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Text(String),
    Flag(bool),
    Number(i64),
}

#[derive(Default)]
pub struct MemorySettings {
    pub values: Mutex<HashMap<String, Setting>>,
}

impl MemorySettings {
    pub fn get(&self, key: &str) -> Option<Setting> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: Setting) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.put(key, Setting::Text(value.to_string()));
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.get(key) {
            Some(Setting::Text(value)) => Some(value),
            _ => None,
        })
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put(key, Setting::Flag(value));
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(match self.get(key) {
            Some(Setting::Flag(value)) => Some(value),
            _ => None,
        })
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.put(key, Setting::Number(value));
        Ok(())
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(match self.get(key) {
            Some(Setting::Number(value)) => Some(value),
            _ => None,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().unwrap().contains_key(key))
    }
}

#[derive(Default)]
pub struct MemoryDocuments {
    pub files: Mutex<HashMap<String, String>>,
}

impl MemoryDocuments {
    pub fn get(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl JsonStore for MemoryDocuments {
    async fn save_json(&self, name: &str, text: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), text.to_string());
        Ok(())
    }

    async fn load_json(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name))
    }
}

pub struct FixedLibrary {
    pub tracks: Vec<Track>,
}

#[async_trait]
impl MediaIndexProvider for FixedLibrary {
    async fn retrieve_songs(&self) -> Result<Vec<Track>> {
        Ok(self.tracks.clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn track(id: i64) -> Track {
    Track::new(id, format!("Track {}", id), format!("/music/{}.mp3", id))
        .with_duration_ms(TRACK_LENGTH.as_millis() as u64)
}

pub fn library() -> Vec<Track> {
    (1..=3).map(track).collect()
}

pub fn source_of(track: &Track) -> AudioSource {
    AudioSource::from_location(&track.location)
}

pub struct Harness {
    pub handle: PlaybackHandle,
    pub events: EventStream,
    pub decoders: Arc<FakeDecoders>,
    pub focus: Arc<FakeFocus>,
    pub wake_lock: Arc<FakeWakeLock>,
    pub notifications: Arc<FakeNotifications>,
    pub service: Arc<FakeService>,
    pub settings: Arc<MemorySettings>,
    pub documents: Arc<MemoryDocuments>,
    pub task: tokio::task::JoinHandle<()>,
}

pub struct HarnessBuilder {
    auto_prepare: bool,
    focus: FocusRequestResult,
    settings: Arc<MemorySettings>,
    documents: Arc<MemoryDocuments>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            auto_prepare: true,
            focus: FocusRequestResult::Granted,
            settings: Arc::default(),
            documents: Arc::default(),
        }
    }

    pub fn manual_prepare(mut self) -> Self {
        self.auto_prepare = false;
        self
    }

    pub fn focus(mut self, result: FocusRequestResult) -> Self {
        self.focus = result;
        self
    }

    pub fn settings(mut self, settings: Arc<MemorySettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn documents(mut self, documents: Arc<MemoryDocuments>) -> Self {
        self.documents = documents;
        self
    }

    pub fn start(self) -> Harness {
        let decoders = Arc::new(FakeDecoders::new(self.auto_prepare));
        let focus = Arc::new(FakeFocus::new(self.focus));
        let wake_lock = Arc::new(FakeWakeLock::default());
        let notifications = Arc::new(FakeNotifications::default());
        let service = Arc::new(FakeService::default());

        let config = CoreConfig::builder()
            .decoder_factory(decoders.clone())
            .media_index(Arc::new(FixedLibrary { tracks: library() }))
            .audio_focus(focus.clone())
            .wake_lock(wake_lock.clone())
            .notifications(notifications.clone())
            .foreground_service(service.clone())
            .settings_store(self.settings.clone())
            .json_store(self.documents.clone())
            .playback_settings(PlaybackSettings::default())
            .build()
            .expect("complete config");

        let bus = EventBus::new(1024);
        let events = EventStream::new(bus.subscribe());
        let (handle, task) = PlaybackRuntime::start(&config, bus);

        Harness {
            handle,
            events,
            decoders,
            focus,
            wake_lock,
            notifications,
            service,
            settings: self.settings,
            documents: self.documents,
            task,
        }
    }
}

impl Harness {
    pub fn start() -> Self {
        HarnessBuilder::new().start()
    }

    /// Wait until every command sent so far has been applied.
    pub async fn settle(&self) -> core_playback::PlaybackSnapshot {
        self.handle.snapshot().await.expect("dispatcher running")
    }

    /// Events received since the last drain, position ticks excluded.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.try_recv() {
            if let Ok(event) = event {
                if !is_position_tick(&event) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Position ticks received since the last drain.
    pub fn drain_ticks(&mut self) -> usize {
        let mut ticks = 0;
        while let Some(event) = self.events.try_recv() {
            if matches!(event, Ok(ref event) if is_position_tick(event)) {
                ticks += 1;
            }
        }
        ticks
    }
}

fn is_position_tick(event: &CoreEvent) -> bool {
    matches!(
        event,
        CoreEvent::Playback(core_runtime::events::PlaybackEvent::PositionChanged { .. })
    )
}
