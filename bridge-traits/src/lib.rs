//! # Host Bridge Traits
//!
//! Contracts between the playback core and the host OS.
//!
//! ## Overview
//!
//! The core never talks to the platform directly. Every capability it needs
//! from the OS is expressed as a trait here and implemented once per host
//! (Android, iOS, desktop). `bridge-desktop` ships the desktop adapters.
//!
//! ## Traits
//!
//! ### Audio
//! - [`DecoderFactory`](decoder::DecoderFactory) / [`DecoderHandle`](decoder::DecoderHandle) - OS decoder driven by the core
//! - [`AudioFocusBridge`](focus::AudioFocusBridge) - Audio focus arbitration
//! - [`WakeLockBridge`](power::WakeLockBridge) - CPU wake locks
//!
//! ### Session
//! - [`NotificationPresenter`](session::NotificationPresenter) - Playback notification / lock screen
//! - [`ForegroundService`](session::ForegroundService) - Keeps the process alive while playing
//!
//! ### Data
//! - [`MediaIndexProvider`](media::MediaIndexProvider) - Read-only song index
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences
//! - [`JsonStore`](storage::JsonStore) - Named JSON documents (queue snapshot, id map)
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Callbacks
//!
//! Asynchronous host events flow back as plain data rather than listener
//! objects: decoder completions through [`DecoderSignalSender`](decoder::DecoderSignalSender),
//! focus changes as [`FocusChange`](focus::FocusChange), transport controls as
//! [`MediaButton`](session::MediaButton) and [`NotificationAction`](session::NotificationAction).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` (decoder handles only `Send`: they
//! are owned by a single dispatcher task).

pub mod decoder;
pub mod error;
pub mod focus;
pub mod logging;
pub mod media;
pub mod power;
pub mod session;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use decoder::{
    AudioSource, DecoderFactory, DecoderHandle, DecoderId, DecoderNotice, DecoderSignal,
    DecoderSignalSender,
};
pub use focus::{AudioFocusBridge, FocusChange, FocusRequestResult};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{MediaIndexProvider, Track};
pub use power::{WakeLockBridge, WakeLockId};
pub use session::{
    ForegroundService, MediaButton, NotificationAction, NotificationPresenter, NotificationState,
};
pub use storage::{JsonStore, SettingsStore};
