//! Decoder bridge traits.
//!
//! The host owns the actual audio decoder (the OS media player on mobile).
//! The core drives it through [`DecoderHandle`] and learns about asynchronous
//! completions through a [`DecoderSignalSender`] handed to the factory when a
//! handle is created. Signals carry the [`DecoderId`] of the handle that raised
//! them so the core can drop signals from handles it has already discarded.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifier assigned by the core to every decoder handle it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecoderId(pub u64);

impl fmt::Display for DecoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decoder-{}", self.0)
    }
}

/// Where the decoder should read audio from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Host-resolved URI (content provider, http, ...).
    Uri { uri: String },
}

impl AudioSource {
    /// Interpret a track location: anything with a scheme is a URI, the rest
    /// is a filesystem path.
    pub fn from_location(location: &str) -> Self {
        if location.contains("://") {
            AudioSource::Uri {
                uri: location.to_string(),
            }
        } else {
            AudioSource::LocalFile {
                path: PathBuf::from(location),
            }
        }
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, AudioSource::Uri { .. })
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::LocalFile { path } => write!(f, "{}", path.display()),
            AudioSource::Uri { uri } => f.write_str(uri),
        }
    }
}

/// Asynchronous outcome reported by a decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum DecoderSignal {
    /// `prepare_async` finished; the handle can start, seek and report duration.
    Prepared,
    /// Playback reached the end of the source (never raised while looping).
    Completed,
    /// Decoder failure with the host's raw codes.
    Error { what: i32, extra: i32 },
}

/// A [`DecoderSignal`] tagged with the handle that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderNotice {
    pub decoder: DecoderId,
    pub signal: DecoderSignal,
}

/// Sending half given to the host for one decoder handle.
///
/// Safe to call from any thread; signals are queued onto the core's
/// dispatcher.
#[derive(Debug, Clone)]
pub struct DecoderSignalSender {
    decoder: DecoderId,
    tx: mpsc::UnboundedSender<DecoderNotice>,
}

impl DecoderSignalSender {
    pub fn new(decoder: DecoderId, tx: mpsc::UnboundedSender<DecoderNotice>) -> Self {
        Self { decoder, tx }
    }

    pub fn decoder(&self) -> DecoderId {
        self.decoder
    }

    /// Queue a signal. Returns `false` once the core has shut down.
    pub fn send(&self, signal: DecoderSignal) -> bool {
        self.tx
            .send(DecoderNotice {
                decoder: self.decoder,
                signal,
            })
            .is_ok()
    }
}

/// One host decoder instance.
///
/// Calls are made only from the core's dispatcher, one at a time. All methods
/// are expected to return quickly; `prepare_async` must not block and reports
/// completion through the handle's [`DecoderSignalSender`].
pub trait DecoderHandle: Send {
    /// Bind a source. Only valid on a fresh or reset handle.
    fn set_source(&mut self, source: &AudioSource) -> Result<()>;

    /// Begin preparing the bound source.
    fn prepare_async(&mut self) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn seek_to(&mut self, position: Duration) -> Result<()>;

    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    fn set_looping(&mut self, looping: bool) -> Result<()>;

    /// Drop the bound source and return to the unbound state.
    fn reset(&mut self) -> Result<()>;

    /// Free the native resources. The handle is not used afterwards.
    fn release(&mut self) -> Result<()>;

    /// Current playback position.
    ///
    /// Hosts return [`BridgeError::UnsupportedOperation`](crate::BridgeError::UnsupportedOperation)
    /// when the position is not readable in the decoder's current state.
    fn position(&self) -> Result<Duration>;

    /// Total duration, if the source reports one.
    fn duration(&self) -> Result<Option<Duration>>;
}

/// Creates decoder handles on demand.
pub trait DecoderFactory: Send + Sync {
    fn create(&self, signals: DecoderSignalSender) -> Result<Box<dyn DecoderHandle>>;
}
