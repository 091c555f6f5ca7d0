use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Playback core is already running")]
    AlreadyRunning,

    #[error("Playback core is not running")]
    NotRunning,

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    #[error("Dispatcher task failed: {0}")]
    Dispatcher(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
