use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[cfg(feature = "mic")]
    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("recording not started")]
    NotStarted,

    #[error("a recording is already running")]
    AlreadyRecording,

    #[error("clip not found: {}", .0.display())]
    ClipMissing(PathBuf),

    #[error("wav encode failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("internal channel error")]
    Channel,
}
