pub mod clip;
pub mod error;
#[cfg(feature = "mic")]
pub mod mic;
pub mod wav;

pub use clip::ClipRecorder;
pub use error::AudioCaptureError;
#[cfg(feature = "mic")]
pub use mic::MicRecorder;
