pub mod connection;
pub mod error;
pub mod orchestrator;
pub mod recording;
pub mod state;
pub mod traits;
pub mod transcription;

pub use connection::{ConnectionManager, LinkStatus};
pub use error::EngineError;
pub use orchestrator::{ChatOrchestrator, InputOutcome, ToggleOutcome};
pub use recording::RecordingSession;
pub use state::{ChatSnapshot, ChatStore, RecordingState, UiFlags};
pub use transcription::TranscriptionClient;
