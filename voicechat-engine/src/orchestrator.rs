use std::sync::Arc;
use voicechat_core::config::ClientConfig;
use voicechat_core::text::truncate_chars;

use crate::connection::ConnectionManager;
use crate::error::EngineError;
use crate::recording::RecordingSession;
use crate::state::{ChatSnapshot, ChatStore, RecordingState};
use crate::traits::{ChatObserver, DeviceRecorder, SocketConnector, Transcriber};
use crate::transcription::TranscriptionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The chat is busy; the input was left as it was.
    Rejected,
    Updated,
    /// The text ended with a newline and was sent.
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped,
    /// The recorder refused to start.
    Failed,
    /// Busy receiving, or a start is still in flight.
    Ignored,
}

/// Front door for the UI: wires the chat store, socket and recorder together.
#[derive(Clone)]
pub struct ChatOrchestrator {
    store: ChatStore,
    connection: ConnectionManager,
    recording: RecordingSession,
    input_max_chars: usize,
}

impl ChatOrchestrator {
    pub fn new(
        cfg: &ClientConfig,
        connector: Arc<dyn SocketConnector>,
        recorder: Arc<dyn DeviceRecorder>,
        transcriber: Arc<dyn Transcriber>,
        observer: Arc<dyn ChatObserver>,
    ) -> Self {
        let store = ChatStore::new(observer);
        let grace = cfg.receiving_grace();
        let connection = ConnectionManager::new(
            cfg.endpoints.websocket_url.clone(),
            connector,
            store.clone(),
            grace,
        );
        let transcription = TranscriptionClient::new(
            transcriber,
            store.clone(),
            grace,
            cfg.transcription.revert_on_failure,
        );
        let recording =
            RecordingSession::new(recorder, transcription, store.clone(), cfg.recording.clone());
        Self {
            store,
            connection,
            recording,
            input_max_chars: cfg.input_max_chars,
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn recording(&self) -> &RecordingSession {
        &self.recording
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.store.snapshot()
    }

    /// Text-field edits. Capped at the configured length; a trailing newline submits.
    pub fn set_input_text(&self, text: &str) -> Result<InputOutcome, EngineError> {
        if self.store.flags().is_receiving {
            return Ok(InputOutcome::Rejected);
        }
        let text = truncate_chars(text, self.input_max_chars);
        let submit = text.ends_with('\n');
        self.store.set_input_text(text);
        if submit {
            self.submit()?;
            return Ok(InputOutcome::Submitted);
        }
        Ok(InputOutcome::Updated)
    }

    /// Sends the current input. Returns false when the trimmed input is empty.
    pub fn handle_send(&self) -> Result<bool, EngineError> {
        let Some((text, history)) = self.store.begin_send() else {
            return Ok(false);
        };
        self.connection.send_message(&text, history)?;
        Ok(true)
    }

    /// The send button: send, then make sure a socket is on its way.
    pub fn submit(&self) -> Result<bool, EngineError> {
        if self.store.flags().is_receiving {
            log::debug!("submit ignored while receiving");
            return Ok(false);
        }
        let sent = self.handle_send()?;
        self.connection.ensure_connected();
        Ok(sent)
    }

    pub fn connect(&self) {
        self.connection.ensure_connected();
    }

    pub async fn toggle_recording(&self) -> ToggleOutcome {
        if self.store.flags().is_receiving {
            return ToggleOutcome::Ignored;
        }
        match self.store.recording_state() {
            RecordingState::Recording { .. } => {
                self.recording.stop().await;
                ToggleOutcome::Stopped
            }
            RecordingState::Starting => ToggleOutcome::Ignored,
            RecordingState::Idle => {
                if self.recording.start().await {
                    ToggleOutcome::Started
                } else {
                    ToggleOutcome::Failed
                }
            }
        }
    }

    /// Clears the conversation, drops queued sends and closes the socket.
    ///
    /// A recording in progress keeps running.
    pub fn reset_chat(&self) {
        self.store.reset();
        self.connection.reset();
        log::info!("chat reset (generation {})", self.store.generation());
    }
}
