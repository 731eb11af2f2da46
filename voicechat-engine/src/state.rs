use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use voicechat_core::transcript::Transcript;
use voicechat_core::types::ChatMessage;

use crate::traits::ChatObserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    /// The recorder has been asked to start but has not confirmed yet.
    Starting,
    Recording { started_at: Instant, session: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiFlags {
    /// True until the first message of the conversation is sent.
    pub is_loading: bool,
    pub is_recording: bool,
    pub is_receiving: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub flags: UiFlags,
    pub generation: u64,
}

#[derive(Debug)]
struct ChatState {
    transcript: Transcript,
    input_text: String,
    is_loading: bool,
    is_receiving: bool,
    recording: RecordingState,
    generation: u64,
    // Input text as it was when the current upload began.
    upload_saved_text: Option<String>,
}

impl ChatState {
    fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            input_text: String::new(),
            is_loading: true,
            is_receiving: false,
            recording: RecordingState::Idle,
            generation: 0,
            upload_saved_text: None,
        }
    }

    fn flags(&self) -> UiFlags {
        UiFlags {
            is_loading: self.is_loading,
            is_recording: matches!(self.recording, RecordingState::Recording { .. }),
            is_receiving: self.is_receiving,
        }
    }
}

/// Shared chat state. Cheap to clone; all clones see the same conversation.
///
/// Observer callbacks are made after the lock is released.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<Mutex<ChatState>>,
    observer: Arc<dyn ChatObserver>,
}

impl ChatStore {
    pub fn new(observer: Arc<dyn ChatObserver>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChatState::new())),
            observer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn notify_flags(&self, before: UiFlags, after: UiFlags) {
        if before != after {
            self.observer.flags_changed(after);
        }
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let st = self.lock();
        ChatSnapshot {
            messages: st.transcript.to_vec(),
            input_text: st.input_text.clone(),
            flags: st.flags(),
            generation: st.generation,
        }
    }

    pub fn flags(&self) -> UiFlags {
        self.lock().flags()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().transcript.to_vec()
    }

    pub fn input_text(&self) -> String {
        self.lock().input_text.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn recording_state(&self) -> RecordingState {
        self.lock().recording
    }

    pub fn alert(&self, title: &str, message: &str) {
        self.observer.alert(title, message);
    }

    pub fn set_input_text(&self, text: String) {
        {
            let mut st = self.lock();
            if st.input_text == text {
                return;
            }
            st.input_text = text.clone();
        }
        self.observer.input_changed(&text);
    }

    /// Moves the trimmed input into the transcript as a user message.
    ///
    /// Returns the sent text and the history including it, or `None` when
    /// the trimmed input is empty.
    pub fn begin_send(&self) -> Option<(String, Vec<ChatMessage>)> {
        let (message, history, before, after) = {
            let mut st = self.lock();
            let text = st.input_text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            let before = st.flags();
            let message = ChatMessage::user(text);
            st.transcript.push(message.clone());
            st.input_text.clear();
            st.is_loading = false;
            (message, st.transcript.to_vec(), before, st.flags())
        };
        self.observer.message_appended(&message);
        self.observer.input_changed("");
        self.notify_flags(before, after);
        Some((message.content, history))
    }

    /// Appends a message only if no reset happened since `generation`.
    pub fn append_for_generation(&self, generation: u64, message: ChatMessage) -> bool {
        {
            let mut st = self.lock();
            if st.generation != generation {
                return false;
            }
            st.transcript.push(message.clone());
        }
        self.observer.message_appended(&message);
        true
    }

    pub fn set_receiving(&self, receiving: bool) {
        let (before, after) = {
            let mut st = self.lock();
            let before = st.flags();
            st.is_receiving = receiving;
            (before, st.flags())
        };
        self.notify_flags(before, after);
    }

    /// Clears the receiving flag once `delay` has elapsed, unless the chat was
    /// reset since `generation`.
    ///
    /// Each call schedules its own clear; later calls do not push earlier ones back.
    pub fn clear_receiving_after(&self, generation: u64, delay: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.clear_receiving_for(generation);
        });
    }

    fn clear_receiving_for(&self, generation: u64) {
        let (before, after) = {
            let mut st = self.lock();
            if st.generation != generation {
                log::debug!("skipping receiving clear from generation {generation}");
                return;
            }
            let before = st.flags();
            st.is_receiving = false;
            (before, st.flags())
        };
        self.notify_flags(before, after);
    }

    /// `Idle -> Starting`. False if a recording is already starting or running.
    pub fn try_begin_recording(&self) -> bool {
        let mut st = self.lock();
        if st.recording != RecordingState::Idle {
            return false;
        }
        st.recording = RecordingState::Starting;
        true
    }

    pub fn mark_recording(&self, session: u64) {
        let (before, after) = {
            let mut st = self.lock();
            let before = st.flags();
            st.recording = RecordingState::Recording {
                started_at: Instant::now(),
                session,
            };
            (before, st.flags())
        };
        self.notify_flags(before, after);
    }

    pub fn abort_recording_start(&self) {
        let mut st = self.lock();
        if st.recording == RecordingState::Starting {
            st.recording = RecordingState::Idle;
        }
    }

    pub fn recording_session(&self) -> Option<u64> {
        match self.lock().recording {
            RecordingState::Recording { session, .. } => Some(session),
            _ => None,
        }
    }

    /// `Recording -> Idle`. With `expected`, only that session is stopped.
    ///
    /// Returns the stopped session and how long it ran.
    pub fn take_recording(&self, expected: Option<u64>) -> Option<(u64, Duration)> {
        let (session, elapsed, before, after) = {
            let mut st = self.lock();
            let RecordingState::Recording {
                session,
                started_at,
            } = st.recording
            else {
                return None;
            };
            if expected.is_some_and(|e| e != session) {
                return None;
            }
            let before = st.flags();
            st.recording = RecordingState::Idle;
            (session, started_at.elapsed(), before, st.flags())
        };
        self.notify_flags(before, after);
        Some((session, elapsed))
    }

    /// Marks the chat busy and shows `placeholder` in the input while audio uploads.
    ///
    /// Returns the generation the upload belongs to.
    pub fn begin_upload(&self, placeholder: &str) -> u64 {
        let (generation, before, after) = {
            let mut st = self.lock();
            let before = st.flags();
            if st.upload_saved_text.is_none() {
                st.upload_saved_text = Some(st.input_text.clone());
            }
            st.input_text = placeholder.to_string();
            st.is_receiving = true;
            (st.generation, before, st.flags())
        };
        self.observer.input_changed(placeholder);
        self.notify_flags(before, after);
        generation
    }

    /// Appends the transcript to the pre-upload input. No-op after a reset.
    pub fn finish_upload(&self, generation: u64, text: &str) -> bool {
        let input = {
            let mut st = self.lock();
            if st.generation != generation {
                return false;
            }
            let mut input = st.upload_saved_text.take().unwrap_or_default();
            input.push_str(text);
            st.input_text = input.clone();
            input
        };
        self.observer.input_changed(&input);
        true
    }

    /// Restores the pre-upload input and clears the receiving flag.
    pub fn revert_upload(&self, generation: u64) -> bool {
        let (input, before, after) = {
            let mut st = self.lock();
            if st.generation != generation {
                return false;
            }
            let before = st.flags();
            let input = st.upload_saved_text.take().unwrap_or_default();
            st.input_text = input.clone();
            st.is_receiving = false;
            (input, before, st.flags())
        };
        self.observer.input_changed(&input);
        self.notify_flags(before, after);
        true
    }

    /// Clears the transcript and starts a new generation.
    ///
    /// Leaves the recording state alone. An in-flight upload's placeholder is
    /// replaced by the input it displaced.
    pub fn reset(&self) {
        let (restored, before, after) = {
            let mut st = self.lock();
            let before = st.flags();
            st.transcript.clear();
            st.is_loading = true;
            st.is_receiving = false;
            st.generation += 1;
            let restored = st.upload_saved_text.take();
            if let Some(text) = &restored {
                st.input_text = text.clone();
            }
            (restored, before, st.flags())
        };
        self.observer.transcript_cleared();
        if let Some(text) = restored {
            self.observer.input_changed(&text);
        }
        self.notify_flags(before, after);
    }
}
