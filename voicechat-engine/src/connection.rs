use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use voicechat_core::protocol::encode_chat_request;
use voicechat_core::types::{ChatMessage, PendingSend, SocketEvent};

use crate::error::EngineError;
use crate::state::ChatStore;
use crate::traits::{FrameSink, SocketConnector, SocketLink};

pub const ALERT_TITLE: &str = "Error";
pub const ALERT_CONNECT_FAILED: &str = "Failed to connect to the chat server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// No socket has been opened yet (or the last one was reset away).
    Idle,
    Connecting,
    Open,
    Closed,
}

enum LinkState {
    Connecting,
    Open(Arc<dyn FrameSink>),
    Closed,
}

struct SocketSlot {
    id: u64,
    state: LinkState,
    task: Option<JoinHandle<()>>,
}

impl SocketSlot {
    fn status(&self) -> LinkStatus {
        match self.state {
            LinkState::Connecting => LinkStatus::Connecting,
            LinkState::Open(_) => LinkStatus::Open,
            LinkState::Closed => LinkStatus::Closed,
        }
    }

    fn is_live(&self) -> bool {
        !matches!(self.state, LinkState::Closed)
    }

    fn shutdown(mut self) {
        if let LinkState::Open(sink) = &self.state {
            sink.close();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Default)]
struct ConnInner {
    slot: Option<SocketSlot>,
    pending: VecDeque<PendingSend>,
    next_id: u64,
}

/// Owns the chat socket and the queue of messages waiting for it.
///
/// The socket is opened lazily. Messages sent while it is not open are queued
/// and flushed in order once it opens.
#[derive(Clone)]
pub struct ConnectionManager {
    url: String,
    connector: Arc<dyn SocketConnector>,
    store: ChatStore,
    receiving_grace: Duration,
    inner: Arc<Mutex<ConnInner>>,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        connector: Arc<dyn SocketConnector>,
        store: ChatStore,
        receiving_grace: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            connector,
            store,
            receiving_grace,
            inner: Arc::new(Mutex::new(ConnInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn send_message(&self, text: &str, history: Vec<ChatMessage>) -> Result<(), EngineError> {
        let frame = encode_chat_request(text, &history)?;

        let mut inner = self.lock();
        if let Some(slot) = inner.slot.as_mut() {
            let sent = match &slot.state {
                LinkState::Open(sink) => Some(sink.send_text(frame)),
                _ => None,
            };
            match sent {
                Some(Ok(())) => {
                    drop(inner);
                    log::debug!("chat request sent ({} history messages)", history.len());
                    self.store.set_receiving(true);
                    return Ok(());
                }
                Some(Err(e)) => {
                    log::warn!("chat socket write failed; queueing message: {e:#}");
                    slot.state = LinkState::Closed;
                }
                None => {}
            }
        }

        inner.pending.push_back(PendingSend::new(text, history));
        log::debug!("chat socket not open; {} message(s) queued", inner.pending.len());
        self.connect_locked(&mut inner);
        Ok(())
    }

    /// Opens a socket unless one is already connecting or open.
    pub fn ensure_connected(&self) {
        let mut inner = self.lock();
        self.connect_locked(&mut inner);
    }

    fn connect_locked(&self, inner: &mut ConnInner) {
        if inner.slot.as_ref().is_some_and(SocketSlot::is_live) {
            return;
        }
        if let Some(stale) = inner.slot.take() {
            stale.shutdown();
        }

        inner.next_id += 1;
        let id = inner.next_id;
        log::info!("connecting chat socket #{id} to {}", self.url);

        let this = self.clone();
        let task = tokio::spawn(async move { this.run_socket(id).await });
        inner.slot = Some(SocketSlot {
            id,
            state: LinkState::Connecting,
            task: Some(task),
        });
    }

    async fn run_socket(self, id: u64) {
        let SocketLink { sink, mut events } = match self.connector.connect(&self.url).await {
            Ok(link) => link,
            Err(e) => {
                self.on_error(id, &format!("{e:#}"));
                return;
            }
        };

        let Some(generation) = self.on_open(id, sink.clone()) else {
            sink.close();
            return;
        };

        while let Some(event) = events.recv().await {
            if !self.is_current(id) {
                break;
            }
            match event {
                SocketEvent::Frame(text) => {
                    let reply = ChatMessage::assistant(text);
                    if self.store.append_for_generation(generation, reply) {
                        self.store.clear_receiving_after(generation, self.receiving_grace);
                    }
                }
                SocketEvent::Error(e) => self.on_error(id, &e),
                SocketEvent::Closed => break,
            }
        }
        self.on_close(id);
    }

    // Returns the chat generation the socket serves, or None if it was superseded.
    fn on_open(&self, id: u64, sink: Arc<dyn FrameSink>) -> Option<u64> {
        let mut inner = self.lock();
        let ConnInner { slot, pending, .. } = &mut *inner;
        let slot = slot.as_mut().filter(|s| s.id == id)?;
        slot.state = LinkState::Open(sink.clone());
        let generation = self.store.generation();

        let mut flushed = 0usize;
        while let Some(entry) = pending.pop_front() {
            let encoded =
                encode_chat_request(&entry.user_message_content, &entry.conversation_history);
            let frame = match encoded {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("dropping queued message that failed to encode: {e}");
                    continue;
                }
            };
            if let Err(e) = sink.send_text(frame) {
                log::warn!("chat socket write failed during flush: {e:#}");
                pending.push_front(entry);
                slot.state = LinkState::Closed;
                break;
            }
            flushed += 1;
        }
        drop(inner);

        log::info!("chat socket #{id} open; flushed {flushed} queued message(s)");
        if flushed > 0 {
            self.store.set_receiving(true);
        }
        Some(generation)
    }

    fn on_error(&self, id: u64, err: &str) {
        let current = {
            let mut inner = self.lock();
            match inner.slot.as_mut().filter(|s| s.id == id) {
                Some(slot) => {
                    slot.state = LinkState::Closed;
                    true
                }
                None => false,
            }
        };
        if current {
            log::error!("chat socket #{id} error: {err}");
            self.store.alert(ALERT_TITLE, ALERT_CONNECT_FAILED);
        } else {
            log::debug!("ignoring error from superseded socket #{id}: {err}");
        }
    }

    fn on_close(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(slot) = inner.slot.as_mut().filter(|s| s.id == id) {
            slot.state = LinkState::Closed;
            log::info!("chat socket #{id} closed");
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.lock().slot.as_ref().is_some_and(|s| s.id == id)
    }

    /// Drops queued messages and closes the socket without opening a new one.
    pub fn reset(&self) {
        let (stale, dropped) = {
            let mut inner = self.lock();
            let dropped = inner.pending.len();
            inner.pending.clear();
            (inner.slot.take(), dropped)
        };
        if let Some(slot) = stale {
            slot.shutdown();
        }
        log::debug!("connection reset; dropped {dropped} queued message(s)");
    }

    pub fn link_status(&self) -> LinkStatus {
        self.lock()
            .slot
            .as_ref()
            .map_or(LinkStatus::Idle, SocketSlot::status)
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn pending(&self) -> Vec<PendingSend> {
        self.lock().pending.iter().cloned().collect()
    }
}
