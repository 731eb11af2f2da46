use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use voicechat_core::types::{ChatMessage, SocketEvent};

use crate::state::UiFlags;

/// Write side of one socket connection.
pub trait FrameSink: Send + Sync {
    /// Must not wait on the network; queue the frame or fail.
    fn send_text(&self, frame: String) -> anyhow::Result<()>;
    fn close(&self);
}

pub struct SocketLink {
    pub sink: Arc<dyn FrameSink>,
    pub events: mpsc::Receiver<SocketEvent>,
}

#[async_trait]
pub trait SocketConnector: Send + Sync {
    /// Resolves once the socket is OPEN.
    async fn connect(&self, url: &str) -> anyhow::Result<SocketLink>;
}

/// Device audio recorder. Codec and capture details live behind this.
#[async_trait]
pub trait DeviceRecorder: Send + Sync {
    async fn start_recorder(&self, path: &Path) -> anyhow::Result<()>;

    /// Returns the path of the finished recording.
    async fn stop_recorder(&self) -> anyhow::Result<PathBuf>;

    fn remove_record_back_listener(&self) {}
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Uploads the file and returns the server's `text` field, still percent-encoded.
    async fn transcribe(&self, file: &Path) -> anyhow::Result<String>;
}

/// UI hooks. Called outside of any engine lock, possibly from a runtime worker.
pub trait ChatObserver: Send + Sync {
    fn alert(&self, title: &str, message: &str);

    fn message_appended(&self, _message: &ChatMessage) {}

    fn transcript_cleared(&self) {}

    fn input_changed(&self, _text: &str) {}

    fn flags_changed(&self, _flags: UiFlags) {}
}

/// Observer that only logs alerts.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ChatObserver for LogObserver {
    fn alert(&self, title: &str, message: &str) {
        log::warn!("[alert] {title}: {message}");
    }
}
