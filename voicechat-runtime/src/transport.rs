use std::sync::Arc;
use std::time::Duration;
use voicechat_engine::traits::{FrameSink, SocketConnector, SocketLink};
use voicechat_providers::chat_socket::{ChatSocketConfig, ChatSocketHandle, connect_chat_socket};

/// Opens chat sockets with tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait::async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> anyhow::Result<SocketLink> {
        let cfg = ChatSocketConfig::new(url, self.connect_timeout)?;
        let (handle, events) = connect_chat_socket(&cfg).await?;
        Ok(SocketLink {
            sink: Arc::new(TungsteniteSink(handle)),
            events,
        })
    }
}

struct TungsteniteSink(ChatSocketHandle);

impl FrameSink for TungsteniteSink {
    fn send_text(&self, frame: String) -> anyhow::Result<()> {
        self.0.try_send_text(frame)
    }

    fn close(&self) {
        self.0.close();
    }
}
