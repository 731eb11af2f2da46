use std::time::Duration;

use anyhow::{Context, anyhow};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::{Message, client::IntoClientRequest};
use url::Url;
use voicechat_core::types::SocketEvent;

const WS_SEND_TIMEOUT: Duration = Duration::from_secs(3);
const OUTBOUND_CAPACITY: usize = 256;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSocketConfig {
    pub url: Url,
    pub connect_timeout: Duration,
}

impl ChatSocketConfig {
    pub fn new(url: &str, connect_timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("parse websocket url: {url}"))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => return Err(anyhow!("unsupported websocket scheme: {other}")),
        }
        Ok(Self {
            url,
            connect_timeout,
        })
    }
}

#[derive(Debug)]
enum SocketCmd {
    Text(String),
    Close,
}

/// Write side of an open chat socket. Dropping every clone closes the socket.
#[derive(Debug, Clone)]
pub struct ChatSocketHandle {
    tx: mpsc::Sender<SocketCmd>,
}

impl ChatSocketHandle {
    /// Queues a text frame without waiting for the socket write.
    pub fn try_send_text(&self, frame: String) -> anyhow::Result<()> {
        self.tx
            .try_send(SocketCmd::Text(frame))
            .map_err(|e| match e {
                TrySendError::Full(_) => anyhow!("chat socket outbound queue is full"),
                TrySendError::Closed(_) => anyhow!("chat socket is closed"),
            })
    }

    pub fn close(&self) {
        let _ = self.tx.try_send(SocketCmd::Close);
    }
}

/// Opens the socket and spawns its reader/writer tasks.
///
/// The returned receiver yields every inbound text frame, then `Error` (if the read side
/// failed) and finally `Closed`.
pub async fn connect_chat_socket(
    cfg: &ChatSocketConfig,
) -> anyhow::Result<(ChatSocketHandle, mpsc::Receiver<SocketEvent>)> {
    let req = cfg
        .url
        .as_str()
        .into_client_request()
        .context("build websocket request")?;

    // Connect with a hard timeout so a dead endpoint can't leave us CONNECTING forever.
    let connect = tokio_tungstenite::connect_async(req);
    let (ws, _resp) = tokio::time::timeout(cfg.connect_timeout, connect)
        .await
        .map_err(|_| anyhow!("chat socket connect timed out"))?
        .context("connect chat websocket")?;

    log::info!("chat socket connected: {}", cfg.url);

    let (ws_write, mut ws_read) = ws.split();

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<SocketCmd>(OUTBOUND_CAPACITY);
    // Pongs go through their own channel so they can't queue behind chat frames.
    let (ctrl_tx, mut ctrl_rx) = mpsc::channel::<Message>(8);
    let (evt_tx, evt_rx) = mpsc::channel::<SocketEvent>(EVENT_CAPACITY);

    tokio::spawn(async move {
        let mut ws_write = ws_write;

        loop {
            let msg = tokio::select! {
                biased;
                ctrl = ctrl_rx.recv() => match ctrl {
                    Some(m) => m,
                    // Reader is gone; nothing left to talk to.
                    None => break,
                },
                cmd = cmd_rx.recv() => match cmd {
                    Some(SocketCmd::Text(t)) => Message::Text(t.into()),
                    Some(SocketCmd::Close) | None => break,
                },
            };

            let res = tokio::time::timeout(WS_SEND_TIMEOUT, ws_write.send(msg)).await;
            if !matches!(res, Ok(Ok(()))) {
                log::warn!("chat socket write failed; closing writer");
                break;
            }
        }

        let _ = ws_write.send(Message::Close(None)).await;
    });

    tokio::spawn(async move {
        while let Some(msg) = ws_read.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    let _ = evt_tx
                        .send(SocketEvent::Error(format!("websocket read failed: {e}")))
                        .await;
                    break;
                }
            };

            let text = match msg {
                Message::Text(t) => t.as_str().to_string(),
                Message::Binary(b) => String::from_utf8_lossy(&b).to_string(),
                Message::Ping(p) => {
                    if ctrl_tx.try_send(Message::Pong(p)).is_err() {
                        let _ = evt_tx
                            .send(SocketEvent::Error("failed to send pong".into()))
                            .await;
                        break;
                    }
                    continue;
                }
                Message::Close(_) => break,
                _ => continue,
            };

            if evt_tx.send(SocketEvent::Frame(text)).await.is_err() {
                // Nobody is listening anymore.
                return;
            }
        }

        let _ = evt_tx.send(SocketEvent::Closed).await;
    });

    Ok((ChatSocketHandle { tx: cmd_tx }, evt_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn cfg_for(addr: std::net::SocketAddr) -> ChatSocketConfig {
        ChatSocketConfig::new(&format!("ws://{addr}/ws"), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn config_rejects_http_scheme() {
        let err = ChatSocketConfig::new("http://localhost/ws", Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("unsupported websocket scheme"));
        assert!(ChatSocketConfig::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn integration_frames_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(txt) = msg {
                    let reply = format!("echo:{}", txt.as_str());
                    let _ = ws.send(Message::Text(reply.into())).await;
                }
            }
        });

        let (handle, mut events) = connect_chat_socket(&cfg_for(addr)).await.unwrap();
        handle.try_send_text("one".into()).unwrap();
        handle.try_send_text("two".into()).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(SocketEvent::Frame("echo:one".into())));
        assert_eq!(second, Some(SocketEvent::Frame("echo:two".into())));
        handle.close();
    }

    #[tokio::test]
    async fn integration_server_close_emits_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.send(Message::Text("bye".into())).await;
            let _ = ws.close(None).await;
        });

        let (_handle, mut events) = connect_chat_socket(&cfg_for(addr)).await.unwrap();

        let mut seen = vec![];
        while let Ok(Some(evt)) =
            tokio::time::timeout(Duration::from_secs(2), events.recv()).await
        {
            let closed = evt == SocketEvent::Closed;
            seen.push(evt);
            if closed {
                break;
            }
        }
        assert_eq!(seen.first(), Some(&SocketEvent::Frame("bye".into())));
        assert_eq!(seen.last(), Some(&SocketEvent::Closed));
    }

    #[tokio::test]
    async fn integration_client_close_reaches_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let mut saw_close = false;
            while let Some(Ok(msg)) = ws.next().await {
                if matches!(msg, Message::Close(_)) {
                    saw_close = true;
                }
            }
            let _ = done_tx.send(saw_close);
        });

        let (handle, _events) = connect_chat_socket(&cfg_for(addr)).await.unwrap();
        handle.close();

        let saw_close = tokio::time::timeout(Duration::from_secs(2), done_rx)
            .await
            .unwrap()
            .unwrap();
        assert!(saw_close);
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect_chat_socket(&cfg_for(addr)).await.unwrap_err();
        assert!(err.to_string().contains("connect chat websocket"));
    }
}
