pub mod config_store;
pub mod stt;
pub mod transport;

use std::sync::Arc;
use voicechat_core::config::ClientConfig;
use voicechat_engine::ChatOrchestrator;
use voicechat_engine::traits::{ChatObserver, DeviceRecorder};
use voicechat_providers::runtime::HttpRuntime;

pub use config_store::ConfigStore;
pub use stt::HttpTranscriber;
pub use transport::TungsteniteConnector;

/// Wires the network adapters into an orchestrator. The recorder is the
/// caller's choice since it depends on the device.
pub fn build_orchestrator(
    cfg: &ClientConfig,
    recorder: Arc<dyn DeviceRecorder>,
    observer: Arc<dyn ChatObserver>,
) -> anyhow::Result<ChatOrchestrator> {
    let http = HttpRuntime::new(&cfg.http)?;
    let transcriber = HttpTranscriber::new(cfg.endpoints.api_url.clone(), http);
    let connector = TungsteniteConnector::new(cfg.socket.connect_timeout());

    log::info!(
        "chat endpoints: socket={} api={}",
        cfg.endpoints.websocket_url,
        cfg.endpoints.api_url
    );
    Ok(ChatOrchestrator::new(
        cfg,
        Arc::new(connector),
        recorder,
        Arc::new(transcriber),
        observer,
    ))
}
