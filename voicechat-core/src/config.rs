use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_WEBSOCKET_URL: &str = "WEBSOCKET_URL";
pub const ENV_API_URL: &str = "API_URL";

/// The only two environment-level settings of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub websocket_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            websocket_url: "ws://127.0.0.1:8000/ws".into(),
            api_url: "http://127.0.0.1:8000".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketSettings {
    pub connect_timeout_ms: u64,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
        }
    }
}

impl SocketSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            timeout_ms: 30_000,
        }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub max_duration_ms: u64,

    // None = platform default (documents dir, then temp dir).
    pub directory: Option<PathBuf>,
    pub file_name: String,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            max_duration_ms: 10_000,
            directory: None,
            file_name: "recording.wav".into(),
        }
    }
}

impl RecordingSettings {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    // Off by default: a failed upload leaves the placeholder in the input.
    pub revert_on_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub socket: SocketSettings,
    pub http: HttpSettings,
    pub recording: RecordingSettings,
    pub transcription: TranscriptionSettings,
    pub receiving_grace_ms: u64,
    pub input_max_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            socket: SocketSettings::default(),
            http: HttpSettings::default(),
            recording: RecordingSettings::default(),
            transcription: TranscriptionSettings::default(),
            receiving_grace_ms: 500,
            input_max_chars: 100,
        }
    }
}

impl ClientConfig {
    pub fn receiving_grace(&self) -> Duration {
        Duration::from_millis(self.receiving_grace_ms)
    }

    /// Overlay `WEBSOCKET_URL` / `API_URL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = non_empty(ENV_WEBSOCKET_URL) {
            self.endpoints.websocket_url = url;
        }
        if let Some(url) = non_empty(ENV_API_URL) {
            self.endpoints.api_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_client_timings() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.recording.max_duration(), Duration::from_secs(10));
        assert_eq!(cfg.receiving_grace(), Duration::from_millis(500));
        assert_eq!(cfg.input_max_chars, 100);
        assert!(!cfg.transcription.revert_on_failure);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"endpoints":{"api_url":"http://x"},"receiving_grace_ms":0}"#)
                .unwrap();
        assert_eq!(cfg.endpoints.api_url, "http://x");
        assert_eq!(cfg.endpoints.websocket_url, Endpoints::default().websocket_url);
        assert_eq!(cfg.receiving_grace_ms, 0);
        assert_eq!(cfg.socket.connect_timeout_ms, 10_000);
    }

    #[test]
    fn env_overrides_skip_blank_values() {
        let cfg = ClientConfig::default().with_overrides_from(|k| match k {
            ENV_WEBSOCKET_URL => Some(" wss://chat.example.com/ws ".into()),
            ENV_API_URL => Some("   ".into()),
            _ => None,
        });
        assert_eq!(cfg.endpoints.websocket_url, "wss://chat.example.com/ws");
        assert_eq!(cfg.endpoints.api_url, Endpoints::default().api_url);
    }
}
