use anyhow::Context;
use std::path::Path;
use voicechat_engine::traits::Transcriber;
use voicechat_providers::parse::parse_stt_response;
use voicechat_providers::runtime::HttpRuntime;
use voicechat_providers::stt::{AudioFile, build_stt_request};

/// Uploads recordings to `{api_url}/stt`.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    api_url: String,
    http: HttpRuntime,
}

impl HttpTranscriber {
    pub fn new(api_url: impl Into<String>, http: HttpRuntime) -> Self {
        Self {
            api_url: api_url.into(),
            http,
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, file: &Path) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("read recording: {}", file.display()))?;
        log::debug!("uploading {} bytes of audio", bytes.len());

        let req = build_stt_request(&self.api_url, &AudioFile::recording(bytes));
        let resp = self.http.execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow::anyhow!(
                "STT upload failed: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ));
        }

        parse_stt_response(&resp.body)
    }
}
