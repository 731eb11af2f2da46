use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SttResponse {
    // Percent-encoded; decode before showing it to the user.
    pub text: String,
}

pub fn parse_stt_response(body: &[u8]) -> anyhow::Result<String> {
    let resp: SttResponse = serde_json::from_slice(body).context("decode STT JSON")?;
    Ok(resp.text)
}
