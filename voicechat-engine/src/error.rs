use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to encode chat request: {0}")]
    Encode(#[from] serde_json::Error),
}
