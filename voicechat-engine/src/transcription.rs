use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use voicechat_core::text::{INPUT_DISABLED_PLACEHOLDER, decode_uri};

use crate::state::ChatStore;
use crate::traits::Transcriber;

/// Turns a finished recording into input text.
#[derive(Clone)]
pub struct TranscriptionClient {
    transcriber: Arc<dyn Transcriber>,
    store: ChatStore,
    receiving_grace: Duration,
    revert_on_failure: bool,
}

impl TranscriptionClient {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        store: ChatStore,
        receiving_grace: Duration,
        revert_on_failure: bool,
    ) -> Self {
        Self {
            transcriber,
            store,
            receiving_grace,
            revert_on_failure,
        }
    }

    pub fn spawn_upload(&self, path: PathBuf) -> JoinHandle<bool> {
        let this = self.clone();
        tokio::spawn(async move { this.upload(&path).await })
    }

    /// Uploads `path` and appends the decoded transcript to the input.
    ///
    /// Returns true if the text was applied. A result that arrives after a
    /// chat reset is dropped.
    pub async fn upload(&self, path: &Path) -> bool {
        let generation = self.store.begin_upload(INPUT_DISABLED_PLACEHOLDER);
        log::info!("uploading recording {}", path.display());

        let result = self
            .transcriber
            .transcribe(path)
            .await
            .and_then(|raw| decode_uri(&raw).context("decode transcript text"));

        match result {
            Ok(text) => {
                if !self.store.finish_upload(generation, &text) {
                    log::info!("transcript arrived after a chat reset; discarding");
                    return false;
                }
                log::debug!("transcript applied ({} chars)", text.chars().count());
                self.store.clear_receiving_after(generation, self.receiving_grace);
                true
            }
            Err(e) => {
                log::error!("audio upload failed: {e:#}");
                if self.revert_on_failure {
                    self.store.revert_upload(generation);
                }
                false
            }
        }
    }
}
