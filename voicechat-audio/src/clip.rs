use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use voicechat_engine::traits::DeviceRecorder;

use crate::error::AudioCaptureError;

/// Stand-in recorder that "records" a prepared audio clip.
///
/// On stop the clip is copied to the path the session asked for, so the rest
/// of the pipeline sees a freshly written file.
#[derive(Debug)]
pub struct ClipRecorder {
    clip: PathBuf,
    target: Mutex<Option<PathBuf>>,
}

impl ClipRecorder {
    pub fn new(clip: impl Into<PathBuf>) -> Self {
        Self {
            clip: clip.into(),
            target: Mutex::new(None),
        }
    }

    pub fn clip(&self) -> &Path {
        &self.clip
    }

    fn target(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.target.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait::async_trait]
impl DeviceRecorder for ClipRecorder {
    async fn start_recorder(&self, path: &Path) -> anyhow::Result<()> {
        if tokio::fs::metadata(&self.clip).await.is_err() {
            return Err(AudioCaptureError::ClipMissing(self.clip.clone()).into());
        }
        let mut target = self.target();
        if target.is_some() {
            return Err(AudioCaptureError::AlreadyRecording.into());
        }
        *target = Some(path.to_path_buf());
        log::debug!("clip recorder armed: {} -> {}", self.clip.display(), path.display());
        Ok(())
    }

    async fn stop_recorder(&self) -> anyhow::Result<PathBuf> {
        let path = self.target().take().ok_or(AudioCaptureError::NotStarted)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create recording directory: {}", parent.display()))?;
        }
        tokio::fs::copy(&self.clip, &path)
            .await
            .with_context(|| format!("copy clip to {}", path.display()))?;
        Ok(path)
    }

    fn remove_record_back_listener(&self) {
        log::trace!("clip recorder has no level listener");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_copies_clip_to_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("sample.m4a");
        std::fs::write(&clip, b"clip-bytes").unwrap();
        let target = dir.path().join("out").join("recording.wav");

        let rec = ClipRecorder::new(&clip);
        rec.start_recorder(&target).await.unwrap();
        let written = rec.stop_recorder().await.unwrap();

        assert_eq!(written, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"clip-bytes");
    }

    #[tokio::test]
    async fn missing_clip_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let rec = ClipRecorder::new(dir.path().join("nope.m4a"));
        let err = rec.start_recorder(&dir.path().join("r.wav")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AudioCaptureError>(),
            Some(AudioCaptureError::ClipMissing(_))
        ));
    }

    #[tokio::test]
    async fn stop_without_start_is_an_error() {
        let rec = ClipRecorder::new("whatever.m4a");
        let err = rec.stop_recorder().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AudioCaptureError>(),
            Some(AudioCaptureError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("sample.m4a");
        std::fs::write(&clip, b"x").unwrap();

        let rec = ClipRecorder::new(&clip);
        rec.start_recorder(&dir.path().join("a.wav")).await.unwrap();
        assert!(rec.start_recorder(&dir.path().join("b.wav")).await.is_err());
    }
}
