use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use voicechat_core::config::RecordingSettings;

use crate::state::ChatStore;
use crate::traits::DeviceRecorder;
use crate::transcription::TranscriptionClient;

struct AutoStop {
    session: u64,
    task: JoinHandle<()>,
}

/// Where the recorder writes.
///
/// iOS recorders take a bare file name; elsewhere the file goes to the
/// configured directory, the user's documents directory, or the temp dir.
pub fn recording_path(settings: &RecordingSettings) -> PathBuf {
    if cfg!(target_os = "ios") {
        return PathBuf::from("recording.m4a");
    }
    let dir = settings
        .directory
        .clone()
        .or_else(dirs::document_dir)
        .unwrap_or_else(std::env::temp_dir);
    dir.join(&settings.file_name)
}

/// One microphone capture at a time, stopped by the user or after the max duration.
#[derive(Clone)]
pub struct RecordingSession {
    recorder: Arc<dyn DeviceRecorder>,
    transcription: TranscriptionClient,
    store: ChatStore,
    settings: RecordingSettings,
    auto_stop: Arc<Mutex<Option<AutoStop>>>,
    next_session: Arc<AtomicU64>,
}

impl RecordingSession {
    pub fn new(
        recorder: Arc<dyn DeviceRecorder>,
        transcription: TranscriptionClient,
        store: ChatStore,
        settings: RecordingSettings,
    ) -> Self {
        Self {
            recorder,
            transcription,
            store,
            settings,
            auto_stop: Arc::new(Mutex::new(None)),
            next_session: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<AutoStop>> {
        self.auto_stop.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Starts the recorder. False if already recording or the recorder failed.
    pub async fn start(&self) -> bool {
        if !self.store.try_begin_recording() {
            log::debug!("recording already in progress; start ignored");
            return false;
        }
        self.cancel_auto_stop();

        let path = recording_path(&self.settings);
        if let Err(e) = self.recorder.start_recorder(&path).await {
            self.store.abort_recording_start();
            log::error!("failed to start recording: {e:#}");
            return false;
        }

        let session = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        self.store.mark_recording(session);
        self.arm_auto_stop(session);
        log::info!("recording #{session} started: {}", path.display());
        true
    }

    fn arm_auto_stop(&self, session: u64) {
        let max = self.settings.max_duration();
        // Held across the spawn so the timer cannot fire before its handle is stored.
        let mut slot = self.lock_timer();
        let this = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(max).await;
            this.detach_auto_stop(session);
            if this.store.recording_session() == Some(session) {
                log::info!("recording #{session} hit the {max:?} limit; stopping");
                this.stop_session(Some(session)).await;
            }
        });
        if let Some(old) = slot.replace(AutoStop { session, task }) {
            old.task.abort();
        }
    }

    // Forget the timer without aborting it; used by the timer task itself.
    fn detach_auto_stop(&self, session: u64) {
        let mut slot = self.lock_timer();
        if slot.as_ref().is_some_and(|t| t.session == session) {
            slot.take();
        }
    }

    fn cancel_auto_stop(&self) {
        if let Some(timer) = self.lock_timer().take() {
            timer.task.abort();
        }
    }

    /// Stops the recorder and starts the upload. None if nothing was recording
    /// or the recorder failed to stop.
    pub async fn stop(&self) -> Option<PathBuf> {
        self.stop_session(None).await
    }

    async fn stop_session(&self, expected: Option<u64>) -> Option<PathBuf> {
        // State flips before any await so a racing stop finds Idle.
        let (session, elapsed) = self.store.take_recording(expected)?;
        self.cancel_auto_stop();

        match self.recorder.stop_recorder().await {
            Ok(path) => {
                self.recorder.remove_record_back_listener();
                log::info!(
                    "recording #{session} stopped after {:.1}s: {}",
                    elapsed.as_secs_f32(),
                    path.display()
                );
                self.transcription.spawn_upload(path.clone());
                Some(path)
            }
            Err(e) => {
                log::error!("failed to stop recording #{session}: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_path_prefers_configured_directory() {
        let settings = RecordingSettings {
            directory: Some(PathBuf::from("/tmp/voicechat-test")),
            ..RecordingSettings::default()
        };
        let path = recording_path(&settings);
        if cfg!(target_os = "ios") {
            assert_eq!(path, PathBuf::from("recording.m4a"));
        } else {
            assert_eq!(path, PathBuf::from("/tmp/voicechat-test/recording.wav"));
        }
    }

    #[test]
    fn recording_path_falls_back_to_a_directory() {
        let path = recording_path(&RecordingSettings::default());
        assert!(path.ends_with("recording.wav") || path.ends_with("recording.m4a"));
    }
}
