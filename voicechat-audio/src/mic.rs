// Microphone capture through cpal. A dedicated thread owns the stream since
// cpal streams are not Send on every platform.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::time::Duration;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};
use voicechat_engine::traits::DeviceRecorder;

use crate::error::AudioCaptureError;
use crate::wav::write_wav_mono;

type LevelListener = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

enum Cmd {
    Stop(mpsc::Sender<Vec<f32>>),
    Shutdown,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

struct Capture {
    cmd_tx: mpsc::Sender<Cmd>,
    worker: Option<std::thread::JoinHandle<()>>,
    sample_rate_hz: u32,
}

impl Capture {
    fn open(
        device: Device,
        listener: Arc<Mutex<Option<LevelListener>>>,
    ) -> Result<Self, AudioCaptureError> {
        let config = device.default_input_config()?;
        let sample_rate_hz = config.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        let worker = std::thread::spawn(move || {
            let channels = config.channels() as usize;
            let stream_cfg: cpal::StreamConfig = config.clone().into();
            let tx = sample_tx;
            let stream = match config.sample_format() {
                SampleFormat::I16 => build_input_stream::<i16>(&device, &stream_cfg, channels, tx),
                SampleFormat::U16 => build_input_stream::<u16>(&device, &stream_cfg, channels, tx),
                SampleFormat::I32 => build_input_stream::<i32>(&device, &stream_cfg, channels, tx),
                SampleFormat::F64 => build_input_stream::<f64>(&device, &stream_cfg, channels, tx),
                _ => build_input_stream::<f32>(&device, &stream_cfg, channels, tx),
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    log::error!("audio stream build failed: {e}");
                    let _ = worker_tx.send(WorkerMsg::Error(format!("build stream: {e}")));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                log::error!("audio stream play failed: {e}");
                let _ = worker_tx.send(WorkerMsg::Error(format!("play stream: {e}")));
                return;
            }

            let _ = worker_tx.send(WorkerMsg::Ready);
            run_consumer(sample_rx, cmd_rx, listener);
            drop(stream);
        });

        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(AudioCaptureError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(AudioCaptureError::WorkerTimeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(AudioCaptureError::Channel),
        }

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
            sample_rate_hz,
        })
    }

    fn finish(mut self) -> Result<Vec<f32>, AudioCaptureError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| AudioCaptureError::Channel)?;
        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => AudioCaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => AudioCaptureError::Channel,
            });

        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
        samples
    }
}

/// Records the default input device to a mono 16-bit WAV file.
pub struct MicRecorder {
    active: Mutex<Option<(Capture, PathBuf)>>,
    listener: Arc<Mutex<Option<LevelListener>>>,
}

impl MicRecorder {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Called with every captured chunk while recording, until the session
    /// removes it on stop.
    pub fn set_level_listener<F>(&self, f: F)
    where
        F: Fn(&[f32]) + Send + Sync + 'static,
    {
        *lock(&self.listener) = Some(Arc::new(f));
    }

    fn active(&self) -> MutexGuard<'_, Option<(Capture, PathBuf)>> {
        lock(&self.active)
    }
}

impl Default for MicRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

#[async_trait::async_trait]
impl DeviceRecorder for MicRecorder {
    async fn start_recorder(&self, path: &Path) -> anyhow::Result<()> {
        if self.active().is_some() {
            return Err(AudioCaptureError::AlreadyRecording.into());
        }

        let listener = self.listener.clone();
        let capture = tokio::task::spawn_blocking(move || {
            let device = cpal::default_host()
                .default_input_device()
                .ok_or(AudioCaptureError::NoInputDevice)?;
            if let Ok(name) = device.name() {
                log::info!("using input device: {name}");
            }
            Capture::open(device, listener)
        })
        .await
        .context("audio worker panicked")??;

        *self.active() = Some((capture, path.to_path_buf()));
        Ok(())
    }

    async fn stop_recorder(&self) -> anyhow::Result<PathBuf> {
        let (capture, path) = self.active().take().ok_or(AudioCaptureError::NotStarted)?;
        let rate = capture.sample_rate_hz;

        let out = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), AudioCaptureError> {
            let samples = capture.finish()?;
            write_wav_mono(&out, &samples, rate)
        })
        .await
        .context("audio worker panicked")??;

        Ok(path)
    }

    fn remove_record_back_listener(&self) {
        lock(&self.listener).take();
    }
}

fn build_input_stream<T>(
    device: &Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let chunk: Vec<f32> = if channels == 1 {
            data.iter().map(|&s| s.to_sample::<f32>()).collect()
        } else {
            data.chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                })
                .collect()
        };
        let _ = sample_tx.send(chunk);
    };

    device.build_input_stream(
        config,
        cb,
        |err| log::error!("audio stream error: {err}"),
        None,
    )
}

fn run_consumer(
    sample_rx: mpsc::Receiver<Vec<f32>>,
    cmd_rx: mpsc::Receiver<Cmd>,
    listener: Arc<Mutex<Option<LevelListener>>>,
) {
    let mut captured: Vec<f32> = Vec::new();

    loop {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Cmd::Stop(resp) => {
                    let _ = resp.send(std::mem::take(&mut captured));
                }
                Cmd::Shutdown => return,
            }
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(samples) => {
                let cb = lock(&listener).clone();
                if let Some(cb) = cb {
                    cb(&samples);
                }
                captured.extend_from_slice(&samples);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
