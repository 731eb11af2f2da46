use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::error::AudioCaptureError;

/// Writes mono f32 samples as 16-bit PCM.
pub fn write_wav_mono(
    path: &Path,
    samples: &[f32],
    sample_rate_hz: u32,
) -> Result<(), AudioCaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    log::debug!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_readable_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        write_wav_mono(&path, &[0.0, 0.5, -1.0, 2.0], 16_000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[2], -i16::MAX);
        // Out-of-range input is clamped.
        assert_eq!(samples[3], i16::MAX);
    }
}
