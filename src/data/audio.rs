// ============================================================
// Layer 4 — Audio Loading
// ============================================================
// WAV file → mono f32 samples at the target rate → MFCC matrix.
//
//   hound   decodes PCM (8/16/24/32-bit int or 32-bit float)
//   mean    downmixes interleaved channels to mono
//   rubato  resamples to `audio_sr` (FFT based, fixed input)
//   mfcc.rs computes the 40 cepstral coefficients
//
// Reference: hound, rubato crate documentation

use anyhow::{bail, Context, Result};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;

use crate::data::mfcc::{Mfcc, N_MFCC};
use crate::domain::sample::MfccMatrix;

const RESAMPLE_CHUNK: usize = 1024;

/// Decode a WAV file into mono samples in [-1, 1] plus its sample rate.
pub fn load_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Cannot open audio '{}'", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Cannot decode '{}'", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Cannot decode '{}'", path.display()))?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Resample mono audio from `from_hz` to `to_hz`.
///
/// The output length is `round(len * to_hz / from_hz)`; the
/// resampler's startup delay is trimmed from the front.
pub fn resample(samples: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>> {
    if from_hz == 0 || to_hz == 0 {
        bail!("sample rates must be positive (from {from_hz} Hz to {to_hz} Hz)");
    }
    if from_hz == to_hz || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let expected = (samples.len() as f64 * to_hz as f64 / from_hz as f64).round() as usize;

    let mut resampler =
        FftFixedIn::<f32>::new(from_hz as usize, to_hz as usize, RESAMPLE_CHUNK, 2, 1)
            .context("Cannot build resampler")?;
    let delay = resampler.output_delay();

    let mut out = Vec::with_capacity(expected + delay);
    let mut pos = 0;
    while pos + resampler.input_frames_next() <= samples.len() {
        let n = resampler.input_frames_next();
        let input: [&[f32]; 1] = [&samples[pos..pos + n]];
        let chunk = resampler.process(&input[..], None)?;
        out.extend_from_slice(&chunk[0]);
        pos += n;
    }
    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let chunk = resampler.process_partial(Some(&tail[..]), None)?;
        out.extend_from_slice(&chunk[0]);
    }
    // flush until the delayed tail is out
    while out.len() < expected + delay {
        let chunk = resampler.process_partial::<&[f32]>(None, None)?;
        if chunk[0].is_empty() {
            break;
        }
        out.extend_from_slice(&chunk[0]);
    }

    let mut out: Vec<f32> = out.into_iter().skip(delay).collect();
    out.resize(expected, 0.0);
    Ok(out)
}

/// Turns an audio file into an MFCC matrix at a fixed sample rate.
pub struct AudioFeaturizer {
    target_sr: u32,
    mfcc:      Mfcc,
}

impl AudioFeaturizer {
    pub fn new(target_sr: u32) -> Self {
        Self { target_sr, mfcc: Mfcc::new(target_sr, N_MFCC) }
    }

    pub fn load(&self, path: &Path) -> Result<MfccMatrix> {
        let (samples, sr) = load_wav_mono(path)?;
        let samples = resample(&samples, sr, self.target_sr)
            .with_context(|| format!("Cannot resample '{}'", path.display()))?;
        tracing::debug!(
            "Loaded '{}' ({} samples at {} Hz)",
            path.display(), samples.len(), self.target_sr
        );
        Ok(self.mfcc.compute(&samples))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn write_wav(path: &Path, sr: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate:     sr,
            bits_per_sample: 16,
            sample_format:   hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let v = (2.0 * PI * 440.0 * i as f32 / sr as f32).sin();
            for c in 0..channels {
                // second channel is silent so the downmix halves the amplitude
                let s = if c == 0 { v } else { 0.0 };
                w.write_sample((s * i16::MAX as f32 * 0.5) as i16).unwrap();
            }
        }
        w.finalize().unwrap();
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8000, 2, 800);

        let (mono, sr) = load_wav_mono(&path).unwrap();
        assert_eq!(sr, 8000);
        assert_eq!(mono.len(), 800);
        let peak = mono.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak > 0.2 && peak < 0.3, "peak was {peak}");
    }

    #[test]
    fn test_resample_length() {
        let samples = vec![0.25f32; 44_100];
        let out = resample(&samples, 44_100, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);

        let same = resample(&samples[..10], 16_000, 16_000).unwrap();
        assert_eq!(same.len(), 10);
    }

    #[test]
    fn test_featurizer_produces_forty_rows() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("03-01-05-01-01-01-01.wav");
        write_wav(&path, 22_050, 1, 22_050);

        let m = AudioFeaturizer::new(16_000).load(&path).unwrap();
        assert_eq!(m.n_mfcc, 40);
        // 1 s at 16 kHz with hop 512 and centred frames
        assert_eq!(m.n_frames, 1 + 16_000 / 512);
        assert_eq!(m.data.len(), 40 * m.n_frames);
    }

    #[test]
    fn test_missing_audio_file() {
        let err = AudioFeaturizer::new(16_000).load(Path::new("nope.wav")).unwrap_err();
        assert!(err.to_string().contains("Cannot open audio"));
    }
}
