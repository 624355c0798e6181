// ============================================================
// Layer 4 — MFCC Feature Extraction
// ============================================================
// Mel-frequency cepstral coefficients with the usual speech
// feature defaults:
//
//   1. centre-pad the signal with n_fft/2 zeros on both sides
//   2. Hann window (periodic), n_fft = 2048, hop = 512
//   3. power spectrum |FFT|² of every frame      (rustfft)
//   4. 128 triangular mel filters, Slaney scale and area norm
//   5. 10·log10 power → dB, floored 80 dB below the peak
//   6. orthonormal DCT-II over the mel axis, keep 40 coefficients
//
// Output is row-major [n_mfcc, n_frames] with
// n_frames = 1 + len / hop.
//
// Reference: rustfft crate documentation
//            Slaney (1998) Auditory Toolbox, mel scale definition

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::{f32::consts::PI, sync::Arc};

use crate::domain::sample::MfccMatrix;

pub const N_MFCC: usize = 40;
pub const N_FFT:  usize = 2048;
pub const HOP:    usize = 512;
pub const N_MELS: usize = 128;
const TOP_DB: f32 = 80.0;
const AMIN:   f32 = 1e-10;

pub struct Mfcc {
    n_mfcc:  usize,
    window:  Vec<f32>,
    mel_fb:  Vec<Vec<f32>>, // [N_MELS][N_FFT/2 + 1]
    dct:     Vec<Vec<f32>>, // [n_mfcc][N_MELS]
    fft:     Arc<dyn Fft<f32>>,
}

impl Mfcc {
    pub fn new(sample_rate: u32, n_mfcc: usize) -> Self {
        let window = (0..N_FFT)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / N_FFT as f32).cos())
            .collect();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(N_FFT);
        Self {
            n_mfcc,
            window,
            mel_fb: mel_filterbank(sample_rate as f32, N_FFT, N_MELS),
            dct: dct_ortho(n_mfcc, N_MELS),
            fft,
        }
    }

    pub fn compute(&self, samples: &[f32]) -> MfccMatrix {
        let power = self.power_spectrogram(samples);
        let n_frames = power.len();

        // mel energies in dB, frame-major
        let mut mel_db: Vec<Vec<f32>> = power
            .iter()
            .map(|spec| {
                self.mel_fb
                    .iter()
                    .map(|filter| {
                        let e: f32 = filter.iter().zip(spec).map(|(w, p)| w * p).sum();
                        10.0 * e.max(AMIN).log10()
                    })
                    .collect()
            })
            .collect();

        let peak = mel_db
            .iter()
            .flat_map(|f| f.iter().copied())
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - TOP_DB;
        for v in mel_db.iter_mut().flatten() {
            *v = v.max(floor);
        }

        let mut data = vec![0.0f32; self.n_mfcc * n_frames];
        for (t, frame) in mel_db.iter().enumerate() {
            for (c, basis) in self.dct.iter().enumerate() {
                data[c * n_frames + t] = basis.iter().zip(frame).map(|(b, m)| b * m).sum();
            }
        }

        MfccMatrix { n_mfcc: self.n_mfcc, n_frames, data }
    }

    /// |STFT|² per frame, `N_FFT/2 + 1` bins each.
    fn power_spectrogram(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let pad = N_FFT / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = 1 + samples.len() / HOP;
        let n_bins   = N_FFT / 2 + 1;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); N_FFT];

        (0..n_frames)
            .map(|t| {
                let start = t * HOP;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.fft.process(&mut buffer);
                buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect()
            })
            .collect()
    }
}

// ─── Mel scale (Slaney) ───────────────────────────────────────────────────────
const F_SP:        f32 = 200.0 / 3.0;
const MIN_LOG_HZ:  f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular filters between 0 Hz and Nyquist, each scaled to unit area.
fn mel_filterbank(sample_rate: f32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f32> = (0..n_bins)
        .map(|k| k as f32 * sample_rate / n_fft as f32)
        .collect();

    let mel_max = hz_to_mel(sample_rate / 2.0);
    let mel_pts: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, mid, hi) = (mel_pts[m], mel_pts[m + 1], mel_pts[m + 2]);
            let enorm = 2.0 / (hi - lo);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - lo) / (mid - lo);
                    let upper = (hi - f) / (hi - mid);
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II basis, `[n_out][n_in]`.
fn dct_ortho(n_out: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f32;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| scale * (PI * k as f32 * (2 * i + 1) as f32 / (2.0 * n)).cos())
                .collect()
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip_and_breakpoint() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-4);
        for hz in [0.0, 300.0, 1000.0, 4000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.05);
        }
    }

    #[test]
    fn test_dct_rows_are_orthonormal() {
        let d = dct_ortho(4, 16);
        for a in 0..4 {
            for b in 0..4 {
                let dot: f32 = d[a].iter().zip(&d[b]).map(|(x, y)| x * y).sum();
                let want = if a == b { 1.0 } else { 0.0 };
                assert!((dot - want).abs() < 1e-4, "rows {a},{b}: {dot}");
            }
        }
    }

    #[test]
    fn test_filterbank_shape() {
        let fb = mel_filterbank(16_000.0, N_FFT, N_MELS);
        assert_eq!(fb.len(), N_MELS);
        assert!(fb.iter().all(|f| f.len() == N_FFT / 2 + 1));
        assert!(fb.iter().all(|f| f.iter().any(|&w| w > 0.0)));
    }

    #[test]
    fn test_frame_count_and_shape() {
        let mfcc = Mfcc::new(16_000, N_MFCC);
        let m = mfcc.compute(&vec![0.1; 5_000]);
        assert_eq!(m.shape(), [40, 1 + 5_000 / HOP]);

        // an empty clip still yields one (padded) frame
        assert_eq!(mfcc.compute(&[]).n_frames, 1);
    }

    #[test]
    fn test_silence_is_finite() {
        let m = Mfcc::new(16_000, N_MFCC).compute(&vec![0.0; 2_048]);
        assert!(m.data.iter().all(|v| v.is_finite()));
    }
}
