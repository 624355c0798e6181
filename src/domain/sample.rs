// ============================================================
// Layer 3 — Sample Tensor Bundles
// ============================================================
// What the dataset loader hands back for one manifest row.
// The shape of the bundle depends on the loader's mode:
//
//   text  → token ids [L] + attention mask [L]
//   audio → MFCC matrix [40, frames]
//   video → 16 frames of 224 × 224 × 3 values in [0, 1]
//   all   → one of the above, picked by the row's modality
//
// These are plain Vec-backed buffers; the ML layer turns them
// into Burn tensors at batching time.

use anyhow::{bail, Result};
use std::{fmt, str::FromStr};

use crate::domain::manifest::Modality;

/// Frames per clip returned by the video loader.
pub const CLIP_FRAMES: usize = 16;
/// Height and width of every decoded frame.
pub const FRAME_SIZE: usize = 224;
/// Colour channels per pixel.
pub const FRAME_CHANNELS: usize = 3;
/// Number of f32 values in one frame (H × W × C).
pub const FRAME_LEN: usize = FRAME_SIZE * FRAME_SIZE * FRAME_CHANNELS;

// ─── DatasetMode ──────────────────────────────────────────────────────────────
/// Which representation the dataset loader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetMode {
    Text,
    Audio,
    Video,
    /// Dispatch on each row's own modality.
    All,
}

impl FromStr for DatasetMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text"          => Ok(DatasetMode::Text),
            "audio"         => Ok(DatasetMode::Audio),
            "video"         => Ok(DatasetMode::Video),
            "all" | "mixed" => Ok(DatasetMode::All),
            other           => bail!("unknown dataset mode '{other}'"),
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatasetMode::Text  => "text",
            DatasetMode::Audio => "audio",
            DatasetMode::Video => "video",
            DatasetMode::All   => "all",
        };
        f.write_str(s)
    }
}

// ─── Text ─────────────────────────────────────────────────────────────────────
/// Fixed-length token ids plus attention mask (1 = real token, 0 = padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEncoding {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl TextEncoding {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Number of non-padding positions.
    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

// ─── Audio ────────────────────────────────────────────────────────────────────
/// Row-major `[n_mfcc, n_frames]` cepstral feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccMatrix {
    pub n_mfcc:   usize,
    pub n_frames: usize,
    pub data:     Vec<f32>,
}

impl MfccMatrix {
    pub fn shape(&self) -> [usize; 2] {
        [self.n_mfcc, self.n_frames]
    }

    /// Coefficient `c` of frame `t`.
    pub fn get(&self, c: usize, t: usize) -> Option<f32> {
        if c >= self.n_mfcc || t >= self.n_frames {
            return None;
        }
        self.data.get(c * self.n_frames + t).copied()
    }
}

// ─── Video ────────────────────────────────────────────────────────────────────
/// One decoded frame, HWC layout, `FRAME_LEN` values in [0, 1].
pub type Frame = Vec<f32>;

/// Exactly `CLIP_FRAMES` frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Keep the first `CLIP_FRAMES` frames and pad short clips by
    /// repeating the last one. Returns `None` when `frames` is empty.
    pub fn from_frames(mut frames: Vec<Frame>) -> Option<Self> {
        let last = frames.last()?.clone();
        frames.truncate(CLIP_FRAMES);
        frames.resize(CLIP_FRAMES, last);
        Some(Self { frames })
    }

    /// The all-zero `(16, 224, 224, 3)` sequence.
    pub fn zeros() -> Self {
        Self { frames: vec![vec![0.0; FRAME_LEN]; CLIP_FRAMES] }
    }

    pub fn shape(&self) -> [usize; 4] {
        [self.frames.len(), FRAME_SIZE, FRAME_SIZE, FRAME_CHANNELS]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_all_zero(&self) -> bool {
        self.frames.iter().all(|f| f.iter().all(|&v| v == 0.0))
    }

    /// Flatten to `[16 * 224 * 224 * 3]`.
    pub fn to_flat(&self) -> Vec<f32> {
        self.frames.concat()
    }
}

/// Result of decoding one clip.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoClip {
    Decoded(FrameSequence),
    /// Nothing could be decoded; the reason is kept for logging.
    Failed(String),
}

impl VideoClip {
    pub fn is_decoded(&self) -> bool {
        matches!(self, VideoClip::Decoded(_))
    }

    /// Substitute the all-zero sequence for a failed decode.
    pub fn into_frames_or_zeros(self) -> FrameSequence {
        match self {
            VideoClip::Decoded(seq) => seq,
            VideoClip::Failed(_)    => FrameSequence::zeros(),
        }
    }
}

// ─── Bundles ──────────────────────────────────────────────────────────────────

/// `all` mode item: only the sub-bundle matching `modality` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedSample {
    pub modality: Modality,
    pub label:    usize,
    pub text:     Option<TextEncoding>,
    pub audio:    Option<MfccMatrix>,
    pub video:    Option<VideoClip>,
}

/// Materialised content of one row plus its class id.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBundle {
    Text  { encoding: TextEncoding, label: usize },
    Audio { mfcc: MfccMatrix, label: usize },
    Video { clip: VideoClip, label: usize },
    Mixed(MixedSample),
}

impl SampleBundle {
    pub fn label(&self) -> usize {
        match self {
            SampleBundle::Text { label, .. }
            | SampleBundle::Audio { label, .. }
            | SampleBundle::Video { label, .. } => *label,
            SampleBundle::Mixed(m) => m.label,
        }
    }
}
