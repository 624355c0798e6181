// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Smoke test for the dataset loader: opens the unified manifest
// in a chosen mode and materialises one sample, so a broken
// path or codec shows up before a long training run.
//
// Uses the tokenizer saved next to the checkpoints when there is
// one; otherwise builds a throwaway vocabulary in memory.

use anyhow::Result;
use std::{fmt, path::PathBuf, sync::Arc};

use crate::data::{
    dataset::{MultimodalDataset, DEFAULT_AUDIO_SR},
    manifest::{Manifest, ManifestPaths},
};
use crate::domain::{
    manifest::Modality,
    sample::{DatasetMode, SampleBundle, VideoClip, CLIP_FRAMES, FRAME_CHANNELS, FRAME_SIZE},
};
use crate::infra::tokenizer_store::{self, TextEncoder, TokenizerStore};

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub data_dir:       PathBuf,
    pub checkpoint_dir: PathBuf,
    pub mode:           DatasetMode,
    pub index:          usize,
    pub max_length:     usize,
    pub vocab_size:     usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            data_dir:       PathBuf::from("data"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            mode:           DatasetMode::All,
            index:          0,
            max_length:     128,
            vocab_size:     30522,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub rows:     usize,
    pub text:     usize,
    pub audio:    usize,
    pub video:    usize,
    pub labels:   Vec<String>,
    pub index:    usize,
    pub modality: Modality,
    pub label:    usize,
    pub shape:    String,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset size: {}", self.rows)?;
        writeln!(f, "  text={} audio={} video={}", self.text, self.audio, self.video)?;
        writeln!(f, "Labels ({}): {:?}", self.labels.len(), self.labels)?;
        writeln!(f, "Sample {}:", self.index)?;
        writeln!(f, "  modality: {}", self.modality)?;
        writeln!(f, "  label:    {}", self.label)?;
        write!(f, "  content:  {}", self.shape)
    }
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        let cfg      = &self.config;
        let manifest = Manifest::load(&ManifestPaths::new(&cfg.data_dir).unified())?;

        let store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = if store.path().exists() {
            store.load()?
        } else {
            tracing::info!("No saved tokenizer; building one in memory");
            let texts: Vec<String> = manifest.rows().iter().filter_map(|r| r.text.clone()).collect();
            tokenizer_store::build(&texts, cfg.vocab_size)?
        };
        let encoder = Arc::new(TextEncoder::new(tokenizer, cfg.max_length)?);

        let dataset = MultimodalDataset::new(manifest, cfg.mode, encoder, DEFAULT_AUDIO_SR);
        inspect(&dataset, cfg.index)
    }
}

fn inspect(dataset: &MultimodalDataset, index: usize) -> Result<InspectReport> {
    let manifest = dataset.manifest();
    let bundle   = dataset.get(index)?;
    let modality = manifest
        .get(index)
        .map(|r| r.modality)
        .unwrap_or(Modality::Text);

    Ok(InspectReport {
        rows:   dataset.len(),
        text:   manifest.count(Modality::Text),
        audio:  manifest.count(Modality::Audio),
        video:  manifest.count(Modality::Video),
        labels: dataset.label_map().names().into_iter().map(String::from).collect(),
        index,
        modality,
        label:  bundle.label(),
        shape:  describe(&bundle),
    })
}

fn describe(bundle: &SampleBundle) -> String {
    match bundle {
        SampleBundle::Text { encoding, .. } => format!(
            "input_ids [{}], {} real tokens",
            encoding.len(),
            encoding.real_tokens()
        ),
        SampleBundle::Audio { mfcc, .. } => {
            let [c, t] = mfcc.shape();
            format!("mfcc [{c}, {t}]")
        }
        SampleBundle::Video { clip, .. } => describe_clip(clip),
        SampleBundle::Mixed(m) => {
            if let Some(enc) = &m.text {
                format!("input_ids [{}], {} real tokens", enc.len(), enc.real_tokens())
            } else if let Some(mfcc) = &m.audio {
                let [c, t] = mfcc.shape();
                format!("mfcc [{c}, {t}]")
            } else if let Some(clip) = &m.video {
                describe_clip(clip)
            } else {
                "empty".to_string()
            }
        }
    }
}

fn describe_clip(clip: &VideoClip) -> String {
    match clip {
        VideoClip::Decoded(seq) => {
            let [n, h, w, c] = seq.shape();
            format!("frames [{n}, {h}, {w}, {c}]")
        }
        VideoClip::Failed(reason) => format!(
            "frames [{CLIP_FRAMES}, {FRAME_SIZE}, {FRAME_SIZE}, {FRAME_CHANNELS}] (zeros; decode failed: {reason})"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::ManifestRow;

    fn dataset(mode: DatasetMode) -> MultimodalDataset {
        let manifest = Manifest::from_rows(vec![
            ManifestRow::text("text_0", "feeling fine", "Normal"),
            ManifestRow::video("video_0", "/definitely/missing.mp4"),
        ])
        .unwrap();
        let tok = tokenizer_store::build(&["feeling fine".to_string()], 20).unwrap();
        let enc = Arc::new(TextEncoder::new(tok, 8).unwrap());
        MultimodalDataset::new(manifest, mode, enc, DEFAULT_AUDIO_SR)
    }

    #[test]
    fn test_first_text_sample() {
        let report = inspect(&dataset(DatasetMode::All), 0).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!((report.text, report.audio, report.video), (1, 0, 1));
        assert_eq!(report.labels, vec!["-1", "Normal"]);
        assert_eq!(report.modality, Modality::Text);
        assert_eq!(report.label, 1);
        assert_eq!(report.shape, "input_ids [8], 2 real tokens");
    }

    #[test]
    fn test_undecodable_video_reports_zeros() {
        let report = inspect(&dataset(DatasetMode::All), 1).unwrap();
        assert_eq!(report.modality, Modality::Video);
        assert!(report.shape.contains("zeros"));
        assert!(report.to_string().contains("Dataset size: 2"));
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(inspect(&dataset(DatasetMode::All), 5).is_err());
    }
}
