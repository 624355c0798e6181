// ============================================================
// Layer 4 — Multimodal Dataset
// ============================================================
// Lazily turns manifest rows into sample bundles.
//
//   MultimodalDataset → any mode; `get` returns a SampleBundle
//                       or an error naming the row
//   TextDataset       → text mode only, encoded up front;
//                       implements Burn's Dataset trait so a
//                       DataLoader can batch it
//
// The label map is built once, from the rows the dataset was
// constructed with, and shared (Arc) by every filtered view
// derived from it. Filtering a view therefore never renumbers
// the classes.
//
// Reference: Burn Book §4 (Datasets)
//            Rust Book §15 (Arc), §17 (Trait objects)

use anyhow::{anyhow, bail, Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{audio::AudioFeaturizer, manifest::Manifest, video::{load_clip, FfmpegFrameSource}};
use crate::domain::{
    label_map::LabelMap,
    manifest::{ManifestRow, Modality, RowContent},
    sample::{DatasetMode, MixedSample, SampleBundle},
    traits::FrameSource,
};
use crate::infra::tokenizer_store::TextEncoder;

pub const DEFAULT_AUDIO_SR: u32 = 16_000;

// ─── MultimodalDataset ────────────────────────────────────────────────────────
#[derive(Clone)]
pub struct MultimodalDataset {
    manifest:  Manifest,
    label_map: Arc<LabelMap>,
    mode:      DatasetMode,
    encoder:   Arc<TextEncoder>,
    audio:     Arc<AudioFeaturizer>,
    frames:    Arc<dyn FrameSource>,
}

impl MultimodalDataset {
    pub fn new(
        manifest: Manifest,
        mode:     DatasetMode,
        encoder:  Arc<TextEncoder>,
        audio_sr: u32,
    ) -> Self {
        let label_map = LabelMap::from_labels(manifest.rows().iter().map(|r| r.label.as_str()));
        tracing::info!("Label mapping ({} classes): {:?}", label_map.len(), label_map.names());

        Self {
            manifest,
            label_map: Arc::new(label_map),
            mode,
            encoder,
            audio:     Arc::new(AudioFeaturizer::new(audio_sr)),
            frames:    Arc::new(FfmpegFrameSource::default()),
        }
    }

    /// Replace the ffmpeg frame decoder.
    pub fn with_frame_source(mut self, frames: Arc<dyn FrameSource>) -> Self {
        self.frames = frames;
        self
    }

    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    pub fn mode(&self) -> DatasetMode {
        self.mode
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn label_map(&self) -> &Arc<LabelMap> {
        &self.label_map
    }

    /// Class id of every row, in order.
    pub fn label_ids(&self) -> Result<Vec<usize>> {
        self.manifest.rows().iter().map(|r| self.label_of(r)).collect()
    }

    // ─── Views ────────────────────────────────────────────────────────────────

    fn view(&self, manifest: Manifest) -> Self {
        Self { manifest, ..self.clone() }
    }

    pub fn filter_modality(&self, modality: Modality) -> Self {
        self.view(self.manifest.filter_modality(modality))
    }

    pub fn subsample(&self, n: usize, seed: u64) -> Self {
        self.view(self.manifest.subsample(n, seed))
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        Ok(self.view(self.manifest.select(indices)?))
    }

    // ─── Materialisation ──────────────────────────────────────────────────────

    pub fn get(&self, index: usize) -> Result<SampleBundle> {
        let row = self
            .manifest
            .get(index)
            .ok_or_else(|| anyhow!("index {index} out of range ({} rows)", self.len()))?;
        let label = self.label_of(row)?;

        let bundle = match self.mode {
            DatasetMode::Text => SampleBundle::Text {
                encoding: self.encoder.encode(require_text(row)?)?,
                label,
            },
            DatasetMode::Audio => SampleBundle::Audio {
                mfcc: self.audio.load(require_path(row, Modality::Audio)?)?,
                label,
            },
            DatasetMode::Video => SampleBundle::Video {
                clip: load_clip(self.frames.as_ref(), require_path(row, Modality::Video)?),
                label,
            },
            DatasetMode::All => SampleBundle::Mixed(self.mixed(row, label)?),
        };
        Ok(bundle)
    }

    fn mixed(&self, row: &ManifestRow, label: usize) -> Result<MixedSample> {
        let mut sample = MixedSample {
            modality: row.modality,
            label,
            text:     None,
            audio:    None,
            video:    None,
        };
        match row.content() {
            Some(RowContent::Text(text))  => sample.text = Some(self.encoder.encode(text)?),
            Some(RowContent::Audio(path)) => sample.audio = Some(self.audio.load(path)?),
            Some(RowContent::Video(path)) => sample.video = Some(load_clip(self.frames.as_ref(), path)),
            None => bail!("row '{}' ({}) has no {} field", row.id, row.modality, row.modality),
        }
        Ok(sample)
    }

    fn label_of(&self, row: &ManifestRow) -> Result<usize> {
        self.label_map
            .id(&row.label)
            .ok_or_else(|| anyhow!("row '{}' has label '{}' outside the label map", row.id, row.label))
    }
}

fn require_text(row: &ManifestRow) -> Result<&str> {
    match row.content() {
        Some(RowContent::Text(text)) => Ok(text),
        _ => Err(anyhow!("row '{}' ({}) has no text", row.id, row.modality)),
    }
}

fn require_path(row: &ManifestRow, modality: Modality) -> Result<&std::path::Path> {
    match (modality, row.content()) {
        (Modality::Audio, Some(RowContent::Audio(path))) | (Modality::Video, Some(RowContent::Video(path))) => Ok(path),
        _ => Err(anyhow!("row '{}' ({}) has no {} path", row.id, row.modality, modality)),
    }
}

// ─── TextDataset (Burn) ───────────────────────────────────────────────────────
/// One tokenised, padded text row and its class id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

/// Text rows encoded once, ready for Burn's DataLoader.
pub struct TextDataset {
    samples: Vec<TextSample>,
}

impl TextDataset {
    /// Requires text mode; fails on the first row that cannot be encoded.
    pub fn new(inner: MultimodalDataset) -> Result<Self> {
        if inner.mode() != DatasetMode::Text {
            bail!("TextDataset needs a text-mode dataset, got '{}'", inner.mode());
        }
        let samples = (0..inner.len())
            .map(|i| match inner.get(i).context("filter the dataset to text rows first")? {
                SampleBundle::Text { encoding, label } => Ok(TextSample {
                    input_ids:      encoding.input_ids,
                    attention_mask: encoding.attention_mask,
                    label,
                }),
                other => bail!("expected a text sample at index {i}, got {other:?}"),
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Encoded {} text samples", samples.len());
        Ok(Self { samples })
    }
}

impl Dataset<TextSample> for TextDataset {
    fn get(&self, index: usize) -> Option<TextSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
