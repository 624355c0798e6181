// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved text checkpoint on a held-out split:
//
//   Step 1: Load the unified manifest and the tokenizer saved
//           next to the checkpoint
//   Step 2: Text rows only, labelled against the whole manifest
//   Step 3: Stratified 80/20 split, keep the test part
//   Step 4: Restore the model and predict every test row
//   Step 5: Per-class report + confusion matrix
//
// Reference: Burn Book §5 (Training), Rust Book §9 (Error Handling)

use anyhow::{bail, Result};
use burn::prelude::Backend;
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    dataset::{MultimodalDataset, TextDataset, DEFAULT_AUDIO_SR},
    manifest::{Manifest, ManifestPaths},
    splitter::stratified_split,
};
use crate::domain::{manifest::Modality, sample::DatasetMode};
use crate::infra::{
    checkpoint::{CheckpointManager, BASELINE},
    metrics::{ClassificationReport, ConfusionMatrix},
    tokenizer_store::{TextEncoder, TokenizerStore},
};
use crate::ml::{default_device, evaluator::predict_dataset, InferBackend};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_dir:       PathBuf,
    pub checkpoint_dir: PathBuf,
    pub checkpoint:     String,
    pub test_fraction:  f64,
    pub seed:           u64,
    pub batch_size:     usize,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            data_dir:       PathBuf::from("data"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            checkpoint:     BASELINE.to_string(),
            test_fraction:  0.2,
            seed:           42,
            batch_size:     16,
        }
    }
}

/// Everything the CLI prints after an evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub test_rows: usize,
    pub report:    ClassificationReport,
    pub confusion: ConfusionMatrix,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationOutcome> {
        self.execute_on::<InferBackend>(&default_device())
    }

    /// Same evaluation on an explicit backend.
    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<EvaluationOutcome> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        if !ckpt.has_model(&cfg.checkpoint) {
            bail!(
                "No checkpoint '{}' in '{}'. Have you run 'train' first?",
                cfg.checkpoint,
                cfg.checkpoint_dir.display()
            );
        }

        // ── Step 1 ────────────────────────────────────────────────────────────
        let manifest  = Manifest::load(&ManifestPaths::new(&cfg.data_dir).unified())?;
        let train_cfg = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir).load()?;
        let encoder   = Arc::new(TextEncoder::new(tokenizer, train_cfg.max_length)?);

        // ── Step 2–3 ──────────────────────────────────────────────────────────
        let test = held_out(manifest, encoder, cfg.test_fraction, cfg.seed)?;
        match ckpt.load_label_map() {
            Ok(saved) if saved != **test.label_map() => {
                tracing::warn!("Label map differs from the one saved at training time");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("No saved label map: {:#}", e),
        }
        tracing::info!("Evaluating on {} held-out text rows", test.len());

        // ── Step 4 ────────────────────────────────────────────────────────────
        let model_cfg = ckpt.load_model_config()?.with_dropout(0.0);
        let model     = ckpt.load_model::<B>(model_cfg.init(device), &cfg.checkpoint, device)?;

        let label_map = test.label_map().clone();
        let test_rows = test.len();
        let preds = predict_dataset(&model, TextDataset::new(test)?, cfg.batch_size, device)?;

        // ── Step 5 ────────────────────────────────────────────────────────────
        Ok(EvaluationOutcome {
            test_rows,
            report:    ClassificationReport::new(&preds.y_true, &preds.y_pred).with_label_names(&label_map),
            confusion: ConfusionMatrix::new(&preds.y_true, &preds.y_pred),
        })
    }
}

/// Test part of a stratified split over the text rows.
fn held_out(
    manifest:      Manifest,
    encoder:       Arc<TextEncoder>,
    test_fraction: f64,
    seed:          u64,
) -> Result<MultimodalDataset> {
    if !(0.0..1.0).contains(&test_fraction) {
        bail!("test fraction must be in [0, 1), got {test_fraction}");
    }

    let text = MultimodalDataset::new(manifest, DatasetMode::Text, encoder, DEFAULT_AUDIO_SR)
        .filter_modality(Modality::Text);
    if text.is_empty() {
        bail!("The unified manifest has no text rows to evaluate on");
    }

    let labels = text.label_ids()?;
    let (_, test_idx) = stratified_split(&labels, test_fraction, seed);
    if test_idx.is_empty() {
        bail!("The test split is empty; add more text rows or raise the test fraction");
    }
    text.select(&test_idx)
}
