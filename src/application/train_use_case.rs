// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a text fine-tuning run in order:
//
//   Step 1: Load the unified manifest          (Layer 4 - data)
//   Step 2: Load / build the tokenizer         (Layer 6 - infra)
//   Step 3: Build the text-mode dataset over
//           every row (label map over all)     (Layer 4 - data)
//   Step 4: Keep text rows, optional subsample (Layer 4 - data)
//   Step 5: Save configs and label map         (Layer 6 - infra)
//   Step 6: Run the training loop              (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    dataset::{MultimodalDataset, TextDataset, DEFAULT_AUDIO_SR},
    manifest::{Manifest, ManifestPaths},
};
use crate::domain::{manifest::Modality, sample::DatasetMode};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::EpochMetrics,
    tokenizer_store::{TextEncoder, TokenizerStore},
};
use crate::ml::{default_device, model::TextClassifierConfig, trainer, TrainBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved as train_config.json so evaluation and serving use the
// same max_length as training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        PathBuf,
    pub checkpoint_dir:  PathBuf,
    /// Pretrained tokenizer.json; a vocabulary is built when absent
    pub tokenizer:       Option<PathBuf>,
    /// Record (without .mpk) to start from instead of random weights
    pub base_checkpoint: Option<PathBuf>,
    /// Random subset of text rows to train on; None = all
    pub max_samples:     Option<usize>,
    pub max_length:      usize,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub weight_decay:    f32,
    pub seed:            u64,
    pub vocab_size:      usize,
    pub d_model:         usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    pub dropout:         f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        PathBuf::from("data"),
            checkpoint_dir:  PathBuf::from("checkpoints"),
            tokenizer:       None,
            base_checkpoint: None,
            max_samples:     Some(5000),
            max_length:      128,
            batch_size:      8,
            epochs:          3,
            lr:              2e-5,
            weight_decay:    0.0,
            seed:            42,
            vocab_size:      30522,
            d_model:         256,
            num_heads:       8,
            num_layers:      6,
            d_ff:            1024,
            dropout:         0.1,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<EpochMetrics>> {
        self.execute_on::<TrainBackend>(&default_device())
    }

    /// Same run on an explicit autodiff backend.
    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<Vec<EpochMetrics>> {
        let cfg = &self.config;
        check_architecture(cfg)?;

        // ── Step 1: Unified manifest ──────────────────────────────────────────
        let manifest = Manifest::load(&ManifestPaths::new(&cfg.data_dir).unified())?;

        // ── Step 2: Tokenizer ─────────────────────────────────────────────────
        let texts: Vec<String> = manifest.rows().iter().filter_map(|r| r.text.clone()).collect();
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir)
            .load_or_build(cfg.tokenizer.as_deref(), &texts, cfg.vocab_size)?;
        let encoder = Arc::new(TextEncoder::new(tokenizer, cfg.max_length)?);

        // ── Step 3–4: Dataset ─────────────────────────────────────────────────
        let (dataset, model_cfg) = prepare(cfg, manifest, encoder)?;
        println!("Dataset ready: {} text samples", dataset.len());

        // ── Step 5: Sidecars ──────────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&model_cfg)?;
        ckpt_manager.save_label_map(dataset.label_map())?;

        // ── Step 6: Training loop ─────────────────────────────────────────────
        trainer::train::<B>(cfg, &model_cfg, TextDataset::new(dataset)?, &ckpt_manager, device)
    }
}

/// Attention splits d_model evenly across the heads.
fn check_architecture(cfg: &TrainConfig) -> Result<()> {
    if cfg.num_heads == 0 || cfg.d_model % cfg.num_heads != 0 {
        bail!(
            "d_model ({}) must be a positive multiple of num_heads ({})",
            cfg.d_model, cfg.num_heads
        );
    }
    Ok(())
}

/// Text-only view of the manifest plus the matching model config.
/// The label map covers every row of `manifest`, so the model
/// gets one output per label in the whole unified index.
fn prepare(
    cfg:      &TrainConfig,
    manifest: Manifest,
    encoder:  Arc<TextEncoder>,
) -> Result<(MultimodalDataset, TextClassifierConfig)> {
    let full = MultimodalDataset::new(manifest, DatasetMode::Text, encoder.clone(), DEFAULT_AUDIO_SR);

    let mut text = full.filter_modality(Modality::Text);
    if text.is_empty() {
        bail!("The unified manifest has no text rows to train on");
    }
    if let Some(n) = cfg.max_samples {
        text = text.subsample(n, cfg.seed);
        println!("Subsampled to {} text rows (seed {})", text.len(), cfg.seed);
    }

    let model_cfg = TextClassifierConfig::new(encoder.vocab_size(), cfg.max_length, full.label_map().len())
        .with_d_model(cfg.d_model)
        .with_num_heads(cfg.num_heads)
        .with_num_layers(cfg.num_layers)
        .with_d_ff(cfg.d_ff)
        .with_dropout(cfg.dropout);

    Ok((text, model_cfg))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::manifest::ManifestRow;
    use crate::infra::tokenizer_store;
    use burn::backend::{Autodiff, NdArray};
    use std::path::Path;

    /// Writes a small unified manifest under `root/data` (10 "Normal",
    /// 5 "Anxiety", 1 video) and trains one epoch of a tiny model
    /// into `root/ckpt`.
    pub(crate) fn train_tiny_checkpoint(root: &Path) -> TrainConfig {
        let mut rows: Vec<ManifestRow> = (0..10)
            .map(|i| ManifestRow::text(format!("text_{i}"), "calm day", "Normal"))
            .collect();
        rows.extend((10..15).map(|i| ManifestRow::text(format!("text_{i}"), "tense night", "Anxiety")));
        rows.push(ManifestRow::video("video_0", "v.mp4"));

        let data_dir = root.join("data");
        Manifest::from_rows(rows).unwrap().save(&ManifestPaths::new(&data_dir).unified()).unwrap();

        let cfg = TrainConfig {
            data_dir,
            checkpoint_dir: root.join("ckpt"),
            max_samples:    None,
            max_length:     8,
            batch_size:     4,
            epochs:         1,
            vocab_size:     50,
            d_model:        8,
            num_heads:      2,
            num_layers:     1,
            d_ff:           16,
            ..TrainConfig::default()
        };
        let history = TrainUseCase::new(cfg.clone())
            .execute_on::<Autodiff<NdArray>>(&Default::default())
            .unwrap();
        assert_eq!(history.len(), 1);
        cfg
    }

    fn encoder() -> Arc<TextEncoder> {
        let tok = tokenizer_store::build(&["calm day".to_string()], 20).unwrap();
        Arc::new(TextEncoder::new(tok, 16).unwrap())
    }

    #[test]
    fn test_label_space_covers_all_modalities() {
        let manifest = Manifest::from_rows(vec![
            ManifestRow::text("text_0", "calm", "Normal"),
            ManifestRow::text("text_1", "tense", "Anxiety"),
            ManifestRow::audio("audio_0", "a.wav", "3"),
            ManifestRow::video("video_0", "v.mp4"),
        ])
        .unwrap();
        let cfg = TrainConfig { max_samples: None, ..TrainConfig::default() };

        let (text, model_cfg) = prepare(&cfg, manifest, encoder()).unwrap();
        assert_eq!(text.len(), 2);
        // "-1", "3", "Anxiety", "Normal"
        assert_eq!(model_cfg.num_labels, 4);
        assert_eq!(text.label_ids().unwrap(), vec![3, 2]);
        assert_eq!(model_cfg.max_seq_len, 128);
    }

    #[test]
    fn test_subsample_caps_rows() {
        let rows = (0..10).map(|i| ManifestRow::text(format!("text_{i}"), "calm", "Normal")).collect();
        let cfg  = TrainConfig { max_samples: Some(4), ..TrainConfig::default() };
        let (text, _) = prepare(&cfg, Manifest::from_rows(rows).unwrap(), encoder()).unwrap();
        assert_eq!(text.len(), 4);
    }

    #[test]
    fn test_no_text_rows_is_an_error() {
        let manifest = Manifest::from_rows(vec![ManifestRow::video("video_0", "v.mp4")]).unwrap();
        assert!(prepare(&TrainConfig::default(), manifest, encoder()).is_err());
    }

    #[test]
    fn test_heads_must_divide_d_model() {
        assert!(check_architecture(&TrainConfig::default()).is_ok());

        let uneven = TrainConfig { d_model: 100, num_heads: 8, ..TrainConfig::default() };
        let err = check_architecture(&uneven).unwrap_err();
        assert!(err.to_string().contains("num_heads (8)"));

        let no_heads = TrainConfig { num_heads: 0, ..TrainConfig::default() };
        assert!(check_architecture(&no_heads).is_err());
    }

    #[test]
    fn test_bad_architecture_fails_before_touching_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_dir:       tmp.path().join("data"),
            checkpoint_dir: tmp.path().join("ckpt"),
            d_model:        30,
            num_heads:      4,
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute_on::<Autodiff<NdArray>>(&Default::default());
        assert!(err.is_err());
        assert!(!tmp.path().join("ckpt").exists());
    }

    #[test]
    fn test_training_run_leaves_a_loadable_checkpoint() {
        let tmp  = tempfile::tempdir().unwrap();
        let cfg  = train_tiny_checkpoint(tmp.path());
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        assert!(ckpt.has_model("text_epoch_1"));
        assert!(ckpt.has_model(crate::infra::checkpoint::BASELINE));
        assert_eq!(ckpt.load_config().unwrap().max_length, 8);
        // "-1", "Anxiety", "Normal"
        assert_eq!(ckpt.load_model_config().unwrap().num_labels, 3);
        assert_eq!(ckpt.load_label_map().unwrap().id("Normal"), Some(2));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let cfg  = TrainConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_length, 128);
        assert_eq!(back.max_samples, Some(5000));
    }
}
