// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder,
// plus the JSON sidecars needed to rebuild the model later.
//
// Layout of a checkpoint directory:
//
//   checkpoints/
//     text_epoch_1.mpk      ← weights after epoch 1
//     text_epoch_2.mpk
//     ...
//     text_baseline.mpk     ← weights after the last epoch
//     model_config.json     ← TextClassifierConfig (architecture)
//     train_config.json     ← the run's TrainConfig
//     label_map.json        ← raw label → class id
//     tokenizer.json        ← written by TokenizerStore
//     metrics.csv           ← written by MetricsLogger
//
// CompactRecorder serialises parameters to half-precision
// MessagePack; loading fails if the architecture differs.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{anyhow, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::label_map::LabelMap;
use crate::ml::model::{TextClassifier, TextClassifierConfig};

/// Name of the checkpoint written after the final epoch.
pub const BASELINE: &str = "text_baseline";

const MODEL_CONFIG: &str = "model_config.json";
const TRAIN_CONFIG: &str = "train_config.json";
const LABEL_MAP:    &str = "label_map.json";

/// Extension CompactRecorder appends to a record path.
pub const RECORD_EXTENSION: &str = "mpk";

/// Per-epoch checkpoint name, e.g. `text_epoch_3`.
pub fn epoch_name(epoch: usize) -> String {
    format!("text_epoch_{epoch}")
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Does not touch the filesystem; directories are created on save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a named record, without the `.mpk` extension
    /// (the recorder adds it).
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.dir.join(format!("{name}.{RECORD_EXTENSION}")).exists()
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))
    }

    // ─── Weights ──────────────────────────────────────────────────────────────

    pub fn save_model<B: Backend>(&self, model: &TextClassifier<B>, name: &str) -> Result<()> {
        self.ensure_dir()?;
        let path = self.model_path(name);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(())
    }

    pub fn load_model<B: Backend>(
        &self,
        model:  TextClassifier<B>,
        name:   &str,
        device: &B::Device,
    ) -> Result<TextClassifier<B>> {
        load_model_from(model, &self.model_path(name), device)
            .context("Have you run 'train' first?")
    }

    // ─── Sidecars ─────────────────────────────────────────────────────────────

    pub fn save_model_config(&self, cfg: &TextClassifierConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(MODEL_CONFIG);
        cfg.save(&path)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<TextClassifierConfig> {
        let path = self.dir.join(MODEL_CONFIG);
        TextClassifierConfig::load(&path)
            .map_err(|e| anyhow!("Cannot read model config '{}': {e}", path.display()))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        write_json(&self.dir, TRAIN_CONFIG, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        read_json(&self.dir.join(TRAIN_CONFIG))
    }

    pub fn save_label_map(&self, map: &LabelMap) -> Result<()> {
        write_json(&self.dir, LABEL_MAP, map)
    }

    pub fn load_label_map(&self) -> Result<LabelMap> {
        read_json(&self.dir.join(LABEL_MAP))
    }
}

/// Load a CompactRecorder record from an explicit path (no extension).
pub fn load_model_from<B: Backend>(
    model:  TextClassifier<B>,
    path:   &Path,
    device: &B::Device,
) -> Result<TextClassifier<B>> {
    let record = CompactRecorder::new()
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
    tracing::info!("Loaded weights from '{}'", path.display());
    Ok(model.load_record(record))
}

fn write_json<T: serde::Serialize>(dir: &Path, file: &str, value: &T) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Cannot create '{}'", dir.display()))?;
    let path = dir.join(file);
    fs::write(&path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).with_context(|| {
        format!("Cannot read '{}'. Have you run 'train' first?", path.display())
    })?;
    serde_json::from_str(&json).with_context(|| format!("Invalid JSON in '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, record::FileRecorder};

    fn tiny_config() -> TextClassifierConfig {
        TextClassifierConfig::new(20, 8, 3)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(32)
    }

    #[test]
    fn test_epoch_names() {
        assert_eq!(epoch_name(1), "text_epoch_1");
        assert_eq!(BASELINE, "text_baseline");
    }

    #[test]
    fn test_record_extension_matches_recorder() {
        assert_eq!(<CompactRecorder as FileRecorder<NdArray>>::file_extension(), RECORD_EXTENSION);
    }

    #[test]
    fn test_saved_record_is_found_by_name() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let model: TextClassifier<NdArray> = tiny_config().init(&Default::default());
        ckpt.save_model(&model, BASELINE).unwrap();

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec![format!("{BASELINE}.{RECORD_EXTENSION}")]);
        assert!(ckpt.has_model(BASELINE));
    }

    #[test]
    fn test_weights_roundtrip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().join("ckpt"));
        let device = Default::default();

        let model: TextClassifier<NdArray> = tiny_config().init(&device);
        ckpt.save_model(&model, BASELINE).unwrap();
        assert!(ckpt.has_model(BASELINE));
        assert!(!ckpt.has_model("text_epoch_9"));

        let fresh: TextClassifier<NdArray> = tiny_config().init(&device);
        let loaded = ckpt.load_model(fresh, BASELINE, &device).unwrap();
        let a: Vec<f32> = model.classifier.weight.val().into_data().iter::<f32>().collect();
        let b: Vec<f32> = loaded.classifier.weight.val().into_data().iter::<f32>().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let model: TextClassifier<NdArray> = tiny_config().init(&Default::default());
        let err = ckpt.load_model(model, BASELINE, &Default::default()).unwrap_err();
        assert!(format!("{err:#}").contains("train"));
    }

    #[test]
    fn test_sidecars_roundtrip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());

        ckpt.save_model_config(&tiny_config()).unwrap();
        let cfg = ckpt.load_model_config().unwrap();
        assert_eq!(cfg.num_labels, 3);
        assert_eq!(cfg.d_model, 16);

        let map = LabelMap::from_labels(["sad", "happy"]);
        ckpt.save_label_map(&map).unwrap();
        assert_eq!(ckpt.load_label_map().unwrap(), map);

        assert!(ckpt.load_config().is_err());
    }
}
