// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per pipeline stage:
//
//   index-text   → text_index.csv
//   index-audio  → audio_index.csv
//   index-video  → video_index.csv
//   build-index  → unified_index.csv
//   inspect      → print one loaded sample
//   train        → fine-tune the text classifier
//   evaluate     → report on a held-out split
//   serve        → HTTP inference service
//
// Every Args struct converts into its application-layer
// config with `From`, so Layer 2 never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::{net::SocketAddr, path::PathBuf};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    index_use_case::{IndexDirConfig, IndexTextConfig},
    inspect_use_case::InspectConfig,
    serve_use_case::ServeConfig,
    train_use_case::TrainConfig,
};
use crate::domain::sample::DatasetMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a labelled text corpus CSV
    IndexText(IndexTextArgs),

    /// Index a directory tree of emotion-coded .wav files
    IndexAudio(IndexDirArgs),

    /// Index a directory tree of .mp4/.avi/.mov/.mkv files
    IndexVideo(IndexDirArgs),

    /// Merge the three per-modality indexes into one manifest
    BuildIndex(BuildIndexArgs),

    /// Load one sample from the unified manifest and describe it
    Inspect(InspectArgs),

    /// Fine-tune the text classifier on the manifest's text rows
    Train(TrainArgs),

    /// Score a checkpoint on a stratified held-out split
    Evaluate(EvaluateArgs),

    /// Serve text predictions over HTTP
    Serve(ServeArgs),
}

// ─── Indexing ─────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct IndexTextArgs {
    /// Corpus CSV with one text column and one label column
    #[arg(long)]
    pub corpus: PathBuf,

    #[arg(long, default_value = "text")]
    pub text_column: String,

    #[arg(long, default_value = "status")]
    pub label_column: String,

    /// Root data directory; the index goes to <data-dir>/metadata
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

impl From<IndexTextArgs> for IndexTextConfig {
    fn from(a: IndexTextArgs) -> Self {
        IndexTextConfig {
            corpus:       a.corpus,
            text_column:  a.text_column,
            label_column: a.label_column,
            data_dir:     a.data_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct IndexDirArgs {
    /// Directory to scan recursively
    #[arg(long)]
    pub root: PathBuf,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

impl From<IndexDirArgs> for IndexDirConfig {
    fn from(a: IndexDirArgs) -> Self {
        IndexDirConfig { root: a.root, data_dir: a.data_dir }
    }
}

#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

// ─── Inspect ──────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Where a trained tokenizer.json may be found
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// text | audio | video | all
    #[arg(long, default_value = "all")]
    pub mode: DatasetMode,

    /// Row of the unified manifest to load
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    #[arg(long, default_value_t = 128)]
    pub max_length: usize,
}

impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            mode:           a.mode,
            index:          a.index,
            max_length:     a.max_length,
            ..InspectConfig::default()
        }
    }
}

// ─── Train ────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for checkpoints, tokenizer and configs
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Pretrained tokenizer.json to use instead of building one
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Model record (path without .mpk) to start from
    #[arg(long)]
    pub base_checkpoint: Option<PathBuf>,

    /// Random subset of text rows to train on
    #[arg(long, default_value_t = 5000)]
    pub max_samples: usize,

    /// Train on every text row (ignores --max-samples)
    #[arg(long)]
    pub all_samples: bool,

    /// Tokens per input; shorter texts are padded, longer truncated
    #[arg(long, default_value_t = 128)]
    pub max_length: usize,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.0)]
    pub weight_decay: f32,

    /// Seed for subsampling and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Upper bound on the built vocabulary, special tokens included
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Hidden size; must be divisible by --num-heads
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            checkpoint_dir:  a.checkpoint_dir,
            tokenizer:       a.tokenizer,
            base_checkpoint: a.base_checkpoint,
            max_samples:     (!a.all_samples).then_some(a.max_samples),
            max_length:      a.max_length,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            weight_decay:    a.weight_decay,
            seed:            a.seed,
            vocab_size:      a.vocab_size,
            d_model:         a.d_model,
            num_heads:       a.num_heads,
            num_layers:      a.num_layers,
            d_ff:            a.d_ff,
            dropout:         a.dropout,
        }
    }
}

// ─── Evaluate ─────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Checkpoint name inside --checkpoint-dir
    #[arg(long, default_value = "text_baseline")]
    pub checkpoint: String,

    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            checkpoint:     a.checkpoint,
            test_fraction:  a.test_fraction,
            seed:           a.seed,
            batch_size:     a.batch_size,
        }
    }
}

// ─── Serve ────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, default_value = "text_baseline")]
    pub checkpoint: String,

    #[arg(long, default_value = "127.0.0.1:8000")]
    pub address: SocketAddr,

    /// The single browser origin allowed by CORS
    #[arg(long, default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Name reported by GET /
    #[arg(long, default_value = "Multimodal Text Classifier")]
    pub model_name: String,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            checkpoint_dir: a.checkpoint_dir,
            checkpoint:     a.checkpoint,
            address:        a.address,
            cors_origin:    a.cors_origin,
            model_name:     a.model_name,
        }
    }
}
