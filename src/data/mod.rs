// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw files on disk and tensor batches.
//
//   raw corpus / .wav tree / video tree
//       │
//       ▼
//   indexer      → per-modality records, unified rows
//       │
//       ▼
//   manifest     → CSV read/write, immutable Manifest views
//       │
//       ▼
//   dataset      → row → SampleBundle (text | audio | video)
//       │            audio.rs + mfcc.rs   for .wav files
//       │            video.rs             for clips (ffmpeg)
//       ▼
//   splitter     → stratified train/test indices
//       │
//       ▼
//   batcher      → Burn tensors for the text model
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Per-modality indexers and the unified merge
pub mod indexer;

/// Manifest CSV storage and filtering views
pub mod manifest;

/// WAV decoding, resampling and MFCC features
pub mod audio;

/// MFCC computation
pub mod mfcc;

/// Video frame decoding through ffmpeg
pub mod video;

/// Multimodal dataset and Burn text dataset
pub mod dataset;

/// Stratified train/test split
pub mod splitter;

/// Burn Batcher for text samples
pub mod batcher;
