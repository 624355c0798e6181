// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here; the rest of the crate only sees
// TextClassifier, the training and prediction entry points,
// and the backend aliases below.
//
//   model.rs      — transformer encoder text classifier:
//                   token + positional embeddings, N encoder
//                   blocks with padding-masked self-attention,
//                   masked mean pooling, linear head
//
//   trainer.rs    — AdamW fine-tuning loop with per-epoch
//                   checkpoints and a final baseline
//
//   evaluator.rs  — in-order batch prediction over a dataset
//
//   inferencer.rs — single-text Predictor built from a
//                   checkpoint directory
//
// The production backend is Wgpu; WgpuDevice::default() picks
// the best available adapter. Tests run on NdArray.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer encoder text classifier
pub mod model;

/// Training loop with checkpointing
pub mod trainer;

/// Batch prediction for evaluation
pub mod evaluator;

/// Checkpoint-backed single-text predictor
pub mod inferencer;

/// Backend for evaluation and serving.
pub type InferBackend = burn::backend::Wgpu;

/// Backend for training (autodiff over Wgpu).
pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> burn::backend::wgpu::WgpuDevice {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    device
}
