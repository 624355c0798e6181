// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence and reporting used by the ML and
// application layers:
//
//   checkpoint.rs      — CompactRecorder weights plus JSON
//                        sidecars (model config, train config,
//                        label map) so evaluation and serving can
//                        rebuild the exact model.
//
//   tokenizer_store.rs — tokenizer.json persistence and the
//                        fixed-length TextEncoder shared by
//                        training, evaluation and serving.
//
//   metrics.rs         — per-epoch loss CSV, classification
//                        report and confusion matrix.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer persistence and text encoding
pub mod tokenizer_store;

/// Training log and evaluation metrics
pub mod metrics;
