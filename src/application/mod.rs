// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One module per CLI command. Each use case takes a plain
// config struct (never clap types), drives the lower layers
// and returns a summary for Layer 1 to print.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - File formats belong to Layer 4 and 6
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// index-text, index-audio, index-video, build-index
pub mod index_use_case;

// One-sample smoke test of the dataset loader
pub mod inspect_use_case;

// Text classifier fine-tuning
pub mod train_use_case;

// Held-out report and confusion matrix
pub mod evaluate_use_case;

// HTTP inference service
pub mod serve_use_case;
