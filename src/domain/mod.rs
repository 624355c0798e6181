// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that define the core
// concepts of the pipeline:
//
//   manifest.rs  — Modality, per-modality index records and the
//                  unified ManifestRow schema
//   label_map.rs — raw label string → dense class id
//   sample.rs    — the materialised per-row content
//                  (token ids, MFCC matrix, video frames)
//   traits.rs    — seams the data layer implements
//                  (indexers, video frame decoding)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Modality tag and manifest row schemas
pub mod manifest;

// Deterministic label → id mapping
pub mod label_map;

// Sample tensor bundles returned by the dataset loader
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
