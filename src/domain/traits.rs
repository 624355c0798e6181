// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The data layer implements these; the application layer only
// sees the traits.
//
//   Indexer     → scans a raw source and yields index records
//                 (text corpus, audio tree, video tree)
//   FrameSource → decodes the first frames of a video file
//                 (ffmpeg in production, in-memory in tests)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::sample::Frame;

// ─── Indexer ──────────────────────────────────────────────────────────────────
/// Any component that can scan a raw per-modality source.
pub trait Indexer {
    /// The CSV row type this indexer emits.
    type Record;

    /// Scan the source and return one record per sample,
    /// in a stable order.
    fn scan(&self) -> Result<Vec<Self::Record>>;
}

// ─── FrameSource ──────────────────────────────────────────────────────────────
/// Any component that can decode video frames.
pub trait FrameSource: Send + Sync {
    /// Decode at most `max_frames` frames from `path`, each already
    /// resized to 224 × 224 × 3 and scaled to [0, 1].
    ///
    /// Returns an empty Vec or an error when nothing can be decoded.
    fn read_frames(&self, path: &Path, max_frames: usize) -> Result<Vec<Frame>>;
}
