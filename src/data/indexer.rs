// ============================================================
// Layer 4 — Per-Modality Indexers and Unified Merge
// ============================================================
// Three scanners turn raw sources into index records:
//
//   TextCorpusIndexer → a labeled text corpus CSV
//                       one record per corpus row: text_<i>
//   AudioDirIndexer   → a directory tree of .wav files named
//                       with the RAVDESS convention
//                       modality-channel-EMOTION-intensity-...
//   VideoDirIndexer   → a directory tree of video files,
//                       unlabeled
//
// `unify` merges the three record lists into the unified
// manifest schema: all text rows, then audio, then video.
//
// Directory walks are sorted by file name so the same tree
// always produces the same manifest.
//
// Reference: walkdir crate documentation
//            Rust Book §8 (Strings), §13 (Iterators)

use anyhow::{anyhow, Context, Result};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::domain::manifest::{AudioRecord, ManifestRow, TextRecord, VideoRecord};
use crate::domain::traits::Indexer;

/// Extensions accepted by the video indexer (compared lowercase).
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

// ─── Text ─────────────────────────────────────────────────────────────────────
/// Reads a labeled corpus CSV and numbers its rows.
pub struct TextCorpusIndexer {
    corpus:       PathBuf,
    text_column:  String,
    label_column: String,
}

impl TextCorpusIndexer {
    pub fn new(
        corpus:       impl Into<PathBuf>,
        text_column:  impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            corpus:       corpus.into(),
            text_column:  text_column.into(),
            label_column: label_column.into(),
        }
    }
}

impl Indexer for TextCorpusIndexer {
    type Record = TextRecord;

    fn scan(&self) -> Result<Vec<TextRecord>> {
        let mut reader = csv::Reader::from_path(&self.corpus)
            .with_context(|| format!("Cannot open text corpus '{}'", self.corpus.display()))?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                anyhow!("column '{}' not found in '{}'", name, self.corpus.display())
            })
        };
        let text_idx  = column(&self.text_column)?;
        let label_idx = column(&self.label_column)?;

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row.with_context(|| {
                format!("Bad row {} in '{}'", i + 1, self.corpus.display())
            })?;
            let text = row.get(text_idx).unwrap_or_default();
            // an empty cell reads back as a missing text field
            if text.is_empty() {
                tracing::warn!("Skipping corpus row {} with empty text", i + 1);
                continue;
            }
            records.push(TextRecord {
                sample_id: format!("text_{i}"),
                text:      text.to_string(),
                label:     row.get(label_idx).unwrap_or_default().to_string(),
            });
        }

        tracing::info!("Indexed {} text samples", records.len());
        Ok(records)
    }
}

// ─── Audio ────────────────────────────────────────────────────────────────────
/// Walks a directory of `.wav` files and reads the emotion code
/// from each file name.
pub struct AudioDirIndexer {
    root: PathBuf,
}

impl AudioDirIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Emotion code = third hyphen-delimited token of the file name,
/// e.g. `03-01-05-01-02-01-12.wav` → 5.
pub fn parse_emotion_code(file_name: &str) -> Result<i64> {
    let token = file_name
        .split('-')
        .nth(2)
        .ok_or_else(|| anyhow!("malformed audio file name '{file_name}': fewer than 3 '-' tokens"))?;
    token
        .parse::<i64>()
        .with_context(|| format!("malformed audio file name '{file_name}': '{token}' is not an emotion code"))
}

impl Indexer for AudioDirIndexer {
    type Record = AudioRecord;

    fn scan(&self) -> Result<Vec<AudioRecord>> {
        let mut records = Vec::new();
        for path in walk_files(&self.root, &["wav"])? {
            let name = file_name(&path);
            let emotion_id = parse_emotion_code(&name)
                .with_context(|| format!("while indexing '{}'", path.display()))?;
            records.push(AudioRecord { audio_path: path, emotion_id });
        }

        tracing::info!("Indexed {} audio files", records.len());
        Ok(records)
    }
}

// ─── Video ────────────────────────────────────────────────────────────────────
/// Walks a directory of video files.
pub struct VideoDirIndexer {
    root: PathBuf,
}

impl VideoDirIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Indexer for VideoDirIndexer {
    type Record = VideoRecord;

    fn scan(&self) -> Result<Vec<VideoRecord>> {
        let records: Vec<VideoRecord> = walk_files(&self.root, &VIDEO_EXTENSIONS)?
            .into_iter()
            .map(|video_path| VideoRecord { video_path })
            .collect();

        tracing::info!("Indexed {} videos", records.len());
        Ok(records)
    }
}

// ─── Unified merge ────────────────────────────────────────────────────────────
/// Concatenate text, audio, and video records into unified rows.
///
/// Text ids come from the text index; audio and video ids are
/// positional (`audio_<i>`, `video_<i>`). Video rows get the
/// unlabeled sentinel.
pub fn unify(
    text:  &[TextRecord],
    audio: &[AudioRecord],
    video: &[VideoRecord],
) -> Vec<ManifestRow> {
    let mut rows = Vec::with_capacity(text.len() + audio.len() + video.len());

    rows.extend(
        text.iter()
            .map(|r| ManifestRow::text(r.sample_id.clone(), r.text.clone(), r.label.clone())),
    );
    rows.extend(audio.iter().enumerate().map(|(i, r)| {
        ManifestRow::audio(format!("audio_{i}"), r.audio_path.clone(), r.emotion_id.to_string())
    }));
    rows.extend(
        video.iter()
            .enumerate()
            .map(|(i, r)| ManifestRow::video(format!("video_{i}"), r.video_path.clone())),
    );

    rows
}

/// Row counts per modality, for the summary printed after a merge.
pub fn modality_counts(rows: &[ManifestRow]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.modality.to_string()).or_insert(0) += 1;
    }
    counts
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Every regular file under `root` whose extension (lowercased)
/// is in `extensions`, sorted by path.
fn walk_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Cannot walk '{}'", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
