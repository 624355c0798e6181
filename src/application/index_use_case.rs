// ============================================================
// Layer 2 — Index Use Cases
// ============================================================
// The four indexing commands:
//
//   index-text   corpus CSV        → metadata/text_index.csv
//   index-audio  .wav tree         → metadata/audio_index.csv
//   index-video  video tree        → metadata/video_index.csv
//   build-index  the three above   → metadata/unified_index.csv
//
// Each returns a small summary the CLI prints.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::data::{
    indexer::{modality_counts, unify, AudioDirIndexer, TextCorpusIndexer, VideoDirIndexer},
    manifest::{read_csv, write_csv, Manifest, ManifestPaths},
};
use crate::domain::{
    manifest::{AudioRecord, Modality, TextRecord, VideoRecord},
    traits::Indexer,
};

// ─── Configs ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct IndexTextConfig {
    pub corpus:       PathBuf,
    pub text_column:  String,
    pub label_column: String,
    pub data_dir:     PathBuf,
}

/// Shared by the audio and video indexers.
#[derive(Debug, Clone)]
pub struct IndexDirConfig {
    pub root:     PathBuf,
    pub data_dir: PathBuf,
}

/// What an indexing command wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub rows:   usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedSummary {
    pub rows:      usize,
    pub unlabeled: usize,
    pub counts:    HashMap<String, usize>,
    pub output:    PathBuf,
}

// ─── Per-modality ─────────────────────────────────────────────────────────────

fn run_indexer<I>(indexer: &I, output: PathBuf) -> Result<IndexSummary>
where
    I: Indexer,
    I::Record: serde::Serialize,
{
    let records = indexer.scan()?;
    write_csv(&output, &records)?;
    tracing::info!("Saved {} rows to '{}'", records.len(), output.display());
    Ok(IndexSummary { rows: records.len(), output })
}

pub fn index_text(cfg: &IndexTextConfig) -> Result<IndexSummary> {
    let indexer = TextCorpusIndexer::new(&cfg.corpus, &cfg.text_column, &cfg.label_column);
    run_indexer(&indexer, ManifestPaths::new(&cfg.data_dir).text())
}

pub fn index_audio(cfg: &IndexDirConfig) -> Result<IndexSummary> {
    run_indexer(&AudioDirIndexer::new(&cfg.root), ManifestPaths::new(&cfg.data_dir).audio())
}

pub fn index_video(cfg: &IndexDirConfig) -> Result<IndexSummary> {
    run_indexer(&VideoDirIndexer::new(&cfg.root), ManifestPaths::new(&cfg.data_dir).video())
}

// ─── Unified ──────────────────────────────────────────────────────────────────

pub fn build_unified(data_dir: &Path) -> Result<UnifiedSummary> {
    let paths = ManifestPaths::new(data_dir);

    let text: Vec<TextRecord>   = read_csv(&paths.text()).context("Run 'index-text' first")?;
    let audio: Vec<AudioRecord> = read_csv(&paths.audio()).context("Run 'index-audio' first")?;
    let video: Vec<VideoRecord> = read_csv(&paths.video()).context("Run 'index-video' first")?;

    let manifest = Manifest::from_rows(unify(&text, &audio, &video))?;
    let output   = paths.unified();
    manifest.save(&output)?;

    let unlabeled = manifest.rows().iter().filter(|r| r.is_unlabeled()).count();
    tracing::info!(
        "Unified index: {} text, {} audio, {} video",
        manifest.count(Modality::Text),
        manifest.count(Modality::Audio),
        manifest.count(Modality::Video),
    );

    Ok(UnifiedSummary {
        rows: manifest.len(),
        unlabeled,
        counts: modality_counts(manifest.rows()),
        output,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_full_indexing_pipeline() {
        let tmp  = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");

        let corpus = tmp.path().join("corpus.csv");
        fs::write(&corpus, "text,status\nfeeling fine,Normal\ncan't sleep,Insomnia\n").unwrap();

        let audio_root = tmp.path().join("audio/Actor_01");
        fs::create_dir_all(&audio_root).unwrap();
        fs::write(audio_root.join("03-01-05-01-02-01-01.wav"), b"").unwrap();

        let video_root = tmp.path().join("video");
        fs::create_dir_all(&video_root).unwrap();
        fs::write(video_root.join("a.mp4"), b"").unwrap();
        fs::write(video_root.join("b.avi"), b"").unwrap();

        let t = index_text(&IndexTextConfig {
            corpus,
            text_column:  "text".into(),
            label_column: "status".into(),
            data_dir:     data.clone(),
        })
        .unwrap();
        assert_eq!(t.rows, 2);

        let a = index_audio(&IndexDirConfig { root: tmp.path().join("audio"), data_dir: data.clone() }).unwrap();
        assert_eq!(a.rows, 1);
        let v = index_video(&IndexDirConfig { root: video_root, data_dir: data.clone() }).unwrap();
        assert_eq!(v.rows, 2);

        let u = build_unified(&data).unwrap();
        assert_eq!(u.rows, 5);
        assert_eq!(u.unlabeled, 2);
        assert_eq!(u.counts["text"], 2);

        let manifest = Manifest::load(&u.output).unwrap();
        assert_eq!(manifest.rows()[2].label, "5");
        assert_eq!(manifest.rows()[4].id, "video_1");
    }

    #[test]
    fn test_unified_needs_all_three_manifests() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build_unified(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("index-text"));
    }
}
