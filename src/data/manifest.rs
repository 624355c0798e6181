// ============================================================
// Layer 4 — Manifest Storage
// ============================================================
// Reads and writes manifest CSV files with the `csv` crate and
// serde, and holds a loaded unified manifest as an immutable,
// cheaply clonable table.
//
// File layout under the data directory:
//
//   <data-dir>/metadata/text_index.csv
//   <data-dir>/metadata/audio_index.csv
//   <data-dir>/metadata/video_index.csv
//   <data-dir>/metadata/unified_index.csv
//
// Filtering never mutates a loaded manifest. Every filter
// returns a new `Manifest` handle over the selected rows.
//
// Reference: csv crate documentation (Serde support)
//            Rust Book §15 (Rc/Arc smart pointers)

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::domain::manifest::{ManifestRow, Modality};

// ─── Paths ────────────────────────────────────────────────────────────────────
/// Fixed manifest locations relative to a data directory.
#[derive(Debug, Clone)]
pub struct ManifestPaths {
    metadata_dir: PathBuf,
}

impl ManifestPaths {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { metadata_dir: data_dir.as_ref().join("metadata") }
    }

    pub fn text(&self) -> PathBuf {
        self.metadata_dir.join("text_index.csv")
    }

    pub fn audio(&self) -> PathBuf {
        self.metadata_dir.join("audio_index.csv")
    }

    pub fn video(&self) -> PathBuf {
        self.metadata_dir.join("video_index.csv")
    }

    pub fn unified(&self) -> PathBuf {
        self.metadata_dir.join("unified_index.csv")
    }
}

// ─── CSV helpers ──────────────────────────────────────────────────────────────

/// Deserialize every row of a headered CSV file.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open manifest '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<T>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let row: T = record
            .with_context(|| format!("Bad row at line {} of '{}'", i + 2, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write rows as a headered CSV file, creating parent directories.
///
/// An empty slice still produces a file; the csv writer can only
/// emit a serde header once it sees a row, so it is header-less.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} rows to '{}'", rows.len(), path.display());
    Ok(())
}

// ─── Manifest ─────────────────────────────────────────────────────────────────
/// An immutable, validated unified manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    rows: Arc<[ManifestRow]>,
}

impl Manifest {
    /// Build from rows, checking the one-content-field invariant.
    pub fn from_rows(rows: Vec<ManifestRow>) -> Result<Self> {
        for row in &rows {
            row.validate()?;
        }
        Ok(Self { rows: rows.into() })
    }

    /// Load `unified_index.csv` (or any file with the same schema).
    pub fn load(path: &Path) -> Result<Self> {
        let rows: Vec<ManifestRow> = read_csv(path)?;
        let manifest = Self::from_rows(rows)
            .with_context(|| format!("Invalid manifest '{}'", path.display()))?;
        tracing::info!("Loaded {} manifest rows from '{}'", manifest.len(), path.display());
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_csv(path, &self.rows)
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&ManifestRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, modality: Modality) -> usize {
        self.rows.iter().filter(|r| r.modality == modality).count()
    }

    /// New manifest with the rows matching `keep`, in order.
    pub fn filter(&self, keep: impl Fn(&ManifestRow) -> bool) -> Self {
        let rows: Vec<ManifestRow> = self.rows.iter().filter(|r| keep(r)).cloned().collect();
        Self { rows: rows.into() }
    }

    pub fn filter_modality(&self, modality: Modality) -> Self {
        self.filter(|r| r.modality == modality)
    }

    /// New manifest with the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut rows = Vec::with_capacity(indices.len());
        for &i in indices {
            match self.rows.get(i) {
                Some(row) => rows.push(row.clone()),
                None => bail!("row index {i} out of range ({} rows)", self.len()),
            }
        }
        Ok(Self { rows: rows.into() })
    }

    /// Random sample of `n` rows without replacement, reproducible
    /// for a fixed `seed`. Asking for more rows than exist returns
    /// every row in shuffled order.
    pub fn subsample(&self, n: usize, seed: u64) -> Self {
        if n > self.len() {
            tracing::warn!(
                "Requested {} samples but only {} rows are available; using all of them",
                n, self.len()
            );
        }
        let mut rng     = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut rng);
        indices.truncate(n);

        let rows: Vec<ManifestRow> = indices.iter().map(|&i| self.rows[i].clone()).collect();
        Self { rows: rows.into() }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::TextRecord;

    fn sample_manifest() -> Manifest {
        Manifest::from_rows(vec![
            ManifestRow::text("text_0", "I feel fine, thanks", "Normal"),
            ManifestRow::text("text_1", "line one\nline two", "Anxiety"),
            ManifestRow::audio("audio_0", "raw/03-01-05-01-02-01-12.wav", "5"),
            ManifestRow::video("video_0", "raw/clip.mp4"),
        ])
        .unwrap()
    }

    #[test]
    fn test_unified_csv_layout() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("unified_index.csv");
        sample_manifest().save(&path).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,modality,text,audio_path,video_path,label"));
        assert!(csv.contains("video_0,video,,,raw/clip.mp4,-1"));
        assert!(csv.contains("audio_0,audio,,raw/03-01-05-01-02-01-12.wav,,5"));
    }

    #[test]
    fn test_load_restores_rows_and_nulls() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("unified_index.csv");
        let original = sample_manifest();
        original.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.rows(), original.rows());
        for row in loaded.rows() {
            let filled = [row.text.is_some(), row.audio_path.is_some(), row.video_path.is_some()];
            assert_eq!(filled.iter().filter(|&&f| f).count(), 1);
        }
    }

    #[test]
    fn test_load_rejects_broken_invariant() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "id,modality,text,audio_path,video_path,label\ntext_0,text,,a.wav,,Normal\n",
        )
        .unwrap();
        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Manifest::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("Cannot open manifest"));
    }

    #[test]
    fn test_filter_returns_new_handle() {
        let full = sample_manifest();
        let text = full.filter_modality(Modality::Text);
        assert_eq!(text.len(), 2);
        // the original is untouched
        assert_eq!(full.len(), 4);
        assert_eq!(full.count(Modality::Video), 1);
    }

    #[test]
    fn test_subsample_is_reproducible() {
        let rows: Vec<ManifestRow> = (0..50)
            .map(|i| ManifestRow::text(format!("text_{i}"), "t", "x"))
            .collect();
        let m = Manifest::from_rows(rows).unwrap();

        let a = m.subsample(10, 7);
        let b = m.subsample(10, 7);
        assert_eq!(a.len(), 10);
        assert_eq!(a.rows(), b.rows());
        assert_eq!(m.subsample(500, 7).len(), 50);
    }

    #[test]
    fn test_select_out_of_range() {
        assert!(sample_manifest().select(&[0, 9]).is_err());
        assert_eq!(sample_manifest().select(&[3, 0]).unwrap().rows()[0].id, "video_0");
    }

    #[test]
    fn test_generic_csv_helpers() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/text_index.csv");
        let recs = vec![TextRecord {
            sample_id: "text_0".into(),
            text:      "quoted, \"text\"".into(),
            label:     "Stress".into(),
        }];
        write_csv(&path, &recs).unwrap();
        let back: Vec<TextRecord> = read_csv(&path).unwrap();
        assert_eq!(back, recs);
    }
}
