// ============================================================
// Layer 3 — Manifest Domain Types
// ============================================================
// A manifest is a CSV table describing where each sample's
// content lives and what its label is.
//
// There are four manifests in the pipeline:
//
//   text_index.csv     sample_id,text,label
//   audio_index.csv    audio_path,emotion_id
//   video_index.csv    video_path
//   unified_index.csv  id,modality,text,audio_path,video_path,label
//
// The unified row keeps exactly one content column filled in,
// selected by its modality. Empty CSV cells map to `None`.
//
// Reference: Rust Book §6 (Enums), serde derive documentation

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::{Path, PathBuf}, str::FromStr};

/// Label written for rows that carry no ground truth (videos).
pub const UNLABELED: &str = "-1";

// ─── Modality ─────────────────────────────────────────────────────────────────
/// The content type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
    Video,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Audio, Modality::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text  => "text",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text"  => Ok(Modality::Text),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            other   => bail!("unknown modality '{other}' (expected text, audio or video)"),
        }
    }
}

// ─── Per-modality index records ───────────────────────────────────────────────

/// One row of `text_index.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub sample_id: String,
    pub text:      String,
    pub label:     String,
}

/// One row of `audio_index.csv`.
/// `emotion_id` is the third hyphen-delimited token of the file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecord {
    pub audio_path: PathBuf,
    pub emotion_id: i64,
}

/// One row of `video_index.csv`. Videos are unlabeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_path: PathBuf,
}

// ─── ManifestRow ──────────────────────────────────────────────────────────────
/// One row of the unified manifest.
///
/// Invariant: exactly one of `text`, `audio_path`, `video_path`
/// is `Some`, and it is the one matching `modality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub id:         String,
    pub modality:   Modality,
    pub text:       Option<String>,
    pub audio_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
    pub label:      String,
}

/// Borrowed view of the single content field of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowContent<'a> {
    Text(&'a str),
    Audio(&'a Path),
    Video(&'a Path),
}

impl ManifestRow {
    pub fn text(id: impl Into<String>, text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id:         id.into(),
            modality:   Modality::Text,
            text:       Some(text.into()),
            audio_path: None,
            video_path: None,
            label:      label.into(),
        }
    }

    pub fn audio(id: impl Into<String>, path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            id:         id.into(),
            modality:   Modality::Audio,
            text:       None,
            audio_path: Some(path.into()),
            video_path: None,
            label:      label.into(),
        }
    }

    pub fn video(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id:         id.into(),
            modality:   Modality::Video,
            text:       None,
            audio_path: None,
            video_path: Some(path.into()),
            label:      UNLABELED.to_string(),
        }
    }

    /// Check the one-content-field invariant.
    pub fn validate(&self) -> Result<()> {
        let filled = [
            self.text.is_some(),
            self.audio_path.is_some(),
            self.video_path.is_some(),
        ];
        let expected = match self.modality {
            Modality::Text  => [true, false, false],
            Modality::Audio => [false, true, false],
            Modality::Video => [false, false, true],
        };
        if filled != expected {
            bail!(
                "row '{}' ({}) must carry only its {} field (text={}, audio_path={}, video_path={})",
                self.id, self.modality, self.modality,
                filled[0], filled[1], filled[2],
            );
        }
        Ok(())
    }

    /// The content field selected by `modality`, if the row is valid.
    pub fn content(&self) -> Option<RowContent<'_>> {
        match self.modality {
            Modality::Text  => self.text.as_deref().map(RowContent::Text),
            Modality::Audio => self.audio_path.as_deref().map(RowContent::Audio),
            Modality::Video => self.video_path.as_deref().map(RowContent::Video),
        }
    }

    pub fn is_unlabeled(&self) -> bool {
        self.label == UNLABELED
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_fill_exactly_one_field() {
        let rows = [
            ManifestRow::text("text_0", "hello", "Normal"),
            ManifestRow::audio("audio_0", "a/03-01-05-01.wav", "5"),
            ManifestRow::video("video_0", "v/clip.mp4"),
        ];
        for row in &rows {
            assert!(row.validate().is_ok());
            let filled = [row.text.is_some(), row.audio_path.is_some(), row.video_path.is_some()];
            assert_eq!(filled.iter().filter(|&&f| f).count(), 1);
        }
    }

    #[test]
    fn test_validate_rejects_mismatched_field() {
        let mut row = ManifestRow::text("text_0", "hello", "Normal");
        row.audio_path = Some(PathBuf::from("x.wav"));
        assert!(row.validate().is_err());

        let mut row = ManifestRow::audio("audio_0", "x.wav", "3");
        row.audio_path = None;
        row.text = Some("oops".into());
        assert!(row.validate().is_err());
    }

    #[test]
    fn test_video_rows_are_unlabeled() {
        let row = ManifestRow::video("video_3", "clip.avi");
        assert_eq!(row.label, UNLABELED);
        assert!(row.is_unlabeled());
    }

    #[test]
    fn test_content_matches_modality() {
        let row = ManifestRow::audio("audio_1", "a.wav", "2");
        assert_eq!(row.content(), Some(RowContent::Audio(Path::new("a.wav"))));
    }

    #[test]
    fn test_modality_parse_and_display() {
        for m in Modality::ALL {
            assert_eq!(m.to_string().parse::<Modality>().unwrap(), m);
        }
        assert_eq!(" Video ".parse::<Modality>().unwrap(), Modality::Video);
        assert!("image".parse::<Modality>().is_err());
    }
}
