// ============================================================
// Layer 4 — Video Frame Loading
// ============================================================
// Decodes the first 16 frames of a clip by running the `ffmpeg`
// executable and reading raw RGB24 frames from its stdout:
//
//   ffmpeg -v error -nostdin -i <clip>
//          -frames:v 16
//          -vf scale=224:224:flags=bilinear
//          -f rawvideo -pix_fmt rgb24 pipe:1
//
// Every 224·224·3 bytes of output is one frame; bytes are
// scaled to [0, 1]. The result is tagged: a clip that yields
// no frame becomes `VideoClip::Failed` with the reason, never a
// silent zero tensor.
//
// Reference: ffmpeg rawvideo muxer documentation
//            Rust Book §12 (std::process::Command)

use anyhow::{bail, Context, Result};
use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::domain::sample::{Frame, FrameSequence, VideoClip, CLIP_FRAMES, FRAME_LEN, FRAME_SIZE};
use crate::domain::traits::FrameSource;

/// Frame decoding through an external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    binary: PathBuf,
}

impl FfmpegFrameSource {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for FfmpegFrameSource {
    /// Looks `ffmpeg` up on `PATH`.
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FrameSource for FfmpegFrameSource {
    fn read_frames(&self, path: &Path, max_frames: usize) -> Result<Vec<Frame>> {
        if !path.exists() {
            bail!("video '{}' does not exist", path.display());
        }

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-frames:v", &max_frames.to_string()])
            .args(["-vf", &format!("scale={FRAME_SIZE}:{FRAME_SIZE}:flags=bilinear")])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Cannot run '{}'", self.binary.display()))?;

        let frames = bytes_to_frames(&output.stdout);
        if frames.is_empty() && !output.status.success() {
            bail!(
                "ffmpeg failed on '{}': {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(frames)
    }
}

/// Split packed RGB24 output into normalised frames.
/// A trailing partial frame is dropped.
pub fn bytes_to_frames(bytes: &[u8]) -> Vec<Frame> {
    bytes
        .chunks_exact(FRAME_LEN)
        .map(|chunk| chunk.iter().map(|&b| b as f32 / 255.0).collect())
        .collect()
}

/// Decode one clip into exactly `CLIP_FRAMES` frames, or a tagged failure.
pub fn load_clip(source: &dyn FrameSource, path: &Path) -> VideoClip {
    let clip = match source.read_frames(path, CLIP_FRAMES) {
        Ok(frames) => match FrameSequence::from_frames(frames) {
            Some(seq) => VideoClip::Decoded(seq),
            None      => VideoClip::Failed(format!("no decodable frames in '{}'", path.display())),
        },
        Err(e) => VideoClip::Failed(format!("{e:#}")),
    };

    if let VideoClip::Failed(reason) = &clip {
        tracing::warn!("Video decode failed: {}", reason);
    }
    clip
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Serves `count` frames whose pixels all equal (i+1)/255.
    struct FakeFrames {
        count: usize,
    }

    impl FrameSource for FakeFrames {
        fn read_frames(&self, _path: &Path, max_frames: usize) -> Result<Vec<Frame>> {
            Ok((0..self.count.min(max_frames))
                .map(|i| vec![(i + 1) as f32 / 255.0; FRAME_LEN])
                .collect())
        }
    }

    struct Broken;

    impl FrameSource for Broken {
        fn read_frames(&self, path: &Path, _max_frames: usize) -> Result<Vec<Frame>> {
            Err(anyhow!("cannot open '{}'", path.display()))
        }
    }

    #[test]
    fn test_twenty_frames_truncate_to_sixteen() {
        let clip = load_clip(&FakeFrames { count: 20 }, Path::new("long.mp4"));
        let VideoClip::Decoded(seq) = clip else { panic!("expected frames") };
        assert_eq!(seq.shape(), [16, 224, 224, 3]);
        assert_eq!(seq.frames()[15][0], 16.0 / 255.0);
    }

    #[test]
    fn test_five_frames_pad_with_last() {
        let clip = load_clip(&FakeFrames { count: 5 }, Path::new("short.mp4"));
        let seq  = clip.into_frames_or_zeros();
        assert_eq!(seq.frames().len(), 16);
        for f in &seq.frames()[4..] {
            assert_eq!(f, &seq.frames()[4]);
        }
        assert_ne!(seq.frames()[3], seq.frames()[4]);
    }

    #[test]
    fn test_zero_frames_is_tagged_failure() {
        let clip = load_clip(&FakeFrames { count: 0 }, Path::new("empty.mp4"));
        assert!(!clip.is_decoded());
        let seq = clip.into_frames_or_zeros();
        assert_eq!(seq.shape(), [16, 224, 224, 3]);
        assert!(seq.is_all_zero());
    }

    #[test]
    fn test_source_error_is_tagged_failure() {
        match load_clip(&Broken, Path::new("gone.avi")) {
            VideoClip::Failed(reason) => assert!(reason.contains("gone.avi")),
            VideoClip::Decoded(_)     => panic!("expected failure"),
        }
    }

    #[test]
    fn test_missing_file_fails_before_spawning() {
        let src = FfmpegFrameSource::new("/nonexistent/ffmpeg");
        let err = src.read_frames(Path::new("/no/such/clip.mp4"), 16).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_bytes_to_frames_scales_and_drops_partial() {
        let mut bytes = vec![255u8; FRAME_LEN];
        bytes.extend(vec![0u8; FRAME_LEN]);
        bytes.extend(vec![7u8; 10]);
        let frames = bytes_to_frames(&bytes);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][0], 1.0);
        assert_eq!(frames[1][FRAME_LEN - 1], 0.0);
    }
}
