//! Video encoding
//!
//! Turns an ordered frame sequence into an H.264 MP4 artifact. The
//! production implementation feeds raw RGBA frames to an `ffmpeg`
//! subprocess over stdin; the trait keeps the recorder testable without
//! one.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::capture::frame::Frame;

/// Encoding failures
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("no frames captured")]
    EmptyCapture,
}

/// Encodes captured frames into a video artifact
pub trait VideoEncoder: Send + Sync {
    /// Write `frames` to `output` at a fixed playback rate
    fn encode(&self, frames: &[Frame], fps: u32, output: &Path) -> Result<(), EncodeError>;
}

/// ffmpeg-subprocess encoder: rawvideo RGBA on stdin, libx264 MP4 out
pub struct FfmpegEncoder;

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, frames: &[Frame], fps: u32, output: &Path) -> Result<(), EncodeError> {
        let first = frames.first().ok_or(EncodeError::EmptyCapture)?;
        let (width, height) = (first.width, first.height);

        let mut process = Command::new("ffmpeg")
            .args([
                "-y",
                "-f",
                "rawvideo",
                "-pixel_format",
                "rgba",
                "-video_size",
                &format!("{width}x{height}"),
                "-framerate",
                &fps.to_string(),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                "18",
                "-movflags",
                "+faststart",
                &output.to_string_lossy(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EncodeError::Ffmpeg(format!("failed to start ffmpeg: {e}")))?;

        let mut written = 0usize;
        {
            let stdin = process
                .stdin
                .as_mut()
                .ok_or_else(|| EncodeError::Ffmpeg("failed to open ffmpeg stdin".to_string()))?;

            for frame in frames {
                if frame.width != width || frame.height != height {
                    tracing::warn!(
                        "skipping frame with mismatched size {}x{}",
                        frame.width,
                        frame.height
                    );
                    continue;
                }
                stdin.write_all(&frame.data)?;
                written += 1;
            }
        }

        // Close stdin to signal EOF, then wait for ffmpeg to finish.
        drop(process.stdin.take());
        let result = process.wait_with_output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(EncodeError::Ffmpeg(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        tracing::info!(
            frames = written,
            fps,
            output = %output.display(),
            "video artifact written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_capture_is_rejected_before_spawning() {
        let result = FfmpegEncoder.encode(&[], 10, Path::new("/tmp/never-written.mp4"));
        assert!(matches!(result, Err(EncodeError::EmptyCapture)));
    }
}
