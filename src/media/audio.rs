//! Audio probing and transcoding via ffprobe/ffmpeg.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("ffmpeg failed: {0}")]
    TranscodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid probe output: {0}")]
    InvalidOutput(String),
}

/// ffprobe JSON output structure (format section only).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe an audio file and return its duration in seconds.
pub async fn probe_duration(path: &Path) -> Result<f64, AudioError> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AudioError::ProbeFailed(stderr.to_string()));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| AudioError::InvalidOutput(format!("JSON parse error: {e}")))?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| AudioError::InvalidOutput("no duration in probe output".to_string()))
}

/// Transcode an audio file to OGG Vorbis at the given VBR quality,
/// dropping `trim_start` seconds from the front.
///
/// The trim is a no-op when it is zero or does not fall inside the clip,
/// so the output length is never negative.
pub async fn transcode_to_ogg(
    input: &Path,
    output: &Path,
    quality: u8,
    trim_start: u32,
    total_duration: f64,
) -> Result<(), AudioError> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(input);
    if trim_start > 0 && f64::from(trim_start) < total_duration {
        debug!("trimming {trim_start}s from the start of {input:?}");
        cmd.args(["-ss", &trim_start.to_string()]);
    }
    cmd.args(["-vn", "-c:a", "libvorbis", "-q:a", &quality.to_string(), "-y"])
        .arg(output)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let result = cmd.output().await?;
    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AudioError::TranscodeFailed(stderr.to_string()));
    }
    Ok(())
}

/// Post-trim duration; saturates at zero when the trim covers the clip.
pub fn trimmed_duration(original: f64, trim_start: u32) -> f64 {
    (original - f64::from(trim_start)).max(0.0)
}
