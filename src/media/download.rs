//! Remote audio fetching via yt-dlp: metadata lookup and best-audio
//! download into a scoped temporary location.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("metadata fetch failed: {0}")]
    MetadataFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid downloader output: {0}")]
    InvalidOutput(String),
}

/// Subset of the yt-dlp `-j` dump we care about.
#[derive(Debug, Deserialize)]
pub struct RemoteMetadata {
    pub title: String,
    /// Total clip length in seconds.
    #[serde(default)]
    pub duration: f64,
}

/// Resolve title and duration for a remote source.
pub async fn fetch_metadata(url: &str) -> Result<RemoteMetadata, DownloadError> {
    let output = Command::new("yt-dlp")
        .args(["-j", "--no-playlist", url])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DownloadError::MetadataFailed(stderr.to_string()));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| DownloadError::InvalidOutput(format!("JSON parse error: {e}")))
}

/// Download the highest-available-bitrate audio-only stream.
///
/// `template` is a yt-dlp output template (it may contain `%(ext)s`, since
/// the source container is not known up front); the path of the file that
/// was actually written is returned.
pub async fn download_audio(url: &str, template: &Path) -> Result<PathBuf, DownloadError> {
    if let Some(parent) = template.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let output = Command::new("yt-dlp")
        .args(["-f", "bestaudio/best", "--no-playlist", "--no-progress"])
        .arg("-o")
        .arg(template)
        .args(["--no-simulate", "--print", "after_move:filepath"])
        .arg(url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DownloadError::DownloadFailed(stderr.to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = stdout
        .lines()
        .last()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            DownloadError::InvalidOutput("downloader did not report an output file".to_string())
        })?;

    debug!("downloaded {url} to {path:?}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_parsing_ignores_extra_fields() {
        let json = r#"{
            "id": "abc123",
            "title": "Test Song MV",
            "duration": 180.0,
            "uploader": "someone"
        }"#;
        let meta: RemoteMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title, "Test Song MV");
        assert_eq!(meta.duration, 180.0);
    }

    #[test]
    fn test_metadata_duration_defaults_to_zero() {
        let meta: RemoteMetadata = serde_json::from_str(r#"{ "title": "x" }"#).unwrap();
        assert_eq!(meta.duration, 0.0);
    }
}
