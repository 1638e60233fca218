//! Media processing: turns one song declaration into one materialized song
//! (download or local transcode), and builds the station's album-art
//! texture. Failures are contained at song granularity so a bad source
//! never aborts the batch.

pub mod album_art;
pub mod audio;
pub mod download;
pub mod texture;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::sanitize::ascii_or_placeholder;
use crate::station::{MaterializedSong, SongDeclaration};
use texture::TextureConverter;

pub use album_art::ArtError;
pub use audio::AudioError;
pub use download::DownloadError;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Art(#[from] ArtError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tunables shared by every conversion in a batch.
#[derive(Clone, Debug)]
pub struct MediaSettings {
    /// Vorbis VBR quality passed to ffmpeg (`-q:a`).
    pub audio_quality: u8,
    /// Bound on each external conversion-tool invocation.
    pub tool_timeout: Duration,
    /// Faceplate overlay composited over the album art when present.
    pub template_path: PathBuf,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            audio_quality: 5,
            tool_timeout: Duration::from_secs(30),
            template_path: PathBuf::from("radio_station_cover_template.png"),
        }
    }
}

/// Display/asset names derived for one song.
#[derive(Debug, PartialEq)]
pub struct DerivedNames {
    pub display_name: String,
    pub english_display: String,
    pub internal_name: String,
}

/// Resolve the three names from whatever the declaration supplies, falling
/// back to the source title (remote) or filename stem (local). The
/// reference name, when present, is always the filename basis.
pub fn derive_names(
    native: Option<&str>,
    reference: Option<&str>,
    fallback_title: &str,
) -> DerivedNames {
    let (display, english, basis) = match (native, reference) {
        (Some(n), Some(r)) => (n, r, r),
        (Some(n), None) => (n, fallback_title, n),
        (None, Some(r)) => (r, r, r),
        (None, None) => (fallback_title, fallback_title, fallback_title),
    };
    DerivedNames {
        display_name: display.to_string(),
        english_display: english.to_string(),
        internal_name: ascii_or_placeholder(basis),
    }
}

/// Processes songs and album art for one station.
pub struct MediaProcessor {
    output_dir: PathBuf,
    station: String,
    settings: MediaSettings,
    converters: Vec<Box<dyn TextureConverter>>,
}

impl MediaProcessor {
    pub fn new(output_dir: &Path, station: &str, settings: MediaSettings) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            station: station.to_string(),
            settings,
            converters: texture::default_converters(),
        }
    }

    fn ogg_path(&self, internal_name: &str) -> PathBuf {
        self.output_dir
            .join("music")
            .join(&self.station)
            .join(format!("{internal_name}.ogg"))
    }

    fn relative_path(&self, internal_name: &str) -> String {
        format!("{}/{internal_name}.ogg", self.station)
    }

    /// Download a remote source and transcode it to the station's OGG.
    pub async fn process_remote(
        &self,
        decl: &SongDeclaration,
    ) -> Result<MaterializedSong, MediaError> {
        info!("fetching metadata for {}", decl.source);
        let meta = download::fetch_metadata(&decl.source).await?;

        let names = derive_names(
            decl.native_name.as_deref(),
            decl.reference_name.as_deref(),
            &meta.title,
        );
        info!(
            "downloading {:?} as {} ({}s total)",
            meta.title, names.internal_name, meta.duration
        );

        let template = self
            .output_dir
            .join("temp")
            .join(format!("{}_temp.%(ext)s", names.internal_name));
        let temp_file = download::download_audio(&decl.source, &template).await?;

        let result = audio::transcode_to_ogg(
            &temp_file,
            &self.ogg_path(&names.internal_name),
            self.settings.audio_quality,
            decl.trim_start,
            meta.duration,
        )
        .await;

        // The temp download is removed whether or not the encode worked.
        if temp_file.exists() {
            if let Err(e) = std::fs::remove_file(&temp_file) {
                warn!("failed to remove temp file {temp_file:?}: {e}");
            }
        }
        result?;

        Ok(MaterializedSong {
            declaration: decl.clone(),
            file_path: self.relative_path(&names.internal_name),
            duration: audio::trimmed_duration(meta.duration, decl.trim_start),
            original_duration: meta.duration,
            original_title: meta.title,
            internal_name: names.internal_name,
            display_name: names.display_name,
            english_display: names.english_display,
        })
    }

    /// Transcode a local audio file to the station's OGG. Both names are
    /// required by the declaration contract; the filename stem is only a
    /// safety net.
    pub async fn process_local(
        &self,
        decl: &SongDeclaration,
    ) -> Result<MaterializedSong, MediaError> {
        let source = Path::new(&decl.source);
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| decl.source.clone());
        let stem = source
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        let names = derive_names(
            decl.native_name.as_deref(),
            decl.reference_name.as_deref(),
            &stem,
        );

        info!("converting local file {file_name} as {}", names.internal_name);
        let original_duration = audio::probe_duration(source).await?;

        audio::transcode_to_ogg(
            source,
            &self.ogg_path(&names.internal_name),
            self.settings.audio_quality,
            decl.trim_start,
            original_duration,
        )
        .await?;

        Ok(MaterializedSong {
            declaration: decl.clone(),
            file_path: self.relative_path(&names.internal_name),
            duration: audio::trimmed_duration(original_duration, decl.trim_start),
            original_duration,
            original_title: file_name,
            internal_name: names.internal_name,
            display_name: names.display_name,
            english_display: names.english_display,
        })
    }

    /// Build the station's album-art texture. Never raises; `false` means
    /// the DDS could not be produced (a PNG fallback is left behind).
    pub async fn process_album_art(&self, image_path: &Path) -> bool {
        let gfx_dir = self.output_dir.join("gfx");
        match album_art::process_album_art(
            image_path,
            &gfx_dir,
            &self.station,
            &self.settings.template_path,
            &self.converters,
            self.settings.tool_timeout,
        )
        .await
        {
            Ok(converted) => converted,
            Err(e) => {
                warn!("album art processing failed: {e}");
                false
            }
        }
    }
}
