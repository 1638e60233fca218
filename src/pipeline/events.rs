//! Progress events emitted by a running build. Consumers (the CLI today)
//! receive these over a channel and render them however they like.

use std::fmt;

#[derive(Debug)]
pub enum BuildEvent {
    StationStarted { station: String },
    AlbumArtProcessed { station: String, success: bool },
    AlbumArtSkipped { station: String },
    SongAlreadyPresent { station: String, name: String },
    SongMaterialized { station: String, name: String },
    SongFailed { station: String, source: String, error: String },
    StationRendered { station: String, songs: usize },
    StationSkipped { station: String, reason: String },
    Finished { success: bool, error: Option<String> },
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StationStarted { station } => {
                write!(f, "processing station '{station}'")
            }
            Self::AlbumArtProcessed { station, success: true } => {
                write!(f, "[{station}] album art converted")
            }
            Self::AlbumArtProcessed { station, success: false } => {
                write!(f, "[{station}] album art could not be converted")
            }
            Self::AlbumArtSkipped { station } => {
                write!(f, "[{station}] no album art to process")
            }
            Self::SongAlreadyPresent { station, name } => {
                write!(f, "[{station}] '{name}' already present, skipping")
            }
            Self::SongMaterialized { station, name } => {
                write!(f, "[{station}] '{name}' ready")
            }
            Self::SongFailed { station, source, error } => {
                write!(f, "[{station}] failed to process '{source}': {error}")
            }
            Self::StationRendered { station, songs } => {
                write!(f, "[{station}] wrote station files ({songs} songs)")
            }
            Self::StationSkipped { station, reason } => {
                write!(f, "[{station}] skipped: {reason}")
            }
            Self::Finished { success: true, .. } => write!(f, "build finished"),
            Self::Finished { success: false, error } => match error {
                Some(e) => write!(f, "build failed: {e}"),
                None => write!(f, "build finished with errors"),
            },
        }
    }
}
