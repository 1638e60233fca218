//! Station working-set data model: song declarations, materialized songs
//! and the ordered multi-station working set that round-trips through the
//! session manifest.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::sanitize_station_name;

/// Errors rejected at the declaration boundary, before a song ever reaches
/// the media pipeline.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("empty source locator")]
    EmptySource,

    #[error("volume {0} is outside the allowed range 0.0-1.5")]
    VolumeOutOfRange(f32),

    #[error("weight must be at least 1")]
    ZeroWeight,

    #[error("local source {0:?} requires both a native and a reference name")]
    MissingNames(String),
}

/// Where a song's audio comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Remote,
    Local,
}

pub(crate) fn default_volume() -> f32 {
    0.8
}

fn default_weight() -> u32 {
    1
}

/// User intent for one song, before any processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongDeclaration {
    /// Streaming-video URL or local filesystem path.
    pub source: String,

    /// Localized name shown in-game (e.g. the Korean title).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,

    /// ASCII working name; basis for the output filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_name: Option<String>,

    /// Seconds trimmed from the start of the audio.
    #[serde(default)]
    pub trim_start: u32,

    /// Playback volume, 0.0-1.5.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Relative in-game selection weight.
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default)]
    pub kind: SourceKind,
}

impl SongDeclaration {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            native_name: None,
            reference_name: None,
            trim_start: 0,
            volume: default_volume(),
            weight: default_weight(),
            kind: SourceKind::Remote,
        }
    }

    pub fn validate(&self) -> Result<(), DeclarationError> {
        if self.source.trim().is_empty() {
            return Err(DeclarationError::EmptySource);
        }
        if !(0.0..=1.5).contains(&self.volume) {
            return Err(DeclarationError::VolumeOutOfRange(self.volume));
        }
        if self.weight == 0 {
            return Err(DeclarationError::ZeroWeight);
        }
        if self.kind == SourceKind::Local
            && (self.native_name.is_none() || self.reference_name.is_none())
        {
            return Err(DeclarationError::MissingNames(self.source.clone()));
        }
        Ok(())
    }
}

/// A declaration plus the output-artifact metadata produced by processing.
/// Append-only: once materialized a song is only ever removed by explicit
/// user action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterializedSong {
    #[serde(flatten)]
    pub declaration: SongDeclaration,

    /// ASCII asset key, also the output filename stem.
    pub internal_name: String,

    /// Localized display name.
    pub display_name: String,

    /// English display name.
    pub english_display: String,

    /// Title reported by the source (remote title or local filename).
    pub original_title: String,

    /// Path of the audio file relative to `music/`, e.g.
    /// `my_station/test_song.ogg`.
    pub file_path: String,

    /// Post-trim duration in seconds.
    pub duration: f64,

    pub original_duration: f64,
}

/// One entry in a station's ordered song list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Song {
    Materialized(MaterializedSong),
    Declared(SongDeclaration),
}

impl Song {
    pub fn declaration(&self) -> &SongDeclaration {
        match self {
            Song::Materialized(m) => &m.declaration,
            Song::Declared(d) => d,
        }
    }

    pub fn as_materialized(&self) -> Option<&MaterializedSong> {
        match self {
            Song::Materialized(m) => Some(m),
            Song::Declared(_) => None,
        }
    }
}

/// Per-station state: the ordered song list and the album-art source image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    #[serde(default)]
    pub songs: Vec<Song>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<PathBuf>,
}

/// The full multi-station working set. Station order is declaration order
/// and is preserved across manifest round-trips; names are sanitized and
/// unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkingSet {
    stations: Vec<(String, StationData)>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StationData> {
        self.stations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Get a station by sanitized name, creating an empty one at the end of
    /// the declaration order if it does not exist yet.
    pub fn entry(&mut self, name: &str) -> &mut StationData {
        let sanitized = sanitize_station_name(name);
        if let Some(idx) = self.stations.iter().position(|(n, _)| *n == sanitized) {
            return &mut self.stations[idx].1;
        }
        self.stations.push((sanitized, StationData::default()));
        &mut self.stations.last_mut().expect("just pushed").1
    }

    /// Insert a station under an already-sanitized name, replacing any
    /// previous entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, data: StationData) {
        let name = name.into();
        if let Some(idx) = self.stations.iter().position(|(n, _)| *n == name) {
            self.stations[idx].1 = data;
        } else {
            self.stations.push((name, data));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StationData)> {
        self.stations.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut StationData)> {
        self.stations.iter_mut().map(|(n, d)| (n.as_str(), d))
    }
}
