//! Session manifest: persists the full multi-station working set as
//! `mod_data.json` in the output directory, so a later run can reload and
//! incrementally extend a prior build.

use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::station::{StationData, WorkingSet};

pub const MANIFEST_FILE: &str = "mod_data.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no manifest found at {0:?}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest: {0}")]
    Malformed(String),

    #[error("manifest contains no stations")]
    Empty,
}

/// Serialize the working set to `<dir>/mod_data.json`. Station and song
/// order are written as-is; the file is pretty-printed so it diffs cleanly.
pub fn save(set: &WorkingSet, dir: &Path) -> Result<(), ManifestError> {
    let mut stations = Map::new();
    for (name, data) in set.iter() {
        let value = serde_json::to_value(data)
            .map_err(|e| ManifestError::Malformed(e.to_string()))?;
        stations.insert(name.to_string(), value);
    }
    let root = json!({ "stations": stations });
    let pretty = serde_json::to_string_pretty(&root)
        .map_err(|e| ManifestError::Malformed(e.to_string()))?;
    fs::write(dir.join(MANIFEST_FILE), pretty + "\n")?;
    Ok(())
}

/// Parse `<dir>/mod_data.json` back into a working set.
///
/// Tolerates the legacy shape where a station's songs were stored as a
/// keyed mapping (converted to a list in the mapping's value order, with a
/// warning); any other non-list shape is repaired to an empty list.
pub fn load(dir: &Path) -> Result<WorkingSet, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(ManifestError::NotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let root: Value = serde_json::from_str(&content)
        .map_err(|e| ManifestError::Malformed(e.to_string()))?;

    let stations = root
        .get("stations")
        .and_then(Value::as_object)
        .ok_or_else(|| ManifestError::Malformed("missing 'stations' mapping".to_string()))?;

    let mut set = WorkingSet::new();
    for (name, value) in stations {
        let mut value = value.clone();
        repair_station_value(name, &mut value);
        let data: StationData = serde_json::from_value(value)
            .map_err(|e| ManifestError::Malformed(format!("station {name:?}: {e}")))?;
        set.insert(name.clone(), data);
    }

    if set.is_empty() {
        return Err(ManifestError::Empty);
    }
    Ok(set)
}

fn repair_station_value(name: &str, value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    match obj.get("songs") {
        Some(Value::Array(_)) => {}
        Some(Value::Object(map)) => {
            warn!("station {name:?}: songs stored as a mapping, converting to a list");
            let songs: Vec<Value> = map.values().cloned().collect();
            obj.insert("songs".to_string(), Value::Array(songs));
        }
        _ => {
            warn!("station {name:?}: invalid song collection, substituting an empty list");
            obj.insert("songs".to_string(), Value::Array(Vec::new()));
        }
    }

    // Older manifests used an empty string for "no album art".
    if matches!(obj.get("album_art"), Some(Value::String(s)) if s.is_empty()) {
        obj.remove("album_art");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{MaterializedSong, Song, SongDeclaration, SourceKind, StationData};
    use tempfile::TempDir;

    fn sample_set() -> WorkingSet {
        let mut set = WorkingSet::new();

        let decl = SongDeclaration {
            source: "https://youtu.be/abc".to_string(),
            native_name: Some("테스트".to_string()),
            reference_name: Some("Test Song".to_string()),
            trim_start: 5,
            volume: 0.9,
            weight: 2,
            kind: SourceKind::Remote,
        };
        let materialized = MaterializedSong {
            declaration: decl.clone(),
            internal_name: "test_song".to_string(),
            display_name: "테스트".to_string(),
            english_display: "Test Song".to_string(),
            original_title: "Test Song MV".to_string(),
            file_path: "my_station/test_song.ogg".to_string(),
            duration: 175.0,
            original_duration: 180.0,
        };

        set.insert(
            "my_station",
            StationData {
                songs: vec![Song::Materialized(materialized), Song::Declared(decl)],
                album_art: Some(PathBuf::from("/art/cover.png")),
            },
        );
        set.insert("empty_station", StationData::default());
        set
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let set = sample_set();
        save(&set, dir.path()).unwrap();
        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_station_order_preserved() {
        let dir = TempDir::new().unwrap();
        let mut set = WorkingSet::new();
        for name in ["zulu", "alpha", "mike"] {
            set.insert(name, StationData::default());
        }
        save(&set, dir.path()).unwrap();
        let loaded = load(dir.path()).unwrap();
        let names: Vec<_> = loaded.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn test_legacy_mapping_songs_become_ordered_list() {
        let dir = TempDir::new().unwrap();
        let legacy = r#"{
            "stations": {
                "old_station": {
                    "songs": {
                        "first": { "source": "https://youtu.be/a" },
                        "second": { "source": "https://youtu.be/b" }
                    },
                    "album_art": ""
                }
            }
        }"#;
        fs::write(dir.path().join(MANIFEST_FILE), legacy).unwrap();

        let loaded = load(dir.path()).unwrap();
        let station = loaded.get("old_station").unwrap();
        let sources: Vec<_> = station
            .songs
            .iter()
            .map(|s| s.declaration().source.clone())
            .collect();
        assert_eq!(sources, vec!["https://youtu.be/a", "https://youtu.be/b"]);
        assert_eq!(station.album_art, None);
    }

    #[test]
    fn test_bogus_song_collection_repaired_to_empty() {
        let dir = TempDir::new().unwrap();
        let bogus = r#"{ "stations": { "s": { "songs": 42 } } }"#;
        fs::write(dir.path().join(MANIFEST_FILE), bogus).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert!(loaded.get("s").unwrap().songs.is_empty());
    }

    #[test]
    fn test_corrupt_json_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(ManifestError::Malformed(_))
        ));
    }
}
