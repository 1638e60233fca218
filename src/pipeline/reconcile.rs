//! Reconciliation: partition a station's song list against what already
//! exists on disk, so reruns only do the work that is actually missing.

use std::path::Path;
use tracing::debug;

use crate::sanitize::ascii_or_placeholder;
use crate::station::{MaterializedSong, Song, SongDeclaration, SourceKind};

/// The work remaining for one station.
#[derive(Debug, Default)]
pub struct BuildPlan {
    /// Songs whose OGG already exists; carried through unchanged.
    pub materialized: Vec<MaterializedSong>,
    /// Local files that still need transcoding.
    pub to_convert: Vec<SongDeclaration>,
    /// Remote sources that still need downloading.
    pub to_download: Vec<SongDeclaration>,
}

/// The internal name the song will end up with, as far as it can be known
/// without touching the network. A previously materialized song keeps its
/// recorded name; otherwise the same basis rule as the media processor
/// applies: reference name when present, else native name, else the
/// placeholder (the remote title is not known here).
pub fn prospective_name(song: &Song) -> String {
    if let Some(m) = song.as_materialized() {
        return m.internal_name.clone();
    }
    let decl = song.declaration();
    let basis = decl
        .reference_name
        .as_deref()
        .or(decl.native_name.as_deref());
    match basis {
        Some(name) => ascii_or_placeholder(name),
        None => crate::sanitize::PLACEHOLDER_NAME.to_string(),
    }
}

/// Partition the station's songs into already-done / convert / download.
///
/// A song whose OGG exists under `music/<station>/` is kept (or, if it was
/// never materialized, a minimal record is synthesized from its declared
/// names). A materialized song whose file has gone missing is re-queued
/// according to its source kind.
pub fn plan(station: &str, songs: &[Song], output_dir: &Path) -> BuildPlan {
    let station_dir = output_dir.join("music").join(station);
    let mut plan = BuildPlan::default();

    for song in songs {
        let name = prospective_name(song);
        let ogg = station_dir.join(format!("{name}.ogg"));

        if ogg.exists() {
            let record = match song.as_materialized() {
                Some(m) => m.clone(),
                None => synthesize(song.declaration(), &name, station),
            };
            debug!("[{station}] {name}.ogg exists, keeping");
            plan.materialized.push(record);
            continue;
        }

        let decl = song.declaration().clone();
        match decl.kind {
            SourceKind::Local => plan.to_convert.push(decl),
            SourceKind::Remote => plan.to_download.push(decl),
        }
    }

    plan
}

/// Minimal record for a file that exists on disk but was never run through
/// the media processor (for example, dropped into the folder by hand).
fn synthesize(decl: &SongDeclaration, internal_name: &str, station: &str) -> MaterializedSong {
    let display_name = decl
        .native_name
        .clone()
        .or_else(|| decl.reference_name.clone())
        .unwrap_or_else(|| internal_name.to_string());
    let english_display = decl
        .reference_name
        .clone()
        .unwrap_or_else(|| internal_name.to_string());

    MaterializedSong {
        declaration: decl.clone(),
        internal_name: internal_name.to_string(),
        original_title: display_name.clone(),
        display_name,
        english_display,
        file_path: format!("{station}/{internal_name}.ogg"),
        duration: 0.0,
        original_duration: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(source: &str, native: Option<&str>, reference: Option<&str>) -> Song {
        let mut decl = SongDeclaration::new(source);
        decl.native_name = native.map(str::to_string);
        decl.reference_name = reference.map(str::to_string);
        Song::Declared(decl)
    }

    #[test]
    fn test_prospective_name_prefers_reference() {
        let song = declared("url", Some("내 노래"), Some("My Song"));
        assert_eq!(prospective_name(&song), "my_song");
    }

    #[test]
    fn test_prospective_name_falls_back_through_native() {
        let song = declared("url", Some("Native Title"), None);
        assert_eq!(prospective_name(&song), "native_title");

        let song = declared("url", Some("내 노래"), None);
        assert_eq!(prospective_name(&song), crate::sanitize::PLACEHOLDER_NAME);

        let song = declared("url", None, None);
        assert_eq!(prospective_name(&song), crate::sanitize::PLACEHOLDER_NAME);
    }

    #[test]
    fn test_prospective_name_matches_processor_basis() {
        use crate::media::derive_names;

        // The reference name is the basis even when it sanitizes to the
        // placeholder; the processor will write unknown_song.ogg and the
        // plan must look for the same file.
        let cases = [
            (Some("Abc Song"), Some("테스트")),
            (Some("테스트"), Some("Test Song")),
            (Some("Native Title"), None),
            (None, Some("March of Steel")),
        ];
        for (native, reference) in cases {
            let song = declared("url", native, reference);
            let derived = derive_names(native, reference, "ignored");
            assert_eq!(
                prospective_name(&song),
                derived.internal_name,
                "basis disagreement for native={native:?} reference={reference:?}"
            );
        }
    }

    #[test]
    fn test_plan_keeps_placeholder_named_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let station_dir = dir.path().join("music").join("alpha");
        std::fs::create_dir_all(&station_dir).unwrap();
        std::fs::write(station_dir.join("unknown_song.ogg"), b"ogg").unwrap();

        let song = declared("https://youtu.be/v", Some("Abc Song"), Some("테스트"));
        let plan = plan("alpha", &[song], dir.path());
        assert!(plan.to_download.is_empty());
        assert_eq!(plan.materialized.len(), 1);
        assert_eq!(
            plan.materialized[0].internal_name,
            crate::sanitize::PLACEHOLDER_NAME
        );
    }

    #[test]
    fn test_plan_partitions_by_existence_and_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        let station_dir = dir.path().join("music").join("alpha");
        std::fs::create_dir_all(&station_dir).unwrap();
        std::fs::write(station_dir.join("done_song.ogg"), b"ogg").unwrap();

        let mut local = SongDeclaration::new("/some/file.mp3");
        local.kind = SourceKind::Local;
        local.native_name = Some("로컬".to_string());
        local.reference_name = Some("Local Track".to_string());

        let songs = vec![
            declared("url1", None, Some("Done Song")),
            declared("url2", None, Some("Missing Song")),
            Song::Declared(local),
        ];

        let plan = plan("alpha", &songs, dir.path());
        assert_eq!(plan.materialized.len(), 1);
        assert_eq!(plan.materialized[0].internal_name, "done_song");
        assert_eq!(plan.materialized[0].file_path, "alpha/done_song.ogg");
        assert_eq!(plan.to_download.len(), 1);
        assert_eq!(plan.to_download[0].source, "url2");
        assert_eq!(plan.to_convert.len(), 1);
        assert_eq!(plan.to_convert[0].source, "/some/file.mp3");
    }

    #[test]
    fn test_plan_requeues_materialized_song_with_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();

        let mut decl = SongDeclaration::new("https://example.com/v");
        decl.reference_name = Some("Gone Song".to_string());
        let song = Song::Materialized(MaterializedSong {
            declaration: decl,
            internal_name: "gone_song".to_string(),
            display_name: "Gone Song".to_string(),
            english_display: "Gone Song".to_string(),
            original_title: "Gone Song MV".to_string(),
            file_path: "alpha/gone_song.ogg".to_string(),
            duration: 100.0,
            original_duration: 100.0,
        });

        let plan = plan("alpha", &[song], dir.path());
        assert!(plan.materialized.is_empty());
        assert_eq!(plan.to_download.len(), 1);
    }
}
