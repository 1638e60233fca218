//! Song-list import/export: a `|`-delimited plain-text shorthand and a JSON
//! list, both producing validated [`SongDeclaration`]s.
//!
//! Text lines look like `native|reference|url|trim|volume|weight`; a line
//! with two fields is `name|url`, where a Hangul name is taken as the
//! native name and anything else as the reference name. `#` lines and
//! blank lines are ignored.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use thiserror::Error;

use crate::station::{DeclarationError, SongDeclaration, SourceKind};

#[derive(Debug, Error)]
pub enum SongListError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: {source}")]
    InvalidDeclaration {
        line: usize,
        source: DeclarationError,
    },

    #[error("invalid JSON song list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid declaration: {0}")]
    Declaration(#[from] DeclarationError),
}

lazy_static! {
    static ref HANGUL: Regex = Regex::new(r"[가-힣]").unwrap();
}

/// Parse the pipe-delimited text shorthand. Malformed numeric fields are
/// rejected with the offending line number, never silently defaulted.
pub fn parse_text(input: &str) -> Result<Vec<SongDeclaration>, SongListError> {
    let mut songs = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        // Full lines carry the locator third, with the numeric fields after
        // it; short lines end with it.
        let source = if parts.len() >= 3 {
            parts[2]
        } else {
            parts.last().copied().unwrap_or_default()
        };
        let mut decl = SongDeclaration::new(source);

        if parts.len() == 2 {
            if HANGUL.is_match(parts[0]) {
                decl.native_name = Some(parts[0].to_string());
            } else {
                decl.reference_name = Some(parts[0].to_string());
            }
        } else if parts.len() >= 3 {
            if !parts[0].is_empty() {
                decl.native_name = Some(parts[0].to_string());
            }
            if !parts[1].is_empty() {
                decl.reference_name = Some(parts[1].to_string());
            }
        }
        if parts.len() >= 4 && !parts[3].is_empty() {
            decl.trim_start = parse_field(line_no, "trim_start", parts[3])?;
        }
        if parts.len() >= 5 && !parts[4].is_empty() {
            decl.volume = parse_field(line_no, "volume", parts[4])?;
        }
        if parts.len() >= 6 && !parts[5].is_empty() {
            decl.weight = parse_field(line_no, "weight", parts[5])?;
        }

        decl.kind = detect_kind(&decl.source);
        decl.validate()
            .map_err(|source| SongListError::InvalidDeclaration {
                line: line_no,
                source,
            })?;
        songs.push(decl);
    }

    Ok(songs)
}

fn parse_field<T: std::str::FromStr>(
    line: usize,
    field: &'static str,
    value: &str,
) -> Result<T, SongListError> {
    value.parse().map_err(|_| SongListError::InvalidField {
        line,
        field,
        value: value.to_string(),
    })
}

/// A source that exists on disk is a local file; everything else is a URL.
fn detect_kind(source: &str) -> SourceKind {
    if Path::new(source).is_file() {
        SourceKind::Local
    } else {
        SourceKind::Remote
    }
}

/// Parse a JSON array of declarations.
pub fn parse_json(input: &str) -> Result<Vec<SongDeclaration>, SongListError> {
    let songs: Vec<SongDeclaration> = serde_json::from_str(input)?;
    for song in &songs {
        song.validate()?;
    }
    Ok(songs)
}

/// Load a song list from disk, dispatching on the `.json` extension.
pub fn load(path: &Path) -> Result<Vec<SongDeclaration>, SongListError> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json(&content)
    } else {
        parse_text(&content)
    }
}

/// Export declarations as pretty JSON.
pub fn export(path: &Path, songs: &[SongDeclaration]) -> Result<(), SongListError> {
    let json = serde_json::to_string_pretty(songs)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let songs =
            parse_text("테스트|Test Song|https://youtu.be/abc|5|0.9|2").unwrap();
        assert_eq!(songs.len(), 1);
        let song = &songs[0];
        assert_eq!(song.native_name.as_deref(), Some("테스트"));
        assert_eq!(song.reference_name.as_deref(), Some("Test Song"));
        assert_eq!(song.source, "https://youtu.be/abc");
        assert_eq!(song.trim_start, 5);
        assert_eq!(song.volume, 0.9);
        assert_eq!(song.weight, 2);
        assert_eq!(song.kind, SourceKind::Remote);
    }

    #[test]
    fn test_source_is_third_field_when_numeric_fields_follow() {
        // The trailing weight must never be mistaken for the locator.
        let songs = parse_text("테스트|Test Song|https://youtu.be/abc|0|0.8|3").unwrap();
        assert_eq!(songs[0].source, "https://youtu.be/abc");
        assert_eq!(songs[0].weight, 3);

        let songs = parse_text("a|b|https://youtu.be/xyz|10").unwrap();
        assert_eq!(songs[0].source, "https://youtu.be/xyz");
        assert_eq!(songs[0].trim_start, 10);
    }

    #[test]
    fn test_parse_two_field_line_language_heuristic() {
        let songs = parse_text("아리랑|https://youtu.be/a\nMarch|https://youtu.be/b").unwrap();
        assert_eq!(songs[0].native_name.as_deref(), Some("아리랑"));
        assert_eq!(songs[0].reference_name, None);
        assert_eq!(songs[1].reference_name.as_deref(), Some("March"));
        assert_eq!(songs[1].native_name, None);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let songs = parse_text("# header\n\nhttps://youtu.be/a\n").unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].source, "https://youtu.be/a");
    }

    #[test]
    fn test_malformed_numeric_rejected() {
        let err = parse_text("a|b|https://youtu.be/a|five").unwrap_err();
        assert!(matches!(
            err,
            SongListError::InvalidField {
                line: 1,
                field: "trim_start",
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_volume_rejected() {
        let err = parse_text("a|b|https://youtu.be/a|0|9.9").unwrap_err();
        assert!(matches!(
            err,
            SongListError::InvalidDeclaration { line: 1, .. }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let songs = parse_text("테스트|Test Song|https://youtu.be/abc|5|0.9|2").unwrap();
        let json = serde_json::to_string(&songs).unwrap();
        let back = parse_json(&json).unwrap();
        assert_eq!(back, songs);
    }
}
