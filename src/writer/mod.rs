//! Renders the fixed set of mod text artifacts from a station's final song
//! list. Every render is a pure function of its inputs and every file is
//! rewritten from scratch, so a shorter rebuild never leaves stale entries
//! behind.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::station::MaterializedSong;

/// Byte-order mark expected at the start of localisation files.
const BOM: char = '\u{feff}';

/// `my_station` -> `My Station`.
pub fn station_title(station: &str) -> String {
    station
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Localization strings: one title line for the station and one line per
/// song mapping the asset key to its quoted display name.
pub fn render_localisation(station: &str, songs: &[MaterializedSong]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str("l_english:\n");
    let _ = writeln!(out, " {station}_TITLE:0 \"{}\"", station_title(station));
    for song in songs {
        let _ = writeln!(out, " {}:0 \"{}\"", song.internal_name, song.display_name);
    }
    out
}

/// Soundtrack playlist: one weighted `music` block per song.
pub fn render_soundtrack(station: &str, songs: &[MaterializedSong]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "music_station = \"{station}\"");
    for song in songs {
        out.push('\n');
        out.push_str("music = {\n");
        let _ = writeln!(out, "\tsong = \"{}\"", song.internal_name);
        out.push_str("\tchance = {\n");
        out.push_str("\t\tmodifier = {\n");
        let _ = writeln!(out, "\t\t\tfactor = {}", song.declaration.weight);
        out.push_str("\t\t}\n");
        out.push_str("\t}\n");
        out.push_str("}\n");
    }
    out
}

/// Per-song asset declarations, each preceded by a comment naming the
/// display name.
pub fn render_asset(station: &str, songs: &[MaterializedSong]) -> String {
    let mut out = String::new();
    for (i, song) in songs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let file_name = Path::new(&song.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.ogg", song.internal_name));
        let _ = writeln!(out, "# {}", song.display_name);
        out.push_str("music = {\n");
        let _ = writeln!(out, "\tname = \"{}\"", song.internal_name);
        let _ = writeln!(out, "\tfile = \"{station}/{file_name}\"");
        let _ = writeln!(out, "\tvolume = {:?}", song.declaration.volume);
        out.push_str("}\n");
    }
    out
}

/// Texture-atlas declaration: one 2-frame sprite keyed to the station.
pub fn render_sprite(station: &str) -> String {
    format!(
        "spriteTypes = {{\n\
         \n\
         \tspriteType = {{\n\
         \t\tname = \"GFX_{station}_album_art\"\n\
         \t\ttexturefile = \"gfx/{station}_album_art.dds\"\n\
         \t\tnoOfFrames = 2\n\
         \t}}\n\
         \n\
         }}\n"
    )
}

/// UI layout: the playback faceplate and the station-selector entry. All
/// positions and dimensions are fixed; only the station name varies.
pub fn render_gui(station: &str) -> String {
    let title = station_title(station) + " Music";
    format!(
        r#"guiTypes = {{

	containerWindowType = {{
		name = "{station}_faceplate"
		position = {{ x =0 y=0 }}
		size = {{ width = 590 height = 46 }}

		iconType ={{
			name ="musicplayer_header_bg"
			spriteType = "GFX_musicplayer_header_bg"
			position = {{ x= 0 y = 0 }}
			allwaystransparent = yes
		}}

		instantTextboxType = {{
			name = "track_name"
			position = {{ x = 72 y = 20 }}
			font = "hoi_20b"
			text = "{title}"
			maxWidth = 450
			maxHeight = 25
			format = center
		}}

		instantTextboxType = {{
			name = "track_elapsed"
			position = {{ x = 124 y = 30 }}
			font = "hoi_18b"
			text = "00:00"
			maxWidth = 50
			maxHeight = 25
			format = center
		}}

		instantTextboxType = {{
			name = "track_duration"
			position = {{ x = 420 y = 30 }}
			font = "hoi_18b"
			text = "02:58"
			maxWidth = 50
			maxHeight = 25
			format = center
		}}

		buttonType = {{
			name = "prev_button"
			position = {{ x = 220 y = 20 }}
			quadTextureSprite ="GFX_musicplayer_previous_button"
			buttonFont = "Main_14_black"
			Orientation = "LOWER_LEFT"
			clicksound = click_close
			pdx_tooltip = "MUSICPLAYER_PREV"
		}}

		buttonType = {{
			name = "play_button"
			position = {{ x = 263 y = 20 }}
			quadTextureSprite ="GFX_musicplayer_play_pause_button"
			buttonFont = "Main_14_black"
			Orientation = "LOWER_LEFT"
			clicksound = click_close
		}}

		buttonType = {{
			name = "next_button"
			position = {{ x = 336 y = 20 }}
			quadTextureSprite ="GFX_musicplayer_next_button"
			buttonFont = "Main_14_black"
			Orientation = "LOWER_LEFT"
			clicksound = click_close
			pdx_tooltip = "MUSICPLAYER_NEXT"
		}}

		extendedScrollbarType = {{
			name = "volume_slider"
			position = {{ x = 100 y = 45}}
			size = {{ width = 75 height = 18 }}
			tileSize = {{ width = 12 height = 12}}
			maxValue =100
			minValue =0
			stepSize =1
			startValue = 50
			horizontal = yes
			orientation = lower_left
			origo = lower_left
			setTrackFrameOnChange = yes

			slider = {{
				name = "Slider"
				quadTextureSprite = "GFX_scroll_drager"
				position = {{ x=0 y = 1 }}
				pdx_tooltip = "MUSICPLAYER_ADJUST_VOL"
			}}

			track = {{
				name = "Track"
				quadTextureSprite = "GFX_volume_track"
				position = {{ x=0 y = 3 }}
				allwaystransparent = yes
				pdx_tooltip = "MUSICPLAYER_ADJUST_VOL"
			}}
		}}

		buttonType = {{
			name = "shuffle_button"
			position = {{ x = 425 y = 20 }}
			quadTextureSprite ="GFX_toggle_shuffle_buttons"
			buttonFont = "Main_14_black"
			Orientation = "LOWER_LEFT"
			clicksound = click_close
		}}
	}}

	containerWindowType={{
		name = "{station}_stations_entry"
		size = {{ width = 152 height = 120 }}

		checkBoxType = {{
			name = "select_station_button"
			position = {{ x = 0 y = 0 }}
			quadTextureSprite = "GFX_{station}_album_art"
			clicksound = decisions_ui_button
		}}
	}}
}}
"#
    )
}

/// Top-level mod descriptor, named after the output directory.
pub fn render_descriptor(mod_name: &str) -> String {
    format!(
        "version=\"1.0\"\n\
         tags={{\n\
         \t\"Sound\"\n\
         }}\n\
         name=\"{}\"\n\
         supported_version=\"1.14.*\"\n",
        station_title(mod_name)
    )
}

/// Write the five per-station artifacts under `output_dir`.
pub fn write_station_files(
    output_dir: &Path,
    station: &str,
    songs: &[MaterializedSong],
) -> io::Result<Vec<PathBuf>> {
    let files = [
        (
            output_dir
                .join("localisation")
                .join(format!("{station}_l_english.yml")),
            render_localisation(station, songs),
        ),
        (
            output_dir
                .join("music")
                .join(format!("{station}_soundtrack.txt")),
            render_soundtrack(station, songs),
        ),
        (
            output_dir.join("music").join(format!("{station}_music.asset")),
            render_asset(station, songs),
        ),
        (
            output_dir
                .join("interface")
                .join(format!("{station}_music.gfx")),
            render_sprite(station),
        ),
        (
            output_dir
                .join("interface")
                .join(format!("{station}_music.gui")),
            render_gui(station),
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        info!("wrote {:?}", path);
        written.push(path);
    }
    Ok(written)
}

/// Write `descriptor.mod` at the top of the output directory.
pub fn write_descriptor(output_dir: &Path) -> io::Result<PathBuf> {
    let mod_name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "music_mod".to_string());
    let path = output_dir.join("descriptor.mod");
    fs::write(&path, render_descriptor(&mod_name))?;
    info!("wrote {:?}", path);
    Ok(path)
}
