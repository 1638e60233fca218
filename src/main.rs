use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use radioforge::config::{CliConfig, FileConfig};
use radioforge::pipeline::{spawn_build, BuildEvent, BuildOptions};
use radioforge::station::Song;
use radioforge::{manifest, songlist, WorkingSet};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Output directory of the music mod; also holds the session manifest.
    #[clap(value_parser = parse_path)]
    pub output_dir: PathBuf,

    /// Station to import songs or album art into.
    #[clap(short, long)]
    pub station: Option<String>,

    /// Song list file to import into --station (pipe-delimited text or JSON).
    #[clap(long, value_parser = parse_path)]
    pub list: Option<PathBuf>,

    /// Replace the station's existing songs instead of appending.
    #[clap(long)]
    pub replace: bool,

    /// Album-art image for --station.
    #[clap(long, value_parser = parse_path)]
    pub album_art: Option<PathBuf>,

    /// Export the station's song declarations as JSON and exit.
    #[clap(long, value_parser = parse_path)]
    pub export: Option<PathBuf>,

    /// Package the output directory into a zip after a successful build.
    #[clap(long)]
    pub zip: bool,

    /// Vorbis VBR quality for transcoded audio (0-10).
    #[clap(long, default_value_t = 5)]
    pub audio_quality: u8,

    /// Timeout in seconds for each external texture-conversion tool.
    #[clap(long, default_value_t = 30)]
    pub tool_timeout_secs: u64,

    /// Faceplate template composited over album art.
    #[clap(long, default_value = "radio_station_cover_template.png", value_parser = parse_path)]
    pub template: PathBuf,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!("radioforge {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let options = BuildOptions::resolve(
        &CliConfig {
            audio_quality: cli_args.audio_quality,
            tool_timeout_secs: cli_args.tool_timeout_secs,
            template_path: cli_args.template.clone(),
            zip_output: cli_args.zip,
        },
        file_config,
    )?;

    let mut set = match manifest::load(&cli_args.output_dir) {
        Ok(set) => {
            info!("loaded session manifest with {} station(s)", set.len());
            set
        }
        Err(manifest::ManifestError::NotFound(_)) => {
            info!("no session manifest found, starting fresh");
            WorkingSet::new()
        }
        Err(e) => return Err(e).context("failed to load the session manifest"),
    };

    if cli_args.list.is_some() || cli_args.album_art.is_some() || cli_args.export.is_some() {
        let Some(station) = cli_args.station.as_deref() else {
            bail!("--station is required with --list, --album-art or --export");
        };

        if let Some(export_path) = &cli_args.export {
            let data = set
                .get(&radioforge::sanitize::sanitize_station_name(station))
                .with_context(|| format!("station '{station}' not found in the manifest"))?;
            let declarations: Vec<_> = data
                .songs
                .iter()
                .map(|s| s.declaration().clone())
                .collect();
            songlist::export(export_path, &declarations)
                .with_context(|| format!("failed to export song list to {export_path:?}"))?;
            info!("exported {} song(s) to {export_path:?}", declarations.len());
            return Ok(());
        }

        let entry = set.entry(station);
        if let Some(list_path) = &cli_args.list {
            let declarations = songlist::load(list_path)
                .with_context(|| format!("failed to import song list {list_path:?}"))?;
            info!("imported {} song(s) from {list_path:?}", declarations.len());
            if cli_args.replace {
                entry.songs.clear();
            }
            entry.songs.extend(declarations.into_iter().map(Song::Declared));
        }
        if let Some(art) = &cli_args.album_art {
            if !art.is_file() {
                bail!("album art file not found: {:?}", art);
            }
            entry.album_art = Some(art.clone());
        }
    }

    if set.is_empty() {
        bail!(
            "nothing to build: no stations in {:?} and nothing imported",
            cli_args.output_dir
        );
    }

    std::fs::create_dir_all(&cli_args.output_dir)
        .with_context(|| format!("failed to create output directory {:?}", cli_args.output_dir))?;

    let (mut events, handle) = spawn_build(set, cli_args.output_dir.clone(), options);
    while let Some(event) = events.recv().await {
        match &event {
            BuildEvent::SongFailed { .. } | BuildEvent::StationSkipped { .. } => {
                warn!("{event}")
            }
            _ => info!("{event}"),
        }
    }

    let outcome = handle.await.context("build task panicked")?;
    if !outcome.success {
        bail!("build finished with errors; rerun to retry the failed songs");
    }
    info!("all stations built into {:?}", cli_args.output_dir);
    Ok(())
}
