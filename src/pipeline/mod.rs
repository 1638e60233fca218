//! Batch build orchestration: walks the working set station by station,
//! reconciles against the output directory, runs the media pipeline for
//! whatever is missing and renders the game files. Progress is streamed as
//! [`BuildEvent`]s over a channel so the frontend never blocks on work.

pub mod events;
pub mod reconcile;

use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::archive;
use crate::manifest;
use crate::media::{MediaProcessor, MediaSettings};
use crate::station::{Song, WorkingSet};
use crate::writer;
pub use events::BuildEvent;

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub media: MediaSettings,
    /// Package the output directory into a zip next to it after a fully
    /// successful build.
    pub zip_output: bool,
}

/// Final state of a batch run. The working set carries every song in
/// declaration order, materialized where processing succeeded and still
/// declared where it failed, so a rerun can pick up where the failed one
/// stopped.
#[derive(Debug)]
pub struct BuildOutcome {
    pub working_set: WorkingSet,
    pub success: bool,
}

/// Run the whole batch on a background task.
///
/// Every run ends with exactly one [`BuildEvent::Finished`], whatever
/// happens in between.
pub fn spawn_build(
    set: WorkingSet,
    output_dir: PathBuf,
    options: BuildOptions,
) -> (UnboundedReceiver<BuildEvent>, JoinHandle<BuildOutcome>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let mut set = set;
        let result = run_batch(&mut set, &output_dir, &options, &tx).await;
        let (success, error) = match result {
            Ok(true) => (true, None),
            Ok(false) => (false, None),
            Err(e) => {
                error!("build aborted: {e:#}");
                (false, Some(format!("{e:#}")))
            }
        };
        let _ = tx.send(BuildEvent::Finished { success, error });
        BuildOutcome {
            working_set: set,
            success,
        }
    });
    (rx, handle)
}

fn send(tx: &UnboundedSender<BuildEvent>, event: BuildEvent) {
    // A dropped receiver must not stop the build.
    let _ = tx.send(event);
}

async fn run_batch(
    set: &mut WorkingSet,
    output_dir: &Path,
    options: &BuildOptions,
    tx: &UnboundedSender<BuildEvent>,
) -> anyhow::Result<bool> {
    let mut all_ok = true;
    let mut any_rendered = false;

    for (station, data) in set.iter_mut() {
        send(tx, BuildEvent::StationStarted { station: station.to_string() });

        if data.songs.is_empty() {
            send(
                tx,
                BuildEvent::StationSkipped {
                    station: station.to_string(),
                    reason: "no songs declared".to_string(),
                },
            );
            continue;
        }

        for sub in ["music", "gfx", "interface", "localisation"] {
            std::fs::create_dir_all(output_dir.join(sub))
                .with_context(|| format!("failed to create {sub}/ in {output_dir:?}"))?;
        }
        std::fs::create_dir_all(output_dir.join("music").join(station))
            .with_context(|| format!("failed to create the music folder for '{station}'"))?;

        let processor = MediaProcessor::new(output_dir, station, options.media.clone());

        match &data.album_art {
            Some(art) if art.is_file() => {
                let success = processor.process_album_art(art).await;
                send(
                    tx,
                    BuildEvent::AlbumArtProcessed {
                        station: station.to_string(),
                        success,
                    },
                );
            }
            Some(art) => {
                warn!("[{station}] album art {art:?} not found, skipping");
                send(tx, BuildEvent::AlbumArtSkipped { station: station.to_string() });
            }
            None => send(tx, BuildEvent::AlbumArtSkipped { station: station.to_string() }),
        }

        let plan = reconcile::plan(station, &data.songs, output_dir);
        let mut materialized = plan.materialized;
        for song in &materialized {
            send(
                tx,
                BuildEvent::SongAlreadyPresent {
                    station: station.to_string(),
                    name: song.internal_name.clone(),
                },
            );
        }

        // Local conversions first, then the downloads. One bad song never
        // sinks the station.
        let pending = plan
            .to_convert
            .iter()
            .map(|d| (d, true))
            .chain(plan.to_download.iter().map(|d| (d, false)));
        for (decl, is_local) in pending {
            let result = if is_local {
                processor.process_local(decl).await
            } else {
                processor.process_remote(decl).await
            };
            match result {
                Ok(song) => {
                    send(
                        tx,
                        BuildEvent::SongMaterialized {
                            station: station.to_string(),
                            name: song.internal_name.clone(),
                        },
                    );
                    materialized.push(song);
                }
                Err(e) => {
                    warn!("[{station}] song {:?} failed: {e}", decl.source);
                    all_ok = false;
                    send(
                        tx,
                        BuildEvent::SongFailed {
                            station: station.to_string(),
                            source: decl.source.clone(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        if materialized.is_empty() {
            all_ok = false;
            send(
                tx,
                BuildEvent::StationSkipped {
                    station: station.to_string(),
                    reason: "no songs could be materialized".to_string(),
                },
            );
            continue;
        }

        // Reassemble the list in declaration order. Failed declarations
        // stay in it, still declared, so the next run retries them.
        let mut remaining = materialized;
        let mut rebuilt = Vec::with_capacity(data.songs.len());
        for song in data.songs.drain(..) {
            match remaining
                .iter()
                .position(|m| &m.declaration == song.declaration())
            {
                Some(pos) => rebuilt.push(Song::Materialized(remaining.remove(pos))),
                None => rebuilt.push(song),
            }
        }
        rebuilt.extend(remaining.into_iter().map(Song::Materialized));

        let rendered: Vec<_> = rebuilt
            .iter()
            .filter_map(|s| s.as_materialized())
            .cloned()
            .collect();
        writer::write_station_files(output_dir, station, &rendered)
            .with_context(|| format!("failed to write station files for '{station}'"))?;
        send(
            tx,
            BuildEvent::StationRendered {
                station: station.to_string(),
                songs: rendered.len(),
            },
        );
        any_rendered = true;

        data.songs = rebuilt;
    }

    if any_rendered {
        writer::write_descriptor(output_dir).context("failed to write descriptor.mod")?;
    }

    if all_ok {
        manifest::save(set, output_dir).context("failed to save the session manifest")?;

        let temp_dir = output_dir.join("temp");
        if temp_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&temp_dir) {
                warn!("failed to remove {temp_dir:?}: {e}");
            }
        }

        if options.zip_output {
            let archive_path =
                archive::zip_output_dir(output_dir).context("failed to package the output")?;
            info!("packaged output into {archive_path:?}");
        }
    } else {
        warn!("build finished with errors; manifest left untouched");
    }

    Ok(all_ok)
}
