//! Zip packaging of a finished output directory, ready to drop into the
//! game's mod folder or upload to a workshop.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("output directory {0:?} has no usable name")]
    BadOutputDir(PathBuf),
}

/// Package `output_dir` into `<output_dir>.zip` next to it.
///
/// Entry names are relative to the directory and always use forward
/// slashes. The scratch `temp/` folder and any previous zip are skipped.
pub fn zip_output_dir(output_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let dir_name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::BadOutputDir(output_dir.to_path_buf()))?;
    let zip_path = output_dir.with_file_name(format!("{dir_name}.zip"));

    let file = File::create(&zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut buffer = Vec::new();
    for entry in WalkDir::new(output_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = match path.strip_prefix(output_dir) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if relative.components().next().is_some_and(|c| c.as_os_str() == "temp") {
            continue;
        }
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip")) {
            continue;
        }

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!("archiving {name}");
        writer.start_file(name.as_str(), options)?;

        buffer.clear();
        File::open(path)?.read_to_end(&mut buffer)?;
        writer.write_all(&buffer)?;
    }

    writer.finish()?;
    info!("wrote archive {zip_path:?}");
    Ok(zip_path)
}
