//! DDS texture conversion as an ordered chain of converter strategies:
//! an in-process BC1 encoder first, then external tools. A missing
//! executable or a timeout means "try the next one", never a hard error.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// One way of turning the composited PNG into the game's DDS texture.
#[async_trait]
pub trait TextureConverter: Send + Sync {
    fn name(&self) -> &str;

    /// Attempt the conversion; `false` means "unavailable or failed, try
    /// the next strategy".
    async fn try_convert(&self, png: &Path, dds: &Path, timeout: Duration) -> bool;
}

/// In-process BC1 (DXT1) encoder.
pub struct Bc1Encoder;

#[async_trait]
impl TextureConverter for Bc1Encoder {
    fn name(&self) -> &str {
        "bc1-encoder"
    }

    async fn try_convert(&self, png: &Path, dds: &Path, _timeout: Duration) -> bool {
        let png = png.to_path_buf();
        let dds_path = dds.to_path_buf();
        let result = tokio::task::spawn_blocking(move || encode_bc1(&png, &dds_path)).await;
        match result {
            Ok(Ok(())) => dds.exists(),
            Ok(Err(e)) => {
                debug!("in-process BC1 encode failed: {e:#}");
                false
            }
            Err(e) => {
                debug!("in-process BC1 encode panicked: {e}");
                false
            }
        }
    }
}

fn encode_bc1(png: &Path, dds_path: &Path) -> anyhow::Result<()> {
    let img = image::open(png)?.to_rgba8();
    let dds = image_dds::dds_from_image(
        &img,
        image_dds::ImageFormat::BC1RgbaUnorm,
        image_dds::Quality::Normal,
        image_dds::Mipmaps::Disabled,
    )?;
    let file = std::fs::File::create(dds_path)?;
    let mut writer = std::io::BufWriter::new(file);
    dds.write(&mut writer)?;
    Ok(())
}

/// External conversion tool invoked with a fixed argument template.
pub struct ExternalTool {
    executable: &'static str,
    build_args: fn(&Path, &Path) -> Vec<OsString>,
}

#[async_trait]
impl TextureConverter for ExternalTool {
    fn name(&self) -> &str {
        self.executable
    }

    async fn try_convert(&self, png: &Path, dds: &Path, timeout: Duration) -> bool {
        let mut cmd = Command::new(self.executable);
        cmd.args((self.build_args)(png, dds))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => {
                debug!("{} timed out after {timeout:?}", self.executable);
                false
            }
            Ok(Err(e)) => {
                // Typically the executable is simply not installed.
                debug!("{} not available: {e}", self.executable);
                false
            }
            Ok(Ok(output)) => output.status.success() && dds.exists(),
        }
    }
}

fn magick_args(png: &Path, dds: &Path) -> Vec<OsString> {
    vec![
        OsString::from("convert"),
        png.into(),
        OsString::from("-define"),
        OsString::from("dds:compression=dxt1"),
        dds.into(),
    ]
}

fn texconv_args(png: &Path, dds: &Path) -> Vec<OsString> {
    let out_dir: PathBuf = dds.parent().unwrap_or_else(|| Path::new(".")).into();
    vec![
        OsString::from("-f"),
        OsString::from("DXT1"),
        OsString::from("-o"),
        out_dir.into(),
        png.into(),
    ]
}

fn nvcompress_args(png: &Path, dds: &Path) -> Vec<OsString> {
    vec![OsString::from("-bc1"), png.into(), dds.into()]
}

/// The fixed fallback order. Adding another tool is a pure extension of
/// this list.
pub fn default_converters() -> Vec<Box<dyn TextureConverter>> {
    vec![
        Box::new(Bc1Encoder),
        Box::new(ExternalTool {
            executable: "magick",
            build_args: magick_args,
        }),
        Box::new(ExternalTool {
            executable: "texconv",
            build_args: texconv_args,
        }),
        Box::new(ExternalTool {
            executable: "nvcompress",
            build_args: nvcompress_args,
        }),
    ]
}

/// Walk the converter chain until one succeeds.
pub async fn convert_to_dds(
    converters: &[Box<dyn TextureConverter>],
    png: &Path,
    dds: &Path,
    timeout: Duration,
) -> bool {
    for converter in converters {
        if converter.try_convert(png, dds, timeout).await {
            info!("converted {png:?} to DDS with {}", converter.name());
            return true;
        }
        debug!("{} could not convert {png:?}", converter.name());
    }
    false
}
