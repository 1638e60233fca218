mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::media::MediaSettings;
use crate::pipeline::BuildOptions;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub audio_quality: u8,
    pub tool_timeout_secs: u64,
    pub template_path: PathBuf,
    pub zip_output: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        let media = MediaSettings::default();
        Self {
            audio_quality: media.audio_quality,
            tool_timeout_secs: media.tool_timeout.as_secs(),
            template_path: media.template_path,
            zip_output: false,
        }
    }
}

impl BuildOptions {
    /// Resolve build options from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let audio_quality = file.audio_quality.unwrap_or(cli.audio_quality);
        if audio_quality > 10 {
            bail!("audio_quality must be between 0 and 10, got {audio_quality}");
        }

        let tool_timeout_secs = file.tool_timeout_secs.unwrap_or(cli.tool_timeout_secs);
        if tool_timeout_secs == 0 {
            bail!("tool_timeout_secs must be at least 1");
        }

        let template_path = file
            .template_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.template_path.clone());

        let zip_output = file.zip_output.unwrap_or(cli.zip_output);

        Ok(Self {
            media: MediaSettings {
                audio_quality,
                tool_timeout: Duration::from_secs(tool_timeout_secs),
                template_path,
            },
            zip_output,
        })
    }
}
