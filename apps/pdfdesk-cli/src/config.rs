//! `pdfdesk.toml` settings
//!
//! Every key is optional. Command-line flags win over the file, and the
//! file wins over built-in defaults.
//!
//! ```toml
//! [output]
//! dir = "out"
//!
//! [compress]
//! level = 2
//!
//! [watermark]
//! text = "CONFIDENTIAL"
//!
//! [page_numbers]
//! start = 1
//!
//! [rotate]
//! degrees = 90
//!
//! [export]
//! format = "markdown"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use pdfdesk_core::{CompressionLevel, ExportFormat, ToolOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "pdfdesk.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub compress: CompressConfig,
    pub watermark: WatermarkConfig,
    pub page_numbers: PageNumbersConfig,
    pub rotate: RotateConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory output files are written to
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub level: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumbersConfig {
    pub start: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    pub degrees: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: Option<ExportFormat>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// An explicit path must exist; otherwise `./pdfdesk.toml` is used if
    /// present and defaults apply if not.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            debug!(path = %default_path.display(), "Using config file");
            return Self::from_file(default_path);
        }
        Ok(Self::default())
    }

    /// Tool options seeded from the file, before flags are applied.
    pub fn tool_options(&self) -> ToolOptions {
        let defaults = ToolOptions::default();
        ToolOptions {
            compress_level: self
                .compress
                .level
                .map(CompressionLevel::new)
                .unwrap_or(defaults.compress_level),
            watermark_text: self.watermark.text.clone().unwrap_or_default(),
            page_number_start: self.page_numbers.start.unwrap_or(defaults.page_number_start),
            rotation: self.rotate.degrees.unwrap_or(defaults.rotation),
            export_format: self.export.format.unwrap_or(defaults.export_format),
            ..defaults
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tool_options(), ToolOptions::default());
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [output]
            dir = "out"

            [compress]
            level = 7

            [watermark]
            text = "DRAFT"

            [page_numbers]
            start = 5

            [rotate]
            degrees = 180

            [export]
            format = "html"
            "#,
        )
        .unwrap();

        let options = config.tool_options();
        assert_eq!(options.compress_level.get(), 7);
        assert_eq!(options.watermark_text, "DRAFT");
        assert_eq!(options.page_number_start, 5);
        assert_eq!(options.rotation, 180);
        assert_eq!(options.export_format, ExportFormat::Html);
        assert_eq!(config.output_dir(), PathBuf::from("out"));
    }

    #[test]
    fn test_out_of_range_level_is_clamped() {
        let config = Config::parse("[compress]\nlevel = 0").unwrap();
        assert_eq!(config.tool_options().compress_level.get(), 1);
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(Config::parse("[colour]\nmode = 1").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/pdfdesk.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
