//! Decoder configuration
//!
//! Optional JSON file; any field left out takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::decoder::{RenderOptions, DEFAULT_BANNER_WIDTH};
use crate::error::DecodeError;

/// Settings shared by the library and the command line tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Directory holding `.apdufmt` templates
    pub format_dir: PathBuf,
    /// Append the failed response summary to the output
    pub debug: bool,
    /// Width of the title and error banners
    pub banner_width: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            format_dir: Self::default_format_dir(),
            debug: false,
            banner_width: DEFAULT_BANNER_WIDTH,
        }
    }
}

impl DecoderConfig {
    pub const FORMAT_DIR_ENV: &'static str = "APDU_DECODER_FORMAT_DIR";

    /// Get the default format directory
    pub fn default_format_dir() -> PathBuf {
        if let Ok(path) = std::env::var(Self::FORMAT_DIR_ENV) {
            return PathBuf::from(path);
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".apdu-decoder").join("format");
        }
        PathBuf::from("format")
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, DecodeError> {
        let content = fs::read_to_string(path).map_err(|e| DecodeError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        debug!("{:?}", config);
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), DecodeError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| DecodeError::io(path, e))?;
        debug!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            debug: self.debug,
            banner_width: self.banner_width,
        }
    }
}
