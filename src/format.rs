//! Format template store and log loading
//!
//! Templates are `.apdufmt` files in one directory; logs are `.apdures`
//! files written by the APDU runner.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::DecodeError;

/// Extension of format template files
pub const FORMAT_EXTENSION: &str = "apdufmt";

/// Extension of response log files
pub const LOG_EXTENSION: &str = "apdures";

/// Directory of format templates
#[derive(Debug, Clone)]
pub struct FormatStore {
    dir: PathBuf,
}

impl FormatStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names of all templates, sorted
    pub fn list(&self) -> Result<Vec<String>, DecodeError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| DecodeError::io(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DecodeError::io(&self.dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(FORMAT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();

        debug!("Found {} format files in {:?}", names.len(), self.dir);
        Ok(names)
    }

    /// Resolve a template by file name, by name without extension, or by
    /// 1-based position in [`list`](Self::list)
    pub fn resolve(&self, name: &str) -> Result<PathBuf, DecodeError> {
        let names = self.list()?;
        if names.is_empty() {
            return Err(DecodeError::NoFormats(self.dir.clone()));
        }

        let name = name.trim();
        if let Ok(index) = name.parse::<usize>() {
            if (1..=names.len()).contains(&index) {
                return Ok(self.dir.join(&names[index - 1]));
            }
        }

        let file_name = if name.ends_with(&format!(".{}", FORMAT_EXTENSION)) {
            name.to_string()
        } else {
            format!("{}.{}", name, FORMAT_EXTENSION)
        };

        names
            .iter()
            .find(|candidate| **candidate == file_name)
            .map(|candidate| self.dir.join(candidate))
            .ok_or_else(|| DecodeError::FormatNotFound(name.to_string()))
    }

    /// Read a template's text
    pub fn load(&self, name: &str) -> Result<String, DecodeError> {
        let path = self.resolve(name)?;
        let template = fs::read_to_string(&path).map_err(|e| DecodeError::io(&path, e))?;
        info!("Loaded format {:?}", path);
        Ok(template)
    }
}

/// Read a response log file
pub fn load_log(path: &Path) -> Result<String, DecodeError> {
    let text = fs::read_to_string(path).map_err(|e| DecodeError::io(path, e))?;
    info!("Loaded response log {:?} ({} bytes)", path, text.len());
    Ok(text)
}
