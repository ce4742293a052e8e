//! Default save settings injected into the figure writer.
//!
//! Values are resolved with a fixed precedence: an explicit argument on the
//! save request wins over the injected [`SaveConfig`], which wins over the
//! built-in defaults below. The configuration is read from a project file on
//! request and never written back.

use crate::error::{PlotaidError, Result, ResultExt as _};
use crate::figure::{FileType, PrefixPolicy, RenderOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SAVE_DIR: &str = "figures";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%y%m%d";
pub const DEFAULT_LATEST_SUBDIR: &str = "latest";
pub const DEFAULT_ARCHIVE_SUBDIR: &str = "archive";

/// Fallback values for every save call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Output root for figures.
    pub save_dir: PathBuf,
    /// Export format when the caller does not name one.
    pub file_type: FileType,
    /// `strftime` pattern for the timestamp segment.
    pub timestamp_format: String,
    /// Keep a dateless latest copy and archive the previous one.
    pub preserve_latest: bool,
    pub latest_subdir: String,
    pub archive_subdir: String,
    pub prefix: PrefixPolicy,
    pub render: RenderOptions,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            file_type: FileType::Png,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_owned(),
            preserve_latest: false,
            latest_subdir: DEFAULT_LATEST_SUBDIR.to_owned(),
            archive_subdir: DEFAULT_ARCHIVE_SUBDIR.to_owned(),
            prefix: PrefixPolicy::Auto,
            render: RenderOptions::default(),
        }
    }
}

impl SaveConfig {
    /// Loads a project configuration file. Missing keys take the built-in
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            PlotaidError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        tracing::debug!("Loaded save configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Propagates [`SaveConfig::load`] failures.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }
}
