use crate::engine::{DEFAULT_MAX_OPEN_DIRS, WalkLimits};
use crate::viewport::ScrollMargins;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config_version: u32,
    /// Rows kept above the selection before the list scrolls up.
    pub top_offset: usize,
    /// Rows kept below the selection before the list scrolls down.
    pub bottom_offset: usize,
    /// Height of the message pane; 0 hides it.
    pub log_rows: u16,
    pub max_open_dirs: usize,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            top_offset: 0,
            bottom_offset: 0,
            log_rows: 4,
            max_open_dirs: DEFAULT_MAX_OPEN_DIRS,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location when none is given. A missing
    /// file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let parsed = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        Ok(parsed)
    }

    pub fn margins(&self) -> ScrollMargins {
        ScrollMargins {
            top: self.top_offset,
            bottom: self.bottom_offset,
        }
    }

    pub fn limits(&self) -> WalkLimits {
        WalkLimits {
            max_open_dirs: self.max_open_dirs.max(1),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not resolve config directory")?;
    Ok(base.join("treenav").join("config.toml"))
}
