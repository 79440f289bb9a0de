use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detector_params::DetectorParams;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DEVICE, DEFAULT_LOW_THRESHOLD, DEFAULT_REGIONS,
};
use crate::shared::region::{Rect, RegionSpec};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid region '{0}': expected NAME=X,Y,WIDTH,HEIGHT")]
    RegionSyntax(String),
}

/// Everything the monitor needs, fixed at startup.
///
/// Missing JSON fields fall back to the built-in defaults, so a config file
/// only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub device: String,
    pub input_format: Option<String>,
    pub regions: Vec<RegionSpec>,
    pub low_threshold: usize,
    pub detector: DetectorParams,
    pub frame_timeout_ms: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            input_format: None,
            regions: default_regions(),
            low_threshold: DEFAULT_LOW_THRESHOLD,
            detector: DetectorParams::default(),
            frame_timeout_ms: None,
        }
    }
}

pub fn default_regions() -> Vec<RegionSpec> {
    DEFAULT_REGIONS
        .iter()
        .map(|&(name, x, y, w, h)| RegionSpec::new(name, Rect::new(x, y, w, h)))
        .collect()
}

impl MonitorConfig {
    /// `<config_dir>/TrayCount/config.json`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the per-user config file if one exists, otherwise the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::Invalid("device must not be empty".into()));
        }
        if self.regions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one region is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.name.trim().is_empty() {
                return Err(ConfigError::Invalid("region names must not be empty".into()));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate region name '{}'",
                    region.name
                )));
            }
            if region.rect.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "region '{}' has zero area",
                    region.name
                )));
            }
        }
        if self.frame_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "frame timeout must be at least 1 ms".into(),
            ));
        }
        self.detector
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Parses a command-line region of the form `NAME=X,Y,WIDTH,HEIGHT`.
pub fn parse_region(s: &str) -> Result<RegionSpec, ConfigError> {
    let syntax = || ConfigError::RegionSyntax(s.to_string());
    let (name, coords) = s.split_once('=').ok_or_else(syntax)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(syntax());
    }
    let values = coords
        .split(',')
        .map(|v| v.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| syntax())?;
    match values.as_slice() {
        &[x, y, width, height] => Ok(RegionSpec::new(name, Rect::new(x, y, width, height))),
        _ => Err(syntax()),
    }
}
