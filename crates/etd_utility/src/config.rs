//! Host application settings consumed by the utilities.
//!
//! # Invariants
//! - Every field has a default, so a partial (or empty) JSON object loads.
//! - Values are validated where they are used, not at load time.

use crate::assets::require_config::{PackageListShape, RequireConfigBuilder};
use crate::date::{parse_zone, DateResult, Zone};
use crate::price::{PriceConfig, PriceRounder};
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Absolute base URL of the site, echoed as the loader `baseUrl`.
    pub base_url: String,
    /// Enables loader cache busting.
    pub debug: bool,
    /// User timezone: IANA name (`Europe/Paris`), `+HH:MM` or `UTC`.
    /// `None` keeps dates as given.
    pub timezone: Option<String>,
    pub locale: String,
    pub price: PriceConfig,
    /// Root directory of the active theme (layouts under `html/utility`).
    pub theme_path: PathBuf,
    pub package_list_shape: PackageListShape,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            debug: false,
            timezone: None,
            locale: "fr_FR".to_string(),
            price: PriceConfig::default(),
            theme_path: PathBuf::from("theme"),
            package_list_shape: PackageListShape::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        debug!(
            "event=config_load module=config status=ok path={} debug={}",
            path.display(),
            config.debug
        );
        Ok(config)
    }

    /// Parsed timezone, if one is configured.
    pub fn zone(&self) -> DateResult<Option<Zone>> {
        self.timezone
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(parse_zone)
            .transpose()
    }

    pub fn price_rounder(&self) -> PriceRounder {
        PriceRounder::new(self.price)
    }

    /// Fresh loader builder for one render pass.
    pub fn loader(&self) -> RequireConfigBuilder {
        RequireConfigBuilder::new().with_package_shape(self.package_list_shape)
    }
}
