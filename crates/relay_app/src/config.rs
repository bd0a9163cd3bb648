use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use relay_core::ColumnProjection;
use relay_engine::{FetchSettings, SiteConfig};
use serde::{Deserialize, Serialize};

/// Contents of the `relay.ron` configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Column projection applied by `upload --project` unless overridden on the command line.
    #[serde(default)]
    pub projection: Option<ProjectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = FetchSettings::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            redirect_limit: defaults.redirect_limit,
            max_bytes: defaults.max_bytes,
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            ..FetchSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub id_column: String,
    pub status_column: String,
    pub excluded_status: String,
}

impl From<ProjectionConfig> for ColumnProjection {
    fn from(config: ProjectionConfig) -> Self {
        ColumnProjection {
            id_column: config.id_column,
            status_column: config.status_column,
            excluded_status: config.excluded_status,
        }
    }
}

pub fn load(path: &Path) -> Result<RelayConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn parse(text: &str) -> Result<RelayConfig> {
    Ok(ron::from_str(text)?)
}
