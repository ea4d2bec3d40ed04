//! Configuration parsing and validation.
//!
//! Legislación PBA is configured via a TOML file (default
//! `./config/lpba.toml`). Every section is optional; missing values fall
//! back to the defaults below.
//!
//! ```toml
//! [source]
//! kind = "ckan"                  # or "csv"
//! portal = "https://catalogo.datos.gba.gob.ar"
//! dataset = "base-saij-de-normativa-provincial"
//! cache_dir = "./_cache"
//! timeout_secs = 120
//! # path = "./data/normas.csv"  # required when kind = "csv"
//!
//! [retrieval]
//! default_limit = 10
//! max_limit = 50
//! jurisdiction = "Buenos Aires"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use legislacion_core::SearchParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the corpus comes from.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// `"ckan"` (download from the open-data portal) or `"csv"` (local file).
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Local CSV file, for `kind = "csv"`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_portal")]
    pub portal: String,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Downloaded resources are cached here, one file per URL.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            path: None,
            portal: default_portal(),
            dataset: default_dataset(),
            cache_dir: default_cache_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_kind() -> String {
    "ckan".to_string()
}
fn default_portal() -> String {
    "https://catalogo.datos.gba.gob.ar".to_string()
}
fn default_dataset() -> String {
    "base-saij-de-normativa-provincial".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("./_cache")
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
    /// Empty string disables the jurisdiction filter.
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            jurisdiction: default_jurisdiction(),
        }
    }
}

fn default_limit() -> i64 {
    10
}
fn default_max_limit() -> i64 {
    50
}
fn default_jurisdiction() -> String {
    "Buenos Aires".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Defaults only: CKAN source, standard limits.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Core search parameters derived from `[retrieval]`.
    pub fn search_params(&self) -> SearchParams {
        let jurisdiction = self.retrieval.jurisdiction.trim();
        SearchParams {
            default_limit: self.retrieval.default_limit,
            max_limit: self.retrieval.max_limit,
            jurisdiction: if jurisdiction.is_empty() {
                None
            } else {
                Some(jurisdiction.to_string())
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate retrieval
    if config.retrieval.max_limit < 1 {
        bail!("retrieval.max_limit must be >= 1");
    }
    if !(1..=config.retrieval.max_limit).contains(&config.retrieval.default_limit) {
        bail!(
            "retrieval.default_limit must be in [1, {}]",
            config.retrieval.max_limit
        );
    }

    // Validate source
    if config.source.timeout_secs == 0 {
        bail!("source.timeout_secs must be > 0");
    }
    match config.source.kind.as_str() {
        "ckan" => {
            if config.source.portal.trim().is_empty() || config.source.dataset.trim().is_empty() {
                bail!("source.portal and source.dataset are required when kind is 'ckan'");
            }
        }
        "csv" => {
            if config.source.path.is_none() {
                bail!("source.path must be specified when kind is 'csv'");
            }
        }
        other => bail!(
            "Unknown source kind: '{}'. Must be ckan or csv.",
            other
        ),
    }

    Ok(())
}
