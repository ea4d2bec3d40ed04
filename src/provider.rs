//! Corpus providers backed by real sources.
//!
//! Two providers implement [`CorpusProvider`]:
//!
//! - [`CsvFileProvider`] reads a local CSV export.
//! - [`CkanProvider`] asks a CKAN portal for the dataset's resources,
//!   downloads the best CSV resource into a local cache and reads it.
//!
//! Both surface every failure as [`Error::Acquisition`] (or [`Error::Io`]),
//! which callers report as "data source unavailable".

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

use legislacion_core::provider::CorpusProvider;
use legislacion_core::{Corpus, Error, Result};

use crate::config::Config;

/// Resource formats in order of preference. Only CSV is readable.
const FORMAT_PREFERENCE: &[&str] = &["CSV", "XLSX", "XLS"];

/// Read a CSV file into a [`Corpus`].
///
/// The first row is the header. A leading byte-order mark is dropped and
/// short or long rows are tolerated; [`Corpus::new`] pads or truncates them.
pub fn read_csv(path: &Path) -> Result<Corpus> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read csv");
    Ok(Corpus::new(columns, rows))
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        other => Error::Acquisition(format!(
            "failed to read {}: {:?}",
            path.display(),
            other
        )),
    }
}

async fn read_csv_blocking(path: PathBuf) -> Result<Corpus> {
    tokio::task::spawn_blocking(move || read_csv(&path))
        .await
        .map_err(|e| Error::Acquisition(format!("csv reader task failed: {}", e)))?
}

/// Reads the corpus from a local CSV file.
pub struct CsvFileProvider {
    path: PathBuf,
}

impl CsvFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CorpusProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv"
    }

    async fn load(&self) -> Result<Corpus> {
        if !self.path.exists() {
            return Err(Error::Acquisition(format!(
                "csv file not found: {}",
                self.path.display()
            )));
        }
        read_csv_blocking(self.path.clone()).await
    }
}

// ============ CKAN ============

#[derive(Debug, Deserialize)]
struct PackageShow {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    #[serde(default)]
    resources: Vec<Resource>,
}

/// A downloadable resource listed by `package_show`.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub url: String,
}

impl Resource {
    /// Display name for logs: the portal's resource name, else the URL.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.url)
    }
}

/// Pick the resource to download: the first CSV, else the first XLSX,
/// else the first XLS. Resources without a URL are ignored.
pub fn best_resource(resources: &[Resource]) -> Option<&Resource> {
    FORMAT_PREFERENCE.iter().find_map(|format| {
        resources.iter().find(|r| {
            !r.url.trim().is_empty() && r.format.trim().eq_ignore_ascii_case(format)
        })
    })
}

/// Cache location for a resource URL: `<cache_dir>/<sha256(url)>.csv`.
pub fn cache_path(cache_dir: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    cache_dir.join(format!("{:x}.csv", hasher.finalize()))
}

/// Downloads the dataset from a CKAN portal, caching the file locally.
pub struct CkanProvider {
    portal: String,
    dataset: String,
    cache_dir: PathBuf,
    timeout: Duration,
}

impl CkanProvider {
    pub fn new(
        portal: impl Into<String>,
        dataset: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            portal: portal.into(),
            dataset: dataset.into(),
            cache_dir: cache_dir.into(),
            timeout,
        }
    }

    fn package_show_url(&self) -> String {
        format!(
            "{}/api/3/action/package_show?id={}",
            self.portal.trim_end_matches('/'),
            self.dataset
        )
    }

    async fn resolve_resource(&self, client: &reqwest::Client) -> Result<Resource> {
        let url = self.package_show_url();
        tracing::info!(%url, "querying ckan package");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| acquisition("package_show request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Acquisition(format!(
                "package_show returned {} for dataset '{}'",
                status, self.dataset
            )));
        }
        let body: PackageShow = response
            .json()
            .await
            .map_err(|e| acquisition("invalid package_show response", e))?;

        let package = match body.result {
            Some(package) if body.success => package,
            _ => {
                return Err(Error::Acquisition(format!(
                    "dataset '{}' not available on {}",
                    self.dataset, self.portal
                )))
            }
        };

        let resource = best_resource(&package.resources).cloned().ok_or_else(|| {
            Error::Acquisition(format!(
                "dataset '{}' has no CSV or spreadsheet resource",
                self.dataset
            ))
        })?;

        if !resource.format.trim().eq_ignore_ascii_case("CSV") {
            return Err(Error::Acquisition(format!(
                "resource format {} is not supported, only CSV can be read",
                resource.format.trim().to_uppercase()
            )));
        }
        Ok(resource)
    }

    async fn download(
        &self,
        client: &reqwest::Client,
        resource: &Resource,
        target: &Path,
    ) -> Result<()> {
        tracing::info!(resource = resource.label(), url = %resource.url, "downloading resource");
        let response = client
            .get(&resource.url)
            .send()
            .await
            .map_err(|e| acquisition("resource download failed", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Acquisition(format!(
                "resource download returned {}",
                status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| acquisition("resource download interrupted", e))?;

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        // Write to a sibling file first so a partial download is never reused.
        let partial = target.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, target).await?;
        Ok(())
    }
}

fn acquisition(context: &str, err: reqwest::Error) -> Error {
    Error::Acquisition(format!("{}: {}", context, err))
}

#[async_trait]
impl CorpusProvider for CkanProvider {
    fn name(&self) -> &str {
        "ckan"
    }

    async fn load(&self) -> Result<Corpus> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| acquisition("http client setup failed", e))?;

        let resource = self.resolve_resource(&client).await?;
        let target = cache_path(&self.cache_dir, &resource.url);

        if target.exists() {
            tracing::info!(path = %target.display(), "using cached resource");
        } else {
            self.download(&client, &resource, &target).await?;
        }

        read_csv_blocking(target).await
    }
}

/// Build the provider selected by `[source]`.
pub fn create_provider(config: &Config) -> anyhow::Result<Box<dyn CorpusProvider>> {
    let source = &config.source;
    match source.kind.as_str() {
        "csv" => {
            let path = source
                .path
                .clone()
                .ok_or_else(|| anyhow::anyhow!("source.path required for csv source"))?;
            Ok(Box::new(CsvFileProvider::new(path)))
        }
        "ckan" => Ok(Box::new(CkanProvider::new(
            source.portal.clone(),
            source.dataset.clone(),
            source.cache_dir.clone(),
            source.timeout(),
        ))),
        other => anyhow::bail!("Unknown source kind: {}", other),
    }
}
