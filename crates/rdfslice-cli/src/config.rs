//! JSON configuration file and command-line overrides.

use anyhow::{anyhow, bail, Context, Result};
use rdfslice_pipeline::{DatasetDescriptor, RunMode, DEFAULT_SLICE_SIZE};
use rdfslice_records::{Credentials, DatasetMetadata};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub setup: Setup,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Setup {
    /// SPARQL 1.1 query/update endpoint of the staging triple store.
    pub sparql_endpoint: String,
    /// SPARQL 1.1 Graph Store endpoint used for bulk loads.
    pub graph_store_endpoint: String,
    #[serde(default)]
    pub triplestore_username: Option<String>,
    #[serde(default)]
    pub triplestore_password: Option<String>,
    /// Record-store service root.
    pub service_endpoint: String,
    #[serde(default)]
    pub credentials: CredentialsEntry,
    /// Directory holding the ontology snapshot files.
    pub ontology_dir: PathBuf,
    /// Directory receiving the undefined-vocabulary logs.
    pub audit_dir: PathBuf,
    /// Directory receiving diagnostic dumps. Defaults to the system temp dir.
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
    #[serde(default = "default_slice_size")]
    pub slice_size: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsEntry {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetEntry {
    pub uri: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub force_reload: bool,
    #[serde(default)]
    pub force_reload_search_index: bool,
    /// Record-store service root for this dataset only.
    #[serde(default)]
    pub service_endpoint: Option<String>,
    #[serde(default)]
    pub slice_size: Option<u64>,
}

fn default_slice_size() -> u64 {
    DEFAULT_SLICE_SIZE
}

/// Command-line settings that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub slice_size: Option<u64>,
    pub force_reload: bool,
    pub reindex: bool,
    /// Restrict the run to these dataset URIs.
    pub datasets: Vec<String>,
    pub api_key: Option<String>,
}

/// One dataset, ready to run.
#[derive(Debug, Clone)]
pub struct DatasetPlan {
    pub descriptor: DatasetDescriptor,
    pub service_endpoint: String,
}

fn same_uri(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parses a config; relative paths are taken relative to `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let mut config: Config = serde_json::from_str(text)?;
        let setup = &mut config.setup;
        setup.ontology_dir = resolve(base, &setup.ontology_dir);
        setup.audit_dir = resolve(base, &setup.audit_dir);
        if let Some(dir) = setup.dump_dir.take() {
            setup.dump_dir = Some(resolve(base, &dir));
        }
        for dataset in &mut config.datasets {
            for file in &mut dataset.files {
                *file = resolve(base, file);
            }
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.setup.timeout_secs.map(Duration::from_secs)
    }

    /// The API key from the command line or environment wins over the file.
    pub fn credentials(&self, overrides: &Overrides) -> Credentials {
        let entry = &self.setup.credentials;
        Credentials {
            app_id: entry.app_id.clone(),
            api_key: overrides
                .api_key
                .clone()
                .or_else(|| entry.api_key.clone())
                .unwrap_or_default(),
            user: entry.user.clone(),
        }
    }

    pub fn plans(&self, overrides: &Overrides) -> Result<Vec<DatasetPlan>> {
        for wanted in &overrides.datasets {
            if !self.datasets.iter().any(|d| same_uri(&d.uri, wanted)) {
                bail!("dataset <{wanted}> is not in the configuration");
            }
        }

        self.datasets
            .iter()
            .filter(|d| {
                overrides.datasets.is_empty()
                    || overrides.datasets.iter().any(|w| same_uri(&d.uri, w))
            })
            .map(|entry| {
                let slice_size = overrides
                    .slice_size
                    .or(entry.slice_size)
                    .unwrap_or(self.setup.slice_size);
                if slice_size == 0 {
                    return Err(anyhow!(
                        "slice size for dataset <{}> must be at least 1",
                        entry.uri
                    ));
                }
                let mode = RunMode::from_flags(
                    entry.force_reload || overrides.force_reload,
                    entry.force_reload_search_index || overrides.reindex,
                );
                let descriptor = DatasetDescriptor::new(entry.uri.clone())
                    .with_files(entry.files.iter().cloned())
                    .with_mode(mode)
                    .with_slice_size(slice_size)
                    .with_metadata(DatasetMetadata {
                        creator: entry.creator.clone(),
                        title: entry.title.clone(),
                        description: entry.description.clone(),
                    });
                Ok(DatasetPlan {
                    descriptor,
                    service_endpoint: entry
                        .service_endpoint
                        .clone()
                        .unwrap_or_else(|| self.setup.service_endpoint.clone()),
                })
            })
            .collect()
    }
}
