//! rdfslice CLI
//!
//! Imports the RDF files listed in a JSON configuration into their record-store
//! datasets, one window of records at a time.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rdfslice_pipeline::{DumpWriter, Importer, ImporterConfig, OntologySnapshot};
use rdfslice_records::{HttpRecordStore, HttpRecordStoreConfig, RecordStore, RecordingStore};
use rdfslice_store::{HttpStoreConfig, HttpTripleStore, MemoryStore, TripleStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::{Config, DatasetPlan, Overrides};

#[derive(Parser)]
#[command(name = "rdfslice")]
#[command(
    author,
    version,
    about = "Bulk-import RDF files into record-store datasets, one slice at a time"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "rdfslice.json")]
    config: PathBuf,

    /// Only import this dataset (repeatable)
    #[arg(long = "dataset", value_name = "URI")]
    datasets: Vec<String>,

    /// Records per window, for every dataset
    #[arg(long)]
    slice_size: Option<u64>,

    /// Delete and recreate every dataset before importing
    #[arg(long)]
    force_reload: bool,

    /// Re-send the stored records to the search index instead of importing files
    #[arg(long)]
    reindex: bool,

    /// Run against an in-memory triple store and record store; nothing remote is touched
    #[arg(long)]
    dry_run: bool,

    /// Record-store API key
    #[arg(long, env = "RDFSLICE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Debug logging (RUST_LOG is used otherwise)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            slice_size: self.slice_size,
            force_reload: self.force_reload,
            reindex: self.reindex,
            datasets: self.datasets.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs one dataset. `Ok(false)` when some file could not be imported.
fn run_plan<S: TripleStore, R: RecordStore>(
    importer: &Importer<S, R>,
    plan: &DatasetPlan,
) -> Result<bool> {
    let summary = importer
        .run(&plan.descriptor)
        .with_context(|| format!("import of dataset <{}> aborted", plan.descriptor.uri))?;
    report::print_summary(&summary);
    let clean = summary.failed_files().next().is_none();
    Ok(clean)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    let overrides = cli.overrides();
    let plans = config.plans(&overrides)?;
    if plans.is_empty() {
        println!("{} no datasets to import", "warning".yellow().bold());
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(
        config = %cli.config.display(),
        datasets = plans.len(),
        dry_run = cli.dry_run,
        "starting import"
    );

    let snapshot = OntologySnapshot::load(&config.setup.ontology_dir)?;
    let importer_config = ImporterConfig {
        audit_dir: config.setup.audit_dir.clone(),
        dumps: config
            .setup
            .dump_dir
            .clone()
            .map(DumpWriter::new)
            .unwrap_or_default(),
    };

    let mut all_files_ok = true;
    if cli.dry_run {
        let store = MemoryStore::new();
        let records = RecordingStore::new();
        for plan in &plans {
            let importer =
                Importer::new(&store, &records, snapshot.clone(), importer_config.clone());
            all_files_ok &= run_plan(&importer, plan)?;
        }
        report::print_dry_run(&records);
    } else {
        let store = HttpTripleStore::new(HttpStoreConfig {
            sparql_url: config.setup.sparql_endpoint.clone(),
            graph_store_url: config.setup.graph_store_endpoint.clone(),
            username: config.setup.triplestore_username.clone(),
            password: config.setup.triplestore_password.clone(),
            timeout: config.timeout(),
        })
        .context("failed to set up the triple-store client")?;

        for plan in &plans {
            let records = HttpRecordStore::new(HttpRecordStoreConfig {
                endpoint: plan.service_endpoint.clone(),
                credentials: config.credentials(&overrides),
                timeout: config.timeout(),
            })
            .context("failed to set up the record-store client")?;
            let importer = Importer::new(&store, records, snapshot.clone(), importer_config.clone());
            all_files_ok &= run_plan(&importer, plan)?;
        }
    }

    if all_files_ok {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} some files could not be imported", "error".red().bold());
        Ok(ExitCode::FAILURE)
    }
}
