//! The import run: provision, then stage, slice, classify, dispatch and audit each file.

use crate::audit::{audit_graph, UndefinedTermReport};
use crate::descriptor::DatasetDescriptor;
use crate::diagnostics::DumpWriter;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::{ImportError, ImportResult};
use crate::planner::SlicePlan;
use crate::provision::{ProvisionOutcome, Provisioner};
use crate::serializer::classify_window;
use crate::snapshot::OntologySnapshot;
use crate::staging::StagingController;
use rdfslice_records::RecordStore;
use rdfslice_store::TripleStore;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where the importer writes its artifacts.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Directory receiving the undefined-vocabulary logs.
    pub audit_dir: PathBuf,
    pub dumps: DumpWriter,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            audit_dir: std::env::temp_dir(),
            dumps: DumpWriter::default(),
        }
    }
}

/// Outcome of one file that went all the way through.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub file: PathBuf,
    pub graph: String,
    pub records: u64,
    pub windows: u64,
    pub dispatch: DispatchReport,
    /// `None` when the run mode skips the audit.
    pub undefined: Option<UndefinedTermReport>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct FileReport {
    pub file: PathBuf,
    pub outcome: Result<FileSummary, ImportError>,
}

#[derive(Debug)]
pub struct ImportSummary {
    pub dataset: String,
    pub provision: ProvisionOutcome,
    pub files: Vec<FileReport>,
}

impl ImportSummary {
    /// Every file imported and every call succeeded.
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| match &f.outcome {
            Ok(summary) => summary.dispatch.is_clean(),
            Err(_) => false,
        })
    }

    pub fn failed_files(&self) -> impl Iterator<Item = (&Path, &ImportError)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            Ok(_) => None,
            Err(err) => Some((f.file.as_path(), err)),
        })
    }

    pub fn dispatch_totals(&self) -> DispatchReport {
        let mut totals = DispatchReport::default();
        for file in &self.files {
            if let Ok(summary) = &file.outcome {
                totals.absorb(summary.dispatch.clone());
            }
        }
        totals
    }
}

pub struct Importer<S, R> {
    store: S,
    records: R,
    snapshot: OntologySnapshot,
    config: ImporterConfig,
}

impl<S: TripleStore, R: RecordStore> Importer<S, R> {
    pub fn new(store: S, records: R, snapshot: OntologySnapshot, config: ImporterConfig) -> Self {
        Self {
            store,
            records,
            snapshot,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    /// Imports every file of `dataset`.
    ///
    /// Returns `Err` only for run-fatal errors (bad configuration, provisioning). A file
    /// that fails to stage or query is reported in the summary and the next file proceeds.
    pub fn run(&self, dataset: &DatasetDescriptor) -> ImportResult<ImportSummary> {
        if dataset.slice_size == 0 {
            return Err(ImportError::Config(format!(
                "slice size of dataset <{}> must be at least 1",
                dataset.uri
            )));
        }

        let started = Instant::now();
        let provision = Provisioner::new(&self.records, &self.config.dumps).ensure(dataset)?;

        // The dataset graph is reindexed as a whole, once, whatever the file list says.
        let targets: Vec<PathBuf> = if dataset.mode.stages() {
            dataset.files.clone()
        } else {
            vec![dataset.files.first().cloned().unwrap_or_default()]
        };

        let mut files = Vec::with_capacity(targets.len());
        for file in &targets {
            let outcome = self.import_file(dataset, file);
            if let Err(err) = &outcome {
                tracing::error!(
                    dataset = %dataset.uri,
                    file = %file.display(),
                    error = %err,
                    "file import failed"
                );
            }
            files.push(FileReport {
                file: file.clone(),
                outcome,
            });
        }

        tracing::info!(
            dataset = %dataset.uri,
            files = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset import finished"
        );
        Ok(ImportSummary {
            dataset: dataset.uri.clone(),
            provision,
            files,
        })
    }

    /// Stages, slices, dispatches and audits one file. Provisioning must already be done.
    pub fn import_file(&self, dataset: &DatasetDescriptor, file: &Path) -> ImportResult<FileSummary> {
        let started = Instant::now();
        let graph = dataset.staging_graph();
        let staging = StagingController::new(&self.store, &graph);

        if dataset.mode.stages() {
            staging.stage(file)?;
        }

        let processed = self.process_staged(dataset, file, &graph);

        if dataset.mode.stages() {
            match &processed {
                Ok(_) => staging.release()?,
                Err(_) => {
                    if let Err(err) = staging.release() {
                        tracing::warn!(graph = %graph, error = %err, "failed to clear staging graph");
                    }
                }
            }
        }

        let (records, windows, dispatch, undefined) = processed?;
        let summary = FileSummary {
            file: file.to_path_buf(),
            graph,
            records,
            windows,
            dispatch,
            undefined,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            file = %file.display(),
            records = summary.records,
            created = summary.dispatch.created,
            updated = summary.dispatch.updated,
            deleted = summary.dispatch.deleted,
            failures = summary.dispatch.failures.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "file imported"
        );
        Ok(summary)
    }

    fn process_staged(
        &self,
        dataset: &DatasetDescriptor,
        file: &Path,
        graph: &str,
    ) -> ImportResult<(u64, u64, DispatchReport, Option<UndefinedTermReport>)> {
        let query_error = |error| ImportError::Query {
            graph: graph.to_string(),
            error,
        };

        let total = self.store.count_typed_subjects(graph).map_err(query_error)?;
        let plan = SlicePlan::new(total, dataset.slice_size)?;
        tracing::info!(
            graph = %graph,
            records = total,
            windows = plan.window_count(),
            "slicing staged records"
        );

        let dispatcher = Dispatcher::new(
            &self.records,
            &dataset.uri,
            dataset.mode.indexation_mode(),
            &self.config.dumps,
        );
        let mut dispatched = DispatchReport::default();
        for window in plan.windows() {
            let rows = self
                .store
                .window_rows(graph, window.offset, window.limit)
                .map_err(query_error)?;

            let build_started = Instant::now();
            let batch = classify_window(&rows);
            tracing::debug!(
                offset = window.offset,
                limit = window.limit,
                rows = rows.len(),
                elapsed_ms = build_started.elapsed().as_millis() as u64,
                "built N3 documents"
            );

            dispatched.absorb(dispatcher.dispatch(&batch));
            let progress = plan.progress_after(&window);
            let percent = (progress.ratio() * 1000.0).round() / 10.0;
            tracing::info!(
                dataset = %dataset.uri,
                progress = %progress,
                percent,
                "window dispatched"
            );
        }

        let undefined = if dataset.mode.stages() {
            let report = audit_graph(&self.store, graph, &self.snapshot)?;
            report.write(&self.config.audit_dir, file)?;
            Some(report)
        } else {
            None
        };

        Ok((total, plan.window_count(), dispatched, undefined))
    }
}
