use rdfslice_records::ApiFailure;
use rdfslice_store::StoreError;
use std::path::PathBuf;

/// Errors that stop an import.
///
/// Dispatch failures are not here: they are reported per window and never stop a run.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Dataset read (other than not-found), create or delete failed. Stops the whole run.
    #[error("dataset provisioning failed: {error}")]
    Provisioning {
        error: ApiFailure,
        dump: Option<PathBuf>,
    },

    /// Clearing or loading the staging graph failed. Stops the current file.
    #[error("staging {} into <{graph}> failed: {error}", file.display())]
    Staging {
        file: PathBuf,
        graph: String,
        error: StoreError,
    },

    /// A count, window or audit query failed. Stops the current file.
    #[error("query on <{graph}> failed: {error}")]
    Query { graph: String, error: StoreError },

    #[error("failed to write {}: {error}", path.display())]
    Audit {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl ImportError {
    /// Whether the error ends the run, as opposed to only the file being imported.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::Provisioning { .. } | Self::Config(_) | Self::Snapshot(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read ontology snapshot {}: {error}", path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("invalid ontology snapshot {}: {error}", path.display())]
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
}

pub type ImportResult<T> = Result<T, ImportError>;
