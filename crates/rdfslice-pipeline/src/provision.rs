//! Making sure the destination dataset exists before anything is staged.

use crate::descriptor::{DatasetDescriptor, RunMode};
use crate::diagnostics::DumpWriter;
use crate::error::{ImportError, ImportResult};
use rdfslice_records::{ApiFailure, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Reindex runs never touch the dataset itself.
    Skipped,
    Existing,
    Created,
    /// Deleted and created again with its previous metadata.
    Recreated,
}

pub struct Provisioner<'a, R> {
    records: &'a R,
    dumps: &'a DumpWriter,
}

impl<'a, R: RecordStore> Provisioner<'a, R> {
    pub fn new(records: &'a R, dumps: &'a DumpWriter) -> Self {
        Self { records, dumps }
    }

    fn fatal(&self, dataset: &str, error: ApiFailure) -> ImportError {
        let dump = self.dumps.write(dataset, &error);
        tracing::error!(
            dataset = %dataset,
            operation = %error.operation,
            status_message = %error.message,
            description = %error.description,
            dump = ?dump,
            "dataset provisioning failed"
        );
        ImportError::Provisioning { error, dump }
    }

    pub fn ensure(&self, dataset: &DatasetDescriptor) -> ImportResult<ProvisionOutcome> {
        let uri = dataset.uri.as_str();
        if dataset.mode == RunMode::ReindexOnly {
            return Ok(ProvisionOutcome::Skipped);
        }

        let existing = self
            .records
            .read_dataset(uri)
            .map_err(|e| self.fatal(uri, e))?;

        match (existing, dataset.mode) {
            (Some(metadata), RunMode::FullReload) => {
                tracing::info!(dataset = %uri, "dataset exists, deleting it for a full reload");
                self.records
                    .delete_dataset(uri)
                    .map_err(|e| self.fatal(uri, e))?;
                tracing::info!(dataset = %uri, "dataset deleted");
                self.records
                    .create_dataset(uri, &metadata)
                    .map_err(|e| self.fatal(uri, e))?;
                tracing::info!(dataset = %uri, title = %metadata.title, "dataset re-created");
                Ok(ProvisionOutcome::Recreated)
            }
            (Some(_), _) => {
                tracing::info!(dataset = %uri, "dataset exists");
                Ok(ProvisionOutcome::Existing)
            }
            (None, _) => {
                tracing::info!(dataset = %uri, "dataset not found, creating it");
                self.records
                    .create_dataset(uri, &dataset.metadata)
                    .map_err(|e| self.fatal(uri, e))?;
                tracing::info!(dataset = %uri, "dataset created");
                Ok(ProvisionOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfslice_records::{DatasetMetadata, Operation, RecordedCall, RecordingStore};

    const URI: &str = "http://ex.org/datasets/d1/";

    fn dumps() -> (tempfile::TempDir, DumpWriter) {
        let dir = tempfile::tempdir().unwrap();
        let writer = DumpWriter::new(dir.path());
        (dir, writer)
    }

    fn recovered() -> DatasetMetadata {
        DatasetMetadata {
            creator: "http://ex.org/users/admin".into(),
            title: "Old title".into(),
            description: "Old description".into(),
        }
    }

    #[test]
    fn missing_dataset_is_created_with_empty_metadata() {
        let (_dir, dumps) = dumps();
        let store = RecordingStore::new();
        let outcome = Provisioner::new(&store, &dumps)
            .ensure(&DatasetDescriptor::new(URI))
            .unwrap();
        assert_eq!(outcome, ProvisionOutcome::Created);
        assert_eq!(
            store.calls(),
            vec![
                RecordedCall::ReadDataset { uri: URI.into() },
                RecordedCall::CreateDataset {
                    uri: URI.into(),
                    metadata: DatasetMetadata::default()
                },
            ]
        );
    }

    #[test]
    fn full_reload_recreates_with_recovered_metadata() {
        let (_dir, dumps) = dumps();
        let store = RecordingStore::new().with_dataset(URI, recovered());
        let dataset = DatasetDescriptor::new(URI)
            .with_mode(RunMode::FullReload)
            .with_metadata(DatasetMetadata {
                title: "Supplied".into(),
                ..DatasetMetadata::default()
            });

        let outcome = Provisioner::new(&store, &dumps).ensure(&dataset).unwrap();
        assert_eq!(outcome, ProvisionOutcome::Recreated);
        let ops: Vec<Operation> = store.calls().iter().map(RecordedCall::operation).collect();
        assert_eq!(
            ops,
            vec![
                Operation::DatasetRead,
                Operation::DatasetDelete,
                Operation::DatasetCreate
            ]
        );
        assert_eq!(store.dataset(URI), Some(recovered()));
    }

    #[test]
    fn read_failure_is_fatal_and_dumped() {
        let (dir, dumps) = dumps();
        let store = RecordingStore::new();
        store.fail(Operation::DatasetRead);

        let err = Provisioner::new(&store, &dumps)
            .ensure(&DatasetDescriptor::new(URI))
            .unwrap_err();
        assert!(err.is_run_fatal());
        match err {
            ImportError::Provisioning { dump, .. } => {
                let dump = dump.unwrap();
                assert!(dump.starts_with(dir.path()));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(store.calls().len(), 1);
    }

    #[test]
    fn reindex_skips_provisioning() {
        let (_dir, dumps) = dumps();
        let store = RecordingStore::new();
        let dataset = DatasetDescriptor::new(URI).with_mode(RunMode::ReindexOnly);
        assert_eq!(
            Provisioner::new(&store, &dumps).ensure(&dataset).unwrap(),
            ProvisionOutcome::Skipped
        );
        assert!(store.calls().is_empty());
    }
}
