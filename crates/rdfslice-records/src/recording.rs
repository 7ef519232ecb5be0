//! In-process record store that records every call.
//!
//! Used for dry runs and tests. Datasets live in a map; records are not interpreted,
//! only logged, so the documents a run would send can be inspected afterwards.

use crate::{ApiFailure, ApiResult, DatasetMetadata, IndexationMode, Operation, RecordStore};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// One call received by a [`RecordingStore`], successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    ReadDataset {
        uri: String,
    },
    CreateDataset {
        uri: String,
        metadata: DatasetMetadata,
    },
    DeleteDataset {
        uri: String,
    },
    CreateRecords {
        dataset: String,
        document: String,
        mode: IndexationMode,
    },
    UpdateRecords {
        dataset: String,
        document: String,
    },
    DeleteRecord {
        dataset: String,
        uri: String,
    },
}

impl RecordedCall {
    pub fn operation(&self) -> Operation {
        match self {
            Self::ReadDataset { .. } => Operation::DatasetRead,
            Self::CreateDataset { .. } => Operation::DatasetCreate,
            Self::DeleteDataset { .. } => Operation::DatasetDelete,
            Self::CreateRecords { .. } => Operation::CrudCreate,
            Self::UpdateRecords { .. } => Operation::CrudUpdate,
            Self::DeleteRecord { .. } => Operation::CrudDelete,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<RecordedCall>,
    datasets: HashMap<String, DatasetMetadata>,
    failing: HashSet<Operation>,
    failing_deletes: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    state: Mutex<State>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing dataset.
    pub fn with_dataset(self, uri: impl Into<String>, metadata: DatasetMetadata) -> Self {
        self.state.lock().datasets.insert(uri.into(), metadata);
        self
    }

    /// Makes every later call of `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.state.lock().failing.insert(operation);
    }

    /// Makes record deletes of `uri` fail.
    pub fn fail_delete_of(&self, uri: impl Into<String>) {
        self.state.lock().failing_deletes.insert(uri.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn dataset(&self, uri: &str) -> Option<DatasetMetadata> {
        self.state.lock().datasets.get(uri).cloned()
    }

    fn record(&self, call: RecordedCall) -> ApiResult<()> {
        let mut state = self.state.lock();
        let operation = call.operation();
        let injected = state.failing.contains(&operation)
            || matches!(&call, RecordedCall::DeleteRecord { uri, .. } if state.failing_deletes.contains(uri));
        state.calls.push(call);
        if injected {
            return Err(ApiFailure {
                status: Some(500),
                description: "injected failure".to_string(),
                ..ApiFailure::new(operation, "Internal Server Error")
            });
        }
        Ok(())
    }
}

impl RecordStore for RecordingStore {
    fn read_dataset(&self, uri: &str) -> ApiResult<Option<DatasetMetadata>> {
        self.record(RecordedCall::ReadDataset {
            uri: uri.to_string(),
        })?;
        Ok(self.dataset(uri))
    }

    fn create_dataset(&self, uri: &str, metadata: &DatasetMetadata) -> ApiResult<()> {
        self.record(RecordedCall::CreateDataset {
            uri: uri.to_string(),
            metadata: metadata.clone(),
        })?;
        self.state
            .lock()
            .datasets
            .insert(uri.to_string(), metadata.clone());
        Ok(())
    }

    fn delete_dataset(&self, uri: &str) -> ApiResult<()> {
        self.record(RecordedCall::DeleteDataset {
            uri: uri.to_string(),
        })?;
        self.state.lock().datasets.remove(uri);
        Ok(())
    }

    fn create_records(&self, dataset: &str, n3: &str, mode: IndexationMode) -> ApiResult<()> {
        self.record(RecordedCall::CreateRecords {
            dataset: dataset.to_string(),
            document: n3.to_string(),
            mode,
        })
    }

    fn update_records(&self, dataset: &str, n3: &str) -> ApiResult<()> {
        self.record(RecordedCall::UpdateRecords {
            dataset: dataset.to_string(),
            document: n3.to_string(),
        })
    }

    fn delete_record(&self, dataset: &str, uri: &str) -> ApiResult<()> {
        self.record(RecordedCall::DeleteRecord {
            dataset: dataset.to_string(),
            uri: uri.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_lifecycle_is_tracked() {
        let store = RecordingStore::new();
        assert_eq!(store.read_dataset("http://ex.org/d").unwrap(), None);

        let meta = DatasetMetadata {
            title: "D".to_string(),
            ..DatasetMetadata::default()
        };
        store.create_dataset("http://ex.org/d", &meta).unwrap();
        assert_eq!(store.read_dataset("http://ex.org/d").unwrap(), Some(meta));

        store.delete_dataset("http://ex.org/d").unwrap();
        assert_eq!(store.read_dataset("http://ex.org/d").unwrap(), None);
        assert_eq!(store.calls().len(), 5);
    }

    #[test]
    fn injected_failures_are_still_logged() {
        let store = RecordingStore::new();
        store.fail_delete_of("http://ex.org/r2");
        store.delete_record("http://ex.org/d", "http://ex.org/r1").unwrap();
        let err = store
            .delete_record("http://ex.org/d", "http://ex.org/r2")
            .unwrap_err();
        assert_eq!(err.operation, Operation::CrudDelete);
        assert_eq!(err.status, Some(500));
        assert_eq!(store.calls().len(), 2);
    }
}
