//! Sending one window's classified records to the record store.
//!
//! Creates and updates go out as one document each; deletes go out one record at a time.
//! A failed call is logged, dumped and reported, and dispatch moves on.

use crate::diagnostics::DumpWriter;
use crate::serializer::CrudBatch;
use rdfslice_records::{ApiFailure, IndexationMode, Operation, RecordStore};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchFailure {
    pub operation: Operation,
    /// Record concerned, for deletes.
    pub subject: Option<String>,
    pub message: String,
    pub dump: Option<PathBuf>,
}

/// What a window's dispatch achieved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn absorb(&mut self, other: DispatchReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.failures.extend(other.failures);
    }
}

pub struct Dispatcher<'a, R> {
    records: &'a R,
    dataset: &'a str,
    mode: IndexationMode,
    dumps: &'a DumpWriter,
}

impl<'a, R: RecordStore> Dispatcher<'a, R> {
    pub fn new(records: &'a R, dataset: &'a str, mode: IndexationMode, dumps: &'a DumpWriter) -> Self {
        Self {
            records,
            dataset,
            mode,
            dumps,
        }
    }

    fn failed(&self, failure: ApiFailure, subject: Option<&str>) -> DispatchFailure {
        let dump = self.dumps.write(self.dataset, &failure);
        tracing::error!(
            dataset = %self.dataset,
            operation = %failure.operation,
            subject = subject.unwrap_or_default(),
            status_message = %failure.message,
            description = %failure.description,
            dump = ?dump,
            "record-store call failed"
        );
        DispatchFailure {
            operation: failure.operation,
            subject: subject.map(str::to_string),
            message: failure.to_string(),
            dump,
        }
    }

    pub fn dispatch(&self, batch: &CrudBatch) -> DispatchReport {
        let mut report = DispatchReport::default();

        if let Some(document) = batch.create_document() {
            let started = Instant::now();
            match self.records.create_records(self.dataset, &document, self.mode) {
                Ok(()) => report.created += batch.create_count,
                Err(failure) => report.failures.push(self.failed(failure, None)),
            }
            tracing::debug!(
                records = batch.create_count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "create call"
            );
        }

        if let Some(document) = batch.update_document() {
            let started = Instant::now();
            match self.records.update_records(self.dataset, &document) {
                Ok(()) => report.updated += batch.update_count,
                Err(failure) => report.failures.push(self.failed(failure, None)),
            }
            tracing::debug!(
                records = batch.update_count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "update call"
            );
        }

        if !batch.deletes.is_empty() {
            let started = Instant::now();
            for subject in &batch.deletes {
                match self.records.delete_record(self.dataset, subject.as_str()) {
                    Ok(()) => report.deleted += 1,
                    Err(failure) => report
                        .failures
                        .push(self.failed(failure, Some(subject.as_str()))),
                }
            }
            tracing::debug!(
                records = batch.deletes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "delete calls"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::N3_PREFIX;
    use rdfslice_records::{RecordedCall, RecordingStore};
    use rdfslice_store::Node;

    const DATASET: &str = "http://ex.org/d/";

    fn batch() -> CrudBatch {
        CrudBatch {
            creates: "<http://ex.org/a> <http://ex.org/p> <http://ex.org/o> .\n".to_string(),
            create_count: 1,
            updates: String::new(),
            update_count: 0,
            deletes: vec![Node::iri("http://ex.org/x"), Node::iri("http://ex.org/y")],
        }
    }

    #[test]
    fn creates_once_and_deletes_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = DumpWriter::new(dir.path());
        let store = RecordingStore::new();
        let report =
            Dispatcher::new(&store, DATASET, IndexationMode::Full, &dumps).dispatch(&batch());

        assert!(report.is_clean());
        assert_eq!((report.created, report.updated, report.deleted), (1, 0, 2));
        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            RecordedCall::CreateRecords { document, mode, .. } => {
                assert!(document.starts_with(N3_PREFIX));
                assert_eq!(*mode, IndexationMode::Full);
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(
            calls[2],
            RecordedCall::DeleteRecord {
                dataset: DATASET.to_string(),
                uri: "http://ex.org/y".to_string()
            }
        );
    }

    #[test]
    fn one_failed_delete_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = DumpWriter::new(dir.path());
        let store = RecordingStore::new();
        store.fail_delete_of("http://ex.org/x");

        let report =
            Dispatcher::new(&store, DATASET, IndexationMode::Full, &dumps).dispatch(&batch());
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.subject.as_deref(), Some("http://ex.org/x"));
        assert!(failure.dump.as_ref().is_some_and(|p| p.exists()));
        assert_eq!(store.calls().len(), 3);
    }

    #[test]
    fn empty_batch_sends_nothing() {
        let dumps = DumpWriter::default();
        let store = RecordingStore::new();
        let report = Dispatcher::new(&store, DATASET, IndexationMode::Full, &dumps)
            .dispatch(&CrudBatch::default());
        assert_eq!(report, DispatchReport::default());
        assert!(store.calls().is_empty());
    }
}
