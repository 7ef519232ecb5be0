//! Staged, paginated, action-classified RDF import.
//!
//! One import of a file into a dataset goes through these steps:
//!
//! 1. [`provision`]: make sure the dataset exists (or recreate it for a full reload).
//! 2. [`staging`]: clear a scratch graph and bulk-load the file into it.
//! 3. [`planner`]: count the typed subjects and cut them into fixed-size windows.
//! 4. [`serializer`]: rebuild each window's records as N3 and sort them into
//!    create / update / delete by their `wsf:crudAction` control triple.
//! 5. [`dispatch`]: send each window to the record store. Failed calls are logged and
//!    dumped, never fatal.
//! 6. [`audit`]: list the predicates and types the ontology snapshot does not know.
//! 7. clear the scratch graph.
//!
//! [`Importer`] drives the whole sequence over the [`rdfslice_store::TripleStore`] and
//! [`rdfslice_records::RecordStore`] it is given.

pub mod audit;
pub mod descriptor;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod importer;
pub mod planner;
pub mod provision;
pub mod serializer;
pub mod snapshot;
pub mod staging;

pub use audit::UndefinedTermReport;
pub use descriptor::{DatasetDescriptor, RunMode, DEFAULT_SLICE_SIZE};
pub use diagnostics::DumpWriter;
pub use dispatch::{DispatchFailure, DispatchReport};
pub use error::{ImportError, ImportResult, SnapshotError};
pub use importer::{FileReport, FileSummary, ImportSummary, Importer, ImporterConfig};
pub use planner::{Progress, SlicePlan, Window};
pub use provision::ProvisionOutcome;
pub use serializer::{classify_window, CrudAction, CrudBatch, CRUD_ACTION};
pub use snapshot::OntologySnapshot;
