//! Client side of the record-store service.
//!
//! The service manages datasets (read / create / delete) and the records inside them
//! (create / update / delete, with N3 documents as payload). Every call either succeeds
//! or yields an [`ApiFailure`] carrying the status message, its description and enough
//! of the exchange to write a diagnostic dump.

mod auth;
pub mod http;
pub mod recording;
pub mod resultset;

use serde::Serialize;
use std::fmt;

pub use auth::Credentials;
pub use http::{HttpRecordStore, HttpRecordStoreConfig};
pub use recording::{RecordedCall, RecordingStore};

/// Error id the service reports when a dataset read targets an unknown dataset.
pub const DATASET_NOT_FOUND: &str = "WS-DATASET-READ-304";

/// MIME type of the documents sent to the CRUD endpoints.
pub const N3_MIME: &str = "application/rdf+n3";

/// Descriptive metadata of a dataset. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetMetadata {
    pub creator: String,
    pub title: String,
    pub description: String,
}

/// Where a created record gets indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexationMode {
    /// Triple store and search index.
    Full,
    /// Search index only; the triples are already stored.
    SearchIndexOnly,
}

impl IndexationMode {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::SearchIndexOnly => "searchindex",
        }
    }
}

/// The remote operation a request performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    DatasetRead,
    DatasetCreate,
    DatasetDelete,
    CrudCreate,
    CrudUpdate,
    CrudDelete,
}

impl Operation {
    /// Endpoint path relative to the service root.
    pub fn path(self) -> &'static str {
        match self {
            Self::DatasetRead => "dataset/read/",
            Self::DatasetCreate => "dataset/create/",
            Self::DatasetDelete => "dataset/delete/",
            Self::CrudCreate => "crud/create/",
            Self::CrudUpdate => "crud/update/",
            Self::CrudDelete => "crud/delete/",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DatasetRead => "Dataset Read",
            Self::DatasetCreate => "Dataset Create",
            Self::DatasetDelete => "Dataset Delete",
            Self::CrudCreate => "CRUD Create",
            Self::CrudUpdate => "CRUD Update",
            Self::CrudDelete => "CRUD Delete",
        };
        f.write_str(name)
    }
}

/// An unsuccessful call, transport failures included.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{operation} failed: {message} {description}")]
pub struct ApiFailure {
    pub operation: Operation,
    /// HTTP status, absent when the request never got a response.
    pub status: Option<u16>,
    /// Service error id such as `WS-DATASET-READ-304`.
    pub error_id: Option<String>,
    pub message: String,
    pub description: String,
    /// Request parameters, without credentials.
    pub request: serde_json::Value,
    /// Raw response body, if any.
    pub response: Option<String>,
}

impl ApiFailure {
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            error_id: None,
            message: message.into(),
            description: String::new(),
            request: serde_json::Value::Null,
            response: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_id.as_deref() == Some(DATASET_NOT_FOUND)
    }
}

pub type ApiResult<T> = Result<T, ApiFailure>;

/// Dataset lifecycle and record CRUD operations of the record-store service.
pub trait RecordStore {
    /// Reads a dataset's metadata. `Ok(None)` when the service reports it unknown.
    fn read_dataset(&self, uri: &str) -> ApiResult<Option<DatasetMetadata>>;

    fn create_dataset(&self, uri: &str, metadata: &DatasetMetadata) -> ApiResult<()>;

    fn delete_dataset(&self, uri: &str) -> ApiResult<()>;

    /// Creates the records described by an N3 document.
    fn create_records(&self, dataset: &str, n3: &str, mode: IndexationMode) -> ApiResult<()>;

    /// Replaces the records described by an N3 document.
    fn update_records(&self, dataset: &str, n3: &str) -> ApiResult<()>;

    /// Deletes one record.
    fn delete_record(&self, dataset: &str, uri: &str) -> ApiResult<()>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn read_dataset(&self, uri: &str) -> ApiResult<Option<DatasetMetadata>> {
        (**self).read_dataset(uri)
    }

    fn create_dataset(&self, uri: &str, metadata: &DatasetMetadata) -> ApiResult<()> {
        (**self).create_dataset(uri, metadata)
    }

    fn delete_dataset(&self, uri: &str) -> ApiResult<()> {
        (**self).delete_dataset(uri)
    }

    fn create_records(&self, dataset: &str, n3: &str, mode: IndexationMode) -> ApiResult<()> {
        (**self).create_records(dataset, n3, mode)
    }

    fn update_records(&self, dataset: &str, n3: &str) -> ApiResult<()> {
        (**self).update_records(dataset, n3)
    }

    fn delete_record(&self, dataset: &str, uri: &str) -> ApiResult<()> {
        (**self).delete_record(dataset, uri)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn read_dataset(&self, uri: &str) -> ApiResult<Option<DatasetMetadata>> {
        (**self).read_dataset(uri)
    }

    fn create_dataset(&self, uri: &str, metadata: &DatasetMetadata) -> ApiResult<()> {
        (**self).create_dataset(uri, metadata)
    }

    fn delete_dataset(&self, uri: &str) -> ApiResult<()> {
        (**self).delete_dataset(uri)
    }

    fn create_records(&self, dataset: &str, n3: &str, mode: IndexationMode) -> ApiResult<()> {
        (**self).create_records(dataset, n3, mode)
    }

    fn update_records(&self, dataset: &str, n3: &str) -> ApiResult<()> {
        (**self).update_records(dataset, n3)
    }

    fn delete_record(&self, dataset: &str, uri: &str) -> ApiResult<()> {
        (**self).delete_record(dataset, uri)
    }
}
