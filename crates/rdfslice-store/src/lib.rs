//! Triple-store access for rdfslice.
//!
//! The import pipeline never talks SPARQL directly. It asks a [`TripleStore`] for a
//! handful of graph-level operations:
//!
//! - clear a named graph,
//! - bulk-load a file into a named graph,
//! - count the distinct typed subjects of a graph,
//! - fetch every triple of one window of typed subjects,
//! - list the distinct predicates and types a graph uses.
//!
//! Two implementations ship with the crate:
//! - [`HttpTripleStore`]: a SPARQL 1.1 endpoint (query + update) plus a Graph Store
//!   endpoint for bulk loads, over blocking HTTP.
//! - [`MemoryStore`]: an in-process store backed by sorted sets, used by tests and dry runs.
//!
//! Both must enumerate typed subjects in one stable order for the lifetime of a graph, so
//! that windows computed from the count never skip or repeat a subject.

pub mod http;
pub mod memory;
pub mod parse;
pub mod results;
pub mod sparql;
pub mod term;

use std::path::Path;

pub use http::{HttpStoreConfig, HttpTripleStore};
pub use memory::MemoryStore;
pub use parse::RdfFormat;
pub use results::{BindingValue, Solution};
pub use term::{Literal, Node, Object, TripleRow, RDF_LANG_STRING, RDF_TYPE, XSD_STRING};

/// Errors raised by triple-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("triple store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid SPARQL results document: {0}")]
    Results(String),

    #[error("missing `{0}` binding in SPARQL result")]
    MissingBinding(String),

    #[error("failed to parse {format} file: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for triple-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Graph-level operations the import pipeline needs from a triple store.
///
/// All operations are blocking. A graph that was never written behaves like an empty one.
pub trait TripleStore {
    /// Remove every triple from `graph`. Clearing an absent graph is not an error.
    fn clear_graph(&self, graph: &str) -> StoreResult<()>;

    /// Bulk-load `path` into `graph`. Relative IRIs in the file resolve against `graph`.
    fn load_file(&self, path: &Path, graph: &str, format: RdfFormat) -> StoreResult<()>;

    /// `COUNT(DISTINCT ?s)` over `?s a ?o` in `graph`.
    fn count_typed_subjects(&self, graph: &str) -> StoreResult<u64>;

    /// Every triple of the typed subjects in `[offset, offset + limit)`.
    ///
    /// Rows come back grouped by subject: all triples of one subject are contiguous.
    fn window_rows(&self, graph: &str, offset: u64, limit: u64) -> StoreResult<Vec<TripleRow>>;

    /// Distinct predicate IRIs used in `graph`.
    fn distinct_predicates(&self, graph: &str) -> StoreResult<Vec<String>>;

    /// Distinct objects of `rdf:type` triples in `graph`.
    fn distinct_types(&self, graph: &str) -> StoreResult<Vec<String>>;
}

impl<T: TripleStore + ?Sized> TripleStore for &T {
    fn clear_graph(&self, graph: &str) -> StoreResult<()> {
        (**self).clear_graph(graph)
    }

    fn load_file(&self, path: &Path, graph: &str, format: RdfFormat) -> StoreResult<()> {
        (**self).load_file(path, graph, format)
    }

    fn count_typed_subjects(&self, graph: &str) -> StoreResult<u64> {
        (**self).count_typed_subjects(graph)
    }

    fn window_rows(&self, graph: &str, offset: u64, limit: u64) -> StoreResult<Vec<TripleRow>> {
        (**self).window_rows(graph, offset, limit)
    }

    fn distinct_predicates(&self, graph: &str) -> StoreResult<Vec<String>> {
        (**self).distinct_predicates(graph)
    }

    fn distinct_types(&self, graph: &str) -> StoreResult<Vec<String>> {
        (**self).distinct_types(graph)
    }
}

impl<T: TripleStore + ?Sized> TripleStore for Box<T> {
    fn clear_graph(&self, graph: &str) -> StoreResult<()> {
        (**self).clear_graph(graph)
    }

    fn load_file(&self, path: &Path, graph: &str, format: RdfFormat) -> StoreResult<()> {
        (**self).load_file(path, graph, format)
    }

    fn count_typed_subjects(&self, graph: &str) -> StoreResult<u64> {
        (**self).count_typed_subjects(graph)
    }

    fn window_rows(&self, graph: &str, offset: u64, limit: u64) -> StoreResult<Vec<TripleRow>> {
        (**self).window_rows(graph, offset, limit)
    }

    fn distinct_predicates(&self, graph: &str) -> StoreResult<Vec<String>> {
        (**self).distinct_predicates(graph)
    }

    fn distinct_types(&self, graph: &str) -> StoreResult<Vec<String>> {
        (**self).distinct_types(graph)
    }
}
