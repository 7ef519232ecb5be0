//! Scratch-graph lifecycle: clear, bulk-load, clear again when done.

use crate::error::{ImportError, ImportResult};
use rdfslice_store::{RdfFormat, TripleStore};
use std::path::Path;
use std::time::Instant;

pub struct StagingController<'a, S> {
    store: &'a S,
    graph: &'a str,
}

impl<'a, S: TripleStore> StagingController<'a, S> {
    pub fn new(store: &'a S, graph: &'a str) -> Self {
        Self { store, graph }
    }

    pub fn graph(&self) -> &str {
        self.graph
    }

    /// Empties the staging graph and loads `file` into it.
    ///
    /// If the load fails the graph is cleared once more, best effort, so no partial load
    /// is left behind; the load error is returned either way.
    pub fn stage(&self, file: &Path) -> ImportResult<()> {
        let staging_error = |error| ImportError::Staging {
            file: file.to_path_buf(),
            graph: self.graph.to_string(),
            error,
        };

        self.store.clear_graph(self.graph).map_err(staging_error)?;

        let format = RdfFormat::from_path(file);
        let started = Instant::now();
        if let Err(error) = self.store.load_file(file, self.graph, format) {
            if let Err(clear_err) = self.store.clear_graph(self.graph) {
                tracing::warn!(
                    graph = %self.graph,
                    error = %clear_err,
                    "failed to clear staging graph after a failed load"
                );
            }
            return Err(staging_error(error));
        }
        tracing::info!(
            file = %file.display(),
            graph = %self.graph,
            format = format.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "staged file"
        );
        Ok(())
    }

    pub fn release(&self) -> ImportResult<()> {
        self.store
            .clear_graph(self.graph)
            .map_err(|error| ImportError::Query {
                graph: self.graph.to_string(),
                error,
            })?;
        tracing::debug!(graph = %self.graph, "cleared staging graph");
        Ok(())
    }
}
