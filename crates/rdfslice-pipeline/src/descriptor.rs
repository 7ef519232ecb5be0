//! What to import, where, and how.

use rdfslice_records::{DatasetMetadata, IndexationMode};
use serde::Serialize;
use std::path::PathBuf;

/// Default number of records per window.
pub const DEFAULT_SLICE_SIZE: u64 = 200;

/// How a run treats the destination dataset and the staging graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunMode {
    /// Create the dataset if missing, stage, dispatch, audit.
    #[default]
    Normal,
    /// Delete and recreate the dataset before a normal import.
    FullReload,
    /// Re-send the records already stored in the dataset graph to the search index.
    /// No provisioning, no staging, no audit.
    ReindexOnly,
}

impl RunMode {
    /// A full reload wins when both flags are set.
    pub fn from_flags(force_reload: bool, force_reload_search_index: bool) -> Self {
        if force_reload {
            Self::FullReload
        } else if force_reload_search_index {
            Self::ReindexOnly
        } else {
            Self::Normal
        }
    }

    pub fn stages(self) -> bool {
        self != Self::ReindexOnly
    }

    pub fn indexation_mode(self) -> IndexationMode {
        match self {
            Self::ReindexOnly => IndexationMode::SearchIndexOnly,
            Self::Normal | Self::FullReload => IndexationMode::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub uri: String,
    /// Used when the dataset has to be created from scratch.
    pub metadata: DatasetMetadata,
    pub files: Vec<PathBuf>,
    pub mode: RunMode,
    pub slice_size: u64,
}

impl DatasetDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            metadata: DatasetMetadata::default(),
            files: Vec::new(),
            mode: RunMode::Normal,
            slice_size: DEFAULT_SLICE_SIZE,
        }
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_slice_size(mut self, slice_size: u64) -> Self {
        self.slice_size = slice_size;
        self
    }

    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Graph the records are read from: `<uri>/import` (trailing slashes dropped), or the
    /// dataset graph itself when reindexing.
    pub fn staging_graph(&self) -> String {
        match self.mode {
            RunMode::ReindexOnly => self.uri.clone(),
            RunMode::Normal | RunMode::FullReload => {
                format!("{}/import", self.uri.trim_end_matches('/'))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_reload_wins_over_reindex() {
        assert_eq!(RunMode::from_flags(true, true), RunMode::FullReload);
        assert_eq!(RunMode::from_flags(false, true), RunMode::ReindexOnly);
        assert_eq!(RunMode::from_flags(false, false), RunMode::Normal);
    }

    #[test]
    fn staging_graph_naming() {
        let ds = DatasetDescriptor::new("http://ex.org/datasets/d1/");
        assert_eq!(ds.staging_graph(), "http://ex.org/datasets/d1/import");

        let ds = DatasetDescriptor::new("http://ex.org/datasets/d1");
        assert_eq!(ds.staging_graph(), "http://ex.org/datasets/d1/import");

        let ds = ds.with_mode(RunMode::ReindexOnly);
        assert_eq!(ds.staging_graph(), "http://ex.org/datasets/d1");
        assert_eq!(ds.mode.indexation_mode(), IndexationMode::SearchIndexOnly);
    }
}
