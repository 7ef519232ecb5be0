//! In-process triple store.
//!
//! Named graphs are sorted sets of [`TripleRow`]s. Rows order by subject first, so a
//! graph iterates subject by subject and typed subjects enumerate in one stable order.

use crate::parse::{parse_triples, RdfFormat};
use crate::term::{Node, TripleRow};
use crate::{StoreResult, TripleStore};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Default)]
pub struct MemoryStore {
    graphs: RwLock<HashMap<String, BTreeSet<TripleRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows to `graph`, creating it if needed.
    pub fn insert(&self, graph: &str, rows: impl IntoIterator<Item = TripleRow>) {
        let mut graphs = self.graphs.write();
        graphs.entry(graph.to_string()).or_default().extend(rows);
    }

    /// Number of triples currently in `graph`.
    pub fn graph_len(&self, graph: &str) -> usize {
        self.graphs.read().get(graph).map_or(0, BTreeSet::len)
    }

    /// Snapshot of every row in `graph`, in store order.
    pub fn rows(&self, graph: &str) -> Vec<TripleRow> {
        self.graphs
            .read()
            .get(graph)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn typed_subjects(set: &BTreeSet<TripleRow>) -> BTreeSet<&Node> {
        set.iter()
            .filter(|row| row.is_type_assertion())
            .map(|row| &row.subject)
            .collect()
    }
}

impl TripleStore for MemoryStore {
    fn clear_graph(&self, graph: &str) -> StoreResult<()> {
        self.graphs.write().remove(graph);
        Ok(())
    }

    fn load_file(&self, path: &Path, graph: &str, format: RdfFormat) -> StoreResult<()> {
        let reader = BufReader::new(File::open(path)?);
        let rows = parse_triples(reader, format, Some(graph))?;
        tracing::debug!(
            path = %path.display(),
            graph,
            triples = rows.len(),
            "loaded file into memory store"
        );
        self.insert(graph, rows);
        Ok(())
    }

    fn count_typed_subjects(&self, graph: &str) -> StoreResult<u64> {
        let graphs = self.graphs.read();
        Ok(graphs
            .get(graph)
            .map_or(0, |set| Self::typed_subjects(set).len() as u64))
    }

    fn window_rows(&self, graph: &str, offset: u64, limit: u64) -> StoreResult<Vec<TripleRow>> {
        let graphs = self.graphs.read();
        let Some(set) = graphs.get(graph) else {
            return Ok(Vec::new());
        };
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let window: HashSet<&Node> = Self::typed_subjects(set)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();
        Ok(set
            .iter()
            .filter(|row| window.contains(&row.subject))
            .cloned()
            .collect())
    }

    fn distinct_predicates(&self, graph: &str) -> StoreResult<Vec<String>> {
        let graphs = self.graphs.read();
        let predicates: BTreeSet<&str> = graphs
            .get(graph)
            .into_iter()
            .flatten()
            .map(|row| row.predicate.as_str())
            .collect();
        Ok(predicates.into_iter().map(str::to_string).collect())
    }

    fn distinct_types(&self, graph: &str) -> StoreResult<Vec<String>> {
        let graphs = self.graphs.read();
        let types: BTreeSet<&str> = graphs
            .get(graph)
            .into_iter()
            .flatten()
            .filter(|row| row.is_type_assertion())
            .filter_map(|row| row.object.as_iri())
            .collect();
        Ok(types.into_iter().map(str::to_string).collect())
    }
}
