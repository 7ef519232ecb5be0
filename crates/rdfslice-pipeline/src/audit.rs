//! Vocabulary audit of a staged file against the ontology snapshot.

use crate::error::{ImportError, ImportResult};
use crate::snapshot::OntologySnapshot;
use rdfslice_store::TripleStore;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Predicates and types a file uses that the ontology does not define, first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndefinedTermReport {
    pub predicates: Vec<String>,
    pub types: Vec<String>,
}

fn unknown(used: Vec<String>, known: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = HashSet::new();
    used.into_iter()
        .filter(|iri| !known(iri.as_str()) && seen.insert(iri.clone()))
        .collect()
}

impl UndefinedTermReport {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty() && self.types.is_empty()
    }

    /// Log file paths for `file`: `<stem>.undefined.types.log` and
    /// `<stem>.undefined.predicates.log`.
    pub fn log_paths(dir: &Path, file: &Path) -> (PathBuf, PathBuf) {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (
            dir.join(format!("{stem}.undefined.types.log")),
            dir.join(format!("{stem}.undefined.predicates.log")),
        )
    }

    /// Writes both logs, one IRI per line. Empty lists still produce (empty) files.
    pub fn write(&self, dir: &Path, file: &Path) -> ImportResult<(PathBuf, PathBuf)> {
        let (types_path, predicates_path) = Self::log_paths(dir, file);
        let audit_error = |path: &Path| {
            let path = path.to_path_buf();
            move |error| ImportError::Audit { path, error }
        };
        fs::create_dir_all(dir).map_err(audit_error(dir))?;
        fs::write(&types_path, self.types.join("\n")).map_err(audit_error(&types_path))?;
        fs::write(&predicates_path, self.predicates.join("\n"))
            .map_err(audit_error(&predicates_path))?;
        Ok((types_path, predicates_path))
    }
}

/// Compares the distinct predicates and types of `graph` with the snapshot.
pub fn audit_graph<S: TripleStore>(
    store: &S,
    graph: &str,
    snapshot: &OntologySnapshot,
) -> ImportResult<UndefinedTermReport> {
    let query_error = |error| ImportError::Query {
        graph: graph.to_string(),
        error,
    };
    let predicates = store.distinct_predicates(graph).map_err(query_error)?;
    let types = store.distinct_types(graph).map_err(query_error)?;

    let report = UndefinedTermReport {
        predicates: unknown(predicates, |iri| snapshot.is_property(iri)),
        types: unknown(types, |iri| snapshot.is_class(iri)),
    };
    if report.is_empty() {
        tracing::info!(graph = %graph, "all predicates and types are defined");
    } else {
        tracing::warn!(
            graph = %graph,
            predicates = report.predicates.len(),
            types = report.types.len(),
            "undefined vocabulary in use"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfslice_store::{Literal, MemoryStore, Node, Object, TripleRow, RDF_TYPE};

    const GRAPH: &str = "http://ex.org/d/import";

    #[test]
    fn reports_only_unknown_terms() {
        let store = MemoryStore::new();
        store.insert(
            GRAPH,
            [
                TripleRow::new(Node::iri("http://ex.org/a"), RDF_TYPE, Object::iri("http://ex.org/Known")),
                TripleRow::new(Node::iri("http://ex.org/b"), RDF_TYPE, Object::iri("http://ex.org/Unknown")),
                TripleRow::new(
                    Node::iri("http://ex.org/a"),
                    "http://ex.org/odd",
                    Object::Literal(Literal::simple("x")),
                ),
            ],
        );
        let snapshot = OntologySnapshot::new(["http://ex.org/Known"], [RDF_TYPE]);

        let report = audit_graph(&store, GRAPH, &snapshot).unwrap();
        assert_eq!(report.types, vec!["http://ex.org/Unknown"]);
        assert_eq!(report.predicates, vec!["http://ex.org/odd"]);
    }

    #[test]
    fn writes_logs_even_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let report = UndefinedTermReport::default();
        let (types, predicates) = report
            .write(dir.path(), Path::new("/data/records.n3"))
            .unwrap();
        assert!(types.ends_with("records.undefined.types.log"));
        assert!(predicates.ends_with("records.undefined.predicates.log"));
        assert_eq!(fs::read_to_string(types).unwrap(), "");
        assert_eq!(fs::read_to_string(predicates).unwrap(), "");
    }

    #[test]
    fn logs_are_newline_joined() {
        let dir = tempfile::tempdir().unwrap();
        let report = UndefinedTermReport {
            predicates: vec!["http://ex.org/p1".into(), "http://ex.org/p2".into()],
            types: vec![],
        };
        let (_, predicates) = report.write(dir.path(), Path::new("f.rdf")).unwrap();
        assert_eq!(
            fs::read_to_string(predicates).unwrap(),
            "http://ex.org/p1\nhttp://ex.org/p2"
        );
    }
}
