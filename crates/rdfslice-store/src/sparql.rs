//! SPARQL text used against the staging graph.
//!
//! The counting query and the window subquery both range over `?s a ?type`, and the
//! window subquery orders by `?s`, so offsets computed from the count address one
//! fixed enumeration of the subjects.

/// Media type requested from the SPARQL endpoint.
pub const SPARQL_RESULTS_XML: &str = "application/sparql-results+xml";

pub fn count_typed_subjects(graph: &str) -> String {
    format!("SELECT (COUNT(DISTINCT ?s) AS ?nb) FROM <{graph}> WHERE {{ ?s a ?o . }}")
}

/// Every triple of the typed subjects `[offset, offset + limit)`, grouped by subject.
pub fn window(graph: &str, offset: u64, limit: u64) -> String {
    format!(
        "SELECT ?s ?p ?o (DATATYPE(?o) AS ?otype) (LANG(?o) AS ?olang) FROM <{graph}> \
         WHERE {{ \
           {{ SELECT DISTINCT ?s WHERE {{ ?s a ?type . }} \
              ORDER BY ?s LIMIT {limit} OFFSET {offset} }} \
           ?s ?p ?o . \
         }} ORDER BY ?s"
    )
}

pub fn distinct_predicates(graph: &str) -> String {
    format!("SELECT DISTINCT ?p FROM <{graph}> WHERE {{ ?s ?p ?o . }}")
}

pub fn distinct_types(graph: &str) -> String {
    format!("SELECT DISTINCT ?o FROM <{graph}> WHERE {{ ?s a ?o . }}")
}

pub fn clear_graph(graph: &str) -> String {
    format!("CLEAR SILENT GRAPH <{graph}>")
}
