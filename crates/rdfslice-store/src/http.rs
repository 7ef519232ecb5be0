//! SPARQL-over-HTTP triple store.
//!
//! Queries and updates go to the SPARQL endpoint as url-encoded POST forms; bulk loads
//! stream the file body to a SPARQL 1.1 Graph Store endpoint. The store must be able to
//! read the whole file in one request, so very large files should sit on the same host
//! as the store.
//!
//! Relative IRIs in a loaded file resolve against the target graph. Turtle bodies get an
//! `@base` prologue for that; RDF/XML bodies without `xml:base` resolve against the
//! Graph Store request IRI, which names the same graph.

use crate::parse::RdfFormat;
use crate::results::{
    count_from_solutions, iris_from_solutions, parse_solutions, rows_from_solutions, Solution,
};
use crate::sparql;
use crate::term::TripleRow;
use crate::{StoreError, StoreResult, TripleStore};
use reqwest::blocking::{Body, Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::{Duration, Instant};

/// Connection settings for [`HttpTripleStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// SPARQL query/update endpoint, e.g. `http://localhost:8890/sparql/`.
    pub sparql_url: String,
    /// Graph Store endpoint, e.g. `http://localhost:8890/sparql-graph-crud-auth`.
    pub graph_store_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout. `None` waits indefinitely, which bulk loads usually need.
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct HttpTripleStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpTripleStore {
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }

    fn send(request: RequestBuilder) -> StoreResult<String> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn select_request(&self, default_graph: &str, query: &str) -> RequestBuilder {
        let request = self
            .client
            .post(&self.config.sparql_url)
            .header(ACCEPT, sparql::SPARQL_RESULTS_XML)
            .form(&[
                ("default-graph-uri", default_graph),
                ("query", query),
                ("format", sparql::SPARQL_RESULTS_XML),
            ]);
        self.authenticated(request)
    }

    fn update_request(&self, update: &str) -> RequestBuilder {
        let request = self
            .client
            .post(&self.config.sparql_url)
            .form(&[("update", update)]);
        self.authenticated(request)
    }

    fn load_request(
        &self,
        path: &Path,
        graph: &str,
        format: RdfFormat,
    ) -> StoreResult<RequestBuilder> {
        let file = File::open(path)?;
        let body = match format {
            RdfFormat::Turtle => {
                let prologue = format!("@base <{graph}> .\n").into_bytes();
                let len = prologue.len() as u64 + file.metadata()?.len();
                Body::sized(Cursor::new(prologue).chain(file), len)
            }
            RdfFormat::RdfXml => Body::from(file),
        };
        let request = self
            .client
            .post(&self.config.graph_store_url)
            .query(&[("graph", graph)])
            .header(CONTENT_TYPE, format.media_type())
            .body(body);
        Ok(self.authenticated(request))
    }

    /// Runs a SELECT query with `default_graph` as the default graph.
    pub fn select(&self, default_graph: &str, query: &str) -> StoreResult<Vec<Solution>> {
        let started = Instant::now();
        let body = Self::send(self.select_request(default_graph, query))?;
        let solutions = parse_solutions(&body)?;
        tracing::trace!(
            graph = default_graph,
            solutions = solutions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sparql select"
        );
        Ok(solutions)
    }

    /// Runs a SPARQL Update request.
    pub fn update(&self, update: &str) -> StoreResult<()> {
        Self::send(self.update_request(update))?;
        Ok(())
    }
}

impl TripleStore for HttpTripleStore {
    fn clear_graph(&self, graph: &str) -> StoreResult<()> {
        self.update(&sparql::clear_graph(graph))
    }

    fn load_file(&self, path: &Path, graph: &str, format: RdfFormat) -> StoreResult<()> {
        let started = Instant::now();
        Self::send(self.load_request(path, graph, format)?)?;
        tracing::debug!(
            path = %path.display(),
            graph,
            format = format.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk load finished"
        );
        Ok(())
    }

    fn count_typed_subjects(&self, graph: &str) -> StoreResult<u64> {
        let solutions = self.select(graph, &sparql::count_typed_subjects(graph))?;
        count_from_solutions(&solutions, "nb")
    }

    fn window_rows(&self, graph: &str, offset: u64, limit: u64) -> StoreResult<Vec<TripleRow>> {
        let solutions = self.select(graph, &sparql::window(graph, offset, limit))?;
        rows_from_solutions(solutions)
    }

    fn distinct_predicates(&self, graph: &str) -> StoreResult<Vec<String>> {
        let solutions = self.select(graph, &sparql::distinct_predicates(graph))?;
        Ok(iris_from_solutions(solutions, "p"))
    }

    fn distinct_types(&self, graph: &str) -> StoreResult<Vec<String>> {
        let solutions = self.select(graph, &sparql::distinct_types(graph))?;
        Ok(iris_from_solutions(solutions, "o"))
    }
}
