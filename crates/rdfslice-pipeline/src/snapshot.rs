//! Cached ontology vocabulary: the class and property names known to the service.

use crate::error::SnapshotError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const CLASS_SNAPSHOT_FILE: &str = "classHierarchySerialized.json";
pub const PROPERTY_SNAPSHOT_FILE: &str = "propertyHierarchySerialized.json";

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ClassHierarchy {
    #[serde(default)]
    classes: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct PropertyHierarchy {
    #[serde(default)]
    properties: Vec<Named>,
}

/// Read-only set membership over class and property IRIs.
#[derive(Debug, Clone, Default)]
pub struct OntologySnapshot {
    classes: HashSet<String>,
    properties: HashSet<String>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|error| SnapshotError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    serde_json::from_str(&text).map_err(|error| SnapshotError::Json {
        path: path.to_path_buf(),
        error,
    })
}

impl OntologySnapshot {
    pub fn new<C, P>(classes: C, properties: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads both snapshot files from `dir`.
    pub fn load(dir: &Path) -> Result<Self, SnapshotError> {
        let classes: ClassHierarchy = read_json(&dir.join(CLASS_SNAPSHOT_FILE))?;
        let properties: PropertyHierarchy = read_json(&dir.join(PROPERTY_SNAPSHOT_FILE))?;
        let snapshot = Self::new(
            classes.classes.into_iter().map(|c| c.name),
            properties.properties.into_iter().map(|p| p.name),
        );
        tracing::debug!(
            dir = %dir.display(),
            classes = snapshot.classes.len(),
            properties = snapshot.properties.len(),
            "loaded ontology snapshot"
        );
        Ok(snapshot)
    }

    pub fn is_class(&self, iri: &str) -> bool {
        self.classes.contains(iri)
    }

    pub fn is_property(&self, iri: &str) -> bool {
        self.properties.contains(iri)
    }
}
