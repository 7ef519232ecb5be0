//! Diagnostic dumps of failed service calls.

use rdfslice_records::ApiFailure;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Serialize)]
struct Dump<'a> {
    id: Uuid,
    dataset: &'a str,
    failure: &'a ApiFailure,
}

/// Writes one `<uuid>.error` file per failure.
#[derive(Debug, Clone)]
pub struct DumpWriter {
    dir: PathBuf,
}

impl Default for DumpWriter {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl DumpWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the dump path, or `None` if it could not be written (which is logged).
    pub fn write(&self, dataset: &str, failure: &ApiFailure) -> Option<PathBuf> {
        let id = Uuid::new_v4();
        let path = self.dir.join(format!("{id}.error"));
        let dump = Dump {
            id,
            dataset,
            failure,
        };
        let written = serde_json::to_vec_pretty(&dump)
            .map_err(std::io::Error::from)
            .and_then(|bytes| {
                fs::create_dir_all(&self.dir)?;
                fs::write(&path, bytes)
            });
        match written {
            Ok(()) => Some(path),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to write diagnostic dump"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfslice_records::Operation;

    #[test]
    fn dump_holds_the_failure() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DumpWriter::new(dir.path().join("dumps"));
        let failure = ApiFailure {
            status: Some(400),
            description: "bad document".to_string(),
            ..ApiFailure::new(Operation::CrudCreate, "Bad Request")
        };
        let path = writer.write("http://ex.org/d", &failure).unwrap();
        assert_eq!(path.extension().unwrap(), "error");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["dataset"], "http://ex.org/d");
        assert_eq!(json["failure"]["status"], 400);
        assert_eq!(json["failure"]["operation"], "CrudCreate");
    }
}
