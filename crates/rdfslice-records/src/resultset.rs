//! Decoding of the service's JSON payloads: dataset resultsets and error bodies.
//!
//! A resultset looks like:
//!
//! ```json
//! {"resultset": {"subject": [{
//!     "uri": "http://ex.org/datasets/d1/",
//!     "type": "void:Dataset",
//!     "predicate": [
//!         {"dcterms:title": "Dataset one"},
//!         {"dcterms:creator": {"uri": "http://ex.org/users/admin"}}
//!     ]
//! }]}}
//! ```
//!
//! Predicate keys may be prefixed names or full IRIs, so they are matched by local name.

use crate::DatasetMetadata;
use serde::Deserialize;
use serde_json::Value;

fn local_name(key: &str) -> &str {
    key.rsplit(['#', '/', ':']).next().unwrap_or(key)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("uri"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items.first().and_then(value_text),
        _ => None,
    }
}

fn subject_matches(subject: &Value, uri: &str) -> bool {
    let Some(subject_uri) = subject.get("uri").and_then(Value::as_str) else {
        return false;
    };
    subject_uri.trim_end_matches('/') == uri.trim_end_matches('/')
}

/// Extracts creator, title and description of `uri` from a dataset-read resultset.
///
/// Falls back to the first subject when none matches `uri` exactly. The title is read
/// from `title`, then `prefLabel`.
pub fn dataset_metadata(body: &Value, uri: &str) -> DatasetMetadata {
    let subjects = body
        .pointer("/resultset/subject")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let Some(subject) = subjects
        .iter()
        .find(|s| subject_matches(s, uri))
        .or_else(|| subjects.first())
    else {
        return DatasetMetadata::default();
    };

    let mut metadata = DatasetMetadata::default();
    let mut pref_label = None;
    let predicates = subject
        .get("predicate")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for entry in predicates {
        let Some(map) = entry.as_object() else {
            continue;
        };
        for (key, value) in map {
            let Some(text) = value_text(value) else {
                continue;
            };
            match local_name(key) {
                "creator" if metadata.creator.is_empty() => metadata.creator = text,
                "title" if metadata.title.is_empty() => metadata.title = text,
                "description" if metadata.description.is_empty() => metadata.description = text,
                "prefLabel" if pref_label.is_none() => pref_label = Some(text),
                _ => {}
            }
        }
    }
    if metadata.title.is_empty() {
        metadata.title = pref_label.unwrap_or_default();
    }
    metadata
}

/// Error body returned by the service on unsuccessful calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parses an error body; anything that is not the expected JSON shape yields `None`.
pub fn error_body(text: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorBody>(text)
        .ok()
        .filter(|b| b.id.is_some() || b.name.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recovers_metadata_from_prefixed_and_full_keys() {
        let body = json!({
            "resultset": {"subject": [{
                "uri": "http://ex.org/datasets/d1/",
                "type": "void:Dataset",
                "predicate": [
                    {"http://purl.org/dc/terms/title": "Dataset one"},
                    {"dcterms:description": "All the things"},
                    {"dcterms:creator": {"uri": "http://ex.org/users/admin"}}
                ]
            }]}
        });
        let meta = dataset_metadata(&body, "http://ex.org/datasets/d1");
        assert_eq!(meta.title, "Dataset one");
        assert_eq!(meta.description, "All the things");
        assert_eq!(meta.creator, "http://ex.org/users/admin");
    }

    #[test]
    fn pref_label_is_the_title_fallback() {
        let body = json!({
            "resultset": {"subject": [{
                "uri": "http://ex.org/d",
                "predicate": [{"skos:prefLabel": {"value": "Labelled", "lang": "en"}}]
            }]}
        });
        assert_eq!(dataset_metadata(&body, "http://ex.org/d").title, "Labelled");
    }

    #[test]
    fn empty_resultset_gives_empty_metadata() {
        assert_eq!(
            dataset_metadata(&json!({}), "http://ex.org/d"),
            DatasetMetadata::default()
        );
    }

    #[test]
    fn error_bodies_expose_their_id() {
        let body = error_body(
            r#"{"id":"WS-DATASET-READ-304","level":"Warning","name":"Unknown dataset","description":"..."}"#,
        )
        .unwrap();
        assert_eq!(body.id.as_deref(), Some(crate::DATASET_NOT_FOUND));
        assert!(error_body("<html>oops</html>").is_none());
    }
}
