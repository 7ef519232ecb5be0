//! Record serialization and classification.
//!
//! A window query returns the flattened triples of a set of subjects, grouped by subject.
//! [`classify_window`] walks that stream once, rebuilds an N3 block per subject and files
//! the block under the action the subject's control triple asks for. A subject's action is
//! known only once all of its triples have been seen, so blocks are filed when the subject
//! changes and once more when the stream ends.

use rdfslice_store::{Literal, Node, Object, TripleRow, XSD_STRING};
use serde::Serialize;
use std::fmt::Write as _;

/// Control predicate selecting the action for a record. Never serialized.
pub const CRUD_ACTION: &str = "http://purl.org/ontology/wsf#crudAction";

/// Prefix block heading every create and update document.
pub const N3_PREFIX: &str = "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CrudAction {
    #[default]
    Create,
    Update,
    Delete,
}

impl CrudAction {
    /// Case-insensitive; anything unrecognised means create.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Create,
        }
    }
}

/// Escapes literal text for a `"""..."""` string: backslashes are doubled and double
/// quotes are stripped from both ends.
pub fn escape_literal(text: &str) -> String {
    text.replace('\\', "\\\\").trim_matches('"').to_string()
}

fn render_literal(out: &mut String, literal: &Literal) {
    let text = escape_literal(&literal.value);
    match (&literal.language, &literal.datatype) {
        (Some(lang), _) => {
            let _ = write!(out, "\"\"\"{text}\"\"\"@{lang}");
        }
        (None, Some(datatype)) if datatype != XSD_STRING => {
            let _ = write!(out, "\"\"\"{text}\"\"\"^^<{datatype}>");
        }
        (None, _) => {
            let _ = write!(out, "\"\"\"{text}\"\"\"");
        }
    }
}

/// N3 form of an object term.
pub fn render_object(object: &Object) -> String {
    match object {
        Object::Node(node) => node.to_string(),
        Object::Literal(literal) => {
            let mut out = String::new();
            render_literal(&mut out, literal);
            out
        }
    }
}

/// One N3 statement line, newline included.
pub fn render_triple(row: &TripleRow) -> String {
    format!(
        "{} <{}> {} .\n",
        row.subject,
        row.predicate,
        render_object(&row.object)
    )
}

/// The classified records of one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrudBatch {
    /// N3 body (no prefix) of the records to create.
    pub creates: String,
    pub create_count: usize,
    /// N3 body (no prefix) of the records to update.
    pub updates: String,
    pub update_count: usize,
    /// Subjects to delete, in arrival order.
    pub deletes: Vec<Node>,
}

impl CrudBatch {
    pub fn is_empty(&self) -> bool {
        self.create_count == 0 && self.update_count == 0 && self.deletes.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.create_count + self.update_count + self.deletes.len()
    }

    /// Create document as sent to the service, if there is anything to create.
    pub fn create_document(&self) -> Option<String> {
        (!self.creates.is_empty()).then(|| format!("{N3_PREFIX}{}", self.creates))
    }

    pub fn update_document(&self) -> Option<String> {
        (!self.updates.is_empty()).then(|| format!("{N3_PREFIX}{}", self.updates))
    }
}

struct OpenRecord {
    subject: Node,
    body: String,
    action: CrudAction,
}

/// Group-by-subject state machine feeding a [`CrudBatch`].
#[derive(Default)]
pub struct SubjectGrouper {
    current: Option<OpenRecord>,
    batch: CrudBatch,
}

impl SubjectGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: &TripleRow) {
        let same_subject = self
            .current
            .as_ref()
            .is_some_and(|open| open.subject == row.subject);
        if !same_subject {
            self.flush();
            self.current = Some(OpenRecord {
                subject: row.subject.clone(),
                body: String::new(),
                action: CrudAction::Create,
            });
        }
        let Some(open) = self.current.as_mut() else {
            return;
        };
        if row.predicate == CRUD_ACTION {
            open.action = CrudAction::parse(row.object.lexical());
        } else {
            open.body.push_str(&render_triple(row));
        }
    }

    fn flush(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        match open.action {
            CrudAction::Create => {
                self.batch.creates.push_str(&open.body);
                self.batch.create_count += 1;
            }
            CrudAction::Update => {
                self.batch.updates.push_str(&open.body);
                self.batch.update_count += 1;
            }
            CrudAction::Delete => self.batch.deletes.push(open.subject),
        }
    }

    pub fn finish(mut self) -> CrudBatch {
        self.flush();
        self.batch
    }
}

/// Classifies the rows of one window. Rows of one subject must be contiguous.
pub fn classify_window(rows: &[TripleRow]) -> CrudBatch {
    let mut grouper = SubjectGrouper::new();
    for row in rows {
        grouper.push(row);
    }
    grouper.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfslice_store::parse::parse_str;
    use rdfslice_store::{RdfFormat, RDF_TYPE};

    fn row(s: &str, p: &str, o: Object) -> TripleRow {
        TripleRow::new(Node::iri(s), p, o)
    }

    #[test]
    fn action_parsing_ignores_case() {
        assert_eq!(CrudAction::parse("UpDaTe"), CrudAction::Update);
        assert_eq!(CrudAction::parse("DELETE"), CrudAction::Delete);
        assert_eq!(CrudAction::parse("create"), CrudAction::Create);
        assert_eq!(CrudAction::parse("frobnicate"), CrudAction::Create);
    }

    #[test]
    fn literal_forms() {
        assert_eq!(
            render_object(&Object::Literal(Literal::typed("x", XSD_STRING))),
            r#""""x""""#
        );
        assert_eq!(
            render_object(&Object::Literal(Literal::typed(
                "42",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))),
            r#""""42"""^^<http://www.w3.org/2001/XMLSchema#integer>"#
        );
        let tagged = render_object(&Object::Literal(Literal::lang("chat", "fr")));
        assert_eq!(tagged, r#""""chat"""@fr"#);
        assert!(!tagged.contains("^^"));
        assert_eq!(
            render_object(&Object::Literal(Literal::simple("plain"))),
            r#""""plain""""#
        );
        assert_eq!(
            render_object(&Object::iri("http://ex.org/o")),
            "<http://ex.org/o>"
        );
        assert_eq!(
            render_object(&Object::Node(Node::Blank("b0".to_string()))),
            "_:b0"
        );
    }

    #[test]
    fn escaping_doubles_backslashes_and_trims_quotes() {
        assert_eq!(escape_literal(r#"a\b"#), r#"a\\b"#);
        assert_eq!(escape_literal(r#""quoted""#), "quoted");
        assert_eq!(escape_literal(r#"He said "hi""#), "He said \"hi");
    }

    #[test]
    fn escaped_literal_survives_a_turtle_parser() {
        let original = "He said \"hi\"\\now";
        let line = render_triple(&row(
            "http://ex.org/s",
            "http://ex.org/p",
            Object::Literal(Literal::simple(original)),
        ));
        let parsed = parse_str(&line, RdfFormat::Turtle).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].object.lexical(), original);
    }

    #[test]
    fn update_tag_moves_every_triple_of_the_subject() {
        // control triple arrives between data triples
        let rows = vec![
            row("http://ex.org/a", RDF_TYPE, Object::iri("http://ex.org/T")),
            row(
                "http://ex.org/a",
                CRUD_ACTION,
                Object::Literal(Literal::simple("UPDATE")),
            ),
            row(
                "http://ex.org/a",
                "http://ex.org/name",
                Object::Literal(Literal::simple("A")),
            ),
            row("http://ex.org/b", RDF_TYPE, Object::iri("http://ex.org/T")),
        ];
        let batch = classify_window(&rows);
        assert_eq!(batch.update_count, 1);
        assert_eq!(batch.create_count, 1);
        assert!(batch.updates.contains("<http://ex.org/a> <http://ex.org/name>"));
        assert!(batch.updates.contains("<http://ex.org/a> <"));
        assert!(!batch.creates.contains("http://ex.org/a"));
        assert!(!batch.updates.contains(CRUD_ACTION));
        assert!(batch.creates.starts_with("<http://ex.org/b> "));
    }

    #[test]
    fn deletes_carry_only_the_subject() {
        let rows = vec![
            row("http://ex.org/a", RDF_TYPE, Object::iri("http://ex.org/T")),
            row(
                "http://ex.org/a",
                CRUD_ACTION,
                Object::Literal(Literal::simple("delete")),
            ),
        ];
        let batch = classify_window(&rows);
        assert_eq!(batch.deletes, vec![Node::iri("http://ex.org/a")]);
        assert!(batch.creates.is_empty());
        assert!(batch.create_document().is_none());
    }

    #[test]
    fn documents_get_the_prefix_block() {
        let rows = vec![row(
            "http://ex.org/a",
            RDF_TYPE,
            Object::iri("http://ex.org/T"),
        )];
        let batch = classify_window(&rows);
        let doc = batch.create_document().unwrap();
        assert!(doc.starts_with(N3_PREFIX));
        assert!(doc.ends_with(" .\n"));
        assert_eq!(classify_window(&[]), CrudBatch::default());
    }
}
