//! RDF file parsing (Sophia) for the in-memory store.
//!
//! Sophia exposes parsed terms through their N-Triples display form; the helpers below
//! turn that form back into [`Node`] / [`Object`] values.

use crate::term::{Literal, Node, Object, TripleRow};
use crate::{StoreError, StoreResult};
use sophia::api::prelude::*;
use sophia::turtle::parser::turtle::TurtleParser;
use sophia::xml::parser::RdfXmlParser;
use std::io::BufRead;
use std::path::Path;

/// Input syntax of a file handed to the bulk loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle family: Turtle, N3 (Turtle subset), N-Triples.
    Turtle,
    RdfXml,
}

impl RdfFormat {
    /// `.n3`, `.ttl`, `.turtle` and `.nt` load as Turtle; everything else as RDF/XML.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "n3" | "ttl" | "turtle" | "nt" => Self::Turtle,
            _ => Self::RdfXml,
        }
    }

    /// Media type used when posting the file to a Graph Store endpoint.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::RdfXml => "application/rdf+xml",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Turtle => "Turtle",
            Self::RdfXml => "RDF/XML",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct TermSinkError {
    message: String,
}

fn unescape_nt_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parses one term in N-Triples display form.
fn parse_term_display(term: &str) -> Result<Object, TermSinkError> {
    let s = term.trim();

    if let Some(iri) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(Object::Node(Node::Iri(iri.to_string())));
    }

    if let Some(label) = s.strip_prefix("_:") {
        return Ok(Object::Node(Node::Blank(label.to_string())));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut escaped = false;
        for (i, ch) in s.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => {
                    end_quote = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let Some(end) = end_quote else {
            return Err(TermSinkError {
                message: format!("literal is missing its closing quote: {s}"),
            });
        };

        let value = unescape_nt_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let literal = if let Some(lang) = rest.strip_prefix('@') {
            Literal::lang(value, lang)
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            let dt = dt
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .unwrap_or(dt);
            Literal::typed(value, dt)
        } else {
            Literal::simple(value)
        };
        return Ok(Object::Literal(literal));
    }

    Err(TermSinkError {
        message: format!("unsupported RDF term form: {s}"),
    })
}

fn parse_node_display(term: &str) -> Result<Node, TermSinkError> {
    match parse_term_display(term)? {
        Object::Node(node) => Ok(node),
        Object::Literal(_) => Err(TermSinkError {
            message: format!("expected IRI or blank node, got literal: {term}"),
        }),
    }
}

fn push_display(
    out: &mut Vec<TripleRow>,
    s: &str,
    p: &str,
    o: &str,
) -> Result<(), TermSinkError> {
    let subject = parse_node_display(s)?;
    let Node::Iri(predicate) = parse_node_display(p)? else {
        return Ok(());
    };
    let object = parse_term_display(o)?;
    out.push(TripleRow {
        subject,
        predicate,
        object,
    });
    Ok(())
}

/// Parses every triple of `reader` in document order.
///
/// Relative IRI references resolve against `base`; without one they are a parse error.
pub fn parse_triples<R: BufRead>(
    reader: R,
    format: RdfFormat,
    base: Option<&str>,
) -> StoreResult<Vec<TripleRow>> {
    let parse_error = |message: String| StoreError::Parse {
        format: format.name(),
        message,
    };
    let base = base
        .map(|iri| Iri::new(iri.to_string()))
        .transpose()
        .map_err(|err| parse_error(format!("invalid base IRI <{}>", err.0)))?;

    let mut out: Vec<TripleRow> = Vec::new();
    let result = match format {
        RdfFormat::Turtle => TurtleParser { base }
            .parse(reader)
            .try_for_each_triple(|t| -> Result<(), TermSinkError> {
                push_display(
                    &mut out,
                    &t.s().to_string(),
                    &t.p().to_string(),
                    &t.o().to_string(),
                )
            })
            .map_err(|e| e.to_string()),
        RdfFormat::RdfXml => RdfXmlParser { base }
            .parse(reader)
            .try_for_each_triple(|t| -> Result<(), TermSinkError> {
                push_display(
                    &mut out,
                    &t.s().to_string(),
                    &t.p().to_string(),
                    &t.o().to_string(),
                )
            })
            .map_err(|e| e.to_string()),
    };
    result.map_err(parse_error)?;
    Ok(out)
}

/// Parses a Turtle-family or RDF/XML document held in memory. Every IRI must be absolute.
pub fn parse_str(text: &str, format: RdfFormat) -> StoreResult<Vec<TripleRow>> {
    parse_triples(std::io::Cursor::new(text.as_bytes()), format, None)
}
