//! SPARQL XML results (`application/sparql-results+xml`) decoding.

use crate::term::{Literal, Node, Object, TripleRow};
use crate::{StoreError, StoreResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Value bound to one variable of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingValue {
    Uri(String),
    Bnode(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl BindingValue {
    /// Text content of the binding regardless of its kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Uri(v) | Self::Bnode(v) => v,
            Self::Literal { value, .. } => value,
        }
    }

    fn into_node(self) -> Option<Node> {
        match self {
            Self::Uri(iri) => Some(Node::Iri(iri)),
            Self::Bnode(label) => Some(Node::Blank(label)),
            Self::Literal { .. } => None,
        }
    }
}

/// One `<result>` element: variable name → bound value. Unbound variables are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    bindings: HashMap<String, BindingValue>,
}

impl Solution {
    pub fn get(&self, var: &str) -> Option<&BindingValue> {
        self.bindings.get(var)
    }

    pub fn take(&mut self, var: &str) -> Option<BindingValue> {
        self.bindings.remove(var)
    }

    pub fn insert(&mut self, var: impl Into<String>, value: BindingValue) {
        self.bindings.insert(var.into(), value);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug)]
enum ValueKind {
    Uri,
    Bnode,
    Literal {
        datatype: Option<String>,
        language: Option<String>,
    },
}

fn xml_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Results(e.to_string())
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> StoreResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value().map_err(xml_err)?.into_owned()));
        }
    }
    Ok(None)
}

fn literal_kind(e: &BytesStart<'_>) -> StoreResult<ValueKind> {
    Ok(ValueKind::Literal {
        datatype: attribute(e, b"datatype")?,
        language: attribute(e, b"xml:lang")?,
    })
}

fn finish_value(kind: ValueKind, text: String) -> BindingValue {
    match kind {
        ValueKind::Uri => BindingValue::Uri(text),
        ValueKind::Bnode => BindingValue::Bnode(text),
        ValueKind::Literal { datatype, language } => BindingValue::Literal {
            value: text,
            datatype,
            language,
        },
    }
}

/// Decodes a SPARQL XML results document into its solutions, in document order.
///
/// Whitespace between elements is ignored; whitespace inside `<literal>` is kept.
pub fn parse_solutions(xml: &str) -> StoreResult<Vec<Solution>> {
    let mut reader = Reader::from_str(xml);

    let mut solutions = Vec::new();
    let mut current: Option<Solution> = None;
    let mut binding: Option<String> = None;
    let mut value: Option<(ValueKind, String)> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sparql" => saw_root = true,
                b"result" => current = Some(Solution::default()),
                b"binding" => binding = attribute(&e, b"name")?,
                b"uri" => value = Some((ValueKind::Uri, String::new())),
                b"bnode" => value = Some((ValueKind::Bnode, String::new())),
                b"literal" => value = Some((literal_kind(&e)?, String::new())),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"literal" => {
                    if let (Some(solution), Some(name)) = (current.as_mut(), binding.as_ref()) {
                        solution.insert(name.clone(), finish_value(literal_kind(&e)?, String::new()));
                    }
                }
                b"result" => solutions.push(Solution::default()),
                _ => {}
            },
            Event::Text(t) => {
                if let Some((_, text)) = value.as_mut() {
                    text.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(c) => {
                if let Some((_, text)) = value.as_mut() {
                    text.push_str(std::str::from_utf8(&c).map_err(xml_err)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"uri" | b"bnode" | b"literal" => {
                    if let Some((kind, text)) = value.take() {
                        if let (Some(solution), Some(name)) = (current.as_mut(), binding.as_ref()) {
                            solution.insert(name.clone(), finish_value(kind, text));
                        }
                    }
                }
                b"binding" => binding = None,
                b"result" => {
                    if let Some(solution) = current.take() {
                        solutions.push(solution);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(StoreError::Results(
            "document has no <sparql> root element".to_string(),
        ));
    }
    Ok(solutions)
}

/// Reads the single integer binding `var` of a counting query.
pub fn count_from_solutions(solutions: &[Solution], var: &str) -> StoreResult<u64> {
    let Some(first) = solutions.first() else {
        return Ok(0);
    };
    let value = first
        .get(var)
        .ok_or_else(|| StoreError::MissingBinding(var.to_string()))?;
    value
        .text()
        .trim()
        .parse::<u64>()
        .map_err(|e| StoreError::Results(format!("`{var}` is not a count: {e}")))
}

/// Collects the IRI values bound to `var`, deduplicated, in first-seen order.
pub fn iris_from_solutions(solutions: Vec<Solution>, var: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for mut solution in solutions {
        if let Some(BindingValue::Uri(iri)) = solution.take(var) {
            if seen.insert(iri.clone()) {
                out.push(iri);
            }
        }
    }
    out
}

/// Converts window-query solutions (`s`, `p`, `o`, `otype`, `olang`) into triple rows.
///
/// The `otype`/`olang` projections take precedence over the attributes on the `<literal>`
/// element itself; the latter are the fallback for endpoints that leave them unbound.
pub fn rows_from_solutions(solutions: Vec<Solution>) -> StoreResult<Vec<TripleRow>> {
    let mut rows = Vec::with_capacity(solutions.len());
    for mut solution in solutions {
        let subject = solution
            .take("s")
            .and_then(BindingValue::into_node)
            .ok_or_else(|| StoreError::MissingBinding("s".to_string()))?;
        let predicate = match solution.take("p") {
            Some(BindingValue::Uri(iri)) => iri,
            _ => return Err(StoreError::MissingBinding("p".to_string())),
        };
        let otype = solution.take("otype").map(|v| v.text().to_string());
        let olang = solution.take("olang").map(|v| v.text().to_string());
        let object = match solution.take("o") {
            Some(BindingValue::Uri(iri)) => Object::Node(Node::Iri(iri)),
            Some(BindingValue::Bnode(label)) => Object::Node(Node::Blank(label)),
            Some(BindingValue::Literal {
                value,
                datatype,
                language,
            }) => Object::Literal(Literal::from_projection(
                value,
                otype.filter(|t| !t.is_empty()).or(datatype),
                olang.filter(|l| !l.is_empty()).or(language),
            )),
            None => return Err(StoreError::MissingBinding("o".to_string())),
        };
        rows.push(TripleRow {
            subject,
            predicate,
            object,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::XSD_STRING;

    const WINDOW_XML: &str = r#"<?xml version="1.0"?>
<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head>
    <variable name="s"/><variable name="p"/><variable name="o"/>
    <variable name="otype"/><variable name="olang"/>
  </head>
  <results>
    <result>
      <binding name="s"><uri>http://ex.org/r/1</uri></binding>
      <binding name="p"><uri>http://purl.org/dc/terms/title</uri></binding>
      <binding name="o"><literal xml:lang="en">  Padded &amp; escaped </literal></binding>
      <binding name="otype"><uri>http://www.w3.org/1999/02/22-rdf-syntax-ns#langString</uri></binding>
      <binding name="olang"><literal>en</literal></binding>
    </result>
    <result>
      <binding name="s"><uri>http://ex.org/r/1</uri></binding>
      <binding name="p"><uri>http://www.w3.org/1999/02/22-rdf-syntax-ns#type</uri></binding>
      <binding name="o"><uri>http://ex.org/Thing</uri></binding>
    </result>
    <result>
      <binding name="s"><bnode>b7</bnode></binding>
      <binding name="p"><uri>http://ex.org/count</uri></binding>
      <binding name="o"><literal datatype="http://www.w3.org/2001/XMLSchema#integer">3</literal></binding>
      <binding name="otype"><uri>http://www.w3.org/2001/XMLSchema#integer</uri></binding>
    </result>
    <result>
      <binding name="s"><uri>http://ex.org/r/2</uri></binding>
      <binding name="p"><uri>http://ex.org/note</uri></binding>
      <binding name="o"><literal/></binding>
      <binding name="otype"><uri>http://www.w3.org/2001/XMLSchema#string</uri></binding>
    </result>
  </results>
</sparql>"#;

    #[test]
    fn window_rows_keep_literal_whitespace_and_typing() {
        let rows = rows_from_solutions(parse_solutions(WINDOW_XML).unwrap()).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].subject, Node::iri("http://ex.org/r/1"));
        assert_eq!(
            rows[0].object,
            Object::Literal(Literal::lang("  Padded & escaped ", "en"))
        );
        assert_eq!(rows[1].object, Object::iri("http://ex.org/Thing"));
        assert_eq!(rows[2].subject, Node::Blank("b7".to_string()));
        assert_eq!(
            rows[2].object,
            Object::Literal(Literal::typed(
                "3",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))
        );
        assert_eq!(
            rows[3].object,
            Object::Literal(Literal::typed("", XSD_STRING))
        );
    }

    #[test]
    fn count_reads_first_solution() {
        let xml = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head><variable name="nb"/></head>
  <results><result><binding name="nb">
    <literal datatype="http://www.w3.org/2001/XMLSchema#integer">250</literal>
  </binding></result></results>
</sparql>"#;
        let solutions = parse_solutions(xml).unwrap();
        assert_eq!(count_from_solutions(&solutions, "nb").unwrap(), 250);
    }

    #[test]
    fn empty_results_count_as_zero() {
        let xml = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head><variable name="nb"/></head><results></results></sparql>"#;
        let solutions = parse_solutions(xml).unwrap();
        assert!(solutions.is_empty());
        assert_eq!(count_from_solutions(&solutions, "nb").unwrap(), 0);
    }

    #[test]
    fn iris_are_deduplicated_in_first_seen_order() {
        let xml = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
  <head><variable name="p"/></head>
  <results>
    <result><binding name="p"><uri>http://ex.org/b</uri></binding></result>
    <result><binding name="p"><uri>http://ex.org/a</uri></binding></result>
    <result><binding name="p"><uri>http://ex.org/b</uri></binding></result>
  </results>
</sparql>"#;
        let iris = iris_from_solutions(parse_solutions(xml).unwrap(), "p");
        assert_eq!(iris, vec!["http://ex.org/b", "http://ex.org/a"]);
    }

    #[test]
    fn rejects_non_results_documents() {
        let err = parse_solutions("<html><body>502 Bad Gateway</body></html>").unwrap_err();
        assert!(matches!(err, StoreError::Results(_)));
    }

    #[test]
    fn missing_subject_is_reported() {
        let mut solution = Solution::default();
        solution.insert("p", BindingValue::Uri("http://ex.org/p".to_string()));
        solution.insert("o", BindingValue::Uri("http://ex.org/o".to_string()));
        let err = rows_from_solutions(vec![solution]).unwrap_err();
        assert!(matches!(err, StoreError::MissingBinding(ref v) if v == "s"));
    }
}
