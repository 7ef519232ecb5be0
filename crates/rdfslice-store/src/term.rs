//! RDF term model shared by the stores and the pipeline.

use std::fmt;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Subject position: an IRI or a blank node label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(String),
    Blank(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// IRI text or blank node label, without delimiters.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::Blank(label) => label,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(label) => write!(f, "_:{label}"),
        }
    }
}

/// A literal value. `datatype` and `language` are never both set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Builds a literal from the `DATATYPE(?o)` / `LANG(?o)` projections of a query.
    ///
    /// Empty strings count as absent. A language tag wins over the datatype, since
    /// SPARQL reports `rdf:langString` as the datatype of language-tagged literals.
    pub fn from_projection(
        value: impl Into<String>,
        datatype: Option<String>,
        language: Option<String>,
    ) -> Self {
        let language = language.filter(|l| !l.is_empty());
        let datatype = if language.is_some() {
            None
        } else {
            datatype.filter(|d| !d.is_empty())
        };
        Self {
            value: value.into(),
            datatype,
            language,
        }
    }
}

/// Object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Object {
    Node(Node),
    Literal(Literal),
}

impl Object {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Node(Node::Iri(iri.into()))
    }

    /// Lexical form: IRI text, blank label, or literal value.
    pub fn lexical(&self) -> &str {
        match self {
            Self::Node(node) => node.as_str(),
            Self::Literal(lit) => &lit.value,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Node(Node::Iri(iri)) => Some(iri),
            _ => None,
        }
    }
}

/// One row of a window query: `?s ?p ?o` with the object's datatype/language folded in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripleRow {
    pub subject: Node,
    pub predicate: String,
    pub object: Object,
}

impl TripleRow {
    pub fn new(subject: Node, predicate: impl Into<String>, object: Object) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    pub fn is_type_assertion(&self) -> bool {
        self.predicate == RDF_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_prefers_language_over_lang_string_datatype() {
        let lit = Literal::from_projection(
            "chat",
            Some(RDF_LANG_STRING.to_string()),
            Some("fr".to_string()),
        );
        assert_eq!(lit.language.as_deref(), Some("fr"));
        assert_eq!(lit.datatype, None);
    }

    #[test]
    fn projection_treats_empty_strings_as_absent() {
        let lit = Literal::from_projection("x", Some(String::new()), Some(String::new()));
        assert_eq!(lit, Literal::simple("x"));
    }

    #[test]
    fn node_display_uses_n3_delimiters() {
        assert_eq!(Node::iri("http://ex.org/a").to_string(), "<http://ex.org/a>");
        assert_eq!(Node::Blank("b0".to_string()).to_string(), "_:b0");
    }
}
