//! RDF term model.
//!
//! Terms are kept as plain owned strings: the graph only ever needs to compare
//! IRIs, read literal lexical forms and write the statements back out as
//! N-Triples.

use crate::RdfError;
use std::fmt;

pub const XSD_STRING_IRI: &str = "http://www.w3.org/2001/XMLSchema#string";

/// A subject-position node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfNode {
    Iri(String),
    BlankNode(String),
}

impl RdfNode {
    pub fn iri(&self) -> Option<&str> {
        match self {
            RdfNode::Iri(iri) => Some(iri),
            RdfNode::BlankNode(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdfLiteral {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl RdfLiteral {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Language tags compare case-insensitively (BCP 47).
    pub fn has_language(&self, tag: &str) -> bool {
        self.language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

/// One triple. Predicates are always IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: RdfNode,
    pub predicate: String,
    pub object: RdfObject,
}

// ============================================================================
// N-Triples display form
// ============================================================================

impl fmt::Display for RdfNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfNode::Iri(iri) => write!(f, "<{iri}>"),
            RdfNode::BlankNode(label) => write!(f, "_:{label}"),
        }
    }
}

impl fmt::Display for RdfLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_rdf_string(&self.lexical))?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")
        } else {
            match self.datatype.as_deref() {
                Some(dt) if dt != XSD_STRING_IRI => write!(f, "^^<{dt}>"),
                _ => Ok(()),
            }
        }
    }
}

impl fmt::Display for RdfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfObject::Node(node) => node.fmt(f),
            RdfObject::Literal(lit) => lit.fmt(f),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

fn escape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Read a term back from the display form Sophia gives it: `<iri>`, `_:label`
/// or a quoted literal with an optional `@lang` or `^^<datatype>` suffix.
pub(crate) fn parse_term_display(term: &str) -> Result<RdfObject, RdfError> {
    let s = term.trim();
    if let Some(iri) = angle_bracketed(s) {
        Ok(RdfObject::Node(RdfNode::Iri(iri.to_string())))
    } else if let Some(label) = s.strip_prefix("_:") {
        Ok(RdfObject::Node(RdfNode::BlankNode(label.to_string())))
    } else if let Some(body) = s.strip_prefix('"') {
        read_literal(body).map(RdfObject::Literal)
    } else {
        Err(RdfError::Term(format!("unsupported RDF term form: {s}")))
    }
}

fn angle_bracketed(s: &str) -> Option<&str> {
    s.strip_prefix('<')?.strip_suffix('>')
}

/// `body` is everything after the opening quote.
fn read_literal(body: &str) -> Result<RdfLiteral, RdfError> {
    let bad = |what: &str| RdfError::Term(format!("{what} in literal \"{body}"));

    let mut lexical = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    let suffix = loop {
        match chars.next() {
            None => return Err(bad("missing closing quote")),
            Some((i, '"')) => break body[i + 1..].trim(),
            Some((_, '\\')) => {
                let escaped = chars.next().map(|(_, c)| c);
                lexical.push(match escaped {
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some(c @ ('"' | '\'' | '\\')) => c,
                    Some('u') => code_point(&mut chars, 4).ok_or_else(|| bad("bad \\u escape"))?,
                    Some('U') => code_point(&mut chars, 8).ok_or_else(|| bad("bad \\U escape"))?,
                    _ => return Err(bad("unknown escape")),
                });
            }
            Some((_, c)) => lexical.push(c),
        }
    };

    let mut literal = RdfLiteral::plain(lexical);
    if let Some(tag) = suffix.strip_prefix('@') {
        literal.language = Some(tag.to_string());
    } else if let Some(dt) = suffix.strip_prefix("^^") {
        let dt = angle_bracketed(dt.trim()).ok_or_else(|| bad("datatype is not an IRI"))?;
        if dt != XSD_STRING_IRI {
            literal.datatype = Some(dt.to_string());
        }
    } else if !suffix.is_empty() {
        return Err(bad("trailing text"));
    }
    Ok(literal)
}

fn code_point(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
    if hex.len() != digits {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

pub(crate) fn parse_node_term_display(term: &str) -> Result<RdfNode, RdfError> {
    match parse_term_display(term)? {
        RdfObject::Node(node) => Ok(node),
        RdfObject::Literal(_) => Err(RdfError::Term(format!(
            "expected IRI/blank node, got literal: {term}"
        ))),
    }
}
