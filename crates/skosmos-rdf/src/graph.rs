//! The mutable, append-only resource graph.
//!
//! One [`ResourceGraph`] accumulates every document merged during a single
//! fetch or parse pass. Statements keep first-seen order and identical
//! statements are stored once, so a concept described by several responses
//! (its own description plus its neighbours') contributes each value once.

use crate::parse::{parse_statements, RdfFormat};
use crate::term::{RdfLiteral, RdfNode, RdfObject, Statement};
use crate::vocab::RDF_TYPE;
use crate::RdfError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Default)]
pub struct ResourceGraph {
    statements: Vec<Statement>,
    seen: HashSet<Statement>,
    by_subject: HashMap<RdfNode, Vec<usize>>,
    by_object: HashMap<RdfNode, Vec<usize>>,
    documents: usize,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Add one statement. Returns `false` when it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        if self.seen.contains(&statement) {
            return false;
        }
        let index = self.statements.len();
        self.by_subject
            .entry(statement.subject.clone())
            .or_default()
            .push(index);
        if let RdfObject::Node(node) = &statement.object {
            self.by_object.entry(node.clone()).or_default().push(index);
        }
        self.seen.insert(statement.clone());
        self.statements.push(statement);
        true
    }

    /// Parse `bytes` and merge the result. Nothing is merged when parsing
    /// fails. Returns the number of statements that were new to the graph.
    pub fn merge_document(&mut self, bytes: &[u8], format: RdfFormat) -> Result<usize, RdfError> {
        let parsed = parse_statements(bytes, format)?;
        self.documents += 1;
        let scope = format!("d{}", self.documents);

        let mut added = 0;
        for mut statement in parsed {
            scope_blank_node(&mut statement.subject, &scope);
            if let RdfObject::Node(node) = &mut statement.object {
                scope_blank_node(node, &scope);
            }
            if self.insert(statement) {
                added += 1;
            }
        }
        tracing::trace!(
            format = format.media_type(),
            added,
            total = self.len(),
            "merged RDF document"
        );
        Ok(added)
    }

    /// Read an N-Triples file into a fresh graph.
    pub fn from_ntriples_file(path: &Path) -> Result<Self, RdfError> {
        let bytes = std::fs::read(path)?;
        let mut graph = Self::new();
        graph.merge_document(&bytes, RdfFormat::NTriples)?;
        Ok(graph)
    }

    /// View of the resource identified by `uri`. The view is valid even when
    /// the graph holds no statement about it.
    pub fn resource<'g>(&'g self, uri: &'g str) -> Resource<'g> {
        Resource { graph: self, uri }
    }

    /// IRIs of every resource typed `type_iri`, in document order.
    pub fn all_of_type(&self, type_iri: &str) -> Vec<&str> {
        let type_node = RdfNode::Iri(type_iri.to_string());
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for &i in self.by_object.get(&type_node).into_iter().flatten() {
            let statement = &self.statements[i];
            if statement.predicate != RDF_TYPE {
                continue;
            }
            if let Some(iri) = statement.subject.iri() {
                if seen.insert(iri) {
                    out.push(iri);
                }
            }
        }
        out
    }

    /// First resource typed `type_iri`.
    pub fn first_of_type(&self, type_iri: &str) -> Option<Resource<'_>> {
        self.all_of_type(type_iri)
            .into_iter()
            .next()
            .map(|uri| self.resource(uri))
    }

    /// IRIs of the subjects `s` with `s predicate <object_uri>` (the inverse
    /// `^predicate` path), in document order, each once.
    pub fn subjects_with(&self, predicate: &str, object_uri: &str) -> Vec<&str> {
        let object = RdfNode::Iri(object_uri.to_string());
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for &i in self.by_object.get(&object).into_iter().flatten() {
            let statement = &self.statements[i];
            if statement.predicate != predicate {
                continue;
            }
            if let Some(iri) = statement.subject.iri() {
                if seen.insert(iri) {
                    out.push(iri);
                }
            }
        }
        out
    }

    fn objects<'g>(
        &'g self,
        subject_uri: &str,
        predicate: &'g str,
    ) -> impl Iterator<Item = &'g RdfObject> + 'g {
        let subject = RdfNode::Iri(subject_uri.to_string());
        self.by_subject
            .get(&subject)
            .into_iter()
            .flatten()
            .map(move |&i| &self.statements[i])
            .filter(move |s| s.predicate == predicate)
            .map(|s| &s.object)
    }
}

fn scope_blank_node(node: &mut RdfNode, scope: &str) {
    if let RdfNode::BlankNode(label) = node {
        *label = format!("{scope}_{label}");
    }
}

/// Read-only view of one resource in a [`ResourceGraph`].
#[derive(Debug, Clone, Copy)]
pub struct Resource<'g> {
    graph: &'g ResourceGraph,
    uri: &'g str,
}

impl<'g> Resource<'g> {
    pub fn uri(&self) -> &'g str {
        self.uri
    }

    /// Whether the graph holds at least one statement about this resource.
    pub fn is_described(&self) -> bool {
        self.graph
            .by_subject
            .contains_key(&RdfNode::Iri(self.uri.to_string()))
    }

    /// Literal values of `predicate`, in document order.
    pub fn literals(&self, predicate: &'g str) -> Vec<&'g RdfLiteral> {
        self.graph
            .objects(self.uri, predicate)
            .filter_map(|o| match o {
                RdfObject::Literal(lit) => Some(lit),
                RdfObject::Node(_) => None,
            })
            .collect()
    }

    /// First literal value of `predicate`.
    pub fn literal(&self, predicate: &'g str) -> Option<&'g RdfLiteral> {
        self.literals(predicate).into_iter().next()
    }

    /// IRIs of the resource-valued objects of `predicate`, in document order,
    /// each once. Blank-node objects are skipped.
    pub fn resources(&self, predicate: &'g str) -> Vec<&'g str> {
        let mut seen = HashSet::new();
        self.graph
            .objects(self.uri, predicate)
            .filter_map(|o| match o {
                RdfObject::Node(node) => node.iri(),
                RdfObject::Literal(_) => None,
            })
            .filter(|iri| seen.insert(*iri))
            .collect()
    }

    /// First resource-valued object of `predicate`.
    pub fn resource(&self, predicate: &'g str) -> Option<&'g str> {
        self.graph
            .objects(self.uri, predicate)
            .find_map(|o| match o {
                RdfObject::Node(node) => node.iri(),
                RdfObject::Literal(_) => None,
            })
    }

    pub fn is_a(&self, type_iri: &str) -> bool {
        self.resources(RDF_TYPE).contains(&type_iri)
    }
}
