//! In-memory RDF resource graph for SKOS imports.
//!
//! This crate is the storage layer underneath the vocabulary importer:
//!
//! - it parses the Turtle documents served by a Skosmos-style terminology
//!   service and the N-Triples artifact passed between import stages
//!   (both through **Sophia**),
//! - it accumulates statements into a [`ResourceGraph`] that can be queried
//!   by resource IRI and predicate,
//! - it writes the accumulated graph back out as N-Triples.
//!
//! A graph is scoped to one fetch or parse pass. Create a fresh one per run:
//! reusing a graph across feeds would leak one vocabulary's statements into
//! the next.

pub mod graph;
pub mod ntriples;
pub mod parse;
pub mod term;
pub mod vocab;

pub use graph::{Resource, ResourceGraph};
pub use ntriples::write_ntriples;
pub use parse::{parse_statements, RdfFormat};
pub use term::{RdfLiteral, RdfNode, RdfObject, Statement};

#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {format}: {message}")]
    Syntax {
        format: &'static str,
        message: String,
    },
    #[error("{0}")]
    Term(String),
}
