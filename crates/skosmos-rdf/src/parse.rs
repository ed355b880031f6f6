//! Sophia-backed parsing into [`Statement`]s.

use crate::term::{parse_node_term_display, parse_term_display, RdfNode, Statement};
use crate::RdfError;
use sophia::api::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// What the terminology service returns for `format=text/turtle`.
    Turtle,
    /// The intermediate artifact between the fetch and parse stages.
    NTriples,
}

impl RdfFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::NTriples => "application/n-triples",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct StatementSinkError(#[from] RdfError);

/// Parse a document into statements, in document order.
pub fn parse_statements(bytes: &[u8], format: RdfFormat) -> Result<Vec<Statement>, RdfError> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut out: Vec<Statement> = Vec::new();

    match format {
        RdfFormat::Turtle => {
            let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| -> Result<(), StatementSinkError> {
                    let subject = parse_node_term_display(&t.s().to_string())?;
                    let RdfNode::Iri(predicate) = parse_node_term_display(&t.p().to_string())?
                    else {
                        return Ok(());
                    };
                    let object = parse_term_display(&t.o().to_string())?;
                    out.push(Statement {
                        subject,
                        predicate,
                        object,
                    });
                    Ok(())
                })
                .map_err(|e| RdfError::Syntax {
                    format: "Turtle",
                    message: e.to_string(),
                })?;
        }
        RdfFormat::NTriples => {
            let mut parser = sophia::turtle::parser::nt::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| -> Result<(), StatementSinkError> {
                    let subject = parse_node_term_display(&t.s().to_string())?;
                    let RdfNode::Iri(predicate) = parse_node_term_display(&t.p().to_string())?
                    else {
                        return Ok(());
                    };
                    let object = parse_term_display(&t.o().to_string())?;
                    out.push(Statement {
                        subject,
                        predicate,
                        object,
                    });
                    Ok(())
                })
                .map_err(|e| RdfError::Syntax {
                    format: "N-Triples",
                    message: e.to_string(),
                })?;
        }
    }

    Ok(out)
}
