//! Downstream storage of extracted concepts.

use crate::concept::Concept;
use crate::error::SinkError;

/// Receives concepts keyed by URI. Relation fields may name concepts the sink
/// has not seen yet.
pub trait ConceptSink {
    fn accept(&mut self, concept: Concept) -> Result<(), SinkError>;
}

impl<K: ConceptSink + ?Sized> ConceptSink for &mut K {
    fn accept(&mut self, concept: Concept) -> Result<(), SinkError> {
        (**self).accept(concept)
    }
}

impl ConceptSink for Vec<Concept> {
    fn accept(&mut self, concept: Concept) -> Result<(), SinkError> {
        self.push(concept);
        Ok(())
    }
}
