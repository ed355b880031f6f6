//! Concept records and their extraction from a [`Resource`].

use serde::{Deserialize, Serialize};
use skosmos_rdf::vocab::skos;
use skosmos_rdf::{RdfLiteral, Resource};

/// One SKOS concept as handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    #[serde(rename = "URI")]
    pub uri: String,
    /// Conventionally present; not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub alt_label: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broad_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrow_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<String>,
}

impl Concept {
    /// The label used in log lines and summaries, falling back to the URI.
    pub fn display_label(&self) -> &str {
        self.pref_label.as_deref().unwrap_or(&self.uri)
    }
}

/// Builds [`Concept`]s from graph resources.
///
/// Extraction never fails: absent values leave the field empty. With a
/// preferred language set, single-valued literal fields take the first
/// literal in that language and otherwise the first literal of any language.
#[derive(Debug, Clone, Default)]
pub struct ConceptExtractor {
    preferred_language: Option<String>,
}

impl ConceptExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferred_language(language: Option<String>) -> Self {
        Self {
            preferred_language: language.filter(|l| !l.trim().is_empty()),
        }
    }

    pub fn build_concept(&self, resource: &Resource<'_>) -> Concept {
        Concept {
            uri: resource.uri().to_string(),
            pref_label: self.single_literal(resource, skos::PREF_LABEL),
            scope_note: self.single_literal(resource, skos::SCOPE_NOTE),
            definition: self.single_literal(resource, skos::DEFINITION),
            alt_label: resource
                .literals(skos::ALT_LABEL)
                .into_iter()
                .map(|l| l.lexical.clone())
                .collect(),
            broader: single_resource(resource, skos::BROADER),
            broad_match: single_resource(resource, skos::BROAD_MATCH),
            narrow_match: single_resource(resource, skos::NARROW_MATCH),
            related_match: single_resource(resource, skos::RELATED_MATCH),
            close_match: single_resource(resource, skos::CLOSE_MATCH),
            exact_match: single_resource(resource, skos::EXACT_MATCH),
        }
    }

    fn single_literal(&self, resource: &Resource<'_>, predicate: &'static str) -> Option<String> {
        let literals = resource.literals(predicate);
        let preferred = self
            .preferred_language
            .as_deref()
            .and_then(|tag| literals.iter().find(|l| l.has_language(tag)));
        preferred
            .or_else(|| literals.first())
            .map(|l: &&RdfLiteral| l.lexical.clone())
    }
}

fn single_resource(resource: &Resource<'_>, predicate: &'static str) -> Option<String> {
    resource.resource(predicate).map(str::to_string)
}

// ============================================================================
// Mapping sources
// ============================================================================

/// A Concept field a downstream mapping can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingSource {
    pub field: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const MAPPING_SOURCES: &[MappingSource] = &[
    MappingSource {
        field: "prefLabel",
        label: "skos:prefLabel",
        description: "The preferred lexical label for a resource, in a given language.",
    },
    MappingSource {
        field: "altLabel",
        label: "skos:altLabel",
        description: "An alternative lexical label for a resource.",
    },
    MappingSource {
        field: "definition",
        label: "skos:definition",
        description: "A statement or formal explanation of the meaning of a concept.",
    },
    MappingSource {
        field: "scopeNote",
        label: "skos:scopeNote",
        description: "Note that helps to clarify the meaning and/or the use of the concept.",
    },
    MappingSource {
        field: "URI",
        label: "Resource URI",
        description: "URI of the RDF resource.",
    },
    MappingSource {
        field: "broader",
        label: "skos:broader",
        description: "Broader concept.",
    },
    MappingSource {
        field: "broadMatch",
        label: "skos:broadMatch",
        description: "Broader concept in another concept scheme.",
    },
    MappingSource {
        field: "narrowMatch",
        label: "skos:narrowMatch",
        description: "Narrower concept in another concept scheme.",
    },
    MappingSource {
        field: "relatedMatch",
        label: "skos:relatedMatch",
        description: "Associated concept in another concept scheme.",
    },
    MappingSource {
        field: "closeMatch",
        label: "skos:closeMatch",
        description: "Sufficiently similar concept in another concept scheme.",
    },
    MappingSource {
        field: "exactMatch",
        label: "skos:exactMatch",
        description: "Interchangeable concept in another concept scheme.",
    },
];

/// Every field of [`Concept`], in display order.
pub fn mapping_sources() -> &'static [MappingSource] {
    MAPPING_SOURCES
}
