//! Concept scheme resolution over a fully loaded graph.

use crate::error::EmptyGraphError;
use skosmos_rdf::vocab::skos;
use skosmos_rdf::{Resource, ResourceGraph};
use std::collections::HashSet;

/// Every concept reachable from the graph's first ConceptScheme.
///
/// Top concepts (subjects of `skos:topConceptOf <scheme>`) come first, in
/// document order. Each top's narrower closure follows, one top after the
/// other: a concept's direct children are listed before any of their own
/// subtrees. Each concept appears once, at its first position; narrower
/// cycles are harmless.
///
/// Neither budgeted nor cached.
pub fn find_concepts(graph: &ResourceGraph) -> Result<Vec<Resource<'_>>, EmptyGraphError> {
    let scheme = graph
        .first_of_type(skos::CONCEPT_SCHEME)
        .ok_or(EmptyGraphError::NoConceptScheme)?;
    let tops = graph.subjects_with(skos::TOP_CONCEPT_OF, scheme.uri());

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered: Vec<&str> = Vec::new();
    for &top in &tops {
        if seen.insert(top) {
            ordered.push(top);
        }
    }

    let mut expanded: HashSet<&str> = HashSet::new();
    for &top in &tops {
        let mut stack: Vec<(Vec<&str>, usize)> = Vec::new();
        if expanded.insert(top) {
            stack.push(emit_children(graph, top, &mut seen, &mut ordered));
        }
        while let Some((children, next)) = stack.last_mut() {
            let Some(&child) = children.get(*next) else {
                stack.pop();
                continue;
            };
            *next += 1;
            if expanded.insert(child) {
                let frame = emit_children(graph, child, &mut seen, &mut ordered);
                stack.push(frame);
            }
        }
    }

    tracing::debug!(
        scheme = scheme.uri(),
        top_concepts = tops.len(),
        concepts = ordered.len(),
        "resolved concept scheme"
    );
    Ok(ordered.into_iter().map(|uri| graph.resource(uri)).collect())
}

/// Append the unseen narrower children of `uri` and return them as a frame
/// to expand.
fn emit_children<'g>(
    graph: &'g ResourceGraph,
    uri: &'g str,
    seen: &mut HashSet<&'g str>,
    ordered: &mut Vec<&'g str>,
) -> (Vec<&'g str>, usize) {
    let children = graph.resource(uri).resources(skos::NARROWER);
    for &child in &children {
        if seen.insert(child) {
            ordered.push(child);
        }
    }
    (children, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skosmos_rdf::RdfFormat;

    fn graph(turtle: &str) -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph
            .merge_document(turtle.as_bytes(), RdfFormat::Turtle)
            .expect("parse vocabulary");
        graph
    }

    fn uris<'g>(resources: &[Resource<'g>]) -> Vec<&'g str> {
        resources.iter().map(|r| r.uri()).collect()
    }

    const PREFIXES: &str = "@prefix skos: <http://www.w3.org/2004/02/skos/core#> .\n\
                            @prefix ex: <http://example.org/> .\n";

    #[test]
    fn tops_first_then_each_subtree() {
        let graph = graph(&format!(
            "{PREFIXES}
ex:scheme a skos:ConceptScheme .
ex:a skos:topConceptOf ex:scheme ; skos:narrower ex:a1, ex:a2 .
ex:b skos:topConceptOf ex:scheme ; skos:narrower ex:b1 .
ex:a1 skos:narrower ex:a11 .
ex:a2 skos:narrower ex:a21 .
"
        ));
        let concepts = find_concepts(&graph).unwrap();
        assert_eq!(
            uris(&concepts),
            vec![
                "http://example.org/a",
                "http://example.org/b",
                "http://example.org/a1",
                "http://example.org/a2",
                "http://example.org/a11",
                "http://example.org/a21",
                "http://example.org/b1",
            ]
        );
    }

    #[test]
    fn cycles_and_shared_children_appear_once() {
        let graph = graph(&format!(
            "{PREFIXES}
ex:scheme a skos:ConceptScheme .
ex:a skos:topConceptOf ex:scheme ; skos:narrower ex:shared .
ex:b skos:topConceptOf ex:scheme ; skos:narrower ex:shared .
ex:shared skos:narrower ex:a .
"
        ));
        let concepts = find_concepts(&graph).unwrap();
        assert_eq!(
            uris(&concepts),
            vec![
                "http://example.org/a",
                "http://example.org/b",
                "http://example.org/shared",
            ]
        );
    }

    #[test]
    fn has_top_concept_alone_does_not_make_a_top() {
        let graph = graph(&format!(
            "{PREFIXES}
ex:scheme a skos:ConceptScheme ; skos:hasTopConcept ex:a .
"
        ));
        assert!(find_concepts(&graph).unwrap().is_empty());
    }

    #[test]
    fn graph_without_scheme_is_empty() {
        let graph = graph(&format!("{PREFIXES}ex:a skos:prefLabel \"A\" .\n"));
        assert_eq!(
            find_concepts(&graph).unwrap_err(),
            EmptyGraphError::NoConceptScheme
        );
    }
}
