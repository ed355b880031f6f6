//! Bounded, cache-aware crawl of a concept scheme.
//!
//! Starting from the scheme's top concepts, every concept is loaded one
//! request at a time and its `skos:narrower` children are walked depth first.
//! The crawl stops early, successfully, once an incremental run has found its
//! budget of new leaf concepts.
//!
//! Across runs, the fetch cache remembers leaves and fully explored branches.
//! A branch whose walk was cut short by the budget is never remembered, so the
//! next incremental run descends into it again and reaches the children it
//! missed.
//!
//! The walk keeps an explicit stack of sibling lists instead of recursing, so
//! vocabulary depth does not translate into call-stack depth.

use crate::cache::{CacheBackend, UriCache};
use crate::error::FetchError;
use crate::loader::GraphLoader;
use crate::source::RemoteSource;
use skosmos_rdf::vocab::skos;
use skosmos_rdf::ResourceGraph;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub application_uri: &'a str,
    pub scheme_uri: &'a str,
    pub incremental: bool,
    /// Leaf budget; only read when `incremental` is set.
    pub max_leaf_concepts: usize,
    pub cache_key: &'a str,
}

impl FetchRequest<'_> {
    pub fn leaf_budget(&self) -> Option<usize> {
        self.incremental.then_some(self.max_leaf_concepts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalOutcome {
    /// The ConceptScheme found after loading the root; `None` means there
    /// is nothing to import.
    pub scheme: Option<String>,
    /// Concepts loaded by this run, in load order, each once.
    pub fetched: Vec<String>,
    /// Newly found leaf concepts, in load order.
    pub leaves: Vec<String>,
    pub budget_exhausted: bool,
}

struct Frame {
    uris: Vec<String>,
    next: usize,
    /// The concept whose children these are; `None` for the top concepts.
    branch: Option<String>,
}

/// Crawl the scheme at `request.scheme_uri` into `graph`.
///
/// Any load failure aborts the crawl. Running out of budget does not: the
/// concepts fetched so far are returned.
pub fn fetch_vocabulary<S, B>(
    loader: &GraphLoader<S>,
    cache: &mut UriCache<B>,
    graph: &mut ResourceGraph,
    request: &FetchRequest<'_>,
) -> Result<TraversalOutcome, FetchError>
where
    S: RemoteSource,
    B: CacheBackend,
{
    loader.load(graph, request.application_uri, request.scheme_uri)?;

    let Some(scheme) = graph.first_of_type(skos::CONCEPT_SCHEME) else {
        tracing::warn!(
            scheme = request.scheme_uri,
            "no ConceptScheme in the loaded resource; nothing to import"
        );
        return Ok(TraversalOutcome::default());
    };
    let scheme_uri = scheme.uri().to_string();
    let tops: Vec<String> = scheme
        .resources(skos::HAS_TOP_CONCEPT)
        .into_iter()
        .map(str::to_string)
        .collect();
    tracing::debug!(scheme = %scheme_uri, top_concepts = tops.len(), "loaded concept scheme");

    let budget = request.leaf_budget();
    let exhausted = |leaves: &[String]| budget.is_some_and(|max| leaves.len() >= max);

    let mut outcome = TraversalOutcome {
        scheme: Some(scheme_uri),
        ..TraversalOutcome::default()
    };
    let mut fetched_set: HashSet<String> = HashSet::new();
    let mut stack = vec![Frame {
        uris: tops,
        next: 0,
        branch: None,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(uri) = frame.uris.get(frame.next).cloned() else {
            let Some(branch) = stack.pop().and_then(|done| done.branch) else {
                continue;
            };
            // Evaluated against the global leaf count at the moment the
            // branch's child list runs out.
            let fully_explored = !exhausted(&outcome.leaves);
            tracing::debug!(uri = %branch, fully_explored, "traversal of branch completed");
            if request.incremental && fully_explored {
                cache.mark_visited(&branch, request.cache_key);
            }
            continue;
        };

        if exhausted(&outcome.leaves) {
            tracing::debug!(
                leaves = outcome.leaves.len(),
                "max number of leaf concepts reached"
            );
            outcome.budget_exhausted = true;
            break;
        }
        frame.next += 1;

        if fetched_set.contains(&uri) {
            tracing::debug!(uri = %uri, "resource already fetched");
            continue;
        }
        if request.incremental && cache.is_visited(&uri, request.cache_key) {
            tracing::debug!(uri = %uri, "resource is in cache");
            continue;
        }

        tracing::debug!(uri = %uri, "loading concept");
        loader.load(graph, request.application_uri, &uri)?;
        fetched_set.insert(uri.clone());
        outcome.fetched.push(uri.clone());

        let children: Vec<String> = graph
            .resource(&uri)
            .resources(skos::NARROWER)
            .into_iter()
            .map(str::to_string)
            .collect();

        if children.is_empty() {
            cache.mark_visited(&uri, request.cache_key);
            outcome.leaves.push(uri);
            tracing::debug!(leaves = outcome.leaves.len(), "leaf concept fetched");
        } else {
            stack.push(Frame {
                uris: children,
                next: 0,
                branch: Some(uri),
            });
        }
    }

    tracing::info!(
        fetched = outcome.fetched.len(),
        leaves = outcome.leaves.len(),
        budget_exhausted = outcome.budget_exhausted,
        "vocabulary fetch finished"
    );
    Ok(outcome)
}
