//! Fetch stage, parse stage and the import run that chains them.
//!
//! The fetch stage crawls the remote vocabulary into a fresh graph and writes
//! it to an N-Triples artifact. The parse stage reloads that artifact into
//! another fresh graph, resolves the scheme's concepts and extracts records.
//! In incremental mode the parse stage only emits concepts the fetch stage
//! loaded in the same run, and each of them at most once across runs.

use crate::cache::{CacheBackend, UriCache};
use crate::concept::{Concept, ConceptExtractor};
use crate::config::{CacheRole, Feed};
use crate::error::{EmptyGraphError, ImportError, ParseStageError};
use crate::loader::GraphLoader;
use crate::resolver::find_concepts;
use crate::sink::ConceptSink;
use crate::source::RemoteSource;
use crate::traversal::{fetch_vocabulary, FetchRequest};
use skosmos_rdf::{write_ntriples, RdfError, ResourceGraph};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const ARTIFACT_PREFIX: &str = "feeds_skosmos_api_fetcher";

// ============================================================================
// Fetch stage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The N-Triples artifact. The caller owns it from here on.
    pub artifact: PathBuf,
    pub scheme: Option<String>,
    /// Concepts loaded by this run. In incremental mode these are the only
    /// concepts the parse stage emits.
    pub fetched: Vec<String>,
    pub budget_exhausted: bool,
    pub message: String,
}

/// Crawl `feed` and write the accumulated graph to a new artifact file in
/// `artifact_dir` (the system temp directory when `None`).
pub fn fetch_feed<S, B>(
    feed: &Feed,
    loader: &GraphLoader<S>,
    cache: &mut UriCache<B>,
    artifact_dir: Option<&Path>,
) -> Result<FetchOutcome, ImportError>
where
    S: RemoteSource,
    B: CacheBackend,
{
    feed.validate()?;
    let cache_key = feed.cache_key(CacheRole::Fetcher);
    let request = FetchRequest {
        application_uri: &feed.config.application_uri,
        scheme_uri: &feed.source,
        incremental: feed.config.incremental_fetch,
        max_leaf_concepts: feed.config.max_number_of_leaf_concepts,
        cache_key: &cache_key,
    };

    let mut graph = ResourceGraph::new();
    let traversal = fetch_vocabulary(loader, cache, &mut graph, &request)?;
    let artifact = write_artifact(&graph, artifact_dir).map_err(ImportError::Artifact)?;

    let message = format!(
        "Fetched {} new concept(s) from Skosmos.",
        traversal.fetched.len()
    );
    tracing::info!(
        feed = %feed.id,
        artifact = %artifact.display(),
        statements = graph.len(),
        "{message}"
    );
    Ok(FetchOutcome {
        artifact,
        scheme: traversal.scheme,
        fetched: traversal.fetched,
        budget_exhausted: traversal.budget_exhausted,
        message,
    })
}

fn write_artifact(graph: &ResourceGraph, dir: Option<&Path>) -> io::Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(ARTIFACT_PREFIX).suffix(".nt");
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    {
        let mut out = BufWriter::new(file.as_file());
        write_ntriples(graph, &mut out)?;
        out.flush()?;
    }
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

// ============================================================================
// Parse stage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub concepts: Vec<Concept>,
    pub message: String,
}

/// Extract the concepts of the artifact at `artifact`.
///
/// `uris_to_parse` is the fetch stage's `fetched` list; it is only read in
/// incremental mode.
pub fn parse_artifact<B: CacheBackend>(
    feed: &Feed,
    artifact: &Path,
    uris_to_parse: &[String],
    cache: &mut UriCache<B>,
) -> Result<ParseReport, ParseStageError> {
    check_artifact(artifact)?;
    let graph = ResourceGraph::from_ntriples_file(artifact)?;
    let resolved = find_concepts(&graph)?;
    let total = resolved.len();

    let incremental = feed.config.incremental_fetch;
    let cache_key = feed.cache_key(CacheRole::Parser);
    let extractor = ConceptExtractor::with_preferred_language(feed.config.preferred_language.clone());

    let mut concepts = Vec::new();
    for resource in resolved {
        let uri = resource.uri();
        if incremental {
            if !uris_to_parse.iter().any(|u| u == uri) {
                continue;
            }
            if cache.is_visited(uri, &cache_key) {
                tracing::debug!(uri, "concept already parsed");
                continue;
            }
            cache.mark_visited(uri, &cache_key);
        }
        let concept = extractor.build_concept(&resource);
        tracing::debug!(
            uri,
            label = concept.display_label(),
            "parsed SKOS concept"
        );
        concepts.push(concept);
    }

    let labels: Vec<&str> = concepts.iter().map(Concept::display_label).collect();
    let message = format!("Parsed {} concepts : {}", concepts.len(), labels.join(","));
    tracing::info!(feed = %feed.id, resolved = total, emitted = concepts.len(), "parse stage finished");
    Ok(ParseReport { concepts, message })
}

fn check_artifact(path: &Path) -> Result<(), ParseStageError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(EmptyGraphError::EmptyArtifact(path.to_path_buf()).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(EmptyGraphError::MissingArtifact(path.to_path_buf()).into())
        }
        Err(e) => Err(RdfError::Io(e).into()),
    }
}

// ============================================================================
// Import run
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub fetched: Vec<String>,
    pub imported: usize,
    pub budget_exhausted: bool,
    /// Fetch and parse stage messages, in order.
    pub messages: Vec<String>,
}

/// Fetch, parse and hand every extracted concept to `sink`.
///
/// A run with nothing to import (no ConceptScheme, empty artifact) succeeds
/// with an empty summary. The artifact is removed once parsed.
pub fn import_feed<S, B, K>(
    feed: &Feed,
    loader: &GraphLoader<S>,
    cache: &mut UriCache<B>,
    sink: &mut K,
) -> Result<ImportSummary, ImportError>
where
    S: RemoteSource,
    B: CacheBackend,
    K: ConceptSink + ?Sized,
{
    let fetch = fetch_feed(feed, loader, cache, None)?;
    let mut summary = ImportSummary {
        fetched: fetch.fetched,
        imported: 0,
        budget_exhausted: fetch.budget_exhausted,
        messages: vec![fetch.message],
    };

    let parsed = parse_artifact(feed, &fetch.artifact, &summary.fetched, cache);
    discard_artifact(&fetch.artifact);
    let report = match parsed {
        Ok(report) => report,
        Err(ParseStageError::Empty(e)) => {
            tracing::warn!(feed = %feed.id, error = %e, "nothing to import");
            summary.messages.push(e.to_string());
            return Ok(summary);
        }
        Err(e) => return Err(e.into()),
    };

    for concept in report.concepts {
        sink.accept(concept)?;
        summary.imported += 1;
    }
    summary.messages.push(report.message);
    Ok(summary)
}

/// Forget everything both stages remember about `feed`.
pub fn clear_feed<B: CacheBackend>(feed: &Feed, cache: &mut UriCache<B>) {
    for role in [CacheRole::Fetcher, CacheRole::Parser] {
        cache.forget(&feed.cache_key(role));
    }
    tracing::info!(feed = %feed.id, "cleared feed caches");
}

/// Delete an artifact once nothing reads it. Failure is logged, not returned.
pub fn discard_artifact(artifact: &Path) -> bool {
    match fs::remove_file(artifact) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(artifact = %artifact.display(), error = %e, "failed to remove RDF artifact");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::FeedConfig;
    use crate::loader::request_uri;
    use crate::source::MemorySource;
    use skosmos_rdf::vocab::skos;
    use tempfile::tempdir;

    const APP: &str = "http://skosmos.example.com/rest/v1/data";
    const SCHEME: &str = "http://data.example.com/vocabulary";
    const TOP: &str = "http://data.example.com/concepts/top";

    fn feed(incremental: bool) -> Feed {
        Feed::new(
            "7",
            SCHEME,
            FeedConfig {
                application_uri: APP.to_string(),
                incremental_fetch: incremental,
                max_number_of_leaf_concepts: 10,
                ..FeedConfig::default()
            },
        )
    }

    fn single_concept_source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert(
            request_uri(APP, SCHEME),
            format!(
                "<{SCHEME}> a <{}> ; <{}> <{TOP}> .",
                skos::CONCEPT_SCHEME,
                skos::HAS_TOP_CONCEPT
            ),
        );
        source.insert(
            request_uri(APP, TOP),
            format!(
                "<{TOP}> a <{}> ; <{}> <{SCHEME}> ; <{}> \"Top\"@en .",
                skos::CONCEPT,
                skos::TOP_CONCEPT_OF,
                skos::PREF_LABEL
            ),
        );
        source
    }

    #[test]
    fn fetch_writes_a_prefixed_ntriples_artifact() {
        let dir = tempdir().unwrap();
        let source = single_concept_source();
        let loader = GraphLoader::new(&source);
        let mut cache = UriCache::new(MemoryCache::new());

        let outcome = fetch_feed(&feed(false), &loader, &mut cache, Some(dir.path())).unwrap();

        assert_eq!(outcome.fetched, vec![TOP]);
        assert_eq!(outcome.message, "Fetched 1 new concept(s) from Skosmos.");
        let name = outcome.artifact.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(ARTIFACT_PREFIX), "{name}");
        let text = fs::read_to_string(&outcome.artifact).unwrap();
        assert!(text.contains(&format!("<{TOP}> <{}> \"Top\"@en .", skos::PREF_LABEL)));
    }

    #[test]
    fn invalid_feed_is_rejected_before_any_request() {
        let source = single_concept_source();
        let loader = GraphLoader::new(&source);
        let mut cache = UriCache::new(MemoryCache::new());
        let mut bad = feed(false);
        bad.config.application_uri = "not a uri".to_string();

        let err = fetch_feed(&bad, &loader, &mut cache, None).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
        assert!(source.requests().is_empty());
    }

    #[test]
    fn zero_length_artifact_is_an_empty_graph() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.nt");
        fs::write(&path, "").unwrap();
        let mut cache = UriCache::new(MemoryCache::new());

        let err = parse_artifact(&feed(false), &path, &[], &mut cache).unwrap_err();
        assert!(matches!(
            err,
            ParseStageError::Empty(EmptyGraphError::EmptyArtifact(_))
        ));
    }

    #[test]
    fn missing_artifact_is_an_empty_graph() {
        let dir = tempdir().unwrap();
        let mut cache = UriCache::new(MemoryCache::new());

        let err = parse_artifact(&feed(false), &dir.path().join("gone.nt"), &[], &mut cache)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseStageError::Empty(EmptyGraphError::MissingArtifact(_))
        ));
    }

    #[test]
    fn artifact_without_scheme_is_an_empty_graph() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noscheme.nt");
        fs::write(&path, format!("<{TOP}> <{}> \"Top\" .\n", skos::PREF_LABEL)).unwrap();
        let mut cache = UriCache::new(MemoryCache::new());

        let err = parse_artifact(&feed(false), &path, &[], &mut cache).unwrap_err();
        assert!(matches!(
            err,
            ParseStageError::Empty(EmptyGraphError::NoConceptScheme)
        ));
    }

    #[test]
    fn incremental_parse_emits_each_fetched_concept_once() {
        let dir = tempdir().unwrap();
        let source = single_concept_source();
        let loader = GraphLoader::new(&source);
        let mut cache = UriCache::new(MemoryCache::new());
        let feed = feed(true);

        let fetch = fetch_feed(&feed, &loader, &mut cache, Some(dir.path())).unwrap();
        let first = parse_artifact(&feed, &fetch.artifact, &fetch.fetched, &mut cache).unwrap();
        assert_eq!(first.concepts.len(), 1);
        assert_eq!(first.message, "Parsed 1 concepts : Top");

        let again = parse_artifact(&feed, &fetch.artifact, &fetch.fetched, &mut cache).unwrap();
        assert!(again.concepts.is_empty());
        assert_eq!(again.message, "Parsed 0 concepts : ");

        // Not fetched in this run, so not emitted.
        let mut fresh = UriCache::new(MemoryCache::new());
        let scoped = parse_artifact(&feed, &fetch.artifact, &[], &mut fresh).unwrap();
        assert!(scoped.concepts.is_empty());
    }

    #[test]
    fn import_collects_concepts_and_removes_the_artifact() {
        let source = single_concept_source();
        let loader = GraphLoader::new(&source);
        let mut cache = UriCache::new(MemoryCache::new());
        let mut sink: Vec<Concept> = Vec::new();

        let summary = import_feed(&feed(false), &loader, &mut cache, &mut sink).unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(sink[0].uri, TOP);
        assert_eq!(sink[0].pref_label.as_deref(), Some("Top"));
        assert_eq!(summary.messages.len(), 2);
    }

    #[test]
    fn import_without_scheme_is_a_soft_failure() {
        let mut source = MemorySource::new();
        source.insert(request_uri(APP, SCHEME), format!("<{SCHEME}> <{}> \"x\" .", skos::PREF_LABEL));
        let loader = GraphLoader::new(&source);
        let mut cache = UriCache::new(MemoryCache::new());
        let mut sink: Vec<Concept> = Vec::new();

        let summary = import_feed(&feed(false), &loader, &mut cache, &mut sink).unwrap();
        assert_eq!(summary.imported, 0);
        assert!(sink.is_empty());
        assert!(summary.messages[1].contains("ConceptScheme"));
    }

    #[test]
    fn import_propagates_fetch_failures() {
        let loader = GraphLoader::new(MemorySource::new());
        let mut cache = UriCache::new(MemoryCache::new());
        let mut sink: Vec<Concept> = Vec::new();

        let err = import_feed(&feed(false), &loader, &mut cache, &mut sink).unwrap_err();
        assert!(matches!(err, ImportError::Fetch(_)));
        assert!(!err.is_empty_feed());
    }

    #[test]
    fn clear_forgets_both_roles() {
        let feed = feed(true);
        let mut cache = UriCache::new(MemoryCache::new());
        cache.mark_visited(TOP, &feed.cache_key(CacheRole::Fetcher));
        cache.mark_visited(TOP, &feed.cache_key(CacheRole::Parser));
        cache.mark_visited(TOP, "other-feed");

        clear_feed(&feed, &mut cache);

        assert_eq!(cache.backend().keys().collect::<Vec<_>>(), vec!["other-feed_loaded_uris"]);
    }

    #[test]
    fn discarding_a_missing_artifact_only_warns() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("feeds_skosmos_api_fetcher_done.nt");
        fs::write(&artifact, b"").unwrap();

        assert!(discard_artifact(&artifact));
        assert!(!artifact.exists());
        assert!(!discard_artifact(&artifact));
    }
}
