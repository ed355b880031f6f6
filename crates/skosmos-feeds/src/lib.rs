//! Incremental import of SKOS vocabularies from a Skosmos terminology service.
//!
//! An import run has two stages:
//!
//! 1. **Fetch** ([`fetch_feed`]): walk the concept scheme one REST request at
//!    a time ([`fetch_vocabulary`]), bounded by a leaf budget and a persisted
//!    visited-URI cache, and write the accumulated graph to an N-Triples
//!    artifact.
//! 2. **Parse** ([`parse_artifact`]): reload the artifact, resolve the
//!    scheme's concepts ([`find_concepts`]) and extract [`Concept`] records.
//!
//! [`import_feed`] chains both and hands the records to a [`ConceptSink`].
//!
//! Runs are single-threaded and blocking. Two runs sharing a cache key must
//! not overlap.

pub mod cache;
pub mod concept;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod resolver;
pub mod sink;
pub mod source;
pub mod traversal;

pub use cache::{CacheBackend, FileCache, MemoryCache, UriCache};
pub use concept::{mapping_sources, Concept, ConceptExtractor, MappingSource};
pub use config::{CacheRole, Feed, FeedConfig};
pub use error::{
    CacheError, ConfigError, EmptyGraphError, FetchError, ImportError, ParseStageError, SinkError,
};
pub use loader::{request_uri, GraphLoader};
pub use pipeline::{
    clear_feed, discard_artifact, fetch_feed, import_feed, parse_artifact, FetchOutcome,
    ImportSummary, ParseReport,
};
pub use resolver::find_concepts;
pub use sink::ConceptSink;
pub use source::{HttpSource, MemorySource, RemoteSource, TransportError};
pub use traversal::{fetch_vocabulary, FetchRequest, TraversalOutcome};
