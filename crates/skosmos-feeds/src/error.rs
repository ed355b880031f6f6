use std::path::PathBuf;

/// A remote load failed. Never retried; aborts the whole traversal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(
        "Http error while loading data from \"{application_uri}\" for resource : \"{resource}\" with message: \"{message}\""
    )]
    Http {
        application_uri: String,
        resource: String,
        message: String,
    },
    #[error(
        "Unknown error while loading data from \"{application_uri}\" for resource : \"{resource}\" with message: \"{message}\""
    )]
    Parse {
        application_uri: String,
        resource: String,
        message: String,
    },
}

impl FetchError {
    pub fn resource(&self) -> &str {
        match self {
            FetchError::Http { resource, .. } | FetchError::Parse { resource, .. } => resource,
        }
    }
}

/// Nothing can be imported from an artifact. Reported as an empty run, not
/// as a crash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmptyGraphError {
    #[error("RDF artifact \"{}\" does not exist", .0.display())]
    MissingArtifact(PathBuf),
    #[error("RDF artifact \"{}\" is empty", .0.display())]
    EmptyArtifact(PathBuf),
    #[error("Unable to find ConceptScheme in generated skos file")]
    NoConceptScheme,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseStageError {
    #[error(transparent)]
    Empty(#[from] EmptyGraphError),
    #[error("failed to read RDF artifact: {0}")]
    Rdf(#[from] skosmos_rdf::RdfError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidUri {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read feed config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid feed config {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt cache file: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("concept sink rejected {uri}: {message}")]
pub struct SinkError {
    pub uri: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseStageError),
    #[error("failed to write RDF artifact: {0}")]
    Artifact(#[source] std::io::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl ImportError {
    /// Soft failures: the run produced nothing to import.
    pub fn is_empty_feed(&self) -> bool {
        matches!(self, ImportError::Parse(ParseStageError::Empty(_)))
    }
}
