//! Remote graph loader: one resource description per request.

use crate::error::FetchError;
use crate::source::RemoteSource;
use skosmos_rdf::{RdfFormat, ResourceGraph};

/// `{application_uri}?uri={resource_uri}&format=text/turtle`, unencoded.
///
/// This is the logical name of a request, used as the [`MemorySource`] key.
/// [`HttpSource`] percent-encodes the query when it sends it.
///
/// [`MemorySource`]: crate::source::MemorySource
/// [`HttpSource`]: crate::source::HttpSource
pub fn request_uri(application_uri: &str, resource_uri: &str) -> String {
    format!("{application_uri}?uri={resource_uri}&format=text/turtle")
}

pub struct GraphLoader<S> {
    source: S,
}

impl<S: RemoteSource> GraphLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the description of `resource_uri` and merge it into `graph`.
    ///
    /// The merge is additive. On failure the graph is left as it was.
    pub fn load(
        &self,
        graph: &mut ResourceGraph,
        application_uri: &str,
        resource_uri: &str,
    ) -> Result<(), FetchError> {
        let body = self.source.get(application_uri, resource_uri).map_err(|e| FetchError::Http {
            application_uri: application_uri.to_string(),
            resource: resource_uri.to_string(),
            message: e.to_string(),
        })?;
        let added = graph
            .merge_document(body.as_bytes(), RdfFormat::Turtle)
            .map_err(|e| FetchError::Parse {
                application_uri: application_uri.to_string(),
                resource: resource_uri.to_string(),
                message: e.to_string(),
            })?;
        tracing::trace!(resource = resource_uri, added, "loaded resource");
        Ok(())
    }
}
