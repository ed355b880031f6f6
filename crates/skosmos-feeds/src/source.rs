//! Transports the loader reads resource descriptions through.

use crate::config::FeedConfig;
use crate::loader::request_uri;
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT};
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

/// Transport or status failure of one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A blocking GET of the Turtle description of `resource_uri` from the data
/// endpoint at `application_uri`.
pub trait RemoteSource {
    fn get(&self, application_uri: &str, resource_uri: &str) -> Result<String, TransportError>;
}

impl<S: RemoteSource + ?Sized> RemoteSource for &S {
    fn get(&self, application_uri: &str, resource_uri: &str) -> Result<String, TransportError> {
        (**self).get(application_uri, resource_uri)
    }
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &FeedConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// The endpoint URL with `uri` and `format` appended as percent-encoded query
/// pairs. Hash URIs keep their fragment inside the `uri` value.
fn data_url(application_uri: &str, resource_uri: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(application_uri)
        .map_err(|e| TransportError(format!("invalid application URI: {e}")))?;
    url.query_pairs_mut()
        .append_pair("uri", resource_uri)
        .append_pair("format", "text/turtle");
    Ok(url)
}

impl RemoteSource for HttpSource {
    fn get(&self, application_uri: &str, resource_uri: &str) -> Result<String, TransportError> {
        let url = data_url(application_uri, resource_uri)?;
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("text/turtle"))
            .send()
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let body = body.trim();
            return Err(TransportError(if body.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", truncate(body, 200))
            }));
        }
        resp.text().map_err(|e| TransportError(e.to_string()))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Serves canned bodies keyed by [`request_uri`] and records every request
/// under that key. Unknown URIs answer like a 404.
#[derive(Debug, Default)]
pub struct MemorySource {
    bodies: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, request_uri: impl Into<String>, body: impl Into<String>) {
        self.bodies.insert(request_uri.into(), body.into());
    }

    /// Request URIs in the order they were issued.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl RemoteSource for MemorySource {
    fn get(&self, application_uri: &str, resource_uri: &str) -> Result<String, TransportError> {
        let key = request_uri(application_uri, resource_uri);
        let body = self.bodies.get(&key).cloned();
        self.requests.borrow_mut().push(key);
        body.ok_or_else(|| TransportError("HTTP 404 Not Found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers exactly one request with `status_line` and `body`, returning
    /// the raw request head.
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).expect("read request");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "{status_line}\r\nContent-Type: text/turtle\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn loopback_source() -> HttpSource {
        let client = Client::builder()
            .no_proxy()
            .build()
            .expect("build http client");
        HttpSource::with_client(client)
    }

    #[test]
    fn http_source_requests_turtle_and_returns_body() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", "<http://a> <http://b> <http://c> .");
        let source = loopback_source();

        let body = source
            .get(&format!("{base}/rest/v1/data"), "http://data.example.com/c1")
            .unwrap();
        assert_eq!(body, "<http://a> <http://b> <http://c> .");

        let request = server.join().unwrap();
        assert!(request.starts_with(
            "GET /rest/v1/data?uri=http%3A%2F%2Fdata.example.com%2Fc1&format=text%2Fturtle "
        ), "{request}");
        assert!(request.to_lowercase().contains("accept: text/turtle"));
    }

    #[test]
    fn hash_uris_reach_the_server_whole() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", "");
        let source = loopback_source();

        source
            .get(&format!("{base}/rest/v1/data"), "http://data.example.com/vocab#c1")
            .unwrap();

        let request = server.join().unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert_eq!(
            request_line,
            "GET /rest/v1/data?uri=http%3A%2F%2Fdata.example.com%2Fvocab%23c1&format=text%2Fturtle HTTP/1.1"
        );
    }

    #[test]
    fn http_source_reports_non_success_status() {
        let (base, server) = serve_once("HTTP/1.1 404 Not Found", "no such concept");
        let source = loopback_source();

        let err = source
            .get(&format!("{base}/rest/v1/data"), "http://data.example.com/gone")
            .unwrap_err();
        server.join().unwrap();
        assert!(err.0.contains("404"), "{err}");
        assert!(err.0.contains("no such concept"), "{err}");
    }

    #[test]
    fn http_source_builds_from_feed_config() {
        assert!(HttpSource::new(&FeedConfig::default()).is_ok());
    }

    #[test]
    fn relative_application_uri_is_a_transport_error() {
        let err = data_url("rest/v1/data", "http://data.example.com/c1").unwrap_err();
        assert!(err.0.contains("invalid application URI"), "{err}");
    }

    #[test]
    fn memory_source_records_requests() {
        let mut source = MemorySource::new();
        source.insert(request_uri("http://x", "a"), "body");
        assert_eq!(source.get("http://x", "a").unwrap(), "body");
        assert!(source.get("http://x", "b#c").is_err());
        assert_eq!(
            source.requests(),
            vec![
                "http://x?uri=a&format=text/turtle",
                "http://x?uri=b#c&format=text/turtle"
            ]
        );
    }
}
