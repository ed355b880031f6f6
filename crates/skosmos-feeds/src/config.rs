//! Feed configuration.
//!
//! A [`Feed`] is one importable vocabulary: a stable id, the ConceptScheme
//! URI it imports (`source`) and the options of its fetch and parse stages.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("skosmos-feeds/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base URI of the terminology service data endpoint, e.g.
    /// `http://skosmos.example.com/rest/v1/data`.
    pub application_uri: String,
    /// Only fetch vocabulary growth since the previous run.
    pub incremental_fetch: bool,
    /// Leaf budget of an incremental run. Ignored otherwise.
    pub max_number_of_leaf_concepts: usize,
    /// Preferred language tag for single-valued labels and notes.
    pub preferred_language: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            application_uri: String::new(),
            incremental_fetch: false,
            max_number_of_leaf_concepts: 0,
            preferred_language: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl FeedConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The leaf budget in force, `None` when unbounded.
    pub fn leaf_budget(&self) -> Option<usize> {
        self.incremental_fetch
            .then_some(self.max_number_of_leaf_concepts)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which stage a visited-URI set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRole {
    Fetcher,
    Parser,
}

impl CacheRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheRole::Fetcher => "fetcher",
            CacheRole::Parser => "parser",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    /// URI of the ConceptScheme to import.
    pub source: String,
    #[serde(default)]
    pub config: FeedConfig,
}

impl Feed {
    pub fn new(id: impl Into<String>, source: impl Into<String>, config: FeedConfig) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            config,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("source", &self.source)?;
        check_http_url("application_uri", &self.config.application_uri)?;
        Ok(())
    }

    /// `{feed id}:{role}:{sha256 of the source URI}`.
    pub fn cache_key(&self, role: CacheRole) -> String {
        let digest = Sha256::digest(self.source.as_bytes());
        format!("{}:{}:{:x}", self.id, role.as_str(), digest)
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUri {
        field,
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!(
            "unsupported scheme `{other}` (supported: http, https)"
        ))),
    }
}
