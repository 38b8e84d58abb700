//! The per-pass JSON context: one fetch, one narrowing, shared by every
//! `json.*`/`api.*` placeholder in a render pass.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use crate::error::{RenderError, Result};
use crate::path::Path;
use crate::value::Value;

/// Where a pass's JSON document comes from.
///
/// Parsed from `"<url>"` or `"<url> | <narrow path>"`, e.g.
/// `https://example.com/stories.json | stories[RANDOM]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSource {
    /// The document URL.
    pub url: Url,
    /// Optional path selecting the sub-root used for lookups.
    pub narrow_path: Option<Path>,
}

impl JsonSource {
    /// A source without a narrowing path.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            narrow_path: None,
        }
    }

    /// Sets the narrowing path.
    pub fn narrow(mut self, path: Path) -> Self {
        self.narrow_path = Some(path);
        self
    }
}

impl FromStr for JsonSource {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let (url, narrow) = match value.split_once('|') {
            Some((url, path)) => (url.trim(), Some(path.trim())),
            None => (value.trim(), None),
        };

        if url.is_empty() {
            return Err("JSON source URL cannot be empty".to_string());
        }
        let url = Url::parse(url).map_err(|e| format!("invalid JSON source URL '{url}': {e}"))?;

        let narrow_path = match narrow {
            Some(path) if !path.is_empty() => Some(Path::parse(path).map_err(|e| e.to_string())?),
            _ => None,
        };

        Ok(Self { url, narrow_path })
    }
}

impl fmt::Display for JsonSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.narrow_path {
            Some(path) => write!(f, "{} | {}", self.url, path),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Errors produced by a [`JsonFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The body was not valid JSON.
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other failure reported by a custom fetcher.
    #[error("{0}")]
    Other(String),
}

/// The capability used to retrieve a pass's JSON document.
///
/// The default implementation is [`HttpFetcher`]; callers can substitute
/// their own (e.g. a file-backed or pre-fetched source).
pub trait JsonFetcher {
    /// Fetches and decodes the document at `url`.
    fn fetch(
        &self,
        url: &Url,
    ) -> impl Future<Output = std::result::Result<serde_json::Value, FetchError>> + Send;
}

/// Fetches JSON documents with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher with its own client and the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(Client::new(), timeout)
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl JsonFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &Url,
    ) -> impl Future<Output = std::result::Result<serde_json::Value, FetchError>> + Send {
        let request = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout);

        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }
    }
}

/// The loaded JSON document for one render pass.
///
/// The narrowing path (including any `[RANDOM]` choice) is evaluated once
/// when the context is built; every lookup in the pass then sees the same
/// narrowed root.
#[derive(Debug, Clone)]
pub struct JsonContext {
    source_url: Url,
    raw_root: Value,
    narrowed_root: Value,
}

impl JsonContext {
    /// Fetches `source` and applies its narrowing path.
    ///
    /// ## Errors
    ///
    /// - `ContextFetchError` if the fetch fails, the status is not 2xx, or
    ///   the body is not JSON
    /// - any path error produced by the narrowing path
    #[instrument(skip(fetcher, rng), fields(url = %source.url))]
    pub async fn load<F, R>(source: &JsonSource, fetcher: &F, rng: &mut R) -> Result<Self>
    where
        F: JsonFetcher,
        R: Rng + ?Sized,
    {
        let raw = fetcher
            .fetch(&source.url)
            .await
            .map_err(|e| RenderError::ContextFetchError {
                url: source.url.to_string(),
                message: e.to_string(),
            })?;
        info!("fetched JSON context");
        Self::from_json(source, raw, rng)
    }

    /// Builds a context from an already-decoded document.
    pub fn from_json<R: Rng + ?Sized>(
        source: &JsonSource,
        raw: serde_json::Value,
        rng: &mut R,
    ) -> Result<Self> {
        let raw_root = Value::from(raw);
        let narrowed_root = match &source.narrow_path {
            Some(path) => {
                let narrowed = path.evaluate(&raw_root, rng)?;
                info!(narrow_path = %path, found = narrowed.kind(), "narrowed JSON context");
                narrowed
            }
            None => raw_root.clone(),
        };

        Ok(Self {
            source_url: source.url.clone(),
            raw_root,
            narrowed_root,
        })
    }

    /// The root used for `json.*`/`api.*` lookups.
    pub fn root(&self) -> &Value {
        &self.narrowed_root
    }

    /// The document as fetched, before narrowing.
    pub fn raw_root(&self) -> &Value {
        &self.raw_root
    }

    /// The URL the document was fetched from.
    pub fn source_url(&self) -> &Url {
        &self.source_url
    }
}
