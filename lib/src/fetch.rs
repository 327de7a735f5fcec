//! Facilities for retrieving remote documents: the VoID description itself
//! and the data dumps it points at.
//!
//! Retrieval is deliberately strict. The description is requested with a
//! single `Accept` media type and the parser accepts exactly that
//! serialization; a server that answers with anything else produces a parse
//! error rather than a silently degraded graph.

use crate::errors::FetchError;
use anyhow::{anyhow, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Options that control how remote documents are fetched.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Network timeout applied to individual HTTP requests.
    pub timeout: Duration,
    /// Media type demanded from the server.
    pub accept: &'static str,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept: "text/turtle",
        }
    }
}

/// Retrieves raw bytes for a URI.
///
/// Both the description document and the dump downloads go through this
/// seam, so embedders and tests can substitute their own transport.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher with a fixed `Accept` header.
pub struct HttpFetcher {
    client: Client,
    accept: &'static str,
}

impl HttpFetcher {
    pub fn new(opts: FetchOptions) -> Result<Self> {
        let client = Client::builder().timeout(opts.timeout).build()?;
        Ok(Self {
            client,
            accept: opts.accept,
        })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, self.accept)
            .send()
            .map_err(|e| FetchError {
                url: url.to_string(),
                status: None,
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!(FetchError {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: "server returned a non-success status".to_string(),
            }));
        }
        let bytes = resp.bytes().map_err(|e| FetchError {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
