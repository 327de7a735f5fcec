// Error kinds for the fetch/describe/publish lifecycle.

use std::fmt;

/// Network or HTTP failure while retrieving a document.
#[derive(Debug)]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub reason: String,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "Failed to fetch {} (HTTP {}): {}", self.url, code, self.reason),
            None => write!(f, "Failed to fetch {}: {}", self.url, self.reason),
        }
    }
}

impl std::error::Error for FetchError {}

/// The fetched body was not the required serialization, or was malformed.
#[derive(Debug)]
pub struct ParseError {
    pub source_url: String,
    pub reason: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Failed to parse document from {}: {}", self.source_url, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// An attribute name outside the recognized vocabulary registry.
#[derive(Debug)]
pub struct UnsupportedAttribute {
    pub name: String,
}

impl fmt::Display for UnsupportedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unsupported dataset attribute: {}", self.name)
    }
}

impl std::error::Error for UnsupportedAttribute {}

/// More than one discovered dataset matched a single id.
#[derive(Debug)]
pub struct AmbiguousEntity {
    pub id: String,
    pub matches: usize,
}

impl fmt::Display for AmbiguousEntity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dataset id {} matches {} distinct subjects", self.id, self.matches)
    }
}

impl std::error::Error for AmbiguousEntity {}

/// A dataset id was no longer present after a re-fetch of its description.
#[derive(Debug)]
pub struct EntityVanished {
    pub id: String,
}

impl fmt::Display for EntityVanished {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dataset {} is not described by the document", self.id)
    }
}

impl std::error::Error for EntityVanished {}

/// A publish style outside the supported set.
#[derive(Debug)]
pub struct UnsupportedStyle {
    pub style: String,
}

impl fmt::Display for UnsupportedStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Publishing style {} not supported", self.style)
    }
}

impl std::error::Error for UnsupportedStyle {}

/// A data dump failed to download; the whole publish is aborted.
#[derive(Debug)]
pub struct DumpDownloadError {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for DumpDownloadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Failed to download dump {}: {}", self.url, self.reason)
    }
}

impl std::error::Error for DumpDownloadError {}
