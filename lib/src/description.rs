//! Ownership and discovery for one fetched VoID description document.

use crate::consts::{DATASET, TYPE, WELL_KNOWN_VOID};
use crate::dataset::Dataset;
use crate::errors::{AmbiguousEntity, EntityVanished};
use crate::fetch::DocumentFetcher;
use crate::util::parse_turtle;
use anyhow::{anyhow, Result};
use log::debug;
use oxigraph::model::{Graph, NamedNode, NamedOrBlankNodeRef};
use std::cell::OnceCell;
use std::sync::Arc;

/// A parsed VoID description document.
///
/// Owns the graph produced by exactly one fetch of one URI, plus the fetch
/// parameters needed to retrieve it again. [`refetch`](Self::refetch)
/// replaces the graph wholesale and drops the discovered-dataset cache;
/// [`Dataset`] views borrow the document, so no stale view can survive a
/// re-fetch.
pub struct DatasetDescription {
    graph: Graph,
    uri: String,
    well_known: bool,
    fetcher: Arc<dyn DocumentFetcher>,
    subjects: OnceCell<Vec<NamedNode>>,
}

impl std::fmt::Debug for DatasetDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetDescription")
            .field("uri", &self.uri)
            .field("well_known", &self.well_known)
            .finish_non_exhaustive()
    }
}

impl DatasetDescription {
    /// Fetches and parses a description document.
    ///
    /// With `well_known` set, the IANA well-known suffix is appended to the
    /// base URI; otherwise `uri` must point directly at the document.
    pub fn fetch(uri: &str, well_known: bool, fetcher: Arc<dyn DocumentFetcher>) -> Result<Self> {
        let mut desc = Self {
            graph: Graph::new(),
            uri: uri.to_string(),
            well_known,
            fetcher,
            subjects: OnceCell::new(),
        };
        desc.refetch()?;
        Ok(desc)
    }

    /// The URI of the document itself, after applying the well-known rule.
    pub fn document_url(&self) -> String {
        if self.well_known {
            if self.uri.ends_with('/') {
                format!("{}{}", self.uri, WELL_KNOWN_VOID)
            } else {
                format!("{}/{}", self.uri, WELL_KNOWN_VOID)
            }
        } else {
            self.uri.clone()
        }
    }

    /// Re-fetches and re-parses the source document, replacing the graph
    /// and discarding any previously discovered datasets.
    pub fn refetch(&mut self) -> Result<()> {
        let url = self.document_url();
        let bytes = self.fetcher.fetch(&url)?;
        self.graph = parse_turtle(&bytes, &url)?;
        self.subjects.take();
        debug!("Parsed {} triples from {}", self.graph.len(), url);
        Ok(())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn well_known(&self) -> bool {
        self.well_known
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn fetcher(&self) -> &dyn DocumentFetcher {
        self.fetcher.as_ref()
    }

    fn discovered(&self) -> &[NamedNode] {
        self.subjects.get_or_init(|| {
            let mut subjects: Vec<NamedNode> = self
                .graph
                .subjects_for_predicate_object(TYPE, DATASET)
                .filter_map(|s| match s {
                    NamedOrBlankNodeRef::NamedNode(n) => Some(n.into_owned()),
                    // blank-node datasets have no id stable across fetches
                    NamedOrBlankNodeRef::BlankNode(_) => None,
                })
                .collect();
            subjects.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
            subjects
        })
    }

    /// Every dataset described by this document, in stable (sorted) order.
    ///
    /// Discovery runs lazily on first call and is cached until the next
    /// re-fetch.
    pub fn datasets(&self) -> Vec<Dataset<'_>> {
        self.discovered()
            .iter()
            .map(|s| Dataset::new(s.clone(), self))
            .collect()
    }

    /// The dataset with the given id, or `None` if this document does not
    /// describe it. Subjects are unique within a graph, so more than one
    /// match means the discovery list itself is inconsistent.
    pub fn dataset(&self, id: &str) -> Result<Option<Dataset<'_>>> {
        let id = id.trim();
        let matches: Vec<&NamedNode> = self
            .discovered()
            .iter()
            .filter(|s| s.as_str() == id)
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(Dataset::new(matches[0].clone(), self))),
            n => Err(anyhow!(AmbiguousEntity {
                id: id.to_string(),
                matches: n,
            })),
        }
    }

    /// Like [`dataset`](Self::dataset), but absence is an error. Used by
    /// callers that bound themselves to an id in an earlier fetch.
    pub fn expect_dataset(&self, id: &str) -> Result<Dataset<'_>> {
        self.dataset(id)?.ok_or_else(|| {
            anyhow!(EntityVanished {
                id: id.to_string()
            })
        })
    }
}
