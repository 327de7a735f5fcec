//! Tracks W3C VoID dataset descriptions and republishes versioned
//! snapshots of the datasets they describe into a content-addressed store.
//! See: https://www.w3.org/TR/void/
//!
//! A [`DatasetDescription`] owns the parsed graph of one VoID document and
//! exposes the datasets it describes as [`Dataset`] views. A [`Publisher`]
//! binds to one dataset id, watches its dcterms:modified timestamp across
//! re-fetches, and publishes a snapshot directory (the serialized
//! description plus every void:dataDump file) whenever a strictly newer
//! version appears, yielding one content identifier per snapshot.

pub mod cas;
pub mod consts;
pub mod dataset;
pub mod description;
pub mod errors;
pub mod fetch;
pub mod publisher;
pub mod telemetry;
pub mod triples;
pub mod util;

pub use cas::{CasClient, CasEntry, FsStore, IpfsClient};
pub use dataset::{Dataset, Value};
pub use description::DatasetDescription;
pub use fetch::{DocumentFetcher, FetchOptions, HttpFetcher};
pub use publisher::{PublishOptions, Publisher};
pub use telemetry::{Event, EventSink, LogSink};
