//! Change detection and snapshot publishing for one dataset.
//!
//! A [`Publisher`] binds to a single dataset id within a description
//! document and walks a small lifecycle: it starts dirty (the first publish
//! is always attempted), `update` re-fetches the description and raises the
//! dirty flag when dcterms:modified moves strictly forward, and `publish`
//! assembles a snapshot directory, hands it to the CAS client, and clears
//! the flag only on full success. Any failure leaves the flag set so the
//! next scheduled attempt retries from scratch.

use crate::cas::CasClient;
use crate::consts::DESCRIPTION_FILE;
use crate::description::DatasetDescription;
use crate::errors::{DumpDownloadError, UnsupportedStyle};
use crate::telemetry::{Event, EventSink};
use crate::util::write_graph_to_file;
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for snapshot assembly.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Directory under which staging directories are created. Each publish
    /// owns exactly one staging directory under this root and removes it
    /// before returning, whether or not it succeeded.
    pub staging_root: PathBuf,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("."),
        }
    }
}

/// Tracks one dataset's versions and publishes snapshots of it.
pub struct Publisher {
    doc: DatasetDescription,
    dataset_id: String,
    cas: Box<dyn CasClient>,
    options: PublishOptions,
    sink: Box<dyn EventSink>,
    last_modified: DateTime<Utc>,
    needs_publish: bool,
    last_content_id: Option<String>,
}

impl Publisher {
    /// Binds a publisher to one dataset id within `doc`.
    ///
    /// Construction observes the dataset's current dcterms:modified value
    /// as the starting watermark and unconditionally requests a first
    /// publish.
    pub fn new(
        doc: DatasetDescription,
        dataset_id: &str,
        cas: Box<dyn CasClient>,
        options: PublishOptions,
        sink: Box<dyn EventSink>,
    ) -> Result<Self> {
        let last_modified = doc.expect_dataset(dataset_id)?.modified()?;
        sink.emit(Event::Watching {
            id: dataset_id.to_string(),
            modified: last_modified,
        });
        Ok(Self {
            doc,
            dataset_id: dataset_id.to_string(),
            cas,
            options,
            sink,
            last_modified,
            needs_publish: true,
            last_content_id: None,
        })
    }

    /// The watermark: the most recent dcterms:modified value observed.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Whether the next `publish` call will assemble a snapshot.
    pub fn needs_publish(&self) -> bool {
        self.needs_publish
    }

    /// The content identifier of the most recent successful publish.
    pub fn content_id(&self) -> Option<&str> {
        self.last_content_id.as_deref()
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn description(&self) -> &DatasetDescription {
        &self.doc
    }

    /// Re-fetches the description and checks the dataset for a new version.
    ///
    /// The watermark only ever moves forward: a dcterms:modified value at
    /// or below the stored one leaves the flag and the watermark untouched,
    /// even if other attributes of the dataset changed. Version detection
    /// is keyed solely on this timestamp; dump content that changes without
    /// a timestamp bump is never republished.
    pub fn update(&mut self) -> Result<()> {
        self.doc.refetch()?;
        let modified = self.doc.expect_dataset(&self.dataset_id)?.modified()?;
        if modified > self.last_modified {
            self.last_modified = modified;
            self.needs_publish = true;
            self.sink.emit(Event::Updated {
                id: self.dataset_id.clone(),
                modified,
            });
        } else {
            self.sink.emit(Event::Unchanged {
                id: self.dataset_id.clone(),
            });
        }
        Ok(())
    }

    /// Publishes a snapshot if one is needed; a no-op otherwise.
    ///
    /// Styles
    /// ======
    /// "folder" : the serialized description and the dump files go in a
    ///            common directory, stored as one unit.
    ///
    /// Anything else fails with [`UnsupportedStyle`] before any filesystem
    /// or network work.
    pub fn publish(&mut self, style: &str) -> Result<()> {
        if !self.needs_publish {
            return Ok(());
        }
        if style != "folder" {
            return Err(anyhow!(UnsupportedStyle {
                style: style.to_string(),
            }));
        }
        let name = snapshot_name(&self.dataset_id, self.last_modified);
        let content_id = self.assemble_and_store(&name)?;
        self.sink.emit(Event::SnapshotStored {
            id: self.dataset_id.clone(),
            snapshot: name,
            content_id: content_id.clone(),
        });
        self.last_content_id = Some(content_id);
        self.needs_publish = false;
        Ok(())
    }

    fn assemble_and_store(&self, name: &str) -> Result<String> {
        let dumps = self.doc.expect_dataset(&self.dataset_id)?.data_dumps()?;
        let staging = StagingDir::create(&self.options.staging_root, name)?;

        // The whole fetched graph goes into the snapshot, not only this
        // dataset's triples. Downstream consumers read the full document.
        write_graph_to_file(self.doc.graph(), &staging.path().join(DESCRIPTION_FILE))?;

        for (i, dump) in dumps.iter().enumerate() {
            let bytes = self
                .doc
                .fetcher()
                .fetch(dump)
                .map_err(|e| DumpDownloadError {
                    url: dump.clone(),
                    reason: e.to_string(),
                })?;
            let target = staging.path().join(dump_filename(staging.path(), dump, i));
            fs::write(&target, bytes)
                .with_context(|| format!("failed to write dump to {}", target.display()))?;
        }

        let entries = self.cas.add(staging.path(), false)?;
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| anyhow!("store returned no entry for snapshot {}", name))?;
        debug!("Snapshot {} stored as {}", name, entry.content_id);
        Ok(entry.content_id.clone())
        // staging dropped here: removed on success and on every error path
    }
}

/// Deterministic staging-directory name for (dataset id, version).
///
/// Colliding names across runs are intentional: the same version of the
/// same dataset always stages under the same name.
fn snapshot_name(id: &str, modified: DateTime<Utc>) -> String {
    let sanitized = id.replace(':', "+").replace('/', "_");
    format!("{}-{}", sanitized, modified.format("%Y-%m-%dT%H-%M-%S"))
}

/// File name for a downloaded dump, taken from the last URI path segment.
fn dump_filename(staging: &Path, dump: &str, index: usize) -> String {
    let name = url::Url::parse(dump)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.rev().find(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("dump-{}", index));
    // keep dumps from shadowing the description or each other
    if name == DESCRIPTION_FILE || staging.join(&name).exists() {
        format!("{}-{}", index, name)
    } else {
        name
    }
}

/// Exclusively-owned staging directory, removed on drop so every exit path
/// of a publish leaves local storage clean.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create(root: &Path, name: &str) -> Result<Self> {
        let path = root.join(name);
        if path.exists() {
            // leftover from an interrupted run; this publish takes ownership
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to remove staging directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_name_is_deterministic() {
        let modified = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let a = snapshot_name("http://example.org/id/data/50k-gazetteer", modified);
        let b = snapshot_name("http://example.org/id/data/50k-gazetteer", modified);
        assert_eq!(a, b);
        assert_eq!(
            a,
            "http+__example.org_id_data_50k-gazetteer-2020-01-01T00-00-00"
        );
    }

    #[test]
    fn test_snapshot_name_varies_with_version() {
        let t1 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        assert_ne!(snapshot_name("http://e/d", t1), snapshot_name("http://e/d", t2));
    }

    #[test]
    fn test_dump_filename_from_uri() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            dump_filename(dir.path(), "http://example.org/dumps/gazetteer.nt?v=2", 0),
            "gazetteer.nt"
        );
        // trailing slash falls back to the previous segment
        assert_eq!(
            dump_filename(dir.path(), "http://example.org/dumps/", 0),
            "dumps"
        );
        // a dump must not shadow the description file
        assert_eq!(
            dump_filename(dir.path(), "http://example.org/void.ttl", 3),
            "3-void.ttl"
        );
    }

    #[test]
    fn test_dump_filename_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dump.nt"), "taken").unwrap();
        assert_eq!(
            dump_filename(dir.path(), "http://example.org/a/dump.nt", 1),
            "1-dump.nt"
        );
    }

    #[test]
    fn test_staging_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let staging = StagingDir::create(root.path(), "snap").unwrap();
            assert!(staging.path().is_dir());
            staging.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_staging_dir_takes_over_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let leftover = root.path().join("snap");
        std::fs::create_dir_all(&leftover).unwrap();
        std::fs::write(leftover.join("stale"), "old").unwrap();
        let staging = StagingDir::create(root.path(), "snap").unwrap();
        assert!(!staging.path().join("stale").exists());
    }
}
