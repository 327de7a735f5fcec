//! Content-addressed storage clients.
//!
//! The publisher hands each assembled snapshot directory to a [`CasClient`]
//! as a single logical unit. Two implementations are provided: the IPFS
//! HTTP API for networked publishing, and a blake3-keyed local store for
//! offline use. Content identifiers are opaque to the rest of the system.

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One per-entry result of a store add. `name` is the entry's name as
/// submitted — the bare directory name for the directory itself, or
/// `dir/file` for its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasEntry {
    pub name: String,
    pub content_id: String,
}

/// A content-addressed store.
///
/// `add` ingests a local directory and returns one entry per file plus one
/// for the directory itself. Snapshot directories are flat, so only
/// non-recursive adds are exercised by the publisher.
pub trait CasClient {
    fn add(&self, path: &Path, recursive: bool) -> Result<Vec<CasEntry>>;
}

/// Client for the IPFS HTTP API (`/api/v0/add`).
pub struct IpfsClient {
    api_base: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    /// `api_base` is the HTTP API root, e.g. `http://127.0.0.1:5001`.
    pub fn new(api_base: &str) -> Result<Self> {
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::builder().build()?,
        })
    }
}

impl CasClient for IpfsClient {
    fn add(&self, path: &Path, recursive: bool) -> Result<Vec<CasEntry>> {
        use reqwest::blocking::multipart::{Form, Part};

        if recursive {
            return Err(anyhow!("recursive add is not supported"));
        }
        let dir = dir_name(path)?;
        let mut form = Form::new().part(
            "file",
            Part::bytes(Vec::new())
                .file_name(dir.clone())
                .mime_str("application/x-directory")?,
        );
        for file in sorted_files(path)? {
            let file_name = dir_name(&file)?;
            let data = fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            form = form.part(
                "file",
                Part::bytes(data)
                    .file_name(format!("{}/{}", dir, file_name))
                    .mime_str("application/octet-stream")?,
            );
        }
        let url = format!("{}/api/v0/add", self.api_base);
        debug!("Adding {} via {}", path.display(), url);
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .with_context(|| format!("add request to {} failed", url))?
            .error_for_status()?;
        // the API streams one JSON object per added entry
        let body = resp.text()?;
        let mut entries = Vec::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let r: AddResponse = serde_json::from_str(line)
                .with_context(|| format!("unexpected add response line: {}", line))?;
            entries.push(CasEntry {
                name: r.name,
                content_id: r.hash,
            });
        }
        Ok(entries)
    }
}

/// A local blake3-keyed store with the same add contract as the IPFS
/// client.
///
/// Content identifiers are deterministic in file names and bytes: each
/// file's id is the hash of its bytes, and the directory's id is the hash
/// of its sorted `id name` manifest.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join("objects"))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn store_object(&self, id: &str, bytes: &[u8]) -> Result<()> {
        let target = self.root.join("objects").join(id);
        if !target.exists() {
            fs::write(&target, bytes)
                .with_context(|| format!("failed to store object {}", id))?;
        }
        Ok(())
    }
}

impl CasClient for FsStore {
    fn add(&self, path: &Path, recursive: bool) -> Result<Vec<CasEntry>> {
        if recursive {
            return Err(anyhow!("recursive add is not supported"));
        }
        let dir = dir_name(path)?;
        let mut entries = Vec::new();
        let mut manifest = String::new();
        for file in sorted_files(path)? {
            let file_name = dir_name(&file)?;
            let bytes = fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let id = blake3::hash(&bytes).to_hex().to_string();
            self.store_object(&id, &bytes)?;
            manifest.push_str(&format!("{} {}\n", id, file_name));
            entries.push(CasEntry {
                name: format!("{}/{}", dir, file_name),
                content_id: id,
            });
        }
        let dir_id = blake3::hash(manifest.as_bytes()).to_hex().to_string();
        self.store_object(&dir_id, manifest.as_bytes())?;
        entries.push(CasEntry {
            name: dir,
            content_id: dir_id,
        });
        Ok(entries)
    }
}

fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("path {} has no final component", path.display()))
}

/// Direct children of `path`, files only, in name order so ids and request
/// bodies are deterministic. Snapshots are flat; a subdirectory means the
/// staging area was tampered with.
fn sorted_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        } else {
            return Err(anyhow!(
                "unexpected subdirectory {} in snapshot",
                entry.path().display()
            ));
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("snap");
        fs::create_dir_all(&path).unwrap();
        for (name, content) in files {
            fs::write(path.join(name), content).unwrap();
        }
        path
    }

    #[test]
    fn test_fs_store_ids_are_deterministic() {
        let dir1 = tempfile::tempdir().unwrap();
        let dir2 = tempfile::tempdir().unwrap();
        let store1 = FsStore::open(&dir1.path().join("store")).unwrap();
        let store2 = FsStore::open(&dir2.path().join("store")).unwrap();
        let snap1 = snapshot(dir1.path(), &[("void.ttl", "a"), ("dump.nt", "b")]);
        let snap2 = snapshot(dir2.path(), &[("void.ttl", "a"), ("dump.nt", "b")]);

        let id1 = store1.add(&snap1, false).unwrap();
        let id2 = store2.add(&snap2, false).unwrap();
        assert_eq!(id1, id2);
        // last entry is the directory itself, named without a prefix
        assert_eq!(id1.last().unwrap().name, "snap");
    }

    #[test]
    fn test_fs_store_id_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(&dir.path().join("store")).unwrap();
        let snap = snapshot(dir.path(), &[("void.ttl", "a")]);
        let first = store.add(&snap, false).unwrap().pop().unwrap();
        fs::write(snap.join("void.ttl"), "changed").unwrap();
        let second = store.add(&snap, false).unwrap().pop().unwrap();
        assert_ne!(first.content_id, second.content_id);
    }

    #[test]
    fn test_recursive_add_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(&dir.path().join("store")).unwrap();
        let snap = snapshot(dir.path(), &[("void.ttl", "a")]);
        assert!(store.add(&snap, true).is_err());
    }
}
