//! Filesystem-backed object index shared by both store flavors
//!
//! Layout on disk:
//! ```text
//! <root>/
//!   <namespace>/
//!     <name>            (name may contain `/`, forming nested directories)
//! ```
//!
//! The in-memory index maps each [`ObjectId`] to its [`ObjectRecord`]. It is
//! a cache of what was written through this instance and is never loaded from
//! disk implicitly; [`FsIndex::rebuild`] is the only way to repopulate it.

use crate::model::{ObjectId, ObjectRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Root directory plus the index of objects stored beneath it
pub(crate) struct FsIndex {
    root: PathBuf,
    /// Held for writing across file mutation and index update
    index: RwLock<BTreeMap<ObjectId, ObjectRecord>>,
}

impl FsIndex {
    /// Create the root directory if needed and start with an empty index
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        // Records carry absolute paths
        let root = fs::canonicalize(root)?;
        debug!(root = %root.display(), "opened store root");

        Ok(FsIndex {
            root,
            index: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` for `id`, replacing any previous file and record
    pub fn put(
        &self,
        id: ObjectId,
        data: &[u8],
        content_type: Option<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<ObjectRecord> {
        let path = id.path_under(&self.root);

        let mut index = self.index.write();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        let size = fs::metadata(&path)?.len();

        let record = ObjectRecord::new(id.clone(), path, size)
            .with_content_type(content_type)
            .with_metadata(metadata);
        debug!(object = %id, size, "stored object");
        index.insert(id, record.clone());

        Ok(record)
    }

    /// Read the current bytes of `id` from disk
    pub fn read(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let index = self.index.read();
        let record = index
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let data = fs::read(&record.path)?;
        debug!(object = %id, size = data.len(), "read object");
        Ok(data)
    }

    /// Copy the bytes of `id` to `destination`, creating its parent directory
    pub fn copy_to(&self, id: &ObjectId, destination: &Path) -> Result<u64> {
        let index = self.index.read();
        let record = index
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let copied = fs::copy(&record.path, destination)?;
        debug!(object = %id, destination = %destination.display(), "copied object out");
        Ok(copied)
    }

    /// Remove `id` from disk and from the index. Returns whether it existed.
    pub fn remove(&self, id: &ObjectId) -> Result<bool> {
        let mut index = self.index.write();
        let Some(record) = index.get(id) else {
            debug!(object = %id, "delete of absent object ignored");
            return Ok(false);
        };

        match fs::remove_file(&record.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        index.remove(id);
        debug!(object = %id, "deleted object");
        Ok(true)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.read().contains_key(id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<ObjectRecord> {
        self.index.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Owned copy of the index
    pub fn snapshot(&self) -> BTreeMap<ObjectId, ObjectRecord> {
        self.index.read().clone()
    }

    /// Replace the index with one record per regular file under the root.
    ///
    /// Rebuilt records have no content type or tags; `created_at` comes from
    /// the file's modification time. The write lock is held for the whole
    /// scan so no upload or delete can land between the walk and the swap.
    pub fn rebuild(&self) -> Result<usize> {
        let mut index = self.index.write();
        let mut rebuilt = BTreeMap::new();

        for entry in WalkDir::new(&self.root).follow_links(false).min_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let Some(id) = ObjectId::from_relative_path(relative) else {
                warn!(path = %entry.path().display(), "skipping file outside any namespace");
                continue;
            };
            // A file name holding `\` maps to a different identity's path
            if id.path_under(&self.root) != entry.path() {
                warn!(path = %entry.path().display(), "skipping file with no matching identity");
                continue;
            }

            let meta = entry.metadata().map_err(io::Error::from)?;
            let created_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let record = ObjectRecord::new(id.clone(), entry.path().to_path_buf(), meta.len())
                .with_created_at(created_at);
            rebuilt.insert(id, record);
        }

        let count = rebuilt.len();
        *index = rebuilt;
        debug!(root = %self.root.display(), count, "rebuilt index from disk");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(ns: &str, name: &str) -> ObjectId {
        ObjectId::new(ns, name).unwrap()
    }

    #[test]
    fn test_open_creates_nested_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let engine = FsIndex::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_put_writes_file_at_layout_path() {
        let dir = tempdir().unwrap();
        let engine = FsIndex::open(dir.path()).unwrap();

        let record = engine
            .put(id("ns", "x/y.bin"), b"abc", None, BTreeMap::new())
            .unwrap();

        let expected = engine.root().join("ns").join("x").join("y.bin");
        assert_eq!(record.path, expected);
        assert_eq!(fs::read(&expected).unwrap(), b"abc");
        assert_eq!(record.size, 3);
    }

    #[test]
    fn test_remove_tolerates_externally_deleted_file() {
        let dir = tempdir().unwrap();
        let engine = FsIndex::open(dir.path()).unwrap();
        let record = engine
            .put(id("ns", "gone"), b"data", None, BTreeMap::new())
            .unwrap();

        fs::remove_file(&record.path).unwrap();
        assert!(engine.remove(&id("ns", "gone")).unwrap());
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_read_sees_external_changes() {
        let dir = tempdir().unwrap();
        let engine = FsIndex::open(dir.path()).unwrap();
        let record = engine
            .put(id("ns", "f"), b"old", None, BTreeMap::new())
            .unwrap();

        fs::write(&record.path, b"tampered").unwrap();
        assert_eq!(engine.read(&id("ns", "f")).unwrap(), b"tampered");
    }

    #[test]
    fn test_rebuild_skips_loose_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("loose.txt"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("ns").join("deep")).unwrap();
        fs::write(dir.path().join("ns").join("deep").join("f"), b"hello").unwrap();

        let engine = FsIndex::open(dir.path()).unwrap();
        assert_eq!(engine.len(), 0);

        assert_eq!(engine.rebuild().unwrap(), 1);
        let record = engine.get(&id("ns", "deep/f")).unwrap();
        assert_eq!(record.size, 5);
        assert!(record.content_type.is_none());
    }

    #[test]
    fn test_rebuild_concurrent_with_uploads_keeps_every_record() {
        let dir = tempdir().unwrap();
        let engine = FsIndex::open(dir.path()).unwrap();

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let engine = &engine;
                scope.spawn(move || {
                    for n in 0..25 {
                        let name = format!("w{}/obj{}", writer, n);
                        engine
                            .put(id("ns", &name), name.as_bytes(), None, BTreeMap::new())
                            .unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..20 {
                    engine.rebuild().unwrap();
                }
            });
        });

        assert_eq!(engine.len(), 100);
        for writer in 0..4 {
            for n in 0..25 {
                let name = format!("w{}/obj{}", writer, n);
                assert_eq!(engine.read(&id("ns", &name)).unwrap(), name.as_bytes());
            }
        }
    }

    #[test]
    fn test_rebuild_concurrent_with_deletes_does_not_resurrect() {
        let dir = tempdir().unwrap();
        let engine = FsIndex::open(dir.path()).unwrap();
        for n in 0..50 {
            engine
                .put(id("ns", &format!("f{}", n)), b"x", None, BTreeMap::new())
                .unwrap();
        }

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for n in 0..50 {
                    engine.remove(&id("ns", &format!("f{}", n))).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..20 {
                    engine.rebuild().unwrap();
                }
            });
        });

        assert_eq!(engine.len(), 0);
        assert!(engine.snapshot().values().all(|record| record.path.exists()));
    }
}
