//! Container/blob flavored store

use super::engine::FsIndex;
use crate::model::{ObjectId, ObjectRecord};
use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Filesystem-backed emulation of container-scoped blob storage.
///
/// Blobs live at `<root>/<container>/<name>`. The index starts empty even if
/// the root already holds files; see [`ContainerStore::rebuild_index`].
pub struct ContainerStore {
    engine: FsIndex,
}

impl ContainerStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(ContainerStore {
            engine: FsIndex::open(root)?,
        })
    }

    /// Write `data` as `container/name`, replacing any existing blob
    pub fn upload(
        &self,
        data: &[u8],
        container: &str,
        name: &str,
        content_type: Option<&str>,
    ) -> Result<()> {
        let id = ObjectId::new(container, name)?;
        self.engine
            .put(id, data, content_type.map(str::to_string), BTreeMap::new())?;
        Ok(())
    }

    /// Read the blob's current bytes from disk
    pub fn download(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let id = ObjectId::new(container, name)?;
        self.engine.read(&id)
    }

    /// Remove the blob. Absent blobs are ignored.
    pub fn delete(&self, container: &str, name: &str) -> Result<()> {
        let id = ObjectId::new(container, name)?;
        self.engine.remove(&id)?;
        Ok(())
    }

    /// Snapshot of every tracked blob
    pub fn list(&self) -> BTreeMap<ObjectId, ObjectRecord> {
        self.engine.snapshot()
    }

    /// Record for one blob, if tracked
    pub fn get(&self, container: &str, name: &str) -> Option<ObjectRecord> {
        let id = ObjectId::new(container, name).ok()?;
        self.engine.get(&id)
    }

    pub fn contains(&self, container: &str, name: &str) -> bool {
        ObjectId::new(container, name)
            .map(|id| self.engine.contains(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the index with whatever files exist under the root
    pub fn rebuild_index(&self) -> Result<usize> {
        self.engine.rebuild()
    }

    pub fn root(&self) -> &Path {
        self.engine.root()
    }
}
