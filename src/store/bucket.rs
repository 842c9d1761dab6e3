//! Bucket/key flavored store with tags and placeholder presigned URLs

use super::engine::FsIndex;
use super::presign::{PresignedUrl, DEFAULT_EXPIRY_SECS, DEFAULT_URL_BASE};
use crate::model::{ObjectId, ObjectRecord};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;

/// Reserved `extra` key whose value becomes the record's content type
pub const CONTENT_TYPE_KEY: &str = "ContentType";

/// Filesystem-backed emulation of bucket/key object storage
pub struct BucketStore {
    engine: FsIndex,
    url_base: String,
}

impl BucketStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(BucketStore {
            engine: FsIndex::open(root)?,
            url_base: DEFAULT_URL_BASE.to_string(),
        })
    }

    /// Use a different base for generated URLs
    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into();
        self
    }

    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    /// Copy the file at `source` into `bucket/key`.
    ///
    /// `extra["ContentType"]` sets the content type; every other entry is
    /// stored as a tag. A missing source fails with `NotFound` naming it.
    pub fn upload_file(
        &self,
        source: impl AsRef<Path>,
        bucket: &str,
        key: &str,
        extra: Option<&HashMap<String, String>>,
    ) -> Result<()> {
        let source = source.as_ref();
        let id = ObjectId::new(bucket, key)?;

        let data = fs::read(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(source.display().to_string()),
            _ => Error::Io(e),
        })?;

        let mut content_type = None;
        let mut metadata = BTreeMap::new();
        for (name, value) in extra.into_iter().flatten() {
            if name == CONTENT_TYPE_KEY {
                content_type = Some(value.clone());
            } else {
                metadata.insert(name.clone(), value.clone());
            }
        }

        self.engine.put(id, &data, content_type, metadata)?;
        Ok(())
    }

    /// Write the stored bytes of `bucket/key` to `destination`
    pub fn download_file(
        &self,
        bucket: &str,
        key: &str,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        let id = ObjectId::new(bucket, key)?;
        self.engine.copy_to(&id, destination.as_ref())?;
        Ok(())
    }

    /// Remove the object. Absent objects are ignored.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let id = ObjectId::new(bucket, key)?;
        self.engine.remove(&id)?;
        Ok(())
    }

    /// Placeholder URL for `bucket/key` expiring `expires_in_secs` from now.
    ///
    /// The object does not need to exist and nothing is recorded.
    pub fn generate_presigned_url(&self, bucket: &str, key: &str, expires_in_secs: i64) -> String {
        PresignedUrl::new(&*self.url_base, bucket, key, Utc::now(), expires_in_secs).to_string()
    }

    /// [`BucketStore::generate_presigned_url`] with the one hour default
    pub fn generate_presigned_url_default(&self, bucket: &str, key: &str) -> String {
        self.generate_presigned_url(bucket, key, DEFAULT_EXPIRY_SECS)
    }

    /// Snapshot of every tracked object
    pub fn list_objects(&self) -> BTreeMap<ObjectId, ObjectRecord> {
        self.engine.snapshot()
    }

    /// Record for one object, if tracked
    pub fn head_object(&self, bucket: &str, key: &str) -> Option<ObjectRecord> {
        let id = ObjectId::new(bucket, key).ok()?;
        self.engine.get(&id)
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        ObjectId::new(bucket, key)
            .map(|id| self.engine.contains(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the index with whatever files exist under the root.
    ///
    /// Content types and tags are not stored on disk and come back empty.
    pub fn rebuild_index(&self) -> Result<usize> {
        self.engine.rebuild()
    }

    pub fn root(&self) -> &Path {
        self.engine.root()
    }
}
