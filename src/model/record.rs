//! Index record for a stored object

use super::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Metadata tracked for every object written through a store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Identity (namespace, name)
    pub id: ObjectId,
    /// Absolute location of the bytes on disk
    pub path: PathBuf,
    /// MIME type supplied at upload, if any
    pub content_type: Option<String>,
    /// Free-form string tags (bucket flavor only)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Size in bytes of the written file
    pub size: u64,
    /// When the object was written (UTC)
    pub created_at: DateTime<Utc>,
}

impl ObjectRecord {
    /// Create a record stamped with the current time
    pub fn new(id: ObjectId, path: PathBuf, size: u64) -> Self {
        ObjectRecord {
            id,
            path,
            content_type: None,
            metadata: BTreeMap::new(),
            size,
            created_at: Utc::now(),
        }
    }

    /// Set content type
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set metadata tags
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Container or bucket of the object
    pub fn namespace(&self) -> &str {
        self.id.namespace()
    }

    /// Blob name or key of the object
    pub fn name(&self) -> &str {
        self.id.name()
    }
}
