//! Filesystem-backed object stores
//!
//! Both flavors keep objects at `<root>/<namespace>/<name>` and track them in
//! an in-memory index owned by the store instance.

mod bucket;
mod container;
mod engine;
mod presign;

pub use bucket::{BucketStore, CONTENT_TYPE_KEY};
pub use container::ContainerStore;
pub use presign::{PresignedUrl, DEFAULT_EXPIRY_SECS, DEFAULT_URL_BASE};
