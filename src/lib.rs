//! # cloudstub
//!
//! Local, in-process emulation of two cloud object-storage APIs so code can
//! exercise upload/download/delete/list/URL-signing workflows without a live
//! backend.
//!
//! ## Store flavors
//!
//! - [`ContainerStore`]: container + blob name, bytes in and out
//! - [`BucketStore`]: bucket + key, file in and out, with content type,
//!   string tags, size, and placeholder presigned URLs
//!
//! Each store owns a root directory and keeps objects at
//! `<root>/<namespace>/<name>`. The index of [`ObjectRecord`]s lives in
//! memory and is not loaded from disk when a store is opened.
//!
//! ## Example
//!
//! ```no_run
//! use cloudstub::ContainerStore;
//!
//! let store = ContainerStore::new("/tmp/blobs")?;
//! store.upload(b"hello", "docs", "greeting.txt", Some("text/plain"))?;
//! assert_eq!(store.download("docs", "greeting.txt")?, b"hello");
//! # Ok::<(), cloudstub::Error>(())
//! ```

pub mod config;
pub mod model;
pub mod store;

mod error;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{ObjectId, ObjectRecord};
pub use store::{
    BucketStore, ContainerStore, PresignedUrl, CONTENT_TYPE_KEY, DEFAULT_EXPIRY_SECS,
    DEFAULT_URL_BASE,
};
