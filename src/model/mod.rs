//! Core data model: object identities and index records

mod object_id;
mod record;

pub use object_id::ObjectId;
pub use record::ObjectRecord;
