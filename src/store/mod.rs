//! JSON file-backed document collections
//!
//! Each collection owns exactly one file shaped as
//!
//! ```text
//! {
//!   "<key>": [ { "id": "...", "createdAt": "...", "updatedAt": "...", ... }, ... ]
//! }
//! ```
//!
//! The file is loaded lazily, healed to an empty collection when it is
//! missing or malformed, and rewritten in full through a `.tmp` sibling and
//! a rename after every mutation.

pub mod collection;
pub mod id;

pub use collection::{Collection, Document, RecordMeta};
pub use id::{new_id, IdGenerator, UuidGenerator};
