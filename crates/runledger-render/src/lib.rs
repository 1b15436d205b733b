//! Rendering of documents derived from the history log: journal entries,
//! the narrative timeline, the history index, and CSV exports. This crate
//! consumes the serialized NDJSON form, not engine types.

pub mod index;
pub mod journal;
pub mod narrative;
pub mod timeline;
