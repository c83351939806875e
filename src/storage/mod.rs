//! Storage backends
//!
//! The pipeline reads raw impressions from a [`DocumentStore`] and publishes
//! model bundles to a [`ModelRegistry`]. Both are traits so the filesystem
//! implementations used here can be swapped for a database or object store.

mod document;
mod registry;

pub use document::{Document, DocumentStore, JsonLinesStore, MemoryDocumentStore};
pub use registry::{FileModelRegistry, ModelRegistry};
