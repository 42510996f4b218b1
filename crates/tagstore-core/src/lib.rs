//! Storage-agnostic core of the tag-store
//!
//! This crate defines the domain model (taxonomies, hierarchical tags,
//! taggable entities), the materialized-path codec that lets subtree
//! queries run as indexed prefix scans, and the storage traits backends
//! implement.
//!
//! ## Architecture
//!
//! - [`path`] — pure path construction and prefix-query helpers
//! - [`model`] — `Taxonomy`, `Tag`, `Entity` records
//! - [`error`] — [`TagStoreError`] and the shared result alias
//! - [`store`] — the [`TagHierarchy`] and [`EntityTagIndex`] traits and
//!   the [`TagStore`] façade composing them
//!
//! Backends live in sibling crates; see `tagstore-sqlite` for the SQLite
//! implementation.

pub mod error;
pub mod model;
pub mod path;
pub mod store;

// Re-export main types for convenience
pub use error::{TagStoreError, TagStoreResult};
pub use model::{Entity, EntityId, Tag, TagId, Taxonomy, TaxonomyId};
pub use store::{EntityTagIndex, TagHierarchy, TagStore};
