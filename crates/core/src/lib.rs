//! Catalog domain core.
//!
//! Holds everything that decides what a resource is and how it moves through
//! its lifecycle: identifier derivation, schema validation, search and
//! pagination types, the storage seam, the single-resource service, and the
//! bulk CSV importer. No HTTP or SQL lives here.

pub mod error;
pub mod identifier;
pub mod import;
pub mod resource;
pub mod search;
pub mod service;
pub mod store;
