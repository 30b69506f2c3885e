//! Minimal Open Packaging Convention support.
//!
//! Both inputs of a merge are OPC packages: the `.docx` template and the `.xlsx` data source.
//! This crate inflates a package into an ordered list of parts (bounded by [`PackageLimits`]),
//! resolves relationships between parts, and writes a package back out deterministically so the
//! same inputs always produce byte-identical documents.

mod error;
mod package;
mod path;
mod rels;

pub use error::OpcError;
pub use package::{
    Package, PackageLimits, Part, DEFAULT_MAX_PACKAGE_BYTES, DEFAULT_MAX_PART_BYTES,
};
pub use path::{normalize_part_name, rels_for_part, resolve_target};
pub use rels::{parse_relationships, Relationship};
