//! Mail merge over a DOCX template and an XLSX workbook.
//!
//! [`Merger::run`] reads the workbook's records (see [`mailmerge_xlsx`]), fills a fresh copy of
//! the template for each one (see [`mailmerge_docx`]) and writes
//! `{sheet}_output_{ordinal}.docx` files into the configured output directory, optionally
//! bundling them into a zip afterwards.

pub mod archive;
pub mod cli;
mod config;
mod merge;

pub use archive::{write_archive, ArchiveError};
pub use config::{FailurePolicy, MergeConfig};
pub use merge::{MergeError, MergeOutcome, Merger, RecordFailure};
