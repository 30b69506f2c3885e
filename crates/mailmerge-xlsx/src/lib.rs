//! XLSX record source for mail merge.
//!
//! Each worksheet is a record table: the header row (row 4 by default) names the fields, and
//! every following row up to the last populated one becomes a [`FieldMapping`] keyed by those
//! names. Rows missing a required field are skipped; the rest are yielded as [`Record`]s.
//!
//! [`FieldMapping`]: mailmerge_model::FieldMapping
//! [`Record`]: mailmerge_model::Record

mod cell_ref;
mod date;
mod error;
mod records;
mod shared_strings;
mod styles;
mod workbook;
mod worksheet;

pub use cell_ref::{MAX_COL, MAX_ROW};
pub use date::DateSystem;
pub use error::ReadError;
pub use records::{ReaderOptions, Records, DEFAULT_HEADER_ROW};
pub use workbook::{SheetInfo, Workbook};
pub use worksheet::SheetGrid;
