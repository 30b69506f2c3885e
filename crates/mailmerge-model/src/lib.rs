//! Core data types shared by the mail-merge crates.
//!
//! A spreadsheet row becomes a [`FieldMapping`] (ordered field name to [`FieldValue`]); a mapping
//! that passes the [`RequiredFields`] policy is wrapped into a [`Record`] together with the sheet
//! it came from and its output ordinal.

mod mapping;
mod record;
mod value;

pub use mapping::{FieldMapping, RequiredFields};
pub use record::{OrdinalPolicy, Record};
pub use value::FieldValue;
