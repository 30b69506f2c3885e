//! DOCX templates with `{Field}` placeholders.
//!
//! [`TemplatePackage`] validates a template once; [`TemplatePackage::instantiate`] yields an
//! independent [`Document`] per record, which [`Document::merge`] rewrites paragraph by paragraph
//! (see [`replace`] and [`walk`]) before it is written out as a new package.

mod document;
mod error;
mod paragraph;
pub mod replace;
pub mod walk;
mod xml;

pub use document::{Document, Stories, TemplatePackage};
pub use error::DocxError;
pub use paragraph::Paragraph;
pub use replace::{replace_paragraph, substitute, RewritePolicy};
pub use walk::WalkStats;
