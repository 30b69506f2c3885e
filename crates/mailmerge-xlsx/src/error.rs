use mailmerge_opc::OpcError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Failure to read the data source. Always fatal to a merge.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Package(#[from] OpcError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] AttrError),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid cell reference: {0}")]
    InvalidCellRef(String),
    #[error("invalid workbook: {0}")]
    Invalid(String),
}
