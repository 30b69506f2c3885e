use mailmerge_opc::OpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error(transparent)]
    Package(#[from] OpcError),
    #[error("malformed xml in {part}: {source}")]
    Parse {
        part: String,
        #[source]
        source: quick_xml::Error,
    },
    #[error("malformed xml in {part}: {message}")]
    Malformed { part: String, message: String },
    #[error("{part} has no document body")]
    MissingBody { part: String },
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
