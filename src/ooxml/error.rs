//! Errors raised while reading, parsing or writing OOXML packages

use thiserror::Error;

/// Failures of the package and XML layers.
///
/// Fill-time problems (missing placeholders, malformed templates) are not
/// reported through this type; see [`crate::result::FillError`].
#[derive(Debug, Error)]
pub enum OoxmlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Part not found: {0}")]
    PartNotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OoxmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
