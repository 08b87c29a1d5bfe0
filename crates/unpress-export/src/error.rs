//! Error types for export reading.

/// Error during WXR export reading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExportError {
    /// I/O error reading the export file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Invalid body substitution pattern.
    #[error("invalid body substitution pattern: {0}")]
    Pattern(#[from] regex::Error),
}
