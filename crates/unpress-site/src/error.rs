//! Error types for site generation.

/// Error during site tree generation.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Front-matter serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Body conversion error.
    #[error("conversion error: {0}")]
    Convert(#[from] unpress_markdown::ConvertError),

    /// Item has a non-numeric source identifier.
    #[error("non-numeric wp_id \"{value}\" on item \"{title}\"")]
    InvalidWpId {
        /// Item title, for diagnostics.
        title: String,
        /// The offending identifier value.
        value: String,
    },

    /// Page parent chain revisits an item.
    #[error("parent chain cycle at wp_id {wp_id} on item \"{title}\"")]
    ParentCycle {
        /// Item title, for diagnostics.
        title: String,
        /// The wp_id seen twice during ascent.
        wp_id: String,
    },

    /// Image URL could not be parsed or resolved.
    #[error("invalid image URL: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] ureq::Error),
}
