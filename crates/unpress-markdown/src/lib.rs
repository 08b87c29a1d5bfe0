//! HTML body conversion for unpress.
//!
//! Converts WordPress HTML bodies into the configured target markup and
//! extracts embedded image references. HTML is parsed with `scraper`, which
//! accepts the tag soup real exports contain.

mod convert;
mod images;

use std::fmt;
use std::str::FromStr;

pub use images::image_sources;

/// Target markup format for item bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupFormat {
    /// Convert HTML to Markdown.
    Markdown,
    /// Pass HTML through unchanged.
    Html,
}

impl MarkupFormat {
    /// File extension for output files of this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

impl FromStr for MarkupFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            other => Err(ConvertError::UnknownFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error during body conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Unrecognized target format identifier.
    #[error("unknown target format \"{0}\"")]
    UnknownFormat(String),

    /// Element nesting exceeded the conversion depth limit.
    #[error("element nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Convert an HTML body to the target markup format.
///
/// # Errors
///
/// Returns [`ConvertError::NestingTooDeep`] for pathologically nested input.
pub fn render(html: &str, format: MarkupFormat) -> Result<String, ConvertError> {
    match format {
        MarkupFormat::Markdown => convert::html_to_markdown(html),
        MarkupFormat::Html => Ok(html.to_owned()),
    }
}
