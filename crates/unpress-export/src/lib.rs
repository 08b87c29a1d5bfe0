//! WordPress eXtended RSS (WXR) export reading.
//!
//! [`ExportReader`] parses one export document into a [`BlogHeader`] and an
//! ordered list of [`Item`]s, applying the configured taxonomy filters and
//! body substitutions along the way. Field extraction goes through a
//! per-field descriptor table so missing-value behavior is explicit rather
//! than scattered through the parser.

mod error;
mod fields;
mod item;
mod reader;

pub use error::ExportError;
pub use fields::SENTINEL;
pub use item::{BlogHeader, Export, Item};
pub use reader::ExportReader;
