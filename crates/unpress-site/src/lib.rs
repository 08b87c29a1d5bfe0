//! Static-site tree generation for unpress.
//!
//! Takes parsed export items and produces the output tree: run-unique
//! identifiers, post/page paths, front-matter blocks, converted bodies, and
//! optionally downloaded images.

mod attachments;
mod error;
mod front_matter;
mod paths;
mod uid;
mod writer;

pub use attachments::ImageFetcher;
pub use error::SiteError;
pub use paths::{ItemIndex, blog_dir};
pub use uid::{Namespace, UidRegistry};
pub use writer::{SiteWriter, SkipReason, WriteOutcome};
