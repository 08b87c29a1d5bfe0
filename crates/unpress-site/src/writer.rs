//! Per-item output file writing.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use unpress_config::Config;
use unpress_export::{BlogHeader, Item};
use unpress_markdown::MarkupFormat;

use crate::attachments::ImageFetcher;
use crate::error::SiteError;
use crate::front_matter;
use crate::paths::{self, ItemIndex};
use crate::uid::{Namespace, UidRegistry};

/// Result of processing one item.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Output file written at this path.
    Written(PathBuf),
    /// Item intentionally not written.
    Skipped(SkipReason),
}

/// Why an item produced no output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A configured field/value pair matched.
    FieldFilter,
    /// The item type is in the recognized-but-skipped set.
    TypeFilter,
    /// The item type is not recognized at all.
    UnknownType,
}

/// Writes items into the output tree.
///
/// Owns the run-scoped [`UidRegistry`], so uid namespaces persist across
/// multiple export files processed in one run.
pub struct SiteWriter<'a> {
    config: &'a Config,
    format: MarkupFormat,
    type_filter: HashSet<&'a str>,
    registry: UidRegistry,
    fetcher: Option<ImageFetcher>,
}

impl<'a> SiteWriter<'a> {
    /// Create a writer for one run.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured target format is unknown.
    pub fn new(config: &'a Config) -> Result<Self, SiteError> {
        let format = MarkupFormat::from_str(&config.output_resolved.target_format)?;
        let fetcher = config
            .output_resolved
            .download_images
            .then(ImageFetcher::new);
        Ok(Self {
            config,
            format,
            type_filter: config.items.type_filter.iter().map(String::as_str).collect(),
            registry: UidRegistry::new(),
            fetcher,
        })
    }

    /// Process one item: filter, resolve its path, and write it.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidWpId`] for non-numeric identifiers,
    /// [`SiteError::ParentCycle`] for cyclic page parent chains, and I/O
    /// errors from the output tree.
    pub fn write_item(
        &mut self,
        item: &Item,
        header: &BlogHeader,
        index: &ItemIndex<'_>,
    ) -> Result<WriteOutcome, SiteError> {
        for (field, value) in &self.config.items.field_filter {
            if item.field(field) == Some(value.as_str()) {
                return Ok(WriteOutcome::Skipped(SkipReason::FieldFilter));
            }
        }

        let blog_dir = paths::blog_dir(&self.config.output_resolved.build_dir, header);
        let date_format = &self.config.output_resolved.date_format;
        let ext = self.format.extension();

        let (path, layout, uid) = match item.post_type.as_str() {
            "post" => {
                let uid = self.registry.assign(item, Namespace::Posts, true, date_format);
                (paths::post_path(&blog_dir, &uid, ext), "post", uid)
            }
            "page" => {
                let uid = self.registry.assign(item, Namespace::Pages, false, date_format);
                let ancestors =
                    paths::page_ancestors(item, index, &mut self.registry, date_format)?;
                (paths::page_path(&blog_dir, &ancestors, &uid, ext), "page", uid)
            }
            t if self.type_filter.contains(t) => {
                return Ok(WriteOutcome::Skipped(SkipReason::TypeFilter));
            }
            other => {
                warn!(item_type = %other, title = %item.title, "unknown item type, skipping");
                return Ok(WriteOutcome::Skipped(SkipReason::UnknownType));
            }
        };

        let mut content =
            front_matter::compose(item, layout, &self.config.taxonomies.name_mapping)?;
        match unpress_markdown::render(&item.body, self.format) {
            Ok(body) => content.push_str(&body),
            Err(e) => {
                warn!(title = %item.title, error = %e, "body conversion failed, omitting body");
            }
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, content)?;

        if let Some(fetcher) = &self.fetcher {
            for src in &item.image_sources {
                if let Err(e) = fetcher.download(&header.link, src, &blog_dir, &uid) {
                    warn!(src = %src, error = %e, "unable to download image");
                }
            }
        }

        Ok(WriteOutcome::Written(path))
    }
}
