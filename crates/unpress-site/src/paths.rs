//! Output path resolution.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::warn;

use unpress_export::{BlogHeader, Item};

use crate::error::SiteError;
use crate::uid::{Namespace, UidRegistry};

/// Index of items by wp_id for parent-chain lookups.
pub struct ItemIndex<'a> {
    by_wp_id: HashMap<&'a str, &'a Item>,
}

impl<'a> ItemIndex<'a> {
    /// Build an index over one export's items.
    #[must_use]
    pub fn new(items: &'a [Item]) -> Self {
        Self {
            by_wp_id: items.iter().map(|item| (item.wp_id.as_str(), item)).collect(),
        }
    }

    /// Look up an item by wp_id.
    #[must_use]
    pub fn get(&self, wp_id: &str) -> Option<&'a Item> {
        self.by_wp_id.get(wp_id).copied()
    }
}

/// Per-blog output root: `<build_dir>/jekyll/<sanitized site link>`.
#[must_use]
pub fn blog_dir(build_dir: &Path, header: &BlogHeader) -> PathBuf {
    let stripped = header
        .link
        .strip_prefix("https")
        .or_else(|| header.link.strip_prefix("http"))
        .unwrap_or(&header.link);
    let name: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    build_dir.join("jekyll").join(name)
}

/// Post output path: `<blog_dir>/_posts/<uid>.<ext>`.
pub(crate) fn post_path(blog_dir: &Path, uid: &str, ext: &str) -> PathBuf {
    blog_dir.join("_posts").join(format!("{uid}.{ext}"))
}

/// Page output path: `<blog_dir>/<ancestors>/<uid>/index.<ext>`.
pub(crate) fn page_path(blog_dir: &Path, ancestors: &[String], uid: &str, ext: &str) -> PathBuf {
    let mut path = blog_dir.to_path_buf();
    for ancestor in ancestors {
        path.push(ancestor);
    }
    path.join(uid).join(format!("index.{ext}"))
}

/// Ancestor uids for a page, root ancestor first.
///
/// Walks `parent` wp_ids upward until `"0"`. A parent missing from the
/// export ends the chain early with a warning; a revisited wp_id is a cycle
/// and fails the item.
pub(crate) fn page_ancestors<'a>(
    item: &'a Item,
    index: &ItemIndex<'a>,
    registry: &mut UidRegistry,
    date_format: &str,
) -> Result<Vec<String>, SiteError> {
    let mut ancestors = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(item.wp_id.as_str());

    let mut current = item;
    while current.parent != "0" {
        if !visited.insert(current.parent.as_str()) {
            return Err(SiteError::ParentCycle {
                title: item.title.clone(),
                wp_id: current.parent.clone(),
            });
        }
        match index.get(&current.parent) {
            Some(parent) => {
                ancestors.push(registry.assign(parent, Namespace::Pages, false, date_format));
                current = parent;
            }
            None => {
                warn!(
                    title = %item.title,
                    parent = %current.parent,
                    "parent chain broken, using partial path"
                );
                break;
            }
        }
    }

    ancestors.reverse();
    Ok(ancestors)
}
