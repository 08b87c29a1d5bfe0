//! Parsed export data model.

/// Channel-level blog metadata, read once per export file.
#[derive(Debug, Clone)]
pub struct BlogHeader {
    /// Blog title.
    pub title: String,
    /// Canonical site URL.
    pub link: String,
    /// Blog description.
    pub description: String,
}

/// One exported content unit (post, page, attachment, or other type).
#[derive(Debug, Clone, Default)]
pub struct Item {
    /// Source-system identifier (string-typed numeric).
    pub wp_id: String,
    /// Item title.
    pub title: String,
    /// Original permalink.
    pub link: String,
    /// Author login name.
    pub author: String,
    /// GMT publication date in the export's textual form.
    pub date: String,
    /// Source-provided slug, possibly empty.
    pub slug: String,
    /// Publication status, e.g. "publish" or "draft".
    pub status: String,
    /// Item type, e.g. "post" or "page".
    pub post_type: String,
    /// `wp_id` of the parent item, "0" when none.
    pub parent: String,
    /// Whether comments were open on the source item.
    pub comments_enabled: bool,
    /// Raw HTML body, after configured substitutions.
    pub body: String,
    /// Excerpt HTML, possibly empty.
    pub excerpt: String,
    /// `<img src>` URLs from the body, document order, duplicates kept.
    pub image_sources: Vec<String>,
    /// Taxonomy domain to values, both in first-seen order, post-filter.
    pub taxonomies: Vec<(String, Vec<String>)>,
}

impl Item {
    /// Look up a field by its filter name.
    ///
    /// Covers the string-valued fields addressable by the item field filter.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "link" => Some(&self.link),
            "author" => Some(&self.author),
            "date" => Some(&self.date),
            "slug" => Some(&self.slug),
            "status" => Some(&self.status),
            "type" => Some(&self.post_type),
            "wp_id" => Some(&self.wp_id),
            "parent" => Some(&self.parent),
            "body" => Some(&self.body),
            "excerpt" => Some(&self.excerpt),
            _ => None,
        }
    }
}

/// One parsed export document.
#[derive(Debug)]
pub struct Export {
    /// Channel metadata.
    pub header: BlogHeader,
    /// Items in source order.
    pub items: Vec<Item>,
}
