//! Per-field descriptor table for item extraction.
//!
//! Each WXR item field is resolved through one [`FieldSpec`] naming its
//! qualified XML tag and what a missing or empty element yields.

use std::collections::HashMap;

/// Placeholder text for fields whose element is missing or empty.
pub const SENTINEL: &str = "No Content Found";

/// What a field lookup yields when no element (or no text) is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Missing {
    /// Yield [`SENTINEL`].
    Sentinel,
    /// Yield the empty string.
    Empty,
}

/// Descriptor for one extractable item field.
pub(crate) struct FieldSpec {
    /// Field name as used by the item field filter.
    pub name: &'static str,
    /// Qualified XML tag within `<item>`.
    pub tag: &'static str,
    /// Behavior when the element is missing or has no text.
    pub missing: Missing,
}

/// All item fields, in extraction order.
pub(crate) const FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "title", tag: "title", missing: Missing::Sentinel },
    FieldSpec { name: "link", tag: "link", missing: Missing::Sentinel },
    FieldSpec { name: "author", tag: "dc:creator", missing: Missing::Sentinel },
    FieldSpec { name: "date", tag: "wp:post_date_gmt", missing: Missing::Sentinel },
    FieldSpec { name: "slug", tag: "wp:post_name", missing: Missing::Empty },
    FieldSpec { name: "status", tag: "wp:status", missing: Missing::Sentinel },
    FieldSpec { name: "type", tag: "wp:post_type", missing: Missing::Sentinel },
    FieldSpec { name: "wp_id", tag: "wp:post_id", missing: Missing::Sentinel },
    FieldSpec { name: "parent", tag: "wp:post_parent", missing: Missing::Sentinel },
    FieldSpec { name: "comments", tag: "wp:comment_status", missing: Missing::Sentinel },
    FieldSpec { name: "body", tag: "content:encoded", missing: Missing::Sentinel },
    FieldSpec { name: "excerpt", tag: "excerpt:encoded", missing: Missing::Empty },
];

/// Whether `tag` is one of the captured item field tags.
pub(crate) fn is_field_tag(tag: &str) -> bool {
    FIELDS.iter().any(|spec| spec.tag == tag)
}

/// Resolve a field from raw captured tag text.
pub(crate) fn resolve(raw: &HashMap<String, String>, spec: &FieldSpec) -> String {
    match raw.get(spec.tag) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => match spec.missing {
            Missing::Sentinel => SENTINEL.to_owned(),
            Missing::Empty => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> &'static FieldSpec {
        FIELDS.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_resolve_present_value() {
        let mut raw = HashMap::new();
        raw.insert("wp:post_id".to_owned(), "42".to_owned());
        assert_eq!(resolve(&raw, spec("wp_id")), "42");
    }

    #[test]
    fn test_resolve_missing_sentinel() {
        let raw = HashMap::new();
        assert_eq!(resolve(&raw, spec("title")), SENTINEL);
    }

    #[test]
    fn test_resolve_missing_empty() {
        let raw = HashMap::new();
        assert_eq!(resolve(&raw, spec("slug")), "");
        assert_eq!(resolve(&raw, spec("excerpt")), "");
    }

    #[test]
    fn test_resolve_empty_text_follows_missing_behavior() {
        let mut raw = HashMap::new();
        raw.insert("wp:post_name".to_owned(), String::new());
        raw.insert("wp:status".to_owned(), String::new());
        assert_eq!(resolve(&raw, spec("slug")), "");
        assert_eq!(resolve(&raw, spec("status")), SENTINEL);
    }

    #[test]
    fn test_field_tags_recognized() {
        assert!(is_field_tag("content:encoded"));
        assert!(is_field_tag("wp:post_parent"));
        assert!(!is_field_tag("wp:postmeta"));
        assert!(!is_field_tag("category"));
    }
}
