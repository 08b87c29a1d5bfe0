//! Front-matter composition.
//!
//! Each output file starts with a `---`-delimited YAML block: the item
//! metadata, then (when present) the taxonomy mapping.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::warn;

use unpress_export::Item;

use crate::error::SiteError;

/// Canonical textual date form used by WXR exports.
const ITEM_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialized front-matter metadata, in emission order.
#[derive(Debug, Serialize)]
struct FrontMatter {
    title: String,
    link: String,
    author: String,
    date: String,
    slug: String,
    wordpress_id: i64,
    comments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<bool>,
    layout: String,
}

/// Compose the complete front-matter block for an item.
///
/// # Errors
///
/// Returns [`SiteError::InvalidWpId`] when `wp_id` is not numeric.
pub(crate) fn compose(
    item: &Item,
    layout: &str,
    name_mapping: &HashMap<String, String>,
) -> Result<String, SiteError> {
    let wordpress_id: i64 = item
        .wp_id
        .parse()
        .map_err(|_| SiteError::InvalidWpId {
            title: item.title.clone(),
            value: item.wp_id.clone(),
        })?;

    let front = FrontMatter {
        title: item.title.clone(),
        link: item.link.clone(),
        author: item.author.clone(),
        date: item_date(item).format("%Y-%m-%d %H:%M:%S %z").to_string(),
        slug: item.slug.clone(),
        wordpress_id,
        comments: item.comments_enabled,
        excerpt: (!item.excerpt.is_empty()).then(|| item.excerpt.clone()),
        published: (item.status != "publish").then_some(false),
        layout: layout.to_owned(),
    };

    let mut block = String::from("---\n");
    block.push_str(&serde_yaml::to_string(&front)?);
    if let Some(taxonomies) = taxonomy_block(item, name_mapping)? {
        block.push_str(&taxonomies);
    }
    block.push_str("---\n\n");
    Ok(block)
}

/// Parse the item date as UTC, falling back to now.
fn item_date(item: &Item) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(&item.date, ITEM_DATE_FORMAT).map_or_else(
        |_| {
            warn!(title = %item.title, date = %item.date, "unparseable item date, using now");
            Utc::now()
        },
        |dt| dt.and_utc(),
    )
}

/// Render the taxonomy mapping, or `None` when the item has none.
///
/// Domains map through `name_mapping` (identity when unmapped); lists of
/// domains mapped to the same name merge, de-duplicating values while
/// preserving first-seen order.
fn taxonomy_block(
    item: &Item,
    name_mapping: &HashMap<String, String>,
) -> Result<Option<String>, SiteError> {
    let mut merged: Vec<(String, Vec<String>)> = Vec::new();
    for (domain, values) in &item.taxonomies {
        let name = name_mapping.get(domain).unwrap_or(domain);
        let index = match merged.iter().position(|(n, _)| n == name) {
            Some(i) => i,
            None => {
                merged.push((name.clone(), Vec::new()));
                merged.len() - 1
            }
        };
        for value in values {
            if !merged[index].1.contains(value) {
                merged[index].1.push(value.clone());
            }
        }
    }

    if merged.is_empty() {
        return Ok(None);
    }

    let mut mapping = serde_yaml::Mapping::new();
    for (name, values) in merged {
        mapping.insert(
            serde_yaml::Value::String(name),
            serde_yaml::Value::Sequence(
                values.into_iter().map(serde_yaml::Value::String).collect(),
            ),
        );
    }
    Ok(Some(serde_yaml::to_string(&mapping)?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item() -> Item {
        Item {
            wp_id: "5".to_owned(),
            title: "Hello World".to_owned(),
            link: "https://blog.example.com/?p=5".to_owned(),
            author: "alice".to_owned(),
            date: "2020-01-01 10:00:00".to_owned(),
            slug: "hello-world".to_owned(),
            status: "publish".to_owned(),
            post_type: "post".to_owned(),
            parent: "0".to_owned(),
            comments_enabled: true,
            ..Item::default()
        }
    }

    #[test]
    fn test_always_emitted_fields() {
        let block = compose(&item(), "post", &HashMap::new()).unwrap();
        assert!(block.starts_with("---\n"));
        assert!(block.ends_with("---\n\n"));
        assert!(block.contains("title: Hello World"));
        assert!(block.contains("author: alice"));
        assert!(block.contains("slug: hello-world"));
        assert!(block.contains("wordpress_id: 5"));
        assert!(block.contains("comments: true"));
        assert!(block.contains("layout: post"));
        assert!(block.contains("2020-01-01 10:00:00 +0000"));
    }

    #[test]
    fn test_excerpt_only_when_non_empty() {
        let block = compose(&item(), "post", &HashMap::new()).unwrap();
        assert!(!block.contains("excerpt"));

        let mut with_excerpt = item();
        with_excerpt.excerpt = "A teaser".to_owned();
        let block = compose(&with_excerpt, "post", &HashMap::new()).unwrap();
        assert!(block.contains("excerpt: A teaser"));
    }

    #[test]
    fn test_published_false_only_for_non_publish_status() {
        let block = compose(&item(), "post", &HashMap::new()).unwrap();
        assert!(!block.contains("published"));

        let mut draft = item();
        draft.status = "draft".to_owned();
        let block = compose(&draft, "post", &HashMap::new()).unwrap();
        assert!(block.contains("published: false"));
    }

    #[test]
    fn test_non_numeric_wp_id_is_error() {
        let mut bad = item();
        bad.wp_id = "not-a-number".to_owned();
        let err = compose(&bad, "post", &HashMap::new()).unwrap_err();
        assert!(matches!(err, SiteError::InvalidWpId { .. }));
    }

    #[test]
    fn test_taxonomy_block_with_name_mapping() {
        let mut tagged = item();
        tagged.taxonomies = vec![
            ("category".to_owned(), vec!["Tech".to_owned()]),
            ("post_tag".to_owned(), vec!["rust".to_owned(), "blogging".to_owned()]),
        ];
        let mapping = HashMap::from([
            ("category".to_owned(), "categories".to_owned()),
            ("post_tag".to_owned(), "tags".to_owned()),
        ]);
        let block = compose(&tagged, "post", &mapping).unwrap();
        assert!(block.contains("categories:\n- Tech"));
        assert!(block.contains("tags:\n- rust\n- blogging"));
        assert!(!block.contains("post_tag"));
    }

    #[test]
    fn test_taxonomy_merge_dedups_preserving_order() {
        let mut tagged = item();
        tagged.taxonomies = vec![
            ("category".to_owned(), vec!["Tech".to_owned(), "Life".to_owned()]),
            ("post_tag".to_owned(), vec!["Life".to_owned(), "rust".to_owned()]),
        ];
        // Both domains map to the same output name.
        let mapping = HashMap::from([
            ("category".to_owned(), "tags".to_owned()),
            ("post_tag".to_owned(), "tags".to_owned()),
        ]);
        let block = compose(&tagged, "post", &mapping).unwrap();
        assert!(block.contains("tags:\n- Tech\n- Life\n- rust"));
    }

    #[test]
    fn test_no_taxonomy_block_when_empty() {
        let block = compose(&item(), "post", &HashMap::new()).unwrap();
        // Exactly one YAML mapping between the delimiters.
        assert_eq!(block.matches("---").count(), 2);
    }

    #[test]
    fn test_date_fallback_keeps_item_writable() {
        let mut bad = item();
        bad.date = "yesterday-ish".to_owned();
        let block = compose(&bad, "post", &HashMap::new()).unwrap();
        assert!(block.contains("date:"));
    }
}
