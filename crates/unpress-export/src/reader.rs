//! WXR document parsing.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use tracing::debug;

use unpress_config::{BodyConfig, TaxonomiesConfig};

use crate::error::ExportError;
use crate::fields::{self, FIELDS, SENTINEL};
use crate::item::{BlogHeader, Export, Item};

/// Reads WXR export documents with the configured filters applied.
#[derive(Debug)]
pub struct ExportReader {
    taxonomy_filter: HashSet<String>,
    entry_filter: HashMap<String, String>,
    body_rules: Vec<(Regex, String)>,
}

/// Raw per-item capture: first occurrence of each field tag, categories in
/// document order.
#[derive(Default)]
struct RawItem {
    fields: HashMap<String, String>,
    categories: Vec<(String, String)>,
}

/// Channel header fields captured outside items.
#[derive(Clone, Copy)]
enum ChannelField {
    Title,
    Link,
    Description,
}

/// Text capture target while inside an element.
enum CaptureTarget {
    Channel(ChannelField),
    Field(String),
    Category { domain: String },
}

/// An in-progress text capture, finalized at the matching end tag.
struct Capture {
    target: CaptureTarget,
    depth: usize,
    text: String,
}

impl ExportReader {
    /// Create a reader with the given taxonomy filters and body rules.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Pattern`] if a substitution pattern does not
    /// compile.
    pub fn new(taxonomies: &TaxonomiesConfig, body: &BodyConfig) -> Result<Self, ExportError> {
        let body_rules = body
            .replace
            .iter()
            .map(|rule| Ok((Regex::new(&rule.pattern)?, rule.replacement.clone())))
            .collect::<Result<Vec<_>, ExportError>>()?;

        Ok(Self {
            taxonomy_filter: taxonomies.filter.iter().cloned().collect(),
            entry_filter: taxonomies.entry_filter.clone(),
            body_rules,
        })
    }

    /// Read one export file.
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable files or malformed XML; both are
    /// fatal for this file only.
    pub fn read_file(&self, path: &Path) -> Result<Export, ExportError> {
        let content = std::fs::read_to_string(path)?;
        self.read_str(&content)
    }

    /// Parse one export document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xml`] for malformed XML.
    pub fn read_str(&self, xml: &str) -> Result<Export, ExportError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut capture: Option<Capture> = None;
        let mut current: Option<RawItem> = None;

        let mut header_title: Option<String> = None;
        let mut header_link: Option<String> = None;
        let mut header_description: Option<String> = None;
        let mut items = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let tag = decode_name(&reader, e.name().as_ref());
                    path.push(tag.clone());

                    if current.is_none() && tag == "item" && parent_is(&path, "channel") {
                        current = Some(RawItem::default());
                    } else if capture.is_none() {
                        capture = self.capture_for(&reader, &e, &tag, &path, current.as_ref())?;
                    }
                }
                // An empty element carries no text; field resolution treats
                // it the same as a missing element.
                Event::Empty(_) => {}
                Event::Text(e) => {
                    if let Some(cap) = capture.as_mut() {
                        cap.text.push_str(&reader.decoder().decode(&e)?);
                    }
                }
                Event::CData(e) => {
                    if let Some(cap) = capture.as_mut() {
                        cap.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(cap) = capture.as_mut() {
                        let entity = reader.decoder().decode(&e)?.into_owned();
                        cap.text.push_str(&decode_entity(&entity));
                    }
                }
                Event::End(_) => {
                    if let Some(cap) = capture.take_if(|cap| cap.depth == path.len()) {
                        finalize_capture(
                            cap,
                            current.as_mut(),
                            &mut header_title,
                            &mut header_link,
                            &mut header_description,
                        );
                    }
                    let ended = path.pop();
                    if ended.as_deref() == Some("item")
                        && let Some(raw) = current.take()
                    {
                        items.push(self.build_item(raw));
                    }
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }

        debug!(items = items.len(), "parsed export document");

        Ok(Export {
            header: BlogHeader {
                title: header_title.unwrap_or_else(|| SENTINEL.to_owned()),
                link: header_link.unwrap_or_else(|| SENTINEL.to_owned()),
                description: header_description.unwrap_or_else(|| SENTINEL.to_owned()),
            },
            items,
        })
    }

    /// Decide whether the just-opened element starts a text capture.
    fn capture_for<R: BufRead>(
        &self,
        reader: &Reader<R>,
        e: &BytesStart<'_>,
        tag: &str,
        path: &[String],
        current: Option<&RawItem>,
    ) -> Result<Option<Capture>, ExportError> {
        let depth = path.len();

        if let Some(raw) = current {
            if !parent_is(path, "item") {
                return Ok(None);
            }
            if tag == "category" {
                // Category elements count only with a domain attribute.
                if let Some(domain) = attribute(reader, e, "domain")? {
                    return Ok(Some(Capture {
                        target: CaptureTarget::Category { domain },
                        depth,
                        text: String::new(),
                    }));
                }
            } else if fields::is_field_tag(tag) && !raw.fields.contains_key(tag) {
                return Ok(Some(Capture {
                    target: CaptureTarget::Field(tag.to_owned()),
                    depth,
                    text: String::new(),
                }));
            }
            return Ok(None);
        }

        if parent_is(path, "channel") {
            let field = match tag {
                "title" => Some(ChannelField::Title),
                "link" => Some(ChannelField::Link),
                "description" => Some(ChannelField::Description),
                _ => None,
            };
            return Ok(field.map(|field| Capture {
                target: CaptureTarget::Channel(field),
                depth,
                text: String::new(),
            }));
        }

        Ok(None)
    }

    /// Assemble an [`Item`] from its raw captures.
    fn build_item(&self, raw: RawItem) -> Item {
        let mut resolved: HashMap<&'static str, String> = FIELDS
            .iter()
            .map(|spec| (spec.name, fields::resolve(&raw.fields, spec)))
            .collect();

        let mut body = resolved.remove("body").unwrap_or_default();
        for (pattern, replacement) in &self.body_rules {
            body = pattern.replace_all(&body, replacement.as_str()).into_owned();
        }

        let image_sources = unpress_markdown::image_sources(&body);

        let mut taxonomies: Vec<(String, Vec<String>)> = Vec::new();
        for (domain, value) in raw.categories {
            if self.taxonomy_filter.contains(&domain) {
                continue;
            }
            if self.entry_filter.get(&domain) == Some(&value) {
                continue;
            }
            match taxonomies.iter_mut().find(|(d, _)| *d == domain) {
                Some((_, values)) => values.push(value),
                None => taxonomies.push((domain, vec![value])),
            }
        }

        let comments_enabled = resolved.get("comments").is_some_and(|v| v == "open");

        let mut take = |name: &str| resolved.remove(name).unwrap_or_default();

        Item {
            wp_id: take("wp_id"),
            title: take("title"),
            link: take("link"),
            author: take("author"),
            date: take("date"),
            slug: take("slug"),
            status: take("status"),
            post_type: take("type"),
            parent: take("parent"),
            comments_enabled,
            body,
            excerpt: take("excerpt"),
            image_sources,
            taxonomies,
        }
    }
}

/// Apply a finished capture to the header or the current item.
fn finalize_capture(
    cap: Capture,
    current: Option<&mut RawItem>,
    header_title: &mut Option<String>,
    header_link: &mut Option<String>,
    header_description: &mut Option<String>,
) {
    let text = cap.text.trim().to_owned();
    match cap.target {
        CaptureTarget::Channel(field) => {
            let slot = match field {
                ChannelField::Title => header_title,
                ChannelField::Link => header_link,
                ChannelField::Description => header_description,
            };
            if slot.is_none() {
                *slot = Some(text);
            }
        }
        CaptureTarget::Field(tag) => {
            if let Some(raw) = current {
                raw.fields.entry(tag).or_insert(text);
            }
        }
        CaptureTarget::Category { domain } => {
            if let Some(raw) = current
                && !text.is_empty()
            {
                raw.categories.push((domain, text));
            }
        }
    }
}

/// True when the element at the top of `path` is a direct child of `parent`.
fn parent_is(path: &[String], parent: &str) -> bool {
    path.len() >= 2 && path[path.len() - 2] == parent
}

/// Decode a qualified element or attribute name.
fn decode_name<R: BufRead>(reader: &Reader<R>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

/// Look up one attribute by name.
fn attribute<R: BufRead>(
    reader: &Reader<R>,
    e: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, ExportError> {
    for attr in e.attributes() {
        let attr = attr?;
        if decode_name(reader, attr.key.as_ref()) == name {
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - preserve as-is
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use unpress_config::BodyReplace;

    use super::*;

    fn default_reader() -> ExportReader {
        ExportReader::new(&TaxonomiesConfig::default(), &BodyConfig::default()).unwrap()
    }

    fn wrap_channel(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
<title>A Blog</title>
<link>https://blog.example.com</link>
<description>Notes</description>
{inner}
</channel>
</rss>"#
        )
    }

    const POST_ITEM: &str = r#"<item>
<title>Hello World</title>
<link>https://blog.example.com/?p=5</link>
<dc:creator>alice</dc:creator>
<content:encoded><![CDATA[<p>First <strong>post</strong></p><img src="/img/a.png">]]></content:encoded>
<excerpt:encoded><![CDATA[]]></excerpt:encoded>
<wp:post_id>5</wp:post_id>
<wp:post_date_gmt>2020-01-01 10:00:00</wp:post_date_gmt>
<wp:comment_status>open</wp:comment_status>
<wp:post_name>hello-world</wp:post_name>
<wp:status>publish</wp:status>
<wp:post_parent>0</wp:post_parent>
<wp:post_type>post</wp:post_type>
<category domain="category"><![CDATA[Tech]]></category>
<category domain="post_tag"><![CDATA[rust]]></category>
<category domain="post_tag"><![CDATA[blogging]]></category>
<category><![CDATA[Uncategorized]]></category>
</item>"#;

    #[test]
    fn test_header_fields() {
        let export = default_reader().read_str(&wrap_channel("")).unwrap();
        assert_eq!(export.header.title, "A Blog");
        assert_eq!(export.header.link, "https://blog.example.com");
        assert_eq!(export.header.description, "Notes");
        assert!(export.items.is_empty());
    }

    #[test]
    fn test_missing_header_fields_yield_sentinel() {
        let xml = "<rss><channel><title>Only Title</title></channel></rss>";
        let export = default_reader().read_str(xml).unwrap();
        assert_eq!(export.header.title, "Only Title");
        assert_eq!(export.header.link, SENTINEL);
        assert_eq!(export.header.description, SENTINEL);
    }

    #[test]
    fn test_item_title_does_not_clobber_header() {
        let export = default_reader().read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert_eq!(export.header.title, "A Blog");
        assert_eq!(export.items[0].title, "Hello World");
    }

    #[test]
    fn test_item_fields() {
        let export = default_reader().read_str(&wrap_channel(POST_ITEM)).unwrap();
        let item = &export.items[0];
        assert_eq!(item.wp_id, "5");
        assert_eq!(item.author, "alice");
        assert_eq!(item.date, "2020-01-01 10:00:00");
        assert_eq!(item.slug, "hello-world");
        assert_eq!(item.status, "publish");
        assert_eq!(item.post_type, "post");
        assert_eq!(item.parent, "0");
        assert!(item.comments_enabled);
        assert_eq!(item.excerpt, "");
        assert_eq!(item.body, r#"<p>First <strong>post</strong></p><img src="/img/a.png">"#);
    }

    #[test]
    fn test_missing_item_fields() {
        let export = default_reader()
            .read_str(&wrap_channel("<item><wp:post_id>9</wp:post_id></item>"))
            .unwrap();
        let item = &export.items[0];
        assert_eq!(item.title, SENTINEL);
        assert_eq!(item.body, SENTINEL);
        assert_eq!(item.slug, "");
        assert_eq!(item.excerpt, "");
        assert!(!item.comments_enabled);
    }

    #[test]
    fn test_image_sources_in_document_order() {
        let export = default_reader().read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert_eq!(export.items[0].image_sources, vec!["/img/a.png"]);
    }

    #[test]
    fn test_categories_without_domain_are_dropped() {
        let export = default_reader().read_str(&wrap_channel(POST_ITEM)).unwrap();
        let taxonomies = &export.items[0].taxonomies;
        assert_eq!(
            taxonomies,
            &vec![
                ("category".to_owned(), vec!["Tech".to_owned()]),
                (
                    "post_tag".to_owned(),
                    vec!["rust".to_owned(), "blogging".to_owned()]
                ),
            ]
        );
    }

    #[test]
    fn test_taxonomy_domain_filter() {
        let taxonomies = TaxonomiesConfig {
            filter: vec!["post_tag".to_owned()],
            ..TaxonomiesConfig::default()
        };
        let reader = ExportReader::new(&taxonomies, &BodyConfig::default()).unwrap();
        let export = reader.read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert_eq!(
            export.items[0].taxonomies,
            vec![("category".to_owned(), vec!["Tech".to_owned()])]
        );
    }

    #[test]
    fn test_taxonomy_entry_filter() {
        let mut taxonomies = TaxonomiesConfig::default();
        taxonomies
            .entry_filter
            .insert("post_tag".to_owned(), "rust".to_owned());
        let reader = ExportReader::new(&taxonomies, &BodyConfig::default()).unwrap();
        let export = reader.read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert_eq!(
            export.items[0].taxonomies,
            vec![
                ("category".to_owned(), vec!["Tech".to_owned()]),
                ("post_tag".to_owned(), vec!["blogging".to_owned()]),
            ]
        );
    }

    #[test]
    fn test_body_substitutions_applied_in_order() {
        let body = BodyConfig {
            replace: vec![
                BodyReplace {
                    pattern: "First".to_owned(),
                    replacement: "Second".to_owned(),
                },
                BodyReplace {
                    pattern: "Second".to_owned(),
                    replacement: "Third".to_owned(),
                },
            ],
        };
        let reader = ExportReader::new(&TaxonomiesConfig::default(), &body).unwrap();
        let export = reader.read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert!(export.items[0].body.contains("Third"));
        assert!(!export.items[0].body.contains("First"));
        assert!(!export.items[0].body.contains("Second"));
    }

    #[test]
    fn test_body_substitution_is_regex() {
        let body = BodyConfig {
            replace: vec![BodyReplace {
                pattern: r"<img[^>]*>".to_owned(),
                replacement: String::new(),
            }],
        };
        let reader = ExportReader::new(&TaxonomiesConfig::default(), &body).unwrap();
        let export = reader.read_str(&wrap_channel(POST_ITEM)).unwrap();
        assert!(!export.items[0].body.contains("<img"));
        assert!(export.items[0].image_sources.is_empty());
    }

    #[test]
    fn test_bad_substitution_pattern_rejected() {
        let body = BodyConfig {
            replace: vec![BodyReplace {
                pattern: "[unclosed".to_owned(),
                replacement: String::new(),
            }],
        };
        let err = ExportReader::new(&TaxonomiesConfig::default(), &body).unwrap_err();
        assert!(matches!(err, ExportError::Pattern(_)));
    }

    #[test]
    fn test_entity_references_in_text() {
        let export = default_reader()
            .read_str(&wrap_channel(
                "<item><title>Fish &amp; Chips &#233;</title></item>",
            ))
            .unwrap();
        assert_eq!(export.items[0].title, "Fish & Chips é");
    }

    #[test]
    fn test_source_order_preserved() {
        let inner = format!(
            "{POST_ITEM}<item><title>Later</title><wp:post_id>6</wp:post_id></item>"
        );
        let export = default_reader().read_str(&wrap_channel(&inner)).unwrap();
        assert_eq!(export.items.len(), 2);
        assert_eq!(export.items[0].wp_id, "5");
        assert_eq!(export.items[1].title, "Later");
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        let err = default_reader()
            .read_str("<rss><channel><item></wrong></channel></rss>")
            .unwrap_err();
        assert!(matches!(err, ExportError::Xml(_)));
    }
}
