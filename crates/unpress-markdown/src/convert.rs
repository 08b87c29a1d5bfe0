//! HTML to Markdown rendering.

use scraper::{ElementRef, Html, Node};

use crate::ConvertError;

/// Conversion aborts past this element nesting depth.
const MAX_DEPTH: usize = 128;

/// Convert an HTML fragment to Markdown.
pub(crate) fn html_to_markdown(html: &str) -> Result<String, ConvertError> {
    let fragment = Html::parse_fragment(html);
    let markdown = render_children(fragment.root_element(), 0)?;
    Ok(clean_markdown(&markdown))
}

/// Render all children of an element, concatenated.
fn render_children(element: ElementRef<'_>, depth: usize) -> Result<String, ConvertError> {
    if depth > MAX_DEPTH {
        return Err(ConvertError::NestingTooDeep(MAX_DEPTH));
    }

    let mut result = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => result.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    result.push_str(&render_element(child_element, depth + 1)?);
                }
            }
            _ => {}
        }
    }
    Ok(result)
}

/// Render a single element to Markdown.
fn render_element(element: ElementRef<'_>, depth: usize) -> Result<String, ConvertError> {
    let tag = element.value().name();

    let rendered = match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let text = render_children(element, depth)?;
            format!("\n{} {}\n\n", "#".repeat(level), text.trim())
        }

        "p" => {
            let text = render_children(element, depth)?;
            let text = text.trim();
            if text.is_empty() {
                String::new()
            } else {
                format!("{text}\n\n")
            }
        }

        "strong" | "b" => format!("**{}**", render_children(element, depth)?.trim()),
        "em" | "i" => format!("_{}_", render_children(element, depth)?.trim()),
        "s" | "del" => format!("~~{}~~", render_children(element, depth)?.trim()),
        "code" => format!("`{}`", text_content(element)),

        "a" => {
            let text = render_children(element, depth)?;
            let href = element.value().attr("href").unwrap_or("");
            format!("[{}]({href})", text.trim())
        }

        "img" => {
            let src = element.value().attr("src").unwrap_or("");
            let alt = element.value().attr("alt").unwrap_or("");
            format!("![{alt}]({src})")
        }

        "br" => "\n".to_owned(),
        "hr" => "\n---\n\n".to_owned(),

        "pre" => {
            let code = text_content(element);
            format!("\n```\n{}\n```\n\n", code.trim())
        }

        "ul" => render_list(element, depth, None)?,
        "ol" => render_list(element, depth, Some(1))?,

        "blockquote" => {
            let inner = render_children(element, depth)?;
            let quoted = inner
                .trim()
                .lines()
                .map(|line| format!("> {line}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n{quoted}\n\n")
        }

        "table" => render_table(element, depth)?,

        // Structural wrappers contribute only their content
        _ => render_children(element, depth)?,
    };

    Ok(rendered)
}

/// Render `<ul>`/`<ol>` items. `start` is `Some` for ordered lists.
fn render_list(
    element: ElementRef<'_>,
    depth: usize,
    start: Option<usize>,
) -> Result<String, ConvertError> {
    let mut result = String::from("\n");
    let mut index = start.unwrap_or(0);

    for item in element.child_elements() {
        if item.value().name() != "li" {
            continue;
        }
        let text = render_children(item, depth)?;
        match start {
            Some(_) => {
                result.push_str(&format!("{index}. {}\n", text.trim()));
                index += 1;
            }
            None => result.push_str(&format!("- {}\n", text.trim())),
        }
    }
    result.push('\n');
    Ok(result)
}

/// Render a table as a Markdown pipe table, first row as header.
fn render_table(element: ElementRef<'_>, depth: usize) -> Result<String, ConvertError> {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for descendant in element.descendent_elements() {
        if descendant.value().name() != "tr" {
            continue;
        }
        let mut cells = Vec::new();
        for cell in descendant.child_elements() {
            match cell.value().name() {
                "td" | "th" => {
                    let text = render_children(cell, depth)?;
                    cells.push(text.trim().replace('\n', " "));
                }
                _ => {}
            }
        }
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        return Ok(String::new());
    }

    let mut result = String::from("\n");
    for (i, row) in rows.iter().enumerate() {
        result.push_str(&format!("| {} |\n", row.join(" | ")));
        if i == 0 {
            result.push_str(&format!("|{}\n", " --- |".repeat(row.len())));
        }
    }
    result.push('\n');
    Ok(result)
}

/// Concatenated text content of an element's subtree.
fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Collapse runs of blank lines and normalize the trailing newline.
fn clean_markdown(markdown: &str) -> String {
    let mut result = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            result.push('\n');
        } else {
            blank_run = 0;
            result.push_str(line.trim_end());
            result.push('\n');
        }
    }

    let trimmed = result.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_headings() {
        let md = html_to_markdown("<h1>Top</h1><h3>Deep</h3>").unwrap();
        assert_eq!(md, "# Top\n\n### Deep\n");
    }

    #[test]
    fn test_paragraphs_and_emphasis() {
        let md = html_to_markdown("<p>Hello <strong>bold</strong> and <em>italic</em>.</p>").unwrap();
        assert_eq!(md, "Hello **bold** and _italic_.\n");
    }

    #[test]
    fn test_nested_inline_markup() {
        let md = html_to_markdown("<p><strong>very <em>nested</em></strong></p>").unwrap();
        assert_eq!(md, "**very _nested_**\n");
    }

    #[test]
    fn test_links_and_images() {
        let md = html_to_markdown(
            r#"<p><a href="https://example.com/">a link</a> <img src="/pic.png" alt="pic"></p>"#,
        )
        .unwrap();
        assert_eq!(md, "[a link](https://example.com/) ![pic](/pic.png)\n");
    }

    #[test]
    fn test_unordered_list() {
        let md = html_to_markdown("<ul><li>one</li><li>two</li></ul>").unwrap();
        assert_eq!(md, "- one\n- two\n");
    }

    #[test]
    fn test_ordered_list() {
        let md = html_to_markdown("<ol><li>first</li><li>second</li></ol>").unwrap();
        assert_eq!(md, "1. first\n2. second\n");
    }

    #[test]
    fn test_code_block() {
        let md = html_to_markdown("<pre>let x = 1;\nlet y = 2;</pre>").unwrap();
        assert_eq!(md, "```\nlet x = 1;\nlet y = 2;\n```\n");
    }

    #[test]
    fn test_inline_code() {
        let md = html_to_markdown("<p>call <code>foo()</code> here</p>").unwrap();
        assert_eq!(md, "call `foo()` here\n");
    }

    #[test]
    fn test_blockquote() {
        let md = html_to_markdown("<blockquote>line one\nline two</blockquote>").unwrap();
        assert_eq!(md, "> line one\n> line two\n");
    }

    #[test]
    fn test_table() {
        let md = html_to_markdown(
            "<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap();
        assert_eq!(md, "| a | b |\n| --- | --- |\n| 1 | 2 |\n");
    }

    #[test]
    fn test_unknown_wrapper_elements_pass_content_through() {
        let md = html_to_markdown("<div><section><p>inner</p></section></div>").unwrap();
        assert_eq!(md, "inner\n");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let md = html_to_markdown("<p>one</p><p></p><p>two</p>").unwrap();
        assert_eq!(md, "one\n\ntwo\n");
    }

    #[test]
    fn test_plain_text_survives() {
        let md = html_to_markdown("just text, no tags").unwrap();
        assert_eq!(md, "just text, no tags\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_markdown("").unwrap(), "");
    }

    #[test]
    fn test_nesting_limit() {
        let html = format!("{}x{}", "<div>".repeat(200), "</div>".repeat(200));
        let err = html_to_markdown(&html).unwrap_err();
        assert!(matches!(err, ConvertError::NestingTooDeep(_)));
    }
}
