//! Pretty Module for the Example Playground
//!
//! Formats static markup for the "show formatted output" view. The markup is
//! parsed with html5ever and re-printed one block per line with a fixed
//! indentation unit. Adjacent tags are split onto separate lines except before
//! `</i>`, `</label>`, `</span>` and `<option>`.

use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, Attribute, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::config::PrettyOptions;
use crate::markup::is_void_element;

/// Elements whose closing tag stays on the line of their last child.
const INLINE_CLOSE: &[&str] = &["i", "label", "span"];
/// Elements whose text is printed verbatim, without escaping.
const RAW_TEXT: &[&str] = &["style", "script"];
const PRESERVE_WHITESPACE: &[&str] = &["pre", "textarea"];

/// Re-indent `markup`; an empty or whitespace-only input stays empty.
///
/// The markup is parsed as a fragment in a `<template>` context, so table
/// sections, rows and cells survive without their `<table>`.
pub fn format_html(markup: &str, options: &PrettyOptions) -> String {
    let context = QualName::new(None, ns!(html), local_name!("template"));
    let dom = parse_fragment(RcDom::default(), Default::default(), context, vec![]).one(markup);

    let mut lines = Vec::new();
    let indent = options.indent_unit();
    // The fragment parser nests everything under a synthetic <html> root.
    for root in dom.document.children.borrow().iter() {
        for child in root.children.borrow().iter() {
            write_node(child, 0, &indent, &mut lines);
        }
    }

    let mut out = lines.join("\n");
    if options.end_with_newline && !out.is_empty() {
        out.push('\n');
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn open_tag(tag: &str, attrs: &[Attribute]) -> String {
    let mut open = format!("<{}", tag);
    for attr in attrs {
        open.push_str(&format!(" {}=\"{}\"", attr.name.local, escape(&attr.value, true)));
    }
    open
}

/// Serialize a subtree on one line, keeping its whitespace as is.
fn write_inline(handle: &Handle, raw: bool, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } if raw => out.push_str(&contents.borrow()),
        NodeData::Text { contents } => out.push_str(&escape(&contents.borrow(), false)),
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            out.push_str(&open_tag(&tag, &attrs.borrow()));
            if is_void_element(&tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            let raw = RAW_TEXT.contains(&tag.as_str());
            for child in handle.children.borrow().iter() {
                write_inline(child, raw, out);
            }
            out.push_str(&format!("</{}>", tag));
        }
        _ => {}
    }
}

fn write_node(handle: &Handle, depth: usize, indent: &str, lines: &mut Vec<String>) {
    let pad = indent.repeat(depth);
    let start = lines.len();
    match &handle.data {
        NodeData::Text { contents } => {
            let text = collapse_whitespace(&contents.borrow());
            if !text.is_empty() {
                lines.push(format!("{}{}", pad, escape(&text, false)));
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            let open = open_tag(&tag, &attrs.borrow());

            if is_void_element(&tag) {
                lines.push(format!("{}{} />", pad, open));
                return;
            }
            if RAW_TEXT.contains(&tag.as_str()) || PRESERVE_WHITESPACE.contains(&tag.as_str()) {
                let mut line = pad;
                write_inline(handle, false, &mut line);
                lines.push(line);
                return;
            }
            let open = format!("{}>", open);

            let children: Vec<Handle> = handle
                .children
                .borrow()
                .iter()
                .filter(|child| match &child.data {
                    NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
                    NodeData::Element { .. } => true,
                    _ => false,
                })
                .cloned()
                .collect();

            match children.as_slice() {
                [] => lines.push(format!("{}{}</{}>", pad, open, tag)),
                [only] if matches!(only.data, NodeData::Text { .. }) => {
                    let text = match &only.data {
                        NodeData::Text { contents } => collapse_whitespace(&contents.borrow()),
                        _ => String::new(),
                    };
                    lines.push(format!("{}{}{}</{}>", pad, open, escape(&text, false), tag));
                }
                _ => {
                    lines.push(format!("{}{}", pad, open));
                    for child in &children {
                        write_node(child, depth + 1, indent, lines);
                    }
                    let close = format!("</{}>", tag);
                    match lines.last_mut() {
                        Some(last) if INLINE_CLOSE.contains(&tag.as_str()) => last.push_str(&close),
                        _ => lines.push(format!("{}{}", pad, close)),
                    }
                }
            }

            // An <option> continues the previous line.
            if tag == "option" && start > 0 && lines.len() > start {
                let first = lines.remove(start);
                lines[start - 1].push_str(first.trim_start());
            }
        }
        _ => {}
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_are_indented() {
        let formatted = format_html(
            "<div class=\"ui segment\"><h2 class=\"ui header\">Title</h2><p>One &amp; two</p></div>",
            &PrettyOptions::default(),
        );
        assert_eq!(
            formatted,
            "<div class=\"ui segment\">\n  <h2 class=\"ui header\">Title</h2>\n  <p>One &amp; two</p>\n</div>"
        );
    }

    #[test]
    fn test_void_and_empty_elements() {
        let formatted = format_html("<div><img src=\"a.png\"/><span></span></div>", &PrettyOptions::default());
        assert_eq!(formatted, "<div>\n  <img src=\"a.png\" />\n  <span></span>\n</div>");
    }

    #[test]
    fn test_indent_options() {
        let options = PrettyOptions {
            indent_size: 1,
            indent_char: '\t',
            end_with_newline: true,
        };
        assert_eq!(format_html("<ul><li>a</li></ul>", &options), "<ul>\n\t<li>a</li>\n</ul>\n");
        assert_eq!(format_html("", &options), "");
    }

    #[test]
    fn test_table_parts_survive_without_table() {
        assert_eq!(
            format_html("<tr><td>a</td><td>b</td></tr>", &PrettyOptions::default()),
            "<tr>\n  <td>a</td>\n  <td>b</td>\n</tr>"
        );
        assert_eq!(
            format_html("<table class=\"ui table\"><tbody><tr><td>a</td></tr></tbody></table>", &PrettyOptions::default()),
            "<table class=\"ui table\">\n  <tbody>\n    <tr>\n      <td>a</td>\n    </tr>\n  </tbody>\n</table>"
        );
    }

    #[test]
    fn test_raw_text_and_preformatted_content_are_kept() {
        assert_eq!(
            format_html("<style>.a > b{}</style><div>x</div>", &PrettyOptions::default()),
            "<style>.a > b{}</style>\n<div>x</div>"
        );
        assert_eq!(
            format_html("<div><pre>  a\n  <b>b</b></pre></div>", &PrettyOptions::default()),
            "<div>\n  <pre>  a\n  <b>b</b></pre>\n</div>"
        );
    }

    #[test]
    fn test_inline_closing_tags_and_options_stay_on_line() {
        assert_eq!(
            format_html("<label><i class=\"icon\"></i>Name</label>", &PrettyOptions::default()),
            "<label>\n  <i class=\"icon\"></i>\n  Name</label>"
        );
        assert_eq!(
            format_html("<select><option>a</option><option>b</option></select>", &PrettyOptions::default()),
            "<select><option>a</option><option>b</option>\n</select>"
        );
    }
}
