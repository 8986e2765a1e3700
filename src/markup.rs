//! Markup Module for the Example Playground
//!
//! The owned, fully mounted element tree that outlives a pipeline run, and its
//! static markup serialization (no hydration markers, void elements closed
//! with `/>`).

use serde::{Deserialize, Serialize};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element {
        tag: String,
        /// In prop order; `None` renders as an empty boolean attribute.
        attributes: Vec<(String, Option<String>)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    /// Trusted HTML from `dangerouslySetInnerHTML`.
    Raw {
        html: String,
    },
    Fragment {
        children: Vec<Node>,
    },
}

impl Node {
    pub fn element(tag: impl Into<String>, attributes: Vec<(String, Option<String>)>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn empty() -> Self {
        Node::Fragment { children: vec![] }
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text } => out.push_str(text),
            Node::Raw { .. } => {}
            Node::Element { children, .. } | Node::Fragment { children } => {
                children.iter().for_each(|c| c.collect_text(out))
            }
        }
    }
}

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serialize a mounted tree to static markup.
pub fn render_to_static_markup(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text { text } => out.push_str(&escape_text(text)),
        Node::Raw { html } => out.push_str(html),
        Node::Fragment { children } => children.iter().for_each(|c| write_node(c, out)),
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                if let Some(value) = value {
                    out.push_str(&escape_text(value));
                }
                out.push('"');
            }
            if is_void_element(tag) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            children.iter().for_each(|c| write_node(c, out));
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` for both text and attribute values.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> (String, Option<String>) {
        (name.to_string(), Some(value.to_string()))
    }

    #[test]
    fn test_empty_div() {
        assert_eq!(render_to_static_markup(&Node::element("div", vec![], vec![])), "<div></div>");
    }

    #[test]
    fn test_attributes_and_escaping() {
        let node = Node::element(
            "a",
            vec![attr("href", "/x?a=1&b=2"), ("download".to_string(), None)],
            vec![Node::text("<Tom & \"Jerry\">")],
        );
        assert_eq!(
            render_to_static_markup(&node),
            "<a href=\"/x?a=1&amp;b=2\" download=\"\">&lt;Tom &amp; &quot;Jerry&quot;&gt;</a>"
        );
    }

    #[test]
    fn test_void_and_fragments() {
        let node = Node::Fragment {
            children: vec![
                Node::element("img", vec![attr("src", "a.png")], vec![]),
                Node::text("a"),
                Node::text("b"),
                Node::Raw {
                    html: "<b>raw</b>".to_string(),
                },
            ],
        };
        assert_eq!(render_to_static_markup(&node), "<img src=\"a.png\"/>ab<b>raw</b>");
        assert_eq!(node.text_content(), "ab");
    }

    #[test]
    fn test_node_serializes_tagged() {
        let json = serde_json::to_string(&Node::text("hi")).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"hi"}"#);
    }
}
