//! Body Extractor for the Example Playground
//!
//! Takes what follows the import block, keeps the statements from the first
//! top-level `export default`, `const` or `class X extends` onwards, and strips
//! the `export default` marker while remembering what was exported.

use serde::{Deserialize, Serialize};

/// Binding introduced for `export default <anonymous expression>`.
pub const ANONYMOUS_EXPORT: &str = "__defaultExport";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum DefaultExport {
    /// `export default Foo` or `export default class Foo`.
    Named(String),
    /// `export default () => ...`, `export default class extends ...`.
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody {
    pub body: String,
    pub default_export: Option<DefaultExport>,
}

impl ExtractedBody {
    /// Name the sandbox returns, if an export was found.
    pub fn export_name(&self) -> Option<&str> {
        match &self.default_export {
            Some(DefaultExport::Named(name)) => Some(name),
            Some(DefaultExport::Anonymous) => Some(ANONYMOUS_EXPORT),
            None => None,
        }
    }
}

/// Extract the body from the text that follows the import block.
pub fn extract_body(remainder: &str) -> ExtractedBody {
    let starts = top_level_statement_starts(remainder);

    let body_start = starts.iter().copied().find(|&pos| {
        let rest = &remainder[pos..];
        starts_with_export_default(rest).is_some()
            || starts_with_keyword(rest, "const")
            || is_class_extends(rest)
    });

    let Some(body_start) = body_start else {
        return ExtractedBody {
            body: String::new(),
            default_export: None,
        };
    };

    let body = &remainder[body_start..];
    let export_pos = top_level_statement_starts(body)
        .into_iter()
        .find(|&pos| starts_with_export_default(&body[pos..]).is_some());

    let Some(export_pos) = export_pos else {
        return ExtractedBody {
            body: body.to_string(),
            default_export: None,
        };
    };

    let marker_len = starts_with_export_default(&body[export_pos..]).unwrap_or(0);
    let after_marker = export_pos + marker_len;
    let (replacement, consumed, default_export) = strip_export(&body[after_marker..]);

    let mut out = String::with_capacity(body.len() + ANONYMOUS_EXPORT.len());
    out.push_str(&body[..export_pos]);
    out.push_str(&replacement);
    out.push_str(&body[after_marker + consumed..]);

    ExtractedBody {
        body: out,
        default_export,
    }
}

/// Decide what replaces `export default ` and how much of `rest` it swallows.
fn strip_export(rest: &str) -> (String, usize, Option<DefaultExport>) {
    let anonymous = (
        format!("const {} = ", ANONYMOUS_EXPORT),
        0,
        Some(DefaultExport::Anonymous),
    );

    if rest.trim().is_empty() {
        return (String::new(), 0, None);
    }

    for keyword in ["class", "function"] {
        if starts_with_keyword(rest, keyword) {
            let after = rest[keyword.len()..].trim_start();
            let after = after.strip_prefix('*').unwrap_or(after).trim_start();
            return match leading_word(after) {
                Some(name) if name != "extends" && !name.starts_with(|c: char| c.is_ascii_digit()) => {
                    (String::new(), 0, Some(DefaultExport::Named(name.to_string())))
                }
                _ => anonymous,
            };
        }
    }

    let Some(word) = leading_word(rest) else {
        return anonymous;
    };

    let after_word = &rest[word.len()..];
    let line_rest = after_word.split('\n').next().unwrap_or_default().trim();
    let line_rest = line_rest.strip_prefix(';').unwrap_or(line_rest).trim();
    let ends_statement = line_rest.is_empty() || line_rest.starts_with("//");

    if ends_statement && !is_reserved_expression_word(word) {
        (String::new(), word.len(), Some(DefaultExport::Named(word.to_string())))
    } else {
        anonymous
    }
}

fn is_reserved_expression_word(word: &str) -> bool {
    matches!(word, "async" | "new" | "typeof" | "void" | "await")
}

fn leading_word(s: &str) -> Option<&str> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(&s[..end])
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    s.starts_with(keyword)
        && !s[keyword.len()..]
            .chars()
            .next()
            .map(|c| c.is_alphanumeric() || c == '_' || c == '$')
            .unwrap_or(false)
}

/// Length of an `export default` marker including trailing whitespace.
fn starts_with_export_default(s: &str) -> Option<usize> {
    if !starts_with_keyword(s, "export") {
        return None;
    }
    let after_export = &s["export".len()..];
    let trimmed = after_export.trim_start();
    if trimmed.len() == after_export.len() || !starts_with_keyword(trimmed, "default") {
        return None;
    }
    let after_default = &trimmed["default".len()..];
    let ws = after_default.len() - after_default.trim_start().len();
    Some(s.len() - after_default.len() + ws)
}

fn is_class_extends(s: &str) -> bool {
    if !starts_with_keyword(s, "class") {
        return false;
    }
    let after = s["class".len()..].trim_start();
    match leading_word(after) {
        Some(name) => starts_with_keyword(after[name.len()..].trim_start(), "extends"),
        None => false,
    }
}

/// Byte offsets where top-level statements may begin.
///
/// Brackets are balanced, strings and comments skipped. Quoted strings stop at
/// a newline so apostrophes in JSX text do not swallow the rest of the file.
pub fn top_level_statement_starts(src: &str) -> Vec<usize> {
    let bytes = src.as_bytes();
    let mut starts = Vec::new();
    let mut depth: i32 = 0;
    let mut at_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if at_start {
            if b.is_ascii_whitespace() {
                i += 1;
                continue;
            }
            if !(src[i..].starts_with("//") || src[i..].starts_with("/*")) {
                starts.push(i);
                at_start = false;
            }
        }

        match b {
            b'/' if src[i..].starts_with("//") => {
                i = src[i..].find('\n').map(|nl| i + nl).unwrap_or(bytes.len());
                continue;
            }
            b'/' if src[i..].starts_with("/*") => {
                i = src[i + 2..]
                    .find("*/")
                    .map(|close| i + 2 + close + 2)
                    .unwrap_or(bytes.len());
                continue;
            }
            b'\'' | b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'\n' {
                    continue;
                }
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = (depth - 1).max(0),
            b';' | b'\n' if depth == 0 => at_start = true,
            _ => {}
        }
        i += 1;
    }

    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_export_followed_by_statements() {
        let src = "class Foo extends React.Component {}\n\nexport default Foo;\nconst after = 1\n";
        let extracted = extract_body(src);

        assert_eq!(extracted.export_name(), Some("Foo"));
        assert!(!extracted.body.contains("export default"));
        assert!(extracted.body.contains("const after = 1"));
    }

    #[test]
    fn test_export_default_class() {
        let src = "export default class ButtonExample extends Component {\n  render() { return null }\n}\n";
        let extracted = extract_body(src);

        assert_eq!(extracted.export_name(), Some("ButtonExample"));
        assert!(extracted.body.starts_with("class ButtonExample extends Component"));
    }

    #[test]
    fn test_export_default_arrow_is_anonymous() {
        let src = "const ButtonExample = () => <Button />\n\nexport default () => <ButtonExample />\n";
        let extracted = extract_body(src);

        assert_eq!(extracted.default_export, Some(DefaultExport::Anonymous));
        assert!(extracted
            .body
            .contains("const __defaultExport = () => <ButtonExample />"));
    }

    #[test]
    fn test_export_default_call_is_anonymous() {
        let src = "const Foo = () => null\nexport default withWrapper(Foo)\n";
        let extracted = extract_body(src);

        assert_eq!(extracted.default_export, Some(DefaultExport::Anonymous));
        assert!(extracted.body.contains("const __defaultExport = withWrapper(Foo)"));
    }

    #[test]
    fn test_export_default_number() {
        let extracted = extract_body("export default 42");
        assert_eq!(extracted.export_name(), Some("42"));
        assert_eq!(extracted.body.trim(), "");
    }

    #[test]
    fn test_anonymous_class() {
        let extracted = extract_body("export default class extends Base {}\n");
        assert_eq!(extracted.export_name(), Some(ANONYMOUS_EXPORT));
        assert!(extracted.body.starts_with("const __defaultExport = class extends Base"));
    }

    #[test]
    fn test_missing_export() {
        let extracted = extract_body("const x = 1\n");
        assert_eq!(extracted.default_export, None);
        assert_eq!(extracted.export_name(), None);
    }

    #[test]
    fn test_leading_statements_before_body_are_dropped() {
        let src = "ignored()\nconst Kept = () => <div />\nexport default Kept\n";
        let extracted = extract_body(src);
        assert!(extracted.body.starts_with("const Kept"));
    }

    #[test]
    fn test_nested_export_text_is_ignored() {
        let src = "const text = {\n  export: 'default'\n}\nexport default Text\n";
        let starts = top_level_statement_starts(src);
        assert_eq!(starts.len(), 2);
        assert_eq!(extract_body(src).export_name(), Some("Text"));
    }

    #[test]
    fn test_apostrophe_in_jsx_text() {
        let src = "const A = () => (\n  <p>Don't stop</p>\n)\nexport default A\n";
        assert_eq!(extract_body(src).export_name(), Some("A"));
    }
}
