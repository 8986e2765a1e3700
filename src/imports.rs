//! Import Rewriter for the Example Playground
//!
//! Scans the leading block of `import` statements of a snippet and rewrites
//! each one into `const` bindings against an UPPERCASE symbolic name that the
//! sandbox provides (see `registry`).
//!
//! The accepted grammar is deliberately small:
//!
//! ```text
//! import Default from 'path'
//! import { A, B as C } from 'path'
//! import Default, { A } from 'path'
//! ```
//!
//! Anything else inside the block (namespace imports, side-effect imports,
//! module paths whose last segment is not a plain word) becomes a
//! [`ParseSkip`]: the line is dropped from the emitted bindings and the rewrite
//! carries on.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Symbol resolved per snippet from its component path.
pub const COMMON_SYMBOL: &str = "COMMON";
/// Symbol resolved to the single wireframe helper.
pub const WIREFRAME_SYMBOL: &str = "WIREFRAME";

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub default_name: Option<String>,
    pub destructured: Vec<ImportedName>,
    pub module_path: String,
    pub module_key: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedName {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    NamespaceImport,
    SideEffectImport,
    MissingFrom,
    NoBindings,
    UnsupportedModuleKey(String),
    Malformed(String),
}

/// An import statement that did not match the supported shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseSkip {
    pub statement: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportLine {
    Parsed(ImportRecord),
    Skipped(ParseSkip),
}

/// The leading import block of a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBlock {
    pub lines: Vec<ImportLine>,
    /// Byte offset of the first character after the block.
    pub end: usize,
}

/// Output of the rewrite: the `const` bindings plus the symbols they reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewrittenImports {
    pub bindings: String,
    pub symbols: Vec<String>,
    pub skipped: Vec<ParseSkip>,
}

impl ImportBlock {
    pub fn records(&self) -> impl Iterator<Item = &ImportRecord> {
        self.lines.iter().filter_map(|line| match line {
            ImportLine::Parsed(record) => Some(record),
            ImportLine::Skipped(_) => None,
        })
    }

    pub fn references(&self, symbol: &str) -> bool {
        self.records().any(|r| r.symbol == symbol)
    }
}

impl ImportRecord {
    /// `{ A, B: C }` form of the destructured clause, if any.
    pub fn destructured_pattern(&self) -> Option<String> {
        if self.destructured.is_empty() {
            return None;
        }
        let names: Vec<String> = self
            .destructured
            .iter()
            .map(|n| {
                if n.imported == n.local {
                    n.imported.clone()
                } else {
                    format!("{}: {}", n.imported, n.local)
                }
            })
            .collect();
        Some(format!("{{ {} }}", names.join(", ")))
    }

    pub fn to_const_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(default_name) = &self.default_name {
            statements.push(format!("const {} = {};", default_name, self.symbol));
        }
        if let Some(pattern) = self.destructured_pattern() {
            statements.push(format!("const {} = {};", pattern, self.symbol));
        }
        statements
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITE
// ═══════════════════════════════════════════════════════════════════════════════

/// Rewrite the import block of `source` into `const` bindings.
pub fn rewrite_imports(source: &str) -> (ImportBlock, RewrittenImports) {
    let block = scan_import_block(source);
    let rewritten = rewrite_block(&block);
    (block, rewritten)
}

pub fn rewrite_block(block: &ImportBlock) -> RewrittenImports {
    let mut out = RewrittenImports::default();

    for line in &block.lines {
        match line {
            ImportLine::Parsed(record) => {
                for statement in record.to_const_statements() {
                    out.bindings.push_str(&statement);
                    out.bindings.push('\n');
                }
                if !out.symbols.contains(&record.symbol) {
                    out.symbols.push(record.symbol.clone());
                }
            }
            ImportLine::Skipped(skip) => {
                debug!(statement = %skip.statement, reason = ?skip.reason, "Dropping unsupported import");
                out.skipped.push(skip.clone());
            }
        }
    }

    out
}

/// Convert a module key into its sandbox symbol, `semantic-ui-react` → `SEMANTIC_UI_REACT`.
pub fn to_symbol_name(module_key: &str) -> String {
    split_words(module_key)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Split on separators, case changes and letter/digit boundaries.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();

    for chunk in input.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
                let next = chars.get(i + 1).copied();
                let boundary = (prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_alphabetic() && c.is_ascii_digit())
                    || (prev.is_ascii_digit() && c.is_alphabetic())
                    || (prev.is_uppercase()
                        && c.is_uppercase()
                        && next.map(|n| n.is_lowercase()).unwrap_or(false));
                if boundary && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Punct(char),
    Str(String),
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Scanner { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace, line comments and block comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(nl) => self.pos += nl + 1,
                    None => self.pos = self.src.len(),
                }
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(close) => self.pos += close + 4,
                    None => self.pos = self.src.len(),
                }
            } else if let Some(c) = self.peek_char().filter(|c| c.is_whitespace()) {
                self.pos += c.len_utf8();
            } else {
                return;
            }
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(keyword)
            && !rest[keyword.len()..]
                .chars()
                .next()
                .map(is_ident_char)
                .unwrap_or(false)
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        let c = self.peek_char()?;

        if c == '\'' || c == '"' {
            self.bump();
            let mut value = String::new();
            while let Some(ch) = self.bump() {
                if ch == '\\' {
                    if let Some(escaped) = self.bump() {
                        value.push(escaped);
                    }
                    continue;
                }
                if ch == c {
                    return Some(Token::Str(value));
                }
                if ch == '\n' {
                    break;
                }
                value.push(ch);
            }
            return Some(Token::Punct('\0'));
        }

        if is_ident_char(c) {
            let mut word = String::new();
            while let Some(ch) = self.peek_char().filter(|ch| is_ident_char(*ch)) {
                word.push(ch);
                self.bump();
            }
            return Some(Token::Word(word));
        }

        self.bump();
        Some(Token::Punct(c))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(word: &str) -> bool {
    word.chars()
        .next()
        .map(|c| !c.is_ascii_digit())
        .unwrap_or(false)
}

/// Scan the maximal leading run of import statements.
pub fn scan_import_block(source: &str) -> ImportBlock {
    let mut scanner = Scanner::new(source);
    let mut lines = Vec::new();
    let mut end = 0;

    loop {
        scanner.skip_trivia();
        if !scanner.at_keyword("import") {
            break;
        }

        let start = scanner.pos;
        scanner.pos += "import".len();

        // `import(` and `import.meta` are expressions, not declarations
        let mut lookahead = Scanner {
            src: source,
            pos: scanner.pos,
        };
        lookahead.skip_trivia();
        if matches!(lookahead.peek_char(), Some('(') | Some('.')) {
            break;
        }

        let mut tokens = Vec::new();
        let mut terminated = false;
        while let Some(token) = scanner.next_token() {
            let is_specifier = matches!(token, Token::Str(_));
            tokens.push(token);
            if is_specifier {
                terminated = true;
                break;
            }
            if tokens.len() > 256 {
                break;
            }
        }

        // optional trailing semicolon
        let before_semi = scanner.pos;
        scanner.skip_trivia_inline();
        if scanner.peek_char() == Some(';') {
            scanner.bump();
        } else {
            scanner.pos = before_semi;
        }

        let statement = source[start..scanner.pos].trim().to_string();
        if !terminated {
            lines.push(ImportLine::Skipped(ParseSkip {
                statement,
                reason: SkipReason::Malformed("unterminated import statement".to_string()),
            }));
            end = scanner.pos;
            break;
        }

        lines.push(parse_import_tokens(statement, &tokens));
        end = scanner.pos;
    }

    ImportBlock { lines, end }
}

impl<'s> Scanner<'s> {
    /// Skip spaces and tabs without crossing a newline.
    fn skip_trivia_inline(&mut self) {
        while let Some(c) = self.peek_char().filter(|c| *c == ' ' || *c == '\t') {
            self.pos += c.len_utf8();
        }
    }
}

fn parse_import_tokens(statement: String, tokens: &[Token]) -> ImportLine {
    let skip = |reason: SkipReason| {
        ImportLine::Skipped(ParseSkip {
            statement: statement.clone(),
            reason,
        })
    };

    let (module_path, clause) = match tokens.split_last() {
        Some((Token::Str(path), clause)) => (path.clone(), clause),
        _ => return skip(SkipReason::Malformed("missing module specifier".to_string())),
    };

    if clause.is_empty() {
        return skip(SkipReason::SideEffectImport);
    }

    let clause = match clause.split_last() {
        Some((Token::Word(from), rest)) if from == "from" => rest,
        _ => return skip(SkipReason::MissingFrom),
    };

    if clause.iter().any(|t| *t == Token::Punct('*')) {
        return skip(SkipReason::NamespaceImport);
    }

    let mut default_name = None;
    let mut destructured = Vec::new();
    let mut rest = clause;

    if let Some((Token::Word(word), after)) = rest.split_first() {
        if !is_identifier(word) {
            return skip(SkipReason::Malformed(format!("invalid default import `{}`", word)));
        }
        default_name = Some(word.clone());
        rest = after;
        if let Some((Token::Punct(','), after)) = rest.split_first() {
            rest = after;
        }
    }

    if let Some((Token::Punct('{'), after)) = rest.split_first() {
        match parse_named_imports(after) {
            Ok((names, remaining)) => {
                destructured = names;
                rest = remaining;
            }
            Err(reason) => return skip(reason),
        }
    }

    if !rest.is_empty() {
        return skip(SkipReason::Malformed("unexpected tokens in import clause".to_string()));
    }

    if default_name.is_none() && destructured.is_empty() {
        return skip(SkipReason::NoBindings);
    }

    let module_key = module_path
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let valid_key = !module_key.is_empty()
        && module_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_key {
        return skip(SkipReason::UnsupportedModuleKey(module_path));
    }

    let symbol = to_symbol_name(&module_key);
    ImportLine::Parsed(ImportRecord {
        default_name,
        destructured,
        module_path,
        module_key,
        symbol,
    })
}

/// Parse `A, B as C }` (the opening brace already consumed).
fn parse_named_imports(tokens: &[Token]) -> Result<(Vec<ImportedName>, &[Token]), SkipReason> {
    let mut names = Vec::new();
    let mut rest = tokens;

    loop {
        match rest.split_first() {
            Some((Token::Punct('}'), after)) => return Ok((names, after)),
            Some((Token::Word(imported), after)) if is_identifier(imported) => {
                rest = after;
                let mut local = imported.clone();
                if let Some((Token::Word(kw), after)) = rest.split_first() {
                    if kw == "as" {
                        match after.split_first() {
                            Some((Token::Word(alias), after)) if is_identifier(alias) => {
                                local = alias.clone();
                                rest = after;
                            }
                            _ => {
                                return Err(SkipReason::Malformed(
                                    "missing alias after `as`".to_string(),
                                ))
                            }
                        }
                    }
                }
                names.push(ImportedName {
                    imported: imported.clone(),
                    local,
                });
                match rest.split_first() {
                    Some((Token::Punct(','), after)) => rest = after,
                    Some((Token::Punct('}'), _)) => {}
                    _ => {
                        return Err(SkipReason::Malformed(
                            "expected `,` or `}` in import clause".to_string(),
                        ))
                    }
                }
            }
            _ => {
                return Err(SkipReason::Malformed(
                    "unterminated destructured import".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(block: &ImportBlock) -> Vec<&ImportRecord> {
        block.records().collect()
    }

    #[test]
    fn test_symbol_names() {
        assert_eq!(to_symbol_name("faker"), "FAKER");
        assert_eq!(to_symbol_name("semantic-ui-react"), "SEMANTIC_UI_REACT");
        assert_eq!(to_symbol_name("Wireframe"), "WIREFRAME");
        assert_eq!(to_symbol_name("lodash"), "LODASH");
        assert_eq!(to_symbol_name("reactDom"), "REACT_DOM");
        assert_eq!(to_symbol_name("utf8"), "UTF_8");
        assert_eq!(to_symbol_name("XMLHttp"), "XML_HTTP");
    }

    #[test]
    fn test_default_and_destructured() {
        let source = "import React, { Component } from 'react'\nimport { Button, Segment as Seg } from 'semantic-ui-react'\n\nconst x = 1\n";
        let block = scan_import_block(source);
        let records = parsed(&block);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].default_name.as_deref(), Some("React"));
        assert_eq!(records[0].symbol, "REACT");
        assert_eq!(records[1].destructured_pattern().unwrap(), "{ Button, Segment: Seg }");
        assert!(source[block.end..].trim_start().starts_with("const x"));
    }

    #[test]
    fn test_rewrite_emits_in_source_order() {
        let source = "import Foo from 'faker'\nimport Foo from 'lodash'\nimport Bar from 'react'\n";
        let (_, rewritten) = rewrite_imports(source);

        assert_eq!(
            rewritten.bindings,
            "const Foo = FAKER;\nconst Foo = LODASH;\nconst Bar = REACT;\n"
        );
        assert_eq!(rewritten.symbols, vec!["FAKER", "LODASH", "REACT"]);
    }

    #[test]
    fn test_multiline_clause_and_path_segments() {
        let source = "import {\n  Grid,\n  Image,\n} from 'semantic-ui-react'\nimport Wireframe from '../Wireframe'\nimport { Shorthand } from '../../common'";
        let block = scan_import_block(source);
        let records = parsed(&block);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].destructured.len(), 2);
        assert_eq!(records[1].symbol, WIREFRAME_SYMBOL);
        assert_eq!(records[2].symbol, COMMON_SYMBOL);
        assert!(block.references(COMMON_SYMBOL));
    }

    #[test]
    fn test_skips_are_not_fatal() {
        let source = "import * as all from 'lodash'\nimport 'styles.css'\nimport x from './data.json'\nimport React from 'react'\nexport default 1";
        let (block, rewritten) = rewrite_imports(source);

        assert_eq!(block.lines.len(), 4);
        assert_eq!(rewritten.skipped.len(), 3);
        assert_eq!(rewritten.skipped[0].reason, SkipReason::NamespaceImport);
        assert_eq!(rewritten.skipped[1].reason, SkipReason::SideEffectImport);
        assert!(matches!(
            rewritten.skipped[2].reason,
            SkipReason::UnsupportedModuleKey(_)
        ));
        assert_eq!(rewritten.bindings, "const React = REACT;\n");
    }

    #[test]
    fn test_comments_and_semicolons() {
        let source = "// example\nimport React from 'react'; /* ui */\nimport { Button } from \"semantic-ui-react\";\n\nclass A extends React.Component {}";
        let block = scan_import_block(source);

        assert_eq!(parsed(&block).len(), 2);
        assert!(source[block.end..].contains("class A"));
    }

    #[test]
    fn test_dynamic_import_ends_block() {
        let source = "import React from 'react'\nimport('lazy').then(() => {})";
        let block = scan_import_block(source);

        assert_eq!(block.lines.len(), 1);
        assert!(source[block.end..].trim_start().starts_with("import("));
    }

    #[test]
    fn test_import_meta_ends_block() {
        let source = "import _ from 'lodash'\nimport.meta.url\nimport React from 'react'";
        let block = scan_import_block(source);

        assert_eq!(block.lines.len(), 1);
        assert_eq!(source[block.end..].trim_start(), "import.meta.url\nimport React from 'react'");
    }

    #[test]
    fn test_no_imports() {
        let block = scan_import_block("export default 42");
        assert!(block.lines.is_empty());
        assert_eq!(block.end, 0);
    }
}
