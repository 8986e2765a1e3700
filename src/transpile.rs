//! Transpile Module for the Example Playground
//!
//! Parses the assembled program with JSX and decorators enabled, lowers every
//! JSX element and fragment into pragma calls and prints the result.
//!
//! ```text
//! <Button primary>Hi</Button>   →   __jsx(Button, { primary: true }, "Hi")
//! <>a</>                        →   __jsx(__jsxFragment, null, "a")
//! ```

use lazy_static::lazy_static;
use oxc_allocator::{Allocator, Box as oxc_box, CloneIn};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::walk_expression;
use oxc_ast_visit::VisitMut;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::{SourceType, SPAN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;

pub const JSX_PRAGMA: &str = "__jsx";
pub const JSX_FRAGMENT_PRAGMA: &str = "__jsxFragment";

lazy_static! {
    static ref ENTITY_RE: Regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap();
}

/// Fixed transform configuration of the playground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileConfig {
    /// Recorded only; the interpreter runs the printed ES2015+ directly.
    pub target: String,
    pub jsx: bool,
    pub legacy_decorators: bool,
    pub pragma: String,
    pub pragma_frag: String,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        TranspileConfig {
            target: "es2015".to_string(),
            jsx: true,
            legacy_decorators: true,
            pragma: JSX_PRAGMA.to_string(),
            pragma_frag: JSX_FRAGMENT_PRAGMA.to_string(),
        }
    }
}

impl TranspileConfig {
    pub fn source_type(&self) -> SourceType {
        SourceType::default().with_module(true).with_jsx(self.jsx)
    }
}

/// Transpile an assembled program into plain JavaScript text.
pub fn transpile(source: &str, config: &TranspileConfig) -> Result<String, PipelineError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, config.source_type()).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let message = if message.is_empty() {
            "Unexpected token".to_string()
        } else {
            message
        };
        debug!(errors = ret.errors.len(), "transpile rejected program");
        return Err(PipelineError::syntax(message));
    }

    let mut program = ret.program;
    let mut lowerer = JsxLowerer::new(&allocator, config);
    lowerer.visit_program(&mut program);

    Ok(Codegen::new().build(&program).code)
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX LOWERER
// Transforms JSX elements into pragma calls
// ═══════════════════════════════════════════════════════════════════════════════

pub struct JsxLowerer<'a> {
    pub ast: AstBuilder<'a>,
    pragma: &'a str,
    pragma_frag: &'a str,
}

impl<'a> JsxLowerer<'a> {
    pub fn new(allocator: &'a Allocator, config: &TranspileConfig) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            pragma: allocator.alloc_str(&config.pragma),
            pragma_frag: allocator.alloc_str(&config.pragma_frag),
        }
    }

    fn lower_jsx_element(&mut self, element: &JSXElement<'a>) -> Expression<'a> {
        let tag = self.tag_expression(&element.opening_element.name);

        let mut props = self.ast.vec();
        for item in &element.opening_element.attributes {
            match item {
                JSXAttributeItem::Attribute(attr) => {
                    let name = match &attr.name {
                        JSXAttributeName::Identifier(id) => id.name.to_string(),
                        JSXAttributeName::NamespacedName(ns) => {
                            format!("{}:{}", ns.namespace.name, ns.name.name)
                        }
                    };

                    let value = match &attr.value {
                        Some(JSXAttributeValue::StringLiteral(s)) => {
                            let decoded = decode_entities(&s.value);
                            self.string_expression(&decoded)
                        }
                        Some(JSXAttributeValue::Element(el)) => self.lower_jsx_element(el),
                        Some(JSXAttributeValue::Fragment(frag)) => self.lower_jsx_fragment(frag),
                        Some(JSXAttributeValue::ExpressionContainer(container)) => self
                            .lower_jsx_expression(&container.expression)
                            .unwrap_or_else(|| self.ast.expression_identifier(SPAN, "undefined")),
                        None => self.ast.expression_boolean_literal(SPAN, true),
                    };

                    props.push(self.ast.object_property_kind_object_property(
                        SPAN,
                        PropertyKind::Init,
                        self.property_key(&name),
                        value,
                        false,
                        false,
                        false,
                    ));
                }
                JSXAttributeItem::SpreadAttribute(spread) => {
                    let mut argument = spread.argument.clone_in(self.ast.allocator);
                    self.visit_expression(&mut argument);
                    props.push(self.ast.object_property_kind_spread_property(SPAN, argument));
                }
            }
        }

        let props = if props.is_empty() {
            self.ast.expression_null_literal(SPAN)
        } else {
            self.ast.expression_object(SPAN, props)
        };
        self.pragma_call(tag, props, &element.children)
    }

    fn lower_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) -> Expression<'a> {
        let tag = self.ast.expression_identifier(SPAN, self.pragma_frag);
        let props = self.ast.expression_null_literal(SPAN);
        self.pragma_call(tag, props, &fragment.children)
    }

    fn pragma_call(
        &mut self,
        tag: Expression<'a>,
        props: Expression<'a>,
        children: &oxc_allocator::Vec<'a, JSXChild<'a>>,
    ) -> Expression<'a> {
        let mut args = self.ast.vec();
        args.push(Argument::from(tag));
        args.push(Argument::from(props));

        for child in children {
            match child {
                JSXChild::Text(t) => {
                    if let Some(text) = clean_jsx_text(&t.value) {
                        args.push(Argument::from(self.string_expression(&text)));
                    }
                }
                JSXChild::Element(el) => {
                    args.push(Argument::from(self.lower_jsx_element(el)));
                }
                JSXChild::Fragment(frag) => {
                    args.push(Argument::from(self.lower_jsx_fragment(frag)));
                }
                JSXChild::ExpressionContainer(container) => {
                    if let Some(expr) = self.lower_jsx_expression(&container.expression) {
                        args.push(Argument::from(expr));
                    }
                }
                JSXChild::Spread(spread) => {
                    let mut arg = spread.expression.clone_in(self.ast.allocator);
                    self.visit_expression(&mut arg);
                    args.push(self.ast.argument_spread_element(SPAN, arg));
                }
            }
        }

        let callee = self.ast.expression_identifier(SPAN, self.pragma);
        self.ast.expression_call(
            SPAN,
            callee,
            None::<oxc_box<TSTypeParameterInstantiation>>,
            args,
            false,
        )
    }

    /// Lowercase names are host tags; everything else is a value reference.
    fn tag_expression(&self, name: &JSXElementName<'a>) -> Expression<'a> {
        match name {
            JSXElementName::Identifier(id) => self.string_expression(id.name.as_str()),
            JSXElementName::IdentifierReference(id) => {
                if is_host_tag(id.name.as_str()) {
                    self.string_expression(id.name.as_str())
                } else {
                    self.ast.expression_identifier(SPAN, id.name)
                }
            }
            JSXElementName::NamespacedName(ns) => {
                self.string_expression(&format!("{}:{}", ns.namespace.name, ns.name.name))
            }
            JSXElementName::MemberExpression(me) => self.member_expression(me),
            JSXElementName::ThisExpression(_) => self.ast.expression_this(SPAN),
        }
    }

    fn member_expression(&self, me: &JSXMemberExpression<'a>) -> Expression<'a> {
        let object = match &me.object {
            JSXMemberExpressionObject::IdentifierReference(id) => {
                self.ast.expression_identifier(SPAN, id.name)
            }
            JSXMemberExpressionObject::MemberExpression(inner) => self.member_expression(inner),
            JSXMemberExpressionObject::ThisExpression(_) => self.ast.expression_this(SPAN),
        };
        Expression::from(self.ast.member_expression_static(
            SPAN,
            object,
            self.ast.identifier_name(SPAN, me.property.name),
            false,
        ))
    }

    /// `None` for empty containers such as `{/* comment */}`.
    fn lower_jsx_expression(&mut self, jsx_expr: &JSXExpression<'a>) -> Option<Expression<'a>> {
        let mut e = jsx_expr.as_expression()?.clone_in(self.ast.allocator);
        self.visit_expression(&mut e);
        Some(e)
    }

    fn string_expression(&self, value: &str) -> Expression<'a> {
        let value = self.ast.allocator.alloc_str(value);
        self.ast.expression_string_literal(SPAN, value, None)
    }

    fn property_key(&self, name: &str) -> PropertyKey<'a> {
        let atom = self.ast.allocator.alloc_str(name);
        if is_identifier_name(name) {
            PropertyKey::StaticIdentifier(self.ast.alloc(self.ast.identifier_name(SPAN, atom)))
        } else {
            PropertyKey::StringLiteral(self.ast.alloc_string_literal(SPAN, atom, None))
        }
    }
}

impl<'a> VisitMut<'a> for JsxLowerer<'a> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        match expr {
            Expression::JSXElement(element) => {
                let lowered = self.lower_jsx_element(element);
                *expr = lowered;
            }
            Expression::JSXFragment(fragment) => {
                let lowered = self.lower_jsx_fragment(fragment);
                *expr = lowered;
            }
            _ => walk_expression(self, expr),
        }
    }
}

fn is_host_tag(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_ascii_lowercase()) && !name.contains('.')
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// JSX text whitespace rules: lines are trimmed where they meet a line break,
/// blank lines vanish and the survivors are joined by single spaces.
pub fn clean_jsx_text(raw: &str) -> Option<String> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        let tabbed = line.replace('\t', " ");
        let mut trimmed = tabbed.as_str();
        if index != 0 {
            trimmed = trimmed.trim_start_matches(' ');
        }
        if index != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ');
        }
        if !trimmed.is_empty() {
            out.push_str(trimmed);
            if index != last_non_empty {
                out.push(' ');
            }
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(decode_entities(&out))
    }
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "middot" => '·',
        "times" => '×',
        "larr" => '←',
        "rarr" => '→',
        "bull" => '•',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowers_elements_to_pragma_calls() {
        let code = transpile(
            "const x = <Button primary size='big'>Hi {name}</Button>;",
            &TranspileConfig::default(),
        )
        .unwrap();

        assert!(code.contains("__jsx(Button"), "{}", code);
        assert!(code.contains("primary: true"), "{}", code);
        assert!(code.contains("\"Hi \""), "{}", code);
        assert!(!code.contains('<'), "{}", code);
    }

    #[test]
    fn test_host_tags_are_strings() {
        let code = transpile("const x = <div><Grid.Row /></div>;", &TranspileConfig::default()).unwrap();
        assert!(code.contains("__jsx(\"div\", null"), "{}", code);
        assert!(code.contains("__jsx(Grid.Row, null)"), "{}", code);
    }

    #[test]
    fn test_fragment_and_dashed_attributes() {
        let code = transpile(
            "const x = <><i aria-hidden='true' /></>;",
            &TranspileConfig::default(),
        )
        .unwrap();
        assert!(code.contains("__jsx(__jsxFragment, null"), "{}", code);
        assert!(code.contains("\"aria-hidden\": \"true\""), "{}", code);
    }

    #[test]
    fn test_decorators_parse() {
        let code = transpile(
            "@observer class A { @bound go() {} }",
            &TranspileConfig::default(),
        );
        assert!(code.is_ok(), "{:?}", code);
    }

    #[test]
    fn test_broken_jsx_is_syntax_error() {
        let err = transpile("const x = <div>", &TranspileConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Syntax { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_clean_jsx_text() {
        assert_eq!(clean_jsx_text("\n    \n  "), None);
        assert_eq!(clean_jsx_text("  Hello\n    world  ").as_deref(), Some("  Hello world  "));
        assert_eq!(clean_jsx_text("a &amp; b").as_deref(), Some("a & b"));
        assert_eq!(clean_jsx_text("&#65;&#x42;&bogus;").as_deref(), Some("AB&bogus;"));
    }

    #[test]
    fn test_whitespace_between_expressions_is_one_text_child() {
        assert_eq!(clean_jsx_text(" ").as_deref(), Some(" "));
        assert_eq!(clean_jsx_text(" \t").as_deref(), Some("  "));
        assert_eq!(clean_jsx_text("a\n  ").as_deref(), Some("a"));

        let out = transpile("const p = <p>{a} {b}</p>", &TranspileConfig::default()).unwrap();
        assert!(out.contains("a, \" \", b"), "{}", out);
    }
}
