//! Symbol Registry for the Example Playground
//!
//! Maps the uppercase module symbols produced by the import rewriter
//! (`REACT`, `SEMANTIC_UI_REACT`, ...) to host values. Host values are plain
//! `Send + Sync` descriptions; each pipeline run materializes the symbols its
//! program references into fresh sandbox values.

use std::collections::BTreeMap;
use std::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::imports::{COMMON_SYMBOL, WIREFRAME_SYMBOL};
use crate::value::{Callable, JsObject, NativeFn, ObjectKind, Scope, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// HOST VALUES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub enum HostValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    Object(Vec<(String, HostValue)>),
    Function {
        name: &'static str,
        func: NativeFn,
    },
    /// Constructor with a shared prototype, extendable from snippets.
    Class {
        name: &'static str,
        constructor: NativeFn,
        prototype: Vec<(String, HostValue)>,
        statics: Vec<(String, HostValue)>,
    },
    Component {
        component: HostComponent,
        statics: Vec<(String, HostValue)>,
    },
    Fragment,
}

/// Component rendered by the host instead of by snippet code.
#[derive(Debug, Clone, PartialEq)]
pub struct HostComponent {
    pub name: String,
    pub kind: HostKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostKind {
    /// `<tag class="ui {modifiers} {base}">children</tag>`
    Semantic {
        tag: String,
        base: String,
        ui: bool,
        /// `name` prop becomes a class (`<Icon name='home' />`).
        name_class: bool,
    },
    /// `<div class="ui {modifiers} {base}">` wrapping a native `<input>`
    /// that receives the pass-through props.
    Control { base: String, input_type: String },
    /// Segment holding a placeholder paragraph image.
    Wireframe { src: String },
}

impl HostValue {
    pub fn object(entries: Vec<(&str, HostValue)>) -> Self {
        HostValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn function(name: &'static str, func: NativeFn) -> Self {
        HostValue::Function { name, func }
    }

    /// Build a fresh sandbox value for one run.
    pub fn to_value<'a>(&self) -> Value<'a> {
        match self {
            HostValue::Undefined => Value::Undefined,
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Number(n) => Value::Number(*n),
            HostValue::String(s) => Value::string(s),
            HostValue::Array(items) => Value::array(items.iter().map(|v| v.to_value()).collect()),
            HostValue::Object(entries) => object_from(ObjectKind::Ordinary, entries),
            HostValue::Function { name, func } => {
                let value = Value::native(*name, *func);
                if let Value::Object(obj) = &value {
                    obj.borrow_mut().set_own("name", Value::string(name));
                }
                value
            }
            HostValue::Class {
                name,
                constructor,
                prototype,
                statics,
            } => {
                let proto = object_from(ObjectKind::Ordinary, prototype);
                let kind = ObjectKind::Function(Callable::Native {
                    name: *name,
                    func: *constructor,
                });
                let class = object_from(kind, statics);
                if let Value::Object(obj) = &class {
                    let mut obj = obj.borrow_mut();
                    obj.set_own("prototype", proto);
                    obj.set_own("name", Value::string(name));
                }
                class
            }
            HostValue::Component { component, statics } => {
                let kind = ObjectKind::Function(Callable::Host(component.clone()));
                let value = object_from(kind, statics);
                if let Value::Object(obj) = &value {
                    obj.borrow_mut()
                        .set_own("displayName", Value::string(&component.name));
                }
                value
            }
            HostValue::Fragment => Value::object(ObjectKind::Fragment),
        }
    }
}

fn object_from<'a>(
    kind: ObjectKind<'a>,
    entries: &[(String, HostValue)],
) -> Value<'a> {
    let mut obj = JsObject::new(kind);
    for (key, value) in entries {
        obj.set_own(key, value.to_value());
    }
    Value::Object(Rc::new(RefCell::new(obj)))
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::String(s) => write!(f, "{:?}", s),
            HostValue::Array(items) => f.debug_list().entries(items).finish(),
            HostValue::Object(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            HostValue::Function { name, .. } => write!(f, "[Function: {}]", name),
            HostValue::Class { name, .. } => write!(f, "[class {}]", name),
            HostValue::Component { component, .. } => write!(f, "[Component: {}]", component.name),
            HostValue::Fragment => write!(f, "[Fragment]"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Conditional slots resolved from the snippet identity.
#[derive(Debug, Clone, Default)]
pub struct HelperSlots {
    /// Keyed by the first two path segments, e.g. `elements/Button`.
    pub common: BTreeMap<String, HostValue>,
    pub wireframe: Option<HostValue>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    entries: BTreeMap<String, HostValue>,
    helpers: HelperSlots,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in libraries plus the wireframe helper.
    pub fn standard() -> Self {
        crate::library::standard_registry()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, value: HostValue) {
        self.entries.insert(symbol.into(), value);
    }

    pub fn with_common(mut self, prefix: impl Into<String>, value: HostValue) -> Self {
        self.helpers.common.insert(prefix.into(), value);
        self
    }

    pub fn with_wireframe(mut self, value: HostValue) -> Self {
        self.helpers.wireframe = Some(value);
        self
    }

    pub fn helpers(&self) -> &HelperSlots {
        &self.helpers
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Resolve `symbol` for the snippet identified by `snippet_key`.
    pub fn resolve(&self, symbol: &str, snippet_key: &str) -> Option<&HostValue> {
        match symbol {
            COMMON_SYMBOL => common_prefix(snippet_key).and_then(|p| self.helpers.common.get(&p)),
            WIREFRAME_SYMBOL => self.helpers.wireframe.as_ref(),
            _ => self.entries.get(symbol),
        }
    }

    /// Declare every referenced symbol in `scope`. Unknown symbols stay
    /// undeclared and surface as a `ReferenceError` when the program reads them.
    pub fn materialize<'a>(&self, symbols: &[String], snippet_key: &str, scope: &Scope<'a>) {
        for symbol in symbols {
            match self.resolve(symbol, snippet_key) {
                Some(host) => scope.declare(symbol, host.to_value(), false),
                None => debug!(symbol = %symbol, key = %snippet_key, "unresolved registry symbol"),
            }
        }
    }
}

/// `elements/Button/Types/ButtonExample` → `elements/Button`.
pub fn common_prefix(snippet_key: &str) -> Option<String> {
    let mut segments = snippet_key.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let second = segments.next()?;
    Some(format!("{}/{}", first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Environment;

    #[test]
    fn test_common_prefix() {
        assert_eq!(
            common_prefix("elements/Button/Types/ButtonExample").as_deref(),
            Some("elements/Button")
        );
        assert_eq!(common_prefix("single"), None);
    }

    #[test]
    fn test_conditional_slots() {
        let registry = SymbolRegistry::new()
            .with_common("elements/Button", HostValue::String("button helpers".into()))
            .with_wireframe(HostValue::Number(1.0));

        assert!(registry.resolve("COMMON", "elements/Button/Types/X").is_some());
        assert!(registry.resolve("COMMON", "views/Card/Types/X").is_none());
        assert!(registry.resolve("WIREFRAME", "anything").is_some());
        assert!(registry.resolve("REACT", "anything").is_none());
    }

    #[test]
    fn test_materialize_declares_referenced_symbols() {
        let mut registry = SymbolRegistry::new();
        registry.insert("FAKER", HostValue::object(vec![("seed", HostValue::Number(7.0))]));
        registry.insert("UNUSED", HostValue::Null);

        let scope = Environment::root();
        registry.materialize(&["FAKER".to_string(), "MISSING".to_string()], "a/b/c", &scope);

        assert!(scope.has("FAKER"));
        assert!(!scope.has("UNUSED"));
        assert!(!scope.has("MISSING"));
    }

    #[test]
    fn test_host_values_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SymbolRegistry>();
    }
}
