//! Sandbox Values for the Example Playground
//!
//! Runtime values of the sandbox interpreter. Values borrow AST nodes from the
//! arena of the run that created them (`'a`), so they never outlive a single
//! pipeline run; anything that must survive is converted into `markup::Node`.

use oxc_ast::ast::{ArrowFunctionExpression, Class, Function, PropertyDefinition};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::interpreter::{Completion, Interpreter};
use crate::registry::HostComponent;

pub type ObjRef<'a> = Rc<RefCell<JsObject<'a>>>;
pub type Scope<'a> = Rc<Environment<'a>>;

/// Built-in function implemented in Rust. Receives `this` and the arguments.
pub type NativeFn = for<'a> fn(&mut Interpreter<'a>, Value<'a>, Vec<Value<'a>>) -> Completion<'a>;

#[derive(Clone)]
pub enum Value<'a> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(ObjRef<'a>),
}

pub struct JsObject<'a> {
    pub kind: ObjectKind<'a>,
    pub props: Vec<(Rc<str>, Value<'a>)>,
    pub proto: Option<ObjRef<'a>>,
}

pub enum ObjectKind<'a> {
    Ordinary,
    Array(Vec<Value<'a>>),
    Function(Callable<'a>),
    Element(ElementRecord<'a>),
    Fragment,
}

#[derive(Clone)]
pub enum Callable<'a> {
    Function {
        func: &'a Function<'a>,
        env: Scope<'a>,
        home: Option<ObjRef<'a>>,
    },
    Arrow {
        func: &'a ArrowFunctionExpression<'a>,
        env: Scope<'a>,
        frame: Frame<'a>,
    },
    Class(Rc<ClassRecord<'a>>),
    Native {
        name: &'static str,
        func: NativeFn,
    },
    Bound {
        target: Value<'a>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    },
    Host(HostComponent),
}

pub struct ClassRecord<'a> {
    pub name: Rc<str>,
    pub node: &'a Class<'a>,
    pub parent: Option<Value<'a>>,
    pub prototype: ObjRef<'a>,
    pub env: Scope<'a>,
    pub constructor: Option<&'a Function<'a>>,
    pub fields: Vec<&'a PropertyDefinition<'a>>,
}

pub struct ElementRecord<'a> {
    pub ty: Value<'a>,
    pub props: ObjRef<'a>,
    pub key: Option<Rc<str>>,
}

/// `this`, the method home object (for `super`) and the class being constructed.
#[derive(Clone)]
pub struct Frame<'a> {
    pub this: Value<'a>,
    pub home: Option<ObjRef<'a>>,
    pub class: Option<Rc<ClassRecord<'a>>>,
}

impl<'a> Frame<'a> {
    pub fn detached() -> Self {
        Frame {
            this: Value::Undefined,
            home: None,
            class: None,
        }
    }

    pub fn with_this(this: Value<'a>) -> Self {
        Frame {
            this,
            home: None,
            class: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

struct Binding<'a> {
    value: Value<'a>,
    mutable: bool,
}

/// Lexical scope. Redeclaring a name in the same scope replaces it.
pub struct Environment<'a> {
    vars: RefCell<HashMap<Rc<str>, Binding<'a>>>,
    parent: Option<Scope<'a>>,
}

pub enum AssignError {
    NotDefined,
    Constant,
}

impl<'a> Environment<'a> {
    pub fn root() -> Scope<'a> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Scope<'a>) -> Scope<'a> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn declare(&self, name: &str, value: Value<'a>, mutable: bool) {
        self.vars
            .borrow_mut()
            .insert(Rc::from(name), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Option<Value<'a>> {
        if let Some(binding) = self.vars.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name) || self.parent.as_ref().map_or(false, |p| p.has(name))
    }

    pub fn assign(&self, name: &str, value: Value<'a>) -> Result<(), AssignError> {
        if let Some(binding) = self.vars.borrow_mut().get_mut(name) {
            if !binding.mutable {
                return Err(AssignError::Constant);
            }
            binding.value = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(AssignError::NotDefined),
        }
    }

    /// Drop every binding; values are released after the borrow ends.
    pub fn clear(&self) {
        let vars = std::mem::take(&mut *self.vars.borrow_mut());
        drop(vars);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS & CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> JsObject<'a> {
    pub fn new(kind: ObjectKind<'a>) -> Self {
        JsObject {
            kind,
            props: Vec::new(),
            proto: None,
        }
    }

    pub fn own(&self, key: &str) -> Option<Value<'a>> {
        self.props
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.props.iter().any(|(k, _)| &**k == key)
    }

    /// Integer keys stay first in ascending order, other keys follow in
    /// insertion order.
    pub fn set_own(&mut self, key: &str, value: Value<'a>) {
        if let Some(slot) = self.props.iter_mut().find(|(k, _)| &**k == key) {
            slot.1 = value;
            return;
        }
        match array_index(key) {
            Some(index) => {
                let at = self
                    .props
                    .partition_point(|(k, _)| array_index(k).map_or(false, |i| i < index));
                self.props.insert(at, (Rc::from(key), value));
            }
            None => self.props.push((Rc::from(key), value)),
        }
    }

    pub fn remove_own(&mut self, key: &str) -> bool {
        let before = self.props.len();
        self.props.retain(|(k, _)| &**k != key);
        before != self.props.len()
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        match &self.kind {
            ObjectKind::Array(items) => (0..items.len())
                .map(|i| Rc::from(i.to_string().as_str()))
                .chain(self.props.iter().map(|(k, _)| k.clone()))
                .collect(),
            _ => self.props.iter().map(|(k, _)| k.clone()).collect(),
        }
    }
}

impl<'a> Value<'a> {
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn object(kind: ObjectKind<'a>) -> Self {
        Value::Object(Rc::new(RefCell::new(JsObject::new(kind))))
    }

    pub fn plain_object(props: Vec<(&str, Value<'a>)>) -> Self {
        let mut obj = JsObject::new(ObjectKind::Ordinary);
        for (k, v) in props {
            obj.set_own(k, v);
        }
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    pub fn array(items: Vec<Value<'a>>) -> Self {
        Value::object(ObjectKind::Array(items))
    }

    pub fn native(name: &'static str, func: NativeFn) -> Self {
        Value::object(ObjectKind::Function(Callable::Native { name, func }))
    }

    pub fn as_object(&self) -> Option<&ObjRef<'a>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Function(_)),
            _ => false,
        }
    }

    pub fn is_element(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Element(_)),
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Array(_)),
            _ => false,
        }
    }

    /// Elements of an array value, or `None` for anything else.
    pub fn array_items(&self) -> Option<Vec<Value<'a>>> {
        match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Array(items) => Some(items.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) => match obj.borrow().kind {
                ObjectKind::Function(_) => "function",
                _ => "object",
            },
        }
    }

    /// `Object.prototype.toString.call(value)`.
    pub fn type_tag(&self) -> String {
        let tag = match self {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Object(obj) => {
                let obj = obj.borrow();
                match obj.kind {
                    ObjectKind::Array(_) => "Array",
                    ObjectKind::Function(_) => "Function",
                    _ if obj.has_own("message") && obj.has_own("name") => "Error",
                    _ => "Object",
                }
            }
        };
        format!("[object {}]", tag)
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Object(_) => {
                let s = self.to_js_string();
                Value::string(&s).to_number()
            }
        }
    }

    pub fn to_js_string(&self) -> String {
        self.to_js_string_within(&mut Vec::new())
    }

    /// `joining` holds the arrays currently being joined; a cycle joins as "".
    fn to_js_string_within(&self, joining: &mut Vec<*const RefCell<JsObject<'a>>>) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Object(obj) => {
                let ptr = Rc::as_ptr(obj);
                if joining.contains(&ptr) {
                    return String::new();
                }
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Array(items) => {
                        joining.push(ptr);
                        let joined = items
                            .iter()
                            .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string_within(joining) })
                            .collect::<Vec<_>>()
                            .join(",");
                        joining.pop();
                        joined
                    }
                    ObjectKind::Function(_) => "function () { [native code] }".to_string(),
                    _ => match (obj.own("name"), obj.own("message")) {
                        (Some(Value::String(name)), Some(message)) => {
                            format!("{}: {}", name, message.to_js_string())
                        }
                        _ => "[object Object]".to_string(),
                    },
                }
            }
        }
    }

    /// Property key form of a value.
    pub fn to_property_key(&self) -> Rc<str> {
        match self {
            Value::String(s) => s.clone(),
            other => Rc::from(other.to_js_string().as_str()),
        }
    }

    pub fn strict_equals(&self, other: &Value<'a>) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn loose_equals(&self, other: &Value<'a>) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Object(_), Value::Object(_)) => self.strict_equals(other),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(_), _) => Value::string(&self.to_js_string()).loose_equals(other),
            (_, Value::Object(_)) => self.loose_equals(&Value::string(&other.to_js_string())),
            _ => self.to_number() == other.to_number(),
        }
    }
}

/// ECMAScript `Number::toString` (radix 10): shortest round-trip digits, plain
/// notation for decimal exponents in `-7..21`, exponent form otherwise.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(-point as usize), digits)
    } else {
        let e = point - 1;
        let e_sign = if e >= 0 { '+' } else { '-' };
        if k == 1 {
            format!("{}e{}{}", digits, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], e_sign, e.abs())
        }
    };
    format!("{}{}", sign, body)
}

/// Length of `s` as JavaScript measures it.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Canonical array index form of a property key (`"0"`, `"17"`, not `"01"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>()
        .ok()
        .filter(|index| *index != u32::MAX)
        .map(|index| index as usize)
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(-1.25), "-1.25");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_number_formatting_at_exponent_boundaries() {
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number_to_string(9.223372036854776e18), "9223372036854776000");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(-2.5e22), "-2.5e+22");
        assert_eq!(number_to_string(1e-6), "0.000001");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(5e-324), "5e-324");
        assert_eq!(number_to_string(f64::MAX), "1.7976931348623157e+308");
    }

    #[test]
    fn test_integer_keys_are_ordered_first() {
        let mut obj = JsObject::new(ObjectKind::Ordinary);
        for key in ["b", "2", "a", "10", "1", "01"] {
            obj.set_own(key, Value::Null);
        }
        let keys: Vec<String> = obj.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["1", "2", "10", "b", "a", "01"]);
    }

    #[test]
    fn test_cyclic_array_joins_as_empty() {
        let outer = Value::array(vec![Value::Number(1.0)]);
        if let Value::Object(obj) = &outer {
            if let ObjectKind::Array(items) = &mut obj.borrow_mut().kind {
                items.push(outer.clone());
            }
        }
        assert_eq!(outer.to_js_string(), "1,");
        if let Value::Object(obj) = &outer {
            obj.borrow_mut().kind = ObjectKind::Ordinary;
        }
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::Number(42.0).type_tag(), "[object Number]");
        assert_eq!(Value::Undefined.type_tag(), "[object Undefined]");
        assert_eq!(Value::array(vec![]).type_tag(), "[object Array]");
        assert_eq!(Value::plain_object(vec![]).type_tag(), "[object Object]");
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::string("1").loose_equals(&Value::Number(1.0)));
        let obj = Value::plain_object(vec![]);
        assert!(obj.strict_equals(&obj.clone()));
        assert!(!obj.strict_equals(&Value::plain_object(vec![])));
    }

    #[test]
    fn test_environment_shadowing() {
        let root = Environment::root();
        root.declare("Foo", Value::Number(1.0), false);
        root.declare("Foo", Value::Number(2.0), false);
        assert!(matches!(root.lookup("Foo"), Some(Value::Number(n)) if n == 2.0));

        let child = Environment::child(&root);
        child.declare("x", Value::Null, true);
        assert!(child.assign("x", Value::Bool(true)).is_ok());
        assert!(matches!(child.assign("Foo", Value::Null), Err(AssignError::Constant)));
        assert!(matches!(child.assign("nope", Value::Null), Err(AssignError::NotDefined)));
    }
}
