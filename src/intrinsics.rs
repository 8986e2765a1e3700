//! Language Intrinsics for the Sandbox Interpreter
//!
//! Global bindings (`Math`, `JSON`, `Object`, `Array`, `console`, ...) and the
//! built-in methods of strings, numbers, arrays and functions.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::interpreter::{callable_of, own_entries, property_of, type_error, Completion, Fault, Interpreter};
use crate::value::{
    number_to_string, utf16_len, Callable, JsObject, NativeFn, ObjRef, ObjectKind, Scope, Value,
};

const CONSOLE_TARGET: &str = "playground::console";
const JSON_MAX_DEPTH: usize = 64;

fn arg<'a>(args: &[Value<'a>], index: usize) -> Value<'a> {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn native_fn<'a>(name: &'static str, func: NativeFn) -> Value<'a> {
    let value = Value::native(name, func);
    if let Value::Object(obj) = &value {
        obj.borrow_mut().set_own("name", Value::string(name));
    }
    value
}

/// A callable global carrying static members (`Object.keys`, `Array.isArray`).
fn constructor<'a>(
    name: &'static str,
    func: NativeFn,
    statics: Vec<(&'static str, Value<'a>)>,
) -> Value<'a> {
    let value = native_fn(name, func);
    if let Value::Object(obj) = &value {
        let mut obj = obj.borrow_mut();
        obj.set_own("prototype", Value::object(ObjectKind::Ordinary));
        for (key, member) in statics {
            obj.set_own(key, member);
        }
    }
    value
}

/// `{ name, message }` error object.
pub fn make_error<'a>(name: &str, message: &str) -> Value<'a> {
    Value::plain_object(vec![
        ("name", Value::string(name)),
        ("message", Value::string(message)),
    ])
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Declare the globals. Returns the prototypes that link back to their
/// constructor, so the interpreter can unlink them on drop.
pub fn install<'a>(global: &Scope<'a>) -> Vec<ObjRef<'a>> {
    global.declare("undefined", Value::Undefined, false);
    global.declare("NaN", Value::Number(f64::NAN), false);
    global.declare("Infinity", Value::Number(f64::INFINITY), false);

    global.declare(
        "Math",
        Value::plain_object(vec![
            ("PI", Value::Number(std::f64::consts::PI)),
            ("E", Value::Number(std::f64::consts::E)),
            ("abs", native_fn("abs", math_abs)),
            ("floor", native_fn("floor", math_floor)),
            ("ceil", native_fn("ceil", math_ceil)),
            ("round", native_fn("round", math_round)),
            ("trunc", native_fn("trunc", math_trunc)),
            ("sign", native_fn("sign", math_sign)),
            ("sqrt", native_fn("sqrt", math_sqrt)),
            ("pow", native_fn("pow", math_pow)),
            ("min", native_fn("min", math_min)),
            ("max", native_fn("max", math_max)),
            ("random", native_fn("random", math_random)),
        ]),
        false,
    );

    global.declare(
        "JSON",
        Value::plain_object(vec![("stringify", native_fn("stringify", json_stringify))]),
        false,
    );

    global.declare(
        "Object",
        constructor(
            "Object",
            object_ctor,
            vec![
                ("keys", native_fn("keys", object_keys)),
                ("values", native_fn("values", object_values)),
                ("entries", native_fn("entries", object_entries)),
                ("assign", native_fn("assign", object_assign)),
                ("freeze", native_fn("freeze", identity)),
                ("create", native_fn("create", object_create)),
                ("getPrototypeOf", native_fn("getPrototypeOf", object_get_prototype_of)),
            ],
        ),
        false,
    );

    global.declare(
        "Array",
        constructor(
            "Array",
            array_ctor,
            vec![
                ("isArray", native_fn("isArray", array_is_array)),
                ("from", native_fn("from", array_from)),
                ("of", native_fn("of", array_of)),
            ],
        ),
        false,
    );

    global.declare("String", constructor("String", string_ctor, vec![]), false);
    global.declare("Boolean", constructor("Boolean", boolean_ctor, vec![]), false);
    global.declare(
        "Number",
        constructor(
            "Number",
            number_ctor,
            vec![
                ("isInteger", native_fn("isInteger", number_is_integer)),
                ("isNaN", native_fn("isNaN", number_is_nan)),
                ("isFinite", native_fn("isFinite", number_is_finite)),
                ("parseFloat", native_fn("parseFloat", parse_float)),
                ("parseInt", native_fn("parseInt", parse_int)),
            ],
        ),
        false,
    );
    global.declare("parseInt", native_fn("parseInt", parse_int), false);
    global.declare("parseFloat", native_fn("parseFloat", parse_float), false);
    global.declare("isNaN", native_fn("isNaN", is_nan), false);
    global.declare("isFinite", native_fn("isFinite", is_finite), false);

    let mut linked = Vec::new();
    let errors = [
        ("Error", error_ctor as NativeFn),
        ("TypeError", type_error_ctor),
        ("RangeError", range_error_ctor),
    ];
    for (name, func) in errors {
        let (class, prototype) = error_class(name, func);
        linked.extend(prototype);
        global.declare(name, class, false);
    }

    global.declare(
        "console",
        Value::plain_object(vec![
            ("log", native_fn("log", console_log)),
            ("info", native_fn("info", console_log)),
            ("debug", native_fn("debug", console_debug)),
            ("warn", native_fn("warn", console_warn)),
            ("error", native_fn("error", console_error)),
        ]),
        false,
    );
    linked
}

fn identity<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(arg(&args, 0))
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATH
// ═══════════════════════════════════════════════════════════════════════════════

fn unary_math<'a>(args: &[Value<'a>], f: fn(f64) -> f64) -> Completion<'a> {
    Ok(Value::Number(f(arg(args, 0).to_number())))
}

fn math_abs<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, f64::abs)
}

fn math_floor<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, f64::floor)
}

fn math_ceil<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, f64::ceil)
}

fn math_round<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    // JS rounds halves towards +Infinity.
    unary_math(&args, |n| (n + 0.5).floor())
}

fn math_trunc<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, f64::trunc)
}

fn math_sign<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, |n| if n == 0.0 || n.is_nan() { n } else { n.signum() })
}

fn math_sqrt<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    unary_math(&args, f64::sqrt)
}

fn math_pow<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Number(arg(&args, 0).to_number().powf(arg(&args, 1).to_number())))
}

fn math_min<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut result = f64::INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Value::Number(result))
}

fn math_max<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut result = f64::NEG_INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Value::Number(result))
}

fn math_random<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Number(interp.random()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON
// ═══════════════════════════════════════════════════════════════════════════════

fn json_stringify<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let indent = match arg(&args, 2) {
        Value::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let mut out = String::new();
    let cap = interp.limits().max_string_length;
    if write_json(&arg(&args, 0), &indent, 0, cap, &mut out)? {
        interp.new_string(&out)
    } else {
        Ok(Value::Undefined)
    }
}

/// Append the JSON form of `value`; `false` when the value has none.
fn write_json<'a>(
    value: &Value<'a>,
    indent: &str,
    depth: usize,
    cap: usize,
    out: &mut String,
) -> Result<bool, Fault<'a>> {
    if depth > JSON_MAX_DEPTH {
        return Err(type_error("Converting circular structure to JSON"));
    }
    if out.len() > cap {
        return Err(Fault::Throw(make_error("RangeError", "Invalid string length")));
    }
    match value {
        Value::Undefined => return Ok(false),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) if n.is_finite() => out.push_str(&number_to_string(*n)),
        Value::Number(_) => out.push_str("null"),
        Value::String(s) => out.push_str(&json_quote(s)),
        Value::Object(obj) => {
            if matches!(obj.borrow().kind, ObjectKind::Function(_)) {
                return Ok(false);
            }
            let newline = |out: &mut String, level: usize| {
                if !indent.is_empty() {
                    out.push('\n');
                    out.push_str(&indent.repeat(level));
                }
            };
            if let Some(items) = value.array_items() {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    newline(out, depth + 1);
                    if !write_json(item, indent, depth + 1, cap, out)? {
                        out.push_str("null");
                    }
                }
                if !items.is_empty() {
                    newline(out, depth);
                }
                out.push(']');
            } else {
                out.push('{');
                let mut first = true;
                for (key, item) in own_entries(value) {
                    let mark = out.len();
                    if !first {
                        out.push(',');
                    }
                    newline(out, depth + 1);
                    out.push_str(&json_quote(&key));
                    out.push(':');
                    if !indent.is_empty() {
                        out.push(' ');
                    }
                    if write_json(&item, indent, depth + 1, cap, out)? {
                        first = false;
                    } else {
                        out.truncate(mark);
                    }
                }
                if !first {
                    newline(out, depth);
                }
                out.push('}');
            }
        }
    }
    Ok(true)
}

fn json_quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

// ═══════════════════════════════════════════════════════════════════════════════
// OBJECT & ARRAY STATICS
// ═══════════════════════════════════════════════════════════════════════════════

fn object_ctor<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    match arg(&args, 0) {
        value @ Value::Object(_) => Ok(value),
        _ if matches!(this, Value::Object(_)) => Ok(this),
        _ => Ok(Value::object(ObjectKind::Ordinary)),
    }
}

fn object_keys<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let target = arg(&args, 0);
    if target.is_nullish() {
        return Err(type_error("Cannot convert undefined or null to object"));
    }
    Ok(Value::array(
        own_entries(&target)
            .into_iter()
            .map(|(k, _)| Value::String(k))
            .collect(),
    ))
}

fn object_values<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let target = arg(&args, 0);
    if target.is_nullish() {
        return Err(type_error("Cannot convert undefined or null to object"));
    }
    Ok(Value::array(own_entries(&target).into_iter().map(|(_, v)| v).collect()))
}

fn object_entries<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let target = arg(&args, 0);
    if target.is_nullish() {
        return Err(type_error("Cannot convert undefined or null to object"));
    }
    Ok(Value::array(
        own_entries(&target)
            .into_iter()
            .map(|(k, v)| Value::array(vec![Value::String(k), v]))
            .collect(),
    ))
}

fn object_assign<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let target = arg(&args, 0);
    if target.is_nullish() {
        return Err(type_error("Cannot convert undefined or null to object"));
    }
    for source in args.iter().skip(1) {
        for (key, value) in own_entries(source) {
            interp.set(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn object_create<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut obj = JsObject::new(ObjectKind::Ordinary);
    obj.proto = arg(&args, 0).as_object().cloned();
    Ok(Value::Object(Rc::new(RefCell::new(obj))))
}

fn object_get_prototype_of<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(arg(&args, 0)
        .as_object()
        .and_then(|obj| obj.borrow().proto.clone())
        .map(Value::Object)
        .unwrap_or(Value::Null))
}

fn array_ctor<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    if let [Value::Number(n)] = args.as_slice() {
        let n = *n;
        if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
            return Err(Fault::Throw(make_error("RangeError", "Invalid array length")));
        }
        interp.check_array_length(n as usize)?;
        return Ok(Value::array(vec![Value::Undefined; n as usize]));
    }
    Ok(Value::array(args))
}

fn array_is_array<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(arg(&args, 0).is_array()))
}

fn array_of<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::array(args))
}

/// `Array.from(iterable | { length }, mapFn?)`.
fn array_from<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let source = arg(&args, 0);
    let items = match &source {
        Value::String(_) => interp.iterate(&source)?,
        Value::Object(_) if source.is_array() => interp.iterate(&source)?,
        Value::Object(_) => {
            let length = interp.get(&source, "length")?.to_number();
            let length = if length.is_finite() && length > 0.0 { length.min(u32::MAX as f64) as usize } else { 0 };
            interp.check_array_length(length)?;
            let mut items = Vec::with_capacity(length);
            for index in 0..length {
                interp.tick()?;
                items.push(interp.get(&source, &index.to_string())?);
            }
            items
        }
        _ => Vec::new(),
    };
    let map = arg(&args, 1);
    if !map.is_callable() {
        return Ok(Value::array(items));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        mapped.push(interp.call(&map, Value::Undefined, vec![item, Value::Number(index as f64)])?);
    }
    Ok(Value::array(mapped))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn string_ctor<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(match args.first() {
        Some(value) => Value::string(&value.to_js_string()),
        None => Value::string(""),
    })
}

fn number_ctor<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
}

fn boolean_ctor<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(arg(&args, 0).truthy()))
}

fn number_is_integer<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_finite() && n.fract() == 0.0)))
}

fn number_is_nan<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_nan())))
}

fn number_is_finite<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_finite())))
}

fn is_nan<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(arg(&args, 0).to_number().is_nan()))
}

fn is_finite<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(arg(&args, 0).to_number().is_finite()))
}

fn parse_int<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let text = arg(&args, 0).to_js_string();
    let mut text = text.trim_start();
    let negative = text.starts_with('-');
    if negative || text.starts_with('+') {
        text = &text[1..];
    }
    let mut radix = match arg(&args, 1) {
        Value::Undefined => 10,
        value => value.to_number() as u32,
    };
    if radix == 0 {
        radix = 10;
    }
    if (radix == 16 || matches!(arg(&args, 1), Value::Undefined))
        && (text.starts_with("0x") || text.starts_with("0X"))
    {
        text = &text[2..];
        radix = 16;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let digits: String = text.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let magnitude = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(Value::Number(if negative { -magnitude } else { magnitude }))
}

fn parse_float<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let text = arg(&args, 0).to_js_string();
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    for (index, c) in text.char_indices() {
        let ok = match c {
            '0'..='9' => true,
            '+' | '-' => index == 0 || text[..index].ends_with(&['e', 'E'][..]),
            '.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                true
            }
            'e' | 'E' if !seen_exp && index > 0 => {
                seen_exp = true;
                true
            }
            _ => false,
        };
        if !ok {
            break;
        }
        end = index + c.len_utf8();
    }
    let mut candidate = &text[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return Ok(Value::Number(n));
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    if text.starts_with("Infinity") || text.starts_with("+Infinity") {
        return Ok(Value::Number(f64::INFINITY));
    }
    if text.starts_with("-Infinity") {
        return Ok(Value::Number(f64::NEG_INFINITY));
    }
    Ok(Value::Number(f64::NAN))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error constructor and its prototype (`name`, `message`, `constructor`).
fn error_class<'a>(name: &'static str, func: NativeFn) -> (Value<'a>, Option<ObjRef<'a>>) {
    let value = constructor(name, func, vec![]);
    let prototype = match value.as_object().map(|obj| obj.borrow().own("prototype")) {
        Some(Some(Value::Object(proto))) => proto,
        _ => return (value, None),
    };
    {
        let mut proto = prototype.borrow_mut();
        proto.set_own("name", Value::string(name));
        proto.set_own("message", Value::string(""));
        proto.set_own("constructor", value.clone());
    }
    (value, Some(prototype))
}

/// Shared body of the error constructors; works with and without `new`.
fn construct_error<'a>(name: &str, this: Value<'a>, args: &[Value<'a>]) -> Completion<'a> {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        value => value.to_js_string(),
    };
    match &this {
        Value::Object(obj) if matches!(obj.borrow().kind, ObjectKind::Ordinary) => {
            let mut obj = obj.borrow_mut();
            obj.set_own("message", Value::string(&message));
            if !obj.has_own("name") {
                obj.set_own("name", Value::string(name));
            }
            drop(obj);
            Ok(this.clone())
        }
        _ => Ok(make_error(name, &message)),
    }
}

fn error_ctor<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    construct_error("Error", this, &args)
}

fn type_error_ctor<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    construct_error("TypeError", this, &args)
}

fn range_error_ctor<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    construct_error("RangeError", this, &args)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSOLE
// ═══════════════════════════════════════════════════════════════════════════════

fn console_line(args: &[Value<'_>]) -> String {
    args.iter()
        .map(|value| match value {
            Value::String(s) => s.to_string(),
            Value::Object(_) if !value.is_callable() => {
                let mut out = String::new();
                match write_json(value, "", 0, usize::MAX, &mut out) {
                    Ok(true) => out,
                    _ => value.to_js_string(),
                }
            }
            other => other.to_js_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    info!(target: CONSOLE_TARGET, "{}", console_line(&args));
    Ok(Value::Undefined)
}

fn console_debug<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    debug!(target: CONSOLE_TARGET, "{}", console_line(&args));
    Ok(Value::Undefined)
}

fn console_warn<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    warn!(target: CONSOLE_TARGET, "{}", console_line(&args));
    Ok(Value::Undefined)
}

fn console_error<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    error!(target: CONSOLE_TARGET, "{}", console_line(&args));
    Ok(Value::Undefined)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIMITIVE METHODS
// ═══════════════════════════════════════════════════════════════════════════════

fn char_at(s: &str, index: usize) -> Option<char> {
    s.chars().nth(index)
}

/// Property of a string primitive: `length`, indices, then methods.
pub fn string_property<'a>(s: &Rc<str>, key: &str) -> Value<'a> {
    if key == "length" {
        return Value::Number(utf16_len(s) as f64);
    }
    if let Ok(index) = key.parse::<usize>() {
        return char_at(s, index)
            .map(|c| Value::string(&c.to_string()))
            .unwrap_or(Value::Undefined);
    }
    string_method(key)
        .or_else(|| object_method(key))
        .unwrap_or(Value::Undefined)
}

/// Property of a number or boolean primitive.
pub fn primitive_property<'a>(key: &str) -> Value<'a> {
    match key {
        "toFixed" => native_fn("toFixed", number_to_fixed),
        "toString" => native_fn("toString", number_to_string_method),
        "toLocaleString" => native_fn("toLocaleString", number_to_locale_string),
        "valueOf" => native_fn("valueOf", this_value),
        _ => Value::Undefined,
    }
}

fn this_value<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(this)
}

fn number_to_fixed<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let digits = arg(&args, 0).to_number();
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    if !(0.0..=100.0).contains(&digits) {
        return Err(Fault::Throw(make_error(
            "RangeError",
            "toFixed() digits argument must be between 0 and 100",
        )));
    }
    let digits = digits as usize;
    let n = this.to_number();
    if !n.is_finite() {
        return Ok(Value::string(&number_to_string(n)));
    }
    Ok(Value::string(&format!("{:.*}", digits, n)))
}

fn number_to_string_method<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    if let Value::Bool(b) = this {
        return Ok(Value::string(if b { "true" } else { "false" }));
    }
    let radix = match arg(&args, 0) {
        Value::Undefined => 10.0,
        value => value.to_number().trunc(),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(Fault::Throw(make_error(
            "RangeError",
            "toString() radix must be between 2 and 36",
        )));
    }
    let radix = radix as u32;
    let n = this.to_number();
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 || n.abs() >= u64::MAX as f64 {
        return Ok(Value::string(&number_to_string(n)));
    }
    let mut magnitude = n.abs() as u64;
    let mut digits = Vec::new();
    loop {
        let digit = (magnitude % radix as u64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        magnitude /= radix as u64;
        if magnitude == 0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    Ok(Value::string(&digits.iter().rev().collect::<String>()))
}

fn number_to_locale_string<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let text = number_to_string(this.to_number());
    let (int_part, frac) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.chars().take(3).collect::<String>())),
        None => (text, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d.to_string()),
        None => ("", int_part),
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Value::string(&format!("{}{}", sign, digits)));
    }
    let mut grouped = String::new();
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    Ok(Value::string(&match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }))
}

fn string_method<'a>(key: &str) -> Option<Value<'a>> {
    let method = match key {
        "charAt" => native_fn("charAt", string_char_at),
        "charCodeAt" => native_fn("charCodeAt", string_char_code_at),
        "indexOf" => native_fn("indexOf", string_index_of),
        "lastIndexOf" => native_fn("lastIndexOf", string_last_index_of),
        "includes" => native_fn("includes", string_includes),
        "startsWith" => native_fn("startsWith", string_starts_with),
        "endsWith" => native_fn("endsWith", string_ends_with),
        "slice" => native_fn("slice", string_slice),
        "substring" => native_fn("substring", string_substring),
        "substr" => native_fn("substr", string_substr),
        "toUpperCase" => native_fn("toUpperCase", string_to_upper_case),
        "toLowerCase" => native_fn("toLowerCase", string_to_lower_case),
        "trim" => native_fn("trim", string_trim),
        "trimStart" => native_fn("trimStart", string_trim_start),
        "trimEnd" => native_fn("trimEnd", string_trim_end),
        "split" => native_fn("split", string_split),
        "replace" => native_fn("replace", string_replace),
        "repeat" => native_fn("repeat", string_repeat),
        "padStart" => native_fn("padStart", string_pad_start),
        "padEnd" => native_fn("padEnd", string_pad_end),
        "concat" => native_fn("concat", string_concat),
        "toString" | "valueOf" => native_fn("toString", this_string),
        "localeCompare" => native_fn("localeCompare", string_locale_compare),
        _ => return None,
    };
    Some(method)
}

fn chars_of(this: &Value<'_>) -> Vec<char> {
    this.to_js_string().chars().collect()
}

/// Clamp a relative index (negative counts from the end) into `0..=len`.
fn relative_index(value: &Value<'_>, len: usize, default: usize) -> usize {
    match value {
        Value::Undefined => default,
        value => {
            let n = value.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len())
        .find(|&i| haystack[i..].starts_with(needle))
}

fn this_string<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&this.to_js_string()))
}

fn string_char_at<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let index = arg(&args, 0).to_number();
    let index = if index.is_nan() { 0 } else { index as usize };
    Ok(Value::string(
        &char_at(&this.to_js_string(), index).map(String::from).unwrap_or_default(),
    ))
}

fn string_char_code_at<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let index = arg(&args, 0).to_number();
    let index = if index.is_nan() { 0 } else { index as usize };
    Ok(Value::Number(
        char_at(&this.to_js_string(), index).map_or(f64::NAN, |c| c as u32 as f64),
    ))
}

fn string_index_of<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let haystack = chars_of(&this);
    let needle = chars_of(&arg(&args, 0));
    let from = relative_index(&arg(&args, 1), haystack.len(), 0);
    Ok(Value::Number(
        find_chars(&haystack, &needle, from).map_or(-1.0, |i| i as f64),
    ))
}

fn string_last_index_of<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let haystack = chars_of(&this);
    let needle = chars_of(&arg(&args, 0));
    let found = (0..=haystack.len().saturating_sub(needle.len()))
        .rev()
        .find(|&i| haystack[i..].starts_with(&needle));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn string_includes<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(this.to_js_string().contains(&arg(&args, 0).to_js_string())))
}

fn string_starts_with<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let haystack = chars_of(&this);
    let from = relative_index(&arg(&args, 1), haystack.len(), 0);
    Ok(Value::Bool(haystack[from..].starts_with(&chars_of(&arg(&args, 0)))))
}

fn string_ends_with<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(this.to_js_string().ends_with(&arg(&args, 0).to_js_string())))
}

fn string_slice<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let chars = chars_of(&this);
    let start = relative_index(&arg(&args, 0), chars.len(), 0);
    let end = relative_index(&arg(&args, 1), chars.len(), chars.len());
    Ok(Value::string(&chars[start..end.max(start)].iter().collect::<String>()))
}

fn string_substring<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let chars = chars_of(&this);
    let clamp = |value: Value<'a>, default: usize| match value {
        Value::Undefined => default,
        value => {
            let n = value.to_number();
            if n.is_nan() || n < 0.0 {
                0
            } else {
                (n as usize).min(chars.len())
            }
        }
    };
    let a = clamp(arg(&args, 0), 0);
    let b = clamp(arg(&args, 1), chars.len());
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(Value::string(&chars[start..end].iter().collect::<String>()))
}

fn string_substr<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let chars = chars_of(&this);
    let start = relative_index(&arg(&args, 0), chars.len(), 0);
    let length = match arg(&args, 1) {
        Value::Undefined => chars.len(),
        value => value.to_number().max(0.0) as usize,
    };
    let end = start.saturating_add(length).min(chars.len());
    Ok(Value::string(&chars[start..end].iter().collect::<String>()))
}

fn string_to_upper_case<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&this.to_js_string().to_uppercase()))
}

fn string_to_lower_case<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&this.to_js_string().to_lowercase()))
}

fn string_trim<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(this.to_js_string().trim()))
}

fn string_trim_start<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(this.to_js_string().trim_start()))
}

fn string_trim_end<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(this.to_js_string().trim_end()))
}

fn string_split<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let text = this.to_js_string();
    let parts: Vec<Value<'a>> = match arg(&args, 0) {
        Value::Undefined => vec![Value::string(&text)],
        separator => {
            let separator = separator.to_js_string();
            if separator.is_empty() {
                text.chars().map(|c| Value::string(&c.to_string())).collect()
            } else {
                text.split(separator.as_str()).map(Value::string).collect()
            }
        }
    };
    let parts = match arg(&args, 1) {
        Value::Undefined => parts,
        limit => parts.into_iter().take(limit.to_number().max(0.0) as usize).collect(),
    };
    Ok(Value::array(parts))
}

/// String-pattern `replace`; the replacement may be a function.
fn string_replace<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let text = this.to_js_string();
    let pattern = arg(&args, 0).to_js_string();
    let Some(position) = text.find(&pattern) else {
        return Ok(Value::string(&text));
    };
    let replacement = arg(&args, 1);
    let replacement = if replacement.is_callable() {
        interp
            .call(
                &replacement,
                Value::Undefined,
                vec![Value::string(&pattern), Value::Number(position as f64), Value::string(&text)],
            )?
            .to_js_string()
    } else {
        replacement.to_js_string()
    };
    Ok(Value::string(&format!(
        "{}{}{}",
        &text[..position],
        replacement,
        &text[position + pattern.len()..]
    )))
}

fn string_repeat<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let count = arg(&args, 0).to_number();
    if count < 0.0 || count.is_infinite() {
        return Err(Fault::Throw(make_error("RangeError", "Invalid count value")));
    }
    let count = if count.is_nan() { 0.0 } else { count.trunc() };
    let text = this.to_js_string();
    let units = utf16_len(&text) as f64 * count;
    interp.check_string_length(units.min(usize::MAX as f64) as usize)?;
    Ok(Value::string(&text.repeat(count as usize)))
}

fn pad<'a>(interp: &Interpreter<'a>, this: &Value<'a>, args: &[Value<'a>], at_start: bool) -> Completion<'a> {
    let text = this.to_js_string();
    let target = arg(args, 0).to_number();
    let target = if target.is_nan() { 0.0 } else { target.max(0.0).min(usize::MAX as f64) };
    interp.check_string_length(target as usize)?;
    let target = target as usize;
    let filler = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        value => value.to_js_string(),
    };
    let len = text.chars().count();
    if target <= len || filler.is_empty() {
        return Ok(Value::string(&text));
    }
    let padding: String = filler.chars().cycle().take(target - len).collect();
    Ok(Value::string(&if at_start {
        format!("{}{}", padding, text)
    } else {
        format!("{}{}", text, padding)
    }))
}

fn string_pad_start<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    pad(interp, &this, &args, true)
}

fn string_pad_end<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    pad(interp, &this, &args, false)
}

fn string_concat<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut text = this.to_js_string();
    for value in &args {
        text.push_str(&value.to_js_string());
        interp.check_string_length(utf16_len(&text))?;
    }
    Ok(Value::string(&text))
}

fn string_locale_compare<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let ordering = this.to_js_string().cmp(&arg(&args, 0).to_js_string());
    Ok(Value::Number(ordering as i8 as f64))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARRAY METHODS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn array_method<'a>(key: &str) -> Option<Value<'a>> {
    let method = match key {
        "map" => native_fn("map", array_map),
        "forEach" => native_fn("forEach", array_for_each),
        "filter" => native_fn("filter", array_filter),
        "reduce" => native_fn("reduce", array_reduce),
        "find" => native_fn("find", array_find),
        "findIndex" => native_fn("findIndex", array_find_index),
        "some" => native_fn("some", array_some),
        "every" => native_fn("every", array_every),
        "includes" => native_fn("includes", array_includes),
        "indexOf" => native_fn("indexOf", array_index_of),
        "join" => native_fn("join", array_join),
        "concat" => native_fn("concat", array_concat),
        "slice" => native_fn("slice", array_slice),
        "push" => native_fn("push", array_push),
        "pop" => native_fn("pop", array_pop),
        "shift" => native_fn("shift", array_shift),
        "unshift" => native_fn("unshift", array_unshift),
        "reverse" => native_fn("reverse", array_reverse),
        "sort" => native_fn("sort", array_sort),
        "flat" => native_fn("flat", array_flat),
        "fill" => native_fn("fill", array_fill),
        "toString" => native_fn("toString", this_string),
        _ => return None,
    };
    Some(method)
}

fn items_of<'a>(this: &Value<'a>) -> Result<Vec<Value<'a>>, Fault<'a>> {
    this.array_items()
        .ok_or_else(|| type_error("Array.prototype method called on a non-array"))
}

fn items_len(this: &Value<'_>) -> usize {
    match this {
        Value::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Array(items) => items.len(),
            _ => 0,
        },
        _ => 0,
    }
}

fn with_items<'a, R>(this: &Value<'a>, f: impl FnOnce(&mut Vec<Value<'a>>) -> R) -> Result<R, Fault<'a>> {
    if let Value::Object(obj) = this {
        if let ObjectKind::Array(items) = &mut obj.borrow_mut().kind {
            return Ok(f(items));
        }
    }
    Err(type_error("Array.prototype method called on a non-array"))
}

/// Call `callback(item, index, array)` for each item.
fn each_result<'a>(
    interp: &mut Interpreter<'a>,
    this: &Value<'a>,
    args: &[Value<'a>],
) -> Result<Vec<(Value<'a>, Value<'a>)>, Fault<'a>> {
    let callback = arg(args, 0);
    if !callback.is_callable() {
        return Err(type_error(format!("{} is not a function", callback.to_js_string())));
    }
    let this_arg = arg(args, 1);
    let items = items_of(this)?;
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let result = interp.call(
            &callback,
            this_arg.clone(),
            vec![item.clone(), Value::Number(index as f64), this.clone()],
        )?;
        results.push((item, result));
    }
    Ok(results)
}

fn array_map<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let results = each_result(interp, &this, &args)?;
    Ok(Value::array(results.into_iter().map(|(_, r)| r).collect()))
}

fn array_for_each<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    each_result(interp, &this, &args)?;
    Ok(Value::Undefined)
}

fn array_filter<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let results = each_result(interp, &this, &args)?;
    Ok(Value::array(
        results
            .into_iter()
            .filter(|(_, keep)| keep.truthy())
            .map(|(item, _)| item)
            .collect(),
    ))
}

/// Short-circuiting search; returns the index of the first truthy callback result.
fn search<'a>(interp: &mut Interpreter<'a>, this: &Value<'a>, args: &[Value<'a>]) -> Result<Option<(usize, Value<'a>)>, Fault<'a>> {
    let callback = arg(args, 0);
    if !callback.is_callable() {
        return Err(type_error(format!("{} is not a function", callback.to_js_string())));
    }
    for (index, item) in items_of(this)?.into_iter().enumerate() {
        let hit = interp.call(
            &callback,
            arg(args, 1),
            vec![item.clone(), Value::Number(index as f64), this.clone()],
        )?;
        if hit.truthy() {
            return Ok(Some((index, item)));
        }
    }
    Ok(None)
}

fn array_find<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(search(interp, &this, &args)?.map(|(_, item)| item).unwrap_or(Value::Undefined))
}

fn array_find_index<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Number(search(interp, &this, &args)?.map_or(-1.0, |(i, _)| i as f64)))
}

fn array_some<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(search(interp, &this, &args)?.is_some()))
}

fn array_every<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let callback = arg(&args, 0);
    if !callback.is_callable() {
        return Err(type_error(format!("{} is not a function", callback.to_js_string())));
    }
    for (index, item) in items_of(&this)?.into_iter().enumerate() {
        let ok = interp.call(&callback, arg(&args, 1), vec![item, Value::Number(index as f64), this.clone()])?;
        if !ok.truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn array_reduce<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let callback = arg(&args, 0);
    if !callback.is_callable() {
        return Err(type_error(format!("{} is not a function", callback.to_js_string())));
    }
    let items = items_of(&this)?;
    let mut iter = items.into_iter().enumerate();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match iter.next() {
            Some((_, first)) => first,
            None => return Err(type_error("Reduce of empty array with no initial value")),
        },
    };
    for (index, item) in iter {
        acc = interp.call(
            &callback,
            Value::Undefined,
            vec![acc, item, Value::Number(index as f64), this.clone()],
        )?;
    }
    Ok(acc)
}

fn array_includes<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let needle = arg(&args, 0);
    let found = items_of(&this)?.iter().any(|item| {
        item.strict_equals(&needle)
            || matches!((item, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
    });
    Ok(Value::Bool(found))
}

fn array_index_of<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let needle = arg(&args, 0);
    let position = items_of(&this)?.iter().position(|item| item.strict_equals(&needle));
    Ok(Value::Number(position.map_or(-1.0, |i| i as f64)))
}

fn array_join<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let separator = match arg(&args, 0) {
        Value::Undefined => ",".to_string(),
        value => value.to_js_string(),
    };
    let separator_units = utf16_len(&separator);
    let mut joined = String::new();
    let mut units = 0;
    for (index, item) in items_of(&this)?.iter().enumerate() {
        if index > 0 {
            joined.push_str(&separator);
            units += separator_units;
        }
        if !item.is_nullish() {
            let part = item.to_js_string();
            units += utf16_len(&part);
            joined.push_str(&part);
        }
        interp.check_string_length(units)?;
    }
    Ok(Value::string(&joined))
}

fn array_concat<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut items = items_of(&this)?;
    for value in args {
        match value.array_items() {
            Some(more) => items.extend(more),
            None => items.push(value),
        }
        interp.check_array_length(items.len())?;
    }
    Ok(Value::array(items))
}

fn array_slice<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let items = items_of(&this)?;
    let start = relative_index(&arg(&args, 0), items.len(), 0);
    let end = relative_index(&arg(&args, 1), items.len(), items.len());
    Ok(Value::array(items[start..end.max(start)].to_vec()))
}

fn array_push<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    interp.check_array_length(items_len(&this) + args.len())?;
    with_items(&this, |items| {
        items.extend(args);
        Value::Number(items.len() as f64)
    })
}

fn array_pop<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    with_items(&this, |items| items.pop().unwrap_or(Value::Undefined))
}

fn array_shift<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    with_items(&this, |items| {
        if items.is_empty() {
            Value::Undefined
        } else {
            items.remove(0)
        }
    })
}

fn array_unshift<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    interp.check_array_length(items_len(&this) + args.len())?;
    with_items(&this, |items| {
        items.splice(0..0, args);
        Value::Number(items.len() as f64)
    })
}

fn array_reverse<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    with_items(&this, |items| items.reverse())?;
    Ok(this)
}

fn array_fill<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let value = arg(&args, 0);
    with_items(&this, |items| {
        let len = items.len();
        let start = relative_index(&arg(&args, 1), len, 0);
        let end = relative_index(&arg(&args, 2), len, len);
        for slot in items.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
    })?;
    Ok(this)
}

fn array_flat<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    fn flatten<'a>(
        interp: &Interpreter<'a>,
        items: Vec<Value<'a>>,
        depth: usize,
        out: &mut Vec<Value<'a>>,
    ) -> Result<(), Fault<'a>> {
        for item in items {
            match item.array_items() {
                Some(inner) if depth > 0 => flatten(interp, inner, depth - 1, out)?,
                _ => out.push(item),
            }
            interp.check_array_length(out.len())?;
        }
        Ok(())
    }
    let depth = match arg(&args, 0) {
        Value::Undefined => 1,
        value => value.to_number().clamp(0.0, 64.0) as usize,
    };
    let mut out = Vec::new();
    flatten(interp, items_of(&this)?, depth, &mut out)?;
    Ok(Value::array(out))
}

/// Stable merge sort; the comparator may throw.
fn array_sort<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let comparator = arg(&args, 0);
    let items = items_of(&this)?;
    let (mut defined, undefined): (Vec<_>, Vec<_>) =
        items.into_iter().partition(|v| !matches!(v, Value::Undefined));
    defined = merge_sort(interp, defined, &comparator)?;
    defined.extend(undefined);
    with_items(&this, |items| *items = defined)?;
    Ok(this)
}

fn merge_sort<'a>(
    interp: &mut Interpreter<'a>,
    mut items: Vec<Value<'a>>,
    comparator: &Value<'a>,
) -> Result<Vec<Value<'a>>, Fault<'a>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(interp, items, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        interp.tick()?;
        let right_first = if comparator.is_callable() {
            interp
                .call(comparator, Value::Undefined, vec![a.clone(), b.clone()])?
                .to_number()
                > 0.0
        } else {
            a.to_js_string() > b.to_js_string()
        };
        let next = if right_first { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTION & OBJECT METHODS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn function_method<'a>(key: &str) -> Option<Value<'a>> {
    let method = match key {
        "bind" => native_fn("bind", function_bind),
        "call" => native_fn("call", function_call),
        "apply" => native_fn("apply", function_apply),
        _ => return None,
    };
    Some(method)
}

fn function_bind<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    if callable_of(&this).is_none() {
        return Err(type_error("Bind must be called on a function"));
    }
    let mut args = args.into_iter();
    let bound_this = args.next().unwrap_or(Value::Undefined);
    let name = match &this {
        Value::Object(obj) => property_of(obj, "name").to_js_string(),
        _ => String::new(),
    };
    let bound = Value::object(ObjectKind::Function(Callable::Bound {
        target: this,
        this: bound_this,
        args: args.collect(),
    }));
    if let Value::Object(obj) = &bound {
        obj.borrow_mut().set_own("name", Value::string(&format!("bound {}", name)));
    }
    Ok(bound)
}

fn function_call<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut args = args.into_iter();
    let call_this = args.next().unwrap_or(Value::Undefined);
    interp.call(&this, call_this, args.collect())
}

fn function_apply<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let call_args = match arg(&args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        list => list
            .array_items()
            .ok_or_else(|| type_error("CreateListFromArrayLike called on non-object"))?,
    };
    interp.call(&this, arg(&args, 0), call_args)
}

/// `Object.prototype` members, reachable from every value.
pub fn object_method<'a>(key: &str) -> Option<Value<'a>> {
    let method = match key {
        "hasOwnProperty" => native_fn("hasOwnProperty", object_has_own_property),
        "toString" => native_fn("toString", object_to_string),
        _ => return None,
    };
    Some(method)
}

fn object_has_own_property<'a>(_: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let key = arg(&args, 0).to_property_key();
    Ok(Value::Bool(
        own_entries(&this).iter().any(|(k, _)| *k == key),
    ))
}

fn object_to_string<'a>(_: &mut Interpreter<'a>, this: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&this.to_js_string()))
}
