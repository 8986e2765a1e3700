//! Built-in Library Modules for the Example Playground
//!
//! Host implementations of the modules documentation examples import:
//! `REACT`, `SEMANTIC_UI_REACT`, `LODASH`, `FAKER` and the `WIREFRAME` helper.
//! Each module is a `HostValue` description; the interpreter materializes a
//! fresh copy for every run.

use std::cell::RefCell;
use std::rc::Rc;

use crate::imports::split_words;
use crate::interpreter::{own_entries, type_error, Completion, Fault, Interpreter};
use crate::registry::{HostComponent, HostKind, HostValue, SymbolRegistry};
use crate::value::{ElementRecord, JsObject, ObjectKind, Value};

/// Placeholder image rendered by the wireframe helper.
pub const WIREFRAME_IMAGE: &str = "/images/wireframe/paragraph.png";

/// Props copied verbatim from a host component onto its DOM element.
const PASS_THROUGH_PROPS: &[&str] = &[
    "id",
    "href",
    "src",
    "alt",
    "type",
    "name",
    "value",
    "placeholder",
    "style",
    "role",
    "title",
    "target",
    "tabIndex",
    "disabled",
];

const NUMBER_WORDS: &[&str] = &[
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "thirteen", "fourteen", "fifteen", "sixteen",
];

fn arg<'a>(args: &[Value<'a>], index: usize) -> Value<'a> {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// The registry every panel starts from.
pub fn standard_registry() -> SymbolRegistry {
    let mut registry = SymbolRegistry::new();
    registry.insert("REACT", react_module());
    registry.insert("SEMANTIC_UI_REACT", semantic_module());
    registry.insert("LODASH", lodash_module());
    registry.insert("FAKER", faker_module());
    registry.with_wireframe(wireframe_helper())
}

// ═══════════════════════════════════════════════════════════════════════════════
// REACT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn react_module() -> HostValue {
    HostValue::object(vec![
        ("createElement", HostValue::function("createElement", create_element)),
        ("cloneElement", HostValue::function("cloneElement", clone_element)),
        ("isValidElement", HostValue::function("isValidElement", is_valid_element)),
        ("Component", component_class("Component")),
        ("PureComponent", component_class("PureComponent")),
        ("Fragment", HostValue::Fragment),
        (
            "Children",
            HostValue::object(vec![
                ("map", HostValue::function("map", children_map)),
                ("forEach", HostValue::function("forEach", children_for_each)),
                ("count", HostValue::function("count", children_count)),
                ("toArray", HostValue::function("toArray", children_to_array)),
                ("only", HostValue::function("only", children_only)),
            ]),
        ),
    ])
}

fn component_class(name: &'static str) -> HostValue {
    HostValue::Class {
        name,
        constructor: component_ctor,
        prototype: vec![
            ("isReactComponent".to_string(), HostValue::object(vec![])),
            ("setState".to_string(), HostValue::function("setState", set_state)),
            ("forceUpdate".to_string(), HostValue::function("forceUpdate", force_update)),
        ],
        statics: vec![],
    }
}

pub fn make_element<'a>(ty: Value<'a>, props: JsObject<'a>, key: Option<Rc<str>>) -> Value<'a> {
    Value::object(ObjectKind::Element(ElementRecord {
        ty,
        props: Rc::new(RefCell::new(props)),
        key,
    }))
}

/// `createElement(type, config, ...children)`; also the JSX pragma.
pub fn create_element<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut args = args.into_iter();
    let ty = args.next().unwrap_or(Value::Undefined);
    let config = args.next().unwrap_or(Value::Undefined);
    let children: Vec<Value<'a>> = args.collect();

    let mut props = JsObject::new(ObjectKind::Ordinary);
    let mut key = None;
    for (name, value) in own_entries(&config) {
        match &*name {
            "key" => {
                key = if value.is_nullish() {
                    None
                } else {
                    Some(Rc::from(value.to_js_string()))
                }
            }
            "ref" => {}
            _ => props.set_own(&name, value),
        }
    }
    set_children(&mut props, children);

    if ty.is_callable() {
        let defaults = interp.get(&ty, "defaultProps")?;
        for (name, value) in own_entries(&defaults) {
            if matches!(props.own(&name), None | Some(Value::Undefined)) {
                props.set_own(&name, value);
            }
        }
    }
    Ok(make_element(ty, props, key))
}

fn set_children<'a>(props: &mut JsObject<'a>, children: Vec<Value<'a>>) {
    match children.len() {
        0 => {}
        1 => {
            if let Some(child) = children.into_iter().next() {
                props.set_own("children", child);
            }
        }
        _ => props.set_own("children", Value::array(children)),
    }
}

fn clone_element<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut args = args.into_iter();
    let element = args.next().unwrap_or(Value::Undefined);
    let config = args.next().unwrap_or(Value::Undefined);
    let children: Vec<Value<'a>> = args.collect();

    let (ty, source_props, mut key) = match &element {
        Value::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Element(record) => (record.ty.clone(), Rc::clone(&record.props), record.key.clone()),
            _ => return Err(type_error("React.cloneElement(...): The argument must be a React element")),
        },
        _ => return Err(type_error("React.cloneElement(...): The argument must be a React element")),
    };

    let mut props = JsObject::new(ObjectKind::Ordinary);
    props.props = source_props.borrow().props.clone();
    for (name, value) in own_entries(&config) {
        match &*name {
            "key" => key = Some(Rc::from(value.to_js_string())),
            "ref" => {}
            _ => props.set_own(&name, value),
        }
    }
    set_children(&mut props, children);
    Ok(make_element(ty, props, key))
}

fn is_valid_element<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(arg(&args, 0).is_element()))
}

fn component_ctor<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    if !matches!(this, Value::Object(_)) {
        return Err(type_error("Cannot call a class as a function"));
    }
    let props = match arg(&args, 0) {
        Value::Undefined => Value::plain_object(vec![]),
        props => props,
    };
    interp.set(&this, "props", props)?;
    interp.set(&this, "context", arg(&args, 1))?;
    interp.set(&this, "refs", Value::plain_object(vec![]))?;
    Ok(Value::Undefined)
}

/// Merges immediately; nothing is mounted yet when examples call it.
fn set_state<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    if !matches!(this, Value::Object(_)) {
        return Err(type_error("Cannot read properties of undefined (reading 'setState')"));
    }
    let current = interp.get(&this, "state")?;
    let update = arg(&args, 0);
    let partial = if update.is_callable() {
        let props = interp.get(&this, "props")?;
        interp.call(&update, this.clone(), vec![current.clone(), props])?
    } else {
        update
    };
    if !partial.is_nullish() {
        let next = Value::plain_object(vec![]);
        for (name, value) in own_entries(&current).into_iter().chain(own_entries(&partial)) {
            interp.set(&next, &name, value)?;
        }
        interp.set(&this, "state", next)?;
    }
    let callback = arg(&args, 1);
    if callback.is_callable() {
        interp.call(&callback, this, vec![])?;
    }
    Ok(Value::Undefined)
}

fn force_update<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let callback = arg(&args, 0);
    if callback.is_callable() {
        interp.call(&callback, this, vec![])?;
    }
    Ok(Value::Undefined)
}

/// Children flattened the way `React.Children` sees them.
pub fn flatten_children<'a>(value: &Value<'a>, out: &mut Vec<Value<'a>>) {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) => {}
        _ => match value.array_items() {
            Some(items) => items.iter().for_each(|item| flatten_children(item, out)),
            None => out.push(value.clone()),
        },
    }
}

fn children_map<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let children = arg(&args, 0);
    if children.is_nullish() {
        return Ok(children);
    }
    let callback = arg(&args, 1);
    let mut flat = Vec::new();
    flatten_children(&children, &mut flat);
    let mut mapped = Vec::with_capacity(flat.len());
    for (index, child) in flat.into_iter().enumerate() {
        mapped.push(interp.call(&callback, arg(&args, 2), vec![child, Value::Number(index as f64)])?);
    }
    Ok(Value::array(mapped))
}

fn children_for_each<'a>(interp: &mut Interpreter<'a>, this: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    children_map(interp, this, args)?;
    Ok(Value::Undefined)
}

fn children_count<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut flat = Vec::new();
    flatten_children(&arg(&args, 0), &mut flat);
    Ok(Value::Number(flat.len() as f64))
}

fn children_to_array<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut flat = Vec::new();
    flatten_children(&arg(&args, 0), &mut flat);
    Ok(Value::array(flat))
}

fn children_only<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let child = arg(&args, 0);
    if !child.is_element() {
        return Err(type_error(
            "React.Children.only expected to receive a single React element child.",
        ));
    }
    Ok(child)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEMANTIC UI REACT
// ═══════════════════════════════════════════════════════════════════════════════

fn semantic(name: &str, tag: &str, base: &str, ui: bool) -> HostComponent {
    HostComponent {
        name: name.to_string(),
        kind: HostKind::Semantic {
            tag: tag.to_string(),
            base: base.to_string(),
            ui,
            name_class: false,
        },
    }
}

fn component(component: HostComponent, statics: Vec<(&str, HostValue)>) -> HostValue {
    HostValue::Component {
        component,
        statics: statics.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

/// `Parent.Sub` rendered as `<div class="{base}">`.
fn part(parent: &str, sub: &str, base: &str) -> (String, HostValue) {
    (
        sub.to_string(),
        component(semantic(&format!("{}.{}", parent, sub), "div", base, false), vec![]),
    )
}

/// `Parent.Sub` rendered as a bare `<tag>` (table sections and cells).
fn tagged(parent: &str, sub: &str, tag: &str) -> (String, HostValue) {
    (
        sub.to_string(),
        component(semantic(&format!("{}.{}", parent, sub), tag, "", false), vec![]),
    )
}

fn control(name: &str, base: &str, input_type: &str) -> HostComponent {
    HostComponent {
        name: name.to_string(),
        kind: HostKind::Control {
            base: base.to_string(),
            input_type: input_type.to_string(),
        },
    }
}

fn with_parts(component: HostComponent, parts: Vec<(String, HostValue)>) -> HostValue {
    HostValue::Component {
        component,
        statics: parts,
    }
}

pub fn semantic_module() -> HostValue {
    let icon = HostComponent {
        name: "Icon".to_string(),
        kind: HostKind::Semantic {
            tag: "i".to_string(),
            base: "icon".to_string(),
            ui: false,
            name_class: true,
        },
    };

    HostValue::object(vec![
        ("Component", component_class("Component")),
        ("Button", component(semantic("Button", "button", "button", true), vec![])),
        ("Segment", component(semantic("Segment", "div", "segment", true), vec![])),
        ("Header", with_parts(
            semantic("Header", "div", "header", true),
            vec![part("Header", "Content", "content"), part("Header", "Subheader", "sub header")],
        )),
        ("Icon", with_parts(icon, vec![(
            "Group".to_string(),
            component(semantic("Icon.Group", "i", "icons", false), vec![]),
        )])),
        ("Image", component(semantic("Image", "img", "image", true), vec![])),
        ("Label", component(semantic("Label", "div", "label", true), vec![])),
        ("Container", component(semantic("Container", "div", "container", true), vec![])),
        ("Divider", component(semantic("Divider", "div", "divider", true), vec![])),
        ("Grid", with_parts(
            semantic("Grid", "div", "grid", true),
            vec![part("Grid", "Row", "row"), part("Grid", "Column", "column")],
        )),
        ("List", with_parts(
            semantic("List", "div", "list", true),
            vec![
                part("List", "Item", "item"),
                part("List", "Content", "content"),
                part("List", "Header", "header"),
                part("List", "Description", "description"),
            ],
        )),
        ("Menu", with_parts(
            semantic("Menu", "div", "menu", true),
            vec![part("Menu", "Item", "item"), part("Menu", "Menu", "menu")],
        )),
        ("Card", with_parts(
            semantic("Card", "div", "card", true),
            vec![
                part("Card", "Content", "content"),
                part("Card", "Header", "header"),
                part("Card", "Meta", "meta"),
                part("Card", "Description", "description"),
                (
                    "Group".to_string(),
                    component(semantic("Card.Group", "div", "cards", true), vec![]),
                ),
            ],
        )),
        ("Message", with_parts(
            semantic("Message", "div", "message", true),
            vec![part("Message", "Header", "header"), part("Message", "Content", "content")],
        )),
        ("Dropdown", with_parts(
            semantic("Dropdown", "div", "dropdown", true),
            vec![
                part("Dropdown", "Menu", "menu transition"),
                part("Dropdown", "Item", "item"),
                part("Dropdown", "Header", "header"),
                part("Dropdown", "Divider", "divider"),
            ],
        )),
        ("Input", component(control("Input", "input", "text"), vec![])),
        ("Checkbox", component(control("Checkbox", "checkbox", "checkbox"), vec![])),
        ("Form", with_parts(
            semantic("Form", "form", "form", true),
            vec![
                part("Form", "Field", "field"),
                part("Form", "Group", "fields"),
                ("Input".to_string(), component(control("Form.Input", "input", "text"), vec![])),
                (
                    "Checkbox".to_string(),
                    component(control("Form.Checkbox", "checkbox", "checkbox"), vec![]),
                ),
                (
                    "Button".to_string(),
                    component(semantic("Form.Button", "button", "button", true), vec![]),
                ),
            ],
        )),
        ("Table", with_parts(
            semantic("Table", "table", "table", true),
            vec![
                tagged("Table", "Header", "thead"),
                tagged("Table", "Body", "tbody"),
                tagged("Table", "Footer", "tfoot"),
                tagged("Table", "Row", "tr"),
                tagged("Table", "HeaderCell", "th"),
                tagged("Table", "Cell", "td"),
            ],
        )),
        ("Statistic", with_parts(
            semantic("Statistic", "div", "statistic", true),
            vec![
                part("Statistic", "Value", "value"),
                part("Statistic", "Label", "label"),
                (
                    "Group".to_string(),
                    component(semantic("Statistic.Group", "div", "statistics", true), vec![]),
                ),
            ],
        )),
        ("Loader", component(semantic("Loader", "div", "loader", true), vec![])),
    ])
}

pub fn wireframe_helper() -> HostValue {
    component(
        HostComponent {
            name: "Wireframe".to_string(),
            kind: HostKind::Wireframe {
                src: WIREFRAME_IMAGE.to_string(),
            },
        },
        vec![],
    )
}

fn number_word(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && *n >= 1.0 => {
            NUMBER_WORDS.get(*n as usize).map(|w| w.to_string())
        }
        Value::String(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

/// Expand a built-in host component into a DOM element.
pub fn render_host<'a>(
    _interp: &mut Interpreter<'a>,
    component: &HostComponent,
    props: &Value<'a>,
) -> Completion<'a> {
    let entries = own_entries(props);
    let prop = |name: &str| {
        entries
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Undefined)
    };

    let (tag, base, ui, name_class, input_type) = match &component.kind {
        HostKind::Semantic {
            tag,
            base,
            ui,
            name_class,
        } => (tag.clone(), base.clone(), *ui, *name_class, None),
        HostKind::Control { base, input_type } => {
            ("div".to_string(), base.clone(), true, false, Some(input_type.as_str()))
        }
        HostKind::Wireframe { src } => {
            let mut image = JsObject::new(ObjectKind::Ordinary);
            image.set_own("className", Value::string("ui image"));
            image.set_own("src", Value::string(src));
            let mut segment = JsObject::new(ObjectKind::Ordinary);
            segment.set_own("className", Value::string("ui segment"));
            segment.set_own("children", make_element(Value::string("img"), image, None));
            return Ok(make_element(Value::string("div"), segment, None));
        }
    };

    let tag = match prop("as") {
        Value::String(s) if !s.is_empty() => s.to_string(),
        _ => tag,
    };

    let mut classes: Vec<String> = Vec::new();
    if ui {
        classes.push("ui".to_string());
    }
    if name_class {
        if let Value::String(name) = prop("name") {
            classes.push(name.to_string());
        }
    }
    for key in ["color", "size"] {
        if let Value::String(s) = prop(key) {
            classes.push(s.to_string());
        }
    }
    for (key, value) in &entries {
        if matches!(value, Value::Bool(true)) && !PASS_THROUGH_PROPS.contains(&&**key) {
            classes.push(split_words(key).join(" ").to_lowercase());
        }
    }
    if let Value::String(s) = prop("floated") {
        classes.push(format!("{} floated", s));
    }
    if let Value::String(s) = prop("textAlign") {
        classes.push(format!("{} aligned", s));
    }
    if let Some(word) = number_word(&prop("columns")) {
        classes.push(format!("{} column", word));
    }
    if let Some(word) = number_word(&prop("width")) {
        classes.push(format!("{} wide", word));
    }
    if !base.is_empty() {
        classes.push(base);
    }
    if let Value::String(extra) = prop("className") {
        if !extra.is_empty() {
            classes.push(extra.to_string());
        }
    }

    let mut out = JsObject::new(ObjectKind::Ordinary);
    if !classes.is_empty() {
        out.set_own("className", Value::string(&classes.join(" ")));
    }
    if let Some(input_type) = input_type {
        let mut children = vec![native_input(input_type, &prop)];
        if input_type == "checkbox" {
            let mut label = JsObject::new(ObjectKind::Ordinary);
            if !prop("label").is_nullish() {
                label.set_own("children", prop("label"));
            }
            children.push(make_element(Value::string("label"), label, None));
        }
        if !prop("children").is_nullish() {
            children.push(prop("children"));
        }
        out.set_own("children", Value::array(children));
        return Ok(make_element(Value::string(&tag), out, None));
    }
    for key in PASS_THROUGH_PROPS {
        if name_class && *key == "name" {
            continue;
        }
        let value = prop(key);
        if !matches!(value, Value::Undefined) {
            out.set_own(key, value);
        }
    }
    if name_class {
        out.set_own("aria-hidden", Value::string("true"));
    }
    let children = match prop("children") {
        Value::Undefined | Value::Null => prop("content"),
        children => children,
    };
    if !children.is_nullish() {
        out.set_own("children", children);
    }
    Ok(make_element(Value::string(&tag), out, None))
}

/// The `<input>` inside a control; checkboxes are visually hidden.
fn native_input<'a>(input_type: &str, prop: &dyn Fn(&str) -> Value<'a>) -> Value<'a> {
    let mut input = JsObject::new(ObjectKind::Ordinary);
    input.set_own("type", Value::string(input_type));
    for key in PASS_THROUGH_PROPS {
        let value = prop(key);
        if !matches!(value, Value::Undefined) {
            input.set_own(key, value);
        }
    }
    if input_type == "checkbox" {
        input.set_own("className", Value::string("hidden"));
        input.set_own("readOnly", Value::Bool(true));
        if matches!(prop("tabIndex"), Value::Undefined) {
            input.set_own("tabIndex", Value::Number(0.0));
        }
        if let Value::Bool(checked) = prop("checked") {
            input.set_own("checked", Value::Bool(checked));
        }
    }
    make_element(Value::string("input"), input, None)
}

// ═══════════════════════════════════════════════════════════════════════════════
// LODASH
// ═══════════════════════════════════════════════════════════════════════════════

pub fn lodash_module() -> HostValue {
    HostValue::object(vec![
        ("times", HostValue::function("times", lodash_times)),
        ("range", HostValue::function("range", lodash_range)),
        ("map", HostValue::function("map", lodash_map)),
        ("keys", HostValue::function("keys", lodash_keys)),
        ("isEmpty", HostValue::function("isEmpty", lodash_is_empty)),
        ("sample", HostValue::function("sample", lodash_sample)),
        ("random", HostValue::function("random", lodash_random)),
        ("capitalize", HostValue::function("capitalize", lodash_capitalize)),
        ("upperFirst", HostValue::function("upperFirst", lodash_upper_first)),
        ("kebabCase", HostValue::function("kebabCase", lodash_kebab_case)),
        ("snakeCase", HostValue::function("snakeCase", lodash_snake_case)),
        ("camelCase", HostValue::function("camelCase", lodash_camel_case)),
        ("startCase", HostValue::function("startCase", lodash_start_case)),
        ("get", HostValue::function("get", lodash_get)),
        ("filter", HostValue::function("filter", lodash_filter)),
        ("find", HostValue::function("find", lodash_find)),
        ("sortBy", HostValue::function("sortBy", lodash_sort_by)),
        ("uniq", HostValue::function("uniq", lodash_uniq)),
        ("chunk", HostValue::function("chunk", lodash_chunk)),
        ("flatten", HostValue::function("flatten", lodash_flatten)),
        ("sum", HostValue::function("sum", lodash_sum)),
        ("head", HostValue::function("head", lodash_head)),
        ("first", HostValue::function("first", lodash_head)),
        ("last", HostValue::function("last", lodash_last)),
        ("pick", HostValue::function("pick", lodash_pick)),
        ("omit", HostValue::function("omit", lodash_omit)),
    ])
}

fn lodash_times<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let count = arg(&args, 0).to_number();
    let count = if count.is_finite() && count > 0.0 { count.min(u32::MAX as f64) as usize } else { 0 };
    interp.check_array_length(count)?;
    let iteratee = arg(&args, 1);
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let index = Value::Number(index as f64);
        out.push(if iteratee.is_callable() {
            interp.call(&iteratee, Value::Undefined, vec![index])?
        } else {
            index
        });
    }
    Ok(Value::array(out))
}

fn lodash_range<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let (start, end) = match (arg(&args, 0), arg(&args, 1)) {
        (end, Value::Undefined) => (0.0, end.to_number()),
        (start, end) => (start.to_number(), end.to_number()),
    };
    let step = match arg(&args, 2) {
        Value::Undefined => {
            if end < start {
                -1.0
            } else {
                1.0
            }
        }
        step => step.to_number(),
    };
    let mut out = Vec::new();
    if step == 0.0 || step.is_nan() || start.is_nan() || end.is_nan() {
        return Ok(Value::array(out));
    }
    let count = ((end - start) / step).ceil().max(0.0);
    interp.check_array_length(count.min(u32::MAX as f64) as usize)?;
    let mut current = start;
    while (step > 0.0 && current < end) || (step < 0.0 && current > end) {
        interp.tick()?;
        out.push(Value::Number(current));
        current += step;
    }
    Ok(Value::array(out))
}

fn lodash_map<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let collection = arg(&args, 0);
    let iteratee = arg(&args, 1);
    let mut out = Vec::new();
    match collection.array_items() {
        Some(items) => {
            for (index, item) in items.into_iter().enumerate() {
                out.push(map_item(interp, &iteratee, item, Value::Number(index as f64))?);
            }
        }
        None => {
            for (key, item) in own_entries(&collection) {
                out.push(map_item(interp, &iteratee, item, Value::String(key))?);
            }
        }
    }
    Ok(Value::array(out))
}

/// A function iteratee is called, a string iteratee plucks that property and
/// an object iteratee tests whether the item has all of its properties.
fn map_item<'a>(interp: &mut Interpreter<'a>, iteratee: &Value<'a>, item: Value<'a>, key: Value<'a>) -> Completion<'a> {
    match iteratee {
        Value::String(name) if !item.is_nullish() => interp.get(&item, name),
        Value::String(_) => Ok(Value::Undefined),
        _ if iteratee.is_callable() => interp.call(iteratee, Value::Undefined, vec![item, key]),
        Value::Object(_) => {
            if item.is_nullish() {
                return Ok(Value::Bool(false));
            }
            for (name, expected) in own_entries(iteratee) {
                if !interp.get(&item, &name)?.strict_equals(&expected) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        _ => Ok(item),
    }
}

/// `(item, key)` pairs of an array or a plain object.
fn collection_items<'a>(collection: &Value<'a>) -> Vec<(Value<'a>, Value<'a>)> {
    match collection.array_items() {
        Some(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (item, Value::Number(index as f64)))
            .collect(),
        None => own_entries(collection)
            .into_iter()
            .map(|(key, item)| (item, Value::String(key)))
            .collect(),
    }
}

fn list_of<'a>(value: &Value<'a>) -> Vec<Value<'a>> {
    value.array_items().unwrap_or_default()
}

/// `_.get(object, 'a.b[0].c', fallback)`; the path may also be an array.
fn lodash_get<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let path: Vec<String> = match arg(&args, 1) {
        Value::String(path) => path
            .replace('[', ".")
            .replace(']', "")
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
        value => match value.array_items() {
            Some(items) => items.iter().map(Value::to_js_string).collect(),
            None => vec![value.to_js_string()],
        },
    };
    let mut current = arg(&args, 0);
    for segment in &path {
        if current.is_nullish() {
            break;
        }
        current = interp.get(&current, segment)?;
    }
    Ok(match current {
        Value::Undefined => arg(&args, 2),
        value => value,
    })
}

fn lodash_filter<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let predicate = arg(&args, 1);
    let mut out = Vec::new();
    for (item, key) in collection_items(&arg(&args, 0)) {
        if map_item(interp, &predicate, item.clone(), key)?.truthy() {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn lodash_find<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let predicate = arg(&args, 1);
    for (item, key) in collection_items(&arg(&args, 0)) {
        if map_item(interp, &predicate, item.clone(), key)?.truthy() {
            return Ok(item);
        }
    }
    Ok(Value::Undefined)
}

/// Ascending order of lodash's `compareAscending`: undefined sorts last.
fn compare_keys(left: &Value<'_>, right: &Value<'_>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (left, right) {
        (Value::Undefined, Value::Undefined) => Ordering::Equal,
        (Value::Undefined, _) => Ordering::Greater,
        (_, Value::Undefined) => Ordering::Less,
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        _ => left.to_js_string().cmp(&right.to_js_string()),
    }
}

fn lodash_sort_by<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let iteratees = match arg(&args, 1) {
        Value::Undefined => Vec::new(),
        value if value.is_array() => list_of(&value),
        value => vec![value],
    };
    let mut keyed = Vec::new();
    for (item, key) in collection_items(&arg(&args, 0)) {
        let mut keys = Vec::with_capacity(iteratees.len().max(1));
        if iteratees.is_empty() {
            keys.push(item.clone());
        }
        for iteratee in &iteratees {
            keys.push(map_item(interp, iteratee, item.clone(), key.clone())?);
        }
        interp.tick()?;
        keyed.push((keys, item));
    }
    keyed.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| compare_keys(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(Value::array(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn lodash_uniq<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut out: Vec<Value<'a>> = Vec::new();
    for item in list_of(&arg(&args, 0)) {
        let seen = out.iter().any(|existing| {
            existing.strict_equals(&item)
                || matches!((existing, &item), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
        });
        if !seen {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn lodash_chunk<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let size = match arg(&args, 1) {
        Value::Undefined => 1.0,
        value => value.to_number().trunc(),
    };
    if size.is_nan() || size < 1.0 {
        return Ok(Value::array(Vec::new()));
    }
    let size = size.min(u32::MAX as f64) as usize;
    Ok(Value::array(
        list_of(&arg(&args, 0))
            .chunks(size)
            .map(|chunk| Value::array(chunk.to_vec()))
            .collect(),
    ))
}

fn lodash_flatten<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let mut out = Vec::new();
    for item in list_of(&arg(&args, 0)) {
        match item.array_items() {
            Some(inner) => out.extend(inner),
            None => out.push(item),
        }
    }
    Ok(Value::array(out))
}

fn lodash_sum<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let items = list_of(&arg(&args, 0));
    if items.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(items.iter().map(Value::to_number).sum()))
}

fn lodash_head<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(list_of(&arg(&args, 0)).into_iter().next().unwrap_or(Value::Undefined))
}

fn lodash_last<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(list_of(&arg(&args, 0)).pop().unwrap_or(Value::Undefined))
}

/// Property names after the object argument, flattened one level.
fn picked_keys(args: &[Value<'_>]) -> Vec<String> {
    args.iter()
        .skip(1)
        .flat_map(|value| match value.array_items() {
            Some(items) => items.iter().map(Value::to_js_string).collect(),
            None => vec![value.to_js_string()],
        })
        .collect()
}

fn lodash_pick<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let keys = picked_keys(&args);
    let mut out = JsObject::new(ObjectKind::Ordinary);
    for (key, value) in own_entries(&arg(&args, 0)) {
        if keys.iter().any(|k| **k == *key) {
            out.set_own(&key, value);
        }
    }
    Ok(Value::Object(Rc::new(RefCell::new(out))))
}

fn lodash_omit<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let keys = picked_keys(&args);
    let mut out = JsObject::new(ObjectKind::Ordinary);
    for (key, value) in own_entries(&arg(&args, 0)) {
        if !keys.iter().any(|k| **k == *key) {
            out.set_own(&key, value);
        }
    }
    Ok(Value::Object(Rc::new(RefCell::new(out))))
}

fn lodash_keys<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::array(
        own_entries(&arg(&args, 0))
            .into_iter()
            .map(|(k, _)| Value::String(k))
            .collect(),
    ))
}

fn lodash_is_empty<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let value = arg(&args, 0);
    Ok(Value::Bool(match &value {
        Value::String(s) => s.is_empty(),
        Value::Object(_) => own_entries(&value).is_empty(),
        _ => true,
    }))
}

fn lodash_sample<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let items: Vec<Value<'a>> = match arg(&args, 0).array_items() {
        Some(items) => items,
        None => own_entries(&arg(&args, 0)).into_iter().map(|(_, v)| v).collect(),
    };
    if items.is_empty() {
        return Ok(Value::Undefined);
    }
    let index = (interp.random() * items.len() as f64) as usize;
    Ok(items.get(index).cloned().unwrap_or(Value::Undefined))
}

fn lodash_random<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let (lower, upper) = match (arg(&args, 0), arg(&args, 1)) {
        (Value::Undefined, _) => (0.0, 1.0),
        (upper, Value::Undefined) => (0.0, upper.to_number()),
        (lower, upper) => (lower.to_number(), upper.to_number()),
    };
    let floating = matches!(arg(&args, 2), Value::Bool(true)) || lower.fract() != 0.0 || upper.fract() != 0.0;
    let r = interp.random();
    Ok(Value::Number(if floating {
        lower + r * (upper - lower)
    } else {
        (lower + (r * (upper - lower + 1.0)).floor()).min(upper)
    }))
}

fn words_of(args: &[Value<'_>]) -> Vec<String> {
    split_words(&arg(args, 0).to_js_string())
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lodash_capitalize<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&upper_first(&arg(&args, 0).to_js_string().to_lowercase())))
}

fn lodash_upper_first<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&upper_first(&arg(&args, 0).to_js_string())))
}

fn lodash_kebab_case<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&words_of(&args).join("-").to_lowercase()))
}

fn lodash_snake_case<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&words_of(&args).join("_").to_lowercase()))
}

fn lodash_camel_case<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let out: String = words_of(&args)
        .iter()
        .enumerate()
        .map(|(index, word)| {
            let word = word.to_lowercase();
            if index == 0 {
                word
            } else {
                upper_first(&word)
            }
        })
        .collect();
    Ok(Value::string(&out))
}

fn lodash_start_case<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let out = words_of(&args)
        .iter()
        .map(|word| upper_first(word))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::string(&out))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAKER
// ═══════════════════════════════════════════════════════════════════════════════

const FIRST_NAMES: &[&str] = &["Elliot", "Stevie", "Jenny", "Helen", "Matthew", "Molly", "Daniel", "Veronika", "Christian", "Justen"];
const LAST_NAMES: &[&str] = &["Baker", "Fox", "Hess", "Lee", "Nguyen", "Ortiz", "Patel", "Rivera", "Smith", "Weber"];
const JOB_TITLES: &[&str] = &["Designer", "Engineer", "Product Manager", "Analyst", "Consultant", "Architect"];
const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];
const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "and Sons", "Labs"];
const CATCH_PHRASES: &[&str] = &[
    "Synergized mobile matrix",
    "Proactive interactive hub",
    "Robust didactic paradigm",
    "Streamlined bifurcated framework",
];
const CITIES: &[&str] = &["Springfield", "Riverside", "Fairview", "Madison", "Georgetown"];
const STREETS: &[&str] = &["Main Street", "Oak Avenue", "Pine Road", "Maple Lane", "Cedar Court"];
const COUNTRIES: &[&str] = &["Canada", "Germany", "Japan", "Brazil", "Kenya", "Norway"];
const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

fn pick<'s>(interp: &mut Interpreter<'_>, list: &[&'s str]) -> &'s str {
    let index = (interp.random() * list.len() as f64) as usize;
    list.get(index).or_else(|| list.first()).copied().unwrap_or_default()
}

pub fn faker_module() -> HostValue {
    HostValue::object(vec![
        ("name", HostValue::object(vec![
            ("firstName", HostValue::function("firstName", faker_first_name)),
            ("lastName", HostValue::function("lastName", faker_last_name)),
            ("findName", HostValue::function("findName", faker_find_name)),
            ("jobTitle", HostValue::function("jobTitle", faker_job_title)),
        ])),
        ("lorem", HostValue::object(vec![
            ("word", HostValue::function("word", faker_word)),
            ("words", HostValue::function("words", faker_words)),
            ("sentence", HostValue::function("sentence", faker_sentence)),
            ("paragraph", HostValue::function("paragraph", faker_paragraph)),
        ])),
        ("internet", HostValue::object(vec![
            ("email", HostValue::function("email", faker_email)),
            ("userName", HostValue::function("userName", faker_user_name)),
            ("avatar", HostValue::function("avatar", faker_avatar)),
            ("url", HostValue::function("url", faker_url)),
        ])),
        ("image", HostValue::object(vec![
            ("avatar", HostValue::function("avatar", faker_avatar)),
            ("imageUrl", HostValue::function("imageUrl", faker_image_url)),
        ])),
        ("company", HostValue::object(vec![
            ("companyName", HostValue::function("companyName", faker_company_name)),
            ("catchPhrase", HostValue::function("catchPhrase", faker_catch_phrase)),
        ])),
        ("address", HostValue::object(vec![
            ("city", HostValue::function("city", faker_city)),
            ("streetAddress", HostValue::function("streetAddress", faker_street_address)),
            ("country", HostValue::function("country", faker_country)),
        ])),
        ("random", HostValue::object(vec![
            ("number", HostValue::function("number", faker_number)),
            ("boolean", HostValue::function("boolean", faker_boolean)),
            ("word", HostValue::function("word", faker_word)),
            ("arrayElement", HostValue::function("arrayElement", lodash_sample)),
        ])),
    ])
}

fn faker_first_name<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, FIRST_NAMES)))
}

fn faker_last_name<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, LAST_NAMES)))
}

fn faker_find_name<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let first = pick(interp, FIRST_NAMES);
    let last = pick(interp, LAST_NAMES);
    Ok(Value::string(&format!("{} {}", first, last)))
}

fn faker_job_title<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, JOB_TITLES)))
}

fn faker_word<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, LOREM_WORDS)))
}

fn lorem_words(interp: &mut Interpreter<'_>, count: usize) -> Vec<&'static str> {
    (0..count).map(|_| pick(interp, LOREM_WORDS)).collect()
}

fn faker_words<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let count = match arg(&args, 0) {
        Value::Number(n) if n >= 1.0 => n.min(100.0) as usize,
        _ => 3,
    };
    Ok(Value::string(&lorem_words(interp, count).join(" ")))
}

fn sentence(interp: &mut Interpreter<'_>) -> String {
    let count = 4 + (interp.random() * 6.0) as usize;
    format!("{}.", upper_first(&lorem_words(interp, count).join(" ")))
}

fn faker_sentence<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&sentence(interp)))
}

fn faker_paragraph<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let sentences: Vec<String> = (0..3).map(|_| sentence(interp)).collect();
    Ok(Value::string(&sentences.join(" ")))
}

fn faker_user_name<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let first = pick(interp, FIRST_NAMES).to_lowercase();
    let number = (interp.random() * 100.0) as u32;
    Ok(Value::string(&format!("{}{}", first, number)))
}

fn faker_email<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let first = pick(interp, FIRST_NAMES).to_lowercase();
    let last = pick(interp, LAST_NAMES).to_lowercase();
    let domain = pick(interp, DOMAINS);
    Ok(Value::string(&format!("{}.{}@{}", first, last, domain)))
}

fn faker_avatar<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let first = pick(interp, FIRST_NAMES).to_lowercase();
    Ok(Value::string(&format!("/images/avatar/small/{}.jpg", first)))
}

fn faker_url<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(&format!("https://{}", pick(interp, DOMAINS))))
}

fn faker_image_url<'a>(_: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let width = match arg(&args, 0) {
        Value::Number(n) => n,
        _ => 640.0,
    };
    let height = match arg(&args, 1) {
        Value::Number(n) => n,
        _ => 480.0,
    };
    Ok(Value::string(&format!("https://placehold.it/{}x{}", width, height)))
}

fn faker_company_name<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let last = pick(interp, LAST_NAMES);
    let suffix = pick(interp, COMPANY_SUFFIXES);
    Ok(Value::string(&format!("{} {}", last, suffix)))
}

fn faker_catch_phrase<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, CATCH_PHRASES)))
}

fn faker_city<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, CITIES)))
}

fn faker_street_address<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    let number = 1 + (interp.random() * 999.0) as u32;
    Ok(Value::string(&format!("{} {}", number, pick(interp, STREETS))))
}

fn faker_country<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::string(pick(interp, COUNTRIES)))
}

/// `faker.random.number(max)` or `faker.random.number({ min, max })`.
fn faker_number<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
    let options = arg(&args, 0);
    let (min, max) = match &options {
        Value::Number(max) => (0.0, *max),
        Value::Object(_) => {
            let min = interp.get(&options, "min")?;
            let max = interp.get(&options, "max")?;
            (
                if min.is_nullish() { 0.0 } else { min.to_number() },
                if max.is_nullish() { 99999.0 } else { max.to_number() },
            )
        }
        _ => (0.0, 99999.0),
    };
    if max < min {
        return Err(Fault::Throw(crate::intrinsics::make_error(
            "RangeError",
            "faker.random.number: max must be at least min",
        )));
    }
    Ok(Value::Number((min + interp.random() * (max - min + 1.0)).floor().min(max)))
}

fn faker_boolean<'a>(interp: &mut Interpreter<'a>, _: Value<'a>, _: Vec<Value<'a>>) -> Completion<'a> {
    Ok(Value::Bool(interp.random() < 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Limits;

    #[test]
    fn test_standard_registry_symbols() {
        let registry = standard_registry();
        let symbols: Vec<&str> = registry.symbols().collect();
        assert_eq!(symbols, vec!["FAKER", "LODASH", "REACT", "SEMANTIC_UI_REACT"]);
        assert!(registry.resolve("WIREFRAME", "any/path").is_some());
    }

    #[test]
    fn test_create_element_splits_key_and_children() {
        let mut interp = Interpreter::new(Limits::default());
        let config = Value::plain_object(vec![
            ("key", Value::Number(1.0)),
            ("ref", Value::Null),
            ("id", Value::string("main")),
        ]);
        let element = create_element(
            &mut interp,
            Value::Undefined,
            vec![Value::string("div"), config, Value::string("a"), Value::string("b")],
        )
        .unwrap();

        assert_eq!(interp.get(&element, "key").unwrap().to_js_string(), "1");
        let props = interp.get(&element, "props").unwrap();
        assert!(!own_entries(&props).iter().any(|(k, _)| &**k == "ref"));
        assert_eq!(interp.get(&props, "children").unwrap().to_js_string(), "a,b");
    }

    #[test]
    fn test_render_host_classes() {
        let mut interp = Interpreter::new(Limits::default());
        let props = Value::plain_object(vec![
            ("primary", Value::Bool(true)),
            ("size", Value::string("large")),
            ("className", Value::string("extra")),
            ("content", Value::string("Click")),
        ]);
        let element = render_host(&mut interp, &semantic("Button", "button", "button", true), &props).unwrap();
        let props = interp.get(&element, "props").unwrap();
        assert_eq!(
            interp.get(&props, "className").unwrap().to_js_string(),
            "ui large primary button extra"
        );
        assert_eq!(interp.get(&props, "children").unwrap().to_js_string(), "Click");
    }

    #[test]
    fn test_lodash_case_helpers() {
        let mut interp = Interpreter::new(Limits::default());
        let input = vec![Value::string("helloWorld example")];
        let kebab = lodash_kebab_case(&mut interp, Value::Undefined, input.clone()).unwrap();
        assert_eq!(kebab.to_js_string(), "hello-world-example");
        let start = lodash_start_case(&mut interp, Value::Undefined, input).unwrap();
        assert_eq!(start.to_js_string(), "Hello World Example");
    }

    #[test]
    fn test_faker_is_deterministic_per_run() {
        let mut first = Interpreter::new(Limits::default());
        let mut second = Interpreter::new(Limits::default());
        let a = faker_find_name(&mut first, Value::Undefined, vec![]).unwrap();
        let b = faker_find_name(&mut second, Value::Undefined, vec![]).unwrap();
        assert_eq!(a.to_js_string(), b.to_js_string());
    }
}
