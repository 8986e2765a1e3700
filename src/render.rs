//! Render Module for the Example Playground
//!
//! Mounts a sandbox element into an owned `markup::Node` tree: host tags,
//! fragments, class components, function components and the built-in host
//! components. Mount errors use the messages React reports for the same
//! mistakes.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::interpreter::{callable_of, own_entries, type_error, Fault, Interpreter};
use crate::markup::Node;
use crate::value::{Callable, ObjectKind, Value};

lazy_static! {
    /// Prop names whose DOM attribute is spelled differently.
    static ref ATTRIBUTE_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("className", "class");
        m.insert("htmlFor", "for");
        m.insert("httpEquiv", "http-equiv");
        m.insert("acceptCharset", "accept-charset");
        m.insert("tabIndex", "tabindex");
        m.insert("readOnly", "readonly");
        m.insert("autoFocus", "autofocus");
        m.insert("autoComplete", "autocomplete");
        m.insert("autoPlay", "autoplay");
        m.insert("maxLength", "maxlength");
        m.insert("minLength", "minlength");
        m.insert("colSpan", "colspan");
        m.insert("rowSpan", "rowspan");
        m.insert("cellPadding", "cellpadding");
        m.insert("cellSpacing", "cellspacing");
        m.insert("contentEditable", "contenteditable");
        m.insert("crossOrigin", "crossorigin");
        m.insert("encType", "enctype");
        m.insert("formNoValidate", "formnovalidate");
        m.insert("noValidate", "novalidate");
        m.insert("spellCheck", "spellcheck");
        m.insert("srcSet", "srcset");
        m.insert("useMap", "usemap");
        m.insert("allowFullScreen", "allowfullscreen");
        m.insert("playsInline", "playsinline");
        m.insert("itemScope", "itemscope");
        m.insert("defaultValue", "value");
        m.insert("defaultChecked", "checked");
        m
    };
}

/// Attributes rendered as `name=""` when true and dropped when false.
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen", "async", "autofocus", "autoplay", "checked", "controls", "default", "defer",
    "disabled", "formnovalidate", "hidden", "itemscope", "loop", "multiple", "muted", "novalidate",
    "open", "playsinline", "readonly", "required", "reversed", "scoped", "seamless", "selected",
];

/// Attributes that accept the strings `"true"` / `"false"`.
const BOOLEANISH_ATTRIBUTES: &[&str] = &["contenteditable", "draggable", "spellcheck", "value"];

/// Props that never become attributes.
const RESERVED_PROPS: &[&str] = &[
    "children",
    "key",
    "ref",
    "dangerouslySetInnerHTML",
    "suppressContentEditableWarning",
    "suppressHydrationWarning",
];

const UNITLESS_STYLES: &[&str] = &[
    "animationIterationCount", "borderImageOutset", "borderImageSlice", "borderImageWidth",
    "boxFlex", "boxFlexGroup", "columnCount", "columns", "flex", "flexGrow", "flexPositive",
    "flexShrink", "flexNegative", "flexOrder", "fontWeight", "gridRow", "gridColumn",
    "lineClamp", "lineHeight", "opacity", "order", "orphans", "tabSize", "widows", "zIndex",
    "zoom", "fillOpacity", "floodOpacity", "stopOpacity", "strokeDasharray",
    "strokeDashoffset", "strokeMiterlimit", "strokeOpacity", "strokeWidth",
];

/// Mount `value` (an element, text, array or nothing) into a node tree.
pub fn mount<'a>(interp: &mut Interpreter<'a>, value: &Value<'a>) -> Result<Node, Fault<'a>> {
    interp.tick()?;
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) => Ok(Node::empty()),
        Value::String(s) => Ok(Node::text(s.to_string())),
        Value::Number(_) => Ok(Node::text(value.to_js_string())),
        Value::Object(obj) => {
            let shape = match &obj.borrow().kind {
                ObjectKind::Element(record) => {
                    Shape::Element(record.ty.clone(), Value::Object(record.props.clone()))
                }
                ObjectKind::Array(items) => Shape::Items(items.clone()),
                ObjectKind::Function(_) => Shape::Nothing,
                _ => Shape::Plain,
            };
            interp.enter_mount()?;
            let mounted = match shape {
                Shape::Element(ty, props) => mount_element(interp, &ty, &props),
                Shape::Items(items) => mount_children(interp, &items),
                Shape::Nothing => Ok(Node::empty()),
                Shape::Plain => {
                    let keys: Vec<String> = own_entries(value).into_iter().map(|(k, _)| k.to_string()).collect();
                    Err(type_error(format!(
                        "Objects are not valid as a React child (found: object with keys {{{}}}). \
                         If you meant to render a collection of children, use an array instead.",
                        keys.join(", ")
                    )))
                }
            };
            interp.leave_mount();
            mounted
        }
    }
}

enum Shape<'a> {
    Element(Value<'a>, Value<'a>),
    Items(Vec<Value<'a>>),
    Nothing,
    Plain,
}

fn mount_children<'a>(interp: &mut Interpreter<'a>, items: &[Value<'a>]) -> Result<Node, Fault<'a>> {
    let mut children = Vec::with_capacity(items.len());
    for item in items {
        children.push(mount(interp, item)?);
    }
    Ok(Node::Fragment { children })
}

fn mount_element<'a>(interp: &mut Interpreter<'a>, ty: &Value<'a>, props: &Value<'a>) -> Result<Node, Fault<'a>> {
    match ty {
        Value::String(tag) => mount_host(interp, tag, props),
        Value::Object(obj) if matches!(obj.borrow().kind, ObjectKind::Fragment) => {
            let children = interp.get(props, "children")?;
            mount(interp, &children)
        }
        _ => match callable_of(ty) {
            Some(Callable::Class(_)) => mount_class(interp, ty, props),
            Some(Callable::Native { .. }) if is_component_class(interp, ty) => {
                mount_class(interp, ty, props)
            }
            Some(_) => {
                interp.enter()?;
                let rendered = interp.call(ty, Value::Undefined, vec![props.clone()]);
                let result = rendered.and_then(|rendered| {
                    if matches!(rendered, Value::Undefined) {
                        return Err(type_error(format!(
                            "{}(...): Nothing was returned from render. This usually means a return \
                             statement is missing. Or, to render nothing, return null.",
                            component_name(interp, ty)
                        )));
                    }
                    mount(interp, &rendered)
                });
                interp.leave();
                result
            }
            None => Err(type_error(format!(
                "Element type is invalid: expected a string (for built-in components) or a \
                 class/function (for composite components) but got: {}.",
                describe_type(ty)
            ))),
        },
    }
}

/// Host classes such as `React.Component` mark their prototype.
fn is_component_class<'a>(interp: &Interpreter<'a>, ty: &Value<'a>) -> bool {
    match interp.get(ty, "prototype") {
        Ok(prototype) if !prototype.is_nullish() => interp
            .get(&prototype, "isReactComponent")
            .map_or(false, |marker| marker.truthy()),
        _ => false,
    }
}

fn mount_class<'a>(interp: &mut Interpreter<'a>, ty: &Value<'a>, props: &Value<'a>) -> Result<Node, Fault<'a>> {
    interp.enter()?;
    let result = render_instance(interp, ty, props);
    interp.leave();
    result
}

fn render_instance<'a>(interp: &mut Interpreter<'a>, ty: &Value<'a>, props: &Value<'a>) -> Result<Node, Fault<'a>> {
    let instance = interp.construct(ty, vec![props.clone()])?;
    interp.set(&instance, "props", props.clone())?;

    for hook in ["componentWillMount", "UNSAFE_componentWillMount"] {
        let method = interp.get(&instance, hook)?;
        if method.is_callable() {
            interp.call(&method, instance.clone(), vec![])?;
        }
    }

    let render = interp.get(&instance, "render")?;
    if !render.is_callable() {
        return Err(type_error(format!(
            "{}(...): No `render` method found on the returned component instance: you may \
             have forgotten to define `render`.",
            component_name(interp, ty)
        )));
    }
    let rendered = interp.call(&render, instance, vec![])?;
    if matches!(rendered, Value::Undefined) {
        return Err(type_error(format!(
            "{}(...): Nothing was returned from render. This usually means a return statement \
             is missing. Or, to render nothing, return null.",
            component_name(interp, ty)
        )));
    }
    mount(interp, &rendered)
}

fn component_name<'a>(interp: &Interpreter<'a>, ty: &Value<'a>) -> String {
    for key in ["displayName", "name"] {
        if let Ok(Value::String(name)) = interp.get(ty, key) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    "Component".to_string()
}

fn describe_type(ty: &Value<'_>) -> String {
    match ty {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Object(_) => {
            let keys: Vec<String> = own_entries(ty).into_iter().map(|(k, _)| k.to_string()).collect();
            format!("object with keys {{{}}}", keys.join(", "))
        }
        other => other.type_of().to_string(),
    }
}

fn mount_host<'a>(interp: &mut Interpreter<'a>, tag: &str, props: &Value<'a>) -> Result<Node, Fault<'a>> {
    let mut attributes = Vec::new();
    let mut inner_html = None;
    for (name, value) in own_entries(props) {
        if &*name == "dangerouslySetInnerHTML" {
            if !value.is_nullish() {
                inner_html = Some(interp.get(&value, "__html")?.to_js_string());
            }
            continue;
        }
        if RESERVED_PROPS.contains(&&*name) {
            continue;
        }
        if &*name == "style" {
            let style = style_attribute(&value);
            if !style.is_empty() {
                attributes.push(("style".to_string(), Some(style)));
            }
            continue;
        }
        if let Some(attribute) = attribute(&name, &value) {
            attributes.push(attribute);
        }
    }

    let children = match inner_html {
        Some(html) => vec![Node::Raw { html }],
        None => {
            let children = interp.get(props, "children")?;
            match mount(interp, &children)? {
                Node::Fragment { children } => children,
                node => vec![node],
            }
        }
    };
    Ok(Node::element(tag, attributes, children))
}

/// DOM attribute for one prop, or `None` when the prop does not render.
fn attribute(name: &str, value: &Value<'_>) -> Option<(String, Option<String>)> {
    if name.len() > 2 && name.starts_with("on") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let attr = ATTRIBUTE_ALIASES
        .get(name)
        .map(|a| a.to_string())
        .unwrap_or_else(|| name.to_string());

    match value {
        Value::Undefined | Value::Null => None,
        Value::Object(_) if value.is_callable() => None,
        Value::Bool(b) => {
            if BOOLEAN_ATTRIBUTES.contains(&attr.as_str()) {
                b.then(|| (attr, None))
            } else if attr.starts_with("aria-")
                || attr.starts_with("data-")
                || BOOLEANISH_ATTRIBUTES.contains(&attr.as_str())
            {
                Some((attr, Some(b.to_string())))
            } else {
                None
            }
        }
        _ if BOOLEAN_ATTRIBUTES.contains(&attr.as_str()) => {
            value.truthy().then(|| (attr, None))
        }
        _ => Some((attr, Some(value.to_js_string()))),
    }
}

/// `{ marginTop: 10, opacity: 0.5 }` → `margin-top:10px;opacity:0.5`.
pub fn style_attribute(style: &Value<'_>) -> String {
    let mut rules = Vec::new();
    for (name, value) in own_entries(style) {
        let rendered = match &value {
            Value::Undefined | Value::Null | Value::Bool(_) => continue,
            Value::String(s) if s.trim().is_empty() => continue,
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => {
                if *n != 0.0 && !UNITLESS_STYLES.contains(&&*name) && !name.starts_with("--") {
                    format!("{}px", value.to_js_string())
                } else {
                    value.to_js_string()
                }
            }
            other => other.to_js_string(),
        };
        rules.push(format!("{}:{}", hyphenate_style_name(&name), rendered));
    }
    rules.join(";")
}

fn hyphenate_style_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Limits;
    use crate::library::create_element;
    use crate::markup::render_to_static_markup;

    fn element<'a>(interp: &mut Interpreter<'a>, args: Vec<Value<'a>>) -> Value<'a> {
        create_element(interp, Value::Undefined, args).unwrap()
    }

    #[test]
    fn test_host_attributes() {
        let mut interp = Interpreter::new(Limits::default());
        let props = Value::plain_object(vec![
            ("className", Value::string("ui button")),
            ("disabled", Value::Bool(true)),
            ("hidden", Value::Bool(false)),
            ("aria-hidden", Value::Bool(true)),
            ("tabIndex", Value::Number(0.0)),
            ("onClick", Value::native("onClick", create_element)),
        ]);
        let el = element(&mut interp, vec![Value::string("button"), props, Value::string("Go")]);
        let node = mount(&mut interp, &el).unwrap();
        assert_eq!(
            render_to_static_markup(&node),
            "<button class=\"ui button\" disabled=\"\" aria-hidden=\"true\" tabindex=\"0\">Go</button>"
        );
    }

    #[test]
    fn test_style_serialization() {
        let style = Value::plain_object(vec![
            ("marginTop", Value::Number(10.0)),
            ("opacity", Value::Number(0.5)),
            ("padding", Value::Number(0.0)),
            ("msTransform", Value::string("none")),
            ("color", Value::Null),
        ]);
        assert_eq!(
            style_attribute(&style),
            "margin-top:10px;opacity:0.5;padding:0;-ms-transform:none"
        );
    }

    #[test]
    fn test_plain_object_child_is_rejected() {
        let mut interp = Interpreter::new(Limits::default());
        let child = Value::plain_object(vec![("a", Value::Number(1.0))]);
        let el = element(&mut interp, vec![Value::string("div"), Value::Null, child]);
        let err = mount(&mut interp, &el).unwrap_err();
        assert!(err.message().starts_with("Objects are not valid as a React child (found: object with keys {a})"));
    }

    #[test]
    fn test_invalid_element_type() {
        let mut interp = Interpreter::new(Limits::default());
        let el = element(&mut interp, vec![Value::Undefined]);
        let err = mount(&mut interp, &el).unwrap_err();
        assert!(err.message().contains("but got: undefined"));
    }

    #[test]
    fn test_self_containing_children_stop_at_mount_depth() {
        let mut interp = Interpreter::new(Limits::default());
        let items = Value::array(vec![]);
        if let Value::Object(obj) = &items {
            if let ObjectKind::Array(list) = &mut obj.borrow_mut().kind {
                list.push(items.clone());
            }
        }
        let el = element(&mut interp, vec![Value::string("p"), Value::Null, items.clone()]);
        let err = mount(&mut interp, &el).unwrap_err();
        assert_eq!(err.message(), "Maximum call stack size exceeded");

        // Release the cycle.
        if let Value::Object(obj) = &items {
            obj.borrow_mut().kind = ObjectKind::Array(Vec::new());
        }
    }

    #[test]
    fn test_mount_depth_is_released_after_each_level() {
        let limits = Limits {
            max_mount_depth: 8,
            ..Limits::default()
        };
        let mut interp = Interpreter::new(limits);
        let mut nested = Value::string("leaf");
        for _ in 0..3 {
            nested = element(&mut interp, vec![Value::string("b"), Value::Null, nested]);
        }
        for _ in 0..4 {
            let node = mount(&mut interp, &nested).unwrap();
            assert_eq!(render_to_static_markup(&node), "<b><b><b>leaf</b></b></b>");
        }
    }
}
