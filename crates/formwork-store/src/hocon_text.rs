//! Minimal HOCON renderer.
//!
//! The `hocon` crate only parses, so writing `template.conf` back in HOCON
//! form needs a serializer of our own. Output is deterministic: `key = value`
//! leaves, `key { ... }` blocks with a two-space indent, and keys in sorted
//! order (the underlying map already iterates sorted). Everything this
//! renderer emits parses back through [`crate::codec::HoconCodec`].

use serde_json::{Map, Value};

/// Render a document as HOCON text. A top-level object renders as bare
/// `key = value` lines; any other top-level value renders on a line of its
/// own.
pub fn render(document: &Value) -> String {
    let mut out = String::new();
    match document.as_object() {
        Some(fields) => render_fields(fields, 0, &mut out),
        None => {
            render_value(document, &mut out);
            out.push('\n');
        }
    }
    out
}

fn render_fields(fields: &Map<String, Value>, depth: usize, out: &mut String) {
    for (key, value) in fields {
        push_indent(depth, out);
        match value {
            Value::Object(nested) => {
                out.push_str(&format!("{} {{\n", render_key(key)));
                render_fields(nested, depth + 1, out);
                push_indent(depth, out);
                out.push_str("}\n");
            }
            leaf => {
                out.push_str(&format!("{} = ", render_key(key)));
                render_value(leaf, out);
                out.push('\n');
            }
        }
    }
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => out.push_str(&quote(text)),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                render_value(item, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            // Objects nested inside arrays render inline.
            out.push('{');
            for (index, (key, value)) in fields.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_key(key));
                out.push_str(" = ");
                render_value(value, out);
            }
            out.push('}');
        }
    }
}

/// Keys render bare when they look like identifiers, quoted otherwise.
fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        None => false,
    };
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
