//! Serialization of configuration objects into Icinga 2 DSL.

use influxdb2_feature_domain::{AttrValue, ObjectSpec};

/// First line of every object file this crate writes.
pub const MANAGED_HEADER: &str = "# This file is managed by influxdb2-feature. DO NOT EDIT.\n";

const INDENT: &str = "  ";

/// Words the Icinga 2 parser reserves; map keys spelled like one are quoted.
const KEYWORDS: &[&str] = &[
    "apply", "assign", "break", "const", "continue", "default", "else", "except", "false", "for",
    "function", "globals", "if", "ignore", "ignore_on_error", "import", "in", "include",
    "include_recursive", "include_zones", "library", "locals", "namespace", "null", "object",
    "return", "template", "this", "throw", "to", "true", "try", "use", "using", "var", "where",
    "while",
];

/// Renders one object block, terminated by a newline.
pub fn render_object(spec: &ObjectSpec) -> String {
    let mut out = format!(
        "object {} {} {{\n",
        spec.object_type,
        quote(&spec.object_name)
    );
    for (key, value) in spec.attrs.layout() {
        write_entry(&mut out, 1, key, value);
    }
    out.push_str("}\n");
    out
}

fn write_entry(out: &mut String, depth: usize, key: &str, value: &AttrValue) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(&format_key(key));
    out.push_str(" = ");
    write_value(out, depth, value);
    out.push('\n');
}

fn write_value(out: &mut String, depth: usize, value: &AttrValue) {
    match value {
        AttrValue::String(text) => out.push_str(&quote(text)),
        AttrValue::Secret(secret) => out.push_str(&quote(secret.expose())),
        AttrValue::Integer(number) => out.push_str(&number.to_string()),
        AttrValue::Boolean(flag) => out.push_str(if *flag { "true" } else { "false" }),
        AttrValue::Interval(interval) => out.push_str(interval),
        AttrValue::Map(entries) if entries.is_empty() => out.push_str("{}"),
        AttrValue::Map(entries) => {
            out.push_str("{\n");
            for (key, value) in entries {
                write_entry(out, depth + 1, key, value);
            }
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
        }
    }
}

fn format_key(key: &str) -> String {
    if is_identifier(key) && !KEYWORDS.contains(&key) {
        key.to_owned()
    } else {
        quote(key)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
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
