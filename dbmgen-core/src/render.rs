//! Generated artifact rendering.
//!
//! A [`ModelDescriptor`] is written out as a CommonJS module whose exported
//! object literal mirrors the descriptor: nested maps become multi-line
//! braces indented two spaces per level, scalars use JavaScript literal
//! syntax and lifecycle hooks are emitted as anonymous functions.

use crate::models::{AttributeDescriptor, AttributeEntry, DefaultValue, ModelDescriptor};
use std::sync::OnceLock;

/// First line of every generated artifact
pub const ARTIFACT_HEADER: &str = "/* eslint semi: off */";

/// JavaScript value tree used for rendering
#[derive(Debug, Clone, PartialEq)]
enum JsValue {
    Object(Vec<(String, JsValue)>),
    Array(Vec<JsValue>),
    Str(String),
    Num(f64),
    Bool(bool),
    Function(&'static str),
}

/// Formats a string as a JavaScript literal.
///
/// Single quotes are preferred; text containing single quotes switches to
/// double quotes, then to backticks, and only escapes the quote when all
/// three occur.
///
/// # Example
/// ```rust
/// use dbmgen_core::render::js_string_literal;
///
/// assert_eq!(js_string_literal("plain"), "'plain'");
/// assert_eq!(js_string_literal("it's"), "\"it's\"");
/// ```
pub fn js_string_literal(text: &str) -> String {
    let quote = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else if !text.contains('`') && !text.contains("${") {
        '`'
    } else {
        '\''
    };

    let mut literal = String::with_capacity(text.len() + 2);
    literal.push(quote);
    for c in text.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{8}' => literal.push_str("\\b"),
            '\u{c}' => literal.push_str("\\f"),
            '\u{b}' => literal.push_str("\\v"),
            c if c == quote => {
                literal.push('\\');
                literal.push(c);
            }
            c if c.is_control() => literal.push_str(&format!("\\x{:02X}", u32::from(c))),
            c => literal.push(c),
        }
    }
    literal.push(quote);
    literal
}

/// Formats a number the way JavaScript prints it.
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

fn default_value(value: &DefaultValue) -> JsValue {
    match value {
        DefaultValue::Bool(b) => JsValue::Bool(*b),
        DefaultValue::Number(n) => JsValue::Num(*n),
        DefaultValue::Text(text) => JsValue::Str(text.clone()),
    }
}

fn attribute_value(attribute: &AttributeDescriptor) -> JsValue {
    let mut fields: Vec<(String, JsValue)> = Vec::new();
    let mut push = |key: &str, value: JsValue| fields.push((key.to_string(), value));

    if let Some(comment) = &attribute.comment {
        push("comment", JsValue::Str(comment.clone()));
    }
    if let Some(column_name) = &attribute.column_name {
        push("columnName", JsValue::Str(column_name.clone()));
    }
    push("type", JsValue::Str(attribute.type_name.clone()));
    if let Some(choices) = &attribute.enum_choices {
        push(
            "enum",
            JsValue::Array(choices.iter().cloned().map(JsValue::Str).collect()),
        );
    }
    if let Some(column_type) = &attribute.column_type {
        push("columnType", JsValue::Str(column_type.clone()));
    }
    if let Some(default) = &attribute.default_value {
        push("defaultsTo", default_value(default));
    }
    let flags = [
        ("autoCreatedAt", attribute.auto_created_at),
        ("autoUpdatedAt", attribute.auto_updated_at),
        ("autoIncrement", attribute.auto_increment),
        ("required", attribute.required),
        ("unique", attribute.unique),
        ("primaryKey", attribute.primary_key),
        ("allowNull", attribute.allow_null),
    ];
    for (key, set) in flags {
        if set {
            push(key, JsValue::Bool(true));
        }
    }

    JsValue::Object(fields)
}

fn descriptor_value(descriptor: &ModelDescriptor) -> JsValue {
    let attributes = descriptor
        .attributes
        .iter()
        .map(|(key, entry)| {
            let value = match entry {
                AttributeEntry::Column(attribute) => attribute_value(attribute),
                AttributeEntry::Disabled => JsValue::Bool(false),
            };
            (key.clone(), value)
        })
        .collect();

    let mut fields = vec![
        (
            "tableName".to_string(),
            JsValue::Str(descriptor.table_name.clone()),
        ),
        ("attributes".to_string(), JsValue::Object(attributes)),
    ];
    if let Some(primary_key) = &descriptor.primary_key {
        fields.push(("primaryKey".to_string(), JsValue::Str(primary_key.clone())));
    }
    for hook in descriptor.lifecycle.iter() {
        fields.push((hook.name().to_string(), JsValue::Function(hook.source())));
    }

    JsValue::Object(fields)
}

fn anonymous_function_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"function \w+\s*\(").expect("Invalid function signature pattern")
    })
}

fn comment_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"(?m)(\{)\n\s*comment:\s*'(.*)',?")
            .expect("Invalid attribute comment pattern")
    })
}

fn render_scalar(value: &JsValue, indent: &str) -> String {
    match value {
        JsValue::Object(fields) => render_object(fields, indent),
        JsValue::Array(items) if items.is_empty() => "[]".to_string(),
        JsValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(|item| render_scalar(item, indent)).collect();
            format!("[ {} ]", rendered.join(", "))
        }
        JsValue::Str(text) => js_string_literal(text),
        JsValue::Num(n) => js_number(*n),
        JsValue::Bool(b) => b.to_string(),
        JsValue::Function(source) => anonymous_function_pattern()
            .replace(source, "function (")
            .replace('\n', &format!("\n{}  ", indent)),
    }
}

fn render_object(fields: &[(String, JsValue)], indent: &str) -> String {
    let nested = format!("{}  ", indent);
    let mut lines = vec!["{".to_string()];
    for (key, value) in fields {
        let rendered = match value {
            JsValue::Object(inner) => render_object(inner, &nested),
            other => render_scalar(other, indent),
        };
        lines.push(format!("{}{}: {},", nested, key, rendered));
    }
    let mut body = lines.join("\n");
    if body.ends_with(',') {
        body.pop();
    }
    format!("{}\n{}}}", body, indent)
}

/// Renders the descriptor as a JavaScript object literal.
pub fn render_descriptor(descriptor: &ModelDescriptor) -> String {
    match descriptor_value(descriptor) {
        JsValue::Object(fields) => render_object(&fields, ""),
        other => render_scalar(&other, ""),
    }
}

/// Renders the complete generated artifact.
///
/// The file holds the lint directive, the table comment block (or an empty
/// line), the exported descriptor and a trailing newline. Attribute
/// comments are then folded onto the opening brace as `{ // text`.
///
/// # Example
/// ```rust
/// use dbmgen_core::descriptor::{build, BuildOptions};
/// use dbmgen_core::models::{CatalogTable, ColumnMetadata, SchemaVersion};
/// use dbmgen_core::render::render_artifact;
///
/// let table = CatalogTable::new("user", vec![ColumnMetadata::new("id", "int(11)")]);
/// let artifact = render_artifact(&build(&table, &BuildOptions::new(SchemaVersion::Legacy)));
/// assert!(artifact.starts_with("/* eslint semi: off */\n\nmodule.exports = {"));
/// assert!(artifact.ends_with("};\n"));
/// ```
pub fn render_artifact(descriptor: &ModelDescriptor) -> String {
    let comment_block = descriptor
        .table_comment
        .as_deref()
        .map(|comment| format!("/**\n * {}\n */", comment.replace("*/", "*\\/")))
        .unwrap_or_default();

    let document = [
        ARTIFACT_HEADER.to_string(),
        comment_block,
        format!("module.exports = {};", render_descriptor(descriptor)),
        String::new(),
    ]
    .join("\n");

    comment_pattern()
        .replace_all(&document, "$1 // $2")
        .into_owned()
}
