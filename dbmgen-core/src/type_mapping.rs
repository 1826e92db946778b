//! SQL column type to descriptor type inference.
//!
//! [`map_type`] is a total function: every input yields a [`TargetType`],
//! with [`TargetType::Unsupported`] and [`TargetType::Unknown`] acting as
//! diagnostic sentinels rather than errors.

use crate::models::{SchemaVersion, TargetType};

const INTEGER_PREFIXES: [&str; 5] = ["smallint", "mediumint", "tinyint", "bigint", "int"];
const FLOAT_PREFIXES: [&str; 2] = ["float", "decimal"];
const STRING_PREFIXES: [&str; 5] = ["string", "varchar", "varying", "nvarchar", "char"];

/// Maps a declared SQL column type to a descriptor type.
///
/// Matching is case-insensitive and the first matching rule wins. The
/// modern schema collapses numeric kinds into `number`, text variants into
/// `string` and models `datetime` as `ref`.
///
/// # Example
/// ```rust
/// use dbmgen_core::models::{SchemaVersion, TargetType};
/// use dbmgen_core::type_mapping::map_type;
///
/// assert_eq!(map_type("INT(11)", SchemaVersion::Legacy), TargetType::Integer);
/// assert_eq!(map_type("int(11)", SchemaVersion::Modern), TargetType::Number);
/// assert_eq!(map_type("datetime", SchemaVersion::Modern), TargetType::Ref);
/// ```
pub fn map_type(sql_type: &str, version: SchemaVersion) -> TargetType {
    let declared = sql_type.trim();
    let lower = declared.to_lowercase();
    let t = lower.as_str();
    let modern = version.is_modern();

    if matches!(t, "tinyint(1)" | "boolean" | "bit(1)") {
        return TargetType::Boolean;
    }

    if has_prefix(t, &INTEGER_PREFIXES) {
        return if modern {
            TargetType::Number
        } else {
            TargetType::Integer
        };
    }

    if has_prefix(t, &FLOAT_PREFIXES) {
        return if modern {
            TargetType::Number
        } else {
            TargetType::Float
        };
    }

    if has_prefix(t, &STRING_PREFIXES) {
        return TargetType::String;
    }

    let text_variant = if t.starts_with("longtext") {
        Some(TargetType::LongText)
    } else if t.starts_with("mediumtext") {
        Some(TargetType::MediumText)
    } else if t.ends_with("text") {
        Some(TargetType::Text)
    } else {
        None
    };
    if let Some(variant) = text_variant {
        return if modern { TargetType::String } else { variant };
    }

    // `datetime(6)` falls through to the `date` prefix below
    if t == "datetime" {
        return if modern {
            TargetType::Ref
        } else {
            TargetType::DateTime
        };
    }

    if t.starts_with("date") {
        return TargetType::Date;
    }

    if t.starts_with("time") {
        return TargetType::Unsupported;
    }

    if t.starts_with("json") {
        return TargetType::Json;
    }

    if t.starts_with("enum") {
        return match parse_enum_choices(t) {
            Some(choices) => TargetType::Enum(choices),
            None => TargetType::Unknown,
        };
    }

    TargetType::Unknown
}

fn has_prefix(t: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| t.starts_with(prefix))
}

/// Parses the choice list of an `enum(...)` declaration.
///
/// Choices keep their declared order and are lowercased, so the result
/// does not depend on the case of the declaration. Quotes and surrounding
/// whitespace are stripped, a doubled quote inside a quoted choice is an
/// escaped quote, and duplicates are removed. Returns `None` when the list
/// is missing, unterminated or empty.
pub fn parse_enum_choices(declared: &str) -> Option<Vec<String>> {
    let lower = declared.trim().to_lowercase();
    let rest = lower.get(4..)?.trim_start();
    let inner = rest.strip_prefix('(')?;
    let close = inner.rfind(')')?;
    let body = inner.get(..close)?;

    let mut choices = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) if c == '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => quote = Some(c),
                ',' => push_choice(&mut choices, &mut current),
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return None;
    }
    push_choice(&mut choices, &mut current);

    if choices.is_empty() {
        None
    } else {
        Some(choices)
    }
}

fn push_choice(choices: &mut Vec<String>, current: &mut String) {
    let choice = current.trim().to_string();
    current.clear();
    if !choice.is_empty() && !choices.contains(&choice) {
        choices.push(choice);
    }
}
