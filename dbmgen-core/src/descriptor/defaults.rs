//! Coercion of raw catalog default literals.

use crate::models::{DefaultValue, TargetType};
use std::sync::OnceLock;

/// Literal reported by the catalog for engine-populated datetime defaults
pub(crate) const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

fn boolean_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r#"^b?['"]?([01])['"]?$"#).expect("Invalid boolean default pattern")
    })
}

/// Coerces a raw default literal for the given target type.
///
/// Absent and empty literals yield no default. Boolean columns accept
/// `b'1'`, `'0'`, `1` and similar forms; numeric kinds parse to `f64`.
/// Literals that do not fit their type are kept verbatim.
pub(crate) fn coerce_default(
    raw: Option<&str>,
    target: &TargetType,
    column: &str,
) -> Option<DefaultValue> {
    let raw = raw.filter(|value| !value.is_empty())?;

    if matches!(target, TargetType::Boolean) {
        return Some(match boolean_pattern().captures(raw.trim()) {
            Some(captures) => DefaultValue::Bool(&captures[1] == "1"),
            None => DefaultValue::Text(raw.to_string()),
        });
    }

    if target.is_numeric() {
        return Some(match raw.trim().trim_matches('\'').parse::<f64>() {
            Ok(number) => DefaultValue::Number(number),
            Err(_) => {
                tracing::warn!(
                    "Default '{}' of column '{}' is not numeric; keeping the literal",
                    raw,
                    column
                );
                DefaultValue::Text(raw.to_string())
            }
        });
    }

    Some(DefaultValue::Text(raw.to_string()))
}

/// Whether a coerced default is the numeric zero used by integer timestamps
pub(crate) fn is_zero(value: Option<&DefaultValue>) -> bool {
    matches!(value, Some(DefaultValue::Number(n)) if *n == 0.0)
}

/// Whether a coerced default is the engine-populated timestamp literal
pub(crate) fn is_current_timestamp(value: Option<&DefaultValue>) -> bool {
    matches!(value, Some(DefaultValue::Text(text)) if text == CURRENT_TIMESTAMP)
}
