//! Naming helpers for renderers
//!
//! Renderers need the same handful of conversions no matter what they emit:
//! identifier casing, numeric literals in a type's base, and a test for
//! "is this value a serialized type node". Words are split on spaces,
//! hyphens and underscores.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::model::TypeTag;

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[ \-_]").expect("separator pattern is valid"))
}

fn words(input: &str) -> Vec<&str> {
    separators().split(input).collect()
}

/// `max item count` -> `maxItemCount`
pub fn camel_case(input: &str) -> String {
    let mut parts = words(input).into_iter();
    let mut result = parts.next().map(str::to_lowercase).unwrap_or_default();
    for part in parts {
        result.push_str(&title_case(part));
    }
    result
}

/// `max-item_count` -> `MaxItemCount`
pub fn pascal_case(input: &str) -> String {
    words(input).into_iter().map(title_case).collect()
}

/// `Max Item-Count` -> `max_item_count`
pub fn snake_case(input: &str) -> String {
    words(input)
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Uppercase every letter that follows a non-letter, lowercase the rest
pub fn title_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut capitalize_next = true;

    for c in input.chars() {
        if c.is_alphabetic() {
            if capitalize_next {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            capitalize_next = false;
        } else {
            result.push(c);
            capitalize_next = true;
        }
    }

    result
}

/// Integer literal in `base`: `0b…`, `0…` (octal), decimal or `0x…`.
///
/// Other bases print decimal; non-integers pass through unchanged.
pub fn format_base(value: &Value, base: u32) -> String {
    let number = match value {
        Value::Number(n) => n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from)),
        _ => None,
    };

    let Some(number) = number else {
        return match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    };

    let sign = if number < 0 { "-" } else { "" };
    let magnitude = number.unsigned_abs();
    match base {
        2 => format!("0b{}{:b}", sign, magnitude),
        8 => format!("0{}{:o}", sign, magnitude),
        16 => format!("0x{}{:X}", sign, magnitude),
        _ => number.to_string(),
    }
}

/// Whether `value` is a serialized type node
pub fn is_type(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    let has_name = map.get("name").map_or(false, Value::is_string);
    let known_tag = map
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |tag| TypeTag::all().iter().any(|t| t.as_str() == tag));
    has_name && known_tag
}

/// Parse an inline mapping literal such as `{a: 1, 'b': "two"}`
pub fn str_to_dict(text: &str) -> Result<Map<String, Value>, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_casing() {
        assert_eq!(camel_case("max item-count"), "maxItemCount");
        assert_eq!(camel_case("HTTP_port"), "httpPort");
        assert_eq!(pascal_case("max-item_count"), "MaxItemCount");
        assert_eq!(pascal_case("string_array"), "StringArray");
        assert_eq!(snake_case("Max Item-Count"), "max_item_count");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello world"), "Hello World");
        assert_eq!(title_case("they're"), "They'Re");
        assert_eq!(title_case("x2y"), "X2Y");
        assert_eq!(title_case("LOUD"), "Loud");
    }

    #[test]
    fn test_format_base() {
        assert_eq!(format_base(&json!(5), 2), "0b101");
        assert_eq!(format_base(&json!(8), 8), "010");
        assert_eq!(format_base(&json!(255), 16), "0xFF");
        assert_eq!(format_base(&json!(42), 10), "42");
        assert_eq!(format_base(&json!(42), 7), "42");
        assert_eq!(format_base(&json!(-5), 2), "0b-101");
        assert_eq!(format_base(&json!("0x10"), 16), "0x10");
        assert_eq!(format_base(&json!(1.5), 16), "1.5");
    }

    #[test]
    fn test_is_type() {
        assert!(is_type(&json!({"name": "port", "type": "uint"})));
        assert!(!is_type(&json!({"name": "port", "type": "tuple"})));
        assert!(!is_type(&json!({"type": "int"})));
        assert!(!is_type(&json!("int")));
    }

    #[test]
    fn test_str_to_dict() {
        let map = str_to_dict("{a: 1, 'b': \"two\"}").unwrap();
        assert_eq!(map.get("a"), Some(&json!(1)));
        assert_eq!(map.get("b"), Some(&json!("two")));
        assert!(str_to_dict("[1, 2]").is_err());
    }
}
