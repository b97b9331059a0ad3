//! Deterministic JSON rendering: sorted keys, canonical impact order, numbers
//! rounded to six significant digits.

use crate::numeric::round_significant;
use ecoforge_schemas::impacts::Trigram;
use serde_json::Value;
use std::cmp::Ordering;

pub const SIGNIFICANT_DIGITS: usize = 6;
const INDENT: &str = "  ";

/// Exact zero is written `0`; anything else with six significant digits, using an
/// exponent only for very small or very large magnitudes.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return String::from("0");
    }
    let rounded = round_significant(value, SIGNIFICANT_DIGITS);
    let magnitude = rounded.abs();
    if (1e-4..1e16).contains(&magnitude) {
        format!("{rounded}")
    } else {
        format!("{rounded:e}")
    }
}

/// The whole document, newline-terminated.
pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0, false);
    out.push('\n');
    out
}

fn compare_keys(a: &str, b: &str, trigram_order: bool) -> Ordering {
    if trigram_order {
        if let (Ok(ta), Ok(tb)) = (a.parse::<Trigram>(), b.parse::<Trigram>()) {
            return ta.cmp(&tb);
        }
    }
    a.cmp(b)
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_string(out: &mut String, s: &str) {
    // serializing a str cannot fail
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

fn write_value(out: &mut String, value: &Value, depth: usize, trigram_order: bool) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&i.to_string()),
            (_, Some(u), _) => out.push_str(&u.to_string()),
            (_, _, Some(f)) => out.push_str(&format_number(f)),
            _ => out.push_str(&n.to_string()),
        },
        Value::String(s) => push_string(out, s),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(out, depth + 1);
                write_value(out, item, depth + 1, false);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| compare_keys(a, b, trigram_order));
            out.push_str("{\n");
            for (i, key) in keys.iter().enumerate() {
                push_indent(out, depth + 1);
                push_string(out, key);
                out.push_str(": ");
                write_value(out, &map[key.as_str()], depth + 1, key.as_str() == "impacts");
                if i + 1 < keys.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}
