//! Canonical text emission for values.
//!
//! The output is the parseable subset of the codec where one exists
//! (scalars, strings, vectors, dicts) and a diagnostic form where it does
//! not (`&(nil)` / `&(0x...)` for opaque pointers, bare hex for chunks,
//! quoted messages for error values). Composites emit `", "`-joined items
//! inside `[]` / `{}` with `k: v` pairs. Dict entries are written in the
//! backend's iteration order, so serialization is deterministic exactly
//! when the backend's order is.

use std::fmt::Write as _;

use crate::value::{Handlers, MAX_DEPTH, Value};

/// Serializes a value into a fresh string with no opaque-payload handlers.
pub fn value_to_text(v: &Value) -> String {
    let mut out = String::new();
    write_value(v, &mut out, &Handlers::default());
    out
}

/// Appends the canonical text form of `v` to `out`.
///
/// `handlers.serialize`, if present, renders opaque `Ptr` payloads; nested
/// dicts use their own handler set for their entries.
///
/// # Panics
/// If nesting exceeds [`MAX_DEPTH`].
pub fn write_value(v: &Value, out: &mut String, handlers: &Handlers) {
    write_value_at(v, out, handlers, 0);
}

pub(crate) fn write_value_at(v: &Value, out: &mut String, handlers: &Handlers, depth: usize) {
    if depth > MAX_DEPTH {
        panic!("serialization exceeds the maximum nesting depth of {MAX_DEPTH}");
    }
    match v {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Size(s) => {
            let _ = write!(out, "{s}");
        }
        Value::Real(r) => write_real(*r, out),
        Value::Str(s) => write_quoted(s, out),
        Value::Error(e) => write_quoted(e, out),
        Value::Chunk(c) => {
            for b in c.iter() {
                let _ = write!(out, "{b:02x}");
            }
        }
        Value::Ptr(p) => match handlers.serialize {
            Some(f) => f(*p, out),
            None if *p == 0 => out.push_str("&(nil)"),
            None => {
                let _ = write!(out, "&({p:#x})");
            }
        },
        Value::Vector(items) => {
            out.push('[');
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value_at(item, out, handlers, depth + 1);
            }
            out.push(']');
        }
        Value::Dict(d) => d.borrow().write_to(out, depth),
    }
}

/// Double-quotes and escapes a string. The reverse of the parser's escape
/// handling: printable bytes pass through, common escapes get their short
/// form, remaining control characters become `\u00XX`.
fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Shortest round-trip decimal for a double. Plain decimal notation for
/// moderate magnitudes, normalized scientific (`e` with explicit sign and
/// at least two exponent digits) when the decimal exponent is 16 or more,
/// or below -5.
fn write_real(r: f64, out: &mut String) {
    if !r.is_finite() {
        let _ = write!(out, "{r}");
        return;
    }
    let sci = format!("{r:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        let _ = write!(out, "{r}");
        return;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        let _ = write!(out, "{r}");
        return;
    };
    if exp >= 16 || exp < -5 {
        let _ = write!(out, "{mantissa}e{exp:+03}");
    } else {
        let _ = write!(out, "{r}");
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        write_value(self, &mut out, &Handlers::default());
        f.write_str(&out)
    }
}
