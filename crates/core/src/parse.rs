//! Recursive-descent parser for the text codec.
//!
//! The grammar is JSON with three relaxations: strings may be single- or
//! double-quoted, object keys may be arbitrary values, and arrays tolerate
//! exactly one trailing comma (objects tolerate none). Unknown backslash
//! escapes are taken literally.
//!
//! The first invalid token aborts the parse; [`ParseError`] carries its byte
//! offset. Number errors report the offset of the token start. Integer
//! literals that overflow `i64` fall back to `Real`. Nesting is bounded by
//! [`MAX_DEPTH`] composite levels; an over-deep opener is reported at its
//! own offset.

use crate::dict::Dict;
use crate::error::ParseError;
use crate::value::{MAX_DEPTH, Value};

/// Parses a complete value from `input`. Leading and trailing whitespace is
/// ignored; any other trailing bytes are an error at their offset.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    let mut p = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    p.skip_ws();
    let v = p.parse_value(0)?;
    p.skip_ws();
    if p.pos < p.bytes.len() {
        return Err(ParseError::at(p.pos));
    }
    Ok(v)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseError> {
        match self.bytes.get(self.pos).copied() {
            Some(b'[') => self.parse_array(depth),
            Some(b'{') => self.parse_object(depth),
            Some(b'"') | Some(b'\'') => self.parse_string(),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(b't') | Some(b'f') | Some(b'n') => self.parse_literal(),
            _ => Err(ParseError::at(self.pos)),
        }
    }

    fn parse_literal(&mut self) -> Result<Value, ParseError> {
        if self.literal(b"true") {
            Ok(Value::Bool(true))
        } else if self.literal(b"false") {
            Ok(Value::Bool(false))
        } else if self.literal(b"null") {
            Ok(Value::Null)
        } else {
            Err(ParseError::at(self.pos))
        }
    }

    /// Consumes the literal if it starts at the cursor.
    fn literal(&mut self, lit: &[u8]) -> bool {
        if self.bytes[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::at(self.pos));
        }
        self.pos += 1; // [
        let mut items = Vec::new();
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&b']') {
            self.pos += 1;
            return Ok(Value::vector(items));
        }
        loop {
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();
            match self.bytes.get(self.pos).copied() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    // one trailing comma is tolerated
                    if self.bytes.get(self.pos) == Some(&b']') {
                        self.pos += 1;
                        return Ok(Value::vector(items));
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::vector(items));
                }
                _ => return Err(ParseError::at(self.pos)),
            }
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::at(self.pos));
        }
        self.pos += 1; // {
        let mut dict = Dict::new();
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&b'}') {
            self.pos += 1;
            return Ok(Value::dict(dict));
        }
        loop {
            let key = self.parse_value(depth + 1)?;
            self.skip_ws();
            if self.bytes.get(self.pos) != Some(&b':') {
                return Err(ParseError::at(self.pos));
            }
            self.pos += 1;
            self.skip_ws();
            let value = self.parse_value(depth + 1)?;
            dict.put(key, value);
            self.skip_ws();
            match self.bytes.get(self.pos).copied() {
                // no trailing comma: the next loop turn must find a key
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::dict(dict));
                }
                _ => return Err(ParseError::at(self.pos)),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Value, ParseError> {
        let quote = self.bytes[self.pos];
        let start = self.pos;
        self.pos += 1;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.bytes.get(self.pos).copied() {
                None => return Err(ParseError::at(self.pos)),
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let esc_at = self.pos;
                    self.pos += 1;
                    match self.bytes.get(self.pos).copied() {
                        None => return Err(ParseError::at(self.pos)),
                        Some(b'n') => buf.push(b'\n'),
                        Some(b't') => buf.push(b'\t'),
                        Some(b'r') => buf.push(b'\r'),
                        Some(b'b') => buf.push(0x08),
                        Some(b'f') => buf.push(0x0C),
                        Some(b'\\') => buf.push(b'\\'),
                        Some(b'"') => buf.push(b'"'),
                        Some(b'\'') => buf.push(b'\''),
                        Some(b'u') => {
                            let c = self
                                .parse_unicode_escape()
                                .ok_or(ParseError::at(esc_at))?;
                            let mut enc = [0u8; 4];
                            buf.extend_from_slice(c.encode_utf8(&mut enc).as_bytes());
                            continue;
                        }
                        // unknown escapes pass through literally
                        Some(other) => buf.push(other),
                    }
                    self.pos += 1;
                }
                Some(b) => {
                    buf.push(b);
                    self.pos += 1;
                }
            }
        }
        let s = String::from_utf8(buf).map_err(|_| ParseError::at(start))?;
        Ok(Value::str(s))
    }

    /// Cursor sits on the `u`; consumes `uXXXX` and returns the character.
    fn parse_unicode_escape(&mut self) -> Option<char> {
        let hex = self.bytes.get(self.pos + 1..self.pos + 5)?;
        let mut code: u32 = 0;
        for &b in hex {
            code = code * 16 + (b as char).to_digit(16)?;
        }
        let c = char::from_u32(code)?;
        self.pos += 5;
        Some(c)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        if self.digit_run() == 0 {
            return Err(ParseError::at(start));
        }
        let mut is_real = false;
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            is_real = true;
            if self.digit_run() == 0 {
                return Err(ParseError::at(start));
            }
        }
        if matches!(self.bytes.get(self.pos), Some(&(b'e' | b'E'))) {
            self.pos += 1;
            is_real = true;
            if matches!(self.bytes.get(self.pos), Some(&(b'+' | b'-'))) {
                self.pos += 1;
            }
            if self.digit_run() == 0 {
                return Err(ParseError::at(start));
            }
        }
        // the token is ASCII by construction
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| ParseError::at(start))?;
        if is_real {
            let r: f64 = text.parse().map_err(|_| ParseError::at(start))?;
            Ok(Value::Real(r))
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                // out of i64 range, keep the magnitude as a real
                Err(_) => {
                    let r: f64 = text.parse().map_err(|_| ParseError::at(start))?;
                    Ok(Value::Real(r))
                }
            }
        }
    }

    fn digit_run(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(&(b'0'..=b'9'))) {
            self.pos += 1;
        }
        self.pos - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(input: &str) -> usize {
        match parse(input) {
            Err(e) => e.offset,
            Ok(v) => panic!("expected a parse failure for {input:?}, got {v}"),
        }
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
        assert_eq!(parse("-17").unwrap(), Value::Int(-17));
        assert_eq!(parse("2.5").unwrap(), Value::Real(2.5));
        assert_eq!(parse("2E20").unwrap(), Value::Real(2e20));
        assert_eq!(parse("  42  ").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_quoting_styles() {
        assert_eq!(parse(r#""abc""#).unwrap(), Value::str("abc"));
        assert_eq!(parse("'abc'").unwrap(), Value::str("abc"));
        assert_eq!(parse(r#"'say "hi"'"#).unwrap(), Value::str("say \"hi\""));
        assert_eq!(parse(r#""a\nb""#).unwrap(), Value::str("a\nb"));
        // unknown escape passes through
        assert_eq!(parse(r#""a\qb""#).unwrap(), Value::str("aqb"));
        assert_eq!(parse(r#""A""#).unwrap(), Value::str("A"));
    }

    #[test]
    fn test_arbitrary_object_keys() {
        let v = parse("{1: 'one', true: [2]}").unwrap();
        let d = v.as_dict();
        let d = d.borrow();
        assert_eq!(d.get(&Value::Int(1), Value::Null), Value::str("one"));
        assert_eq!(
            d.get(&Value::Bool(true), Value::Null),
            Value::vector(vec![Value::Int(2)])
        );
    }

    #[test]
    fn test_trailing_comma_tolerance() {
        assert_eq!(
            parse("[1, 2,]").unwrap(),
            Value::vector(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(offset_of("[1, 2,,]"), 6);
        // objects tolerate none
        assert_eq!(offset_of("{1: 2,}"), 6);
    }

    #[test]
    fn test_integer_overflow_becomes_real() {
        assert_eq!(
            parse("99999999999999999999").unwrap(),
            Value::Real(1e20)
        );
        assert_eq!(parse("9223372036854775807").unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_error_offsets() {
        assert_eq!(offset_of("["), 1);
        assert_eq!(offset_of(","), 0);
        assert_eq!(offset_of("[0,,]"), 3);
        assert_eq!(offset_of("{1,2,}"), 2);
        assert_eq!(offset_of("\"str"), 4);
        assert_eq!(offset_of("[{]}"), 2);
        assert_eq!(offset_of("[1,2,}"), 5);
        assert_eq!(offset_of("{true: {false: [];}}"), 17);
        assert_eq!(offset_of("-"), 0);
        assert_eq!(offset_of("[-]"), 1);
        assert_eq!(offset_of("[-3-]"), 3);
        assert_eq!(offset_of("--3"), 0);
        assert_eq!(offset_of("null,"), 4);
        assert_eq!(offset_of("[],"), 2);
        assert_eq!(offset_of("a"), 0);
        assert_eq!(offset_of("&"), 0);
        assert_eq!(offset_of(""), 0);
        assert_eq!(offset_of("]"), 0);
        assert_eq!(offset_of("}"), 0);
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 10) + &"]".repeat(MAX_DEPTH + 10);
        assert_eq!(parse(&deep).unwrap_err().offset, MAX_DEPTH);
        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse(&ok).is_ok());
    }
}
