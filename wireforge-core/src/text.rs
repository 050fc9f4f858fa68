//! The textual wire format: a JSON-shaped grammar with no string escaping
//! and saturating integer decode, emitted compact or with configurable
//! pretty-printing whitespace.
//!
//! ```text
//! Value  := Bool | Char | Int | Float | String | Array | Object
//! Bool   := "true" | "false"         ; case-insensitive
//! Char   := '"' byte '"'
//! Int    := ['+'|'-'] digit+
//! Float  := maximal run of bytes not in { ',' '!' ']' '}' ' ' }
//! String := '"' byte* '"'            ; no escape handling
//! Array  := '[' [ Value (',' Value)* ] ']'
//! Object := '{' [ Member (',' Member)* ] '}'
//! Member := String ':' Value
//! ```
//!
//! Records are always keyed by member display name in this format; the
//! three binary key-mode disciplines of [`crate::binary`] have no textual
//! counterpart, since the textual grammar has exactly one way to tag a
//! member (`Member := String ':' Value`).

use crate::cursor::{Cursor, OutputCursor};
use crate::error::{as_bad_input, bail, ensure, error, Result};
use crate::format::Format;

// ---------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------

pub struct TextEncoder<'w, W> {
    out: &'w mut W,
    format: Format,
    depth: usize,
    /// Set once a newline has been written without intervening content, so
    /// that two delimiters in a row (e.g. an empty `{}`) don't produce a
    /// blank line between them.
    newline_emitted: bool,
}

impl<'w, W: OutputCursor> TextEncoder<'w, W> {
    pub fn new(out: &'w mut W, format: Format) -> Self {
        TextEncoder { out, format, depth: 0, newline_emitted: true }
    }

    fn raw(&mut self, s: &str) -> Result<()> {
        self.out.write(s.as_bytes())?;
        self.newline_emitted = false;
        Ok(())
    }

    fn raw_bytes(&mut self, b: &[u8]) -> Result<()> {
        self.out.write(b)?;
        self.newline_emitted = false;
        Ok(())
    }

    fn newline_indent(&mut self) -> Result<()> {
        if !self.newline_emitted {
            self.out.write(b"\n")?;
            for _ in 0..self.depth {
                self.out.write(self.format.indent.as_bytes())?;
            }
            self.newline_emitted = true;
        }
        Ok(())
    }

    fn comma(&mut self, before_newline: bool, before_space: bool) -> Result<()> {
        self.raw(",")?;
        if before_newline {
            self.newline_indent()?;
        } else if before_space {
            self.raw(" ")?;
        }
        Ok(())
    }

    pub fn encode_bool(&mut self, b: bool) -> Result<()> {
        self.raw(if b { "true" } else { "false" })
    }

    pub fn encode_char(&mut self, c: u8) -> Result<()> {
        self.raw("\"")?;
        self.raw_bytes(&[c])?;
        self.raw("\"")
    }

    pub fn encode_string(&mut self, s: &str) -> Result<()> {
        self.raw("\"")?;
        self.raw_bytes(s.as_bytes())?;
        self.raw("\"")
    }

    pub fn begin_array(&mut self) -> Result<()> {
        if self.format.newline_before_open_bracket {
            self.newline_indent()?;
        }
        self.raw("[")?;
        self.depth += 1;
        if self.format.newline_after_open_bracket {
            self.newline_indent()?;
        }
        Ok(())
    }

    pub fn array_element(&mut self, first: bool) -> Result<()> {
        if !first {
            self.comma(self.format.newline_after_comma, self.format.space_after_comma)?;
        }
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.depth -= 1;
        if self.format.newline_before_close_bracket {
            self.newline_indent()?;
        }
        self.raw("]")
    }

    pub fn begin_object(&mut self) -> Result<()> {
        if self.format.newline_before_open_brace {
            self.newline_indent()?;
        }
        self.raw("{")?;
        self.depth += 1;
        if self.format.newline_after_open_brace {
            self.newline_indent()?;
        }
        Ok(())
    }

    pub fn object_key(&mut self, first: bool, key: &str) -> Result<()> {
        if !first {
            self.comma(self.format.newline_after_comma, self.format.space_after_comma)?;
        }
        self.encode_string(key)?;
        self.raw(":")?;
        if self.format.space_after_colon {
            self.raw(" ")?;
        }
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.depth -= 1;
        if self.format.newline_before_close_brace {
            self.newline_indent()?;
        }
        self.raw("}")
    }
}

macro_rules! encode_int {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'w, W: OutputCursor> TextEncoder<'w, W> {
            pub fn $m(&mut self, n: $t) -> Result<()> {
                self.raw(&n.to_string())
            }
        }
    )*};
}

encode_int!(
    encode_i8(i8), encode_i16(i16), encode_i32(i32), encode_i64(i64),
    encode_u8(u8), encode_u16(u16), encode_u32(u32), encode_u64(u64),
);

macro_rules! encode_float {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'w, W: OutputCursor> TextEncoder<'w, W> {
            pub fn $m(&mut self, n: $t) -> Result<()> {
                // Rust's `Display` for floats already emits the shortest
                // decimal string that round-trips back to the same bits.
                self.raw(&n.to_string())
            }
        }
    )*};
}

encode_float!(encode_f32(f32), encode_f64(f64));

// ---------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------

pub struct TextDecoder<'r, 'd> {
    cur: &'r mut Cursor<'d>,
}

impl<'r, 'd> TextDecoder<'r, 'd> {
    pub fn new(cur: &'r mut Cursor<'d>) -> Self {
        TextDecoder { cur }
    }

    fn skip_ws(&mut self) -> Result<()> {
        while !self.cur.at_end() {
            let b = self.cur.peek()?;
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                self.cur.advance(1)?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn expect_byte(&mut self, want: u8) -> Result<()> {
        self.skip_ws()?;
        let got = as_bad_input(self.cur.read_byte())?;
        ensure!(
            got == want,
            BadInput,
            "expected '{}', found '{}'\n{}",
            want as char,
            got as char,
            self.cur.diagnostic()
        );
        Ok(())
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        self.skip_ws()?;
        let mut probe = *self.cur;
        if probe.remaining() >= 4 {
            if probe.take(4)?.eq_ignore_ascii_case(b"true") {
                self.cur.advance(4)?;
                return Ok(true);
            }
        }
        let mut probe = *self.cur;
        if probe.remaining() >= 5 {
            if probe.take(5)?.eq_ignore_ascii_case(b"false") {
                self.cur.advance(5)?;
                return Ok(false);
            }
        }
        bail!(BadInput, "expected 'true' or 'false'\n{}", self.cur.diagnostic())
    }

    pub fn decode_char(&mut self) -> Result<u8> {
        self.expect_byte(b'"')?;
        let b = as_bad_input(self.cur.read_byte())?;
        let closing = as_bad_input(self.cur.read_byte())?;
        ensure!(
            closing == b'"',
            BadInput,
            "char literal must contain exactly one byte\n{}",
            self.cur.diagnostic()
        );
        Ok(b)
    }

    pub fn decode_string(&mut self) -> Result<String> {
        self.expect_byte(b'"')?;
        let mut bytes = Vec::new();
        loop {
            let b = as_bad_input(self.cur.read_byte())?;
            if b == b'"' {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn scan_int_token(&mut self) -> Result<(bool, Vec<u8>)> {
        self.skip_ws()?;
        let mut negative = false;
        match self.cur.peek()? {
            b'+' => {
                self.cur.advance(1)?;
            }
            b'-' => {
                negative = true;
                self.cur.advance(1)?;
            }
            _ => {}
        }
        let mut digits = Vec::new();
        while !self.cur.at_end() {
            let b = self.cur.peek()?;
            if b.is_ascii_digit() {
                digits.push(b);
                self.cur.advance(1)?;
            } else {
                break;
            }
        }
        ensure!(!digits.is_empty(), BadInput, "expected integer digits\n{}", self.cur.diagnostic());
        Ok((negative, digits))
    }

    fn scan_float_token(&mut self) -> Result<String> {
        self.skip_ws()?;
        let mut s = String::new();
        while !self.cur.at_end() {
            let b = self.cur.peek()?;
            if b == b',' || b == b'!' || b == b']' || b == b'}' || b == b' ' {
                break;
            }
            s.push(b as char);
            self.cur.advance(1)?;
        }
        ensure!(!s.is_empty(), BadInput, "expected float literal\n{}", self.cur.diagnostic());
        Ok(s)
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.expect_byte(b'[')
    }

    /// Call before each element; returns `false` (after consuming the
    /// closing `]`) once the array is exhausted.
    pub fn array_has_next(&mut self, first: bool) -> Result<bool> {
        self.skip_ws()?;
        if self.cur.peek()? == b']' {
            self.cur.advance(1)?;
            return Ok(false);
        }
        if !first {
            self.expect_byte(b',')?;
            self.skip_ws()?;
            ensure!(
                self.cur.peek()? != b']',
                BadInput,
                "trailing comma before ']'\n{}",
                self.cur.diagnostic()
            );
        }
        Ok(true)
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.expect_byte(b'{')
    }

    /// Call before each member; returns the member's key, or `None` (after
    /// consuming the closing `}`) once the object is exhausted.
    pub fn object_next_key(&mut self, first: bool) -> Result<Option<String>> {
        self.skip_ws()?;
        if self.cur.peek()? == b'}' {
            self.cur.advance(1)?;
            return Ok(None);
        }
        if !first {
            self.expect_byte(b',')?;
            self.skip_ws()?;
            ensure!(
                self.cur.peek()? != b'}',
                BadInput,
                "trailing comma before '}}'\n{}",
                self.cur.diagnostic()
            );
        }
        let key = self.decode_string()?;
        self.expect_byte(b':')?;
        Ok(Some(key))
    }
}

/// Accumulate a digit run into a `u128`, saturating at `u128::MAX` rather
/// than overflowing. All further digits after saturation are still
/// consumed by the caller; only the returned magnitude is clamped.
fn saturating_u128_from_digits(digits: &[u8]) -> u128 {
    let mut v: u128 = 0;
    let mut saturated = false;
    for &d in digits {
        if saturated {
            continue;
        }
        let digit = (d - b'0') as u128;
        match v.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(next) => v = next,
            None => {
                v = u128::MAX;
                saturated = true;
            }
        }
    }
    v
}

macro_rules! decode_uint {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'r, 'd> TextDecoder<'r, 'd> {
            pub fn $m(&mut self) -> Result<$t> {
                let (negative, digits) = self.scan_int_token()?;
                ensure!(
                    !negative,
                    BadInput,
                    "unsigned integer literal must not carry a sign\n{}",
                    self.cur.diagnostic()
                );
                let v = saturating_u128_from_digits(&digits);
                Ok(v.min(<$t>::MAX as u128) as $t)
            }
        }
    )*};
}

decode_uint!(decode_u8(u8), decode_u16(u16), decode_u32(u32), decode_u64(u64));

macro_rules! decode_int {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'r, 'd> TextDecoder<'r, 'd> {
            pub fn $m(&mut self) -> Result<$t> {
                let (negative, digits) = self.scan_int_token()?;
                let v = saturating_u128_from_digits(&digits);
                if negative {
                    let min_magnitude = (<$t>::MIN as i128).unsigned_abs() as u128;
                    Ok((-(v.min(min_magnitude) as i128)) as $t)
                } else {
                    let max_magnitude = <$t>::MAX as u128;
                    Ok(v.min(max_magnitude) as $t)
                }
            }
        }
    )*};
}

decode_int!(decode_i8(i8), decode_i16(i16), decode_i32(i32), decode_i64(i64));

macro_rules! decode_float {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'r, 'd> TextDecoder<'r, 'd> {
            pub fn $m(&mut self) -> Result<$t> {
                let s = self.scan_float_token()?;
                s.parse::<$t>().map_err(|e| {
                    error!(BadInput, "invalid float literal {:?}: {}", s, e)
                })
            }
        }
    )*};
}

decode_float!(decode_f32(f32), decode_f64(f64));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::GrowableBuffer;

    fn encode_with(format: Format, f: impl FnOnce(&mut TextEncoder<GrowableBuffer>) -> Result<()>) -> String {
        let mut buf = GrowableBuffer::new();
        let mut enc = TextEncoder::new(&mut buf, format);
        f(&mut enc).unwrap();
        String::from_utf8(buf.into_vec()).unwrap()
    }

    #[test]
    fn truncated_string_is_bad_input() {
        let bytes = br#""hello"#; // opening quote and body, no closing quote
        let mut cur = Cursor::new(bytes);
        let mut dec = TextDecoder::new(&mut cur);
        let err = dec.decode_string().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
    }

    #[test]
    fn truncated_char_is_bad_input() {
        let bytes = br#""x"#; // missing closing quote
        let mut cur = Cursor::new(bytes);
        let mut dec = TextDecoder::new(&mut cur);
        let err = dec.decode_char().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
    }

    #[test]
    fn decode_string_replaces_invalid_utf8_lossily() {
        let mut bytes = vec![b'"'];
        bytes.extend_from_slice(b"ok-");
        bytes.push(0xFF);
        bytes.push(b'"');
        let mut cur = Cursor::new(&bytes);
        let mut dec = TextDecoder::new(&mut cur);
        let s = dec.decode_string().unwrap();
        assert_eq!(s, "ok-\u{FFFD}");
    }

    /// Scenario S1: `{n: "Rohit", i: 322}` compact-encoded.
    #[test]
    fn s1_compact_record() {
        let out = encode_with(Format::compact(), |enc| {
            enc.begin_object()?;
            enc.object_key(true, "n")?;
            enc.encode_string("Rohit")?;
            enc.object_key(false, "i")?;
            enc.encode_u64(322)?;
            enc.end_object()
        });
        assert_eq!(out, r#"{"n":"Rohit","i":322}"#);
    }

    #[test]
    fn s1_round_trips_through_decoder() {
        let text = r#"{"n":"Rohit","i":322}"#;
        let bytes = text.as_bytes();
        let mut cur = Cursor::new(bytes);
        let mut dec = TextDecoder::new(&mut cur);
        dec.begin_object().unwrap();
        let mut n = None;
        let mut i = None;
        let mut first = true;
        loop {
            match dec.object_next_key(first).unwrap() {
                None => break,
                Some(key) => {
                    first = false;
                    match key.as_str() {
                        "n" => n = Some(dec.decode_string().unwrap()),
                        "i" => i = Some(dec.decode_u64().unwrap()),
                        other => panic!("unexpected key {}", other),
                    }
                }
            }
        }
        assert_eq!(n.as_deref(), Some("Rohit"));
        assert_eq!(i, Some(322));
    }

    /// Scenario S5: saturating decode of an over-wide unsigned literal.
    #[test]
    fn s5_saturates_on_overflow() {
        let text = r#"{"n":"a","i":99999999999999999999}"#;
        let mut cur = Cursor::new(text.as_bytes());
        let mut dec = TextDecoder::new(&mut cur);
        dec.begin_object().unwrap();
        let mut i = None;
        let mut first = true;
        loop {
            match dec.object_next_key(first).unwrap() {
                None => break,
                Some(key) => {
                    first = false;
                    match key.as_str() {
                        "n" => {
                            dec.decode_string().unwrap();
                        }
                        "i" => i = Some(dec.decode_u64().unwrap()),
                        other => panic!("unexpected key {}", other),
                    }
                }
            }
        }
        assert_eq!(i, Some(u64::MAX));
    }

    #[test]
    fn signed_saturation_matches_sign() {
        let mut cur = Cursor::new(b"-99999999999999999999");
        let mut dec = TextDecoder::new(&mut cur);
        assert_eq!(dec.decode_i32().unwrap(), i32::MIN);

        let mut cur = Cursor::new(b"99999999999999999999");
        let mut dec = TextDecoder::new(&mut cur);
        assert_eq!(dec.decode_i32().unwrap(), i32::MAX);
    }

    #[test]
    fn bool_accepts_any_case() {
        for (text, expected) in [("true", true), ("TRUE", true), ("TrUe", true), ("false", false), ("FALSE", false)] {
            let mut cur = Cursor::new(text.as_bytes());
            let mut dec = TextDecoder::new(&mut cur);
            assert_eq!(dec.decode_bool().unwrap(), expected);
        }
    }

    #[test]
    fn char_requires_exactly_one_byte() {
        let mut cur = Cursor::new(br#""x""#);
        let mut dec = TextDecoder::new(&mut cur);
        assert_eq!(dec.decode_char().unwrap(), b'x');

        let mut cur = Cursor::new(br#""xy""#);
        let mut dec = TextDecoder::new(&mut cur);
        assert!(dec.decode_char().is_err());

        let mut cur = Cursor::new(br#""""#);
        let mut dec = TextDecoder::new(&mut cur);
        assert!(dec.decode_char().is_err());
    }

    #[test]
    fn trailing_comma_in_array_is_bad_input() {
        let mut cur = Cursor::new(b"[1,2,]");
        let mut dec = TextDecoder::new(&mut cur);
        dec.begin_array().unwrap();
        assert!(dec.array_has_next(true).unwrap());
        assert_eq!(dec.decode_u8().unwrap(), 1);
        assert!(dec.array_has_next(false).unwrap());
        assert_eq!(dec.decode_u8().unwrap(), 2);
        assert!(dec.array_has_next(false).is_err());
    }

    #[test]
    fn empty_array_and_object() {
        let mut cur = Cursor::new(b"[]");
        let mut dec = TextDecoder::new(&mut cur);
        dec.begin_array().unwrap();
        assert!(!dec.array_has_next(true).unwrap());

        let mut cur = Cursor::new(b"{}");
        let mut dec = TextDecoder::new(&mut cur);
        dec.begin_object().unwrap();
        assert!(dec.object_next_key(true).unwrap().is_none());
    }

    #[test]
    fn pretty_empty_object_has_no_blank_line() {
        let out = encode_with(Format::pretty(), |enc| {
            enc.begin_object()?;
            enc.end_object()
        });
        assert_eq!(out, "{}");
    }

    /// Testable property 8: pretty and compact both round-trip to the
    /// same decoded value.
    #[test]
    fn pretty_and_compact_round_trip_to_same_value() {
        let compact = encode_with(Format::compact(), |enc| {
            enc.begin_array()?;
            enc.array_element(true)?;
            enc.encode_u32(1)?;
            enc.array_element(false)?;
            enc.encode_u32(2)?;
            enc.end_array()
        });
        let pretty = encode_with(Format::pretty(), |enc| {
            enc.begin_array()?;
            enc.array_element(true)?;
            enc.encode_u32(1)?;
            enc.array_element(false)?;
            enc.encode_u32(2)?;
            enc.end_array()
        });
        assert_ne!(compact, pretty);

        for text in [&compact, &pretty] {
            let mut cur = Cursor::new(text.as_bytes());
            let mut dec = TextDecoder::new(&mut cur);
            dec.begin_array().unwrap();
            let mut values = Vec::new();
            let mut first = true;
            while dec.array_has_next(first).unwrap() {
                first = false;
                values.push(dec.decode_u32().unwrap());
            }
            assert_eq!(values, vec![1, 2]);
        }
    }

    #[test]
    fn float_round_trips() {
        let out = encode_with(Format::compact(), |enc| enc.encode_f64(3.125));
        assert_eq!(out, "3.125");
        let mut cur = Cursor::new(out.as_bytes());
        let mut dec = TextDecoder::new(&mut cur);
        assert_eq!(dec.decode_f64().unwrap(), 3.125);
    }
}
