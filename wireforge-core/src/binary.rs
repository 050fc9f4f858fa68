//! The binary wire format: scalars in big-endian byte order, VLQ-prefixed
//! strings/sequences/mappings, and records framed by one of three key
//! disciplines.
//!
//! Dispatch by key mode is a runtime discriminator here rather than three
//! separate generated code paths: both are an equally valid contract, and
//! a single discriminator keeps generated code and this crate's own
//! tests simpler.

use crate::cursor::{Cursor, OutputCursor};
use crate::endian::{from_big, to_big};
use crate::error::{as_bad_input, bail, ensure, Result};
use crate::vlq::{read_vlq, write_vlq};

/// Per-instance choice of how record members are tagged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    None,
    Integer,
    String,
}

/// The tag read for one record field, or the record terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Id(u32),
    Name(String),
}

pub struct BinaryEncoder<'w, W> {
    out: &'w mut W,
    mode: KeyMode,
}

impl<'w, W: OutputCursor> BinaryEncoder<'w, W> {
    pub fn new(out: &'w mut W, mode: KeyMode) -> Self {
        BinaryEncoder { out, mode }
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn encode_bool(&mut self, b: bool) -> Result<()> {
        self.out.write(&[b as u8])
    }

    pub fn encode_char(&mut self, c: u8) -> Result<()> {
        self.out.write(&[c])
    }

    pub fn encode_string(&mut self, s: &str) -> Result<()> {
        write_vlq(self.out, s.len() as u32)?;
        self.out.write(s.as_bytes())
    }
}

macro_rules! encode_scalar {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'w, W: OutputCursor> BinaryEncoder<'w, W> {
            pub fn $m(&mut self, n: $t) -> Result<()> {
                let bytes = to_big(n);
                self.out.write(bytes.as_ref())
            }
        }
    )*};
}

encode_scalar!(
    encode_i8(i8), encode_i16(i16), encode_i32(i32), encode_i64(i64),
    encode_u8(u8), encode_u16(u16), encode_u32(u32), encode_u64(u64),
    encode_f32(f32), encode_f64(f64),
);

impl<'w, W: OutputCursor> BinaryEncoder<'w, W> {
    pub fn encode_enum_ordinal(&mut self, ordinal: u32) -> Result<()> {
        write_vlq(self.out, ordinal)
    }

    pub fn encode_seq_len(&mut self, len: usize) -> Result<()> {
        write_vlq(self.out, len as u32)
    }

    pub fn encode_mapping_len(&mut self, len: usize) -> Result<()> {
        write_vlq(self.out, len as u32)
    }

    /// Nothing is written for any key mode; present for symmetry with
    /// `record_end` and with the decoder's `record_begin`.
    pub fn record_begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Emit the tag for an ordinary (non-union) field, per this encoder's
    /// key mode.
    pub fn record_field(&mut self, id: u32, name: &str) -> Result<()> {
        match self.mode {
            KeyMode::None => Ok(()),
            KeyMode::Integer => write_vlq(self.out, id),
            KeyMode::String => self.encode_string(name),
        }
    }

    /// Emit the tag for a union-typed field. Under `Integer` mode the
    /// variant index is written separately afterward (via
    /// `encode_enum_ordinal`); under `String` mode the variant tag is
    /// already folded into the composite key written here, so no further
    /// ordinal is written; under `None` mode neither tag nor ordinal is
    /// written here, since `None` mode has no tag stream at all, and the
    /// caller still must encode the variant ordinal inline.
    pub fn record_union_field(&mut self, id: u32, name: &str, variant_tag: &str) -> Result<()> {
        match self.mode {
            KeyMode::None => Ok(()),
            KeyMode::Integer => write_vlq(self.out, id),
            KeyMode::String => self.encode_string(&format!("{}:{}", name, variant_tag)),
        }
    }

    pub fn record_end(&mut self) -> Result<()> {
        match self.mode {
            KeyMode::None => Ok(()),
            KeyMode::Integer => write_vlq(self.out, 0),
            KeyMode::String => self.encode_string(""),
        }
    }
}

pub struct BinaryDecoder<'r, 'd> {
    cur: &'r mut Cursor<'d>,
    mode: KeyMode,
}

impl<'r, 'd> BinaryDecoder<'r, 'd> {
    pub fn new(cur: &'r mut Cursor<'d>, mode: KeyMode) -> Self {
        BinaryDecoder { cur, mode }
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        Ok(as_bad_input(self.cur.read_byte())? != 0)
    }

    pub fn decode_char(&mut self) -> Result<u8> {
        as_bad_input(self.cur.read_byte())
    }

    pub fn decode_string(&mut self) -> Result<String> {
        let len = read_vlq(self.cur)? as usize;
        let bytes = as_bad_input(self.cur.take(len))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

macro_rules! decode_scalar {
    ($($m:ident($t:ty)),* $(,)?) => {$(
        impl<'r, 'd> BinaryDecoder<'r, 'd> {
            pub fn $m(&mut self) -> Result<$t> {
                let mut bytes = <$t as crate::endian::BigEndian>::Bytes::default();
                let slice = as_bad_input(self.cur.take(bytes.as_ref().len()))?;
                bytes.as_mut().copy_from_slice(slice);
                Ok(from_big::<$t>(bytes))
            }
        }
    )*};
}

decode_scalar!(
    decode_i8(i8), decode_i16(i16), decode_i32(i32), decode_i64(i64),
    decode_u8(u8), decode_u16(u16), decode_u32(u32), decode_u64(u64),
    decode_f32(f32), decode_f64(f64),
);

impl<'r, 'd> BinaryDecoder<'r, 'd> {
    pub fn decode_enum_ordinal(&mut self) -> Result<u32> {
        read_vlq(self.cur)
    }

    pub fn decode_seq_len(&mut self) -> Result<usize> {
        Ok(read_vlq(self.cur)? as usize)
    }

    pub fn decode_mapping_len(&mut self) -> Result<usize> {
        Ok(read_vlq(self.cur)? as usize)
    }

    pub fn record_begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read the next field tag, or `None` at the record terminator. Only
    /// meaningful under `Integer`/`String` key modes; `None`-mode records
    /// have no tag stream and the generated decoder must not call this.
    pub fn next_field(&mut self) -> Result<Option<FieldKey>> {
        match self.mode {
            KeyMode::None => bail!(BadType, "next_field called on a None-key-mode decoder"),
            KeyMode::Integer => {
                let id = read_vlq(self.cur)?;
                Ok(if id == 0 { None } else { Some(FieldKey::Id(id)) })
            }
            KeyMode::String => {
                let key = self.decode_string()?;
                Ok(if key.is_empty() { None } else { Some(FieldKey::Name(key)) })
            }
        }
    }

    /// Any trailing unconsumed field tags mean the decoder didn't reach
    /// the terminator; callers that bail out of a decode loop early
    /// should not claim the record finished cleanly.
    pub fn expect_terminator(&mut self, tag: Option<FieldKey>) -> Result<()> {
        ensure!(tag.is_none(), KeyNotFound, "unexpected trailing field tag {:?}", tag);
        Ok(())
    }
}

/// Split a `String`-mode union composite key (`"<name>:<tag>"`) into its
/// two parts.
pub fn split_union_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::GrowableBuffer;

    #[test]
    fn scalar_round_trip_all_widths() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::None);
        enc.encode_bool(true).unwrap();
        enc.encode_char(b'x').unwrap();
        enc.encode_i32(-42).unwrap();
        enc.encode_u64(123456789).unwrap();
        enc.encode_f64(2.5).unwrap();
        enc.encode_string("hi").unwrap();
        let bytes = buf.into_vec();

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::None);
        assert_eq!(dec.decode_bool().unwrap(), true);
        assert_eq!(dec.decode_char().unwrap(), b'x');
        assert_eq!(dec.decode_i32().unwrap(), -42);
        assert_eq!(dec.decode_u64().unwrap(), 123456789);
        assert_eq!(dec.decode_f64().unwrap(), 2.5);
        assert_eq!(dec.decode_string().unwrap(), "hi");
    }

    /// `{n: "Rohit", i: 322}` under Integer key mode.
    #[test]
    fn s2_integer_mode_record() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::Integer);
        enc.record_begin().unwrap();
        enc.record_field(1, "n").unwrap();
        enc.encode_string("Rohit").unwrap();
        enc.record_field(2, "i").unwrap();
        enc.encode_u64(322).unwrap();
        enc.record_end().unwrap();
        let bytes = buf.into_vec();

        let expected = [
            0x01, 0x05, b'R', b'o', b'h', b'i', b't',
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x42,
            0x00,
        ];
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), 17);
    }

    #[test]
    fn integer_mode_record_round_trip_via_next_field() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::Integer);
        enc.record_field(1, "n").unwrap();
        enc.encode_string("Rohit").unwrap();
        enc.record_field(2, "i").unwrap();
        enc.encode_u64(322).unwrap();
        enc.record_end().unwrap();
        let bytes = buf.into_vec();

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::Integer);
        let mut got_name = None;
        let mut got_id = None;
        loop {
            match dec.next_field().unwrap() {
                None => break,
                Some(FieldKey::Id(1)) => got_name = Some(dec.decode_string().unwrap()),
                Some(FieldKey::Id(2)) => got_id = Some(dec.decode_u64().unwrap()),
                Some(other) => panic!("unknown field {:?}", other),
            }
        }
        assert_eq!(got_name.as_deref(), Some("Rohit"));
        assert_eq!(got_id, Some(322));
    }

    #[test]
    fn truncated_string_is_bad_input() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::None);
        enc.encode_string("hello").unwrap();
        let mut bytes = buf.into_vec();
        bytes.truncate(bytes.len() - 2); // cut the string body short

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::None);
        let err = dec.decode_string().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
    }

    #[test]
    fn truncated_scalar_is_bad_input() {
        let bytes = [0u8, 1, 2]; // u64 needs 8 bytes
        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::None);
        let err = dec.decode_u64().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
    }

    #[test]
    fn unknown_integer_key_is_key_not_found() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::Integer);
        write_vlq(&mut buf, 99).unwrap(); // stray id unknown to any schema
        enc.record_end().unwrap();
        let bytes = buf.into_vec();

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::Integer);
        match dec.next_field().unwrap() {
            Some(FieldKey::Id(99)) => {
                let err = dec.expect_terminator(Some(FieldKey::Id(99))).unwrap_err();
                assert_eq!(err.kind(), crate::error::ErrorKind::KeyNotFound);
            }
            other => panic!("expected id 99, got {:?}", other),
        }
    }

    #[test]
    fn string_mode_record_round_trip() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::String);
        enc.record_field(1, "n").unwrap();
        enc.encode_string("Rohit").unwrap();
        enc.record_end().unwrap();
        let bytes = buf.into_vec();

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::String);
        assert_eq!(dec.next_field().unwrap(), Some(FieldKey::Name("n".to_string())));
        assert_eq!(dec.decode_string().unwrap(), "Rohit");
        assert_eq!(dec.next_field().unwrap(), None);
    }

    #[test]
    fn none_mode_has_no_tags() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::None);
        enc.record_field(1, "n").unwrap();
        enc.encode_string("x").unwrap();
        enc.record_end().unwrap();
        // record_field/record_end wrote nothing under None mode.
        assert_eq!(buf.into_vec(), vec![0x01, b'x']);
    }

    #[test]
    fn union_field_string_mode_composite_key() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::String);
        enc.record_union_field(1, "entry", "http").unwrap();
        let bytes = buf.into_vec();
        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::String);
        let key = dec.decode_string().unwrap();
        assert_eq!(split_union_key(&key), Some(("entry", "http")));
    }

    #[test]
    fn union_field_integer_mode_then_variant_ordinal() {
        let mut buf = GrowableBuffer::new();
        let mut enc = BinaryEncoder::new(&mut buf, KeyMode::Integer);
        enc.record_union_field(3, "entry", "http").unwrap();
        enc.encode_enum_ordinal(1).unwrap();
        let bytes = buf.into_vec();

        let mut cur = Cursor::new(&bytes);
        let mut dec = BinaryDecoder::new(&mut cur, KeyMode::Integer);
        assert_eq!(dec.next_field().unwrap(), Some(FieldKey::Id(3)));
        assert_eq!(dec.decode_enum_ordinal().unwrap(), 1);
    }
}
