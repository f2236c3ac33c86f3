use std::hash::BuildHasher;

use bytes::{Bytes, BytesMut};
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::constants::*;
use crate::descriptor::Described;
use crate::errors::{Error, Result};
use crate::float::Float;
use crate::util::{signed_width, u64_to_digits};
use crate::{RawJson, Value};

/// Byte-oriented serializer: an append-only sink. The codec never seeks.
pub trait SerializerBytes {
    /// Appends a single byte.
    fn put_byte(&mut self, u: u8);

    /// Appends a slice.
    fn put_slice(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.put_byte(*b);
        }
    }
}

impl SerializerBytes for Vec<u8> {
    fn put_byte(&mut self, u: u8) {
        self.push(u)
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes)
    }
}

impl SerializerBytes for BytesMut {
    fn put_byte(&mut self, u: u8) {
        self.extend_from_slice(&[u])
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes)
    }
}

/// Emits a length word as a UInt-kind value. Counts never use the nibble
/// forms, so the size of a long string is predictable from its length.
fn put_len_uint<S: SerializerBytes>(out: &mut S, len: u64) {
    let digs = u64_to_digits(len);
    out.put_byte(pack(Kind::UInt, digs.len() as u8));
    out.put_slice(&digs);
}

/// Emits a count-bearing tag: inline nibble for counts up to 7, otherwise
/// the overflow indicator followed by a UInt length word.
fn put_count<S: SerializerBytes>(out: &mut S, kind: Kind, count: usize) {
    if count <= LEN_INLINE_MAX as usize {
        out.put_byte(pack(kind, count as u8));
    } else {
        out.put_byte(pack(kind, LEN_OVERFLOW));
        put_len_uint(out, count as u64);
    }
}

/// Typed write operations over a byte sink.
///
/// The provided integer defaults all funnel into the 64-bit forms; the
/// wire does not distinguish source widths, only magnitudes.
pub trait Serializer: Sized {
    /// Add a `u64`: nibble form for values up to 15 (zero canonicalizes to
    /// the signed nibble), minimal big-endian `UInt` otherwise.
    fn put_u64(&mut self, u: u64);

    /// Add an `i64`: signed nibble for |v| ≤ 7, minimal big-endian `SInt`
    /// with a leading sign bit otherwise.
    fn put_i64(&mut self, i: i64);

    #[inline]
    fn put_u8(&mut self, u: u8) {
        self.put_u64(u64::from(u))
    }

    #[inline]
    fn put_u16(&mut self, u: u16) {
        self.put_u64(u64::from(u))
    }

    #[inline]
    fn put_u32(&mut self, u: u32) {
        self.put_u64(u64::from(u))
    }

    #[inline]
    fn put_usize(&mut self, u: usize) {
        self.put_u64(u as u64)
    }

    #[inline]
    fn put_i8(&mut self, i: i8) {
        self.put_i64(i64::from(i))
    }

    #[inline]
    fn put_i16(&mut self, i: i16) {
        self.put_i64(i64::from(i))
    }

    #[inline]
    fn put_i32(&mut self, i: i32) {
        self.put_i64(i64::from(i))
    }

    #[inline]
    fn put_isize(&mut self, i: isize) {
        self.put_i64(i as i64)
    }

    /// Add a float at an explicit width, bits verbatim.
    fn put_float(&mut self, f: Float);

    /// Add an `f32`, always single precision.
    #[inline]
    fn put_f32(&mut self, f: f32) {
        self.put_float(Float::from(f))
    }

    /// Add an `f64` at the smallest exact width.
    #[inline]
    fn put_f64(&mut self, f: f64) {
        self.put_float(Float::of(f))
    }

    /// Add a `bool`.
    fn put_bool(&mut self, b: bool);

    /// Add a string: short-form length nibble, then the UTF-8 bytes.
    fn put_str(&mut self, s: &str);

    /// Add a byte buffer: short-form length nibble, then the bytes.
    fn put_bytes(&mut self, b: &[u8]);

    /// Add an opaque JSON payload: zero nibble, UInt length, raw bytes.
    fn put_json(&mut self, raw: &[u8]);

    /// Open an array of `len` elements of the declared kind. The caller
    /// then writes `len` self-describing values.
    fn seq_start(&mut self, len: usize, elem: Kind);

    /// Open a map of `len` entries. The caller then writes `len`
    /// self-describing key/value pairs.
    fn map_start(&mut self, len: usize);

    /// Open a struct of `fields` visible fields. Callers must not open
    /// empty structs; a struct with no visible fields occupies no bytes.
    fn struct_start(&mut self, fields: usize);

    /// Add an arbitrary dynamic [`Value`].
    #[inline]
    fn put_value(&mut self, v: &Value) {
        ser_value(self, v)
    }
}

impl<S: SerializerBytes> Serializer for S {
    fn put_u64(&mut self, u: u64) {
        if u == 0 {
            self.put_byte(pack(Kind::SNibble, 0));
        } else if u <= MASK_NIBBLE as u64 {
            self.put_byte(pack(Kind::UNibble, u as u8));
        } else {
            let digs = u64_to_digits(u);
            self.put_byte(pack(Kind::UInt, digs.len() as u8));
            self.put_slice(&digs);
        }
    }

    fn put_i64(&mut self, i: i64) {
        let neg = i < 0;
        let m = i.unsigned_abs();
        if m <= SNIBBLE_MAG as u64 {
            let nibble = if neg { SNIBBLE_SIGN | m as u8 } else { m as u8 };
            self.put_byte(pack(Kind::SNibble, nibble));
            return;
        }
        let len = signed_width(m);
        let mut digs = SmallVec::<[u8; 8]>::from_slice(&m.to_be_bytes()[8 - len..]);
        if neg {
            digs[0] |= SINT_SIGN;
        }
        self.put_byte(pack(Kind::SInt, len as u8));
        self.put_slice(&digs);
    }

    fn put_float(&mut self, f: Float) {
        self.put_byte(pack(Kind::Float, f.width()));
        match f {
            Float::Single(bits) => self.put_slice(&bits.to_le_bytes()),
            Float::Double(bits) => self.put_slice(&bits.to_le_bytes()),
        }
    }

    fn put_bool(&mut self, b: bool) {
        self.put_byte(pack(Kind::Boolean, b as u8));
    }

    fn put_str(&mut self, s: &str) {
        put_count(self, Kind::String, s.len());
        self.put_slice(s.as_bytes());
    }

    fn put_bytes(&mut self, b: &[u8]) {
        put_count(self, Kind::Buffer, b.len());
        self.put_slice(b);
    }

    fn put_json(&mut self, raw: &[u8]) {
        self.put_byte(pack(Kind::Json, 0));
        put_len_uint(self, raw.len() as u64);
        self.put_slice(raw);
    }

    fn seq_start(&mut self, len: usize, elem: Kind) {
        put_count(self, Kind::Array, len);
        self.put_byte(elem.code());
    }

    fn map_start(&mut self, len: usize) {
        put_count(self, Kind::Map, len);
    }

    fn struct_start(&mut self, fields: usize) {
        debug_assert!(fields > 0, "empty structs occupy no bytes");
        put_count(self, Kind::Struct, fields);
    }
}

/// Serializes an arbitrary dynamic [`Value`].
///
/// Every `Value` case has a wire form, so this cannot fail. Integer and
/// float cases keep their stored signedness and width; an empty struct
/// emits nothing.
pub fn ser_value<S: Serializer>(s: &mut S, v: &Value) {
    match v {
        Value::Uint(u) => s.put_u64(*u),
        Value::Int(i) => s.put_i64(*i),
        Value::Float(f) => s.put_float(*f),
        Value::Bool(b) => s.put_bool(*b),
        Value::Str(text) => s.put_str(text),
        Value::Bytes(b) => s.put_bytes(b),
        Value::Array(items) => {
            // The element kind of an empty dynamic array is unrecoverable;
            // SInt keeps the byte stable.
            let elem = items.first().map(Value::kind).unwrap_or(Kind::SInt);
            s.seq_start(items.len(), elem);
            for item in items {
                ser_value(s, item);
            }
        }
        Value::Map(entries) => {
            s.map_start(entries.len());
            for (key, value) in entries {
                s.put_str(key);
                ser_value(s, value);
            }
        }
        Value::Struct(fields) => {
            if fields.is_empty() {
                return;
            }
            s.struct_start(fields.len());
            for field in fields {
                ser_value(s, field);
            }
        }
        Value::Json(raw) => s.put_json(raw),
    }
}

/// A value that can be serialized.
pub trait Ser {
    /// Writes the value through the serializer.
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()>;
}

macro_rules! trivial_ser {
    ($typ:ty, $put:tt) => {
        impl Ser for $typ {
            #[inline]
            fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
                s.$put(*self);
                Ok(())
            }
        }
    };
}

// unsigned
trivial_ser!(u8, put_u8);
trivial_ser!(u16, put_u16);
trivial_ser!(u32, put_u32);
trivial_ser!(u64, put_u64);
trivial_ser!(usize, put_usize);

// signed
trivial_ser!(i8, put_i8);
trivial_ser!(i16, put_i16);
trivial_ser!(i32, put_i32);
trivial_ser!(i64, put_i64);
trivial_ser!(isize, put_isize);

// floats
trivial_ser!(f32, put_f32);
trivial_ser!(f64, put_f64);

// boolean
trivial_ser!(bool, put_bool);

// strings
impl Ser for str {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.put_str(self);
        Ok(())
    }
}

impl Ser for String {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.put_str(self);
        Ok(())
    }
}

// byte buffers
impl Ser for Bytes {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.put_bytes(self);
        Ok(())
    }
}

impl Ser for Float {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.put_float(*self);
        Ok(())
    }
}

impl Ser for Value {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        ser_value(s, self);
        Ok(())
    }
}

impl Ser for RawJson {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.put_json(self.as_bytes());
        Ok(())
    }
}

// sequences carry their element's declared kind
impl<T: Ser + Described> Ser for [T] {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.seq_start(self.len(), T::KIND);
        for item in self {
            item.ser(s)?;
        }
        Ok(())
    }
}

impl<T: Ser + Described> Ser for Vec<T> {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        self.as_slice().ser(s)
    }
}

impl<T: Ser + Described, const N: usize> Ser for [T; N] {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        self.as_slice().ser(s)
    }
}

impl<K: Ser, V: Ser, H: BuildHasher> Ser for HashMap<K, V, H> {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        s.map_start(self.len());
        for (key, value) in self {
            key.ser(s)?;
            value.ser(s)?;
        }
        Ok(())
    }
}

// transparent wrappers
impl<T: Ser + ?Sized> Ser for &T {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        (**self).ser(s)
    }
}

impl<T: Ser + ?Sized> Ser for Box<T> {
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        (**self).ser(s)
    }
}

impl<T: Ser> Ser for Option<T> {
    /// The wire has no way to say "absent"; a `None` is an encode error.
    fn ser<S: Serializer>(&self, s: &mut S) -> Result<()> {
        match self {
            Some(value) => value.ser(s),
            None => Err(Error::NullValue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of<T: Ser + ?Sized>(value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        value.ser(&mut out).unwrap();
        out
    }

    #[test]
    fn unsigned_forms() {
        assert_eq!(bytes_of(&0u64), [0x10]);
        assert_eq!(bytes_of(&7u64), [0x07]);
        assert_eq!(bytes_of(&15u64), [0x0f]);
        assert_eq!(bytes_of(&16u64), [0x31, 0x10]);
        assert_eq!(bytes_of(&255u64), [0x31, 0xff]);
        assert_eq!(bytes_of(&256u64), [0x32, 0x01, 0x00]);
    }

    #[test]
    fn signed_forms() {
        assert_eq!(bytes_of(&0i64), [0x10]);
        assert_eq!(bytes_of(&-1i64), [0x19]);
        assert_eq!(bytes_of(&7i64), [0x17]);
        assert_eq!(bytes_of(&-7i64), [0x1f]);
        assert_eq!(bytes_of(&8i64), [0x21, 0x08]);
        assert_eq!(bytes_of(&127i64), [0x21, 0x7f]);
        assert_eq!(bytes_of(&-127i64), [0x21, 0xff]);
        assert_eq!(bytes_of(&-128i64), [0x22, 0x80, 0x80]);
        assert_eq!(
            bytes_of(&i64::MIN),
            [0x28, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn string_forms() {
        assert_eq!(bytes_of("Hi"), [0x72, 0x48, 0x69]);
        assert_eq!(bytes_of(""), [0x70]);
        let long = "x".repeat(8);
        let out = bytes_of(long.as_str());
        assert_eq!(&out[..3], [0x78, 0x31, 0x08]);
        assert_eq!(out.len(), 3 + 8);
    }

    #[test]
    fn seq_and_struct_headers() {
        let out = bytes_of(&vec![1i32, 2, 3]);
        assert_eq!(out, [0x93, 0x02, 0x11, 0x12, 0x13]);

        let mut sink = Vec::new();
        sink.struct_start(2);
        sink.put_u8(5);
        sink.put_bool(true);
        assert_eq!(sink, [0xc2, 0x05, 0x61]);
    }

    #[test]
    fn bytes_mut_sink() {
        let mut sink = BytesMut::new();
        sink.put_u64(255);
        sink.put_value(&Value::Bool(true));
        assert_eq!(&sink[..], [0x31, 0xff, 0x61]);
    }

    #[test]
    fn none_is_an_error() {
        let none: Option<u8> = None;
        let mut out = Vec::new();
        assert!(matches!(none.ser(&mut out), Err(Error::NullValue)));
        assert_eq!(bytes_of(&Some(3u8)), [0x03]);
    }
}
