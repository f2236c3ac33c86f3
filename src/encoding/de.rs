use std::hash::{BuildHasher, Hash};

use bytes::{Buf, Bytes};
use hashbrown::HashMap;

use super::constants::*;
use crate::convert::Num;
use crate::descriptor::{Described, Descriptor};
use crate::errors::{Error, Result};
use crate::float::Float;
use crate::{RawJson, Value};

/// Byte-oriented deserializer: a forward-only source. The codec never backs
/// up past the tag it just read.
pub trait DeserializerBytes {
    /// Reads and splits one tag byte.
    fn read_tag(&mut self) -> Result<Tag>;

    /// Reads a single byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Reads `len` bytes as an owned vector. The copy is deliberate: the
    /// source may be reused or freed as soon as the call returns.
    fn read_many(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads an unsigned big-endian integer of `len` bytes, `len <= 8`.
    fn read_uint_be(&mut self, len: u8) -> Result<u64>;

    /// Reads four little-endian bytes.
    fn read_u32_le(&mut self) -> Result<u32>;

    /// Reads eight little-endian bytes.
    fn read_u64_le(&mut self) -> Result<u64>;
}

impl<B: Buf> DeserializerBytes for B {
    #[inline]
    fn read_tag(&mut self) -> Result<Tag> {
        unpack(self.read_byte()?)
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        if self.has_remaining() {
            Ok(self.get_u8())
        } else {
            Err(Error::Truncated {
                needed: 1,
                remaining: 0,
            })
        }
    }

    #[inline]
    fn read_many(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.remaining() >= len {
            let mut bytes = vec![0; len];
            self.copy_to_slice(&mut bytes);
            Ok(bytes)
        } else {
            Err(Error::Truncated {
                needed: len,
                remaining: self.remaining(),
            })
        }
    }

    #[inline]
    fn read_uint_be(&mut self, len: u8) -> Result<u64> {
        debug_assert!(len <= 8);
        if self.remaining() >= len as usize {
            Ok(self.get_uint(len as usize))
        } else {
            Err(Error::Truncated {
                needed: len as usize,
                remaining: self.remaining(),
            })
        }
    }

    #[inline]
    fn read_u32_le(&mut self) -> Result<u32> {
        if self.remaining() >= 4 {
            Ok(self.get_u32_le())
        } else {
            Err(Error::Truncated {
                needed: 4,
                remaining: self.remaining(),
            })
        }
    }

    #[inline]
    fn read_u64_le(&mut self) -> Result<u64> {
        if self.remaining() >= 8 {
            Ok(self.get_u64_le())
        } else {
            Err(Error::Truncated {
                needed: 8,
                remaining: self.remaining(),
            })
        }
    }
}

/// Finishes an integer whose tag has already been read.
fn num_from_tag<D: DeserializerBytes + ?Sized>(d: &mut D, tag: Tag) -> Result<Num> {
    match tag.kind {
        Kind::UNibble => Ok(Num::Unsigned(u64::from(tag.nibble))),
        Kind::SNibble => {
            let magnitude = i64::from(tag.nibble & SNIBBLE_MAG);
            if tag.nibble & SNIBBLE_SIGN != 0 {
                Ok(Num::Signed(-magnitude))
            } else {
                Ok(Num::Signed(magnitude))
            }
        }
        Kind::UInt => {
            if tag.nibble > 8 {
                return Err(Error::InvalidLengthNibble(tag.nibble));
            }
            Ok(Num::Unsigned(d.read_uint_be(tag.nibble)?))
        }
        Kind::SInt => {
            if tag.nibble == 0 || tag.nibble > 8 {
                return Err(Error::InvalidLengthNibble(tag.nibble));
            }
            let bytes = d.read_many(tag.nibble as usize)?;
            let negative = bytes[0] & SINT_SIGN != 0;
            let mut magnitude = u64::from(bytes[0] & !SINT_SIGN);
            for b in &bytes[1..] {
                magnitude = magnitude << 8 | u64::from(*b);
            }
            if negative {
                // Sign with zero magnitude in a full-width payload is the
                // one encoding whose magnitude (2^63) spills into the sign
                // position.
                if magnitude == 0 && bytes.len() == 8 {
                    Ok(Num::Signed(i64::MIN))
                } else {
                    Ok(Num::Signed(-(magnitude as i64)))
                }
            } else {
                Ok(Num::Signed(magnitude as i64))
            }
        }
        other => Err(Error::mismatch("integer", other)),
    }
}

/// Reads a full unsigned value (tag included) for follow-up length words.
fn read_len<D: DeserializerBytes + ?Sized>(d: &mut D) -> Result<usize> {
    let tag = d.read_tag()?;
    num_from_tag(d, tag)?.to_usize()
}

/// Resolves a count nibble: inline value, overflow indicator, or invalid.
fn count_from_nibble<D: DeserializerBytes + ?Sized>(d: &mut D, nibble: u8) -> Result<usize> {
    if nibble <= LEN_INLINE_MAX {
        Ok(nibble as usize)
    } else if nibble == LEN_OVERFLOW {
        read_len(d)
    } else {
        Err(Error::InvalidLengthNibble(nibble))
    }
}

/// Finishes a float whose tag has already been read.
fn float_from_tag<D: DeserializerBytes + ?Sized>(d: &mut D, tag: Tag) -> Result<Float> {
    match tag.nibble {
        4 => Ok(Float::Single(d.read_u32_le()?)),
        8 => Ok(Float::Double(d.read_u64_le()?)),
        other => Err(Error::InvalidFloatWidth(other)),
    }
}

/// Typed read operations over a byte source.
///
/// Each method reads exactly one value: the tag, then the payload. Kind
/// checks happen against the requested target, with the widening rules of
/// the conversion table applied to numeric targets.
pub trait Deserializer {
    /// Reads any value into its dynamic form.
    fn read_value(&mut self) -> Result<Value>;

    /// Reads an integer of either signedness, before target conversion.
    fn read_num(&mut self) -> Result<Num>;

    fn read_u64(&mut self) -> Result<u64>;

    fn read_i64(&mut self) -> Result<i64>;

    /// Reads a float at its encoded width.
    fn read_float(&mut self) -> Result<Float>;

    /// Reads a float or integer, widened to `f64`.
    fn read_f64(&mut self) -> Result<f64>;

    /// Reads a single-precision float or an integer. Double-precision
    /// encodings do not narrow.
    fn read_f32(&mut self) -> Result<f32>;

    fn read_bool(&mut self) -> Result<bool>;

    fn read_string(&mut self) -> Result<String>;

    fn read_bytes(&mut self) -> Result<Bytes>;

    fn read_json(&mut self) -> Result<RawJson>;

    /// Reads an array into a vector of the declared element type.
    fn read_seq<T: De + Described>(&mut self) -> Result<Vec<T>>;

    /// Reads a map into the declared key and value types.
    fn read_map<K, V, H>(&mut self) -> Result<HashMap<K, V, H>>
    where
        K: De + Eq + Hash,
        V: De,
        H: BuildHasher + Default;

    /// Reads and checks a struct header against the target's descriptor.
    fn read_struct_header(&mut self, desc: &Descriptor) -> Result<()>;
}

impl<D: DeserializerBytes> Deserializer for D {
    fn read_value(&mut self) -> Result<Value> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::UNibble => Ok(Value::Uint(u64::from(tag.nibble))),
            Kind::SNibble | Kind::SInt => match num_from_tag(self, tag)? {
                Num::Signed(i) => Ok(Value::Int(i)),
                Num::Unsigned(u) => Ok(Value::Uint(u)),
            },
            Kind::UInt => {
                if tag.nibble > 8 {
                    return Err(Error::InvalidLengthNibble(tag.nibble));
                }
                Ok(Value::Uint(self.read_uint_be(tag.nibble)?))
            }
            Kind::Float => Ok(Value::Float(float_from_tag(self, tag)?)),
            Kind::Boolean => Ok(Value::Bool(tag.nibble & 1 == 1)),
            Kind::String => {
                let len = count_from_nibble(self, tag.nibble)?;
                Ok(Value::Str(String::from_utf8(self.read_many(len)?)?))
            }
            Kind::Buffer => {
                let len = count_from_nibble(self, tag.nibble)?;
                Ok(Value::Bytes(Bytes::from(self.read_many(len)?)))
            }
            Kind::Array => {
                let count = count_from_nibble(self, tag.nibble)?;
                Kind::from_code(self.read_byte()?)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value()?);
                }
                Ok(Value::Array(items))
            }
            Kind::Json => {
                let len = read_len(self)?;
                Ok(Value::Json(Bytes::from(self.read_many(len)?)))
            }
            Kind::Map => {
                let count = count_from_nibble(self, tag.nibble)?;
                let mut entries = HashMap::with_capacity(count);
                for _ in 0..count {
                    let key = match self.read_value()? {
                        Value::Str(key) => key,
                        other => return Err(Error::mismatch("string key", other.kind())),
                    };
                    let value = self.read_value()?;
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
            Kind::Struct => {
                let count = count_from_nibble(self, tag.nibble)?;
                let mut fields = Vec::with_capacity(count);
                for _ in 0..count {
                    fields.push(self.read_value()?);
                }
                Ok(Value::Struct(fields))
            }
        }
    }

    #[inline]
    fn read_num(&mut self) -> Result<Num> {
        let tag = self.read_tag()?;
        num_from_tag(self, tag)
    }

    #[inline]
    fn read_u64(&mut self) -> Result<u64> {
        self.read_num()?.to_u64()
    }

    #[inline]
    fn read_i64(&mut self) -> Result<i64> {
        self.read_num()?.to_i64()
    }

    fn read_float(&mut self) -> Result<Float> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Float => float_from_tag(self, tag),
            other => Err(Error::mismatch("float", other)),
        }
    }

    fn read_f64(&mut self) -> Result<f64> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Float => Ok(float_from_tag(self, tag)?.to_f64()),
            Kind::UNibble | Kind::SNibble | Kind::UInt | Kind::SInt => {
                Ok(num_from_tag(self, tag)?.to_f64())
            }
            other => Err(Error::mismatch("float", other)),
        }
    }

    fn read_f32(&mut self) -> Result<f32> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Float => match float_from_tag(self, tag)? {
                Float::Single(bits) => Ok(f32::from_bits(bits)),
                Float::Double(_) => Err(Error::mismatch("f32", Kind::Float)),
            },
            Kind::UNibble | Kind::SNibble | Kind::UInt | Kind::SInt => {
                Ok(num_from_tag(self, tag)?.to_f32())
            }
            other => Err(Error::mismatch("float", other)),
        }
    }

    fn read_bool(&mut self) -> Result<bool> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Boolean => Ok(tag.nibble & 1 == 1),
            other => Err(Error::mismatch("bool", other)),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::String => {
                let len = count_from_nibble(self, tag.nibble)?;
                Ok(String::from_utf8(self.read_many(len)?)?)
            }
            other => Err(Error::mismatch("string", other)),
        }
    }

    fn read_bytes(&mut self) -> Result<Bytes> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Buffer => {
                let len = count_from_nibble(self, tag.nibble)?;
                Ok(Bytes::from(self.read_many(len)?))
            }
            other => Err(Error::mismatch("buffer", other)),
        }
    }

    fn read_json(&mut self) -> Result<RawJson> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Json => {
                let len = read_len(self)?;
                Ok(RawJson::new(self.read_many(len)?))
            }
            other => Err(Error::mismatch("json", other)),
        }
    }

    fn read_seq<T: De + Described>(&mut self) -> Result<Vec<T>> {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Array => {
                let count = count_from_nibble(self, tag.nibble)?;
                // The element-kind byte is a hint; elements self-describe
                // and convert per the usual rules.
                Kind::from_code(self.read_byte()?)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(T::de(self)?);
                }
                Ok(out)
            }
            other => Err(Error::mismatch("array", other)),
        }
    }

    fn read_map<K, V, H>(&mut self) -> Result<HashMap<K, V, H>>
    where
        K: De + Eq + Hash,
        V: De,
        H: BuildHasher + Default,
    {
        let tag = self.read_tag()?;
        match tag.kind {
            Kind::Map => {
                let count = count_from_nibble(self, tag.nibble)?;
                let mut out = HashMap::with_capacity_and_hasher(count, H::default());
                for _ in 0..count {
                    let key = K::de(self)?;
                    let value = V::de(self)?;
                    out.insert(key, value);
                }
                Ok(out)
            }
            other => Err(Error::mismatch("map", other)),
        }
    }

    fn read_struct_header(&mut self, desc: &Descriptor) -> Result<()> {
        let tag = self.read_tag()?;
        if tag.kind != Kind::Struct {
            return Err(Error::mismatch(desc.name(), tag.kind));
        }
        let wire = count_from_nibble(self, tag.nibble)?;
        if wire != desc.field_count() {
            return Err(Error::FieldCountMismatch {
                name: desc.name(),
                wire,
                expected: desc.field_count(),
            });
        }
        Ok(())
    }
}

/// A value that can be deserialized.
pub trait De: Sized {
    /// Reads a value of type `Self` from the deserializer.
    fn de<D: Deserializer>(d: &mut D) -> Result<Self>;
}

macro_rules! num_de {
    ($typ:ty, $to:tt) => {
        impl De for $typ {
            #[inline]
            fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
                d.read_num()?.$to()
            }
        }
    };
}

num_de!(u8, to_u8);
num_de!(u16, to_u16);
num_de!(u32, to_u32);
num_de!(u64, to_u64);
num_de!(usize, to_usize);
num_de!(i8, to_i8);
num_de!(i16, to_i16);
num_de!(i32, to_i32);
num_de!(i64, to_i64);
num_de!(isize, to_isize);

impl De for f32 {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_f32()
    }
}

impl De for f64 {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_f64()
    }
}

impl De for bool {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_bool()
    }
}

impl De for String {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_string()
    }
}

impl De for Bytes {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_bytes()
    }
}

impl De for Float {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_float()
    }
}

impl De for Value {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_value()
    }
}

impl De for RawJson {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_json()
    }
}

impl<T: De + Described> De for Vec<T> {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_seq()
    }
}

impl<K, V, H> De for HashMap<K, V, H>
where
    K: De + Eq + Hash,
    V: De,
    H: BuildHasher + Default,
{
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        d.read_map()
    }
}

impl<T: De> De for Box<T> {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        T::de(d).map(Box::new)
    }
}

/// The wire cannot express absence, so a decoded optional is always
/// populated; `None` exists only on the encode side, where it is an error.
impl<T: De> De for Option<T> {
    #[inline]
    fn de<D: Deserializer>(d: &mut D) -> Result<Self> {
        T::de(d).map(Some)
    }
}
