//! # EBE: Efficient Binary Encoding
//!
//! A self-describing compact binary serialization format. Every value on
//! the wire starts with a one-byte tag (kind in the high nibble, inline
//! payload or length selector in the low nibble); tiny integers fit in the
//! tag itself and primitive payloads always use the smallest byte count
//! that holds them.
//!
//! The typed API works through the [`Ser`]/[`De`] traits (derivable for
//! structs with `#[derive(EbeSerDe)]`); the dynamic API reads any value
//! into the [`Value`] sum type.
//!
//! ```
//! use ebe::prelude::*;
//!
//! #[derive(EbeSerDe, PartialEq, Debug)]
//! struct Point {
//!     pub x: i32,
//!     pub y: i32,
//! }
//!
//! let bytes = encode_full(&Point { x: 1, y: -2 }).unwrap();
//! assert_eq!(bytes, [0xc2, 0x11, 0x1a]);
//!
//! let back: Point = decode_full(&bytes).unwrap();
//! assert_eq!(back, Point { x: 1, y: -2 });
//! ```

pub mod convert;
pub mod descriptor;
pub mod encoding;
pub mod errors;
pub mod float;
pub mod prelude;
pub mod util;

pub use bytes::Bytes;
pub use ebe_derive::EbeSerDe;
pub use hashbrown::HashMap;

pub use crate::encoding::{
    decode, decode_bytes, decode_f64, decode_full, decode_i64, decode_into, decode_string,
    decode_u64, decode_value, encode, encode_full, De, Deserializer, DeserializerBytes, Kind, Ser,
    Serializer, SerializerBytes,
};
pub use crate::errors::{Error, Result};
pub use crate::float::Float;

use crate::descriptor::Described;

/// A decoded value in its dynamic, self-described form.
///
/// The cases mirror the wire kinds. Integers keep the signedness of their
/// wire form; floats keep their width and exact bit pattern. Dynamic maps
/// are keyed by strings, and composites nest without restriction.
#[derive(Clone, Debug)]
pub enum Value {
    /// Unsigned integer (UNibble or UInt on the wire).
    Uint(u64),
    /// Signed integer (SNibble or SInt on the wire).
    Int(i64),
    /// Float at its encoded width.
    Float(Float),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Str(String),
    /// Raw byte buffer.
    Bytes(Bytes),
    /// Array of values.
    Array(Vec<Value>),
    /// String-keyed map of values.
    Map(HashMap<String, Value>),
    /// Struct as its ordered field values; the wire carries no names.
    Struct(Vec<Value>),
    /// Opaque JSON payload.
    Json(Bytes),
}

impl Value {
    /// The wire kind this value encodes as.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Uint(u) => {
                if *u <= 0x0f {
                    if *u == 0 {
                        Kind::SNibble
                    } else {
                        Kind::UNibble
                    }
                } else {
                    Kind::UInt
                }
            }
            Value::Int(i) => {
                if i.unsigned_abs() <= 7 {
                    Kind::SNibble
                } else {
                    Kind::SInt
                }
            }
            Value::Float(_) => Kind::Float,
            Value::Bool(_) => Kind::Boolean,
            Value::Str(_) => Kind::String,
            Value::Bytes(_) => Kind::Buffer,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Struct(_) => Kind::Struct,
            Value::Json(_) => Kind::Json,
        }
    }

    /// Signed view of an integer value, if it fits.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Unsigned view of an integer value, if non-negative.
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Widened float view.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f.to_f64()),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Integer cases compare by numeric value across signedness: the wire
/// canonicalizes small non-negative integers into the signed nibble, so a
/// `Uint` written out can legitimately come back as an `Int`.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Int(b)) | (Value::Int(b), Value::Uint(a)) => {
                *b >= 0 && *a == *b as u64
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            _ => false,
        }
    }
}

from_fn!(Value, bool, Value::Bool);
from_fn!(Value, u64, Value::Uint);
from_fn!(Value, i64, Value::Int);
from_fn!(Value, Float, Value::Float);
from_fn!(Value, String, Value::Str);
from_fn!(Value, Bytes, Value::Bytes);
from_fn!(Value, &str, |s: &str| Value::Str(s.to_string()));
from_fn!(Value, u8, |u: u8| Value::Uint(u64::from(u)));
from_fn!(Value, u16, |u: u16| Value::Uint(u64::from(u)));
from_fn!(Value, u32, |u: u32| Value::Uint(u64::from(u)));
from_fn!(Value, i8, |i: i8| Value::Int(i64::from(i)));
from_fn!(Value, i16, |i: i16| Value::Int(i64::from(i)));
from_fn!(Value, i32, |i: i32| Value::Int(i64::from(i)));
from_fn!(Value, f32, |f: f32| Value::Float(Float::from(f)));
from_fn!(Value, f64, |f: f64| Value::Float(Float::from(f)));
from_fn!(Value, Vec<Value>, Value::Array);
from_fn!(Value, HashMap<String, Value>, Value::Map);

macro_rules! try_from_ctor {
    ($from:ty, $to:ty, $ctor:path) => {
        impl TryFrom<$from> for $to {
            type Error = $from;

            fn try_from(from: $from) -> std::result::Result<$to, $from> {
                match from {
                    $ctor(a) => Ok(a),
                    f => Err(f),
                }
            }
        }
    };
}

try_from_ctor!(Value, bool, Value::Bool);
try_from_ctor!(Value, u64, Value::Uint);
try_from_ctor!(Value, i64, Value::Int);
try_from_ctor!(Value, Float, Value::Float);
try_from_ctor!(Value, String, Value::Str);
try_from_ctor!(Value, Bytes, Value::Bytes);
try_from_ctor!(Value, Vec<Value>, Value::Array);
try_from_ctor!(Value, HashMap<String, Value>, Value::Map);

/// An opaque JSON payload, carried through the binary stream verbatim.
///
/// The codec transports the bytes without validating them; parsing only
/// happens when the caller asks for it.
///
/// ```
/// use ebe::{decode_full, encode_full, RawJson};
///
/// let raw = RawJson::from_value(&vec![1, 2, 3]).unwrap();
/// let bytes = encode_full(&raw).unwrap();
///
/// let back: RawJson = decode_full(&bytes).unwrap();
/// let nums: Vec<u32> = back.parse().unwrap();
/// assert_eq!(nums, [1, 2, 3]);
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RawJson(Bytes);

impl RawJson {
    /// Wraps already-serialized JSON without validating it.
    pub fn new(bytes: impl Into<Bytes>) -> RawJson {
        RawJson(bytes.into())
    }

    /// Serializes a value to JSON and wraps the result.
    pub fn from_value<T: serde::Serialize>(value: &T) -> Result<RawJson> {
        Ok(RawJson(serde_json::to_vec(value)?.into()))
    }

    /// Parses the payload into the requested type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Described for RawJson {
    const KIND: Kind = Kind::Json;
}

from_fn!(RawJson, Bytes, RawJson);
