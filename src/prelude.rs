//! One-stop imports for working with the codec.
//!
//! ```
//! use ebe::prelude::*;
//! ```

pub use crate::convert::Num;
pub use crate::descriptor::{self, Described, Descriptor, Field};
pub use crate::encoding::{
    decode, decode_bytes, decode_f64, decode_full, decode_i64, decode_into, decode_string,
    decode_u64, decode_value, encode, encode_full, pack, unpack, De, Deserializer,
    DeserializerBytes, Kind, Ser, Serializer, SerializerBytes, Tag,
};
pub use crate::errors::{Error, Result};
pub use crate::float::Float;
pub use crate::{Bytes, EbeSerDe, HashMap, RawJson, Value};
