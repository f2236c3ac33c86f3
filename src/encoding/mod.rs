//! # EBE binary encoder and decoder
//!
//! Every encoded value starts with a one-byte tag: kind in the high nibble,
//! a small payload or length selector in the low nibble. A stream is just a
//! concatenation of encoded values, so the typed entry points and the
//! dynamic [`decode_value`] can be mixed freely over one source.
//!
//! ```
//! use ebe::encoding::{decode_full, encode_full};
//!
//! let bytes = encode_full(&7u64).unwrap();
//! assert_eq!(bytes, [0x07]);
//!
//! let back: u64 = decode_full(&bytes).unwrap();
//! assert_eq!(back, 7);
//! ```

use bytes::Buf;

use crate::errors::Result;
use crate::Value;

mod constants;
pub mod de;
pub mod ser;

pub use constants::{pack, unpack, Kind, Tag};
pub use de::{De, Deserializer, DeserializerBytes};
pub use ser::{ser_value, Ser, Serializer, SerializerBytes};

/// Encodes a value into the sink.
pub fn encode<T, S>(value: &T, out: &mut S) -> Result<()>
where
    T: Ser + ?Sized,
    S: SerializerBytes,
{
    value.ser(out)
}

/// Encodes a value into a fresh byte vector.
pub fn encode_full<T: Ser + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value.ser(&mut out)?;
    Ok(out)
}

/// Decodes one value of the requested type from the source, leaving the
/// source positioned after it.
pub fn decode<T: De, B: Buf>(data: &mut B) -> Result<T> {
    T::de(data)
}

/// Decodes one value from the source into an existing target.
///
/// On error the target keeps its previous contents but the source position
/// is undefined.
pub fn decode_into<T: De, B: Buf>(data: &mut B, target: &mut T) -> Result<()> {
    *target = T::de(data)?;
    Ok(())
}

/// Decodes one value of the requested type from a byte slice.
pub fn decode_full<T: De>(mut data: &[u8]) -> Result<T> {
    T::de(&mut data)
}

/// Decodes the next value in its dynamic, self-described form.
pub fn decode_value<B: Buf>(data: &mut B) -> Result<Value> {
    data.read_value()
}

/// Reads the next value as a `u64` without generic dispatch.
pub fn decode_u64<B: Buf>(data: &mut B) -> Result<u64> {
    data.read_u64()
}

/// Reads the next value as an `i64` without generic dispatch.
pub fn decode_i64<B: Buf>(data: &mut B) -> Result<i64> {
    data.read_i64()
}

/// Reads the next value as an `f64`, widening a single-precision encoding.
pub fn decode_f64<B: Buf>(data: &mut B) -> Result<f64> {
    data.read_f64()
}

/// Reads the next value as a `String`.
pub fn decode_string<B: Buf>(data: &mut B) -> Result<String> {
    data.read_string()
}

/// Reads the next value as a byte buffer.
pub fn decode_bytes<B: Buf>(data: &mut B) -> Result<bytes::Bytes> {
    data.read_bytes()
}
