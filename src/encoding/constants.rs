use crate::errors::Error;

/// High nibble of the tag byte, 0xf0.
pub(crate) const MASK_KIND: u8 = 0b1111_0000;
/// Low nibble of the tag byte, 0x0f.
pub(crate) const MASK_NIBBLE: u8 = 0b0000_1111;

/// Sign bit of an SNibble low nibble, 0x08.
pub(crate) const SNIBBLE_SIGN: u8 = 0b0000_1000;
/// Magnitude bits of an SNibble low nibble, 0x07.
pub(crate) const SNIBBLE_MAG: u8 = 0b0000_0111;

/// Low nibble value meaning "the real count follows as a UInt".
pub(crate) const LEN_OVERFLOW: u8 = 0x08;
/// Largest count that fits directly in the low nibble.
pub(crate) const LEN_INLINE_MAX: u8 = 0x07;

/// Sign bit of the first SInt payload byte, 0x80.
pub(crate) const SINT_SIGN: u8 = 0b1000_0000;

/// Wire type families. The numeric codes are stable and appear both in tag
/// high nibbles and in array element-kind bytes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Kind {
    /// Unsigned integer in [1,15], value inline in the low nibble.
    UNibble = 0,
    /// Signed integer in [-7,7], sign and magnitude inline in the low nibble.
    SNibble = 1,
    /// Signed integer, low nibble = payload byte count.
    SInt = 2,
    /// Unsigned integer, low nibble = payload byte count.
    UInt = 3,
    /// IEEE-754 float, low nibble = 4 or 8.
    Float = 4,
    /// Boolean, value in bit 0 of the low nibble.
    Boolean = 6,
    /// UTF-8 string with the short-form length rule.
    String = 7,
    /// Raw byte buffer with the short-form length rule.
    Buffer = 8,
    /// Homogeneous sequence: count, element kind byte, then elements.
    Array = 9,
    /// Opaque JSON payload, length always follows as a UInt.
    Json = 10,
    /// Key-value sequence: count, then self-describing pairs.
    Map = 11,
    /// Ordered field sequence: count, then self-describing field values.
    Struct = 12,
}

impl Kind {
    /// Maps a wire code back to a kind. Code 5 is reserved; it and
    /// everything past `Struct` is unknown.
    pub fn from_code(code: u8) -> Result<Kind, Error> {
        use Kind::*;
        match code {
            0 => Ok(UNibble),
            1 => Ok(SNibble),
            2 => Ok(SInt),
            3 => Ok(UInt),
            4 => Ok(Float),
            6 => Ok(Boolean),
            7 => Ok(String),
            8 => Ok(Buffer),
            9 => Ok(Array),
            10 => Ok(Json),
            11 => Ok(Map),
            12 => Ok(Struct),
            unknown => Err(Error::UnknownKind(unknown)),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        use Kind::*;
        match self {
            UNibble => "UNibble",
            SNibble => "SNibble",
            SInt => "SInt",
            UInt => "UInt",
            Float => "Float",
            Boolean => "Boolean",
            String => "String",
            Buffer => "Buffer",
            Array => "Array",
            Json => "Json",
            Map => "Map",
            Struct => "Struct",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded tag byte: kind in the high nibble, payload in the low nibble.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Tag {
    pub kind: Kind,
    pub nibble: u8,
}

/// Packs a kind and a low nibble into a tag byte.
#[inline]
pub fn pack(kind: Kind, nibble: u8) -> u8 {
    (kind.code() << 4) | (nibble & MASK_NIBBLE)
}

/// Splits a tag byte, failing on reserved or out-of-range kind codes.
#[inline]
pub fn unpack(byte: u8) -> Result<Tag, Error> {
    let kind = Kind::from_code((byte & MASK_KIND) >> 4)?;
    Ok(Tag {
        kind,
        nibble: byte & MASK_NIBBLE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        for kind in [
            Kind::UNibble,
            Kind::SNibble,
            Kind::SInt,
            Kind::UInt,
            Kind::Float,
            Kind::Boolean,
            Kind::String,
            Kind::Buffer,
            Kind::Array,
            Kind::Json,
            Kind::Map,
            Kind::Struct,
        ] {
            for nibble in 0..=0x0f {
                let tag = unpack(pack(kind, nibble)).unwrap();
                assert_eq!(tag.kind, kind);
                assert_eq!(tag.nibble, nibble);
            }
        }
    }

    #[test]
    fn reserved_and_unknown_codes() {
        for byte in [0x50, 0x5f, 0xd0, 0xe7, 0xff] {
            assert!(matches!(unpack(byte), Err(Error::UnknownKind(_))));
        }
    }
}
