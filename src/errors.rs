//! The codec's error taxonomy.

use crate::encoding::Kind;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while encoding or decoding.
///
/// Decode failures leave the source at an undefined position and any
/// partially populated target in an unspecified state; callers should
/// discard both.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The source ran out of bytes mid-value.
    #[error("requested {needed} bytes, but only {remaining} bytes were left")]
    Truncated { needed: usize, remaining: usize },

    /// A tag byte carried a kind code outside the defined set.
    #[error("unknown kind code {0} in tag")]
    UnknownKind(u8),

    /// A length-bearing tag carried a low nibble in 9..15.
    #[error("invalid length nibble {0}, expected 0..=7 or the overflow indicator 8")]
    InvalidLengthNibble(u8),

    /// A float tag carried a width other than 4 or 8.
    #[error("invalid float width {0}, expected 4 or 8")]
    InvalidFloatWidth(u8),

    /// The tag kind is not acceptable for the requested target type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Kind },

    /// The decoded magnitude does not fit the requested target type.
    #[error("value {value} does not fit in {target}")]
    RangeError { value: i128, target: &'static str },

    /// The field count on the wire differs from the target struct's
    /// visible-field count.
    #[error("struct field count mismatch: wire has {wire}, {name} has {expected} visible fields")]
    FieldCountMismatch {
        name: &'static str,
        wire: usize,
        expected: usize,
    },

    /// The encoder was handed an absent value the wire cannot express.
    #[error("cannot encode an absent value")]
    NullValue,

    /// The encoder cannot describe the given value.
    #[error("unsupported value: {0}")]
    UnsupportedType(&'static str),

    /// An embedded JSON payload failed to parse.
    #[error("embedded JSON payload failed to parse")]
    JsonMalformed(#[from] serde_json::Error),

    /// A String payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    pub(crate) fn mismatch(expected: &'static str, found: Kind) -> Error {
        Error::TypeMismatch { expected, found }
    }
}
