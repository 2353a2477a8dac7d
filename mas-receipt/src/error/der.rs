/*!
 Errors that can happen when reading `DER` or `BER` encoded data.
*/

use std::str::Utf8Error;

use thiserror::Error;

/// Errors that can happen when reading `DER` or `BER` encoded data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerError {
    #[error("Index {0:x} is outside of range {1:x}!")]
    OutOfBounds(usize, usize),
    #[error("Invalid receipt container header!")]
    InvalidHeader,
    #[error("Expected tag {expected:#04x} at index {idx:x}, found {found:#04x}")]
    UnexpectedTag { idx: usize, expected: u8, found: u8 },
    #[error("Unsupported length prefix {0:#04x}")]
    InvalidLength(u8),
    #[error("Multi-byte tag at index {0:x} is not supported")]
    UnsupportedTag(usize),
    #[error("Indefinite length used on a primitive element at index {0:x}")]
    IndefinitePrimitive(usize),
    #[error("Element at index {0:x} nests too deeply")]
    TooDeep(usize),
    #[error("Integer has no content bytes")]
    EmptyInteger,
    #[error("Integer of {0} bytes does not fit in 64 bits")]
    IntegerOverflow(usize),
    #[error("Failed to parse string: {0}")]
    StringParseError(Utf8Error),
    #[error("Found {0} unexpected bytes after the last element")]
    TrailingData(usize),
}
