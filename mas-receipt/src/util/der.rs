/*!
 Contains logic to read `DER` encoded data, the binary encoding used by the receipt container.

 Receipts are [`PKCS #7`](https://datatracker.ietf.org/doc/html/rfc2315) `SignedData` structures whose
 payload is a set of tag-length-value records. Only the small subset of `ASN.1` needed to walk that
 structure is implemented here. Some receipts are produced with `BER` indefinite lengths and chunked
 octet strings, so those are tolerated as well.

 Logic referenced from:
   - [X.690](https://www.itu.int/rec/T-REC-X.690)
   - [Validating receipts locally](https://developer.apple.com/documentation/appstorereceipts/validating_receipts_on_the_device)
*/

use std::borrow::Cow;

use crate::error::der::DerError;

/// Indicates an `INTEGER` element
pub const INTEGER: u8 = 0x02;
/// Indicates a primitive `OCTET STRING` element
pub const OCTET_STRING: u8 = 0x04;
/// Indicates an `OBJECT IDENTIFIER` element
pub const OBJECT_IDENTIFIER: u8 = 0x06;
/// Indicates a `UTF8String` element
pub const UTF8_STRING: u8 = 0x0C;
/// Indicates a `PrintableString` element
pub const PRINTABLE_STRING: u8 = 0x13;
/// Indicates an `IA5String` element
pub const IA5_STRING: u8 = 0x16;
/// Indicates a `SEQUENCE` element
pub const SEQUENCE: u8 = 0x30;
/// Indicates a `SET` element
pub const SET: u8 = 0x31;
/// Indicates a context-specific, constructed element with tag number `0`
pub const CONTEXT_0: u8 = 0xA0;

/// Bit set on tags whose contents are made of other elements
const CONSTRUCTED: u8 = 0x20;
/// Low tag bits that mean the tag number continues in the following bytes
const HIGH_TAG_NUMBER: u8 = 0x1F;
/// Length prefix bit that means the following bytes hold the length
const LONG_FORM: u8 = 0x80;
/// Length prefix that means the contents are terminated by two zero bytes
const INDEFINITE: u8 = 0x80;
/// The largest long form length prefix we read
const MAX_LENGTH_BYTES: u8 = 4;
/// Indefinite length elements and chunked octet strings are walked recursively; bound the recursion
const MAX_DEPTH: usize = 32;

/// A single tag-length-value element borrowed from the source bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    /// The identifier byte
    pub tag: u8,
    /// Position of the first content byte in the outermost stream
    pub offset: usize,
    /// The content bytes, excluding the tag and length prefix
    pub contents: &'a [u8],
}

impl<'a> Element<'a> {
    /// Get a reader over the contents of this element
    pub fn reader(&self) -> DerReader<'a> {
        DerReader::with_base(self.contents, self.offset)
    }

    /// Ensure this element has the given tag
    pub fn expect(self, tag: u8) -> Result<Self, DerError> {
        if self.tag == tag {
            return Ok(self);
        }
        Err(DerError::UnexpectedTag {
            idx: self.offset,
            expected: tag,
            found: self.tag,
        })
    }

    /// Read the contents of an `INTEGER` as a two's complement signed number
    pub fn as_integer(&self) -> Result<i64, DerError> {
        let bytes = self.expect(INTEGER)?.contents;
        let first = bytes.first().ok_or(DerError::EmptyInteger)?;
        if bytes.len() > 8 {
            return Err(DerError::IntegerOverflow(bytes.len()));
        }

        let sign: i64 = if first & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes
            .iter()
            .fold(sign, |acc, byte| (acc << 8) | *byte as i64))
    }

    /// Read the contents of a `UTF8String`, `PrintableString`, or `IA5String`
    pub fn as_string(&self) -> Result<&'a str, DerError> {
        match self.tag {
            UTF8_STRING | PRINTABLE_STRING | IA5_STRING => {
                std::str::from_utf8(self.contents).map_err(DerError::StringParseError)
            }
            found => Err(DerError::UnexpectedTag {
                idx: self.offset,
                expected: UTF8_STRING,
                found,
            }),
        }
    }

    /// Read the contents of an `OCTET STRING`
    ///
    /// `BER` allows an octet string to be split into constructed chunks, in which case the
    /// chunks are concatenated into a new buffer.
    pub fn as_octets(&self) -> Result<Cow<'a, [u8]>, DerError> {
        match self.tag {
            OCTET_STRING => Ok(Cow::Borrowed(self.contents)),
            _ => {
                let mut out = Vec::with_capacity(self.contents.len());
                self.join_octets(&mut out, 0)?;
                Ok(Cow::Owned(out))
            }
        }
    }

    /// Append the chunks of a constructed `OCTET STRING` to `out`
    fn join_octets(&self, out: &mut Vec<u8>, depth: usize) -> Result<(), DerError> {
        match self.tag {
            OCTET_STRING => out.extend_from_slice(self.contents),
            tag if tag == OCTET_STRING | CONSTRUCTED => {
                if depth >= MAX_DEPTH {
                    return Err(DerError::TooDeep(self.offset));
                }
                let mut chunks = self.reader();
                while !chunks.is_empty() {
                    chunks.read_element()?.join_octets(out, depth + 1)?;
                }
            }
            found => {
                return Err(DerError::UnexpectedTag {
                    idx: self.offset,
                    expected: OCTET_STRING,
                    found,
                })
            }
        }
        Ok(())
    }
}

/// Contains logic and data used to read elements from `DER` encoded bytes
#[derive(Debug)]
pub struct DerReader<'a> {
    /// The bytes we want to read
    stream: &'a [u8],
    /// The current index we are at in the stream
    idx: usize,
    /// Position of `stream` inside the outermost stream, used in error messages
    base: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self::with_base(stream, 0)
    }

    fn with_base(stream: &'a [u8], base: usize) -> Self {
        Self {
            stream,
            idx: 0,
            base,
        }
    }

    /// Whether every byte in the stream has been consumed
    pub fn is_empty(&self) -> bool {
        self.idx >= self.stream.len()
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.stream.len().saturating_sub(self.idx)
    }

    /// Fail if there are unread bytes left in the stream
    pub fn finish(&self) -> Result<(), DerError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(DerError::TrailingData(extra)),
        }
    }

    /// Read the next element
    pub fn read_element(&mut self) -> Result<Element<'a>, DerError> {
        self.read_element_at_depth(0)
    }

    /// Read the next element, failing if it does not have the given tag
    pub fn read_expected(&mut self, tag: u8) -> Result<Element<'a>, DerError> {
        self.read_element()?.expect(tag)
    }

    fn read_element_at_depth(&mut self, depth: usize) -> Result<Element<'a>, DerError> {
        let tag_idx = self.idx;
        let tag = self.get_current_byte()?;
        if tag & HIGH_TAG_NUMBER == HIGH_TAG_NUMBER {
            return Err(DerError::UnsupportedTag(self.base + tag_idx));
        }
        self.idx += 1;

        match self.read_length()? {
            Some(length) => {
                let offset = self.base + self.idx;
                let contents = self.read_exact_bytes(length)?;
                Ok(Element {
                    tag,
                    offset,
                    contents,
                })
            }
            None => {
                if tag & CONSTRUCTED == 0 {
                    return Err(DerError::IndefinitePrimitive(self.base + tag_idx));
                }
                if depth >= MAX_DEPTH {
                    return Err(DerError::TooDeep(self.base + tag_idx));
                }

                let start = self.idx;
                // Contents end at the first end-of-contents marker on this level
                while self.get_current_byte()? != 0 || self.get_next_byte()? != 0 {
                    self.read_element_at_depth(depth + 1)?;
                }
                let contents = &self.stream[start..self.idx];
                self.idx += 2;

                Ok(Element {
                    tag,
                    offset: self.base + start,
                    contents,
                })
            }
        }
    }

    /// Read a length prefix; `None` indicates an indefinite length
    fn read_length(&mut self) -> Result<Option<usize>, DerError> {
        let prefix = self.get_current_byte()?;
        self.idx += 1;

        if prefix & LONG_FORM == 0 {
            return Ok(Some(prefix as usize));
        }
        if prefix == INDEFINITE {
            return Ok(None);
        }

        let size = prefix & !LONG_FORM;
        if size > MAX_LENGTH_BYTES {
            return Err(DerError::InvalidLength(prefix));
        }
        let length = self
            .read_exact_bytes(size as usize)?
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);
        Ok(Some(length))
    }

    /// Read exactly `n` bytes from the stream
    fn read_exact_bytes(&mut self, n: usize) -> Result<&'a [u8], DerError> {
        let end = self.idx.checked_add(n).ok_or(DerError::OutOfBounds(
            usize::MAX,
            self.base + self.stream.len(),
        ))?;
        let range = self.stream.get(self.idx..end).ok_or(DerError::OutOfBounds(
            self.base + end,
            self.base + self.stream.len(),
        ))?;
        self.idx = end;
        Ok(range)
    }

    /// Get the byte at a given index, if the index is within the bounds of the stream
    fn get_byte(&self, byte_idx: usize) -> Result<u8, DerError> {
        self.stream
            .get(byte_idx)
            .copied()
            .ok_or(DerError::OutOfBounds(
                self.base + byte_idx,
                self.base + self.stream.len(),
            ))
    }

    /// Read the current byte
    fn get_current_byte(&self) -> Result<u8, DerError> {
        self.get_byte(self.idx)
    }

    /// Read the next byte
    fn get_next_byte(&self) -> Result<u8, DerError> {
        self.get_byte(self.idx + 1)
    }
}
