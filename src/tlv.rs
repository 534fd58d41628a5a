//! TLV reader: identifier and length octets
//!
//! Headers are parsed with nom's streaming combinators, so a header that is
//! cut short by the end of the buffer yields `Incomplete`, which surfaces as
//! [`DecodeError::TruncatedInput`]. Only definite lengths are accepted.

use std::fmt;

use nom::bytes::streaming::take;
use nom::error::{ErrorKind, ParseError};
use nom::number::streaming::be_u8;
use nom::{Err, IResult, Needed};
use bytes::BufMut;

use crate::error::DecodeError;

/// Maximum number of octets in a long-form length
pub const MAX_LENGTH_OCTETS: usize = 4;

/// Tag class (bits 8-7 of the identifier octet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal = 0,
    Application = 1,
    ContextSpecific = 2,
    Private = 3,
}

impl TagClass {
    fn from_identifier(b: u8) -> Self {
        match b >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    fn bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER tag: class, constructed flag and tag number
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

impl Tag {
    pub const BOOLEAN: Tag = Tag::universal(false, 1);
    pub const INTEGER: Tag = Tag::universal(false, 2);
    pub const BIT_STRING: Tag = Tag::universal(false, 3);
    pub const OCTET_STRING: Tag = Tag::universal(false, 4);
    pub const ENUMERATED: Tag = Tag::universal(false, 10);
    pub const UTF8_STRING: Tag = Tag::universal(false, 12);
    pub const SEQUENCE: Tag = Tag::universal(true, 16);
    pub const GENERALIZED_TIME: Tag = Tag::universal(false, 24);
    pub const GENERAL_STRING: Tag = Tag::universal(false, 27);

    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Tag {
            class,
            constructed,
            number,
        }
    }

    pub const fn universal(constructed: bool, number: u32) -> Self {
        Tag::new(TagClass::Universal, constructed, number)
    }

    /// Constructed `[APPLICATION n]`
    pub const fn application(number: u32) -> Self {
        Tag::new(TagClass::Application, true, number)
    }

    /// Constructed `[n]`, as used by explicit tagging and implicitly tagged SEQUENCEs
    pub const fn context(number: u32) -> Self {
        Tag::new(TagClass::ContextSpecific, true, number)
    }

    /// Primitive `[n]`, an implicitly tagged primitive value
    pub const fn context_primitive(number: u32) -> Self {
        Tag::new(TagClass::ContextSpecific, false, number)
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// The single identifier octet, if the tag number fits the low-tag-number form
    ///
    /// This is the index used by the grammar transition tables.
    pub fn short_byte(&self) -> Option<u8> {
        if self.number < 0x1f {
            let constructed = if self.constructed { 0x20 } else { 0 };
            Some(self.class.bits() | constructed | self.number as u8)
        } else {
            None
        }
    }

    /// Number of identifier octets
    pub fn encoded_len(&self) -> usize {
        if self.number < 0x1f {
            1
        } else {
            let bits = 32 - self.number.leading_zeros() as usize;
            1 + (bits + 6) / 7
        }
    }

    /// Append the identifier octets to `out`
    pub fn write<B: BufMut>(&self, out: &mut B) {
        if let Some(b) = self.short_byte() {
            out.put_u8(b);
            return;
        }
        let constructed = if self.constructed { 0x20 } else { 0 };
        out.put_u8(self.class.bits() | constructed | 0x1f);
        let count = self.encoded_len() - 1;
        for i in (0..count).rev() {
            let group = ((self.number >> (7 * i)) & 0x7f) as u8;
            out.put_u8(if i > 0 { group | 0x80 } else { group });
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "UNIVERSAL ",
            TagClass::Application => "APPLICATION ",
            TagClass::ContextSpecific => "",
            TagClass::Private => "PRIVATE ",
        };
        let form = if self.constructed { "c" } else { "p" };
        write!(f, "[{}{}]/{}", class, self.number, form)
    }
}

/// Number of octets needed to encode a definite length
pub fn length_len(length: usize) -> usize {
    if length < 0x80 {
        1
    } else {
        let bytes = (usize::BITS - length.leading_zeros() + 7) / 8;
        1 + bytes as usize
    }
}

/// Append a definite length in minimal form to `out`
pub fn write_length<B: BufMut>(length: usize, out: &mut B) {
    if length < 0x80 {
        out.put_u8(length as u8);
        return;
    }
    let count = length_len(length) - 1;
    out.put_u8(0x80 | count as u8);
    for i in (0..count).rev() {
        out.put_u8((length >> (8 * i)) as u8);
    }
}

/// Decoded identifier and length octets of one TLV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    tag: Tag,
    header_len: usize,
    length: usize,
}

impl TlvHeader {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Octets taken by identifier and length
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Declared value length
    pub fn length(&self) -> usize {
        self.length
    }

    /// Header plus value
    pub fn total_len(&self) -> usize {
        self.header_len + self.length
    }
}

/// One TLV as seen by a grammar action
///
/// For transitions that enter a constructed TLV only the header has been
/// read, and [`Tlv::value`] is empty; the children follow as separate TLVs.
#[derive(Debug, Clone, Copy)]
pub struct Tlv<'a> {
    header: TlvHeader,
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> Tlv<'a> {
    pub(crate) fn new(header: TlvHeader, offset: usize, bytes: &'a [u8]) -> Self {
        Tlv {
            header,
            offset,
            bytes,
        }
    }

    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    pub fn length(&self) -> usize {
        self.header.length
    }

    pub fn header(&self) -> &TlvHeader {
        &self.header
    }

    /// Absolute offset of the identifier octet
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Value octets (empty when the value has not been read)
    pub fn value(&self) -> &'a [u8] {
        &self.bytes[self.header.header_len..]
    }

    /// Complete encoding, header included
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderError {
    InvalidTag,
    InvalidLength,
    LengthTooLong,
    Nom(ErrorKind),
}

impl<I> ParseError<I> for HeaderError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        HeaderError::Nom(kind)
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

fn fail<I, T>(e: HeaderError) -> IResult<I, T, HeaderError> {
    Err(Err::Error(e))
}

fn parse_identifier(i: &[u8]) -> IResult<&[u8], Tag, HeaderError> {
    let (mut i, first) = be_u8::<_, HeaderError>(i)?;
    let class = TagClass::from_identifier(first);
    let constructed = first & 0x20 != 0;
    if first & 0x1f != 0x1f {
        return Ok((i, Tag::new(class, constructed, u32::from(first & 0x1f))));
    }
    let mut number: u32 = 0;
    let mut count = 0;
    loop {
        let (rem, b) = be_u8::<_, HeaderError>(i)?;
        i = rem;
        // leading 0x80 is a non-minimal encoding; more than 4 groups overflows u32 in practice
        if (count == 0 && b == 0x80) || count == 4 {
            return fail(HeaderError::InvalidTag);
        }
        number = (number << 7) | u32::from(b & 0x7f);
        count += 1;
        if b & 0x80 == 0 {
            break;
        }
    }
    if number < 0x1f {
        return fail(HeaderError::InvalidTag);
    }
    Ok((i, Tag::new(class, constructed, number)))
}

fn parse_length(i: &[u8]) -> IResult<&[u8], usize, HeaderError> {
    let (i, first) = be_u8::<_, HeaderError>(i)?;
    match first {
        0x00..=0x7f => Ok((i, usize::from(first))),
        // indefinite form, and the reserved 0xff
        0x80 | 0xff => fail(HeaderError::InvalidLength),
        _ => {
            let count = usize::from(first & 0x7f);
            if count > MAX_LENGTH_OCTETS {
                return fail(HeaderError::LengthTooLong);
            }
            let (i, octets) = take::<_, _, HeaderError>(count)(i)?;
            let length = octets
                .iter()
                .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
            Ok((i, length))
        }
    }
}

/// Read the header of the TLV starting at `input[0]`
///
/// `offset` is the absolute position of `input` in the stream and is only
/// used for error reporting.
pub fn read_header(input: &[u8], offset: usize) -> Result<TlvHeader, DecodeError> {
    let parsed = parse_identifier(input).and_then(|(rem, tag)| {
        let (rem, length) = parse_length(rem)?;
        Ok((rem, (tag, length)))
    });
    match parsed {
        Ok((rem, (tag, length))) => Ok(TlvHeader {
            tag,
            header_len: input.len() - rem.len(),
            length,
        }),
        Err(Err::Incomplete(needed)) => Err(DecodeError::TruncatedInput {
            offset,
            needed: match needed {
                Needed::Size(n) => n.get(),
                Needed::Unknown => 1,
            },
        }),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(match e {
            HeaderError::InvalidTag => DecodeError::InvalidTagEncoding { offset },
            HeaderError::LengthTooLong => DecodeError::LengthOverflow {
                offset,
                length: input.get(1).map_or(0, |b| usize::from(b & 0x7f)),
                limit: MAX_LENGTH_OCTETS,
            },
            HeaderError::InvalidLength | HeaderError::Nom(_) => {
                DecodeError::InvalidLengthEncoding { offset }
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tag_and_length() {
        let h = read_header(&[0x30, 0x27, 0xa0], 0).unwrap();
        assert_eq!(h.tag(), Tag::SEQUENCE);
        assert_eq!(h.header_len(), 2);
        assert_eq!(h.length(), 0x27);
    }

    #[test]
    fn long_form_length() {
        let h = read_header(&[0x30, 0x81, 0x11], 0).unwrap();
        assert_eq!(h.length(), 0x11);
        assert_eq!(h.header_len(), 3);
        let h = read_header(&[0x04, 0x82, 0x01, 0x00], 0).unwrap();
        assert_eq!(h.length(), 256);
        assert_eq!(h.total_len(), 260);
    }

    #[test]
    fn high_tag_number() {
        let h = read_header(&[0x7f, 0x81, 0x00, 0x00], 0).unwrap();
        assert_eq!(h.tag(), Tag::new(TagClass::Application, true, 128));
        assert_eq!(h.tag().short_byte(), None);
        assert_eq!(h.header_len(), 4);

        let mut out = Vec::new();
        h.tag().write(&mut out);
        assert_eq!(out, [0x7f, 0x81, 0x00]);
    }

    #[test]
    fn truncated_header() {
        assert_eq!(
            read_header(&[], 7),
            Err(DecodeError::TruncatedInput { offset: 7, needed: 1 })
        );
        assert_eq!(
            read_header(&[0x30], 0),
            Err(DecodeError::TruncatedInput { offset: 0, needed: 1 })
        );
        assert_eq!(
            read_header(&[0x30, 0x83, 0x01], 0),
            Err(DecodeError::TruncatedInput { offset: 0, needed: 2 })
        );
        assert!(read_header(&[0x1f, 0x81], 0).unwrap_err().is_truncated());
    }

    #[test]
    fn malformed_header() {
        assert_eq!(
            read_header(&[0x30, 0x80], 4),
            Err(DecodeError::InvalidLengthEncoding { offset: 4 })
        );
        assert_eq!(
            read_header(&[0x1f, 0x80, 0x01, 0x00], 0),
            Err(DecodeError::InvalidTagEncoding { offset: 0 })
        );
        // high-tag form used for a number that fits in 5 bits
        assert_eq!(
            read_header(&[0x1f, 0x02, 0x00], 0),
            Err(DecodeError::InvalidTagEncoding { offset: 0 })
        );
        assert!(matches!(
            read_header(&[0x04, 0x85, 1, 2, 3, 4, 5], 0),
            Err(DecodeError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn minimal_length_encoding() {
        for &(len, expected) in &[
            (0usize, &[0x00][..]),
            (127, &[0x7f]),
            (128, &[0x81, 0x80]),
            (256, &[0x82, 0x01, 0x00]),
        ] {
            let mut out = Vec::new();
            write_length(len, &mut out);
            assert_eq!(out, expected);
            assert_eq!(length_len(len), expected.len());
        }
    }

    #[test]
    fn tag_bytes() {
        assert_eq!(Tag::application(30).short_byte(), Some(0x7e));
        assert_eq!(Tag::context(11).short_byte(), Some(0xab));
        assert_eq!(Tag::context_primitive(0).short_byte(), Some(0x80));
        assert_eq!(Tag::GENERAL_STRING.short_byte(), Some(0x1b));
        assert_eq!(format!("{}", Tag::application(30)), "[APPLICATION 30]/c");
    }
}
