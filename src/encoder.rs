//! DER encoder
//!
//! Lengths precede contents, so every encodable value can report its encoded
//! size before writing anything. Constructed values sum the sizes of their
//! components to emit their own header, then write the components in order.

use bytes::{BufMut, Bytes, BytesMut};

use crate::krb5::{KerberosFlags, KerberosTime};
use crate::tlv::{length_len, write_length, Tag};

pub trait Encodable {
    /// Size of the complete encoding, header included
    fn encoded_len(&self) -> usize;

    /// Append exactly `encoded_len()` bytes to `buf`
    fn encode_to(&self, buf: &mut BytesMut);

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf.freeze()
    }
}

/// Size of a TLV with the given tag and value length
pub fn tlv_len(tag: Tag, value_len: usize) -> usize {
    tag.encoded_len() + length_len(value_len) + value_len
}

pub fn write_header(buf: &mut BytesMut, tag: Tag, value_len: usize) {
    tag.write(buf);
    write_length(value_len, buf);
}

/// A SEQUENCE (or implicitly tagged SEQUENCE) described by its components
pub trait Constructed {
    /// Tag of the SEQUENCE itself
    fn tag(&self) -> Tag {
        Tag::SEQUENCE
    }

    /// Explicit outer tag, e.g. `[APPLICATION 30]` around KRB-ERROR's SEQUENCE
    fn wrapper(&self) -> Option<Tag> {
        None
    }

    /// Visit the components in encoding order, skipping absent OPTIONAL ones
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable));
}

fn content_len<C: Constructed + ?Sized>(c: &C) -> usize {
    let mut len = 0;
    c.components(&mut |e| len += e.encoded_len());
    len
}

impl<C: Constructed> Encodable for C {
    fn encoded_len(&self) -> usize {
        let inner = tlv_len(self.tag(), content_len(self));
        match self.wrapper() {
            Some(tag) => tlv_len(tag, inner),
            None => inner,
        }
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        let content = content_len(self);
        if let Some(tag) = self.wrapper() {
            write_header(buf, tag, tlv_len(self.tag(), content));
        }
        write_header(buf, self.tag(), content);
        self.components(&mut |e| e.encode_to(buf));
    }
}

/// Explicit context tag `[n]` around another value
pub struct Explicit<'a>(pub u32, pub &'a dyn Encodable);

impl Encodable for Explicit<'_> {
    fn encoded_len(&self) -> usize {
        tlv_len(Tag::context(self.0), self.1.encoded_len())
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        write_header(buf, Tag::context(self.0), self.1.encoded_len());
        self.1.encode_to(buf);
    }
}

/// Octets of the minimal two's-complement form of `v`
fn integer_octets(v: i64) -> ([u8; 8], usize) {
    let bytes = v.to_be_bytes();
    let mut skip = 0;
    // drop a leading octet while the next one still carries the sign
    while skip < 7 {
        let (b, next) = (bytes[skip], bytes[skip + 1]);
        if (b == 0x00 && next & 0x80 == 0) || (b == 0xff && next & 0x80 != 0) {
            skip += 1;
        } else {
            break;
        }
    }
    (bytes, skip)
}

/// INTEGER in minimal form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integer(pub i64);

impl Encodable for Integer {
    fn encoded_len(&self) -> usize {
        let (_, skip) = integer_octets(self.0);
        tlv_len(Tag::INTEGER, 8 - skip)
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        let (bytes, skip) = integer_octets(self.0);
        write_header(buf, Tag::INTEGER, 8 - skip);
        buf.put_slice(&bytes[skip..]);
    }
}

/// Primitive with raw content octets: OCTET STRING by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctetString<'a> {
    tag: Tag,
    value: &'a [u8],
}

impl<'a> OctetString<'a> {
    pub fn new(value: &'a [u8]) -> Self {
        OctetString::with_tag(Tag::OCTET_STRING, value)
    }

    /// Same content under another tag (implicit tagging, string types)
    pub fn with_tag(tag: Tag, value: &'a [u8]) -> Self {
        OctetString { tag, value }
    }
}

impl Encodable for OctetString<'_> {
    fn encoded_len(&self) -> usize {
        tlv_len(self.tag, self.value.len())
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        write_header(buf, self.tag, self.value.len());
        buf.put_slice(self.value);
    }
}

/// KerberosString
pub fn general_string(s: &str) -> OctetString<'_> {
    OctetString::with_tag(Tag::GENERAL_STRING, s.as_bytes())
}

/// SEQUENCE OF the given elements
pub struct SequenceOf<'a, E>(pub &'a [E]);

impl<E: Encodable> Encodable for SequenceOf<'_, E> {
    fn encoded_len(&self) -> usize {
        tlv_len(Tag::SEQUENCE, self.0.iter().map(Encodable::encoded_len).sum())
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        let content = self.0.iter().map(Encodable::encoded_len).sum();
        write_header(buf, Tag::SEQUENCE, content);
        for e in self.0 {
            e.encode_to(buf);
        }
    }
}

impl Encodable for KerberosTime {
    fn encoded_len(&self) -> usize {
        tlv_len(Tag::GENERALIZED_TIME, 15)
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        write_header(buf, Tag::GENERALIZED_TIME, 15);
        buf.put_slice(self.to_string().as_bytes());
    }
}

impl Encodable for KerberosFlags {
    fn encoded_len(&self) -> usize {
        tlv_len(Tag::BIT_STRING, 5)
    }

    fn encode_to(&self, buf: &mut BytesMut) {
        write_header(buf, Tag::BIT_STRING, 5);
        buf.put_u8(0);
        buf.put_u32(self.0);
    }
}
