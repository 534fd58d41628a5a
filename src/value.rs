//! Value decoders
//!
//! Stateless functions interpreting the value octets of a primitive TLV.
//! The caller has already matched the tag; these only look at content.
//! INTEGER, BOOLEAN, BIT STRING and GeneralizedTime contents are read with
//! the `asn1-rs` types re-exported by `der-parser`, then checked against the
//! Kerberos profile.

use std::convert::TryFrom;
use std::str;

use der_parser::asn1_rs::{self, ASN1TimeZone, Any, Boolean, GeneralizedTime, Integer};

use crate::error::ValueError;
use crate::krb5::KerberosTime;

/// Decoded BIT STRING: unused-bit count and the content octets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString {
    pub unused_bits: u8,
    pub data: Vec<u8>,
}

impl BitString {
    /// Number of significant bits
    pub fn bit_len(&self) -> usize {
        self.data.len() * 8 - usize::from(self.unused_bits)
    }

    /// Value of bit `n`, where bit 0 is the most significant bit of the first octet
    pub fn is_set(&self, n: usize) -> bool {
        n < self.bit_len() && asn1_rs::BitString::new(self.unused_bits, &self.data).is_set(n)
    }
}

/// Two's-complement big-endian INTEGER (or ENUMERATED)
pub fn parse_integer(i: &[u8]) -> Result<i64, ValueError> {
    if i.is_empty() {
        return Err(ValueError::Empty);
    }
    Integer::new(i)
        .as_i64()
        .map_err(|_| ValueError::IntegerTooLong(i.len()))
}

/// ENUMERATED values share the INTEGER encoding
pub fn parse_enumerated(i: &[u8]) -> Result<i64, ValueError> {
    parse_integer(i)
}

/// BOOLEAN; BER accepts any non-zero octet as TRUE
pub fn parse_boolean(i: &[u8]) -> Result<bool, ValueError> {
    let any = Any::from_tag_and_data(asn1_rs::Tag::Boolean, i);
    Boolean::try_from(&any)
        .map(|b| b.bool())
        .map_err(|_| ValueError::InvalidBoolean)
}

/// BIT STRING: first octet holds the number of unused trailing bits
pub fn parse_bit_string(i: &[u8]) -> Result<BitString, ValueError> {
    let any = Any::from_tag_and_data(asn1_rs::Tag::BitString, i);
    let bits = asn1_rs::BitString::try_from(&any)
        .map_err(|_| ValueError::InvalidBitString("missing unused-bits octet"))?;
    if bits.unused_bits > 7 {
        return Err(ValueError::InvalidBitString("more than 7 unused bits"));
    }
    if bits.data.is_empty() && bits.unused_bits != 0 {
        return Err(ValueError::InvalidBitString("unused bits in empty string"));
    }
    Ok(BitString {
        unused_bits: bits.unused_bits,
        data: bits.data.into_owned(),
    })
}

pub fn parse_octet_string(i: &[u8]) -> Vec<u8> {
    i.to_vec()
}

/// KerberosString, LDAPString and UTF8String all carry UTF-8 text in practice
pub fn parse_utf8_string(i: &[u8]) -> Result<String, ValueError> {
    str::from_utf8(i)
        .map(str::to_owned)
        .map_err(|_| ValueError::InvalidUtf8)
}

/// KerberosTime: GeneralizedTime `YYYYMMDDHHMMSSZ`, UTC, no fractional seconds
pub fn parse_kerberos_time(i: &[u8]) -> Result<KerberosTime, ValueError> {
    if i.len() != 15 {
        return Err(ValueError::InvalidTime("expected 15 characters"));
    }
    let GeneralizedTime(dt) = GeneralizedTime::from_bytes(i)
        .map_err(|_| ValueError::InvalidTime("malformed GeneralizedTime"))?;
    if dt.tz != ASN1TimeZone::Z || dt.millisecond.is_some() {
        return Err(ValueError::InvalidTime("missing Z suffix"));
    }
    // upper bounds are checked by GeneralizedTime, zero is not
    if dt.month == 0 || dt.day == 0 {
        return Err(ValueError::InvalidTime("date out of range"));
    }
    Ok(KerberosTime {
        year: dt.year as u16,
        month: dt.month,
        day: dt.day,
        hour: dt.hour,
        minute: dt.minute,
        second: dt.second,
    })
}
