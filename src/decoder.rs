//! Decoder engine
//!
//! [`Asn1Decoder`] drives a [`Container`] through the grammar of its target
//! type, one TLV at a time, until the top-level TLV has been consumed.
//!
//! Decoding is resumable: when the buffer ends in the middle of a TLV the
//! engine returns [`DecodeError::TruncatedInput`] without touching the
//! container, and the caller calls again with the same container once more
//! bytes have been appended to the buffer.

use log::{debug, trace};

use crate::container::Container;
use crate::error::DecodeError;
use crate::grammar::Grammar;
use crate::tlv::{self, Tlv};

/// Default limit on the declared length of a top-level TLV
pub const DEFAULT_MAX_PDU_SIZE: usize = 0x20_0000;

/// A type with a grammar, decodable from BER
pub trait Decodable: Default + Sized + 'static {
    type State: crate::grammar::GrammarState;

    fn grammar() -> &'static Grammar<Self>;
}

/// Grammar-driven BER decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asn1Decoder {
    max_pdu_size: usize,
}

impl Default for Asn1Decoder {
    fn default() -> Self {
        Asn1Decoder {
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
        }
    }
}

impl Asn1Decoder {
    pub fn new() -> Self {
        Asn1Decoder::default()
    }

    /// Reject top-level TLVs declaring more than `max_pdu_size` value bytes
    pub fn with_max_pdu_size(max_pdu_size: usize) -> Self {
        Asn1Decoder { max_pdu_size }
    }

    pub fn max_pdu_size(&self) -> usize {
        self.max_pdu_size
    }

    /// Continue decoding `input` from the container's position
    ///
    /// `input` is the whole buffer accumulated so far, starting with the
    /// first byte of the message. On success, returns the number of bytes
    /// making up the message; any bytes after it are left alone.
    pub fn decode<T: Decodable>(
        &self,
        input: &[u8],
        container: &mut Container<T>,
    ) -> Result<usize, DecodeError> {
        self.run(input, container).map_err(|e| {
            let grammar = T::grammar().name();
            if e.is_truncated() {
                trace!("{}: waiting for more input: {}", grammar, e);
            } else {
                debug!("{}: decode failed in state {:?}: {}", grammar, container.state(), e);
            }
            e
        })
    }

    /// Decode a buffer holding exactly one message
    pub fn decode_all<T: Decodable>(&self, input: &[u8]) -> Result<T, DecodeError> {
        let mut container = Container::new();
        let consumed = self.decode(input, &mut container)?;
        if consumed != input.len() {
            return Err(DecodeError::LengthMismatch {
                offset: consumed,
                declared: consumed,
                available: input.len(),
            });
        }
        container.finish()
    }

    fn run<T: Decodable>(
        &self,
        input: &[u8],
        container: &mut Container<T>,
    ) -> Result<usize, DecodeError> {
        let grammar = T::grammar();
        while !container.is_complete() {
            let offset = container.position();
            let available = input.get(offset..).unwrap_or_default();
            let header = tlv::read_header(available, offset)?;
            let total = header.total_len();
            match container.remaining() {
                Some(remaining) if total > remaining => {
                    return Err(DecodeError::LengthMismatch {
                        offset,
                        declared: total,
                        available: remaining,
                    });
                }
                None if header.length() > self.max_pdu_size => {
                    return Err(DecodeError::LengthOverflow {
                        offset,
                        length: header.length(),
                        limit: self.max_pdu_size,
                    });
                }
                _ => (),
            }

            let state = container.state();
            // a tag valid in this state but read at another nesting depth
            // belongs to a different member
            let transition = match grammar.lookup(state, header.tag()) {
                Some(t) if t.depth == container.depth() => *t,
                _ => {
                    return Err(DecodeError::UnexpectedTag {
                        grammar: grammar.name(),
                        state: format!("{:?}", state),
                        tag: header.tag(),
                        offset,
                    })
                }
            };
            trace!(
                "{}: {:?} --{}--> {:?} ({:?}) at {}",
                grammar.name(),
                state,
                header.tag(),
                transition.next,
                transition.action,
                offset
            );

            if transition.action.consumes_value() {
                if available.len() < total {
                    return Err(DecodeError::TruncatedInput {
                        offset,
                        needed: total - available.len(),
                    });
                }
                let tlv = Tlv::new(header, offset, &available[..total]);
                container.transition(transition.next, grammar.is_end_state(transition.next));
                transition.action.apply(container, &tlv)?;
                container.advance(total, None);
            } else {
                let tlv = Tlv::new(header, offset, &available[..header.header_len()]);
                container.transition(transition.next, grammar.is_end_state(transition.next));
                transition.action.apply(container, &tlv)?;
                container.advance(header.header_len(), Some(header.length()));
            }
        }
        if !container.grammar_end_allowed() {
            return Err(DecodeError::PrematureEnd {
                grammar: grammar.name(),
                state: format!("{:?}", container.state()),
            });
        }
        Ok(container.position())
    }
}

/// Decode a buffer holding exactly one message, with default settings
pub fn decode<T: Decodable>(input: &[u8]) -> Result<T, DecodeError> {
    Asn1Decoder::default().decode_all(input)
}

/// Decode the value of `tlv` as an independent structure
///
/// Used by actions for members that have a grammar of their own. Offsets
/// in errors are relative to the enclosing message. The parent has already
/// provided every byte of `tlv`, so running out of input here is a length
/// mismatch rather than a truncation.
pub fn decode_nested<T: Decodable>(tlv: &Tlv<'_>) -> Result<T, DecodeError> {
    let raw = tlv.raw();
    decode::<T>(raw).map_err(|e| match e {
        DecodeError::TruncatedInput { offset, needed } => DecodeError::LengthMismatch {
            offset: tlv.offset() + offset,
            declared: offset + needed,
            available: raw.len(),
        },
        e => e.rebase(tlv.offset()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krb5::{HostAddrType, HostAddress};
    use crate::tlv::Tag;

    static HOST_ADDRESS: &[u8] = &[
        0x30, 0x0d, 0xa0, 0x03, 0x02, 0x01, 0x02, 0xa1, 0x06, 0x04, 0x04, 0xc0, 0xa8, 0x01, 0x01,
    ];

    #[test]
    fn decodes_in_one_call() {
        let mut c = Container::<HostAddress>::new();
        let n = Asn1Decoder::new().decode(HOST_ADDRESS, &mut c).unwrap();
        assert_eq!(n, HOST_ADDRESS.len());
        let addr = c.finish().unwrap();
        assert_eq!(addr.addr_type, HostAddrType::IPV4);
        assert_eq!(addr.address, vec![192, 168, 1, 1]);
    }

    #[test]
    fn resumes_after_truncation() {
        let mut c = Container::<HostAddress>::new();
        let dec = Asn1Decoder::new();
        // the header of [1] is complete, its OCTET STRING is not
        let e = dec.decode(&HOST_ADDRESS[..12], &mut c).unwrap_err();
        assert_eq!(e, DecodeError::TruncatedInput { offset: 9, needed: 3 });
        assert_eq!(c.position(), 9);
        assert_eq!(c.target().addr_type, HostAddrType::IPV4);
        assert_eq!(dec.decode(HOST_ADDRESS, &mut c), Ok(HOST_ADDRESS.len()));
        assert_eq!(c.finish().unwrap().address, vec![192, 168, 1, 1]);
    }

    #[test]
    fn leaves_trailing_bytes() {
        let mut input = HOST_ADDRESS.to_vec();
        input.extend_from_slice(&[0x30, 0x00]);
        let mut c = Container::<HostAddress>::new();
        assert_eq!(Asn1Decoder::new().decode(&input, &mut c), Ok(HOST_ADDRESS.len()));
        assert!(matches!(
            decode::<HostAddress>(&input),
            Err(DecodeError::LengthMismatch { offset: 15, .. })
        ));
    }

    #[test]
    fn child_overrunning_parent() {
        // [0] claims 4 bytes but the SEQUENCE only has 3 left
        let bytes = [0x30, 0x05, 0xa0, 0x04, 0x02, 0x01, 0x02];
        assert_eq!(
            decode::<HostAddress>(&bytes),
            Err(DecodeError::LengthMismatch {
                offset: 2,
                declared: 6,
                available: 5
            })
        );
    }

    #[test]
    fn member_read_at_wrong_depth() {
        // [1] nested in the [0] wrapper, whose INTEGER leaves 8 bytes unread
        let bytes = [
            0x30, 0x0d, 0xa0, 0x0b, 0x02, 0x01, 0x02, 0xa1, 0x06, 0x04, 0x04, 0xc0, 0xa8, 0x01,
            0x01,
        ];
        let mut c = Container::<HostAddress>::new();
        assert_eq!(
            Asn1Decoder::new().decode(&bytes, &mut c),
            Err(DecodeError::UnexpectedTag {
                grammar: "HostAddress",
                state: "AddrType".to_owned(),
                tag: Tag::context(1),
                offset: 7,
            })
        );
        assert_eq!(c.depth(), 2);
        assert_eq!(c.position(), 7);
    }

    #[test]
    fn pdu_size_limit() {
        let dec = Asn1Decoder::with_max_pdu_size(8);
        assert_eq!(
            dec.decode_all::<HostAddress>(HOST_ADDRESS),
            Err(DecodeError::LengthOverflow {
                offset: 0,
                length: 13,
                limit: 8
            })
        );
    }

    #[test]
    fn unexpected_top_level_tag() {
        match decode::<HostAddress>(&[0x31, 0x00]) {
            Err(DecodeError::UnexpectedTag { grammar, tag, .. }) => {
                assert_eq!(grammar, "HostAddress");
                assert_eq!(tag.short_byte(), Some(0x31));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
