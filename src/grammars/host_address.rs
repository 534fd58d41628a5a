use once_cell::sync::Lazy;

use crate::container::Container;
use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{Constructed, Encodable, Explicit, Integer, OctetString};
use crate::error::DecodeError;
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::int32;
use crate::krb5::{HostAddrType, HostAddress, HostAddresses};
use crate::tlv::{Tag, Tlv};

grammar_states! {
    pub enum HostAddressState {
        Start,
        Seq,
        AddrTypeTag,
        AddrType,
        AddressTag,
        Address,
    }
}

// HostAddress     ::= SEQUENCE  {
//         addr-type       [0] Int32,
//         address         [1] OCTET STRING
// }
static HOST_ADDRESS: Lazy<Grammar<HostAddress>> = Lazy::new(|| {
    use HostAddressState as S;
    type F = Field<HostAddress>;
    GrammarBuilder::new("HostAddress")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::AddrTypeTag).then(
                    Tag::INTEGER,
                    S::AddrType,
                    int32(|t, v| t.addr_type = HostAddrType(v as i32)),
                ),
                F::required(1, S::AddressTag).then(
                    Tag::OCTET_STRING,
                    S::Address,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.address = v,
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for HostAddress {
    type State = HostAddressState;

    fn grammar() -> &'static Grammar<Self> {
        &HOST_ADDRESS
    }
}

impl Constructed for HostAddress {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.addr_type.0.into())));
        f(&Explicit(1, &OctetString::new(&self.address)));
    }
}

grammar_states! {
    pub enum HostAddressesState {
        Start,
        Seq,
        Address,
    }
}

fn push_address(c: &mut Container<HostAddresses>, tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    let address = decode_nested(tlv)?;
    c.target_mut().0.push(address);
    Ok(())
}

// HostAddresses   -- NOTE: subtly different from rfc1510,
//                 -- but has a value mapping and encodes the same
//         ::= SEQUENCE OF HostAddress
static HOST_ADDRESSES: Lazy<Grammar<HostAddresses>> = Lazy::new(|| {
    use HostAddressesState as S;
    GrammarBuilder::new("HostAddresses")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .transition(S::Seq, Tag::SEQUENCE, S::Address, Action::Custom(push_address))
        .transition(S::Address, Tag::SEQUENCE, S::Address, Action::Custom(push_address))
        .end_state(S::Seq)
        .end_state(S::Address)
        .build()
});

impl Decodable for HostAddresses {
    type State = HostAddressesState;

    fn grammar() -> &'static Grammar<Self> {
        &HOST_ADDRESSES
    }
}

impl Constructed for HostAddresses {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        for address in &self.0 {
            f(address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    static NETBIOS: &[u8] = &[
        0x30, 0x19, 0xa0, 0x03, 0x02, 0x01, 0x14, 0xa1, 0x12, 0x04, 0x10, 0x57, 0x4f, 0x52, 0x4b,
        0x53, 0x54, 0x41, 0x54, 0x49, 0x4f, 0x4e, 0x20, 0x20, 0x20, 0x20, 0x20,
    ];

    #[test]
    fn netbios_address() {
        let addr: HostAddress = decode(NETBIOS).unwrap();
        assert_eq!(addr.addr_type, HostAddrType::NETBIOS);
        assert_eq!(addr.address, b"WORKSTATION     ".to_vec());
        assert_eq!(addr.encode().as_ref(), NETBIOS);
    }

    #[test]
    fn unknown_address_type_is_kept() {
        let bytes = [
            0x30, 0x0b, 0xa0, 0x04, 0x02, 0x02, 0x03, 0xe7, 0xa1, 0x03, 0x04, 0x01, 0xaa,
        ];
        let addr: HostAddress = decode(&bytes).unwrap();
        assert_eq!(addr.addr_type, HostAddrType(999));
        assert!(!addr.addr_type.is_known());
        assert_eq!(addr.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn address_inside_type_wrapper() {
        let bytes = [
            0x30, 0x0d, 0xa0, 0x0b, 0x02, 0x01, 0x02, 0xa1, 0x06, 0x04, 0x04, 0xc0, 0xa8, 0x01,
            0x01,
        ];
        assert!(matches!(
            decode::<HostAddress>(&bytes),
            Err(DecodeError::UnexpectedTag { grammar: "HostAddress", offset: 7, .. })
        ));
    }

    #[test]
    fn address_list() {
        let mut bytes = vec![0x30, 0x1b];
        bytes.extend_from_slice(NETBIOS);
        let list: HostAddresses = decode(&bytes).unwrap();
        assert_eq!(list.0.len(), 1);
        assert_eq!(list.encode().as_ref(), &bytes[..]);

        let empty: HostAddresses = decode(&[0x30, 0x00]).unwrap();
        assert!(empty.0.is_empty());
    }

    #[test]
    fn nested_errors_use_message_offsets() {
        // second element has an empty [0] wrapper
        let mut bytes = vec![0x30, 0x21];
        bytes.extend_from_slice(NETBIOS);
        bytes.extend_from_slice(&[0x30, 0x04, 0xa0, 0x00, 0xa1, 0x00]);
        assert_eq!(
            decode::<HostAddresses>(&bytes),
            Err(DecodeError::ZeroLengthViolation { offset: 31 })
        );
    }
}
