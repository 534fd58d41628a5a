use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{general_string, Constructed, Encodable, Explicit, Integer, SequenceOf};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::ticket::TICKET_TAG;
use crate::grammars::{int32, uint32};
use crate::krb5::{EncryptionType, HostAddresses, KdcReqBody, Realm};
use crate::tlv::Tag;

grammar_states! {
    pub enum KdcReqBodyState {
        Start,
        Seq,
        KdcOptionsTag,
        KdcOptions,
        CnameTag,
        Cname,
        RealmTag,
        Realm,
        SnameTag,
        Sname,
        FromTag,
        From,
        TillTag,
        Till,
        RtimeTag,
        Rtime,
        NonceTag,
        Nonce,
        EtypeTag,
        Etypes,
        Etype,
        AddressesTag,
        Addresses,
        EncAuthorizationDataTag,
        EncAuthorizationData,
        AdditionalTicketsTag,
        AdditionalTickets,
        AdditionalTicket,
    }
}

// KDC-REQ-BODY    ::= SEQUENCE {
//         kdc-options             [0] KDCOptions,
//         cname                   [1] PrincipalName OPTIONAL
//                                     -- Used only in AS-REQ --,
//         realm                   [2] Realm
//                                     -- Server's realm
//                                     -- Also client's in AS-REQ --,
//         sname                   [3] PrincipalName OPTIONAL,
//         from                    [4] KerberosTime OPTIONAL,
//         till                    [5] KerberosTime,
//         rtime                   [6] KerberosTime OPTIONAL,
//         nonce                   [7] UInt32,
//         etype                   [8] SEQUENCE OF Int32 -- EncryptionType
//                                     -- in preference order --,
//         addresses               [9] HostAddresses OPTIONAL,
//         enc-authorization-data  [10] EncryptedData OPTIONAL
//                                     -- AuthorizationData --,
//         additional-tickets      [11] SEQUENCE OF Ticket OPTIONAL
//                                        -- NOTE: not empty
// }
static GRAMMAR: Lazy<Grammar<KdcReqBody>> = Lazy::new(|| {
    use KdcReqBodyState as S;
    type F = Field<KdcReqBody>;
    GrammarBuilder::new("KDC-REQ-BODY")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::KdcOptionsTag).then(
                    Tag::BIT_STRING,
                    S::KdcOptions,
                    Action::StoreBitString(|t, flags| t.kdc_options = flags),
                ),
                F::optional(1, S::CnameTag).then(
                    Tag::SEQUENCE,
                    S::Cname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().cname = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::required(2, S::RealmTag).then(
                    Tag::GENERAL_STRING,
                    S::Realm,
                    Action::StoreString(|t, s| t.realm = Realm(s)),
                ),
                F::optional(3, S::SnameTag).then(
                    Tag::SEQUENCE,
                    S::Sname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().sname = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::optional(4, S::FromTag).then(
                    Tag::GENERALIZED_TIME,
                    S::From,
                    Action::ReadKerberosTime(|t, time| t.from = Some(time)),
                ),
                F::required(5, S::TillTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Till,
                    Action::ReadKerberosTime(|t, time| t.till = time),
                ),
                F::optional(6, S::RtimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Rtime,
                    Action::ReadKerberosTime(|t, time| t.rtime = Some(time)),
                ),
                F::required(7, S::NonceTag).then(
                    Tag::INTEGER,
                    S::Nonce,
                    uint32(|t, v| t.nonce = v as u32),
                ),
                F::required(8, S::EtypeTag)
                    .then(Tag::SEQUENCE, S::Etypes, Action::Enter)
                    .repeated(
                        Tag::INTEGER,
                        S::Etype,
                        int32(|t, v| t.etype.push(EncryptionType(v as i32))),
                    ),
                F::optional(9, S::AddressesTag).then(
                    Tag::SEQUENCE,
                    S::Addresses,
                    Action::Custom(|c, tlv| {
                        let addresses: HostAddresses = decode_nested(tlv)?;
                        c.target_mut().addresses = Some(addresses.0);
                        Ok(())
                    }),
                ),
                F::optional(10, S::EncAuthorizationDataTag).then(
                    Tag::SEQUENCE,
                    S::EncAuthorizationData,
                    Action::Custom(|c, tlv| {
                        c.target_mut().enc_authorization_data = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::optional(11, S::AdditionalTicketsTag)
                    .then(Tag::SEQUENCE, S::AdditionalTickets, Action::CheckNotNullLength)
                    .repeated(
                        TICKET_TAG,
                        S::AdditionalTicket,
                        Action::Custom(|c, tlv| {
                            let ticket = decode_nested(tlv)?;
                            c.target_mut().additional_tickets.push(ticket);
                            Ok(())
                        }),
                    ),
            ],
        )
        .build()
});

impl Decodable for KdcReqBody {
    type State = KdcReqBodyState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for KdcReqBody {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        let etypes: Vec<_> = self.etype.iter().map(|e| Integer(e.0.into())).collect();
        f(&Explicit(0, &self.kdc_options));
        if let Some(cname) = &self.cname {
            f(&Explicit(1, cname));
        }
        f(&Explicit(2, &general_string(&self.realm.0)));
        if let Some(sname) = &self.sname {
            f(&Explicit(3, sname));
        }
        if let Some(from) = &self.from {
            f(&Explicit(4, from));
        }
        f(&Explicit(5, &self.till));
        if let Some(rtime) = &self.rtime {
            f(&Explicit(6, rtime));
        }
        f(&Explicit(7, &Integer(self.nonce.into())));
        f(&Explicit(8, &SequenceOf(&etypes)));
        if let Some(addresses) = &self.addresses {
            f(&Explicit(9, &SequenceOf(addresses)));
        }
        if let Some(ead) = &self.enc_authorization_data {
            f(&Explicit(10, ead));
        }
        if !self.additional_tickets.is_empty() {
            f(&Explicit(11, &SequenceOf(&self.additional_tickets)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;
    use crate::krb5::*;

    fn till() -> KerberosTime {
        KerberosTime {
            year: 2037,
            month: 9,
            day: 13,
            hour: 2,
            minute: 48,
            second: 5,
        }
    }

    #[test]
    fn every_member_skip_is_admitted() {
        let g = KdcReqBody::grammar();
        use KdcReqBodyState as S;
        // realm [2] may follow kdc-options directly or after cname
        assert!(g.lookup(S::KdcOptions, Tag::context(2)).is_some());
        assert!(g.lookup(S::Cname, Tag::context(2)).is_some());
        // nonce [7] follows till or rtime
        assert!(g.lookup(S::Till, Tag::context(7)).is_some());
        assert!(g.lookup(S::Rtime, Tag::context(7)).is_some());
        // additional-tickets [11] may follow any of the optional tail
        for &s in &[S::Etypes, S::Etype, S::Addresses, S::EncAuthorizationData] {
            assert!(g.lookup(s, Tag::context(11)).is_some(), "{:?}", s);
        }
        assert!(g.lookup(S::Realm, Tag::context(1)).is_none());
        for &s in &[S::Etypes, S::Etype, S::Addresses, S::AdditionalTicket] {
            assert!(g.is_end_state(s), "{:?}", s);
        }
        assert!(!g.is_end_state(S::Nonce));
    }

    #[test]
    fn tgs_body_round_trip() {
        let body = KdcReqBody {
            kdc_options: KerberosFlags(0x4081_0000),
            realm: Realm("EXAMPLE.COM".to_owned()),
            sname: Some(PrincipalName {
                name_type: NameType::KRB_NT_SRV_INST,
                name_string: vec!["host".to_owned(), "server.example.com".to_owned()],
            }),
            till: till(),
            nonce: 0xdead_beef,
            etype: vec![EncryptionType::AES256_CTS_HMAC_SHA1_96, EncryptionType(-135)],
            addresses: Some(vec![HostAddress {
                addr_type: HostAddrType::IPV6,
                address: vec![0; 16],
            }]),
            enc_authorization_data: Some(EncryptedData {
                etype: EncryptionType::AES256_CTS_HMAC_SHA1_96,
                kvno: None,
                cipher: vec![1, 2, 3],
            }),
            additional_tickets: vec![Ticket {
                tkt_vno: 5,
                realm: Realm("EXAMPLE.COM".to_owned()),
                sname: PrincipalName {
                    name_type: NameType::KRB_NT_SRV_INST,
                    name_string: vec!["krbtgt".to_owned(), "EXAMPLE.COM".to_owned()],
                },
                enc_part: EncryptedData {
                    etype: EncryptionType::AES256_CTS_HMAC_SHA1_96,
                    kvno: Some(2),
                    cipher: vec![0xab; 300],
                },
            }],
            ..KdcReqBody::default()
        };
        let bytes = body.encode();
        assert_eq!(decode::<KdcReqBody>(&bytes), Ok(body));
    }

    #[test]
    fn empty_addresses_differ_from_absent() {
        let body = KdcReqBody {
            realm: Realm("R".to_owned()),
            till: till(),
            ..KdcReqBody::default()
        };
        let absent = body.encode();
        assert_eq!(decode::<KdcReqBody>(&absent).unwrap().addresses, None);

        let body = KdcReqBody {
            addresses: Some(Vec::new()),
            ..body
        };
        let bytes = body.encode();
        // a9 02 30 00 right after the etype member
        assert_eq!(bytes.len(), absent.len() + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[0xa9, 0x02, 0x30, 0x00]);
        let decoded = decode::<KdcReqBody>(&bytes).unwrap();
        assert_eq!(decoded.addresses, Some(Vec::new()));
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn nonce_must_be_unsigned() {
        let body = KdcReqBody {
            realm: Realm("R".to_owned()),
            till: till(),
            ..KdcReqBody::default()
        };
        let mut bytes = body.encode().to_vec();
        // nonce 0 is encoded as a7 03 02 01 00; turn it into -1
        let pos = bytes
            .windows(5)
            .position(|w| w == [0xa7, 0x03, 0x02, 0x01, 0x00])
            .unwrap();
        bytes[pos + 4] = 0xff;
        assert!(matches!(
            decode::<KdcReqBody>(&bytes),
            Err(DecodeError::ValueOutOfRange { value: -1, .. })
        ));
    }
}
