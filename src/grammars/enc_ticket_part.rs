use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{general_string, Constructed, Encodable, Explicit};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::krb5::{EncTicketPart, Realm};
use crate::tlv::Tag;

/// `[APPLICATION 3]`, the outer tag of an EncTicketPart
pub const ENC_TICKET_PART_TAG: Tag = Tag::application(3);

grammar_states! {
    pub enum EncTicketPartState {
        Start,
        App,
        Seq,
        FlagsTag,
        Flags,
        KeyTag,
        Key,
        CrealmTag,
        Crealm,
        CnameTag,
        Cname,
        TransitedTag,
        Transited,
        AuthtimeTag,
        Authtime,
        StarttimeTag,
        Starttime,
        EndtimeTag,
        Endtime,
        RenewTillTag,
        RenewTill,
        CaddrTag,
        Caddr,
        AuthorizationDataTag,
        AuthorizationData,
    }
}

// EncTicketPart   ::= [APPLICATION 3] SEQUENCE {
//         flags                   [0] TicketFlags,
//         key                     [1] EncryptionKey,
//         crealm                  [2] Realm,
//         cname                   [3] PrincipalName,
//         transited               [4] TransitedEncoding,
//         authtime                [5] KerberosTime,
//         starttime               [6] KerberosTime OPTIONAL,
//         endtime                 [7] KerberosTime,
//         renew-till              [8] KerberosTime OPTIONAL,
//         caddr                   [9] HostAddresses OPTIONAL,
//         authorization-data      [10] AuthorizationData OPTIONAL
// }
static GRAMMAR: Lazy<Grammar<EncTicketPart>> = Lazy::new(|| {
    use EncTicketPartState as S;
    type F = Field<EncTicketPart>;
    GrammarBuilder::new("EncTicketPart")
        .transition(S::Start, ENC_TICKET_PART_TAG, S::App, Action::CheckNotNullLength)
        .transition(S::App, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::FlagsTag).then(
                    Tag::BIT_STRING,
                    S::Flags,
                    Action::StoreBitString(|t, flags| t.flags = flags),
                ),
                F::required(1, S::KeyTag).then(
                    Tag::SEQUENCE,
                    S::Key,
                    Action::Custom(|c, tlv| {
                        c.target_mut().key = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
                F::required(2, S::CrealmTag).then(
                    Tag::GENERAL_STRING,
                    S::Crealm,
                    Action::StoreString(|t, s| t.crealm = Realm(s)),
                ),
                F::required(3, S::CnameTag).then(
                    Tag::SEQUENCE,
                    S::Cname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().cname = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
                F::required(4, S::TransitedTag).then(
                    Tag::SEQUENCE,
                    S::Transited,
                    Action::Custom(|c, tlv| {
                        c.target_mut().transited = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
                F::required(5, S::AuthtimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Authtime,
                    Action::ReadKerberosTime(|t, time| t.authtime = time),
                ),
                F::optional(6, S::StarttimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Starttime,
                    Action::ReadKerberosTime(|t, time| t.starttime = Some(time)),
                ),
                F::required(7, S::EndtimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Endtime,
                    Action::ReadKerberosTime(|t, time| t.endtime = time),
                ),
                F::optional(8, S::RenewTillTag).then(
                    Tag::GENERALIZED_TIME,
                    S::RenewTill,
                    Action::ReadKerberosTime(|t, time| t.renew_till = Some(time)),
                ),
                F::optional(9, S::CaddrTag).then(
                    Tag::SEQUENCE,
                    S::Caddr,
                    Action::Custom(|c, tlv| {
                        c.target_mut().caddr = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::optional(10, S::AuthorizationDataTag).then(
                    Tag::SEQUENCE,
                    S::AuthorizationData,
                    Action::Custom(|c, tlv| {
                        c.target_mut().authorization_data = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
            ],
        )
        .build()
});

impl Decodable for EncTicketPart {
    type State = EncTicketPartState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for EncTicketPart {
    fn wrapper(&self) -> Option<Tag> {
        Some(ENC_TICKET_PART_TAG)
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &self.flags));
        f(&Explicit(1, &self.key));
        f(&Explicit(2, &general_string(&self.crealm.0)));
        f(&Explicit(3, &self.cname));
        f(&Explicit(4, &self.transited));
        f(&Explicit(5, &self.authtime));
        if let Some(starttime) = &self.starttime {
            f(&Explicit(6, starttime));
        }
        f(&Explicit(7, &self.endtime));
        if let Some(renew_till) = &self.renew_till {
            f(&Explicit(8, renew_till));
        }
        if let Some(caddr) = &self.caddr {
            f(&Explicit(9, caddr));
        }
        if let Some(ad) = &self.authorization_data {
            f(&Explicit(10, ad));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;
    use crate::krb5::*;

    fn time(day: u8) -> KerberosTime {
        KerberosTime {
            year: 2024,
            month: 3,
            day,
            hour: 12,
            minute: 0,
            second: 0,
        }
    }

    fn sample() -> EncTicketPart {
        EncTicketPart {
            flags: KerberosFlags(0x40e1_0000),
            key: EncryptionKey {
                keytype: EncryptionType::AES256_CTS_HMAC_SHA1_96,
                keyvalue: vec![0x42; 32],
            },
            crealm: Realm("EXAMPLE.COM".to_owned()),
            cname: PrincipalName {
                name_type: NameType::KRB_NT_PRINCIPAL,
                name_string: vec!["alice".to_owned()],
            },
            transited: TransitedEncoding {
                tr_type: TransitedEncodingType::DOMAIN_X500_COMPRESS,
                contents: Vec::new(),
            },
            authtime: time(1),
            starttime: None,
            endtime: time(2),
            renew_till: Some(time(8)),
            caddr: None,
            authorization_data: Some(AuthorizationData(vec![AuthorizationDataEntry {
                ad_type: AuthorizationDataType::AD_IF_RELEVANT,
                ad_data: vec![0x30, 0x00],
            }])),
        }
    }

    #[test]
    fn round_trip_with_gaps() {
        let part = sample();
        let bytes = part.encode();
        assert_eq!(bytes[0], 0x63);
        assert_eq!(decode::<EncTicketPart>(&bytes), Ok(part));
    }

    #[test]
    fn every_optional_present() {
        let mut part = sample();
        part.starttime = Some(time(1));
        part.caddr = Some(HostAddresses(vec![HostAddress {
            addr_type: HostAddrType::IPV4,
            address: vec![10, 0, 0, 1],
        }]));
        let bytes = part.encode();
        assert_eq!(decode::<EncTicketPart>(&bytes), Ok(part));
    }

    #[test]
    fn missing_endtime() {
        let part = sample();
        let mut bytes = part.encode().to_vec();
        assert_eq!(&bytes[..6], &[0x63, 0x81, 0xb3, 0x30, 0x81, 0xb0]);

        let endtime_len = Explicit(7, &part.endtime).encoded_len();
        let start = find(&bytes, &[0xa7, 0x11]).unwrap();
        bytes.drain(start..start + endtime_len);
        bytes[2] -= endtime_len as u8;
        bytes[5] -= endtime_len as u8;
        assert!(matches!(
            decode::<EncTicketPart>(&bytes),
            Err(DecodeError::UnexpectedTag { ref state, .. }) if state == "Authtime"
        ));
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
