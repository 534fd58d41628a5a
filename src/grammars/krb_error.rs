use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{general_string, Constructed, Encodable, Explicit, Integer, OctetString};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::{exactly, int32, microseconds, pvno};
use crate::krb5::{KrbError, MessageType, Realm};
use crate::krb5_errors::ErrorCode;
use crate::tlv::Tag;

/// `[APPLICATION 30]`, the outer tag of a KRB-ERROR
pub const KRB_ERROR_TAG: Tag = Tag::application(30);

grammar_states! {
    pub enum KrbErrorState {
        Start,
        App,
        Seq,
        PvnoTag,
        Pvno,
        MsgTypeTag,
        MsgType,
        CtimeTag,
        Ctime,
        CusecTag,
        Cusec,
        StimeTag,
        Stime,
        SusecTag,
        Susec,
        ErrorCodeTag,
        ErrorCode,
        CrealmTag,
        Crealm,
        CnameTag,
        Cname,
        RealmTag,
        Realm,
        SnameTag,
        Sname,
        EtextTag,
        Etext,
        EdataTag,
        Edata,
    }
}

// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE {
//         pvno            [0] INTEGER (5),
//         msg-type        [1] INTEGER (30),
//         ctime           [2] KerberosTime OPTIONAL,
//         cusec           [3] Microseconds OPTIONAL,
//         stime           [4] KerberosTime,
//         susec           [5] Microseconds,
//         error-code      [6] Int32,
//         crealm          [7] Realm OPTIONAL,
//         cname           [8] PrincipalName OPTIONAL,
//         realm           [9] Realm -- service realm --,
//         sname           [10] PrincipalName -- service name --,
//         e-text          [11] KerberosString OPTIONAL,
//         e-data          [12] OCTET STRING OPTIONAL
// }
static GRAMMAR: Lazy<Grammar<KrbError>> = Lazy::new(|| {
    use KrbErrorState as S;
    type F = Field<KrbError>;
    GrammarBuilder::new("KRB-ERROR")
        .transition(S::Start, KRB_ERROR_TAG, S::App, Action::CheckNotNullLength)
        .transition(S::App, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::PvnoTag).then(Tag::INTEGER, S::Pvno, pvno(|t, v| t.pvno = v as u32)),
                F::required(1, S::MsgTypeTag).then(
                    Tag::INTEGER,
                    S::MsgType,
                    exactly(MessageType::KRB_ERROR.0.into(), |t, v| t.msg_type = MessageType(v as u32)),
                ),
                F::optional(2, S::CtimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Ctime,
                    Action::ReadKerberosTime(|t, time| t.ctime = Some(time)),
                ),
                F::optional(3, S::CusecTag).then(
                    Tag::INTEGER,
                    S::Cusec,
                    microseconds(|t, v| t.cusec = Some(v as u32)),
                ),
                F::required(4, S::StimeTag).then(
                    Tag::GENERALIZED_TIME,
                    S::Stime,
                    Action::ReadKerberosTime(|t, time| t.stime = time),
                ),
                F::required(5, S::SusecTag).then(
                    Tag::INTEGER,
                    S::Susec,
                    microseconds(|t, v| t.susec = v as u32),
                ),
                F::required(6, S::ErrorCodeTag).then(
                    Tag::INTEGER,
                    S::ErrorCode,
                    int32(|t, v| t.error_code = ErrorCode(v as i32)),
                ),
                F::optional(7, S::CrealmTag).then(
                    Tag::GENERAL_STRING,
                    S::Crealm,
                    Action::StoreString(|t, s| t.crealm = Some(Realm(s))),
                ),
                F::optional(8, S::CnameTag).then(
                    Tag::SEQUENCE,
                    S::Cname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().cname = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::required(9, S::RealmTag).then(
                    Tag::GENERAL_STRING,
                    S::Realm,
                    Action::StoreString(|t, s| t.realm = Realm(s)),
                ),
                F::required(10, S::SnameTag).then(
                    Tag::SEQUENCE,
                    S::Sname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().sname = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
                F::optional(11, S::EtextTag).then(
                    Tag::GENERAL_STRING,
                    S::Etext,
                    Action::StoreString(|t, s| t.etext = Some(s)),
                ),
                F::optional(12, S::EdataTag).then(
                    Tag::OCTET_STRING,
                    S::Edata,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.edata = Some(v),
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for KrbError {
    type State = KrbErrorState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for KrbError {
    fn wrapper(&self) -> Option<Tag> {
        Some(KRB_ERROR_TAG)
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.pvno.into())));
        f(&Explicit(1, &Integer(self.msg_type.0.into())));
        if let Some(ctime) = &self.ctime {
            f(&Explicit(2, ctime));
        }
        if let Some(cusec) = self.cusec {
            f(&Explicit(3, &Integer(cusec.into())));
        }
        f(&Explicit(4, &self.stime));
        f(&Explicit(5, &Integer(self.susec.into())));
        f(&Explicit(6, &Integer(self.error_code.0.into())));
        if let Some(crealm) = &self.crealm {
            f(&Explicit(7, &general_string(&crealm.0)));
        }
        if let Some(cname) = &self.cname {
            f(&Explicit(8, cname));
        }
        f(&Explicit(9, &general_string(&self.realm.0)));
        f(&Explicit(10, &self.sname));
        if let Some(etext) = &self.etext {
            f(&Explicit(11, &general_string(etext)));
        }
        if let Some(edata) = &self.edata {
            f(&Explicit(12, &OctetString::new(edata)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;
    use crate::krb5::{KerberosTime, NameType, PrincipalName};

    fn sample() -> KrbError {
        KrbError {
            pvno: 5,
            msg_type: MessageType::KRB_ERROR,
            stime: KerberosTime {
                year: 2017,
                month: 11,
                day: 9,
                hour: 8,
                minute: 30,
                second: 12,
            },
            susec: 999_999,
            error_code: ErrorCode::KDC_ERR_PREAUTH_REQUIRED,
            realm: Realm("CONTOSO.LOCAL".to_owned()),
            sname: PrincipalName {
                name_type: NameType::KRB_NT_SRV_INST,
                name_string: vec!["krbtgt".to_owned(), "CONTOSO.LOCAL".to_owned()],
            },
            edata: Some(vec![0x30, 0x00]),
            ..KrbError::default()
        }
    }

    #[test]
    fn round_trip() {
        let err = sample();
        let bytes = err.encode();
        assert_eq!(&bytes[..1], &[0x7e]);
        assert_eq!(decode::<KrbError>(&bytes), Ok(err));
    }

    #[test]
    fn msg_type_must_be_krb_error() {
        let mut err = sample();
        err.msg_type = MessageType::KRB_AP_REP;
        assert!(matches!(
            decode::<KrbError>(&err.encode()),
            Err(DecodeError::ValueOutOfRange { value: 15, min: 30, max: 30, .. })
        ));
    }

    #[test]
    fn susec_out_of_range() {
        let mut err = sample();
        err.susec = 1_000_000;
        assert!(matches!(
            decode::<KrbError>(&err.encode()),
            Err(DecodeError::ValueOutOfRange { value: 1_000_000, min: 0, max: 999_999, .. })
        ));
    }

    #[test]
    fn unknown_error_code_is_kept() {
        let mut err = sample();
        err.error_code = ErrorCode(-1765328228);
        let decoded = decode::<KrbError>(&err.encode()).unwrap();
        assert_eq!(decoded.error_code, ErrorCode(-1765328228));
        assert!(!decoded.error_code.is_known());
    }
}
