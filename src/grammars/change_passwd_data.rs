use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{general_string, Constructed, Encodable, Explicit, OctetString};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::krb5::{ChangePasswdData, Realm};
use crate::tlv::Tag;

grammar_states! {
    pub enum ChangePasswdDataState {
        Start,
        Seq,
        NewPasswdTag,
        NewPasswd,
        TargNameTag,
        TargName,
        TargRealmTag,
        TargRealm,
    }
}

// ChangePasswdData ::=  SEQUENCE {
//         newpasswd[0]   OCTET STRING,
//         targname[1]    PrincipalName OPTIONAL,
//         targrealm[2]   Realm OPTIONAL
// }
static GRAMMAR: Lazy<Grammar<ChangePasswdData>> = Lazy::new(|| {
    use ChangePasswdDataState as S;
    type F = Field<ChangePasswdData>;
    GrammarBuilder::new("ChangePasswdData")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::NewPasswdTag).then(
                    Tag::OCTET_STRING,
                    S::NewPasswd,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.newpasswd = v,
                    },
                ),
                F::optional(1, S::TargNameTag).then(
                    Tag::SEQUENCE,
                    S::TargName,
                    Action::Custom(|c, tlv| {
                        c.target_mut().targname = Some(decode_nested(tlv)?);
                        Ok(())
                    }),
                ),
                F::optional(2, S::TargRealmTag).then(
                    Tag::GENERAL_STRING,
                    S::TargRealm,
                    Action::StoreString(|t, s| t.targrealm = Some(Realm(s))),
                ),
            ],
        )
        .build()
});

impl Decodable for ChangePasswdData {
    type State = ChangePasswdDataState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for ChangePasswdData {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &OctetString::new(&self.newpasswd)));
        if let Some(targname) = &self.targname {
            f(&Explicit(1, targname));
        }
        if let Some(targrealm) = &self.targrealm {
            f(&Explicit(2, &general_string(&targrealm.0)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;
    use crate::krb5::{NameType, PrincipalName};

    #[test]
    fn password_only() {
        let bytes = [0x30, 0x0a, 0xa0, 0x08, 0x04, 0x06, 0x73, 0x65, 0x63, 0x72, 0x65, 0x74];
        let data: ChangePasswdData = decode(&bytes).unwrap();
        assert_eq!(data.newpasswd, b"secret".to_vec());
        assert_eq!(data.targname, None);
        assert_eq!(data.targrealm, None);
        assert_eq!(data.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn realm_without_name() {
        let data = ChangePasswdData {
            newpasswd: b"hunter2".to_vec(),
            targname: None,
            targrealm: Some(Realm("EXAMPLE.COM".to_owned())),
        };
        assert_eq!(decode::<ChangePasswdData>(&data.encode()), Ok(data));
    }

    #[test]
    fn set_password_for_principal() {
        let data = ChangePasswdData {
            newpasswd: b"hunter2".to_vec(),
            targname: Some(PrincipalName {
                name_type: NameType::KRB_NT_PRINCIPAL,
                name_string: vec!["carol".to_owned()],
            }),
            targrealm: Some(Realm("EXAMPLE.COM".to_owned())),
        };
        assert_eq!(decode::<ChangePasswdData>(&data.encode()), Ok(data));
    }

    #[test]
    fn realm_before_name_is_rejected() {
        let bytes = [
            0x30, 0x17, 0xa0, 0x03, 0x04, 0x01, 0x78, 0xa2, 0x03, 0x1b, 0x01, 0x52, 0xa1, 0x0b,
            0x30, 0x09, 0xa0, 0x03, 0x02, 0x01, 0x01, 0xa1, 0x02, 0x30, 0x00,
        ];
        assert!(matches!(
            decode::<ChangePasswdData>(&bytes),
            Err(DecodeError::UnexpectedTag { offset: 12, .. })
        ));
    }
}
