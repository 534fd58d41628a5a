use once_cell::sync::Lazy;

use crate::decoder::Decodable;
use crate::encoder::{general_string, Constructed, Encodable, Explicit, Integer, SequenceOf};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::int32;
use crate::krb5::{NameType, PrincipalName};
use crate::tlv::Tag;

grammar_states! {
    pub enum PrincipalNameState {
        Start,
        Seq,
        NameTypeTag,
        NameType,
        NameStringTag,
        NameStrings,
        NameString,
    }
}

// PrincipalName   ::= SEQUENCE {
//         name-type       [0] Int32,
//         name-string     [1] SEQUENCE OF KerberosString
// }
static GRAMMAR: Lazy<Grammar<PrincipalName>> = Lazy::new(|| {
    use PrincipalNameState as S;
    type F = Field<PrincipalName>;
    GrammarBuilder::new("PrincipalName")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::NameTypeTag).then(
                    Tag::INTEGER,
                    S::NameType,
                    int32(|t, v| t.name_type = NameType(v as i32)),
                ),
                F::required(1, S::NameStringTag)
                    .then(Tag::SEQUENCE, S::NameStrings, Action::Enter)
                    .repeated(
                        Tag::GENERAL_STRING,
                        S::NameString,
                        Action::StoreString(|t, s| t.name_string.push(s)),
                    ),
            ],
        )
        .build()
});

impl Decodable for PrincipalName {
    type State = PrincipalNameState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for PrincipalName {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        let names: Vec<_> = self.name_string.iter().map(|s| general_string(s)).collect();
        f(&Explicit(0, &Integer(self.name_type.0.into())));
        f(&Explicit(1, &SequenceOf(&names)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;

    #[test]
    fn empty_name_string() {
        let bytes = [0x30, 0x09, 0xa0, 0x03, 0x02, 0x01, 0x01, 0xa1, 0x02, 0x30, 0x00];
        let name: PrincipalName = decode(&bytes).unwrap();
        assert_eq!(name.name_type, NameType::KRB_NT_PRINCIPAL);
        assert!(name.name_string.is_empty());
        assert_eq!(name.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn name_type_out_of_int32_range() {
        let bytes = [
            0x30, 0x0d, 0xa0, 0x07, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0xa1, 0x02, 0x30,
            0x00,
        ];
        assert!(matches!(
            decode::<PrincipalName>(&bytes),
            Err(DecodeError::ValueOutOfRange { offset: 4, value: 0x1_0000_0000, .. })
        ));
    }

    #[test]
    fn missing_name_string() {
        let bytes = [0x30, 0x05, 0xa0, 0x03, 0x02, 0x01, 0x01];
        assert!(matches!(
            decode::<PrincipalName>(&bytes),
            Err(DecodeError::PrematureEnd { grammar: "PrincipalName", .. })
        ));
    }
}
