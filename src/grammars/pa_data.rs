use once_cell::sync::Lazy;

use crate::decoder::Decodable;
use crate::encoder::{Constructed, Encodable, Explicit, Integer, OctetString};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::int32;
use crate::krb5::{PAType, PaData};
use crate::tlv::Tag;

grammar_states! {
    pub enum PaDataState {
        Start,
        Seq,
        TypeTag,
        Type,
        ValueTag,
        Value,
    }
}

// PA-DATA         ::= SEQUENCE {
//         -- NOTE: first tag is [1], not [0]
//         padata-type     [1] Int32,
//         padata-value    [2] OCTET STRING -- might be encoded AP-REQ
// }
static GRAMMAR: Lazy<Grammar<PaData>> = Lazy::new(|| {
    use PaDataState as S;
    type F = Field<PaData>;
    GrammarBuilder::new("PA-DATA")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(1, S::TypeTag).then(
                    Tag::INTEGER,
                    S::Type,
                    int32(|t, v| t.padata_type = PAType(v as i32)),
                ),
                F::required(2, S::ValueTag).then(
                    Tag::OCTET_STRING,
                    S::Value,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.padata_value = v,
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for PaData {
    type State = PaDataState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for PaData {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(1, &Integer(self.padata_type.0.into())));
        f(&Explicit(2, &OctetString::new(&self.padata_value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    #[test]
    fn pac_request() {
        // PA-PAC-REQUEST { include-pac TRUE }
        let bytes = [
            0x30, 0x11, 0xa1, 0x04, 0x02, 0x02, 0x00, 0x80, 0xa2, 0x09, 0x04, 0x07, 0x30, 0x05,
            0xa0, 0x03, 0x01, 0x01, 0xff,
        ];
        let pa: PaData = decode(&bytes).unwrap();
        assert_eq!(pa.padata_type, PAType::PA_PAC_REQUEST);
        assert_eq!(pa.padata_value, bytes[12..].to_vec());
        assert_eq!(pa.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn type_tag_starts_at_one() {
        let bytes = [0x30, 0x09, 0xa0, 0x03, 0x02, 0x01, 0x02, 0xa2, 0x02, 0x04, 0x00];
        assert!(decode::<PaData>(&bytes).is_err());
    }
}
