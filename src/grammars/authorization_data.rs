use once_cell::sync::Lazy;

use crate::container::Container;
use crate::decoder::Decodable;
use crate::encoder::{Constructed, Encodable, Explicit, Integer, OctetString};
use crate::error::DecodeError;
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::int32;
use crate::krb5::{AuthorizationData, AuthorizationDataEntry, AuthorizationDataType};
use crate::tlv::{Tag, Tlv};

grammar_states! {
    pub enum AuthorizationDataState {
        Start,
        Seq,
        Entry,
        AdTypeTag,
        AdType,
        AdDataTag,
        AdData,
    }
}

fn start_entry(c: &mut Container<AuthorizationData>, _tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    c.target_mut().0.push(AuthorizationDataEntry::default());
    Ok(())
}

fn current(t: &mut AuthorizationData) -> &mut AuthorizationDataEntry {
    // an entry is pushed whenever its SEQUENCE is opened
    let last = t.0.len() - 1;
    &mut t.0[last]
}

// AuthorizationData       ::= SEQUENCE OF SEQUENCE {
//         ad-type         [0] Int32,
//         ad-data         [1] OCTET STRING
// }
static GRAMMAR: Lazy<Grammar<AuthorizationData>> = Lazy::new(|| {
    use AuthorizationDataState as S;
    type F = Field<AuthorizationData>;
    GrammarBuilder::new("AuthorizationData")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .end_state(S::Seq)
        .transition(S::Seq, Tag::SEQUENCE, S::Entry, Action::EnterWith(start_entry))
        .sequence(
            S::Entry,
            vec![
                F::required(0, S::AdTypeTag).then(
                    Tag::INTEGER,
                    S::AdType,
                    int32(|t, v| current(t).ad_type = AuthorizationDataType(v as i32)),
                ),
                F::required(1, S::AdDataTag).then(
                    Tag::OCTET_STRING,
                    S::AdData,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| current(t).ad_data = v,
                    },
                ),
            ],
        )
        .transition(S::AdData, Tag::SEQUENCE, S::Entry, Action::EnterWith(start_entry))
        .build()
});

impl Decodable for AuthorizationData {
    type State = AuthorizationDataState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for AuthorizationDataEntry {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.ad_type.0.into())));
        f(&Explicit(1, &OctetString::new(&self.ad_data)));
    }
}

impl Constructed for AuthorizationData {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        for entry in &self.0 {
            f(entry);
        }
    }
}
