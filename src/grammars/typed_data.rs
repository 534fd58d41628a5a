use once_cell::sync::Lazy;

use crate::container::Container;
use crate::decoder::Decodable;
use crate::encoder::{Constructed, Encodable, Explicit, Integer, OctetString};
use crate::error::DecodeError;
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::int32;
use crate::krb5::{TypedData, TypedDataEntry};
use crate::tlv::{Tag, Tlv};

grammar_states! {
    pub enum TypedDataState {
        Start,
        Seq,
        Entry,
        DataTypeTag,
        DataType,
        DataValueTag,
        DataValue,
    }
}

fn start_entry(c: &mut Container<TypedData>, _tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    c.target_mut().0.push(TypedDataEntry::default());
    Ok(())
}

fn current(t: &mut TypedData) -> &mut TypedDataEntry {
    let last = t.0.len() - 1;
    &mut t.0[last]
}

// TYPED-DATA      ::= SEQUENCE SIZE (1..MAX) OF SEQUENCE {
//         data-type       [0] Int32,
//         data-value      [1] OCTET STRING OPTIONAL
// }
static GRAMMAR: Lazy<Grammar<TypedData>> = Lazy::new(|| {
    use TypedDataState as S;
    type F = Field<TypedData>;
    GrammarBuilder::new("TypedData")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::CheckNotNullLength)
        .transition(S::Seq, Tag::SEQUENCE, S::Entry, Action::EnterWith(start_entry))
        .sequence(
            S::Entry,
            vec![
                F::required(0, S::DataTypeTag).then(
                    Tag::INTEGER,
                    S::DataType,
                    int32(|t, v| current(t).data_type = v as i32),
                ),
                F::optional(1, S::DataValueTag).then(
                    Tag::OCTET_STRING,
                    S::DataValue,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| current(t).data_value = Some(v),
                    },
                ),
            ],
        )
        // next entry, once the current one is closed
        .transition(S::DataType, Tag::SEQUENCE, S::Entry, Action::EnterWith(start_entry))
        .transition(S::DataValue, Tag::SEQUENCE, S::Entry, Action::EnterWith(start_entry))
        .build()
});

impl Decodable for TypedData {
    type State = TypedDataState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for TypedDataEntry {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.data_type.into())));
        if let Some(value) = &self.data_value {
            f(&Explicit(1, &OctetString::new(value)));
        }
    }
}

impl Constructed for TypedData {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        for entry in &self.0 {
            f(entry);
        }
    }
}
