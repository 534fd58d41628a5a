use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{Constructed, Encodable, Explicit, Integer};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::{exactly, pvno};
use crate::krb5::{ApRep, MessageType};
use crate::tlv::Tag;

/// `[APPLICATION 15]`, the outer tag of an AP-REP
pub const AP_REP_TAG: Tag = Tag::application(15);

grammar_states! {
    pub enum ApRepState {
        Start,
        App,
        Seq,
        PvnoTag,
        Pvno,
        MsgTypeTag,
        MsgType,
        EncPartTag,
        EncPart,
    }
}

// AP-REP          ::= [APPLICATION 15] SEQUENCE {
//         pvno            [0] INTEGER (5),
//         msg-type        [1] INTEGER (15),
//         enc-part        [2] EncryptedData -- EncAPRepPart
// }
static GRAMMAR: Lazy<Grammar<ApRep>> = Lazy::new(|| {
    use ApRepState as S;
    type F = Field<ApRep>;
    GrammarBuilder::new("AP-REP")
        .transition(S::Start, AP_REP_TAG, S::App, Action::CheckNotNullLength)
        .transition(S::App, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::PvnoTag).then(Tag::INTEGER, S::Pvno, pvno(|t, v| t.pvno = v as u32)),
                F::required(1, S::MsgTypeTag).then(
                    Tag::INTEGER,
                    S::MsgType,
                    exactly(MessageType::KRB_AP_REP.0.into(), |t, v| t.msg_type = MessageType(v as u32)),
                ),
                F::required(2, S::EncPartTag).then(
                    Tag::SEQUENCE,
                    S::EncPart,
                    Action::Custom(|c, tlv| {
                        c.target_mut().enc_part = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
            ],
        )
        .build()
});

impl Decodable for ApRep {
    type State = ApRepState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for ApRep {
    fn wrapper(&self) -> Option<Tag> {
        Some(AP_REP_TAG)
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.pvno.into())));
        f(&Explicit(1, &Integer(self.msg_type.0.into())));
        f(&Explicit(2, &self.enc_part));
    }
}
