use once_cell::sync::Lazy;

use crate::container::Container;
use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{Constructed, Encodable, Explicit, Integer, SequenceOf};
use crate::error::DecodeError;
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::pvno;
use crate::krb5::{KdcReq, MessageType};
use crate::tlv::{Tag, Tlv};
use crate::value;

/// `[APPLICATION 10]`, the outer tag of an AS-REQ
pub const AS_REQ_TAG: Tag = Tag::application(10);
/// `[APPLICATION 12]`, the outer tag of a TGS-REQ
pub const TGS_REQ_TAG: Tag = Tag::application(12);

grammar_states! {
    pub enum KdcReqState {
        Start,
        App,
        Seq,
        PvnoTag,
        Pvno,
        MsgTypeTag,
        MsgType,
        PadataTag,
        PadataSeq,
        Padata,
        ReqBodyTag,
        ReqBody,
    }
}

fn enter_message(c: &mut Container<KdcReq>, tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    if tlv.length() == 0 {
        return Err(DecodeError::ZeroLengthViolation {
            offset: tlv.offset(),
        });
    }
    c.target_mut().msg_type = MessageType(tlv.tag().number());
    Ok(())
}

/// msg-type must repeat the message type given by the application tag
fn check_msg_type(c: &mut Container<KdcReq>, tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    let v = value::parse_integer(tlv.value()).map_err(|source| DecodeError::InvalidValue {
        offset: tlv.offset(),
        source,
    })?;
    let expected = i64::from(c.target().msg_type.0);
    if v != expected {
        return Err(DecodeError::ValueOutOfRange {
            offset: tlv.offset(),
            value: v,
            min: expected,
            max: expected,
        });
    }
    Ok(())
}

// AS-REQ          ::= [APPLICATION 10] KDC-REQ
//
// TGS-REQ         ::= [APPLICATION 12] KDC-REQ
//
// KDC-REQ         ::= SEQUENCE {
//         -- NOTE: first tag is [1], not [0]
//         pvno            [1] INTEGER (5) ,
//         msg-type        [2] INTEGER (10 -- AS -- | 12 -- TGS --),
//         padata          [3] SEQUENCE OF PA-DATA OPTIONAL
//                             -- NOTE: not empty --,
//         req-body        [4] KDC-REQ-BODY
// }
static GRAMMAR: Lazy<Grammar<KdcReq>> = Lazy::new(|| {
    use KdcReqState as S;
    type F = Field<KdcReq>;
    GrammarBuilder::new("KDC-REQ")
        .transition(S::Start, AS_REQ_TAG, S::App, Action::EnterWith(enter_message))
        .transition(S::Start, TGS_REQ_TAG, S::App, Action::EnterWith(enter_message))
        .transition(S::App, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(1, S::PvnoTag).then(Tag::INTEGER, S::Pvno, pvno(|t, v| t.pvno = v as u32)),
                F::required(2, S::MsgTypeTag).then(
                    Tag::INTEGER,
                    S::MsgType,
                    Action::Custom(check_msg_type),
                ),
                F::optional(3, S::PadataTag)
                    .then(Tag::SEQUENCE, S::PadataSeq, Action::Enter)
                    .repeated(
                        Tag::SEQUENCE,
                        S::Padata,
                        Action::Custom(|c, tlv| {
                            let padata = decode_nested(tlv)?;
                            c.target_mut().padata.push(padata);
                            Ok(())
                        }),
                    ),
                F::required(4, S::ReqBodyTag).then(
                    Tag::SEQUENCE,
                    S::ReqBody,
                    Action::Custom(|c, tlv| {
                        c.target_mut().req_body = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
            ],
        )
        .build()
});

impl Decodable for KdcReq {
    type State = KdcReqState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for KdcReq {
    fn wrapper(&self) -> Option<Tag> {
        Some(Tag::application(self.msg_type.0))
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(1, &Integer(self.pvno.into())));
        f(&Explicit(2, &Integer(self.msg_type.0.into())));
        if !self.padata.is_empty() {
            f(&Explicit(3, &SequenceOf(&self.padata)));
        }
        f(&Explicit(4, &self.req_body));
    }
}
