use once_cell::sync::Lazy;

use crate::decoder::{decode_nested, Decodable};
use crate::encoder::{general_string, Constructed, Encodable, Explicit, Integer, OctetString};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::{int32, pvno};
use crate::krb5::{Realm, Ticket, TransitedEncoding, TransitedEncodingType};
use crate::tlv::Tag;

/// `[APPLICATION 1]`, the outer tag of a Ticket
pub const TICKET_TAG: Tag = Tag::application(1);

grammar_states! {
    pub enum TicketState {
        Start,
        App,
        Seq,
        TktVnoTag,
        TktVno,
        RealmTag,
        Realm,
        SnameTag,
        Sname,
        EncPartTag,
        EncPart,
    }
}

// Ticket          ::= [APPLICATION 1] SEQUENCE {
//         tkt-vno         [0] INTEGER (5),
//         realm           [1] Realm,
//         sname           [2] PrincipalName,
//         enc-part        [3] EncryptedData -- EncTicketPart
// }
static TICKET: Lazy<Grammar<Ticket>> = Lazy::new(|| {
    use TicketState as S;
    type F = Field<Ticket>;
    GrammarBuilder::new("Ticket")
        .transition(S::Start, TICKET_TAG, S::App, Action::CheckNotNullLength)
        .transition(S::App, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::TktVnoTag).then(
                    Tag::INTEGER,
                    S::TktVno,
                    pvno(|t, v| t.tkt_vno = v as u32),
                ),
                F::required(1, S::RealmTag).then(
                    Tag::GENERAL_STRING,
                    S::Realm,
                    Action::StoreString(|t, s| t.realm = Realm(s)),
                ),
                F::required(2, S::SnameTag).then(
                    Tag::SEQUENCE,
                    S::Sname,
                    Action::Custom(|c, tlv| {
                        c.target_mut().sname = decode_nested(tlv)?;
                        Ok(())
                    }),
                ),
                F::required(3, S::EncPartTag).then(
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

impl Decodable for Ticket {
    type State = TicketState;

    fn grammar() -> &'static Grammar<Self> {
        &TICKET
    }
}

impl Constructed for Ticket {
    fn wrapper(&self) -> Option<Tag> {
        Some(TICKET_TAG)
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.tkt_vno.into())));
        f(&Explicit(1, &general_string(&self.realm.0)));
        f(&Explicit(2, &self.sname));
        f(&Explicit(3, &self.enc_part));
    }
}

grammar_states! {
    pub enum TransitedEncodingState {
        Start,
        Seq,
        TrTypeTag,
        TrType,
        ContentsTag,
        Contents,
    }
}

// TransitedEncoding       ::= SEQUENCE {
//         tr-type         [0] Int32 -- must be registered --,
//         contents        [1] OCTET STRING
// }
static TRANSITED_ENCODING: Lazy<Grammar<TransitedEncoding>> = Lazy::new(|| {
    use TransitedEncodingState as S;
    type F = Field<TransitedEncoding>;
    GrammarBuilder::new("TransitedEncoding")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::TrTypeTag).then(
                    Tag::INTEGER,
                    S::TrType,
                    int32(|t, v| t.tr_type = TransitedEncodingType(v as i32)),
                ),
                F::required(1, S::ContentsTag).then(
                    Tag::OCTET_STRING,
                    S::Contents,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.contents = v,
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for TransitedEncoding {
    type State = TransitedEncodingState;

    fn grammar() -> &'static Grammar<Self> {
        &TRANSITED_ENCODING
    }
}

impl Constructed for TransitedEncoding {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.tr_type.0.into())));
        f(&Explicit(1, &OctetString::new(&self.contents)));
    }
}
