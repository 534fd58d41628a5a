use once_cell::sync::Lazy;

use crate::decoder::Decodable;
use crate::encoder::{Constructed, Encodable, Explicit, Integer, OctetString};
use crate::grammar::{grammar_states, Action, Field, Grammar, GrammarBuilder};
use crate::grammars::{int32, uint32};
use crate::krb5::{EncryptedData, EncryptionKey, EncryptionType};
use crate::tlv::Tag;

grammar_states! {
    pub enum EncryptedDataState {
        Start,
        Seq,
        EtypeTag,
        Etype,
        KvnoTag,
        Kvno,
        CipherTag,
        Cipher,
    }
}

// EncryptedData   ::= SEQUENCE {
//         etype   [0] Int32 -- EncryptionType --,
//         kvno    [1] UInt32 OPTIONAL,
//         cipher  [2] OCTET STRING -- ciphertext
// }
static ENCRYPTED_DATA: Lazy<Grammar<EncryptedData>> = Lazy::new(|| {
    use EncryptedDataState as S;
    type F = Field<EncryptedData>;
    GrammarBuilder::new("EncryptedData")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::EtypeTag).then(
                    Tag::INTEGER,
                    S::Etype,
                    int32(|t, v| t.etype = EncryptionType(v as i32)),
                ),
                F::optional(1, S::KvnoTag).then(
                    Tag::INTEGER,
                    S::Kvno,
                    uint32(|t, v| t.kvno = Some(v as u32)),
                ),
                F::required(2, S::CipherTag).then(
                    Tag::OCTET_STRING,
                    S::Cipher,
                    Action::StoreOctetString {
                        allow_empty: true,
                        store: |t, v| t.cipher = v,
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for EncryptedData {
    type State = EncryptedDataState;

    fn grammar() -> &'static Grammar<Self> {
        &ENCRYPTED_DATA
    }
}

impl Constructed for EncryptedData {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.etype.0.into())));
        if let Some(kvno) = self.kvno {
            f(&Explicit(1, &Integer(kvno.into())));
        }
        f(&Explicit(2, &OctetString::new(&self.cipher)));
    }
}

grammar_states! {
    pub enum EncryptionKeyState {
        Start,
        Seq,
        KeytypeTag,
        Keytype,
        KeyvalueTag,
        Keyvalue,
    }
}

// EncryptionKey   ::= SEQUENCE {
//         keytype         [0] Int32 -- actually encryption type --,
//         keyvalue        [1] OCTET STRING
// }
static ENCRYPTION_KEY: Lazy<Grammar<EncryptionKey>> = Lazy::new(|| {
    use EncryptionKeyState as S;
    type F = Field<EncryptionKey>;
    GrammarBuilder::new("EncryptionKey")
        .transition(S::Start, Tag::SEQUENCE, S::Seq, Action::Enter)
        .sequence(
            S::Seq,
            vec![
                F::required(0, S::KeytypeTag).then(
                    Tag::INTEGER,
                    S::Keytype,
                    int32(|t, v| t.keytype = EncryptionType(v as i32)),
                ),
                F::required(1, S::KeyvalueTag).then(
                    Tag::OCTET_STRING,
                    S::Keyvalue,
                    Action::StoreOctetString {
                        allow_empty: false,
                        store: |t, v| t.keyvalue = v,
                    },
                ),
            ],
        )
        .build()
});

impl Decodable for EncryptionKey {
    type State = EncryptionKeyState;

    fn grammar() -> &'static Grammar<Self> {
        &ENCRYPTION_KEY
    }
}

impl Constructed for EncryptionKey {
    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Explicit(0, &Integer(self.keytype.0.into())));
        f(&Explicit(1, &OctetString::new(&self.keyvalue)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::DecodeError;

    #[test]
    fn encrypted_data_with_and_without_kvno() {
        let with = [
            0x30, 0x10, 0xa0, 0x03, 0x02, 0x01, 0x12, 0xa1, 0x03, 0x02, 0x01, 0x02, 0xa2, 0x04,
            0x04, 0x02, 0xde, 0xad,
        ];
        let ed: EncryptedData = decode(&with).unwrap();
        assert_eq!(ed.etype, EncryptionType::AES256_CTS_HMAC_SHA1_96);
        assert_eq!(ed.kvno, Some(2));
        assert_eq!(ed.cipher, vec![0xde, 0xad]);
        assert_eq!(ed.encode().as_ref(), &with[..]);

        let without = [
            0x30, 0x0b, 0xa0, 0x03, 0x02, 0x01, 0x17, 0xa2, 0x04, 0x04, 0x02, 0xde, 0xad,
        ];
        let ed: EncryptedData = decode(&without).unwrap();
        assert_eq!(ed.etype, EncryptionType::RC4_HMAC);
        assert_eq!(ed.kvno, None);
        assert_eq!(ed.encode().as_ref(), &without[..]);
    }

    #[test]
    fn negative_kvno_is_rejected() {
        let bytes = [
            0x30, 0x0e, 0xa0, 0x03, 0x02, 0x01, 0x12, 0xa1, 0x03, 0x02, 0x01, 0xff, 0xa2, 0x02,
            0x04, 0x00,
        ];
        assert_eq!(
            decode::<EncryptedData>(&bytes),
            Err(DecodeError::ValueOutOfRange {
                offset: 9,
                value: -1,
                min: 0,
                max: 4_294_967_295,
            })
        );
    }

    #[test]
    fn empty_key_value_is_rejected() {
        let bytes = [0x30, 0x09, 0xa0, 0x03, 0x02, 0x01, 0x11, 0xa1, 0x02, 0x04, 0x00];
        assert_eq!(
            decode::<EncryptionKey>(&bytes),
            Err(DecodeError::ZeroLengthViolation { offset: 9 })
        );
    }
}
