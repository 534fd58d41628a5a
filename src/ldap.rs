//! LDAP BindRequest ([RFC4511](https://tools.ietf.org/html/rfc4511) section 4.2)
//!
//! Directory services use the bind operation to carry SASL/GSSAPI
//! exchanges, whose tokens wrap Kerberos AP-REQ and AP-REP messages. Only
//! the BindRequest itself is decoded here, not the LDAPMessage envelope.

use once_cell::sync::Lazy;

use crate::decoder::{decode, Decodable};
use crate::encoder::{Constructed, Encodable, Integer, OctetString};
use crate::error::DecodeError;
use crate::grammar::{grammar_states, Action, Grammar, GrammarBuilder};
use crate::tlv::Tag;

/// `[APPLICATION 0]`, the implicit tag of a BindRequest
pub const BIND_REQUEST_TAG: Tag = Tag::application(0);
/// `[0]`, simple authentication
pub const SIMPLE_TAG: Tag = Tag::context_primitive(0);
/// `[3]`, SASL authentication
pub const SASL_TAG: Tag = Tag::context(3);

/// LDAP BindRequest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindRequest {
    /// Protocol version, 1 to 127 (3 in practice)
    pub version: u8,
    /// LDAPDN of the bind identity; empty for anonymous and most SASL binds
    pub name: String,
    pub authentication: Authentication,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Password; empty for an anonymous bind
    Simple(Vec<u8>),
    Sasl(SaslCredentials),
}

impl Default for Authentication {
    fn default() -> Self {
        Authentication::Simple(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaslCredentials {
    pub mechanism: String,
    /// Absent and empty credentials are distinct
    pub credentials: Option<Vec<u8>>,
}

grammar_states! {
    pub enum BindRequestState {
        Start,
        Bind,
        Version,
        Name,
        Simple,
        Sasl,
        Mechanism,
        Credentials,
    }
}

fn sasl(t: &mut BindRequest, f: impl FnOnce(&mut SaslCredentials)) {
    // [3] has been opened, which selected the SASL alternative
    if let Authentication::Sasl(creds) = &mut t.authentication {
        f(creds);
    }
}

// BindRequest ::= [APPLICATION 0] SEQUENCE {
//      version                 INTEGER (1 ..  127),
//      name                    LDAPDN,
//      authentication          AuthenticationChoice }
//
// AuthenticationChoice ::= CHOICE {
//      simple                  [0] OCTET STRING,
//      sasl                    [3] SaslCredentials,
//      ...  }
//
// SaslCredentials ::= SEQUENCE {
//      mechanism               LDAPString,
//      credentials             OCTET STRING OPTIONAL }
static GRAMMAR: Lazy<Grammar<BindRequest>> = Lazy::new(|| {
    use BindRequestState as S;
    GrammarBuilder::<BindRequest>::new("BindRequest")
        .transition(S::Start, BIND_REQUEST_TAG, S::Bind, Action::CheckNotNullLength)
        .transition(
            S::Bind,
            Tag::INTEGER,
            S::Version,
            Action::StoreInteger {
                min: 1,
                max: 127,
                store: |t: &mut BindRequest, v: i64| t.version = v as u8,
            },
        )
        .transition(S::Version, Tag::OCTET_STRING, S::Name, Action::StoreString(|t, s| t.name = s))
        .transition(
            S::Name,
            SIMPLE_TAG,
            S::Simple,
            Action::StoreOctetString {
                allow_empty: true,
                store: |t, v| t.authentication = Authentication::Simple(v),
            },
        )
        .transition(
            S::Name,
            SASL_TAG,
            S::Sasl,
            Action::EnterWith(|c, _| {
                c.target_mut().authentication = Authentication::Sasl(SaslCredentials::default());
                Ok(())
            }),
        )
        .transition(
            S::Sasl,
            Tag::OCTET_STRING,
            S::Mechanism,
            Action::StoreString(|t, s| sasl(t, |creds| creds.mechanism = s)),
        )
        .transition(
            S::Mechanism,
            Tag::OCTET_STRING,
            S::Credentials,
            Action::StoreOctetString {
                allow_empty: true,
                store: |t, v| sasl(t, |creds| creds.credentials = Some(v)),
            },
        )
        .end_state(S::Simple)
        .end_state(S::Mechanism)
        .end_state(S::Credentials)
        .build()
});

impl Decodable for BindRequest {
    type State = BindRequestState;

    fn grammar() -> &'static Grammar<Self> {
        &GRAMMAR
    }
}

impl Constructed for SaslCredentials {
    fn tag(&self) -> Tag {
        SASL_TAG
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&OctetString::new(self.mechanism.as_bytes()));
        if let Some(credentials) = &self.credentials {
            f(&OctetString::new(credentials));
        }
    }
}

impl Constructed for BindRequest {
    fn tag(&self) -> Tag {
        BIND_REQUEST_TAG
    }

    fn components(&self, f: &mut dyn FnMut(&dyn Encodable)) {
        f(&Integer(self.version.into()));
        f(&OctetString::new(self.name.as_bytes()));
        match &self.authentication {
            Authentication::Simple(password) => f(&OctetString::with_tag(SIMPLE_TAG, password)),
            Authentication::Sasl(creds) => f(creds),
        }
    }
}

/// Parse an LDAP BindRequest
pub fn parse_bind_request(i: &[u8]) -> Result<BindRequest, DecodeError> {
    decode(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bind() {
        // version 3, cn=admin, password "pw"
        let bytes = [
            0x60, 0x11, 0x02, 0x01, 0x03, 0x04, 0x08, 0x63, 0x6e, 0x3d, 0x61, 0x64, 0x6d, 0x69,
            0x6e, 0x80, 0x02, 0x70, 0x77,
        ];
        let req = parse_bind_request(&bytes).unwrap();
        assert_eq!(req.version, 3);
        assert_eq!(req.name, "cn=admin");
        assert_eq!(req.authentication, Authentication::Simple(b"pw".to_vec()));
        assert_eq!(req.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn anonymous_bind() {
        let bytes = [0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00];
        let req = parse_bind_request(&bytes).unwrap();
        assert_eq!(req.name, "");
        assert_eq!(req.authentication, Authentication::Simple(Vec::new()));
    }

    #[test]
    fn sasl_without_credentials() {
        let bytes = [
            0x60, 0x0e, 0x02, 0x01, 0x03, 0x04, 0x00, 0xa3, 0x07, 0x04, 0x05, 0x4e, 0x54, 0x4c,
            0x4d, 0x31,
        ];
        let req = parse_bind_request(&bytes).unwrap();
        assert_eq!(
            req.authentication,
            Authentication::Sasl(SaslCredentials {
                mechanism: "NTLM1".to_owned(),
                credentials: None,
            })
        );
        assert_eq!(req.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn sasl_with_empty_credentials() {
        let bytes = [
            0x60, 0x11, 0x02, 0x01, 0x03, 0x04, 0x00, 0xa3, 0x0a, 0x04, 0x06, 0x47, 0x53, 0x53,
            0x41, 0x50, 0x49, 0x04, 0x00,
        ];
        let req = parse_bind_request(&bytes).unwrap();
        assert_eq!(
            req.authentication,
            Authentication::Sasl(SaslCredentials {
                mechanism: "GSSAPI".to_owned(),
                credentials: Some(Vec::new()),
            })
        );
        assert_eq!(req.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn credentials_outside_sasl_wrapper() {
        // [3] holds only the mechanism, the credentials follow it
        let bytes = [
            0x60, 0x10, 0x02, 0x01, 0x03, 0x04, 0x00, 0xa3, 0x07, 0x04, 0x05, 0x4e, 0x54, 0x4c,
            0x4d, 0x31, 0x04, 0x00,
        ];
        assert_eq!(
            parse_bind_request(&bytes),
            Err(DecodeError::UnexpectedTag {
                grammar: "BindRequest",
                state: "Mechanism".to_owned(),
                tag: Tag::OCTET_STRING,
                offset: 16,
            })
        );
    }

    #[test]
    fn version_out_of_range() {
        let bytes = [0x60, 0x07, 0x02, 0x01, 0x00, 0x04, 0x00, 0x80, 0x00];
        assert_eq!(
            parse_bind_request(&bytes),
            Err(DecodeError::ValueOutOfRange {
                offset: 2,
                value: 0,
                min: 1,
                max: 127
            })
        );
    }

    #[test]
    fn missing_authentication() {
        let bytes = [0x60, 0x05, 0x02, 0x01, 0x03, 0x04, 0x00];
        assert!(matches!(
            parse_bind_request(&bytes),
            Err(DecodeError::PrematureEnd { grammar: "BindRequest", .. })
        ));
    }
}
