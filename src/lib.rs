//! # Kerberos Codec
//!
//! A grammar-driven BER/DER codec for Kerberos v5 ([RFC4120]) messages, plus
//! the LDAP BindRequest that carries SASL/GSSAPI exchanges.
//!
//! Every structure has a grammar: a transition table from `(state, tag)` to
//! `(next state, action)`. The [`Asn1Decoder`] reads one TLV at a time, looks
//! up the transition and runs its action against a [`Container`], which owns
//! the object being built. Because the engine only ever holds one TLV
//! header, decoding can stop on a partial buffer and resume later.
//!
//! Specific parsing functions are provided for Kerberos message types. For ex. to parse a
//! KRB_AS_REQ message, use [`parse_as_req`](krb5_parser/fn.parse_as_req.html).
//!
//! # Examples
//!
//! Parsing a PrincipalName:
//!
//! ```rust
//! use kerberos_codec::krb5::NameType;
//! use kerberos_codec::krb5_parser::parse_krb5_principalname;
//!
//! let bytes = [
//!     0x30, 0x11, 0xa0, 0x03, 0x02, 0x01, 0x01, 0xa1, 0x0a, 0x30, 0x08, 0x1b, 0x06, 0x61,
//!     0x64, 0x6d, 0x69, 0x6e, 0x73,
//! ];
//! let name = parse_krb5_principalname(&bytes).expect("valid PrincipalName");
//! assert_eq!(name.name_type, NameType::KRB_NT_PRINCIPAL);
//! assert_eq!(name.name_string, vec!["admins".to_string()]);
//! ```
//!
//! Feeding a message as it arrives:
//!
//! ```rust
//! use kerberos_codec::krb5::HostAddress;
//! use kerberos_codec::{Asn1Decoder, Container};
//!
//! let bytes = [
//!     0x30, 0x0d, 0xa0, 0x03, 0x02, 0x01, 0x02, 0xa1, 0x06, 0x04, 0x04, 0xc0, 0xa8, 0x01, 0x01,
//! ];
//! let decoder = Asn1Decoder::new();
//! let mut container = Container::<HostAddress>::new();
//! let err = decoder.decode(&bytes[..8], &mut container).unwrap_err();
//! assert!(err.is_truncated());
//! assert_eq!(decoder.decode(&bytes, &mut container), Ok(bytes.len()));
//! assert_eq!(container.finish().unwrap().address, vec![192, 168, 1, 1]);
//! ```
//!
//! [RFC4120]: https://tools.ietf.org/html/rfc4120

#![deny(/*missing_docs,*/unsafe_code,
        unstable_features,
        unused_import_braces, unused_qualifications)]

#[macro_use]
extern crate rusticata_macros;

pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod grammar;
pub mod tlv;
pub mod value;

#[macro_use]
mod krb5_constants;
mod krb5_errors;

pub mod grammars;
pub mod krb5;
pub mod krb5_parser;
pub mod ldap;

pub use container::Container;
pub use decoder::{decode, decode_nested, Asn1Decoder, Decodable, DEFAULT_MAX_PDU_SIZE};
pub use encoder::{Constructed, Encodable};
pub use error::{DecodeError, ValueError};
pub use krb5_errors::*;
