//! Kerberos 5 parsing functions
//!
//! Each function decodes a buffer holding exactly one message; trailing
//! bytes are an error. To decode a message as it arrives, use an
//! [`Asn1Decoder`](crate::Asn1Decoder) with a [`Container`](crate::Container).

use crate::decoder::decode;
use crate::error::DecodeError;
use crate::krb5::*;
use crate::tlv::{self, Tag};
use crate::value;

/// Parse a Kerberos string object
///
/// <pre>
/// KerberosString  ::= GeneralString (IA5String)
/// </pre>
pub fn parse_kerberos_string(i: &[u8]) -> Result<String, DecodeError> {
    let header = tlv::read_header(i, 0)?;
    if header.tag() != Tag::GENERAL_STRING {
        return Err(DecodeError::UnexpectedTag {
            grammar: "KerberosString",
            state: "Start".to_owned(),
            tag: header.tag(),
            offset: 0,
        });
    }
    let total = header.total_len();
    if i.len() < total {
        return Err(DecodeError::TruncatedInput {
            offset: 0,
            needed: total - i.len(),
        });
    }
    if i.len() > total {
        return Err(DecodeError::LengthMismatch {
            offset: total,
            declared: total,
            available: i.len(),
        });
    }
    value::parse_utf8_string(&i[header.header_len()..])
        .map_err(|source| DecodeError::InvalidValue { offset: 0, source })
}

/// Parse of a Kerberos Realm
///
/// <pre>
/// Realm           ::= KerberosString
/// </pre>
pub fn parse_krb5_realm(i: &[u8]) -> Result<Realm, DecodeError> {
    parse_kerberos_string(i).map(Realm)
}

/// Parse Kerberos PrincipalName
///
/// <pre>
/// PrincipalName   ::= SEQUENCE {
///         name-type       [0] Int32,
///         name-string     [1] SEQUENCE OF KerberosString
/// }
/// </pre>
pub fn parse_krb5_principalname(i: &[u8]) -> Result<PrincipalName, DecodeError> {
    decode(i)
}

/// Parse Kerberos HostAddress
///
/// <pre>
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
/// </pre>
pub fn parse_krb5_hostaddress(i: &[u8]) -> Result<HostAddress, DecodeError> {
    decode(i)
}

/// Parse Kerberos HostAddresses
///
/// <pre>
/// -- NOTE: HostAddresses is always used as an OPTIONAL field and
/// -- should not be empty.
/// HostAddresses   -- NOTE: subtly different from rfc1510,
///                 -- but has a value mapping and encodes the same
///         ::= SEQUENCE OF HostAddress
/// </pre>
pub fn parse_krb5_hostaddresses(i: &[u8]) -> Result<Vec<HostAddress>, DecodeError> {
    decode::<HostAddresses>(i).map(|addresses| addresses.0)
}

/// Parse Kerberos Ticket
///
/// <pre>
/// Ticket          ::= [APPLICATION 1] SEQUENCE {
///         tkt-vno         [0] INTEGER (5),
///         realm           [1] Realm,
///         sname           [2] PrincipalName,
///         enc-part        [3] EncryptedData -- EncTicketPart
/// }
/// </pre>
pub fn parse_krb5_ticket(i: &[u8]) -> Result<Ticket, DecodeError> {
    decode(i)
}

/// Parse Kerberos EncryptedData
///
/// <pre>
/// EncryptedData   ::= SEQUENCE {
///         etype   [0] Int32 -- EncryptionType --,
///         kvno    [1] UInt32 OPTIONAL,
///         cipher  [2] OCTET STRING -- ciphertext
/// }
/// </pre>
pub fn parse_encrypted(i: &[u8]) -> Result<EncryptedData, DecodeError> {
    decode(i)
}

/// Parse Kerberos EncryptionKey
///
/// <pre>
/// EncryptionKey   ::= SEQUENCE {
///         keytype         [0] Int32 -- actually encryption type --,
///         keyvalue        [1] OCTET STRING
/// }
/// </pre>
pub fn parse_krb5_encryption_key(i: &[u8]) -> Result<EncryptionKey, DecodeError> {
    decode(i)
}

/// Parse Kerberos AuthorizationData
///
/// <pre>
/// AuthorizationData       ::= SEQUENCE OF SEQUENCE {
///         ad-type         [0] Int32,
///         ad-data         [1] OCTET STRING
/// }
/// </pre>
pub fn parse_krb5_authorization_data(i: &[u8]) -> Result<AuthorizationData, DecodeError> {
    decode(i)
}

/// Parse Kerberos TypedData, usually found in the e-data of a KRB-ERROR
///
/// <pre>
/// TYPED-DATA      ::= SEQUENCE SIZE (1..MAX) OF SEQUENCE {
///         data-type       [0] Int32,
///         data-value      [1] OCTET STRING OPTIONAL
/// }
/// </pre>
pub fn parse_krb5_typed_data(i: &[u8]) -> Result<TypedData, DecodeError> {
    decode(i)
}

/// Parse Kerberos PA-Data
///
/// <pre>
/// PA-DATA         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         padata-type     [1] Int32,
///         padata-value    [2] OCTET STRING -- might be encoded AP-REQ
/// }
/// </pre>
pub fn parse_krb5_padata(i: &[u8]) -> Result<PaData, DecodeError> {
    decode(i)
}

/// Parse a Kerberos KDC Request
///
/// <pre>
/// KDC-REQ         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         pvno            [1] INTEGER (5) ,
///         msg-type        [2] INTEGER (10 -- AS -- | 12 -- TGS --),
///         padata          [3] SEQUENCE OF PA-DATA OPTIONAL
///                             -- NOTE: not empty --,
///         req-body        [4] KDC-REQ-BODY
/// }
/// </pre>
///
/// Accepts both AS-REQ and TGS-REQ; `msg_type` tells them apart.
pub fn parse_kdc_req(i: &[u8]) -> Result<KdcReq, DecodeError> {
    decode(i)
}

/// Parse the body of a Kerberos KDC Request
///
/// <pre>
/// KDC-REQ-BODY    ::= SEQUENCE {
///         kdc-options             [0] KDCOptions,
///         cname                   [1] PrincipalName OPTIONAL
///                                     -- Used only in AS-REQ --,
///         realm                   [2] Realm
///                                     -- Server's realm
///                                     -- Also client's in AS-REQ --,
///         sname                   [3] PrincipalName OPTIONAL,
///         from                    [4] KerberosTime OPTIONAL,
///         till                    [5] KerberosTime,
///         rtime                   [6] KerberosTime OPTIONAL,
///         nonce                   [7] UInt32,
///         etype                   [8] SEQUENCE OF Int32 -- EncryptionType
///                                     -- in preference order --,
///         addresses               [9] HostAddresses OPTIONAL,
///         enc-authorization-data  [10] EncryptedData OPTIONAL
///                                     -- AuthorizationData --,
///         additional-tickets      [11] SEQUENCE OF Ticket OPTIONAL
///                                        -- NOTE: not empty
/// }
/// </pre>
pub fn parse_kdc_req_body(i: &[u8]) -> Result<KdcReqBody, DecodeError> {
    decode(i)
}

fn parse_kdc_req_of_type(i: &[u8], expected: MessageType) -> Result<KdcReq, DecodeError> {
    let req = parse_kdc_req(i)?;
    if req.msg_type != expected {
        return Err(DecodeError::UnexpectedTag {
            grammar: "KDC-REQ",
            state: "Start".to_owned(),
            tag: Tag::application(req.msg_type.0),
            offset: 0,
        });
    }
    Ok(req)
}

/// Parse a Kerberos AS Request
///
/// <pre>
/// AS-REQ          ::= [APPLICATION 10] KDC-REQ
/// </pre>
pub fn parse_as_req(i: &[u8]) -> Result<KdcReq, DecodeError> {
    parse_kdc_req_of_type(i, MessageType::KRB_AS_REQ)
}

/// Parse a Kerberos TGS Request
///
/// <pre>
/// TGS-REQ          ::= [APPLICATION 12] KDC-REQ
/// </pre>
pub fn parse_tgs_req(i: &[u8]) -> Result<KdcReq, DecodeError> {
    parse_kdc_req_of_type(i, MessageType::KRB_TGS_REQ)
}

/// Parse a Kerberos Error
///
/// <pre>
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (30),
///         ctime           [2] KerberosTime OPTIONAL,
///         cusec           [3] Microseconds OPTIONAL,
///         stime           [4] KerberosTime,
///         susec           [5] Microseconds,
///         error-code      [6] Int32,
///         crealm          [7] Realm OPTIONAL,
///         cname           [8] PrincipalName OPTIONAL,
///         realm           [9] Realm -- service realm --,
///         sname           [10] PrincipalName -- service name --,
///         e-text          [11] KerberosString OPTIONAL,
///         e-data          [12] OCTET STRING OPTIONAL
/// }
/// </pre>
pub fn parse_krb_error(i: &[u8]) -> Result<KrbError, DecodeError> {
    decode(i)
}

/// Parse a Kerberos AP Reply
///
/// <pre>
/// AP-REP          ::= [APPLICATION 15] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (15),
///         enc-part        [2] EncryptedData -- EncAPRepPart
/// }
/// </pre>
pub fn parse_ap_rep(i: &[u8]) -> Result<ApRep, DecodeError> {
    decode(i)
}

/// Parse the decrypted part of a Kerberos Ticket
///
/// <pre>
/// EncTicketPart   ::= [APPLICATION 3] SEQUENCE {
///         flags                   [0] TicketFlags,
///         key                     [1] EncryptionKey,
///         crealm                  [2] Realm,
///         cname                   [3] PrincipalName,
///         transited               [4] TransitedEncoding,
///         authtime                [5] KerberosTime,
///         starttime               [6] KerberosTime OPTIONAL,
///         endtime                 [7] KerberosTime,
///         renew-till              [8] KerberosTime OPTIONAL,
///         caddr                   [9] HostAddresses OPTIONAL,
///         authorization-data      [10] AuthorizationData OPTIONAL
/// }
/// </pre>
pub fn parse_enc_ticket_part(i: &[u8]) -> Result<EncTicketPart, DecodeError> {
    decode(i)
}

/// Parse the data of a Kerberos change password request
///
/// <pre>
/// ChangePasswdData ::=  SEQUENCE {
///         newpasswd[0]   OCTET STRING,
///         targname[1]    PrincipalName OPTIONAL,
///         targrealm[2]   Realm OPTIONAL
/// }
/// </pre>
pub fn parse_change_passwd_data(i: &[u8]) -> Result<ChangePasswdData, DecodeError> {
    decode(i)
}
