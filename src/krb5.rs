//! Kerberos 5 structures
//!
//! - [RFC1510](https://tools.ietf.org/html/rfc1510) The Kerberos Network Authentication Service (V5)
//! - [RFC3244](https://tools.ietf.org/html/rfc3244) Microsoft Windows 2000 Kerberos Change Password and Set Password Protocols
//! - [RFC3961](https://tools.ietf.org/html/rfc3961) Encryption and Checksum Specifications for Kerberos 5
//! - [RFC4120](https://tools.ietf.org/html/rfc4120) The Kerberos Network Authentication Service (V5)
//!
//! Values are owned, so a decoded message outlives the buffer it came from.
//! Fields are filled in by the grammar actions in [`crate::grammars`].

use std::fmt;

pub use crate::krb5_constants::*;
use crate::krb5_errors::ErrorCode;
use crate::value::BitString;

/// Kerberos Realm
///
/// A Kerberos realm is a set of managed nodes that share the same Kerberos database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Realm(pub String);

/// Kerberos PrincipalName
///
/// A Kerberos principal is a service or user that is known to the Kerberos system. Each Kerberos
/// principal is identified by its principal name. Principal names consist of three parts: a
/// service or user name, an instance name, and a realm name in the following form:
///
/// <pre>
/// principal-name.instance-name@realm-name
/// </pre>
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalName {
    pub name_type: NameType,
    pub name_string: Vec<String>,
}

/// KerberosTime: UTC time with one-second resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KerberosTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for KerberosTime {
    /// GeneralizedTime form, `YYYYMMDDHHMMSSZ`
    ///
    /// Always 15 characters: a field too large for its digits is clamped.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}Z",
            self.year.min(9999),
            self.month.min(99),
            self.day.min(99),
            self.hour.min(99),
            self.minute.min(99),
            self.second.min(99)
        )
    }
}

/// KerberosFlags: a BIT STRING of at least 32 bits, bit 0 first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KerberosFlags(pub u32);

impl KerberosFlags {
    pub fn is_set(self, bit: u32) -> bool {
        bit < 32 && self.0 & (0x8000_0000u32 >> bit) != 0
    }

    pub fn set(&mut self, bit: u32) {
        if bit < 32 {
            self.0 |= 0x8000_0000u32 >> bit;
        }
    }
}

impl From<&BitString> for KerberosFlags {
    /// Takes the first 32 bits; missing trailing bits are clear
    fn from(bits: &BitString) -> Self {
        let flags = (0..32)
            .filter(|&n| bits.is_set(n))
            .fold(0u32, |acc, n| acc | (0x8000_0000u32 >> n));
        KerberosFlags(flags)
    }
}

/// KDC options of a KDC-REQ-BODY
pub type KdcOptions = KerberosFlags;

/// Flags of an EncTicketPart
pub type TicketFlags = KerberosFlags;

/// Kerberos EncryptedData
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedData {
    /// EncryptionType
    pub etype: EncryptionType,
    /// Version number of the key under which data is encrypted
    pub kvno: Option<u32>,
    /// Ciphertext
    pub cipher: Vec<u8>,
}

/// Kerberos EncryptionKey
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionKey {
    pub keytype: EncryptionType,
    pub keyvalue: Vec<u8>,
}

/// Kerberos Ticket
///
/// A record that helps a client authenticate itself to a server; it
/// contains the client's identity, a session key, a timestamp, and
/// other information, all sealed using the server's secret key.  It
/// only serves to authenticate a client when presented along with a
/// fresh Authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ticket {
    pub tkt_vno: u32,
    pub realm: Realm,
    pub sname: PrincipalName,
    pub enc_part: EncryptedData,
}

/// Domains a ticket has been forwarded through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitedEncoding {
    pub tr_type: TransitedEncodingType,
    pub contents: Vec<u8>,
}

/// Kerberos HostAddress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAddress {
    pub addr_type: HostAddrType,
    pub address: Vec<u8>,
}

/// Kerberos HostAddresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAddresses(pub Vec<HostAddress>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationDataEntry {
    pub ad_type: AuthorizationDataType,
    pub ad_data: Vec<u8>,
}

/// Kerberos AuthorizationData
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationData(pub Vec<AuthorizationDataEntry>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedDataEntry {
    pub data_type: i32,
    pub data_value: Option<Vec<u8>>,
}

/// Kerberos TypedData, carried in the e-data of some KRB-ERRORs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedData(pub Vec<TypedDataEntry>);

/// Pre-authentication data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaData {
    pub padata_type: PAType,
    pub padata_value: Vec<u8>,
}

/// Key Distribution Center (KDC) Request Message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KdcReq {
    pub pvno: u32,
    /// KRB_AS_REQ or KRB_TGS_REQ, matching the application tag
    pub msg_type: MessageType,
    pub padata: Vec<PaData>,
    pub req_body: KdcReqBody,
}

/// Key Distribution Center (KDC) Request Message Body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KdcReqBody {
    pub kdc_options: KdcOptions,
    pub cname: Option<PrincipalName>,
    pub realm: Realm,
    pub sname: Option<PrincipalName>,
    pub from: Option<KerberosTime>,
    pub till: KerberosTime,
    pub rtime: Option<KerberosTime>,
    pub nonce: u32,
    pub etype: Vec<EncryptionType>,
    /// `Some(vec![])` for an empty SEQUENCE OF, distinct from absent
    pub addresses: Option<Vec<HostAddress>>,
    pub enc_authorization_data: Option<EncryptedData>,
    /// Empty when absent
    pub additional_tickets: Vec<Ticket>,
}

/// Kerberos Error message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KrbError {
    pub pvno: u32,
    pub msg_type: MessageType,
    pub ctime: Option<KerberosTime>,
    pub cusec: Option<u32>,
    pub stime: KerberosTime,
    pub susec: u32,
    pub error_code: ErrorCode,
    pub crealm: Option<Realm>,
    pub cname: Option<PrincipalName>,
    pub realm: Realm,
    pub sname: PrincipalName,
    pub etext: Option<String>,
    pub edata: Option<Vec<u8>>,
}

/// Application Reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApRep {
    pub pvno: u32,
    pub msg_type: MessageType,
    pub enc_part: EncryptedData,
}

/// Decrypted part of a Ticket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncTicketPart {
    pub flags: TicketFlags,
    pub key: EncryptionKey,
    pub crealm: Realm,
    pub cname: PrincipalName,
    pub transited: TransitedEncoding,
    pub authtime: KerberosTime,
    pub starttime: Option<KerberosTime>,
    pub endtime: KerberosTime,
    pub renew_till: Option<KerberosTime>,
    pub caddr: Option<HostAddresses>,
    pub authorization_data: Option<AuthorizationData>,
}

/// Change password request data (RFC 3244)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswdData {
    pub newpasswd: Vec<u8>,
    pub targname: Option<PrincipalName>,
    pub targrealm: Option<Realm>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_from_bit_string() {
        let bits = BitString {
            unused_bits: 0,
            data: vec![0x40, 0x81, 0x00, 0x10],
        };
        let flags = KerberosFlags::from(&bits);
        assert_eq!(flags, KerberosFlags(0x4081_0010));
        assert!(flags.is_set(1));
        assert!(!flags.is_set(0));

        // short strings leave the remaining flags clear
        let short = BitString {
            unused_bits: 6,
            data: vec![0xc0],
        };
        assert_eq!(KerberosFlags::from(&short), KerberosFlags(0xc000_0000));

        let mut f = KerberosFlags::default();
        f.set(31);
        assert_eq!(f, KerberosFlags(1));
    }

    #[test]
    fn time_display() {
        let t = KerberosTime {
            year: 1999,
            month: 1,
            day: 2,
            hour: 3,
            minute: 4,
            second: 5,
        };
        assert_eq!(t.to_string(), "19990102030405Z");
    }
}
