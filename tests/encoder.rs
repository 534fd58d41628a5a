extern crate der_parser;
extern crate kerberos_codec;

use der_parser::der::{parse_der, parse_der_integer, Class, DerObject, Tag};

use kerberos_codec::encoder::{general_string, Integer};
use kerberos_codec::krb5::*;
use kerberos_codec::ldap::{parse_bind_request, Authentication, BindRequest};
use kerberos_codec::tlv::read_header;
use kerberos_codec::{decode, Encodable, ErrorCode};

fn time(day: u8) -> KerberosTime {
    KerberosTime {
        year: 1999,
        month: 12,
        day,
        hour: 23,
        minute: 59,
        second: 59,
    }
}

fn krb_error() -> KrbError {
    KrbError {
        pvno: 5,
        msg_type: MessageType::KRB_ERROR,
        ctime: None,
        cusec: None,
        stime: time(31),
        susec: 500_000,
        error_code: ErrorCode(-1765328359),
        crealm: None,
        cname: None,
        realm: Realm("EXAMPLE.ORG".to_owned()),
        sname: PrincipalName {
            name_type: NameType::KRB_NT_SRV_INST,
            name_string: vec!["kadmin".to_owned(), "changepw".to_owned()],
        },
        etext: None,
        edata: Some(vec![0x30, 0x00]),
    }
}

/// Context tag numbers of the children of a DER SEQUENCE
fn member_tags(seq: &DerObject) -> Vec<u32> {
    seq.as_sequence()
        .unwrap()
        .iter()
        .map(|member| {
            assert_eq!(member.header.class(), Class::ContextSpecific);
            member.header.tag().0
        })
        .collect()
}

#[test]
fn integers_are_minimal_der() {
    let values: &[i64] = &[
        0,
        1,
        127,
        128,
        255,
        256,
        -1,
        -128,
        -129,
        999_999,
        i32::MAX as i64,
        i32::MIN as i64,
        u32::MAX as i64,
    ];
    for &v in values {
        let bytes = Integer(v).encode();
        let (rem, obj) = parse_der_integer(&bytes).expect("DER INTEGER");
        assert!(rem.is_empty());
        assert_eq!(obj.as_i64().unwrap(), v, "value {}", v);
    }
}

#[test]
fn krb_error_is_der() {
    let err = krb_error();
    let bytes = err.encode();
    assert_eq!(bytes.len(), err.encoded_len());

    let (rem, obj) = parse_der(&bytes).expect("DER KRB-ERROR");
    assert!(rem.is_empty());
    assert_eq!(obj.header.class(), Class::Application);
    assert_eq!(obj.header.tag(), Tag(30));

    let outer = read_header(&bytes, 0).unwrap();
    let (rem, seq) = parse_der(&bytes[outer.header_len()..]).expect("DER SEQUENCE");
    assert!(rem.is_empty());
    // absent OPTIONAL members are left out, the rest keep their order
    assert_eq!(member_tags(&seq), vec![0, 1, 4, 5, 6, 9, 10, 12]);

    assert_eq!(decode::<KrbError>(&bytes), Ok(err));
}

#[test]
fn kdc_req_is_der() {
    let req = KdcReq {
        pvno: 5,
        msg_type: MessageType::KRB_AS_REQ,
        padata: Vec::new(),
        req_body: KdcReqBody {
            kdc_options: KerberosFlags(0x5000_0000),
            cname: Some(PrincipalName {
                name_type: NameType::KRB_NT_ENTERPRISE,
                name_string: vec!["bob@example.org".to_owned()],
            }),
            realm: Realm("EXAMPLE.ORG".to_owned()),
            till: time(1),
            nonce: 7,
            etype: vec![EncryptionType::AES128_CTS_HMAC_SHA1_96],
            ..Default::default()
        },
    };
    let bytes = req.encode();
    let (rem, obj) = parse_der(&bytes).expect("DER AS-REQ");
    assert!(rem.is_empty());
    assert_eq!(obj.header.class(), Class::Application);
    assert_eq!(obj.header.tag(), Tag(10));

    let outer = read_header(&bytes, 0).unwrap();
    let (_, seq) = parse_der(&bytes[outer.header_len()..]).unwrap();
    // no padata
    assert_eq!(member_tags(&seq), vec![1, 2, 4]);

    assert_eq!(decode::<KdcReq>(&bytes), Ok(req));
}

#[test]
fn primitives_are_der() {
    let bytes = time(31).encode();
    let (rem, obj) = parse_der(&bytes).expect("DER GeneralizedTime");
    assert!(rem.is_empty());
    assert_eq!(obj.header.tag(), Tag::GeneralizedTime);

    let bytes = KerberosFlags(0x0080_0000).encode();
    let (rem, obj) = parse_der(&bytes).expect("DER BIT STRING");
    assert!(rem.is_empty());
    assert_eq!(obj.header.tag(), Tag::BitString);

    let bytes = general_string("EXAMPLE.ORG").encode();
    let (rem, obj) = parse_der(&bytes).expect("DER GeneralString");
    assert!(rem.is_empty());
    assert_eq!(obj.header.tag(), Tag::GeneralString);
}

#[test]
fn long_form_lengths() {
    let data = EncryptedData {
        etype: EncryptionType::AES256_CTS_HMAC_SHA1_96,
        kvno: Some(3),
        cipher: vec![0x42; 1000],
    };
    let bytes = data.encode();
    // 0x3fa content octets
    assert_eq!(&bytes[..4], &[0x30, 0x82, 0x03, 0xfa]);
    let (rem, _) = parse_der(&bytes).expect("DER EncryptedData");
    assert!(rem.is_empty());
    assert_eq!(decode::<EncryptedData>(&bytes), Ok(data));
}

#[test]
fn bind_request_round_trip() {
    let req = BindRequest {
        version: 3,
        name: "uid=svc,dc=example,dc=org".to_owned(),
        authentication: Authentication::Simple(b"s3cr3t".to_vec()),
    };
    let bytes = req.encode();
    let (rem, obj) = parse_der(&bytes).expect("DER BindRequest");
    assert!(rem.is_empty());
    assert_eq!(obj.header.class(), Class::Application);
    assert_eq!(obj.header.tag(), Tag(0));
    assert_eq!(parse_bind_request(&bytes), Ok(req));
}
