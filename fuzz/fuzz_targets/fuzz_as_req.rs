#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate kerberos_codec;

use kerberos_codec::krb5_parser::parse_as_req;
use kerberos_codec::Encodable;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = parse_as_req(data) {
        // whatever decodes must re-encode to something that decodes the same
        let bytes = req.encode();
        assert_eq!(parse_as_req(&bytes), Ok(req));
    }
});
