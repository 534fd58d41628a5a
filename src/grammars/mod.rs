//! Grammars and encoders of the concrete Kerberos structures
//!
//! One module per structure (or small family of structures). Each module
//! declares the states of its grammar, builds the grammar lazily on first
//! use, and implements [`Decodable`](crate::Decodable) and
//! [`Constructed`](crate::Constructed) for the domain type in [`crate::krb5`].

use crate::decoder::Decodable;
use crate::grammar::Action;

mod ap_rep;
mod authorization_data;
mod change_passwd_data;
mod enc_ticket_part;
mod encryption;
mod host_address;
mod kdc_req;
mod kdc_req_body;
mod krb_error;
mod pa_data;
mod principal_name;
mod ticket;
mod typed_data;

pub use self::ap_rep::{ApRepState, AP_REP_TAG};
pub use self::authorization_data::AuthorizationDataState;
pub use self::change_passwd_data::ChangePasswdDataState;
pub use self::enc_ticket_part::{EncTicketPartState, ENC_TICKET_PART_TAG};
pub use self::encryption::{EncryptedDataState, EncryptionKeyState};
pub use self::host_address::{HostAddressState, HostAddressesState};
pub use self::kdc_req::{KdcReqState, AS_REQ_TAG, TGS_REQ_TAG};
pub use self::kdc_req_body::KdcReqBodyState;
pub use self::krb_error::{KrbErrorState, KRB_ERROR_TAG};
pub use self::pa_data::PaDataState;
pub use self::principal_name::PrincipalNameState;
pub use self::ticket::{TicketState, TransitedEncodingState, TICKET_TAG};
pub use self::typed_data::TypedDataState;

/// Protocol version number carried by every Kerberos 5 message
pub const KRB5_PVNO: i64 = 5;

/// Int32 ::= INTEGER (-2147483648..2147483647)
pub(crate) fn int32<T: Decodable>(store: fn(&mut T, i64)) -> Action<T> {
    Action::StoreInteger {
        min: i32::MIN.into(),
        max: i32::MAX.into(),
        store,
    }
}

/// UInt32 ::= INTEGER (0..4294967295)
pub(crate) fn uint32<T: Decodable>(store: fn(&mut T, i64)) -> Action<T> {
    Action::StoreInteger {
        min: 0,
        max: u32::MAX.into(),
        store,
    }
}

/// Microseconds ::= INTEGER (0..999999)
pub(crate) fn microseconds<T: Decodable>(store: fn(&mut T, i64)) -> Action<T> {
    Action::StoreInteger {
        min: 0,
        max: 999_999,
        store,
    }
}

/// pvno [n] INTEGER (5)
pub(crate) fn pvno<T: Decodable>(store: fn(&mut T, i64)) -> Action<T> {
    exactly(KRB5_PVNO, store)
}

/// INTEGER restricted to a single value, such as a fixed msg-type
pub(crate) fn exactly<T: Decodable>(value: i64, store: fn(&mut T, i64)) -> Action<T> {
    Action::StoreInteger {
        min: value,
        max: value,
        store,
    }
}
