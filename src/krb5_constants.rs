//! Kerberos 5 registered numbers
//!
//! Each type is a newtype over the wire value, so values missing from the
//! lists below decode without error and survive re-encoding unchanged.

/// Newtype constants with `Debug`/`Display` names, plus `is_known`
macro_rules! known_values {
    ($name:ident { $($key:ident = $val:literal),* $(,)? }) => {
        newtype_enum! {
            impl debug $name {
                $($key = $val,)*
            }
        }

        impl $name {
            /// Whether the value is one of the registered constants
            pub fn is_known(self) -> bool {
                [$($val),*].contains(&self.0)
            }
        }
    };
}

/// Encryption type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EncryptionType(pub i32);

known_values! { EncryptionType {
    NULL                         = 0,
    DES_CBC_CRC                  = 1,
    DES_CBC_MD4                  = 2,
    DES_CBC_MD5                  = 3,
    DES3_CBC_MD5                 = 5,
    DES3_CBC_SHA1                = 7,
    DSAWITHSHA1_CMSOID           = 9,
    MD5WITHRSAENCRYPTION_CMSOID  = 10,
    SHA1WITHRSAENCRYPTION_CMSOID = 11,
    RC2CBC_ENVOID                = 12,
    RSAENCRYPTION_ENVOID         = 13,
    RSAES_OAEP_ENV_OID           = 14,
    DES_EDE3_CBC_ENV_OID         = 15,
    DES3_CBC_SHA1_KD             = 16,
    AES128_CTS_HMAC_SHA1_96      = 17,
    AES256_CTS_HMAC_SHA1_96      = 18,
    AES128_CTS_HMAC_SHA256_128   = 19,
    AES256_CTS_HMAC_SHA384_192   = 20,
    RC4_HMAC                     = 23,
    RC4_HMAC_EXP                 = 24,
    SUBKEY_KEYMATERIAL           = 65,
}}

/// Host address type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HostAddrType(pub i32);

known_values! { HostAddrType {
    IPV4            = 2,
    DIRECTIONAL     = 3,
    CHAOSNET        = 5,
    XNS             = 6,
    ISO             = 7,
    DECNET_PHASE_IV = 12,
    APPLETALK_DDP   = 16,
    NETBIOS         = 20,
    IPV6            = 24,
}}

/// Message type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MessageType(pub u32);

known_values! { MessageType {
    KRB_AS_REQ     = 10,
    KRB_AS_REP     = 11,
    KRB_TGS_REQ    = 12,
    KRB_TGS_REP    = 13,
    KRB_AP_REQ     = 14,
    KRB_AP_REP     = 15,
    KRB_RESERVED16 = 16,
    KRB_RESERVED17 = 17,
    KRB_SAFE       = 20,
    KRB_PRIV       = 21,
    KRB_CRED       = 22,
    KRB_ERROR      = 30,
}}

/// Principal name type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NameType(pub i32);

known_values! { NameType {
    KRB_NT_UNKNOWN        = 0,
    KRB_NT_PRINCIPAL      = 1,
    KRB_NT_SRV_INST       = 2,
    KRB_NT_SRV_HST        = 3,
    KRB_NT_SRV_XHST       = 4,
    KRB_NT_UID            = 5,
    KRB_NT_X500_PRINCIPAL = 6,
    KRB_NT_SMTP_NAME      = 7,
    KRB_NT_ENTERPRISE     = 10,
}}

/// Pre-authentication data type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PAType(pub i32);

known_values! { PAType {
    PA_TGS_REQ          = 1,
    PA_ENC_TIMESTAMP    = 2,
    PA_PW_SALT          = 3,
    PA_ENC_UNIX_TIME    = 5,
    PA_SANDIA_SECUREID  = 6,
    PA_SESAME           = 7,
    PA_OSF_DCE          = 8,
    PA_CYBERSAFE_SECUREID = 9,
    PA_AFS3_SALT        = 10,
    PA_ETYPE_INFO       = 11,
    PA_SAM_CHALLENGE    = 12,
    PA_SAM_RESPONSE     = 13,
    PA_PK_AS_REQ_19     = 14,
    PA_PK_AS_REP_19     = 15,
    PA_PK_AS_REQ        = 16,
    PA_PK_AS_REP        = 17,
    PA_ETYPE_INFO2      = 19,
    PA_USE_SPECIFIED_KVNO = 20,
    PA_SAM_REDIRECT     = 21,
    PA_GET_FROM_TYPED_DATA = 22,
    PA_SAM_ETYPE_INFO   = 23,
    PA_PAC_REQUEST      = 128,
}}

/// Transited encoding type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransitedEncodingType(pub i32);

known_values! { TransitedEncodingType {
    NULL                 = 0,
    DOMAIN_X500_COMPRESS = 1,
}}

/// Authorization data type
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AuthorizationDataType(pub i32);

known_values! { AuthorizationDataType {
    AD_IF_RELEVANT                    = 1,
    AD_INTENDED_FOR_SERVER            = 2,
    AD_INTENDED_FOR_APPLICATION_CLASS = 3,
    AD_KDC_ISSUED                     = 4,
    AD_AND_OR                         = 5,
    AD_MANDATORY_TICKET_EXTENSIONS    = 6,
    AD_IN_TICKET_EXTENSIONS           = 7,
    AD_MANDATORY_FOR_KDC              = 8,
    OSF_DCE                           = 64,
    SESAME                            = 65,
    AD_OSF_DCE_PKI_CERTID             = 66,
    AD_WIN2K_PAC                      = 128,
    AD_ETYPE_NEGOTIATION              = 129,
}}
