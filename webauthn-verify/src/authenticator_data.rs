//! Authenticator data parsing
//!
//! Binary layout (WebAuthn level 2, section 6.1):
//!
//! ```text
//! rpIdHash (32) || flags (1) || signCount (4, BE)
//!   || attestedCredentialData (if AT flag):
//!        aaguid (16) || credentialIdLength (2, BE) || credentialId || COSE key
//!   || extensions (if ED flag): one CBOR map
//! ```
//!
//! Parsing consumes the buffer left to right with bounds checks at every
//! field; leftover bytes after the declared structure are a decode error.

use webauthn_verify_cose::CoseKey;

use crate::cbor;
use crate::error::{Result, VerifyError};

/// Minimum authenticator data size: rpIdHash + flags + signCount
const FIXED_LEN: usize = 37;
/// aaguid + credential ID length prefix
const ATTESTED_HEADER_LEN: usize = 18;

/// Authenticator flags byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorFlags(u8);

impl AuthenticatorFlags {
    /// User presence (UP, bit 0)
    pub const USER_PRESENT: u8 = 0x01;
    /// User verification (UV, bit 2)
    pub const USER_VERIFIED: u8 = 0x04;
    /// Attested credential data included (AT, bit 6)
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    /// Extension data included (ED, bit 7)
    pub const EXTENSION_DATA: u8 = 0x80;

    /// Wrap a raw flags byte
    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// The raw flags byte
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn user_present(self) -> bool {
        self.0 & Self::USER_PRESENT != 0
    }

    pub fn user_verified(self) -> bool {
        self.0 & Self::USER_VERIFIED != 0
    }

    pub fn attested_credential_included(self) -> bool {
        self.0 & Self::ATTESTED_CREDENTIAL_DATA != 0
    }

    pub fn extension_data_included(self) -> bool {
        self.0 & Self::EXTENSION_DATA != 0
    }
}

/// Credential material attested by the authenticator at registration
#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    /// Authenticator model identifier
    pub aaguid: [u8; 16],
    /// Credential ID (length-prefixed on the wire, at most 65535 bytes)
    pub credential_id: Vec<u8>,
    /// Decoded COSE public key
    pub public_key: CoseKey,
    /// The key's original CBOR bytes, kept for callers that persist it
    pub raw_public_key: Vec<u8>,
}

/// Parsed authenticator data
#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    /// SHA-256 of the relying party ID the authenticator scoped this to
    pub rp_id_hash: [u8; 32],
    /// UP/UV/AT/ED flags
    pub flags: AuthenticatorFlags,
    /// Signature counter, 0 when the authenticator has none
    pub sign_count: u32,
    /// Present iff the AT flag is set
    pub attested_credential: Option<AttestedCredentialData>,
    /// Raw extension CBOR, present iff the ED flag is set
    pub extensions: Option<Vec<u8>>,
}

impl AuthenticatorData {
    /// Parse authenticator data, accounting for every byte
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FIXED_LEN {
            return Err(VerifyError::Decode("authenticator data too short"));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&data[..32]);
        let flags = AuthenticatorFlags::new(data[32]);
        let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);
        let mut offset = FIXED_LEN;

        let attested_credential = if flags.attested_credential_included() {
            let rest = &data[offset..];
            if rest.len() < ATTESTED_HEADER_LEN {
                return Err(VerifyError::Decode("attested credential data too short"));
            }
            let mut aaguid = [0u8; 16];
            aaguid.copy_from_slice(&rest[..16]);
            let id_len = usize::from(u16::from_be_bytes([rest[16], rest[17]]));
            if rest.len() < ATTESTED_HEADER_LEN + id_len {
                return Err(VerifyError::Decode("credential ID exceeds buffer"));
            }
            let credential_id = rest[ATTESTED_HEADER_LEN..ATTESTED_HEADER_LEN + id_len].to_vec();

            let key_start = ATTESTED_HEADER_LEN + id_len;
            let key_len = cbor::item_len(&rest[key_start..])?;
            let raw_public_key = rest[key_start..key_start + key_len].to_vec();
            let public_key = CoseKey::from_cbor(&raw_public_key)?;

            offset += key_start + key_len;
            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                public_key,
                raw_public_key,
            })
        } else {
            None
        };

        let extensions = if flags.extension_data_included() {
            let ext_len = cbor::item_len(&data[offset..])?;
            let ext = data[offset..offset + ext_len].to_vec();
            offset += ext_len;
            Some(ext)
        } else {
            None
        };

        if offset != data.len() {
            tracing::debug!(
                declared = offset,
                actual = data.len(),
                "authenticator data has trailing bytes"
            );
            return Err(VerifyError::Decode("trailing bytes in authenticator data"));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential,
            extensions,
        })
    }
}
