//! Client data parsing and binding checks
//!
//! The client data JSON binds a ceremony to a challenge and an origin. It is
//! parsed once, immutably; the binding checks compare the decoded challenge
//! in constant time and the origin by exact string equality (no
//! normalization, so `https://example.org/` is not `https://example.org`).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::{Result, VerifyError};

const TYPE_CREATE: &str = "webauthn.create";
const TYPE_GET: &str = "webauthn.get";

/// Which ceremony the client data was collected for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataKind {
    /// Registration (`webauthn.create`)
    Create,
    /// Authentication (`webauthn.get`)
    Get,
}

/// Parsed client data
#[derive(Debug, Clone)]
pub struct ClientData {
    /// Ceremony type
    pub kind: ClientDataKind,
    /// Challenge, decoded from base64url
    pub challenge: Vec<u8>,
    /// Origin string, kept verbatim
    pub origin: String,
}

#[derive(Deserialize)]
struct WireClientData {
    #[serde(rename = "type")]
    kind: String,
    challenge: String,
    origin: String,
    // tokenBinding, crossOrigin and any future members are ignored
}

impl ClientData {
    /// Parse the client data JSON blob; pure, no side effects
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let wire: WireClientData = serde_json::from_slice(data)
            .map_err(|e| VerifyError::Format(format!("client data JSON: {e}")))?;

        let kind = match wire.kind.as_str() {
            TYPE_CREATE => ClientDataKind::Create,
            TYPE_GET => ClientDataKind::Get,
            other => {
                return Err(VerifyError::Format(format!(
                    "unsupported client data type {other:?}"
                )))
            }
        };

        let challenge = URL_SAFE_NO_PAD
            .decode(wire.challenge.as_bytes())
            .map_err(|_| VerifyError::Format("challenge is not base64url".into()))?;

        Ok(Self {
            kind,
            challenge,
            origin: wire.origin,
        })
    }

    /// Check the ceremony binding: type, challenge, then origin, in order
    pub fn check_binding(
        &self,
        expected_kind: ClientDataKind,
        expected_challenge: &[u8],
        expected_origin: &str,
    ) -> Result<()> {
        if self.kind != expected_kind {
            return Err(VerifyError::Format(
                "client data type does not match ceremony".into(),
            ));
        }

        if self.challenge.len() != expected_challenge.len()
            || !bool::from(self.challenge.ct_eq(expected_challenge))
        {
            return Err(VerifyError::ChallengeMismatch);
        }

        if self.origin != expected_origin {
            return Err(VerifyError::OriginMismatch {
                expected: expected_origin.to_string(),
                actual: self.origin.clone(),
            });
        }

        Ok(())
    }
}
