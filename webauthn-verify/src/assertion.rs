//! Assertion signature and sign-count checks
//!
//! An assertion is signed over `authData || SHA-256(clientDataJSON)` with the
//! credential key extracted at registration. The sign count guards against
//! cloned authenticators: once a credential has reported a non-zero count,
//! every later assertion must be strictly greater.

use crate::error::{Result, VerifyError};
use crate::types::StoredCredential;

/// How to treat authenticators that never implement a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignCountPolicy {
    /// Accept `stored == 0 && asserted == 0` as "no counter support"
    #[default]
    AcceptUnsupported,
    /// Require strict increase on every assertion
    Strict,
}

/// Verify the assertion signature with the stored credential key
pub(crate) fn verify_signature(
    credential: &StoredCredential,
    raw_auth_data: &[u8],
    client_data_hash: &[u8; 32],
    signature: &[u8],
) -> Result<()> {
    let mut signed = Vec::with_capacity(raw_auth_data.len() + client_data_hash.len());
    signed.extend_from_slice(raw_auth_data);
    signed.extend_from_slice(client_data_hash);
    credential.public_key.verify(&signed, signature)?;
    Ok(())
}

/// Enforce sign-count monotonicity
///
/// Returns the count to persist. The zero/zero case is the only one the
/// policy decides; any other non-increase is a regression.
pub(crate) fn check_sign_count(
    policy: SignCountPolicy,
    stored: u32,
    asserted: u32,
) -> Result<u32> {
    if asserted > stored {
        return Ok(asserted);
    }
    if stored == 0 && asserted == 0 && policy == SignCountPolicy::AcceptUnsupported {
        return Ok(0);
    }
    Err(VerifyError::CounterRegression { stored, asserted })
}
