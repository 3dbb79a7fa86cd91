//! Output records and per-call credential state
//!
//! All records here are built fresh per verification call and returned by
//! value; persistence of the extracted key and sign count is the caller's
//! job, keyed by credential ID.

use webauthn_verify_cose::CoseKey;

/// Assurance level an attestation statement verifier established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationTrust {
    /// The "none" format: no statement was checked at all
    None,
    /// Signature checked against the credential's own key; proves possession,
    /// not provenance
    SelfAttested,
    /// Signature checked against an attestation certificate's key
    Basic,
}

/// What a statement verifier hands back to the orchestrator
#[derive(Debug, Clone)]
pub struct VerifiedAttestation {
    /// Established trust level; never silently upgraded by the orchestrator
    pub trust: AttestationTrust,
    /// Leaf attestation certificate (DER), when the format carried one, so
    /// callers can run their own trust-anchor policy on it
    pub attestation_certificate: Option<Vec<u8>>,
}

/// Successful registration verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    /// Attested credential ID
    pub credential_id: Vec<u8>,
    /// Authenticator model identifier
    pub aaguid: [u8; 16],
    /// Extracted public key
    pub public_key: CoseKey,
    /// The key's original CBOR encoding, for persistence
    pub public_key_cbor: Vec<u8>,
    /// Initial sign count to store alongside the credential
    pub sign_count: u32,
    /// Attestation statement format that was verified
    pub format: String,
    /// Assurance level of that verification
    pub trust: AttestationTrust,
    /// Leaf attestation certificate, when one was presented
    pub attestation_certificate: Option<Vec<u8>>,
    /// Whether the authenticator reported user verification
    pub user_verified: bool,
}

/// Successful authentication verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// New sign count; the caller must persist it before accepting another
    /// assertion for this credential
    pub sign_count: u32,
    /// Whether the authenticator reported user verification
    pub user_verified: bool,
    /// User handle from the response, when the authenticator sent one
    pub user_handle: Option<Vec<u8>>,
}

/// Caller-supplied state for a previously registered credential
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// Public key extracted at registration
    pub public_key: CoseKey,
    /// Sign count recorded after the last accepted ceremony
    pub sign_count: u32,
}
