//! Server-side WebAuthn response verification
//!
//! This crate validates the two ceremony responses a relying party receives
//! from a browser: attestation (registration) and assertion (authentication).
//! It owns decoding, challenge/origin binding, flag policy, attestation
//! statement verification, and sign-count tracking. It does not generate
//! challenges, store credentials, or speak HTTP; callers wire those up around
//! [`RelyingParty`].
//!
//! ```no_run
//! use webauthn_verify::{AttestationRequest, RelyingParty};
//!
//! let rp = RelyingParty::new("example.org", "https://example.org");
//! # let request = AttestationRequest {
//! #     raw_id: vec![],
//! #     client_data_json: vec![],
//! #     attestation_object: vec![],
//! # };
//! # let expected_challenge = vec![];
//! let result = rp.verify_attestation(&request, &expected_challenge)?;
//! // persist result.credential_id, result.public_key_cbor, result.sign_count
//! # Ok::<(), webauthn_verify::VerifyError>(())
//! ```

pub mod assertion;
pub mod attestation;
pub mod authenticator_data;
mod cbor;
pub mod client_data;
pub mod error;
pub mod types;
pub mod verifier;

pub use assertion::SignCountPolicy;
pub use attestation::{
    AttestationFormat, AttestationObject, FidoU2fFormat, FormatRegistry, NoneFormat, PackedFormat,
    SelfAttestationPolicy, StatementContext,
};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use client_data::{ClientData, ClientDataKind};
pub use error::{Result, VerifyError};
pub use types::{
    AssertionResult, AttestationResult, AttestationTrust, StoredCredential, VerifiedAttestation,
};
pub use verifier::{AssertionRequest, AttestationRequest, RelyingParty, VerifyPolicy};

pub use webauthn_verify_cose as cose;
pub use webauthn_verify_cose::{CoseAlgorithm, CoseKey, EcCurve};
