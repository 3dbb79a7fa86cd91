//! Error taxonomy for verification failures
//!
//! Every failure is non-retriable: it signals malformed or malicious input,
//! or a policy mismatch. Callers must gate security decisions on the variant,
//! never on the message text, and must treat any error as a failed ceremony.

use thiserror::Error;
use webauthn_verify_cose::CoseError;

/// Verification failure kinds
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Malformed binary or CBOR structure (truncated, over-length, bad types)
    #[error("malformed input: {0}")]
    Decode(&'static str),

    /// Malformed client-data JSON or an unexpected field value
    #[error("invalid format: {0}")]
    Format(String),

    /// Client-data challenge does not match the issued challenge
    #[error("challenge mismatch")]
    ChallengeMismatch,

    /// Client-data origin does not match the configured origin exactly
    #[error("origin mismatch: expected {expected:?}, got {actual:?}")]
    OriginMismatch { expected: String, actual: String },

    /// Authenticator-data RP ID hash does not match the configured RP ID
    #[error("relying party ID hash mismatch")]
    RpIdMismatch,

    /// A required authenticator flag is absent
    #[error("required flag not set: {0}")]
    FlagPolicy(&'static str),

    /// No registered verifier for the attestation statement format
    #[error("unsupported attestation format {0:?}")]
    UnsupportedFormat(String),

    /// Cryptographic signature verification failed
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Sign count did not advance; possible cloned authenticator
    #[error("sign count regression: stored {stored}, asserted {asserted}")]
    CounterRegression { stored: u32, asserted: u32 },

    /// Response raw ID differs from the attested credential ID
    #[error("credential ID mismatch between response and attested data")]
    CredentialIdMismatch,

    /// Packed statement carries no certificate and policy forbids self-attestation
    #[error("self-attestation rejected by policy")]
    SelfAttestationRejected,
}

impl From<CoseError> for VerifyError {
    fn from(err: CoseError) -> Self {
        match err {
            CoseError::InvalidSignature => VerifyError::SignatureInvalid,
            CoseError::InvalidCbor => VerifyError::Decode("invalid CBOR in COSE key"),
            CoseError::MissingLabel(_) => VerifyError::Decode("COSE key is missing a label"),
            CoseError::UnexpectedType(_) => VerifyError::Decode("COSE key label has wrong type"),
            CoseError::UnsupportedKeyType(_) => VerifyError::Decode("unsupported COSE key type"),
            CoseError::UnsupportedAlgorithm(_) => VerifyError::Decode("unsupported COSE algorithm"),
            CoseError::UnsupportedCurve(_) => VerifyError::Decode("unsupported COSE curve"),
            CoseError::AlgorithmMismatch => VerifyError::Decode("COSE algorithm mismatch"),
            CoseError::InvalidKeyMaterial(_) => VerifyError::Decode("invalid COSE key material"),
        }
    }
}

/// Result type alias for verification operations
pub type Result<T> = core::result::Result<T, VerifyError>;
