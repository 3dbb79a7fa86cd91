//! Error types for COSE key operations

use thiserror::Error;

/// COSE key decoding and verification errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoseError {
    /// Key bytes are not a well-formed CBOR map
    #[error("invalid CBOR in COSE key")]
    InvalidCbor,

    /// A required map label is absent
    #[error("COSE key is missing label {0}")]
    MissingLabel(i64),

    /// A label holds a value of the wrong CBOR type
    #[error("COSE key label {0} has an unexpected type")]
    UnexpectedType(i64),

    /// Key type not one of OKP, EC2, RSA
    #[error("unsupported COSE key type {0}")]
    UnsupportedKeyType(i64),

    /// Algorithm identifier not in the supported set
    #[error("unsupported COSE algorithm {0}")]
    UnsupportedAlgorithm(i64),

    /// Curve identifier not usable with the declared key type
    #[error("unsupported COSE curve {0}")]
    UnsupportedCurve(i64),

    /// Declared algorithm does not fit the key type or curve
    #[error("COSE algorithm does not match key type or curve")]
    AlgorithmMismatch,

    /// Coordinate or modulus bytes have the wrong length
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(&'static str),

    /// Signature is malformed or does not verify
    #[error("signature verification failed")]
    InvalidSignature,
}

/// Result type alias for COSE operations
pub type Result<T> = core::result::Result<T, CoseError>;
