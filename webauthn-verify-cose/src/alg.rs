//! COSE algorithm identifiers
//!
//! Identifiers from the IANA COSE registry that this engine accepts. Anything
//! outside this set is rejected at key-decode time rather than skipped.

use crate::error::{CoseError, Result};

/// Supported COSE signature algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
    /// ECDSA with P-256 and SHA-256 (-7)
    Es256,
    /// EdDSA over Ed25519 (-8)
    EdDsa,
    /// ECDSA with P-384 and SHA-384 (-35)
    Es384,
    /// RSASSA-PSS with SHA-256 (-37)
    Ps256,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (-257)
    Rs256,
}

impl CoseAlgorithm {
    /// Look up an algorithm by its COSE identifier, rejecting unknown values
    pub fn from_id(id: i64) -> Result<Self> {
        match id {
            -7 => Ok(Self::Es256),
            -8 => Ok(Self::EdDsa),
            -35 => Ok(Self::Es384),
            -37 => Ok(Self::Ps256),
            -257 => Ok(Self::Rs256),
            other => Err(CoseError::UnsupportedAlgorithm(other)),
        }
    }

    /// The COSE identifier for this algorithm
    pub fn id(self) -> i64 {
        match self {
            Self::Es256 => -7,
            Self::EdDsa => -8,
            Self::Es384 => -35,
            Self::Ps256 => -37,
            Self::Rs256 => -257,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_identifiers_round_trip() {
        for id in [-7, -8, -35, -37, -257] {
            assert_eq!(CoseAlgorithm::from_id(id).unwrap().id(), id);
        }
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        assert_eq!(
            CoseAlgorithm::from_id(-65535),
            Err(CoseError::UnsupportedAlgorithm(-65535))
        );
        // ES512 is deliberately not in the supported set
        assert_eq!(
            CoseAlgorithm::from_id(-36),
            Err(CoseError::UnsupportedAlgorithm(-36))
        );
    }
}
