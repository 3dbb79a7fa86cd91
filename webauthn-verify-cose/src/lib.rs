//! COSE public key handling for WebAuthn relying-party verification
//!
//! Decodes COSE-format public keys (EC2, RSA, OKP) out of attested credential
//! data and verifies WebAuthn signatures with them. Keys are immutable once
//! decoded; the only capability they expose is [`CoseKey::verify`].
//!
//! Spec: <https://www.rfc-editor.org/rfc/rfc8152.html#section-7>

pub mod alg;
pub mod error;
pub mod key;

pub use alg::CoseAlgorithm;
pub use error::{CoseError, Result};
pub use key::{CoseKey, EcCurve};
