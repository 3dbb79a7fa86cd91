//! COSE public key decoding and signature verification
//!
//! A [`CoseKey`] is decoded once from the CBOR map embedded in attested
//! credential data and then only used through [`CoseKey::verify`]. The variant
//! is fixed at decode time by matching the `kty` label, so verification never
//! inspects types at runtime.
//!
//! Labels follow RFC 8152 section 7: `kty` = 1, `alg` = 3, and the key-type
//! specific negative labels (`crv`/`x`/`y` for EC2 and OKP, `n`/`e` for RSA).

use std::collections::BTreeMap;

use cbor4ii::core::Value;
use sha2::{Digest, Sha256};

use crate::alg::CoseAlgorithm;
use crate::error::{CoseError, Result};

const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV: i64 = -1;
const LABEL_X: i64 = -2;
const LABEL_Y: i64 = -3;
const LABEL_RSA_N: i64 = -1;
const LABEL_RSA_E: i64 = -2;

const KTY_OKP: i64 = 1;
const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

const CRV_P256: i64 = 1;
const CRV_P384: i64 = 2;
const CRV_ED25519: i64 = 6;

/// Elliptic curves accepted for EC2 keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
}

impl EcCurve {
    fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }
}

/// A decoded COSE public key
///
/// Tagged by key type; each variant carries its declared algorithm so that
/// [`CoseKey::verify`] can dispatch without re-reading the CBOR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoseKey {
    /// Elliptic-curve key with x and y coordinates
    Ec2 {
        alg: CoseAlgorithm,
        curve: EcCurve,
        x: Vec<u8>,
        y: Vec<u8>,
    },
    /// RSA key with big-endian modulus and exponent
    Rsa {
        alg: CoseAlgorithm,
        n: Vec<u8>,
        e: Vec<u8>,
    },
    /// Octet key pair (Ed25519)
    Okp { alg: CoseAlgorithm, x: Vec<u8> },
}

fn label_int(map: &BTreeMap<i64, Value>, label: i64) -> Result<i64> {
    match map.get(&label) {
        Some(Value::Integer(i)) => {
            i64::try_from(*i).map_err(|_| CoseError::UnexpectedType(label))
        }
        Some(_) => Err(CoseError::UnexpectedType(label)),
        None => Err(CoseError::MissingLabel(label)),
    }
}

fn label_bytes(map: &BTreeMap<i64, Value>, label: i64) -> Result<Vec<u8>> {
    match map.get(&label) {
        Some(Value::Bytes(b)) => Ok(b.clone()),
        Some(_) => Err(CoseError::UnexpectedType(label)),
        None => Err(CoseError::MissingLabel(label)),
    }
}

impl CoseKey {
    /// Decode a COSE key from its CBOR map encoding
    ///
    /// The whole buffer must be one well-formed map; unknown key types,
    /// curves, and algorithms are rejected rather than defaulted.
    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        let map: BTreeMap<i64, Value> =
            cbor4ii::serde::from_slice(data).map_err(|_| CoseError::InvalidCbor)?;

        let kty = label_int(&map, LABEL_KTY)?;
        let alg = CoseAlgorithm::from_id(label_int(&map, LABEL_ALG)?)?;

        match kty {
            KTY_EC2 => {
                let curve = match label_int(&map, LABEL_CRV)? {
                    CRV_P256 => EcCurve::P256,
                    CRV_P384 => EcCurve::P384,
                    other => return Err(CoseError::UnsupportedCurve(other)),
                };
                match (curve, alg) {
                    (EcCurve::P256, CoseAlgorithm::Es256) => {}
                    (EcCurve::P384, CoseAlgorithm::Es384) => {}
                    _ => return Err(CoseError::AlgorithmMismatch),
                }
                let x = label_bytes(&map, LABEL_X)?;
                let y = label_bytes(&map, LABEL_Y)?;
                if x.len() != curve.coordinate_len() || y.len() != curve.coordinate_len() {
                    return Err(CoseError::InvalidKeyMaterial("EC2 coordinate length"));
                }
                Ok(Self::Ec2 { alg, curve, x, y })
            }
            KTY_RSA => {
                if !matches!(alg, CoseAlgorithm::Rs256 | CoseAlgorithm::Ps256) {
                    return Err(CoseError::AlgorithmMismatch);
                }
                let n = label_bytes(&map, LABEL_RSA_N)?;
                let e = label_bytes(&map, LABEL_RSA_E)?;
                if n.is_empty() || e.is_empty() {
                    return Err(CoseError::InvalidKeyMaterial("empty RSA parameter"));
                }
                Ok(Self::Rsa { alg, n, e })
            }
            KTY_OKP => {
                match label_int(&map, LABEL_CRV)? {
                    CRV_ED25519 => {}
                    other => return Err(CoseError::UnsupportedCurve(other)),
                }
                if alg != CoseAlgorithm::EdDsa {
                    return Err(CoseError::AlgorithmMismatch);
                }
                let x = label_bytes(&map, LABEL_X)?;
                if x.len() != 32 {
                    return Err(CoseError::InvalidKeyMaterial("Ed25519 point length"));
                }
                Ok(Self::Okp { alg, x })
            }
            other => Err(CoseError::UnsupportedKeyType(other)),
        }
    }

    /// Re-encode the key as a CBOR map with labels in canonical order
    /// (positive labels ascending, then negative labels by encoded value)
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let entries = match self {
            Self::Ec2 { alg, curve, x, y } => {
                let crv = match curve {
                    EcCurve::P256 => CRV_P256,
                    EcCurve::P384 => CRV_P384,
                };
                vec![
                    (LABEL_KTY, Value::Integer(KTY_EC2 as i128)),
                    (LABEL_ALG, Value::Integer(alg.id() as i128)),
                    (LABEL_CRV, Value::Integer(crv as i128)),
                    (LABEL_X, Value::Bytes(x.clone())),
                    (LABEL_Y, Value::Bytes(y.clone())),
                ]
            }
            Self::Rsa { alg, n, e } => vec![
                (LABEL_KTY, Value::Integer(KTY_RSA as i128)),
                (LABEL_ALG, Value::Integer(alg.id() as i128)),
                (LABEL_RSA_N, Value::Bytes(n.clone())),
                (LABEL_RSA_E, Value::Bytes(e.clone())),
            ],
            Self::Okp { alg, x } => vec![
                (LABEL_KTY, Value::Integer(KTY_OKP as i128)),
                (LABEL_ALG, Value::Integer(alg.id() as i128)),
                (LABEL_CRV, Value::Integer(CRV_ED25519 as i128)),
                (LABEL_X, Value::Bytes(x.clone())),
            ],
        };

        let value = Value::Map(
            entries
                .into_iter()
                .map(|(label, v)| (Value::Integer(label as i128), v))
                .collect(),
        );

        let mut buf = Vec::new();
        cbor4ii::serde::to_writer(&mut buf, &value).map_err(|_| CoseError::InvalidCbor)?;
        Ok(buf)
    }

    /// The algorithm this key was declared with
    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            Self::Ec2 { alg, .. } | Self::Rsa { alg, .. } | Self::Okp { alg, .. } => *alg,
        }
    }

    /// Verify `signature` over `message` with this key
    ///
    /// The signature format and hash follow the key's declared algorithm:
    /// ASN.1 DER (r,s) for EC2, PKCS#1 v1.5 or PSS for RSA, raw 64 bytes for
    /// Ed25519. Any parse failure or mismatch is `InvalidSignature`; nothing
    /// falls through to an unverified success.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            Self::Ec2 {
                curve: EcCurve::P256,
                x,
                y,
                ..
            } => {
                use p256::ecdsa::signature::Verifier;

                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1_point(x, y))
                    .map_err(|_| CoseError::InvalidKeyMaterial("P-256 point"))?;
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| CoseError::InvalidSignature)?;
                key.verify(message, &sig)
                    .map_err(|_| CoseError::InvalidSignature)
            }
            Self::Ec2 {
                curve: EcCurve::P384,
                x,
                y,
                ..
            } => {
                use p384::ecdsa::signature::Verifier;

                let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(&sec1_point(x, y))
                    .map_err(|_| CoseError::InvalidKeyMaterial("P-384 point"))?;
                let sig = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| CoseError::InvalidSignature)?;
                key.verify(message, &sig)
                    .map_err(|_| CoseError::InvalidSignature)
            }
            Self::Rsa { alg, n, e } => {
                let key = rsa::RsaPublicKey::new(
                    rsa::BigUint::from_bytes_be(n),
                    rsa::BigUint::from_bytes_be(e),
                )
                .map_err(|_| CoseError::InvalidKeyMaterial("RSA parameters"))?;
                let hashed = Sha256::digest(message);
                let result = match alg {
                    CoseAlgorithm::Rs256 => {
                        key.verify(rsa::pkcs1v15::Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
                    }
                    CoseAlgorithm::Ps256 => {
                        key.verify(rsa::pss::Pss::new::<Sha256>(), &hashed, signature)
                    }
                    // Ruled out at decode time
                    _ => return Err(CoseError::AlgorithmMismatch),
                };
                result.map_err(|_| CoseError::InvalidSignature)
            }
            Self::Okp { x, .. } => {
                use ed25519_dalek::Verifier;

                let point: [u8; 32] = x
                    .as_slice()
                    .try_into()
                    .map_err(|_| CoseError::InvalidKeyMaterial("Ed25519 point length"))?;
                let key = ed25519_dalek::VerifyingKey::from_bytes(&point)
                    .map_err(|_| CoseError::InvalidKeyMaterial("Ed25519 point"))?;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| CoseError::InvalidSignature)?;
                key.verify(message, &sig)
                    .map_err(|_| CoseError::InvalidSignature)
            }
        }
    }
}

/// Uncompressed SEC1 point encoding (0x04 || x || y)
fn sec1_point(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut point = Vec::with_capacity(1 + x.len() + y.len());
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    use p256::ecdsa::signature::Signer;
    use rand::rngs::OsRng;

    fn p256_key_pair() -> (p256::ecdsa::SigningKey, CoseKey) {
        let signing = p256::ecdsa::SigningKey::random(&mut OsRng);
        let point = signing.verifying_key().to_encoded_point(false);
        let cose = CoseKey::Ec2 {
            alg: CoseAlgorithm::Es256,
            curve: EcCurve::P256,
            x: point.x().unwrap().to_vec(),
            y: point.y().unwrap().to_vec(),
        };
        (signing, cose)
    }

    #[test]
    fn test_ec2_verify() {
        let (signing, cose) = p256_key_pair();
        let message = b"authData || clientDataHash";
        let sig: p256::ecdsa::Signature = signing.sign(message);
        let der = sig.to_der();

        assert!(cose.verify(message, der.as_bytes()).is_ok());
        assert_eq!(
            cose.verify(b"different message", der.as_bytes()),
            Err(CoseError::InvalidSignature)
        );
    }

    #[test]
    fn test_ec2_garbage_signature() {
        let (_, cose) = p256_key_pair();
        assert_eq!(
            cose.verify(b"message", &[0u8; 70]),
            Err(CoseError::InvalidSignature)
        );
    }

    #[test]
    fn test_okp_verify() {
        use ed25519_dalek::Signer;

        let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let cose = CoseKey::Okp {
            alg: CoseAlgorithm::EdDsa,
            x: signing.verifying_key().to_bytes().to_vec(),
        };
        let message = b"authData || clientDataHash";
        let sig = signing.sign(message);

        assert!(cose.verify(message, &sig.to_bytes()).is_ok());
        assert!(cose.verify(b"other", &sig.to_bytes()).is_err());
    }

    #[test]
    fn test_round_trip_preserves_verification() {
        let (signing, cose) = p256_key_pair();
        let message = b"round trip";
        let sig: p256::ecdsa::Signature = signing.sign(message);
        let der = sig.to_der();

        let encoded = cose.to_cbor().unwrap();
        let decoded = CoseKey::from_cbor(&encoded).unwrap();
        assert_eq!(decoded, cose);
        assert!(decoded.verify(message, der.as_bytes()).is_ok());
    }

    #[test]
    fn test_decode_rejects_unknown_kty() {
        let key = CoseKey::Ec2 {
            alg: CoseAlgorithm::Es256,
            curve: EcCurve::P256,
            x: vec![1; 32],
            y: vec![2; 32],
        };
        let mut bytes = key.to_cbor().unwrap();
        // kty is the first entry: a1-prefixed map, label 0x01, value 0x02
        assert_eq!(bytes[1], 0x01);
        assert_eq!(bytes[2], 0x02);
        bytes[2] = 0x05; // no such key type
        assert_eq!(
            CoseKey::from_cbor(&bytes),
            Err(CoseError::UnsupportedKeyType(5))
        );
    }

    #[test]
    fn test_decode_rejects_alg_curve_mismatch() {
        // P-256 coordinates declared as ES384
        let forged = CoseKey::Ec2 {
            alg: CoseAlgorithm::Es384,
            curve: EcCurve::P256,
            x: vec![1; 32],
            y: vec![2; 32],
        };
        let bytes = forged.to_cbor().unwrap();
        assert_eq!(CoseKey::from_cbor(&bytes), Err(CoseError::AlgorithmMismatch));
    }

    #[test]
    fn test_decode_rejects_bad_coordinate_length() {
        let forged = CoseKey::Ec2 {
            alg: CoseAlgorithm::Es256,
            curve: EcCurve::P256,
            x: vec![1; 31],
            y: vec![2; 32],
        };
        let bytes = forged.to_cbor().unwrap();
        assert_eq!(
            CoseKey::from_cbor(&bytes),
            Err(CoseError::InvalidKeyMaterial("EC2 coordinate length"))
        );
    }

    #[test]
    fn test_decode_rejects_truncated_cbor() {
        let (_, cose) = p256_key_pair();
        let bytes = cose.to_cbor().unwrap();
        assert_eq!(
            CoseKey::from_cbor(&bytes[..bytes.len() - 5]),
            Err(CoseError::InvalidCbor)
        );
    }

    #[test]
    fn test_decode_canonical_vector() {
        // EC2/P-256 key from the packed attestation interop vector
        let bytes = hex::decode(concat!(
            "a50102032620012158",
            "2072f79312a0a618e199cffe1c1707771e805dce4e0817b134c44a4b1e4d1a04df",
            "225820bf7d1a1585a556d6bffbddca2aea94751326efa7ba36c3ca6e851b5e8ecbadf3",
        ))
        .unwrap();
        let key = CoseKey::from_cbor(&bytes).unwrap();
        match &key {
            CoseKey::Ec2 { alg, curve, x, y } => {
                assert_eq!(*alg, CoseAlgorithm::Es256);
                assert_eq!(*curve, EcCurve::P256);
                assert_eq!(x.len(), 32);
                assert_eq!(y.len(), 32);
            }
            other => panic!("expected EC2 key, got {other:?}"),
        }
    }
}
