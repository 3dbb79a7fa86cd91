//! Attestation object decoding and statement format verifiers
//!
//! The attestation object wraps authenticator data together with a statement
//! in one of an open set of formats. Formats are pluggable: implement
//! [`AttestationFormat`] and add it to a [`FormatRegistry`]; the orchestrator
//! dispatches on the decoded `fmt` string and fails with
//! `UnsupportedFormat` when no verifier is registered.
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/#sctn-attestation-formats>

use std::collections::BTreeMap;
use std::fmt;

use cbor4ii::core::Value;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::{self, statement_bytes, statement_certs, statement_has, statement_int};
use crate::error::{Result, VerifyError};
use crate::types::{AttestationTrust, VerifiedAttestation};

use webauthn_verify_cose::CoseKey;

const ES256_ID: i64 = -7;

/// Decoded attestation object
#[derive(Debug, Clone)]
pub struct AttestationObject {
    /// Statement format string (`"packed"`, `"none"`, ...)
    pub format: String,
    /// Parsed authenticator data
    pub auth_data: AuthenticatorData,
    /// Authenticator data exactly as signed
    pub raw_auth_data: Vec<u8>,
    /// Attestation statement, opaque to the orchestrator
    pub statement: Vec<(Value, Value)>,
}

impl AttestationObject {
    /// Decode an attestation object from CBOR bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let raw = cbor::RawAttestationObject::from_bytes(data)?;
        let auth_data = AuthenticatorData::from_bytes(&raw.auth_data)?;
        Ok(Self {
            format: raw.fmt,
            auth_data,
            raw_auth_data: raw.auth_data,
            statement: raw.att_stmt,
        })
    }
}

/// Whether packed statements without a certificate chain are acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfAttestationPolicy {
    /// Accept, reporting the result as [`AttestationTrust::SelfAttested`]
    #[default]
    Allow,
    /// Reject with `SelfAttestationRejected`
    Reject,
}

/// Everything a statement verifier may look at
pub struct StatementContext<'a> {
    /// Authenticator data exactly as signed
    pub raw_auth_data: &'a [u8],
    /// Parsed authenticator data
    pub auth_data: &'a AuthenticatorData,
    /// SHA-256 of the client data JSON
    pub client_data_hash: &'a [u8; 32],
    /// Self-attestation policy from the relying-party configuration
    pub self_attestation: SelfAttestationPolicy,
}

/// One attestation statement format
pub trait AttestationFormat: Send + Sync {
    /// The format string this verifier handles
    fn format(&self) -> &'static str;

    /// Validate the statement's signature over the data the format defines
    fn verify(
        &self,
        ctx: &StatementContext<'_>,
        statement: &[(Value, Value)],
    ) -> Result<VerifiedAttestation>;
}

/// Registry mapping format strings to verifiers
pub struct FormatRegistry {
    verifiers: BTreeMap<&'static str, Box<dyn AttestationFormat>>,
}

impl FormatRegistry {
    /// Registry with no formats; everything fails `UnsupportedFormat`
    pub fn empty() -> Self {
        Self {
            verifiers: BTreeMap::new(),
        }
    }

    /// Add or replace a format verifier
    pub fn register(&mut self, verifier: Box<dyn AttestationFormat>) {
        self.verifiers.insert(verifier.format(), verifier);
    }

    pub(crate) fn get(&self, format: &str) -> Option<&dyn AttestationFormat> {
        self.verifiers.get(format).map(|v| v.as_ref())
    }
}

impl Default for FormatRegistry {
    /// The built-in set: `none`, `packed`, `fido-u2f`
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(NoneFormat));
        registry.register(Box::new(PackedFormat));
        registry.register(Box::new(FidoU2fFormat));
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.verifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The "none" format: nothing to verify, and the result says so
pub struct NoneFormat;

impl AttestationFormat for NoneFormat {
    fn format(&self) -> &'static str {
        "none"
    }

    fn verify(
        &self,
        _ctx: &StatementContext<'_>,
        statement: &[(Value, Value)],
    ) -> Result<VerifiedAttestation> {
        if !statement.is_empty() {
            return Err(VerifyError::Decode("none format with non-empty statement"));
        }
        Ok(VerifiedAttestation {
            trust: AttestationTrust::None,
            attestation_certificate: None,
        })
    }
}

/// The "packed" format: `alg` + `sig` over `authData || clientDataHash`,
/// either certificate-backed (x5c) or self-attested
pub struct PackedFormat;

impl AttestationFormat for PackedFormat {
    fn format(&self) -> &'static str {
        "packed"
    }

    fn verify(
        &self,
        ctx: &StatementContext<'_>,
        statement: &[(Value, Value)],
    ) -> Result<VerifiedAttestation> {
        let alg = statement_int(statement, "alg")
            .ok_or(VerifyError::Decode("packed statement missing alg"))?;
        let sig = statement_bytes(statement, "sig")
            .ok_or(VerifyError::Decode("packed statement missing sig"))?;
        if statement_has(statement, "ecdaaKeyId") {
            return Err(VerifyError::UnsupportedFormat("packed (ecdaaKeyId)".into()));
        }

        let signed = signed_payload(ctx.raw_auth_data, ctx.client_data_hash);

        if let Some(certs) = statement_certs(statement, "x5c") {
            let leaf = *certs
                .first()
                .ok_or(VerifyError::Decode("packed x5c chain is empty"))?;
            if alg != ES256_ID {
                return Err(VerifyError::Decode(
                    "unsupported attestation certificate algorithm",
                ));
            }
            verify_with_certificate(leaf, &signed, sig)?;
            tracing::debug!("packed attestation verified against x5c leaf");
            return Ok(VerifiedAttestation {
                trust: AttestationTrust::Basic,
                attestation_certificate: Some(leaf.to_vec()),
            });
        }

        // Self-attestation: the statement is signed with the credential key
        if ctx.self_attestation == SelfAttestationPolicy::Reject {
            return Err(VerifyError::SelfAttestationRejected);
        }
        let attested = ctx
            .auth_data
            .attested_credential
            .as_ref()
            .ok_or(VerifyError::FlagPolicy("attested credential data"))?;
        if attested.public_key.algorithm().id() != alg {
            return Err(VerifyError::Format(
                "packed statement alg differs from credential key alg".into(),
            ));
        }
        attested.public_key.verify(&signed, sig)?;
        tracing::debug!("packed self-attestation verified with credential key");
        Ok(VerifiedAttestation {
            trust: AttestationTrust::SelfAttested,
            attestation_certificate: None,
        })
    }
}

/// The legacy "fido-u2f" format: reordered signed payload, certificate key
pub struct FidoU2fFormat;

impl AttestationFormat for FidoU2fFormat {
    fn format(&self) -> &'static str {
        "fido-u2f"
    }

    fn verify(
        &self,
        ctx: &StatementContext<'_>,
        statement: &[(Value, Value)],
    ) -> Result<VerifiedAttestation> {
        let sig = statement_bytes(statement, "sig")
            .ok_or(VerifyError::Decode("fido-u2f statement missing sig"))?;
        let certs = statement_certs(statement, "x5c")
            .ok_or(VerifyError::Decode("fido-u2f statement missing x5c"))?;
        let leaf = *certs
            .first()
            .ok_or(VerifyError::Decode("fido-u2f x5c chain is empty"))?;

        let attested = ctx
            .auth_data
            .attested_credential
            .as_ref()
            .ok_or(VerifyError::FlagPolicy("attested credential data"))?;
        let (x, y) = match &attested.public_key {
            CoseKey::Ec2 {
                curve: webauthn_verify_cose::EcCurve::P256,
                x,
                y,
                ..
            } => (x, y),
            _ => {
                return Err(VerifyError::Format(
                    "fido-u2f requires a P-256 credential key".into(),
                ))
            }
        };

        // U2F registration signature layout predates authenticator data
        let mut signed = Vec::with_capacity(1 + 32 + 32 + attested.credential_id.len() + 65);
        signed.push(0x00);
        signed.extend_from_slice(&ctx.auth_data.rp_id_hash);
        signed.extend_from_slice(ctx.client_data_hash);
        signed.extend_from_slice(&attested.credential_id);
        signed.push(0x04);
        signed.extend_from_slice(x);
        signed.extend_from_slice(y);

        verify_with_certificate(leaf, &signed, sig)?;
        tracing::debug!("fido-u2f attestation verified against x5c leaf");
        Ok(VerifiedAttestation {
            trust: AttestationTrust::Basic,
            attestation_certificate: Some(leaf.to_vec()),
        })
    }
}

/// `authData || clientDataHash`, the payload most formats sign
fn signed_payload(raw_auth_data: &[u8], client_data_hash: &[u8; 32]) -> Vec<u8> {
    let mut signed = Vec::with_capacity(raw_auth_data.len() + client_data_hash.len());
    signed.extend_from_slice(raw_auth_data);
    signed.extend_from_slice(client_data_hash);
    signed
}

/// Verify a DER ECDSA signature with the P-256 key of a DER certificate
fn verify_with_certificate(cert_der: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    use p256::ecdsa::signature::Verifier;

    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|_| VerifyError::Decode("malformed attestation certificate"))?;
    let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(
        cert.public_key().subject_public_key.data.as_ref(),
    )
    .map_err(|_| VerifyError::Decode("attestation certificate key is not P-256"))?;
    let sig =
        p256::ecdsa::Signature::from_der(signature).map_err(|_| VerifyError::SignatureInvalid)?;
    key.verify(message, &sig)
        .map_err(|_| VerifyError::SignatureInvalid)
}
