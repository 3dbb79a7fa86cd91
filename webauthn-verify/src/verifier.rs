//! Ceremony orchestration
//!
//! [`RelyingParty`] drives both ceremonies through a fixed check order,
//! short-circuiting on the first failure:
//!
//! 1. attestation object / authenticator data decode
//! 2. client data parse and binding (type, challenge, origin)
//! 3. RP ID hash comparison
//! 4. flag policy (UP always, UV when configured)
//! 5. credential consistency (registration only)
//! 6. signature verification
//! 7. sign count (authentication only)
//!
//! Signature verification never runs on inputs that failed an earlier check.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::assertion::{self, SignCountPolicy};
use crate::attestation::{
    AttestationObject, FormatRegistry, SelfAttestationPolicy, StatementContext,
};
use crate::client_data::{ClientData, ClientDataKind};
use crate::error::{Result, VerifyError};
use crate::types::{AssertionResult, AttestationResult, StoredCredential};

/// Tunable checks; defaults match the common single-factor deployment
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyPolicy {
    /// Require the UV flag in addition to UP
    pub require_user_verification: bool,
    /// Packed statements without a certificate chain
    pub self_attestation: SelfAttestationPolicy,
    /// Counter handling for authenticators without one
    pub sign_count: SignCountPolicy,
}

/// Registration response as received from the client
#[derive(Debug, Clone)]
pub struct AttestationRequest {
    /// Credential ID the client reported
    pub raw_id: Vec<u8>,
    /// UTF-8 client data JSON, exactly as hashed by the client
    pub client_data_json: Vec<u8>,
    /// CBOR attestation object
    pub attestation_object: Vec<u8>,
}

/// Authentication response as received from the client
#[derive(Debug, Clone)]
pub struct AssertionRequest {
    /// Credential ID the client reported
    pub raw_id: Vec<u8>,
    /// UTF-8 client data JSON, exactly as hashed by the client
    pub client_data_json: Vec<u8>,
    /// Raw authenticator data, exactly as signed
    pub authenticator_data: Vec<u8>,
    /// Assertion signature
    pub signature: Vec<u8>,
    /// User handle, when the authenticator returned one
    pub user_handle: Option<Vec<u8>>,
}

/// A configured relying party; immutable and shareable across threads
pub struct RelyingParty {
    id: String,
    origin: String,
    policy: VerifyPolicy,
    registry: FormatRegistry,
}

impl RelyingParty {
    /// Relying party with default policy and the built-in format set
    pub fn new(id: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            policy: VerifyPolicy::default(),
            registry: FormatRegistry::default(),
        }
    }

    /// Replace the verification policy
    pub fn with_policy(mut self, policy: VerifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the attestation format registry
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The configured relying party ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The configured origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Verify a registration response against the issued challenge
    pub fn verify_attestation(
        &self,
        request: &AttestationRequest,
        expected_challenge: &[u8],
    ) -> Result<AttestationResult> {
        let object = AttestationObject::from_bytes(&request.attestation_object)?;

        let client_data = ClientData::from_json_bytes(&request.client_data_json)?;
        client_data.check_binding(ClientDataKind::Create, expected_challenge, &self.origin)?;

        self.check_rp_id_hash(&object.auth_data.rp_id_hash)?;
        self.check_flags(object.auth_data.flags.bits())?;

        let attested = object
            .auth_data
            .attested_credential
            .as_ref()
            .ok_or(VerifyError::FlagPolicy("attested credential data"))?;
        if request.raw_id != attested.credential_id {
            return Err(VerifyError::CredentialIdMismatch);
        }

        let client_data_hash: [u8; 32] = Sha256::digest(&request.client_data_json).into();
        let verifier = self
            .registry
            .get(&object.format)
            .ok_or_else(|| VerifyError::UnsupportedFormat(object.format.clone()))?;
        let ctx = StatementContext {
            raw_auth_data: &object.raw_auth_data,
            auth_data: &object.auth_data,
            client_data_hash: &client_data_hash,
            self_attestation: self.policy.self_attestation,
        };
        let verified = verifier.verify(&ctx, &object.statement)?;

        tracing::debug!(
            format = %object.format,
            trust = ?verified.trust,
            sign_count = object.auth_data.sign_count,
            "attestation verified"
        );
        Ok(AttestationResult {
            credential_id: attested.credential_id.clone(),
            aaguid: attested.aaguid,
            public_key: attested.public_key.clone(),
            public_key_cbor: attested.raw_public_key.clone(),
            sign_count: object.auth_data.sign_count,
            format: object.format,
            trust: verified.trust,
            attestation_certificate: verified.attestation_certificate,
            user_verified: object.auth_data.flags.user_verified(),
        })
    }

    /// Verify an authentication response against the issued challenge and the
    /// stored credential state
    pub fn verify_assertion(
        &self,
        request: &AssertionRequest,
        expected_challenge: &[u8],
        stored: &StoredCredential,
    ) -> Result<AssertionResult> {
        let auth_data =
            crate::authenticator_data::AuthenticatorData::from_bytes(&request.authenticator_data)?;

        let client_data = ClientData::from_json_bytes(&request.client_data_json)?;
        client_data.check_binding(ClientDataKind::Get, expected_challenge, &self.origin)?;

        self.check_rp_id_hash(&auth_data.rp_id_hash)?;
        self.check_flags(auth_data.flags.bits())?;

        let client_data_hash: [u8; 32] = Sha256::digest(&request.client_data_json).into();
        assertion::verify_signature(
            stored,
            &request.authenticator_data,
            &client_data_hash,
            &request.signature,
        )?;

        let sign_count = assertion::check_sign_count(
            self.policy.sign_count,
            stored.sign_count,
            auth_data.sign_count,
        )?;

        tracing::debug!(sign_count, "assertion verified");
        Ok(AssertionResult {
            sign_count,
            user_verified: auth_data.flags.user_verified(),
            user_handle: request.user_handle.clone(),
        })
    }

    fn check_rp_id_hash(&self, rp_id_hash: &[u8; 32]) -> Result<()> {
        let expected: [u8; 32] = Sha256::digest(self.id.as_bytes()).into();
        if !bool::from(expected.ct_eq(rp_id_hash)) {
            return Err(VerifyError::RpIdMismatch);
        }
        Ok(())
    }

    fn check_flags(&self, flags: u8) -> Result<()> {
        use crate::authenticator_data::AuthenticatorFlags;

        if flags & AuthenticatorFlags::USER_PRESENT == 0 {
            return Err(VerifyError::FlagPolicy("user presence"));
        }
        if self.policy.require_user_verification && flags & AuthenticatorFlags::USER_VERIFIED == 0 {
            return Err(VerifyError::FlagPolicy("user verification"));
        }
        Ok(())
    }
}
