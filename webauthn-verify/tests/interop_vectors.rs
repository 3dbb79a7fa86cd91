//! End-to-end verification against captured interop vectors
//!
//! The fixtures are a real packed self-attestation registration and a
//! follow-up assertion from the same credential, captured from a browser
//! session against https://example.org. The authenticator scoped the
//! credential to the full origin string, so the relying party ID here is
//! the origin itself.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use webauthn_verify::{
    AssertionRequest, AttestationRequest, AttestationTrust, RelyingParty, SelfAttestationPolicy,
    StoredCredential, VerifyError, VerifyPolicy,
};

const RP_ID: &str = "https://example.org";
const ORIGIN: &str = "https://example.org";
const CHALLENGE: &str = "rtnHiVQ7";
const RAW_ID: &str = "uRH__GRxQYe_Q5cCSlgYug";

const ATTESTATION_CLIENT_DATA: &str = "eyJ0eXBlIjoid2ViYXV0aG4uY3JlYXRlIiwiY2hhbGxlbmdlIjoicnRuSGlWUTciLCJvcmlnaW4iOiJodHRwczpcL1wvZXhhbXBsZS5vcmcifQ";
const ATTESTATION_OBJECT: &str = "o2hhdXRoRGF0YViUUNepBeMEa4hjg2LMNKMaGuU0dmylXjqjl5Ue_mU7BitBAAAAAAAAAAAAAAAAAAAAAAAAAAAAELkR__xkcUGHv0OXAkpYGLqlAQIDJiABIVggcveTEqCmGOGZz_4cFwd3HoBdzk4IF7E0xEpLHk0aBN8iWCC_fRoVhaVW1r_73coq6pR1Eybvp7o2w8puhRtejsut82NmbXRmcGFja2VkZ2F0dFN0bXSiY2FsZyZjc2lnWEYwRAIgbrC6c2l6VcttVxNLeOd3q-Og4nlnTMxo33TrnoX2ki8CIDgFh5YlhPSEw-h2joSrfD4eiBYplFw_izUI2iQryqcu";

const ASSERTION_CLIENT_DATA: &str = "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0IiwiY2hhbGxlbmdlIjoicnRuSGlWUTciLCJvcmlnaW4iOiJodHRwczpcL1wvZXhhbXBsZS5vcmcifQ";
const ASSERTION_AUTH_DATA: &str = "UNepBeMEa4hjg2LMNKMaGuU0dmylXjqjl5Ue_mU7BisBAAAAAQ";
const ASSERTION_SIGNATURE: &str = "MEUCIQDHv3C_QjqX_0UerM3sB0NbusD5RMp3QpK5OqGyk-6U-wIgBLEGrtF64i3N2S6q9x_JRLjCcAguwjoZ_SbCp2g2F08";
const USER_HANDLE: &str = "bHlva2F0bw";

fn b64(data: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD.decode(data).unwrap()
}

fn challenge() -> Vec<u8> {
    b64(CHALLENGE)
}

fn attestation_request() -> AttestationRequest {
    AttestationRequest {
        raw_id: b64(RAW_ID),
        client_data_json: b64(ATTESTATION_CLIENT_DATA),
        attestation_object: b64(ATTESTATION_OBJECT),
    }
}

fn assertion_request() -> AssertionRequest {
    AssertionRequest {
        raw_id: b64(RAW_ID),
        client_data_json: b64(ASSERTION_CLIENT_DATA),
        authenticator_data: b64(ASSERTION_AUTH_DATA),
        signature: b64(ASSERTION_SIGNATURE),
        user_handle: Some(b64(USER_HANDLE)),
    }
}

#[test]
fn attestation_vector_verifies() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let result = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();

    assert_eq!(result.credential_id, b64(RAW_ID));
    assert_eq!(result.format, "packed");
    assert_eq!(result.trust, AttestationTrust::SelfAttested);
    assert!(result.attestation_certificate.is_none());
    assert_eq!(result.sign_count, 0);
    assert_eq!(result.aaguid, [0u8; 16]);
    assert!(!result.user_verified);
}

#[test]
fn registration_then_assertion_chain() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: attestation.sign_count,
    };

    let result = rp
        .verify_assertion(&assertion_request(), &challenge(), &stored)
        .unwrap();
    assert_eq!(result.sign_count, 1);
    assert!(!result.user_verified);
    assert_eq!(result.user_handle.unwrap(), b"lyokato");
}

#[test]
fn persisted_key_bytes_round_trip() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();

    // a caller that stores public_key_cbor must get the same key back
    let decoded = webauthn_verify::CoseKey::from_cbor(&attestation.public_key_cbor).unwrap();
    assert_eq!(decoded, attestation.public_key);

    let stored = StoredCredential {
        public_key: decoded,
        sign_count: 0,
    };
    assert!(rp
        .verify_assertion(&assertion_request(), &challenge(), &stored)
        .is_ok());
}

#[test]
fn attestation_rejects_wrong_challenge() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    assert_eq!(
        rp.verify_attestation(&attestation_request(), &b64("rtnHiVQ8")),
        Err(VerifyError::ChallengeMismatch)
    );
}

#[test]
fn attestation_rejects_wrong_origin() {
    let rp = RelyingParty::new(RP_ID, "https://example.org/");
    assert!(matches!(
        rp.verify_attestation(&attestation_request(), &challenge()),
        Err(VerifyError::OriginMismatch { .. })
    ));
}

#[test]
fn attestation_rejects_wrong_rp_id() {
    // bare domain hashes differently from the origin the credential is scoped to
    let rp = RelyingParty::new("example.org", ORIGIN);
    assert_eq!(
        rp.verify_attestation(&attestation_request(), &challenge()),
        Err(VerifyError::RpIdMismatch)
    );
}

#[test]
fn attestation_honors_user_verification_policy() {
    let rp = RelyingParty::new(RP_ID, ORIGIN).with_policy(VerifyPolicy {
        require_user_verification: true,
        ..VerifyPolicy::default()
    });
    assert_eq!(
        rp.verify_attestation(&attestation_request(), &challenge()),
        Err(VerifyError::FlagPolicy("user verification"))
    );
}

#[test]
fn attestation_honors_self_attestation_policy() {
    let rp = RelyingParty::new(RP_ID, ORIGIN).with_policy(VerifyPolicy {
        self_attestation: SelfAttestationPolicy::Reject,
        ..VerifyPolicy::default()
    });
    assert_eq!(
        rp.verify_attestation(&attestation_request(), &challenge()),
        Err(VerifyError::SelfAttestationRejected)
    );
}

#[test]
fn attestation_rejects_every_single_byte_corruption() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let pristine = attestation_request();

    for i in 0..pristine.attestation_object.len() {
        let mut request = pristine.clone();
        request.attestation_object[i] ^= 0x01;
        assert!(
            rp.verify_attestation(&request, &challenge()).is_err(),
            "byte {i} flipped but verification still succeeded"
        );
    }
}

#[test]
fn attestation_rejects_truncation() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let pristine = attestation_request();

    for len in [0, 1, pristine.attestation_object.len() - 1] {
        let mut request = pristine.clone();
        request.attestation_object.truncate(len);
        assert!(rp.verify_attestation(&request, &challenge()).is_err());
    }
}

#[test]
fn assertion_rejects_corrupted_signature() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: 0,
    };

    let mut request = assertion_request();
    let last = request.signature.len() - 1;
    request.signature[last] ^= 0x01;
    assert_eq!(
        rp.verify_assertion(&request, &challenge(), &stored),
        Err(VerifyError::SignatureInvalid)
    );
}

#[test]
fn assertion_rejects_corrupted_authenticator_data() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: 0,
    };

    let pristine = assertion_request();
    for i in 0..pristine.authenticator_data.len() {
        let mut request = pristine.clone();
        request.authenticator_data[i] ^= 0x01;
        assert!(
            rp.verify_assertion(&request, &challenge(), &stored).is_err(),
            "byte {i} flipped but verification still succeeded"
        );
    }
}

#[test]
fn assertion_rejects_corrupted_client_data() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: 0,
    };

    // any change to the JSON shifts its hash, breaks the binding, or both
    let pristine = assertion_request();
    for i in 0..pristine.client_data_json.len() {
        let mut request = pristine.clone();
        request.client_data_json[i] ^= 0x01;
        assert!(
            rp.verify_assertion(&request, &challenge(), &stored).is_err(),
            "byte {i} flipped but verification still succeeded"
        );
    }
}

#[test]
fn assertion_rejects_counter_regression() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: 5,
    };

    assert_eq!(
        rp.verify_assertion(&assertion_request(), &challenge(), &stored),
        Err(VerifyError::CounterRegression {
            stored: 5,
            asserted: 1
        })
    );
}

#[test]
fn assertion_rejects_replayed_registration_client_data() {
    let rp = RelyingParty::new(RP_ID, ORIGIN);
    let attestation = rp
        .verify_attestation(&attestation_request(), &challenge())
        .unwrap();
    let stored = StoredCredential {
        public_key: attestation.public_key,
        sign_count: 0,
    };

    // webauthn.create client data presented during authentication
    let mut request = assertion_request();
    request.client_data_json = b64(ATTESTATION_CLIENT_DATA);
    assert!(matches!(
        rp.verify_assertion(&request, &challenge(), &stored),
        Err(VerifyError::Format(_))
    ));
}
