mod common;

use chrono::{Duration, Utc};
use common::{acme_payload_at, acme_request, issued_at, sign_payload, test_keypair};
use signet_license::{
    LicenseError, PortableLicense, check_fingerprint, generate_key_pair, sign, verify, verify_license,
};

#[test]
fn sign_verify_roundtrip() {
    let (private, public) = test_keypair();
    let payload = acme_payload_at(issued_at());
    let bytes = payload.canonical_bytes().unwrap();
    let signature = sign(&bytes, &private);
    assert!(verify(&bytes, &signature, public.as_bytes()).unwrap());
}

#[test]
fn different_payload_fails() {
    let (private, public) = test_keypair();
    let a = acme_payload_at(issued_at()).canonical_bytes().unwrap();
    let mut other = acme_payload_at(issued_at());
    other.seats = 51;
    let b = other.canonical_bytes().unwrap();
    assert_ne!(a, b);

    let signature = sign(&a, &private);
    assert!(!verify(&b, &signature, public.as_bytes()).unwrap());
}

#[test]
fn other_public_key_fails() {
    let (private, _) = test_keypair();
    let (other_public, _) = generate_key_pair().unwrap();
    let signature = sign(b"bytes", &private);
    assert!(!verify(b"bytes", &signature, other_public.as_bytes()).unwrap());
}

#[test]
fn deterministic_signatures() {
    let (private, _) = test_keypair();
    let bytes = acme_payload_at(issued_at()).canonical_bytes().unwrap();
    assert_eq!(sign(&bytes, &private), sign(&bytes, &private));
}

#[test]
fn malformed_lengths_are_errors_not_false() {
    let (private, public) = test_keypair();
    let signature = sign(b"bytes", &private);
    assert!(matches!(
        verify(b"bytes", &signature[..32], public.as_bytes()),
        Err(LicenseError::MalformedInput(_))
    ));
    assert!(matches!(
        verify(b"bytes", &signature, &public.as_bytes()[..16]),
        Err(LicenseError::MalformedInput(_))
    ));
}

// ── Scenarios ────────────────────────────────────────────────────

#[test]
fn acme_scenario_verifies_and_decodes() {
    let (public, private) = generate_key_pair().unwrap();
    let payload = acme_request().validate().unwrap().into_payload(Utc::now()).unwrap();
    let license = sign_payload(&private, &payload);

    let report = verify_license(&license, public.as_bytes(), Utc::now()).unwrap();
    assert!(report.signature_valid);
    assert!(!report.expired);
    assert!(report.is_valid());

    let decoded = report.payload.unwrap();
    assert_eq!(decoded["edition"], "Pro");
    assert_eq!(decoded["seats"], 50);
    assert_eq!(decoded["kid"], "prod-2025");
}

#[test]
fn bit_flip_is_signature_failure_not_parse_failure() {
    let (private, public) = test_keypair();
    let license = sign_payload(&private, &acme_payload_at(Utc::now()));

    let mut tampered = license.clone();
    // "Pro" -> "Prn": still JSON, still decodes.
    let pos = tampered
        .payload
        .windows(5)
        .position(|w| w == b"\"Pro\"")
        .unwrap();
    tampered.payload[pos + 3] ^= 0x01;

    let file = tampered.encode();
    let decoded = PortableLicense::decode(&file).unwrap();
    let report = verify_license(&decoded, public.as_bytes(), Utc::now()).unwrap();
    assert!(!report.signature_valid);
    assert!(report.payload.is_some());
}

#[test]
fn expired_license_keeps_valid_signature() {
    let (private, public) = test_keypair();
    let payload = acme_payload_at(Utc::now() - Duration::days(400));
    let license = sign_payload(&private, &payload);

    let report = verify_license(&license, public.as_bytes(), Utc::now()).unwrap();
    assert!(report.signature_valid);
    assert!(report.expired);
    assert!(!report.is_valid());
}

#[test]
fn non_json_payload_reports_expired() {
    let (private, public) = test_keypair();
    let signature = sign(b"not json", &private);
    let license = PortableLicense::new(b"not json".to_vec(), signature.to_vec());
    let report = verify_license(&license, public.as_bytes(), Utc::now()).unwrap();
    assert!(report.signature_valid);
    assert!(report.expired);
    assert!(report.payload.is_none());
}

#[test]
fn fingerprint_check_is_separate_and_case_insensitive() {
    let payload = acme_payload_at(issued_at());
    assert!(check_fingerprint(&payload, "A1B2C3D4E5F60718"));
    assert!(!check_fingerprint(&payload, "0000000000000000"));
}
