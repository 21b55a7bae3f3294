mod common;

use chrono::Duration;
use common::{acme_request, issued_at};
use signet_license::{Edition, LicenseError, MAX_VALIDITY_DAYS, validate_fingerprint};

// ── Fingerprints ─────────────────────────────────────────────────

#[test]
fn fingerprint_accepts_sixteen_hex_chars() {
    assert!(validate_fingerprint("a1b2c3d4e5f60718"));
    assert!(validate_fingerprint("A1B2C3D4E5F60718"));
    assert!(validate_fingerprint("0123456789abcdef"));
}

#[test]
fn fingerprint_rejects_wrong_lengths() {
    assert!(!validate_fingerprint("a1b2c3d4e5f6071"));
    assert!(!validate_fingerprint("a1b2c3d4e5f607189"));
    assert!(!validate_fingerprint(""));
}

#[test]
fn fingerprint_rejects_non_hex() {
    assert!(!validate_fingerprint("a1b2c3d4e5f6071g"));
    assert!(!validate_fingerprint("a1b2c3d4e5f6071 "));
    assert!(!validate_fingerprint("a1b2-3d4e5f60718"));
    // 16 bytes, but not 16 ASCII hex characters.
    assert!(!validate_fingerprint("a1b2c3d4e5f607é"));
}

// ── Requests ─────────────────────────────────────────────────────

#[test]
fn valid_request_passes() {
    let validated = acme_request().validate().unwrap();
    assert_eq!(validated.edition, Edition::Pro);
    assert_eq!(validated.seats, 50);
    assert_eq!(validated.validity_days, 365);
}

#[test]
fn validity_days_bounds() {
    for days in [0, -1, i64::from(MAX_VALIDITY_DAYS) + 1, i64::MAX] {
        let mut req = acme_request();
        req.validity_days = days;
        assert!(matches!(req.validate(), Err(LicenseError::Validation(_))), "days = {days}");
    }
    for days in [1, 3650] {
        let mut req = acme_request();
        req.validity_days = days;
        assert!(req.validate().is_ok(), "days = {days}");
    }
}

#[test]
fn seats_must_be_positive() {
    let mut req = acme_request();
    req.seats = 0;
    assert!(req.validate().is_err());
    req.seats = -3;
    assert!(req.validate().is_err());
}

#[test]
fn unknown_edition_rejected() {
    let mut req = acme_request();
    req.edition = "Gold".into();
    let err = req.validate().unwrap_err();
    assert!(format!("{err}").contains("edition"));
}

#[test]
fn customer_required_and_bounded() {
    let mut req = acme_request();
    req.customer = "   ".into();
    assert!(req.validate().is_err());
    req.customer = "x".repeat(256);
    assert!(req.validate().is_err());
    req.customer = "x".repeat(255);
    assert!(req.validate().is_ok());
}

#[test]
fn bad_fingerprint_rejected() {
    let mut req = acme_request();
    req.fingerprint_id = "a1b2c3d4e5f6071".into();
    assert!(req.validate().is_err());
}

#[test]
fn blank_notes_become_none() {
    let mut req = acme_request();
    req.notes = Some("  ".into());
    assert_eq!(req.validate().unwrap().notes, None);
}

// ── Payload construction ─────────────────────────────────────────

#[test]
fn payload_expiry_follows_validity_days() {
    let payload = acme_request().validate().unwrap().into_payload(issued_at()).unwrap();
    assert!(payload.expires > payload.issued_at);
    assert_eq!(payload.expires - payload.issued_at, Duration::days(365));
    assert_eq!(payload.fingerprint_id(), "a1b2c3d4e5f60718");
}

#[test]
fn payload_truncates_subseconds() {
    let at = issued_at() + Duration::milliseconds(750);
    let payload = acme_request().validate().unwrap().into_payload(at).unwrap();
    assert_eq!(payload.issued_at, issued_at());
}
