use signet_license::LicenseError;

#[test]
fn error_display_validation() {
    let err = LicenseError::Validation("seats must be at least 1".into());
    let msg = format!("{err}");
    assert!(msg.contains("validation failed"));
    assert!(msg.contains("seats"));
}

#[test]
fn error_display_malformed_input() {
    let err = LicenseError::MalformedInput("short key".into());
    assert!(format!("{err}").contains("malformed input"));
}

#[test]
fn error_display_malformed_file() {
    let err = LicenseError::MalformedFile("expected 2 lines".into());
    assert!(format!("{err}").contains("malformed license file"));
}

#[test]
fn error_display_key_generation() {
    let err = LicenseError::KeyGeneration("rng".into());
    assert!(format!("{err}").contains("key generation failed"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let license_err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{license_err}").contains("serialization"));
}

#[test]
fn error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: LicenseError = io.into();
    assert!(format!("{err}").contains("IO error"));
}
