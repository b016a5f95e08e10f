//! Tests for memorial profile validation and wire shape.

use chrono::NaiveDate;
use memoria_core::MemorialProfile;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_profile_serializes_camel_case_iso_dates() {
    let profile = MemorialProfile::new("Bori", date("2010-03-14"), date("2024-06-01")).unwrap();
    let json = serde_json::to_value(&profile).unwrap();

    assert_eq!(json["name"], "Bori");
    assert_eq!(json["birthDate"], "2010-03-14");
    assert_eq!(json["passDate"], "2024-06-01");
}

#[test]
fn test_profile_rejects_blank_name() {
    assert!(MemorialProfile::new("   ", date("2010-03-14"), date("2024-06-01")).is_err());
}

#[test]
fn test_profile_rejects_reversed_dates() {
    let err = MemorialProfile::new("Bori", date("2024-06-01"), date("2010-03-14")).unwrap_err();
    assert!(err.message.contains("precedes"));
}

#[test]
fn test_deserialized_profile_can_be_validated() {
    let profile: MemorialProfile = serde_json::from_str(
        r#"{"name":"Bori","birthDate":"2024-06-01","passDate":"2010-03-14"}"#,
    )
    .unwrap();
    assert!(profile.validate().is_err());
}
