//! Tests for the memorial profile record.

use chrono::NaiveDate;
use memoria_core::MemorialProfile;
use memoria_storage::ProfileStore;
use std::time::Duration;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_missing_profile_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let store = ProfileStore::new(temp_dir.path(), Duration::from_secs(5));
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_last_write_wins() {
    let temp_dir = TempDir::new().unwrap();
    let store = ProfileStore::new(temp_dir.path(), Duration::from_secs(5));

    let first = MemorialProfile::new("Bori", date("2010-03-14"), date("2024-06-01")).unwrap();
    let second = MemorialProfile::new("Bori Kim", date("2010-03-15"), date("2024-06-01")).unwrap();
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    assert_eq!(store.load().await.unwrap(), Some(second));

    let raw = tokio::fs::read_to_string(temp_dir.path().join("memorial.json"))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["birthDate"], "2010-03-15");
}
