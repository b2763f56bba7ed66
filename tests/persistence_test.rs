use chrono::Utc;
use proptest::prelude::*;
use std::path::PathBuf;
use tempfile::tempdir;
use tokio::io::AsyncWriteExt;
use youdownload::queue::{ErrorLog, ErrorRecord};
use youdownload::utils::{AppSettings, VideoQuality};

fn record(source: &str, attempts: u32, error: &str) -> ErrorRecord {
    ErrorRecord {
        timestamp: Utc::now(),
        batch_id: "batch-1".to_string(),
        source: source.to_string(),
        attempts,
        error: error.to_string(),
    }
}

#[tokio::test]
async fn test_error_log_survives_reopen() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("logs").join("error_log.jsonl");

    // Previous session
    {
        let log = ErrorLog::open(&path).await.expect("Failed to open log");
        log.append(&record("https://youtu.be/aaaaaaaaaaa", 3, "Connection reset"))
            .await
            .unwrap();
    }

    let log = ErrorLog::open(&path).await.expect("Failed to reopen log");
    log.append(&record("https://youtu.be/bbbbbbbbbbb", 1, "Video unavailable"))
        .await
        .unwrap();

    let records = log.read_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source, "https://youtu.be/aaaaaaaaaaa");
    assert_eq!(records[0].attempts, 3);
    assert_eq!(records[1].error, "Video unavailable");
}

#[tokio::test]
async fn test_error_log_skips_corrupt_lines() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("error_log.jsonl");

    let log = ErrorLog::open(&path).await.unwrap();
    log.append(&record("first", 2, "timed out")).await.unwrap();

    // Simulate a torn write from a crashed session
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .await
        .unwrap();
    file.write_all(b"{\"timestamp\": \"not a date\"\n\n")
        .await
        .unwrap();
    file.flush().await.unwrap();
    drop(file);

    log.append(&record("second", 1, "HTTP Error 403")).await.unwrap();

    let records = log.read_records().await.unwrap();
    let sources: Vec<_> = records.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["first", "second"]);
}

#[test]
fn test_settings_save_then_load() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config").join("settings.json");

    let settings = AppSettings {
        download_location: PathBuf::from("/tmp/videos"),
        quality: VideoQuality::MaxHeight(480),
        retry_attempts: 5,
        retry_delay_secs: 2,
        ..AppSettings::default()
    };
    settings.save(&path).unwrap();

    let loaded = AppSettings::load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_corrupt_settings_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(AppSettings::load(&path).is_err());
}

fn quality_strategy() -> impl Strategy<Value = VideoQuality> {
    prop_oneof![
        Just(VideoQuality::Best),
        Just(VideoQuality::AudioOnly),
        (1u32..4320).prop_map(VideoQuality::MaxHeight),
    ]
}

proptest! {
    #[test]
    fn prop_settings_round_trip_is_stable(
        quality in quality_strategy(),
        retry_attempts in 1u32..20,
        retry_delay_secs in 0u64..600,
        chunk_size in 1u64..(64 * 1024 * 1024),
        internal_retries in 0u32..50,
        folder in "[a-z]{1,12}",
    ) {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let settings = AppSettings {
            download_location: temp_dir.path().join(folder),
            quality,
            retry_attempts,
            retry_delay_secs,
            chunk_size,
            internal_retries,
        };

        settings.save(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        let loaded = AppSettings::load(&path).unwrap();
        prop_assert_eq!(&loaded, &settings);

        // Saving what was loaded writes the same bytes
        loaded.save(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        prop_assert_eq!(first, second);
    }
}
