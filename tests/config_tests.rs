use staged_deletion::{DeletionError, Interval, WorkflowConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "interval_until_staging": "2 weeks",
            "interval_before_deletion": "P10D",
            "renotify_after": "1 week",
            "auto_delete_enabled": false,
            "utc_offset_minutes": -300,
            "staging_area": "quarantine",
            "sweep_interval_secs": 60
        }}"#
    )
    .unwrap();

    let config = WorkflowConfig::load(file.path()).await.unwrap();
    assert_eq!(config.interval_until_staging, Interval::weeks(2));
    assert_eq!(config.interval_before_deletion, Interval::days(10));
    assert_eq!(config.default_lead_time, Interval::years(1));
    assert_eq!(config.renotify_after, Some(Interval::weeks(1)));
    assert!(!config.auto_delete_enabled);
    assert_eq!(config.staging_area, "quarantine");
    assert_eq!(config.sweep_interval_duration(), Duration::from_secs(60));

    let policy = config.policy().unwrap();
    assert_eq!(policy.renotify_after(), Interval::weeks(1));
    assert!(!policy.auto_delete_enabled());
    assert_eq!(policy.calendar().offset().local_minus_utc(), -300 * 60);
}

#[tokio::test]
async fn test_load_rejects_invalid_config() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "interval_before_deletion": "-1 month" }}"#).unwrap();

    let err = WorkflowConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(err, DeletionError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_load_reports_bad_interval() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "default_lead_time": "fortnight" }}"#).unwrap();

    let err = WorkflowConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(err, DeletionError::Json(_)));
}

#[tokio::test]
async fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = WorkflowConfig::load(dir.path().join("absent.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeletionError::Io(_)));
}
