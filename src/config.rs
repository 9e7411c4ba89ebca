use crate::calendar::{Calendar, Interval};
use crate::core::{DeletionError, Result};
use crate::workflow::DeletionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Deletion workflow configuration
///
/// Intervals are written as strings, either ISO-8601 (`"P3W"`) or plain
/// English (`"3 weeks"`). Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Time between the notification mail and the move to the staging area
    pub interval_until_staging: Interval,

    /// Time a resource spends in the staging area before deletion
    pub interval_before_deletion: Interval,

    /// End date given to newly registered resources, counted from registration
    pub default_lead_time: Interval,

    /// How far past the staging deadline a requested date must be for a
    /// notified resource to restart at phase 1. Defaults to
    /// `interval_until_staging`.
    pub renotify_after: Option<Interval>,

    /// Delete staged resources once their end date passes
    pub auto_delete_enabled: bool,

    /// Offset from UTC, in minutes, that defines local midnight
    pub utc_offset_minutes: i32,

    /// Name of the quarantine area resources are moved to
    pub staging_area: String,

    /// Seconds between background sweeps
    pub sweep_interval_secs: u64,
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self {
            interval_until_staging: Interval::weeks(3),
            interval_before_deletion: Interval::months(1),
            default_lead_time: Interval::years(1),
            renotify_after: None,
            auto_delete_enabled: true,
            utc_offset_minutes: 0,
            staging_area: "trash".to_string(),
            sweep_interval_secs: 3600,
        }
    }

    /// Set the lead time between notification and staging
    pub fn interval_until_staging(mut self, interval: Interval) -> Self {
        self.interval_until_staging = interval;
        self
    }

    /// Set the time spent in the staging area
    pub fn interval_before_deletion(mut self, interval: Interval) -> Self {
        self.interval_before_deletion = interval;
        self
    }

    /// Set the initial lead time of new resources
    pub fn default_lead_time(mut self, interval: Interval) -> Self {
        self.default_lead_time = interval;
        self
    }

    pub fn renotify_after(mut self, interval: Interval) -> Self {
        self.renotify_after = Some(interval);
        self
    }

    pub fn auto_delete(mut self, enabled: bool) -> Self {
        self.auto_delete_enabled = enabled;
        self
    }

    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn staging_area(mut self, name: &str) -> Self {
        self.staging_area = name.to_string();
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_secs = interval.as_secs();
        self
    }

    pub fn sweep_interval_duration(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Parse from JSON
    ///
    /// # Examples
    ///
    /// ```
    /// # use staged_deletion::WorkflowConfig;
    /// let config = WorkflowConfig::from_json(
    ///     r#"{ "interval_until_staging": "2 weeks", "auto_delete_enabled": false }"#
    /// ).unwrap();
    /// assert!(!config.auto_delete_enabled);
    /// ```
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let lead_times = [
            ("interval_until_staging", self.interval_until_staging),
            ("interval_before_deletion", self.interval_before_deletion),
            ("default_lead_time", self.default_lead_time),
        ];
        for (name, interval) in lead_times {
            if !interval.is_positive() {
                return Err(DeletionError::InvalidConfig(format!(
                    "{} must be a positive interval, got {}",
                    name, interval
                )));
            }
        }

        if let Some(threshold) = self.renotify_after {
            if !threshold.is_positive() {
                return Err(DeletionError::InvalidConfig(format!(
                    "renotify_after must be a positive interval, got {}",
                    threshold
                )));
            }
        }

        if self.staging_area.trim().is_empty() {
            return Err(DeletionError::InvalidConfig(
                "staging_area cannot be empty".to_string(),
            ));
        }

        if self.sweep_interval_secs == 0 {
            return Err(DeletionError::InvalidConfig(
                "sweep_interval_secs must be > 0".to_string(),
            ));
        }

        Calendar::from_offset_minutes(self.utc_offset_minutes)?;
        Ok(())
    }

    /// Build the decision policy described by this configuration
    pub fn policy(&self) -> Result<DeletionPolicy> {
        self.validate()?;
        let calendar = Calendar::from_offset_minutes(self.utc_offset_minutes)?;
        let mut policy = DeletionPolicy::new(
            calendar,
            self.interval_until_staging,
            self.interval_before_deletion,
            self.default_lead_time,
        )
        .with_auto_delete(self.auto_delete_enabled);
        if let Some(threshold) = self.renotify_after {
            policy = policy.with_renotify_after(threshold);
        }
        Ok(policy)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert_eq!(config.interval_until_staging, Interval::weeks(3));
        assert_eq!(config.staging_area, "trash");
        assert!(config.auto_delete_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = WorkflowConfig::new()
            .interval_until_staging(Interval::weeks(2))
            .interval_before_deletion(Interval::months(3))
            .auto_delete(false)
            .utc_offset_minutes(60)
            .sweep_interval(Duration::from_secs(60));

        assert_eq!(config.interval_until_staging, Interval::weeks(2));
        assert_eq!(config.interval_before_deletion, Interval::months(3));
        assert!(!config.auto_delete_enabled);
        assert_eq!(config.sweep_interval_duration(), Duration::from_secs(60));

        let policy = config.policy().unwrap();
        assert!(!policy.auto_delete_enabled());
        assert_eq!(policy.calendar().offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_from_json_partial() {
        let config = WorkflowConfig::from_json(
            r#"{
                "interval_until_staging": "P2W",
                "interval_before_deletion": "2 months",
                "renotify_after": "10 days",
                "utc_offset_minutes": -300
            }"#,
        )
        .unwrap();

        assert_eq!(config.interval_until_staging, Interval::weeks(2));
        assert_eq!(config.interval_before_deletion, Interval::months(2));
        assert_eq!(config.renotify_after, Some(Interval::days(10)));
        assert_eq!(config.default_lead_time, Interval::years(1));
        assert_eq!(config.policy().unwrap().renotify_after(), Interval::days(10));
    }

    #[test]
    fn test_invalid_json() {
        assert!(WorkflowConfig::from_json(r#"{ "interval_until_staging": "soon" }"#).is_err());
        assert!(WorkflowConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(WorkflowConfig::new()
            .interval_until_staging(Interval::ZERO)
            .validate()
            .is_err());
        assert!(WorkflowConfig::new()
            .default_lead_time(Interval::weeks(-1))
            .validate()
            .is_err());
        assert!(WorkflowConfig::new()
            .renotify_after(Interval::ZERO)
            .validate()
            .is_err());
        assert!(WorkflowConfig::new().staging_area(" ").validate().is_err());
        assert!(WorkflowConfig::new()
            .utc_offset_minutes(25 * 60)
            .validate()
            .is_err());
        assert!(WorkflowConfig::new()
            .sweep_interval(Duration::from_millis(500))
            .validate()
            .is_err());
    }

    #[test]
    fn test_serializes_intervals_as_iso() {
        let json = serde_json::to_value(WorkflowConfig::default()).unwrap();
        assert_eq!(json["interval_until_staging"], "P3W");
        assert_eq!(json["interval_before_deletion"], "P1M");
        assert_eq!(json["default_lead_time"], "P1Y");
        assert!(json["renotify_after"].is_null());
    }
}
