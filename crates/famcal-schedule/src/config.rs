//! Schedule configuration
//!
//! Loads scan schedules from a TOML file.

use std::path::Path;
use std::str::FromStr;

use cron::Schedule as CronSchedule;
use famcal_conflict::ScanRequest;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// All configured schedules
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub schedules: Vec<ScanSchedule>,
}

/// A recurring conflict scan of one family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSchedule {
    /// Schedule name
    pub name: String,

    /// Cron expression with seconds (e.g. "0 0 2 * * *" = every day at 02:00 UTC)
    pub cron: String,

    /// Family to scan
    pub family_id: String,

    /// Lookahead override; the scanner default applies when omitted
    #[serde(default)]
    pub window_hours: Option<i64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ScanSchedule {
    /// Parse the cron expression
    pub fn cron_schedule(&self) -> Result<CronSchedule> {
        CronSchedule::from_str(&self.cron).map_err(|source| ScheduleError::CronParse {
            name: self.name.clone(),
            source,
        })
    }

    /// The scan request this schedule issues
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            event_id: None,
            family_id: Some(self.family_id.clone()),
            check_window_hours: self.window_hours,
        }
    }
}

impl ScheduleConfig {
    /// Load schedules from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate schedules from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScheduleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load schedules from the default paths
    ///
    /// Returns an empty configuration when no file exists.
    pub fn load_default() -> Result<Self> {
        let paths = ["schedule.toml", "config/schedule.toml"];

        for path in &paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Only enabled schedules
    pub fn enabled_schedules(&self) -> Vec<&ScanSchedule> {
        self.schedules.iter().filter(|s| s.enabled).collect()
    }

    fn validate(&self) -> Result<()> {
        for schedule in &self.schedules {
            if schedule.family_id.trim().is_empty() {
                return Err(ScheduleError::InvalidSchedule(
                    schedule.name.clone(),
                    "family_id must not be empty".to_string(),
                ));
            }
            if let Some(hours) = schedule.window_hours {
                if hours <= 0 {
                    return Err(ScheduleError::InvalidSchedule(
                        schedule.name.clone(),
                        format!("window_hours must be positive, got {}", hours),
                    ));
                }
            }
            schedule.cron_schedule()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[schedules]]
name = "nightly"
cron = "0 0 2 * * *"
family_id = "fam-1"

[[schedules]]
name = "weekend"
cron = "0 0 8 * * Sat"
family_id = "fam-2"
window_hours = 48
enabled = false
"#;
        let config = ScheduleConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.schedules.len(), 2);
        assert_eq!(config.schedules[0].name, "nightly");
        assert!(config.schedules[0].enabled);
        assert_eq!(config.schedules[1].window_hours, Some(48));

        let enabled = config.enabled_schedules();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].family_id, "fam-1");
    }

    #[test]
    fn test_scan_request_from_schedule() {
        let schedule = ScanSchedule {
            name: "nightly".to_string(),
            cron: "0 0 2 * * *".to_string(),
            family_id: "fam-1".to_string(),
            window_hours: Some(24),
            enabled: true,
        };
        assert_eq!(
            schedule.scan_request(),
            ScanRequest::for_family("fam-1").with_window_hours(24)
        );
    }

    #[test]
    fn test_invalid_cron_rejected() {
        let toml = r#"
[[schedules]]
name = "broken"
cron = "invalid"
family_id = "fam-1"
"#;
        let err = ScheduleConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ScheduleError::CronParse { .. }));
    }

    #[test]
    fn test_empty_family_rejected() {
        let toml = r#"
[[schedules]]
name = "nobody"
cron = "0 0 2 * * *"
family_id = ""
"#;
        let err = ScheduleConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidSchedule(..)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        std::fs::write(
            &path,
            "[[schedules]]\nname = \"n\"\ncron = \"0 30 6 * * *\"\nfamily_id = \"fam-1\"\n",
        )
        .unwrap();

        let config = ScheduleConfig::from_file(&path).unwrap();
        assert_eq!(config.schedules.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ScheduleConfig::from_file("/nonexistent/schedule.toml").unwrap_err();
        assert!(matches!(err, ScheduleError::Io(_)));
    }
}
