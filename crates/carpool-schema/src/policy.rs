use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse policy: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

/// Upper bound for every policy interval: one hundred years.
pub const MAX_POLICY_DAYS: i64 = 36_500;
const MAX_POLICY_MINUTES: i64 = MAX_POLICY_DAYS * 24 * 60;

/// Timing and capacity rules applied by the booking engine.
///
/// Every field may be omitted from the TOML file; missing fields take the
/// marketplace defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct BookingPolicy {
    /// Minimum interval between publishing a trip and its departure.
    pub lead_time_minutes: i64,
    /// How late after the scheduled departure a trip may still be started.
    pub start_grace_minutes: i64,
    /// How late after the scheduled departure an unstarted trip may be cancelled.
    pub cancel_grace_minutes: i64,
    /// Accept enrollments past `total_seats`; the displayed seat count floors at 0.
    pub allow_overbooking: bool,
    /// Minimum account age before a user record may be deleted.
    pub min_account_age_days: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            lead_time_minutes: 30,
            start_grace_minutes: 30,
            cancel_grace_minutes: 30,
            allow_overbooking: true,
            min_account_age_days: 365,
        }
    }
}

impl BookingPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (field, value, max) in [
            ("lead_time_minutes", self.lead_time_minutes, MAX_POLICY_MINUTES),
            ("start_grace_minutes", self.start_grace_minutes, MAX_POLICY_MINUTES),
            ("cancel_grace_minutes", self.cancel_grace_minutes, MAX_POLICY_MINUTES),
            ("min_account_age_days", self.min_account_age_days, MAX_POLICY_DAYS),
        ] {
            if value < 0 {
                return Err(PolicyError::Negative { field, value });
            }
            if value > max {
                return Err(PolicyError::TooLarge { field, value, max });
            }
        }
        Ok(())
    }

    // The getters saturate so a policy built in code without `validate()`
    // still cannot panic.

    pub fn lead_time(&self) -> Duration {
        Duration::try_minutes(self.lead_time_minutes).unwrap_or(Duration::MAX)
    }

    pub fn start_grace(&self) -> Duration {
        Duration::try_minutes(self.start_grace_minutes).unwrap_or(Duration::MAX)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::try_minutes(self.cancel_grace_minutes).unwrap_or(Duration::MAX)
    }

    pub fn min_account_age(&self) -> Duration {
        Duration::try_days(self.min_account_age_days).unwrap_or(Duration::MAX)
    }
}

pub fn parse_policy_str(input: &str) -> Result<BookingPolicy, PolicyError> {
    let policy: BookingPolicy = toml::from_str(input)?;
    policy.validate()?;
    Ok(policy)
}

pub fn parse_policy_file(path: impl AsRef<Path>) -> Result<BookingPolicy, PolicyError> {
    let content = fs::read_to_string(path)?;
    parse_policy_str(&content)
}
