//! Reminder settings structure and validation

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// User-facing reminder configuration: how often to alert, and whether to at all.
///
/// The period is validated at this write boundary so the scheduler can assume it
/// is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    period_secs: u64,
    pub enabled: bool,
}

impl ReminderSettings {
    /// Create settings with the given period in seconds. Zero is rejected.
    pub fn new(period_secs: u64, enabled: bool) -> Result<Self, String> {
        if period_secs == 0 {
            return Err("reminder period must be positive".to_string());
        }
        Ok(Self {
            period_secs,
            enabled,
        })
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    pub fn set_period_secs(&mut self, period_secs: u64) -> Result<(), String> {
        if period_secs == 0 {
            return Err("reminder period must be positive".to_string());
        }
        self.period_secs = period_secs;
        Ok(())
    }

    /// True if the persisted form satisfies the period invariant.
    pub fn is_valid(&self) -> bool {
        self.period_secs > 0
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            period_secs: 300,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_period() {
        assert!(ReminderSettings::new(0, true).is_err());

        let mut settings = ReminderSettings::default();
        assert!(settings.set_period_secs(0).is_err());
        // A failed write leaves the previous value in place.
        assert_eq!(settings.period(), Duration::from_secs(300));
    }

    #[test]
    fn accepts_positive_period() {
        let mut settings = ReminderSettings::new(60, false).unwrap();
        assert_eq!(settings.period(), Duration::from_secs(60));
        assert!(!settings.enabled);

        settings.set_period_secs(90).unwrap();
        assert_eq!(settings.period_secs(), 90);
    }
}
