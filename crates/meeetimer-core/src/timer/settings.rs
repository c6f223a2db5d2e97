//! Timer settings and their validation.
//!
//! A [`TimerSettings`] value can only be built through [`validate`], so every
//! instance upholds the canonical form: positive duration, at most
//! [`MAX_ALERTS`] distinct thresholds strictly inside the duration, stored in
//! descending order.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Maximum number of alert thresholds kept per timer.
pub const MAX_ALERTS: usize = 3;

/// Default presentation length: 20 minutes.
pub const DEFAULT_DURATION_SECS: u64 = 20 * 60;

/// Default alerts: 10, 5 and 1 minute remaining.
pub const DEFAULT_ALERTS_SECS: [u64; 3] = [600, 300, 60];

/// Preset lengths offered for quick setup, in minutes.
pub const PRESET_MINUTES: [u64; 4] = [10, 15, 20, 30];

/// Gap between an existing alert and a newly suggested one.
const ALERT_SUGGESTION_STEP_SECS: u64 = 60;

/// Unvalidated settings in their external shape.
///
/// This is what configuration sources produce:
/// `{ "totalDurationSeconds": 1200, "alertThresholds": [600, 300, 60] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    pub total_duration_seconds: i64,
    #[serde(default)]
    pub alert_thresholds: Vec<i64>,
}

impl RawSettings {
    pub fn validate(&self) -> Result<TimerSettings, SettingsError> {
        validate(self.total_duration_seconds, &self.alert_thresholds)
    }
}

/// Canonical, validated timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings", into = "RawSettings")]
pub struct TimerSettings {
    total_duration_secs: u64,
    /// Descending, distinct, each in `1..total_duration_secs`.
    alert_thresholds: Vec<u64>,
}

/// Normalize a raw duration and threshold list into canonical settings.
///
/// Thresholds outside `1..raw_duration` are dropped, duplicates collapse to
/// their first occurrence, and only the first [`MAX_ALERTS`] survivors are
/// kept. The result is sorted descending.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidDuration`] if `raw_duration <= 0`.
pub fn validate(raw_duration: i64, raw_thresholds: &[i64]) -> Result<TimerSettings, SettingsError> {
    if raw_duration <= 0 {
        return Err(SettingsError::InvalidDuration {
            duration: raw_duration,
        });
    }

    let mut kept: Vec<u64> = Vec::with_capacity(MAX_ALERTS);
    for &threshold in raw_thresholds {
        if threshold <= 0 || threshold >= raw_duration {
            continue;
        }
        let threshold = threshold as u64;
        if kept.contains(&threshold) {
            continue;
        }
        if kept.len() == MAX_ALERTS {
            break;
        }
        kept.push(threshold);
    }
    kept.sort_unstable_by(|a, b| b.cmp(a));

    Ok(TimerSettings {
        total_duration_secs: raw_duration as u64,
        alert_thresholds: kept,
    })
}

fn to_raw(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

impl TimerSettings {
    /// Validate settings given in unsigned seconds.
    pub fn from_secs(total_duration_secs: u64, thresholds: &[u64]) -> Result<Self, SettingsError> {
        let raw: Vec<i64> = thresholds.iter().copied().map(to_raw).collect();
        validate(to_raw(total_duration_secs), &raw)
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.total_duration_secs
    }

    pub fn alert_thresholds(&self) -> &[u64] {
        &self.alert_thresholds
    }

    /// Position of `threshold` in the descending list, i.e. its alert number
    /// counting from zero.
    pub fn slot_of(&self, threshold: u64) -> Option<usize> {
        self.alert_thresholds.iter().position(|&t| t == threshold)
    }

    pub fn to_raw(&self) -> RawSettings {
        RawSettings::from(self.clone())
    }

    /// Settings with one more alert, placed the way the setup form suggests it:
    /// halfway through when there is none yet, otherwise a minute beyond the
    /// furthest-out alert. Unchanged at the [`MAX_ALERTS`] cap.
    pub fn with_added_alert(&self) -> TimerSettings {
        if self.alert_thresholds.len() >= MAX_ALERTS {
            return self.clone();
        }
        let suggestion = match self.alert_thresholds.first() {
            None => self.total_duration_secs / 2,
            Some(&furthest) => furthest
                .saturating_add(ALERT_SUGGESTION_STEP_SECS)
                .min(self.total_duration_secs),
        };
        let mut thresholds = self.alert_thresholds.clone();
        thresholds.push(suggestion);
        self.revalidated(&thresholds)
    }

    pub fn with_removed_alert(&self, threshold: u64) -> TimerSettings {
        let thresholds: Vec<u64> = self
            .alert_thresholds
            .iter()
            .copied()
            .filter(|&t| t != threshold)
            .collect();
        self.revalidated(&thresholds)
    }

    /// Replace `old` with `new`. Values beyond the total duration are ignored;
    /// a value equal to it is dropped by validation.
    pub fn with_updated_alert(&self, old: u64, new: u64) -> TimerSettings {
        if new > self.total_duration_secs {
            return self.clone();
        }
        let thresholds: Vec<u64> = self
            .alert_thresholds
            .iter()
            .map(|&t| if t == old { new } else { t })
            .collect();
        self.revalidated(&thresholds)
    }

    fn revalidated(&self, thresholds: &[u64]) -> TimerSettings {
        // The duration is already known to be positive.
        Self::from_secs(self.total_duration_secs, thresholds).unwrap_or_else(|_| self.clone())
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            total_duration_secs: DEFAULT_DURATION_SECS,
            alert_thresholds: DEFAULT_ALERTS_SECS.to_vec(),
        }
    }
}

impl TryFrom<RawSettings> for TimerSettings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        raw.validate()
    }
}

impl From<TimerSettings> for RawSettings {
    fn from(settings: TimerSettings) -> Self {
        Self {
            total_duration_seconds: to_raw(settings.total_duration_secs),
            alert_thresholds: settings.alert_thresholds.into_iter().map(to_raw).collect(),
        }
    }
}

/// A one-click configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub label: String,
    pub minutes: u64,
    pub settings: TimerSettings,
}

/// Settings for a preset length: alerts at 10, 5 and 1 minute remaining,
/// minus any that do not fit.
pub fn preset(minutes: u64) -> Result<TimerSettings, SettingsError> {
    TimerSettings::from_secs(minutes.saturating_mul(60), &DEFAULT_ALERTS_SECS)
}

pub fn presets() -> Vec<Preset> {
    PRESET_MINUTES
        .iter()
        .filter_map(|&minutes| {
            preset(minutes).ok().map(|settings| Preset {
                label: format!("{minutes} min"),
                minutes,
                settings,
            })
        })
        .collect()
}
