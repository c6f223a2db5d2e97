//! Terminal-side notification channels.

use std::io::Write;

use meeetimer_core::timer::format_clock;
use meeetimer_core::{
    AlertChannel, AlertSlot, Config, FallbackSink, NotificationSink, NotifyError, SilentSink,
    TimerSettings,
};
use notify_rust::Notification;

const APP_TITLE: &str = "Meeetimer";
const POPUP_TIMEOUT_MS: i32 = 5000;

/// Human text for an alert.
pub fn alert_message(slot: AlertSlot, thresholds: &[u64]) -> String {
    match slot {
        AlertSlot::Final => "Time is up!".to_string(),
        AlertSlot::Threshold(index) => match thresholds.get(index) {
            Some(&secs) => format!("Alert {}: {} remaining", index + 1, format_clock(secs)),
            None => format!("Alert {}", index + 1),
        },
    }
}

/// Desktop popup through the platform notification service.
pub struct DesktopChannel {
    enabled: bool,
    thresholds: Vec<u64>,
}

impl DesktopChannel {
    pub fn new(enabled: bool, thresholds: &[u64]) -> Self {
        Self {
            enabled,
            thresholds: thresholds.to_vec(),
        }
    }
}

impl AlertChannel for DesktopChannel {
    fn name(&self) -> &str {
        "desktop"
    }

    fn deliver(&self, slot: AlertSlot) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::Disabled(self.name().to_string()));
        }
        Notification::new()
            .summary(APP_TITLE)
            .body(&alert_message(slot, &self.thresholds))
            .timeout(POPUP_TIMEOUT_MS)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::ChannelFailed {
                channel: self.name().to_string(),
                message: e.to_string(),
            })
    }
}

/// ASCII BEL on stderr, plus the alert text.
pub struct BellChannel {
    enabled: bool,
    thresholds: Vec<u64>,
}

impl BellChannel {
    pub fn new(enabled: bool, thresholds: &[u64]) -> Self {
        Self {
            enabled,
            thresholds: thresholds.to_vec(),
        }
    }
}

impl AlertChannel for BellChannel {
    fn name(&self) -> &str {
        "bell"
    }

    fn deliver(&self, slot: AlertSlot) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::Disabled(self.name().to_string()));
        }
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\x07{}", alert_message(slot, &self.thresholds))
            .and_then(|_| stderr.flush())
            .map_err(|e| NotifyError::ChannelFailed {
                channel: self.name().to_string(),
                message: e.to_string(),
            })
    }
}

/// Sink for a run: desktop popup with bell fallback, or nothing.
pub fn build_sink(
    config: &Config,
    settings: &TimerSettings,
    muted: bool,
) -> Box<dyn NotificationSink> {
    let notifications = &config.notifications;
    if muted || !notifications.enabled {
        return Box::new(SilentSink);
    }
    let thresholds = settings.alert_thresholds();
    Box::new(FallbackSink::new(
        DesktopChannel::new(notifications.desktop, thresholds),
        BellChannel::new(notifications.bell, thresholds),
    ))
}
