use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{AlertSlot, TimerState};

/// Every state change of the engine produces an Event.
/// Front ends print or forward them; the engine never reads them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    /// A remaining-time threshold was crossed and its alert played.
    AlertTriggered {
        threshold_secs: u64,
        slot: AlertSlot,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and the final alert played.
    TimerFinished {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::AlertTriggered {
            threshold_secs: 300,
            slot: AlertSlot::Threshold(1),
            remaining_secs: 300,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AlertTriggered");
        assert_eq!(json["slot"]["kind"], "threshold");
        assert_eq!(json["slot"]["index"], 1);

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert!(matches!(
            parsed,
            Event::AlertTriggered {
                threshold_secs: 300,
                ..
            }
        ));
    }
}
