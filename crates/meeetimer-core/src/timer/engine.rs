//! Countdown engine implementation.
//!
//! The engine is a quantum-counting state machine. It does not use internal
//! threads or read the clock - the caller is responsible for calling `tick()`
//! once per second while the timer runs (see [`super::driver`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Finished            (any) -> Idle on reset
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings, sink);
//! engine.start();
//! // Once per second:
//! let events = engine.tick(); // alerts and completion raised by this tick
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::scheduler::{self, AlertSlot};
use super::settings::TimerSettings;
use crate::events::Event;
use crate::notify::NotificationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero. Only `reset` leaves this phase.
    Finished,
}

/// How close the countdown is to the end, by share of time used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Less than half the time used.
    Calm,
    Halfway,
    /// 75% or more used.
    Closing,
    /// 90% or more used.
    Critical,
}

/// Read-only projection of the engine, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: Phase,
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    pub total_duration_seconds: u64,
    /// All configured thresholds, descending.
    pub alert_thresholds: Vec<u64>,
    /// Thresholds that have fired, in crossing order.
    pub triggered_thresholds: Vec<u64>,
}

impl TimerState {
    pub fn is_triggered(&self, threshold: u64) -> bool {
        self.triggered_thresholds.contains(&threshold)
    }

    /// Remaining time as `m:ss`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    pub fn elapsed_clock(&self) -> String {
        format_clock(self.elapsed_seconds)
    }

    /// 0.0 .. 100.0 share of the duration used.
    pub fn progress_pct(&self) -> f64 {
        if self.total_duration_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds as f64 * 100.0 / self.total_duration_seconds as f64).min(100.0)
    }

    pub fn urgency(&self) -> Urgency {
        let pct = self.progress_pct();
        if pct >= 90.0 {
            Urgency::Critical
        } else if pct >= 75.0 {
            Urgency::Closing
        } else if pct >= 50.0 {
            Urgency::Halfway
        } else {
            Urgency::Calm
        }
    }
}

/// Format seconds as `m:ss`. Minutes keep counting past the hour.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Core countdown engine.
///
/// Owns the active settings, so every tick reads the configuration current at
/// that moment. `reset` is the only way to swap it.
pub struct TimerEngine {
    settings: TimerSettings,
    phase: Phase,
    elapsed_secs: u64,
    /// Crossing order, never shrinks until reset.
    triggered: Vec<u64>,
    sink: Box<dyn NotificationSink>,
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("triggered", &self.triggered)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an idle engine with the full duration remaining.
    ///
    /// `sink.play` runs inside `tick`, so it must not block.
    pub fn new(settings: TimerSettings, sink: impl NotificationSink + 'static) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            elapsed_secs: 0,
            triggered: Vec::new(),
            sink: Box::new(sink),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.settings
            .total_duration_secs()
            .saturating_sub(self.elapsed_secs)
    }

    pub fn triggered(&self) -> &[u64] {
        &self.triggered
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            elapsed_seconds: self.elapsed_secs,
            remaining_seconds: self.remaining_secs(),
            total_duration_seconds: self.settings.total_duration_secs(),
            alert_thresholds: self.settings.alert_thresholds().to_vec(),
            triggered_thresholds: self.triggered.clone(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Running;
                debug!(total_secs = self.settings.total_duration_secs(), "timer started");
                Some(Event::TimerStarted {
                    total_secs: self.settings.total_duration_secs(),
                    at: Utc::now(),
                })
            }
            Phase::Running | Phase::Paused | Phase::Finished => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                debug!(elapsed_secs = self.elapsed_secs, "timer paused");
                Some(Event::TimerPaused {
                    elapsed_secs: self.elapsed_secs,
                    remaining_secs: self.remaining_secs(),
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Paused => {
                self.phase = Phase::Running;
                debug!(remaining_secs = self.remaining_secs(), "timer resumed");
                Some(Event::TimerResumed {
                    remaining_secs: self.remaining_secs(),
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Back to `Idle` with the full duration, from any phase. Replaces the
    /// active settings when `settings` is given.
    pub fn reset(&mut self, settings: Option<TimerSettings>) -> Option<Event> {
        if let Some(settings) = settings {
            self.settings = settings;
        }
        self.phase = Phase::Idle;
        self.elapsed_secs = 0;
        self.triggered.clear();
        debug!(total_secs = self.settings.total_duration_secs(), "timer reset");
        Some(Event::TimerReset {
            total_secs: self.settings.total_duration_secs(),
            at: Utc::now(),
        })
    }

    /// Advance one quantum. Ignored unless running.
    ///
    /// Plays one notification per newly crossed threshold, furthest-out first,
    /// and the final alert when the countdown reaches zero. Returns the alert
    /// and completion events raised by this tick.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.phase != Phase::Running {
            return Vec::new();
        }

        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        let remaining = self.remaining_secs();
        let mut events = Vec::new();

        let pending: Vec<u64> = self
            .settings
            .alert_thresholds()
            .iter()
            .copied()
            .filter(|t| !self.triggered.contains(t))
            .collect();

        for threshold in scheduler::evaluate(remaining, &pending) {
            self.triggered.push(threshold);
            let Some(index) = self.settings.slot_of(threshold) else {
                continue;
            };
            let slot = AlertSlot::Threshold(index);
            debug!(threshold, remaining, "alert threshold crossed");
            self.sink.play(slot);
            events.push(Event::AlertTriggered {
                threshold_secs: threshold,
                slot,
                remaining_secs: remaining,
                at: Utc::now(),
            });
        }

        if remaining == 0 {
            self.sink.play(AlertSlot::Final);
            self.phase = Phase::Finished;
            info!(elapsed_secs = self.elapsed_secs, "countdown finished");
            events.push(Event::TimerFinished {
                elapsed_secs: self.elapsed_secs,
                at: Utc::now(),
            });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordingSink, SilentSink};
    use crate::timer::settings::validate;

    fn engine(total: i64, alerts: &[i64]) -> (TimerEngine, RecordingSink) {
        let sink = RecordingSink::new();
        let settings = validate(total, alerts).unwrap();
        (TimerEngine::new(settings, sink.clone()), sink)
    }

    fn tick_n(engine: &mut TimerEngine, n: u64) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, _) = engine(60, &[]);
        assert_eq!(engine.phase(), Phase::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.phase(), Phase::Running);

        assert!(engine.pause().is_some());
        assert_eq!(engine.phase(), Phase::Paused);

        assert!(engine.resume().is_some());
        assert_eq!(engine.phase(), Phase::Running);
    }

    #[test]
    fn inapplicable_commands_are_noops() {
        let (mut engine, _) = engine(60, &[]);
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        engine.start();
        assert!(engine.start().is_none());
        assert!(engine.resume().is_none());
        assert_eq!(engine.phase(), Phase::Running);
    }

    #[test]
    fn pause_twice_is_pause_once() {
        let (mut engine, _) = engine(60, &[]);
        engine.start();
        tick_n(&mut engine, 5);
        engine.pause();
        let once = engine.state();
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), once);
    }

    #[test]
    fn tick_ignored_unless_running() {
        let (mut engine, sink) = engine(60, &[59]);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.elapsed_secs(), 0);

        engine.start();
        engine.tick();
        engine.pause();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.elapsed_secs(), 1);

        engine.resume();
        engine.tick();
        assert_eq!(engine.elapsed_secs(), 2);
        assert_eq!(sink.played(), vec![AlertSlot::Threshold(0)]);
    }

    #[test]
    fn finishes_after_total_ticks() {
        let (mut engine, sink) = engine(3, &[]);
        engine.start();
        tick_n(&mut engine, 2);
        assert_eq!(engine.phase(), Phase::Running);
        let events = engine.tick();
        assert!(matches!(events.as_slice(), [Event::TimerFinished { elapsed_secs: 3, .. }]));
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(sink.played(), vec![AlertSlot::Final]);
    }

    #[test]
    fn finished_accepts_no_ticks_and_no_start() {
        let (mut engine, sink) = engine(1, &[]);
        engine.start();
        engine.tick();
        assert!(engine.tick().is_empty());
        assert!(engine.start().is_none());
        assert!(engine.pause().is_none());
        assert_eq!(engine.elapsed_secs(), 1);
        assert_eq!(sink.played().len(), 1);
    }

    #[test]
    fn thresholds_trigger_in_crossing_order_once() {
        let (mut engine, sink) = engine(900, &[600, 300, 60]);
        engine.start();
        tick_n(&mut engine, 300);
        assert_eq!(engine.triggered(), &[600]);
        tick_n(&mut engine, 300);
        assert_eq!(engine.triggered(), &[600, 300]);
        tick_n(&mut engine, 10);
        assert_eq!(engine.triggered(), &[600, 300]);
        assert_eq!(
            sink.played(),
            vec![AlertSlot::Threshold(0), AlertSlot::Threshold(1)]
        );
    }

    #[test]
    fn tick_reports_alert_events() {
        let (mut engine, _) = engine(10, &[9]);
        engine.start();
        let events = engine.tick();
        match events.as_slice() {
            [Event::AlertTriggered {
                threshold_secs,
                slot,
                remaining_secs,
                ..
            }] => {
                assert_eq!(*threshold_secs, 9);
                assert_eq!(*slot, AlertSlot::Threshold(0));
                assert_eq!(*remaining_secs, 9);
            }
            other => panic!("Expected one AlertTriggered, got {other:?}"),
        }
    }

    #[test]
    fn reset_from_every_phase() {
        for ticks in [0u64, 5, 60] {
            for pause in [false, true] {
                let (mut engine, _) = engine(60, &[30]);
                engine.start();
                tick_n(&mut engine, ticks);
                if pause {
                    engine.pause();
                }
                assert!(engine.reset(None).is_some());
                let state = engine.state();
                assert_eq!(state.phase, Phase::Idle);
                assert_eq!(state.elapsed_seconds, 0);
                assert_eq!(state.remaining_seconds, 60);
                assert!(state.triggered_thresholds.is_empty());
            }
        }
    }

    #[test]
    fn reset_with_settings_replaces_configuration() {
        let (mut engine, _) = engine(60, &[30]);
        engine.start();
        tick_n(&mut engine, 40);
        engine.reset(Some(validate(120, &[100]).unwrap()));
        assert_eq!(engine.remaining_secs(), 120);
        assert_eq!(engine.settings().alert_thresholds(), &[100]);
        engine.start();
        tick_n(&mut engine, 20);
        assert_eq!(engine.triggered(), &[100]);
    }

    #[test]
    fn elapsed_plus_remaining_is_total() {
        let (mut engine, _) = engine(45, &[20, 10]);
        engine.start();
        for _ in 0..45 {
            engine.tick();
            let state = engine.state();
            assert_eq!(state.elapsed_seconds + state.remaining_seconds, 45);
        }
    }

    #[test]
    fn snapshot_event_carries_state() {
        let engine = TimerEngine::new(TimerSettings::default(), SilentSink);
        match engine.snapshot_event() {
            Event::StateSnapshot { state, .. } => {
                assert_eq!(state.phase, Phase::Idle);
                assert_eq!(state.remaining_seconds, 20 * 60);
                assert_eq!(state.alert_thresholds, vec![600, 300, 60]);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn state_display_helpers() {
        let (mut engine, _) = engine(100, &[]);
        assert_eq!(engine.state().clock(), "1:40");
        assert_eq!(engine.state().urgency(), Urgency::Calm);
        engine.start();
        tick_n(&mut engine, 50);
        assert_eq!(engine.state().urgency(), Urgency::Halfway);
        tick_n(&mut engine, 25);
        assert_eq!(engine.state().urgency(), Urgency::Closing);
        tick_n(&mut engine, 15);
        let state = engine.state();
        assert_eq!(state.urgency(), Urgency::Critical);
        assert_eq!(state.clock(), "0:10");
        assert_eq!(state.elapsed_clock(), "1:30");
        assert!((state.progress_pct() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_keeps_counting_minutes_past_the_hour() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(3725), "62:05");
    }

    #[test]
    fn state_serializes_camel_case() {
        let (engine, _) = engine(60, &[10]);
        let json = serde_json::to_value(engine.state()).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["remainingSeconds"], 60);
        assert_eq!(json["triggeredThresholds"], serde_json::json!([]));
    }
}
