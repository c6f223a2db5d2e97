//! Periodic tick delivery.
//!
//! [`TimerController`] owns the engine together with the task that ticks it,
//! so that starting, pausing and resetting the countdown also starts and stops
//! the ticking. Every transition publishes a fresh [`TimerState`] on a
//! `watch` channel and the corresponding [`Event`] on a `broadcast` channel.
//!
//! All engine access goes through one mutex. Cancelling a [`TickHandle`]
//! happens while that mutex is held, and the tick task re-checks the
//! cancellation flag after acquiring it, so a tick that was already due when
//! `pause` or `reset` ran is dropped instead of applied afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::engine::{Phase, TimerEngine, TimerState};
use super::settings::TimerSettings;
use crate::error::Result;
use crate::events::Event;

/// Time advanced by one tick.
pub const QUANTUM: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

pub type SharedEngine = Arc<Mutex<TimerEngine>>;

/// Fan-out for snapshots and events.
#[derive(Clone)]
struct Publisher {
    state_tx: Arc<watch::Sender<TimerState>>,
    event_tx: broadcast::Sender<Event>,
}

impl Publisher {
    fn publish(&self, engine: &TimerEngine, events: impl IntoIterator<Item = Event>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.event_tx.send(event);
        }
        self.state_tx.send_replace(engine.state());
    }
}

/// A running tick task. Cancelling is idempotent; dropping the handle cancels.
pub struct TickHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TickHandle {
    fn spawn(engine: SharedEngine, period: Duration, publisher: Publisher) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !drive_once(&engine, &flag, &publisher) {
                    break;
                }
            }
            debug!("tick task stopped");
        });
        Self { cancelled, task }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Apply one tick unless cancelled. Returns whether ticking should continue.
fn drive_once(engine: &SharedEngine, cancelled: &AtomicBool, publisher: &Publisher) -> bool {
    let mut engine = match engine.lock() {
        Ok(engine) => engine,
        Err(e) => {
            warn!(error = %e, "timer engine lock poisoned, stopping ticks");
            return false;
        }
    };
    if cancelled.load(Ordering::Acquire) {
        return false;
    }
    let events = engine.tick();
    publisher.publish(&engine, events);
    engine.phase() == Phase::Running
}

/// Owns an engine and the task that ticks it.
///
/// Must be used from within a tokio runtime.
pub struct TimerController {
    engine: SharedEngine,
    ticker: Option<TickHandle>,
    publisher: Publisher,
    period: Duration,
}

impl TimerController {
    /// Take ownership of `engine`; nothing ticks until `start`.
    ///
    /// Alerts are played from the tick task while the engine lock is held, so
    /// the engine's sink must return promptly. Wrap slow or blocking delivery
    /// (desktop popups, audio) in a [`StaggeredSink`](crate::notify::StaggeredSink),
    /// which queues the alert and plays it from its own task.
    pub fn new(engine: TimerEngine) -> Self {
        Self::with_period(engine, QUANTUM)
    }

    /// Tick every `period` instead of every second. Each tick still counts
    /// as one quantum.
    pub fn with_period(engine: TimerEngine, period: Duration) -> Self {
        let (state_tx, _) = watch::channel(engine.state());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: None,
            publisher: Publisher {
                state_tx: Arc::new(state_tx),
                event_tx,
            },
            period,
        }
    }

    /// Snapshot stream; holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.publisher.state_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.publisher.event_tx.subscribe()
    }

    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    pub fn state(&self) -> Result<TimerState> {
        Ok(self.engine.lock()?.state())
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|t| !t.is_cancelled() && !t.is_finished())
    }

    pub fn start(&mut self) -> Result<Option<Event>> {
        let mut engine = self.engine.lock()?;
        let event = engine.start();
        if event.is_some() {
            self.ticker = Some(TickHandle::spawn(
                Arc::clone(&self.engine),
                self.period,
                self.publisher.clone(),
            ));
        }
        self.publisher.publish(&engine, event.clone());
        Ok(event)
    }

    pub fn pause(&mut self) -> Result<Option<Event>> {
        let mut engine = self.engine.lock()?;
        let event = engine.pause();
        if event.is_some() {
            if let Some(ticker) = self.ticker.take() {
                ticker.cancel();
            }
        }
        self.publisher.publish(&engine, event.clone());
        Ok(event)
    }

    pub fn resume(&mut self) -> Result<Option<Event>> {
        let mut engine = self.engine.lock()?;
        let event = engine.resume();
        if event.is_some() {
            self.ticker = Some(TickHandle::spawn(
                Arc::clone(&self.engine),
                self.period,
                self.publisher.clone(),
            ));
        }
        self.publisher.publish(&engine, event.clone());
        Ok(event)
    }

    /// Stop ticking and return to `Idle`, optionally with new settings.
    pub fn reset(&mut self, settings: Option<TimerSettings>) -> Result<Option<Event>> {
        let mut engine = self.engine.lock()?;
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let event = engine.reset(settings);
        self.publisher.publish(&engine, event.clone());
        Ok(event)
    }

    /// One-key control: start when idle, pause when running, resume when
    /// paused. Does nothing once finished.
    pub fn toggle(&mut self) -> Result<Option<Event>> {
        let phase = self.engine.lock()?.phase();
        match phase {
            Phase::Idle => self.start(),
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Finished => Ok(None),
        }
    }

    /// Cancel the tick task without touching the engine.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
