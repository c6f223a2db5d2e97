//! Notification delivery.
//!
//! The engine calls a [`NotificationSink`] for every alert it raises. Sinks
//! are best-effort: `play` returns nothing, and any failure is dealt with (and
//! logged) inside the sink, never reported back to the engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::timer::AlertSlot;

/// Default spacing between notifications raised in the same tick.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(600);

/// Receives alerts from the engine.
pub trait NotificationSink: Send {
    fn play(&self, slot: AlertSlot);
}

impl<S: NotificationSink + Sync + ?Sized> NotificationSink for Arc<S> {
    fn play(&self, slot: AlertSlot) {
        (**self).play(slot)
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn play(&self, slot: AlertSlot) {
        (**self).play(slot)
    }
}

/// Failure of a single notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification channel '{channel}' failed: {message}")]
    ChannelFailed { channel: String, message: String },

    #[error("notification channel '{0}' is disabled")]
    Disabled(String),
}

/// One concrete way of getting the user's attention (sound, desktop popup,
/// terminal bell). Unlike a sink, a channel reports failure.
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &str;

    fn deliver(&self, slot: AlertSlot) -> Result<(), NotifyError>;
}

/// Plays through `primary`, dropping to `secondary` when it fails.
pub struct FallbackSink<P, S> {
    primary: P,
    secondary: S,
}

impl<P: AlertChannel, S: AlertChannel> FallbackSink<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: AlertChannel, S: AlertChannel> NotificationSink for FallbackSink<P, S> {
    fn play(&self, slot: AlertSlot) {
        let Err(e) = self.primary.deliver(slot) else {
            debug!(channel = self.primary.name(), ?slot, "alert delivered");
            return;
        };
        warn!(
            channel = self.primary.name(),
            fallback = self.secondary.name(),
            error = %e,
            "alert delivery failed, using fallback"
        );
        if let Err(e) = self.secondary.deliver(slot) {
            warn!(channel = self.secondary.name(), error = %e, "fallback alert delivery failed");
        }
    }
}

/// A sink that drops every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn play(&self, slot: AlertSlot) {
        debug!(?slot, "alert suppressed");
    }
}

/// Records played slots in order. Cloning shares the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    played: Arc<Mutex<Vec<AlertSlot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<AlertSlot> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn play(&self, slot: AlertSlot) {
        if let Ok(mut played) = self.played.lock() {
            played.push(slot);
        }
    }
}

/// Queues alerts and plays them from a background task, keeping at least
/// `gap` between consecutive plays so alerts raised in one tick stay
/// distinguishable.
///
/// `play` never waits. The worker exits once every clone of the sink is
/// dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct StaggeredSink {
    tx: mpsc::UnboundedSender<AlertSlot>,
}

impl StaggeredSink {
    /// Spawn the delivery worker on the current tokio runtime.
    pub fn spawn<S>(inner: S, gap: Duration) -> (Self, JoinHandle<()>)
    where
        S: NotificationSink + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<AlertSlot>();
        let worker = tokio::spawn(async move {
            let mut last_played: Option<Instant> = None;
            while let Some(slot) = rx.recv().await {
                if let Some(last) = last_played {
                    let since = last.elapsed();
                    if since < gap {
                        sleep(gap - since).await;
                    }
                }
                inner.play(slot);
                last_played = Some(Instant::now());
            }
            debug!("notification worker drained");
        });
        (Self { tx }, worker)
    }
}

impl NotificationSink for StaggeredSink {
    fn play(&self, slot: AlertSlot) {
        if self.tx.send(slot).is_err() {
            warn!(?slot, "notification worker gone, alert dropped");
        }
    }
}
