//! # Meeetimer Core Library
//!
//! This library provides the core logic for Meeetimer, a presentation
//! countdown timer with up to three remaining-time alerts. Front ends (the
//! `meeetimer` CLI, or any GUI) only feed settings in and read snapshots out.
//!
//! ## Architecture
//!
//! - **Settings**: [`validate`] turns a raw duration and threshold list into
//!   canonical [`TimerSettings`]
//! - **Alert scheduling**: [`evaluate`] picks the thresholds crossed by a tick
//! - **Timer Engine**: a quantum-counting state machine that requires the caller
//!   to invoke `tick()` once per second
//! - **Driver**: [`TimerController`] owns the engine and the tokio task that
//!   ticks it, and publishes snapshots
//! - **Notifications**: alerts go to an injected [`NotificationSink`]
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core countdown state machine
//! - [`TimerController`]: Engine plus tick task
//! - [`StaggeredSink`]: Spaces out alerts raised together
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, SettingsError};
pub use events::Event;
pub use notify::{
    AlertChannel, FallbackSink, NotificationSink, NotifyError, RecordingSink, SilentSink,
    StaggeredSink,
};
pub use storage::Config;
pub use timer::{
    evaluate, validate, AlertSlot, Phase, RawSettings, TimerController, TimerEngine, TimerSettings,
    TimerState, Urgency,
};
