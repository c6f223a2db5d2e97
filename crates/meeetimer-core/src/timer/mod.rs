mod driver;
mod engine;
mod scheduler;
mod settings;

pub use driver::{SharedEngine, TickHandle, TimerController, QUANTUM};
pub use engine::{format_clock, Phase, TimerEngine, TimerState, Urgency};
pub use scheduler::{evaluate, AlertSlot};
pub use settings::{
    preset, presets, validate, Preset, RawSettings, TimerSettings, DEFAULT_ALERTS_SECS,
    DEFAULT_DURATION_SECS, MAX_ALERTS, PRESET_MINUTES,
};
