//! Alert crossing detection.
//!
//! The scheduler only decides *which* thresholds fire and in what order.
//! Spacing the resulting notifications out in time is the sink's job
//! (see [`crate::notify::StaggeredSink`]).

use serde::{Deserialize, Serialize};

/// What a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum AlertSlot {
    /// The n-th configured alert, counting from zero in descending
    /// threshold order.
    Threshold(usize),
    /// The countdown reached zero.
    Final,
}

/// Thresholds crossed at `remaining_secs`, furthest-out first.
///
/// `pending` must hold only thresholds that have not fired yet. A threshold
/// is crossed when `remaining_secs <= t`; nothing is crossed once the
/// countdown reaches zero, where the final alert takes over.
pub fn evaluate(remaining_secs: u64, pending: &[u64]) -> Vec<u64> {
    if remaining_secs == 0 {
        return Vec::new();
    }
    let mut crossed: Vec<u64> = pending
        .iter()
        .copied()
        .filter(|&t| remaining_secs <= t)
        .collect();
    crossed.sort_unstable_by(|a, b| b.cmp(a));
    crossed
}
