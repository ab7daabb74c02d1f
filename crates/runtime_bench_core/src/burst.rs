//! Delay curve for one benchmark burst.
//!
//! The first trigger carries no delay at all, so a freshly reset function is
//! hit immediately and the run always captures a cold start. Subsequent
//! triggers follow a hyperbolic decay of the queue's maximum delay: early
//! samples are spread minutes apart while the tail packs many near-simultaneous
//! arrivals into the end of the window, exercising both cold and warm paths in
//! a single run.

use crate::contract::{ScheduledMessage, DELAY_MAX_SECS, INVOKE_MAX};

/// Delay for the trigger at `sequence_index`. Index 0 is `None` (the delay
/// attribute is left unset rather than set to zero); index `i >= 1` is
/// `min(round(900 / i), 900)` seconds.
pub fn delay_seconds(sequence_index: usize) -> Option<u32> {
    if sequence_index == 0 {
        return None;
    }
    let decayed = (f64::from(DELAY_MAX_SECS) / sequence_index as f64).round() as u32;
    Some(decayed.min(DELAY_MAX_SECS))
}

/// The full burst: exactly `INVOKE_MAX` messages in ascending sequence order,
/// each positioned on the delay curve.
pub fn compute_burst_plan() -> Vec<ScheduledMessage> {
    (0..INVOKE_MAX)
        .map(|sequence_index| ScheduledMessage {
            sequence_index,
            delay_seconds: delay_seconds(sequence_index),
        })
        .collect()
}
