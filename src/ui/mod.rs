//! Operator-facing console output.

pub mod countdown;

pub use countdown::{Countdown, WaitOutcome};
