//! Performance measurement utilities.

mod timing;

pub use timing::{DurationSamples, TimingStats};
