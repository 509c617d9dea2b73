//! Duration sample collection and analysis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Elapsed-time samples collected for one benchmark target.
#[derive(Debug, Default)]
pub struct DurationSamples {
    /// Samples in milliseconds, one per measured repeat.
    samples: Vec<f64>,
}

impl DurationSamples {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Record one measured repeat.
    pub fn add_sample(&mut self, elapsed: Duration) {
        self.samples.push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Average cost in milliseconds: exactly `sum(samples) / len`.
    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Get statistics from the collected samples.
    pub fn stats(&self) -> TimingStats {
        if self.samples.is_empty() {
            return TimingStats::default();
        }

        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let min = sorted.first().copied().unwrap_or(0.0);
        let max = sorted.last().copied().unwrap_or(0.0);
        let median = if sorted.len() % 2 == 0 {
            let mid = sorted.len() / 2;
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };
        let mean = self.average_ms();

        let variance = self
            .samples
            .iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        let std_dev = variance.sqrt();

        TimingStats {
            min_ms: min,
            max_ms: max,
            median_ms: median,
            mean_ms: mean,
            std_dev_ms: std_dev,
            count: self.samples.len(),
        }
    }
}

/// Statistics over one target's duration samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub min_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub count: usize,
}
