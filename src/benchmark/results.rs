//! Benchmark results collection, storage, and export.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::benchmark::suite::CheckFailure;
use crate::error::ReportError;
use crate::metrics::TimingStats;

/// One target's measured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: String,
    pub description: String,
    /// Average cost in milliseconds over all repeats.
    pub average_ms: f64,
    pub stats: TimingStats,
    /// Soft-verification mismatches observed during setup/teardown.
    pub check_failures: Vec<CheckFailure>,
}

impl TargetReport {
    pub fn is_clean(&self) -> bool {
        self.check_failures.is_empty()
    }
}

/// One suite's target reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub description: String,
    pub targets: Vec<TargetReport>,
}

/// Host information for context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub cpu_cores: usize,
    pub harness_version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            harness_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Complete report for one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub repeat_count: usize,
    pub system_info: SystemInfo,
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn new(repeat_count: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            repeat_count,
            system_info: SystemInfo::default(),
            suites: Vec::new(),
        }
    }

    pub fn add_suite(&mut self, suite: SuiteReport) {
        self.suites.push(suite);
    }

    /// True if any target recorded a verification mismatch.
    pub fn has_failures(&self) -> bool {
        self.suites
            .iter()
            .flat_map(|s| &s.targets)
            .any(|t| !t.is_clean())
    }

    pub fn failure_count(&self) -> usize {
        self.suites
            .iter()
            .flat_map(|s| &s.targets)
            .map(|t| t.check_failures.len())
            .sum()
    }

    /// Save the report as pretty JSON under `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| ReportError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let filename = format!(
            "benchmark_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(filename);

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| ReportError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DurationSamples;
    use std::time::Duration;

    fn sample_report() -> RunReport {
        let mut samples = DurationSamples::default();
        samples.add_sample(Duration::from_millis(2));
        samples.add_sample(Duration::from_millis(4));

        let mut report = RunReport::new(2);
        report.add_suite(SuiteReport {
            suite: "create elements".to_string(),
            description: "element creation workload".to_string(),
            targets: vec![TargetReport {
                target: "marshalled".to_string(),
                description: "per-call string marshalling".to_string(),
                average_ms: samples.average_ms(),
                stats: samples.stats(),
                check_failures: Vec::new(),
            }],
        });
        report
    }

    #[test]
    fn clean_report_has_no_failures() {
        let report = sample_report();
        assert!(!report.has_failures());
        assert_eq!(report.failure_count(), 0);
    }

    #[test]
    fn failures_are_counted_across_suites() {
        let mut report = sample_report();
        report.suites[0].targets[0].check_failures.push(CheckFailure {
            what: "element count".into(),
            expected: "10000".into(),
            actual: "0".into(),
        });
        assert!(report.has_failures());
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn save_writes_parseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_report().save(dir.path()).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.repeat_count, 2);
        assert_eq!(parsed.suites.len(), 1);
        assert_eq!(parsed.suites[0].targets[0].average_ms, 3.0);
    }

    #[test]
    fn save_creates_the_results_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results/nested");
        let path = sample_report().save(&nested).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }
}
