use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stats::HumanDuration;
use crate::targets::join_host_port;

/// One (host, port) pair to probe. The host string is shared by all jobs
/// generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanJob {
    pub host: Arc<str>,
    pub port: u16,
}

/// Result of probing one job after its retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub job: ScanJob,
    pub open: bool,
}

/// An open port as reported to the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpenPort {
    /// Resolved address of the job host, or the host as given.
    pub address: String,
    pub port: u16,
}

impl fmt::Display for OpenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open", join_host_port(&self.address, self.port))
    }
}

/// Aggregate figures for a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub total_jobs: u64,
    pub scanned: u64,
    pub open: u64,
    pub elapsed_ms: u64,
    /// Average ports per second over the whole run.
    pub rate: f64,
}

impl ScanSummary {
    pub fn new(total_jobs: u64, scanned: u64, open: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        Self {
            total_jobs,
            scanned,
            open,
            elapsed_ms: elapsed.as_millis() as u64,
            rate: if secs > 0.0 { scanned as f64 / secs } else { 0.0 },
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Scan Complete ===")?;
        writeln!(f, "Total scanned: {}", self.scanned)?;
        writeln!(f, "Open ports found: {}", self.open)?;
        writeln!(f, "Time elapsed: {}", HumanDuration(self.elapsed()))?;
        write!(f, "Average rate: {:.0} ports/second", self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_port_line() {
        let v4 = OpenPort {
            address: "10.0.0.5".into(),
            port: 22,
        };
        let v6 = OpenPort {
            address: "::1".into(),
            port: 8080,
        };
        assert_eq!(v4.to_string(), "10.0.0.5:22 open");
        assert_eq!(v6.to_string(), "[::1]:8080 open");
    }

    #[test]
    fn summary_rate_handles_zero_elapsed() {
        let s = ScanSummary::new(0, 0, 0, Duration::ZERO);
        assert_eq!(s.rate, 0.0);
        let s = ScanSummary::new(10, 10, 1, Duration::from_secs(2));
        assert_eq!(s.rate, 5.0);
        assert!(s.to_string().contains("Average rate: 5 ports/second"));
    }

    #[test]
    fn summary_serializes() {
        let s = ScanSummary::new(4, 4, 1, Duration::from_millis(1500));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["total_jobs"], 4);
        assert_eq!(json["elapsed_ms"], 1500);
    }
}
