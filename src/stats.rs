use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Counters {
    scanned: u64,
    open: u64,
}

/// Counters shared by every worker and the progress reporter for one run.
///
/// Both counters sit behind one lock so a snapshot never sees an open count
/// from a later point than its scanned count.
#[derive(Debug)]
pub struct ScanStats {
    counters: Mutex<Counters>,
    started: Instant,
}

/// Point-in-time copy of [`ScanStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub scanned: u64,
    pub open: u64,
    pub elapsed: Duration,
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            started: Instant::now(),
        }
    }

    /// Count one finished job, open or not.
    pub fn record_attempt(&self) {
        self.lock().scanned += 1;
    }

    pub fn record_open(&self) {
        self.lock().open += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = self.lock();
        StatsSnapshot {
            scanned: c.scanned,
            open: c.open,
            elapsed: self.started.elapsed(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked mid-increment.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress derived from a snapshot and the total job count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub scanned: u64,
    pub total: u64,
    pub open: u64,
    pub percent: f64,
    /// Ports per second; zero until anything has been measured.
    pub rate: f64,
    /// `None` while the rate is still unknown.
    pub eta: Option<Duration>,
}

impl Progress {
    pub fn compute(snapshot: &StatsSnapshot, total: u64) -> Self {
        let secs = snapshot.elapsed.as_secs_f64();
        let percent = if total == 0 {
            0.0
        } else {
            snapshot.scanned as f64 * 100.0 / total as f64
        };
        let rate = if secs > 0.0 {
            snapshot.scanned as f64 / secs
        } else {
            0.0
        };
        let eta = (rate > 0.0).then(|| {
            let remaining = total.saturating_sub(snapshot.scanned) as f64;
            Duration::from_secs_f64(remaining / rate)
        });

        Self {
            scanned: snapshot.scanned,
            total,
            open: snapshot.open,
            percent,
            rate,
            eta,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Progress] {:.2}% | Scanned: {}/{} | Open: {} | Rate: {:.0}/s | ETA: ",
            self.percent, self.scanned, self.total, self.open, self.rate
        )?;
        match self.eta {
            Some(eta) => write!(f, "{}", HumanDuration(eta)),
            None => f.write_str("unknown"),
        }
    }
}

/// Whole-second duration such as `1h2m5s`, `3m0s` or `42s`.
#[derive(Debug, Clone, Copy)]
pub struct HumanDuration(pub Duration);

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs_f64().round() as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            write!(f, "{h}h{m}m{s}s")
        } else if m > 0 {
            write!(f, "{m}m{s}s")
        } else {
            write!(f, "{s}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn snap(scanned: u64, open: u64, elapsed: Duration) -> StatsSnapshot {
        StatsSnapshot {
            scanned,
            open,
            elapsed,
        }
    }

    #[test]
    fn counters_accumulate() {
        let stats = ScanStats::new();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_open();
        let s = stats.snapshot();
        assert_eq!((s.scanned, s.open), (2, 1));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let stats = Arc::new(ScanStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        stats.record_attempt();
                        if i % 10 == 0 {
                            stats.record_open();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let s = stats.snapshot();
        assert_eq!(s.scanned, 8000);
        assert_eq!(s.open, 800);
    }

    #[test]
    fn elapsed_is_recomputed() {
        let stats = ScanStats::new();
        let first = stats.snapshot().elapsed;
        std::thread::sleep(Duration::from_millis(5));
        assert!(stats.snapshot().elapsed > first);
    }

    #[test]
    fn zero_elapsed_has_no_rate_or_eta() {
        let p = Progress::compute(&snap(0, 0, Duration::ZERO), 100);
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.rate, 0.0);
        assert_eq!(p.eta, None);
        assert!(p.to_string().ends_with("ETA: unknown"));
    }

    #[test]
    fn zero_total_is_tolerated() {
        let p = Progress::compute(&snap(0, 0, Duration::from_secs(1)), 0);
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.eta, None);
    }

    #[test]
    fn rate_and_eta() {
        let p = Progress::compute(&snap(50, 2, Duration::from_secs(10)), 100);
        assert_eq!(p.percent, 50.0);
        assert_eq!(p.rate, 5.0);
        assert_eq!(p.eta, Some(Duration::from_secs(10)));
        assert_eq!(
            p.to_string(),
            "[Progress] 50.00% | Scanned: 50/100 | Open: 2 | Rate: 5/s | ETA: 10s"
        );
    }

    #[test]
    fn human_duration_format() {
        assert_eq!(HumanDuration(Duration::ZERO).to_string(), "0s");
        assert_eq!(HumanDuration(Duration::from_millis(1600)).to_string(), "2s");
        assert_eq!(HumanDuration(Duration::from_secs(65)).to_string(), "1m5s");
        assert_eq!(HumanDuration(Duration::from_secs(3725)).to_string(), "1h2m5s");
    }
}
