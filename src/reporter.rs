use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::output::ReportSink;
use crate::stats::{Progress, ScanStats};

/// Background task that samples [`ScanStats`] every `period` and hands a
/// [`Progress`] line to the sink until stopped.
pub struct ProgressReporter {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Start reporting. The first line is emitted one `period` after start.
    pub fn spawn(
        stats: Arc<ScanStats>,
        total: u64,
        period: Duration,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let stop = CancellationToken::new();
        let token = stop.clone();
        // interval panics on a zero period
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            // After a stall, one line and then back to the regular period.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        sink.progress(&Progress::compute(&stats.snapshot(), total));
                    }
                }
            }
            debug!("progress reporter stopped");
        });

        Self { stop, handle }
    }

    /// Signal the reporter and wait for it to exit.
    pub async fn stop(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}
