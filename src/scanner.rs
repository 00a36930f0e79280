use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::error::Result;
use crate::output::ReportSink;
use crate::ports::PortSet;
use crate::prober::{self, Connector, ProbePolicy, TcpConnector};
use crate::reporter::ProgressReporter;
use crate::stats::ScanStats;
use crate::targets::HostSet;
use crate::types::{OpenPort, ScanJob, ScanOutcome, ScanSummary};

/// Queue slots per worker between the producer and the pool.
const QUEUE_DEPTH_PER_WORKER: usize = 10;

/// Run parameters for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Number of concurrent workers (at least one is always started).
    pub concurrency: usize,
    pub probe: ProbePolicy,
    /// Interval between progress lines.
    pub progress_every: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 100,
            probe: ProbePolicy::default(),
            progress_every: Duration::from_secs(5),
        }
    }
}

impl ScanConfig {
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn queue_capacity(&self) -> usize {
        self.workers().saturating_mul(QUEUE_DEPTH_PER_WORKER)
    }
}

/// Number of jobs a scan of `hosts` × `ports` generates.
pub fn total_jobs(hosts: &HostSet, ports: &PortSet) -> u64 {
    hosts.len() as u64 * ports.len() as u64
}

/// Cross product of `hosts` × `ports`, hosts outer and ports inner.
pub fn jobs<'a>(hosts: &'a HostSet, ports: &'a PortSet) -> impl Iterator<Item = ScanJob> + 'a {
    hosts.iter().flat_map(move |host| {
        let host: Arc<str> = Arc::from(host);
        ports.iter().map(move |port| ScanJob {
            host: host.clone(),
            port,
        })
    })
}

/// Probe every (host, port) pair with a fixed pool of workers.
///
/// - A single producer walks hosts outer, ports inner, into a bounded queue;
///   it waits whenever the queue is full.
/// - Exactly `config.workers()` workers drain the queue; each job is taken by
///   one worker only.
/// - Open ports go to `sink` as soon as they are found.
/// - The summary is computed after every worker has exited and the progress
///   reporter has been stopped.
pub async fn run(
    hosts: &HostSet,
    ports: &PortSet,
    config: &ScanConfig,
    sink: Arc<dyn ReportSink>,
) -> Result<ScanSummary> {
    run_with(hosts, ports, config, sink, Arc::new(TcpConnector)).await
}

/// [`run`] with a custom [`Connector`] for each attempt.
pub async fn run_with<C>(
    hosts: &HostSet,
    ports: &PortSet,
    config: &ScanConfig,
    sink: Arc<dyn ReportSink>,
    connector: Arc<C>,
) -> Result<ScanSummary>
where
    C: Connector + 'static,
{
    let total = total_jobs(hosts, ports);
    dispatch(jobs(hosts, ports), total, config, sink, connector).await
}

pub(crate) async fn dispatch<I, C>(
    jobs: I,
    total: u64,
    config: &ScanConfig,
    sink: Arc<dyn ReportSink>,
    connector: Arc<C>,
) -> Result<ScanSummary>
where
    I: IntoIterator<Item = ScanJob>,
    C: Connector + 'static,
{
    let stats = Arc::new(ScanStats::new());
    let reporter =
        ProgressReporter::spawn(stats.clone(), total, config.progress_every, sink.clone());

    let (tx, rx) = mpsc::channel::<ScanJob>(config.queue_capacity());
    let rx = Arc::new(Mutex::new(rx));

    let mut workers = JoinSet::new();
    for id in 0..config.workers() {
        workers.spawn(worker(
            id,
            rx.clone(),
            config.probe,
            connector.clone(),
            stats.clone(),
            sink.clone(),
        ));
    }
    debug!(workers = config.workers(), total, "dispatching jobs");

    for job in jobs {
        if tx.send(job).await.is_err() {
            // Every worker is gone; the join below reports why.
            break;
        }
    }
    // Closing the queue is the workers' only stop signal.
    drop(tx);

    let mut failure = None;
    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            failure.get_or_insert(e);
        }
    }
    reporter.stop().await;

    if let Some(e) = failure {
        return Err(e.into());
    }

    let snap = stats.snapshot();
    debug!(scanned = snap.scanned, open = snap.open, "scan finished");
    Ok(ScanSummary::new(total, snap.scanned, snap.open, snap.elapsed))
}

async fn worker<C: Connector>(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<ScanJob>>>,
    policy: ProbePolicy,
    connector: Arc<C>,
    stats: Arc<ScanStats>,
    sink: Arc<dyn ReportSink>,
) {
    loop {
        // Lock is released before probing so other workers can pull.
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else { break };

        let open = prober::attempt_via(connector.as_ref(), &job.host, job.port, &policy).await;
        let outcome = ScanOutcome { job, open };
        if outcome.open {
            report_open(&outcome.job, sink.as_ref()).await;
            stats.record_open();
        }
        stats.record_attempt();
    }
    trace!(worker = id, "queue drained");
}

async fn report_open(job: &ScanJob, sink: &dyn ReportSink) {
    let address = prober::resolve_display(&job.host).await;
    sink.open_port(&OpenPort {
        address,
        port: job.port,
    });
}
