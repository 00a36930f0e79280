use std::future::Future;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{lookup_host, TcpStream};
use tokio::time;
use tracing::trace;

/// Retry budget and timing for a single (host, port) probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Maximum number of connect attempts.
    pub max_retries: u32,
    /// Deadline for each connect attempt, name resolution included.
    pub timeout: Duration,
    /// Pause between failed attempts.
    pub delay: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            timeout: Duration::from_millis(500),
            delay: Duration::from_millis(100),
        }
    }
}

/// A single connect attempt to `host:port`, without deadline or retries.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> io::Result<()>;
}

/// Plain TCP connect; the stream is dropped (closed) right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> io::Result<()> {
        TcpStream::connect((host, port)).await.map(drop)
    }
}

/// Probe `host:port` with plain TCP connects. Returns true as soon as one
/// attempt connects.
pub async fn attempt(host: &str, port: u16, policy: &ProbePolicy) -> bool {
    attempt_via(&TcpConnector, host, port, policy).await
}

/// [`attempt`] through an arbitrary [`Connector`].
pub async fn attempt_via<C>(connector: &C, host: &str, port: u16, policy: &ProbePolicy) -> bool
where
    C: Connector + ?Sized,
{
    attempt_with(policy, || connector.connect(host, port)).await
}

/// Retry loop behind [`attempt`], generic over the connect operation.
///
/// Refused, unreachable and timed-out attempts all consume the same budget.
pub async fn attempt_with<F, Fut>(policy: &ProbePolicy, mut connect: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    for n in 1..=policy.max_retries {
        match time::timeout(policy.timeout, connect()).await {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => trace!(attempt = n, error = %e, "connect failed"),
            Err(_) => trace!(attempt = n, "connect timed out"),
        }
        if n < policy.max_retries {
            time::sleep(policy.delay).await;
        }
    }
    false
}

/// Best-effort address for display: the first address `host` resolves to,
/// or `host` itself when resolution fails.
pub async fn resolve_display(host: &str) -> String {
    match lookup_host((host, 0)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr.ip().to_string(),
            None => host.to_string(),
        },
        Err(e) => {
            trace!(%host, error = %e, "display lookup failed");
            host.to_string()
        }
    }
}
