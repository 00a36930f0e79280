use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tcp_probe_rs::output::ConsoleSink;
use tcp_probe_rs::ports::{parse_port_spec, PortSet};
use tcp_probe_rs::prober::ProbePolicy;
use tcp_probe_rs::scanner::{self, ScanConfig};
use tcp_probe_rs::targets::HostSet;

/// tcp-probe-rs — concurrent TCP connect probe with retries and live progress.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tcp-probe-rs",
    version,
    about = "Concurrent TCP connect probe with retries and live progress.",
    long_about = None
)]
struct Cli {
    /// Single host to scan (name or IP).
    #[arg(long)]
    host: Option<String>,

    /// File with hosts, one per line (`#` comments and blank lines skipped).
    #[arg(long = "hosts-file")]
    hosts_file: Option<PathBuf>,

    /// File with CIDR ranges, one per line.
    #[arg(long = "cidr-file")]
    cidr_file: Option<PathBuf>,

    /// Ports to scan, e.g. `80`, `80-443`, `22,80,8000-8100`. Defaults to 1-65535.
    #[arg(short, long)]
    ports: Option<String>,

    /// Also write open results to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent workers.
    #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    concurrency: u32,

    /// Connect attempts per port.
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    retries: u32,

    /// Per-attempt connect timeout in milliseconds.
    #[arg(short = 't', long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Pause between attempts in milliseconds.
    #[arg(short = 's', long = "delay-ms", default_value_t = 100)]
    delay_ms: u64,

    /// Seconds between progress lines.
    #[arg(long = "progress-secs", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    progress_secs: u64,

    /// Print the final summary as JSON as well.
    #[arg(long = "summary-json", default_value_t = false)]
    summary_json: bool,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            concurrency: self.concurrency as usize,
            probe: ProbePolicy {
                max_retries: self.retries,
                timeout: Duration::from_millis(self.timeout_ms),
                delay: Duration::from_millis(self.delay_ms),
            },
            progress_every: Duration::from_secs(self.progress_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "tcp_probe_rs=debug"
    } else {
        "tcp_probe_rs=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let hosts = HostSet::from_sources(
        cli.host.as_deref(),
        cli.hosts_file.as_deref(),
        cli.cidr_file.as_deref(),
    )
    .context("failed to load targets")?;

    let ports = parse_port_spec(cli.ports.as_deref().unwrap_or(""))
        .context("failed to parse ports")?
        .unwrap_or_else(PortSet::full);

    let sink = match cli.output.as_deref() {
        Some(path) => ConsoleSink::with_file(path).context("failed to create output file")?,
        None => ConsoleSink::new(),
    };

    let total = scanner::total_jobs(&hosts, &ports);
    println!(
        "Scanning {} host(s) across {} ports ({} total combinations)...",
        hosts.len(),
        ports.len(),
        total
    );
    if let Some(path) = sink.file_path() {
        println!("Output will be saved to: {}", path.display());
    }

    let config = cli.scan_config();
    let summary = scanner::run(&hosts, &ports, &config, Arc::new(sink)).await?;

    println!("\n{summary}");
    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_scan_config() {
        let cli = Cli::parse_from(["tcp-probe-rs"]);
        assert_eq!(cli.scan_config(), ScanConfig::default());
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(Cli::try_parse_from(["tcp-probe-rs", "-c", "0"]).is_err());
        assert!(Cli::try_parse_from(["tcp-probe-rs", "-r", "0"]).is_err());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::parse_from([
            "tcp-probe-rs", "--host", "10.0.0.1", "-p", "22,80", "-c", "8", "-r", "2", "-t", "250",
            "-s", "50",
        ]);
        let c = cli.scan_config();
        assert_eq!(c.concurrency, 8);
        assert_eq!(c.probe.max_retries, 2);
        assert_eq!(c.probe.timeout, Duration::from_millis(250));
        assert_eq!(c.probe.delay, Duration::from_millis(50));
        assert_eq!(cli.ports.as_deref(), Some("22,80"));
    }
}
