use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use ipnet::IpNet;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};

/// Widest blocks (in host bits) that will be enumerated: a /8 for IPv4 and
/// a /112 for IPv6.
const MAX_V4_HOST_BITS: u8 = 24;
const MAX_V6_HOST_BITS: u8 = 16;

/// Host used when no source yields a target.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Expand a CIDR block into its usable host addresses, ascending.
///
/// Blocks with more than two addresses lose their network and broadcast
/// addresses; /31 and /32 (and /127, /128) are returned whole.
pub fn expand_cidr(cidr: &str) -> Result<Vec<String>> {
    let input = cidr.trim();
    let net: IpNet = input.parse().map_err(|e| ScanError::cidr(input, e))?;

    let mut ips: Vec<String> = match net {
        IpNet::V4(n4) => {
            if 32 - n4.prefix_len() > MAX_V4_HOST_BITS {
                return Err(too_large(input, 32 - MAX_V4_HOST_BITS));
            }
            let start = u32::from(n4.network());
            let end = u32::from(n4.broadcast());
            (start..=end).map(|n| Ipv4Addr::from(n).to_string()).collect()
        }
        IpNet::V6(n6) => {
            if 128 - n6.prefix_len() > MAX_V6_HOST_BITS {
                return Err(too_large(input, 128 - MAX_V6_HOST_BITS));
            }
            let start = u128::from(n6.network());
            let end = u128::from(n6.broadcast());
            (start..=end).map(|n| Ipv6Addr::from(n).to_string()).collect()
        }
    };

    if ips.len() > 2 {
        ips.pop();
        ips.remove(0);
    }
    Ok(ips)
}

fn too_large(input: &str, min_prefix: u8) -> ScanError {
    ScanError::cidr(
        input,
        format!("block too large to enumerate (shortest allowed prefix is /{min_prefix})"),
    )
}

/// Read a line-oriented target file.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_lines(&content))
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Ordered list of hosts to probe. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSet(Vec<String>);

impl HostSet {
    pub fn new(hosts: Vec<String>) -> Self {
        Self(hosts)
    }

    /// Assemble hosts from an explicit host, a hosts file and a CIDR file,
    /// in that order. Unreadable files are fatal; malformed CIDR entries are
    /// logged and skipped. Falls back to the loopback address when empty.
    pub fn from_sources(
        host: Option<&str>,
        hosts_file: Option<&Path>,
        cidr_file: Option<&Path>,
    ) -> Result<Self> {
        let mut hosts = Vec::new();

        if let Some(h) = host.map(str::trim).filter(|h| !h.is_empty()) {
            hosts.push(h.to_string());
        }

        if let Some(path) = hosts_file {
            let listed = read_lines(path)?;
            debug!(path = %path.display(), count = listed.len(), "loaded hosts file");
            hosts.extend(listed);
        }

        if let Some(path) = cidr_file {
            for cidr in read_lines(path)? {
                match expand_cidr(&cidr) {
                    Ok(ips) => {
                        debug!(%cidr, count = ips.len(), "expanded CIDR");
                        hosts.extend(ips);
                    }
                    Err(e) => warn!("skipping CIDR entry: {e}"),
                }
            }
        }

        if hosts.is_empty() {
            hosts.push(DEFAULT_HOST.to_string());
        }
        Ok(Self(hosts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Format `host:port`, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{host}]:{port}"),
        _ => format!("{host}:{port}"),
    }
}
