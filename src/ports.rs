use std::collections::BTreeSet;

use crate::error::{Result, ScanError};

/// A deduplicated set of TCP ports (1..=65535), iterated in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSet(BTreeSet<u16>);

impl PortSet {
    /// Every valid TCP port, used when no port spec is given.
    pub fn full() -> Self {
        Self((1..=u16::MAX).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.0.contains(&port)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|&p| p != 0).collect())
    }
}

/// Parse a comma-separated port spec such as `22,80-82, 443`.
///
/// Supported tokens:
/// - single port number: `80`
/// - inclusive range: `8000-8010` (spaces around the hyphen are fine)
///
/// Repeated values and overlapping ranges collapse silently. Empty input
/// returns `Ok(None)`, which callers treat as "scan every port".
pub fn parse_port_spec(spec: &str) -> Result<Option<PortSet>> {
    if spec.trim().is_empty() {
        return Ok(None);
    }

    let mut set = BTreeSet::new();
    for raw in spec.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        if token.contains('-') {
            let parts: Vec<&str> = token.split('-').collect();
            if parts.len() != 2 {
                return Err(ScanError::port(token, "expected `start-end`"));
            }
            let start = parse_port_str(token, parts[0].trim())?;
            let end = parse_port_str(token, parts[1].trim())?;
            if start > end {
                return Err(ScanError::port(
                    token,
                    format!("range start {start} is greater than end {end}"),
                ));
            }
            set.extend(start..=end);
            continue;
        }

        set.insert(parse_port_str(token, token)?);
    }

    Ok(Some(PortSet(set)))
}

fn parse_port_str(token: &str, s: &str) -> Result<u16> {
    let val: u32 = s
        .parse()
        .map_err(|_| ScanError::port(token, format!("`{s}` is not a port number")))?;
    if val == 0 || val > 65535 {
        return Err(ScanError::port(token, format!("port out of range: {val}")));
    }
    Ok(val as u16)
}
