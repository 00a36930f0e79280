use std::fs;
use std::path::PathBuf;

use tcp_probe_rs::targets::{expand_cidr, read_lines, HostSet};
use tcp_probe_rs::ScanError;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tcp-probe-rs-{}-{name}", std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn block_sizes() {
    for prefix in [24u32, 26, 28, 30] {
        let ips = expand_cidr(&format!("172.16.0.0/{prefix}")).unwrap();
        assert_eq!(ips.len(), 2usize.pow(32 - prefix) - 2, "/{prefix}");
    }
}

#[test]
fn invalid_cidr_yields_nothing() {
    assert!(matches!(
        expand_cidr("10.0.0/24"),
        Err(ScanError::InvalidCidr { .. })
    ));
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        read_lines("/nonexistent/hosts.txt"),
        Err(ScanError::Io { .. })
    ));
}

#[test]
fn sources_concatenate_in_order_and_skip_bad_cidrs() {
    let hosts = temp_file("hosts.txt", "# lab\nexample.com\n\n10.9.9.9\n127.0.0.1\n");
    let cidrs = temp_file("cidrs.txt", "192.168.5.0/30\nnot-a-cidr\n10.1.1.1/32\n");

    let set = HostSet::from_sources(
        Some("127.0.0.1"),
        Some(hosts.as_path()),
        Some(cidrs.as_path()),
    )
    .unwrap();
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![
            "127.0.0.1",
            "example.com",
            "10.9.9.9",
            "127.0.0.1",
            "192.168.5.1",
            "192.168.5.2",
            "10.1.1.1",
        ]
    );

    let _ = fs::remove_file(hosts);
    let _ = fs::remove_file(cidrs);
}

#[test]
fn unreadable_hosts_file_is_fatal() {
    let missing = PathBuf::from("/nonexistent/hosts.txt");
    assert!(HostSet::from_sources(Some("10.0.0.1"), Some(missing.as_path()), None).is_err());
}
