//! Library crate for tcp-probe-rs: target expansion, port parsing and the
//! bounded concurrent TCP connect scan engine.
pub mod error;
pub mod output;
pub mod ports;
pub mod prober;
pub mod reporter;
pub mod scanner;
pub mod stats;
pub mod targets;
pub mod types;

pub use error::{Result, ScanError};
