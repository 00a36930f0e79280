//! Destinations for live scan output.
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::{Result, ScanError};
use crate::stats::Progress;
use crate::types::OpenPort;

/// Receives open ports as they are found and periodic progress.
///
/// Called from many workers at once; implementations must write each event
/// as one unit.
pub trait ReportSink: Send + Sync {
    fn open_port(&self, port: &OpenPort);
    fn progress(&self, progress: &Progress);
}

/// Prints to stdout and optionally mirrors open ports into a result file.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    file: Option<(PathBuf, Mutex<LineWriter<File>>)>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (truncating) the result file. Failure is fatal to the run.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file: Some((path.to_path_buf(), Mutex::new(LineWriter::new(file)))),
        })
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(p, _)| p.as_path())
    }

    fn print_line(line: &str) {
        // A locked stdout keeps lines from different workers intact.
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

impl ReportSink for ConsoleSink {
    fn open_port(&self, port: &OpenPort) {
        let line = port.to_string();
        Self::print_line(&line);
        if let Some((path, file)) = &self.file {
            let mut w = file.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = writeln!(w, "{line}") {
                warn!(path = %path.display(), error = %e, "failed to write result");
            }
        }
    }

    fn progress(&self, progress: &Progress) {
        Self::print_line(&progress.to_string());
    }
}
