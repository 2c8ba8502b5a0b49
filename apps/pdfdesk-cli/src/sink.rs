//! Terminal status output and on-disk output files.

use std::fs;
use std::io;
use std::path::PathBuf;

use pdfdesk_core::{OutputFile, OutputSink, StatusMessage, StatusSink};
use tracing::debug;

/// Prints status lines to stderr as `[Label] message`.
#[derive(Debug, Default)]
pub struct TerminalStatus;

impl StatusSink for TerminalStatus {
    fn report(&mut self, status: StatusMessage) {
        eprintln!("[{}] {}", status.severity.chip_label(), status.message);
    }
}

/// Writes each output into a directory, creating it on first use.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for DirectorySink {
    fn deliver(&mut self, file: OutputFile) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&file.filename);
        fs::write(&path, &file.bytes)?;
        debug!(path = %path.display(), bytes = file.bytes.len(), "Wrote output");
        self.written.push(path);
        Ok(())
    }
}
