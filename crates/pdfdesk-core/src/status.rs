//! Status reporting and output delivery
//!
//! The dispatcher reports through [`StatusSink`] and hands results to an
//! [`OutputSink`]; front ends decide how each is shown or stored.

use serde::{Deserialize, Serialize};

use crate::command::OutputFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// Text for the status chip: "Ready" on success, else the severity name.
    pub fn chip_label(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Success => "Ready",
            Severity::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

pub trait StatusSink {
    fn report(&mut self, status: StatusMessage);
}

impl StatusSink for Vec<StatusMessage> {
    fn report(&mut self, status: StatusMessage) {
        self.push(status);
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn report(&mut self, _status: StatusMessage) {}
}

/// Receives finished output files.
pub trait OutputSink {
    fn deliver(&mut self, file: OutputFile) -> std::io::Result<()>;
}

impl OutputSink for Vec<OutputFile> {
    fn deliver(&mut self, file: OutputFile) -> std::io::Result<()> {
        self.push(file);
        Ok(())
    }
}
