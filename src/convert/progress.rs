//! Per-unit progress reporting.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::mpsc::Sender;

/// Emitted once per finished unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Event tag, always `"progress"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Units finished so far, counting this one
    pub current: usize,
    /// Units in the batch
    pub total: usize,
    /// Input file name of the finished unit
    pub file_name: String,
    /// Whether the unit was served from cache
    pub cached: bool,
    /// Failure reason, if the unit failed
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Creates a progress event.
    pub fn new(
        current: usize,
        total: usize,
        file_name: impl Into<String>,
        cached: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            kind: "progress".to_string(),
            current,
            total,
            file_name: file_name.into(),
            cached,
            error,
        }
    }
}

/// Receives progress events. Only the collecting thread calls it.
pub trait ProgressSink {
    /// Handles one event.
    fn emit(&mut self, event: &ProgressEvent);
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<io::Stderr> {
    /// Sink on stderr, keeping stdout free for the final summary.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &ProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(self.writer, "{line}");
            let _ = self.writer.flush();
        }
    }
}

/// Forwards events into a channel.
pub struct ChannelSink(pub Sender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: &ProgressEvent) {
        let _ = self.0.send(event.clone());
    }
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: &ProgressEvent) {}
}
