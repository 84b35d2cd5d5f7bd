//! Injected log sinks.
//!
//! Operations that report diagnostics take a `&dyn LogSink` instead of
//! writing to a process-wide logger.

use std::sync::Mutex;

/// Severity attached to a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// Destination for diagnostic messages produced during conversion.
pub trait LogSink: Send + Sync {
    /// Records one message.
    fn record(&self, level: LogLevel, message: &str);
}

/// Sink that forwards every record to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
        }
    }
}

/// Sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Returns the messages recorded at `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl LogSink for CollectingSink {
    fn record(&self, level: LogLevel, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_filters_by_level() {
        let sink = CollectingSink::new();
        sink.record(LogLevel::Warn, "missing key");
        sink.record(LogLevel::Debug, "detail");

        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.messages_at(LogLevel::Warn), vec!["missing key"]);
    }
}
