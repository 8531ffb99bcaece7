//! Structured logger used by the pipeline
//!
//! Hosts pick the sink: [`TracingLogger`] forwards to `tracing`,
//! [`MemoryLogger`] keeps entries for later inspection.

use std::sync::Mutex;

use tracing::Level;

use crate::context::EventId;

/// Log a message at a level, tagged with an event id
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, event: EventId, message: &str);
}

/// Forwards to the `tracing` macros
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, event: EventId, message: &str) {
        if level == Level::ERROR {
            tracing::error!(event_id = event.id, event = event.name, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(event_id = event.id, event = event.name, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(event_id = event.id, event = event.name, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(event_id = event.id, event = event.name, "{}", message);
        } else {
            tracing::trace!(event_id = event.id, event = event.name, "{}", message);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub event: EventId,
    pub message: String,
}

/// Records every entry in order
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn entries_at(&self, level: Level) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, event: EventId, message: &str) {
        let entry = LogEntry {
            level,
            event,
            message: message.to_string(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_keeps_order() {
        let logger = MemoryLogger::new();
        logger.log(Level::WARN, EventId::MISSING_RESOURCE, "first");
        logger.log(Level::ERROR, EventId::MALFORMED_CONTENT, "second");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].event, EventId::MALFORMED_CONTENT);
        assert_eq!(logger.entries_at(Level::WARN).len(), 1);
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        // No subscriber installed: logging is a no-op and must not panic
        TracingLogger.log(Level::ERROR, EventId::GRAPH_CONFLICT, "duplicate key");
    }
}
