//! Migration context and structured diagnostics
//!
//! A parser stage never fails for bad input. It returns [`Diagnostics`]
//! alongside its mutations, and the pipeline merges them: every entry is
//! logged, and `Error` entries are appended to [`MigrationContext::errors`].

use std::fmt;

use serde::Serialize;

use crate::parser::StageId;

/// Identifier of a kind of logged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventId {
    pub id: u32,
    pub name: &'static str,
}

impl EventId {
    /// A referenced key does not resolve
    pub const MISSING_RESOURCE: EventId = EventId { id: 1001, name: "MissingResource" };
    /// Resolved content could not be parsed
    pub const MALFORMED_CONTENT: EventId = EventId { id: 1002, name: "MalformedContent" };
    /// A parsed document lacks an element the stage needs
    pub const MISSING_ELEMENT: EventId = EventId { id: 1003, name: "MissingElement" };
    /// A new item could not be added to the graph
    pub const GRAPH_CONFLICT: EventId = EventId { id: 1004, name: "GraphConflict" };
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub event: EventId,
    pub message: String,
    /// Key of the resource the problem is about
    pub resource_key: Option<String>,
}

/// Diagnostics produced by one stage run
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, event: EventId, message: impl Into<String>, resource_key: Option<&str>) {
        self.entries.push(Diagnostic {
            severity,
            event,
            message: message.into(),
            resource_key: resource_key.map(str::to_string),
        });
    }

    pub fn warning(&mut self, event: EventId, message: impl Into<String>, resource_key: Option<&str>) {
        self.push(Severity::Warning, event, message, resource_key);
    }

    pub fn error(&mut self, event: EventId, message: impl Into<String>, resource_key: Option<&str>) {
        self.push(Severity::Error, event, message, resource_key);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An error recorded against the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationError {
    pub stage: StageId,
    pub event: EventId,
    pub message: String,
    pub resource_key: Option<String>,
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.event, self.message)
    }
}

/// Shared diagnostics sink for one migration run
///
/// Append-only. Nothing in the pipeline reads it for control flow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationContext {
    pub errors: Vec<MigrationError>,
}

impl MigrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the error-level entries of a stage's diagnostics
    pub fn record(&mut self, stage: StageId, diagnostics: &Diagnostics) {
        self.errors.extend(diagnostics.errors().map(|d| MigrationError {
            stage,
            event: d.event,
            message: d.message.clone(),
            resource_key: d.resource_key.clone(),
        }));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
