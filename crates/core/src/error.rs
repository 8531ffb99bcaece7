//! Error types
//!
//! Only [`PipelineError`] is ever fatal. The others describe data-quality
//! conditions that parser stages turn into diagnostics.

use crate::graph::RefId;
use crate::parser::StageId;

/// Errors from mutating the resource graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A node with this key already exists somewhere in the graph
    #[error("a resource with key '{0}' already exists")]
    DuplicateKey(String),

    /// The node cannot live under the requested parent
    #[error("cannot add '{key}': {reason}")]
    InvalidNesting { key: String, reason: &'static str },

    /// The parent identifier does not belong to this graph
    #[error("unknown resource {0}")]
    UnknownRefId(RefId),

    /// Relationships may only link items
    #[error("resource {0} is not an item and cannot take part in a relationship")]
    InvalidRelationship(RefId),

    /// A loaded graph whose nodes disagree with its edges
    #[error("inconsistent resource '{key}': {reason}")]
    Inconsistent { key: String, reason: &'static str },
}

/// A lookup that found nothing
///
/// Callers decide whether this is a warning or an error in their context.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no {kind} with key '{key}'")]
    NotFound { kind: &'static str, key: String },
}

impl LookupError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { kind, key: key.into() }
    }
}

/// Raw content that could not be turned into a typed document
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Content is empty or whitespace only
    #[error("document is empty")]
    Empty,

    /// Content is not well-formed XML
    #[error("invalid xml: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Well-formed XML of the wrong document type
    #[error("unexpected root element '{found}', expected '{expected}'")]
    UnexpectedRoot { expected: &'static str, found: String },

    /// A required element is absent
    #[error("missing required element '{0}'")]
    MissingElement(&'static str),

    /// A required attribute is absent
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// Orchestration source whose designer data block is never closed or holds no XML
    #[error("designer data block is not terminated or contains no meta-model")]
    InvalidDesignerData,
}

/// Errors building a parser pipeline
///
/// These indicate a programming error in the caller, not bad input data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A required constructor argument was not supplied
    #[error("missing required dependency '{parameter}'")]
    MissingDependency { parameter: &'static str },

    /// A stage runs before (or without) a stage it depends on
    #[error("stage {stage} requires {requires} to run earlier in the pipeline")]
    UnsatisfiedDependency { stage: StageId, requires: StageId },

    /// The same stage appears twice
    #[error("stage {0} appears more than once")]
    DuplicateStage(StageId),
}
