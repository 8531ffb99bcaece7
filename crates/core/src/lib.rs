//! BizTalk Migrator Core Library
//!
//! This library provides the parsing half of a BizTalk migration: a
//! resource graph of discovered containers, documents and items, the
//! source application model that discovery populates, and the ordered
//! parser stages that decode each legacy document and link what they find
//! back into the graph.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use biztalk_migrator_core::{MemoryLogger, MigrationContext, MigrationModel, ParserPipeline};
//!
//! # fn main() -> Result<(), anyhow::Error> {
//! let pipeline = ParserPipeline::standard(Arc::new(MemoryLogger::new()))?;
//! let mut model = MigrationModel::default();
//! let mut context = MigrationContext::new();
//!
//! // Nothing has been discovered, so every stage is a no-op
//! let summary = pipeline.run(&mut model, &mut context);
//! assert_eq!(summary.stages_run.len(), 12);
//! assert_eq!(model.graph.node_count(), 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod logging;
pub mod model;
pub mod parser;
pub mod snapshot;
pub mod xml;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use context::{Diagnostic, Diagnostics, EventId, MigrationContext, MigrationError, Severity};
pub use error::{ContentError, GraphError, LookupError, PipelineError};
pub use graph::{RefId, ResourceGraph, ResourceNode, ResourceType};
pub use logging::{Logger, MemoryLogger, TracingLogger};
pub use model::{MigrationModel, ParsedApplicationGroup, SourceModel, SourceRef};
pub use parser::{ParserPipeline, ParserStage, RunSummary, StageId};
