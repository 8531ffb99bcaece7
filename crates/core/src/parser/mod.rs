//! Parser stages and the pipeline that runs them
//!
//! Each stage reads state produced by discovery or by earlier stages,
//! resolves raw documents through the resource graph, decodes them and
//! appends new items. Stages never fail for bad input: they return
//! [`Diagnostics`] and carry on with the next item.
//!
//! # Stage contract
//!
//! 1. If the source model is not a [`SourceModel::BizTalkGroup`], do nothing.
//! 2. For every application (or nested item), resolve the document through
//!    its [`ResourceKeys`]:
//!    - key does not resolve: warning or error depending on the document,
//!      apply a fallback, continue;
//!    - content does not decode: error, leave the typed field empty, continue;
//!    - otherwise build items, link them both ways, append under the owner.
//!
//! # Ordering
//!
//! The order is fixed ([`StageId::ALL`]) and every stage declares the
//! stages it consumes ([`StageId::requires`]). [`ParserPipelineBuilder`]
//! rejects a list where a consumer runs before its producer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::config::PipelineConfig;
use crate::context::{Diagnostics, EventId, MigrationContext, Severity};
use crate::error::{ContentError, PipelineError};
use crate::graph::{NewResource, RefId, ResourceGraph};
use crate::logging::Logger;
use crate::model::{MigrationModel, ParsedApplicationGroup, ResourceKeys, SourceModel};

mod application_definition;
mod binding_file;
mod distribution_list;
mod document_schema;
mod filter;
mod orchestration_module;
mod pipeline_component;
mod pipeline_document;
mod property_schema_property;
mod receive_port;
mod send_port;
mod service_declaration;
mod transform;

#[cfg(test)]
pub(crate) mod test_support;

pub use application_definition::ApplicationDefinitionParser;
pub use binding_file::BindingFileParser;
pub use distribution_list::DistributionListParser;
pub use document_schema::DocumentSchemaParser;
pub use filter::parse_filter;
pub use orchestration_module::OrchestrationModuleParser;
pub use pipeline_component::PipelineComponentParser;
pub use pipeline_document::PipelineDocumentParser;
pub use property_schema_property::PropertySchemaPropertyParser;
pub use receive_port::ReceivePortParser;
pub use send_port::SendPortParser;
pub use service_declaration::OrchestrationServiceDeclarationParser;
pub use transform::TransformParser;

/// Identifies a parser stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    ApplicationDefinition,
    BindingFile,
    SendPort,
    ReceivePort,
    DistributionList,
    DocumentSchema,
    PropertySchemaProperty,
    Transform,
    PipelineDocument,
    PipelineComponent,
    OrchestrationModule,
    OrchestrationServiceDeclaration,
}

impl StageId {
    /// Canonical run order
    pub const ALL: [StageId; 12] = [
        StageId::ApplicationDefinition,
        StageId::BindingFile,
        StageId::SendPort,
        StageId::ReceivePort,
        StageId::DistributionList,
        StageId::DocumentSchema,
        StageId::PropertySchemaProperty,
        StageId::Transform,
        StageId::PipelineDocument,
        StageId::PipelineComponent,
        StageId::OrchestrationModule,
        StageId::OrchestrationServiceDeclaration,
    ];

    /// Stages whose output this stage consumes
    pub fn requires(self) -> &'static [StageId] {
        match self {
            StageId::BindingFile => &[StageId::ApplicationDefinition],
            StageId::SendPort | StageId::ReceivePort => &[StageId::BindingFile],
            StageId::DistributionList => &[StageId::BindingFile, StageId::SendPort],
            StageId::PropertySchemaProperty => &[StageId::DocumentSchema],
            StageId::PipelineComponent => &[StageId::PipelineDocument],
            StageId::OrchestrationServiceDeclaration => &[StageId::OrchestrationModule],
            StageId::ApplicationDefinition
            | StageId::DocumentSchema
            | StageId::Transform
            | StageId::PipelineDocument
            | StageId::OrchestrationModule => &[],
        }
    }

    /// Create the stage implementation
    pub fn stage(self) -> Box<dyn ParserStage> {
        match self {
            StageId::ApplicationDefinition => Box::new(ApplicationDefinitionParser),
            StageId::BindingFile => Box::new(BindingFileParser),
            StageId::SendPort => Box::new(SendPortParser),
            StageId::ReceivePort => Box::new(ReceivePortParser),
            StageId::DistributionList => Box::new(DistributionListParser),
            StageId::DocumentSchema => Box::new(DocumentSchemaParser),
            StageId::PropertySchemaProperty => Box::new(PropertySchemaPropertyParser),
            StageId::Transform => Box::new(TransformParser),
            StageId::PipelineDocument => Box::new(PipelineDocumentParser),
            StageId::PipelineComponent => Box::new(PipelineComponentParser),
            StageId::OrchestrationModule => Box::new(OrchestrationModuleParser),
            StageId::OrchestrationServiceDeclaration => Box::new(OrchestrationServiceDeclarationParser),
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One unit of the parsing pipeline
pub trait ParserStage {
    fn id(&self) -> StageId;

    /// Run the stage over the model
    ///
    /// Never fails: problems are returned as diagnostics.
    fn parse(&self, model: &mut MigrationModel) -> Diagnostics;
}

/// Counts from one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub stages_run: Vec<StageId>,
    pub warnings: usize,
    pub errors: usize,
}

/// A validated, ordered list of stages
pub struct ParserPipeline {
    stages: Vec<Box<dyn ParserStage>>,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for ParserPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserPipeline")
            .field("stages", &self.stage_ids())
            .finish()
    }
}

impl ParserPipeline {
    pub fn builder() -> ParserPipelineBuilder {
        ParserPipelineBuilder::default()
    }

    /// Every stage in canonical order
    pub fn standard(logger: Arc<dyn Logger>) -> Result<Self, PipelineError> {
        Self::from_config(&PipelineConfig::default(), logger)
    }

    /// Canonical order minus the stages the configuration disables
    pub fn from_config(config: &PipelineConfig, logger: Arc<dyn Logger>) -> Result<Self, PipelineError> {
        StageId::ALL
            .into_iter()
            .filter(|id| !config.disabled_stages.contains(id))
            .fold(Self::builder().logger(logger), |builder, id| builder.boxed_stage(id.stage()))
            .build()
    }

    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id()).collect()
    }

    /// Run every stage in order
    ///
    /// Each diagnostic is logged; error-level ones are also recorded in the
    /// context.
    pub fn run(&self, model: &mut MigrationModel, context: &mut MigrationContext) -> RunSummary {
        let mut summary = RunSummary::default();

        for stage in &self.stages {
            let id = stage.id();
            tracing::debug!(stage = %id, "running parser stage");

            let diagnostics = stage.parse(model);
            for diagnostic in diagnostics.iter() {
                let level = match diagnostic.severity {
                    Severity::Warning => Level::WARN,
                    Severity::Error => Level::ERROR,
                };
                self.logger.log(level, diagnostic.event, &diagnostic.message);
            }
            context.record(id, &diagnostics);

            summary.warnings += diagnostics.warnings().count();
            summary.errors += diagnostics.errors().count();
            summary.stages_run.push(id);
        }

        summary
    }
}

/// Builds a [`ParserPipeline`], checking its dependencies
#[derive(Default)]
pub struct ParserPipelineBuilder {
    stages: Vec<Box<dyn ParserStage>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ParserPipelineBuilder {
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn stage(self, stage: impl ParserStage + 'static) -> Self {
        self.boxed_stage(Box::new(stage))
    }

    pub fn boxed_stage(mut self, stage: Box<dyn ParserStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// - `MissingDependency` if no logger was supplied
    /// - `DuplicateStage` if a stage is listed twice
    /// - `UnsatisfiedDependency` if a stage's prerequisite is not listed before it
    pub fn build(self) -> Result<ParserPipeline, PipelineError> {
        let logger = self
            .logger
            .ok_or(PipelineError::MissingDependency { parameter: "logger" })?;

        let mut seen: Vec<StageId> = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let id = stage.id();
            if seen.contains(&id) {
                return Err(PipelineError::DuplicateStage(id));
            }
            if let Some(missing) = id.requires().iter().find(|req| !seen.contains(req)) {
                return Err(PipelineError::UnsatisfiedDependency {
                    stage: id,
                    requires: *missing,
                });
            }
            seen.push(id);
        }

        Ok(ParserPipeline {
            stages: self.stages,
            logger,
        })
    }
}

/// Split the model into the application group and the graph
///
/// `None` means discovery has not produced applications yet, and the
/// stage must do nothing.
pub(crate) fn application_group(model: &mut MigrationModel) -> Option<(&mut ParsedApplicationGroup, &mut ResourceGraph)> {
    match model {
        MigrationModel {
            source: SourceModel::BizTalkGroup(group),
            graph,
        } => Some((group, graph)),
        _ => None,
    }
}

/// Resolve a document through its keys and decode it
///
/// A key that does not resolve is reported with `on_missing` severity;
/// content that does not decode is always an error. Either way `None` is
/// returned and the caller moves on.
pub(crate) fn load_document<T>(
    graph: &ResourceGraph,
    keys: &ResourceKeys,
    document: &str,
    on_missing: Severity,
    diagnostics: &mut Diagnostics,
    decode: impl FnOnce(&str) -> Result<T, ContentError>,
) -> Option<(RefId, T)> {
    let definition = match graph.find_definition(&keys.container_key, &keys.definition_key) {
        Ok(definition) => definition,
        Err(err) => {
            diagnostics.push(
                on_missing,
                EventId::MISSING_RESOURCE,
                format!(
                    "Unable to find the resource definition for {} with key '{}' in container '{}' ({})",
                    document, keys.definition_key, keys.container_key, err
                ),
                Some(keys.definition_key.as_str()),
            );
            return None;
        }
    };

    let content = graph
        .node(definition)
        .and_then(|node| node.content())
        .unwrap_or_default();

    match decode(content) {
        Ok(value) => Some((definition, value)),
        Err(err) => {
            diagnostics.error(
                EventId::MALFORMED_CONTENT,
                format!(
                    "Unable to parse the {} in resource definition '{}': {}",
                    document, keys.definition_key, err
                ),
                Some(keys.definition_key.as_str()),
            );
            None
        }
    }
}

/// Append an item, turning a graph conflict into an error diagnostic
pub(crate) fn append_item(
    graph: &mut ResourceGraph,
    parent: RefId,
    item: NewResource,
    diagnostics: &mut Diagnostics,
) -> Option<RefId> {
    let key = item.key.clone();
    match graph.add_item(parent, item) {
        Ok(ref_id) => Some(ref_id),
        Err(err) => {
            diagnostics.error(
                EventId::GRAPH_CONFLICT,
                format!("Unable to add resource '{}': {}", key, err),
                Some(key.as_str()),
            );
            None
        }
    }
}

/// Key of an existing node, for deriving child keys
pub(crate) fn key_of(graph: &ResourceGraph, ref_id: RefId) -> String {
    graph
        .node(ref_id)
        .map(|node| node.key.clone())
        .unwrap_or_default()
}
