//! Source application model
//!
//! The upstream discovery step creates one [`ParsedApplication`] per
//! application found in the package, each holding placeholder sub-entities
//! that point at raw content through [`ResourceKeys`]. Parser stages fill in
//! the typed documents and link every sub-entity to the [`ResourceItem`]
//! created for it.
//!
//! Links run both ways without ownership cycles: domain objects store the
//! item's [`RefId`], items store a [`SourceRef`] path back into this model.
//!
//! [`ResourceItem`]: crate::graph::ResourceNode

use serde::{Deserialize, Serialize};

use crate::graph::{RefId, ResourceGraph};

mod application;
mod binding;
mod orchestration;
mod pipeline;
mod schema;

pub use application::{
    AdfFile, AdfProperty, AdfReference, AdfResource, Application, ApplicationDefinition,
    ApplicationDefinitionFile, UNKNOWN_APPLICATION_NAME,
};
pub use binding::{
    BindingFile, BindingInfo, DistributionList, FilterExpression, FilterGroup, FilterOperator,
    FilterStatement, ModuleRef, ModuleService, PipelineRef, ReceiveLocation, ReceivePort, SendPort,
    Transport,
};
pub use orchestration::{ElementProperty, MetaModel, Orchestration, OrchestrationElement};
pub use pipeline::{
    ComponentProperty, Pipeline, PipelineComponent, PipelineDocument, PipelineStage, StageCategory,
};
pub use schema::{ContextProperty, Schema, SchemaType, Transform};

/// Locates the raw content of a sub-entity and the item created for it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceKeys {
    /// Key of the container holding the document
    pub container_key: String,
    /// Key of the document definition
    pub definition_key: String,
    /// Key of the item created from the document, once a stage has run
    pub resource_key: Option<String>,
}

impl ResourceKeys {
    pub fn new(container_key: impl Into<String>, definition_key: impl Into<String>) -> Self {
        Self {
            container_key: container_key.into(),
            definition_key: definition_key.into(),
            resource_key: None,
        }
    }
}

/// Everything the pipeline reads and writes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationModel {
    pub source: SourceModel,
    pub graph: ResourceGraph,
}

impl MigrationModel {
    pub fn new(source: SourceModel, graph: ResourceGraph) -> Self {
        Self { source, graph }
    }

    /// The application group, if discovery produced one
    pub fn application_group(&self) -> Option<&ParsedApplicationGroup> {
        match &self.source {
            SourceModel::BizTalkGroup(group) => Some(group),
            _ => None,
        }
    }
}

/// The shape of the source model produced by discovery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum SourceModel {
    /// Discovery has not run yet
    #[default]
    Absent,
    /// A group of applications from a deployment package
    BizTalkGroup(ParsedApplicationGroup),
    /// A source this pipeline does not understand
    Other(String),
}

/// All applications discovered in a package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedApplicationGroup {
    pub applications: Vec<ParsedApplication>,
}

/// One discovered application and where it came from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedApplication {
    /// Key of the installer container the application was found in
    pub container_key: String,
    pub application: Application,
}

/// Path from a graph item back to the domain object that produced it
///
/// Indices are positions in the owning collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceRef {
    Application { application: usize },
    BindingInfo { application: usize },
    SendPort { application: usize, send_port: usize },
    SendPortFilter { application: usize, send_port: usize },
    ReceivePort { application: usize, receive_port: usize },
    ReceiveLocation { application: usize, receive_port: usize, receive_location: usize },
    DistributionList { application: usize, distribution_list: usize },
    DistributionListFilter { application: usize, distribution_list: usize },
    Schema { application: usize, schema: usize },
    ContextProperty { application: usize, schema: usize, property: usize },
    Transform { application: usize, transform: usize },
    Pipeline { application: usize, pipeline: usize },
    PipelineComponent { application: usize, pipeline: usize, stage: usize, component: usize },
    Orchestration { application: usize, orchestration: usize },
    /// An element of an orchestration's meta-model, addressed by child positions
    OrchestrationElement { application: usize, orchestration: usize, path: Vec<usize> },
}

/// A borrowed domain object resolved from a [`SourceRef`]
#[derive(Debug, Clone, Copy)]
pub enum SourceObject<'a> {
    Application(&'a Application),
    BindingInfo(&'a BindingFile),
    SendPort(&'a SendPort),
    ReceivePort(&'a ReceivePort),
    ReceiveLocation(&'a ReceiveLocation),
    DistributionList(&'a DistributionList),
    Filter(&'a FilterExpression),
    Schema(&'a Schema),
    ContextProperty(&'a ContextProperty),
    Transform(&'a Transform),
    Pipeline(&'a Pipeline),
    PipelineComponent(&'a PipelineComponent),
    Orchestration(&'a Orchestration),
    OrchestrationElement(&'a OrchestrationElement),
}

impl SourceObject<'_> {
    /// The item this object was linked to
    pub fn resource(&self) -> Option<RefId> {
        match self {
            SourceObject::Application(o) => o.resource,
            SourceObject::BindingInfo(o) => o.resource,
            SourceObject::SendPort(o) => o.resource,
            SourceObject::ReceivePort(o) => o.resource,
            SourceObject::ReceiveLocation(o) => o.resource,
            SourceObject::DistributionList(o) => o.resource,
            SourceObject::Filter(o) => o.resource,
            SourceObject::Schema(o) => o.resource,
            SourceObject::ContextProperty(o) => o.resource,
            SourceObject::Transform(o) => o.resource,
            SourceObject::Pipeline(o) => o.resource,
            SourceObject::PipelineComponent(o) => o.resource,
            SourceObject::Orchestration(o) => o.resource,
            SourceObject::OrchestrationElement(o) => o.resource,
        }
    }
}

impl ParsedApplicationGroup {
    /// Resolve an item's back-reference to the domain object
    pub fn source_object(&self, source: &SourceRef) -> Option<SourceObject<'_>> {
        let app = |index: usize| self.applications.get(index).map(|parsed| &parsed.application);
        let binding_info = |index: usize| {
            app(index)
                .and_then(|a| a.bindings.as_ref())
                .and_then(|b| b.binding_info.as_ref())
        };

        let object = match source {
            SourceRef::Application { application } => SourceObject::Application(app(*application)?),
            SourceRef::BindingInfo { application } => {
                SourceObject::BindingInfo(app(*application)?.bindings.as_ref()?)
            }
            SourceRef::SendPort { application, send_port } => {
                SourceObject::SendPort(binding_info(*application)?.send_ports.get(*send_port)?)
            }
            SourceRef::SendPortFilter { application, send_port } => SourceObject::Filter(
                binding_info(*application)?
                    .send_ports
                    .get(*send_port)?
                    .filter_expression
                    .as_ref()?,
            ),
            SourceRef::ReceivePort { application, receive_port } => {
                SourceObject::ReceivePort(binding_info(*application)?.receive_ports.get(*receive_port)?)
            }
            SourceRef::ReceiveLocation {
                application,
                receive_port,
                receive_location,
            } => SourceObject::ReceiveLocation(
                binding_info(*application)?
                    .receive_ports
                    .get(*receive_port)?
                    .receive_locations
                    .get(*receive_location)?,
            ),
            SourceRef::DistributionList {
                application,
                distribution_list,
            } => SourceObject::DistributionList(
                binding_info(*application)?
                    .distribution_lists
                    .get(*distribution_list)?,
            ),
            SourceRef::DistributionListFilter {
                application,
                distribution_list,
            } => SourceObject::Filter(
                binding_info(*application)?
                    .distribution_lists
                    .get(*distribution_list)?
                    .filter_expression
                    .as_ref()?,
            ),
            SourceRef::Schema { application, schema } => {
                SourceObject::Schema(app(*application)?.schemas.get(*schema)?)
            }
            SourceRef::ContextProperty {
                application,
                schema,
                property,
            } => SourceObject::ContextProperty(
                app(*application)?
                    .schemas
                    .get(*schema)?
                    .context_properties
                    .get(*property)?,
            ),
            SourceRef::Transform { application, transform } => {
                SourceObject::Transform(app(*application)?.transforms.get(*transform)?)
            }
            SourceRef::Pipeline { application, pipeline } => {
                SourceObject::Pipeline(app(*application)?.pipelines.get(*pipeline)?)
            }
            SourceRef::PipelineComponent {
                application,
                pipeline,
                stage,
                component,
            } => SourceObject::PipelineComponent(
                app(*application)?
                    .pipelines
                    .get(*pipeline)?
                    .document
                    .as_ref()?
                    .stages
                    .get(*stage)?
                    .components
                    .get(*component)?,
            ),
            SourceRef::Orchestration {
                application,
                orchestration,
            } => SourceObject::Orchestration(app(*application)?.orchestrations.get(*orchestration)?),
            SourceRef::OrchestrationElement {
                application,
                orchestration,
                path,
            } => {
                let model = app(*application)?
                    .orchestrations
                    .get(*orchestration)?
                    .model
                    .as_ref()?;
                SourceObject::OrchestrationElement(model.element_at(path)?)
            }
        };

        Some(object)
    }
}
