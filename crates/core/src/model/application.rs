use serde::{Deserialize, Serialize};

use super::{BindingFile, Orchestration, Pipeline, ResourceKeys, Schema, Transform};
use crate::graph::RefId;

/// Name given to an application whose definition could not be read
pub const UNKNOWN_APPLICATION_NAME: &str = "(Unknown)";

/// An application and all of its artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub application_definition: Option<ApplicationDefinitionFile>,
    pub bindings: Option<BindingFile>,
    pub schemas: Vec<Schema>,
    pub transforms: Vec<Transform>,
    pub pipelines: Vec<Pipeline>,
    pub orchestrations: Vec<Orchestration>,
    /// The `Application` item
    pub resource: Option<RefId>,
}

/// The application definition document and its parsed form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDefinitionFile {
    pub keys: ResourceKeys,
    pub definition: Option<ApplicationDefinition>,
}

impl ApplicationDefinitionFile {
    pub fn new(keys: ResourceKeys) -> Self {
        Self { keys, definition: None }
    }
}

/// Parsed application definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplicationDefinition {
    pub properties: Vec<AdfProperty>,
    pub resources: Vec<AdfResource>,
    pub references: Vec<AdfReference>,
}

impl ApplicationDefinition {
    /// Look up a top-level property value
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Display name of the application, falling back to its `Name` property
    pub fn display_name(&self) -> Option<&str> {
        self.property("DisplayName")
            .or_else(|| self.property("Name"))
            .filter(|name| !name.trim().is_empty())
    }
}

/// A `Name`/`Value` pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdfProperty {
    pub name: String,
    pub value: String,
}

/// A resource packaged with the application (assembly, binding, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdfResource {
    pub resource_type: String,
    pub luid: String,
    pub properties: Vec<AdfProperty>,
    pub files: Vec<AdfFile>,
}

/// A file belonging to a packaged resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdfFile {
    pub relative_path: String,
    pub key: String,
}

/// Another application this one depends on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdfReference {
    pub name: String,
}
