use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceKeys;
use crate::graph::RefId;

/// A custom pipeline found in an assembly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub full_name: String,
    pub keys: ResourceKeys,
    pub document: Option<PipelineDocument>,
    /// The `ReceivePipeline` or `SendPipeline` item
    pub resource: Option<RefId>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, keys: ResourceKeys) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            keys,
            document: None,
            resource: None,
        }
    }
}

/// Parsed pipeline document: ordered stages of ordered components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineDocument {
    pub policy_file_path: Option<String>,
    pub major_version: Option<String>,
    pub minor_version: Option<String>,
    pub description: Option<String>,
    pub stages: Vec<PipelineStage>,
}

impl PipelineDocument {
    /// Receive pipelines run under the receive policy
    pub fn is_receive(&self) -> bool {
        self.policy_file_path
            .as_deref()
            .is_some_and(|policy| policy.contains("Receive"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStage {
    pub category_id: String,
    pub components: Vec<PipelineComponent>,
}

impl PipelineStage {
    pub fn category(&self) -> StageCategory {
        StageCategory::from_id(&self.category_id)
    }
}

/// Well-known pipeline stage categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageCategory {
    Decode,
    Disassemble,
    Validate,
    ResolveParty,
    PreAssemble,
    Assemble,
    Encode,
    Any,
    Unknown,
}

impl StageCategory {
    pub fn from_id(category_id: &str) -> Self {
        match category_id.trim().to_ascii_lowercase().as_str() {
            "9d0e4103-4cce-4536-83fa-4a5040674ad6" => StageCategory::Decode,
            "9d0e4105-4cce-4536-83fa-4a5040674ad6" => StageCategory::Disassemble,
            "9d0e410d-4cce-4536-83fa-4a5040674ad6" => StageCategory::Validate,
            "9d0e410e-4cce-4536-83fa-4a5040674ad6" => StageCategory::ResolveParty,
            "9d0e4101-4cce-4536-83fa-4a5040674ad6" => StageCategory::PreAssemble,
            "9d0e4107-4cce-4536-83fa-4a5040674ad6" => StageCategory::Assemble,
            "9d0e4108-4cce-4536-83fa-4a5040674ad6" => StageCategory::Encode,
            "9d0e4100-4cce-4536-83fa-4a5040674ad6" => StageCategory::Any,
            _ => StageCategory::Unknown,
        }
    }
}

impl fmt::Display for StageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineComponent {
    /// Type name of the component
    pub name: String,
    /// Friendly name shown in the designer
    pub component_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub properties: Vec<ComponentProperty>,
    pub resource: Option<RefId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentProperty {
    pub name: String,
    pub value: Option<String>,
    /// Declared schema type of the value, e.g. `xsd:string`
    pub value_type: Option<String>,
}
