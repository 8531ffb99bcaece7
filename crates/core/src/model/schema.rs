use serde::{Deserialize, Serialize};

use super::ResourceKeys;
use crate::graph::RefId;

/// Whether a schema describes messages or context properties
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SchemaType {
    /// Not parsed yet
    #[default]
    Unknown,
    Document,
    Property,
}

/// A schema found in an assembly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    /// .NET namespace the schema type lives in
    pub namespace: String,
    pub full_name: String,
    pub keys: ResourceKeys,
    pub schema_type: SchemaType,
    pub target_namespace: Option<String>,
    /// Names of the root elements
    pub root_nodes: Vec<String>,
    pub context_properties: Vec<ContextProperty>,
    pub resource: Option<RefId>,
}

impl Schema {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        keys: ResourceKeys,
    ) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let full_name = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", namespace, name)
        };
        Self {
            name,
            namespace,
            full_name,
            keys,
            ..Default::default()
        }
    }
}

/// A property declared by a property schema
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextProperty {
    pub property_name: String,
    pub data_type: Option<String>,
    /// `<namespace>.<property>`, e.g. `FILE.ReceivedFileName`
    pub fully_qualified_name: String,
    /// `MessageContextPropertyBase` or `MessageDataPropertyBase`
    pub property_base: Option<String>,
    pub resource: Option<RefId>,
}

/// A map found in an assembly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transform {
    pub name: String,
    pub full_name: String,
    pub keys: ResourceKeys,
    pub source_schema: Option<String>,
    pub target_schema: Option<String>,
    pub resource: Option<RefId>,
}

impl Transform {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, keys: ResourceKeys) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            keys,
            ..Default::default()
        }
    }
}
