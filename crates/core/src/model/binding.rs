use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceKeys;
use crate::graph::RefId;

/// The binding document of an application and its parsed form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingFile {
    pub keys: ResourceKeys,
    pub binding_info: Option<BindingInfo>,
    /// The `BindingInfo` item
    pub resource: Option<RefId>,
}

impl BindingFile {
    pub fn new(keys: ResourceKeys) -> Self {
        Self {
            keys,
            binding_info: None,
            resource: None,
        }
    }
}

/// Parsed binding document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingInfo {
    pub version: Option<String>,
    pub module_refs: Vec<ModuleRef>,
    pub send_ports: Vec<SendPort>,
    pub distribution_lists: Vec<DistributionList>,
    pub receive_ports: Vec<ReceivePort>,
}

/// A deployed assembly referenced by the bindings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
    pub version: String,
    pub culture: String,
    pub public_key_token: String,
    pub full_name: String,
    pub services: Vec<ModuleService>,
}

/// An orchestration bound inside a module
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleService {
    pub name: String,
    pub state: Option<String>,
    pub host: Option<String>,
}

/// A pipeline referenced by a port
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineRef {
    pub name: String,
    pub fully_qualified_name: String,
}

/// Adapter and address of a port or location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transport {
    pub address: Option<String>,
    pub transport_type: Option<String>,
}

/// An outbound port
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendPort {
    pub name: String,
    pub description: Option<String>,
    pub is_static: bool,
    pub is_two_way: bool,
    pub application_name: Option<String>,
    pub primary_transport: Option<Transport>,
    pub transmit_pipeline: Option<PipelineRef>,
    pub receive_pipeline: Option<PipelineRef>,
    /// Raw filter XML as stored in the binding
    pub filter: Option<String>,
    pub filter_expression: Option<FilterExpression>,
    pub resource: Option<RefId>,
}

/// An inbound port
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceivePort {
    pub name: String,
    pub description: Option<String>,
    pub is_two_way: bool,
    pub application_name: Option<String>,
    pub receive_locations: Vec<ReceiveLocation>,
    pub resource: Option<RefId>,
}

/// An endpoint feeding a receive port
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiveLocation {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub transport: Transport,
    pub receive_handler: Option<String>,
    pub receive_pipeline: Option<PipelineRef>,
    pub send_pipeline: Option<PipelineRef>,
    pub resource: Option<RefId>,
}

/// A send port group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionList {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub application_name: Option<String>,
    /// Names of member send ports
    pub send_ports: Vec<String>,
    pub filter: Option<String>,
    pub filter_expression: Option<FilterExpression>,
    pub resource: Option<RefId>,
}

/// Routing predicate: statements in a group are AND-ed, groups are OR-ed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterExpression {
    pub groups: Vec<FilterGroup>,
    pub resource: Option<RefId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterGroup {
    pub statements: Vec<FilterStatement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterStatement {
    pub property: String,
    pub operator: FilterOperator,
    pub value: Option<String>,
}

/// Comparison operators, stored in the binding as numeric codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    LessThan,
    LessThanEqualTo,
    GreaterThan,
    GreaterThanEqualTo,
    NotEqual,
    Exists,
    Unknown(i32),
}

impl FilterOperator {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => FilterOperator::Equals,
            1 => FilterOperator::LessThan,
            2 => FilterOperator::LessThanEqualTo,
            3 => FilterOperator::GreaterThan,
            4 => FilterOperator::GreaterThanEqualTo,
            5 => FilterOperator::NotEqual,
            6 => FilterOperator::Exists,
            other => FilterOperator::Unknown(other),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOperator::Equals => write!(f, "=="),
            FilterOperator::LessThan => write!(f, "<"),
            FilterOperator::LessThanEqualTo => write!(f, "<="),
            FilterOperator::GreaterThan => write!(f, ">"),
            FilterOperator::GreaterThanEqualTo => write!(f, ">="),
            FilterOperator::NotEqual => write!(f, "!="),
            FilterOperator::Exists => write!(f, "exists"),
            FilterOperator::Unknown(code) => write!(f, "op({})", code),
        }
    }
}

impl fmt::Display for FilterExpression {
    /// Renders as `(a == 1 AND b exists) OR (c != 2)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                let statements: Vec<String> = group
                    .statements
                    .iter()
                    .map(|s| match (&s.operator, &s.value) {
                        (FilterOperator::Exists, _) | (_, None) => format!("{} {}", s.property, s.operator),
                        (op, Some(value)) => format!("{} {} {}", s.property, op, value),
                    })
                    .collect();
                format!("({})", statements.join(" AND "))
            })
            .collect();
        write!(f, "{}", groups.join(" OR "))
    }
}
