use serde::{Deserialize, Serialize};

use super::ResourceKeys;
use crate::graph::RefId;

/// An orchestration found in an assembly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orchestration {
    pub name: String,
    pub full_name: String,
    pub keys: ResourceKeys,
    pub model: Option<MetaModel>,
    /// The `Orchestration` item
    pub resource: Option<RefId>,
}

impl Orchestration {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, keys: ResourceKeys) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            keys,
            model: None,
            resource: None,
        }
    }
}

/// Orchestration designer meta-model
///
/// A tree of elements, each identified by its `Type` and described by named
/// properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetaModel {
    pub major_version: Option<String>,
    pub minor_version: Option<String>,
    pub elements: Vec<OrchestrationElement>,
}

impl MetaModel {
    /// Position of the `Module` element among the top-level elements
    pub fn module_index(&self) -> Option<usize> {
        self.elements.iter().position(|e| e.element_type == "Module")
    }

    pub fn module(&self) -> Option<&OrchestrationElement> {
        self.module_index().map(|index| &self.elements[index])
    }

    /// Follow child positions from the top level down
    pub fn element_at(&self, path: &[usize]) -> Option<&OrchestrationElement> {
        let (first, rest) = path.split_first()?;
        let mut element = self.elements.get(*first)?;
        for index in rest {
            element = element.elements.get(*index)?;
        }
        Some(element)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut OrchestrationElement> {
        let (first, rest) = path.split_first()?;
        let mut element = self.elements.get_mut(*first)?;
        for index in rest {
            element = element.elements.get_mut(*index)?;
        }
        Some(element)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationElement {
    pub element_type: String,
    pub oid: Option<String>,
    pub parent_link: Option<String>,
    pub properties: Vec<ElementProperty>,
    pub elements: Vec<OrchestrationElement>,
    pub resource: Option<RefId>,
}

impl OrchestrationElement {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.property("Name")
    }

    /// Positions of direct children with the given type
    pub fn child_indices<'a>(&'a self, element_type: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.element_type == element_type)
            .map(|(index, _)| index)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementProperty {
    pub name: String,
    pub value: String,
}
