//! Resource graph holding every artifact discovered in a deployment package
//!
//! Uses `petgraph::StableGraph` as an arena so that a [`RefId`] stays valid
//! for the lifetime of a run. Nodes are never removed: parser stages only
//! append items and set back-references.
//!
//! # Shape
//!
//! ```text
//! Container (installer) ─Contains→ Container (cabinet) ─Contains→ Container (assembly)
//!                                                          │
//!                                                      Contains
//!                                                          ↓
//!                                                 Definition (binding file)
//!                                                          │
//!                                                      Contains
//!                                                          ↓
//!                                   Item (bindings) ─Contains→ Item (send port) ...
//! ```
//!
//! Ownership is expressed with [`ResourceEdge::Contains`] edges; named,
//! non-owning links between items use [`ResourceEdge::Relationship`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, LookupError};
use crate::model::SourceRef;

/// Stable identifier of a container, definition or item
///
/// Assigned when the node is added and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(NodeIndex);

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref-{}", self.0.index())
    }
}

/// Kind of physical package a container represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContainerType {
    Installer,
    Cabinet,
    Assembly,
    Folder,
    Other,
}

/// Kind of document a definition holds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DefinitionType {
    ApplicationDefinition,
    Bindings,
    Orchestration,
    Pipeline,
    Schema,
    Transform,
    Other,
}

/// Type tag of a discovered sub-artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Application,
    BindingInfo,
    SendPort,
    SendPortFilter,
    ReceivePort,
    ReceiveLocation,
    DistributionList,
    DistributionListFilter,
    DocumentSchema,
    PropertySchema,
    ContextProperty,
    Map,
    ReceivePipeline,
    SendPipeline,
    PipelineComponent,
    Orchestration,
    ServiceDeclaration,
    MessageDeclaration,
    CorrelationDeclaration,
    PortDeclaration,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a node in the graph is
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResourceKind {
    /// A physical container (installer, cabinet, assembly)
    Container {
        container_type: ContainerType,
        /// Where the container was found, if known
        location: Option<String>,
    },
    /// One document inside a container, with its raw content
    Definition {
        definition_type: DefinitionType,
        content: String,
    },
    /// A sub-artifact discovered by a parser stage
    Item(ResourceType),
}

/// Relationship between two items that does not imply ownership
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationshipType {
    ReferencesTo,
    ReferencedBy,
    CallsTo,
    CalledBy,
}

/// An edge in the resource graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceEdge {
    /// Parent owns child: Container → Definition → Item → Item
    Contains,
    /// Named link between two items
    Relationship(RelationshipType),
}

/// A node of the resource graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Identifier assigned on insertion
    pub ref_id: RefId,
    /// Identifier of the owning node, `None` for root containers
    pub parent_ref_id: Option<RefId>,
    /// Globally unique key, conventionally `<parentKey>:<localName>` for items
    pub key: String,
    pub name: String,
    pub description: String,
    pub kind: ResourceKind,
    pub properties: BTreeMap<String, String>,
    /// Domain object that produced this item
    pub source_object: Option<SourceRef>,
}

impl ResourceNode {
    /// Item type, or `None` for containers and definitions
    pub fn resource_type(&self) -> Option<ResourceType> {
        match self.kind {
            ResourceKind::Item(resource_type) => Some(resource_type),
            _ => None,
        }
    }

    /// Raw document content, or `None` if this node is not a definition
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Definition { content, .. } => Some(content.as_str()),
            _ => None,
        }
    }

    /// Look up a property value
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// A node waiting to be added to the graph
///
/// Carries everything except the identifiers, which the graph assigns.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub key: String,
    pub name: String,
    pub description: String,
    pub kind: ResourceKind,
    pub properties: BTreeMap<String, String>,
    pub source_object: Option<SourceRef>,
}

impl NewResource {
    fn new(key: impl Into<String>, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            kind,
            properties: BTreeMap::new(),
            source_object: None,
        }
    }

    /// A container node
    pub fn container(key: impl Into<String>, name: impl Into<String>, container_type: ContainerType) -> Self {
        Self::new(
            key,
            name,
            ResourceKind::Container {
                container_type,
                location: None,
            },
        )
    }

    /// A definition node with its raw content
    pub fn definition(
        key: impl Into<String>,
        name: impl Into<String>,
        definition_type: DefinitionType,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            key,
            name,
            ResourceKind::Definition {
                definition_type,
                content: content.into(),
            },
        )
    }

    /// An item node
    pub fn item(key: impl Into<String>, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self::new(key, name, ResourceKind::Item(resource_type))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, path: impl Into<String>) -> Self {
        if let ResourceKind::Container { location, .. } = &mut self.kind {
            *location = Some(path.into());
        }
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source_object = Some(source);
        self
    }
}

/// Build the key of a child item: `<parentKey>:<localName>`
pub fn child_key(parent_key: &str, local_name: &str) -> String {
    format!("{}:{}", parent_key, local_name)
}

/// Build the key of a child item scoped by its type:
/// `<parentKey>:<ResourceType>:<localName>`
///
/// Used where siblings of different types may legally share a name.
pub fn typed_child_key(parent_key: &str, resource_type: ResourceType, local_name: &str) -> String {
    format!("{}:{}:{}", parent_key, resource_type, local_name)
}

/// The resource graph
///
/// Keys are unique across the whole graph; nesting depth is unbounded.
/// Only the node arena is serialized. The key index and the root list are
/// rebuilt on load, after checking every node against its `Contains` edges.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    inner: StableGraph<ResourceNode, ResourceEdge>,
    roots: Vec<RefId>,
    keys: HashMap<String, RefId>,
}

impl ResourceGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            roots: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// Add a container, either at the root or nested in another container
    pub fn add_container(&mut self, parent: Option<RefId>, container: NewResource) -> Result<RefId, GraphError> {
        if !matches!(container.kind, ResourceKind::Container { .. }) {
            return Err(GraphError::InvalidNesting {
                key: container.key,
                reason: "expected a container",
            });
        }
        if let Some(parent) = parent {
            if !matches!(self.kind_of(parent)?, ResourceKind::Container { .. }) {
                return Err(GraphError::InvalidNesting {
                    key: container.key,
                    reason: "containers can only be nested in containers",
                });
            }
        }
        self.insert(parent, container)
    }

    /// Add a definition to a container
    pub fn add_definition(&mut self, container: RefId, definition: NewResource) -> Result<RefId, GraphError> {
        if !matches!(definition.kind, ResourceKind::Definition { .. }) {
            return Err(GraphError::InvalidNesting {
                key: definition.key,
                reason: "expected a definition",
            });
        }
        if !matches!(self.kind_of(container)?, ResourceKind::Container { .. }) {
            return Err(GraphError::InvalidNesting {
                key: definition.key,
                reason: "definitions can only be added to containers",
            });
        }
        self.insert(Some(container), definition)
    }

    /// Add an item under a definition or another item
    pub fn add_item(&mut self, parent: RefId, item: NewResource) -> Result<RefId, GraphError> {
        if !matches!(item.kind, ResourceKind::Item(_)) {
            return Err(GraphError::InvalidNesting {
                key: item.key,
                reason: "expected an item",
            });
        }
        if matches!(self.kind_of(parent)?, ResourceKind::Container { .. }) {
            return Err(GraphError::InvalidNesting {
                key: item.key,
                reason: "items can only be added to definitions or items",
            });
        }
        self.insert(Some(parent), item)
    }

    fn kind_of(&self, ref_id: RefId) -> Result<&ResourceKind, GraphError> {
        self.node(ref_id)
            .map(|node| &node.kind)
            .ok_or(GraphError::UnknownRefId(ref_id))
    }

    fn insert(&mut self, parent: Option<RefId>, resource: NewResource) -> Result<RefId, GraphError> {
        if self.keys.contains_key(&resource.key) {
            return Err(GraphError::DuplicateKey(resource.key));
        }

        let NewResource {
            key,
            name,
            description,
            kind,
            properties,
            source_object,
        } = resource;

        let index = self.inner.add_node(ResourceNode {
            ref_id: RefId(NodeIndex::end()),
            parent_ref_id: parent,
            key: key.clone(),
            name,
            description,
            kind,
            properties,
            source_object,
        });
        let ref_id = RefId(index);
        self.inner[index].ref_id = ref_id;
        self.keys.insert(key, ref_id);

        match parent {
            Some(parent) => {
                self.inner.add_edge(parent.0, index, ResourceEdge::Contains);
            }
            None => self.roots.push(ref_id),
        }

        Ok(ref_id)
    }

    /// Link two items with a named, non-owning relationship
    pub fn add_relationship(
        &mut self,
        from: RefId,
        to: RefId,
        relationship: RelationshipType,
    ) -> Result<(), GraphError> {
        for ref_id in [from, to] {
            if !matches!(self.kind_of(ref_id)?, ResourceKind::Item(_)) {
                return Err(GraphError::InvalidRelationship(ref_id));
            }
        }
        self.inner
            .add_edge(from.0, to.0, ResourceEdge::Relationship(relationship));
        Ok(())
    }

    /// Outgoing relationships of an item, in the order they were added
    pub fn relationships(&self, from: RefId) -> Vec<(RelationshipType, RefId)> {
        let mut edges: Vec<_> = self
            .inner
            .edges_directed(from.0, Direction::Outgoing)
            .filter_map(|edge| match edge.weight() {
                ResourceEdge::Relationship(relationship) => Some((edge.id(), *relationship, RefId(edge.target()))),
                ResourceEdge::Contains => None,
            })
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, rel, target)| (rel, target)).collect()
    }

    /// Get a node by identifier
    pub fn node(&self, ref_id: RefId) -> Option<&ResourceNode> {
        self.inner.node_weight(ref_id.0)
    }

    /// Children of a node, in insertion order
    pub fn resources(&self, ref_id: RefId) -> Vec<RefId> {
        let mut children: Vec<_> = self
            .inner
            .edges_directed(ref_id.0, Direction::Outgoing)
            .filter(|edge| *edge.weight() == ResourceEdge::Contains)
            .map(|edge| (edge.id(), RefId(edge.target())))
            .collect();
        children.sort_by_key(|(id, _)| *id);
        children.into_iter().map(|(_, child)| child).collect()
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Find any node by its key
    pub fn find_by_key(&self, key: &str) -> Result<RefId, LookupError> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| LookupError::not_found("resource", key))
    }

    /// Find a definition by key, checking that it lives in the given container
    pub fn find_definition(&self, container_key: &str, definition_key: &str) -> Result<RefId, LookupError> {
        let container = self
            .keys
            .get(container_key)
            .copied()
            .filter(|id| matches!(self.node(*id).map(|n| &n.kind), Some(ResourceKind::Container { .. })))
            .ok_or_else(|| LookupError::not_found("container", container_key))?;

        self.keys
            .get(definition_key)
            .copied()
            .filter(|id| {
                self.node(*id).is_some_and(|node| {
                    matches!(node.kind, ResourceKind::Definition { .. }) && node.parent_ref_id == Some(container)
                })
            })
            .ok_or_else(|| LookupError::not_found("definition", definition_key))
    }

    /// Find an item by key among the items of a definition (at any depth)
    pub fn find_item_in_definition(&self, definition: RefId, key: &str) -> Result<RefId, LookupError> {
        self.walk_from(definition)
            .skip(1)
            .find(|node| node.key == key)
            .map(|node| node.ref_id)
            .ok_or_else(|| LookupError::not_found("item", key))
    }

    /// Lazily walk every node in pre-order, starting from the root containers
    pub fn walk(&self) -> Walk<'_> {
        let mut stack = self.roots.clone();
        stack.reverse();
        Walk { graph: self, stack }
    }

    /// Lazily walk a node and everything it owns, in pre-order
    pub fn walk_from(&self, ref_id: RefId) -> Walk<'_> {
        Walk {
            graph: self,
            stack: vec![ref_id],
        }
    }

    /// Find all items of a given type anywhere in the graph
    ///
    /// The returned iterator is lazy and finite; it is consumed as it is read.
    pub fn find_resources_by_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.walk()
            .filter(move |node| node.resource_type() == Some(resource_type))
    }
}

/// Serialized form of a [`ResourceGraph`]
#[derive(Serialize, Deserialize)]
struct RawGraph<G = StableGraph<ResourceNode, ResourceEdge>> {
    inner: G,
}

impl Serialize for ResourceGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawGraph { inner: &self.inner }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceGraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: RawGraph = RawGraph::deserialize(deserializer)?;
        Self::from_arena(raw.inner).map_err(serde::de::Error::custom)
    }
}

impl ResourceGraph {
    /// Rebuild the key index and root list from a loaded arena
    fn from_arena(inner: StableGraph<ResourceNode, ResourceEdge>) -> Result<Self, GraphError> {
        let mut roots = Vec::new();
        let mut keys = HashMap::new();

        for index in inner.node_indices() {
            let node = &inner[index];
            if node.ref_id != RefId(index) {
                return Err(GraphError::Inconsistent {
                    key: node.key.clone(),
                    reason: "ref id does not match its position in the graph",
                });
            }

            let mut owners = inner
                .edges_directed(index, Direction::Incoming)
                .filter(|edge| *edge.weight() == ResourceEdge::Contains)
                .map(|edge| RefId(edge.source()));
            let owner = owners.next();
            if owners.next().is_some() || owner != node.parent_ref_id {
                return Err(GraphError::Inconsistent {
                    key: node.key.clone(),
                    reason: "parent ref id does not match the owning edge",
                });
            }

            if keys.insert(node.key.clone(), node.ref_id).is_some() {
                return Err(GraphError::DuplicateKey(node.key.clone()));
            }
            if owner.is_none() {
                roots.push(node.ref_id);
            }
        }

        Ok(Self { inner, roots, keys })
    }
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order traversal over the ownership tree
pub struct Walk<'g> {
    graph: &'g ResourceGraph,
    stack: Vec<RefId>,
}

impl<'g> Iterator for Walk<'g> {
    type Item = &'g ResourceNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ref_id) = self.stack.pop() {
            if let Some(node) = self.graph.node(ref_id) {
                let mut children = self.graph.resources(ref_id);
                children.reverse();
                self.stack.extend(children);
                return Some(node);
            }
        }
        None
    }
}
