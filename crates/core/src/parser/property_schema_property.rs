//! Property schema stage
//!
//! Each top-level element of a property schema declares one message
//! context property. Only schemas the schema stage tagged as property
//! schemas, and linked to an item, are read.

use roxmltree::Node;

use crate::context::{Diagnostics, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{ContextProperty, MigrationModel, SchemaType, SourceRef};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "PropertySchema";

/// Property base assumed when the field annotation does not name one
pub const DEFAULT_PROPERTY_BASE: &str = "MessageDataPropertyBase";

/// Parses context properties out of property schemas
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertySchemaPropertyParser;

impl ParserStage for PropertySchemaPropertyParser {
    fn id(&self) -> StageId {
        StageId::PropertySchemaProperty
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (schema_index, schema) in parsed.application.schemas.iter_mut().enumerate() {
                if schema.schema_type != SchemaType::Property {
                    continue;
                }
                let Some(parent) = schema.resource else {
                    continue;
                };

                let namespace = schema.namespace.clone();
                let Some((_, properties)) = load_document(
                    graph,
                    &schema.keys,
                    DOCUMENT,
                    Severity::Error,
                    &mut diagnostics,
                    |content| decode(content, &namespace),
                ) else {
                    continue;
                };

                let parent_key = key_of(graph, parent);
                schema.context_properties = properties;
                for (property_index, property) in schema.context_properties.iter_mut().enumerate() {
                    let mut item = NewResource::item(
                        child_key(&parent_key, &property.property_name),
                        property.property_name.clone(),
                        ResourceType::ContextProperty,
                    )
                    .with_property("FullyQualifiedName", property.fully_qualified_name.clone())
                    .with_source(SourceRef::ContextProperty {
                        application: index,
                        schema: schema_index,
                        property: property_index,
                    });
                    if let Some(data_type) = &property.data_type {
                        item = item.with_property("DataType", data_type.clone());
                    }
                    if let Some(base) = &property.property_base {
                        item = item.with_property("PropertyBase", base.clone());
                    }
                    property.resource = append_item(graph, parent, item, &mut diagnostics);
                }

                tracing::debug!(
                    schema = %schema.full_name,
                    count = schema.context_properties.len(),
                    "parsed context properties"
                );
            }
        }

        diagnostics
    }
}

/// Decode the context properties declared by a property schema
///
/// `namespace` is the .NET namespace of the schema type, which prefixes
/// each property's fully qualified name (`FILE.ReceivedFileName`).
pub(crate) fn decode(content: &str, namespace: &str) -> Result<Vec<ContextProperty>, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "schema")?;

    xml::children(root, "element")
        .map(|element| {
            let name = xml::required_attr(element, "element", "name")?;
            let fully_qualified_name = if namespace.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", namespace, name)
            };
            Ok(ContextProperty {
                data_type: data_type(element),
                property_base: Some(property_base(element)),
                fully_qualified_name,
                property_name: name,
                resource: None,
            })
        })
        .collect()
}

/// Declared type, or the restriction base of an inline simple type
fn data_type(element: Node<'_, '_>) -> Option<String> {
    xml::attr(element, "type").or_else(|| {
        xml::child(element, "simpleType")
            .and_then(|simple| xml::child(simple, "restriction"))
            .and_then(|restriction| xml::attr(restriction, "base"))
    })
}

fn property_base(element: Node<'_, '_>) -> String {
    xml::children(element, "annotation")
        .flat_map(|annotation| xml::children(annotation, "appinfo"))
        .find_map(|appinfo| xml::child(appinfo, "fieldInfo"))
        .and_then(|info| xml::attr(info, "propSchFieldBase"))
        .unwrap_or_else(|| DEFAULT_PROPERTY_BASE.to_string())
}
