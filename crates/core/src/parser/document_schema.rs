//! Schema stage
//!
//! Reads every XSD the application deploys and tags it as a document or a
//! property schema. Property schemas are picked up again by the property
//! stage, which reads their element annotations.

use roxmltree::Node;

use crate::context::{Diagnostics, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{MigrationModel, SchemaType, SourceRef};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "Schema";

/// The parts of an XSD the migration cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchemaDocument {
    pub schema_type: SchemaType,
    pub target_namespace: Option<String>,
    pub root_nodes: Vec<String>,
}

/// Parses schema documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentSchemaParser;

impl ParserStage for DocumentSchemaParser {
    fn id(&self) -> StageId {
        StageId::DocumentSchema
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (schema_index, schema) in parsed.application.schemas.iter_mut().enumerate() {
                // Discovery found the schema, so a missing document is an inconsistent package
                let Some((definition, document)) =
                    load_document(graph, &schema.keys, DOCUMENT, Severity::Error, &mut diagnostics, decode)
                else {
                    continue;
                };

                let resource_type = match document.schema_type {
                    SchemaType::Property => ResourceType::PropertySchema,
                    SchemaType::Document | SchemaType::Unknown => ResourceType::DocumentSchema,
                };
                let key = child_key(&key_of(graph, definition), &schema.name);
                let mut item = NewResource::item(key.clone(), schema.name.clone(), resource_type)
                    .with_property("FullName", schema.full_name.clone())
                    .with_property("RootNodes", document.root_nodes.join(","))
                    .with_source(SourceRef::Schema {
                        application: index,
                        schema: schema_index,
                    });
                if let Some(namespace) = &document.target_namespace {
                    item = item.with_property("TargetNamespace", namespace.clone());
                }

                schema.schema_type = document.schema_type;
                schema.target_namespace = document.target_namespace;
                schema.root_nodes = document.root_nodes;

                if let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) {
                    schema.resource = Some(ref_id);
                    schema.keys.resource_key = Some(key);
                }
            }

            tracing::debug!(
                application = %parsed.application.name,
                count = parsed.application.schemas.len(),
                "parsed schemas"
            );
        }

        diagnostics
    }
}

/// Decode the schema-level facts of an XSD
pub(crate) fn decode(content: &str) -> Result<SchemaDocument, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "schema")?;

    let schema_type = match schema_info(root).and_then(|info| info.attribute("schema_type")) {
        Some(kind) if kind.eq_ignore_ascii_case("property") => SchemaType::Property,
        _ => SchemaType::Document,
    };

    Ok(SchemaDocument {
        schema_type,
        target_namespace: xml::attr(root, "targetNamespace"),
        root_nodes: xml::children(root, "element")
            .filter_map(|element| xml::attr(element, "name"))
            .collect(),
    })
}

/// The `schemaInfo` annotation on the schema element
fn schema_info<'a, 'input>(root: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    xml::children(root, "annotation")
        .flat_map(|annotation| xml::children(annotation, "appinfo"))
        .find_map(|appinfo| xml::child(appinfo, "schemaInfo"))
}
