//! Orchestration module stage
//!
//! Orchestration sources carry the designer meta-model as XML embedded in
//! a preprocessor block:
//!
//! ```text
//! #if __DESIGNER_DATA
//! #error Do not define __DESIGNER_DATA.
//! <?xml version="1.0" encoding="utf-8"?>
//! <om:MetaModel ...>
//! ...
//! #endif // __DESIGNER_DATA
//! [Microsoft.XLANGs.BaseTypes.BPELExportable(false)]
//! module OrchsToConvert
//! ```
//!
//! Raw meta-model XML is accepted as well. The decoded tree is stored on
//! the orchestration and an `Orchestration` item is created for it.

use roxmltree::Node;

use crate::context::{Diagnostics, EventId, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{ElementProperty, MetaModel, MigrationModel, OrchestrationElement, SourceRef};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "Orchestration";

const DESIGNER_DATA_START: &str = "#if __DESIGNER_DATA";
const DESIGNER_DATA_END: &str = "#endif";

/// Parses orchestration meta-models
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestrationModuleParser;

impl ParserStage for OrchestrationModuleParser {
    fn id(&self) -> StageId {
        StageId::OrchestrationModule
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (orchestration_index, orchestration) in parsed.application.orchestrations.iter_mut().enumerate() {
                let Some((definition, meta_model)) =
                    load_document(graph, &orchestration.keys, DOCUMENT, Severity::Error, &mut diagnostics, decode)
                else {
                    continue;
                };

                let Some(module) = meta_model.module() else {
                    diagnostics.error(
                        EventId::MISSING_ELEMENT,
                        format!(
                            "Unable to find the Module element in the orchestration '{}' in resource definition '{}'",
                            orchestration.full_name, orchestration.keys.definition_key
                        ),
                        Some(orchestration.keys.definition_key.as_str()),
                    );
                    orchestration.model = Some(meta_model);
                    continue;
                };

                let key = child_key(&key_of(graph, definition), &orchestration.name);
                let mut item = NewResource::item(key.clone(), orchestration.name.clone(), ResourceType::Orchestration)
                    .with_property("FullName", orchestration.full_name.clone())
                    .with_property("ModuleName", module.name().unwrap_or_default())
                    .with_source(SourceRef::Orchestration {
                        application: index,
                        orchestration: orchestration_index,
                    });
                if let Some(version) = &meta_model.major_version {
                    item = item.with_property("MajorVersion", version.clone());
                }
                if let Some(version) = &meta_model.minor_version {
                    item = item.with_property("MinorVersion", version.clone());
                }

                tracing::debug!(
                    orchestration = %orchestration.full_name,
                    elements = module.elements.len(),
                    "parsed orchestration module"
                );
                orchestration.model = Some(meta_model);

                if let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) {
                    orchestration.resource = Some(ref_id);
                    orchestration.keys.resource_key = Some(key);
                }
            }
        }

        diagnostics
    }
}

/// The meta-model XML inside an orchestration source
///
/// Content without a designer data block is returned unchanged.
pub(crate) fn extract_meta_model(content: &str) -> Result<&str, ContentError> {
    let Some(start) = content.find(DESIGNER_DATA_START) else {
        return Ok(content);
    };
    let block = &content[start + DESIGNER_DATA_START.len()..];
    let end = block.find(DESIGNER_DATA_END).ok_or(ContentError::InvalidDesignerData)?;
    let block = &block[..end];
    // Skip the `#error` guard line that precedes the XML
    let xml_start = block.find('<').ok_or(ContentError::InvalidDesignerData)?;
    Ok(&block[xml_start..])
}

pub(crate) fn decode(content: &str) -> Result<MetaModel, ContentError> {
    let doc = xml::parse(extract_meta_model(content)?)?;
    let root = xml::root(&doc, "MetaModel")?;

    Ok(MetaModel {
        major_version: xml::attr(root, "MajorVersion"),
        minor_version: xml::attr(root, "MinorVersion"),
        elements: xml::children(root, "Element").map(element).collect::<Result<_, _>>()?,
    })
}

fn element(node: Node<'_, '_>) -> Result<OrchestrationElement, ContentError> {
    Ok(OrchestrationElement {
        element_type: xml::required_attr(node, "Element", "Type")?,
        oid: xml::attr(node, "OID"),
        parent_link: xml::attr(node, "ParentLink"),
        properties: xml::children(node, "Property")
            .map(|property| ElementProperty {
                name: xml::attr(property, "Name").unwrap_or_default(),
                value: xml::attr(property, "Value").unwrap_or_default(),
            })
            .collect(),
        elements: xml::children(node, "Element").map(element).collect::<Result<_, _>>()?,
        resource: None,
    })
}
