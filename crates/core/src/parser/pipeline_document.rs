//! Pipeline document stage
//!
//! A pipeline document lists ordered stages, each holding ordered
//! components with their configured properties. This stage decodes the
//! whole document and creates the pipeline item; the component stage adds
//! the component items.

use roxmltree::Node;

use crate::context::{Diagnostics, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{ComponentProperty, MigrationModel, PipelineComponent, PipelineDocument, PipelineStage, SourceRef};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "PipelineDocument";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Parses pipeline documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineDocumentParser;

impl ParserStage for PipelineDocumentParser {
    fn id(&self) -> StageId {
        StageId::PipelineDocument
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (pipeline_index, pipeline) in parsed.application.pipelines.iter_mut().enumerate() {
                let Some((definition, document)) =
                    load_document(graph, &pipeline.keys, DOCUMENT, Severity::Error, &mut diagnostics, decode)
                else {
                    continue;
                };

                let resource_type = if document.is_receive() {
                    ResourceType::ReceivePipeline
                } else {
                    ResourceType::SendPipeline
                };
                let key = child_key(&key_of(graph, definition), &pipeline.name);
                let mut item = NewResource::item(key.clone(), pipeline.name.clone(), resource_type)
                    .with_property("FullName", pipeline.full_name.clone())
                    .with_property("StageCount", document.stages.len().to_string())
                    .with_source(SourceRef::Pipeline {
                        application: index,
                        pipeline: pipeline_index,
                    });
                if let Some(description) = &document.description {
                    item = item.with_description(description.clone());
                }
                if let Some(policy) = &document.policy_file_path {
                    item = item.with_property("PolicyFilePath", policy.clone());
                }

                tracing::debug!(pipeline = %pipeline.full_name, %resource_type, "parsed pipeline document");
                pipeline.document = Some(document);

                if let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) {
                    pipeline.resource = Some(ref_id);
                    pipeline.keys.resource_key = Some(key);
                }
            }
        }

        diagnostics
    }
}

pub(crate) fn decode(content: &str) -> Result<PipelineDocument, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "Document")?;

    Ok(PipelineDocument {
        policy_file_path: xml::attr(root, "PolicyFilePath"),
        major_version: xml::attr(root, "MajorVersion"),
        minor_version: xml::attr(root, "MinorVersion"),
        description: xml::child_text(root, "Description"),
        stages: xml::collection(root, "Stages", "Stage")
            .map(|stage| {
                Ok(PipelineStage {
                    category_id: xml::required_attr(stage, "Stage", "CategoryId")?,
                    components: xml::collection(stage, "Components", "Component")
                        .map(component)
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect::<Result<_, ContentError>>()?,
    })
}

fn component(node: Node<'_, '_>) -> Result<PipelineComponent, ContentError> {
    Ok(PipelineComponent {
        name: xml::child_text(node, "Name").ok_or(ContentError::MissingElement("Component/Name"))?,
        component_name: xml::child_text(node, "ComponentName"),
        description: xml::child_text(node, "Description"),
        version: xml::child_text(node, "Version"),
        properties: xml::collection(node, "Properties", "Property")
            .map(|property| {
                let value = xml::child(property, "Value");
                ComponentProperty {
                    name: xml::attr(property, "Name").unwrap_or_default(),
                    value: value.and_then(|v| v.text()).map(str::to_string),
                    value_type: value.and_then(|v| v.attribute((XSI_NAMESPACE, "type"))).map(str::to_string),
                }
            })
            .collect(),
        resource: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::DefinitionType;
    use crate::model::{Application, Pipeline, StageCategory};
    use crate::parser::test_support::{app, graph_with, keys, model_with};

    pub(crate) const RECEIVE_PIPELINE: &str = r#"<?xml version="1.0" encoding="utf-16"?>
<Document xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" PolicyFilePath="BTSReceivePolicy.xml" MajorVersion="1" MinorVersion="0">
  <Description>Validates inbound orders</Description>
  <Stages>
    <Stage CategoryId="9d0e4103-4cce-4536-83fa-4a5040674ad6">
      <Components />
    </Stage>
    <Stage CategoryId="9d0e4105-4cce-4536-83fa-4a5040674ad6">
      <Components>
        <Component>
          <Name>Microsoft.BizTalk.Component.XmlDasmComp,Microsoft.BizTalk.Pipeline.Components, Version=3.0.1.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35</Name>
          <ComponentName>XML disassembler</ComponentName>
          <Description>Streaming XML disassembler</Description>
          <Version>1.0</Version>
          <Properties>
            <Property Name="EnvelopeSpecNames">
              <Value xsi:type="xsd:string">Orders.Schemas.Envelope</Value>
            </Property>
            <Property Name="AllowUnrecognizedMessage">
              <Value xsi:type="xsd:boolean">false</Value>
            </Property>
            <Property Name="DocumentSpecNames" />
          </Properties>
          <CachedDisplayName>XML disassembler</CachedDisplayName>
          <CachedIsManaged>true</CachedIsManaged>
        </Component>
      </Components>
    </Stage>
    <Stage CategoryId="9d0e410d-4cce-4536-83fa-4a5040674ad6">
      <Components>
        <Component>
          <Name>Microsoft.BizTalk.Component.XmlValidator,Microsoft.BizTalk.Pipeline.Components, Version=3.0.1.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35</Name>
          <ComponentName>XML validator</ComponentName>
          <Version>1.0</Version>
          <Properties />
        </Component>
      </Components>
    </Stage>
  </Stages>
</Document>"#;

    #[test]
    fn test_receive_pipeline_decoded() {
        let document = decode(RECEIVE_PIPELINE).unwrap();

        assert!(document.is_receive());
        assert_eq!(document.major_version.as_deref(), Some("1"));
        assert_eq!(document.stages.len(), 3);
        assert_eq!(document.stages[1].category(), StageCategory::Disassemble);

        let dasm = &document.stages[1].components[0];
        assert_eq!(dasm.component_name.as_deref(), Some("XML disassembler"));
        assert_eq!(dasm.properties.len(), 3);
        assert_eq!(dasm.properties[0].value.as_deref(), Some("Orders.Schemas.Envelope"));
        assert_eq!(dasm.properties[1].value_type.as_deref(), Some("xsd:boolean"));
        assert_eq!(dasm.properties[2].value, None);
    }

    #[test]
    fn test_send_pipeline_item_created() {
        let content = r#"<Document PolicyFilePath="BTSTransmitPolicy.xml" MajorVersion="1" MinorVersion="0"><Stages /></Document>"#;
        let application = Application {
            pipelines: vec![Pipeline::new("SendOrders", "Orders.Pipelines.SendOrders", keys("send.btp"))],
            ..Default::default()
        };
        let mut model = model_with(
            vec![application],
            graph_with(&[("send.btp", DefinitionType::Pipeline, content)]),
        );
        assert!(PipelineDocumentParser.parse(&mut model).is_empty());

        let pipeline = &app(&model, 0).pipelines[0];
        let item = model.graph.node(pipeline.resource.unwrap()).unwrap();
        assert_eq!(item.resource_type(), Some(ResourceType::SendPipeline));
        assert_eq!(item.property("StageCount"), Some("0"));
        assert_eq!(item.key, "send.btp:SendOrders");
    }

    #[test]
    fn test_component_without_name_is_malformed() {
        let content = r#"<Document PolicyFilePath="BTSReceivePolicy.xml"><Stages><Stage CategoryId="x"><Components><Component /></Components></Stage></Stages></Document>"#;
        assert!(matches!(
            decode(content),
            Err(ContentError::MissingElement("Component/Name"))
        ));
    }
}
