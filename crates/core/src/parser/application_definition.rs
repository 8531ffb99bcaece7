//! Application definition stage
//!
//! Reads each application's definition document, names the application and
//! creates its `Application` item. Every later stage that attaches to an
//! application runs after this one.

use crate::context::{Diagnostics, EventId, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{
    AdfFile, AdfProperty, AdfReference, AdfResource, ApplicationDefinition, MigrationModel, SourceRef,
    UNKNOWN_APPLICATION_NAME,
};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "ApplicationDefinition";

/// Parses application definition documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationDefinitionParser;

impl ParserStage for ApplicationDefinitionParser {
    fn id(&self) -> StageId {
        StageId::ApplicationDefinition
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            let application = &mut parsed.application;

            let Some(file) = application.application_definition.as_mut() else {
                diagnostics.warning(
                    EventId::MISSING_RESOURCE,
                    format!(
                        "Unable to find the resource definition for {} of application {} in container '{}'",
                        DOCUMENT, index, parsed.container_key
                    ),
                    Some(parsed.container_key.as_str()),
                );
                application.name = UNKNOWN_APPLICATION_NAME.to_string();
                continue;
            };

            // A package without a readable definition is still migrated, under a placeholder name
            let Some((definition, adf)) =
                load_document(graph, &file.keys, DOCUMENT, Severity::Warning, &mut diagnostics, decode)
            else {
                application.name = UNKNOWN_APPLICATION_NAME.to_string();
                continue;
            };

            let name = adf
                .display_name()
                .unwrap_or(UNKNOWN_APPLICATION_NAME)
                .to_string();
            let key = child_key(&key_of(graph, definition), &name);

            let mut item = NewResource::item(key.clone(), name.clone(), ResourceType::Application)
                .with_source(SourceRef::Application { application: index });
            if let Some(description) = adf.property("ApplicationDescription") {
                item = item.with_description(description);
            }
            for property in &adf.properties {
                item = item.with_property(property.name.clone(), property.value.clone());
            }
            item = item.with_property("ReferenceCount", adf.references.len().to_string());

            tracing::debug!(application = %name, "parsed application definition");
            application.name = name;
            file.definition = Some(adf);

            if let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) {
                application.resource = Some(ref_id);
                file.keys.resource_key = Some(key);
            }
        }

        diagnostics
    }
}

/// Decode an application definition document
pub(crate) fn decode(content: &str) -> Result<ApplicationDefinition, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "ApplicationDefinition")?;

    let properties = xml::collection(root, "Properties", "Property")
        .map(property)
        .collect();

    let resources = xml::collection(root, "Resources", "Resource")
        .map(|node| AdfResource {
            resource_type: xml::attr(node, "Type").unwrap_or_default(),
            luid: xml::attr(node, "Luid").unwrap_or_default(),
            properties: xml::collection(node, "Properties", "Property")
                .map(property)
                .collect(),
            files: xml::collection(node, "Files", "File")
                .map(|file| AdfFile {
                    relative_path: xml::attr(file, "RelativePath").unwrap_or_default(),
                    key: xml::attr(file, "Key").unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    let references = xml::collection(root, "References", "Reference")
        .map(|node| AdfReference {
            name: xml::attr(node, "Name").unwrap_or_default(),
        })
        .collect();

    Ok(ApplicationDefinition {
        properties,
        resources,
        references,
    })
}

fn property(node: roxmltree::Node<'_, '_>) -> AdfProperty {
    AdfProperty {
        name: xml::attr(node, "Name").unwrap_or_default(),
        value: xml::attr(node, "Value").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MigrationContext;
    use crate::graph::DefinitionType;
    use crate::logging::MemoryLogger;
    use crate::model::{Application, ApplicationDefinitionFile};
    use crate::parser::test_support::{app, graph_with, keys, model_with, INSTALLER_KEY};
    use crate::parser::ParserPipeline;
    use std::sync::Arc;
    use tracing::Level;

    const ADF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ApplicationDefinition xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Properties>
    <Property Name="DisplayName" Value="Orders.Processing" />
    <Property Name="Guid" Value="{4C4C4C4C-0000-0000-0000-000000000001}" />
    <Property Name="Manufacturer" Value="Generated by BizTalk Server" />
    <Property Name="Version" Value="1.0.0.0" />
    <Property Name="ApplicationDescription" Value="Order intake" />
  </Properties>
  <Resources>
    <Resource Type="System.BizTalk:BizTalkAssembly" Luid="OrchsToConvert, Version=1.0.0.0, Culture=neutral, PublicKeyToken=63a3d0af71fe5e2a">
      <Properties>
        <Property Name="DestinationLocation" Value="%BTAD_InstallDir%\OrchsToConvert.dll" />
      </Properties>
      <Files>
        <File RelativePath="OrchsToConvert.dll" Key="Assembly" />
      </Files>
    </Resource>
  </Resources>
  <References>
    <Reference Name="BizTalk.System" />
    <Reference Name="Shared.Schemas" />
  </References>
</ApplicationDefinition>"#;

    fn model(content: &str) -> MigrationModel {
        let graph = graph_with(&[("app.adf", DefinitionType::ApplicationDefinition, content)]);
        let application = Application {
            application_definition: Some(ApplicationDefinitionFile::new(keys("app.adf"))),
            ..Default::default()
        };
        model_with(vec![application], graph)
    }

    #[test]
    fn test_parse_well_formed_definition() {
        let mut model = model(ADF);
        let diagnostics = ApplicationDefinitionParser.parse(&mut model);

        assert!(diagnostics.is_empty());
        let application = app(&model, 0);
        let adf = application
            .application_definition
            .as_ref()
            .and_then(|f| f.definition.as_ref())
            .unwrap();
        assert_eq!(adf.properties.len(), 5);
        assert_eq!(adf.resources.len(), 1);
        assert_eq!(adf.references.len(), 2);
        assert_eq!(adf.resources[0].files[0].relative_path, "OrchsToConvert.dll");
        assert_eq!(application.name, "Orders.Processing");
    }

    #[test]
    fn test_application_item_is_linked_both_ways() {
        let mut model = model(ADF);
        ApplicationDefinitionParser.parse(&mut model);

        let definition = model.graph.find_by_key("app.adf").unwrap();
        let item_id = app(&model, 0).resource.unwrap();
        let item = model.graph.node(item_id).unwrap();

        assert_eq!(item.key, "app.adf:Orders.Processing");
        assert_eq!(item.parent_ref_id, Some(definition));
        assert_eq!(item.description, "Order intake");
        assert_eq!(item.source_object, Some(SourceRef::Application { application: 0 }));
        assert_eq!(model.graph.resources(definition), vec![item_id]);
        assert_eq!(
            app(&model, 0).application_definition.as_ref().unwrap().keys.resource_key.as_deref(),
            Some("app.adf:Orders.Processing")
        );
    }

    #[test]
    fn test_missing_definition_falls_back_to_unknown() {
        let graph = graph_with(&[]);
        let application = Application {
            application_definition: Some(ApplicationDefinitionFile::new(keys("missing.adf"))),
            ..Default::default()
        };
        let mut model = model_with(vec![application], graph);

        let logger = Arc::new(MemoryLogger::new());
        let pipeline = ParserPipeline::builder()
            .logger(logger.clone())
            .stage(ApplicationDefinitionParser)
            .build()
            .unwrap();
        let mut context = MigrationContext::new();
        pipeline.run(&mut model, &mut context);

        assert_eq!(app(&model, 0).name, UNKNOWN_APPLICATION_NAME);
        let warnings = logger.entries_at(Level::WARN);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("ApplicationDefinition"));
        assert!(warnings[0].message.contains("Unable to find"));
        assert_eq!(context.errors.len(), 0);
    }

    #[test]
    fn test_undiscovered_definition_is_a_warning() {
        let mut model = model_with(vec![Application::default()], graph_with(&[]));
        let diagnostics = ApplicationDefinitionParser.parse(&mut model);

        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].event, EventId::MISSING_RESOURCE);
        assert_eq!(warnings[0].resource_key.as_deref(), Some(INSTALLER_KEY));
        assert_eq!(diagnostics.errors().count(), 0);
        assert_eq!(app(&model, 0).name, UNKNOWN_APPLICATION_NAME);
        assert!(app(&model, 0).resource.is_none());
    }

    #[test]
    fn test_malformed_definition_is_an_error() {
        for content in ["<invalid-xml>", ""] {
            let mut model = model(content);
            let mut context = MigrationContext::new();
            let diagnostics = ApplicationDefinitionParser.parse(&mut model);
            context.record(StageId::ApplicationDefinition, &diagnostics);

            assert_eq!(context.errors.len(), 1);
            assert_eq!(context.errors[0].resource_key.as_deref(), Some("app.adf"));
            let application = app(&model, 0);
            assert!(application.application_definition.as_ref().unwrap().definition.is_none());
            assert!(application.resource.is_none());
            assert_eq!(application.name, UNKNOWN_APPLICATION_NAME);
        }
    }

    #[test]
    fn test_wrong_document_is_an_error() {
        let mut model = model("<BindingInfo />");
        let diagnostics = ApplicationDefinitionParser.parse(&mut model);
        assert_eq!(diagnostics.errors().count(), 1);
    }

    #[test]
    fn test_no_source_model_is_a_noop() {
        let mut model = MigrationModel::default();
        let diagnostics = ApplicationDefinitionParser.parse(&mut model);

        assert!(diagnostics.is_empty());
        assert_eq!(model.graph.node_count(), 0);
    }
}
