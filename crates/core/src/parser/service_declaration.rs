//! Orchestration service declaration stage
//!
//! Walks the module element of each decoded meta-model, creates a
//! `ServiceDeclaration` item under the orchestration item and one child
//! item per message, correlation and port declaration.

use crate::context::{Diagnostics, EventId};
use crate::graph::{child_key, typed_child_key, NewResource, RefId, ResourceType};
use crate::model::{MetaModel, MigrationModel, OrchestrationElement, SourceRef};

use super::{append_item, application_group, key_of, ParserStage, StageId};

const SERVICE_DECLARATION: &str = "ServiceDeclaration";

/// Declarations that become items under the service declaration
const DECLARATIONS: [(&str, ResourceType); 3] = [
    ("MessageDeclaration", ResourceType::MessageDeclaration),
    ("CorrelationDeclaration", ResourceType::CorrelationDeclaration),
    ("PortDeclaration", ResourceType::PortDeclaration),
];

/// Parses service declarations out of orchestration meta-models
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestrationServiceDeclarationParser;

impl ParserStage for OrchestrationServiceDeclarationParser {
    fn id(&self) -> StageId {
        StageId::OrchestrationServiceDeclaration
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (orchestration_index, orchestration) in parsed.application.orchestrations.iter_mut().enumerate() {
                // Failures here were already reported by the module stage
                let (Some(meta_model), Some(parent)) = (orchestration.model.as_mut(), orchestration.resource) else {
                    continue;
                };
                let Some(module_index) = meta_model.module_index() else {
                    continue;
                };
                let Some(service_index) = meta_model.elements[module_index]
                    .child_indices(SERVICE_DECLARATION)
                    .next()
                else {
                    diagnostics.error(
                        EventId::MISSING_ELEMENT,
                        format!(
                            "Unable to find the ServiceDeclaration element in the orchestration '{}'",
                            orchestration.full_name
                        ),
                        orchestration.keys.resource_key.as_deref(),
                    );
                    continue;
                };

                let source = |path: Vec<usize>| SourceRef::OrchestrationElement {
                    application: index,
                    orchestration: orchestration_index,
                    path,
                };

                let service_path = vec![module_index, service_index];
                let Some(service) = meta_model.element_at(&service_path) else {
                    continue;
                };
                let service_key = child_key(&key_of(graph, parent), service.name().unwrap_or(SERVICE_DECLARATION));
                let item = describe(service_key.clone(), service, ResourceType::ServiceDeclaration)
                    .with_source(source(service_path.clone()));

                // Collect the declarations before mutating the tree
                let declarations: Vec<(Vec<usize>, NewResource)> = DECLARATIONS
                    .iter()
                    .flat_map(move |&(element_type, resource_type)| {
                        service.child_indices(element_type).map(move |child| (child, resource_type))
                    })
                    .filter_map(|(child, resource_type)| {
                        let element = service.elements.get(child)?;
                        let mut path = service_path.clone();
                        path.push(child);
                        let key = typed_child_key(
                            &service_key,
                            resource_type,
                            element.name().unwrap_or(&element.element_type),
                        );
                        let item = describe(key, element, resource_type).with_source(source(path.clone()));
                        Some((path, item))
                    })
                    .collect();

                let Some(service_id) = append_item(graph, parent, item, &mut diagnostics) else {
                    continue;
                };
                set_resource(meta_model, &service_path, service_id);

                for (path, item) in declarations {
                    if let Some(ref_id) = append_item(graph, service_id, item, &mut diagnostics) {
                        set_resource(meta_model, &path, ref_id);
                    }
                }

                tracing::debug!(orchestration = %orchestration.full_name, "parsed service declaration");
            }
        }

        diagnostics
    }
}

fn describe(key: String, element: &OrchestrationElement, resource_type: ResourceType) -> NewResource {
    let name = element
        .name()
        .unwrap_or(&element.element_type)
        .to_string();
    let mut item = NewResource::item(key, name, resource_type);
    for property in element.properties.iter().filter(|p| p.name != "Name") {
        item = item.with_property(property.name.clone(), property.value.clone());
    }
    if let Some(oid) = &element.oid {
        item = item.with_property("OID", oid.clone());
    }
    item
}

fn set_resource(meta_model: &mut MetaModel, path: &[usize], ref_id: RefId) {
    if let Some(element) = meta_model.element_at_mut(path) {
        element.resource = Some(ref_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DefinitionType;
    use crate::model::{Application, Orchestration};
    use crate::parser::orchestration_module::tests::PROCESS_ORDER;
    use crate::parser::test_support::{app, graph_with, keys, model_with};
    use crate::parser::OrchestrationModuleParser;

    fn parsed_model(content: &str) -> (MigrationModel, Diagnostics) {
        let application = Application {
            orchestrations: vec![Orchestration::new(
                "ProcessOrder",
                "OrchsToConvert.ProcessOrder",
                keys("ProcessOrder.odx"),
            )],
            ..Default::default()
        };
        let mut model = model_with(
            vec![application],
            graph_with(&[("ProcessOrder.odx", DefinitionType::Orchestration, content)]),
        );
        OrchestrationModuleParser.parse(&mut model);
        let diagnostics = OrchestrationServiceDeclarationParser.parse(&mut model);
        (model, diagnostics)
    }

    #[test]
    fn test_service_declaration_and_children() {
        let (model, diagnostics) = parsed_model(PROCESS_ORDER);
        assert!(diagnostics.is_empty());

        let orchestration = &app(&model, 0).orchestrations[0];
        let services = model.graph.resources(orchestration.resource.unwrap());
        assert_eq!(services.len(), 1);

        let service = model.graph.node(services[0]).unwrap();
        assert_eq!(service.resource_type(), Some(ResourceType::ServiceDeclaration));
        assert_eq!(service.name, "ProcessOrder");
        assert_eq!(service.property("TypeModifier"), Some("Internal"));
        assert_eq!(
            service.source_object,
            Some(SourceRef::OrchestrationElement {
                application: 0,
                orchestration: 0,
                path: vec![0, 1]
            })
        );

        let children: Vec<_> = model
            .graph
            .resources(services[0])
            .into_iter()
            .map(|id| model.graph.node(id).unwrap())
            .collect();
        let types: Vec<_> = children.iter().filter_map(|node| node.resource_type()).collect();
        assert_eq!(
            types,
            vec![
                ResourceType::MessageDeclaration,
                ResourceType::CorrelationDeclaration,
                ResourceType::PortDeclaration
            ]
        );
        assert_eq!(children[0].property("Type"), Some("Orders.Schemas.Order"));
        assert_eq!(children[2].key, "ProcessOrder.odx:ProcessOrder:ProcessOrder:PortDeclaration:ReceiveOrderPort");

        let meta_model = orchestration.model.as_ref().unwrap();
        assert_eq!(meta_model.element_at(&[0, 1]).unwrap().resource, Some(services[0]));
        assert_eq!(meta_model.element_at(&[0, 1, 2]).unwrap().resource, Some(children[2].ref_id));
        // Service body is not migrated as an item
        assert_eq!(meta_model.element_at(&[0, 1, 3]).unwrap().resource, None);
    }

    #[test]
    fn test_declarations_may_share_a_name() {
        let content = r#"<om:MetaModel MajorVersion="1" MinorVersion="3" xmlns:om="http://schemas.microsoft.com/BizTalk/2003/DesignerData">
  <om:Element Type="Module" OID="a4a8d43c-5b1e-4e4a-9b4c-1b2f8c8c1a01">
    <om:Property Name="Name" Value="OrchsToConvert" />
    <om:Element Type="ServiceDeclaration" OID="c6cae65e-7d3f-4a6c-9d6e-3d4fae0e3c03">
      <om:Property Name="Name" Value="ProcessOrder" />
      <om:Element Type="MessageDeclaration" OID="d7dbf76f-8e4a-4b7d-8e7f-4e5abf1f4d04">
        <om:Property Name="Name" Value="Order" />
      </om:Element>
      <om:Element Type="CorrelationDeclaration" OID="e8ec087a-9f5b-4c8e-9f8a-5f6bca2a5e05">
        <om:Property Name="Name" Value="Order" />
      </om:Element>
      <om:Element Type="PortDeclaration" OID="f9fd198b-af6c-4d9f-8a9b-6a7cdb3b6f06">
        <om:Property Name="Name" Value="Order" />
      </om:Element>
    </om:Element>
  </om:Element>
</om:MetaModel>"#;
        let (model, diagnostics) = parsed_model(content);
        assert!(diagnostics.is_empty());

        let service = model.graph.resources(app(&model, 0).orchestrations[0].resource.unwrap())[0];
        let keys: Vec<_> = model
            .graph
            .resources(service)
            .into_iter()
            .map(|id| model.graph.node(id).unwrap().key.clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                "ProcessOrder.odx:ProcessOrder:ProcessOrder:MessageDeclaration:Order",
                "ProcessOrder.odx:ProcessOrder:ProcessOrder:CorrelationDeclaration:Order",
                "ProcessOrder.odx:ProcessOrder:ProcessOrder:PortDeclaration:Order",
            ]
        );
    }

    #[test]
    fn test_module_without_service_is_an_error() {
        let content = r#"<om:MetaModel MajorVersion="1" MinorVersion="3" xmlns:om="http://schemas.microsoft.com/BizTalk/2003/DesignerData">
  <om:Element Type="Module" OID="a4a8d43c-5b1e-4e4a-9b4c-1b2f8c8c1a01">
    <om:Property Name="Name" Value="OrchsToConvert" />
  </om:Element>
</om:MetaModel>"#;
        let (_, diagnostics) = parsed_model(content);

        let errors: Vec<_> = diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, EventId::MISSING_ELEMENT);
        assert_eq!(errors[0].resource_key.as_deref(), Some("ProcessOrder.odx:ProcessOrder"));
    }

    #[test]
    fn test_unparsed_orchestration_is_skipped_silently() {
        let (model, diagnostics) = parsed_model("<invalid-xml>");

        assert!(diagnostics.is_empty());
        assert!(app(&model, 0).orchestrations[0].model.is_none());
    }
}
