//! Binding file stage
//!
//! Decodes each application's binding document into [`BindingInfo`] and
//! creates the `BindingInfo` item the port stages attach to. The item is
//! linked to the owning `Application` item in both directions.

use roxmltree::Node;

use crate::context::{Diagnostics, EventId, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, RelationshipType, ResourceType};
use crate::model::{
    BindingInfo, DistributionList, MigrationModel, ModuleRef, ModuleService, PipelineRef, ReceiveLocation,
    ReceivePort, SendPort, SourceRef, Transport,
};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "BindingInfo";

/// Parses binding documents
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingFileParser;

impl ParserStage for BindingFileParser {
    fn id(&self) -> StageId {
        StageId::BindingFile
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            let application = &mut parsed.application;
            // Applications without bindings are legitimate
            let Some(bindings) = application.bindings.as_mut() else {
                continue;
            };

            let Some((definition, binding_info)) =
                load_document(graph, &bindings.keys, DOCUMENT, Severity::Warning, &mut diagnostics, decode)
            else {
                continue;
            };

            let key = child_key(&key_of(graph, definition), "bindinginfo");
            let mut item = NewResource::item(key.clone(), format!("{} bindings", application.name), ResourceType::BindingInfo)
                .with_property("ModuleRefCount", binding_info.module_refs.len().to_string())
                .with_source(SourceRef::BindingInfo { application: index });
            if let Some(version) = &binding_info.version {
                item = item.with_property("Version", version.clone());
            }

            tracing::debug!(
                application = %application.name,
                send_ports = binding_info.send_ports.len(),
                receive_ports = binding_info.receive_ports.len(),
                "parsed binding file"
            );
            bindings.binding_info = Some(binding_info);

            let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) else {
                continue;
            };
            bindings.resource = Some(ref_id);
            bindings.keys.resource_key = Some(key);

            if let Some(app_item) = application.resource {
                let linked = graph
                    .add_relationship(app_item, ref_id, RelationshipType::ReferencesTo)
                    .and_then(|()| graph.add_relationship(ref_id, app_item, RelationshipType::ReferencedBy));
                if let Err(err) = linked {
                    diagnostics.error(
                        EventId::GRAPH_CONFLICT,
                        format!("Unable to link bindings to application '{}': {}", application.name, err),
                        bindings.keys.resource_key.as_deref(),
                    );
                }
            }
        }

        diagnostics
    }
}

/// Decode a binding document
pub(crate) fn decode(content: &str) -> Result<BindingInfo, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "BindingInfo")?;

    Ok(BindingInfo {
        version: xml::attr(root, "Version"),
        module_refs: xml::collection(root, "ModuleRefCollection", "ModuleRef")
            .map(module_ref)
            .collect(),
        send_ports: xml::collection(root, "SendPortCollection", "SendPort")
            .map(send_port)
            .collect(),
        distribution_lists: xml::collection(root, "DistributionListCollection", "DistributionList")
            .map(distribution_list)
            .collect(),
        receive_ports: xml::collection(root, "ReceivePortCollection", "ReceivePort")
            .map(receive_port)
            .collect(),
    })
}

fn module_ref(node: Node<'_, '_>) -> ModuleRef {
    ModuleRef {
        name: xml::attr(node, "Name").unwrap_or_default(),
        version: xml::attr(node, "Version").unwrap_or_default(),
        culture: xml::attr(node, "Culture").unwrap_or_default(),
        public_key_token: xml::attr(node, "PublicKeyToken").unwrap_or_default(),
        full_name: xml::attr(node, "FullName").unwrap_or_default(),
        services: xml::collection(node, "Services", "Service")
            .map(|service| ModuleService {
                name: xml::attr(service, "Name").unwrap_or_default(),
                state: xml::attr(service, "State"),
                host: xml::child(service, "Host").and_then(|host| xml::attr(host, "Name")),
            })
            .collect(),
    }
}

fn pipeline_ref(node: Node<'_, '_>, name: &'static str) -> Option<PipelineRef> {
    xml::child(node, name).map(|pipeline| PipelineRef {
        name: xml::attr(pipeline, "Name").unwrap_or_default(),
        fully_qualified_name: xml::attr(pipeline, "FullyQualifiedName").unwrap_or_default(),
    })
}

fn send_port(node: Node<'_, '_>) -> SendPort {
    SendPort {
        name: xml::attr(node, "Name").unwrap_or_default(),
        description: xml::child_text(node, "Description"),
        is_static: xml::bool_attr(node, "IsStatic"),
        is_two_way: xml::bool_attr(node, "IsTwoWay"),
        application_name: xml::child_text(node, "ApplicationName"),
        primary_transport: xml::child(node, "PrimaryTransport").map(|transport| Transport {
            address: xml::child_text(transport, "Address"),
            transport_type: xml::child(transport, "TransportType").and_then(|t| xml::attr(t, "Name")),
        }),
        transmit_pipeline: pipeline_ref(node, "TransmitPipeline"),
        receive_pipeline: pipeline_ref(node, "ReceivePipeline"),
        filter: xml::child_text(node, "Filter"),
        filter_expression: None,
        resource: None,
    }
}

fn distribution_list(node: Node<'_, '_>) -> DistributionList {
    DistributionList {
        name: xml::attr(node, "Name").unwrap_or_default(),
        description: xml::child_text(node, "Description"),
        status: xml::attr(node, "Status"),
        application_name: xml::child_text(node, "ApplicationName"),
        send_ports: xml::collection(node, "SendPorts", "SendPortRef")
            .filter_map(|port| xml::attr(port, "Name"))
            .collect(),
        filter: xml::child_text(node, "Filter"),
        filter_expression: None,
        resource: None,
    }
}

fn receive_port(node: Node<'_, '_>) -> ReceivePort {
    ReceivePort {
        name: xml::attr(node, "Name").unwrap_or_default(),
        description: xml::child_text(node, "Description"),
        is_two_way: xml::bool_attr(node, "IsTwoWay"),
        application_name: xml::child_text(node, "ApplicationName"),
        receive_locations: xml::collection(node, "ReceiveLocations", "ReceiveLocation")
            .map(receive_location)
            .collect(),
        resource: None,
    }
}

fn receive_location(node: Node<'_, '_>) -> ReceiveLocation {
    ReceiveLocation {
        name: xml::attr(node, "Name").unwrap_or_default(),
        description: xml::child_text(node, "Description"),
        enabled: xml::child_text(node, "Enable").is_some_and(|value| value.eq_ignore_ascii_case("true")),
        transport: Transport {
            address: xml::child_text(node, "Address"),
            transport_type: xml::child(node, "ReceiveLocationTransportType").and_then(|t| xml::attr(t, "Name")),
        },
        receive_handler: xml::child(node, "ReceiveHandler").and_then(|h| xml::attr(h, "Name")),
        receive_pipeline: pipeline_ref(node, "ReceivePipeline"),
        send_pipeline: pipeline_ref(node, "SendPipeline"),
        resource: None,
    }
}
