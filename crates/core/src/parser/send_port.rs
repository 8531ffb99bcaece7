//! Send port stage
//!
//! Creates a `SendPort` item under the `BindingInfo` item for each send
//! port, and a `SendPortFilter` item under the port when it carries a
//! subscription filter.

use crate::context::Diagnostics;
use crate::graph::{typed_child_key, NewResource, ResourceType};
use crate::model::{MigrationModel, SendPort, SourceRef};

use super::filter::attach_filter;
use super::{append_item, application_group, key_of, ParserStage, StageId};

/// Parses send ports out of the decoded bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct SendPortParser;

impl ParserStage for SendPortParser {
    fn id(&self) -> StageId {
        StageId::SendPort
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            let Some(bindings) = parsed.application.bindings.as_mut() else {
                continue;
            };
            let (Some(info), Some(parent)) = (bindings.binding_info.as_mut(), bindings.resource) else {
                continue;
            };
            let parent_key = key_of(graph, parent);

            for (port_index, port) in info.send_ports.iter_mut().enumerate() {
                let item = describe(&parent_key, port).with_source(SourceRef::SendPort {
                    application: index,
                    send_port: port_index,
                });
                let Some(ref_id) = append_item(graph, parent, item, &mut diagnostics) else {
                    continue;
                };
                port.resource = Some(ref_id);

                port.filter_expression = attach_filter(
                    graph,
                    ref_id,
                    port.filter.as_deref(),
                    ResourceType::SendPortFilter,
                    SourceRef::SendPortFilter {
                        application: index,
                        send_port: port_index,
                    },
                    &mut diagnostics,
                );
            }

            tracing::debug!(
                application = %parsed.application.name,
                count = info.send_ports.len(),
                "parsed send ports"
            );
        }

        diagnostics
    }
}

fn describe(parent_key: &str, port: &SendPort) -> NewResource {
    let mut item = NewResource::item(
        typed_child_key(parent_key, ResourceType::SendPort, &port.name),
        port.name.clone(),
        ResourceType::SendPort,
    )
        .with_property("IsStatic", port.is_static.to_string())
        .with_property("IsTwoWay", port.is_two_way.to_string());

    if let Some(description) = &port.description {
        item = item.with_description(description.clone());
    }
    if let Some(transport) = &port.primary_transport {
        if let Some(address) = &transport.address {
            item = item.with_property("Address", address.clone());
        }
        if let Some(transport_type) = &transport.transport_type {
            item = item.with_property("TransportType", transport_type.clone());
        }
    }
    if let Some(pipeline) = &port.transmit_pipeline {
        item = item.with_property("TransmitPipeline", pipeline.name.clone());
    }
    if let Some(pipeline) = &port.receive_pipeline {
        item = item.with_property("ReceivePipeline", pipeline.name.clone());
    }
    item
}
