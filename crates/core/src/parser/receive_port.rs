//! Receive port stage

use crate::context::Diagnostics;
use crate::graph::{child_key, typed_child_key, NewResource, ResourceType};
use crate::model::{MigrationModel, ReceiveLocation, ReceivePort, SourceRef};

use super::{append_item, application_group, key_of, ParserStage, StageId};

/// Creates `ReceivePort` items under the bindings, each with its
/// `ReceiveLocation` children
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceivePortParser;

impl ParserStage for ReceivePortParser {
    fn id(&self) -> StageId {
        StageId::ReceivePort
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

            for (port_index, port) in info.receive_ports.iter_mut().enumerate() {
                let port_key = typed_child_key(&parent_key, ResourceType::ReceivePort, &port.name);
                let item = describe_port(&port_key, port).with_source(SourceRef::ReceivePort {
                    application: index,
                    receive_port: port_index,
                });
                let Some(port_id) = append_item(graph, parent, item, &mut diagnostics) else {
                    continue;
                };
                port.resource = Some(port_id);

                for (location_index, location) in port.receive_locations.iter_mut().enumerate() {
                    let item = describe_location(&port_key, location).with_source(SourceRef::ReceiveLocation {
                        application: index,
                        receive_port: port_index,
                        receive_location: location_index,
                    });
                    location.resource = append_item(graph, port_id, item, &mut diagnostics);
                }
            }

            tracing::debug!(
                application = %parsed.application.name,
                count = info.receive_ports.len(),
                "parsed receive ports"
            );
        }

        diagnostics
    }
}

fn describe_port(key: &str, port: &ReceivePort) -> NewResource {
    let mut item = NewResource::item(key, port.name.clone(), ResourceType::ReceivePort)
        .with_property("IsTwoWay", port.is_two_way.to_string())
        .with_property("ReceiveLocationCount", port.receive_locations.len().to_string());
    if let Some(description) = &port.description {
        item = item.with_description(description.clone());
    }
    item
}

fn describe_location(port_key: &str, location: &ReceiveLocation) -> NewResource {
    let mut item = NewResource::item(
        child_key(port_key, &location.name),
        location.name.clone(),
        ResourceType::ReceiveLocation,
    )
    .with_property("Enabled", location.enabled.to_string());

    if let Some(description) = &location.description {
        item = item.with_description(description.clone());
    }
    if let Some(address) = &location.transport.address {
        item = item.with_property("Address", address.clone());
    }
    if let Some(transport_type) = &location.transport.transport_type {
        item = item.with_property("TransportType", transport_type.clone());
    }
    if let Some(handler) = &location.receive_handler {
        item = item.with_property("ReceiveHandler", handler.clone());
    }
    if let Some(pipeline) = &location.receive_pipeline {
        item = item.with_property("ReceivePipeline", pipeline.name.clone());
    }
    if let Some(pipeline) = &location.send_pipeline {
        item = item.with_property("SendPipeline", pipeline.name.clone());
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DefinitionType;
    use crate::model::{Application, BindingFile};
    use crate::parser::test_support::{app, graph_with, keys, model_with};
    use crate::parser::BindingFileParser;

    const BINDINGS: &str = r#"<BindingInfo>
  <ReceivePortCollection>
    <ReceivePort Name="ReceiveOrders" IsTwoWay="false">
      <Description>Inbound orders</Description>
      <ReceiveLocations>
        <ReceiveLocation Name="ReceiveOrders.FILE">
          <Address>C:\in\*.xml</Address>
          <ReceivePipeline Name="Microsoft.BizTalk.DefaultPipelines.XMLReceive" FullyQualifiedName="Microsoft.BizTalk.DefaultPipelines.XMLReceive, Microsoft.BizTalk.DefaultPipelines" />
          <ReceiveLocationTransportType Name="FILE" />
          <Enable>true</Enable>
          <ReceiveHandler Name="BizTalkServerApplication" />
        </ReceiveLocation>
        <ReceiveLocation Name="ReceiveOrders.FTP">
          <Address>ftp://orders/in</Address>
          <ReceiveLocationTransportType Name="FTP" />
          <Enable>false</Enable>
        </ReceiveLocation>
      </ReceiveLocations>
    </ReceivePort>
    <ReceivePort Name="ReceiveOrders" IsTwoWay="true" />
  </ReceivePortCollection>
</BindingInfo>"#;

    fn parsed_model() -> (MigrationModel, Diagnostics) {
        let graph = graph_with(&[("bindings.xml", DefinitionType::Bindings, BINDINGS)]);
        let application = Application {
            bindings: Some(BindingFile::new(keys("bindings.xml"))),
            ..Default::default()
        };
        let mut model = model_with(vec![application], graph);
        BindingFileParser.parse(&mut model);
        let diagnostics = ReceivePortParser.parse(&mut model);
        (model, diagnostics)
    }

    fn receive_ports(model: &MigrationModel) -> &[ReceivePort] {
        &app(model, 0).bindings.as_ref().unwrap().binding_info.as_ref().unwrap().receive_ports
    }

    #[test]
    fn test_locations_nested_under_port() {
        let (model, _) = parsed_model();
        let port = &receive_ports(&model)[0];
        let port_id = port.resource.unwrap();

        let locations = model.graph.resources(port_id);
        assert_eq!(locations.len(), 2);
        assert_eq!(port.receive_locations[0].resource, Some(locations[0]));
        assert_eq!(port.receive_locations[1].resource, Some(locations[1]));

        let file = model.graph.node(locations[0]).unwrap();
        assert_eq!(file.key, "bindings.xml:bindinginfo:ReceivePort:ReceiveOrders:ReceiveOrders.FILE");
        assert_eq!(file.parent_ref_id, Some(port_id));
        assert_eq!(file.property("Enabled"), Some("true"));
        assert_eq!(file.property("ReceivePipeline"), Some("Microsoft.BizTalk.DefaultPipelines.XMLReceive"));

        let ftp = model.graph.node(locations[1]).unwrap();
        assert_eq!(ftp.property("Enabled"), Some("false"));
        assert_eq!(ftp.property("TransportType"), Some("FTP"));
    }

    #[test]
    fn test_duplicate_port_name_is_an_error() {
        let (model, diagnostics) = parsed_model();

        assert_eq!(diagnostics.errors().count(), 1);
        assert!(receive_ports(&model)[1].resource.is_none());
    }
}
