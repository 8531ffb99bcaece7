//! Distribution list (send port group) stage
//!
//! Each group becomes a `DistributionList` item under the bindings, with an
//! optional `DistributionListFilter` child. Membership is expressed as
//! `CallsTo` links from the group to its send ports and `CalledBy` links
//! back, so this stage runs after the send port stage.

use crate::context::{Diagnostics, EventId};
use crate::graph::{typed_child_key, NewResource, RefId, RelationshipType, ResourceGraph, ResourceType};
use crate::model::{BindingInfo, DistributionList, MigrationModel, SendPort, SourceRef};

use super::filter::attach_filter;
use super::{append_item, application_group, key_of, ParserStage, StageId};

/// Parses send port groups out of the decoded bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionListParser;

impl ParserStage for DistributionListParser {
    fn id(&self) -> StageId {
        StageId::DistributionList
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
            let BindingInfo {
                send_ports,
                distribution_lists,
                ..
            } = info;
            let parent_key = key_of(graph, parent);

            for (list_index, list) in distribution_lists.iter_mut().enumerate() {
                let item = describe(&parent_key, list).with_source(SourceRef::DistributionList {
                    application: index,
                    distribution_list: list_index,
                });
                let Some(ref_id) = append_item(graph, parent, item, &mut diagnostics) else {
                    continue;
                };
                list.resource = Some(ref_id);

                list.filter_expression = attach_filter(
                    graph,
                    ref_id,
                    list.filter.as_deref(),
                    ResourceType::DistributionListFilter,
                    SourceRef::DistributionListFilter {
                        application: index,
                        distribution_list: list_index,
                    },
                    &mut diagnostics,
                );

                link_members(graph, ref_id, list, send_ports, &mut diagnostics);
            }
        }

        diagnostics
    }
}

fn describe(parent_key: &str, list: &DistributionList) -> NewResource {
    let mut item = NewResource::item(
        typed_child_key(parent_key, ResourceType::DistributionList, &list.name),
        list.name.clone(),
        ResourceType::DistributionList,
    )
        .with_property("SendPortCount", list.send_ports.len().to_string());
    if let Some(description) = &list.description {
        item = item.with_description(description.clone());
    }
    if let Some(status) = &list.status {
        item = item.with_property("Status", status.clone());
    }
    item
}

/// Link a group to the items of its member send ports
///
/// A member that is not a send port of the same bindings (or whose item
/// could not be created) is reported as a warning.
fn link_members(
    graph: &mut ResourceGraph,
    list_item: RefId,
    list: &DistributionList,
    send_ports: &[SendPort],
    diagnostics: &mut Diagnostics,
) {
    for member in &list.send_ports {
        let Some(port_item) = send_ports
            .iter()
            .find(|port| &port.name == member)
            .and_then(|port| port.resource)
        else {
            diagnostics.warning(
                EventId::MISSING_RESOURCE,
                format!(
                    "Unable to find send port '{}' referenced by distribution list '{}'",
                    member, list.name
                ),
                Some(key_of(graph, list_item).as_str()),
            );
            continue;
        };

        let linked = graph
            .add_relationship(list_item, port_item, RelationshipType::CallsTo)
            .and_then(|()| graph.add_relationship(port_item, list_item, RelationshipType::CalledBy));
        if let Err(err) = linked {
            diagnostics.error(
                EventId::GRAPH_CONFLICT,
                format!("Unable to link distribution list '{}' to '{}': {}", list.name, member, err),
                Some(key_of(graph, list_item).as_str()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DefinitionType;
    use crate::model::{Application, BindingFile};
    use crate::parser::test_support::{app, graph_with, keys, model_with};
    use crate::parser::{BindingFileParser, SendPortParser};

    const BINDINGS: &str = r#"<BindingInfo>
  <SendPortCollection>
    <SendPort Name="ToWarehouse" IsStatic="true" IsTwoWay="false" />
    <SendPort Name="ToBilling" IsStatic="true" IsTwoWay="false" />
  </SendPortCollection>
  <DistributionListCollection>
    <DistributionList Name="OrderFanOut" Status="Started">
      <Description>Fans orders out</Description>
      <Filter>&lt;Filter&gt;&lt;Group&gt;&lt;Statement Property="BTS.MessageType" Operator="0" Value="Order" /&gt;&lt;/Group&gt;&lt;/Filter&gt;</Filter>
      <SendPorts>
        <SendPortRef Name="ToWarehouse" />
        <SendPortRef Name="ToBilling" />
        <SendPortRef Name="ElsewhereApp.Port" />
      </SendPorts>
    </DistributionList>
  </DistributionListCollection>
</BindingInfo>"#;

    fn parsed_model() -> (MigrationModel, Diagnostics) {
        let graph = graph_with(&[("bindings.xml", DefinitionType::Bindings, BINDINGS)]);
        let application = Application {
            bindings: Some(BindingFile::new(keys("bindings.xml"))),
            ..Default::default()
        };
        let mut model = model_with(vec![application], graph);
        BindingFileParser.parse(&mut model);
        SendPortParser.parse(&mut model);
        let diagnostics = DistributionListParser.parse(&mut model);
        (model, diagnostics)
    }

    fn info(model: &MigrationModel) -> &BindingInfo {
        app(model, 0).bindings.as_ref().unwrap().binding_info.as_ref().unwrap()
    }

    #[test]
    fn test_group_links_to_member_ports() {
        let (model, _) = parsed_model();
        let info = info(&model);
        let list_item = info.distribution_lists[0].resource.unwrap();
        let warehouse = info.send_ports[0].resource.unwrap();
        let billing = info.send_ports[1].resource.unwrap();

        assert_eq!(
            model.graph.relationships(list_item),
            vec![(RelationshipType::CallsTo, warehouse), (RelationshipType::CallsTo, billing)]
        );
        assert_eq!(model.graph.relationships(billing), vec![(RelationshipType::CalledBy, list_item)]);
    }

    #[test]
    fn test_group_filter_item() {
        let (model, _) = parsed_model();
        let list = &info(&model).distribution_lists[0];
        let filter = list.filter_expression.as_ref().unwrap();

        assert_eq!(filter.groups.len(), 1);
        let filter_node = model.graph.node(filter.resource.unwrap()).unwrap();
        assert_eq!(filter_node.resource_type(), Some(ResourceType::DistributionListFilter));
        assert_eq!(filter_node.parent_ref_id, list.resource);
        assert_eq!(filter_node.description, "(BTS.MessageType == Order)");
    }

    #[test]
    fn test_unknown_member_is_a_warning() {
        let (_, diagnostics) = parsed_model();

        assert_eq!(diagnostics.errors().count(), 0);
        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("ElsewhereApp.Port"));
    }
}
