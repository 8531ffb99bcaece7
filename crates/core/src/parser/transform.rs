//! Map stage

use roxmltree::Node;

use crate::context::{Diagnostics, Severity};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{MigrationModel, SourceRef};
use crate::xml;

use super::{append_item, application_group, key_of, load_document, ParserStage, StageId};

const DOCUMENT: &str = "Map";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MapDocument {
    pub source_schema: Option<String>,
    pub target_schema: Option<String>,
    pub link_count: usize,
    pub functoid_count: usize,
}

/// Reads BizTalk maps and creates a `Map` item for each
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformParser;

impl ParserStage for TransformParser {
    fn id(&self) -> StageId {
        StageId::Transform
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (transform_index, transform) in parsed.application.transforms.iter_mut().enumerate() {
                let Some((definition, map)) =
                    load_document(graph, &transform.keys, DOCUMENT, Severity::Error, &mut diagnostics, decode)
                else {
                    continue;
                };

                let key = child_key(&key_of(graph, definition), &transform.name);
                let mut item = NewResource::item(key.clone(), transform.name.clone(), ResourceType::Map)
                    .with_property("FullName", transform.full_name.clone())
                    .with_property("LinkCount", map.link_count.to_string())
                    .with_property("FunctoidCount", map.functoid_count.to_string())
                    .with_source(SourceRef::Transform {
                        application: index,
                        transform: transform_index,
                    });
                if let Some(source) = &map.source_schema {
                    item = item.with_property("SourceSchema", source.clone());
                }
                if let Some(target) = &map.target_schema {
                    item = item.with_property("TargetSchema", target.clone());
                }

                transform.source_schema = map.source_schema;
                transform.target_schema = map.target_schema;

                if let Some(ref_id) = append_item(graph, definition, item, &mut diagnostics) {
                    transform.resource = Some(ref_id);
                    transform.keys.resource_key = Some(key);
                }
            }
        }

        diagnostics
    }
}

pub(crate) fn decode(content: &str) -> Result<MapDocument, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "mapsource")?;

    let pages = || xml::collection(root, "Pages", "Page");

    Ok(MapDocument {
        source_schema: tree_schema(root, "SrcTree"),
        target_schema: tree_schema(root, "TrgTree"),
        link_count: pages().flat_map(|page| xml::collection(page, "Links", "Link")).count(),
        functoid_count: pages()
            .flat_map(|page| xml::collection(page, "Functoids", "Functoid"))
            .count(),
    })
}

/// Schema a map tree points at: the referenced type, else the root node name
fn tree_schema(root: Node<'_, '_>, tree: &'static str) -> Option<String> {
    let tree = xml::child(root, tree)?;
    xml::child(tree, "Reference")
        .and_then(|reference| xml::attr(reference, "Location"))
        .or_else(|| xml::attr(tree, "RootNode_Name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DefinitionType;
    use crate::model::{Application, Transform};
    use crate::parser::test_support::{app, graph_with, keys, model_with};

    const MAP: &str = r#"<?xml version="1.0" encoding="utf-16"?>
<mapsource Name="BizTalk Map" BizTalkServerMapperTool_Version="2.0" Version="2" XRange="100" YRange="420" OmitXmlDeclaration="Yes" method="xml" xmlVersion="1.0">
  <SrcTree RootNode_Name="Order">
    <Reference Location="Orders.Schemas.Order" />
  </SrcTree>
  <TrgTree RootNode_Name="Invoice" />
  <Pages>
    <Page Name="Page 1">
      <Links>
        <Link LinkID="1" LinkFrom="/*[local-name()='Order']/*[local-name()='OrderId']" LinkTo="1" />
        <Link LinkID="2" LinkFrom="1" LinkTo="/*[local-name()='Invoice']/*[local-name()='InvoiceId']" />
      </Links>
      <Functoids>
        <Functoid FunctionNumber="107" FunctoidID="1" X-Cell="52" Y-Cell="112" />
      </Functoids>
    </Page>
  </Pages>
</mapsource>"#;

    #[test]
    fn test_map_schemas_resolved() {
        let application = Application {
            transforms: vec![Transform::new("OrderToInvoice", "Orders.Maps.OrderToInvoice", keys("map.btm"))],
            ..Default::default()
        };
        let mut model = model_with(
            vec![application],
            graph_with(&[("map.btm", DefinitionType::Transform, MAP)]),
        );
        let diagnostics = TransformParser.parse(&mut model);
        assert!(diagnostics.is_empty());

        let transform = &app(&model, 0).transforms[0];
        assert_eq!(transform.source_schema.as_deref(), Some("Orders.Schemas.Order"));
        assert_eq!(transform.target_schema.as_deref(), Some("Invoice"));

        let item = model.graph.node(transform.resource.unwrap()).unwrap();
        assert_eq!(item.resource_type(), Some(ResourceType::Map));
        assert_eq!(item.property("LinkCount"), Some("2"));
        assert_eq!(item.property("FunctoidCount"), Some("1"));
        assert_eq!(transform.keys.resource_key.as_deref(), Some("map.btm:OrderToInvoice"));
    }

    #[test]
    fn test_missing_map_is_an_error() {
        let application = Application {
            transforms: vec![Transform::new("Gone", "Orders.Maps.Gone", keys("gone.btm"))],
            ..Default::default()
        };
        let mut model = model_with(vec![application], graph_with(&[]));

        assert_eq!(TransformParser.parse(&mut model).errors().count(), 1);
        assert!(app(&model, 0).transforms[0].resource.is_none());
    }
}
