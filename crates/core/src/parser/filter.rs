//! Filter expressions embedded in send ports and send port groups
//!
//! The binding stores the filter as escaped XML text:
//!
//! ```text
//! <Filter>
//!   <Group>
//!     <Statement Property="FILE.ReceivedFileName" Operator="0" Value="order.xml" />
//!   </Group>
//! </Filter>
//! ```

use crate::context::{Diagnostics, EventId};
use crate::error::ContentError;
use crate::graph::{child_key, NewResource, RefId, ResourceGraph, ResourceType};
use crate::model::{FilterExpression, FilterGroup, FilterOperator, FilterStatement, SourceRef};
use crate::xml;

use super::{append_item, key_of};

/// Decode filter XML into groups of statements
pub fn parse_filter(content: &str) -> Result<FilterExpression, ContentError> {
    let doc = xml::parse(content)?;
    let root = xml::root(&doc, "Filter")?;

    let mut groups = Vec::new();
    for group in xml::children(root, "Group") {
        let mut statements = Vec::new();
        for statement in xml::children(group, "Statement") {
            let property = xml::required_attr(statement, "Statement", "Property")?;
            let code = statement
                .attribute("Operator")
                .and_then(|op| op.trim().parse::<i32>().ok())
                .ok_or(ContentError::MissingAttribute {
                    element: "Statement",
                    attribute: "Operator",
                })?;
            statements.push(FilterStatement {
                property,
                operator: FilterOperator::from_code(code),
                value: xml::attr(statement, "Value"),
            });
        }
        groups.push(FilterGroup { statements });
    }

    Ok(FilterExpression { groups, resource: None })
}

/// Raw filter text worth decoding, if any
pub(crate) fn non_empty(filter: Option<&str>) -> Option<&str> {
    filter.filter(|text| !text.trim().is_empty())
}

/// Decode an owner's raw filter and append its filter item under the owner
///
/// Returns the linked expression, or `None` when there is no filter or it
/// does not decode (reported as an error against the owner).
pub(crate) fn attach_filter(
    graph: &mut ResourceGraph,
    owner: RefId,
    raw: Option<&str>,
    resource_type: ResourceType,
    source: SourceRef,
    diagnostics: &mut Diagnostics,
) -> Option<FilterExpression> {
    let raw = non_empty(raw)?;
    let owner_key = key_of(graph, owner);

    let mut expression = match parse_filter(raw) {
        Ok(expression) => expression,
        Err(err) => {
            diagnostics.error(
                EventId::MALFORMED_CONTENT,
                format!("Unable to parse the filter expression of '{}': {}", owner_key, err),
                Some(owner_key.as_str()),
            );
            return None;
        }
    };

    let name = graph
        .node(owner)
        .map(|node| format!("{} filter", node.name))
        .unwrap_or_default();
    let item = NewResource::item(child_key(&owner_key, "filter"), name, resource_type)
        .with_description(expression.to_string())
        .with_property("GroupCount", expression.groups.len().to_string())
        .with_source(source);
    expression.resource = append_item(graph, owner, item, diagnostics);

    Some(expression)
}
