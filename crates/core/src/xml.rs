//! Thin helpers over `roxmltree` for navigating legacy documents
//!
//! Element and attribute lookups match on local names, so prefixed
//! documents (`om:Element`, `xs:schema`) and unprefixed ones are read the
//! same way.

use roxmltree::{Document, Node};

use crate::error::ContentError;

/// Parse raw content into a DOM
///
/// Leading whitespace and a byte-order mark are tolerated, since extracted
/// and embedded documents often carry them in front of the XML declaration.
pub fn parse(content: &str) -> Result<Document<'_>, ContentError> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.trim_end().is_empty() {
        return Err(ContentError::Empty);
    }
    Ok(Document::parse(trimmed)?)
}

/// Return the root element, checking its local name
pub fn root<'a, 'input>(doc: &'a Document<'input>, expected: &'static str) -> Result<Node<'a, 'input>, ContentError> {
    let root = doc.root_element();
    if root.tag_name().name() != expected {
        return Err(ContentError::UnexpectedRoot {
            expected,
            found: root.tag_name().name().to_string(),
        });
    }
    Ok(root)
}

/// Child elements with the given local name, in document order
pub fn children<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

/// First child element with the given local name
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// Children of the first `collection` child that are named `name`
///
/// Binding and application-definition documents wrap lists in a
/// collection element (`<SendPortCollection><SendPort/>...`).
pub fn collection<'a, 'input>(
    node: Node<'a, 'input>,
    collection: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    child(node, collection)
        .into_iter()
        .flat_map(move |list| children(list, name))
}

/// Attribute value as an owned string
pub fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// Attribute value that must be present
pub fn required_attr(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<String, ContentError> {
    attr(node, attribute).ok_or(ContentError::MissingAttribute { element, attribute })
}

/// Text of a child element, if present and not blank
pub fn child_text(node: Node<'_, '_>, name: &'static str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Boolean attribute; anything other than `true` (any case) is false
pub fn bool_attr(node: Node<'_, '_>, name: &str) -> bool {
    node.attribute(name)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}
