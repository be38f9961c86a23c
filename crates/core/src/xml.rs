use roxmltree::{Document, Node, ParsingOptions};

use crate::error::DecodeError;
use crate::model::XmlNode;

pub fn parse_xml_tree(text: &str) -> Result<XmlNode, DecodeError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(text, options)?;
    Ok(capture(document.root_element()))
}

fn capture(node: Node<'_, '_>) -> XmlNode {
    let attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    let mut chunks = Vec::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(capture(child));
        } else if child.is_text() {
            // mixed content: text on either side of a child stays separated
            match child.text().map(str::trim) {
                Some(chunk) if !chunk.is_empty() => chunks.push(chunk),
                _ => {}
            }
        }
    }

    XmlNode {
        name: node.tag_name().name().to_string(),
        attributes,
        text: (!chunks.is_empty()).then(|| chunks.join(" ")),
        children,
    }
}
