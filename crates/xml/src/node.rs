// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::io::Read;

use protean_var::{Bag, Mapping, v_any};
use tracing::{debug, trace};
use xml::{ParserConfig, reader::XmlEvent};

use crate::{COMMENT_KEY, INSTRUCTION_KEY, XmlError, XmlMode};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum NodeKind {
    #[default]
    Element,
    /// The comment body is the node's text.
    Comment,
    /// The instruction data is the node's text.
    Instruction { target: String },
}

/// One node of a parsed document. Attributes keep document order. Comments and processing
/// instructions only appear among `children` when the document was parsed in preserve mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlNode {
    pub kind: NodeKind,
    pub name: String,
    pub attributes: Bag,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn comment(text: &str) -> Self {
        Self {
            kind: NodeKind::Comment,
            name: COMMENT_KEY.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn instruction(target: &str, data: &str) -> Self {
        Self {
            kind: NodeKind::Instruction {
                target: target.to_string(),
            },
            name: INSTRUCTION_KEY.to_string(),
            text: data.to_string(),
            ..Default::default()
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Child elements, skipping comments and processing instructions.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> + '_ {
        self.children.iter().filter(|c| c.is_element())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.at_key(name).ok().and_then(|v| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|c| c.name == name)
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Parse a whole document into its root element. CDATA sections are folded into the text of
/// the enclosing element; comments and processing instructions are dropped.
pub fn parse_document<R: Read>(reader: R) -> Result<XmlNode, XmlError> {
    parse_document_with(reader, &XmlMode::default())
}

/// As `parse_document`, but with `mode.preserve` comments and processing instructions inside
/// the root element are kept as child nodes. Those outside the root are always dropped.
pub fn parse_document_with<R: Read>(reader: R, mode: &XmlMode) -> Result<XmlNode, XmlError> {
    let parser = ParserConfig::new()
        .ignore_comments(!mode.preserve)
        .create_reader(reader);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;
    for e in parser {
        match e? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if root.is_some() {
                    return Err(XmlError::Malformed(format!(
                        "second root element <{}>",
                        name.local_name
                    )));
                }
                let mut node = XmlNode::new(&name.local_name);
                for a in &attributes {
                    node.attributes.insert(&a.name.local_name, v_any(&a.value))?;
                }
                stack.push(node);
            }
            XmlEvent::EndElement { .. } => {
                let node = stack.pop().ok_or_else(|| {
                    XmlError::Malformed("end tag without start tag".to_string())
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            XmlEvent::ProcessingInstruction { name, data } => match stack.last_mut() {
                Some(node) if mode.preserve => node
                    .children
                    .push(XmlNode::instruction(&name, data.as_deref().unwrap_or_default())),
                _ => debug!(target = %name, "Skipping processing instruction"),
            },
            XmlEvent::Comment(text) => match stack.last_mut() {
                Some(node) if mode.preserve => node.children.push(XmlNode::comment(&text)),
                _ => trace!("Skipping comment"),
            },
            _ => {}
        }
    }
    root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))
}
