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

use base64::{Engine, engine::general_purpose};
use protean_var::{
    Bag, Buffer, DataTable, Dictionary, ExceptionInfo, List, Mapping, ObjectFactory,
    ObjectHandle, TimeSeries, Tuple, TypedArray, Variant, VariantType, temporal, v_any, v_bag,
    v_str,
};

use crate::{
    ATTRIBUTES_KEY, CLASS_ATTR, COMMENT_KEY, DATA_KEY, INSTRUCTION_KEY, NAME_ATTR, NodeKind,
    SIZE_ATTR, TARGET_KEY, TEXT_KEY, TIME_ATTR, TYPE_ATTR, VARIANT_ATTR, VERSION_ATTR, XmlError,
    XmlMode, XmlNode,
};

/// Builds variants from parsed element trees.
pub struct XmlReader<'a> {
    mode: XmlMode,
    factory: Option<&'a dyn ObjectFactory>,
}

impl<'a> XmlReader<'a> {
    pub fn new(mode: XmlMode) -> Self {
        Self {
            mode,
            factory: None,
        }
    }

    /// Use `factory` to materialize objects whose class it knows. Without one, objects are read
    /// as proxies.
    pub fn with_factory(mut self, factory: &'a dyn ObjectFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Convert `node` and everything below it.
    pub fn read(&self, node: &XmlNode) -> Result<Variant, XmlError> {
        match node.attribute(VARIANT_ATTR) {
            Some(tag) => self.read_typed(node, VariantType::parse(tag)?),
            None => self.infer(node),
        }
    }
}

fn required<'n>(node: &'n XmlNode, attr: &str) -> Result<&'n str, XmlError> {
    node.attribute(attr).ok_or_else(|| {
        XmlError::Malformed(format!("<{}> is missing the '{attr}' attribute", node.name))
    })
}

/// The Bag entry standing for a comment or processing instruction node.
fn preserved_entry(node: &XmlNode) -> Option<(&'static str, Variant)> {
    match &node.kind {
        NodeKind::Element => None,
        NodeKind::Comment => Some((COMMENT_KEY, v_any(&node.text))),
        NodeKind::Instruction { target } => Some((
            INSTRUCTION_KEY,
            v_bag([(TARGET_KEY, v_any(target)), (DATA_KEY, v_any(&node.text))]),
        )),
    }
}

/// Parse the text of a primitive element.
fn scalar_from_text(tag: VariantType, text: &str) -> Result<Variant, XmlError> {
    match tag {
        VariantType::String => Ok(v_str(text)),
        VariantType::Any => Ok(v_any(text)),
        VariantType::Buffer => general_purpose::STANDARD
            .decode(text.trim())
            .map(|bytes| Variant::from(Buffer::from_bytes(bytes)))
            .map_err(|e| XmlError::Malformed(format!("buffer text is not base64: {e}"))),
        _ => Ok(v_any(text.trim()).down_cast(tag)?),
    }
}

impl XmlReader<'_> {
    fn text<'n>(&self, node: &'n XmlNode) -> &'n str {
        if self.mode.strip_space {
            node.text.trim()
        } else {
            &node.text
        }
    }

    fn read_children<C: FromIterator<Variant>>(&self, node: &XmlNode) -> Result<C, XmlError> {
        node.elements().map(|c| self.read(c)).collect()
    }

    /// Fill `bag` from every child of `node`, keeping preserved nodes in preserve mode.
    fn read_entries(&self, node: &XmlNode, bag: &mut Bag) -> Result<(), XmlError> {
        for child in &node.children {
            match preserved_entry(child) {
                None => bag.insert(&child.name, self.read(child)?)?,
                Some((key, v)) if self.mode.preserve => bag.insert(key, v)?,
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn read_typed(&self, node: &XmlNode, tag: VariantType) -> Result<Variant, XmlError> {
        let v = match tag {
            VariantType::List => Variant::from(self.read_children::<List>(node)?),
            VariantType::Tuple => {
                let values: Vec<Variant> = self.read_children(node)?;
                if let Some(size) = node.attribute(SIZE_ATTR)
                    && size.parse::<usize>().ok() != Some(values.len())
                {
                    return Err(XmlError::Malformed(format!(
                        "tuple declares size {size} but holds {} values",
                        values.len()
                    )));
                }
                Variant::from(Tuple::from_values(values))
            }
            VariantType::Array => {
                let element_type = VariantType::parse(required(node, TYPE_ATTR)?)?;
                let values: Vec<Variant> = self.read_children(node)?;
                Variant::from(TypedArray::from_values(element_type, values)?)
            }
            VariantType::Dictionary => {
                let mut dict = Dictionary::new();
                for child in node.elements() {
                    if dict.has_key(&child.name) {
                        return Err(XmlError::Malformed(format!(
                            "dictionary key '{}' appears twice",
                            child.name
                        )));
                    }
                    dict.insert(&child.name, self.read(child)?)?;
                }
                Variant::from(dict)
            }
            VariantType::Bag => {
                let mut bag = Bag::new();
                self.read_entries(node, &mut bag)?;
                Variant::from(bag)
            }
            VariantType::TimeSeries => {
                let mut series = TimeSeries::new();
                for child in node.elements() {
                    let time = temporal::parse_date_time(required(child, TIME_ATTR)?)?;
                    series.push_back(time, self.read(child)?);
                }
                Variant::from(series)
            }
            VariantType::DataTable => Variant::from(self.read_data_table(node)?),
            VariantType::Object => {
                let name = required(node, CLASS_ATTR)?;
                let version = required(node, VERSION_ATTR)?;
                let version = version.parse::<u32>().map_err(|e| {
                    XmlError::Malformed(format!("object version '{version}' is invalid: {e}"))
                })?;
                let params = match node.child("Params") {
                    Some(p) => self.read(p)?,
                    None => Variant::default(),
                };
                Variant::from(ObjectHandle::restore(self.factory, name, version, params)?)
            }
            VariantType::Exception => {
                let field = |n: &str| {
                    node.child(n)
                        .map(|c| c.text.clone())
                        .unwrap_or_default()
                };
                Variant::mk_exception(ExceptionInfo::from_parts(
                    field("type"),
                    field("message"),
                    field("source"),
                    field("stack"),
                ))
            }
            _ => scalar_from_text(tag, self.text(node))?,
        };
        Ok(v)
    }

    fn read_data_table(&self, node: &XmlNode) -> Result<DataTable, XmlError> {
        let mut table = DataTable::new();
        for child in node.elements() {
            match child.name.as_str() {
                "Column" => {
                    let tag = VariantType::parse(required(child, TYPE_ATTR)?)?;
                    table.add_column(tag, child.attribute(NAME_ATTR))?;
                }
                "Row" => {
                    let tags = table.column_types();
                    let cells: Vec<&XmlNode> = child.elements().collect();
                    if cells.len() != tags.len() {
                        return Err(XmlError::Malformed(format!(
                            "row has {} values for {} columns",
                            cells.len(),
                            tags.len()
                        )));
                    }
                    let row = tags
                        .iter()
                        .zip(cells)
                        .map(|(tag, cell)| scalar_from_text(*tag, self.text(cell)))
                        .collect::<Result<Vec<_>, _>>()?;
                    table.push_row(row)?;
                }
                other => {
                    return Err(XmlError::Malformed(format!(
                        "unexpected <{other}> inside a data table"
                    )));
                }
            }
        }
        Ok(table)
    }

    /// An element without a `variant` attribute: text alone becomes `Any`, anything richer a
    /// Bag keyed by child element name.
    fn infer(&self, node: &XmlNode) -> Result<Variant, XmlError> {
        let has_attributes = !node.attributes.is_empty();
        let has_children = node
            .children
            .iter()
            .any(|c| c.is_element() || self.mode.preserve);
        if !has_children && !has_attributes {
            return Ok(v_any(self.text(node)));
        }
        let mut bag = Bag::new();
        if has_attributes {
            bag.insert(ATTRIBUTES_KEY, Variant::from(node.attributes.clone()))?;
        }
        if !has_children || node.has_text() {
            bag.insert(TEXT_KEY, v_any(self.text(node)))?;
        }
        self.read_entries(node, &mut bag)?;
        Ok(Variant::from(bag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_xml, parse_document};
    use pretty_assertions::assert_eq;
    use protean_var::{v_bag, v_int32, v_list};

    #[test]
    fn test_untyped_elements_are_inferred() {
        let doc = r#"<book id="7"><title>Dune</title><author>Herbert</author> </book>"#;
        let v = from_xml(doc, &XmlMode::default()).unwrap();
        assert_eq!(
            v,
            v_bag([
                (ATTRIBUTES_KEY, v_bag([("id", v_any("7"))])),
                ("title", v_any("Dune")),
                ("author", v_any("Herbert")),
            ])
        );
    }

    #[test]
    fn test_attributes_without_children_keep_text() {
        let v = from_xml(r#"<price currency="EUR">12.5</price>"#, &XmlMode::default()).unwrap();
        assert_eq!(
            v,
            v_bag([
                (ATTRIBUTES_KEY, v_bag([("currency", v_any("EUR"))])),
                (TEXT_KEY, v_any("12.5")),
            ])
        );
        assert_eq!(
            from_xml("<note>  hi </note>", &XmlMode::default()).unwrap(),
            v_any("  hi ")
        );
        let strip = XmlMode {
            strip_space: true,
            ..Default::default()
        };
        assert_eq!(from_xml("<note>  hi </note>", &strip).unwrap(), v_any("hi"));
    }

    #[test]
    fn test_preserve_reads_comments_and_instructions() {
        let doc = r#"<doc><!-- first --><?style sheet.css?><a>1</a></doc>"#;
        let preserve = XmlMode {
            preserve: true,
            ..Default::default()
        };
        assert_eq!(
            from_xml(doc, &preserve).unwrap(),
            v_bag([
                (COMMENT_KEY, v_any(" first ")),
                (
                    INSTRUCTION_KEY,
                    v_bag([(TARGET_KEY, v_any("style")), (DATA_KEY, v_any("sheet.css"))])
                ),
                ("a", v_any("1")),
            ])
        );
        assert_eq!(
            from_xml(doc, &XmlMode::default()).unwrap(),
            v_bag([("a", v_any("1"))])
        );
    }

    #[test]
    fn test_comments_inside_typed_lists_are_skipped() {
        let doc = r#"<v variant="List"><!-- c --><Variant variant="Int32">1</Variant></v>"#;
        let preserve = XmlMode {
            preserve: true,
            ..Default::default()
        };
        assert_eq!(from_xml(doc, &preserve).unwrap(), v_list(&[v_int32(1)]));
    }

    #[test]
    fn test_typed_and_untyped_mix() {
        let doc = r#"<Variant variant="List"><Variant variant="Int32"> 4 </Variant><x>y</x></Variant>"#;
        let v = from_xml(doc, &XmlMode::default()).unwrap();
        assert_eq!(v, v_list(&[v_int32(4), v_any("y")]));
    }

    #[test]
    fn test_malformed_typed_elements() {
        let reader = XmlReader::new(XmlMode::default());
        let parse = |doc: &str| reader.read(&parse_document(doc.as_bytes()).unwrap());

        assert!(matches!(
            parse(r#"<v variant="Array"><Variant variant="Int32">1</Variant></v>"#),
            Err(XmlError::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"<v variant="Tuple" size="3"><Variant variant="None"/></v>"#),
            Err(XmlError::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"<v variant="Dictionary"><a variant="None"/><a variant="None"/></v>"#),
            Err(XmlError::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"<v variant="Int32">four</v>"#),
            Err(XmlError::Variant(_))
        ));
        assert!(matches!(
            parse(r#"<v variant="Banana"/>"#),
            Err(XmlError::Variant(_))
        ));
    }
}
