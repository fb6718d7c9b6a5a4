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

use std::io::Write;

use base64::{Engine, engine::general_purpose};
use protean_var::{Payload, Sequence, Variant, temporal};
use xml::{EmitterConfig, EventWriter, writer::XmlEvent};

use crate::{
    CLASS_ATTR, COMMENT_KEY, DATA_KEY, INSTRUCTION_KEY, NAME_ATTR, SIZE_ATTR, TARGET_KEY,
    TIME_ATTR, TYPE_ATTR, VARIANT_ATTR, VERSION_ATTR, XmlError, XmlMode,
};

/// Child element name for sequence and time series entries.
const ITEM: &str = "Variant";

pub struct XmlWriter<W: Write> {
    writer: EventWriter<W>,
    mode: XmlMode,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W, mode: XmlMode) -> Self {
        let writer = EmitterConfig::new()
            .perform_indent(mode.indent)
            .write_document_declaration(!mode.no_header)
            .autopad_comments(false)
            .create_writer(writer);
        Self { writer, mode }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Write `v` as the document's root element. A document holds exactly one value.
    pub fn write(&mut self, v: &Variant) -> Result<(), XmlError> {
        let root = self.mode.root_name.clone();
        self.write_element(&root, v, None)
    }
}

/// Element names must start with a letter or underscore and continue with letters, digits,
/// `-`, `_` or `.`.
fn check_name(name: &str) -> Result<(), XmlError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(XmlError::InvalidName(name.to_string()))
    }
}

/// The text of a primitive as it appears between tags.
fn scalar_text(v: &Variant) -> Result<String, XmlError> {
    match v.payload() {
        Payload::Buffer(b) => Ok(general_purpose::STANDARD.encode(b.as_bytes())),
        _ => Ok(v.text_value()?),
    }
}

impl<W: Write> XmlWriter<W> {
    fn start(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<(), XmlError> {
        check_name(name)?;
        let element = attrs
            .iter()
            .fold(XmlEvent::start_element(name), |e, (k, v)| e.attr(*k, v.as_str()));
        self.writer.write(element)?;
        Ok(())
    }

    fn end(&mut self) -> Result<(), XmlError> {
        self.writer.write(XmlEvent::end_element())?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), XmlError> {
        if !text.is_empty() {
            self.writer.write(XmlEvent::characters(text))?;
        }
        Ok(())
    }

    /// Emit a Bag entry as a comment or processing instruction when it is shaped like one.
    /// Returns false for every other entry.
    fn write_preserved(&mut self, key: &str, item: &Variant) -> Result<bool, XmlError> {
        match key {
            COMMENT_KEY => {
                let Some(text) = item.as_str() else {
                    return Ok(false);
                };
                self.writer.write(XmlEvent::comment(text))?;
            }
            INSTRUCTION_KEY => {
                let target = item.at_key(TARGET_KEY).ok().and_then(|t| t.as_str());
                let data = item.at_key(DATA_KEY).ok().and_then(|d| d.as_str());
                let Some(target) = target else {
                    return Ok(false);
                };
                let data = data.filter(|d| !d.is_empty());
                self.writer
                    .write(XmlEvent::processing_instruction(target, data))?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), XmlError> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end()
    }

    fn write_element(
        &mut self,
        name: &str,
        v: &Variant,
        time: Option<String>,
    ) -> Result<(), XmlError> {
        let mut attrs = vec![(VARIANT_ATTR, v.variant_type().name().to_string())];
        if let Some(time) = time {
            attrs.push((TIME_ATTR, time));
        }
        match v.payload() {
            Payload::Tuple(t) => attrs.push((SIZE_ATTR, t.len().to_string())),
            Payload::Array(a) => {
                attrs.push((TYPE_ATTR, a.element_type().name().to_string()));
                attrs.push((SIZE_ATTR, a.len().to_string()));
            }
            Payload::Object(o) => {
                attrs.push((CLASS_ATTR, o.name().to_string()));
                attrs.push((VERSION_ATTR, o.version().to_string()));
            }
            _ => {}
        }
        self.start(name, &attrs)?;
        self.write_content(v)?;
        self.end()
    }

    fn write_content(&mut self, v: &Variant) -> Result<(), XmlError> {
        match v.payload() {
            Payload::List(l) => {
                for item in l.iter() {
                    self.write_element(ITEM, item, None)?;
                }
            }
            Payload::Tuple(t) => {
                for item in t.iter() {
                    self.write_element(ITEM, item, None)?;
                }
            }
            Payload::Array(a) => {
                for item in a.iter() {
                    self.write_element(ITEM, item, None)?;
                }
            }
            Payload::Dictionary(d) => {
                for (key, item) in d.iter() {
                    self.write_element(key, item, None)?;
                }
            }
            Payload::Bag(b) => {
                for (key, item) in b.iter() {
                    if self.mode.preserve && self.write_preserved(key, item)? {
                        continue;
                    }
                    self.write_element(key, item, None)?;
                }
            }
            Payload::TimeSeries(ts) => {
                for (time, item) in ts.iter() {
                    self.write_element(ITEM, item, Some(temporal::format_date_time(time)))?;
                }
            }
            Payload::DataTable(dt) => {
                for column in dt.columns() {
                    self.start(
                        "Column",
                        &[
                            (NAME_ATTR, column.name().to_string()),
                            (TYPE_ATTR, column.column_type().name().to_string()),
                        ],
                    )?;
                    self.end()?;
                }
                for row in dt.rows() {
                    self.start("Row", &[])?;
                    for cell in row.iter() {
                        self.text_element("Value", &scalar_text(cell)?)?;
                    }
                    self.end()?;
                }
            }
            Payload::Object(o) => self.write_element("Params", &o.deflate(), None)?,
            Payload::Exception(e) => {
                self.text_element("type", e.type_name())?;
                self.text_element("message", e.message())?;
                self.text_element("source", e.source())?;
                self.text_element("stack", e.stack())?;
            }
            _ => {
                let text = scalar_text(v)?;
                self.text(&text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_xml;
    use pretty_assertions::assert_eq;
    use protean_var::{Buffer, v_any, v_bag, v_dict, v_int32, v_list, v_none, v_str};

    fn bare() -> XmlMode {
        XmlMode {
            no_header: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_scalars_and_collections() {
        assert_eq!(
            to_xml(&v_int32(5), &bare()).unwrap(),
            r#"<Variant variant="Int32">5</Variant>"#
        );
        assert_eq!(
            to_xml(&v_list(&[v_str("a"), v_none()]), &bare()).unwrap(),
            r#"<Variant variant="List"><Variant variant="String">a</Variant><Variant variant="None" /></Variant>"#
        );
        assert_eq!(
            to_xml(&v_dict([("k", v_int32(1))]), &bare()).unwrap(),
            r#"<Variant variant="Dictionary"><k variant="Int32">1</k></Variant>"#
        );
    }

    #[test]
    fn test_buffer_is_base64() {
        let xml = to_xml(&Variant::from(Buffer::from_slice(b"hi!")), &bare()).unwrap();
        assert_eq!(xml, r#"<Variant variant="Buffer">aGkh</Variant>"#);
    }

    #[test]
    fn test_root_name_and_header() {
        let mode = XmlMode {
            root_name: "Doc".to_string(),
            ..Default::default()
        };
        let xml = to_xml(&v_str("x"), &mode).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.ends_with(r#"<Doc variant="String">x</Doc>"#));
    }

    #[test]
    fn test_preserve_writes_comments_and_instructions() {
        let v = v_bag([
            (COMMENT_KEY, v_any("note")),
            (
                INSTRUCTION_KEY,
                v_bag([(TARGET_KEY, v_any("style")), (DATA_KEY, v_any("a.css"))]),
            ),
        ]);
        let preserve = XmlMode {
            preserve: true,
            ..bare()
        };
        assert_eq!(
            to_xml(&v, &preserve).unwrap(),
            r#"<Variant variant="Bag"><!--note--><?style a.css?></Variant>"#
        );
        let plain = to_xml(&v, &bare()).unwrap();
        assert!(plain.contains(r#"<__comment__ variant="Any">note</__comment__>"#));
    }

    #[test]
    fn test_keys_must_be_element_names() {
        let v = v_dict([("has space", v_int32(1))]);
        assert!(matches!(to_xml(&v, &bare()), Err(XmlError::InvalidName(_))));
        assert!(check_name("_ok-1.2").is_ok());
        assert!(check_name("9lives").is_err());
        assert!(check_name("").is_err());
    }
}
