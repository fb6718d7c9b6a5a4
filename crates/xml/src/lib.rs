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

//! XML documents to and from variants.
//!
//! Documents are first parsed into a plain element tree (`XmlNode`), which `XmlReader` turns
//! into a variant. Elements written by `XmlWriter` carry a `variant` attribute naming their tag;
//! elements without one are inferred from their shape. In preserve mode, comments and processing
//! instructions survive the trip as reserved Bag entries.

mod node;
mod read;
mod write;

pub use node::{NodeKind, XmlNode, parse_document, parse_document_with};
pub use read::XmlReader;
pub use write::XmlWriter;

use protean_var::{Error, ErrorCode::FormatError, Variant};
use serde::{Deserialize, Serialize};

/// Root element name used when none is configured.
pub const DEFAULT_ROOT: &str = "Variant";
/// Bag key holding an untyped element's character data.
pub const TEXT_KEY: &str = "__text__";
/// Bag key holding an untyped element's attributes.
pub const ATTRIBUTES_KEY: &str = "__attributes__";
/// Bag key of a preserved comment.
pub const COMMENT_KEY: &str = "__comment__";
/// Bag key of a preserved processing instruction, itself a Bag of target and data.
pub const INSTRUCTION_KEY: &str = "__instruction__";
pub const TARGET_KEY: &str = "__target__";
pub const DATA_KEY: &str = "__data__";

pub(crate) const VARIANT_ATTR: &str = "variant";
pub(crate) const SIZE_ATTR: &str = "size";
pub(crate) const TYPE_ATTR: &str = "type";
pub(crate) const TIME_ATTR: &str = "time";
pub(crate) const CLASS_ATTR: &str = "class";
pub(crate) const VERSION_ATTR: &str = "version";
pub(crate) const NAME_ATTR: &str = "name";

/// Formatting and parsing switches shared by the reader and the writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlMode {
    /// Keep comments and processing instructions.
    pub preserve: bool,
    /// Indent nested elements.
    pub indent: bool,
    /// Omit the `<?xml ...?>` declaration.
    pub no_header: bool,
    /// Trim leading and trailing whitespace from scalar text when reading.
    pub strip_space: bool,
    pub root_name: String,
}

impl Default for XmlMode {
    fn default() -> Self {
        Self {
            preserve: false,
            indent: false,
            no_header: false,
            strip_space: false,
            root_name: DEFAULT_ROOT.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("Could not parse XML: {0}")]
    Parse(#[from] xml::reader::Error),
    #[error("Could not write XML: {0}")]
    Emit(#[from] xml::writer::Error),
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("'{0}' cannot be used as an element name")]
    InvalidName(String),
    #[error(transparent)]
    Variant(#[from] Error),
}

impl From<XmlError> for Error {
    fn from(e: XmlError) -> Self {
        match e {
            XmlError::Variant(e) => e,
            other => FormatError.msg(other),
        }
    }
}

/// Render `v` as a complete document.
pub fn to_xml(v: &Variant, mode: &XmlMode) -> Result<String, XmlError> {
    let mut out = Vec::new();
    XmlWriter::new(&mut out, mode.clone()).write(v)?;
    String::from_utf8(out).map_err(|e| XmlError::Malformed(format!("output is not UTF-8: {e}")))
}

/// Parse a document produced by `to_xml`, or any other document via shape inference.
pub fn from_xml(xml: &str, mode: &XmlMode) -> Result<Variant, XmlError> {
    let root = parse_document_with(xml.as_bytes(), mode)?;
    XmlReader::new(mode.clone()).read(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protean_var::ErrorCode;

    #[test]
    fn test_mode_defaults_from_json() {
        let mode: XmlMode = serde_json::from_str(r#"{"indent": true}"#).unwrap();
        assert!(mode.indent);
        assert_eq!(mode.root_name, DEFAULT_ROOT);
        assert!(!mode.no_header);
        assert!(!mode.preserve);
    }

    #[test]
    fn test_errors_become_format_errors() {
        let e: Error = XmlError::InvalidName("1abc".into()).into();
        assert_eq!(e.code, ErrorCode::FormatError);
        let e: Error = XmlError::Variant(ErrorCode::RangeError.msg("k")).into();
        assert_eq!(e.code, ErrorCode::RangeError);
    }
}
