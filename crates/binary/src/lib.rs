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

//! Binary wire format for variants.
//!
//! A stream is a four byte header (`u16` major, `u16` minor, little-endian) followed by one or
//! more records. A record is the tag's wire byte followed by its payload; collections nest
//! records, and data table cells are written payload-only since the schema already names their
//! tags.

mod read;
mod write;

pub use read::{BinaryReader, MAX_NESTING_DEPTH, ReaderOptions};
pub use write::BinaryWriter;

use protean_var::{DecodingError, EncodingError, FORMAT_MAJOR_VERSION, FORMAT_MINOR_VERSION, Variant};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout,
    byteorder::{LittleEndian, U16},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub(crate) struct Header {
    pub major: U16<LittleEndian>,
    pub minor: U16<LittleEndian>,
}

impl Header {
    pub(crate) fn current() -> Self {
        Self {
            major: U16::new(FORMAT_MAJOR_VERSION),
            minor: U16::new(FORMAT_MINOR_VERSION),
        }
    }
}

/// Encode a single variant, header included.
pub fn to_bytes(v: &Variant) -> Result<Vec<u8>, EncodingError> {
    let mut writer = BinaryWriter::new(Vec::new())?;
    writer.write(v)?;
    Ok(writer.into_inner())
}

/// Decode a single variant written by `to_bytes`. Unknown object classes come back as proxies.
pub fn from_bytes(bytes: &[u8]) -> Result<Variant, DecodingError> {
    let mut reader = BinaryReader::new(bytes, ReaderOptions::default())?;
    reader.read()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protean_var::{v_int32, v_str};

    #[test]
    fn test_header_layout() {
        let h = Header::current();
        assert_eq!(h.as_bytes(), &[1, 0, 0, 0]);
        let back = Header::read_from_bytes(&[2, 0, 7, 0]).unwrap();
        assert_eq!(back.major.get(), 2);
        assert_eq!(back.minor.get(), 7);
    }

    #[test]
    fn test_bytes_of_small_values() {
        let int_code = v_int32(0).variant_type().wire_code();
        assert_eq!(
            to_bytes(&v_int32(258)).unwrap(),
            vec![1, 0, 0, 0, int_code, 2, 1, 0, 0]
        );
        let str_code = v_str("").variant_type().wire_code();
        assert_eq!(
            to_bytes(&v_str("hi")).unwrap(),
            vec![1, 0, 0, 0, str_code, 2, 0, 0, 0, b'h', b'i']
        );
    }
}
