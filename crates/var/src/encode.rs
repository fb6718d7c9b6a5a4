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

//! Failure types shared by the codecs.

use crate::{Error, ErrorCode::FormatError};

/// The current stream format. Readers accept any minor version of the same major version.
pub const FORMAT_MAJOR_VERSION: u16 = 1;
pub const FORMAT_MINOR_VERSION: u16 = 0;

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Could not write: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not encode {tag}: {reason}")]
    CouldNotEncode { tag: String, reason: String },
    #[error(transparent)]
    Variant(#[from] Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Could not read: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),
    #[error("Unknown type tag: {0}")]
    UnknownTag(u8),
    #[error(
        "Unsupported format version {major}.{minor} (this build reads {}.x)",
        FORMAT_MAJOR_VERSION
    )]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error(transparent)]
    Variant(#[from] Error),
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        match e {
            EncodingError::Variant(e) => e,
            other => FormatError.msg(other),
        }
    }
}

impl From<DecodingError> for Error {
    fn from(e: DecodingError) -> Self {
        match e {
            DecodingError::Variant(e) => e,
            other => FormatError.msg(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode::SchemaError;

    #[test]
    fn test_decoding_errors_become_format_errors() {
        let e: Error = DecodingError::UnsupportedVersion { major: 9, minor: 1 }.into();
        assert_eq!(e.code, FormatError);
        assert!(e.message().contains("9.1"));

        let e: Error = DecodingError::UnknownTag(77).into();
        assert_eq!(e.code, FormatError);
    }

    #[test]
    fn test_variant_errors_pass_through() {
        let e: Error = DecodingError::Variant(SchemaError.msg("row")).into();
        assert_eq!(e.code, SchemaError);
    }
}
