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

use ErrorCode::*;
use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// A failure raised by a variant operation. Always carries the category (`code`) and, on every
/// path inside this crate, a message naming the tags, keys, indices or arities involved.
#[derive(Clone, Eq, PartialEq)]
pub struct Error {
    pub code: ErrorCode,
    pub msg: Option<Box<String>>,
}

impl Hash for Error {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl Error {
    pub fn new(code: ErrorCode, msg: Option<String>) -> Self {
        Self {
            code,
            msg: msg.map(Box::new),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.msg.is_some() {
            write!(f, "{} ({})", self.code, self.message())
        } else {
            write!(f, "{}", self.code)
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorCode {
    /// Wrong-shape access, bad coercion, bad column type.
    TypeError,
    /// Index or key not found, pop from empty.
    RangeError,
    /// Data table column added after rows exist, row arity/type mismatch.
    SchemaError,
    /// Corrupt or version-incompatible stream, case exhaustion on an unrecognised tag.
    FormatError,
    /// Object deflate/inflate class-name mismatch.
    CoercionError,
}

impl From<ErrorCode> for String {
    fn from(val: ErrorCode) -> Self {
        match val {
            TypeError => "TypeError".into(),
            RangeError => "RangeError".into(),
            SchemaError => "SchemaError".into(),
            FormatError => "FormatError".into(),
            CoercionError => "CoercionError".into(),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s: String = (*self).into();
        write!(f, "{s}")
    }
}

impl ErrorCode {
    pub fn msg<S: ToString>(self, s: S) -> Error {
        Error::new(self, Some(s.to_string()))
    }

    pub fn with_msg<F>(self, f: F) -> Error
    where
        F: FnOnce() -> String,
    {
        Error::new(self, Some(f()))
    }
}

impl PartialEq<ErrorCode> for Error {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == *other
    }
}

impl From<ErrorCode> for Error {
    fn from(val: ErrorCode) -> Self {
        Error::new(val, None)
    }
}

impl std::error::Error for Error {}

impl Error {
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(msg) = &self.msg {
            return msg.as_ref().clone();
        }
        // Default message if one not provided.
        match self.code {
            TypeError => "Type mismatch".into(),
            RangeError => "Range error".into(),
            SchemaError => "Schema violation".into(),
            FormatError => "Malformed or incompatible stream".into(),
            CoercionError => "Object coercion failed".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_message() {
        let e = RangeError.msg("Index 7 is out of range for List of size 3");
        assert_eq!(
            e.to_string(),
            "RangeError (Index 7 is out of range for List of size 3)"
        );
        assert_eq!(e, RangeError);
    }

    #[test]
    fn test_error_default_message() {
        let e: Error = SchemaError.into();
        assert_eq!(e.to_string(), "SchemaError");
        assert_eq!(e.message(), "Schema violation");
    }

    #[test]
    fn test_error_equality_includes_message() {
        let a = TypeError.msg("expected String, got List");
        let b = TypeError.msg("expected Int32, got List");
        assert_ne!(a, b);
        assert_eq!(a, TypeError);
        assert_eq!(b, TypeError);
    }
}
