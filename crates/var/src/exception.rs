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

use crate::Error;
use std::fmt::{Display, Formatter};

/// A captured failure carried as data. Read-only once built.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ExceptionInfo {
    type_name: String,
    message: String,
    source: String,
    stack: String,
}

impl ExceptionInfo {
    pub fn new(type_name: &str, message: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    pub fn from_parts(type_name: String, message: String, source: String, stack: String) -> Self {
        Self {
            type_name,
            message,
            source,
            stack,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_stack(mut self, stack: &str) -> Self {
        self.stack = stack.to_string();
        self
    }
}

impl Display for ExceptionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}('{}')", self.type_name, self.message)?;
        if !self.source.is_empty() {
            write!(f, " in: {}", self.source)?;
        }
        Ok(())
    }
}

impl From<&Error> for ExceptionInfo {
    fn from(e: &Error) -> Self {
        ExceptionInfo::new(&e.code.to_string(), &e.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode::RangeError;

    #[test]
    fn test_exception_display() {
        let e = ExceptionInfo::new("IOError", "disk full").with_source("writer.rs");
        assert_eq!(e.to_string(), "IOError('disk full') in: writer.rs");
        assert_eq!(ExceptionInfo::new("E", "m").to_string(), "E('m')");
    }

    #[test]
    fn test_exception_from_error() {
        let e = ExceptionInfo::from(&RangeError.msg("no such key 'x'"));
        assert_eq!(e.type_name(), "RangeError");
        assert_eq!(e.message(), "no such key 'x'");
        assert_eq!(e.source(), "");

        let e = ExceptionInfo::from_parts("E".into(), "m".into(), "s".into(), "trace".into());
        assert_eq!(e.stack(), "trace");
        assert_eq!(e, ExceptionInfo::new("E", "m").with_source("s").with_stack("trace"));
    }
}
