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

use arcstr::ArcStr;
use std::{
    borrow::Borrow,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::Deref,
};

/// Immutable shared text, used for String and Any payloads and for mapping keys.
/// Equality and ordering are byte-wise and case-sensitive.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct Str(ArcStr);

impl Str {
    pub fn mk_str(s: &str) -> Self {
        Str(ArcStr::from(s))
    }

    pub fn mk_string(s: String) -> Self {
        Str(ArcStr::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_arc_str(&self) -> ArcStr {
        self.0.clone()
    }
}

impl Deref for Str {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Borrow<str> for Str {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str::mk_str(s)
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str::mk_string(s)
    }
}

impl Debug for Str {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl Display for Str {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Str {}

impl PartialOrd for Str {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Must agree with `str`'s Hash for the `Borrow<str>` lookups in the mapping collections.
impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_str_is_case_sensitive() {
        assert_ne!(Str::mk_str("Key"), Str::mk_str("key"));
        assert!(Str::mk_str("B") < Str::mk_str("a"));
    }

    #[test]
    fn test_str_borrow_lookup() {
        let mut m = BTreeMap::new();
        m.insert(Str::mk_str("alpha"), 1);
        assert_eq!(m.get("alpha"), Some(&1));
        assert_eq!(m.get("Alpha"), None);
    }
}
