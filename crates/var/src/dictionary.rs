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

use crate::{
    Cursor, CursorMut, Error, Item, ItemMut, Mapping, Str, Variant,
    error::ErrorCode::RangeError,
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

/// Unique string keys mapped to variants, kept sorted by key in a persistent vector.
#[derive(Clone, Default)]
pub struct Dictionary(imbl::Vector<(Str, Variant)>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(imbl::Vector::new())
    }

    /// Later pairs replace earlier ones with the same key.
    pub fn build<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Variant)>,
    {
        let mut d = Dictionary::new();
        for (k, v) in pairs {
            d.set(k, v);
        }
        d
    }

    /// Position of `key`, or where it would be inserted.
    fn position(&self, key: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|(k, _)| k.as_str().cmp(key))
    }

    /// Insert or replace.
    pub fn set(&mut self, key: &str, value: Variant) {
        match self.position(key) {
            Ok(pos) => {
                self.0.set(pos, (Str::mk_str(key), value));
            }
            Err(pos) => self.0.insert(pos, (Str::mk_str(key), value)),
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Variant)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn missing(key: &str) -> Error {
        RangeError.with_msg(|| format!("Key '{key}' not found in Dictionary"))
    }
}

impl Mapping for Dictionary {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at_key(&self, key: &str) -> Result<&Variant, Error> {
        match self.position(key) {
            Ok(pos) => Ok(&self.0[pos].1),
            Err(_) => Err(Self::missing(key)),
        }
    }

    fn at_key_mut(&mut self, key: &str) -> Result<&mut Variant, Error> {
        let pos = self.position(key).map_err(|_| Self::missing(key))?;
        Ok(&mut self.0[pos].1)
    }

    fn has_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    fn insert(&mut self, key: &str, value: Variant) -> Result<(), Error> {
        match self.position(key) {
            Ok(_) => Err(RangeError.with_msg(|| format!("Key '{key}' already present in Dictionary"))),
            Err(pos) => {
                self.0.insert(pos, (Str::mk_str(key), value));
                Ok(())
            }
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        let pos = self.position(key).map_err(|_| Self::missing(key))?;
        self.0.remove(pos);
        Ok(())
    }

    fn range(&self, key: &str) -> Variant {
        let found = match self.position(key) {
            Ok(pos) => self.0.clone().slice(pos..pos + 1),
            Err(_) => imbl::Vector::new(),
        };
        Variant::from(Dictionary(found))
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.0.iter().map(|(k, v)| Item::keyed(k.as_str(), v)))
    }

    fn cursor_mut(&mut self) -> CursorMut<'_> {
        CursorMut::new(
            self.0
                .iter_mut()
                .map(|(k, v)| ItemMut::new(Some(k.as_str()), None, v)),
        )
    }
}

impl Debug for Dictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.0.iter().map(|(k, v)| (k, v))).finish()
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Dictionary {}

impl PartialOrd for Dictionary {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dictionary {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0.len() != other.0.len() {
            return self.0.len().cmp(&other.0.len());
        }
        self.0.iter().cmp(other.0.iter())
    }
}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for (k, v) in self.0.iter() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<'a> FromIterator<(&'a str, Variant)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (&'a str, Variant)>>(iter: T) -> Self {
        Dictionary::build(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VariantType, v_int32, v_str};

    #[test]
    fn test_dictionary_insert_rejects_duplicates() {
        let mut d = Dictionary::new();
        d.insert("a", v_int32(1)).unwrap();
        let e = d.insert("a", v_int32(2)).unwrap_err();
        assert_eq!(e.code, RangeError);
        assert_eq!(d.at_key("a").unwrap(), &v_int32(1));
        d.set("a", v_int32(2));
        assert_eq!(d.at_key("a").unwrap(), &v_int32(2));
    }

    #[test]
    fn test_dictionary_iterates_in_key_order() {
        let d = Dictionary::build([("b", v_int32(2)), ("a", v_int32(1)), ("c", v_int32(3))]);
        let keys: Vec<_> = d.cursor().map(|i| i.key().unwrap()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        let keys: Vec<_> = d.cursor().rev().map(|i| i.key().unwrap()).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_dictionary_remove_and_range() {
        let mut d = Dictionary::build([("k", v_str("v")), ("j", v_str("w"))]);
        let r = d.range("k");
        assert_eq!(r.variant_type(), VariantType::Dictionary);
        assert_eq!(r.len(), 1);
        assert_eq!(d.range("zz").len(), 0);
        d.remove("k").unwrap();
        assert!(!d.has_key("k"));
        assert_eq!(d.remove("k").unwrap_err().code, RangeError);
        assert_eq!(d.at_key("k").unwrap_err().code, RangeError);
    }

    #[test]
    fn test_dictionary_build_keeps_last_duplicate() {
        let mut d = Dictionary::build([("b", v_int32(1)), ("a", v_int32(2)), ("b", v_int32(3))]);
        assert_eq!(d.len(), 2);
        assert_eq!(d.at_key("b").unwrap(), &v_int32(3));
        *d.at_key_mut("a").unwrap() = v_str("edited");
        let pairs: Vec<_> = d.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![("a".to_string(), v_str("edited")), ("b".to_string(), v_int32(3))]
        );
    }
}
