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

/// A multimap: string keys may repeat, and entries keep insertion order.
#[derive(Clone, Default)]
pub struct Bag(imbl::Vector<(Str, Variant)>);

impl Bag {
    pub fn new() -> Self {
        Bag(imbl::Vector::new())
    }

    pub fn build<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Variant)>,
    {
        Bag(pairs
            .into_iter()
            .map(|(k, v)| (Str::mk_str(k), v))
            .collect())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Variant)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every value stored under `key`, in insertion order.
    pub fn values_for<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a Variant> + use<'a, 'k> {
        self.0
            .iter()
            .filter(move |(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn missing(key: &str) -> Error {
        RangeError.with_msg(|| format!("Key '{key}' not found in Bag"))
    }
}

impl Mapping for Bag {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at_key(&self, key: &str) -> Result<&Variant, Error> {
        self.0
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
            .ok_or_else(|| Self::missing(key))
    }

    fn at_key_mut(&mut self, key: &str) -> Result<&mut Variant, Error> {
        self.0
            .iter_mut()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
            .ok_or_else(|| Self::missing(key))
    }

    fn has_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k.as_str() == key)
    }

    fn insert(&mut self, key: &str, value: Variant) -> Result<(), Error> {
        self.0.push_back((Str::mk_str(key), value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        let before = self.0.len();
        self.0.retain(|(k, _)| k.as_str() != key);
        if self.0.len() == before {
            return Err(Self::missing(key));
        }
        Ok(())
    }

    fn range(&self, key: &str) -> Variant {
        let found: imbl::Vector<_> = self
            .0
            .iter()
            .filter(|(k, _)| k.as_str() == key)
            .cloned()
            .collect();
        Variant::from(Bag(found))
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

impl Debug for Bag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl PartialEq for Bag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Bag {}

impl PartialOrd for Bag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0.len() != other.0.len() {
            return self.0.len().cmp(&other.0.len());
        }
        self.0.iter().cmp(other.0.iter())
    }
}

impl Hash for Bag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for (k, v) in self.0.iter() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<'a> FromIterator<(&'a str, Variant)> for Bag {
    fn from_iter<T: IntoIterator<Item = (&'a str, Variant)>>(iter: T) -> Self {
        Bag::build(iter)
    }
}
