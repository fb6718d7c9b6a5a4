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
    Cursor, CursorMut, ElementMut, Error, Item, ItemMut, Sequence, Variant,
    error::ErrorCode::RangeError,
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    ops::Index,
};

/// An ordered, growable sequence of variants.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct List(imbl::Vector<Variant>);

impl List {
    pub fn new() -> Self {
        List(imbl::Vector::new())
    }

    pub fn mk_list(values: &[Variant]) -> List {
        List(imbl::Vector::from(values.to_vec()))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Variant> + '_ {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Insert `value` before `index`; an index past the end appends.
    pub fn insert_at(&mut self, index: usize, value: Variant) {
        let index = index.min(self.0.len());
        self.0.insert(index, value);
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Variant, Error> {
        if index >= self.0.len() {
            return Err(RangeError.with_msg(|| {
                format!(
                    "Attempt to remove index {index} in List of size {}",
                    self.0.len()
                )
            }));
        }
        Ok(self.0.remove(index))
    }

    fn out_of_range(&self, op: &str, index: usize) -> Error {
        RangeError.with_msg(|| {
            format!(
                "Attempt to {op} index {index} in List of size {}",
                self.0.len()
            )
        })
    }
}

impl Sequence for List {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at(&self, index: usize) -> Result<&Variant, Error> {
        self.0.get(index).ok_or_else(|| self.out_of_range("access", index))
    }

    fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>, Error> {
        if index >= self.0.len() {
            return Err(self.out_of_range("access", index));
        }
        self.0
            .get_mut(index)
            .map(ElementMut::free)
            .ok_or_else(|| RangeError.msg("List element vanished"))
    }

    fn set(&mut self, index: usize, value: Variant) -> Result<(), Error> {
        if index >= self.0.len() {
            return Err(self.out_of_range("set", index));
        }
        self.0.set(index, value);
        Ok(())
    }

    fn push_back(&mut self, value: Variant) -> Result<(), Error> {
        self.0.push_back(value);
        Ok(())
    }

    fn pop_back(&mut self) -> Result<Variant, Error> {
        self.0
            .pop_back()
            .ok_or_else(|| RangeError.msg("Attempt to pop from empty List"))
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.0.iter().map(Item::value_only))
    }

    fn cursor_mut(&mut self) -> Result<CursorMut<'_>, Error> {
        Ok(CursorMut::new(
            self.0.iter_mut().map(|v| ItemMut::new(None, None, v)),
        ))
    }
}

impl Debug for List {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Index<usize> for List {
    type Output = Variant;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for List {}

impl PartialOrd for List {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for List {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.len() != other.len() {
            return self.len().cmp(&other.len());
        }
        self.0.iter().cmp(other.0.iter())
    }
}

impl Hash for List {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.0.iter() {
            item.hash(state);
        }
    }
}

impl FromIterator<Variant> for List {
    fn from_iter<T: IntoIterator<Item = Variant>>(iter: T) -> Self {
        List(imbl::Vector::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{v_int32, v_str};

    #[test]
    fn test_list_push_pop_at() {
        let mut l = List::new();
        l.push_back(v_int32(1)).unwrap();
        l.push_back(v_str("two")).unwrap();
        assert_eq!(l.len(), 2);
        assert_eq!(l.at(1).unwrap(), &v_str("two"));
        assert_eq!(l.at(2).unwrap_err().code, RangeError);
        assert_eq!(l.pop_back().unwrap(), v_str("two"));
        assert_eq!(l.pop_back().unwrap(), v_int32(1));
        assert_eq!(l.pop_back().unwrap_err().code, RangeError);
    }

    #[test]
    fn test_list_orders_by_size_first() {
        let short = List::mk_list(&[v_int32(9)]);
        let long = List::mk_list(&[v_int32(1), v_int32(1)]);
        assert!(short < long);
        let a = List::mk_list(&[v_int32(1), v_int32(2)]);
        let b = List::mk_list(&[v_int32(1), v_int32(3)]);
        assert!(a < b);
        assert_eq!(a, List::mk_list(&[v_int32(1), v_int32(2)]));
    }

    #[test]
    fn test_list_insert_and_remove_at() {
        let mut l = List::mk_list(&[v_int32(1), v_int32(3)]);
        l.insert_at(1, v_int32(2));
        l.insert_at(99, v_int32(4));
        let values: Vec<_> = l.iter().cloned().collect();
        assert_eq!(values, vec![v_int32(1), v_int32(2), v_int32(3), v_int32(4)]);
        assert_eq!(l.remove_at(0).unwrap(), v_int32(1));
        assert_eq!(l.remove_at(3).unwrap_err().code, RangeError);
    }

    #[test]
    fn test_list_cursor_mut_edits_in_place() {
        let mut l = List::mk_list(&[v_int32(1), v_int32(2)]);
        for mut item in l.cursor_mut().unwrap() {
            *item.value_mut().unwrap() = v_str("x");
            assert!(item.key().is_err());
        }
        assert_eq!(l, List::mk_list(&[v_str("x"), v_str("x")]));
    }
}
