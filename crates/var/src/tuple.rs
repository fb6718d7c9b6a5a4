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
    error::ErrorCode::{RangeError, TypeError},
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

/// A fixed-arity sequence. Slots can be replaced but never added or removed.
#[derive(Clone, Default)]
pub struct Tuple(Box<[Variant]>);

impl Tuple {
    /// `size` slots, all None.
    pub fn with_size(size: usize) -> Self {
        Tuple(vec![Variant::default(); size].into_boxed_slice())
    }

    pub fn from_values(values: Vec<Variant>) -> Self {
        Tuple(values.into_boxed_slice())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Variant> + '_ {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.0
    }

    fn out_of_range(&self, index: usize) -> Error {
        RangeError.with_msg(|| {
            format!("Index {index} is out of range for Tuple of size {}", self.0.len())
        })
    }
}

impl Sequence for Tuple {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at(&self, index: usize) -> Result<&Variant, Error> {
        self.0.get(index).ok_or_else(|| self.out_of_range(index))
    }

    fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>, Error> {
        let len = self.0.len();
        self.0.get_mut(index).map(ElementMut::free).ok_or_else(|| {
            RangeError.with_msg(|| format!("Index {index} is out of range for Tuple of size {len}"))
        })
    }

    fn set(&mut self, index: usize, value: Variant) -> Result<(), Error> {
        self.at_mut(index)?.set(value)
    }

    fn push_back(&mut self, _value: Variant) -> Result<(), Error> {
        Err(TypeError.with_msg(|| format!("Tuple of size {} cannot grow", self.0.len())))
    }

    fn pop_back(&mut self) -> Result<Variant, Error> {
        Err(TypeError.with_msg(|| format!("Tuple of size {} cannot shrink", self.0.len())))
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

impl Debug for Tuple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut t = f.debug_tuple("");
        for v in self.0.iter() {
            t.field(v);
        }
        t.finish()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Tuple {}

impl PartialOrd for Tuple {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tuple {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0.len() != other.0.len() {
            return self.0.len().cmp(&other.0.len());
        }
        self.0.iter().cmp(other.0.iter())
    }
}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for v in self.0.iter() {
            v.hash(state);
        }
    }
}

impl FromIterator<Variant> for Tuple {
    fn from_iter<T: IntoIterator<Item = Variant>>(iter: T) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VariantType, v_int32};

    #[test]
    fn test_tuple_is_fixed_arity() {
        let mut t = Tuple::with_size(2);
        assert!(t.iter().all(|v| v.variant_type() == VariantType::None));
        t.set(1, v_int32(7)).unwrap();
        assert_eq!(t.at(1).unwrap(), &v_int32(7));
        assert_eq!(t.set(2, v_int32(7)).unwrap_err().code, RangeError);
        assert_eq!(t.push_back(v_int32(1)).unwrap_err().code, TypeError);
        assert_eq!(t.pop_back().unwrap_err().code, TypeError);
        assert_eq!(t.len(), 2);
    }
}
