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
    Cursor, CursorMut, ElementMut, Error, Item, ItemMut, Sequence, TypeMask, Variant, VariantType,
    error::ErrorCode::{RangeError, TypeError},
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

/// A homogeneous sequence: every element carries the array's primitive element type.
#[derive(Clone)]
pub struct TypedArray {
    element_type: VariantType,
    values: Vec<Variant>,
}

impl TypedArray {
    /// `size` default-valued elements of `element_type`.
    pub fn new(size: usize, element_type: VariantType) -> Result<Self, Error> {
        Self::check_element_type(element_type)?;
        let fill = Variant::new(element_type)?;
        Ok(Self {
            element_type,
            values: vec![fill; size],
        })
    }

    /// `size` copies of `fill`; the element type is taken from it.
    pub fn filled(size: usize, fill: &Variant) -> Result<Self, Error> {
        let element_type = fill.variant_type();
        Self::check_element_type(element_type)?;
        Ok(Self {
            element_type,
            values: vec![fill.clone(); size],
        })
    }

    pub fn from_values(element_type: VariantType, values: Vec<Variant>) -> Result<Self, Error> {
        Self::check_element_type(element_type)?;
        let mut array = Self {
            element_type,
            values: Vec::with_capacity(values.len()),
        };
        for v in values {
            array.check_value(&v)?;
            array.values.push(v);
        }
        Ok(array)
    }

    pub fn element_type(&self) -> VariantType {
        self.element_type
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Variant> + '_ {
        self.values.iter()
    }

    fn check_element_type(element_type: VariantType) -> Result<(), Error> {
        if !element_type.is(TypeMask::PRIMITIVE) {
            return Err(TypeError.with_msg(|| {
                format!("Array element type must be primitive, got {element_type}")
            }));
        }
        Ok(())
    }

    fn check_value(&self, value: &Variant) -> Result<(), Error> {
        if value.variant_type() != self.element_type {
            return Err(TypeError.with_msg(|| {
                format!(
                    "Array of {} cannot hold {}",
                    self.element_type,
                    value.variant_type()
                )
            }));
        }
        Ok(())
    }
}

impl Sequence for TypedArray {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn at(&self, index: usize) -> Result<&Variant, Error> {
        self.values.get(index).ok_or_else(|| {
            RangeError.with_msg(|| {
                format!("Index {index} is out of range for Array of size {}", self.values.len())
            })
        })
    }

    fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>, Error> {
        let (len, tag) = (self.values.len(), self.element_type);
        self.values
            .get_mut(index)
            .map(|v| ElementMut::typed(v, tag, TypeError))
            .ok_or_else(|| {
                RangeError
                    .with_msg(|| format!("Index {index} is out of range for Array of size {len}"))
            })
    }

    fn set(&mut self, index: usize, value: Variant) -> Result<(), Error> {
        self.check_value(&value)?;
        self.at_mut(index)?.set(value)
    }

    fn push_back(&mut self, _value: Variant) -> Result<(), Error> {
        Err(TypeError.msg("Array is fixed size"))
    }

    fn pop_back(&mut self) -> Result<Variant, Error> {
        Err(TypeError.msg("Array is fixed size"))
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.values.iter().map(Item::value_only))
    }

    fn cursor_mut(&mut self) -> Result<CursorMut<'_>, Error> {
        let tag = self.element_type;
        Ok(CursorMut::new(
            self.values
                .iter_mut()
                .map(move |v| ItemMut::element(ElementMut::typed(v, tag, TypeError))),
        ))
    }
}

impl Debug for TypedArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Array<{}>", self.element_type)?;
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl PartialEq for TypedArray {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for TypedArray {}

impl PartialOrd for TypedArray {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypedArray {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.values
            .len()
            .cmp(&other.values.len())
            .then_with(|| self.element_type.cmp(&other.element_type))
            .then_with(|| self.values.iter().cmp(other.values.iter()))
    }
}

impl Hash for TypedArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.len().hash(state);
        self.element_type.hash(state);
        for v in &self.values {
            v.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{v_int32, v_str};

    #[test]
    fn test_typed_array_defaults() {
        let a = TypedArray::new(5, VariantType::String).unwrap();
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|v| *v == v_str("")));

        let b = TypedArray::filled(5, &v_str("s6")).unwrap();
        assert_eq!(b.element_type(), VariantType::String);
        assert!(b.iter().all(|v| *v == v_str("s6")));
    }

    #[test]
    fn test_filled_elements_are_independent() {
        let mut a = TypedArray::filled(5, &v_str("s6")).unwrap();
        a.at_mut(0).unwrap().set(v_str("first")).unwrap();
        assert_eq!(a.at(0).unwrap(), &v_str("first"));
        assert_eq!(a.at(1).unwrap(), &v_str("s6"));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_cursor_mut_checks_element_type() {
        let mut a = TypedArray::new(3, VariantType::Int32).unwrap();
        for (i, mut item) in a.cursor_mut().unwrap().enumerate() {
            item.set(v_int32(i as i32 * 10)).unwrap();
            assert_eq!(item.set(v_str("no")).unwrap_err().code, TypeError);
        }
        let values: Vec<_> = a.iter().cloned().collect();
        assert_eq!(values, vec![v_int32(0), v_int32(10), v_int32(20)]);
    }

    #[test]
    fn test_typed_array_compare() {
        let a1 = TypedArray::from_values(
            VariantType::String,
            (1..=5).map(|i| v_str(&format!("s{i}"))).collect(),
        )
        .unwrap();
        let a2 = TypedArray::filled(5, &v_str("s6")).unwrap();
        assert_eq!(a1.cmp(&a2), std::cmp::Ordering::Less);
        assert_eq!(a2.cmp(&a1), std::cmp::Ordering::Greater);
    }

    #[test]
    fn test_typed_array_rejects_wrong_types() {
        assert_eq!(
            TypedArray::new(1, VariantType::List).unwrap_err().code,
            TypeError
        );
        let mut a = TypedArray::new(2, VariantType::Int32).unwrap();
        assert_eq!(a.set(0, v_str("x")).unwrap_err().code, TypeError);
        a.set(0, v_int32(4)).unwrap();
        assert_eq!(a.at(0).unwrap(), &v_int32(4));
        assert_eq!(a.set(2, v_int32(4)).unwrap_err().code, RangeError);
        assert_eq!(a.at_mut(0).unwrap().set(v_str("x")).unwrap_err().code, TypeError);
        assert_eq!(a.at(0).unwrap(), &v_int32(4));
        assert_eq!(
            TypedArray::from_values(VariantType::Int32, vec![v_int32(1), v_str("no")])
                .unwrap_err()
                .code,
            TypeError
        );
    }
}
