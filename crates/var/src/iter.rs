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

//! Uniform iteration over every collection shape.
//!
//! Each collection hands out a `Cursor` whose items always carry a value, plus a key for
//! mapping shapes and a timestamp for time series. Asking an item for a facet its collection
//! does not have is a `TypeError`. Data table rows are materialised as owned `Tuple` variants,
//! so table cursors yield owned values where the other shapes yield borrows. Mutable cursors
//! write typed slots (array elements, table cells) through checked setters.

use crate::{Error, ErrorCode, ErrorCode::TypeError, RowMut, Variant, VariantType};
use chrono::NaiveDateTime;
use std::{
    borrow::Cow,
    fmt::{Debug, Formatter},
    ops::Deref,
};

pub struct Item<'a> {
    key: Option<&'a str>,
    time: Option<NaiveDateTime>,
    value: Cow<'a, Variant>,
}

impl<'a> Item<'a> {
    pub(crate) fn value_only(value: &'a Variant) -> Self {
        Self {
            key: None,
            time: None,
            value: Cow::Borrowed(value),
        }
    }

    pub(crate) fn owned(value: Variant) -> Self {
        Self {
            key: None,
            time: None,
            value: Cow::Owned(value),
        }
    }

    pub(crate) fn keyed(key: &'a str, value: &'a Variant) -> Self {
        Self {
            key: Some(key),
            time: None,
            value: Cow::Borrowed(value),
        }
    }

    pub(crate) fn timed(time: NaiveDateTime, value: &'a Variant) -> Self {
        Self {
            key: None,
            time: Some(time),
            value: Cow::Borrowed(value),
        }
    }

    pub fn key(&self) -> Result<&'a str, Error> {
        self.key
            .ok_or_else(|| TypeError.msg("Iterator item has no key: collection is not a mapping"))
    }

    pub fn time(&self) -> Result<NaiveDateTime, Error> {
        self.time.ok_or_else(|| {
            TypeError.msg("Iterator item has no time: collection is not a time series")
        })
    }

    pub fn value(&self) -> &Variant {
        &self.value
    }

    pub fn into_value(self) -> Variant {
        self.value.into_owned()
    }
}

/// A writable slot inside a collection.
///
/// Slots of typed collections (Array elements, DataTable cells) only accept values carrying the
/// slot's tag, so they are written through `set`. Untyped slots also hand out a bare
/// `&mut Variant` for in-place edits of nested values.
pub struct ElementMut<'a> {
    value: &'a mut Variant,
    fixed: Option<(VariantType, ErrorCode)>,
}

impl<'a> ElementMut<'a> {
    pub(crate) fn free(value: &'a mut Variant) -> Self {
        Self { value, fixed: None }
    }

    /// A slot that only holds `tag`; writing anything else fails with `mismatch`.
    pub(crate) fn typed(value: &'a mut Variant, tag: VariantType, mismatch: ErrorCode) -> Self {
        Self {
            value,
            fixed: Some((tag, mismatch)),
        }
    }

    pub fn get(&self) -> &Variant {
        self.value
    }

    /// The tag this slot is restricted to, if any.
    pub fn slot_type(&self) -> Option<VariantType> {
        self.fixed.map(|(tag, _)| tag)
    }

    pub(crate) fn check(&self, value: &Variant) -> Result<(), Error> {
        match self.fixed {
            Some((tag, code)) if value.variant_type() != tag => Err(code.with_msg(|| {
                format!("Slot of type {tag} cannot hold {}", value.variant_type())
            })),
            _ => Ok(()),
        }
    }

    /// Overwrite the slot in place.
    pub fn set(&mut self, value: Variant) -> Result<(), Error> {
        self.check(&value)?;
        *self.value = value;
        Ok(())
    }

    pub fn get_mut(&mut self) -> Result<&mut Variant, Error> {
        match self.fixed {
            Some((tag, _)) => Err(TypeError.with_msg(|| {
                format!("Slot of type {tag} is only writable through set")
            })),
            None => Ok(self.value),
        }
    }

    pub fn into_mut(self) -> Result<&'a mut Variant, Error> {
        match self.fixed {
            Some((tag, _)) => Err(TypeError.with_msg(|| {
                format!("Slot of type {tag} is only writable through set")
            })),
            None => Ok(self.value),
        }
    }
}

impl Deref for ElementMut<'_> {
    type Target = Variant;

    fn deref(&self) -> &Variant {
        self.value
    }
}

impl Debug for ElementMut<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

enum Slot<'a> {
    Element(ElementMut<'a>),
    Row(RowMut<'a>),
}

pub struct ItemMut<'a> {
    key: Option<&'a str>,
    time: Option<NaiveDateTime>,
    slot: Slot<'a>,
}

impl<'a> ItemMut<'a> {
    pub(crate) fn new(key: Option<&'a str>, time: Option<NaiveDateTime>, value: &'a mut Variant) -> Self {
        Self {
            key,
            time,
            slot: Slot::Element(ElementMut::free(value)),
        }
    }

    pub(crate) fn element(element: ElementMut<'a>) -> Self {
        Self {
            key: None,
            time: None,
            slot: Slot::Element(element),
        }
    }

    pub(crate) fn row(row: RowMut<'a>) -> Self {
        Self {
            key: None,
            time: None,
            slot: Slot::Row(row),
        }
    }

    pub fn key(&self) -> Result<&'a str, Error> {
        self.key
            .ok_or_else(|| TypeError.msg("Iterator item has no key: collection is not a mapping"))
    }

    pub fn time(&self) -> Result<NaiveDateTime, Error> {
        self.time.ok_or_else(|| {
            TypeError.msg("Iterator item has no time: collection is not a time series")
        })
    }

    /// The current value. Table rows are materialised as an owned `Tuple`.
    pub fn value(&self) -> Cow<'_, Variant> {
        match &self.slot {
            Slot::Element(e) => Cow::Borrowed(e.get()),
            Slot::Row(r) => Cow::Owned(Variant::from(r.to_tuple())),
        }
    }

    /// A bare reference, for untyped slots only.
    pub fn value_mut(&mut self) -> Result<&mut Variant, Error> {
        match &mut self.slot {
            Slot::Element(e) => e.get_mut(),
            Slot::Row(_) => Err(TypeError.msg("DataTable rows are written through set or row_mut")),
        }
    }

    /// Overwrite the item in place. A table row takes a Tuple or List matching the schema.
    pub fn set(&mut self, value: Variant) -> Result<(), Error> {
        match &mut self.slot {
            Slot::Element(e) => e.set(value),
            Slot::Row(r) => r.assign(value),
        }
    }

    pub fn row_mut(&mut self) -> Result<&mut RowMut<'a>, Error> {
        match &mut self.slot {
            Slot::Row(r) => Ok(r),
            Slot::Element(_) => Err(TypeError.msg("Iterator item is not a DataTable row")),
        }
    }
}

/// A double-ended cursor over a collection's items.
pub struct Cursor<'a>(Box<dyn DoubleEndedIterator<Item = Item<'a>> + 'a>);

impl<'a> Cursor<'a> {
    pub(crate) fn new<I>(inner: I) -> Self
    where
        I: DoubleEndedIterator<Item = Item<'a>> + 'a,
    {
        Cursor(Box::new(inner))
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl DoubleEndedIterator for Cursor<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}

pub struct CursorMut<'a>(Box<dyn DoubleEndedIterator<Item = ItemMut<'a>> + 'a>);

impl<'a> CursorMut<'a> {
    pub(crate) fn new<I>(inner: I) -> Self
    where
        I: DoubleEndedIterator<Item = ItemMut<'a>> + 'a,
    {
        CursorMut(Box::new(inner))
    }
}

impl<'a> Iterator for CursorMut<'a> {
    type Item = ItemMut<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl DoubleEndedIterator for CursorMut<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}
