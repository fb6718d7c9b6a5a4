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
    Bag, Buffer, Cursor, CursorMut, DataTable, Dictionary, ElementMut, Error, ExceptionInfo,
    FromVariant,
    List, Object, ObjectHandle, Payload, Str, TimeSeries, Tuple, TypeClass, TypeClassMut,
    TypeMask, TypedArray, VariantType,
    error::ErrorCode::{FormatError, TypeError},
    temporal,
};
use ahash::RandomState;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::{
    cmp::Ordering,
    fmt::{Debug, Formatter},
    hash::Hash,
};

const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// A self-describing dynamically-typed value.
///
/// Variants are value types: cloning one copies its whole tree, except that Buffer bytes and
/// Object instances are shared behind atomic reference counts.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Variant(Payload);

impl Default for Variant {
    fn default() -> Self {
        Variant(Payload::None)
    }
}

impl Debug for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Variant {
    /// The default value of `tag`.
    pub fn new(tag: VariantType) -> Result<Self, Error> {
        Self::with_size(tag, 0)
    }

    /// The default value of `tag`, pre-sized where the shape has a size.
    pub fn with_size(tag: VariantType, size: usize) -> Result<Self, Error> {
        Ok(Variant(Payload::initialise(tag, size)?))
    }

    pub fn from_payload(payload: Payload) -> Self {
        Variant(payload)
    }

    pub fn payload(&self) -> &Payload {
        &self.0
    }

    pub fn into_payload(self) -> Payload {
        self.0
    }

    pub fn mk_any(s: &str) -> Self {
        Variant(Payload::Any(Str::mk_str(s)))
    }

    pub fn mk_str(s: &str) -> Self {
        Variant(Payload::String(Str::mk_str(s)))
    }

    pub fn mk_object<T: Object + 'static>(object: T) -> Self {
        Variant(Payload::Object(ObjectHandle::new(object)))
    }

    pub fn mk_exception(e: ExceptionInfo) -> Self {
        Variant(Payload::Exception(Box::new(e)))
    }

    /// A typed array of `size` default elements.
    pub fn mk_array(size: usize, element_type: VariantType) -> Result<Self, Error> {
        Ok(Variant(Payload::Array(TypedArray::new(size, element_type)?)))
    }

    pub fn variant_type(&self) -> VariantType {
        self.0.variant_type()
    }

    /// True if this variant's tag is in `mask`.
    pub fn is<M: Into<crate::TypeMask>>(&self, mask: M) -> bool {
        self.variant_type().is(mask)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.0, Payload::None)
    }

    pub fn type_class(&self) -> TypeClass<'_> {
        match &self.0 {
            Payload::List(l) => TypeClass::Sequence(l),
            Payload::Tuple(t) => TypeClass::Sequence(t),
            Payload::Array(a) => TypeClass::Sequence(a),
            Payload::Dictionary(d) => TypeClass::Mapping(d),
            Payload::Bag(b) => TypeClass::Mapping(b),
            Payload::TimeSeries(t) => TypeClass::TimeSeries(t),
            Payload::DataTable(d) => TypeClass::DataTable(d),
            _ => TypeClass::Scalar,
        }
    }

    pub fn type_class_mut(&mut self) -> TypeClassMut<'_> {
        match &mut self.0 {
            Payload::List(l) => TypeClassMut::Sequence(l),
            Payload::Tuple(t) => TypeClassMut::Sequence(t),
            Payload::Array(a) => TypeClassMut::Sequence(a),
            Payload::Dictionary(d) => TypeClassMut::Mapping(d),
            Payload::Bag(b) => TypeClassMut::Mapping(b),
            Payload::TimeSeries(t) => TypeClassMut::TimeSeries(t),
            Payload::DataTable(d) => TypeClassMut::DataTable(d),
            _ => TypeClassMut::Scalar,
        }
    }

    fn unsupported(&self, op: &str) -> Error {
        TypeError.with_msg(|| format!("{op} is not supported on {}", self.variant_type()))
    }

    /// Convert into a host type. Numbers convert between widths when the value fits, `Any`
    /// parses into the requested type, and everything else needs the exact tag.
    pub fn as_type<T: FromVariant>(&self) -> Result<T, Error> {
        T::from_variant(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            Payload::String(s) | Payload::Any(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match &self.0 {
            Payload::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match &self.0 {
            Payload::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&Bag> {
        match &self.0 {
            Payload::Bag(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match &self.0 {
            Payload::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_time_series(&self) -> Option<&TimeSeries> {
        match &self.0 {
            Payload::TimeSeries(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&TypedArray> {
        match &self.0 {
            Payload::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_data_table(&self) -> Option<&DataTable> {
        match &self.0 {
            Payload::DataTable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_data_table_mut(&mut self) -> Option<&mut DataTable> {
        match &mut self.0 {
            Payload::DataTable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match &self.0 {
            Payload::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_buffer_mut(&mut self) -> Option<&mut Buffer> {
        match &mut self.0 {
            Payload::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match &self.0 {
            Payload::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&ExceptionInfo> {
        match &self.0 {
            Payload::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// The text form of a primitive, as used by `any_cast` and the XML writer.
    pub fn text_value(&self) -> Result<String, Error> {
        let s = match &self.0 {
            Payload::None => String::new(),
            Payload::Any(s) | Payload::String(s) => s.to_string(),
            Payload::Boolean(b) => b.to_string(),
            Payload::Int32(n) => n.to_string(),
            Payload::UInt32(n) => n.to_string(),
            Payload::Int64(n) => n.to_string(),
            Payload::UInt64(n) => n.to_string(),
            Payload::Float(n) => n.to_string(),
            Payload::Double(n) => n.to_string(),
            Payload::Date(d) => temporal::format_date(*d),
            Payload::Time(t) => temporal::format_time(*t),
            Payload::DateTime(t) => temporal::format_date_time(*t),
            Payload::Buffer(b) => b.as_bytes().iter().map(|b| format!("{b:02x}")).collect(),
            _ => return Err(self.unsupported("Text conversion")),
        };
        Ok(s)
    }

    /// Render a primitive into an opaque `Any`.
    pub fn any_cast(&self) -> Result<Variant, Error> {
        Ok(Variant::mk_any(&self.text_value()?))
    }

    /// Parse an `Any` into the primitive `tag`. A value already carrying `tag` is returned as-is.
    pub fn down_cast(&self, tag: VariantType) -> Result<Variant, Error> {
        if self.variant_type() == tag {
            return Ok(self.clone());
        }
        let Payload::Any(s) = &self.0 else {
            return Err(TypeError.with_msg(|| {
                format!("Cannot down-cast {} to {tag}: only Any can be down-cast", self.variant_type())
            }));
        };
        let p = match tag {
            VariantType::None => Payload::None,
            VariantType::String => Payload::String(s.clone()),
            VariantType::Boolean => Payload::Boolean(self.as_type()?),
            VariantType::Int32 => Payload::Int32(self.as_type()?),
            VariantType::UInt32 => Payload::UInt32(self.as_type()?),
            VariantType::Int64 => Payload::Int64(self.as_type()?),
            VariantType::UInt64 => Payload::UInt64(self.as_type()?),
            VariantType::Float => Payload::Float(self.as_type()?),
            VariantType::Double => Payload::Double(self.as_type()?),
            VariantType::Date => Payload::Date(self.as_type()?),
            VariantType::Time => Payload::Time(self.as_type()?),
            VariantType::DateTime => Payload::DateTime(self.as_type()?),
            VariantType::Buffer => Payload::Buffer(Buffer::from_bytes(parse_hex(s)?)),
            _ => {
                return Err(TypeError
                    .with_msg(|| format!("Cannot down-cast Any to non-primitive {tag}")));
            }
        };
        Ok(Variant(p))
    }

    /// Element count for collections, byte count for buffers, zero otherwise.
    pub fn len(&self) -> usize {
        match self.type_class() {
            TypeClass::Sequence(s) => s.len(),
            TypeClass::Mapping(m) => m.len(),
            TypeClass::TimeSeries(t) => t.len(),
            TypeClass::DataTable(d) => d.len(),
            TypeClass::Scalar => self.as_buffer().map(|b| b.len()).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty a growable collection. Data tables keep their columns.
    pub fn clear(&mut self) -> Result<(), Error> {
        match &mut self.0 {
            Payload::List(l) => l.clear(),
            Payload::Dictionary(d) => d.clear(),
            Payload::Bag(b) => b.clear(),
            Payload::TimeSeries(t) => t.clear(),
            Payload::DataTable(d) => d.clear(),
            Payload::Buffer(b) => b.as_bytes_mut().clear(),
            _ => return Err(self.unsupported("clear")),
        }
        Ok(())
    }

    /// The `index`th element of a sequence or time series.
    pub fn at(&self, index: usize) -> Result<&Variant, Error> {
        match self.type_class() {
            TypeClass::Sequence(s) => s.at(index),
            TypeClass::TimeSeries(t) => t.at(index).map(|(_, v)| v),
            _ => Err(self.unsupported("Indexed access")),
        }
    }

    /// A writable slot for the `index`th element. Array slots only accept the element type.
    pub fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>, Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Sequence(s) => s.at_mut(index),
            TypeClassMut::TimeSeries(t) => t.at_mut(index).map(ElementMut::free),
            _ => Err(TypeError.with_msg(|| format!("Indexed access is not supported on {tag}"))),
        }
    }

    pub fn set(&mut self, index: usize, value: Variant) -> Result<(), Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Sequence(s) => s.set(index, value),
            _ => Err(TypeError.with_msg(|| format!("Indexed set is not supported on {tag}"))),
        }
    }

    pub fn at_key(&self, key: &str) -> Result<&Variant, Error> {
        match self.type_class() {
            TypeClass::Mapping(m) => m.at_key(key),
            _ => Err(self.unsupported("Keyed access")),
        }
    }

    pub fn at_key_mut(&mut self, key: &str) -> Result<&mut Variant, Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Mapping(m) => m.at_key_mut(key),
            _ => Err(TypeError.with_msg(|| format!("Keyed access is not supported on {tag}"))),
        }
    }

    pub fn has_key(&self, key: &str) -> Result<bool, Error> {
        match self.type_class() {
            TypeClass::Mapping(m) => Ok(m.has_key(key)),
            _ => Err(self.unsupported("has_key")),
        }
    }

    pub fn insert(&mut self, key: &str, value: Variant) -> Result<(), Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Mapping(m) => m.insert(key, value),
            _ => Err(TypeError.with_msg(|| format!("insert is not supported on {tag}"))),
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<(), Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Mapping(m) => m.remove(key),
            _ => Err(TypeError.with_msg(|| format!("remove is not supported on {tag}"))),
        }
    }

    /// Append to a List, or append a row (a Tuple or List of cells) to a DataTable.
    pub fn push_back(&mut self, value: Variant) -> Result<(), Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Sequence(s) => s.push_back(value),
            TypeClassMut::DataTable(d) => {
                let row = match value.0 {
                    Payload::Tuple(t) => t.iter().cloned().collect(),
                    Payload::List(l) => l.iter().cloned().collect(),
                    other => {
                        return Err(TypeError.with_msg(|| {
                            format!("DataTable rows must be Tuple or List, got {}", other.variant_type())
                        }));
                    }
                };
                d.push_row(row)
            }
            TypeClassMut::TimeSeries(_) => Err(TypeError.msg(
                "TimeSeries entries need a time: use push_back_timed",
            )),
            _ => Err(TypeError.with_msg(|| format!("push_back is not supported on {tag}"))),
        }
    }

    pub fn push_back_timed(&mut self, time: NaiveDateTime, value: Variant) -> Result<(), Error> {
        match &mut self.0 {
            Payload::TimeSeries(t) => {
                t.push_back(time, value);
                Ok(())
            }
            _ => Err(self.unsupported("push_back_timed")),
        }
    }

    pub fn pop_back(&mut self) -> Result<Variant, Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Sequence(s) => s.pop_back(),
            TypeClassMut::TimeSeries(t) => t.pop_back().map(|(_, v)| v),
            TypeClassMut::DataTable(d) => d.pop_row().map(Variant::from),
            _ => Err(TypeError.with_msg(|| format!("pop_back is not supported on {tag}"))),
        }
    }

    /// Entries stored under `key`: a same-shaped mapping, or for a time series the entries at
    /// exactly that (parsed) time.
    pub fn range(&self, key: &str) -> Result<Variant, Error> {
        match self.type_class() {
            TypeClass::Mapping(m) => Ok(m.range(key)),
            TypeClass::TimeSeries(t) => Ok(Variant::from(t.range(key)?)),
            _ => Err(self.unsupported("range")),
        }
    }

    /// Time series entries with `from <= time <= to`.
    pub fn range_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Result<Variant, Error> {
        match self.type_class() {
            TypeClass::TimeSeries(t) => Ok(Variant::from(t.range_between(from, to))),
            _ => Err(self.unsupported("range_between")),
        }
    }

    /// Add a DataTable column, returning `self` for chaining.
    pub fn add_column(
        &mut self,
        column_type: VariantType,
        name: Option<&str>,
    ) -> Result<&mut Self, Error> {
        match &mut self.0 {
            Payload::DataTable(d) => {
                d.add_column(column_type, name)?;
            }
            _ => return Err(self.unsupported("add_column")),
        }
        Ok(self)
    }

    pub fn iter(&self) -> Result<Cursor<'_>, Error> {
        match self.type_class() {
            TypeClass::Sequence(s) => Ok(s.cursor()),
            TypeClass::Mapping(m) => Ok(m.cursor()),
            TypeClass::TimeSeries(t) => Ok(t.cursor()),
            TypeClass::DataTable(d) => Ok(d.cursor()),
            TypeClass::Scalar => Err(self.unsupported("Iteration")),
        }
    }

    /// In-place iteration. Array elements and table rows are written through checked setters.
    pub fn iter_mut(&mut self) -> Result<CursorMut<'_>, Error> {
        let tag = self.variant_type();
        match self.type_class_mut() {
            TypeClassMut::Sequence(s) => s.cursor_mut(),
            TypeClassMut::Mapping(m) => Ok(m.cursor_mut()),
            TypeClassMut::TimeSeries(t) => Ok(t.cursor_mut()),
            TypeClassMut::DataTable(d) => Ok(d.cursor_mut()),
            TypeClassMut::Scalar => {
                Err(TypeError.with_msg(|| format!("Mutable iteration is not supported on {tag}")))
            }
        }
    }

    /// Three-way comparison: tag category first, then value within the category.
    pub fn compare(&self, other: &Variant) -> Ordering {
        self.cmp(other)
    }

    pub fn hash_seeded(&self, seed: u64) -> u64 {
        RandomState::with_seeds(
            HASH_SEEDS[0] ^ seed,
            HASH_SEEDS[1],
            HASH_SEEDS[2],
            HASH_SEEDS[3],
        )
        .hash_one(self)
    }

    /// Stable for the life of the process; equal variants always hash equal.
    pub fn hash_value(&self) -> u64 {
        self.hash_seeded(0)
    }
}

fn parse_hex(s: &str) -> Result<Vec<u8>, Error> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(FormatError.with_msg(|| format!("Odd-length hex buffer text '{s}'")));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| FormatError.with_msg(|| format!("Invalid hex buffer text '{s}'")))
        })
        .collect()
}

macro_rules! variant_from {
    ($($t:ty => $arm:ident),* $(,)?) => {
        $(
            impl From<$t> for Variant {
                fn from(v: $t) -> Self {
                    Variant(Payload::$arm(v.into()))
                }
            }
        )*
    };
}

variant_from! {
    bool => Boolean,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    NaiveDate => Date,
    List => List,
    Dictionary => Dictionary,
    Bag => Bag,
    Buffer => Buffer,
    Tuple => Tuple,
    ExceptionInfo => Exception,
    TimeSeries => TimeSeries,
    ObjectHandle => Object,
    TypedArray => Array,
    DataTable => DataTable,
    &str => String,
    String => String,
    Str => String,
}

impl From<TimeDelta> for Variant {
    fn from(t: TimeDelta) -> Self {
        Variant(Payload::Time(temporal::truncate_time(t)))
    }
}

impl From<NaiveDateTime> for Variant {
    fn from(t: NaiveDateTime) -> Self {
        Variant(Payload::DateTime(temporal::truncate_date_time(t)))
    }
}

impl FromIterator<Variant> for Variant {
    fn from_iter<T: IntoIterator<Item = Variant>>(iter: T) -> Self {
        Variant(Payload::List(List::from_iter(iter)))
    }
}

pub fn v_none() -> Variant {
    Variant::default()
}

pub fn v_any(s: &str) -> Variant {
    Variant::mk_any(s)
}

pub fn v_str(s: &str) -> Variant {
    Variant::mk_str(s)
}

pub fn v_bool(b: bool) -> Variant {
    Variant::from(b)
}

pub fn v_int32(n: i32) -> Variant {
    Variant::from(n)
}

pub fn v_uint32(n: u32) -> Variant {
    Variant::from(n)
}

pub fn v_int64(n: i64) -> Variant {
    Variant::from(n)
}

pub fn v_uint64(n: u64) -> Variant {
    Variant::from(n)
}

pub fn v_float(n: f32) -> Variant {
    Variant::from(n)
}

pub fn v_double(n: f64) -> Variant {
    Variant::from(n)
}

pub fn v_date(d: NaiveDate) -> Variant {
    Variant::from(d)
}

pub fn v_time(t: TimeDelta) -> Variant {
    Variant::from(t)
}

pub fn v_date_time(t: NaiveDateTime) -> Variant {
    Variant::from(t)
}

pub fn v_list(values: &[Variant]) -> Variant {
    Variant::from(List::mk_list(values))
}

pub fn v_dict<'a, I: IntoIterator<Item = (&'a str, Variant)>>(pairs: I) -> Variant {
    Variant::from(Dictionary::build(pairs))
}

pub fn v_bag<'a, I: IntoIterator<Item = (&'a str, Variant)>>(pairs: I) -> Variant {
    Variant::from(Bag::build(pairs))
}
