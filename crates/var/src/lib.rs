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

mod array;
mod bag;
mod buffer;
mod coerce;
mod data_table;
mod dictionary;
pub mod encode;
mod error;
mod exception;
mod iter;
mod list;
mod object;
mod payload;
mod render;
mod select;
mod string;
pub mod temporal;
mod time_series;
mod tuple;
mod variant;

pub use array::TypedArray;
pub use bag::Bag;
pub use buffer::Buffer;
pub use coerce::{ColumnType, FromVariant, RowType};
pub use data_table::{Column, DataTable, MAX_COLUMNS, RowMut, TableState};
pub use dictionary::Dictionary;
pub use encode::{DecodingError, EncodingError, FORMAT_MAJOR_VERSION, FORMAT_MINOR_VERSION};
pub use error::{Error, ErrorCode, ErrorCode::*};
pub use exception::ExceptionInfo;
pub use iter::{Cursor, CursorMut, ElementMut, Item, ItemMut};
pub use list::List;
pub use object::{Object, ObjectFactory, ObjectHandle, ObjectRegistry, ProxyObject};
pub use payload::Payload;
pub use string::Str;
pub use time_series::TimeSeries;
pub use tuple::Tuple;
pub use variant::{
    Variant, v_any, v_bag, v_bool, v_date, v_date_time, v_dict, v_double, v_float, v_int32,
    v_int64, v_list, v_none, v_str, v_time, v_uint32, v_uint64,
};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::BitOr;
use strum::{EnumIter, FromRepr, IntoEnumIterator, IntoStaticStr};

/// The discriminator of a variant's active shape. Every tag is a single bit so that tags can be
/// combined into a `TypeMask` for category tests.
#[repr(u32)]
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    FromRepr,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum VariantType {
    None = 0x0000_0001,
    Any = 0x0000_0002,
    String = 0x0000_0004,
    Boolean = 0x0000_0008,
    Int32 = 0x0000_0010,
    UInt32 = 0x0000_0020,
    Int64 = 0x0000_0040,
    UInt64 = 0x0000_0080,
    Float = 0x0000_0100,
    Double = 0x0000_0200,
    Date = 0x0000_0400,
    Time = 0x0000_0800,
    DateTime = 0x0000_1000,
    List = 0x0000_2000,
    Dictionary = 0x0000_4000,
    Bag = 0x0000_8000,
    Buffer = 0x0001_0000,
    Tuple = 0x0002_0000,
    Exception = 0x0004_0000,
    TimeSeries = 0x0008_0000,
    Object = 0x0010_0000,
    Array = 0x0020_0000,
    DataTable = 0x0040_0000,
}

impl VariantType {
    pub fn bits(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Resolve a tag from its bit pattern. Anything that is not exactly one known tag bit is
    /// a case exhaustion failure.
    pub fn from_bits(bits: u32) -> Result<Self, Error> {
        Self::from_repr(bits)
            .ok_or_else(|| FormatError.with_msg(|| format!("Case exhaustion: tag bits {bits:#x}")))
    }

    /// Case-insensitive lookup by tag name.
    pub fn parse(s: &str) -> Result<Self, Error> {
        Self::iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormatError.with_msg(|| format!("Case exhaustion: unknown tag '{s}'")))
    }

    /// The single byte written on the wire for this tag: the index of its bit.
    pub fn wire_code(&self) -> u8 {
        self.bits().trailing_zeros() as u8
    }

    pub fn from_wire_code(code: u8) -> Result<Self, Error> {
        if code >= 32 {
            return Err(FormatError.with_msg(|| format!("Case exhaustion: tag byte {code}")));
        }
        Self::from_bits(1 << code)
    }

    pub fn is<M: Into<TypeMask>>(&self, mask: M) -> bool {
        self.bits() & mask.into().0 != 0
    }
}

impl Display for VariantType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of tags, used for category queries such as "is this a number?"
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TypeMask(pub u32);

impl TypeMask {
    pub const NUMBER: TypeMask = TypeMask(
        VariantType::Int32 as u32
            | VariantType::UInt32 as u32
            | VariantType::Int64 as u32
            | VariantType::UInt64 as u32
            | VariantType::Float as u32
            | VariantType::Double as u32,
    );
    pub const INTEGER: TypeMask = TypeMask(
        VariantType::Boolean as u32
            | VariantType::Int32 as u32
            | VariantType::UInt32 as u32
            | VariantType::Int64 as u32
            | VariantType::UInt64 as u32,
    );
    pub const PRIMITIVE: TypeMask = TypeMask(
        VariantType::None as u32
            | VariantType::Any as u32
            | VariantType::String as u32
            | Self::NUMBER.0
            | VariantType::Boolean as u32
            | VariantType::Date as u32
            | VariantType::Time as u32
            | VariantType::DateTime as u32
            | VariantType::Buffer as u32,
    );
    pub const SEQUENCE: TypeMask = TypeMask(
        VariantType::List as u32 | VariantType::Tuple as u32 | VariantType::Array as u32,
    );
    pub const MAPPING: TypeMask =
        TypeMask(VariantType::Dictionary as u32 | VariantType::Bag as u32);
    pub const COLLECTION: TypeMask = TypeMask(
        Self::SEQUENCE.0
            | Self::MAPPING.0
            | VariantType::TimeSeries as u32
            | VariantType::DataTable as u32,
    );
}

impl From<VariantType> for TypeMask {
    fn from(t: VariantType) -> Self {
        TypeMask(t.bits())
    }
}

impl BitOr for TypeMask {
    type Output = TypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        TypeMask(self.0 | rhs.0)
    }
}

impl BitOr for VariantType {
    type Output = TypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        TypeMask(self.bits() | rhs.bits())
    }
}

impl BitOr<TypeMask> for VariantType {
    type Output = TypeMask;

    fn bitor(self, rhs: TypeMask) -> Self::Output {
        TypeMask(self.bits() | rhs.0)
    }
}

/// Shape-specific delegation targets, as handed out by `Variant::type_class`.
pub enum TypeClass<'a> {
    Sequence(&'a dyn Sequence),
    Mapping(&'a dyn Mapping),
    TimeSeries(&'a TimeSeries),
    DataTable(&'a DataTable),
    Scalar,
}

pub enum TypeClassMut<'a> {
    Sequence(&'a mut dyn Sequence),
    Mapping(&'a mut dyn Mapping),
    TimeSeries(&'a mut TimeSeries),
    DataTable(&'a mut DataTable),
    Scalar,
}

impl TypeClass<'_> {
    #[inline(always)]
    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeClass::Scalar)
    }
}

/// Index-addressed collections: List, Tuple and Array.
pub trait Sequence {
    /// Return the number of elements.
    fn len(&self) -> usize;
    /// Return true if the sequence is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Get the `index`th element.
    fn at(&self, index: usize) -> Result<&Variant, Error>;
    /// A writable slot for the `index`th element. Array slots only accept the element type.
    fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>, Error>;
    /// Replace the `index`th element.
    fn set(&mut self, index: usize, value: Variant) -> Result<(), Error>;
    /// Append a value at the end, for shapes that can grow.
    fn push_back(&mut self, value: Variant) -> Result<(), Error>;
    /// Remove the last value, for shapes that can shrink.
    fn pop_back(&mut self) -> Result<Variant, Error>;
    fn cursor(&self) -> Cursor<'_>;
    fn cursor_mut(&mut self) -> Result<CursorMut<'_>, Error>;
}

/// String-keyed collections: Dictionary and Bag.
pub trait Mapping {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Look up the value for `key` (the first one, for shapes that allow duplicates).
    fn at_key(&self, key: &str) -> Result<&Variant, Error>;
    fn at_key_mut(&mut self, key: &str) -> Result<&mut Variant, Error>;
    fn has_key(&self, key: &str) -> bool;
    fn insert(&mut self, key: &str, value: Variant) -> Result<(), Error>;
    /// Remove every entry for `key`. Fails if there was none.
    fn remove(&mut self, key: &str) -> Result<(), Error>;
    /// The entries stored under exactly `key`, as a collection of the same shape.
    fn range(&self, key: &str) -> Variant;
    fn cursor(&self) -> Cursor<'_>;
    fn cursor_mut(&mut self) -> CursorMut<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_every_tag_round_trips_through_name_bits_and_wire_code() {
        for t in VariantType::iter() {
            assert_eq!(VariantType::parse(t.name()).unwrap(), t);
            assert_eq!(VariantType::from_bits(t.bits()).unwrap(), t);
            assert_eq!(VariantType::from_wire_code(t.wire_code()).unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_tags_are_case_exhaustion() {
        assert_eq!(VariantType::from_bits(0x3).unwrap_err().code, FormatError);
        assert_eq!(VariantType::from_wire_code(23).unwrap_err().code, FormatError);
        assert_eq!(VariantType::from_wire_code(200).unwrap_err().code, FormatError);
        assert_eq!(VariantType::parse("Banana").unwrap_err().code, FormatError);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(VariantType::parse("datetime").unwrap(), VariantType::DateTime);
        assert_eq!(VariantType::parse("INT32").unwrap(), VariantType::Int32);
    }

    #[test]
    fn test_tags_serialize_by_name() {
        let json = serde_json::to_string(&[VariantType::Date, VariantType::Bag]).unwrap();
        assert_eq!(json, r#"["Date","Bag"]"#);
        let back: Vec<VariantType> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![VariantType::Date, VariantType::Bag]);
    }

    #[test_case(VariantType::Int32, TypeMask::NUMBER, true; "int32 is a number")]
    #[test_case(VariantType::Boolean, TypeMask::NUMBER, false; "boolean is not a number")]
    #[test_case(VariantType::Buffer, TypeMask::PRIMITIVE, true; "buffer is primitive")]
    #[test_case(VariantType::None, TypeMask::PRIMITIVE, true; "none is primitive")]
    #[test_case(VariantType::DataTable, TypeMask::COLLECTION, true; "table is collection")]
    #[test_case(VariantType::DataTable, TypeMask::PRIMITIVE, false; "table is not primitive")]
    #[test_case(VariantType::Bag, TypeMask::MAPPING, true; "bag is mapping")]
    #[test_case(VariantType::List, TypeMask::MAPPING, false; "list is not mapping")]
    #[test_case(VariantType::Object, TypeMask::COLLECTION, false; "object is not collection")]
    fn test_category_masks(t: VariantType, mask: TypeMask, expected: bool) {
        assert_eq!(t.is(mask), expected);
    }

    #[test]
    fn test_masks_compose() {
        let m = VariantType::String | VariantType::Any;
        assert!(VariantType::Any.is(m));
        assert!(!VariantType::Int32.is(m));
        assert!(VariantType::Int32.is(VariantType::String | TypeMask::NUMBER));
    }
}
