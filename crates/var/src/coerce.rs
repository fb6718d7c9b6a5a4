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

//! Extraction of host values from variants, plus the typed-row machinery data tables use.

use crate::{
    Buffer, Error, Payload, Str, Variant, VariantType,
    error::ErrorCode::{RangeError, TypeError},
    temporal,
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use num_traits::NumCast;

/// A host type a variant can be converted into.
pub trait FromVariant: Sized {
    fn from_variant(v: &Variant) -> Result<Self, Error>;
}

/// A host type that maps onto exactly one primitive tag, and so can type a data table column.
pub trait ColumnType: FromVariant {
    const TAG: VariantType;
}

/// A tuple of `ColumnType`s describing a prefix of a data table's schema.
pub trait RowType: Sized {
    fn column_types() -> Vec<VariantType>;
    fn from_row(cells: &[&Variant]) -> Result<Self, Error>;
}

fn mismatch(v: &Variant, wanted: &str) -> Error {
    TypeError.with_msg(|| format!("Cannot convert {} to {wanted}", v.variant_type()))
}

macro_rules! numeric_from_variant {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl FromVariant for $t {
                fn from_variant(v: &Variant) -> Result<Self, Error> {
                    let converted: Option<$t> = match v.payload() {
                        Payload::Int32(n) => NumCast::from(*n),
                        Payload::UInt32(n) => NumCast::from(*n),
                        Payload::Int64(n) => NumCast::from(*n),
                        Payload::UInt64(n) => NumCast::from(*n),
                        Payload::Float(n) => NumCast::from(*n),
                        Payload::Double(n) => NumCast::from(*n),
                        Payload::Boolean(b) => NumCast::from(*b as u8),
                        Payload::Any(s) => s.trim().parse::<$t>().ok(),
                        _ => return Err(mismatch(v, stringify!($t))),
                    };
                    converted.ok_or_else(|| {
                        TypeError.with_msg(|| {
                            format!(
                                "Value {} of type {} does not fit in {}",
                                v,
                                v.variant_type(),
                                stringify!($t)
                            )
                        })
                    })
                }
            }

            impl ColumnType for $t {
                const TAG: VariantType = VariantType::$tag;
            }
        )*
    };
}

numeric_from_variant! {
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
}

impl FromVariant for bool {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::Boolean(b) => Ok(*b),
            Payload::Any(s) => match s.trim() {
                "true" | "True" | "TRUE" | "1" => Ok(true),
                "false" | "False" | "FALSE" | "0" => Ok(false),
                other => Err(TypeError.with_msg(|| format!("Cannot parse '{other}' as bool"))),
            },
            _ if v.variant_type().is(crate::TypeMask::NUMBER) => {
                Ok(f64::from_variant(v)? != 0.0)
            }
            _ => Err(mismatch(v, "bool")),
        }
    }
}

impl ColumnType for bool {
    const TAG: VariantType = VariantType::Boolean;
}

impl FromVariant for String {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::String(s) | Payload::Any(s) => Ok(s.to_string()),
            _ => Err(mismatch(v, "String")),
        }
    }
}

impl ColumnType for String {
    const TAG: VariantType = VariantType::String;
}

impl FromVariant for Str {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::String(s) | Payload::Any(s) => Ok(s.clone()),
            _ => Err(mismatch(v, "String")),
        }
    }
}

impl FromVariant for NaiveDate {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::Date(d) => Ok(*d),
            Payload::Any(s) => temporal::parse_date(s).map_err(|e| TypeError.msg(e.message())),
            _ => Err(mismatch(v, "Date")),
        }
    }
}

impl ColumnType for NaiveDate {
    const TAG: VariantType = VariantType::Date;
}

impl FromVariant for TimeDelta {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::Time(t) => Ok(*t),
            Payload::Any(s) => temporal::parse_time(s).map_err(|e| TypeError.msg(e.message())),
            _ => Err(mismatch(v, "Time")),
        }
    }
}

impl ColumnType for TimeDelta {
    const TAG: VariantType = VariantType::Time;
}

impl FromVariant for NaiveDateTime {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::DateTime(t) => Ok(*t),
            Payload::Any(s) => {
                temporal::parse_date_time(s).map_err(|e| TypeError.msg(e.message()))
            }
            _ => Err(mismatch(v, "DateTime")),
        }
    }
}

impl ColumnType for NaiveDateTime {
    const TAG: VariantType = VariantType::DateTime;
}

impl FromVariant for Buffer {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        match v.payload() {
            Payload::Buffer(b) => Ok(b.clone()),
            _ => Err(mismatch(v, "Buffer")),
        }
    }
}

impl ColumnType for Buffer {
    const TAG: VariantType = VariantType::Buffer;
}

impl FromVariant for Variant {
    fn from_variant(v: &Variant) -> Result<Self, Error> {
        Ok(v.clone())
    }
}

macro_rules! row_type_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: ColumnType),+> RowType for ($($name,)+) {
            fn column_types() -> Vec<VariantType> {
                vec![$($name::TAG),+]
            }

            fn from_row(cells: &[&Variant]) -> Result<Self, Error> {
                Ok(($(
                    $name::from_variant(cells.get($idx).copied().ok_or_else(|| {
                        RangeError.with_msg(|| format!("Row has no column {}", $idx))
                    })?)?,
                )+))
            }
        }
    };
}

row_type_tuple!(A: 0);
row_type_tuple!(A: 0, B: 1);
row_type_tuple!(A: 0, B: 1, C: 2);
row_type_tuple!(A: 0, B: 1, C: 2, D: 3);
row_type_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
row_type_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
row_type_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
row_type_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
