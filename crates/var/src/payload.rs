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
    Bag, Buffer, DataTable, Dictionary, Error, ExceptionInfo, List, ObjectHandle, Str,
    TimeSeries, Tuple, TypeMask, TypedArray, VariantType,
    error::ErrorCode::TypeError,
    temporal,
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::{
    cmp::Ordering,
    fmt::Debug,
    hash::{Hash, Hasher},
};

/// The tagged storage cell behind a `Variant`. Exactly one arm is live, and it always agrees with
/// the tag reported by `variant_type`.
#[derive(Clone)]
pub enum Payload {
    None,
    Any(Str),
    String(Str),
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Date(NaiveDate),
    Time(TimeDelta),
    DateTime(NaiveDateTime),
    List(List),
    Dictionary(Dictionary),
    Bag(Bag),
    Buffer(Buffer),
    Tuple(Tuple),
    Exception(Box<ExceptionInfo>),
    TimeSeries(TimeSeries),
    Object(ObjectHandle),
    Array(TypedArray),
    DataTable(Box<DataTable>),
}

impl Payload {
    /// The default payload for `tag`. `size` pre-sizes Tuple slots, Buffer bytes and DataTable
    /// row capacity and is ignored elsewhere.
    pub fn initialise(tag: VariantType, size: usize) -> Result<Self, Error> {
        let p = match tag {
            VariantType::None => Payload::None,
            VariantType::Any => Payload::Any(Str::default()),
            VariantType::String => Payload::String(Str::default()),
            VariantType::Boolean => Payload::Boolean(false),
            VariantType::Int32 => Payload::Int32(0),
            VariantType::UInt32 => Payload::UInt32(0),
            VariantType::Int64 => Payload::Int64(0),
            VariantType::UInt64 => Payload::UInt64(0),
            VariantType::Float => Payload::Float(0.0),
            VariantType::Double => Payload::Double(0.0),
            VariantType::Date => Payload::Date(temporal::epoch_date()),
            VariantType::Time => Payload::Time(TimeDelta::zero()),
            VariantType::DateTime => Payload::DateTime(temporal::epoch()),
            VariantType::List => Payload::List(List::new()),
            VariantType::Dictionary => Payload::Dictionary(Dictionary::new()),
            VariantType::Bag => Payload::Bag(Bag::new()),
            VariantType::Buffer => Payload::Buffer(Buffer::zeroed(size)),
            VariantType::Tuple => Payload::Tuple(Tuple::with_size(size)),
            VariantType::TimeSeries => Payload::TimeSeries(TimeSeries::new()),
            VariantType::DataTable => Payload::DataTable(Box::new(DataTable::with_capacity(size))),
            VariantType::Array | VariantType::Object | VariantType::Exception => {
                return Err(TypeError.with_msg(|| {
                    format!("{tag} cannot be default-constructed")
                }));
            }
        };
        Ok(p)
    }

    pub fn variant_type(&self) -> VariantType {
        match self {
            Payload::None => VariantType::None,
            Payload::Any(_) => VariantType::Any,
            Payload::String(_) => VariantType::String,
            Payload::Boolean(_) => VariantType::Boolean,
            Payload::Int32(_) => VariantType::Int32,
            Payload::UInt32(_) => VariantType::UInt32,
            Payload::Int64(_) => VariantType::Int64,
            Payload::UInt64(_) => VariantType::UInt64,
            Payload::Float(_) => VariantType::Float,
            Payload::Double(_) => VariantType::Double,
            Payload::Date(_) => VariantType::Date,
            Payload::Time(_) => VariantType::Time,
            Payload::DateTime(_) => VariantType::DateTime,
            Payload::List(_) => VariantType::List,
            Payload::Dictionary(_) => VariantType::Dictionary,
            Payload::Bag(_) => VariantType::Bag,
            Payload::Buffer(_) => VariantType::Buffer,
            Payload::Tuple(_) => VariantType::Tuple,
            Payload::Exception(_) => VariantType::Exception,
            Payload::TimeSeries(_) => VariantType::TimeSeries,
            Payload::Object(_) => VariantType::Object,
            Payload::Array(_) => VariantType::Array,
            Payload::DataTable(_) => VariantType::DataTable,
        }
    }

    /// Numbers of every width share one rank so that they compare by value across tags.
    fn rank(&self) -> u32 {
        let t = self.variant_type();
        if t.is(TypeMask::NUMBER) {
            VariantType::Int32.bits()
        } else {
            t.bits()
        }
    }

    fn numeric_key(&self) -> Option<NumKey> {
        match self {
            Payload::Int32(n) => Some(NumKey::Int(*n as i128)),
            Payload::UInt32(n) => Some(NumKey::Int(*n as i128)),
            Payload::Int64(n) => Some(NumKey::Int(*n as i128)),
            Payload::UInt64(n) => Some(NumKey::Int(*n as i128)),
            Payload::Float(n) => Some(NumKey::from_real(*n as f64)),
            Payload::Double(n) => Some(NumKey::from_real(*n)),
            _ => None,
        }
    }
}

/// The value of a number with its width erased. Integral floats fold into `Int` so that
/// `Int32(2)`, `UInt64(2)` and `Double(2.0)` compare and hash identically.
#[derive(Clone, Copy, Debug)]
enum NumKey {
    Int(i128),
    Real(f64),
}

// 2^127: floats at or beyond this magnitude stay `Real`.
const I128_LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

impl NumKey {
    fn from_real(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < I128_LIMIT {
            NumKey::Int(f as i128)
        } else {
            NumKey::Real(f)
        }
    }
}

impl PartialEq for NumKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for NumKey {}

impl PartialOrd for NumKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NumKey::Int(a), NumKey::Int(b)) => a.cmp(b),
            (NumKey::Real(a), NumKey::Real(b)) => a.total_cmp(b),
            (NumKey::Int(a), NumKey::Real(b)) => (*a as f64).total_cmp(b),
            (NumKey::Real(a), NumKey::Int(b)) => a.total_cmp(&(*b as f64)),
        }
    }
}

impl Hash for NumKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NumKey::Int(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            NumKey::Real(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Payload {}

impl PartialOrd for Payload {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Payload {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ra, rb) = (self.rank(), other.rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Payload::None, Payload::None) => Ordering::Equal,
            (Payload::Any(a), Payload::Any(b)) | (Payload::String(a), Payload::String(b)) => {
                a.cmp(b)
            }
            (Payload::Boolean(a), Payload::Boolean(b)) => a.cmp(b),
            (Payload::Date(a), Payload::Date(b)) => a.cmp(b),
            (Payload::Time(a), Payload::Time(b)) => a.cmp(b),
            (Payload::DateTime(a), Payload::DateTime(b)) => a.cmp(b),
            (Payload::List(a), Payload::List(b)) => a.cmp(b),
            (Payload::Dictionary(a), Payload::Dictionary(b)) => a.cmp(b),
            (Payload::Bag(a), Payload::Bag(b)) => a.cmp(b),
            (Payload::Buffer(a), Payload::Buffer(b)) => a.cmp(b),
            (Payload::Tuple(a), Payload::Tuple(b)) => a.cmp(b),
            (Payload::Exception(a), Payload::Exception(b)) => a.cmp(b),
            (Payload::TimeSeries(a), Payload::TimeSeries(b)) => a.cmp(b),
            (Payload::Object(a), Payload::Object(b)) => a.cmp(b),
            (Payload::Array(a), Payload::Array(b)) => a.cmp(b),
            (Payload::DataTable(a), Payload::DataTable(b)) => a.cmp(b),
            // Equal rank with different arms only happens inside the Number category.
            _ => self.numeric_key().cmp(&other.numeric_key()),
        }
    }
}

impl Hash for Payload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Payload::None => {}
            Payload::Any(s) | Payload::String(s) => s.hash(state),
            Payload::Boolean(b) => b.hash(state),
            Payload::Int32(_)
            | Payload::UInt32(_)
            | Payload::Int64(_)
            | Payload::UInt64(_)
            | Payload::Float(_)
            | Payload::Double(_) => self.numeric_key().hash(state),
            Payload::Date(d) => d.hash(state),
            Payload::Time(t) => t.hash(state),
            Payload::DateTime(t) => t.hash(state),
            Payload::List(l) => l.hash(state),
            Payload::Dictionary(d) => d.hash(state),
            Payload::Bag(b) => b.hash(state),
            Payload::Buffer(b) => b.hash(state),
            Payload::Tuple(t) => t.hash(state),
            Payload::Exception(e) => e.hash(state),
            Payload::TimeSeries(t) => t.hash(state),
            Payload::Object(o) => o.hash(state),
            Payload::Array(a) => a.hash(state),
            Payload::DataTable(d) => d.hash(state),
        }
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::None => write!(f, "None"),
            Payload::Any(s) => write!(f, "Any({s:?})"),
            Payload::String(s) => write!(f, "String({s:?})"),
            Payload::Boolean(b) => write!(f, "Boolean({b})"),
            Payload::Int32(n) => write!(f, "Int32({n})"),
            Payload::UInt32(n) => write!(f, "UInt32({n})"),
            Payload::Int64(n) => write!(f, "Int64({n})"),
            Payload::UInt64(n) => write!(f, "UInt64({n})"),
            Payload::Float(n) => write!(f, "Float({n:?})"),
            Payload::Double(n) => write!(f, "Double({n:?})"),
            Payload::Date(d) => write!(f, "Date({d})"),
            Payload::Time(t) => write!(f, "Time({})", temporal::format_time(*t)),
            Payload::DateTime(t) => write!(f, "DateTime({t})"),
            Payload::List(l) => write!(f, "List({l:?})"),
            Payload::Dictionary(d) => write!(f, "Dictionary({d:?})"),
            Payload::Bag(b) => write!(f, "Bag({b:?})"),
            Payload::Buffer(b) => write!(f, "{b:?}"),
            Payload::Tuple(t) => write!(f, "Tuple{t:?}"),
            Payload::Exception(e) => write!(f, "Exception({e:?})"),
            Payload::TimeSeries(t) => write!(f, "TimeSeries({t:?})"),
            Payload::Object(o) => write!(f, "Object({o:?})"),
            Payload::Array(a) => write!(f, "{a:?}"),
            Payload::DataTable(d) => write!(f, "{d:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_initialise_matches_tag() {
        for t in VariantType::iter() {
            match Payload::initialise(t, 3) {
                Ok(p) => assert_eq!(p.variant_type(), t),
                Err(e) => {
                    assert_eq!(e.code, TypeError);
                    assert!(matches!(
                        t,
                        VariantType::Array | VariantType::Object | VariantType::Exception
                    ));
                }
            }
        }
    }

    #[test]
    fn test_numbers_compare_across_widths() {
        assert_eq!(Payload::Int32(2), Payload::UInt64(2));
        assert_eq!(Payload::Double(2.0), Payload::Int64(2));
        assert!(Payload::Int32(-1) < Payload::UInt32(0));
        assert!(Payload::Float(1.5) > Payload::Int32(1));
        assert!(Payload::Float(1.5) < Payload::Int64(2));
        assert!(Payload::UInt64(u64::MAX) > Payload::Int64(i64::MAX));
    }

    #[test]
    fn test_categories_order_before_values() {
        // None < Any < String < Boolean < Number < Date ...
        assert!(Payload::None < Payload::Any(Str::mk_str("zzz")));
        assert!(Payload::String(Str::mk_str("zzz")) < Payload::Boolean(false));
        assert!(Payload::Boolean(true) < Payload::Int32(i32::MIN));
        assert!(Payload::Double(f64::MAX) < Payload::Date(temporal::epoch_date()));
    }
}
