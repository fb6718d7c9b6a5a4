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
    Cursor, CursorMut, Error, Item, ItemMut, Variant, error::ErrorCode::RangeError, temporal,
};
use chrono::NaiveDateTime;
use std::{
    cmp::Ordering,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

/// Timestamped values kept in ascending time order. Entries sharing a timestamp keep the
/// order they were pushed in.
#[derive(Clone, Default)]
pub struct TimeSeries(imbl::Vector<(NaiveDateTime, Variant)>);

impl TimeSeries {
    pub fn new() -> Self {
        TimeSeries(imbl::Vector::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Insert after every entry whose time is at or before `time`.
    pub fn push_back(&mut self, time: NaiveDateTime, value: Variant) {
        let time = temporal::truncate_date_time(time);
        let pos = self.upper_bound(time);
        self.0.insert(pos, (time, value));
    }

    pub fn pop_back(&mut self) -> Result<(NaiveDateTime, Variant), Error> {
        self.0
            .pop_back()
            .ok_or_else(|| RangeError.msg("Attempt to pop from empty TimeSeries"))
    }

    pub fn at(&self, index: usize) -> Result<(NaiveDateTime, &Variant), Error> {
        self.0.get(index).map(|(t, v)| (*t, v)).ok_or_else(|| {
            RangeError.with_msg(|| {
                format!("Index {index} is out of range for TimeSeries of size {}", self.len())
            })
        })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut Variant, Error> {
        let len = self.len();
        self.0.get_mut(index).map(|(_, v)| v).ok_or_else(|| {
            RangeError
                .with_msg(|| format!("Index {index} is out of range for TimeSeries of size {len}"))
        })
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDateTime, &Variant)> + '_ {
        self.0.iter().map(|(t, v)| (*t, v))
    }

    /// The entries with `from <= time <= to`, in order.
    pub fn range_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> TimeSeries {
        if to < from {
            return TimeSeries::new();
        }
        let start = self.lower_bound(from);
        let end = self.upper_bound(to);
        TimeSeries(self.0.clone().slice(start..end))
    }

    /// The entries stamped exactly `key`, which is parsed as a date-time.
    pub fn range(&self, key: &str) -> Result<TimeSeries, Error> {
        let t = temporal::parse_date_time(key)?;
        Ok(self.range_between(t, t))
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.0.iter().map(|(t, v)| Item::timed(*t, v)))
    }

    pub fn cursor_mut(&mut self) -> CursorMut<'_> {
        CursorMut::new(
            self.0
                .iter_mut()
                .map(|(t, v)| ItemMut::new(None, Some(*t), v)),
        )
    }

    fn lower_bound(&self, time: NaiveDateTime) -> usize {
        self.0
            .binary_search_by(|(t, _)| {
                if *t < time {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .unwrap_or_else(|pos| pos)
    }

    fn upper_bound(&self, time: NaiveDateTime) -> usize {
        self.0
            .binary_search_by(|(t, _)| {
                if *t <= time {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .unwrap_or_else(|pos| pos)
    }
}

impl Debug for TimeSeries {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl PartialEq for TimeSeries {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for TimeSeries {}

impl PartialOrd for TimeSeries {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeSeries {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.len() != other.len() {
            return self.len().cmp(&other.len());
        }
        self.0.iter().cmp(other.0.iter())
    }
}

impl Hash for TimeSeries {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (t, v) in self.0.iter() {
            t.hash(state);
            v.hash(state);
        }
    }
}

impl FromIterator<(NaiveDateTime, Variant)> for TimeSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDateTime, Variant)>>(iter: T) -> Self {
        let mut ts = TimeSeries::new();
        for (t, v) in iter {
            ts.push_back(t, v);
        }
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{temporal::parse_date_time, v_int32};
    use pretty_assertions::assert_eq;

    fn t(s: &str) -> NaiveDateTime {
        parse_date_time(s).unwrap()
    }

    #[test]
    fn test_push_back_keeps_time_order() {
        let mut ts = TimeSeries::new();
        ts.push_back(t("2020-01-03T00:00:00"), v_int32(3));
        ts.push_back(t("2020-01-01T00:00:00"), v_int32(1));
        ts.push_back(t("2020-01-02T00:00:00"), v_int32(2));
        ts.push_back(t("2020-01-02T00:00:00"), v_int32(22));
        let values: Vec<_> = ts.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(values, vec![v_int32(1), v_int32(2), v_int32(22), v_int32(3)]);
    }

    #[test]
    fn test_range_between_is_inclusive() {
        let ts: TimeSeries = [
            (t("2020-01-01T00:00:00"), v_int32(1)),
            (t("2020-01-02T00:00:00"), v_int32(2)),
            (t("2020-01-03T00:00:00"), v_int32(3)),
            (t("2020-01-04T00:00:00"), v_int32(4)),
        ]
        .into_iter()
        .collect();
        let r = ts.range_between(t("2020-01-02T00:00:00"), t("2020-01-03T00:00:00"));
        let values: Vec<_> = r.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(values, vec![v_int32(2), v_int32(3)]);

        assert!(ts
            .range_between(t("2020-01-03T00:00:00"), t("2020-01-02T00:00:00"))
            .is_empty());
        assert_eq!(ts.range("2020-01-04T00:00:00").unwrap().len(), 1);
        assert!(ts.range("not a time").is_err());
    }

    #[test]
    fn test_cursor_exposes_time_but_not_key() {
        let mut ts = TimeSeries::new();
        ts.push_back(t("2021-05-05T05:05:05"), v_int32(5));
        let item = ts.cursor().next().unwrap();
        assert_eq!(item.time().unwrap(), t("2021-05-05T05:05:05"));
        assert_eq!(item.key().unwrap_err().code, crate::ErrorCode::TypeError);
    }
}
