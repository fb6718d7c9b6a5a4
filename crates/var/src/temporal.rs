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

//! Epoch-relative conversions and the text forms used for Date, Time and DateTime payloads.
//!
//! Dates count whole days from 1970-01-01. Times are signed durations with microsecond
//! resolution. Date-times are naive (no zone) and split into a date plus a time of day.
//! Anything finer than a microsecond is truncated when a value is built or parsed.

use crate::{Error, ErrorCode::FormatError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeDelta};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_TIME_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 1970-01-01, the origin for all day counts.
pub fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

/// 1970-01-01T00:00:00.
pub fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(epoch_date()).num_days() as i32
}

pub fn date_from_days(days: i32) -> Result<NaiveDate, Error> {
    epoch_date()
        .checked_add_signed(TimeDelta::days(days as i64))
        .ok_or_else(|| FormatError.with_msg(|| format!("Day count {days} is out of date range")))
}

/// Drop sub-microsecond precision, rounding toward zero.
pub fn truncate_time(time: TimeDelta) -> TimeDelta {
    time - TimeDelta::nanoseconds(i64::from(time.subsec_nanos() % 1_000))
}

pub fn truncate_date_time(dt: NaiveDateTime) -> NaiveDateTime {
    dt.trunc_subsecs(6)
}

/// Fails for durations that overflow or carry nanoseconds the wire form cannot hold.
pub fn time_to_micros(time: TimeDelta) -> Result<i64, Error> {
    if time.subsec_nanos() % 1_000 != 0 {
        return Err(FormatError.with_msg(|| format!("Time {time} is finer than a microsecond")));
    }
    time.num_microseconds()
        .ok_or_else(|| FormatError.with_msg(|| format!("Time {time} overflows microseconds")))
}

pub fn time_from_micros(micros: i64) -> TimeDelta {
    TimeDelta::microseconds(micros)
}

/// The offset of `dt` from its own midnight.
pub fn time_of_day(dt: NaiveDateTime) -> TimeDelta {
    dt.time().signed_duration_since(NaiveTime::default())
}

pub fn date_time_from_parts(date: NaiveDate, time_of_day: TimeDelta) -> Result<NaiveDateTime, Error> {
    date.and_time(NaiveTime::default())
        .checked_add_signed(time_of_day)
        .ok_or_else(|| {
            FormatError.with_msg(|| format!("{date} plus {time_of_day} is out of date-time range"))
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_date_time(dt: NaiveDateTime) -> String {
    dt.format(DATE_TIME_FORMAT).to_string()
}

/// `[-]HH:MM:SS[.ffffff]`. Hours are not wrapped at 24.
pub fn format_time(time: TimeDelta) -> String {
    let micros = time.num_microseconds().unwrap_or(i64::MAX);
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if frac == 0 {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}.{frac:06}")
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| FormatError.with_msg(|| format!("Invalid date '{s}': {e}")))
}

pub fn parse_date_time(s: &str) -> Result<NaiveDateTime, Error> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT_SPACED))
        .map(truncate_date_time)
        .map_err(|e| FormatError.with_msg(|| format!("Invalid date-time '{s}': {e}")))
}

pub fn parse_time(s: &str) -> Result<TimeDelta, Error> {
    let invalid = || FormatError.with_msg(|| format!("Invalid time '{s}'"));
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let mut parts = body.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let (sec, frac) = match sec.split_once('.') {
        Some((sec, frac)) => (sec, frac),
        None => (sec, ""),
    };
    let h: i64 = h.parse().map_err(|_| invalid())?;
    let m: i64 = m.parse().map_err(|_| invalid())?;
    let sec: i64 = sec.parse().map_err(|_| invalid())?;
    if m >= 60 || sec >= 60 || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let frac_micros = if frac.is_empty() {
        0
    } else {
        frac.parse::<i64>().map_err(|_| invalid())? * 10i64.pow(6 - frac.len() as u32)
    };
    let micros = h
        .checked_mul(3600)
        .and_then(|v| v.checked_add(m * 60 + sec))
        .and_then(|v| v.checked_mul(1_000_000))
        .and_then(|v| v.checked_add(frac_micros))
        .ok_or_else(invalid)?;
    Ok(time_from_micros(if negative { -micros } else { micros }))
}
