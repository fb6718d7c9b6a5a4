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

use std::io;

use protean_var::{EncodingError, ExceptionInfo, Payload, Variant, VariantType, temporal};
use tracing::trace;
use zerocopy::{
    IntoBytes,
    byteorder::{F32, F64, I32, I64, LittleEndian, U32, U64},
};

use crate::Header;

pub struct BinaryWriter<W: io::Write> {
    writer: W,
}

impl<W: io::Write> BinaryWriter<W> {
    /// Wrap `writer`, emitting the format header straight away.
    pub fn new(mut writer: W) -> Result<Self, EncodingError> {
        writer.write_all(Header::current().as_bytes())?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Append one record for `v`.
    pub fn write(&mut self, v: &Variant) -> Result<(), EncodingError> {
        self.write_record(v)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: io::Write> BinaryWriter<W> {
    fn write_record(&mut self, v: &Variant) -> Result<(), EncodingError> {
        self.write_u8(v.variant_type().wire_code())?;
        self.write_payload(v)
    }

    fn write_u8(&mut self, n: u8) -> Result<(), EncodingError> {
        self.writer.write_all(&[n])?;
        Ok(())
    }

    fn write_u32(&mut self, n: u32) -> Result<(), EncodingError> {
        self.writer.write_all(U32::<LittleEndian>::new(n).as_bytes())?;
        Ok(())
    }

    fn write_len(&mut self, tag: VariantType, len: usize) -> Result<(), EncodingError> {
        let n = u32::try_from(len).map_err(|_| EncodingError::CouldNotEncode {
            tag: tag.to_string(),
            reason: format!("length {len} does not fit in 32 bits"),
        })?;
        self.write_u32(n)
    }

    fn write_bytes(&mut self, tag: VariantType, bytes: &[u8]) -> Result<(), EncodingError> {
        self.write_len(tag, bytes.len())?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<(), EncodingError> {
        self.write_bytes(VariantType::String, s.as_bytes())
    }

    fn write_date_time(&mut self, dt: chrono::NaiveDateTime) -> Result<(), EncodingError> {
        let days = temporal::days_since_epoch(dt.date());
        let micros = temporal::time_to_micros(temporal::time_of_day(dt))?;
        self.writer.write_all(I32::<LittleEndian>::new(days).as_bytes())?;
        self.writer.write_all(I64::<LittleEndian>::new(micros).as_bytes())?;
        Ok(())
    }

    fn write_exception(&mut self, e: &ExceptionInfo) -> Result<(), EncodingError> {
        self.write_string(e.type_name())?;
        self.write_string(e.message())?;
        self.write_string(e.source())?;
        self.write_string(e.stack())
    }

    /// The payload of `v` without its tag byte.
    fn write_payload(&mut self, v: &Variant) -> Result<(), EncodingError> {
        let tag = v.variant_type();
        match v.payload() {
            Payload::None => {}
            Payload::Any(s) | Payload::String(s) => self.write_string(s)?,
            Payload::Boolean(b) => self.write_u8(*b as u8)?,
            Payload::Int32(n) => self.writer.write_all(I32::<LittleEndian>::new(*n).as_bytes())?,
            Payload::UInt32(n) => self.write_u32(*n)?,
            Payload::Int64(n) => self.writer.write_all(I64::<LittleEndian>::new(*n).as_bytes())?,
            Payload::UInt64(n) => self.writer.write_all(U64::<LittleEndian>::new(*n).as_bytes())?,
            Payload::Float(n) => self.writer.write_all(F32::<LittleEndian>::new(*n).as_bytes())?,
            Payload::Double(n) => self.writer.write_all(F64::<LittleEndian>::new(*n).as_bytes())?,
            Payload::Date(d) => {
                let days = temporal::days_since_epoch(*d);
                self.writer.write_all(I32::<LittleEndian>::new(days).as_bytes())?
            }
            Payload::Time(t) => {
                let micros = temporal::time_to_micros(*t)?;
                self.writer.write_all(I64::<LittleEndian>::new(micros).as_bytes())?
            }
            Payload::DateTime(dt) => self.write_date_time(*dt)?,
            Payload::Buffer(b) => self.write_bytes(tag, b.as_bytes())?,
            Payload::List(l) => {
                self.write_len(tag, v.len())?;
                for item in l.iter() {
                    self.write_record(item)?;
                }
            }
            Payload::Tuple(t) => {
                self.write_len(tag, t.as_slice().len())?;
                for item in t.iter() {
                    self.write_record(item)?;
                }
            }
            Payload::Array(a) => {
                self.write_len(tag, v.len())?;
                self.write_u8(a.element_type().wire_code())?;
                for item in a.iter() {
                    self.write_record(item)?;
                }
            }
            Payload::Dictionary(d) => {
                self.write_len(tag, v.len())?;
                for (key, item) in d.iter() {
                    self.write_string(key)?;
                    self.write_record(item)?;
                }
            }
            Payload::Bag(b) => {
                self.write_len(tag, v.len())?;
                for (key, item) in b.iter() {
                    self.write_string(key)?;
                    self.write_record(item)?;
                }
            }
            Payload::TimeSeries(ts) => {
                self.write_len(tag, ts.len())?;
                for (time, item) in ts.iter() {
                    self.write_date_time(time)?;
                    self.write_record(item)?;
                }
            }
            Payload::DataTable(dt) => {
                self.write_len(tag, dt.columns().len())?;
                for column in dt.columns() {
                    self.write_u8(column.column_type().wire_code())?;
                    self.write_string(column.name())?;
                }
                self.write_len(tag, dt.len())?;
                for row in dt.rows() {
                    for cell in row.iter() {
                        self.write_payload(cell)?;
                    }
                }
            }
            Payload::Object(o) => {
                trace!(class = o.name(), version = o.version(), "Deflating object");
                self.write_string(o.name())?;
                self.write_u32(o.version())?;
                self.write_record(&o.deflate())?;
            }
            Payload::Exception(e) => self.write_exception(e)?,
        }
        Ok(())
    }
}
