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

use std::io::Read;

use chrono::NaiveDateTime;
use protean_var::{
    Bag, Buffer, DataTable, DecodingError, Dictionary, ExceptionInfo, FORMAT_MAJOR_VERSION,
    FORMAT_MINOR_VERSION, List, Mapping, ObjectFactory, ObjectHandle, Payload, Str, TimeSeries,
    Tuple, TypedArray, Variant, VariantType, temporal,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::{F32, F64, I32, I64, LittleEndian, U32, U64},
};

use crate::Header;

/// Deepest container nesting a stream may carry.
pub const MAX_NESTING_DEPTH: usize = 128;

/// How the reader treats object records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Rebuild every object as a `ProxyObject`, even when a factory knows the class.
    pub create_proxy: bool,
}

pub struct BinaryReader<'a, R: Read> {
    reader: R,
    options: ReaderOptions,
    factory: Option<&'a dyn ObjectFactory>,
    depth: usize,
    pub major: u16,
    pub minor: u16,
}

impl<'a, R: Read> BinaryReader<'a, R> {
    /// Wrap `reader`, consuming and checking the format header.
    pub fn new(mut reader: R, options: ReaderOptions) -> Result<Self, DecodingError> {
        let header: Header = read_value(&mut reader)?;
        let (major, minor) = (header.major.get(), header.minor.get());
        if major > FORMAT_MAJOR_VERSION {
            return Err(DecodingError::UnsupportedVersion { major, minor });
        }
        if major == FORMAT_MAJOR_VERSION && minor > FORMAT_MINOR_VERSION {
            debug!(major, minor, "Reading a newer minor format version");
        } else {
            debug!(major, minor, "Reading binary variant stream");
        }
        Ok(Self {
            reader,
            options,
            factory: None,
            depth: 0,
            major,
            minor,
        })
    }

    /// Use `factory` to materialize objects whose class it knows.
    pub fn with_factory(mut self, factory: &'a dyn ObjectFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Read the next record.
    pub fn read(&mut self) -> Result<Variant, DecodingError> {
        let tag = self.read_tag()?;
        self.read_payload(tag)
    }
}

fn read_value<T, R>(reader: &mut R) -> Result<T, DecodingError>
where
    T: FromBytes + KnownLayout + Immutable,
    R: Read,
{
    let mut buf = [0u8; 8];
    let size = size_of::<T>();
    let bytes = &mut buf[..size];
    reader.read_exact(bytes).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            DecodingError::CorruptStream(format!("stream ended inside a {size} byte field"))
        }
        _ => DecodingError::Io(e),
    })?;
    T::read_from_bytes(bytes)
        .map_err(|_| DecodingError::CorruptStream(format!("bad {size} byte field")))
}

impl<R: Read> BinaryReader<'_, R> {
    fn read_u8(&mut self) -> Result<u8, DecodingError> {
        read_value::<u8, _>(&mut self.reader)
    }

    fn read_u32(&mut self) -> Result<u32, DecodingError> {
        Ok(read_value::<U32<LittleEndian>, _>(&mut self.reader)?.get())
    }

    fn read_tag(&mut self) -> Result<VariantType, DecodingError> {
        let code = self.read_u8()?;
        VariantType::from_wire_code(code).map_err(|_| DecodingError::UnknownTag(code))
    }

    fn read_count(&mut self) -> Result<usize, DecodingError> {
        Ok(self.read_u32()? as usize)
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, DecodingError> {
        let len = self.read_count()?;
        let mut bytes = Vec::new();
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(DecodingError::CorruptStream(format!(
                "expected {len} bytes, stream held {}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    fn read_string(&mut self) -> Result<String, DecodingError> {
        String::from_utf8(self.read_raw()?)
            .map_err(|e| DecodingError::CorruptStream(format!("string is not UTF-8: {e}")))
    }

    fn read_date_time(&mut self) -> Result<NaiveDateTime, DecodingError> {
        let days = read_value::<I32<LittleEndian>, _>(&mut self.reader)?.get();
        let micros = read_value::<I64<LittleEndian>, _>(&mut self.reader)?.get();
        let date = temporal::date_from_days(days)?;
        Ok(temporal::date_time_from_parts(
            date,
            temporal::time_from_micros(micros),
        )?)
    }

    fn read_object(&mut self) -> Result<ObjectHandle, DecodingError> {
        let name = self.read_string()?;
        let version = self.read_u32()?;
        let params = self.read()?;
        let factory = if self.options.create_proxy {
            None
        } else {
            self.factory
        };
        Ok(ObjectHandle::restore(factory, &name, version, params)?)
    }

    fn read_data_table(&mut self) -> Result<DataTable, DecodingError> {
        let column_count = self.read_count()?;
        let mut table = DataTable::new();
        for _ in 0..column_count {
            let tag = self.read_tag()?;
            let name = self.read_string()?;
            table.add_column(tag, Some(&name))?;
        }
        let tags = table.column_types();
        let row_count = self.read_count()?;
        for _ in 0..row_count {
            let row = tags
                .iter()
                .map(|tag| self.read_payload(*tag))
                .collect::<Result<Vec<_>, _>>()?;
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// The payload of a record whose tag has already been consumed.
    fn read_payload(&mut self, tag: VariantType) -> Result<Variant, DecodingError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(DecodingError::CorruptStream(format!(
                "values nested deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let result = self.decode_payload(tag);
        self.depth -= 1;
        result
    }

    fn decode_payload(&mut self, tag: VariantType) -> Result<Variant, DecodingError> {
        let payload = match tag {
            VariantType::None => Payload::None,
            VariantType::Any => Payload::Any(Str::mk_string(self.read_string()?)),
            VariantType::String => Payload::String(Str::mk_string(self.read_string()?)),
            VariantType::Boolean => Payload::Boolean(self.read_u8()? != 0),
            VariantType::Int32 => {
                Payload::Int32(read_value::<I32<LittleEndian>, _>(&mut self.reader)?.get())
            }
            VariantType::UInt32 => Payload::UInt32(self.read_u32()?),
            VariantType::Int64 => {
                Payload::Int64(read_value::<I64<LittleEndian>, _>(&mut self.reader)?.get())
            }
            VariantType::UInt64 => {
                Payload::UInt64(read_value::<U64<LittleEndian>, _>(&mut self.reader)?.get())
            }
            VariantType::Float => {
                Payload::Float(read_value::<F32<LittleEndian>, _>(&mut self.reader)?.get())
            }
            VariantType::Double => {
                Payload::Double(read_value::<F64<LittleEndian>, _>(&mut self.reader)?.get())
            }
            VariantType::Date => {
                let days = read_value::<I32<LittleEndian>, _>(&mut self.reader)?.get();
                Payload::Date(temporal::date_from_days(days)?)
            }
            VariantType::Time => {
                let micros = read_value::<I64<LittleEndian>, _>(&mut self.reader)?.get();
                Payload::Time(temporal::time_from_micros(micros))
            }
            VariantType::DateTime => Payload::DateTime(self.read_date_time()?),
            VariantType::Buffer => Payload::Buffer(Buffer::from_bytes(self.read_raw()?)),
            VariantType::List => {
                let count = self.read_count()?;
                let list = (0..count)
                    .map(|_| self.read())
                    .collect::<Result<List, _>>()?;
                Payload::List(list)
            }
            VariantType::Tuple => {
                let count = self.read_count()?;
                let values = (0..count)
                    .map(|_| self.read())
                    .collect::<Result<Vec<_>, _>>()?;
                Payload::Tuple(Tuple::from_values(values))
            }
            VariantType::Array => {
                let count = self.read_count()?;
                let element_type = self.read_tag()?;
                let values = (0..count)
                    .map(|_| self.read())
                    .collect::<Result<Vec<_>, _>>()?;
                Payload::Array(TypedArray::from_values(element_type, values)?)
            }
            VariantType::Dictionary => {
                let count = self.read_count()?;
                let mut dict = Dictionary::new();
                for _ in 0..count {
                    let key = self.read_string()?;
                    let value = self.read()?;
                    if dict.has_key(&key) {
                        return Err(DecodingError::CorruptStream(format!(
                            "dictionary key '{key}' appears twice"
                        )));
                    }
                    dict.insert(&key, value)?;
                }
                Payload::Dictionary(dict)
            }
            VariantType::Bag => {
                let count = self.read_count()?;
                let mut bag = Bag::new();
                for _ in 0..count {
                    let key = self.read_string()?;
                    let value = self.read()?;
                    bag.insert(&key, value)?;
                }
                Payload::Bag(bag)
            }
            VariantType::TimeSeries => {
                let count = self.read_count()?;
                let mut series = TimeSeries::new();
                for _ in 0..count {
                    let time = self.read_date_time()?;
                    let value = self.read()?;
                    series.push_back(time, value);
                }
                Payload::TimeSeries(series)
            }
            VariantType::DataTable => Payload::DataTable(Box::new(self.read_data_table()?)),
            VariantType::Object => Payload::Object(self.read_object()?),
            VariantType::Exception => {
                let e = ExceptionInfo::from_parts(
                    self.read_string()?,
                    self.read_string()?,
                    self.read_string()?,
                    self.read_string()?,
                );
                Payload::Exception(Box::new(e))
            }
        };
        Ok(Variant::from_payload(payload))
    }
}
