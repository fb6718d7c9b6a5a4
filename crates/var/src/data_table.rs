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

//! Columnar tables with a fixed, primitive-typed schema.
//!
//! A table starts with no columns. Columns may be added until the first row is pushed, after
//! which the schema is locked for good, even if every row is later removed. Every pushed row
//! must match the schema exactly in arity and per-column tag; a mismatched row leaves the table
//! untouched.

use crate::{
    Cursor, CursorMut, ElementMut, Error, Item, ItemMut, Payload, RowType, Tuple, TypeMask,
    Variant, VariantType,
    error::ErrorCode::{RangeError, SchemaError, TypeError},
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

pub const MAX_COLUMNS: usize = 50;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Column {
    name: String,
    column_type: VariantType,
    values: Vec<Variant>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> VariantType {
        self.column_type
    }

    pub fn values(&self) -> &[Variant] {
        &self.values
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TableState {
    /// No columns yet.
    Unsized,
    /// Columns defined, no rows: more columns may still be added.
    SchemaOpen,
    /// A row has been pushed: the schema is locked.
    SchemaClosed,
}

#[derive(Clone, Default)]
pub struct DataTable {
    columns: Vec<Column>,
    rows: usize,
    capacity: usize,
    schema_closed: bool,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table whose columns will reserve room for `rows` rows.
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            capacity: rows,
            ..Default::default()
        }
    }

    pub fn state(&self) -> TableState {
        if self.columns.is_empty() {
            TableState::Unsized
        } else if self.schema_closed {
            TableState::SchemaClosed
        } else {
            TableState::SchemaOpen
        }
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_types(&self) -> Vec<VariantType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    pub fn column(&self, index: usize) -> Result<&Column, Error> {
        self.columns.get(index).ok_or_else(|| {
            RangeError.with_msg(|| {
                format!("Column {index} is out of range for DataTable with {} columns", self.columns.len())
            })
        })
    }

    /// Append a column. `name` defaults to `Column<N>` where N is the new column's index.
    pub fn add_column(
        &mut self,
        column_type: VariantType,
        name: Option<&str>,
    ) -> Result<&mut Self, Error> {
        if !column_type.is(TypeMask::PRIMITIVE) {
            return Err(TypeError
                .with_msg(|| format!("DataTable column type must be primitive, got {column_type}")));
        }
        if self.schema_closed {
            return Err(SchemaError.with_msg(|| {
                format!(
                    "Cannot add a column to a DataTable whose schema closed with its first row ({} columns)",
                    self.columns.len()
                )
            }));
        }
        if self.columns.len() >= MAX_COLUMNS {
            return Err(SchemaError
                .with_msg(|| format!("DataTable cannot have more than {MAX_COLUMNS} columns")));
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("Column{}", self.columns.len()),
        };
        self.columns.push(Column {
            name,
            column_type,
            values: Vec::with_capacity(self.capacity),
        });
        Ok(self)
    }

    fn check_row(&self, row: &[Variant]) -> Result<(), Error> {
        if self.columns.is_empty() {
            return Err(SchemaError.msg("Cannot push a row into a DataTable with no columns"));
        }
        if row.len() != self.columns.len() {
            return Err(SchemaError.with_msg(|| {
                format!(
                    "Row has {} values but DataTable has {} columns",
                    row.len(),
                    self.columns.len()
                )
            }));
        }
        for (i, (c, v)) in self.columns.iter().zip(row).enumerate() {
            if v.variant_type() != c.column_type {
                return Err(SchemaError.with_msg(|| {
                    format!(
                        "Row value {i} is {} but column '{}' is {}",
                        v.variant_type(),
                        c.name,
                        c.column_type
                    )
                }));
            }
        }
        Ok(())
    }

    pub fn push_row(&mut self, row: Vec<Variant>) -> Result<(), Error> {
        self.check_row(&row)?;
        for (c, v) in self.columns.iter_mut().zip(row) {
            c.values.push(v);
        }
        self.rows += 1;
        self.schema_closed = true;
        Ok(())
    }

    pub fn pop_row(&mut self) -> Result<Tuple, Error> {
        if self.rows == 0 {
            return Err(RangeError.msg("Attempt to pop from empty DataTable"));
        }
        let values: Vec<Variant> = self
            .columns
            .iter_mut()
            .map(|c| c.values.pop().unwrap_or_default())
            .collect();
        self.rows -= 1;
        Ok(Tuple::from_values(values))
    }

    /// Drop every row. The columns stay, and the schema stays closed if it was.
    pub fn clear(&mut self) {
        for c in self.columns.iter_mut() {
            c.values.clear();
        }
        self.rows = 0;
    }

    pub fn row(&self, index: usize) -> Result<Tuple, Error> {
        if index >= self.rows {
            return Err(self.row_out_of_range(index));
        }
        Ok(self.row_unchecked(index))
    }

    fn row_unchecked(&self, index: usize) -> Tuple {
        self.columns.iter().map(|c| c.values[index].clone()).collect()
    }

    fn row_out_of_range(&self, index: usize) -> Error {
        RangeError.with_msg(|| {
            format!("Row {index} is out of range for DataTable of {} rows", self.rows)
        })
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&Variant, Error> {
        let c = self.column(column)?;
        c.values.get(row).ok_or_else(|| self.row_out_of_range(row))
    }

    /// Replace one cell; the value must carry the column's tag.
    pub fn set_cell(&mut self, row: usize, column: usize, value: Variant) -> Result<(), Error> {
        let rows = self.rows;
        let c = self.column(column)?;
        if value.variant_type() != c.column_type {
            return Err(SchemaError.with_msg(|| {
                format!(
                    "Cannot store {} in column '{}' of type {}",
                    value.variant_type(),
                    c.name,
                    c.column_type
                )
            }));
        }
        let slot = self.columns[column].values.get_mut(row).ok_or_else(|| {
            RangeError.with_msg(|| format!("Row {row} is out of range for DataTable of {rows} rows"))
        })?;
        *slot = value;
        Ok(())
    }

    /// Every row as an owned tuple.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = Tuple> + '_ {
        (0..self.rows).map(|i| self.row_unchecked(i))
    }

    /// Rows read as `T`, which must name a prefix of the schema.
    pub fn rows_as<T: RowType>(
        &self,
    ) -> Result<impl DoubleEndedIterator<Item = Result<T, Error>> + '_, Error> {
        let wanted = T::column_types();
        let have = self.column_types();
        if wanted.len() > have.len() || wanted[..] != have[..wanted.len()] {
            return Err(TypeError.with_msg(|| {
                format!("Requested row types {wanted:?} do not match DataTable columns {have:?}")
            }));
        }
        let width = wanted.len();
        Ok((0..self.rows).map(move |i| {
            let cells: Vec<&Variant> = self.columns[..width].iter().map(|c| &c.values[i]).collect();
            T::from_row(&cells)
        }))
    }

    /// Rows as owned `Tuple` variants. Items carry neither key nor time.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.rows().map(|t| Item::owned(Variant::from(t))))
    }

    /// Writable rows, in order.
    pub fn rows_mut(&mut self) -> impl DoubleEndedIterator<Item = RowMut<'_>> + '_ {
        RowsMut {
            columns: self
                .columns
                .iter_mut()
                .map(|c| (c.column_type, c.values.iter_mut()))
                .collect(),
            remaining: self.rows,
        }
    }

    pub fn cursor_mut(&mut self) -> CursorMut<'_> {
        CursorMut::new(self.rows_mut().map(ItemMut::row))
    }
}

/// One row of a table, writable cell by cell. Cells only accept their column's tag.
pub struct RowMut<'a> {
    cells: Vec<ElementMut<'a>>,
}

impl<'a> RowMut<'a> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: usize) -> Result<&Variant, Error> {
        self.cells
            .get(column)
            .map(|c| c.get())
            .ok_or_else(|| self.out_of_range(column))
    }

    pub fn cell_mut(&mut self, column: usize) -> Result<&mut ElementMut<'a>, Error> {
        let len = self.cells.len();
        self.cells.get_mut(column).ok_or_else(|| {
            RangeError.with_msg(|| format!("Column {column} is out of range for a row of {len} cells"))
        })
    }

    pub fn set(&mut self, column: usize, value: Variant) -> Result<(), Error> {
        self.cell_mut(column)?.set(value)
    }

    pub fn to_tuple(&self) -> Tuple {
        self.cells.iter().map(|c| c.get().clone()).collect()
    }

    /// Overwrite the whole row from a Tuple or List. Nothing is written unless every cell fits.
    pub fn assign(&mut self, row: Variant) -> Result<(), Error> {
        let values: Vec<Variant> = match row.into_payload() {
            Payload::Tuple(t) => t.iter().cloned().collect(),
            Payload::List(l) => l.iter().cloned().collect(),
            other => {
                return Err(TypeError.with_msg(|| {
                    format!("DataTable rows must be Tuple or List, got {}", other.variant_type())
                }));
            }
        };
        if values.len() != self.cells.len() {
            return Err(SchemaError.with_msg(|| {
                format!(
                    "Row has {} values but DataTable has {} columns",
                    values.len(),
                    self.cells.len()
                )
            }));
        }
        for (cell, v) in self.cells.iter().zip(&values) {
            cell.check(v)?;
        }
        for (cell, v) in self.cells.iter_mut().zip(values) {
            cell.set(v)?;
        }
        Ok(())
    }

    fn out_of_range(&self, column: usize) -> Error {
        RangeError.with_msg(|| {
            format!("Column {column} is out of range for a row of {} cells", self.cells.len())
        })
    }
}

struct RowsMut<'a> {
    columns: Vec<(VariantType, std::slice::IterMut<'a, Variant>)>,
    remaining: usize,
}

impl<'a> RowsMut<'a> {
    fn take_row<F>(&mut self, mut step: F) -> Option<RowMut<'a>>
    where
        F: FnMut(&mut std::slice::IterMut<'a, Variant>) -> Option<&'a mut Variant>,
    {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let cells = self
            .columns
            .iter_mut()
            .map(|(tag, values)| step(values).map(|v| ElementMut::typed(v, *tag, SchemaError)))
            .collect::<Option<Vec<_>>>()?;
        Some(RowMut { cells })
    }
}

impl<'a> Iterator for RowsMut<'a> {
    type Item = RowMut<'a>;

    fn next(&mut self) -> Option<RowMut<'a>> {
        self.take_row(|values| values.next())
    }
}

impl DoubleEndedIterator for RowsMut<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.take_row(|values| values.next_back())
    }
}

impl Debug for DataTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.column_types())
            .field("rows", &self.rows)
            .finish()
    }
}

impl PartialEq for DataTable {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for DataTable {}

impl PartialOrd for DataTable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataTable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rows
            .cmp(&other.rows)
            .then_with(|| self.columns.len().cmp(&other.columns.len()))
            .then_with(|| self.columns.cmp(&other.columns))
    }
}

impl Hash for DataTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.columns.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{temporal::parse_date_time, v_date_time, v_double, v_int32, v_str, Sequence};
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn sample() -> DataTable {
        let mut dt = DataTable::new();
        dt.add_column(VariantType::DateTime, None)
            .unwrap()
            .add_column(VariantType::Int32, None)
            .unwrap()
            .add_column(VariantType::Double, Some("price"))
            .unwrap();
        dt
    }

    fn row(t: &str, i: i32, d: f64) -> Vec<Variant> {
        vec![v_date_time(parse_date_time(t).unwrap()), v_int32(i), v_double(d)]
    }

    #[test]
    fn test_schema_locks_after_first_row() {
        let mut dt = sample();
        assert_eq!(dt.state(), TableState::SchemaOpen);
        assert_eq!(dt.columns()[0].name(), "Column0");
        assert_eq!(dt.columns()[2].name(), "price");
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        assert_eq!(dt.state(), TableState::SchemaClosed);
        let e = dt.add_column(VariantType::String, None).unwrap_err();
        assert_eq!(e.code, SchemaError);
        assert_eq!(dt.columns().len(), 3);
    }

    #[test]
    fn test_schema_stays_closed_after_rows_are_removed() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        dt.pop_row().unwrap();
        assert!(dt.is_empty());
        assert_eq!(dt.state(), TableState::SchemaClosed);
        assert_eq!(dt.add_column(VariantType::String, None).unwrap_err().code, SchemaError);

        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        dt.clear();
        assert_eq!(dt.add_column(VariantType::Double, None).unwrap_err().code, SchemaError);
        assert_eq!(dt.columns().len(), 3);
        dt.push_row(row("2002-01-20T10:00:00", 7, 1.0)).unwrap();
    }

    #[test]
    fn test_rows_mut_writes_cells_in_place() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        dt.push_row(row("2002-01-20T10:00:00", 666, 2.718)).unwrap();

        for mut r in dt.rows_mut() {
            assert_eq!(r.len(), 3);
            r.set(1, v_int32(1729)).unwrap();
            assert_eq!(r.set(1, v_str("no")).unwrap_err().code, SchemaError);
        }
        assert_eq!(dt.cell(0, 1).unwrap(), &v_int32(1729));
        assert_eq!(dt.cell(1, 1).unwrap(), &v_int32(1729));

        let mut last = dt.rows_mut().next_back().unwrap();
        assert_eq!(last.get(2).unwrap(), &v_double(2.718));
        let before = last.to_tuple();
        let bad = Variant::from(Tuple::from_values(vec![v_int32(0); 3]));
        assert_eq!(last.assign(bad).unwrap_err().code, SchemaError);
        assert_eq!(last.to_tuple(), before);
        assert_eq!(last.get(3).unwrap_err().code, RangeError);
    }

    #[test]
    fn test_mismatched_rows_leave_table_unchanged() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        let before = dt.clone();
        assert_eq!(dt.push_row(vec![v_str("Incompatible columns")]).unwrap_err().code, SchemaError);
        assert_eq!(
            dt.push_row(vec![v_int32(1), v_int32(2), v_double(3.0)]).unwrap_err().code,
            SchemaError
        );
        assert_eq!(dt, before);
        assert_eq!(dt.len(), 1);
    }

    #[test]
    fn test_non_primitive_columns_rejected() {
        let mut dt = DataTable::new();
        assert_eq!(dt.state(), TableState::Unsized);
        for t in [VariantType::Dictionary, VariantType::DataTable, VariantType::List] {
            assert_eq!(dt.add_column(t, None).unwrap_err().code, TypeError);
        }
        assert_eq!(dt.push_row(vec![]).unwrap_err().code, SchemaError);
    }

    #[test]
    fn test_column_limit() {
        let mut dt = DataTable::new();
        for _ in 0..MAX_COLUMNS {
            dt.add_column(VariantType::Int32, None).unwrap();
        }
        assert_eq!(dt.add_column(VariantType::Int32, None).unwrap_err().code, SchemaError);
    }

    #[test]
    fn test_typed_rows_match_schema_prefix() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        dt.push_row(row("2002-01-20T10:00:00", 666, 2.718)).unwrap();

        let rows: Vec<(NaiveDateTime, i32, f64)> =
            dt.rows_as().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[1].1, 666);
        assert_eq!(rows[0].2, 3.141);

        let prefix: Vec<(NaiveDateTime,)> = dt.rows_as().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(prefix.len(), 2);

        assert_eq!(dt.rows_as::<(String,)>().err().unwrap().code, TypeError);
        assert_eq!(dt.rows_as::<(NaiveDateTime, i32, f64, i32)>().err().unwrap().code, TypeError);

        let last: (NaiveDateTime, i32) = dt.rows_as().unwrap().next_back().unwrap().unwrap();
        assert_eq!(last.1, 666);
    }

    #[test]
    fn test_set_cell_is_type_checked() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 666, 2.718)).unwrap();
        dt.set_cell(0, 1, v_int32(1729)).unwrap();
        assert_eq!(dt.cell(0, 1).unwrap(), &v_int32(1729));
        assert_eq!(dt.set_cell(0, 1, v_double(1.0)).unwrap_err().code, SchemaError);
        assert_eq!(dt.set_cell(5, 1, v_int32(1)).unwrap_err().code, RangeError);
        assert_eq!(dt.set_cell(0, 9, v_int32(1)).unwrap_err().code, RangeError);
    }

    #[test]
    fn test_generic_cursor_yields_tuples() {
        let mut dt = sample();
        dt.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        let item = dt.cursor().next().unwrap();
        assert!(item.key().is_err());
        assert!(item.time().is_err());
        let v = item.into_value();
        assert_eq!(v.variant_type(), VariantType::Tuple);
        let Some(t) = v.as_tuple() else { panic!("expected tuple") };
        assert_eq!(t.at(1).unwrap(), &v_int32(42));
    }

    #[test]
    fn test_tables_compare_by_rows_then_schema() {
        let mut a = sample();
        let b = sample();
        assert_eq!(a, b);
        a.push_row(row("2002-01-20T09:00:00", 42, 3.141)).unwrap();
        assert!(a > b);
        assert_eq!(a.pop_row().unwrap().len(), 3);
        assert_eq!(a, b);
        assert_eq!(a.pop_row().unwrap_err().code, RangeError);
    }
}
