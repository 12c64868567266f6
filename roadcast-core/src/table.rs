//! Tabular container for one stage of one time series.
//!
//! A [`TimeSeriesTable`] holds a header map, an ordered list of column
//! names and a row-major matrix of `f64`. Each name maps to a group of
//! physical column indices so that vector valued fields (a temperature
//! profile per depth, for instance) live next to scalar ones. Groups
//! partition `[0, physical_width)` contiguously in declaration order.

use crate::error::{DataError, Result};
use crate::schema::{FieldDescriptor, HeaderValue};
use std::collections::BTreeMap;

/// Values of one named column.
#[derive(Debug, PartialEq, Clone)]
pub enum ColumnValues {
    Single(Vec<f64>),
    /// One vector per sub-column, in declared order
    Multi(Vec<Vec<f64>>),
}

impl ColumnValues {
    /// Sub-columns as a list, a single column becoming a list of one.
    pub fn into_columns(self) -> Vec<Vec<f64>> {
        match self {
            ColumnValues::Single(values) => vec![values],
            ColumnValues::Multi(columns) => columns,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct TimeSeriesTable {
    header: BTreeMap<String, HeaderValue>,
    columns: Vec<String>,
    index_groups: Vec<Vec<usize>>,
    /// The first `standard_count` columns come from the schema
    standard_count: usize,
    matrix: Vec<Vec<f64>>,
    read_only: bool,
}

impl TimeSeriesTable {
    /// An empty table without declared columns.
    pub fn new() -> Self {
        TimeSeriesTable::default()
    }

    /// A table whose standard columns follow the given field layout.
    pub fn from_schema(fields: &[FieldDescriptor]) -> Self {
        let mut table = TimeSeriesTable::new();
        for descriptor in fields {
            table.declare(&descriptor.name, descriptor.width.max(1));
        }
        table.standard_count = table.columns.len();
        table
    }

    /// A table with single-width standard columns.
    pub fn with_columns(names: &[&str]) -> Self {
        let mut table = TimeSeriesTable::new();
        for name in names {
            table.declare(name, 1);
        }
        table.standard_count = table.columns.len();
        table
    }

    /// Copy of the header and column layout, without any row.
    pub fn empty_like(&self) -> Self {
        TimeSeriesTable {
            header: self.header.clone(),
            columns: self.columns.clone(),
            index_groups: self.index_groups.clone(),
            standard_count: self.standard_count,
            matrix: Vec::new(),
            read_only: false,
        }
    }

    /// Unlocked deep copy.
    pub fn working_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.read_only = false;
        copy
    }

    fn declare(&mut self, name: &str, width: usize) {
        let next = self.physical_width();
        self.columns.push(name.to_string());
        self.index_groups.push((next..next + width).collect());
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            log::debug!("Refused mutation of a read-only table");
            return Err(DataError::ReadOnly);
        }
        Ok(())
    }

    /// Lock or keep unlocked. Once locked, a table cannot be unlocked.
    pub fn set_readonly(&mut self, read_only: bool) -> Result<()> {
        if self.read_only && !read_only {
            return Err(DataError::ReadOnly);
        }
        self.read_only = read_only;
        Ok(())
    }

    pub fn is_readonly(&self) -> bool {
        self.read_only
    }

    // Header

    pub fn header(&self) -> &BTreeMap<String, HeaderValue> {
        &self.header
    }

    pub fn set_header(&mut self, header: BTreeMap<String, HeaderValue>) -> Result<()> {
        self.ensure_writable()?;
        self.header = header;
        Ok(())
    }

    pub fn set_header_value(&mut self, key: &str, value: HeaderValue) -> Result<()> {
        self.ensure_writable()?;
        self.header.insert(key.to_string(), value);
        Ok(())
    }

    pub fn header_value(&self, key: &str) -> Result<&HeaderValue> {
        self.header
            .get(key)
            .ok_or_else(|| DataError::InvalidHeaderKey {
                key: key.to_string(),
                valid: self.header.keys().cloned().collect(),
            })
    }

    /// Header value as text, `None` when absent.
    pub fn header_text(&self, key: &str) -> Option<String> {
        self.header.get(key).map(|v| match v {
            HeaderValue::Text(s) => s.clone(),
            other => other.format(6),
        })
    }

    /// Numeric header value (real, integer or date).
    pub fn header_real(&self, key: &str) -> Result<f64> {
        match self.header_value(key)? {
            HeaderValue::Real(r) | HeaderValue::Date(r) => Ok(*r),
            HeaderValue::Integer(i) => Ok(*i as f64),
            HeaderValue::Text(s) => s.trim().parse::<f64>().map_err(|_| DataError::HeaderType {
                key: key.to_string(),
                expected: "REAL",
            }),
            _ => Err(DataError::HeaderType {
                key: key.to_string(),
                expected: "REAL",
            }),
        }
    }

    // Layout

    /// Number of named columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of physical matrix columns.
    pub fn physical_width(&self) -> usize {
        self.index_groups
            .last()
            .and_then(|group| group.last())
            .map_or(0, |last| last + 1)
    }

    pub fn row_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn is_standard_column(&self, name: &str) -> bool {
        self.columns[..self.standard_count].iter().any(|c| c == name)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DataError::InvalidColumnName {
                name: name.to_string(),
                valid: self.columns.clone(),
            })
    }

    /// Physical indices of a named column.
    pub fn column_index_group(&self, name: &str) -> Result<&[usize]> {
        let position = self.position(name)?;
        Ok(&self.index_groups[position])
    }

    pub fn is_multi_column(&self, name: &str) -> Result<bool> {
        Ok(self.column_index_group(name)?.len() > 1)
    }

    /// Width of the allocated matrix, the physical width when no row exists.
    fn matrix_width(&self) -> usize {
        self.matrix.first().map_or(self.physical_width(), |row| row.len())
    }

    fn check_bounds(&self, group: &[usize]) -> Result<()> {
        if self.matrix.is_empty() {
            return Ok(());
        }
        let width = self.matrix_width();
        match group.iter().find(|&&index| index >= width) {
            Some(&index) => Err(DataError::OutOfBounds { index, width }),
            None => Ok(()),
        }
    }

    // Matrix

    /// Read access to the rows.
    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Allocate `rows` x `cols` filled with `fill`, replacing any content.
    pub fn init_matrix(&mut self, rows: usize, cols: usize, fill: f64) -> Result<()> {
        self.ensure_writable()?;
        self.matrix = vec![vec![fill; cols]; rows];
        Ok(())
    }

    /// Replace the whole matrix. Rows must share one width.
    pub fn set_matrix(&mut self, matrix: Vec<Vec<f64>>) -> Result<()> {
        self.ensure_writable()?;
        if let Some(first) = matrix.first() {
            let expected = first.len();
            if let Some(row) = matrix.iter().find(|r| r.len() != expected) {
                return Err(DataError::RowWidth {
                    expected,
                    found: row.len(),
                });
            }
        }
        self.matrix = matrix;
        Ok(())
    }

    /// Append one row. `None` entries are stored as NaN.
    pub fn append_row(&mut self, values: &[Option<f64>]) -> Result<()> {
        self.ensure_writable()?;
        let expected = self.matrix_width();
        if values.len() != expected {
            return Err(DataError::RowWidth {
                expected,
                found: values.len(),
            });
        }
        self.matrix
            .push(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect());
        Ok(())
    }

    /// Append a new single-width column at the end of the layout.
    ///
    /// On a table without rows nor columns, the column defines the row count.
    pub fn append_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.append_multi_column(name, vec![values])
    }

    /// Append a composite column made of `columns.len()` sub-columns.
    pub fn append_multi_column(&mut self, name: &str, columns: Vec<Vec<f64>>) -> Result<()> {
        self.ensure_writable()?;
        if self.has_column(name) {
            return Err(DataError::DuplicateColumn(name.to_string()));
        }
        if columns.is_empty() {
            return Err(DataError::ColumnShape {
                name: name.to_string(),
                width: 0,
            });
        }
        let fresh = self.matrix.is_empty() && self.physical_width() == 0;
        let expected = if fresh { columns[0].len() } else { self.matrix.len() };
        if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
            return Err(DataError::LengthMismatch {
                expected,
                found: bad.len(),
            });
        }
        if fresh {
            self.matrix = vec![Vec::with_capacity(columns.len()); expected];
        }
        self.declare(name, columns.len());
        for (i, row) in self.matrix.iter_mut().enumerate() {
            row.extend(columns.iter().map(|c| c[i]));
        }
        Ok(())
    }

    /// Overwrite an existing single-width column.
    pub fn set_column(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.ensure_writable()?;
        let group = self.column_index_group(name)?.to_vec();
        if group.len() != 1 {
            return Err(DataError::ColumnShape {
                name: name.to_string(),
                width: group.len(),
            });
        }
        self.write_group(&group, &[values])
    }

    /// Overwrite an existing composite column, one vector per sub-column.
    pub fn set_multi_column(&mut self, name: &str, columns: &[Vec<f64>]) -> Result<()> {
        self.ensure_writable()?;
        let group = self.column_index_group(name)?.to_vec();
        if group.len() != columns.len() {
            return Err(DataError::ColumnShape {
                name: name.to_string(),
                width: group.len(),
            });
        }
        let slices: Vec<&[f64]> = columns.iter().map(|c| c.as_slice()).collect();
        self.write_group(&group, &slices)
    }

    fn write_group(&mut self, group: &[usize], columns: &[&[f64]]) -> Result<()> {
        self.check_bounds(group)?;
        let expected = self.matrix.len();
        if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
            return Err(DataError::LengthMismatch {
                expected,
                found: bad.len(),
            });
        }
        for (i, row) in self.matrix.iter_mut().enumerate() {
            for (&index, column) in group.iter().zip(columns) {
                row[index] = column[i];
            }
        }
        Ok(())
    }

    /// Copy of the values of a column.
    pub fn get_column(&self, name: &str) -> Result<ColumnValues> {
        let group = self.column_index_group(name)?;
        self.check_bounds(group)?;
        let extract = |index: usize| self.matrix.iter().map(|row| row[index]).collect::<Vec<f64>>();
        if group.len() == 1 {
            Ok(ColumnValues::Single(extract(group[0])))
        } else {
            Ok(ColumnValues::Multi(group.iter().map(|&i| extract(i)).collect()))
        }
    }

    /// Copy of a single-width column.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        match self.get_column(name)? {
            ColumnValues::Single(values) => Ok(values),
            ColumnValues::Multi(columns) => Err(DataError::ColumnShape {
                name: name.to_string(),
                width: columns.len(),
            }),
        }
    }

    /// Sub-columns of any column, a single column giving a list of one.
    pub fn multi_column(&self, name: &str) -> Result<Vec<Vec<f64>>> {
        Ok(self.get_column(name)?.into_columns())
    }

    /// Value of a single-width column at `row`.
    pub fn value(&self, name: &str, row: usize) -> Result<f64> {
        let group = self.column_index_group(name)?;
        self.check_bounds(group)?;
        self.matrix
            .get(row)
            .map(|r| r[group[0]])
            .ok_or(DataError::RowOutOfBounds {
                index: row,
                rows: self.matrix.len(),
            })
    }

    /// Remove the rows at the given positions; fails when nothing would remain.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Result<()> {
        self.ensure_writable()?;
        if indices.is_empty() {
            return Ok(());
        }
        let rows = self.matrix.len();
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&index) = sorted.iter().find(|&&i| i >= rows) {
            return Err(DataError::RowOutOfBounds { index, rows });
        }
        if sorted.len() == rows {
            return Err(DataError::EmptyMatrix);
        }
        for &index in sorted.iter().rev() {
            self.matrix.remove(index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    fn sample() -> TimeSeriesTable {
        let mut table = TimeSeriesTable::with_columns(&["A", "B"]);
        table.append_row(&[Some(1.0), Some(10.0)]).unwrap();
        table.append_row(&[Some(2.0), None]).unwrap();
        table.append_row(&[Some(3.0), Some(30.0)]).unwrap();
        table
    }

    #[test]
    fn test_append_row_replaces_none() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        let b = table.column("B").unwrap();
        assert!(b[1].is_nan());
        assert_eq!(b[2], 30.0);
    }

    #[test]
    fn test_append_row_width_checked() {
        let mut table = sample();
        let err = table.append_row(&[Some(1.0)]).unwrap_err();
        assert_eq!(err, DataError::RowWidth { expected: 2, found: 1 });
    }

    #[test]
    fn test_append_column_length() {
        let mut table = sample();
        table.append_column("C", vec![7.0, 8.0, 9.0]).unwrap();
        assert_eq!(table.column("C").unwrap().len(), table.row_count());
        assert_eq!(table.column_index_group("C").unwrap(), &[2]);
        assert!(!table.is_standard_column("C"));
        assert!(table.is_standard_column("A"));

        let err = table.append_column("D", vec![1.0]).unwrap_err();
        assert_eq!(err, DataError::LengthMismatch { expected: 3, found: 1 });
    }

    #[test]
    fn test_append_column_to_empty_table() {
        let mut table = TimeSeriesTable::new();
        table.append_column("Time", vec![0.0, 30.0, 60.0]).unwrap();
        table.append_column("AT", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.physical_width(), 2);
    }

    #[test]
    fn test_duplicate_column() {
        let mut table = sample();
        let err = table.append_column("A", vec![0.0; 3]).unwrap_err();
        assert_eq!(err, DataError::DuplicateColumn("A".to_string()));
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_multi_column() {
        let mut table = sample();
        table
            .append_multi_column("TL", vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .unwrap();
        table.append_column("Z", vec![0.0; 3]).unwrap();
        assert!(table.is_multi_column("TL").unwrap());
        assert!(!table.is_multi_column("A").unwrap());
        assert_eq!(table.column_index_group("TL").unwrap(), &[2, 3]);
        assert_eq!(table.column_index_group("Z").unwrap(), &[4]);
        match table.get_column("TL").unwrap() {
            ColumnValues::Multi(cols) => {
                assert_eq!(cols[0], vec![1.0, 2.0, 3.0]);
                assert_eq!(cols[1], vec![4.0, 5.0, 6.0]);
            }
            other => panic!("expected multi column, got {:?}", other),
        }
        assert!(table.column("TL").is_err());

        table
            .set_multi_column("TL", &[vec![0.0; 3], vec![9.0; 3]])
            .unwrap();
        assert_eq!(table.multi_column("TL").unwrap()[1], vec![9.0; 3]);
    }

    #[test]
    fn test_get_column_is_a_copy() {
        let table = sample();
        let mut a = table.column("A").unwrap();
        a[0] = 100.0;
        assert_eq!(table.column("A").unwrap()[0], 1.0);
    }

    #[test]
    fn test_set_column() {
        let mut table = sample();
        table.set_column("A", &[5.0, 6.0, 7.0]).unwrap();
        assert_eq!(table.column("A").unwrap(), vec![5.0, 6.0, 7.0]);
        let err = table.set_column("A", &[1.0]).unwrap_err();
        assert_eq!(err, DataError::LengthMismatch { expected: 3, found: 1 });
    }

    #[test]
    fn test_set_column_out_of_bounds() {
        let mut table = TimeSeriesTable::with_columns(&["A", "B", "C"]);
        table.init_matrix(2, 2, f64::NAN).unwrap();
        let err = table.set_column("C", &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, DataError::OutOfBounds { index: 2, width: 2 });
    }

    #[test]
    fn test_invalid_column_name_lists_valid_names() {
        let table = sample();
        let err = table.column_index_group("X").unwrap_err();
        assert!(err.to_string().contains("\"A\""));
        assert!(err.to_string().contains("\"B\""));
    }

    #[test]
    fn test_delete_rows_keeps_order() {
        let mut table = sample();
        table.append_row(&[Some(4.0), Some(40.0)]).unwrap();
        table.delete_rows(&[1]).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("A").unwrap(), vec![1.0, 3.0, 4.0]);
        table.delete_rows(&[2, 0]).unwrap();
        assert_eq!(table.column("A").unwrap(), vec![3.0]);
    }

    #[test]
    fn test_delete_all_rows_fails() {
        let mut table = sample();
        assert_eq!(table.delete_rows(&[0, 1, 2]).unwrap_err(), DataError::EmptyMatrix);
        assert_eq!(table.row_count(), 3);
        assert!(matches!(
            table.delete_rows(&[5]),
            Err(DataError::RowOutOfBounds { index: 5, rows: 3 })
        ));
    }

    #[test]
    fn test_read_only_rejects_every_mutation() {
        // NaN-free so that equality below is meaningful
        let mut table = TimeSeriesTable::with_columns(&["A", "B"]);
        for i in 0..3 {
            table.append_row(&[Some(i as f64), Some(10.0 * i as f64)]).unwrap();
        }
        table.set_readonly(true).unwrap();
        let before = table.clone();

        assert_eq!(table.append_row(&[Some(0.0), Some(0.0)]), Err(DataError::ReadOnly));
        assert_eq!(table.append_column("C", vec![0.0; 3]), Err(DataError::ReadOnly));
        assert_eq!(
            table.append_multi_column("M", vec![vec![0.0; 3], vec![0.0; 3]]),
            Err(DataError::ReadOnly)
        );
        assert_eq!(table.set_column("A", &[0.0; 3]), Err(DataError::ReadOnly));
        assert_eq!(table.set_multi_column("A", &[vec![0.0; 3]]), Err(DataError::ReadOnly));
        assert_eq!(table.delete_rows(&[0]), Err(DataError::ReadOnly));
        assert_eq!(table.init_matrix(1, 1, 0.0), Err(DataError::ReadOnly));
        assert_eq!(table.set_matrix(vec![]), Err(DataError::ReadOnly));
        assert_eq!(
            table.set_header_value("VERSION", HeaderValue::Text("1.0".into())),
            Err(DataError::ReadOnly)
        );
        assert_eq!(table.set_readonly(false), Err(DataError::ReadOnly));

        assert_eq!(table, before);
        assert!(table.is_readonly());
    }

    #[test]
    fn test_from_schema_widths() {
        let fields = vec![
            FieldDescriptor::new("ROADCAST_TIME", FieldKind::Date),
            FieldDescriptor::new("TL", FieldKind::RealList).with_width(3),
            FieldDescriptor::new("RC", FieldKind::Integer),
        ];
        let mut table = TimeSeriesTable::from_schema(&fields);
        assert_eq!(table.physical_width(), 5);
        assert_eq!(table.column_index_group("RC").unwrap(), &[4]);
        table.init_matrix(4, table.physical_width(), f64::NAN).unwrap();
        table.set_column("RC", &[1.0, 2.0, 2.0, 1.0]).unwrap();
        assert_eq!(table.value("RC", 2).unwrap(), 2.0);
        assert!(table.column("ROADCAST_TIME").unwrap()[0].is_nan());
    }

    #[test]
    fn test_header_access() {
        let mut table = sample();
        table
            .set_header_value("LATITUDE", HeaderValue::Real(45.5))
            .unwrap();
        assert_eq!(table.header_real("LATITUDE").unwrap(), 45.5);
        let err = table.header_value("LONGITUDE").unwrap_err();
        assert!(err.to_string().contains("LATITUDE"));
        assert_eq!(table.header_text("LATITUDE").as_deref(), Some("45.500000"));
    }

    #[test]
    fn test_empty_like() {
        let table = sample();
        let empty = table.empty_like();
        assert_eq!(empty.row_count(), 0);
        assert_eq!(empty.column_names(), table.column_names());
    }
}
