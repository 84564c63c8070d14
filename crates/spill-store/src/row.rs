//! In-memory row and batch model.
//!
//! The query engine owns the real columnar batch representation; this module
//! is the minimal row-oriented interface the spill store exchanges with it.
//! Column kinds are a tagged enum so the codec can dispatch without type
//! inheritance or per-record schema information.

use std::sync::Arc;

/// Column type descriptor, fixed for the lifetime of a spill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit signed integer, stored as 8 fixed bytes.
    Int64,
    /// 64-bit float, stored as 8 fixed bytes.
    Float64,
    /// Variable-length byte string.
    Bytes,
    /// Variable-length UTF-8 string.
    String,
    /// Semi-structured JSON value.
    Json,
}

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// SQL NULL; valid in any column.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// JSON document.
    Json(serde_json::Value),
}

impl Datum {
    /// Whether this datum can be stored in a column of type `ty`.
    ///
    /// NULL is valid in every column.
    #[must_use]
    pub fn matches(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (Datum::Null, _)
                | (Datum::Int64(_), FieldType::Int64)
                | (Datum::Float64(_), FieldType::Float64)
                | (Datum::Bytes(_), FieldType::Bytes)
                | (Datum::String(_), FieldType::String)
                | (Datum::Json(_), FieldType::Json)
        )
    }

    /// Whether this datum is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

/// An owned, immutable row returned by lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    datums: Vec<Datum>,
}

impl Row {
    pub(crate) fn new(datums: Vec<Datum>) -> Self {
        Self { datums }
    }

    /// The datum in column `col`, or `None` when `col` is out of range.
    #[must_use]
    pub fn get(&self, col: usize) -> Option<&Datum> {
        self.datums.get(col)
    }

    /// All datums of this row, in column order.
    #[must_use]
    pub fn datums(&self) -> &[Datum] {
        &self.datums
    }

    /// Number of columns in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datums.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datums.is_empty()
    }
}

/// A batch of rows sharing one schema.
#[derive(Debug, Clone)]
pub struct RowBatch {
    fields: Arc<[FieldType]>,
    rows: Vec<Vec<Datum>>,
}

impl RowBatch {
    /// Creates an empty batch over `fields`.
    #[must_use]
    pub fn new(fields: Arc<[FieldType]>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    /// Appends a row to the batch.
    ///
    /// # Panics
    ///
    /// Panics if the row arity differs from the schema, or if a datum does
    /// not match its column type.
    pub fn push(&mut self, row: Vec<Datum>) {
        assert_eq!(
            row.len(),
            self.fields.len(),
            "row arity {} does not match schema arity {}",
            row.len(),
            self.fields.len()
        );
        for (col, (datum, ty)) in row.iter().zip(self.fields.iter()).enumerate() {
            assert!(
                datum.matches(*ty),
                "datum {datum:?} does not match type {ty:?} of column {col}"
            );
        }
        self.rows.push(row);
    }

    /// The schema shared by all rows of this batch.
    #[must_use]
    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Number of rows in the batch.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `idx`, or `None` when out of range.
    #[must_use]
    pub fn row(&self, idx: usize) -> Option<&[Datum]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Iterates over the rows of the batch in append order.
    pub fn rows(&self) -> impl Iterator<Item = &[Datum]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
