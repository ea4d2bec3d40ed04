//! Core data models: [`Record`] and [`Corpus`].
//!
//! A corpus is loaded once and shared read-only (`Arc<Corpus>`). Records
//! share the corpus header through an `Arc<[String]>`, so a record can be
//! handed around on its own and still be looked up by raw column name.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One row of the corpus: raw column name → textual value.
#[derive(Debug, Clone)]
pub struct Record {
    row: usize,
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Record {
    /// Position of this record in its corpus (0-based).
    pub fn row(&self) -> usize {
        self.row
    }

    /// Raw column names, in corpus order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of a raw column. Absent, empty and whitespace-only cells are `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values
            .get(idx)?
            .as_deref()
            .filter(|v| !v.trim().is_empty())
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_deref()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

/// The full, ordered set of records for a session.
#[derive(Debug, Clone)]
pub struct Corpus {
    columns: Arc<[String]>,
    records: Vec<Record>,
}

impl Corpus {
    /// Build a corpus from a header and rows of cells.
    ///
    /// Empty cells become absent values. Short rows are padded with absent
    /// values; cells beyond the header are dropped.
    pub fn new<R>(columns: Vec<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<String>>,
    {
        let columns: Arc<[String]> = columns.into();
        let width = columns.len();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, cells)| {
                let mut values: Vec<Option<String>> = cells
                    .into_iter()
                    .take(width)
                    .map(|c| if c.is_empty() { None } else { Some(c) })
                    .collect();
                values.resize(width, None);
                Record {
                    row,
                    columns: columns.clone(),
                    values,
                }
            })
            .collect();
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at a corpus row position.
    pub fn get(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
