use std::io::Cursor;

use polars::{io::SerReader, prelude::{CsvReadOptions, CsvReader}};

use crate::error::LoadError;

/// A parsed CSV source with every cell kept as raw text.
///
/// Cells are stored column-major; blank cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTable {
    path: String,
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    height: usize,
}

impl RowTable {
    /// Parse CSV bytes (header row required). Type inference is disabled so
    /// that the metric index decides what counts as numeric.
    pub fn from_csv_bytes(path: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let options = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0));

        let df = CsvReader::new(Cursor::new(bytes))
            .with_options(options)
            .finish()
            .map_err(|e| LoadError::malformed(path, e))?;

        let mut headers = Vec::with_capacity(df.width());
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let values = column.as_materialized_series().str()
                .map_err(|e| LoadError::malformed(path, e))?;
            headers.push(column.name().as_str().trim().to_string());
            columns.push(values.into_iter().map(|cell| cell.map(str::to_string)).collect());
        }

        if headers.is_empty() { return Err(LoadError::malformed(path, "no header row")) }

        Ok(Self { path: path.to_string(), headers, columns, height: df.height() })
    }

    pub fn path(&self) -> &str { &self.path }

    pub fn headers(&self) -> &[String] { &self.headers }

    pub fn len(&self) -> usize { self.height }

    pub fn is_empty(&self) -> bool { self.height == 0 }

    pub fn has_column(&self, header: &str) -> bool { self.headers.iter().any(|h| h == header) }

    /// All cells of a column, top to bottom.
    pub fn column(&self, header: &str) -> Option<&[Option<String>]> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(&self.columns[idx])
    }

    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        self.column(header)?.get(row)?.as_deref()
    }
}
