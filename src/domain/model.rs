use crate::constants::is_missing;
use crate::utils::error::{PredictiveError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// A single document as exported from the source collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

/// Column-named rows of string cells. Empty cells are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(PredictiveError::DataError {
                message: format!(
                    "row has {} cells but table has {} columns",
                    row.len(),
                    self.headers.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builds a table from documents. Columns appear in first-seen key order;
    /// keys listed in `skip` are dropped.
    pub fn from_records(records: &[Record], skip: &[&str]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.data.keys() {
                if !skip.contains(&key.as_str()) && !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.data.get(h).map(cell_from_value).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Non-missing cells of a column.
    pub fn present_values(&self, name: &str) -> Option<Vec<&str>> {
        self.column(name)
            .map(|cells| cells.into_iter().filter(|c| !is_missing(c)).collect())
    }

    /// Non-missing cells parsed as numbers; `None` if any of them is not numeric.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<f64>> {
        self.present_values(name)?
            .into_iter()
            .map(|c| c.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(headers);
        for row in csv_reader.records() {
            let row = row?;
            table.rows.push(row.iter().map(normalise_cell).collect());
        }
        Ok(table)
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.into_inner().map_err(|e| PredictiveError::DataError {
            message: format!("failed to flush CSV buffer: {}", e),
        })
    }

    /// Writes the table as CSV, creating parent directories.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_csv_bytes()?)?;
        Ok(())
    }
}

fn normalise_cell(cell: &str) -> String {
    if is_missing(cell) {
        String::new()
    } else {
        cell.to_string()
    }
}

fn cell_from_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => normalise_cell(s),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
