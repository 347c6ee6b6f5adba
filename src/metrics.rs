// 📊 Metric Reader
// Loads per-tract health metrics and keeps a single named metric

use crate::error::{MapError, Result};
use crate::tracts::TractId;
use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Cells read as "no value"
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

// ============================================================================
// CORE TYPES
// ============================================================================

/// One row of the metric file that matched the requested metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub id: TractId,
    pub name: String,
    pub value: Option<f64>,
    /// Trimmed value cell text; only read for categorical maps
    pub category: Option<String>,
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    /// Every other column, passed through untouched
    pub extra: BTreeMap<String, String>,
}

impl MetricRecord {
    pub fn new(id: TractId, name: &str, value: Option<f64>) -> Self {
        MetricRecord {
            id,
            name: name.to_string(),
            value,
            category: None,
            line: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Record for a class label rather than a number
    pub fn categorical(id: TractId, name: &str, category: &str) -> Self {
        MetricRecord {
            id,
            name: name.to_string(),
            value: category.trim().parse::<f64>().ok(),
            category: Some(category.trim().to_string()),
            line: 0,
            extra: BTreeMap::new(),
        }
    }
}

/// Where the three columns we need live in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricLayout {
    pub delimiter: char,
    pub id_column: String,
    pub name_column: String,
    pub value_column: String,
}

impl Default for MetricLayout {
    fn default() -> Self {
        MetricLayout {
            delimiter: ',',
            id_column: "geo_fips".to_string(),
            name_column: "metric_name".to_string(),
            value_column: "est".to_string(),
        }
    }
}

// ============================================================================
// READER
// ============================================================================

pub struct MetricReader {
    layout: MetricLayout,
    categorical: bool,
}

impl MetricReader {
    pub fn new(layout: MetricLayout) -> Self {
        MetricReader {
            layout,
            categorical: false,
        }
    }

    /// Accept non-numeric value cells (class labels) instead of failing on them
    pub fn with_categories(mut self) -> Self {
        self.categorical = true;
        self
    }

    pub fn layout(&self) -> &MetricLayout {
        &self.layout
    }

    /// Read the whole file and keep rows whose metric name equals `metric_name` exactly
    pub fn read(&self, path: &Path, metric_name: &str) -> Result<Vec<MetricRecord>> {
        let delimiter = u8::try_from(self.layout.delimiter).map_err(|_| {
            MapError::Config(format!(
                "delimiter {:?} is not a single-byte character",
                self.layout.delimiter
            ))
        })?;

        let file = File::open(path).map_err(|e| MapError::io(path, e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(file);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| decode_field(h).trim().to_string())
            .collect();

        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| MapError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                })
        };
        let id_idx = column(&self.layout.id_column)?;
        let name_idx = column(&self.layout.name_column)?;
        let value_idx = column(&self.layout.value_column)?;

        let mut records = Vec::new();
        let mut total_rows = 0usize;
        let mut row = ByteRecord::new();

        while reader.read_byte_record(&mut row)? {
            total_rows += 1;
            // Quoted fields may span lines, so ask the reader where the record began
            let line = row
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(total_rows + 1);

            let name = decode_field(row.get(name_idx).unwrap_or_default());
            if name != metric_name {
                continue;
            }

            let raw_id = decode_field(row.get(id_idx).unwrap_or_default());
            let id = TractId::parse(&raw_id)?;
            let raw_value = decode_field(row.get(value_idx).unwrap_or_default());
            let value = if self.categorical {
                parse_value(&raw_value, line).ok().flatten()
            } else {
                parse_value(&raw_value, line)?
            };
            let category = Some(raw_value.trim())
                .filter(|c| self.categorical && !MISSING_TOKENS.contains(c))
                .map(str::to_string);

            let extra = headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id_idx && *i != name_idx && *i != value_idx)
                .map(|(i, h)| {
                    let cell = row.get(i).map(decode_field).unwrap_or_default();
                    (h.clone(), cell.into_owned())
                })
                .collect();

            records.push(MetricRecord {
                id,
                name: name.into_owned(),
                value,
                category,
                line,
                extra,
            });
        }

        if records.is_empty() {
            tracing::warn!(
                metric = metric_name,
                rows = total_rows,
                path = %path.display(),
                "no rows matched the requested metric"
            );
        } else {
            tracing::info!(
                metric = metric_name,
                kept = records.len(),
                rows = total_rows,
                "metric rows loaded"
            );
        }

        Ok(records)
    }
}

/// Read `metric_name` rows from a comma-delimited file with the default columns
pub fn get_metric(path: &Path, metric_name: &str) -> Result<Vec<MetricRecord>> {
    MetricReader::new(MetricLayout::default()).read(path, metric_name)
}

/// Empty and NA-style cells are missing, anything else must parse as a number
pub fn parse_value(raw: &str, line: usize) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed) {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MapError::InvalidValue {
            value: raw.to_string(),
            line,
        })
}

/// UTF-8 when valid, Latin-1 otherwise (census files often ship as Latin-1)
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
