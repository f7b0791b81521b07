//! Delimited-file loading for trip data

use super::{columns, TripRecord};
use crate::error::{Result, TaxiFareError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Options describing the layout of an input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Field separator
    pub delimiter: u8,
    /// Whether the first line names the columns
    pub has_header: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl LoaderOptions {
    /// Set the field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the first line is a header
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// Loader for taxi trip files
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    options: LoaderOptions,
}

impl DataLoader {
    /// Create a loader with the given layout options
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    fn parse_options(&self) -> CsvParseOptions {
        CsvParseOptions::default()
            .with_separator(self.options.delimiter)
            .with_truncate_ragged_lines(false)
    }

    /// Column names exactly as polars reads them off the first line
    fn frame_columns(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|e| TaxiFareError::file_access(path, e))?;
        let frame = CsvReadOptions::default()
            .with_has_header(self.options.has_header)
            .with_n_rows(Some(0))
            .with_infer_schema_length(Some(0))
            .with_parse_options(self.parse_options())
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| TaxiFareError::Schema(format!("{}: {}", path.display(), e)))?;

        Ok(frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect())
    }

    fn canonical_header(&self, frame_columns: &[String]) -> Vec<String> {
        if self.options.has_header {
            return frame_columns
                .iter()
                .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
                .collect();
        }
        (0..frame_columns.len())
            .map(|i| {
                columns::POSITIONAL
                    .get(i)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("column_{}", i + 1))
            })
            .collect()
    }

    /// Column names of a file, without loading its rows.
    ///
    /// Headerless files report the positional layout, truncated or padded
    /// with `column_N` names to the number of fields on the first line.
    pub fn read_header(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        Ok(self.canonical_header(&self.frame_columns(path)?))
    }

    /// Load a file as a lazily converted sequence of records in file order.
    ///
    /// Only the record columns are parsed; any other column is skipped.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<TripRecords> {
        let path = path.as_ref();
        let start = Instant::now();
        let frame_columns = self.frame_columns(path)?;
        let header = self.canonical_header(&frame_columns);
        let position = |canonical: &str| header.iter().position(|h| h == canonical);

        for required in columns::FEATURES {
            if position(required).is_none() {
                return Err(TaxiFareError::Schema(format!(
                    "{} has no '{}' column",
                    path.display(),
                    required
                )));
            }
        }
        let has_label = position(columns::FARE_AMOUNT).is_some();

        let mut schema = Schema::with_capacity(columns::POSITIONAL.len());
        let mut projection = Vec::with_capacity(columns::POSITIONAL.len());
        for canonical in columns::POSITIONAL {
            if let Some(idx) = position(canonical) {
                schema.with_column(frame_columns[idx].as_str().into(), expected_dtype(canonical));
                projection.push(idx);
            }
        }
        projection.sort_unstable();

        let file = File::open(path).map_err(|e| TaxiFareError::file_access(path, e))?;
        let frame = CsvReadOptions::default()
            .with_has_header(self.options.has_header)
            .with_infer_schema_length(Some(0))
            .with_projection(Some(Arc::new(projection)))
            .with_schema_overwrite(Some(Arc::new(schema)))
            .with_parse_options(self.parse_options())
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| {
                TaxiFareError::Schema(format!("{}: {}", path.display(), e))
            })?;

        let column = |canonical: &str| -> Result<Series> {
            let idx = position(canonical)
                .ok_or_else(|| TaxiFareError::ColumnNotFound(canonical.to_string()))?;
            let series = frame
                .column(&frame_columns[idx])?
                .as_materialized_series()
                .clone();
            series
                .strict_cast(&expected_dtype(canonical))
                .map_err(|e| {
                    TaxiFareError::Schema(format!(
                        "{}: column '{}': {}",
                        path.display(),
                        canonical,
                        e
                    ))
                })
        };

        let records = TripRecords {
            source: path.to_path_buf(),
            vendor_id: column(columns::VENDOR_ID)?.str()?.clone(),
            rate_code: column(columns::RATE_CODE)?.str()?.clone(),
            passenger_count: column(columns::PASSENGER_COUNT)?.i64()?.clone(),
            trip_distance: column(columns::TRIP_DISTANCE)?.f64()?.clone(),
            payment_type: column(columns::PAYMENT_TYPE)?.str()?.clone(),
            fare_amount: if has_label {
                Some(column(columns::FARE_AMOUNT)?.f64()?.clone())
            } else {
                None
            },
            first_line: if self.options.has_header { 2 } else { 1 },
            row: 0,
            len: frame.height(),
        };

        info!(
            path = %path.display(),
            rows = records.len,
            labeled = has_label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded trip data"
        );
        debug!(columns = ?header, "File header");

        Ok(records)
    }

    /// Load every record of a file, failing on the first bad row
    pub fn load_all(&self, path: impl AsRef<Path>) -> Result<Vec<TripRecord>> {
        self.load(path)?.collect()
    }
}

fn expected_dtype(column: &str) -> DataType {
    match column {
        columns::PASSENGER_COUNT => DataType::Int64,
        columns::TRIP_DISTANCE | columns::FARE_AMOUNT => DataType::Float64,
        _ => DataType::String,
    }
}

/// Records of a loaded file, converted row by row on iteration.
///
/// Iteration stops after the first row that does not fit the record schema.
pub struct TripRecords {
    source: PathBuf,
    vendor_id: StringChunked,
    rate_code: StringChunked,
    passenger_count: Int64Chunked,
    trip_distance: Float64Chunked,
    payment_type: StringChunked,
    fare_amount: Option<Float64Chunked>,
    first_line: usize,
    row: usize,
    len: usize,
}

impl TripRecords {
    /// Whether the file carried a fare amount column
    pub fn is_labeled(&self) -> bool {
        self.fare_amount.is_some()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn missing(&self, column: &str) -> TaxiFareError {
        TaxiFareError::Schema(format!(
            "{} line {}: missing value for '{}'",
            self.source.display(),
            self.first_line + self.row,
            column
        ))
    }

    fn finite(&self, value: f64, column: &str) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(TaxiFareError::Schema(format!(
                "{} line {}: '{}' is not a finite number ({})",
                self.source.display(),
                self.first_line + self.row,
                column,
                value
            )))
        }
    }

    fn record_at(&self, i: usize) -> Result<TripRecord> {
        let text = |ca: &StringChunked, name: &str| {
            ca.get(i)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| self.missing(name))
        };

        let passengers = self
            .passenger_count
            .get(i)
            .ok_or_else(|| self.missing(columns::PASSENGER_COUNT))?;
        let passenger_count = u32::try_from(passengers).map_err(|_| {
            TaxiFareError::Schema(format!(
                "{} line {}: passenger count {} out of range",
                self.source.display(),
                self.first_line + i,
                passengers
            ))
        })?;

        let fare_amount = match &self.fare_amount {
            Some(ca) => {
                let fare = ca.get(i).ok_or_else(|| self.missing(columns::FARE_AMOUNT))?;
                Some(self.finite(fare, columns::FARE_AMOUNT)?)
            }
            None => None,
        };
        let trip_distance = self
            .trip_distance
            .get(i)
            .ok_or_else(|| self.missing(columns::TRIP_DISTANCE))?;

        Ok(TripRecord {
            vendor_id: text(&self.vendor_id, columns::VENDOR_ID)?,
            rate_code: text(&self.rate_code, columns::RATE_CODE)?,
            passenger_count,
            trip_distance: self.finite(trip_distance, columns::TRIP_DISTANCE)?,
            payment_type: text(&self.payment_type, columns::PAYMENT_TYPE)?,
            fare_amount,
        })
    }
}

impl Iterator for TripRecords {
    type Item = Result<TripRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.len {
            return None;
        }
        let item = self.record_at(self.row);
        if item.is_err() {
            self.row = self.len;
        } else {
            self.row += 1;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.row);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    const HEADER: &str =
        "vendor_id,rate_code,passenger_count,trip_time_in_secs,trip_distance,payment_type,fare_amount\n";

    #[test]
    fn test_load_in_file_order() {
        let file = write_csv(&format!(
            "{}CMT,1,1,1271,3.8,CRD,17.5\nVTS,1,2,474,1.5,CSH,8\nCMT,2,1,637,1.4,CRD,8.5\n",
            HEADER
        ));
        let records = DataLoader::default().load_all(file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].vendor_id, "CMT");
        assert_eq!(records[1].passenger_count, 2);
        assert_eq!(records[2].rate_code, "2");
        assert_eq!(records[0].fare_amount, Some(17.5));
    }

    #[test]
    fn test_load_without_fare_column() {
        let file = write_csv(
            "vendor_id,rate_code,passenger_count,trip_distance,payment_type\nVTS,1,1,10.33,CSH\n",
        );
        let records = DataLoader::default().load(file.path()).unwrap();
        assert!(!records.is_labeled());
        let rows: Vec<TripRecord> = records.collect::<Result<_>>().unwrap();
        assert_eq!(rows[0].fare_amount, None);
        assert_eq!(rows[0].trip_distance, 10.33);
    }

    #[test]
    fn test_load_headerless_semicolon() {
        let file = write_csv("VTS;1;1;2.5;CSH;9.5\nCMT;5;3;0.9;CRD;52\n");
        let loader = DataLoader::new(LoaderOptions::default().with_delimiter(b';').with_header(false));
        let records = loader.load_all(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].rate_code, "5");
        assert_eq!(records[1].fare_amount, Some(52.0));
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let result = DataLoader::default().load("does/not/exist.csv");
        assert!(matches!(result, Err(TaxiFareError::FileAccess { .. })));
    }

    #[test]
    fn test_non_numeric_distance_is_schema_error() {
        let file = write_csv(&format!("{}CMT,1,1,1271,far,CRD,17.5\n", HEADER));
        let result = DataLoader::default().load(file.path());
        assert!(matches!(result, Err(TaxiFareError::Schema(_))));
    }

    #[test]
    fn test_missing_feature_column_is_schema_error() {
        let file = write_csv("vendor_id,rate_code,trip_distance,payment_type\nCMT,1,3.8,CRD\n");
        let result = DataLoader::default().load(file.path());
        assert!(matches!(result, Err(TaxiFareError::Schema(_))));
    }

    #[test]
    fn test_empty_cell_is_schema_error() {
        let file = write_csv(&format!("{}CMT,1,1,1271,3.8,,17.5\n", HEADER));
        let result = DataLoader::default().load_all(file.path());
        assert!(matches!(result, Err(TaxiFareError::Schema(_))));
    }

    #[test]
    fn test_short_row_is_schema_error() {
        let file = write_csv(&format!(
            "{}CMT,1,1,1271,3.8,CRD,17.5\nVTS,1,2,474\n",
            HEADER
        ));
        let result = DataLoader::default().load_all(file.path());
        assert!(matches!(result, Err(TaxiFareError::Schema(_))));
    }

    #[test]
    fn test_unused_column_type_change_is_ignored() {
        let mut content = HEADER.to_string();
        for i in 0..150 {
            content.push_str(&format!("VTS,1,1,{},2.5,CSH,9.5\n", 300 + i));
        }
        content.push_str("CMT,1,2,612.5,3.1,CRD,11\n");
        content.push_str("CMT,1,2,n/a,3.1,CRD,11\n");
        let file = write_csv(&content);

        let records = DataLoader::default().load_all(file.path()).unwrap();
        assert_eq!(records.len(), 152);
        assert_eq!(records[150].trip_distance, 3.1);
        assert_eq!(records[151].fare_amount, Some(11.0));
    }

    #[test]
    fn test_non_finite_values_are_schema_errors() {
        for row in ["CMT,1,1,1271,NaN,CRD,17.5", "CMT,1,1,1271,3.8,CRD,inf"] {
            let file = write_csv(&format!("{}{}\n", HEADER, row));
            let result = DataLoader::default().load_all(file.path());
            assert!(
                matches!(result, Err(TaxiFareError::Schema(_))),
                "row {} was accepted",
                row
            );
        }
    }

    #[test]
    fn test_byte_order_mark_and_quoted_header() {
        let file = write_csv(
            "\u{feff}vendor_id,rate_code,passenger_count,trip_distance,\"payment_type\",fare_amount\n\
             VTS,1,1,10.33,CSH,29.5\n",
        );
        let loader = DataLoader::default();
        let header = loader.read_header(file.path()).unwrap();
        assert_eq!(header[0], "vendor_id");
        assert_eq!(header[4], "payment_type");

        let records = loader.load_all(file.path()).unwrap();
        assert_eq!(records[0].vendor_id, "VTS");
        assert_eq!(records[0].fare_amount, Some(29.5));
    }

    #[test]
    fn test_read_header() {
        let file = write_csv(&format!("{}CMT,1,1,1271,3.8,CRD,17.5\n", HEADER));
        let header = DataLoader::default().read_header(file.path()).unwrap();
        assert_eq!(header.len(), 7);
        assert_eq!(header[3], "trip_time_in_secs");
    }
}
