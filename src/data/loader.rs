//! CSV Data Loader Module
//! Handles CSV file loading and column normalization using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::data::schema::{self, DatasetSchema};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Missing {role} column '{column}'")]
    MissingColumn { role: &'static str, column: String },
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars.
///
/// `load_frame` is a pure function of (path, schema); the loader only adds
/// caching of the last result, replaced on the next explicit load.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a CSV file and normalize it to the canonical column layout.
    pub fn load_csv(
        &mut self,
        file_path: &Path,
        dataset: &DatasetSchema,
    ) -> Result<&DataFrame, LoaderError> {
        let df = load_frame(file_path, dataset)?;
        self.file_path = Some(file_path.to_path_buf());
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get unique non-null values from a column, sorted.
    pub fn get_unique_values(&self, column: &str) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| unique_values(df, column))
            .unwrap_or_default()
    }

    /// Get the number of rows in the loaded frame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded frame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get file path of the last load.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set the frame directly (used for async loading).
    pub fn set_dataframe(&mut self, df: DataFrame) {
        self.df = Some(df);
    }
}

/// Unique non-null values of a column, sorted.
pub fn unique_values(df: &DataFrame, column: &str) -> Vec<String> {
    df.column(column)
        .ok()
        .and_then(|col| col.unique().ok())
        .map(|unique| {
            let series = unique.as_materialized_series();
            let mut values: Vec<String> = series
                .iter()
                .filter_map(|val| {
                    if val.is_null() {
                        None
                    } else {
                        Some(val.to_string().trim_matches('"').to_string())
                    }
                })
                .collect();
            values.sort();
            values
        })
        .unwrap_or_default()
}

/// Load a delimited file and normalize it: rename mapped headers to their
/// role names, parse the date column, cast coordinates and measures to
/// Float64, and sort ascending by date. The source file is never mutated.
pub fn load_frame(file_path: &Path, dataset: &DatasetSchema) -> Result<DataFrame, LoaderError> {
    if !file_path.is_file() {
        return Err(LoaderError::FileNotFound(file_path.to_path_buf()));
    }

    let start = Instant::now();

    let raw = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .finish()?
        .collect()?;

    // Fail fast on a missing header, before any transform runs.
    let names: Vec<&str> = raw.get_column_names().iter().map(|s| s.as_str()).collect();
    for (role, header) in dataset.required_columns() {
        if !names.contains(&header) {
            return Err(LoaderError::MissingColumn {
                role,
                column: header.to_string(),
            });
        }
    }

    let date_options = StrptimeOptions {
        format: Some(dataset.date_format.as_str().into()),
        strict: true,
        ..Default::default()
    };

    let code_header = dataset
        .entity_code
        .as_deref()
        .unwrap_or(dataset.entity_name.as_str());

    let mut columns: Vec<Expr> = vec![
        col(code_header)
            .cast(DataType::String)
            .alias(schema::COUNTRY_CODE),
        col(dataset.entity_name.as_str())
            .cast(DataType::String)
            .alias(schema::COUNTRY),
        col(dataset.region.as_str())
            .cast(DataType::String)
            .alias(schema::CONTINENT),
        col(dataset.date.as_str())
            .cast(DataType::String)
            .str()
            .to_date(date_options)
            .alias(schema::DATE),
        col(dataset.latitude.as_str())
            .cast(DataType::Float64)
            .alias(schema::LATITUDE),
        col(dataset.longitude.as_str())
            .cast(DataType::Float64)
            .alias(schema::LONGITUDE),
    ];
    for measure in &dataset.measures {
        columns.push(
            col(measure.header.as_str())
                .cast(DataType::Float64)
                .alias(measure.name.as_str()),
        );
    }

    let df = raw
        .lazy()
        .select(columns)
        .sort([schema::DATE], SortMultipleOptions::default())
        .collect()?;

    tracing::debug!(
        "Loaded {} with {} rows x {} cols in {:?}",
        file_path.display(),
        df.height(),
        df.width(),
        start.elapsed()
    );

    Ok(df)
}
