//! CSV loading into dense feature matrices

use crate::error::{ExplainError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// A feature table: named numeric columns, one row per sample.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    names: Vec<String>,
    x: Array2<f64>,
}

impl FeatureTable {
    /// Load a feature table from a CSV file with a header row.
    ///
    /// Every column must be castable to f64; nulls become NaN.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ExplainError::DataError(format!("cannot open {}: {e}", path.display()))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .into_reader_with_file_handle(file)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Build a feature table from an in-memory DataFrame.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() == 0 {
            return Err(ExplainError::DataError(
                "feature table has no columns".to_string(),
            ));
        }

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut x = Array2::zeros((df.height(), df.width()));
        for (j, col) in df.get_columns().iter().enumerate() {
            let series = col.as_materialized_series();
            let casted = series.cast(&DataType::Float64).map_err(|_| {
                ExplainError::DataError(format!("column '{}' is not numeric", series.name()))
            })?;
            let ca = casted
                .f64()
                .map_err(|e| ExplainError::DataError(e.to_string()))?;
            for (i, val) in ca.into_iter().enumerate() {
                x[[i, j]] = val.unwrap_or(f64::NAN);
            }
        }

        Ok(Self { names, x })
    }

    /// Build a feature table from raw parts.
    pub fn from_parts(names: Vec<String>, x: Array2<f64>) -> Result<Self> {
        if names.len() != x.ncols() {
            return Err(ExplainError::ShapeError {
                expected: format!("{} column names", x.ncols()),
                actual: format!("{} column names", names.len()),
            });
        }
        Ok(Self { names, x })
    }

    /// Number of rows (samples).
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The dense feature matrix, rows x features.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.x
    }

    /// A new table containing the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            x: self.x.select(ndarray::Axis(0), indices),
        }
    }
}

/// Load a label vector from a single-column CSV file with a header row.
pub fn load_labels(path: &Path) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|e| {
        ExplainError::DataError(format!("cannot open {}: {e}", path.display()))
    })?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()?;

    let col = df.get_columns().first().ok_or_else(|| {
        ExplainError::DataError("label file has no columns".to_string())
    })?;

    let casted = col
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|_| {
            ExplainError::DataError(format!("label column '{}' is not numeric", col.name()))
        })?;
    let ca = casted
        .f64()
        .map_err(|e| ExplainError::DataError(e.to_string()))?;

    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
