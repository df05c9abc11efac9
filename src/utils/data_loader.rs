//! Data loading utilities
//!
//! Reads a platform input channel: a directory of headerless CSV files that
//! together form one table.

use crate::error::{Result, TrainError};
use ndarray::{s, Array1, Array2};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Concatenated contents of a channel
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Every row of every file, in encounter order
    pub data: Array2<f64>,
    /// Files the rows came from, in encounter order
    pub files: Vec<PathBuf>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Split into features (every column but the last) and label (the last).
    pub fn split_label(&self) -> Result<(Array2<f64>, Array1<f64>)> {
        let n_cols = self.n_cols();
        if n_cols < 2 {
            return Err(TrainError::ValidationError(format!(
                "Training data needs at least one feature column and a label column, found {} column(s)",
                n_cols
            )));
        }

        let x = self.data.slice(s![.., ..n_cols - 1]).to_owned();
        let y = self.data.column(n_cols - 1).to_owned();

        info!(
            features = ?x.shape(),
            label = ?[y.len(), 1],
            "Split training data into features and label"
        );

        Ok((x, y))
    }
}

/// Loader for headerless, comma-separated CSV channels
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load a single headerless CSV file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| TrainError::DataError(format!("Failed to read {}: {}", path.display(), e)))
    }

    /// Regular files directly inside `dir`, sorted by name
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            TrainError::DataError(format!("Cannot read input directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read every file of a channel and stack the rows into one matrix
    pub fn load_channel(&self, dir: &Path, channel: &str) -> Result<Dataset> {
        let start = Instant::now();
        let files = self.list_files(dir)?;

        if files.is_empty() {
            return Err(TrainError::ValidationError(format!(
                "There are no files in {}.\n\
                 This usually indicates that the channel ({}) was incorrectly specified,\n\
                 the data specification for the channel was incorrectly specified or the role specified\n\
                 does not have permission to access the data.",
                dir.display(),
                channel
            )));
        }

        let mut width: Option<usize> = None;
        let mut n_rows = 0usize;
        let mut values: Vec<f64> = Vec::new();

        for path in &files {
            let df = self.load_csv(path)?;

            match width {
                None => width = Some(df.width()),
                Some(w) if w != df.width() => {
                    return Err(TrainError::ValidationError(format!(
                        "{} has {} columns but earlier files in channel {} have {}",
                        path.display(),
                        df.width(),
                        channel,
                        w
                    )));
                }
                Some(_) => {}
            }

            let (file_values, file_rows) = frame_to_rows(&df, path)?;
            debug!(
                file = %path.display(),
                rows = file_rows,
                blank = df.height() - file_rows,
                cols = df.width(),
                "Loaded file"
            );

            n_rows += file_rows;
            values.extend(file_values);
        }

        let n_cols = width.unwrap_or(0);
        let data = Array2::from_shape_vec((n_rows, n_cols), values)?;

        info!(
            channel = channel,
            files = files.len(),
            rows = n_rows,
            cols = n_cols,
            elapsed = ?start.elapsed(),
            "Loaded channel"
        );

        Ok(Dataset { data, files })
    }
}

/// Flatten a frame into row-major `f64` values and return them with the
/// number of rows kept.
///
/// Rows where every cell is null are blank lines and are skipped. Any other
/// missing, non-numeric or non-finite cell is an error naming its 1-based
/// row and column in the file.
fn frame_to_rows(df: &DataFrame, path: &Path) -> Result<(Vec<f64>, usize)> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<Option<f64>>> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| TrainError::DataError(e.to_string()))?;
            Ok(series
                .f64()
                .map_err(|e| TrainError::DataError(e.to_string()))?
                .into_iter()
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(n_rows * n_cols);
    let mut kept = 0;

    for r in 0..n_rows {
        if col_data.iter().all(|col| col[r].is_none()) {
            continue;
        }

        for (c, col) in col_data.iter().enumerate() {
            match col[r] {
                Some(v) if v.is_finite() => rows.push(v),
                Some(v) => {
                    return Err(TrainError::DataError(format!(
                        "{}: non-finite value {} at row {}, column {}",
                        path.display(),
                        v,
                        r + 1,
                        c + 1
                    )));
                }
                None => {
                    return Err(TrainError::DataError(format!(
                        "{}: missing or non-numeric value at row {}, column {}",
                        path.display(),
                        r + 1,
                        c + 1
                    )));
                }
            }
        }
        kept += 1;
    }

    Ok((rows, kept))
}
