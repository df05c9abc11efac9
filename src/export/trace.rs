//! Optimization trace export
//!
//! One CSV row per trial, in trial order:
//! `number,value,datetime_start,datetime_complete,duration,params_<name>...,state`
//! with parameter columns sorted by name.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::error::{Result, TrainError};
use crate::optimizer::{ParameterType, SearchSpace, Study};

/// Build the trial table of a study
pub fn trials_dataframe(study: &Study, search_space: &SearchSpace) -> Result<DataFrame> {
    let trials = &study.trials;

    let mut columns: Vec<Column> = vec![
        Column::new(
            "number".into(),
            trials.iter().map(|t| t.trial_id as i64).collect::<Vec<i64>>(),
        ),
        Column::new("value".into(), trials.iter().map(|t| t.value).collect::<Vec<f64>>()),
        Column::new(
            "datetime_start".into(),
            trials.iter().map(|t| t.datetime_start.to_rfc3339()).collect::<Vec<String>>(),
        ),
        Column::new(
            "datetime_complete".into(),
            trials.iter().map(|t| t.datetime_complete.to_rfc3339()).collect::<Vec<String>>(),
        ),
        Column::new(
            "duration".into(),
            trials.iter().map(|t| t.duration_secs).collect::<Vec<f64>>(),
        ),
    ];

    let mut params: Vec<_> = search_space.parameters().iter().collect();
    params.sort_by(|a, b| a.name.cmp(&b.name));

    for param in params {
        let name = format!("params_{}", param.name);
        let column = match param.param_type {
            ParameterType::Int { .. } => Column::new(
                name.into(),
                trials
                    .iter()
                    .map(|t| t.params.get(&param.name).and_then(|v| v.as_int()))
                    .collect::<Vec<Option<i64>>>(),
            ),
            ParameterType::Float { .. } => Column::new(
                name.into(),
                trials
                    .iter()
                    .map(|t| t.params.get(&param.name).and_then(|v| v.as_float()))
                    .collect::<Vec<Option<f64>>>(),
            ),
        };
        columns.push(column);
    }

    columns.push(Column::new(
        "state".into(),
        trials.iter().map(|t| t.state.as_str()).collect::<Vec<&str>>(),
    ));

    DataFrame::new(columns).map_err(TrainError::from)
}

/// Write the trial table as CSV, creating parent directories
pub fn write_trace(study: &Study, search_space: &SearchSpace, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut df = trials_dataframe(study, search_space)?;
    let mut file = File::create(path)
        .map_err(|e| TrainError::DataError(format!("Failed to create {}: {}", path.display(), e)))?;

    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    Ok(())
}
