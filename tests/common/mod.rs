//! Shared fixtures: a throwaway platform root with config and data

#![allow(dead_code)]

use rand::prelude::*;
use std::fs;
use std::path::Path;

/// Write `input/config/hyperparameters.json`
pub fn write_hyperparameters(root: &Path, json: &str) {
    let dir = root.join("input").join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("hyperparameters.json"), json).unwrap();
}

/// Create `input/data/training` and return its path
pub fn training_dir(root: &Path) -> std::path::PathBuf {
    let dir = root.join("input").join("data").join("training");
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Headerless CSV rows of `n_features` features followed by a label
pub fn regression_csv(n_rows: usize, n_features: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::new();

    for _ in 0..n_rows {
        let features: Vec<f64> = (0..n_features).map(|_| rng.gen::<f64>() * 10.0).collect();
        let label = features
            .iter()
            .enumerate()
            .map(|(j, v)| if j % 2 == 0 { 2.0 * v } else { -v })
            .sum::<f64>()
            + rng.gen::<f64>() * 0.1;

        let mut row: Vec<String> = features.iter().map(|v| format!("{:.6}", v)).collect();
        row.push(format!("{:.6}", label));
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// A complete platform root with a small dataset split over two files
pub fn platform_root(root: &Path, hyperparameters: &str) {
    write_hyperparameters(root, hyperparameters);
    let data = training_dir(root);
    fs::write(data.join("part-0.csv"), regression_csv(40, 3, 1)).unwrap();
    fs::write(data.join("part-1.csv"), regression_csv(30, 3, 2)).unwrap();
}
