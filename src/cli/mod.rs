//! Command-line surface of the `train` binary
//!
//! The platform launches the container as `<image> train` with no further
//! arguments; everything else comes from the fixed directory layout.

use clap::Parser;
use colored::*;
use std::any::Any;
use std::panic::{self, UnwindSafe};
use std::path::PathBuf;

use crate::optimizer::TrialParams;
use crate::pipeline::{TrainingPipeline, TrainingReport};
use crate::platform::{format_failure, write_failure, PlatformPaths, DEFAULT_PREFIX};

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, fit and persist a gradient boosting regressor")]
#[command(long_about = None)]
pub struct Cli {
    /// Launch mode passed by the platform
    #[arg(value_parser = ["train"])]
    pub mode: Option<String>,

    /// Root of the platform directory layout
    #[arg(long, env = "BOOSTFIT_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: PathBuf,

    /// Seed for the hyperparameter sampler
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn paths(&self) -> PlatformPaths {
        PlatformPaths::new(&self.prefix)
    }
}

/// Run the training job and print a summary
pub fn cmd_train(cli: &Cli) -> anyhow::Result<TrainingReport> {
    let mut pipeline = TrainingPipeline::new(cli.paths());
    if let Some(seed) = cli.seed {
        pipeline = pipeline.with_sampler_seed(seed);
    }

    let report = pipeline.run()?;

    section("Train");
    kv("Trials", &report.n_trials.to_string());
    kv("Best params", &format_params(&report.best_params));
    kv("CV R²", &format!("{:.4}", report.best_cv_score));
    kv("Test R²", &format!("{:.4}", report.test_metrics.r2));
    kv("Search time", &format!("{:.3}s", report.search_duration_secs));
    kv("Model", &report.model_path.display().to_string());
    println!();

    Ok(report)
}

/// Run `job`, turning a panic into an error so it reaches the failure handler
pub fn run_guarded<T, F>(job: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + UnwindSafe,
{
    match panic::catch_unwind(job) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Write the failure file and echo it to stderr, returning the report text
pub fn report_failure(paths: &PlatformPaths, err: &anyhow::Error) -> String {
    let report = format_failure(err);
    let path = paths.failure();

    if let Err(write_err) = write_failure(&path, &report) {
        tracing::error!(path = %path.display(), error = %write_err, "Could not write failure file");
    }
    eprintln!("{}", report);

    report
}

fn format_params(params: &TrialParams) -> String {
    let mut names: Vec<&String> = params.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| format!("{}={}", name, params[name]))
        .collect::<Vec<_>>()
        .join(", ")
}
