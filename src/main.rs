//! boostfit - training container entry point

use boostfit::cli::{cmd_train, report_failure, run_guarded, Cli};
use boostfit::platform::FAILURE_EXIT_CODE;
use clap::Parser;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boostfit=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run_guarded(|| cmd_train(&cli)) {
        report_failure(&cli.paths(), &err);
        std::process::exit(FAILURE_EXIT_CODE);
    }
}
