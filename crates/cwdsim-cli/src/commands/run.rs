//! Run command: execute a full batch configuration.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use cwdsim_core::config::RunConfig;
use cwdsim_core::scenario;

#[derive(Args)]
pub struct RunArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override the configured concurrent tuple limit
    #[arg(long)]
    pub max_parallel: Option<usize>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::from_toml_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(n) = args.max_parallel {
        config = config.with_max_parallel(n);
    }

    let started = Instant::now();
    let report = scenario::run_all(&config).context("batch run")?;

    for outcome in &report.completed {
        info!(
            site = %outcome.site,
            source = %outcome.source.label(),
            years = outcome.years.len(),
            artifacts = outcome.artifacts.len(),
            "tuple completed"
        );
    }
    for failure in &report.failed {
        warn!(
            site = %failure.site,
            source = %failure.source.label(),
            error = %failure.error,
            "tuple failed"
        );
    }
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        ensembles = report.ensembles.len(),
        elapsed = ?started.elapsed(),
        "run finished"
    );

    if report.completed.is_empty() && !report.failed.is_empty() {
        bail!("every tuple failed; see the log above");
    }
    Ok(())
}
