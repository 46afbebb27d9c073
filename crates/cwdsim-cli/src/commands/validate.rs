//! Validate command: check a configuration and its inputs without running.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use cwdsim_core::config::RunConfig;
use cwdsim_core::scenario;

#[derive(Args)]
pub struct ValidateArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = RunConfig::from_toml_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let mut missing: Vec<PathBuf> = Vec::new();
    for site in &config.sites {
        let mut terrain = vec![
            config.elevation_path(site),
            config.slope_path(site),
            config.aspect_path(site),
            config.whc_path(site),
        ];
        if let Some(mask) = config.soil_mask_path(site) {
            terrain.push(mask);
        }
        for path in terrain {
            if !path.exists() {
                missing.push(path);
            }
        }
    }
    let tasks = scenario::enumerate_tasks(&config);
    let n_tuples = tasks.len();
    for task in tasks {
        if !task.climate_path.exists() {
            missing.push(task.climate_path);
        }
    }

    if missing.is_empty() {
        info!(
            sites = config.sites.len(),
            tuples = n_tuples,
            "configuration valid, all inputs present"
        );
        Ok(())
    } else {
        for path in &missing {
            warn!(path = %path.display(), "missing input");
        }
        bail!("{} input file(s) missing", missing.len());
    }
}
