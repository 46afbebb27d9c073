//! Info command: show the work a configuration implies.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cwdsim_core::artifact::{artifact_file_name, Variable};
use cwdsim_core::config::RunConfig;
use cwdsim_core::scenario;

#[derive(Args)]
pub struct InfoArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let config = RunConfig::from_toml_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let tasks = scenario::enumerate_tasks(&config);

    println!("input root:  {}", config.input_root.display());
    println!("output root: {}", config.output_root.display());
    println!("lapse rate:  {} C/100m", config.lapse_rate);
    println!(
        "windows:     {}",
        if config.summary_windows.is_empty() {
            "none".to_string()
        } else {
            config
                .summary_windows
                .iter()
                .map(|w| w.label())
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!("tuples ({}):", tasks.len());
    for task in &tasks {
        println!("  {} x {}", task.site, task.source.label());
        for var in Variable::ALL {
            println!(
                "    -> {}",
                artifact_file_name(&task.site, &task.source.label(), var)
            );
        }
    }
    Ok(())
}
