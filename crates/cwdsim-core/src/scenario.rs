//! Scenario orchestration.
//!
//! Enumerates the cross-product of sites and climate sources (the historical
//! record plus every GCM/scenario pair) and executes one independent engine
//! run per tuple on a bounded rayon pool. Terrain is assembled once per site
//! and shared read-only. A failed
//! tuple is recorded and never blocks, corrupts or retries the others; the
//! orchestrator itself does no numerical work beyond delegating to the
//! aggregator for summary artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{self, YearWindow};
use crate::artifact::{RasterArtifact, Variable};
use crate::config::{RunConfig, SiteConfig};
use crate::error::{EngineError, EngineResult};
use crate::forcing::ClimateSeries;
use crate::raster::Raster;
use crate::terrain::{SiteMeta, TerrainGrid};
use crate::waterbalance::grid::{run_grid, GridAnnualOutput};

/// One climate source: the observed record or one model projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateSource {
    Historical,
    Projection { gcm: String, scenario: String },
}

impl ClimateSource {
    /// Stable label used in file names and reports.
    pub fn label(&self) -> String {
        match self {
            ClimateSource::Historical => "historical".to_string(),
            ClimateSource::Projection { gcm, scenario } => format!("{gcm}_{scenario}"),
        }
    }
}

/// One unit of work: a (site, climate-source) tuple.
#[derive(Debug, Clone)]
pub struct ScenarioTask {
    /// Index into `RunConfig::sites`.
    pub site_index: usize,
    pub site: String,
    pub source: ClimateSource,
    pub climate_path: PathBuf,
}

/// Full cross-product of configured sites and climate sources.
pub fn enumerate_tasks(config: &RunConfig) -> Vec<ScenarioTask> {
    let mut tasks = Vec::new();
    for (site_index, site) in config.sites.iter().enumerate() {
        let mut sources = Vec::new();
        if config.include_historical {
            sources.push(ClimateSource::Historical);
        }
        for gcm in &config.gcms {
            for scenario in &config.scenarios {
                sources.push(ClimateSource::Projection {
                    gcm: gcm.clone(),
                    scenario: scenario.clone(),
                });
            }
        }
        for source in sources {
            tasks.push(ScenarioTask {
                site_index,
                site: site.name.clone(),
                climate_path: config.climate_path(site, &source),
                source,
            });
        }
    }
    tasks
}

/// Multi-year mean surfaces for one summary window of one run.
#[derive(Debug)]
pub struct WindowMeans {
    pub window: YearWindow,
    pub aet: Raster,
    pub cwd: Raster,
}

/// A completed tuple: where its artifacts went and what it simulated.
#[derive(Debug)]
pub struct TaskOutcome {
    pub site: String,
    pub source: ClimateSource,
    pub years: Vec<i32>,
    pub artifacts: Vec<PathBuf>,
    pub window_means: Vec<WindowMeans>,
}

/// A failed tuple, with the error rendered for the report.
#[derive(Debug)]
pub struct TaskFailure {
    pub site: String,
    pub source: ClimateSource,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<TaskOutcome>,
    pub failed: Vec<TaskFailure>,
    /// Cross-model summary artifacts written after the fan-out.
    pub ensembles: Vec<PathBuf>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Execute every tuple and write artifacts under `config.output_root`.
pub fn run_all(config: &RunConfig) -> EngineResult<RunReport> {
    config.validate()?;
    fs::create_dir_all(&config.output_root)
        .map_err(|e| EngineError::io(&config.output_root, e))?;

    // Terrain once per site; a site whose terrain fails to load fails all
    // of that site's tuples but nothing else.
    let terrains: Vec<EngineResult<TerrainGrid>> =
        config.sites.iter().map(|s| load_terrain(config, s)).collect();

    let tasks = enumerate_tasks(config);
    info!(tasks = tasks.len(), sites = config.sites.len(), "starting batch run");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallel)
        .build()
        .map_err(|e| EngineError::config(format!("worker pool: {e}")))?;

    let results: Vec<Result<TaskOutcome, TaskFailure>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| match &terrains[task.site_index] {
                Ok(terrain) => run_task(config, task, terrain),
                Err(e) => Err(fail(task, format!("terrain: {e}"))),
            })
            .collect()
    });

    let mut report = RunReport::default();
    for r in results {
        match r {
            Ok(outcome) => report.completed.push(outcome),
            Err(failure) => {
                warn!(
                    site = %failure.site,
                    source = %failure.source.label(),
                    error = %failure.error,
                    "tuple failed"
                );
                report.failed.push(failure);
            }
        }
    }

    write_ensembles(config, &mut report)?;

    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "batch run finished"
    );
    Ok(report)
}

fn fail(task: &ScenarioTask, error: String) -> TaskFailure {
    TaskFailure {
        site: task.site.clone(),
        source: task.source.clone(),
        error,
    }
}

fn load_terrain(config: &RunConfig, site: &SiteConfig) -> EngineResult<TerrainGrid> {
    let elevation = Raster::from_ascii_grid_path(&config.elevation_path(site))?;
    let slope = Raster::from_ascii_grid_path(&config.slope_path(site))?;
    let aspect = Raster::from_ascii_grid_path(&config.aspect_path(site))?;
    let whc = Raster::from_ascii_grid_path(&config.whc_path(site))?;
    let mask = match config.soil_mask_path(site) {
        Some(path) => Some(Raster::from_ascii_grid_path(&path)?),
        None => None,
    };
    TerrainGrid::assemble(
        &elevation,
        &slope,
        &aspect,
        &whc,
        mask.as_ref(),
        site.latitude_deg,
    )
}

fn run_task(
    config: &RunConfig,
    task: &ScenarioTask,
    terrain: &TerrainGrid,
) -> Result<TaskOutcome, TaskFailure> {
    let site_cfg = &config.sites[task.site_index];
    let label = task.source.label();
    info!(site = %task.site, source = %label, "tuple started");

    let run = || -> EngineResult<TaskOutcome> {
        let series = ClimateSeries::from_csv_path(&task.climate_path)?;
        let daily = series.disaggregate_to_daily()?;

        let meta = SiteMeta {
            name: site_cfg.name.clone(),
            latitude_deg: site_cfg.latitude_deg,
            station_elevation_m: site_cfg.station_elevation_m,
        };
        let output = run_grid(terrain, &meta, &daily, config.lapse_rate)?;

        let mut artifacts = Vec::new();
        write_annual(config, task, &output, &mut artifacts)?;
        let window_means = write_windows(config, task, &output, &mut artifacts)?;

        Ok(TaskOutcome {
            site: task.site.clone(),
            source: task.source.clone(),
            years: output.years,
            artifacts,
            window_means,
        })
    };

    run().map_err(|e| fail(task, e.to_string()))
}

fn write_annual(
    config: &RunConfig,
    task: &ScenarioTask,
    output: &GridAnnualOutput,
    artifacts: &mut Vec<PathBuf>,
) -> EngineResult<()> {
    let label = task.source.label();
    for (variable, rasters) in [(Variable::Aet, &output.aet), (Variable::Cwd, &output.cwd)] {
        let artifact = RasterArtifact::from_rasters(
            &task.site,
            &label,
            variable,
            output.years.clone(),
            rasters,
        )?;
        let path = artifact.path_under(&config.output_root);
        artifact.write_path(&path)?;
        artifacts.push(path);
    }
    Ok(())
}

fn write_windows(
    config: &RunConfig,
    task: &ScenarioTask,
    output: &GridAnnualOutput,
    artifacts: &mut Vec<PathBuf>,
) -> EngineResult<Vec<WindowMeans>> {
    let label = task.source.label();
    let mut means = Vec::new();
    for window in &config.summary_windows {
        // A window aimed at another era (e.g. end-of-century against the
        // historical record) simply does not apply to this tuple.
        if !output.years.iter().any(|y| window.contains(*y)) {
            continue;
        }
        let aet = aggregate::window_mean_grid(&output.years, &output.aet, *window)?;
        let cwd = aggregate::window_mean_grid(&output.years, &output.cwd, *window)?;
        for (variable, raster) in [(Variable::Aet, &aet), (Variable::Cwd, &cwd)] {
            let artifact = RasterArtifact::from_rasters(
                &task.site,
                &format!("{label}_{}", window.label()),
                variable,
                (window.start..=window.end).collect(),
                std::slice::from_ref(raster),
            )?;
            let path = artifact.path_under(&config.output_root);
            artifact.write_path(&path)?;
            artifacts.push(path);
        }
        means.push(WindowMeans {
            window: *window,
            aet,
            cwd,
        });
    }
    Ok(means)
}

/// Mean across completed GCMs, per (site, scenario, window, variable).
/// Needs at least two models to be a meaningful ensemble.
fn write_ensembles(config: &RunConfig, report: &mut RunReport) -> EngineResult<()> {
    let mut groups: BTreeMap<(String, String), Vec<&TaskOutcome>> = BTreeMap::new();
    for outcome in &report.completed {
        if let ClimateSource::Projection { scenario, .. } = &outcome.source {
            groups
                .entry((outcome.site.clone(), scenario.clone()))
                .or_default()
                .push(outcome);
        }
    }

    let mut written = Vec::new();
    for ((site, scenario), members) in groups {
        if members.len() < 2 {
            continue;
        }
        for window in &config.summary_windows {
            let selected: Vec<&WindowMeans> = members
                .iter()
                .filter_map(|m| m.window_means.iter().find(|wm| wm.window == *window))
                .collect();
            if selected.len() < 2 {
                continue;
            }
            for variable in Variable::ALL {
                let rasters: Vec<&Raster> = selected
                    .iter()
                    .map(|wm| match variable {
                        Variable::Aet => &wm.aet,
                        Variable::Cwd => &wm.cwd,
                    })
                    .collect();
                let mean = aggregate::ensemble_mean(&rasters)?;
                let artifact = RasterArtifact::from_rasters(
                    &site,
                    &format!("ensemble_{scenario}_{}", window.label()),
                    variable,
                    (window.start..=window.end).collect(),
                    std::slice::from_ref(&mean),
                )?;
                let path = artifact.path_under(&config.output_root);
                artifact.write_path(&path)?;
                written.push(path);
            }
        }
    }

    if !written.is_empty() {
        info!(count = written.len(), "ensemble artifacts written");
    }
    report.ensembles = written;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::Path;

    fn write_grid(path: &Path, value: f64) {
        Raster::filled(2, 2, value).to_ascii_grid_path(path).unwrap();
    }

    fn write_climate(path: &Path, start_year: i32, years: i32) {
        let mut f = fs::File::create(path).unwrap();
        writeln!(f, "date,tmin,tmax,prcp").unwrap();
        let mut date = chrono::NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(start_year + years, 1, 1).unwrap();
        while date < end {
            writeln!(f, "{date},4.0,16.0,1.5").unwrap();
            date = date + chrono::Days::new(1);
        }
    }

    fn site_inputs(root: &Path, name: &str, with_terrain: bool, sources: &[&str]) {
        let site_dir = root.join(name);
        let climate_dir = site_dir.join("climate");
        fs::create_dir_all(&climate_dir).unwrap();
        if with_terrain {
            write_grid(&site_dir.join("elevation.asc"), 800.0);
            write_grid(&site_dir.join("slope.asc"), 10.0);
            write_grid(&site_dir.join("aspect.asc"), 200.0);
            write_grid(&site_dir.join("whc.asc"), 80.0);
        }
        for s in sources {
            write_climate(&climate_dir.join(format!("{s}.csv")), 2001, 2);
        }
    }

    fn config(input: &Path, output: &Path, sites: Vec<SiteConfig>) -> RunConfig {
        RunConfig {
            input_root: input.to_path_buf(),
            output_root: output.to_path_buf(),
            max_parallel: 2,
            gcms: vec!["gcm1".to_string(), "gcm2".to_string()],
            scenarios: vec!["rcp85".to_string()],
            summary_windows: vec![YearWindow::new(2001, 2002).unwrap()],
            sites,
            ..Default::default()
        }
    }

    fn site_cfg(name: &str) -> SiteConfig {
        SiteConfig {
            name: name.to_string(),
            latitude_deg: 40.0,
            station_elevation_m: 800.0,
            elevation_file: "elevation.asc".to_string(),
            slope_file: "slope.asc".to_string(),
            aspect_file: "aspect.asc".to_string(),
            whc_file: "whc.asc".to_string(),
            soil_mask_file: None,
            climate_dir: "climate".to_string(),
        }
    }

    #[test]
    fn label_distinguishes_sources() {
        assert_eq!(ClimateSource::Historical.label(), "historical");
        let p = ClimateSource::Projection {
            gcm: "miroc5".to_string(),
            scenario: "rcp45".to_string(),
        };
        assert_eq!(p.label(), "miroc5_rcp45");
    }

    #[test]
    fn enumeration_is_full_cross_product() {
        let cfg = config(Path::new("in"), Path::new("out"), vec![site_cfg("a"), site_cfg("b")]);
        let tasks = enumerate_tasks(&cfg);
        // 2 sites x (historical + 2 gcms x 1 scenario)
        assert_eq!(tasks.len(), 6);
        assert!(tasks.iter().any(|t| {
            t.site == "b" && t.source == ClimateSource::Historical
        }));
    }

    #[test]
    fn run_all_writes_artifacts_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");

        // alpha is complete; beta is missing its terrain entirely
        site_inputs(&input, "alpha", true, &["historical", "gcm1_rcp85", "gcm2_rcp85"]);
        site_inputs(&input, "beta", false, &["historical"]);

        let cfg = config(&input, &output, vec![site_cfg("alpha"), site_cfg("beta")]);
        let report = run_all(&cfg).unwrap();

        assert_eq!(report.completed.len(), 3);
        assert_eq!(report.failed.len(), 3);
        assert!(report.failed.iter().all(|f| f.site == "beta"));
        assert!(report.failed.iter().all(|f| f.error.contains("terrain")));

        // Annual artifacts for each completed tuple and variable
        for source in ["historical", "gcm1_rcp85", "gcm2_rcp85"] {
            for var in ["aet", "cwd"] {
                let path = output.join(format!("alpha__{source}__{var}.wb.gz"));
                assert!(path.exists(), "missing {}", path.display());
            }
        }

        // Ensemble across the two GCMs for the shared window
        assert_eq!(report.ensembles.len(), 2);
        let ensemble = output.join("alpha__ensemble_rcp85_2001-2002__cwd.wb.gz");
        assert!(ensemble.exists());

        // Artifacts decode back to the simulated grid shape
        let back = RasterArtifact::read_path(&report.completed[0].artifacts[0]).unwrap();
        assert_eq!(back.rows, 2);
        assert_eq!(back.cols, 2);
        assert_eq!(back.years, vec![2001, 2002]);
        let raster = back.to_raster(0).unwrap();
        assert!(!Raster::is_nodata(raster.get(0, 0)));
    }

    #[test]
    fn missing_climate_fails_only_that_tuple() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");

        // historical present, projections missing
        site_inputs(&input, "alpha", true, &["historical"]);

        let cfg = config(&input, &output, vec![site_cfg("alpha")]);
        let report = run_all(&cfg).unwrap();

        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.completed[0].source, ClimateSource::Historical);
        assert!(report
            .failed
            .iter()
            .all(|f| f.error.contains("file not found")));
    }

    #[test]
    fn identical_reruns_write_identical_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        site_inputs(&input, "alpha", true, &["historical"]);

        let out1 = dir.path().join("out1");
        let out2 = dir.path().join("out2");
        let mut cfg = config(&input, &out1, vec![site_cfg("alpha")]);
        cfg.gcms.clear();
        cfg.scenarios.clear();
        run_all(&cfg).unwrap();
        cfg.output_root = out2.clone();
        run_all(&cfg).unwrap();

        let a = RasterArtifact::read_path(&out1.join("alpha__historical__cwd.wb.gz")).unwrap();
        let b = RasterArtifact::read_path(&out2.join("alpha__historical__cwd.wb.gz")).unwrap();
        assert_eq!(a.values, b.values);
    }
}
