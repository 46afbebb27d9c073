//! Run configuration.
//!
//! Everything a batch run needs is passed in explicitly: site identities,
//! input and output roots, climate-source lists, windows, and concurrency.
//! No path or identifier is ever read from ambient environment state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::YearWindow;
use crate::error::{EngineError, EngineResult};
use crate::scenario::ClimateSource;
use crate::topoclimate::constants::LAPSE_RATE_DEFAULT;

/// One study site: identity, the climate station the point series belongs
/// to, and the input file layout under `<input_root>/<name>/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub latitude_deg: f64,
    pub station_elevation_m: f64,
    #[serde(default = "default_elevation_file")]
    pub elevation_file: String,
    #[serde(default = "default_slope_file")]
    pub slope_file: String,
    #[serde(default = "default_aspect_file")]
    pub aspect_file: String,
    #[serde(default = "default_whc_file")]
    pub whc_file: String,
    /// Optional soil exclusion mask (non-zero cells are excluded).
    #[serde(default)]
    pub soil_mask_file: Option<String>,
    #[serde(default = "default_climate_dir")]
    pub climate_dir: String,
}

fn default_elevation_file() -> String {
    "elevation.asc".to_string()
}
fn default_slope_file() -> String {
    "slope.asc".to_string()
}
fn default_aspect_file() -> String {
    "aspect.asc".to_string()
}
fn default_whc_file() -> String {
    "whc.asc".to_string()
}
fn default_climate_dir() -> String {
    "climate".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Concurrent tuple limit; 0 means one worker per core.
    #[serde(default)]
    pub max_parallel: usize,
    /// Temperature lapse rate [C/100m].
    #[serde(default = "default_lapse_rate")]
    pub lapse_rate: f64,
    #[serde(default = "default_true")]
    pub include_historical: bool,
    #[serde(default)]
    pub gcms: Vec<String>,
    #[serde(default)]
    pub scenarios: Vec<String>,
    /// Multi-year summary windows, e.g. a baseline and an end-of-century
    /// window.
    #[serde(default)]
    pub summary_windows: Vec<YearWindow>,
    pub sites: Vec<SiteConfig>,
}

fn default_lapse_rate() -> f64 {
    LAPSE_RATE_DEFAULT
}
fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("input"),
            output_root: PathBuf::from("output"),
            max_parallel: 0,
            lapse_rate: LAPSE_RATE_DEFAULT,
            include_historical: true,
            gcms: Vec::new(),
            scenarios: Vec::new(),
            summary_windows: Vec::new(),
            sites: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_path(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let config: RunConfig = toml::from_str(&text)
            .map_err(|e| EngineError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n;
        self
    }

    pub fn with_lapse_rate(mut self, rate: f64) -> Self {
        self.lapse_rate = rate;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.sites.is_empty() {
            return Err(EngineError::config("no sites configured"));
        }
        if !self.lapse_rate.is_finite() || self.lapse_rate < 0.0 {
            return Err(EngineError::config(format!(
                "lapse rate {} must be non-negative",
                self.lapse_rate
            )));
        }
        if !self.include_historical && self.gcms.is_empty() {
            return Err(EngineError::config(
                "nothing to run: historical disabled and no GCMs listed",
            ));
        }
        if self.gcms.is_empty() != self.scenarios.is_empty() {
            return Err(EngineError::config(
                "gcms and scenarios must be listed together",
            ));
        }
        for site in &self.sites {
            if !(-90.0..=90.0).contains(&site.latitude_deg) {
                return Err(EngineError::config(format!(
                    "site {}: latitude {} outside [-90, 90]",
                    site.name, site.latitude_deg
                )));
            }
            if !site.station_elevation_m.is_finite() {
                return Err(EngineError::config(format!(
                    "site {}: non-finite station elevation",
                    site.name
                )));
            }
        }
        for w in &self.summary_windows {
            w.validate()?;
        }
        Ok(())
    }

    pub fn site_root(&self, site: &SiteConfig) -> PathBuf {
        self.input_root.join(&site.name)
    }

    pub fn elevation_path(&self, site: &SiteConfig) -> PathBuf {
        self.site_root(site).join(&site.elevation_file)
    }

    pub fn slope_path(&self, site: &SiteConfig) -> PathBuf {
        self.site_root(site).join(&site.slope_file)
    }

    pub fn aspect_path(&self, site: &SiteConfig) -> PathBuf {
        self.site_root(site).join(&site.aspect_file)
    }

    pub fn whc_path(&self, site: &SiteConfig) -> PathBuf {
        self.site_root(site).join(&site.whc_file)
    }

    pub fn soil_mask_path(&self, site: &SiteConfig) -> Option<PathBuf> {
        site.soil_mask_file
            .as_ref()
            .map(|f| self.site_root(site).join(f))
    }

    /// Climate table for one source: `<site>/<climate_dir>/<label>.csv`.
    pub fn climate_path(&self, site: &SiteConfig, source: &ClimateSource) -> PathBuf {
        self.site_root(site)
            .join(&site.climate_dir)
            .join(format!("{}.csv", source.label()))
    }
}
