//! Per-site terrain and soil grid.
//!
//! Assembled once per site from co-registered elevation, slope, aspect and
//! water-holding-capacity layers, then reused read-only across every climate
//! source. Cells that cannot be simulated are excluded here, up front, and
//! stay no-data in every downstream output: a missing layer value, a slope
//! beyond the heat-load validity limit, an undefined WHC, or a caller-supplied
//! soil mask flag.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::raster::Raster;
use crate::topoclimate::constants::MAX_SLOPE_DEG;
use crate::topoclimate::heat_load;

/// Site identity and the point-climate station the series belongs to.
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub name: String,
    pub latitude_deg: f64,
    /// Elevation of the climate record's point location [m].
    pub station_elevation_m: f64,
}

/// Immutable per-cell bundle for one simulatable cell.
#[derive(Debug, Clone, Copy)]
pub struct ActiveCell {
    /// Row-major index into the site grid.
    pub index: usize,
    /// Cell elevation [m].
    pub elevation: f64,
    /// Soil water-holding capacity [mm].
    pub whc: f64,
    /// Heat-load multiplier on PET.
    pub heat_load: f64,
}

/// Why cells were excluded, for the assembly log and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionCounts {
    /// Elevation, slope or aspect layer had no data.
    pub terrain_nodata: usize,
    /// Slope beyond the heat-load validity limit.
    pub steep_slope: usize,
    /// WHC missing or negative.
    pub undefined_whc: usize,
    /// Flagged by the caller-supplied soil mask.
    pub masked: usize,
}

impl ExclusionCounts {
    pub fn total(&self) -> usize {
        self.terrain_nodata + self.steep_slope + self.undefined_whc + self.masked
    }
}

#[derive(Debug, Clone)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    active: Vec<ActiveCell>,
    exclusions: ExclusionCounts,
}

impl TerrainGrid {
    /// Assemble the per-site grid from co-registered layers.
    ///
    /// All layers must share shape and cell size. `mask`, if given, flags
    /// cells to exclude (soil units with undefined depth in the original
    /// data); it is applied in addition to the engine's own validation.
    pub fn assemble(
        elevation: &Raster,
        slope: &Raster,
        aspect: &Raster,
        whc: &Raster,
        mask: Option<&Raster>,
        latitude_deg: f64,
    ) -> EngineResult<TerrainGrid> {
        check_registration("slope", elevation, slope)?;
        check_registration("aspect", elevation, aspect)?;
        check_registration("whc", elevation, whc)?;
        if let Some(m) = mask {
            check_registration("soil mask", elevation, m)?;
        }
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(EngineError::OutOfRange {
                field: "latitude_deg",
                value: latitude_deg,
                min: -90.0,
                max: 90.0,
            });
        }

        let rows = elevation.rows();
        let cols = elevation.cols();
        let mut active = Vec::new();
        let mut exclusions = ExclusionCounts::default();

        for index in 0..rows * cols {
            let elev = elevation.at(index);
            let slp = slope.at(index);
            let asp = aspect.at(index);
            let cap = whc.at(index);

            if Raster::is_nodata(elev) || Raster::is_nodata(slp) || Raster::is_nodata(asp) {
                exclusions.terrain_nodata += 1;
                continue;
            }
            if Raster::is_nodata(cap) || cap < 0.0 {
                exclusions.undefined_whc += 1;
                continue;
            }
            if mask.is_some_and(|m| {
                let v = m.at(index);
                !Raster::is_nodata(v) && v != 0.0
            }) {
                exclusions.masked += 1;
                continue;
            }
            if !(0.0..=MAX_SLOPE_DEG).contains(&slp) {
                exclusions.steep_slope += 1;
                continue;
            }

            let hl = heat_load(latitude_deg, slp, asp)?;
            active.push(ActiveCell {
                index,
                elevation: elev,
                whc: cap,
                heat_load: hl,
            });
        }

        info!(
            rows,
            cols,
            active = active.len(),
            excluded = exclusions.total(),
            steep = exclusions.steep_slope,
            undefined_whc = exclusions.undefined_whc,
            masked = exclusions.masked,
            "terrain grid assembled"
        );

        Ok(TerrainGrid {
            rows,
            cols,
            active,
            exclusions,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cells that take part in simulation.
    pub fn active_cells(&self) -> &[ActiveCell] {
        &self.active
    }

    pub fn exclusions(&self) -> ExclusionCounts {
        self.exclusions
    }

    /// Blank output raster for this grid: every cell no-data until a
    /// simulated cell writes into it.
    pub fn blank_output(&self) -> Raster {
        Raster::nodata(self.rows, self.cols)
    }
}

fn check_registration(name: &'static str, reference: &Raster, layer: &Raster) -> EngineResult<()> {
    if !reference.same_shape(layer) {
        return Err(EngineError::SizeMismatch {
            name,
            expected: reference.len(),
            actual: layer.len(),
        });
    }
    if (reference.cellsize - layer.cellsize).abs() > f64::EPSILON {
        return Err(EngineError::input(format!(
            "{name} cell size {} does not match elevation cell size {}",
            layer.cellsize, reference.cellsize
        )));
    }
    Ok(())
}
