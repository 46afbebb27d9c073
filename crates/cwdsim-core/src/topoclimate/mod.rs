//! Topo-climate corrector: point climate series to per-cell forcing.
//!
//! Temperature is lapse-corrected to cell elevation, PET is computed from the
//! corrected temperature and scaled by the cell's heat-load index. Day-level
//! quantities that are identical for every cell (day of year, day length) are
//! precomputed once per series.
pub mod constants;
pub mod heat_load;
pub mod pet;

use chrono::Datelike;

pub use heat_load::heat_load;

use crate::forcing::ClimateSeries;
use crate::terrain::ActiveCell;

/// Per-day values shared by every cell of the grid.
#[derive(Debug, Clone, Copy)]
pub struct DayContext {
    pub day_of_year: u32,
    pub day_length_hours: f64,
}

/// Precompute day contexts for a series at the site latitude.
pub fn prepare_days(series: &ClimateSeries, latitude_deg: f64) -> Vec<DayContext> {
    series
        .days()
        .iter()
        .map(|d| {
            let doy = d.date.ordinal();
            DayContext {
                day_of_year: doy,
                day_length_hours: pet::day_length_hours(latitude_deg, doy),
            }
        })
        .collect()
}

/// Lapse-correct a point temperature to cell elevation.
///
/// `gradient` is in C per 100 m; higher cells come out cooler.
#[inline]
pub fn correct_temp(temp: f64, station_elev: f64, cell_elev: f64, gradient: f64) -> f64 {
    temp - gradient * (cell_elev - station_elev) / 100.0
}

/// Cell PET for one day: Hamon PET at the corrected temperature, scaled by
/// the cell's heat load.
#[inline]
pub fn cell_pet(ctx: &DayContext, corrected_tmean: f64, cell: &ActiveCell) -> f64 {
    pet::hamon_pet(corrected_tmean, ctx.day_length_hours) * cell.heat_load
}
