/// Whole-grid water balance for one (site, climate-source) run.
///
/// Cells are independent, so the grid runs them in parallel; within a cell
/// the days stay strictly sequential. Each cell's daily series is reduced to
/// annual sums as soon as it finishes, so memory stays proportional to the
/// grid, not to grid size times series length.
use rayon::prelude::*;

use super::constants::SUPPORTED_RESOLUTIONS;
use super::params::Parameters;
use super::run;
use crate::aggregate::{self, AnnualSum};
use crate::error::{EngineError, EngineResult};
use crate::forcing::ClimateSeries;
use crate::raster::Raster;
use crate::terrain::{ActiveCell, SiteMeta, TerrainGrid};
use crate::topoclimate::{self, DayContext};

/// Annual AET/CWD surfaces for one run, one raster per simulated year.
/// Excluded cells are no-data in every raster.
#[derive(Debug)]
pub struct GridAnnualOutput {
    pub years: Vec<i32>,
    pub aet: Vec<Raster>,
    pub cwd: Vec<Raster>,
}

/// Run the full grid against a daily climate series.
pub fn run_grid(
    terrain: &TerrainGrid,
    site: &SiteMeta,
    series: &ClimateSeries,
    lapse_rate: f64,
) -> EngineResult<GridAnnualOutput> {
    if !SUPPORTED_RESOLUTIONS.contains(&series.resolution()) {
        return Err(EngineError::input(
            "grid run requires a daily series; disaggregate monthly sources first",
        ));
    }
    if !lapse_rate.is_finite() || lapse_rate < 0.0 {
        return Err(EngineError::input(format!(
            "lapse rate {lapse_rate} must be a non-negative number"
        )));
    }

    let day_ctx = topoclimate::prepare_days(series, site.latitude_deg);
    let dates = series.dates();
    let years = series.years();

    let per_cell: Vec<CellAnnual> = terrain
        .active_cells()
        .par_iter()
        .map(|cell| run_cell(cell, site, series, &day_ctx, &dates, lapse_rate))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut aet: Vec<Raster> = years.iter().map(|_| terrain.blank_output()).collect();
    let mut cwd: Vec<Raster> = years.iter().map(|_| terrain.blank_output()).collect();

    for cell in &per_cell {
        // Every cell saw the same dates, so the per-cell year lists line up
        // with the series years by construction.
        for (k, sum) in cell.aet.iter().enumerate() {
            aet[k].set_at(cell.index, sum.total);
        }
        for (k, sum) in cell.cwd.iter().enumerate() {
            cwd[k].set_at(cell.index, sum.total);
        }
    }

    Ok(GridAnnualOutput { years, aet, cwd })
}

struct CellAnnual {
    index: usize,
    aet: Vec<AnnualSum>,
    cwd: Vec<AnnualSum>,
}

fn run_cell(
    cell: &ActiveCell,
    site: &SiteMeta,
    series: &ClimateSeries,
    day_ctx: &[DayContext],
    dates: &[chrono::NaiveDate],
    lapse_rate: f64,
) -> EngineResult<CellAnnual> {
    let n = series.len();
    let mut precip = Vec::with_capacity(n);
    let mut pet = Vec::with_capacity(n);
    for (day, ctx) in series.days().iter().zip(day_ctx) {
        let tmean = topoclimate::correct_temp(
            day.tmean(),
            site.station_elevation_m,
            cell.elevation,
            lapse_rate,
        );
        precip.push(day.precip);
        pet.push(topoclimate::cell_pet(ctx, tmean, cell));
    }

    let params = Parameters::new(cell.whc)?;
    let fluxes = run::run(&params, &precip, &pet, None);

    Ok(CellAnnual {
        index: cell.index,
        aet: aggregate::annual_sums(dates, &fluxes.aet)?,
        cwd: aggregate::annual_sums(dates, &fluxes.cwd)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::{ClimateDay, Resolution};
    use chrono::{Days, NaiveDate};

    fn site() -> SiteMeta {
        SiteMeta {
            name: "testsite".to_string(),
            latitude_deg: 40.0,
            station_elevation_m: 500.0,
        }
    }

    fn daily_series(start: &str, n: u64, tmin: f64, tmax: f64, precip: f64) -> ClimateSeries {
        let start: NaiveDate = start.parse().unwrap();
        let days = (0..n)
            .map(|i| ClimateDay {
                date: start + Days::new(i),
                tmin,
                tmax,
                precip,
            })
            .collect();
        ClimateSeries::new(days, Resolution::Daily).unwrap()
    }

    fn terrain_2x2(slope_at_01: f64) -> TerrainGrid {
        let elevation = Raster::new(2, 2, vec![500.0, 700.0, 900.0, 1100.0]).unwrap();
        let mut slope = Raster::filled(2, 2, 5.0);
        slope.set(0, 1, slope_at_01);
        let aspect = Raster::filled(2, 2, 180.0);
        let whc = Raster::filled(2, 2, 50.0);
        TerrainGrid::assemble(&elevation, &slope, &aspect, &whc, None, 40.0).unwrap()
    }

    #[test]
    fn monthly_series_rejected() {
        let days = vec![ClimateDay {
            date: "2000-01-01".parse().unwrap(),
            tmin: 0.0,
            tmax: 10.0,
            precip: 30.0,
        }];
        let monthly = ClimateSeries::new(days, Resolution::Monthly).unwrap();
        let err = run_grid(&terrain_2x2(5.0), &site(), &monthly, 0.6).unwrap_err();
        assert!(err.to_string().contains("daily"));
    }

    #[test]
    fn output_covers_series_years() {
        let series = daily_series("2000-12-30", 4, 5.0, 15.0, 1.0);
        let out = run_grid(&terrain_2x2(5.0), &site(), &series, 0.6).unwrap();
        assert_eq!(out.years, vec![2000, 2001]);
        assert_eq!(out.aet.len(), 2);
        assert_eq!(out.cwd.len(), 2);
    }

    #[test]
    fn excluded_cell_is_nodata_in_every_raster() {
        let series = daily_series("2000-01-01", 10, 5.0, 15.0, 1.0);
        let out = run_grid(&terrain_2x2(75.0), &site(), &series, 0.6).unwrap();
        for r in out.aet.iter().chain(out.cwd.iter()) {
            assert!(Raster::is_nodata(r.get(0, 1)), "excluded cell leaked a value");
            assert!(!Raster::is_nodata(r.get(0, 0)));
        }
    }

    #[test]
    fn higher_cells_are_cooler_and_less_demanding() {
        // Same forcing, no rain: the 1100 m cell sees lower corrected
        // temperature than the 500 m cell, hence lower PET and lower CWD.
        let series = daily_series("2000-06-01", 30, 10.0, 24.0, 0.0);
        let out = run_grid(&terrain_2x2(5.0), &site(), &series, 0.6).unwrap();
        let cwd_low = out.cwd[0].get(0, 0); // 500 m, station elevation
        let cwd_high = out.cwd[0].get(1, 1); // 1100 m
        assert!(
            cwd_high < cwd_low,
            "high cell cwd {cwd_high} should be below low cell cwd {cwd_low}"
        );
    }

    #[test]
    fn wet_cold_run_has_no_deficit() {
        // Below-freezing days: PET = 0 everywhere, so CWD = 0
        let series = daily_series("2000-01-01", 10, -12.0, -2.0, 2.0);
        let out = run_grid(&terrain_2x2(5.0), &site(), &series, 0.6).unwrap();
        for cell in out.cwd[0].values().iter().filter(|v| !Raster::is_nodata(**v)) {
            assert_eq!(*cell, 0.0);
        }
    }

    #[test]
    fn rerun_is_identical() {
        let series = daily_series("2000-01-01", 40, 5.0, 21.0, 1.5);
        let terrain = terrain_2x2(5.0);
        let a = run_grid(&terrain, &site(), &series, 0.6).unwrap();
        let b = run_grid(&terrain, &site(), &series, 0.6).unwrap();
        assert_eq!(a.aet[0].values(), b.aet[0].values());
        assert_eq!(a.cwd[0].values(), b.cwd[0].values());
    }
}
