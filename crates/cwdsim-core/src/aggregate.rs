//! Reductions over daily output: calendar-year sums, multi-year window
//! means, and cross-model ensemble means. No-data cells stay no-data through
//! every stage.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::raster::Raster;

/// Sum of a daily variable over one calendar year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualSum {
    pub year: i32,
    pub total: f64,
}

/// Sum daily values into calendar years. Dates must be sorted (they are,
/// coming out of a validated series).
pub fn annual_sums(dates: &[NaiveDate], values: &[f64]) -> EngineResult<Vec<AnnualSum>> {
    if dates.len() != values.len() {
        return Err(EngineError::SizeMismatch {
            name: "annual_sums values",
            expected: dates.len(),
            actual: values.len(),
        });
    }
    let mut sums: Vec<AnnualSum> = Vec::new();
    for (date, value) in dates.iter().zip(values) {
        match sums.last_mut() {
            Some(last) if last.year == date.year() => last.total += value,
            _ => sums.push(AnnualSum {
                year: date.year(),
                total: *value,
            }),
        }
    }
    Ok(sums)
}

/// Closed year range for multi-year summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    pub fn new(start: i32, end: i32) -> EngineResult<Self> {
        let w = Self { start, end };
        w.validate()?;
        Ok(w)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.end < self.start {
            return Err(EngineError::config(format!(
                "year window {}-{} ends before it starts",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Label used in artifact names, e.g. "2070-2099".
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Arithmetic mean of annual sums over a window. `None` when the window
/// selects no years.
pub fn window_mean(sums: &[AnnualSum], window: YearWindow) -> Option<f64> {
    let selected: Vec<f64> = sums
        .iter()
        .filter(|s| window.contains(s.year))
        .map(|s| s.total)
        .collect();
    if selected.is_empty() {
        return None;
    }
    Some(selected.iter().sum::<f64>() / selected.len() as f64)
}

/// Per-cell mean of annual rasters over a window. A cell is no-data in the
/// result iff it is no-data in the selected years (excluded cells never
/// acquire values part-way through a reduction).
pub fn window_mean_grid(
    years: &[i32],
    annual: &[Raster],
    window: YearWindow,
) -> EngineResult<Raster> {
    if years.len() != annual.len() {
        return Err(EngineError::SizeMismatch {
            name: "annual rasters",
            expected: years.len(),
            actual: annual.len(),
        });
    }
    let selected: Vec<&Raster> = years
        .iter()
        .zip(annual)
        .filter(|(y, _)| window.contains(**y))
        .map(|(_, r)| r)
        .collect();
    if selected.is_empty() {
        return Err(EngineError::input(format!(
            "window {} selects no simulated years",
            window.label()
        )));
    }
    mean_of(&selected)
}

/// Per-cell mean across models (one raster per GCM). A cell is no-data in
/// the result iff it is no-data in any input.
pub fn ensemble_mean(rasters: &[&Raster]) -> EngineResult<Raster> {
    if rasters.is_empty() {
        return Err(EngineError::input("ensemble mean of zero rasters"));
    }
    mean_of(rasters)
}

fn mean_of(rasters: &[&Raster]) -> EngineResult<Raster> {
    let first = rasters[0];
    for r in &rasters[1..] {
        if !first.same_shape(r) {
            return Err(EngineError::input(format!(
                "raster mean shape mismatch: {}x{} vs {}x{}",
                first.rows(),
                first.cols(),
                r.rows(),
                r.cols()
            )));
        }
    }
    let mut out = Raster::nodata(first.rows(), first.cols());
    let n = rasters.len() as f64;
    for i in 0..first.len() {
        let mut sum = 0.0;
        let mut valid = true;
        for r in rasters {
            let v = r.at(i);
            if Raster::is_nodata(v) {
                valid = false;
                break;
            }
            sum += v;
        }
        if valid {
            out.set_at(i, sum / n);
        }
    }
    Ok(out)
}
