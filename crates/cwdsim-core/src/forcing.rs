//! Point climate series for one (site, climate-source) combination.
//!
//! A series is validated once at construction; the engine downstream assumes
//! ordered, gap-free, finite data and never re-checks. Negative precipitation
//! is a data error in the source table; it is clamped to zero here, counted,
//! and reported with a single warning per series.

use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Temporal resolution of a climate source.
///
/// The water balance itself always runs daily; monthly sources are
/// disaggregated before correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resolution {
    Daily,
    Monthly,
}

impl Resolution {
    /// Average number of days per timestep.
    pub fn days_per_timestep(self) -> f64 {
        match self {
            Resolution::Daily => 1.0,
            Resolution::Monthly => 30.4375,
        }
    }
}

/// One timestep of raw point climate.
#[derive(Debug, Clone, Copy)]
pub struct ClimateDay {
    pub date: NaiveDate,
    /// Daily minimum temperature [C].
    pub tmin: f64,
    /// Daily maximum temperature [C].
    pub tmax: f64,
    /// Precipitation [mm].
    pub precip: f64,
}

impl ClimateDay {
    /// Daily mean temperature [C].
    pub fn tmean(&self) -> f64 {
        0.5 * (self.tmin + self.tmax)
    }
}

/// Validated climate timeseries for one point location.
///
/// Validates on construction:
/// - series is non-empty
/// - all values are finite, tmin <= tmax
/// - dates strictly increasing; gap-free for daily series, consecutive
///   first-of-month dates for monthly series
/// - negative precipitation clamped to zero (counted, warned once)
#[derive(Debug, Clone)]
pub struct ClimateSeries {
    days: Vec<ClimateDay>,
    resolution: Resolution,
    clamped_precip: usize,
}

impl ClimateSeries {
    pub fn new(mut days: Vec<ClimateDay>, resolution: Resolution) -> EngineResult<Self> {
        if days.is_empty() {
            return Err(EngineError::input("climate series is empty"));
        }
        for d in &days {
            if !d.tmin.is_finite() || !d.tmax.is_finite() || !d.precip.is_finite() {
                return Err(EngineError::input(format!(
                    "non-finite climate value on {}",
                    d.date
                )));
            }
            if d.tmin > d.tmax {
                return Err(EngineError::input(format!(
                    "tmin {} exceeds tmax {} on {}",
                    d.tmin, d.tmax, d.date
                )));
            }
        }
        for pair in days.windows(2) {
            match resolution {
                Resolution::Daily => {
                    let expected = pair[0].date + Days::new(1);
                    if pair[1].date != expected {
                        return Err(EngineError::input(format!(
                            "gap in daily series: {} followed by {}",
                            pair[0].date, pair[1].date
                        )));
                    }
                }
                Resolution::Monthly => {
                    let (y, m) = next_month(pair[0].date.year(), pair[0].date.month());
                    if pair[1].date.year() != y || pair[1].date.month() != m {
                        return Err(EngineError::input(format!(
                            "gap in monthly series: {} followed by {}",
                            pair[0].date, pair[1].date
                        )));
                    }
                }
            }
        }
        if resolution == Resolution::Monthly {
            if let Some(d) = days.iter().find(|d| d.date.day() != 1) {
                return Err(EngineError::input(format!(
                    "monthly series must be dated on the first of the month, got {}",
                    d.date
                )));
            }
        }

        let mut clamped_precip = 0;
        for d in &mut days {
            if d.precip < 0.0 {
                d.precip = 0.0;
                clamped_precip += 1;
            }
        }
        if clamped_precip > 0 {
            warn!(
                count = clamped_precip,
                "negative precipitation values clamped to zero"
            );
        }

        Ok(Self {
            days,
            resolution,
            clamped_precip,
        })
    }

    /// Load a series from a `date,tmin,tmax,prcp` CSV table.
    ///
    /// Resolution is inferred: a table where every row is dated on the first
    /// of a month is treated as monthly, anything else as daily.
    pub fn from_csv_path(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            EngineError::input(format!("cannot open {}: {e}", path.display()))
        })?;

        let mut days = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            // +2: one for the header, one for 1-based numbering
            let row = row.map_err(|e| EngineError::parse(path, i + 2, e.to_string()))?;
            days.push(ClimateDay {
                date: row.date,
                tmin: row.tmin,
                tmax: row.tmax,
                precip: row.prcp,
            });
        }

        let resolution = if days.len() > 1 && days.iter().all(|d| d.date.day() == 1) {
            Resolution::Monthly
        } else {
            Resolution::Daily
        };
        Self::new(days, resolution)
    }

    /// Expand a monthly series to daily resolution: precipitation divided
    /// evenly over the days of each month, temperatures held constant.
    /// A daily series passes through unchanged.
    pub fn disaggregate_to_daily(&self) -> EngineResult<ClimateSeries> {
        if self.resolution == Resolution::Daily {
            return Ok(self.clone());
        }
        let mut days = Vec::with_capacity(self.days.len() * 31);
        for month in &self.days {
            let n = days_in_month(month.date.year(), month.date.month());
            let daily_precip = month.precip / n as f64;
            for day in 1..=n {
                let date = NaiveDate::from_ymd_opt(month.date.year(), month.date.month(), day)
                    .ok_or_else(|| {
                        EngineError::input(format!(
                            "invalid date {}-{:02}-{day:02}",
                            month.date.year(),
                            month.date.month()
                        ))
                    })?;
                days.push(ClimateDay {
                    date,
                    tmin: month.tmin,
                    tmax: month.tmax,
                    precip: daily_precip,
                });
            }
        }
        ClimateSeries::new(days, Resolution::Daily)
    }

    pub fn days(&self) -> &[ClimateDay] {
        &self.days
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns `true` if there are no timesteps.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    /// Distinct calendar years covered, in order.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = Vec::new();
        for d in &self.days {
            if years.last() != Some(&d.date.year()) {
                years.push(d.date.year());
            }
        }
        years
    }

    /// How many negative precipitation values were clamped at construction.
    pub fn clamped_precip(&self) -> usize {
        self.clamped_precip
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    tmin: f64,
    tmax: f64,
    prcp: f64,
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = next_month(year, month);
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first of month");
    let next = NaiveDate::from_ymd_opt(ny, nm, 1).expect("valid first of month");
    (next - first).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(date: &str, tmin: f64, tmax: f64, precip: f64) -> ClimateDay {
        ClimateDay {
            date: date.parse().unwrap(),
            tmin,
            tmax,
            precip,
        }
    }

    fn daily_run(start: &str, n: u64) -> Vec<ClimateDay> {
        let start: NaiveDate = start.parse().unwrap();
        (0..n)
            .map(|i| ClimateDay {
                date: start + Days::new(i),
                tmin: 2.0,
                tmax: 12.0,
                precip: 1.0,
            })
            .collect()
    }

    // -- Resolution --

    #[test]
    fn resolution_days_per_timestep() {
        assert_eq!(Resolution::Daily.days_per_timestep(), 1.0);
        assert_eq!(Resolution::Monthly.days_per_timestep(), 30.4375);
    }

    // -- Construction --

    #[test]
    fn valid_daily_series() {
        let s = ClimateSeries::new(daily_run("2000-01-01", 10), Resolution::Daily);
        assert!(s.is_ok());
        assert_eq!(s.unwrap().len(), 10);
    }

    #[test]
    fn rejects_empty_series() {
        let s = ClimateSeries::new(vec![], Resolution::Daily);
        assert!(s.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn rejects_nan() {
        let mut days = daily_run("2000-01-01", 3);
        days[1].tmax = f64::NAN;
        let s = ClimateSeries::new(days, Resolution::Daily);
        assert!(s.unwrap_err().to_string().contains("non-finite"));
    }

    #[test]
    fn rejects_tmin_above_tmax() {
        let days = vec![day("2000-01-01", 15.0, 5.0, 0.0)];
        let s = ClimateSeries::new(days, Resolution::Daily);
        assert!(s.unwrap_err().to_string().contains("tmin"));
    }

    #[test]
    fn rejects_date_gap() {
        let days = vec![
            day("2000-01-01", 0.0, 10.0, 0.0),
            day("2000-01-03", 0.0, 10.0, 0.0),
        ];
        let s = ClimateSeries::new(days, Resolution::Daily);
        assert!(s.unwrap_err().to_string().contains("gap"));
    }

    #[test]
    fn clamps_negative_precip() {
        let mut days = daily_run("2000-01-01", 3);
        days[1].precip = -4.0;
        let s = ClimateSeries::new(days, Resolution::Daily).unwrap();
        assert_eq!(s.days()[1].precip, 0.0);
        assert_eq!(s.clamped_precip(), 1);
    }

    #[test]
    fn monthly_requires_first_of_month() {
        let days = vec![day("2000-01-15", 0.0, 10.0, 30.0)];
        let s = ClimateSeries::new(days, Resolution::Monthly);
        assert!(s.unwrap_err().to_string().contains("first of the month"));
    }

    #[test]
    fn monthly_rejects_skipped_month() {
        let days = vec![
            day("2000-01-01", 0.0, 10.0, 30.0),
            day("2000-03-01", 0.0, 10.0, 30.0),
        ];
        let s = ClimateSeries::new(days, Resolution::Monthly);
        assert!(s.unwrap_err().to_string().contains("gap"));
    }

    #[test]
    fn years_spanning_boundary() {
        let s = ClimateSeries::new(daily_run("1999-12-30", 4), Resolution::Daily).unwrap();
        assert_eq!(s.years(), vec![1999, 2000]);
    }

    // -- Disaggregation --

    #[test]
    fn disaggregate_splits_precip_evenly() {
        // 62 mm over January (31 days) -> 2 mm/day
        let days = vec![day("2001-01-01", -2.0, 6.0, 62.0)];
        let monthly = ClimateSeries::new(days, Resolution::Monthly).unwrap();
        let daily = monthly.disaggregate_to_daily().unwrap();
        assert_eq!(daily.len(), 31);
        assert!((daily.days()[0].precip - 2.0).abs() < 1e-12);
        let total: f64 = daily.days().iter().map(|d| d.precip).sum();
        assert!((total - 62.0).abs() < 1e-9);
    }

    #[test]
    fn disaggregate_handles_leap_february() {
        let days = vec![day("2004-02-01", 0.0, 8.0, 29.0)];
        let monthly = ClimateSeries::new(days, Resolution::Monthly).unwrap();
        let daily = monthly.disaggregate_to_daily().unwrap();
        assert_eq!(daily.len(), 29);
        assert!((daily.days()[0].precip - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disaggregate_daily_is_identity() {
        let s = ClimateSeries::new(daily_run("2000-01-01", 5), Resolution::Daily).unwrap();
        let d = s.disaggregate_to_daily().unwrap();
        assert_eq!(d.len(), 5);
        assert_eq!(d.resolution(), Resolution::Daily);
    }

    // -- CSV --

    #[test]
    fn csv_roundtrip_daily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climate.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,tmin,tmax,prcp").unwrap();
        writeln!(f, "2000-01-01,1.5,9.5,3.0").unwrap();
        writeln!(f, "2000-01-02,2.0,11.0,0.0").unwrap();
        drop(f);

        let s = ClimateSeries::from_csv_path(&path).unwrap();
        assert_eq!(s.resolution(), Resolution::Daily);
        assert_eq!(s.len(), 2);
        assert_eq!(s.days()[0].precip, 3.0);
    }

    #[test]
    fn csv_infers_monthly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climate.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,tmin,tmax,prcp").unwrap();
        writeln!(f, "2000-01-01,1.0,9.0,60.0").unwrap();
        writeln!(f, "2000-02-01,2.0,10.0,40.0").unwrap();
        drop(f);

        let s = ClimateSeries::from_csv_path(&path).unwrap();
        assert_eq!(s.resolution(), Resolution::Monthly);
    }

    #[test]
    fn csv_reports_bad_row_with_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climate.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,tmin,tmax,prcp").unwrap();
        writeln!(f, "2000-01-01,1.5,9.5,3.0").unwrap();
        writeln!(f, "2000-01-02,oops,11.0,0.0").unwrap();
        drop(f);

        let err = ClimateSeries::from_csv_path(&path).unwrap_err();
        match err {
            EngineError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn csv_missing_file() {
        let err = ClimateSeries::from_csv_path(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, EngineError::FileNotFound { .. }));
    }
}
