/// Pure Rust benchmarks for the water balance engine.
///
/// Uses std::time::Instant for timing, a deterministic LCG PRNG for data
/// generation, and std::hint::black_box to prevent dead-code elimination.
use std::hint::black_box;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use cwdsim_core::forcing::{ClimateDay, ClimateSeries, Resolution};
use cwdsim_core::raster::Raster;
use cwdsim_core::terrain::{SiteMeta, TerrainGrid};
use cwdsim_core::waterbalance::grid::run_grid;
use cwdsim_core::waterbalance::params::Parameters;
use cwdsim_core::waterbalance::run as wb_run;

const REPEATS: usize = 7;

/// Simple LCG PRNG for deterministic data generation.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as f64 / (1u64 << 31) as f64
    }
}

fn make_forcing(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = Lcg(seed);
    let precip: Vec<f64> = (0..n).map(|_| rng.next_f64() * 10.0).collect();
    let pet: Vec<f64> = (0..n).map(|_| 0.5 + rng.next_f64() * 4.5).collect();
    (precip, pet)
}

fn make_series(n_days: u64, seed: u64) -> ClimateSeries {
    let mut rng = Lcg(seed);
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date");
    let days = (0..n_days)
        .map(|i| {
            let tmin = -5.0 + rng.next_f64() * 15.0;
            ClimateDay {
                date: start + Days::new(i),
                tmin,
                tmax: tmin + 8.0 + rng.next_f64() * 6.0,
                precip: rng.next_f64() * 8.0,
            }
        })
        .collect();
    ClimateSeries::new(days, Resolution::Daily).expect("valid synthetic series")
}

fn make_terrain(side: usize, seed: u64) -> TerrainGrid {
    let mut rng = Lcg(seed);
    let n = side * side;
    let elevation =
        Raster::new(side, side, (0..n).map(|_| 300.0 + rng.next_f64() * 1500.0).collect())
            .expect("square layer");
    let slope = Raster::new(side, side, (0..n).map(|_| rng.next_f64() * 45.0).collect())
        .expect("square layer");
    let aspect = Raster::new(side, side, (0..n).map(|_| rng.next_f64() * 360.0).collect())
        .expect("square layer");
    let whc = Raster::new(side, side, (0..n).map(|_| 20.0 + rng.next_f64() * 200.0).collect())
        .expect("square layer");
    TerrainGrid::assemble(&elevation, &slope, &aspect, &whc, None, 40.0)
        .expect("valid synthetic terrain")
}

/// Run a closure `REPEATS` times, return the median duration.
fn median_time<F: FnMut()>(mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..REPEATS)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    times.sort();
    times[REPEATS / 2]
}

fn bench_cell(sizes: &[usize]) -> Vec<(&'static str, usize, Duration)> {
    let params = Parameters::new(120.0).expect("whc in bounds");
    let mut results = Vec::new();

    for &n in sizes {
        let (precip, pet) = make_forcing(n, 42);

        // Warmup
        black_box(wb_run::run(&params, &precip, &pet, None));

        let dur = median_time(|| {
            black_box(wb_run::run(&params, &precip, &pet, None));
        });
        results.push(("cell", n, dur));
    }
    results
}

fn bench_grid(sides: &[usize]) -> Vec<(&'static str, usize, Duration)> {
    let site = SiteMeta {
        name: "bench".to_string(),
        latitude_deg: 40.0,
        station_elevation_m: 800.0,
    };
    let series = make_series(3653, 7); // ten years daily
    let mut results = Vec::new();

    for &side in sides {
        let terrain = make_terrain(side, 42);

        black_box(run_grid(&terrain, &site, &series, 0.6).expect("grid run"));

        let dur = median_time(|| {
            black_box(run_grid(&terrain, &site, &series, 0.6).expect("grid run"));
        });
        results.push(("grid", side * side, dur));
    }
    results
}

fn main() {
    let mut results = Vec::new();
    results.extend(bench_cell(&[365, 3_650, 36_500]));
    results.extend(bench_grid(&[16, 32, 64]));

    println!("{:<6} {:>10} {:>14}", "bench", "n", "median");
    for (name, n, dur) in results {
        println!("{name:<6} {n:>10} {:>14.3?}", dur);
    }
}
