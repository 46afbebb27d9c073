/// Terrain heat-load index.
///
/// McCune & Keon (2002) regression for relative direct-beam radiation load
/// as a function of latitude, slope, and aspect. Aspect is folded about the
/// southwest so that a 225-degree slope carries the maximum load and a
/// northeast slope the minimum. Valid for slopes up to 60 degrees.
use super::constants::{
    ASPECT_FOLD_DEG, HL_COS_ASPECT_SIN_SLOPE, HL_COS_LAT_COS_SLOPE, HL_INTERCEPT,
    HL_SIN_LAT_SIN_SLOPE, MAX_SLOPE_DEG,
};
use crate::error::{EngineError, EngineResult};

/// Fold aspect about the southwest axis: 0 at northeast, 180 at southwest.
#[inline]
pub fn fold_aspect(aspect_deg: f64) -> f64 {
    let aspect = aspect_deg.rem_euclid(360.0);
    (180.0 - (aspect - ASPECT_FOLD_DEG).abs()).abs()
}

/// Heat-load index for one cell, unitless multiplier on PET.
///
/// Returns `OutOfRange` for slopes outside [0, 60] degrees: the regression
/// is not defined there and such cells must be excluded rather than
/// computed.
pub fn heat_load(latitude_deg: f64, slope_deg: f64, aspect_deg: f64) -> EngineResult<f64> {
    if !(0.0..=MAX_SLOPE_DEG).contains(&slope_deg) {
        return Err(EngineError::OutOfRange {
            field: "slope_deg",
            value: slope_deg,
            min: 0.0,
            max: MAX_SLOPE_DEG,
        });
    }
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(EngineError::OutOfRange {
            field: "latitude_deg",
            value: latitude_deg,
            min: -90.0,
            max: 90.0,
        });
    }

    let lat = latitude_deg.to_radians();
    let slope = slope_deg.to_radians();
    let folded = fold_aspect(aspect_deg).to_radians();

    let hl = HL_INTERCEPT + HL_COS_LAT_COS_SLOPE * lat.cos() * slope.cos()
        - HL_SIN_LAT_SIN_SLOPE * lat.sin() * slope.sin()
        - HL_COS_ASPECT_SIN_SLOPE * folded.cos() * slope.sin();

    // The regression can dip marginally below zero on steep poleward slopes
    // at high latitude.
    Ok(hl.max(0.0))
}
