/// Hamon potential evapotranspiration.
///
/// Temperature-based daily PET: saturation vapor pressure at the daily mean
/// temperature scaled by day length. Day length comes from solar declination
/// and the sunset hour angle; the arccos argument is clamped so polar
/// day/night degrade to 24 h / 0 h instead of NaN.
use std::f64::consts::PI;

use super::constants::{DECLINATION_AMPLITUDE, HAMON_COEFF, SAT_VP_A, SAT_VP_B, SAT_VP_C};

/// Solar declination [radians] for a day of year (1-366).
#[inline]
pub fn solar_declination(day_of_year: u32) -> f64 {
    DECLINATION_AMPLITUDE * (2.0 * PI * (284.0 + day_of_year as f64) / 365.0).sin()
}

/// Day length [hours] at a latitude for a day of year.
pub fn day_length_hours(latitude_deg: f64, day_of_year: u32) -> f64 {
    let lat = latitude_deg.to_radians();
    let decl = solar_declination(day_of_year);
    let cos_sunset = (-lat.tan() * decl.tan()).clamp(-1.0, 1.0);
    24.0 / PI * cos_sunset.acos()
}

/// Saturation vapor pressure [kPa] at temperature [C] (Tetens, over water).
#[inline]
pub fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    SAT_VP_A * (SAT_VP_B * temp_c / (temp_c + SAT_VP_C)).exp()
}

/// Hamon PET [mm/day]. Zero at and below freezing.
pub fn hamon_pet(tmean_c: f64, day_length_hours: f64) -> f64 {
    if tmean_c <= 0.0 {
        return 0.0;
    }
    HAMON_COEFF * day_length_hours * saturation_vapor_pressure(tmean_c) / (tmean_c + 273.2)
}
