/// Topo-climate correction constants.
///
/// Centralises the fixed values used to downscale point climate to the
/// terrain grid.

// -- Temperature lapse --

/// Default temperature lapse rate [C/100m], higher cells cooler.
///
/// Averaged from independent north- and south-slope sensor transects; a
/// single value is applied regardless of aspect.
pub const LAPSE_RATE_DEFAULT: f64 = 0.6;

// -- Heat load (McCune & Keon 2002) --

/// Slope limit for the heat-load equation [degrees]. Steeper cells are
/// excluded from simulation.
pub const MAX_SLOPE_DEG: f64 = 60.0;

/// Aspect fold line [degrees]: heat load peaks on southwest-facing slopes.
pub const ASPECT_FOLD_DEG: f64 = 225.0;

/// Heat-load regression coefficients.
pub const HL_INTERCEPT: f64 = 0.339;
pub const HL_COS_LAT_COS_SLOPE: f64 = 0.808;
pub const HL_SIN_LAT_SIN_SLOPE: f64 = 0.196;
pub const HL_COS_ASPECT_SIN_SLOPE: f64 = 0.482;

// -- Hamon potential evapotranspiration --

/// Hamon coefficient [mm K kPa^-1 h^-1 day^-1].
pub const HAMON_COEFF: f64 = 29.8;

/// Saturation vapor pressure constants (Tetens form, kPa over water).
pub const SAT_VP_A: f64 = 0.611;
pub const SAT_VP_B: f64 = 17.27;
pub const SAT_VP_C: f64 = 237.3;

/// Solar declination amplitude [radians].
pub const DECLINATION_AMPLITUDE: f64 = 0.4093;
