/// Water balance model contract.
use crate::forcing::Resolution;

/// Supported temporal resolutions for forcing data.
pub const SUPPORTED_RESOLUTIONS: &[Resolution] = &[Resolution::Daily];

/// Parameter bounds: (min, max).
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Soil water-holding capacity [mm]. Zero is valid: a cell with no storage
/// buffering runs deficit against every dry day.
pub const WHC_BOUNDS: Bounds = Bounds {
    min: 0.0,
    max: 3000.0,
};
