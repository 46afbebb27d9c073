/// Soil-moisture water balance.
///
/// A one-store daily bucket bounded by the cell's water-holding capacity:
/// precipitation and stored water meet potential demand, the unmet remainder
/// is climatic water deficit. Classical Thornthwaite-Mather sequential
/// accounting: days must run in order, cells are independent.
pub mod constants;
pub mod grid;
pub mod outputs;
pub mod params;
pub mod processes;
pub mod run;
pub mod state;
