/// Water balance state.
///
/// One store per cell:
/// - `storage`: current soil water [mm], bounded in [0, whc]
use super::params::Parameters;

#[derive(Debug, Clone, Copy)]
pub struct State {
    pub storage: f64,
}

impl State {
    /// Initial state at the start of a run: field at capacity.
    pub fn initialize(params: &Parameters) -> Self {
        Self {
            storage: params.whc,
        }
    }
}
