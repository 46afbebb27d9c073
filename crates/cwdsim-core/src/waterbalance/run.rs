/// Water balance orchestration functions.
///
/// - `step()`: Execute a single day → (State, Fluxes)
/// - `run()`: Execute over a timeseries → FluxesTimeseries
///
/// `storage` carries across days, so a cell's series must run strictly in
/// date order. Cells are independent and parallelize freely.
use super::outputs::{Fluxes, FluxesTimeseries};
use super::params::Parameters;
use super::processes;
use super::state::State;

/// Execute one day of the water balance.
///
/// Takes current state + forcing, returns new state + fluxes. Input state
/// is not mutated.
pub fn step(state: &State, params: &Parameters, precip: f64, pet: f64) -> (State, Fluxes) {
    // Step 1: Clamp forcing; invalid inputs must not corrupt the store
    let (precip, pet) = processes::guard_forcing(precip, pet);

    // Step 2: Water available to meet demand
    let available = processes::available_water(precip, state.storage);

    // Step 3: Draw the bucket
    let (aet, new_storage, surplus) = processes::draw_storage(available, pet, params.whc);

    // Step 4: Deficit
    let cwd = processes::water_deficit(pet, aet);

    let new_state = State {
        storage: new_storage,
    };

    let fluxes = Fluxes {
        pet,
        precip,
        aet,
        cwd,
        storage: new_storage,
        surplus,
    };

    (new_state, fluxes)
}

/// Run the water balance over a daily timeseries.
///
/// If no initial state is provided, the store starts at capacity.
pub fn run(
    params: &Parameters,
    precip: &[f64],
    pet: &[f64],
    initial_state: Option<&State>,
) -> FluxesTimeseries {
    assert_eq!(
        precip.len(),
        pet.len(),
        "precip and pet must have the same length"
    );

    let n = precip.len();

    let mut state = match initial_state {
        Some(s) => *s,
        None => State::initialize(params),
    };

    let mut outputs = FluxesTimeseries::with_capacity(n);

    for t in 0..n {
        let (new_state, fluxes) = step(&state, params, precip[t], pet[t]);
        outputs.push(&fluxes);
        state = new_state;
    }

    outputs
}
