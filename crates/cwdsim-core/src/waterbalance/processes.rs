/// Water balance process functions.
///
/// Pure functions implementing each piece of the daily accounting step.
/// All inputs and outputs are f64.

/// Clamp forcing to the physical domain. Negative precipitation or PET is a
/// data error upstream; it must never drive storage or fluxes negative.
#[inline]
pub fn guard_forcing(precip: f64, pet: f64) -> (f64, f64) {
    (precip.max(0.0), pet.max(0.0))
}

/// Water available to meet demand: today's precipitation plus stored water.
#[inline]
pub fn available_water(precip: f64, storage: f64) -> f64 {
    precip + storage
}

/// Draw the bucket against demand.
///
/// Returns (aet, new_storage, surplus):
/// - demand met: AET = PET, the store refills up to `whc`, excess beyond
///   capacity leaves as surplus (runoff, not tracked further)
/// - demand unmet: AET = everything available, the store empties
pub fn draw_storage(available: f64, pet: f64, whc: f64) -> (f64, f64, f64) {
    if available >= pet {
        let remainder = available - pet;
        if remainder > whc {
            (pet, whc, remainder - whc)
        } else {
            (pet, remainder, 0.0)
        }
    } else {
        (available, 0.0, 0.0)
    }
}

/// Unmet atmospheric demand.
#[inline]
pub fn water_deficit(pet: f64, aet: f64) -> f64 {
    (pet - aet).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert two f64 values are close.
    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected} ± {tol}, got {actual}"
        );
    }

    // -- Forcing guard --

    #[test]
    fn guard_passes_valid_forcing() {
        assert_eq!(guard_forcing(3.0, 2.0), (3.0, 2.0));
    }

    #[test]
    fn guard_clamps_negative_values() {
        assert_eq!(guard_forcing(-3.0, 2.0), (0.0, 2.0));
        assert_eq!(guard_forcing(3.0, -2.0), (3.0, 0.0));
    }

    // -- Bucket draw --

    #[test]
    fn demand_met_from_precip_alone() {
        let (aet, storage, surplus) = draw_storage(available_water(5.0, 40.0), 3.0, 100.0);
        assert_approx(aet, 3.0, 1e-12);
        assert_approx(storage, 42.0, 1e-12);
        assert_approx(surplus, 0.0, 1e-12);
    }

    #[test]
    fn demand_met_drawing_down_storage() {
        // 1 mm rain against 3 mm demand pulls 2 mm from the store
        let (aet, storage, surplus) = draw_storage(available_water(1.0, 40.0), 3.0, 100.0);
        assert_approx(aet, 3.0, 1e-12);
        assert_approx(storage, 38.0, 1e-12);
        assert_approx(surplus, 0.0, 1e-12);
    }

    #[test]
    fn refill_capped_at_capacity() {
        // 30 mm rain onto a 95 mm store with 100 mm capacity: 3 mm demand,
        // refill to 100, 22 mm surplus
        let (aet, storage, surplus) = draw_storage(available_water(30.0, 95.0), 3.0, 100.0);
        assert_approx(aet, 3.0, 1e-12);
        assert_approx(storage, 100.0, 1e-12);
        assert_approx(surplus, 22.0, 1e-12);
    }

    #[test]
    fn demand_unmet_empties_store() {
        let (aet, storage, surplus) = draw_storage(available_water(1.0, 1.5), 5.0, 100.0);
        assert_approx(aet, 2.5, 1e-12);
        assert_approx(storage, 0.0, 1e-12);
        assert_approx(surplus, 0.0, 1e-12);
    }

    #[test]
    fn conservation_both_branches() {
        for (precip, store, pet, whc) in [
            (5.0, 40.0, 3.0, 100.0),
            (30.0, 95.0, 3.0, 100.0),
            (1.0, 1.5, 5.0, 100.0),
            (0.0, 0.0, 4.0, 100.0),
        ] {
            let available = available_water(precip, store);
            let (aet, new_storage, surplus) = draw_storage(available, pet, whc);
            assert_approx(aet + new_storage + surplus, available, 1e-10);
        }
    }

    #[test]
    fn zero_capacity_passes_everything_through() {
        // whc = 0: rain either evaporates or runs off, nothing stored
        let (aet, storage, surplus) = draw_storage(available_water(10.0, 0.0), 3.0, 0.0);
        assert_approx(aet, 3.0, 1e-12);
        assert_approx(storage, 0.0, 1e-12);
        assert_approx(surplus, 7.0, 1e-12);
    }

    #[test]
    fn aet_never_exceeds_pet() {
        let (aet, _, _) = draw_storage(available_water(50.0, 100.0), 4.0, 100.0);
        assert!(aet <= 4.0);
    }

    // -- Deficit --

    #[test]
    fn deficit_is_unmet_demand() {
        assert_approx(water_deficit(5.0, 2.0), 3.0, 1e-12);
    }

    #[test]
    fn deficit_zero_when_demand_met() {
        assert_approx(water_deficit(5.0, 5.0), 0.0, 1e-12);
    }

    #[test]
    fn deficit_never_negative() {
        // aet can only exceed pet through float noise; deficit still clamps
        assert_eq!(water_deficit(5.0, 5.0 + 1e-15), 0.0);
    }
}
