/// Water balance flux outputs.
///
/// Two levels: `Fluxes` holds a single day, `FluxesTimeseries` holds the
/// full simulation (Vec of each field).
///
/// Single-day fluxes, returned by `step()`.
#[derive(Debug, Clone, Copy)]
pub struct Fluxes {
    /// Potential evapotranspiration [mm/day].
    pub pet: f64,
    /// Precipitation [mm/day].
    pub precip: f64,
    /// Actual evapotranspiration [mm/day].
    pub aet: f64,
    /// Climatic water deficit, PET - AET [mm/day].
    pub cwd: f64,
    /// Store level after the day [mm].
    pub storage: f64,
    /// Water discarded beyond capacity [mm/day].
    pub surplus: f64,
}

/// Full timeseries of fluxes, returned by `run()`.
#[derive(Debug)]
pub struct FluxesTimeseries {
    pub pet: Vec<f64>,
    pub precip: Vec<f64>,
    pub aet: Vec<f64>,
    pub cwd: Vec<f64>,
    pub storage: Vec<f64>,
    pub surplus: Vec<f64>,
}

impl FluxesTimeseries {
    /// Pre-allocate all vectors for `n` days.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            pet: Vec::with_capacity(n),
            precip: Vec::with_capacity(n),
            aet: Vec::with_capacity(n),
            cwd: Vec::with_capacity(n),
            storage: Vec::with_capacity(n),
            surplus: Vec::with_capacity(n),
        }
    }

    /// Push a single day's fluxes into the timeseries.
    pub fn push(&mut self, f: &Fluxes) {
        self.pet.push(f.pet);
        self.precip.push(f.precip);
        self.aet.push(f.aet);
        self.cwd.push(f.cwd);
        self.storage.push(f.storage);
        self.surplus.push(f.surplus);
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.aet.len()
    }

    /// Returns `true` if there are no days.
    pub fn is_empty(&self) -> bool {
        self.aet.is_empty()
    }
}
