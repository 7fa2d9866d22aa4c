//! Equation of state (spec §4.4): the core calls only `update_from_pressure`
//! and `update_from_energy`; everything else about the closure is opaque.


/// Derived thermodynamic quantities returned by either EOS closure.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EosState {
    pub pressure: f64,
    pub internal_energy: f64,
    pub temperature: f64,
    pub sound_speed: f64,
    /// Impedance multiplier `Γ`, used by the Burton-style impedance
    /// alternative (see [`IdealGasEos`] doc comment) — unused by the
    /// reference corner assembly but carried through so a caller-supplied
    /// EOS can support it without changing this trait.
    pub gamma: f64,
}

/// Given density and either pressure or specific internal energy, produces
/// the other plus temperature, sound speed and the impedance multiplier.
/// Object-safe so a custom closure-backed EOS can be boxed.
pub trait EquationOfState: Send + Sync {
    fn update_from_pressure(&self, density: f64, pressure: f64) -> EosState;
    fn update_from_energy(&self, density: f64, internal_energy: f64) -> EosState;
}

/// The reference closure: `p = (γ−1)ρe`, `c = √(γp/ρ)`, `Γ = (γ+1)/2`.
/// Temperature follows from the caloric relation `e = Cv·T` using the
/// configured specific heat; `gas_constant` is carried through for callers
/// that want `p = ρRT` consistency checks but is not otherwise used here.
///
/// The acoustic impedance used by the nodal solver is always `z = ρc`
/// (spec §4.5). A Burton-style alternative, `z = ρ(c + Γ|Δu·n|)`, folds
/// `gamma` into the impedance itself to better capture strong shocks, but
/// the spec explicitly rules it out as destabilising `Δt` in 3D, so it is
/// not implemented here — `gamma` is exposed on [`EosState`] only so a
/// caller-supplied EOS isn't prevented from doing so.
#[derive(Copy, Clone, Debug)]
pub struct IdealGasEos {
    pub gamma: f64,
    pub gas_constant: f64,
    pub specific_heat: f64,
}

impl IdealGasEos {
    pub fn new(gamma: f64, gas_constant: f64, specific_heat: f64) -> Self {
        Self { gamma, gas_constant, specific_heat }
    }
}

impl EquationOfState for IdealGasEos {
    fn update_from_pressure(&self, density: f64, pressure: f64) -> EosState {
        let internal_energy = pressure / ((self.gamma - 1.0) * density);
        self.close(density, pressure, internal_energy)
    }

    fn update_from_energy(&self, density: f64, internal_energy: f64) -> EosState {
        let pressure = (self.gamma - 1.0) * density * internal_energy;
        self.close(density, pressure, internal_energy)
    }
}

impl IdealGasEos {
    fn close(&self, density: f64, pressure: f64, internal_energy: f64) -> EosState {
        let sound_speed = (self.gamma * pressure / density).sqrt();
        let temperature = internal_energy / self.specific_heat;
        EosState {
            pressure,
            internal_energy,
            temperature,
            sound_speed,
            gamma: (self.gamma + 1.0) / 2.0,
        }
    }
}
