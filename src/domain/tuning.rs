/// Gameplay tuning for the gravity simulation.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
#[derive(Debug, Clone, Copy)]
pub struct PhysicsTuning {
    /// Mass of a freshly spawned player body.
    pub player_start_mass: f64,

    /// Fraction of mass lost per tick while inside the bounds.
    pub decay_per_step: f64,

    /// Fraction of mass lost per tick while outside the bounds.
    pub out_of_bounds_decay_per_step: f64,

    /// Bodies lighter than this do not decay in bounds.
    pub min_decay_mass: f64,

    /// Floor used by forced decay for bodies below `min_decay_mass`.
    pub min_decay_mass_forced: f64,

    pub gravitational_constant: f64,

    /// Magnitude applied to every non-zero thrust; players pick a heading only.
    pub thrust_base_magnitude: f64,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        let player_start_mass = 10_000.0;
        Self {
            player_start_mass,
            decay_per_step: 0.0001,
            out_of_bounds_decay_per_step: 0.001,
            min_decay_mass: player_start_mass,
            min_decay_mass_forced: 500.0,
            gravitational_constant: 100.0,
            thrust_base_magnitude: 5_000_000.0,
        }
    }
}
