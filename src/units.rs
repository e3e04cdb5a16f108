//! Unit conversions between mass and amount concentrations.
//!
//! Substrate and metabolite readings arrive in g/L; material balances run on
//! mol/mL so they combine directly with culture volumes in mL, and grouped
//! summaries report mmol/L.

/// Molar mass of glucose (g/mol).
pub const MM_GLUCOSE: f64 = 180.156;

/// Molar mass of lactate (g/mol).
pub const MM_LACTATE: f64 = 90.080;

/// Convert a mass concentration (g/L) into an amount concentration (mol/mL).
pub fn mol_per_ml(g_per_l: f64, molar_mass: f64) -> f64 {
    g_per_l / molar_mass * 1e-3
}

/// Convert a mass concentration (g/L) into a molar concentration (mmol/L).
pub fn mmol_per_l(g_per_l: f64, molar_mass: f64) -> f64 {
    g_per_l / molar_mass * 1e3
}
