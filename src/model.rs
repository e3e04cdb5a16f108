//! Core data types of the culture kinetics model.

/// Identifier of a replicate culture: a clone grown in one vessel.
pub type GroupKey = (String, i64);

/// One measurement of a replicate culture at a single time point.
///
/// Substrate and metabolite readings are stored as amount concentrations
/// (mol/mL), already converted from the g/L values on disk. Missing or
/// unparseable measurements are NaN.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Index of the backing row in the sorted table.
    pub row: usize,

    /// Culture age (h).
    pub t_hr: f64,
    /// Working volume (mL).
    pub vol_ml: f64,
    /// Viable cell density (cells/mL).
    pub vcd: f64,
    /// Glucose concentration (mol/mL).
    pub glc_mol_ml: f64,
    /// Lactate concentration (mol/mL).
    pub lac_mol_ml: f64,
    /// Whether the measurement was taken right after a feed bolus.
    pub post_feed: bool,
}

/// Kinetic summary of one interval: growth, material balances, yields and
/// cell-specific consumption/production rates.
#[derive(Debug, Clone, Copy)]
pub struct KineticRecord {
    /// Specific growth rate (1/h).
    pub mu: f64,
    /// Integrated viable cell density over the interval.
    pub ivcd: f64,
    /// Net viable cell gain (cells).
    pub dx: f64,
    /// Glucose consumed (mol).
    pub dg: f64,
    /// Lactate produced (mol).
    pub dl: f64,
    /// Cells gained per mol of glucose consumed.
    pub y_xg: f64,
    /// Cells gained per mol of lactate produced.
    pub y_xl: f64,
    /// Specific glucose consumption rate (pmol/cell/h).
    pub q_glc: f64,
    /// Specific lactate production rate (pmol/cell/h).
    pub q_lac: f64,
}

impl KineticRecord {
    pub const N_FIELDS: usize = 9;

    /// Field values in export order.
    pub fn values(&self) -> [f64; Self::N_FIELDS] {
        [
            self.mu, self.ivcd, self.dx, self.dg, self.dl, self.y_xg, self.y_xl, self.q_glc,
            self.q_lac,
        ]
    }
}
