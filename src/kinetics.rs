//! Shared kinetics formulas.
//!
//! Both analysis engines compute the same record from a pair of bounding
//! samples; they differ only in how intervals are chosen and in the
//! integrated-density variant they plug in. Undefined quantities (a log of
//! a non-positive density, a ratio with an exactly zero denominator)
//! degrade to NaN in the affected field rather than failing the run.

use crate::model::{KineticRecord, Sample};

/// pmol per mol, for cell-specific rates.
const PMOL_PER_MOL: f64 = 1e12;

/// Compute the kinetic record for the interval from `t0` to `t1`, with
/// `ivcd` the integrated viable cell density over that interval.
pub fn record(t0: &Sample, t1: &Sample, ivcd: f64) -> KineticRecord {
    let dt = t1.t_hr - t0.t_hr;

    let mu = growth_rate(t0.vcd, t1.vcd, dt);

    let dx = t1.vcd * t1.vol_ml - t0.vcd * t0.vol_ml;
    let dg = t0.glc_mol_ml * t0.vol_ml - t1.glc_mol_ml * t1.vol_ml;
    let dl = t1.lac_mol_ml * t1.vol_ml - t0.lac_mol_ml * t0.vol_ml;

    KineticRecord {
        mu,
        ivcd,
        dx,
        dg,
        dl,
        y_xg: ratio_or_nan(dx, dg),
        y_xl: ratio_or_nan(dx, dl),
        q_glc: ratio_or_nan(dg * PMOL_PER_MOL, ivcd),
        q_lac: ratio_or_nan(dl * PMOL_PER_MOL, ivcd),
    }
}

/// Integrated viable cell density of a time-sorted series, by the
/// trapezoidal rule (cells·h/mL). Volume does not enter this variant.
pub fn ivcd_trapezoid(samples: &[Sample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| (pair[1].t_hr - pair[0].t_hr) * (pair[0].vcd + pair[1].vcd) / 2.0)
        .sum()
}

/// Integrated viable cell density of a single interval: average density
/// times duration times average volume (cells·h).
pub fn ivcd_two_point(t0: &Sample, t1: &Sample) -> f64 {
    let dt = t1.t_hr - t0.t_hr;
    (t0.vcd + t1.vcd) / 2.0 * dt * ((t0.vol_ml + t1.vol_ml) / 2.0)
}

/// Specific growth rate over `dt` hours. NaN unless both densities are
/// strictly positive.
fn growth_rate(vcd0: f64, vcd1: f64, dt: f64) -> f64 {
    if vcd0 > 0.0 && vcd1 > 0.0 {
        (vcd1.ln() - vcd0.ln()) / dt
    } else {
        f64::NAN
    }
}

/// Quotient that is NaN when the denominator is exactly zero. No epsilon
/// tolerance: tiny denominators yield huge quotients on purpose.
fn ratio_or_nan(num: f64, den: f64) -> f64 {
    if den == 0.0 { f64::NAN } else { num / den }
}
