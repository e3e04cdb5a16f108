//! Exponential-phase kinetics.
//!
//! Summarizes each replicate culture over one inclusive time window with a
//! single kinetic record, bounded by the first and last samples inside the
//! window, then aggregates the records per clone.

use crate::dataset::{self, Table, fmt_value};
use crate::kinetics;
use crate::model::KineticRecord;
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs::File, path::Path};

/// Kinetic column names of the phase exports.
const PHASE_COLUMNS: [&str; 9] = [
    "mu", "IVCD", "dX", "dG", "dL", "Y_XG", "Y_XL", "q_Glc", "q_Lac",
];

/// Inclusive time window of the exponential growth phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseWindow {
    pub start_hr: i64,
    pub end_hr: i64,
}

impl PhaseWindow {
    pub fn contains(&self, t_hr: f64) -> bool {
        t_hr >= self.start_hr as f64 && t_hr <= self.end_hr as f64
    }
}

/// Whole-phase kinetic summary of one replicate culture.
#[derive(Debug, Clone)]
pub struct PhaseRecord {
    pub clone_id: String,
    pub rep: i64,
    pub record: KineticRecord,
}

/// Per-clone mean and sample standard deviation of every kinetic field.
#[derive(Debug, Clone)]
pub struct CloneSummary {
    pub clone_id: String,
    pub mean: [f64; KineticRecord::N_FIELDS],
    pub std_dev: [f64; KineticRecord::N_FIELDS],
}

/// Compute one kinetic record per replicate culture from the samples inside
/// `window`, ignoring rows without a viable cell density. Cultures with
/// fewer than two usable samples in the window are left out.
pub fn compute(table: &Table, window: PhaseWindow) -> Vec<PhaseRecord> {
    let groups = dataset::group_samples(table, |data| {
        !data.vcd.is_nan() && data.t_hr.is_some_and(|t_hr| window.contains(t_hr))
    });

    let mut records = Vec::new();
    for ((clone_id, rep), samples) in groups {
        if samples.len() < 2 {
            continue;
        }

        let ivcd = kinetics::ivcd_trapezoid(&samples);
        let record = kinetics::record(&samples[0], &samples[samples.len() - 1], ivcd);

        records.push(PhaseRecord { clone_id, rep, record });
    }

    records
}

/// Aggregate phase records per clone, field by field over the replicates.
pub fn aggregate(records: &[PhaseRecord]) -> Vec<CloneSummary> {
    let mut by_clone: BTreeMap<&str, Vec<&KineticRecord>> = BTreeMap::new();
    for rec in records {
        by_clone.entry(&rec.clone_id).or_default().push(&rec.record);
    }

    let mut summaries = Vec::new();
    for (clone_id, recs) in by_clone {
        let mut accs: Vec<Accumulator> =
            (0..KineticRecord::N_FIELDS).map(|_| Accumulator::new()).collect();
        for rec in recs {
            for (acc, val) in accs.iter_mut().zip(rec.values()) {
                acc.add(val);
            }
        }

        let mut mean = [f64::NAN; KineticRecord::N_FIELDS];
        let mut std_dev = [f64::NAN; KineticRecord::N_FIELDS];
        for (idx, acc) in accs.iter().enumerate() {
            let report = acc.report();
            mean[idx] = report.mean;
            std_dev[idx] = report.std_dev;
        }

        summaries.push(CloneSummary { clone_id: clone_id.to_owned(), mean, std_dev });
    }

    summaries
}

/// Write the per-replicate kinetics table.
pub fn write_by_clone_rep<P: AsRef<Path>>(file: P, records: &[PhaseRecord]) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["Clone", "Rep"];
    header.extend(PHASE_COLUMNS);
    writer.write_record(&header)?;

    for rec in records {
        let mut fields = vec![rec.clone_id.clone(), rec.rep.to_string()];
        fields.extend(rec.record.values().map(fmt_value));
        writer.write_record(&fields)?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Write the per-clone summary table, one `_mean`/`_std` column pair per
/// kinetic field.
pub fn write_by_clone<P: AsRef<Path>>(file: P, summaries: &[CloneSummary]) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["Clone".to_owned()];
    for name in PHASE_COLUMNS {
        header.push(format!("{name}_mean"));
        header.push(format!("{name}_std"));
    }
    writer.write_record(&header)?;

    for summary in summaries {
        let mut fields = vec![summary.clone_id.clone()];
        for idx in 0..KineticRecord::N_FIELDS {
            fields.push(fmt_value(summary.mean[idx]));
            fields.push(fmt_value(summary.std_dev[idx]));
        }
        writer.write_record(&fields)?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
