//! Clone-by-time-point summaries.
//!
//! Collapses the replicates of each clone at every sampled time: measured
//! state (viable density and substrate concentrations in mmol/L) together
//! with the interval kinetics, each reported as mean and sample SD over
//! the replicates carrying a finite value.

use crate::dataset::{Table, fmt_value};
use crate::interval;
use crate::stats::Accumulator;
use crate::units;
use anyhow::{Context, Result};
use std::{fs::File, path::Path};

/// Variables aggregated per (Clone, t_hr): measured state, then kinetics.
const GROUPED_COLUMNS: [&str; 12] = [
    "VCD", "Glc_mM", "Lac_mM", "mu", "IVCD_tot", "dX", "dG", "dL", "Y_XG", "Y_XL", "q_G", "q_L",
];

const N_VARS: usize = GROUPED_COLUMNS.len();

/// Mean and sample SD of every aggregated variable at one (Clone, t_hr)
/// point.
#[derive(Debug, Clone)]
pub struct TimePointSummary {
    pub clone_id: String,
    pub t_hr: f64,
    pub mean: [f64; N_VARS],
    pub std_dev: [f64; N_VARS],
}

/// Aggregate the table per (Clone, t_hr) across replicates. Rows missing
/// either key are left out; a replicate contributes its interval kinetics
/// only where it anchors a qualifying interval.
pub fn compute(table: &Table, batch_end_hr: f64) -> Vec<TimePointSummary> {
    let records = interval::compute(table, batch_end_hr);

    let mut points: Vec<(&str, f64, [f64; N_VARS])> = Vec::new();
    for (row, record) in table.rows().iter().zip(&records) {
        let data = row.data();
        let (Some(clone_id), Some(t_hr)) = (&data.clone_id, data.t_hr) else {
            continue;
        };

        let mut values = [f64::NAN; N_VARS];
        values[0] = data.vcd;
        values[1] = units::mmol_per_l(data.glc_g_l, units::MM_GLUCOSE);
        values[2] = units::mmol_per_l(data.lac_g_l, units::MM_LACTATE);
        if let Some(rec) = record {
            values[3..].copy_from_slice(&rec.values());
        }

        points.push((clone_id, t_hr, values));
    }

    points.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.total_cmp(&b.1)));

    let mut summaries = Vec::new();
    for chunk in points.chunk_by(|a, b| a.0 == b.0 && a.1 == b.1) {
        let mut accs: Vec<Accumulator> = (0..N_VARS).map(|_| Accumulator::new()).collect();
        for (_, _, values) in chunk {
            for (acc, &val) in accs.iter_mut().zip(values) {
                acc.add(val);
            }
        }

        let mut mean = [f64::NAN; N_VARS];
        let mut std_dev = [f64::NAN; N_VARS];
        for (idx, acc) in accs.iter().enumerate() {
            let report = acc.report();
            mean[idx] = report.mean;
            std_dev[idx] = report.std_dev;
        }

        summaries.push(TimePointSummary {
            clone_id: chunk[0].0.to_owned(),
            t_hr: chunk[0].1,
            mean,
            std_dev,
        });
    }

    summaries
}

/// Write the clone-by-time summary table, one `_avg`/`_sd` column pair per
/// variable.
pub fn write<P: AsRef<Path>>(file: P, summaries: &[TimePointSummary]) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["Clone".to_owned(), "t_hr".to_owned()];
    for name in GROUPED_COLUMNS {
        header.push(format!("{name}_avg"));
        header.push(format!("{name}_sd"));
    }
    writer.write_record(&header)?;

    for summary in summaries {
        let mut fields = vec![summary.clone_id.clone(), fmt_value(summary.t_hr)];
        for idx in 0..N_VARS {
            fields.push(fmt_value(summary.mean[idx]));
            fields.push(fmt_value(summary.std_dev[idx]));
        }
        writer.write_record(&fields)?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
