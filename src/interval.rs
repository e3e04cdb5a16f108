//! Interval-to-interval kinetics.
//!
//! Walks each replicate culture in time order and computes one kinetic
//! record per qualifying sample, against a reference sample chosen by the
//! feeding schedule. Results stay aligned to the table so they can be
//! written back next to the raw measurements.

use crate::dataset::{self, Table};
use crate::kinetics;
use crate::model::{KineticRecord, Sample};
use std::ops::RangeInclusive;

/// Replicate identifiers recognized by this engine.
const REP_DOMAIN: RangeInclusive<i64> = 1..=3;

/// Compute per-interval kinetic records, row-aligned to `table`. Rows that
/// anchor no qualifying interval stay None.
pub fn compute(table: &Table, batch_end_hr: f64) -> Vec<Option<KineticRecord>> {
    let groups = dataset::group_samples(table, |data| {
        data.rep.is_some_and(|rep| REP_DOMAIN.contains(&rep))
    });

    let mut records = vec![None; table.rows().len()];
    for samples in groups.values() {
        for (row, record) in group_records(samples, batch_end_hr) {
            records[row] = Some(record);
        }
    }

    records
}

/// Kinetic records for one replicate culture's qualifying intervals, keyed
/// by table row of the interval's current sample.
///
/// The reference for a sample taken at or before `batch_end_hr` is its
/// immediate predecessor. Past that boundary the culture is fed, and a
/// measurement only pairs with the latest strictly earlier post-feed
/// reading: post-feed samples themselves anchor no interval, and neither
/// does a sample with no post-feed reading before it. Non-increasing
/// timestamps are skipped.
pub fn group_records(samples: &[Sample], batch_end_hr: f64) -> Vec<(usize, KineticRecord)> {
    let mut records = Vec::new();

    for (idx, current) in samples.iter().enumerate().skip(1) {
        let reference = if current.t_hr <= batch_end_hr {
            &samples[idx - 1]
        } else if current.post_feed {
            continue;
        } else {
            let prior_feed = samples[..idx]
                .iter()
                .rev()
                .find(|sample| sample.post_feed && sample.t_hr < current.t_hr);
            match prior_feed {
                Some(reference) => reference,
                None => continue,
            }
        };

        if current.t_hr - reference.t_hr <= 0.0 {
            continue;
        }

        let ivcd = kinetics::ivcd_two_point(reference, current);
        records.push((current.row, kinetics::record(reference, current, ivcd)));
    }

    records
}
