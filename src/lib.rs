//! Growth and metabolic kinetics of fed-batch cell cultures.
//!
//! Loads replicate time-series measurements from a culture directory,
//! computes exponential-phase and interval-to-interval kinetics with a
//! shared formula set, aggregates across replicates, and exports flat CSV
//! tables for downstream plotting.

pub mod config;
pub mod dataset;
pub mod grouped;
pub mod interval;
pub mod kinetics;
pub mod manager;
pub mod model;
pub mod phase;
pub mod stats;
pub mod units;
