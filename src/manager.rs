use crate::config::Config;
use crate::dataset::Table;
use crate::grouped;
use crate::interval;
use crate::phase::{self, PhaseWindow};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

/// Ties one culture directory to its configuration and runs the analyses,
/// loading `data.csv` and writing the result tables under `outputs/`.
pub struct Manager {
    culture_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(culture_dir: P) -> Result<Self> {
        let culture_dir = culture_dir.as_ref().to_path_buf();

        let cfg = Config::load_or_default(culture_dir.join("analysis.toml"))
            .context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { culture_dir, cfg })
    }

    /// Exponential-phase kinetics: one record per replicate culture plus a
    /// per-clone summary. Without an explicit window the phase bounds are
    /// read from standard input.
    pub fn run_phase(&self, window: Option<(i64, i64)>) -> Result<()> {
        let window = match window {
            Some((start_hr, end_hr)) => self.checked_window(start_hr, end_hr),
            None => self.prompt_window(),
        };
        log::info!("phase window: {} h to {} h", window.start_hr, window.end_hr);

        let table = self.load_table()?;

        let records = phase::compute(&table, window);
        let summaries = phase::aggregate(&records);

        self.create_outputs_dir()?;

        let rep_file = self.outputs_file("kinetics_by_clone_rep.csv");
        phase::write_by_clone_rep(&rep_file, &records)
            .context("failed to write per-replicate kinetics")?;
        log::info!("saved {rep_file:?}");

        let clone_file = self.outputs_file("kinetics_by_clone.csv");
        phase::write_by_clone(&clone_file, &summaries)
            .context("failed to write per-clone kinetics")?;
        log::info!("saved {clone_file:?}");

        log::info!(
            "phase kinetics done: {} replicate cultures, {} clones",
            records.len(),
            summaries.len()
        );

        Ok(())
    }

    /// Interval-to-interval kinetics written back next to the raw table.
    pub fn run_interval(&self) -> Result<()> {
        let table = self.load_table()?;

        let records = interval::compute(&table, self.cfg.batch_end_hr);
        let n_intervals = records.iter().flatten().count();

        self.create_outputs_dir()?;

        let file = self.outputs_file("interval_kinetics.csv");
        table
            .write_with_kinetics(&file, &records)
            .context("failed to write interval kinetics")?;
        log::info!("saved {file:?}");

        log::info!("interval kinetics done: {n_intervals} intervals");

        Ok(())
    }

    /// Replicate-collapsed summary per clone and time point.
    pub fn run_grouped(&self) -> Result<()> {
        let table = self.load_table()?;

        let summaries = grouped::compute(&table, self.cfg.batch_end_hr);

        self.create_outputs_dir()?;

        let file = self.outputs_file("results_agg_by_clone_time.csv");
        grouped::write(&file, &summaries).context("failed to write grouped summary")?;
        log::info!("saved {file:?}");

        log::info!("grouped summary done: {} clone-time points", summaries.len());

        Ok(())
    }

    fn load_table(&self) -> Result<Table> {
        let data_file = self.culture_dir.join("data.csv");
        let table =
            Table::load(&data_file).with_context(|| format!("failed to load {data_file:?}"))?;
        log::info!("loaded {data_file:?}: {} rows", table.rows().len());
        Ok(table)
    }

    fn checked_window(&self, start_hr: i64, end_hr: i64) -> PhaseWindow {
        if start_hr >= end_hr {
            let window = self.default_window();
            log::warn!(
                "phase window start must be before its end; using default {} h to {} h",
                window.start_hr,
                window.end_hr
            );
            return window;
        }
        PhaseWindow { start_hr, end_hr }
    }

    fn prompt_window(&self) -> PhaseWindow {
        match read_window_input() {
            Some((start_hr, end_hr)) => self.checked_window(start_hr, end_hr),
            None => {
                let window = self.default_window();
                log::warn!(
                    "could not read a whole number of hours; using default {} h to {} h",
                    window.start_hr,
                    window.end_hr
                );
                window
            }
        }
    }

    fn default_window(&self) -> PhaseWindow {
        PhaseWindow {
            start_hr: self.cfg.phase_start_hr,
            end_hr: self.cfg.phase_end_hr,
        }
    }

    fn outputs_file(&self, name: &str) -> PathBuf {
        self.culture_dir.join("outputs").join(name)
    }

    fn create_outputs_dir(&self) -> Result<()> {
        let outputs_dir = self.culture_dir.join("outputs");
        fs::create_dir_all(&outputs_dir)
            .with_context(|| format!("failed to create {outputs_dir:?}"))?;
        Ok(())
    }
}

fn read_window_input() -> Option<(i64, i64)> {
    let start_hr = prompt_hours("Start of exponential phase (h): ")?;
    let end_hr = prompt_hours("End of exponential phase (h): ")?;
    Some((start_hr, end_hr))
}

fn prompt_hours(prompt: &str) -> Option<i64> {
    print!("{prompt}");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    line.trim().parse().ok()
}
