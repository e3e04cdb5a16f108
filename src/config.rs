use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration parameters.
///
/// Loaded from the optional `analysis.toml` in the culture directory and
/// validated before use; compiled defaults apply when the file is absent.
/// See [`Config::load_or_default`] for loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// End of the batch phase (h): the time of the first feed bolus.
    /// Samples taken at or before this time pair with their immediate
    /// predecessor; later samples pair with the last post-feed reading.
    pub batch_end_hr: f64,

    /// Start of the default exponential-phase window (h).
    pub phase_start_hr: i64,
    /// End of the default exponential-phase window (h).
    pub phase_end_hr: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_end_hr: 72.0,
            phase_start_hr: 0,
            phase_end_hr: 96,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file, or fall back to the defaults
    /// when the file does not exist. Keys not present in the file keep
    /// their default values.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or
    /// deserialized, or if the configuration values are invalid.
    pub fn load_or_default<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        if !file.exists() {
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Config::from_toml(&contents)
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.batch_end_hr, 0.0..10_000.0).context("invalid batch end time")?;
        check_num(self.phase_start_hr, 0..10_000).context("invalid phase window start")?;
        check_num(self.phase_end_hr, 1..10_000).context("invalid phase window end")?;

        if self.phase_start_hr >= self.phase_end_hr {
            bail!(
                "phase window start must be before its end, but the window is {}..{}",
                self.phase_start_hr,
                self.phase_end_hr
            );
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_end_hr, 72.0);
        assert_eq!((config.phase_start_hr, config.phase_end_hr), (0, 96));
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let config = Config::from_toml("batch_end_hr = 48.0\n").unwrap();
        assert_eq!(config.batch_end_hr, 48.0);
        assert_eq!((config.phase_start_hr, config.phase_end_hr), (0, 96));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_toml("batch_end_hr = -1.0\n").is_err());
        assert!(Config::from_toml("batch_end_hr = nan\n").is_err());
        assert!(Config::from_toml("phase_start_hr = 96\nphase_end_hr = 24\n").is_err());
        assert!(Config::from_toml("batch_end_hr = \"soon\"\n").is_err());
    }

    #[test]
    fn absent_file_falls_back_to_defaults() {
        let config = Config::load_or_default("/nonexistent/analysis.toml").unwrap();
        assert_eq!(config.batch_end_hr, 72.0);
    }
}
