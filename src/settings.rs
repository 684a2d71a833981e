//! # Settings Module
//!
//! ## Purpose
//! Holds every tunable of a run: where KEGG lives, how the reaction network is
//! assembled, how the kinetics are integrated and how results are classified and shown.
//! Settings are stored as a JSON file (`kegg_kinetics_config.json` by default) next to
//! the working directory; a missing or unreadable file falls back to the defaults.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "kegg_base_url": "https://rest.kegg.jp",
//!   "request_timeout_secs": 30,
//!   "batch_size": 10,
//!   "max_reactions": null,
//!   "rate_constant": 1.0,
//!   "duplicate_edges": "accumulate",
//!   "include_reverse_edges": false,
//!   "t0": 0.0,
//!   "t_end": 10.0,
//!   "n_points": 100,
//!   "default_initial_concentration": 1.0,
//!   "initial_concentrations": {},
//!   "initial_concentration_sweep": [],
//!   "solver": "RK45",
//!   "minor_threshold": 0.1,
//!   "major_threshold": 1.0,
//!   "plot": "native",
//!   "csv_output": null,
//!   "log_level": "info"
//! }
//! ```
//! Every field is optional, absent fields take the default value.
use crate::Analysis::concentration_changes::ChangeThresholds;
use crate::Analysis::plots::PlotBackend;
use crate::Kinetics::network_kinetics_IVP::SolverChoice;
use crate::ReactionNetwork::network_builder::DuplicateEdgePolicy;
use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "kegg_kinetics_config.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read or write settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid setting '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Run configuration for fetching, network construction, simulation and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// root of the KEGG REST API
    pub kegg_base_url: String,
    pub request_timeout_secs: u64,
    /// number of entries per `get` request (KEGG serves at most 10)
    pub batch_size: usize,
    /// upper bound on the number of reactions taken from the link list
    pub max_reactions: Option<usize>,
    /// forward rate constant assigned to every substrate -> product edge
    pub rate_constant: f64,
    pub duplicate_edges: DuplicateEdgePolicy,
    /// reversible reactions also get product -> substrate edges
    pub include_reverse_edges: bool,
    pub t0: f64,
    pub t_end: f64,
    /// number of output samples of every trajectory
    pub n_points: usize,
    pub default_initial_concentration: f64,
    /// per-molecule initial concentrations, override the default
    pub initial_concentrations: HashMap<String, f64>,
    /// initial values of the queried molecule, one simulation per value
    pub initial_concentration_sweep: Vec<f64>,
    pub solver: SolverChoice,
    pub minor_threshold: f64,
    pub major_threshold: f64,
    pub plot: PlotBackend,
    /// file name for the csv export of trajectories, `.csv` is appended when missing;
    /// a sweep writes `<name>_<i>.csv` per scenario
    pub csv_output: Option<String>,
    pub log_level: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            kegg_base_url: "https://rest.kegg.jp".to_string(),
            request_timeout_secs: 30,
            batch_size: 10,
            max_reactions: None,
            rate_constant: 1.0,
            duplicate_edges: DuplicateEdgePolicy::Accumulate,
            include_reverse_edges: false,
            t0: 0.0,
            t_end: 10.0,
            n_points: 100,
            default_initial_concentration: 1.0,
            initial_concentrations: HashMap::new(),
            initial_concentration_sweep: Vec::new(),
            solver: SolverChoice::RK45,
            minor_threshold: 0.1,
            major_threshold: 1.0,
            plot: PlotBackend::Native,
            csv_output: None,
            log_level: "info".to_string(),
        }
    }
}

impl RunSettings {
    /// Reads settings from a JSON file.
    ///
    /// # Returns
    /// * `Ok(RunSettings)` - parsed and validated settings
    /// * `Err(SettingsError)` - the file cannot be read, is not valid JSON or holds invalid values
    pub fn load(config_file: &str) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(config_file)?;
        let settings: RunSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `config_file` if it exists, otherwise returns the defaults.
    /// A broken file is reported and replaced by the defaults, the run is never aborted.
    pub fn load_or_default(config_file: &str) -> Self {
        if !Path::new(config_file).exists() {
            info!("No settings file '{}', using defaults", config_file);
            return Self::default();
        }
        match Self::load(config_file) {
            Ok(settings) => {
                info!("Settings loaded from '{}'", config_file);
                settings
            }
            Err(e) => {
                warn!(
                    "Settings file '{}' ignored ({}), using defaults",
                    config_file, e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, config_file: &str) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_file, content)?;
        Ok(())
    }

    /// Checks the values that would otherwise only fail deep inside the pipeline.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.batch_size == 0 || self.batch_size > 10 {
            return Err(invalid("batch_size", "must be between 1 and 10"));
        }
        if !(self.rate_constant.is_finite() && self.rate_constant > 0.0) {
            return Err(invalid("rate_constant", "must be a positive number"));
        }
        if !(self.t0.is_finite() && self.t_end.is_finite() && self.t_end > self.t0) {
            return Err(invalid("t_end", "must be greater than t0"));
        }
        if self.n_points < 2 {
            return Err(invalid("n_points", "at least 2 samples are required"));
        }
        let all_initial = std::iter::once(&self.default_initial_concentration)
            .chain(self.initial_concentrations.values())
            .chain(self.initial_concentration_sweep.iter());
        for c in all_initial {
            if !(c.is_finite() && *c >= 0.0) {
                return Err(invalid(
                    "initial concentrations",
                    &format!("{} is not a non-negative number", c),
                ));
            }
        }
        if !(self.minor_threshold >= 0.0 && self.major_threshold > self.minor_threshold) {
            return Err(invalid(
                "major_threshold",
                "must be greater than minor_threshold",
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> ChangeThresholds {
        ChangeThresholds {
            minor: self.minor_threshold,
            major: self.major_threshold,
        }
    }

    /// Log level for the terminal logger, `Info` for unknown names.
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

fn invalid(field: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = RunSettings::default();
        assert_eq!(settings.t0, 0.0);
        assert_eq!(settings.t_end, 10.0);
        assert_eq!(settings.n_points, 100);
        assert_eq!(settings.default_initial_concentration, 1.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "t_end": 5.0, "n_points": 20, "duplicate_edges": "merge", "solver": "BDF" }}"#
        )
        .unwrap();
        let settings = RunSettings::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.t_end, 5.0);
        assert_eq!(settings.n_points, 20);
        assert_eq!(settings.duplicate_edges, DuplicateEdgePolicy::Merge);
        assert_eq!(settings.solver, SolverChoice::BDF);
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.kegg_base_url, "https://rest.kegg.jp");
    }

    #[test]
    fn test_save_and_load_back() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let mut settings = RunSettings::default();
        settings.initial_concentration_sweep = vec![0.1, 0.5, 1.0, 2.0];
        settings
            .initial_concentrations
            .insert("C00031".to_string(), 2.5);
        settings.save(path).unwrap();
        let loaded = RunSettings::load(path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "t0": 3.0, "t_end": 1.0 }}"#).unwrap();
        let result = RunSettings::load(file.path().to_str().unwrap());
        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));

        let mut settings = RunSettings::default();
        settings.n_points = 1;
        assert!(settings.validate().is_err());
        settings.n_points = 10;
        settings.default_initial_concentration = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_broken_or_missing_file_gives_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json at all").unwrap();
        let settings = RunSettings::load_or_default(file.path().to_str().unwrap());
        assert_eq!(settings, RunSettings::default());

        let settings = RunSettings::load_or_default("definitely_missing_config_file.json");
        assert_eq!(settings, RunSettings::default());
    }

    #[test]
    fn test_log_level_parsing() {
        let mut settings = RunSettings::default();
        settings.log_level = "debug".to_string();
        assert_eq!(settings.log_level_filter(), LevelFilter::Debug);
        settings.log_level = "nonsense".to_string();
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
    }
}
