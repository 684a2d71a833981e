//! # Pipeline Module
//!
//! ## Purpose
//! Runs the whole chain for one molecule: KEGG fetch, record parsing, network
//! construction, kinetic simulation and analysis of the concentration changes.
//! Stage errors are collected into [`PipelineError`].
//!
//! ## Scenarios
//! Without a sweep a single simulation is done with the initial concentrations of
//! the settings. With `initial_concentration_sweep` set, one simulation per sweep
//! value is done where the queried molecule starts at that value. Plot files of a
//! sweep scenario carry its own prefix. A molecule missing from the network makes
//! the sweep fall back to a single base scenario.
//!
//! ## Usage
//! ```rust, ignore
//! let pipeline = Pipeline::new(RunSettings::default())?;
//! let run = pipeline.run("C00031")?;
//! pipeline.report(&run)?;
//! ```
use crate::Analysis::concentration_changes::{AnalysisError, SpeciesChange, analyze_changes};
use crate::Analysis::plots::{PlotBackend, plot_trajectory, save_trajectory_csv};
use crate::Analysis::report::{print_failures, print_network, print_reactions, print_summary};
use crate::KEGG::kegg_api::{HttpClient, KeggApi, KeggError, normalize_compound_id};
use crate::KEGG::record_parser::{ParseFailure, Reaction, parse_records};
use crate::Kinetics::network_kinetics_IVP::{NetworkKineticsIVP, SimulationError};
use crate::Kinetics::trajectory::Trajectory;
use crate::ReactionNetwork::network_builder::ReactionNetwork;
use crate::settings::{RunSettings, SettingsError};
use log::{info, warn};
use reqwest::blocking::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("Failed to fetch reactions: {0}")]
    Fetch(#[from] KeggError),
    #[error("No reactions found for {0}")]
    NoReactions(String),
    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// One simulated set of initial concentrations
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub label: String,
    /// initial concentration of the queried molecule if it was overridden
    pub query_initial: Option<f64>,
    /// prefix of plot file names, distinct for every scenario of a sweep
    pub file_prefix: Option<String>,
    pub trajectory: Trajectory,
    pub changes: Vec<SpeciesChange>,
}

/// Reactions of one molecule and the network built from them
#[derive(Debug)]
pub struct PreparedNetwork {
    pub molecule: String,
    pub reactions: Vec<Reaction>,
    pub failures: Vec<ParseFailure>,
    pub network: ReactionNetwork,
}

/// Everything produced for one molecule
#[derive(Debug)]
pub struct PipelineRun {
    pub molecule: String,
    pub reactions: Vec<Reaction>,
    pub failures: Vec<ParseFailure>,
    pub network: ReactionNetwork,
    pub scenarios: Vec<ScenarioResult>,
}

pub struct Pipeline<C: HttpClient> {
    api: KeggApi<C>,
    settings: RunSettings,
}

impl Pipeline<Client> {
    pub fn new(settings: RunSettings) -> Result<Self, PipelineError> {
        settings.validate()?;
        let api = KeggApi::new(&settings)?;
        Ok(Self { api, settings })
    }
}

impl<C: HttpClient> Pipeline<C> {
    pub fn with_client(client: C, settings: RunSettings) -> Result<Self, PipelineError> {
        settings.validate()?;
        let api = KeggApi::with_client(client, &settings);
        Ok(Self { api, settings })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn api(&self) -> &KeggApi<C> {
        &self.api
    }

    /// Fetches and parses the reactions of `molecule` and builds the network.
    ///
    /// # Returns
    /// * `Ok(PreparedNetwork)` - parsed reactions, skipped records and the network
    /// * `Err(PipelineError::NoReactions)` - nothing linked to the molecule or nothing parseable
    /// * `Err(PipelineError)` - invalid id or fetch failure
    pub fn prepare(&self, molecule: &str) -> Result<PreparedNetwork, PipelineError> {
        let molecule = normalize_compound_id(molecule)?;
        info!("fetching reactions of {}", molecule);
        let records = self.api.fetch_reactions(&molecule)?;
        if records.is_empty() {
            return Err(PipelineError::NoReactions(molecule));
        }

        let batch = parse_records(&records);
        if !batch.failures.is_empty() {
            warn!("{} records skipped", batch.failures.len());
        }
        if batch.reactions.is_empty() {
            return Err(PipelineError::NoReactions(molecule));
        }

        let network = ReactionNetwork::from_reactions(
            &batch.reactions,
            self.settings.rate_constant,
            self.settings.duplicate_edges,
            self.settings.include_reverse_edges,
        );
        if !network.contains_molecule(&molecule) {
            warn!("{} does not appear in any parsed equation", molecule);
        }
        Ok(PreparedNetwork {
            molecule,
            reactions: batch.reactions,
            failures: batch.failures,
            network,
        })
    }

    /// Prepares the network, lists the fetched reactions and skipped records, then
    /// simulates every scenario. The listing is printed before any integration so it
    /// is visible when a simulation fails.
    ///
    /// # Returns
    /// * `Ok(PipelineRun)` - reactions, network and one result per scenario
    /// * `Err(PipelineError)` - any stage failure, see [`Pipeline::prepare`]
    pub fn run(&self, molecule: &str) -> Result<PipelineRun, PipelineError> {
        let prepared = self.prepare(molecule)?;
        print_reactions(&prepared.molecule, &prepared.reactions);
        print_failures(&prepared.failures);
        let scenarios = self.simulate_scenarios(&prepared)?;
        let PreparedNetwork {
            molecule,
            reactions,
            failures,
            network,
        } = prepared;
        Ok(PipelineRun {
            molecule,
            reactions,
            failures,
            network,
            scenarios,
        })
    }

    pub fn simulate_scenarios(
        &self,
        prepared: &PreparedNetwork,
    ) -> Result<Vec<ScenarioResult>, PipelineError> {
        self.scenarios(&prepared.network, &prepared.molecule)
            .into_iter()
            .map(|query_initial| {
                self.simulate(&prepared.network, &prepared.molecule, query_initial)
            })
            .collect()
    }

    /// override of the queried molecule per scenario, `None` keeps the settings
    pub fn scenarios(&self, network: &ReactionNetwork, molecule: &str) -> Vec<Option<f64>> {
        let sweep = &self.settings.initial_concentration_sweep;
        if sweep.is_empty() {
            return vec![None];
        }
        if !network.contains_molecule(molecule) {
            warn!(
                "{} is not in the network, sweep over its initial concentration ignored",
                molecule
            );
            return vec![None];
        }
        info!(
            "sweep over {} initial concentrations of {}",
            sweep.len(),
            molecule
        );
        sweep.iter().map(|c| Some(*c)).collect()
    }

    fn simulate(
        &self,
        network: &ReactionNetwork,
        molecule: &str,
        query_initial: Option<f64>,
    ) -> Result<ScenarioResult, PipelineError> {
        let mut ivp = NetworkKineticsIVP::from_settings(network, &self.settings)?;
        let (label, file_prefix) = match query_initial {
            Some(c) => {
                ivp.set_initial_concentration(molecule, c)?;
                (
                    format!("{} initial = {:.2}", molecule, c),
                    Some(format!("{}_c0_{}", molecule, c)),
                )
            }
            None => ("base".to_string(), None),
        };
        let trajectory = ivp.solve()?;
        let changes = analyze_changes(&trajectory, &self.settings.thresholds())?;
        info!("scenario '{}' simulated", label);
        Ok(ScenarioResult {
            label,
            query_initial,
            file_prefix,
            trajectory,
            changes,
        })
    }

    /// Prints the network and the change summaries, draws the plots and writes the
    /// csv files of a run.
    pub fn report(&self, run: &PipelineRun) -> Result<(), PipelineError> {
        print_network(&run.network);
        let several = run.scenarios.len() > 1;
        for (i, scenario) in run.scenarios.iter().enumerate() {
            print_summary(&scenario.label, &scenario.changes);
            if self.settings.plot != PlotBackend::Disabled {
                plot_trajectory(
                    &scenario.trajectory,
                    self.settings.plot,
                    scenario.file_prefix.as_deref(),
                )?;
            }
            if let Some(name) = &self.settings.csv_output {
                let name = if several {
                    format!("{}_{}", name, i)
                } else {
                    name.clone()
                };
                save_trajectory_csv(&scenario.trajectory, &name)?;
            }
        }
        Ok(())
    }
}
