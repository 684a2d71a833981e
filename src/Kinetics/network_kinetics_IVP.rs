//! # Reaction Network Kinetics Initial Value Problem
//!
//! Turns a [`ReactionNetwork`] into a system of ODEs and integrates it.
//!
//! ## Rate law
//! Every edge `s -> p` with rate constant `k` is a first-order flux `k*[s]` that
//! consumes `s` and produces `p`:
//!
//! ```text
//! d[X]/dt = sum_{s->X} k*[s] - sum_{X->p} k*[X]
//! ```
//! Self-loops produce and consume the same species and are left out. The total
//! concentration is conserved and concentrations stay non-negative for non-negative
//! initial values (not enforced).
//!
//! ## Usage Pattern
//! 1. `new()` - create the problem for a network, all species start at 1.0
//! 2. `set_time_span()`, `set_initial_concentrations()`, `set_solver()` - configure
//! 3. `check_task()` - validate configuration (called by `solve()`)
//! 4. `solve()` - integrate and get a [`Trajectory`] on a uniform time grid
//!
//! ## Solver
//! Integration is done by `UniversalODESolver` of RustedSciThe. The default is the
//! adaptive RK45 method; BDF, Radau and backward Euler can be chosen for stiff networks.
//! Step control uses the same solver parameters for every method.
use crate::Kinetics::trajectory::{Trajectory, check_time_coverage, linspace, resample};
use crate::ReactionNetwork::network_builder::ReactionNetwork;
use crate::settings::RunSettings;
use RustedSciThe::numerical::ODE_api2::{SolverParam, SolverType, UniversalODESolver};
use RustedSciThe::numerical::Radau::Radau_main::RadauOrder;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::{debug, info, warn};
use nalgebra::DVector;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_INITIAL_CONCENTRATION: f64 = 1.0;

/// numerical method used for the integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverChoice {
    /// explicit Runge-Kutta 4(5) with adaptive step (non-stiff problems)
    #[default]
    RK45,
    BDF,
    Radau,
    BackwardEuler,
}

impl SolverChoice {
    pub fn solver_type(&self) -> SolverType {
        match self {
            SolverChoice::RK45 => SolverType::NonStiff("RK45".to_owned()),
            SolverChoice::BDF => SolverType::BDF,
            SolverChoice::Radau => SolverType::Radau(RadauOrder::Order3),
            SolverChoice::BackwardEuler => SolverType::BackwardEuler,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("reaction network has no molecules")]
    EmptyNetwork,
    #[error("invalid time span: t0 = {t0}, t_end = {t_end}")]
    InvalidTimeSpan { t0: f64, t_end: f64 },
    #[error("at least 2 output points are required, got {0}")]
    InvalidSampleCount(usize),
    #[error("invalid initial concentration {value} for {molecule}")]
    InvalidInitialConcentration { molecule: String, value: f64 },
    #[error("molecule {0} is not part of the reaction network")]
    UnknownMolecule(String),
    #[error("ODE solver failed: {0}")]
    SolverFailed(String),
    #[error("non-finite concentration of {molecule} at t = {time}")]
    NonFiniteResult { molecule: String, time: f64 },
    #[error("trajectory shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

pub struct NetworkKineticsIVP<'a> {
    network: &'a ReactionNetwork,
    /// Numerical solver parameters (step size, tolerance, etc.)
    solver_params: HashMap<String, SolverParam>,
    solver: SolverChoice,
    t0: f64,
    t_end: f64,
    /// number of output samples
    n_points: usize,
    /// initial concentrations in node order
    initial: Vec<f64>,
    /// state variable names c0, c1, ... in node order
    unknowns: Vec<String>,
    species: Vec<String>,
}

impl<'a> NetworkKineticsIVP<'a> {
    /// Problem over `network` with time span 0..10, 100 output points, RK45 and every
    /// species starting at [`DEFAULT_INITIAL_CONCENTRATION`].
    pub fn new(network: &'a ReactionNetwork) -> Self {
        let map_of_params = HashMap::from([
            ("step_size".to_owned(), SolverParam::Float(1e-3)),
            ("tolerance".to_owned(), SolverParam::Float(1e-3)),
            ("max_iterations".to_owned(), SolverParam::Int(100000)),
            ("rtol".to_owned(), SolverParam::Float(1e-3)),
            ("atol".to_owned(), SolverParam::Float(1e-3)),
            ("max_step".to_owned(), SolverParam::Float(0.1)),
            ("first_step".to_owned(), SolverParam::OptionalFloat(None)),
            ("vectorized".to_owned(), SolverParam::Bool(false)),
            ("jac_sparsity".to_owned(), SolverParam::OptionalMatrix(None)),
            ("parallel".to_owned(), SolverParam::Bool(false)),
        ]);
        let species = network.molecule_ids();
        let unknowns = (0..species.len()).map(|i| format!("c{}", i)).collect();
        Self {
            network,
            solver_params: map_of_params,
            solver: SolverChoice::RK45,
            t0: 0.0,
            t_end: 10.0,
            n_points: 100,
            initial: vec![DEFAULT_INITIAL_CONCENTRATION; species.len()],
            unknowns,
            species,
        }
    }

    /// Problem configured from the run settings.
    pub fn from_settings(
        network: &'a ReactionNetwork,
        settings: &RunSettings,
    ) -> Result<Self, SimulationError> {
        let mut ivp = Self::new(network);
        ivp.set_time_span(settings.t0, settings.t_end, settings.n_points)?;
        ivp.set_solver(settings.solver);
        ivp.set_initial_concentrations(
            settings.default_initial_concentration,
            &settings.initial_concentrations,
        )?;
        Ok(ivp)
    }

    pub fn set_time_span(
        &mut self,
        t0: f64,
        t_end: f64,
        n_points: usize,
    ) -> Result<(), SimulationError> {
        if !(t0.is_finite() && t_end.is_finite() && t_end > t0) {
            return Err(SimulationError::InvalidTimeSpan { t0, t_end });
        }
        if n_points < 2 {
            return Err(SimulationError::InvalidSampleCount(n_points));
        }
        self.t0 = t0;
        self.t_end = t_end;
        self.n_points = n_points;
        Ok(())
    }

    pub fn set_solver(&mut self, solver: SolverChoice) {
        self.solver = solver;
    }

    pub fn set_solver_params(&mut self, params: HashMap<String, SolverParam>) {
        self.solver_params = params;
    }

    /// Every species starts at `default`, except those listed in `overrides`.
    /// Overrides for molecules outside the network are ignored with a warning.
    pub fn set_initial_concentrations(
        &mut self,
        default: f64,
        overrides: &HashMap<String, f64>,
    ) -> Result<(), SimulationError> {
        check_concentration("<default>", default)?;
        let mut initial = vec![default; self.species.len()];
        for (molecule, value) in overrides {
            check_concentration(molecule, *value)?;
            match self.species.iter().position(|s| s == molecule) {
                Some(i) => initial[i] = *value,
                None => warn!(
                    "initial concentration given for {}, which is not in the network",
                    molecule
                ),
            }
        }
        self.initial = initial;
        Ok(())
    }

    pub fn set_initial_concentration(
        &mut self,
        molecule: &str,
        value: f64,
    ) -> Result<(), SimulationError> {
        check_concentration(molecule, value)?;
        let i = self
            .species
            .iter()
            .position(|s| s == molecule)
            .ok_or_else(|| SimulationError::UnknownMolecule(molecule.to_string()))?;
        self.initial[i] = value;
        Ok(())
    }

    pub fn initial_concentrations(&self) -> &[f64] {
        &self.initial
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn unknowns(&self) -> &[String] {
        &self.unknowns
    }

    /// Validates that the problem can be handed to the solver.
    pub fn check_task(&self) -> Result<(), SimulationError> {
        if self.species.is_empty() {
            return Err(SimulationError::EmptyNetwork);
        }
        if !(self.t_end > self.t0) {
            return Err(SimulationError::InvalidTimeSpan {
                t0: self.t0,
                t_end: self.t_end,
            });
        }
        if self.n_points < 2 {
            return Err(SimulationError::InvalidSampleCount(self.n_points));
        }
        for (molecule, value) in self.species.iter().zip(self.initial.iter()) {
            check_concentration(molecule, *value)?;
        }
        Ok(())
    }

    /// (source, target, rate constant) of every edge that contributes to the kinetics
    fn fluxes(&self) -> Vec<(usize, usize, f64)> {
        self.network
            .graph()
            .edge_references()
            .filter(|e| e.source() != e.target())
            .map(|e| (e.source().index(), e.target().index(), e.weight().rate_constant))
            .collect()
    }

    /// Symbolic right-hand sides, one per species in node order.
    pub fn create_equations(&self) -> Vec<Expr> {
        let mut terms: Vec<Vec<(f64, Expr)>> = vec![Vec::new(); self.species.len()];
        for (s, p, k) in self.fluxes() {
            let flux = Expr::Const(k) * Expr::Var(self.unknowns[s].clone());
            terms[p].push((1.0, flux.clone()));
            terms[s].push((-1.0, flux));
        }
        terms
            .into_iter()
            .map(|species_terms| {
                species_terms
                    .into_iter()
                    .fold(Expr::Const(0.0), |acc, (sign, flux)| {
                        if sign > 0.0 { acc + flux } else { acc - flux }
                    })
            })
            .collect()
    }

    /// Numerical right-hand side d[X]/dt for the state `y` (node order).
    pub fn rate_of_change(&self, y: &[f64]) -> Vec<f64> {
        let mut dydt = vec![0.0; self.species.len()];
        for (s, p, k) in self.fluxes() {
            let flux = k * y[s];
            dydt[p] += flux;
            dydt[s] -= flux;
        }
        dydt
    }

    /// Integrates the system and resamples the result onto `n_points` uniform samples.
    ///
    /// # Returns
    /// * `Ok(Trajectory)` - concentrations of all species, rows are time samples
    /// * `Err(SimulationError)` - invalid setup or failed integration
    pub fn solve(&self) -> Result<Trajectory, SimulationError> {
        self.check_task()?;
        info!(
            "integrating {} species, {} fluxes on [{}, {}] with {:?}",
            self.species.len(),
            self.fluxes().len(),
            self.t0,
            self.t_end,
            self.solver
        );
        let equations = self.create_equations();
        debug!("equations: {:?}", equations);
        let y0 = DVector::from_vec(self.initial.clone());
        let mut ode = UniversalODESolver::new(
            equations,
            self.unknowns.clone(),
            "t".to_owned(),
            self.solver.solver_type(),
            self.t0,
            y0,
            self.t_end,
        );
        ode.set_parameters(self.solver_params.clone());
        ode.initialize();
        ode.solve();

        let (t_result, y_result) = ode.get_result();
        let t_result = t_result
            .ok_or_else(|| SimulationError::SolverFailed("no time points returned".to_string()))?;
        let y_result = y_result
            .ok_or_else(|| SimulationError::SolverFailed("no solution returned".to_string()))?;
        if t_result.is_empty()
            || y_result.nrows() != t_result.len()
            || y_result.ncols() != self.species.len()
        {
            return Err(SimulationError::SolverFailed(format!(
                "solution has {} time points and {}x{} values, expected {} variables",
                t_result.len(),
                y_result.nrows(),
                y_result.ncols(),
                self.species.len()
            )));
        }
        debug!("solver returned {} time points", t_result.len());

        let t_solver: Vec<f64> = t_result.iter().cloned().collect();
        check_time_coverage(&t_solver, self.t0, self.t_end)?;
        let grid = linspace(self.t0, self.t_end, self.n_points);
        let concentrations = resample(&t_solver, &y_result, &grid);
        for (row, time) in grid.iter().enumerate() {
            for (col, molecule) in self.species.iter().enumerate() {
                if !concentrations[(row, col)].is_finite() {
                    return Err(SimulationError::NonFiniteResult {
                        molecule: molecule.clone(),
                        time: *time,
                    });
                }
            }
        }
        Trajectory::new(
            DVector::from_vec(grid),
            self.species.clone(),
            concentrations,
        )
    }
}

fn check_concentration(molecule: &str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidInitialConcentration {
            molecule: molecule.to_string(),
            value,
        })
    }
}
