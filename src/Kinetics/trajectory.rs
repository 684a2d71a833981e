use crate::Kinetics::network_kinetics_IVP::SimulationError;
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeMap;

/// Concentrations of every species on a common time grid.
/// Rows of `concentrations` are time samples, columns are species.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    time: DVector<f64>,
    species: Vec<String>,
    concentrations: DMatrix<f64>,
}

impl Trajectory {
    pub fn new(
        time: DVector<f64>,
        species: Vec<String>,
        concentrations: DMatrix<f64>,
    ) -> Result<Self, SimulationError> {
        if concentrations.nrows() != time.len() || concentrations.ncols() != species.len() {
            return Err(SimulationError::ShapeMismatch {
                expected: (time.len(), species.len()),
                found: (concentrations.nrows(), concentrations.ncols()),
            });
        }
        Ok(Self {
            time,
            species,
            concentrations,
        })
    }

    pub fn time(&self) -> &DVector<f64> {
        &self.time
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn concentrations(&self) -> &DMatrix<f64> {
        &self.concentrations
    }

    pub fn n_points(&self) -> usize {
        self.time.len()
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty() || self.species.is_empty()
    }

    pub fn species_index(&self, id: &str) -> Option<usize> {
        self.species.iter().position(|s| s == id)
    }

    pub fn column(&self, id: &str) -> Option<Vec<f64>> {
        let i = self.species_index(id)?;
        Some(self.concentrations.column(i).iter().cloned().collect())
    }

    /// (time, concentration) samples of one species
    pub fn series(&self, id: &str) -> Option<Vec<(f64, f64)>> {
        let values = self.column(id)?;
        Some(self.time.iter().cloned().zip(values).collect())
    }

    pub fn initial_value(&self, id: &str) -> Option<f64> {
        let i = self.species_index(id)?;
        (self.n_points() > 0).then(|| self.concentrations[(0, i)])
    }

    pub fn final_value(&self, id: &str) -> Option<f64> {
        let i = self.species_index(id)?;
        let last = self.n_points().checked_sub(1)?;
        Some(self.concentrations[(last, i)])
    }

    /// molecule id -> (time, concentration) samples
    pub fn to_map(&self) -> BTreeMap<String, Vec<(f64, f64)>> {
        self.species
            .iter()
            .filter_map(|id| self.series(id).map(|s| (id.clone(), s)))
            .collect()
    }

    pub fn all_finite(&self) -> bool {
        self.concentrations.iter().all(|c| c.is_finite())
    }
}

/// Uniform grid of `n` points from `t0` to `t_end` (both included).
pub fn linspace(t0: f64, t_end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t0],
        _ => {
            let h = (t_end - t0) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { t_end } else { t0 + h * i as f64 })
                .collect()
        }
    }
}

/// Checks that solver time points cover `[t0, t_end]`. An integration that stopped
/// early returns a shorter time vector; resampling it would repeat the last state.
pub fn check_time_coverage(t: &[f64], t0: f64, t_end: f64) -> Result<(), SimulationError> {
    let eps = 1e-6 * (t_end - t0).abs().max(1.0);
    let (Some(first), Some(last)) = (t.first(), t.last()) else {
        return Err(SimulationError::SolverFailed(
            "no time points returned".to_string(),
        ));
    };
    if *first > t0 + eps || *last < t_end - eps {
        return Err(SimulationError::SolverFailed(format!(
            "integration covers [{}, {}] instead of [{}, {}]",
            first, last, t0, t_end
        )));
    }
    Ok(())
}

/// Linear interpolation of the solver output (`t`, rows of `y`) onto `grid`.
/// Grid points outside the solver range take the nearest boundary value.
pub fn resample(t: &[f64], y: &DMatrix<f64>, grid: &[f64]) -> DMatrix<f64> {
    let ncols = y.ncols();
    let mut out = DMatrix::zeros(grid.len(), ncols);
    if t.is_empty() {
        return out;
    }
    let last = t.len() - 1;
    for (row, &tg) in grid.iter().enumerate() {
        // first solver point with time >= tg
        let upper = t.partition_point(|&ti| ti < tg);
        for col in 0..ncols {
            out[(row, col)] = if upper == 0 {
                y[(0, col)]
            } else if upper > last {
                y[(last, col)]
            } else {
                let (t_a, t_b) = (t[upper - 1], t[upper]);
                let (y_a, y_b) = (y[(upper - 1, col)], y[(upper, col)]);
                if t_b == t_a {
                    y_b
                } else {
                    y_a + (y_b - y_a) * (tg - t_a) / (t_b - t_a)
                }
            };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        let grid = linspace(0.0, 10.0, 11);
        assert_eq!(grid.len(), 11);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[10], 10.0);
        assert_relative_eq!(grid[3], 3.0, epsilon = 1e-12);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }

    #[test]
    fn test_resample_linear() {
        let t = vec![0.0, 1.0, 3.0];
        let y = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 1.0, 3.0, 1.0]);
        let grid = vec![-1.0, 0.0, 0.5, 2.0, 3.0, 4.0];
        let r = resample(&t, &y, &grid);
        assert_eq!(r.nrows(), 6);
        assert_relative_eq!(r[(0, 0)], 0.0);
        assert_relative_eq!(r[(2, 0)], 0.5);
        assert_relative_eq!(r[(3, 0)], 2.0);
        assert_relative_eq!(r[(4, 0)], 3.0);
        assert_relative_eq!(r[(5, 0)], 3.0);
        assert!(r.column(1).iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_truncated_solver_output_is_rejected() {
        // solver gave up at t = 3.2 on [0, 10]
        let t: Vec<f64> = (0..=32).map(|i| i as f64 * 0.1).collect();
        assert!(matches!(
            check_time_coverage(&t, 0.0, 10.0),
            Err(SimulationError::SolverFailed(_))
        ));
        // resampling alone would hide it behind a flat tail
        let y = DMatrix::from_fn(t.len(), 1, |i, _| (-0.5 * t[i]).exp());
        let r = resample(&t, &y, &linspace(0.0, 10.0, 11));
        assert_eq!(r[(9, 0)], r[(10, 0)]);

        let late_start = vec![0.5, 5.0, 10.0];
        assert!(check_time_coverage(&late_start, 0.0, 10.0).is_err());
        assert!(check_time_coverage(&[], 0.0, 10.0).is_err());
    }

    #[test]
    fn test_full_solver_output_is_accepted() {
        let t = vec![0.0, 2.5, 7.0, 10.0 - 1e-9];
        assert!(check_time_coverage(&t, 0.0, 10.0).is_ok());
    }

    #[test]
    fn test_trajectory_accessors() {
        let time = DVector::from_vec(vec![0.0, 1.0]);
        let c = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.5, 0.5]);
        let trajectory =
            Trajectory::new(time, vec!["A".to_string(), "B".to_string()], c).unwrap();
        assert_eq!(trajectory.n_points(), 2);
        assert_eq!(trajectory.initial_value("A"), Some(1.0));
        assert_eq!(trajectory.final_value("B"), Some(0.5));
        assert_eq!(trajectory.series("A").unwrap(), vec![(0.0, 1.0), (1.0, 0.5)]);
        assert!(trajectory.series("C").is_none());
        assert_eq!(trajectory.to_map().len(), 2);
        assert!(trajectory.all_finite());
    }

    #[test]
    fn test_shape_mismatch() {
        let time = DVector::from_vec(vec![0.0, 1.0, 2.0]);
        let c = DMatrix::zeros(2, 1);
        assert!(matches!(
            Trajectory::new(time, vec!["A".to_string()], c),
            Err(SimulationError::ShapeMismatch { .. })
        ));
    }
}
