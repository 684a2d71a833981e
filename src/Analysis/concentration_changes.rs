use crate::Kinetics::trajectory::Trajectory;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("trajectory has no samples or no species")]
    EmptyTrajectory,
    #[error("failed to write {file}: {reason}")]
    CsvExport { file: String, reason: String },
}

/// Size class of a concentration change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeMagnitude {
    Minor,
    Moderate,
    Major,
}

impl fmt::Display for ChangeMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ChangeMagnitude::Minor => "Minor",
            ChangeMagnitude::Moderate => "Moderate",
            ChangeMagnitude::Major => "Major",
        };
        write!(f, "{}", name)
    }
}

/// Bucket limits on |relative change|: up to `minor` (included) is Minor, up to
/// `major` (included) is Moderate, the rest is Major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeThresholds {
    pub minor: f64,
    pub major: f64,
}

impl Default for ChangeThresholds {
    fn default() -> Self {
        Self {
            minor: 0.1,
            major: 1.0,
        }
    }
}

impl ChangeThresholds {
    pub fn classify(&self, magnitude: f64) -> ChangeMagnitude {
        if magnitude <= self.minor {
            ChangeMagnitude::Minor
        } else if magnitude <= self.major {
            ChangeMagnitude::Moderate
        } else {
            ChangeMagnitude::Major
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesChange {
    pub molecule: String,
    pub initial: f64,
    pub final_value: f64,
    /// final - initial
    pub absolute_change: f64,
    /// (final - initial) / initial, undefined for a zero initial concentration
    pub relative_change: Option<f64>,
    pub magnitude: ChangeMagnitude,
}

/// Compares first and last sample of every species.
/// Species starting at zero are classified by their absolute change.
pub fn analyze_changes(
    trajectory: &Trajectory,
    thresholds: &ChangeThresholds,
) -> Result<Vec<SpeciesChange>, AnalysisError> {
    if trajectory.is_empty() {
        return Err(AnalysisError::EmptyTrajectory);
    }
    let c = trajectory.concentrations();
    let last = trajectory.n_points() - 1;
    let changes = trajectory
        .species()
        .iter()
        .enumerate()
        .map(|(i, molecule)| {
            let initial = c[(0, i)];
            let final_value = c[(last, i)];
            let absolute_change = final_value - initial;
            let relative_change = (initial != 0.0).then(|| absolute_change / initial);
            let magnitude =
                thresholds.classify(relative_change.unwrap_or(absolute_change).abs());
            SpeciesChange {
                molecule: molecule.clone(),
                initial,
                final_value,
                absolute_change,
                relative_change,
                magnitude,
            }
        })
        .collect();
    Ok(changes)
}

/// number of species in each class (Minor, Moderate, Major)
pub fn count_by_magnitude(changes: &[SpeciesChange]) -> (usize, usize, usize) {
    changes
        .iter()
        .fold((0, 0, 0), |(minor, moderate, major), change| match change.magnitude {
            ChangeMagnitude::Minor => (minor + 1, moderate, major),
            ChangeMagnitude::Moderate => (minor, moderate + 1, major),
            ChangeMagnitude::Major => (minor, moderate, major + 1),
        })
}
