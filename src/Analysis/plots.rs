use crate::Analysis::concentration_changes::AnalysisError;
use crate::Kinetics::trajectory::Trajectory;
use RustedSciThe::Utils::logger::save_matrix_to_csv;
use RustedSciThe::Utils::plots::{plots, plots_gnulot, plots_terminal};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// where concentration curves are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotBackend {
    /// image files `<series name>.png` rendered by the plotting backend of RustedSciThe
    #[default]
    Native,
    Gnuplot,
    /// ascii plots in the terminal
    Terminal,
    Disabled,
}

/// Names of the plotted series. Image backends write one file per series name, so
/// scenarios of one run get their own `prefix`.
pub fn series_names(trajectory: &Trajectory, prefix: Option<&str>) -> Vec<String> {
    trajectory
        .species()
        .iter()
        .map(|species| match prefix {
            Some(prefix) => format!("{}_{}", prefix, species),
            None => species.clone(),
        })
        .collect()
}

/// Draws concentration vs time of every species.
pub fn plot_trajectory(
    trajectory: &Trajectory,
    backend: PlotBackend,
    prefix: Option<&str>,
) -> Result<(), AnalysisError> {
    if trajectory.is_empty() {
        return Err(AnalysisError::EmptyTrajectory);
    }
    let arg = "t".to_owned();
    let values = series_names(trajectory, prefix);
    let t = trajectory.time().clone();
    let y = trajectory.concentrations().clone();
    match backend {
        PlotBackend::Native => {
            plots(arg, values, t, y);
        }
        PlotBackend::Gnuplot => {
            plots_gnulot(arg, values, t, y);
        }
        PlotBackend::Terminal => {
            plots_terminal(arg, values, t, y);
        }
        PlotBackend::Disabled => debug!("plotting disabled"),
    }
    Ok(())
}

/// `name` with a `.csv` extension
pub fn csv_file_name(name: &str) -> String {
    if name.to_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}

/// Writes the trajectory as a csv table with a time column and one column per species.
/// Returns the name of the written file.
pub fn save_trajectory_csv(trajectory: &Trajectory, name: &str) -> Result<String, AnalysisError> {
    if trajectory.is_empty() {
        return Err(AnalysisError::EmptyTrajectory);
    }
    let arg_name = "t".to_string();
    let unknowns = trajectory.species().to_vec();
    let file = csv_file_name(name);
    save_matrix_to_csv(
        trajectory.concentrations(),
        &unknowns,
        &file,
        trajectory.time(),
        &arg_name,
    )
    .map_err(|e| AnalysisError::CsvExport {
        file: file.clone(),
        reason: e.to_string(),
    })?;
    info!("trajectory saved to {}", file);
    Ok(file)
}
