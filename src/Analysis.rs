/// initial vs final concentrations of every species, classified by the size of the change
pub mod concentration_changes;
/// rendering of trajectories: native plots, gnuplot, terminal plots and csv export
pub mod plots;
/// tables printed to the terminal: fetched reactions, skipped records, network edges, summary
pub mod report;
