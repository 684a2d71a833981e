//! Console tables of a run: the reactions found for a molecule, the records that
//! could not be parsed, the edges of the network and the final concentration changes.
//! Each `*_table` function builds a `prettytable::Table` (header row first), the
//! `print_*` functions write it to stdout.
use crate::Analysis::concentration_changes::{SpeciesChange, count_by_magnitude};
use crate::KEGG::record_parser::{ParseFailure, Reaction};
use crate::ReactionNetwork::network_builder::ReactionNetwork;
use prettytable::{Cell, Row, Table, row};

pub fn reactions_table(reactions: &[Reaction]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Reaction ID", "Name", "Equation", "Description"]);
    for reaction in reactions {
        table.add_row(Row::new(vec![
            Cell::new(&reaction.id),
            Cell::new(reaction.name.as_deref().unwrap_or("-")),
            Cell::new(&reaction.equation()),
            Cell::new(reaction.definition.as_deref().unwrap_or("-")),
        ]));
    }
    table
}

pub fn print_reactions(molecule: &str, reactions: &[Reaction]) {
    println!("{}", "=".repeat(50));
    println!("Reactions involving {}: {} found", molecule, reactions.len());
    println!("{}", "=".repeat(50));
    if reactions.is_empty() {
        println!("No valid reactions found.");
        return;
    }
    reactions_table(reactions).printstd();
}

pub fn failures_table(failures: &[ParseFailure]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Record", "Reason"]);
    for failure in failures {
        table.add_row(Row::new(vec![
            Cell::new(failure.record_id.as_deref().unwrap_or("<unknown>")),
            Cell::new(&failure.error.to_string()),
        ]));
    }
    table
}

pub fn print_failures(failures: &[ParseFailure]) {
    if failures.is_empty() {
        println!("\nNo malformed records encountered.");
        return;
    }
    println!("\nSkipped records due to formatting issues:");
    failures_table(failures).printstd();
}

/// substrate -> product edges with the reactions behind them
pub fn edges_table(network: &ReactionNetwork) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Substrate", "Product", "k", "Reactions"]);
    for (substrate, product, edge) in network.edges() {
        table.add_row(Row::new(vec![
            Cell::new(substrate),
            Cell::new(product),
            Cell::new(&format!("{:.2}", edge.rate_constant)),
            Cell::new(&edge.reactions.join(", ")),
        ]));
    }
    table
}

pub fn print_network(network: &ReactionNetwork) {
    println!("____________________REACTION NETWORK_________________________");
    println!(
        "{} molecules, {} edges",
        network.node_count(),
        network.edge_count()
    );
    edges_table(network).printstd();
}

pub fn summary_table(changes: &[SpeciesChange]) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "Molecule",
        "Initial",
        "Final",
        "Change",
        "Relative Change",
        "Magnitude"
    ]);
    for change in changes {
        let relative = match change.relative_change {
            Some(r) => format!("{:.2}", r),
            None => "-".to_string(),
        };
        table.add_row(Row::new(vec![
            Cell::new(&change.molecule),
            Cell::new(&format!("{:.2}", change.initial)),
            Cell::new(&format!("{:.2}", change.final_value)),
            Cell::new(&format!("{:.2}", change.absolute_change)),
            Cell::new(&relative),
            Cell::new(&change.magnitude.to_string()),
        ]));
    }
    table
}

pub fn print_summary(label: &str, changes: &[SpeciesChange]) {
    println!("\nSummary of Changes in Concentrations ({}):", label);
    summary_table(changes).printstd();
    let (minor, moderate, major) = count_by_magnitude(changes);
    println!(
        "Minor: {}  Moderate: {}  Major: {}",
        minor, moderate, major
    );
}
