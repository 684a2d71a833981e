#[allow(non_snake_case)]
pub mod Analysis;
#[allow(non_snake_case)]
pub mod KEGG;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod ReactionNetwork;
pub mod cli;
pub mod pipeline;
mod pipeline_tests;
pub mod settings;
