/// Directed graph of molecules connected by reactions: every substrate of a reaction
/// gets an edge to every product. Edges carry the forward rate constant used by the
/// kinetics and the ids of all reactions that support them.
pub mod network_builder;
