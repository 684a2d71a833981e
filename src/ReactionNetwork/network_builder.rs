//! # Reaction Network Builder
//!
//! Builds the directed reaction graph from parsed reactions.
//!
//! - nodes are molecules (KEGG compound ids), one node per id
//! - for every reaction, every substrate gets an edge to every product
//! - a (substrate, product) pair occurring in several reactions is a single edge that
//!   lists all supporting reactions; with `DuplicateEdgePolicy::Accumulate` its rate
//!   constant is the sum of the per-reaction constants, with `Merge` it keeps one constant
//! - a molecule on both sides of a reaction gives a self-loop, its production and
//!   consumption terms cancel in the kinetics
//!
//! Node order is insertion order and is the order of the state vector of the kinetics.
use crate::KEGG::record_parser::Reaction;
use log::{debug, info};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happens when several reactions connect the same substrate and product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateEdgePolicy {
    /// rate constants of all supporting reactions are added up
    #[default]
    Accumulate,
    /// one rate constant no matter how many reactions support the edge
    Merge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEdge {
    /// ids of the reactions behind this substrate -> product relation
    pub reactions: Vec<String>,
    /// first-order forward rate constant
    pub rate_constant: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionNetwork {
    graph: DiGraph<Molecule, ReactionEdge>,
    index: HashMap<String, NodeIndex>,
}

impl ReactionNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Network of all substrate -> product relations of `reactions`.
    pub fn from_reactions(
        reactions: &[Reaction],
        rate_constant: f64,
        policy: DuplicateEdgePolicy,
        include_reverse: bool,
    ) -> Self {
        let mut network = Self::new();
        for reaction in reactions {
            network.add_reaction(reaction, rate_constant, policy, include_reverse);
        }
        info!(
            "reaction network built: {} molecules, {} edges from {} reactions",
            network.node_count(),
            network.edge_count(),
            reactions.len()
        );
        network
    }

    /// Adds a molecule if it is not there yet and returns its node.
    pub fn add_molecule(&mut self, id: &str) -> NodeIndex {
        if let Some(node) = self.index.get(id) {
            return *node;
        }
        let node = self.graph.add_node(Molecule { id: id.to_string() });
        self.index.insert(id.to_string(), node);
        node
    }

    /// Adds edges for the cross product substrates x products of one reaction
    /// (and products x substrates for reversible reactions if `include_reverse`).
    pub fn add_reaction(
        &mut self,
        reaction: &Reaction,
        rate_constant: f64,
        policy: DuplicateEdgePolicy,
        include_reverse: bool,
    ) {
        for substrate in &reaction.substrates {
            for product in &reaction.products {
                self.add_relation(
                    &substrate.id,
                    &product.id,
                    &reaction.id,
                    rate_constant,
                    policy,
                );
                if include_reverse && reaction.reversible {
                    self.add_relation(
                        &product.id,
                        &substrate.id,
                        &reaction.id,
                        rate_constant,
                        policy,
                    );
                }
            }
        }
    }

    /// Adds (or reinforces) the edge `substrate -> product`.
    pub fn add_relation(
        &mut self,
        substrate: &str,
        product: &str,
        reaction_id: &str,
        rate_constant: f64,
        policy: DuplicateEdgePolicy,
    ) {
        let from = self.add_molecule(substrate);
        let to = self.add_molecule(product);
        match self.graph.find_edge(from, to) {
            Some(edge) => {
                let weight = &mut self.graph[edge];
                if weight.reactions.iter().any(|r| r == reaction_id) {
                    return;
                }
                weight.reactions.push(reaction_id.to_string());
                if policy == DuplicateEdgePolicy::Accumulate {
                    weight.rate_constant += rate_constant;
                }
                debug!(
                    "edge {} -> {} also supported by {}",
                    substrate, product, reaction_id
                );
            }
            None => {
                self.graph.add_edge(
                    from,
                    to,
                    ReactionEdge {
                        reactions: vec![reaction_id.to_string()],
                        rate_constant,
                    },
                );
            }
        }
    }

    pub fn graph(&self) -> &DiGraph<Molecule, ReactionEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_molecule(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// molecule ids in node order
    pub fn molecule_ids(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|node| self.graph[node].id.clone())
            .collect()
    }

    pub fn edge(&self, substrate: &str, product: &str) -> Option<&ReactionEdge> {
        let from = self.node_index(substrate)?;
        let to = self.node_index(product)?;
        self.graph
            .find_edge(from, to)
            .map(|edge| &self.graph[edge])
    }

    pub fn has_edge(&self, substrate: &str, product: &str) -> bool {
        self.edge(substrate, product).is_some()
    }

    /// all edges as (substrate, product, edge data)
    pub fn edges(&self) -> Vec<(&str, &str, &ReactionEdge)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.as_str(),
                    self.graph[e.target()].id.as_str(),
                    e.weight(),
                )
            })
            .collect()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, direction: Direction) -> usize {
        self.node_index(id)
            .map(|node| self.graph.edges_directed(node, direction).count())
            .unwrap_or(0)
    }

    /// molecules without any edge
    pub fn isolated_molecules(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|node| {
                self.graph
                    .edges_directed(*node, Direction::Incoming)
                    .next()
                    .is_none()
                    && self
                        .graph
                        .edges_directed(*node, Direction::Outgoing)
                        .next()
                        .is_none()
            })
            .map(|node| self.graph[node].id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEGG::record_parser::{Participant, Reaction};

    fn reaction(id: &str, substrates: &[&str], products: &[&str], reversible: bool) -> Reaction {
        let participants = |ids: &[&str]| {
            ids.iter()
                .map(|id| Participant {
                    id: id.to_string(),
                    coefficient: 1.0,
                })
                .collect::<Vec<Participant>>()
        };
        Reaction {
            id: id.to_string(),
            name: None,
            definition: None,
            substrates: participants(substrates),
            products: participants(products),
            reversible,
        }
    }

    #[test]
    fn test_cross_product_edges() {
        let r = reaction("R00299", &["C00002", "C00031"], &["C00008", "C00092"], true);
        let network = ReactionNetwork::from_reactions(
            &[r.clone()],
            1.0,
            DuplicateEdgePolicy::Accumulate,
            false,
        );
        assert_eq!(network.node_count(), 4);
        assert_eq!(network.edge_count(), 4);
        for s in r.substrate_ids() {
            for p in r.product_ids() {
                assert!(network.has_edge(s, p), "missing edge {} -> {}", s, p);
            }
        }
        assert!(!network.has_edge("C00008", "C00002"));
        assert!(network.contains_molecule("C00031"));
        assert_eq!(network.out_degree("C00031"), 2);
        assert_eq!(network.in_degree("C00092"), 2);
    }

    #[test]
    fn test_node_order_is_insertion_order() {
        let r = reaction("R1", &["B"], &["A"], false);
        let network = ReactionNetwork::from_reactions(&[r], 1.0, DuplicateEdgePolicy::Merge, false);
        assert_eq!(network.molecule_ids(), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_duplicate_edges_accumulate() {
        let reactions = vec![
            reaction("R1", &["A"], &["B"], true),
            reaction("R2", &["A"], &["B"], true),
        ];
        let network = ReactionNetwork::from_reactions(
            &reactions,
            0.5,
            DuplicateEdgePolicy::Accumulate,
            false,
        );
        assert_eq!(network.edge_count(), 1);
        let edge = network.edge("A", "B").unwrap();
        assert_eq!(edge.reactions, vec!["R1".to_string(), "R2".to_string()]);
        assert_eq!(edge.rate_constant, 1.0);
    }

    #[test]
    fn test_duplicate_edges_merge() {
        let reactions = vec![
            reaction("R1", &["A"], &["B"], true),
            reaction("R2", &["A"], &["B"], true),
            reaction("R2", &["A"], &["B"], true),
        ];
        let network =
            ReactionNetwork::from_reactions(&reactions, 0.5, DuplicateEdgePolicy::Merge, false);
        let edge = network.edge("A", "B").unwrap();
        assert_eq!(edge.reactions.len(), 2);
        assert_eq!(edge.rate_constant, 0.5);
    }

    #[test]
    fn test_reverse_edges_only_for_reversible() {
        let reactions = vec![
            reaction("R1", &["A"], &["B"], true),
            reaction("R2", &["B"], &["C"], false),
        ];
        let network =
            ReactionNetwork::from_reactions(&reactions, 1.0, DuplicateEdgePolicy::Accumulate, true);
        assert!(network.has_edge("A", "B"));
        assert!(network.has_edge("B", "A"));
        assert!(network.has_edge("B", "C"));
        assert!(!network.has_edge("C", "B"));
    }

    #[test]
    fn test_self_loop_and_endpoints_exist() {
        let r = reaction("R1", &["C00031", "C00001"], &["C00031", "C00002"], false);
        let network = ReactionNetwork::from_reactions(
            &[r],
            1.0,
            DuplicateEdgePolicy::Accumulate,
            false,
        );
        assert!(network.has_edge("C00031", "C00031"));
        for (s, p, _) in network.edges() {
            assert!(network.contains_molecule(s));
            assert!(network.contains_molecule(p));
        }
    }

    #[test]
    fn test_isolated_molecule() {
        let mut network = ReactionNetwork::new();
        network.add_molecule("C00031");
        network.add_molecule("C00031");
        assert_eq!(network.node_count(), 1);
        assert_eq!(network.edge_count(), 0);
        assert_eq!(network.isolated_molecules(), vec!["C00031".to_string()]);
        assert!(ReactionNetwork::new().is_empty());
    }
}
