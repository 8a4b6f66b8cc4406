//! Node and edge payloads for the common tree flavors.
//!
//! The topology layer never looks into payloads. Converters reach them through
//! the small capability traits below, so a converter works with every payload
//! that offers the field it owns.

use crate::error::FormatError;
use crate::tree::Tree;
use std::collections::HashSet;

pub trait HasName {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

pub trait HasBranchLength {
    fn branch_length(&self) -> Option<f64>;
    fn set_branch_length(&mut self, branch_length: Option<f64>);
}

/// Edge payloads that carry a placement edge number.
pub trait HasEdgeNum {
    fn edge_num(&self) -> Option<usize>;
    fn set_edge_num(&mut self, edge_num: Option<usize>);
    /// Number of placements attached to the edge.
    fn placement_count(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultNodeData {
    pub name: String,
}

impl DefaultNodeData {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HasName for DefaultNodeData {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultEdgeData {
    pub branch_length: Option<f64>,
}

impl HasBranchLength for DefaultEdgeData {
    fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    fn set_branch_length(&mut self, branch_length: Option<f64>) {
        self.branch_length = branch_length;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementEdgeData {
    pub branch_length: Option<f64>,
    /// Identifies the edge independent of its position in the topology.
    pub edge_num: Option<usize>,
    pub placement_count: usize,
}

impl HasBranchLength for PlacementEdgeData {
    fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    fn set_branch_length(&mut self, branch_length: Option<f64>) {
        self.branch_length = branch_length;
    }
}

impl HasEdgeNum for PlacementEdgeData {
    fn edge_num(&self) -> Option<usize> {
        self.edge_num
    }

    fn set_edge_num(&mut self, edge_num: Option<usize>) {
        self.edge_num = edge_num;
    }

    fn placement_count(&self) -> usize {
        self.placement_count
    }
}

/// Edge payload holding a distribution of masses along the branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassEdgeData {
    pub branch_length: Option<f64>,
    masses: Vec<(f64, f64)>,
}

impl MassEdgeData {
    /// Adds `mass` at `position` on the branch. Masses at the same position are summed.
    pub fn add_mass(&mut self, position: f64, mass: f64) {
        match self
            .masses
            .binary_search_by(|(pos, _)| pos.total_cmp(&position))
        {
            Ok(index) => self.masses[index].1 += mass,
            Err(index) => self.masses.insert(index, (position, mass)),
        }
    }

    /// `(position, mass)` pairs, sorted by position.
    pub fn masses(&self) -> &[(f64, f64)] {
        &self.masses
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().map(|(_, mass)| mass).sum()
    }

    pub fn clear_masses(&mut self) {
        self.masses.clear();
    }
}

impl HasBranchLength for MassEdgeData {
    fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    fn set_branch_length(&mut self, branch_length: Option<f64>) {
        self.branch_length = branch_length;
    }
}

pub type DefaultTree = Tree<DefaultNodeData, DefaultEdgeData>;
pub type PlacementTree = Tree<DefaultNodeData, PlacementEdgeData>;
pub type MassTree = Tree<DefaultNodeData, MassEdgeData>;

/// Checks that every edge has an edge number and that no number is used twice.
pub fn validate_edge_nums<N: HasName, E: HasEdgeNum>(tree: &Tree<N, E>) -> Result<(), FormatError> {
    let mut seen = HashSet::new();
    for edge in tree.edges() {
        let node = tree.node(tree.edge_secondary_node(edge.index())).data.name().to_string();
        let edge_num = edge
            .data
            .edge_num()
            .ok_or_else(|| FormatError::MissingEdgeNum { node: node.clone() })?;
        if !seen.insert(edge_num) {
            return Err(FormatError::DuplicateEdgeNum { node, edge_num });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(edge_num: Option<usize>) -> PlacementEdgeData {
        PlacementEdgeData {
            edge_num,
            ..PlacementEdgeData::default()
        }
    }

    #[test]
    fn test_masses_stay_sorted_and_merge() {
        let mut data = MassEdgeData::default();
        data.add_mass(0.5, 1.0);
        data.add_mass(0.1, 2.0);
        data.add_mass(0.5, 0.25);
        assert_eq!(data.masses(), &[(0.1, 2.0), (0.5, 1.25)]);
        assert_eq!(data.total_mass(), 3.25);
        data.clear_masses();
        assert_eq!(data.total_mass(), 0.0);
    }

    #[test]
    fn test_validate_edge_nums() {
        let mut tree = PlacementTree::new(DefaultNodeData::new("R"));
        tree.add_child(0, DefaultNodeData::new("A"), placement(Some(0)));
        tree.add_child(0, DefaultNodeData::new("B"), placement(Some(1)));
        assert!(validate_edge_nums(&tree).is_ok());

        tree.add_child(0, DefaultNodeData::new("C"), placement(Some(1)));
        assert_eq!(
            validate_edge_nums(&tree).unwrap_err(),
            FormatError::DuplicateEdgeNum { node: "C".to_string(), edge_num: 1 }
        );
    }

    #[test]
    fn test_validate_edge_nums_missing() {
        let mut tree = PlacementTree::new(DefaultNodeData::new("R"));
        tree.add_child(0, DefaultNodeData::new("A"), placement(None));
        assert_eq!(
            validate_edge_nums(&tree).unwrap_err(),
            FormatError::MissingEdgeNum { node: "A".to_string() }
        );
    }
}
