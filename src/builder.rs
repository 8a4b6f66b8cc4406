//! Conversion between a ranked [`Broker`] and a [`Tree`].

use crate::broker::{Broker, Element};
use crate::converter::{BranchLengthConverter, EdgeNumConverter, ElementConverter, NameConverter};
use crate::data::{DefaultEdgeData, DefaultNodeData, MassEdgeData, PlacementEdgeData};
use crate::error::{FormatError, NewickError, TopologyError};
use crate::tree::{NodeIndex, Tree};
use log::{debug, trace};

/// Builds trees from brokers and flattens trees back into brokers,
/// running an ordered list of converters on every element.
pub struct TopologyBuilder<N, E> {
    converters: Vec<Box<dyn ElementConverter<N, E>>>,
}

/// An inner node of the tree under construction that still expects children.
struct OpenNode {
    node: NodeIndex,
    element: usize,
    depth: usize,
    expected: usize,
    remaining: usize,
}

impl<N, E> Default for TopologyBuilder<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> TopologyBuilder<N, E> {
    /// A builder without converters. Payloads stay at their default values.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    pub fn with_converter(mut self, converter: impl ElementConverter<N, E> + 'static) -> Self {
        self.push_converter(converter);
        self
    }

    pub fn push_converter(&mut self, converter: impl ElementConverter<N, E> + 'static) {
        self.converters.push(Box::new(converter));
    }

    pub fn converter_count(&self) -> usize {
        self.converters.len()
    }

    fn element_to_node(&self, position: usize, element: &Element, node: &mut N) -> Result<(), FormatError> {
        for converter in &self.converters {
            converter
                .element_to_node(element, node)
                .map_err(|e| e.at_element(position))?;
        }
        Ok(())
    }

    fn element_to_edge(&self, position: usize, element: &Element, edge: &mut E) -> Result<(), FormatError> {
        for converter in &self.converters {
            converter
                .element_to_edge(element, edge)
                .map_err(|e| e.at_element(position))?;
        }
        Ok(())
    }
}

impl<N: Default, E: Default> TopologyBuilder<N, E> {
    /// Materializes the tree described by `broker`.
    ///
    /// # Errors
    /// - [`NewickError::Precondition`] if the broker's ranks are not assigned.
    /// - [`NewickError::Topology`] if the elements do not describe a single tree.
    /// - [`NewickError::Format`] if a converter rejects an element.
    ///
    /// No partial tree is returned on failure.
    pub fn build(&self, broker: &Broker) -> Result<Tree<N, E>, NewickError> {
        broker.require_ranks("TopologyBuilder::build()")?;
        let elements = broker.elements();
        let root_element = elements.first().ok_or(TopologyError::EmptyBroker)?;
        if root_element.depth != 0 {
            return Err(TopologyError::InvalidRootDepth {
                depth: root_element.depth,
            }
            .into());
        }

        let mut root_data = N::default();
        self.element_to_node(0, root_element, &mut root_data)?;
        let mut tree = Tree::new(root_data);

        let mut open: Vec<OpenNode> = Vec::new();
        let root_rank = root_element.rank()?;
        if root_rank > 0 {
            open.push(OpenNode {
                node: tree.root_index(),
                element: 0,
                depth: 0,
                expected: root_rank,
                remaining: root_rank,
            });
        }

        for (index, element) in elements.iter().enumerate().skip(1) {
            while open.last().is_some_and(|top| top.remaining == 0) {
                open.pop();
            }
            let parent = open
                .last_mut()
                .ok_or(TopologyError::MultipleRoots { index })?;
            if element.depth != parent.depth + 1 {
                return Err(TopologyError::DepthJump {
                    index,
                    from: parent.depth,
                    to: element.depth,
                }
                .into());
            }
            parent.remaining -= 1;
            let parent_node = parent.node;

            let mut node_data = N::default();
            self.element_to_node(index, element, &mut node_data)?;
            let mut edge_data = E::default();
            self.element_to_edge(index, element, &mut edge_data)?;
            let node = tree.add_child(parent_node, node_data, edge_data);
            trace!("Element {} became node {} below node {}", index, node, parent_node);

            let rank = element.rank()?;
            if rank > 0 {
                open.push(OpenNode {
                    node,
                    element: index,
                    depth: element.depth,
                    expected: rank,
                    remaining: rank,
                });
            }
        }

        if let Some(unfinished) = open.iter().find(|o| o.remaining > 0) {
            return Err(TopologyError::MissingChildren {
                index: unfinished.element,
                expected: unfinished.expected,
                found: unfinished.expected - unfinished.remaining,
            }
            .into());
        }

        tree.validate()?;
        debug!(
            "Built tree with {} nodes and {} edges",
            tree.node_count(),
            tree.edge_count()
        );
        Ok(tree)
    }

    /// Writes `tree` into a new broker in preorder. The broker comes back ranked.
    ///
    /// # Errors
    /// Only converters can fail, e.g. when a payload lacks a field they have to print.
    pub fn flatten(&self, tree: &Tree<N, E>) -> Result<Broker, NewickError> {
        let depths = tree.depths();
        let mut elements = Vec::with_capacity(tree.node_count());

        for node in tree.preorder() {
            let mut element = Element::default().with_depth(depths[node]);
            element.set_rank(tree.rank(node));

            for converter in &self.converters {
                converter.node_to_element(&tree.node(node).data, &mut element)?;
            }
            if let Some(edge) = tree.parent_edge(node) {
                for converter in &self.converters {
                    converter.edge_to_element(&tree.edge(edge).data, &mut element)?;
                }
            }
            elements.push(element);
        }

        let mut broker = Broker::from_preorder(elements);
        broker.assign_ranks()?;
        debug!("Flattened tree into {} elements", broker.len());
        Ok(broker)
    }
}

impl TopologyBuilder<DefaultNodeData, DefaultEdgeData> {
    /// Names and branch lengths.
    pub fn default_tree() -> Self {
        Self::new()
            .with_converter(NameConverter::default())
            .with_converter(BranchLengthConverter::default())
    }
}

impl TopologyBuilder<DefaultNodeData, PlacementEdgeData> {
    /// Names, branch lengths and one edge number tag per edge.
    pub fn placement_tree() -> Self {
        Self::new()
            .with_converter(NameConverter::default())
            .with_converter(BranchLengthConverter::default())
            .with_converter(EdgeNumConverter::default())
    }
}

impl TopologyBuilder<DefaultNodeData, MassEdgeData> {
    pub fn mass_tree() -> Self {
        Self::new()
            .with_converter(NameConverter::default())
            .with_converter(BranchLengthConverter::default())
    }
}
