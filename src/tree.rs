//! Node/edge/link tree topology.
//!
//! A [`Tree`] owns three arenas. Nodes, edges and links refer to each other
//! only by index, so a tree can be cloned or moved freely.
//!
//! Every node has one *primary* link, pointing towards the root, followed by
//! one link per child. The links of a node form a ring via [`Link::next`]:
//! primary link first, then the child links in sibling order. The two links
//! of an edge point at each other via [`Link::outer`]. The root's primary
//! link has no edge and is its own outer link.
//!
//! ```text
//!        root (node 0)
//!        [p0] -> [l1] -> [l3] -> back to p0       (ring of the root)
//!                  |       |
//!               outer    outer
//!                  |       |
//!                [l2]    [l4]                      (primary links of the children)
//! ```

use crate::error::TopologyError;

/// Index of a node in a [`Tree`].
pub type NodeIndex = usize;
/// Index of an edge in a [`Tree`].
pub type EdgeIndex = usize;
/// Index of a link in a [`Tree`].
pub type LinkIndex = usize;

/// Directed connector between a node and one of its incident edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    index: LinkIndex,
    next: LinkIndex,
    outer: LinkIndex,
    node: NodeIndex,
    edge: Option<EdgeIndex>,
}

impl Link {
    pub fn index(&self) -> LinkIndex {
        self.index
    }

    /// Next link around the same node.
    pub fn next(&self) -> LinkIndex {
        self.next
    }

    /// The other link of the same edge.
    pub fn outer(&self) -> LinkIndex {
        self.outer
    }

    pub fn node(&self) -> NodeIndex {
        self.node
    }

    /// `None` only for the primary link of the root.
    pub fn edge(&self) -> Option<EdgeIndex> {
        self.edge
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    index: NodeIndex,
    primary_link: LinkIndex,
    // Last link of the ring, where the next child is spliced in.
    last_link: LinkIndex,
    pub data: N,
}

impl<N> Node<N> {
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Link of this node that points towards the root.
    pub fn primary_link(&self) -> LinkIndex {
        self.primary_link
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    index: EdgeIndex,
    primary_link: LinkIndex,
    secondary_link: LinkIndex,
    pub data: E,
}

impl<E> Edge<E> {
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    /// Link at the end of the edge closer to the root.
    pub fn primary_link(&self) -> LinkIndex {
        self.primary_link
    }

    /// Link at the end of the edge away from the root.
    pub fn secondary_link(&self) -> LinkIndex {
        self.secondary_link
    }
}

/// A rooted tree with node payload `N` and edge payload `E`.
///
/// Trees only grow: [`Tree::new`] creates the root and [`Tree::add_child`]
/// attaches new leaves. There is no API to remove parts of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<N, E> {
    nodes: Vec<Node<N>>,
    edges: Vec<Edge<E>>,
    links: Vec<Link>,
}

// ============================================================================
// Construction
// ============================================================================
impl<N, E> Tree<N, E> {
    /// Creates a tree that consists of a single root node.
    pub fn new(root_data: N) -> Self {
        Self {
            nodes: vec![Node {
                index: 0,
                primary_link: 0,
                last_link: 0,
                data: root_data,
            }],
            edges: Vec::new(),
            links: vec![Link {
                index: 0,
                next: 0,
                outer: 0,
                node: 0,
                edge: None,
            }],
        }
    }

    /// Attaches a new leaf as the last child of `parent`.
    ///
    /// # Returns
    /// Index of the new node. Its parent edge has the index `node - 1`.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: NodeIndex, node_data: N, edge_data: E) -> NodeIndex {
        assert!(parent < self.nodes.len(), "node {parent} does not exist");

        let node = self.nodes.len();
        let edge = self.edges.len();
        let down_link = self.links.len();
        let up_link = down_link + 1;

        // Splice the new link in right before the parent's primary link,
        // i.e. at the end of the sibling ring.
        let primary = self.nodes[parent].primary_link;
        let last = self.nodes[parent].last_link;
        self.links[last].next = down_link;
        self.nodes[parent].last_link = down_link;

        self.links.push(Link {
            index: down_link,
            next: primary,
            outer: up_link,
            node: parent,
            edge: Some(edge),
        });
        self.links.push(Link {
            index: up_link,
            next: up_link,
            outer: down_link,
            node,
            edge: Some(edge),
        });
        self.edges.push(Edge {
            index: edge,
            primary_link: down_link,
            secondary_link: up_link,
            data: edge_data,
        });
        self.nodes.push(Node {
            index: node,
            primary_link: up_link,
            last_link: up_link,
            data: node_data,
        });
        node
    }

    /// Converts the payloads of all nodes and edges, keeping the topology.
    pub fn map_data<N2, E2>(
        self,
        mut node_fn: impl FnMut(N) -> N2,
        mut edge_fn: impl FnMut(E) -> E2,
    ) -> Tree<N2, E2> {
        Tree {
            nodes: self
                .nodes
                .into_iter()
                .map(|n| Node {
                    index: n.index,
                    primary_link: n.primary_link,
                    last_link: n.last_link,
                    data: node_fn(n.data),
                })
                .collect(),
            edges: self
                .edges
                .into_iter()
                .map(|e| Edge {
                    index: e.index,
                    primary_link: e.primary_link,
                    secondary_link: e.secondary_link,
                    data: edge_fn(e.data),
                })
                .collect(),
            links: self.links,
        }
    }
}

// ============================================================================
// Accessors
// ============================================================================
impl<N, E> Tree<N, E> {
    pub fn root_index(&self) -> NodeIndex {
        0
    }

    pub fn root(&self) -> &Node<N> {
        &self.nodes[0]
    }

    /// First link of the root that leads to a child. `None` if the root is the only node.
    pub fn root_link(&self) -> Option<LinkIndex> {
        let primary = self.nodes[0].primary_link;
        let first = self.links[primary].next;
        (first != primary).then_some(first)
    }

    pub fn node(&self, index: NodeIndex) -> &Node<N> {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node<N> {
        &mut self.nodes[index]
    }

    pub fn edge(&self, index: EdgeIndex) -> &Edge<E> {
        &self.edges[index]
    }

    pub fn edge_mut(&mut self, index: EdgeIndex) -> &mut Edge<E> {
        &mut self.edges[index]
    }

    pub fn link(&self, index: LinkIndex) -> &Link {
        &self.links[index]
    }

    pub fn nodes(&self) -> &[Node<N>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge<E>] {
        &self.edges
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node<N>> {
        self.nodes.iter_mut()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge<E>> {
        self.edges.iter_mut()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn leaf_count(&self) -> usize {
        (0..self.nodes.len()).filter(|&n| self.is_leaf(n)).count()
    }

    pub fn is_root(&self, node: NodeIndex) -> bool {
        node == 0
    }

    pub fn is_leaf(&self, node: NodeIndex) -> bool {
        let primary = self.nodes[node].primary_link;
        self.links[primary].next == primary
    }

    pub fn is_inner(&self, node: NodeIndex) -> bool {
        !self.is_leaf(node)
    }

    /// Number of children of `node`.
    pub fn rank(&self, node: NodeIndex) -> usize {
        self.node_links(node).count() - 1
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        let primary = &self.links[self.nodes[node].primary_link];
        primary.edge.map(|_| self.links[primary.outer].node)
    }

    /// Edge between `node` and its parent.
    pub fn parent_edge(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.links[self.nodes[node].primary_link].edge
    }

    /// Children of `node` in sibling order.
    pub fn children(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_links(node)
            .skip(1)
            .map(move |link| self.links[self.links[link].outer].node)
    }

    /// Links around `node`, starting with its primary link.
    pub fn node_links(&self, node: NodeIndex) -> NodeLinks<'_> {
        let start = self.nodes[node].primary_link;
        NodeLinks {
            links: &self.links,
            start,
            current: Some(start),
        }
    }

    /// Number of edges between `node` and the root.
    pub fn depth(&self, node: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Node at the root side of `edge`.
    pub fn edge_primary_node(&self, edge: EdgeIndex) -> NodeIndex {
        self.links[self.edges[edge].primary_link].node
    }

    /// Node at the far side of `edge`, as seen from the root.
    pub fn edge_secondary_node(&self, edge: EdgeIndex) -> NodeIndex {
        self.links[self.edges[edge].secondary_link].node
    }
}

// ============================================================================
// Validation
// ============================================================================
impl<N, E> Tree<N, E> {
    /// Checks every structural invariant of the node/edge/link triad.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let broken = |link: LinkIndex, reason: &str| TopologyError::BrokenLink {
            link,
            reason: reason.to_string(),
        };

        if self.edges.len() + 1 != self.nodes.len() {
            return Err(TopologyError::NodeCountMismatch {
                nodes: self.nodes.len(),
                edges: self.edges.len(),
            });
        }
        if self.links.len() != 2 * self.edges.len() + 1 {
            return Err(broken(self.links.len(), "link count has to be twice the edge count plus one"));
        }

        for (index, link) in self.links.iter().enumerate() {
            if link.index != index {
                return Err(broken(index, "index does not match arena position"));
            }
            if link.next >= self.links.len() || link.outer >= self.links.len() || link.node >= self.nodes.len() {
                return Err(broken(index, "refers to an element that does not exist"));
            }
            if self.links[link.outer].outer != index {
                return Err(broken(index, "outer link does not point back"));
            }
            if self.links[link.outer].edge != link.edge {
                return Err(broken(index, "outer link belongs to a different edge"));
            }
            match link.edge {
                None if link.outer != index || index != self.nodes[0].primary_link => {
                    return Err(broken(index, "only the root's primary link may lack an edge"));
                }
                None => {}
                Some(edge) => {
                    let edge = self.edges.get(edge).ok_or_else(|| broken(index, "edge does not exist"))?;
                    if edge.primary_link != index && edge.secondary_link != index {
                        return Err(broken(index, "edge does not know this link"));
                    }
                }
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let primary = node.primary_link;
            if node.index != index || self.links[primary].node != index {
                return Err(broken(primary, "primary link does not belong to its node"));
            }
            if self.links.get(node.last_link).map_or(true, |last| last.node != index) {
                return Err(broken(node.last_link, "last link does not belong to its node"));
            }
            // Walk the ring; it has to close before running through every link.
            let mut link = primary;
            let mut steps = 0;
            loop {
                if self.links[link].node != index {
                    return Err(broken(link, "ring contains a link of another node"));
                }
                if link == node.last_link && self.links[link].next != primary {
                    return Err(broken(link, "last link of the ring does not close it"));
                }
                link = self.links[link].next;
                steps += 1;
                if link == primary {
                    break;
                }
                if steps > self.links.len() {
                    return Err(broken(primary, "ring does not close"));
                }
            }
            if index != 0 {
                let edge = self.links[primary]
                    .edge
                    .ok_or_else(|| broken(primary, "non-root node without parent edge"))?;
                if self.edges[edge].secondary_link != primary {
                    return Err(broken(primary, "parent edge is oriented away from the root"));
                }
            }
        }

        // Every node has to be reachable from the root exactly once.
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![0];
        let mut reached = 0;
        while let Some(node) = stack.pop() {
            if seen[node] {
                return Err(broken(self.nodes[node].primary_link, "node is reachable twice"));
            }
            seen[node] = true;
            reached += 1;
            stack.extend(self.children(node));
        }
        if reached != self.nodes.len() {
            return Err(TopologyError::Disconnected {
                reached,
                nodes: self.nodes.len(),
            });
        }
        Ok(())
    }
}

/// Iterator over the ring of links around one node.
#[derive(Debug, Clone)]
pub struct NodeLinks<'a> {
    links: &'a [Link],
    start: LinkIndex,
    current: Option<LinkIndex>,
}

impl Iterator for NodeLinks<'_> {
    type Item = LinkIndex;

    fn next(&mut self) -> Option<LinkIndex> {
        let link = self.current?;
        let next = self.links[link].next;
        self.current = (next != self.start).then_some(next);
        Some(link)
    }
}
