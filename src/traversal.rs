//! Tree traversals built on the Euler tour over links.
//!
//! The tour starts at the first child link of the root and repeatedly moves
//! to `outer(link).next`. The root's primary link has no edge and is skipped,
//! so a tour over a tree with `E` edges yields exactly `2E` steps: every edge
//! is passed once downwards and once upwards.

use crate::tree::{Edge, Link, LinkIndex, Node, NodeIndex, Tree};

/// One position of the Euler tour.
#[derive(Debug)]
pub struct TourStep<'a, N, E> {
    pub link: &'a Link,
    pub node: &'a Node<N>,
    pub edge: &'a Edge<E>,
}

impl<N, E> TourStep<'_, N, E> {
    /// `true` if the tour is about to descend into a child of [`TourStep::node`].
    pub fn is_downward(&self) -> bool {
        self.link.index() != self.node.primary_link()
    }
}

// Manual impls: the step only holds references, so no bounds on N and E.
impl<N, E> Clone for TourStep<'_, N, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, E> Copy for TourStep<'_, N, E> {}

/// Iterator over the Euler tour of a [`Tree`].
#[derive(Debug)]
pub struct EulerTour<'a, N, E> {
    tree: &'a Tree<N, E>,
    start: Option<LinkIndex>,
    current: Option<LinkIndex>,
}

impl<'a, N, E> EulerTour<'a, N, E> {
    fn new(tree: &'a Tree<N, E>, start: Option<LinkIndex>) -> Self {
        Self {
            tree,
            start,
            current: start,
        }
    }

    fn advance(&self, link: LinkIndex) -> LinkIndex {
        let links = self.tree.links();
        let mut next = links[links[link].outer()].next();
        // The root's primary link is the only edgeless link; it never ends a lone
        // loop because the tour is only created for trees with at least one edge.
        while links[next].edge().is_none() {
            next = links[links[next].outer()].next();
        }
        next
    }
}

impl<'a, N, E> Iterator for EulerTour<'a, N, E> {
    type Item = TourStep<'a, N, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let next = self.advance(index);
        self.current = (Some(next) != self.start).then_some(next);

        let link = self.tree.link(index);
        let edge = self.tree.edge(link.edge()?);
        Some(TourStep {
            link,
            node: self.tree.node(link.node()),
            edge,
        })
    }
}

/// Preorder over node indices: every node before its children, siblings in order.
#[derive(Debug)]
pub struct Preorder<'a, N, E> {
    tour: EulerTour<'a, N, E>,
    root_pending: bool,
}

impl<N, E> Iterator for Preorder<'_, N, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if self.root_pending {
            self.root_pending = false;
            return Some(self.tour.tree.root_index());
        }
        let tree = self.tour.tree;
        self.tour
            .by_ref()
            .find(|step| step.is_downward())
            .map(|step| tree.link(step.link.outer()).node())
    }
}

/// Postorder over node indices: every node after its children, root last.
#[derive(Debug)]
pub struct Postorder<'a, N, E> {
    tour: EulerTour<'a, N, E>,
    root_pending: bool,
}

impl<N, E> Iterator for Postorder<'_, N, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if let Some(step) = self.tour.by_ref().find(|step| !step.is_downward()) {
            return Some(step.node.index());
        }
        if self.root_pending {
            self.root_pending = false;
            return Some(self.tour.tree.root_index());
        }
        None
    }
}

impl<N, E> Tree<N, E> {
    /// Euler tour over the whole tree, starting at the root.
    pub fn euler_tour(&self) -> EulerTour<'_, N, E> {
        EulerTour::new(self, self.root_link())
    }

    /// Euler tour that starts and ends at `link`.
    ///
    /// Starting at the root's primary link is the same as [`Tree::euler_tour`].
    pub fn euler_tour_from(&self, link: LinkIndex) -> EulerTour<'_, N, E> {
        let start = match self.link(link).edge() {
            Some(_) => Some(link),
            None => self.root_link(),
        };
        EulerTour::new(self, start)
    }

    pub fn preorder(&self) -> Preorder<'_, N, E> {
        Preorder {
            tour: self.euler_tour(),
            root_pending: true,
        }
    }

    pub fn postorder(&self) -> Postorder<'_, N, E> {
        Postorder {
            tour: self.euler_tour(),
            root_pending: true,
        }
    }

    /// Leaves in the order they appear in preorder.
    pub fn leaves(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.preorder().filter(move |&node| self.is_leaf(node))
    }

    /// Depth of every node, indexed by [`NodeIndex`].
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.node_count()];
        for node in self.preorder() {
            if let Some(parent) = self.parent(node) {
                depths[node] = depths[parent] + 1;
            }
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((A,B)C,D)R, nodes added in preorder.
    fn sample_tree() -> Tree<&'static str, ()> {
        let mut tree = Tree::new("R");
        let c = tree.add_child(0, "C", ());
        tree.add_child(c, "A", ());
        tree.add_child(c, "B", ());
        tree.add_child(0, "D", ());
        tree
    }

    fn names(tree: &Tree<&'static str, ()>, order: impl Iterator<Item = NodeIndex>) -> Vec<&'static str> {
        order.map(|n| tree.node(n).data).collect()
    }

    #[test]
    fn test_euler_tour_visits_every_edge_twice() {
        let tree = sample_tree();
        let steps: Vec<_> = tree.euler_tour().collect();
        assert_eq!(steps.len(), 2 * tree.edge_count());

        let visited: Vec<&str> = steps.iter().map(|s| s.node.data).collect();
        assert_eq!(visited, vec!["R", "C", "A", "C", "B", "C", "R", "D"]);

        for edge in tree.edges() {
            assert_eq!(steps.iter().filter(|s| s.edge.index() == edge.index()).count(), 2);
        }
    }

    #[test]
    fn test_euler_tour_of_single_node() {
        let tree: Tree<&str, ()> = Tree::new("R");
        assert_eq!(tree.euler_tour().count(), 0);
        assert_eq!(names(&tree, tree.preorder()), vec!["R"]);
        assert_eq!(names(&tree, tree.postorder()), vec!["R"]);
    }

    #[test]
    fn test_euler_tour_from_inner_link() {
        let tree = sample_tree();
        let link = tree.root_link().unwrap();
        let second = tree.link(tree.link(link).outer()).next();
        let steps: Vec<_> = tree.euler_tour_from(second).collect();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[0].node.data, "C");
        assert_eq!(steps[7].node.data, "R");
    }

    #[test]
    fn test_preorder() {
        let tree = sample_tree();
        assert_eq!(names(&tree, tree.preorder()), vec!["R", "C", "A", "B", "D"]);
    }

    #[test]
    fn test_postorder() {
        let tree = sample_tree();
        assert_eq!(names(&tree, tree.postorder()), vec!["A", "B", "C", "D", "R"]);
    }

    #[test]
    fn test_leaves_and_depths() {
        let tree = sample_tree();
        assert_eq!(names(&tree, tree.leaves()), vec!["A", "B", "D"]);
        assert_eq!(tree.depths(), vec![0, 1, 2, 2, 1]);
    }

    #[test]
    fn test_path_tree() {
        let mut tree = Tree::new("R");
        let a = tree.add_child(0, "A", ());
        tree.add_child(a, "B", ());
        assert_eq!(tree.euler_tour().count(), 4);
        assert_eq!(names(&tree, tree.preorder()), vec!["R", "A", "B"]);
        assert_eq!(names(&tree, tree.postorder()), vec!["B", "A", "R"]);
    }
}
