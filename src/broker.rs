//! The broker: a flat, preorder list of tree elements.
//!
//! A [`Broker`] is the exchange format between Newick text and the
//! [`Tree`](crate::tree::Tree) graph. Each [`Element`] stores the raw textual
//! attributes of one node, plus its depth. Parent/child relations are implicit
//! in the sequence of depths and become queryable after
//! [`Broker::assign_ranks`] has computed the number of children of every element.

use crate::error::{PreconditionError, TopologyError};
use crate::resolver;
use serde::Serialize;

/// One node of a tree as read from or written to Newick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Element {
    /// Name of the node. Empty if none was given.
    pub name: String,
    /// Raw values of the node, e.g. the branch length of the edge leading to its parent.
    pub values: Vec<String>,
    /// Content of `{...}` blocks, in input order.
    pub tags: Vec<String>,
    /// Content of `[...]` blocks, in input order.
    pub comments: Vec<String>,
    /// Distance from the root. The root has depth 0.
    pub depth: usize,
    rank: Option<usize>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Number of immediate children.
    ///
    /// # Errors
    /// [`PreconditionError::RanksNotAssigned`] if [`Broker::assign_ranks`] was not called.
    pub fn rank(&self) -> Result<usize, PreconditionError> {
        self.rank
            .ok_or(PreconditionError::RanksNotAssigned { operation: "Element::rank()" })
    }

    pub fn has_rank(&self) -> bool {
        self.rank.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn is_leaf(&self) -> Result<bool, PreconditionError> {
        match self.rank {
            Some(rank) => Ok(rank == 0),
            None => Err(PreconditionError::RanksNotAssigned { operation: "Element::is_leaf()" }),
        }
    }

    pub fn is_inner(&self) -> Result<bool, PreconditionError> {
        match self.rank {
            Some(rank) => Ok(rank > 0),
            None => Err(PreconditionError::RanksNotAssigned { operation: "Element::is_inner()" }),
        }
    }

    pub(crate) fn set_rank(&mut self, rank: usize) {
        self.rank = Some(rank);
    }

    pub(crate) fn clear_rank(&mut self) {
        self.rank = None;
    }
}

/// Ordered, preorder sequence of [`Element`]s describing one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Broker {
    elements: Vec<Element>,
    #[serde(skip)]
    ranked: bool,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `element` as the first child of the last element.
    /// On an empty broker, `element` becomes the root.
    pub fn push_child(&mut self, mut element: Element) -> &mut Element {
        element.depth = self.elements.last().map_or(0, |last| last.depth + 1);
        self.push_element(element)
    }

    /// Appends `element` as the next sibling of the last element.
    ///
    /// # Errors
    /// The root cannot have siblings, and an empty broker has nothing to be a sibling of.
    pub fn push_sibling(&mut self, mut element: Element) -> Result<&mut Element, TopologyError> {
        let depth = match self.elements.last() {
            None => return Err(TopologyError::EmptyBroker),
            Some(last) if last.depth == 0 => {
                return Err(TopologyError::MultipleRoots { index: self.elements.len() })
            }
            Some(last) => last.depth,
        };
        element.depth = depth;
        Ok(self.push_element(element))
    }

    /// Appends `element` with the depth it already carries, after checking that the
    /// depth sequence still describes a tree in preorder.
    pub fn push(&mut self, element: Element) -> Result<&mut Element, TopologyError> {
        let index = self.elements.len();
        match self.elements.last() {
            None if element.depth != 0 => {
                return Err(TopologyError::InvalidRootDepth { depth: element.depth })
            }
            Some(_) if element.depth == 0 => return Err(TopologyError::MultipleRoots { index }),
            Some(last) if element.depth > last.depth + 1 => {
                return Err(TopologyError::DepthJump {
                    index,
                    from: last.depth,
                    to: element.depth,
                })
            }
            _ => {}
        }
        Ok(self.push_element(element))
    }

    /// Wraps elements whose depths were produced by the parser.
    pub(crate) fn from_preorder(elements: Vec<Element>) -> Self {
        Self {
            elements,
            ranked: false,
        }
    }

    fn push_element(&mut self, mut element: Element) -> &mut Element {
        self.invalidate_ranks();
        element.clear_rank();
        self.elements.push(element);
        let last = self.elements.len() - 1;
        &mut self.elements[last]
    }

    /// Computes the rank of every element and validates the depth sequence.
    /// Must be called after the last structural change and before any rank query.
    pub fn assign_ranks(&mut self) -> Result<(), TopologyError> {
        resolver::assign_ranks(&mut self.elements)?;
        self.ranked = true;
        Ok(())
    }

    /// Whether [`Broker::assign_ranks`] ran after the last modification.
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    /// Checks the depth sequence without touching ranks.
    pub fn validate(&self) -> Result<(), TopologyError> {
        resolver::validate_depths(&self.elements)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.ranked = false;
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Mutable access to an element. Changing its depth makes existing ranks stale,
    /// so they are dropped.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.invalidate_ranks();
        self.elements.get_mut(index)
    }

    pub fn root(&self) -> Option<&Element> {
        self.elements.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// See [`Broker::get_mut`] on ranks.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.invalidate_ranks();
        self.elements.iter_mut()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn leaf_count(&self) -> Result<usize, PreconditionError> {
        self.require_ranks("Broker::leaf_count()")?;
        Ok(self.elements.iter().filter(|e| e.rank == Some(0)).count())
    }

    pub fn inner_count(&self) -> Result<usize, PreconditionError> {
        self.require_ranks("Broker::inner_count()")?;
        Ok(self.elements.iter().filter(|e| e.rank.is_some_and(|r| r > 0)).count())
    }

    /// Highest rank of any element, or `None` for an empty broker.
    pub fn max_rank(&self) -> Result<Option<usize>, PreconditionError> {
        self.require_ranks("Broker::max_rank()")?;
        Ok(self.elements.iter().filter_map(|e| e.rank).max())
    }

    /// `true` if every inner element has exactly two children.
    pub fn is_bifurcating(&self) -> Result<bool, PreconditionError> {
        self.require_ranks("Broker::is_bifurcating()")?;
        Ok(self
            .elements
            .iter()
            .all(|e| matches!(e.rank, Some(0) | Some(2))))
    }

    pub(crate) fn require_ranks(&self, operation: &'static str) -> Result<(), PreconditionError> {
        if self.ranked {
            Ok(())
        } else {
            Err(PreconditionError::RanksNotAssigned { operation })
        }
    }

    fn invalidate_ranks(&mut self) {
        if self.ranked {
            self.ranked = false;
            self.elements.iter_mut().for_each(Element::clear_rank);
        }
    }
}

impl<'a> IntoIterator for &'a Broker {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
