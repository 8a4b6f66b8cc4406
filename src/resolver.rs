//! Rank resolution: a single pass over a broker that derives the number of
//! children of every element from the depth sequence.

use crate::broker::Element;
use crate::error::TopologyError;
use log::debug;

/// Sets the rank of every element.
///
/// Walks the elements once, keeping a stack of open ancestors. An element at
/// depth `d` closes every open ancestor at depth `>= d`; the ancestor left on
/// top is its parent, whose rank grows by one.
///
/// # Errors
/// Fails without assigning anything if the depths do not describe a single tree in preorder.
pub fn assign_ranks(elements: &mut [Element]) -> Result<(), TopologyError> {
    validate_depths(elements)?;

    let mut ranks = vec![0usize; elements.len()];
    let mut open: Vec<usize> = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        while let Some(&top) = open.last() {
            if elements[top].depth >= element.depth {
                open.pop();
            } else {
                break;
            }
        }
        if let Some(&parent) = open.last() {
            ranks[parent] += 1;
        }
        open.push(index);
    }

    for (element, rank) in elements.iter_mut().zip(ranks) {
        element.set_rank(rank);
    }
    debug!("Assigned ranks to {} elements", elements.len());
    Ok(())
}

/// Checks that `elements` is the preorder depth sequence of exactly one tree:
/// it starts at depth 0, never returns to depth 0, and never grows by more than one.
pub fn validate_depths(elements: &[Element]) -> Result<(), TopologyError> {
    let Some(first) = elements.first() else {
        return Ok(());
    };
    if first.depth != 0 {
        return Err(TopologyError::InvalidRootDepth { depth: first.depth });
    }

    for (index, pair) in elements.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.depth == 0 {
            return Err(TopologyError::MultipleRoots { index: index + 1 });
        }
        if cur.depth > prev.depth + 1 {
            return Err(TopologyError::DepthJump {
                index: index + 1,
                from: prev.depth,
                to: cur.depth,
            });
        }
    }
    Ok(())
}
