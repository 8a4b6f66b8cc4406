use crate::broker::{Broker, Element};
use crate::error::PreconditionError;
use serde::Serialize;

/// Deepest [`TreeValue`] that [`TreeValue::to_json`] and [`TreeValue::to_yaml`] accept.
///
/// Serde serializes nested values recursively. Deeper trees can still be
/// written flat through [`Broker::to_json`] and [`Broker::to_yaml`].
pub const MAX_NESTING_DEPTH: usize = 256;

/// Nested, serializable view of a ranked broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeValue {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeValue>,
}

impl TreeValue {
    fn from_element(element: &Element) -> Self {
        Self {
            name: element.name.clone(),
            values: element.values.clone(),
            tags: element.tags.clone(),
            comments: element.comments.clone(),
            children: Vec::new(),
        }
    }

    /// Number of edges on the longest path from this value to a leaf.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((value, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(value.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    fn check_depth<S: serde::ser::Error>(&self) -> Result<(), S> {
        let depth = self.depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(S::custom(format!(
                "tree is nested {depth} levels deep, at most {MAX_NESTING_DEPTH} can be serialized nested"
            )));
        }
        Ok(())
    }

    /// Serializes the tree into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails or the tree is
    /// deeper than [`MAX_NESTING_DEPTH`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.check_depth::<serde_json::Error>()?;
        serde_json::to_string_pretty(self)
    }

    /// Serializes the tree into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails or the tree is
    /// deeper than [`MAX_NESTING_DEPTH`].
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        self.check_depth::<serde_yaml::Error>()?;
        serde_yaml::to_string(self)
    }
}

impl Drop for TreeValue {
    // Unlinks children onto a heap stack so dropping deep trees does not recurse.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut value) = stack.pop() {
            stack.append(&mut value.children);
        }
    }
}

/// Nests the elements of `broker` according to their ranks.
/// Returns `None` for an empty broker.
pub(crate) fn to_value(broker: &Broker) -> Result<Option<TreeValue>, PreconditionError> {
    broker.require_ranks("Broker::to_value()")?;
    // Inner values waiting for children, with the number of children still missing.
    let mut open: Vec<(TreeValue, usize)> = Vec::new();

    for element in broker {
        let mut value = TreeValue::from_element(element);
        let rank = element.rank()?;
        if rank > 0 {
            open.push((value, rank));
            continue;
        }
        // Attach the finished value; this may finish its parent as well.
        loop {
            let Some((parent, remaining)) = open.last_mut() else {
                return Ok(Some(value));
            };
            parent.children.push(value);
            *remaining -= 1;
            if *remaining > 0 {
                break;
            }
            match open.pop() {
                Some((finished, _)) => value = finished,
                None => break,
            }
        }
    }
    Ok(None)
}

impl Broker {
    /// Converts the broker into a nested [`TreeValue`] for serialization.
    pub fn to_value(&self) -> Result<Option<TreeValue>, PreconditionError> {
        to_value(self)
    }

    /// Serializes the flat preorder element list, including depths and ranks,
    /// into a pretty-printed JSON string. Works for trees of any depth.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the flat preorder element list into a YAML string.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
