//! Per-element converters between broker text and tree payloads.
//!
//! A [`TopologyBuilder`](crate::builder::TopologyBuilder) runs its converters
//! in order. Each converter reads and writes only the fields it owns, so
//! stacking a name, a branch length and an edge number converter gives a
//! placement tree without any of them knowing about the others.

use crate::broker::Element;
use crate::data::{HasBranchLength, HasEdgeNum, HasName};
use crate::error::FormatError;

/// Moves data between an [`Element`] and the payloads of its node and parent edge.
///
/// All methods default to doing nothing. Edge methods are never called for the root.
/// Node methods run before edge methods, so `element.name` is already filled in
/// when an edge method reports an error.
pub trait ElementConverter<N, E> {
    fn element_to_node(&self, _element: &Element, _node: &mut N) -> Result<(), FormatError> {
        Ok(())
    }

    fn element_to_edge(&self, _element: &Element, _edge: &mut E) -> Result<(), FormatError> {
        Ok(())
    }

    fn node_to_element(&self, _node: &N, _element: &mut Element) -> Result<(), FormatError> {
        Ok(())
    }

    fn edge_to_element(&self, _edge: &E, _element: &mut Element) -> Result<(), FormatError> {
        Ok(())
    }
}

// ============================================================================
// Names
// ============================================================================

/// Converts node names.
#[derive(Debug, Clone)]
pub struct NameConverter {
    /// Gives unnamed nodes a name depending on their role, and omits such names again on output.
    pub use_default_names: bool,
    pub default_leaf_name: String,
    pub default_inner_name: String,
    pub default_root_name: String,
    /// Reads `_` as space and writes space as `_`.
    pub replace_name_underscores: bool,
}

impl Default for NameConverter {
    fn default() -> Self {
        Self {
            use_default_names: false,
            default_leaf_name: "Leaf Node".to_string(),
            default_inner_name: "Internal Node".to_string(),
            default_root_name: "Root Node".to_string(),
            replace_name_underscores: false,
        }
    }
}

impl NameConverter {
    pub fn with_default_names(mut self, use_default_names: bool) -> Self {
        self.use_default_names = use_default_names;
        self
    }

    pub fn with_replace_underscores(mut self, replace: bool) -> Self {
        self.replace_name_underscores = replace;
        self
    }

    fn default_name(&self, element: &Element) -> &str {
        if element.is_root() {
            &self.default_root_name
        } else if let Ok(0) = element.rank() {
            &self.default_leaf_name
        } else {
            &self.default_inner_name
        }
    }
}

impl<N: HasName, E> ElementConverter<N, E> for NameConverter {
    fn element_to_node(&self, element: &Element, node: &mut N) -> Result<(), FormatError> {
        let mut name = if self.replace_name_underscores {
            element.name.replace('_', " ")
        } else {
            element.name.clone()
        };
        if name.is_empty() && self.use_default_names {
            name = self.default_name(element).to_string();
        }
        node.set_name(name);
        Ok(())
    }

    fn node_to_element(&self, node: &N, element: &mut Element) -> Result<(), FormatError> {
        let name = node.name();
        element.name = if self.use_default_names && name == self.default_name(element) {
            String::new()
        } else if self.replace_name_underscores {
            name.replace(' ', "_")
        } else {
            name.to_string()
        };
        Ok(())
    }
}

// ============================================================================
// Branch lengths
// ============================================================================

/// Converts the first element value to and from a branch length.
#[derive(Debug, Clone, Default)]
pub struct BranchLengthConverter {
    /// Decimal places on output. `None` prints the shortest exact representation.
    pub precision: Option<usize>,
}

impl BranchLengthConverter {
    pub fn with_precision(precision: usize) -> Self {
        Self {
            precision: Some(precision),
        }
    }

    fn format(&self, branch_length: f64) -> String {
        match self.precision {
            Some(precision) => format!("{branch_length:.precision$}"),
            None => branch_length.to_string(),
        }
    }
}

impl<N, E: HasBranchLength> ElementConverter<N, E> for BranchLengthConverter {
    fn element_to_edge(&self, element: &Element, edge: &mut E) -> Result<(), FormatError> {
        let branch_length = match element.values.first() {
            None => None,
            Some(value) => {
                let invalid = || FormatError::InvalidBranchLength {
                    node: element.name.clone(),
                    value: value.clone(),
                };
                let text = value.trim();
                let parsed = text.parse::<f64>().map_err(|_| invalid())?;
                if out_of_range(text, parsed) {
                    return Err(invalid());
                }
                Some(parsed)
            }
        };
        edge.set_branch_length(branch_length);
        Ok(())
    }

    fn edge_to_element(&self, edge: &E, element: &mut Element) -> Result<(), FormatError> {
        if let Some(branch_length) = edge.branch_length() {
            element.values.push(self.format(branch_length));
        }
        Ok(())
    }
}

/// `true` if `text` overflowed to infinity or underflowed to zero while parsing.
fn out_of_range(text: &str, parsed: f64) -> bool {
    if parsed.is_infinite() {
        let literal = text.trim_start_matches(['+', '-']).to_ascii_lowercase();
        return literal != "inf" && literal != "infinity";
    }
    if parsed == 0.0 {
        let mantissa = text.split(['e', 'E']).next().unwrap_or(text);
        return mantissa.chars().any(|c| matches!(c, '1'..='9'));
    }
    false
}

// ============================================================================
// Placement edge numbers
// ============================================================================

/// Reads the placement edge number from the single tag of an element.
#[derive(Debug, Clone)]
pub struct EdgeNumConverter {
    pub print_edge_nums: bool,
    /// Writes the number of placements of each edge as a comment.
    pub print_placement_counts: bool,
}

impl Default for EdgeNumConverter {
    fn default() -> Self {
        Self {
            print_edge_nums: true,
            print_placement_counts: false,
        }
    }
}

impl<N, E: HasEdgeNum> ElementConverter<N, E> for EdgeNumConverter {
    fn element_to_edge(&self, element: &Element, edge: &mut E) -> Result<(), FormatError> {
        let tag = match element.tags.as_slice() {
            [tag] => tag,
            [] => {
                return Err(FormatError::MissingTag {
                    node: element.name.clone(),
                    element: None,
                })
            }
            tags => {
                return Err(FormatError::MultipleTags {
                    node: element.name.clone(),
                    element: None,
                    count: tags.len(),
                })
            }
        };
        let edge_num = tag.trim().parse::<usize>().map_err(|e| FormatError::InvalidEdgeNum {
            node: element.name.clone(),
            element: None,
            value: tag.clone(),
            reason: e.to_string(),
        })?;
        edge.set_edge_num(Some(edge_num));
        Ok(())
    }

    fn edge_to_element(&self, edge: &E, element: &mut Element) -> Result<(), FormatError> {
        if self.print_edge_nums {
            let edge_num = edge.edge_num().ok_or_else(|| FormatError::MissingEdgeNum {
                node: element.name.clone(),
            })?;
            element.tags.push(edge_num.to_string());
        }
        if self.print_placement_counts {
            element.comments.push(edge.placement_count().to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DefaultEdgeData, DefaultNodeData, PlacementEdgeData};

    type PlacementConv = dyn ElementConverter<DefaultNodeData, PlacementEdgeData>;
    type DefaultConv = dyn ElementConverter<DefaultNodeData, DefaultEdgeData>;

    fn leaf(name: &str) -> Element {
        let mut element = Element::new(name).with_depth(1);
        element.set_rank(0);
        element
    }

    #[test]
    fn test_name_converter_defaults() {
        let converter = NameConverter::default().with_default_names(true);
        let conv: &DefaultConv = &converter;

        let mut node = DefaultNodeData::default();
        conv.element_to_node(&leaf(""), &mut node).unwrap();
        assert_eq!(node.name, "Leaf Node");

        let mut root = Element::default();
        root.set_rank(2);
        conv.element_to_node(&root, &mut node).unwrap();
        assert_eq!(node.name, "Root Node");

        let mut element = Element::default();
        element.set_rank(2);
        conv.node_to_element(&node, &mut element).unwrap();
        assert_eq!(element.name, "");
    }

    #[test]
    fn test_name_converter_underscores() {
        let converter = NameConverter::default().with_replace_underscores(true);
        let conv: &DefaultConv = &converter;

        let mut node = DefaultNodeData::default();
        conv.element_to_node(&leaf("Homo_sapiens"), &mut node).unwrap();
        assert_eq!(node.name, "Homo sapiens");

        let mut element = leaf("");
        conv.node_to_element(&node, &mut element).unwrap();
        assert_eq!(element.name, "Homo_sapiens");
    }

    #[test]
    fn test_branch_length() {
        let converter = BranchLengthConverter::default();
        let conv: &DefaultConv = &converter;

        let mut edge = DefaultEdgeData::default();
        conv.element_to_edge(&leaf("A").with_value("0.25"), &mut edge).unwrap();
        assert_eq!(edge.branch_length, Some(0.25));

        conv.element_to_edge(&leaf("A"), &mut edge).unwrap();
        assert_eq!(edge.branch_length, None);

        let err = conv
            .element_to_edge(&leaf("A").with_value("abc"), &mut edge)
            .unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidBranchLength { node: "A".to_string(), value: "abc".to_string() }
        );
    }

    #[test]
    fn test_branch_length_out_of_range() {
        let converter = BranchLengthConverter::default();
        let conv: &DefaultConv = &converter;
        let mut edge = DefaultEdgeData::default();

        for value in ["1e999", "-1e999", "1e-400", "0.5E-400"] {
            let err = conv
                .element_to_edge(&leaf("A").with_value(value), &mut edge)
                .unwrap_err();
            assert_eq!(
                err,
                FormatError::InvalidBranchLength { node: "A".to_string(), value: value.to_string() }
            );
        }

        for (value, expected) in [("0", 0.0), ("0.000e-400", 0.0), ("-0.0", 0.0), ("1e300", 1e300)] {
            conv.element_to_edge(&leaf("A").with_value(value), &mut edge).unwrap();
            assert_eq!(edge.branch_length, Some(expected));
        }
        conv.element_to_edge(&leaf("A").with_value("inf"), &mut edge).unwrap();
        assert_eq!(edge.branch_length, Some(f64::INFINITY));
    }

    #[test]
    fn test_branch_length_output() {
        let edge = DefaultEdgeData { branch_length: Some(2.0) };

        let mut element = leaf("A");
        let shortest: &DefaultConv = &BranchLengthConverter::default();
        shortest.edge_to_element(&edge, &mut element).unwrap();
        assert_eq!(element.values, vec!["2"]);

        let mut element = leaf("A");
        let fixed: &DefaultConv = &BranchLengthConverter::with_precision(3);
        fixed.edge_to_element(&edge, &mut element).unwrap();
        assert_eq!(element.values, vec!["2.000"]);
    }

    #[test]
    fn test_edge_num_requires_single_tag() {
        let converter = EdgeNumConverter::default();
        let conv: &PlacementConv = &converter;
        let mut edge = PlacementEdgeData::default();

        conv.element_to_edge(&leaf("A").with_tag("7"), &mut edge).unwrap();
        assert_eq!(edge.edge_num, Some(7));

        assert_eq!(
            conv.element_to_edge(&leaf("A"), &mut edge).unwrap_err(),
            FormatError::MissingTag { node: "A".to_string(), element: None }
        );
        assert_eq!(
            conv.element_to_edge(&leaf("A").with_tag("1").with_tag("2"), &mut edge)
                .unwrap_err(),
            FormatError::MultipleTags { node: "A".to_string(), element: None, count: 2 }
        );
        assert!(matches!(
            conv.element_to_edge(&leaf("A").with_tag("-1"), &mut edge),
            Err(FormatError::InvalidEdgeNum { .. })
        ));
    }

    #[test]
    fn test_edge_num_output() {
        let converter = EdgeNumConverter {
            print_edge_nums: true,
            print_placement_counts: true,
        };
        let conv: &PlacementConv = &converter;

        let edge = PlacementEdgeData {
            branch_length: None,
            edge_num: Some(3),
            placement_count: 5,
        };
        let mut element = leaf("A");
        conv.edge_to_element(&edge, &mut element).unwrap();
        assert_eq!(element.tags, vec!["3"]);
        assert_eq!(element.comments, vec!["5"]);

        let mut element = leaf("A");
        let err = conv
            .edge_to_element(&PlacementEdgeData::default(), &mut element)
            .unwrap_err();
        assert_eq!(err, FormatError::MissingEdgeNum { node: "A".to_string() });
    }
}
