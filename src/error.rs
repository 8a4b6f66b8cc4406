use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Every error this crate can produce, grouped by the stage that detects it.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum NewickError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Topology(#[from] TopologyError),
}

/// Malformed Newick input. Always points at the offending source position.
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Parser Error")]
pub enum ParserError {
    #[error("Unterminated quoted label (line {line}, column {column})")]
    #[diagnostic(
        code(parser::unterminated_quote),
        help("A quoted label was opened but the input ended before the closing quote.")
    )]
    UnterminatedQuote {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended inside this quoted label")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Unterminated '{open}' (line {line}, column {column})")]
    #[diagnostic(
        code(parser::unterminated_bracket),
        help("A tag '{{...}}' or comment '[...]' was opened but never closed.")
    )]
    UnterminatedBracket {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended before this was closed")]
        span: SourceSpan,
        open: char,
        line: usize,
        column: usize,
    },

    #[error("Unbalanced parentheses (line {line}, column {column})")]
    #[diagnostic(
        code(parser::unbalanced_parentheses),
        help("The input ended while at least one parenthesis group was still open.")
    )]
    UnbalancedParentheses {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected ')' before this point")]
        span: SourceSpan,
        open: usize,
        line: usize,
        column: usize,
    },

    #[error("Unmatched closing parenthesis (line {line}, column {column})")]
    #[diagnostic(
        code(parser::unmatched_close),
        help("There is no open '(' that this ')' could close.")
    )]
    UnmatchedClose {
        #[source_code]
        src: NamedSource<String>,
        #[label("No matching '(' for this")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Comma outside of any parenthesis group (line {line}, column {column})")]
    #[diagnostic(
        code(parser::stray_comma),
        help("Siblings can only be separated inside '(' and ')'. A tree has exactly one root.")
    )]
    StrayComma {
        #[source_code]
        src: NamedSource<String>,
        #[label("This comma has no enclosing group")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Missing ';' at end of tree (line {line}, column {column})")]
    #[diagnostic(
        code(parser::missing_terminator),
        help("Every Newick tree has to end with a semicolon.")
    )]
    MissingTerminator {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected ';' here")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Multiple terminators (line {line}, column {column})")]
    #[diagnostic(
        code(parser::multiple_terminators),
        help("The tree was already terminated by an earlier ';'.")
    )]
    MultipleTerminators {
        #[source_code]
        src: NamedSource<String>,
        #[label("Second ';' here")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Trailing content after ';' (line {line}, column {column})")]
    #[diagnostic(
        code(parser::trailing_content),
        help("A single Newick tree cannot be followed by anything but whitespace.")
    )]
    TrailingContent {
        #[source_code]
        src: NamedSource<String>,
        #[label("Unexpected content after the tree")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Unexpected token (line {line}, column {column})")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("Empty input")]
    #[diagnostic(
        code(parser::empty_input),
        help("The input does not contain any tree.")
    )]
    EmptyInput {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected a tree here")]
        span: SourceSpan,
    },
}

/// An operation was called before the data it depends on was computed.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Broker::assign_ranks() was not called before {operation}")]
    #[diagnostic(
        code(precondition::ranks_not_assigned),
        help("Call Broker::assign_ranks() after the last modification of the broker.")
    )]
    RanksNotAssigned { operation: &'static str },
}

/// Element content that a converter could not interpret.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error(
        "Edge at node '{node}'{} does not contain a tag value like '{{42}}' for its edge number",
        location(.element)
    )]
    #[diagnostic(code(format::missing_tag))]
    MissingTag { node: String, element: Option<usize> },

    #[error(
        "Edge at node '{node}'{} contains {count} tag values, expected exactly one edge number",
        location(.element)
    )]
    #[diagnostic(code(format::multiple_tags))]
    MultipleTags {
        node: String,
        element: Option<usize>,
        count: usize,
    },

    #[error(
        "Edge at node '{node}'{} has invalid edge number '{value}': {reason}",
        location(.element)
    )]
    #[diagnostic(code(format::invalid_edge_num))]
    InvalidEdgeNum {
        node: String,
        element: Option<usize>,
        value: String,
        reason: String,
    },

    #[error("Node '{node}' has invalid branch length '{value}'")]
    #[diagnostic(code(format::invalid_branch_length))]
    InvalidBranchLength { node: String, value: String },

    #[error("Edge at node '{node}' has no edge number assigned")]
    #[diagnostic(code(format::missing_edge_num))]
    MissingEdgeNum { node: String },

    #[error("Edge number {edge_num} is used by more than one edge (second at node '{node}')")]
    #[diagnostic(code(format::duplicate_edge_num))]
    DuplicateEdgeNum { node: String, edge_num: usize },
}

impl FormatError {
    /// Records the preorder position of the offending element in variants that have a field for it.
    pub fn at_element(mut self, position: usize) -> Self {
        match &mut self {
            FormatError::MissingTag { element, .. }
            | FormatError::MultipleTags { element, .. }
            | FormatError::InvalidEdgeNum { element, .. } => *element = Some(position),
            _ => {}
        }
        self
    }
}

fn location(element: &Option<usize>) -> String {
    element.map_or_else(String::new, |position| format!(" (element {position})"))
}

/// A broker or graph that does not describe a single connected tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Cannot build a tree from an empty broker")]
    #[diagnostic(code(topology::empty_broker))]
    EmptyBroker,

    #[error("First element has depth {depth}, but a tree has to start at its root (depth 0)")]
    #[diagnostic(code(topology::invalid_root_depth))]
    InvalidRootDepth { depth: usize },

    #[error("Element {index} is a second root (depth 0)")]
    #[diagnostic(code(topology::multiple_roots))]
    MultipleRoots { index: usize },

    #[error("Element {index} jumps from depth {from} to depth {to}")]
    #[diagnostic(
        code(topology::depth_jump),
        help("In preorder, the depth can only increase by one from one element to the next.")
    )]
    DepthJump { index: usize, from: usize, to: usize },

    #[error("Element {index} expects {expected} children, but only {found} follow it")]
    #[diagnostic(code(topology::missing_children))]
    MissingChildren {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Tree has {nodes} nodes but {edges} edges")]
    #[diagnostic(code(topology::node_count_mismatch))]
    NodeCountMismatch { nodes: usize, edges: usize },

    #[error("Link {link} is inconsistent: {reason}")]
    #[diagnostic(code(topology::broken_link))]
    BrokenLink { link: usize, reason: String },

    #[error("Only {reached} of {nodes} nodes are reachable from the root")]
    #[diagnostic(code(topology::disconnected))]
    Disconnected { reached: usize, nodes: usize },
}
