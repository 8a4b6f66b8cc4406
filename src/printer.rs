//! Rendering of brokers as Newick text, plus a debug dump of tree graphs.

use crate::broker::{Broker, Element};
use crate::error::PreconditionError;
use crate::tree::Tree;
use crate::utils::{needs_quoting, quote_label, DEFAULT_QUOTATION_MARK};
use std::fmt::{Debug, Write};

/// Formatting options for Newick output.
#[derive(Debug, Clone)]
pub struct NewickPrinter {
    pub print_names: bool,
    /// Prints the first value of each element after a `:`.
    pub print_values: bool,
    pub print_tags: bool,
    pub print_comments: bool,
    pub quotation_mark: char,
    /// Quotes every name, not only those containing reserved characters.
    pub force_quotes: bool,
    pub trailing_newline: bool,
}

impl Default for NewickPrinter {
    fn default() -> Self {
        Self {
            print_names: true,
            print_values: true,
            print_tags: true,
            print_comments: true,
            quotation_mark: DEFAULT_QUOTATION_MARK,
            force_quotes: false,
            trailing_newline: false,
        }
    }
}

/// Position of an inner element whose children are being printed.
struct Group {
    element: usize,
    rank: usize,
    remaining: usize,
}

impl NewickPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, print_tags: bool) -> Self {
        self.print_tags = print_tags;
        self
    }

    pub fn with_comments(mut self, print_comments: bool) -> Self {
        self.print_comments = print_comments;
        self
    }

    pub fn with_quotation_mark(mut self, quotation_mark: char) -> Self {
        self.quotation_mark = quotation_mark;
        self
    }

    pub fn with_force_quotes(mut self, force_quotes: bool) -> Self {
        self.force_quotes = force_quotes;
        self
    }

    pub fn with_trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }

    /// Renders `broker` as one Newick tree, terminated by `;`.
    ///
    /// Works without recursion, so arbitrarily deep trees are fine.
    /// An empty broker prints as a lone `;`.
    pub fn print(&self, broker: &Broker) -> Result<String, PreconditionError> {
        broker.require_ranks("NewickPrinter::print()")?;
        let elements = broker.elements();
        let mut out = String::new();
        let mut groups: Vec<Group> = Vec::new();

        for (index, element) in elements.iter().enumerate() {
            if let Some(group) = groups.last() {
                if group.remaining < group.rank {
                    out.push(',');
                }
            }

            let rank = element.rank()?;
            if rank > 0 {
                out.push('(');
                groups.push(Group {
                    element: index,
                    rank,
                    remaining: rank,
                });
                continue;
            }

            self.write_label(&mut out, element);
            // A finished child may complete its parent, and so on upwards.
            while let Some(group) = groups.last_mut() {
                group.remaining -= 1;
                if group.remaining > 0 {
                    break;
                }
                let finished = group.element;
                groups.pop();
                out.push(')');
                self.write_label(&mut out, &elements[finished]);
            }
        }

        out.push(';');
        if self.trailing_newline {
            out.push('\n');
        }
        Ok(out)
    }

    fn write_label(&self, out: &mut String, element: &Element) {
        if self.print_names && !element.name.is_empty() {
            if self.force_quotes || needs_quoting(&element.name, self.quotation_mark) {
                out.push_str(&quote_label(&element.name, self.quotation_mark));
            } else {
                out.push_str(&element.name);
            }
        }
        if self.print_values {
            if let Some(value) = element.values.first() {
                out.push(':');
                out.push_str(value);
            }
        }
        if self.print_tags {
            for tag in &element.tags {
                out.push('{');
                out.push_str(tag);
                out.push('}');
            }
        }
        if self.print_comments {
            for comment in &element.comments {
                out.push('[');
                out.push_str(comment);
                out.push(']');
            }
        }
    }
}

/// Lists every node, edge and link of `tree` with its indices and payload.
pub fn print_detailed<N: Debug, E: Debug>(tree: &Tree<N, E>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Tree: {} nodes, {} edges, {} links",
        tree.node_count(),
        tree.edge_count(),
        tree.link_count()
    );
    for node in tree.nodes() {
        let role = if tree.is_root(node.index()) {
            "root"
        } else if tree.is_leaf(node.index()) {
            "leaf"
        } else {
            "inner"
        };
        let _ = writeln!(
            out,
            "Node {} ({}, rank {}): primary link {}, data {:?}",
            node.index(),
            role,
            tree.rank(node.index()),
            node.primary_link(),
            node.data
        );
    }
    for edge in tree.edges() {
        let _ = writeln!(
            out,
            "Edge {}: node {} -> node {}, links {}/{}, data {:?}",
            edge.index(),
            tree.edge_primary_node(edge.index()),
            tree.edge_secondary_node(edge.index()),
            edge.primary_link(),
            edge.secondary_link(),
            edge.data
        );
    }
    for link in tree.links() {
        let edge = link
            .edge()
            .map_or_else(|| "-".to_string(), |e| e.to_string());
        let _ = writeln!(
            out,
            "Link {}: node {}, edge {}, next {}, outer {}",
            link.index(),
            link.node(),
            edge,
            link.next(),
            link.outer()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn round_trip(source: &str) -> String {
        let broker = Parser::new(source).parse_broker().unwrap();
        NewickPrinter::default().print(&broker).unwrap()
    }

    #[test]
    fn test_print_reproduces_input() {
        for source in [
            "(A,B,C);",
            "((A,B)C,D)E;",
            "(B:2.0{0},(D:2.0{1},E:2.0{2})C:2.0{3})A:2.0{4};",
            "(A[note],B[x][y])R;",
            "A;",
            "();",
            "((((A))));",
        ] {
            assert_eq!(round_trip(source), source);
        }
    }

    #[test]
    fn test_print_quotes_names() {
        assert_eq!(round_trip("('Homo sapiens','it''s');"), "('Homo sapiens','it''s');");

        let broker = Parser::new("(A,B);").parse_broker().unwrap();
        let printer = NewickPrinter::default().with_force_quotes(true);
        assert_eq!(printer.print(&broker).unwrap(), "('A','B');");
    }

    #[test]
    fn test_print_options() {
        let broker = Parser::new("(A:1{0}[c],B:2{1})R;").parse_broker().unwrap();

        let printer = NewickPrinter::default().with_tags(false).with_comments(false);
        assert_eq!(printer.print(&broker).unwrap(), "(A:1,B:2)R;");

        let printer = NewickPrinter {
            print_names: false,
            print_values: false,
            trailing_newline: true,
            ..NewickPrinter::default()
        };
        assert_eq!(printer.print(&broker).unwrap(), "({0}[c],{1});\n");
    }

    #[test]
    fn test_print_requires_ranks() {
        let mut broker = Broker::new();
        broker.push_child(Element::new("A"));
        assert!(matches!(
            NewickPrinter::default().print(&broker),
            Err(PreconditionError::RanksNotAssigned { .. })
        ));
    }

    #[test]
    fn test_print_deep_tree_without_recursion() {
        let depth = 10_000;
        let source = format!("{}A{};", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(round_trip(&source), source);
    }

    #[test]
    fn test_print_detailed() {
        let mut tree: Tree<&str, f64> = Tree::new("R");
        tree.add_child(0, "A", 1.5);
        let dump = print_detailed(&tree);
        assert!(dump.starts_with("Tree: 2 nodes, 1 edges, 3 links\n"));
        assert!(dump.contains("Node 0 (root, rank 1): primary link 0, data \"R\""));
        assert!(dump.contains("Edge 0: node 0 -> node 1, links 1/2, data 1.5"));
        assert!(dump.contains("Link 0: node 0, edge -, next 1, outer 0"));
    }
}
