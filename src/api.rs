use crate::broker::Broker;
use crate::builder::TopologyBuilder;
use crate::data::{DefaultTree, MassTree, PlacementTree};
use crate::error::NewickError;
use crate::parser::Parser;
use crate::printer::NewickPrinter;
use crate::tree::Tree;

/// Parses a single Newick tree into a ranked broker.
///
/// # Errors
/// Returns a `NewickError::Parser` pointing at the offending position if the input is malformed.
pub fn read_broker(source: &str) -> Result<Broker, NewickError> {
    Parser::new(source).parse_broker()
}

/// Like [`read_broker`], with `file_name` shown in diagnostics.
pub fn read_broker_named(source: &str, file_name: &str) -> Result<Broker, NewickError> {
    Parser::new_with_name(source, file_name.to_string()).parse_broker()
}

/// Parses every tree of `source`, e.g. a file with one tree per line.
pub fn read_brokers(source: &str) -> Result<Vec<Broker>, NewickError> {
    Parser::new(source).parse_all()
}

/// Parses a single tree and builds it with `builder`.
///
/// # Errors
/// Fails on malformed input and on any element a converter of `builder` rejects.
pub fn read_tree<N: Default, E: Default>(
    source: &str,
    builder: &TopologyBuilder<N, E>,
) -> Result<Tree<N, E>, NewickError> {
    let broker = read_broker(source)?;
    builder.build(&broker)
}

/// Parses and builds every tree of `source`.
pub fn read_trees<N: Default, E: Default>(
    source: &str,
    builder: &TopologyBuilder<N, E>,
) -> Result<Vec<Tree<N, E>>, NewickError> {
    read_brokers(source)?
        .iter()
        .map(|broker| builder.build(broker))
        .collect()
}

pub fn read_default_tree(source: &str) -> Result<DefaultTree, NewickError> {
    read_tree(source, &TopologyBuilder::default_tree())
}

/// Every non-root element needs exactly one `{edge_num}` tag.
pub fn read_placement_tree(source: &str) -> Result<PlacementTree, NewickError> {
    read_tree(source, &TopologyBuilder::placement_tree())
}

pub fn read_mass_tree(source: &str) -> Result<MassTree, NewickError> {
    read_tree(source, &TopologyBuilder::mass_tree())
}

/// Flattens `tree` with `builder` and prints it with `printer`.
///
/// # Errors
/// Only converters can fail, e.g. a placement edge without an edge number.
pub fn write_tree<N: Default, E: Default>(
    tree: &Tree<N, E>,
    builder: &TopologyBuilder<N, E>,
    printer: &NewickPrinter,
) -> Result<String, NewickError> {
    let broker = builder.flatten(tree)?;
    Ok(printer.print(&broker)?)
}

pub fn write_default_tree(tree: &DefaultTree) -> Result<String, NewickError> {
    write_tree(tree, &TopologyBuilder::default_tree(), &NewickPrinter::default())
}

pub fn write_placement_tree(tree: &PlacementTree) -> Result<String, NewickError> {
    write_tree(tree, &TopologyBuilder::placement_tree(), &NewickPrinter::default())
}
