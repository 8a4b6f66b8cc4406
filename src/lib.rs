pub mod api;
pub mod broker;
pub mod builder;
pub mod converter;
pub mod data;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod resolver;
mod serialization;
pub mod traversal;
pub mod tree;
pub mod utils;

pub use api::{
    read_broker, read_broker_named, read_brokers, read_default_tree, read_mass_tree,
    read_placement_tree, read_tree, read_trees, write_default_tree, write_placement_tree,
    write_tree,
};
pub use broker::{Broker, Element};
pub use builder::TopologyBuilder;
pub use error::NewickError;
pub use printer::NewickPrinter;
pub use serialization::{TreeValue, MAX_NESTING_DEPTH};
pub use tree::Tree;
