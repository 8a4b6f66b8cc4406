use newick_core::data::HasName;
use newick_core::{read_placement_tree, write_placement_tree};

fn main() {
    let newick = "(B:2.0{0},(D:2.0{1},E:2.0{2})C:2.0{3})A;";

    match read_placement_tree(newick) {
        Ok(tree) => {
            for node in tree.postorder() {
                let name = tree.node(node).data.name();
                match tree.parent_edge(node) {
                    Some(edge) => {
                        let data = &tree.edge(edge).data;
                        println!(
                            "{name}: edge {:?}, branch length {:?}",
                            data.edge_num, data.branch_length
                        );
                    }
                    None => println!("{name}: root"),
                }
            }
            match write_placement_tree(&tree) {
                Ok(text) => println!("Written back:\n{text}"),
                Err(e) => eprintln!("Failed to write tree: {e:?}"),
            }
        }
        Err(e) => {
            eprintln!("Failed to parse Newick: {:?}", miette::Report::new(e));
        }
    }
}
