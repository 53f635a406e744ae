//! Binary that takes a graph in its text format (path argument or standard in), computes a
//! maximum independent set and writes the solution next to the input or to standard out.

use std::env;
use std::error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};

use log::info;
use pick_and_prune::{
    cust_error::ProcessingError, graph::Graph, search_tree::solve_mis, solution::MisInstance,
};

pub fn main() -> Result<(), Box<dyn error::Error>> {
    env_logger::init();
    let path = env::args().nth(1);
    let graph = match &path {
        Some(path) => Graph::read_graph(BufReader::new(File::open(path)?))?,
        None => {
            let stdin = io::stdin();
            let stdin = stdin.lock();
            Graph::read_graph(stdin)?
        }
    };
    info!("read a graph with {} nodes", graph.num_nodes());
    let original = graph.clone();
    let solution = solve_mis(graph)?;
    info!("found an independent set of size {}", solution.len());

    // Validate
    if !original.is_independent(&solution) {
        return Err(Box::new(ProcessingError::InvalidSolution(
            "two selected nodes are adjacent".to_owned(),
        )));
    }

    match path {
        Some(path) => {
            let out = BufWriter::new(File::create(format!("{}.mis", path))?);
            MisInstance::write_solution(&solution, out)?;
        }
        None => {
            let stdout = io::stdout();
            let stdout = stdout.lock();
            MisInstance::write_solution(&solution, stdout)?;
        }
    }
    Ok(())
}
