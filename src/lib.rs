pub mod graph;
pub mod cust_error;
pub mod solution;
pub mod kernelization;
pub mod connectivity;
pub mod branching;
pub mod search_tree;
