//! The search tree orchestrator: an array-backed tree of search nodes driven iteratively with
//! an explicit going-down/going-up flag, so recursion depth never depends on the graph size.
//!
//! Each node reduces its instance to a fixpoint, lowers theta while the maximum degree drops,
//! then either decomposes on a vertex cut or branches on the selected pattern. Children own
//! private copies of the state; once both have merged into their parent they are detached and
//! released, bounding memory to the active search path.
//!
//! Merge policies: an ordinary branch keeps the larger child (ties to the right); a
//! disconnection concatenates the vertex-disjoint child solutions; a cut branch runs the
//! three-way refinement, re-solving both sides once the primary child used the cut vertex.

use fxhash::FxHashSet;
use log::debug;
use crate::branching::{self, BranchOp, BranchPlan, Pattern};
use crate::connectivity::{self, CutDecision};
use crate::cust_error::ProcessingError;
use crate::graph::{Graph, NodeId};
use crate::kernelization::RECOMMENDED;
use crate::solution::MisInstance;

/// The allocator for synthetic identifiers (hypernodes, merge placeholders). Owned by the
/// orchestrator and passed down explicitly; identifiers increase monotonically and are never
/// reused, across all branches of one search.
#[derive(Debug)]
pub struct IdAlloc {
    next: NodeId,
}

impl IdAlloc {

    pub fn new(start: NodeId) -> Self {
        IdAlloc { next: start }
    }

    pub fn alloc(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }

}

#[derive(Debug, Clone)]
enum Decision {
    /// An ordinary two-way branch.
    Branch(BranchPlan),
    /// The graph fell apart on its own; solve the pieces independently and concatenate.
    Split { primary: Vec<NodeId>, rest: Vec<NodeId> },
    /// An articulation point: left solves the primary piece plus the cut vertex, right the
    /// rest without it.
    Cut { cut: NodeId, primary: Vec<NodeId>, rest: Vec<NodeId> },
}

/// The stage of a cut branch across the three-way refinement.
#[derive(Debug, Clone)]
enum CutStage {
    Cut,
    /// The primary child used the cut vertex. The saved first-round results are recombined
    /// with the refinement children: `CutRight1` re-solves the far side without the cut's
    /// closed neighborhood, `CutRight2` the primary side without the cut vertex.
    CutRight { first_left: Vec<NodeId>, first_right: Vec<NodeId> },
}

#[derive(Debug)]
pub struct SearchNode {
    theta: usize,
    ins: MisInstance,
    decision: Option<Decision>,
    cut_stage: CutStage,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    result: Option<Vec<NodeId>>,
}

impl SearchNode {

    fn new(theta: usize, ins: MisInstance, parent: Option<usize>) -> Self {
        SearchNode {
            theta,
            ins,
            decision: None,
            cut_stage: CutStage::Cut,
            parent,
            left: None,
            right: None,
            result: None,
        }
    }

}

pub struct SearchTree {
    nodes: Vec<Option<SearchNode>>,
    alloc: IdAlloc,
}

/// Computes a maximum independent set of `graph`, returned as a sorted identifier sequence.
pub fn solve_mis(graph: Graph) -> Result<Vec<NodeId>, ProcessingError> {
    SearchTree::new(graph).run()
}

impl SearchTree {

    pub fn new(graph: Graph) -> Self {
        let alloc = IdAlloc::new(graph.num_reserved());
        let theta = graph.max_degree(None).clamp(3, 8);
        let root = SearchNode::new(theta, MisInstance::new(graph), None);
        SearchTree { nodes: vec![Some(root)], alloc }
    }

    fn node(&self, idx: usize) -> &SearchNode {
        self.nodes[idx].as_ref().expect("`idx` names a live search node")
    }

    /// Drives the reduce, decompose-or-branch, recurse, merge loop to completion and returns
    /// the root solution.
    pub fn run(&mut self) -> Result<Vec<NodeId>, ProcessingError> {
        let mut current = 0usize;
        let mut descending = true;
        loop {
            if descending {
                self.expand(current)?;
                if self.node(current).result.is_some() {
                    descending = false;
                } else {
                    current = self.node(current).left.expect("an inner node has a left child");
                }
                continue;
            }
            // Going back up: the subtree below `current` is finished.
            match self.node(current).parent {
                None => {
                    let root = self.nodes[current].take().expect("root is live");
                    return Ok(root.result.expect("the root was finished"));
                }
                Some(parent) => {
                    let left = self.node(parent).left.expect("a branched node has a left child");
                    let right = self.node(parent).right.expect("a branched node has a right child");
                    if self.node(left).result.is_none() {
                        current = left;
                        descending = true;
                    } else if self.node(right).result.is_none() {
                        current = right;
                        descending = true;
                    } else {
                        self.merge(parent)?;
                        current = parent;
                        if self.node(parent).result.is_none() {
                            // The merge spawned refinement children.
                            current = self.node(parent).left.expect("refined node has a left child");
                            descending = true;
                        }
                    }
                }
            }
        }
    }

    /// Reduces the node, finalizes it if its graph ran empty, and otherwise decides on a cut or
    /// a branch and creates the two children.
    fn expand(&mut self, idx: usize) -> Result<(), ProcessingError> {
        let SearchTree { nodes, alloc } = self;
        let node = nodes[idx].as_mut().expect("`idx` names a live search node");
        if node.result.is_some() || node.left.is_some() {
            return Ok(());
        }
        node.ins.exhaustive_rules(RECOMMENDED, alloc);
        loop {
            if node.ins.graph.is_empty() {
                node.result = Some(node.ins.finalize());
                return Ok(());
            }
            let lowered = node.ins.graph.max_degree(None).clamp(3, 8);
            if lowered < node.theta {
                node.theta = lowered;
                node.ins.exhaustive_rules(RECOMMENDED, alloc);
            } else {
                break;
            }
        }
        let decision = match connectivity::find_cut(&node.ins.graph) {
            Some(CutDecision::Disconnected { primary, rest }) => Decision::Split { primary, rest },
            Some(CutDecision::Articulation { cut, primary, rest }) => {
                Decision::Cut { cut, primary, rest }
            }
            Some(CutDecision::Pair { first, second }) => {
                // The pair enters as a branch on its higher-degree vertex; the other vertex is
                // an articulation point of both children.
                let (a, b) = if node.ins.graph.degree(first) >= node.ins.graph.degree(second) {
                    (first, second)
                } else {
                    (second, first)
                };
                Decision::Branch(branching::node_branch(&node.ins.graph, a, Pattern::CutPair(a, b)))
            }
            None => {
                let plan = branching::select_branch(&node.ins.graph, node.theta).ok_or_else(|| {
                    ProcessingError::Invariant(
                        "no branching pattern found on a non-empty graph".to_owned(),
                    )
                })?;
                Decision::Branch(plan)
            }
        };
        let theta = node.theta;
        let (left_ins, right_ins) = match &decision {
            Decision::Branch(plan) => {
                debug!("branching on {:?}", plan.pattern);
                let mut left = node.ins.clone();
                Self::apply(&mut left, &plan.left, alloc)?;
                let mut right = node.ins.clone();
                Self::apply(&mut right, &plan.right, alloc)?;
                (left, right)
            }
            Decision::Split { primary, rest } => {
                debug!("splitting into components of {} and {} nodes", primary.len(), rest.len());
                (sub_instance(&node.ins.graph, primary), sub_instance(&node.ins.graph, rest))
            }
            Decision::Cut { cut, primary, rest } => {
                debug!("cut branch on vertex {}", cut);
                let mut with_cut = primary.clone();
                with_cut.push(*cut);
                (sub_instance(&node.ins.graph, &with_cut), sub_instance(&node.ins.graph, rest))
            }
        };
        node.decision = Some(decision);
        self.attach_children(idx, theta, left_ins, right_ins);
        Ok(())
    }

    fn attach_children(&mut self, idx: usize, theta: usize, left: MisInstance, right: MisInstance) {
        let left_idx = self.nodes.len();
        self.nodes.push(Some(SearchNode::new(theta, left, Some(idx))));
        let right_idx = self.nodes.len();
        self.nodes.push(Some(SearchNode::new(theta, right, Some(idx))));
        let node = self.nodes[idx].as_mut().expect("`idx` names a live search node");
        node.left = Some(left_idx);
        node.right = Some(right_idx);
    }

    /// Applies one side of a branch plan to a private copy of the parent state.
    fn apply(ins: &mut MisInstance, op: &BranchOp, alloc: &mut IdAlloc) -> Result<(), ProcessingError> {
        match op {
            BranchOp::Exclude(nodes) => {
                ins.exclude_set(nodes);
                Ok(())
            }
            BranchOp::Include(nodes) => ins.take_all_into_solution(nodes),
            BranchOp::MergeEdge(u, v) => {
                let placeholder = alloc.alloc();
                ins.merge_edge(*u, *v, placeholder);
                Ok(())
            }
        }
    }

    /// Combines the finished children into their parent; detaches and releases them. A cut
    /// branch whose primary child used the cut vertex spawns the refinement children instead of
    /// finishing.
    fn merge(&mut self, idx: usize) -> Result<(), ProcessingError> {
        let left_idx = self.node(idx).left.expect("merging node has a left child");
        let right_idx = self.node(idx).right.expect("merging node has a right child");
        let left_res = self.nodes[left_idx]
            .take()
            .and_then(|n| n.result)
            .ok_or_else(|| ProcessingError::Invariant("left child merged without a result".to_owned()))?;
        let right_res = self.nodes[right_idx]
            .take()
            .and_then(|n| n.result)
            .ok_or_else(|| ProcessingError::Invariant("right child merged without a result".to_owned()))?;
        let decision = self
            .node(idx)
            .decision
            .clone()
            .ok_or_else(|| ProcessingError::Invariant("merging node carries no decision".to_owned()))?;
        match decision {
            Decision::Branch(_) => {
                // The children carried the parent state already; the larger one wins, ties go
                // to the right.
                let node = self.nodes[idx].as_mut().expect("`idx` names a live search node");
                node.result = Some(if left_res.len() > right_res.len() { left_res } else { right_res });
                node.left = None;
                node.right = None;
            }
            Decision::Split { .. } => {
                let mut combined = left_res;
                combined.extend(right_res);
                self.finish_with(idx, combined);
            }
            Decision::Cut { cut, primary, rest } => match self.node(idx).cut_stage.clone() {
                CutStage::Cut => {
                    if !left_res.contains(&cut) {
                        let mut combined = left_res;
                        combined.extend(right_res);
                        self.finish_with(idx, combined);
                    } else {
                        debug!("cut vertex {} used; refining", cut);
                        let node = self.nodes[idx].as_mut().expect("`idx` names a live search node");
                        let blocked: FxHashSet<NodeId> = node.ins.graph.neighbors(cut).collect();
                        let far: Vec<NodeId> =
                            rest.iter().copied().filter(|x| !blocked.contains(x)).collect();
                        let right1 = sub_instance(&node.ins.graph, &far);
                        let right2 = sub_instance(&node.ins.graph, &primary);
                        node.cut_stage =
                            CutStage::CutRight { first_left: left_res, first_right: right_res };
                        let theta = node.theta;
                        self.attach_children(idx, theta, right1, right2);
                    }
                }
                CutStage::CutRight { first_left, first_right } => {
                    // Candidate one keeps the cut vertex: primary side as solved first, far
                    // side without the cut's neighbors. Candidate two drops it.
                    let mut with_cut = first_left;
                    with_cut.extend(left_res);
                    let mut without_cut = right_res;
                    without_cut.extend(first_right);
                    let best = if with_cut.len() >= without_cut.len() { with_cut } else { without_cut };
                    self.finish_with(idx, best);
                }
            },
        }
        Ok(())
    }

    /// Finalizes a decomposition node: the combined child solutions, the node's own confirmed
    /// nodes and its harvested isolated nodes are unfolded together.
    fn finish_with(&mut self, idx: usize, mut combined: Vec<NodeId>) {
        let node = self.nodes[idx].as_mut().expect("`idx` names a live search node");
        combined.extend(node.ins.graph.take_isolated());
        node.result = Some(node.ins.mis.unfold(&combined));
        node.left = None;
        node.right = None;
    }

}

/// A fresh instance over the subgraph induced by `ids`, with an empty solution model. The
/// parent keeps its own model and unfolds the concatenated child solutions itself.
fn sub_instance(graph: &Graph, ids: &[NodeId]) -> MisInstance {
    let subset: FxHashSet<NodeId> = ids.iter().copied().collect();
    MisInstance::new(graph.rebuild_from_nodes(&subset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn solve_edges(n: usize, edges: &[(usize, usize)]) -> Vec<NodeId> {
        let graph = Graph::from_edges(n, edges).unwrap();
        let original = graph.clone();
        let sol = solve_mis(graph).unwrap();
        assert!(original.is_independent(&sol), "solution is not independent: {:?}", sol);
        for &v in &sol {
            assert!(v < n, "solution leaked a synthetic identifier: {}", v);
        }
        sol
    }

    /// Bitmask brute force over at most 16 nodes.
    fn brute_force(n: usize, edges: &[(usize, usize)]) -> usize {
        assert!(n <= 16);
        let mut adj = vec![0u32; n];
        for &(a, b) in edges {
            adj[a] |= 1 << b;
            adj[b] |= 1 << a;
        }
        let mut best = 0;
        for mask in 0u32..(1 << n) {
            if (0..n).all(|i| mask & (1 << i) == 0 || adj[i] & mask == 0) {
                best = best.max(mask.count_ones() as usize);
            }
        }
        best
    }

    #[test]
    fn path_test() {
        let sol = solve_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(sol.len(), 2);
    }

    #[test]
    fn five_cycle_test() {
        let sol = solve_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        assert_eq!(sol.len(), 2);
    }

    #[test]
    fn complete_graph_test() {
        let sol = solve_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(sol.len(), 1);
    }

    #[test]
    fn two_triangles_test() {
        let sol = solve_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        assert_eq!(sol.len(), 2);
    }

    #[test]
    fn star_test() {
        let sol = solve_edges(6, &[(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]);
        assert_eq!(sol, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn petersen_test() {
        let edges = [
            (0, 1), (1, 2), (2, 3), (3, 4), (4, 0),
            (5, 7), (7, 9), (9, 6), (6, 8), (8, 5),
            (0, 5), (1, 6), (2, 7), (3, 8), (4, 9),
        ];
        let sol = solve_edges(10, &edges);
        assert_eq!(sol.len(), 4);
    }

    #[test]
    fn grid_test() {
        // 3x4 grid graph; the larger color class has six nodes.
        let mut edges = Vec::new();
        let at = |r: usize, c: usize| r * 4 + c;
        for r in 0..3 {
            for c in 0..4 {
                if c + 1 < 4 {
                    edges.push((at(r, c), at(r, c + 1)));
                }
                if r + 1 < 3 {
                    edges.push((at(r, c), at(r + 1, c)));
                }
            }
        }
        let sol = solve_edges(12, &edges);
        assert_eq!(sol.len(), 6);
    }

    #[test]
    fn cut_merge_test() {
        // Two five-cycles sharing the articulation vertex 0; decomposition must agree with the
        // whole-graph optimum.
        let edges = [
            (0, 1), (1, 2), (2, 3), (3, 4), (4, 0),
            (0, 5), (5, 6), (6, 7), (7, 8), (8, 0),
        ];
        let expected = brute_force(9, &edges);
        let sol = solve_edges(9, &edges);
        assert_eq!(sol.len(), expected);
    }

    #[test]
    fn separating_pair_graph_test() {
        // Two dense blocks glued on the non-adjacent pair {0, 1}.
        let edges = [
            (0, 2), (0, 3), (1, 2), (1, 3), (2, 3),
            (0, 4), (0, 5), (1, 4), (1, 5), (4, 5),
        ];
        let expected = brute_force(6, &edges);
        let sol = solve_edges(6, &edges);
        assert_eq!(sol.len(), expected);
    }

    #[test]
    fn dense_block_test() {
        // Two K7 blocks bridged by a matching; exercises the high-theta patterns.
        let mut edges = Vec::new();
        for base in [0usize, 7] {
            for i in 0..7 {
                for j in i + 1..7 {
                    edges.push((base + i, base + j));
                }
            }
        }
        edges.push((0, 7));
        edges.push((1, 8));
        let expected = brute_force(14, &edges);
        let sol = solve_edges(14, &edges);
        assert_eq!(sol.len(), expected);
    }

    #[test]
    fn random_graphs_match_brute_force_test() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..25 {
            let n = 8 + (round % 6);
            let p = 0.15 + 0.05 * (round % 5) as f64;
            let mut edges = Vec::new();
            for i in 0..n {
                for j in i + 1..n {
                    if rng.gen_bool(p) {
                        edges.push((i, j));
                    }
                }
            }
            let expected = brute_force(n, &edges);
            let sol = solve_edges(n, &edges);
            assert_eq!(sol.len(), expected, "round {} with {} nodes, {:?}", round, n, edges);
        }
    }

    #[test]
    fn dense_random_graphs_match_brute_force_test() {
        // High edge densities keep the maximum degree in the upper theta range, driving the
        // max-degree, short-edge and optimal-node patterns.
        let mut rng = StdRng::seed_from_u64(0xdeca_f);
        for round in 0..15 {
            let n = 11 + (round % 4);
            let p = 0.45 + 0.05 * (round % 4) as f64;
            let mut edges = Vec::new();
            for i in 0..n {
                for j in i + 1..n {
                    if rng.gen_bool(p) {
                        edges.push((i, j));
                    }
                }
            }
            let expected = brute_force(n, &edges);
            let sol = solve_edges(n, &edges);
            assert_eq!(sol.len(), expected, "round {} with {} nodes, {:?}", round, n, edges);
        }
    }

    #[test]
    fn cube_test() {
        // The 3-cube is triangle-free, twin-free and three-connected, so the search has to go
        // through the four-cycle branch.
        let edges = [
            (0, 1), (0, 2), (0, 4), (1, 3), (1, 5), (2, 3),
            (2, 6), (3, 7), (4, 5), (4, 6), (5, 7), (6, 7),
        ];
        let expected = brute_force(8, &edges);
        let sol = solve_edges(8, &edges);
        assert_eq!(sol.len(), expected);
        assert_eq!(sol.len(), 4);
    }

    #[test]
    fn wheel_test() {
        // Hub 0 over a six-cycle rim.
        let edges = [
            (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6),
            (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 1),
        ];
        let expected = brute_force(7, &edges);
        let sol = solve_edges(7, &edges);
        assert_eq!(sol.len(), expected);
        assert_eq!(sol.len(), 3);
    }

    #[test]
    fn glued_petersen_cut_test() {
        // Two Petersen graphs sharing vertex 0. Petersen graphs resist every reduction rule,
        // so the solver must go through the articulation cut on 0. Each block contributes an
        // optimum of four that avoids the shared vertex, so the whole graph has eight.
        let mut edges = vec![
            (0, 1), (1, 2), (2, 3), (3, 4), (4, 0),
            (5, 7), (7, 9), (9, 6), (6, 8), (8, 5),
            (0, 5), (1, 6), (2, 7), (3, 8), (4, 9),
        ];
        let shift = |i: usize| if i == 0 { 0 } else { 9 + i };
        let second: Vec<(usize, usize)> = [
            (0, 1), (1, 2), (2, 3), (3, 4), (4, 0),
            (5, 7), (7, 9), (9, 6), (6, 8), (8, 5),
            (0, 5), (1, 6), (2, 7), (3, 8), (4, 9),
        ]
        .iter()
        .map(|&(a, b)| (shift(a), shift(b)))
        .collect();
        edges.extend(second);
        let sol = solve_edges(19, &edges);
        assert_eq!(sol.len(), 8);
    }

    #[test]
    fn empty_and_edgeless_test() {
        let sol = solve_edges(5, &[]);
        assert_eq!(sol, vec![0, 1, 2, 3, 4]);
        let graph = Graph::from_edges(0, &[]).unwrap();
        assert!(solve_mis(graph).unwrap().is_empty());
    }

}
