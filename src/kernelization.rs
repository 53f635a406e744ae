//! This module includes the reduction rules for the maximum independent set problem.
//! These rules include:
//! * `LineClique`-rule which extracts the subgraph induced by nodes of one fixed degree d
//! (d = 6, 7, 8), searches it for a clique of size d + 1 and removes the clique as a whole.
//! Such a clique is a complete component, so exactly one representative is confirmed.
//! * `Unconfined`-rule: grows a confining set around a node; an empty outer neighborhood for
//! some candidate, or a dependency set that is not independent, proves the node removable
//! without shrinking the optimum. See the literature cited in the documentation.
//! * `FoldSingle`-rule which folds nodes of degree 2 with an independent neighborhood into a
//! hypernode, and confirms the node instead when its neighborhood is a clique.
//! * `FoldTwin`-rule which folds degree-3 twins with an identical independent neighborhood,
//! and confirms both twins when the shared neighborhood carries an edge.
//!
//! All rules are applied to a joint fixpoint; a compaction follows the fixpoint.

use fxhash::{FxHashMap, FxHashSet};
use log::debug;
use crate::graph::{Graph, NodeId};
use crate::solution::MisInstance;
use crate::search_tree::IdAlloc;

pub const FAST_RULES: &[Rule] = &[Rule::FoldSingle, Rule::FoldTwin];
pub const RECOMMENDED: &[Rule] = &[Rule::LineClique, Rule::Unconfined, Rule::FoldSingle, Rule::FoldTwin];

pub enum Rule {
    LineClique,
    Unconfined,
    FoldSingle,
    FoldTwin,
}

/// The degrees at which the `LineClique`-rule looks for complete components.
const LINE_CLIQUE_DEGREES: [usize; 3] = [6, 7, 8];

impl MisInstance {

    /// Applies the `LineClique`-rule for the degrees 6, 7 and 8. A clique of size d + 1 whose
    /// members all have degree d has no edge leaving it, so the whole clique is removed and one
    /// member is confirmed.
    /// Returns `true` if at least one clique was removed.
    pub fn line_clique_rule(&mut self) -> bool {
        let mut changed = false;
        for d in LINE_CLIQUE_DEGREES {
            loop {
                let cands: FxHashSet<NodeId> = self
                    .graph
                    .nodes()
                    .filter(|&v| self.graph.degree(v) == Some(d))
                    .collect();
                if cands.len() <= d {
                    break;
                }
                match find_clique_of_size(&self.graph, &cands, d + 1) {
                    Some(clique) => {
                        debug_assert!(self.graph.is_clique(&clique), "clique search reported a non-clique");
                        debug!("line clique rule removes a K{} component", d + 1);
                        let keep = *clique.iter().min().expect("clique is not empty");
                        self.graph.remove_set(&clique, &mut self.info);
                        self.mis.confirm(keep);
                        changed = true;
                    }
                    None => break,
                }
            }
        }
        changed
    }

    /// Looks for an unconfined node and removes it if one was found.
    /// Returns `true` if a node was removed and `false` otherwise.
    pub fn unconfined_rule(&mut self) -> bool {
        let nodes: Vec<NodeId> = self.graph.nodes().collect();
        for node in nodes {
            if !self.graph.is_live(node) {
                continue;
            }
            if self.is_unconfined(node) {
                self.exclude(node);
                return true;
            }
        }
        false
    }

    /// Grows the confining set of `node`: any candidate with a single neighbor in the set and an
    /// empty outer neighborhood proves `node` unconfined; candidates with a single outer node
    /// extend the set, and the set of those uniquely reached extended grandchildren must itself
    /// be independent.
    fn is_unconfined(&self, node: NodeId) -> bool {
        let mut set: FxHashSet<NodeId> = [node].into_iter().collect();
        let mut closed: FxHashSet<NodeId> = self.graph.neighbors(node).collect();
        closed.insert(node);
        loop {
            let mut extension: Vec<NodeId> = Vec::new();
            for &cand in closed.iter() {
                if set.contains(&cand) {
                    continue;
                }
                let mut in_set = 0;
                for nn in self.graph.neighbors(cand) {
                    if set.contains(&nn) {
                        in_set += 1;
                    }
                }
                if in_set != 1 {
                    continue;
                }
                let mut outer = None;
                let mut outer_count = 0;
                for nn in self.graph.neighbors(cand) {
                    if !closed.contains(&nn) {
                        outer = Some(nn);
                        outer_count += 1;
                        if outer_count > 1 {
                            break;
                        }
                    }
                }
                match outer_count {
                    0 => return true,
                    1 => extension.push(outer.expect("`outer_count` is 1")),
                    _ => {}
                }
            }
            extension.sort_unstable();
            extension.dedup();
            if extension.is_empty() {
                return false;
            }
            for (i, &a) in extension.iter().enumerate() {
                for &b in &extension[i + 1..] {
                    if self.graph.edge_exists(a, b) {
                        return true;
                    }
                }
            }
            for &s in &extension {
                set.insert(s);
                closed.extend(self.graph.neighbors(s));
                closed.insert(s);
            }
        }
    }

    /// Folds nodes of degree 2. An independent neighborhood is contracted into a hypernode; a
    /// neighborhood that is a clique confirms the node instead.
    pub fn fold_single_rule(&mut self, alloc: &mut IdAlloc) -> bool {
        let mut changed = false;
        'outer: loop {
            let nodes: Vec<NodeId> = self.graph.nodes().collect();
            for node in nodes {
                if self.graph.degree(node) != Some(2) {
                    continue;
                }
                let neighbors = self.graph.neighbor_vec(node);
                let (a, b) = (neighbors[0], neighbors[1]);
                if self.graph.edge_exists(a, b) {
                    self.take_into_solution(node);
                } else {
                    let new_id = alloc.alloc();
                    self.fold_single(node, a, b, new_id);
                }
                changed = true;
                continue 'outer;
            }
            break 'outer;
        }
        changed
    }

    /// Traverses over all nodes with a degree of 3 and stores the sorted neighborhood of each in
    /// a lookup table, split by whether the neighborhood carries an edge. A twin hit on an
    /// edge-carrying neighborhood confirms both twins; a hit on an independent neighborhood
    /// folds the twins and the neighborhood into a hypernode.
    /// Returns `true` if a twin pair was handled.
    pub fn fold_twin_rule(&mut self, alloc: &mut IdAlloc) -> bool {
        let mut connects: FxHashMap<[NodeId; 3], NodeId> = FxHashMap::default();
        let mut un_connects: FxHashMap<[NodeId; 3], NodeId> = FxHashMap::default();
        let mut take: Option<(NodeId, NodeId)> = None;
        let mut fold: Option<(NodeId, NodeId, [NodeId; 3])> = None;
        for node in self.graph.nodes() {
            if self.graph.degree(node) != Some(3) {
                continue;
            }
            let neighbors = self.graph.neighbor_vec(node);
            let key: [NodeId; 3] = [neighbors[0], neighbors[1], neighbors[2]];
            if let Some(&twin) = connects.get(&key) {
                take = Some((node, twin));
                break;
            } else if let Some(&twin) = un_connects.get(&key) {
                fold = Some((node, twin, key));
                break;
            } else if self.graph.is_independent(&key) {
                un_connects.insert(key, node);
            } else {
                connects.insert(key, node);
            }
        }
        if let Some((v1, v2)) = take {
            self.take_into_solution(v1);
            // The twin lost its whole neighborhood and was harvested along the way.
            debug_assert!(!self.graph.is_live(v2));
            true
        } else if let Some((v1, v2, key)) = fold {
            let new_id = alloc.alloc();
            self.fold_twin(v1, v2, key, new_id);
            true
        } else {
            false
        }
    }

    /// Exhaustively applies the rules given in `priority_list` in the given priority order. If
    /// at any point a rule altered the graph, the priority list is traversed from the start.
    /// After the joint fixpoint the graph is compacted.
    pub fn exhaustive_rules(&mut self, priority_list: &[Rule], alloc: &mut IdAlloc) {
        'outer: loop {
            self.maybe_rebuild();
            for rule in priority_list {
                match rule {
                    Rule::LineClique => {
                        if self.line_clique_rule() {
                            continue 'outer;
                        }
                    }
                    Rule::Unconfined => {
                        if self.unconfined_rule() {
                            continue 'outer;
                        }
                    }
                    Rule::FoldSingle => {
                        if self.fold_single_rule(alloc) {
                            continue 'outer;
                        }
                    }
                    Rule::FoldTwin => {
                        if self.fold_twin_rule(alloc) {
                            continue 'outer;
                        }
                    }
                }
            }
            break;
        }
        self.graph.rebuild(&mut self.info);
        debug!(
            "reduced to {} nodes, {} confirmed, {} isolated",
            self.graph.num_nodes(),
            self.mis.mis.len(),
            self.graph.isolated().len()
        );
    }

}

/// Depth-limited backtracking search for a clique of exactly `size` nodes within the subgraph
/// induced by `cands`, extending over sorted neighbor intersections.
fn find_clique_of_size(
    graph: &Graph,
    cands: &FxHashSet<NodeId>,
    size: usize,
) -> Option<Vec<NodeId>> {
    let mut anchors: Vec<NodeId> = cands.iter().copied().collect();
    anchors.sort_unstable();
    for &v in &anchors {
        let pool: Vec<NodeId> = graph
            .neighbors(v)
            .filter(|nid| cands.contains(nid))
            .collect();
        if pool.len() + 1 < size {
            continue;
        }
        let mut current = vec![v];
        if extend_clique(graph, &mut current, &pool, size) {
            return Some(current);
        }
    }
    None
}

fn extend_clique(graph: &Graph, current: &mut Vec<NodeId>, pool: &[NodeId], size: usize) -> bool {
    if current.len() == size {
        return true;
    }
    if current.len() + pool.len() < size {
        return false;
    }
    for (i, &u) in pool.iter().enumerate() {
        current.push(u);
        let next: Vec<NodeId> = pool[i + 1..]
            .iter()
            .copied()
            .filter(|&w| graph.edge_exists(u, w))
            .collect();
        if extend_clique(graph, current, &next, size) {
            return true;
        }
        current.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::solution::MisInstance;
    use crate::search_tree::IdAlloc;

    fn complete_graph(n: usize) -> Graph {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                edges.push((i, j));
            }
        }
        Graph::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn line_clique_test() {
        // A K7 next to a path; the K7 is a complete component of degree-6 nodes.
        let mut edges = Vec::new();
        for i in 0..7 {
            for j in i + 1..7 {
                edges.push((i, j));
            }
        }
        edges.push((7, 8));
        let graph = Graph::from_edges(9, &edges).unwrap();
        let mut ins = MisInstance::new(graph);
        assert!(ins.line_clique_rule());
        assert_eq!(ins.mis.mis, vec![0]);
        assert_eq!(ins.graph.num_nodes(), 2);
        assert!(!ins.line_clique_rule());
    }

    #[test]
    fn unconfined_on_path_test() {
        // On a path the endpoints' neighbors are unconfined; the rules alone solve it.
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(ins.graph.num_reserved());
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        assert!(ins.graph.is_empty());
        let sol = ins.finalize();
        assert_eq!(sol.len(), 2);
        let original = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        assert!(original.is_independent(&sol));
    }

    #[test]
    fn cycle_solved_by_rules_test() {
        // C5 has maximum independent set size 2 and is solved by folds alone.
        let graph = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(ins.graph.num_reserved());
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        assert!(ins.graph.is_empty());
        let sol = ins.finalize();
        assert_eq!(sol.len(), 2);
        let original = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
        assert!(original.is_independent(&sol));
    }

    #[test]
    fn clique_neighborhood_confirms_test() {
        // Degree-2 node 0 with adjacent neighbors: 0 is confirmed, the triangle is dropped.
        let graph = Graph::from_edges(4, &[(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)]).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(4);
        assert!(ins.fold_single_rule(&mut alloc));
        assert!(ins.mis.mis.contains(&0));
        let sol = ins.finalize();
        assert_eq!(sol, vec![0, 3]);
    }

    #[test]
    fn fold_twin_test() {
        // Twins 0 and 4 share the independent neighborhood {1, 2, 3} with pendants beyond.
        let edges = [
            (0, 1), (0, 2), (0, 3), (4, 1), (4, 2), (4, 3), (1, 5), (2, 6), (3, 7),
        ];
        let graph = Graph::from_edges(8, &edges).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(8);
        assert!(ins.fold_twin_rule(&mut alloc));
        assert_eq!(ins.mis.hypernodes().len(), 1);
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        assert!(ins.graph.is_empty());
        let sol = ins.finalize();
        assert_eq!(sol, vec![0, 4, 5, 6, 7]);
    }

    #[test]
    fn twin_with_edge_takes_both_test() {
        // Twins 0 and 4 whose shared neighborhood {1, 2, 3} carries the edge 1-2.
        let edges = [
            (0, 1), (0, 2), (0, 3), (4, 1), (4, 2), (4, 3), (1, 2),
        ];
        let graph = Graph::from_edges(5, &edges).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(5);
        assert!(ins.fold_twin_rule(&mut alloc));
        let sol = ins.finalize();
        assert_eq!(sol, vec![0, 4]);
    }

    #[test]
    fn complete_graph_test() {
        // K4: every node is unconfined until a clique neighborhood confirms a survivor.
        let mut ins = MisInstance::new(complete_graph(4));
        let mut alloc = IdAlloc::new(4);
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        assert!(ins.graph.is_empty());
        assert_eq!(ins.finalize().len(), 1);
    }

    #[test]
    fn fixpoint_idempotence_test() {
        let mut edges = vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)];
        edges.extend([(0, 6), (6, 7), (7, 8), (8, 0), (2, 9), (9, 10)]);
        let graph = Graph::from_edges(11, &edges).unwrap();
        let mut ins = MisInstance::new(graph);
        let mut alloc = IdAlloc::new(ins.graph.num_reserved());
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        let nodes_after = ins.graph.num_nodes();
        let confirmed_after = ins.mis.mis.len();
        let isolated_after = ins.graph.isolated().len();
        ins.exhaustive_rules(RECOMMENDED, &mut alloc);
        assert_eq!(ins.graph.num_nodes(), nodes_after);
        assert_eq!(ins.mis.mis.len(), confirmed_after);
        assert_eq!(ins.graph.isolated().len(), isolated_after);
    }

}
