//! Biconnectivity based decomposition: articulation points, separating pairs and the balance
//! test that decides whether a found cut is worth splitting on.
//!
//! All searches here are read-only queries over the traversal cursors; the depth-first searches
//! run over explicit stacks of cursor frames so deep graphs never touch the call stack.

use fxhash::{FxHashMap, FxHashSet};
use log::debug;
use crate::graph::{Graph, NodeId};

/// A piece is acceptable for a two-vertex cut only if it is this small ...
const PAIR_PIECE_MAX_NODES: usize = 24;
/// ... or carries at least this much net degree.
const PAIR_PIECE_MIN_DEGREE: usize = 17;

/// Bound on the remove-one-and-rescan fallback of the separating pair search.
const PAIR_SCAN_CANDIDATES: usize = 12;

/// The usable vertex cut of the current graph, in order of preference.
#[derive(Debug, Clone)]
pub enum CutDecision {
    /// The graph is already disconnected; `primary` is the smallest component.
    Disconnected { primary: Vec<NodeId>, rest: Vec<NodeId> },
    /// A single cut vertex; `primary` is the piece with the smaller net degree sum.
    Articulation { cut: NodeId, primary: Vec<NodeId>, rest: Vec<NodeId> },
    /// A verified two-vertex cut.
    Pair { first: NodeId, second: NodeId },
}

/// Searches for a usable vertex cut: disconnection first, then an articulation point, then a
/// separating pair. `None` is the expected common case and falls through to ordinary branching.
pub fn find_cut(graph: &Graph) -> Option<CutDecision> {
    let mut comps = graph.components();
    if comps.len() >= 2 {
        comps.sort_by_key(|c| c.len());
        let primary = comps.remove(0);
        let rest = comps.into_iter().flatten().collect();
        return Some(CutDecision::Disconnected { primary, rest });
    }
    let points = articulation_points(graph, &[]);
    if let Some(&cut) = points
        .iter()
        .max_by_key(|&&p| graph.degree(p).expect("`p` is live"))
    {
        let mut comps = components_excluding(graph, &[cut]);
        debug_assert!(comps.len() >= 2);
        let primary_at = check_separation(graph, &[cut], &comps)
            .expect("a single cut vertex always has a primary piece");
        let primary = comps.swap_remove(primary_at);
        let rest = comps.into_iter().flatten().collect();
        debug!("articulation point {} found", cut);
        return Some(CutDecision::Articulation { cut, primary, rest });
    }
    if let Some((first, second)) = separating_pair(graph) {
        debug!("separating pair ({}, {}) found", first, second);
        return Some(CutDecision::Pair { first, second });
    }
    None
}

/// The balance test: decides which piece of a cut is primary, or `None` if the cut is not worth
/// using. A single cut vertex picks the piece with the smaller sum of net degree (degree minus
/// edges into the cut); a two-vertex cut needs a piece that is small or carries enough degree.
pub fn check_separation(graph: &Graph, cut: &[NodeId], comps: &[Vec<NodeId>]) -> Option<usize> {
    match cut.len() {
        0 => comps
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.len())
            .map(|(i, _)| i),
        1 => comps
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| net_degree_sum(graph, c, cut))
            .map(|(i, _)| i),
        2 => comps.iter().position(|c| {
            c.len() <= PAIR_PIECE_MAX_NODES || net_degree_sum(graph, c, cut) >= PAIR_PIECE_MIN_DEGREE
        }),
        _ => None,
    }
}

fn net_degree_sum(graph: &Graph, comp: &[NodeId], cut: &[NodeId]) -> usize {
    comp.iter()
        .map(|&x| {
            let to_cut = cut.iter().filter(|&&c| graph.edge_exists(x, c)).count();
            graph.degree(x).expect("`x` is live") - to_cut
        })
        .sum()
}

/// Returns the connected components of the graph with `excluded` treated as removed.
pub fn components_excluding(graph: &Graph, excluded: &[NodeId]) -> Vec<Vec<NodeId>> {
    let skip: FxHashSet<NodeId> = excluded.iter().copied().collect();
    let mut seen = FxHashSet::default();
    let mut comps = Vec::new();
    for root in graph.nodes() {
        if skip.contains(&root) || seen.contains(&root) {
            continue;
        }
        let mut comp = vec![root];
        seen.insert(root);
        let mut stack = vec![graph.cursor(root).expect("`root` is live")];
        loop {
            let step = match stack.last_mut() {
                Some(top) => graph.advance(top),
                None => break,
            };
            match step {
                Some(next) if !skip.contains(&next) && !seen.contains(&next) => {
                    seen.insert(next);
                    comp.push(next);
                    stack.push(graph.cursor(next).expect("`next` is live"));
                }
                Some(_) => {}
                None => {
                    stack.pop();
                }
            }
        }
        comps.push(comp);
    }
    comps
}

/// Computes all articulation points of the graph (with `excluded` treated as removed) by an
/// iterative Tarjan depth-first search over discovery order and low-link values. A node is an
/// articulation point if some child subtree cannot reach above it; the root of a search tree is
/// one exactly when it has two or more tree children.
pub fn articulation_points(graph: &Graph, excluded: &[NodeId]) -> Vec<NodeId> {
    let skip: FxHashSet<NodeId> = excluded.iter().copied().collect();
    let mut disc: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut low: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut points = FxHashSet::default();
    let mut time = 0usize;
    for root in graph.nodes() {
        if skip.contains(&root) || disc.contains_key(&root) {
            continue;
        }
        disc.insert(root, time);
        low.insert(root, time);
        time += 1;
        let mut root_children = 0usize;
        // Frames of (node, parent, cursor); the cursor lets the scan resume mid-slice.
        let mut stack = vec![(root, None::<NodeId>, graph.cursor(root).expect("`root` is live"))];
        while !stack.is_empty() {
            let advanced = {
                let (v, parent, cur) = stack.last_mut().expect("`stack` is not empty");
                graph.advance(cur).map(|w| (*v, *parent, w))
            };
            match advanced {
                Some((v, parent, w)) => {
                    if skip.contains(&w) {
                        continue;
                    }
                    if let Some(&dw) = disc.get(&w) {
                        if Some(w) != parent {
                            let lv = low[&v].min(dw);
                            low.insert(v, lv);
                        }
                    } else {
                        disc.insert(w, time);
                        low.insert(w, time);
                        time += 1;
                        if v == root {
                            root_children += 1;
                        }
                        stack.push((w, Some(v), graph.cursor(w).expect("`w` is live")));
                    }
                }
                None => {
                    let (v, parent, _) = stack.pop().expect("`stack` is not empty");
                    if let Some(p) = parent {
                        let lp = low[&p].min(low[&v]);
                        low.insert(p, lp);
                        if p != root && low[&v] >= disc[&p] {
                            points.insert(p);
                        }
                    }
                }
            }
        }
        if root_children >= 2 {
            points.insert(root);
        }
    }
    let mut out: Vec<NodeId> = points.into_iter().collect();
    out.sort_unstable();
    out
}

/// Searches for a verified two-vertex cut that passes the balance test.
///
/// Candidates come from a palm-tree lowpoint pass: a tree edge whose subtree has its second-best
/// lowpoint at or below the parent can only attach through the parent and the vertex carrying
/// its best lowpoint, which makes that pair a separation pair candidate. Every candidate is
/// verified by an explicit disconnect check before it is reported. A bounded remove-one-and-
/// rescan pass backs the lowpoint candidates up.
pub fn separating_pair(graph: &Graph) -> Option<(NodeId, NodeId)> {
    for (a, b) in lowpoint_candidates(graph) {
        if let Some(pair) = verify_pair(graph, a, b) {
            return Some(pair);
        }
    }
    // Fallback: drop one low-degree node and rescan for articulation points.
    let mut scan: Vec<NodeId> = graph.nodes().collect();
    scan.sort_by_key(|&v| graph.degree(v).expect("`v` is live"));
    scan.truncate(PAIR_SCAN_CANDIDATES);
    for &u in &scan {
        for w in articulation_points(graph, &[u]) {
            if let Some(pair) = verify_pair(graph, u, w) {
                return Some(pair);
            }
        }
    }
    None
}

fn verify_pair(graph: &Graph, a: NodeId, b: NodeId) -> Option<(NodeId, NodeId)> {
    if a == b {
        return None;
    }
    let comps = components_excluding(graph, &[a, b]);
    if comps.len() < 2 {
        return None;
    }
    check_separation(graph, &[a, b], &comps).map(|_| (a, b))
}

/// One palm-tree depth-first pass computing, per node, the two smallest lowpoints of its
/// subtree; emits the candidate pairs described at [`separating_pair`].
fn lowpoint_candidates(graph: &Graph) -> Vec<(NodeId, NodeId)> {
    let mut disc: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut low1: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut low2: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut order: Vec<NodeId> = Vec::new();
    let mut candidates: Vec<(NodeId, NodeId)> = Vec::new();
    let mut time = 0usize;
    for root in graph.nodes() {
        if disc.contains_key(&root) {
            continue;
        }
        disc.insert(root, time);
        low1.insert(root, time);
        low2.insert(root, usize::MAX);
        order.push(root);
        time += 1;
        let mut stack = vec![(root, None::<NodeId>, graph.cursor(root).expect("`root` is live"))];
        while !stack.is_empty() {
            let advanced = {
                let (v, parent, cur) = stack.last_mut().expect("`stack` is not empty");
                graph.advance(cur).map(|w| (*v, *parent, w))
            };
            match advanced {
                Some((v, parent, w)) => {
                    if let Some(&dw) = disc.get(&w) {
                        if Some(w) != parent {
                            merge_lowpoints(&mut low1, &mut low2, v, dw, usize::MAX);
                        }
                    } else {
                        disc.insert(w, time);
                        low1.insert(w, time);
                        low2.insert(w, usize::MAX);
                        order.push(w);
                        time += 1;
                        stack.push((w, Some(v), graph.cursor(w).expect("`w` is live")));
                    }
                }
                None => {
                    let (w, parent, _) = stack.pop().expect("`stack` is not empty");
                    if let Some(v) = parent {
                        let (child_low1, child_low2) = (low1[&w], low2[&w]);
                        // Subtree of `w` reaches above `v` only through its best lowpoint:
                        // {v, low1-vertex} is a separation pair candidate.
                        if child_low1 < disc[&v] && child_low2 >= disc[&v] {
                            candidates.push((v, order[child_low1]));
                        }
                        merge_lowpoints(&mut low1, &mut low2, v, child_low1, child_low2);
                    }
                }
            }
        }
    }
    candidates.dedup();
    candidates.truncate(64);
    candidates
}

fn merge_lowpoints(
    low1: &mut FxHashMap<NodeId, usize>,
    low2: &mut FxHashMap<NodeId, usize>,
    v: NodeId,
    a: usize,
    b: usize,
) {
    let (mut l1, mut l2) = (low1[&v], low2[&v]);
    for x in [a, b] {
        if x < l1 {
            l2 = l1;
            l1 = x;
        } else if x > l1 && x < l2 {
            l2 = x;
        }
    }
    low1.insert(v, l1);
    low2.insert(v, l2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn barbell() -> Graph {
        // Two triangles joined through node 2: {0,1,2} and {2,3,4}.
        Graph::from_edges(5, &[(0, 1), (0, 2), (1, 2), (2, 3), (2, 4), (3, 4)]).unwrap()
    }

    #[test]
    fn articulation_point_test() {
        let graph = barbell();
        assert_eq!(articulation_points(&graph, &[]), vec![2]);
    }

    #[test]
    fn articulation_on_path_test() {
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        assert_eq!(articulation_points(&graph, &[]), vec![1, 2]);
    }

    #[test]
    fn no_articulation_in_cycle_test() {
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert!(articulation_points(&graph, &[]).is_empty());
    }

    #[test]
    fn articulation_excluding_test() {
        // On C4, removing one node turns the opposite node into a cut vertex.
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert_eq!(articulation_points(&graph, &[0]), vec![2]);
    }

    #[test]
    fn find_cut_prefers_disconnection_test() {
        let graph = Graph::from_edges(5, &[(0, 1), (2, 3), (3, 4)]).unwrap();
        match find_cut(&graph) {
            Some(CutDecision::Disconnected { primary, rest }) => {
                assert_eq!(primary.len(), 2);
                assert_eq!(rest.len(), 3);
            }
            other => panic!("expected a disconnection, got {:?}", other),
        }
    }

    #[test]
    fn find_cut_articulation_test() {
        let graph = barbell();
        match find_cut(&graph) {
            Some(CutDecision::Articulation { cut, primary, rest }) => {
                assert_eq!(cut, 2);
                assert_eq!(primary.len(), 2);
                assert_eq!(rest.len(), 2);
            }
            other => panic!("expected an articulation point, got {:?}", other),
        }
    }

    #[test]
    fn separating_pair_test() {
        // Two K4 blocks sharing the non-adjacent pair {0, 1}.
        let edges = [
            (0, 2), (0, 3), (1, 2), (1, 3), (2, 3),
            (0, 4), (0, 5), (1, 4), (1, 5), (4, 5),
        ];
        let graph = Graph::from_edges(6, &edges).unwrap();
        assert!(articulation_points(&graph, &[]).is_empty());
        let pair = separating_pair(&graph);
        assert!(pair.is_some());
        let (a, b) = pair.unwrap();
        assert!(components_excluding(&graph, &[a, b]).len() >= 2);
    }

    #[test]
    fn check_separation_pair_constants_test() {
        // A long cycle: both pieces of any 2-cut are small enough to qualify.
        let n = 10;
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let graph = Graph::from_edges(n, &edges).unwrap();
        let comps = components_excluding(&graph, &[0, 5]);
        assert_eq!(comps.len(), 2);
        assert!(check_separation(&graph, &[0, 5], &comps).is_some());
    }

}
