//! The branching-rule case analysis. Once the reduction rules are exhausted, the current
//! density threshold theta selects one structural pattern and maps it to a two-way branch. The
//! two operations of a branch together cover every maximal independent set of the graph: the
//! include side of a node branch carries the node's satellite closure (extended grandchildren
//! reached over a unique bridge neighbor), the short-edge side merges the endpoints behind a
//! placeholder, and a four-cycle excludes one of its diagonals on either side.

use fxhash::FxHashSet;
use itertools::Itertools;
use log::trace;
use crate::graph::{Graph, NodeId};

/// The structural pattern a branch was selected by.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Pattern {
    MaxDegree(NodeId),
    ShortEdge(NodeId, NodeId),
    OptimalNode(NodeId),
    GoodFunnel { node: NodeId, mate: NodeId },
    GoodPair(NodeId, NodeId),
    GoodNode(NodeId),
    FourCycle([NodeId; 4]),
    EffectiveNode(NodeId),
    /// A separating pair entering the tree as a branch on its first vertex.
    CutPair(NodeId, NodeId),
}

/// One side of a branch, applied to a private copy of the parent state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BranchOp {
    /// Remove the nodes without confirming them.
    Exclude(Vec<NodeId>),
    /// Confirm the nodes and remove their closed neighborhoods.
    Include(Vec<NodeId>),
    /// Merge the endpoints of a short edge behind a fresh placeholder.
    MergeEdge(NodeId, NodeId),
}

#[derive(Debug, Clone)]
pub struct BranchPlan {
    pub pattern: Pattern,
    pub left: BranchOp,
    pub right: BranchOp,
}

/// Selects the branching pattern for the current threshold; first match wins. Returns `None`
/// only for an empty graph.
pub fn select_branch(graph: &Graph, theta: usize) -> Option<BranchPlan> {
    if graph.is_empty() {
        return None;
    }
    let max_deg = graph.max_degree(None);
    let plan = match theta {
        6..=8 => {
            if max_deg > theta {
                let v = graph.max_degree_node().expect("graph is not empty");
                node_branch(graph, v, Pattern::MaxDegree(v))
            } else if let Some((u, v)) = find_dense_short_edge(graph, theta) {
                BranchPlan {
                    pattern: Pattern::ShortEdge(u, v),
                    left: BranchOp::Exclude(vec![u, v]),
                    right: BranchOp::MergeEdge(u, v),
                }
            } else {
                let v = optimal_node_of_degree(graph, max_deg);
                node_branch(graph, v, Pattern::OptimalNode(v))
            }
        }
        5 => {
            if let Some((node, mate)) = find_funnel(graph, 5) {
                node_branch(graph, mate, Pattern::GoodFunnel { node, mate })
            } else if let Some((u, v)) = find_good_pair(graph) {
                node_branch(graph, u, Pattern::GoodPair(u, v))
            } else {
                let v = optimal_node_of_degree(graph, max_deg);
                node_branch(graph, v, Pattern::OptimalNode(v))
            }
        }
        4 => {
            if let Some(v) = find_good_node(graph) {
                node_branch(graph, v, Pattern::GoodNode(v))
            } else if let Some((node, mate)) = find_funnel(graph, 4) {
                node_branch(graph, mate, Pattern::GoodFunnel { node, mate })
            } else if let Some(cycle) = find_four_cycle(graph) {
                four_cycle_branch(cycle)
            } else {
                let v = optimal_node_of_degree(graph, max_deg);
                node_branch(graph, v, Pattern::OptimalNode(v))
            }
        }
        _ => {
            if let Some(v) = find_effective_node(graph) {
                node_branch(graph, v, Pattern::EffectiveNode(v))
            } else if let Some((node, mate)) = find_funnel(graph, 3) {
                node_branch(graph, mate, Pattern::GoodFunnel { node, mate })
            } else if let Some(cycle) = find_four_cycle(graph) {
                four_cycle_branch(cycle)
            } else {
                let v = widest_second_neighborhood(graph);
                node_branch(graph, v, Pattern::OptimalNode(v))
            }
        }
    };
    trace!("theta {} selected {:?}", theta, plan.pattern);
    Some(plan)
}

/// The exclude/include branch on `v`. The include side forces `v` together with its satellite
/// closure and removes the closed neighborhoods.
pub fn node_branch(graph: &Graph, v: NodeId, pattern: Pattern) -> BranchPlan {
    let mut forced = vec![v];
    forced.extend(satellites(graph, v));
    BranchPlan {
        pattern,
        left: BranchOp::Exclude(vec![v]),
        right: BranchOp::Include(forced),
    }
}

fn four_cycle_branch(cycle: [NodeId; 4]) -> BranchPlan {
    // Every independent set avoids one of the two diagonals of the cycle.
    BranchPlan {
        pattern: Pattern::FourCycle(cycle),
        left: BranchOp::Exclude(vec![cycle[0], cycle[2]]),
        right: BranchOp::Exclude(vec![cycle[1], cycle[3]]),
    }
}

/// The satellites of `v`: second neighbors reached through exactly one bridging neighbor. Only
/// a pairwise independent subset is returned, since the include branch forces all of them.
pub fn satellites(graph: &Graph, v: NodeId) -> Vec<NodeId> {
    let mut closed: FxHashSet<NodeId> = graph.neighbors(v).collect();
    closed.insert(v);
    let mut found: Vec<NodeId> = Vec::new();
    for w in graph.neighbors(v) {
        let mut outer = None;
        let mut outer_count = 0;
        for nn in graph.neighbors(w) {
            if !closed.contains(&nn) {
                outer = Some(nn);
                outer_count += 1;
                if outer_count > 1 {
                    break;
                }
            }
        }
        if outer_count == 1 {
            let u = outer.expect("`outer_count` is 1");
            if !found.contains(&u) {
                found.push(u);
            }
        }
    }
    found.sort_unstable();
    let mut kept: Vec<NodeId> = Vec::new();
    for &u in &found {
        if kept.iter().all(|&k| !graph.edge_exists(u, k)) {
            kept.push(u);
        }
    }
    kept
}

/// The dense short edge for threshold `theta`: an edge whose endpoints both have degree at
/// least theta - 1 and whose common neighborhood is large enough for the threshold (theta - 4,
/// at least two), maximizing the number of common neighbors.
fn find_dense_short_edge(graph: &Graph, theta: usize) -> Option<(NodeId, NodeId)> {
    let needed = (theta.saturating_sub(4)).max(2);
    let mut best: Option<(usize, (NodeId, NodeId))> = None;
    for u in graph.nodes() {
        if graph.degree(u).expect("`u` is live") + 1 < theta {
            continue;
        }
        for v in graph.neighbors(u) {
            if v <= u || graph.degree(v).expect("`v` is live") + 1 < theta {
                continue;
            }
            let shared = graph.common_neighbors(u, v).len();
            if shared >= needed && best.map_or(true, |(s, _)| shared > s) {
                best = Some((shared, (u, v)));
            }
        }
    }
    best.map(|(_, edge)| edge)
}

/// A funnel at degree `degree`: a node whose neighborhood minus one mate is a clique. Returns
/// the funnel node and the mate with the highest degree among all funnels found.
fn find_funnel(graph: &Graph, degree: usize) -> Option<(NodeId, NodeId)> {
    let mut best: Option<(usize, (NodeId, NodeId))> = None;
    for v in graph.nodes() {
        if graph.degree(v) != Some(degree) {
            continue;
        }
        let neighbors = graph.neighbor_vec(v);
        for &mate in &neighbors {
            let rest: Vec<NodeId> =
                neighbors.iter().copied().filter(|&x| x != mate).collect();
            if graph.is_clique(&rest) {
                let mate_degree = graph.degree(mate).expect("`mate` is live");
                if best.map_or(true, |(d, _)| mate_degree > d) {
                    best = Some((mate_degree, (v, mate)));
                }
                break;
            }
        }
    }
    best.map(|(_, funnel)| funnel)
}

/// A good pair: two non-adjacent nodes of degree at least five sharing at least three
/// neighbors.
fn find_good_pair(graph: &Graph) -> Option<(NodeId, NodeId)> {
    for u in graph.nodes() {
        if graph.degree(u).expect("`u` is live") < 5 {
            continue;
        }
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        for w in graph.neighbors(u) {
            for v in graph.neighbors(w) {
                if v <= u || !seen.insert(v) {
                    continue;
                }
                if graph.degree(v).expect("`v` is live") < 5 || graph.edge_exists(u, v) {
                    continue;
                }
                if graph.has_common_neighbors(u, v, 3) {
                    return Some((u, v));
                }
            }
        }
    }
    None
}

/// A good node at theta 4, searched within the precomputed connected components smallest
/// first: a degree-4 node with at least three degree-4 neighbors.
fn find_good_node(graph: &Graph) -> Option<NodeId> {
    let mut comps = graph.components();
    comps.sort_by_key(|c| c.len());
    for comp in comps {
        let mut best: Option<((usize, usize, usize), NodeId)> = None;
        for &v in &comp {
            if graph.degree(v) != Some(4) {
                continue;
            }
            let dense_neighbors = graph
                .neighbors(v)
                .filter(|&w| graph.degree(w) == Some(4))
                .count();
            if dense_neighbors < 3 {
                continue;
            }
            let score = node_score(graph, v);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, v));
            }
        }
        if let Some((_, v)) = best {
            return Some(v);
        }
    }
    None
}

/// The best chordless four-cycle by total degree, or `None` if the graph has none.
fn find_four_cycle(graph: &Graph) -> Option<[NodeId; 4]> {
    let mut best: Option<(usize, [NodeId; 4])> = None;
    for v in graph.nodes() {
        let neighbors = graph.neighbor_vec(v);
        for (&x, &y) in neighbors.iter().tuple_combinations() {
            if graph.edge_exists(x, y) {
                continue;
            }
            for c in graph.common_neighbors(x, y) {
                if c == v || graph.edge_exists(v, c) {
                    continue;
                }
                let score: usize = [v, x, c, y]
                    .iter()
                    .map(|&n| graph.degree(n).expect("`n` is live"))
                    .sum();
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, [v, x, c, y]));
                }
            }
        }
    }
    best.map(|(_, cycle)| cycle)
}

/// An effective node at theta 3: a degree-3 node lying in a triangle, whose removal strictly
/// shrinks the cycle slack of its component.
fn find_effective_node(graph: &Graph) -> Option<NodeId> {
    let mut best: Option<((usize, usize, usize), NodeId)> = None;
    for v in graph.nodes() {
        if graph.degree(v) != Some(3) {
            continue;
        }
        let neighbors = graph.neighbor_vec(v);
        let in_triangle = neighbors
            .iter()
            .tuple_combinations()
            .any(|(&a, &b)| graph.edge_exists(a, b));
        if !in_triangle {
            continue;
        }
        let score = node_score(graph, v);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, v));
        }
    }
    best.map(|(_, v)| v)
}

/// The best node of the given degree by structural counting. The neighbor degree histogram
/// decides first (more high-degree neighbors win), then a sparser neighborhood, then the wider
/// second neighborhood. Falls back to the maximum degree node if that degree is not attained.
fn optimal_node_of_degree(graph: &Graph, degree: usize) -> NodeId {
    let mut best: Option<((usize, usize, usize), NodeId)> = None;
    for v in graph.nodes() {
        if graph.degree(v) != Some(degree) {
            continue;
        }
        let score = node_score(graph, v);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, v));
        }
    }
    match best {
        Some((_, v)) => v,
        None => graph.max_degree_node().expect("graph is not empty"),
    }
}

/// The node maximizing the size of its second neighborhood; the theta 3 fallback.
fn widest_second_neighborhood(graph: &Graph) -> NodeId {
    graph
        .nodes()
        .max_by_key(|&v| (graph.second_neighborhood_size(v), graph.degree(v).expect("`v` is live")))
        .expect("graph is not empty")
}

/// Histogram cap for the structural counting; degrees beyond theta's range share one bucket.
const HISTOGRAM_CAP: usize = 8;

fn node_score(graph: &Graph, v: NodeId) -> (usize, usize, usize) {
    let histogram = graph.neighbor_degree_histogram(v, HISTOGRAM_CAP);
    let weighted: usize = histogram.iter().enumerate().map(|(d, &count)| count * d).sum();
    let sparseness = max_neighborhood_edges(graph, v) - graph.neighborhood_edge_count(v);
    (weighted, sparseness, graph.second_neighborhood_size(v))
}

fn max_neighborhood_edges(graph: &Graph, v: NodeId) -> usize {
    let d = graph.degree(v).expect("`v` is live");
    d * d.saturating_sub(1) / 2
}
