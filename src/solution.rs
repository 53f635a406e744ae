//! The solution model: nodes confirmed to be in the independent set, plus the registry of
//! folded substructures needed to translate a solution on a simplified graph back to the
//! original node set.
//!
//! Two kinds of synthetic records exist. A [`Hypernode`] stands for a contracted group: if the
//! synthetic node ends up in the solution the absorbed neighbors take its place, otherwise the
//! folded members do. An [`EdgeMerge`] stands for the merged endpoints of a short-edge branch:
//! selecting a private neighbor of one endpoint forces the exclusion of that endpoint, so the
//! record is resolved by whichever private side stayed out of the solution. Synthetic
//! identifiers are allocated monotonically and never reused, which makes "newest first" the
//! outer-to-inner unfolding order.

use fxhash::FxHashSet;
use std::io::{self, Write};
use crate::graph::{Graph, NodeId, ReduceInfo};
use crate::cust_error::ProcessingError;

/// A folded group of original nodes plus the neighbors the fold removed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Hypernode {
    pub id: NodeId,
    pub members: Vec<NodeId>,
    pub absorbed: Vec<NodeId>,
}

/// The record of a short-edge merge. `placeholder` is counted in the solution immediately and
/// resolved to one of the two endpoints at unfold time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EdgeMerge {
    pub placeholder: NodeId,
    pub first: NodeId,
    pub second: NodeId,
    pub first_private: Vec<NodeId>,
    pub second_private: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Mis {
    /// Nodes confirmed to be in the set at the current kernelization level.
    pub mis: Vec<NodeId>,
    hypernodes: Vec<Hypernode>,
    subsequent: Vec<EdgeMerge>,
}

impl Mis {

    pub fn new() -> Self {
        Mis::default()
    }

    /// Confirms `node` as part of the answer at the current level.
    pub fn confirm(&mut self, node: NodeId) {
        self.mis.push(node);
    }

    /// Records that `members` and their `absorbed` neighborhood were contracted into the
    /// synthetic node `id`.
    pub fn record_fold(&mut self, id: NodeId, members: Vec<NodeId>, absorbed: Vec<NodeId>) {
        debug_assert!(self.newest_id().map_or(true, |newest| id > newest));
        self.hypernodes.push(Hypernode { id, members, absorbed });
    }

    /// Records a short-edge merge of `first` and `second` and confirms its placeholder.
    pub fn record_edge_merge(
        &mut self,
        placeholder: NodeId,
        first: NodeId,
        second: NodeId,
        first_private: Vec<NodeId>,
        second_private: Vec<NodeId>,
    ) {
        debug_assert!(self.newest_id().map_or(true, |newest| placeholder > newest));
        self.mis.push(placeholder);
        self.subsequent.push(EdgeMerge { placeholder, first, second, first_private, second_private });
    }

    fn newest_id(&self) -> Option<NodeId> {
        let h = self.hypernodes.last().map(|h| h.id);
        let m = self.subsequent.last().map(|m| m.placeholder);
        h.max(m)
    }

    /// Unfolds the confirmed nodes plus `extra` (usually the harvested isolated nodes) back to
    /// identifiers of the outermost level, walking the registries outer-before-inner. Merge
    /// records whose placeholder is no longer referenced are purged silently.
    pub fn unfold(&self, extra: &[NodeId]) -> Vec<NodeId> {
        let mut set: FxHashSet<NodeId> = self.mis.iter().copied().collect();
        set.extend(extra.iter().copied());
        let mut hi = self.hypernodes.len();
        let mut mi = self.subsequent.len();
        while hi > 0 || mi > 0 {
            let h_id = (hi > 0).then(|| self.hypernodes[hi - 1].id);
            let m_id = (mi > 0).then(|| self.subsequent[mi - 1].placeholder);
            if h_id > m_id {
                hi -= 1;
                let hyper = &self.hypernodes[hi];
                if set.remove(&hyper.id) {
                    set.extend(hyper.absorbed.iter().copied());
                } else {
                    set.extend(hyper.members.iter().copied());
                }
            } else {
                mi -= 1;
                let merge = &self.subsequent[mi];
                if set.remove(&merge.placeholder) {
                    if merge.first_private.iter().all(|x| !set.contains(x)) {
                        set.insert(merge.first);
                    } else {
                        debug_assert!(
                            merge.second_private.iter().all(|x| !set.contains(x)),
                            "both private sides of a merge ended up selected"
                        );
                        set.insert(merge.second);
                    }
                }
            }
        }
        let mut out: Vec<NodeId> = set.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Returns the registered hypernodes, oldest first.
    pub fn hypernodes(&self) -> &[Hypernode] {
        &self.hypernodes
    }

    /// Returns the registered edge merges, oldest first.
    pub fn edge_merges(&self) -> &[EdgeMerge] {
        &self.subsequent
    }

}

/// A graph under reduction together with its solution model and removal counters. One instance
/// is owned by every search tree node.
#[derive(Debug, Clone)]
pub struct MisInstance {
    pub graph: Graph,
    pub mis: Mis,
    pub info: ReduceInfo,
}

impl MisInstance {

    pub fn new(graph: Graph) -> Self {
        MisInstance { graph, mis: Mis::new(), info: ReduceInfo::default() }
    }

    /// Confirms `node` and removes its closed neighborhood. The whole closed neighborhood goes
    /// in a single removal, so neither `node` nor a neighbor can end up harvested as isolated.
    /// Returns `false` (without confirming) if `node` was already removed.
    pub fn take_into_solution(&mut self, node: NodeId) -> bool {
        if !self.graph.is_live(node) {
            return false;
        }
        let mut closed = self.graph.neighbor_vec(node);
        closed.push(node);
        self.graph.remove_set(&closed, &mut self.info);
        self.mis.confirm(node);
        true
    }

    /// Confirms every node of `node_set`, removing the closed neighborhoods as it goes. Members
    /// that were harvested by an earlier step of the same call are already part of the answer
    /// and are skipped. Errors if a member was removed before the call.
    pub fn take_all_into_solution(&mut self, node_set: &[NodeId]) -> Result<(), ProcessingError> {
        let harvested_before = self.graph.isolated().len();
        for &node in node_set {
            if !self.take_into_solution(node)
                && !self.graph.isolated()[harvested_before..].contains(&node)
            {
                return Err(ProcessingError::InvalidParameter(
                    "Given node set was not completely contained in the graph.".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Removes `node` from the graph without confirming it.
    pub fn exclude(&mut self, node: NodeId) -> bool {
        self.graph.remove(node, &mut self.info)
    }

    /// Removes all nodes of `node_set` from the graph without confirming them.
    pub fn exclude_set(&mut self, node_set: &[NodeId]) {
        self.graph.remove_set(node_set, &mut self.info);
    }

    /// Folds the degree-2 node `node` with its independent neighbors `a` and `b` into the
    /// synthetic node `new_id` and registers the hypernode.
    pub fn fold_single(&mut self, node: NodeId, a: NodeId, b: NodeId, new_id: NodeId) {
        self.graph.contract_to_single_node(&[node], &[a, b], new_id, &mut self.info);
        self.mis.record_fold(new_id, vec![node], vec![a, b]);
    }

    /// Folds the degree-3 twins `v1`, `v2` with their shared independent neighborhood into the
    /// synthetic node `new_id` and registers the hypernode.
    pub fn fold_twin(&mut self, v1: NodeId, v2: NodeId, neighborhood: [NodeId; 3], new_id: NodeId) {
        self.graph
            .contract_to_single_node(&[v1, v2], &neighborhood, new_id, &mut self.info);
        self.mis.record_fold(new_id, vec![v1, v2], neighborhood.to_vec());
    }

    /// The short-edge merge: joins the private neighborhoods of the adjacent nodes `u` and `v`
    /// with forced-exclusion edges, drops both endpoints and their common neighbors, and counts
    /// one endpoint through `placeholder`.
    pub fn merge_edge(&mut self, u: NodeId, v: NodeId, placeholder: NodeId) {
        let common = self.graph.common_neighbors(u, v);
        let in_common: FxHashSet<NodeId> = common.iter().copied().collect();
        let u_private: Vec<NodeId> = self
            .graph
            .neighbors(u)
            .filter(|x| *x != v && !in_common.contains(x))
            .collect();
        let v_private: Vec<NodeId> = self
            .graph
            .neighbors(v)
            .filter(|x| *x != u && !in_common.contains(x))
            .collect();
        // Join while everything is still live. Endpoints and commons go in one call: dropping
        // them piecewise could harvest a common neighbor that has to stay excluded.
        self.graph.join_neighborhoods(&u_private, &v_private, &mut self.info);
        let mut dropped = vec![u, v];
        dropped.extend(common);
        self.graph.remove_set(&dropped, &mut self.info);
        self.mis.record_edge_merge(placeholder, u, v, u_private, v_private);
    }

    /// Compacts the graph if enough removals accumulated.
    pub fn maybe_rebuild(&mut self) {
        if self.graph.should_rebuild(&self.info) {
            self.graph.rebuild(&mut self.info);
        }
    }

    /// Finalizes the instance once its graph is empty: the confirmed nodes and the harvested
    /// isolated nodes are unfolded back to outer identifiers.
    pub fn finalize(&mut self) -> Vec<NodeId> {
        debug_assert!(self.graph.is_empty());
        let isolated = self.graph.take_isolated();
        self.mis.unfold(&isolated)
    }

}

impl MisInstance {

    /// Writes a solution to a `Write` type.
    pub fn write_solution<W: Write>(solution: &[NodeId], mut out: W) -> Result<(), io::Error> {
        writeln!(out, "Maximum Independent Set size: {}", solution.len())?;
        for node in solution {
            writeln!(out, "{}", node)?;
        }
        Ok(())
    }

}
