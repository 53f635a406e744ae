//! Implementation of a compact, mutable, undirected graph data structure with destructive
//! removal and on-demand compaction.
//!
//! Nodes are addressed by stable identifiers. Internally each node occupies a *position* in a
//! dense slot table; all neighbor lists live contiguously and sorted in one flat buffer. Removal
//! only flips a flag and decrements the live counts of the neighbors, so removed entries stay
//! physically present until `rebuild` compacts the structure. Identifiers and positions coincide
//! until the first operation that breaks the identity (a contraction or a compaction), after
//! which an explicit mapping is kept in both directions.

use fxhash::FxHashSet;
use itertools::Itertools;
use std::io::BufRead;
use crate::cust_error::ImportError;

pub type NodeId = usize;

/// Positions are also used as indices into dense scratch tables during the search, so the
/// reserved table may not grow past this bound.
pub const MAX_NODES: usize = u32::MAX as usize;

/// Counters of destructive work since the last compaction. Used as a rebuild trigger and for
/// bookkeeping only, never for graph semantics.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct ReduceInfo {
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

impl ReduceInfo {
    pub fn clear(&mut self) {
        self.nodes_removed = 0;
        self.edges_removed = 0;
    }
}

#[derive(Debug, Clone)]
struct Slot {
    off: usize,
    len: usize,
    live: usize,
    removed: bool,
}

/// A traversal cursor: a node position plus an edge offset into its neighbor slice. The
/// explicit-stack DFS algorithms keep one cursor per open node so a scan can resume from an
/// arbitrary node in constant time.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pos: usize,
    edge: usize,
}

#[derive(Debug, Clone)]
pub struct Graph {
    slots: Vec<Slot>,
    nbuf: Vec<NodeId>,
    /// Position -> identifier and identifier -> position, absent while both are the identity.
    map: Option<(Vec<NodeId>, fxhash::FxHashMap<NodeId, usize>)>,
    live_count: usize,
    /// Identifiers harvested when their live degree dropped to zero. An isolated node always
    /// belongs to the independent set, so these flow straight into the solution.
    isolated: Vec<NodeId>,
}

// Construction.
impl Graph {

    /// Builds a graph with `n` nodes from an edge list. Both directions of each edge are
    /// materialized and each neighbor slice is sorted. Duplicate edges and self loops are
    /// dropped. Nodes without any edge are harvested as isolated right away.
    pub fn from_edges(n: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, ImportError> {
        if n > MAX_NODES {
            return Err(ImportError::TooLarge(n));
        }
        let mut adj: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for &(src, dst) in edges {
            if src >= n {
                return Err(ImportError::NodeOutOfRange(src));
            }
            if dst >= n {
                return Err(ImportError::NodeOutOfRange(dst));
            }
            if src == dst {
                continue;
            }
            adj[src].push(dst);
            adj[dst].push(src);
        }
        let mut slots = Vec::with_capacity(n);
        let mut nbuf = Vec::new();
        let mut isolated = Vec::new();
        let mut live_count = 0;
        for (id, list) in adj.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            let off = nbuf.len();
            nbuf.extend_from_slice(list);
            let removed = list.is_empty();
            if removed {
                isolated.push(id);
            } else {
                live_count += 1;
            }
            slots.push(Slot { off, len: list.len(), live: list.len(), removed });
        }
        Ok(Graph { slots, nbuf, map: None, live_count, isolated })
    }

    /// Builds a graph from two equal-length identifier sequences; the node count is inferred as
    /// the largest identifier plus one.
    pub fn from_edge_list(srcs: &[NodeId], dsts: &[NodeId]) -> Result<Self, ImportError> {
        if srcs.len() != dsts.len() {
            return Err(ImportError::InputMalformedError);
        }
        let n = srcs.iter().chain(dsts.iter()).max().map_or(0, |m| m + 1);
        let edges: Vec<(NodeId, NodeId)> = srcs.iter().copied().zip(dsts.iter().copied()).collect();
        Self::from_edges(n, &edges)
    }

    /// Reads a graph from its text representation: a three line header whose third line carries
    /// `Nodes: <n>` and `Edges: <m>` tokens, followed by one `<src> <dst>` pair per line.
    pub fn read_graph<R: BufRead>(input: R) -> Result<Self, ImportError> {
        let mut lines = input.lines();
        lines.next().ok_or(ImportError::InputMalformedError)??;
        lines.next().ok_or(ImportError::InputMalformedError)??;
        let header = lines.next().ok_or(ImportError::InputMalformedError)??;
        let tokens: Vec<&str> = header.split_whitespace().collect();
        let mut n = None;
        let mut m = None;
        for window in tokens.windows(2) {
            match window[0] {
                "Nodes:" => n = Some(window[1].parse::<usize>()?),
                "Edges:" => m = Some(window[1].parse::<usize>()?),
                _ => {}
            }
        }
        let n = n.ok_or(ImportError::InputMalformedError)?;
        let m = m.ok_or(ImportError::InputMalformedError)?;
        let mut edges = Vec::with_capacity(m);
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut s = line.split_whitespace();
            let src = s.next().ok_or(ImportError::InputMalformedError)?.parse::<NodeId>()?;
            let dst = s.next().ok_or(ImportError::InputMalformedError)?.parse::<NodeId>()?;
            if s.next().is_some() {
                return Err(ImportError::InputMalformedError);
            }
            edges.push((src, dst));
        }
        if edges.len() != m {
            return Err(ImportError::InputMalformedError);
        }
        Self::from_edges(n, &edges)
    }

}

// Position bookkeeping.
impl Graph {

    fn pos(&self, id: NodeId) -> Option<usize> {
        match &self.map {
            None => (id < self.slots.len()).then(|| id),
            Some((_, pos_of)) => pos_of.get(&id).copied(),
        }
    }

    fn id_at(&self, pos: usize) -> NodeId {
        match &self.map {
            None => pos,
            Some((id_of, _)) => id_of[pos],
        }
    }

    fn ensure_map(&mut self) {
        if self.map.is_none() {
            let id_of: Vec<NodeId> = (0..self.slots.len()).collect();
            let pos_of = id_of.iter().map(|&id| (id, id)).collect();
            self.map = Some((id_of, pos_of));
        }
    }

    fn live_pos(&self, id: NodeId) -> Option<usize> {
        self.pos(id).filter(|&p| !self.slots[p].removed)
    }

    /// Checks whether `id` names a node that has not been removed.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.live_pos(id).is_some()
    }

}

// Static queries.
impl Graph {

    /// Returns an `Iterator` over all nodes that have not been removed.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.slots.len())
            .filter(|&p| !self.slots[p].removed)
            .map(|p| self.id_at(p))
    }

    /// Returns the number of live nodes of `self`.
    pub fn num_nodes(&self) -> usize {
        self.live_count
    }

    /// Returns the amount of reserved node positions of `self`. Removed or not.
    pub fn num_reserved(&self) -> usize {
        self.slots.len()
    }

    /// Checks if `self` holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Returns the live degree of `node`, or `None` if `node` was removed.
    pub fn degree(&self, node: NodeId) -> Option<usize> {
        self.live_pos(node).map(|p| self.slots[p].live)
    }

    /// Returns the maximum live degree. With `bound` set, the scan stops early as soon as a
    /// degree at or above the bound is seen.
    pub fn max_degree(&self, bound: Option<usize>) -> usize {
        let mut max = 0;
        for p in 0..self.slots.len() {
            if self.slots[p].removed {
                continue;
            }
            if self.slots[p].live > max {
                max = self.slots[p].live;
                if let Some(b) = bound {
                    if max >= b {
                        return max;
                    }
                }
            }
        }
        max
    }

    /// Returns a live node of maximum degree, or `None` if the graph is empty.
    pub fn max_degree_node(&self) -> Option<NodeId> {
        self.nodes().max_by_key(|&id| self.degree(id).expect("`id` is live"))
    }

    /// Returns an `Iterator` over the live neighbors of `node`.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let (off, len) = self
            .live_pos(node)
            .map(|p| (self.slots[p].off, self.slots[p].len))
            .unwrap_or((0, 0));
        self.nbuf[off..off + len]
            .iter()
            .copied()
            .filter(move |&nid| self.is_live(nid))
    }

    /// Returns the live neighbors of `node` as a sorted `Vec`.
    pub fn neighbor_vec(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors(node).collect()
    }

    /// Checks if the edge between `a` and `b` exists, by binary search over the sorted slice.
    pub fn edge_exists(&self, a: NodeId, b: NodeId) -> bool {
        let (pa, pb) = match (self.live_pos(a), self.live_pos(b)) {
            (Some(pa), Some(pb)) => (pa, pb),
            _ => return false,
        };
        // Search the shorter physical slice.
        let (p, target) = if self.slots[pa].len <= self.slots[pb].len { (pa, b) } else { (pb, a) };
        let slot = &self.slots[p];
        self.nbuf[slot.off..slot.off + slot.len].binary_search(&target).is_ok()
    }

    /// Returns the common live neighbors of `a` and `b` by merging their sorted slices.
    pub fn common_neighbors(&self, a: NodeId, b: NodeId) -> Vec<NodeId> {
        self.common_neighbors_bounded(a, b, usize::MAX)
    }

    /// Checks whether `a` and `b` share at least `at_least` live neighbors, stopping the merge
    /// as soon as the bound is reached.
    pub fn has_common_neighbors(&self, a: NodeId, b: NodeId, at_least: usize) -> bool {
        self.common_neighbors_bounded(a, b, at_least).len() >= at_least
    }

    fn common_neighbors_bounded(&self, a: NodeId, b: NodeId, stop_at: usize) -> Vec<NodeId> {
        let (pa, pb) = match (self.live_pos(a), self.live_pos(b)) {
            (Some(pa), Some(pb)) => (pa, pb),
            _ => return Vec::new(),
        };
        let sa = &self.nbuf[self.slots[pa].off..self.slots[pa].off + self.slots[pa].len];
        let sb = &self.nbuf[self.slots[pb].off..self.slots[pb].off + self.slots[pb].len];
        let mut common = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < sa.len() && j < sb.len() && common.len() < stop_at {
            if sa[i] < sb[j] {
                i += 1;
            } else if sa[i] > sb[j] {
                j += 1;
            } else {
                if self.is_live(sa[i]) {
                    common.push(sa[i]);
                }
                i += 1;
                j += 1;
            }
        }
        common
    }

    /// Returns the number of nodes at distance exactly two from `node`.
    pub fn second_neighborhood_size(&self, node: NodeId) -> usize {
        let mut closed: FxHashSet<NodeId> = self.neighbors(node).collect();
        closed.insert(node);
        let mut second = FxHashSet::default();
        for neigh in self.neighbors(node) {
            for nn in self.neighbors(neigh) {
                if !closed.contains(&nn) {
                    second.insert(nn);
                }
            }
        }
        second.len()
    }

    /// Returns the number of edges among the live neighbors of `node`. A sparse neighborhood
    /// makes a node the better branching candidate, since including it removes more structure.
    pub fn neighborhood_edge_count(&self, node: NodeId) -> usize {
        let neighbors = self.neighbor_vec(node);
        let mut count = 0;
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if self.edge_exists(a, b) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Returns, per degree `d` up to `cap`, how many live neighbors of `node` have degree `d`;
    /// neighbors above `cap` are counted in the last bucket.
    pub fn neighbor_degree_histogram(&self, node: NodeId, cap: usize) -> Vec<usize> {
        let mut histogram = vec![0; cap + 1];
        for neigh in self.neighbors(node) {
            let d = self.degree(neigh).expect("`neigh` is live").min(cap);
            histogram[d] += 1;
        }
        histogram
    }

    /// Checks if `node_set` is a clique in `self`.
    pub fn is_clique(&self, node_set: &[NodeId]) -> bool {
        for (i, &a) in node_set.iter().enumerate() {
            for &b in &node_set[i + 1..] {
                if !self.edge_exists(a, b) {
                    return false;
                }
            }
        }
        true
    }

    /// Checks if no two nodes of `node_set` are adjacent in `self`.
    pub fn is_independent(&self, node_set: &[NodeId]) -> bool {
        for (i, &a) in node_set.iter().enumerate() {
            for &b in &node_set[i + 1..] {
                if self.edge_exists(a, b) {
                    return false;
                }
            }
        }
        true
    }

    /// Returns the identifiers harvested as isolated so far.
    pub fn isolated(&self) -> &[NodeId] {
        &self.isolated
    }

    /// Drains the harvested isolated identifiers.
    pub fn take_isolated(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.isolated)
    }

}

// Traversal.
impl Graph {

    /// Positions a cursor at `node`, or `None` if `node` was removed.
    pub fn cursor(&self, node: NodeId) -> Option<Cursor> {
        self.live_pos(node).map(|pos| Cursor { pos, edge: 0 })
    }

    /// Advances `cur` to its next live edge and returns the neighbor identifier, transparently
    /// skipping removed entries.
    pub fn advance(&self, cur: &mut Cursor) -> Option<NodeId> {
        let slot = &self.slots[cur.pos];
        while cur.edge < slot.len {
            let nid = self.nbuf[slot.off + cur.edge];
            cur.edge += 1;
            if self.is_live(nid) {
                return Some(nid);
            }
        }
        None
    }

    /// Returns the connected components of `self` as lists of identifiers, by iterative
    /// depth-first search over traversal cursors.
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut seen = vec![false; self.slots.len()];
        let mut components = Vec::new();
        for p in 0..self.slots.len() {
            if self.slots[p].removed || seen[p] {
                continue;
            }
            let mut comp = Vec::new();
            let mut stack = vec![Cursor { pos: p, edge: 0 }];
            seen[p] = true;
            comp.push(self.id_at(p));
            loop {
                let step = match stack.last_mut() {
                    Some(cur) => self.advance(cur),
                    None => break,
                };
                if let Some(nid) = step {
                    let np = self.pos(nid).expect("`nid` is live");
                    if !seen[np] {
                        seen[np] = true;
                        comp.push(nid);
                        stack.push(Cursor { pos: np, edge: 0 });
                    }
                } else {
                    stack.pop();
                }
            }
            components.push(comp);
        }
        components
    }

}

// Destructive mutation.
impl Graph {

    /// Removes `node`, decrementing its neighbors' live counts. Neighbors whose count drops to
    /// zero are harvested into the isolated list. Returns `true` if a node was removed.
    pub fn remove(&mut self, node: NodeId, info: &mut ReduceInfo) -> bool {
        let before = self.live_count;
        self.remove_set(&[node], info);
        self.live_count < before
    }

    /// Removes all nodes of `node_set`. The whole set is marked removed before any live count
    /// is touched, so the harvest never picks up a member of the set itself.
    pub fn remove_set(&mut self, node_set: &[NodeId], info: &mut ReduceInfo) {
        let mut marked = Vec::with_capacity(node_set.len());
        for &id in node_set {
            if let Some(p) = self.live_pos(id) {
                self.slots[p].removed = true;
                self.live_count -= 1;
                marked.push(p);
            }
        }
        for &p in &marked {
            info.nodes_removed += 1;
            let (off, len, live) = (self.slots[p].off, self.slots[p].len, self.slots[p].live);
            info.edges_removed += live;
            for i in off..off + len {
                let nid = self.nbuf[i];
                if let Some(np) = self.live_pos(nid) {
                    self.slots[np].live -= 1;
                    if self.slots[np].live == 0 {
                        self.slots[np].removed = true;
                        self.live_count -= 1;
                        self.isolated.push(nid);
                    }
                }
            }
            self.slots[p].live = 0;
        }
    }

    /// Replaces the neighbor slice of the node at position `p` by `list`, appending it to the
    /// buffer and leaving the old slice behind as garbage for the next compaction.
    fn rewrite_slice(&mut self, p: usize, list: Vec<NodeId>, info: &mut ReduceInfo) {
        debug_assert!(list.windows(2).all(|w| w[0] < w[1]), "slice must be strictly sorted");
        info.edges_removed += self.slots[p].len;
        self.slots[p].off = self.nbuf.len();
        self.slots[p].len = list.len();
        self.slots[p].live = list.len();
        self.nbuf.extend(list);
    }

    /// Contracts `members` together with the `absorbed` neighbor set into one fresh node with
    /// identifier `new_id` (supplied by the caller's allocator). Every external neighbor of the
    /// contracted group is rewired to the new node, deduplicating shared edges. Returns the
    /// identifier of the new node.
    pub fn contract_to_single_node(
        &mut self,
        members: &[NodeId],
        absorbed: &[NodeId],
        new_id: NodeId,
        info: &mut ReduceInfo,
    ) -> NodeId {
        let folded: FxHashSet<NodeId> = members.iter().chain(absorbed.iter()).copied().collect();
        let mut external: Vec<NodeId> = folded
            .iter()
            .flat_map(|&x| self.neighbor_vec(x))
            .filter(|nid| !folded.contains(nid))
            .sorted()
            .dedup()
            .collect();
        external.retain(|&x| self.is_live(x));
        // Drop the folded group without cascading; the rewrite below sets exact live counts.
        for &x in &folded {
            if let Some(p) = self.live_pos(x) {
                self.slots[p].removed = true;
                self.slots[p].live = 0;
                self.live_count -= 1;
                info.nodes_removed += 1;
            }
        }
        if self.map.is_none() && new_id != self.slots.len() {
            self.ensure_map();
        }
        let newpos = self.slots.len();
        let off = self.nbuf.len();
        self.slots.push(Slot { off, len: external.len(), live: external.len(), removed: false });
        self.nbuf.extend(external.iter().copied());
        if let Some((id_of, pos_of)) = &mut self.map {
            id_of.push(new_id);
            pos_of.insert(new_id, newpos);
        }
        self.live_count += 1;
        if external.is_empty() {
            self.slots[newpos].removed = true;
            self.live_count -= 1;
            self.isolated.push(new_id);
        }
        for &x in &external {
            let p = self.live_pos(x).expect("`x` is a live external neighbor");
            let mut list = self.neighbor_vec(x);
            let at = list.binary_search(&new_id).unwrap_err();
            list.insert(at, new_id);
            self.rewrite_slice(p, list, info);
        }
        new_id
    }

    /// Adds every missing edge between `left` and `right` (removed members are skipped). Used by
    /// the short-edge branch to join the private neighborhoods of the merged endpoints.
    pub fn join_neighborhoods(&mut self, left: &[NodeId], right: &[NodeId], info: &mut ReduceInfo) {
        let live_left: Vec<NodeId> = left.iter().copied().filter(|&x| self.is_live(x)).collect();
        let live_right: Vec<NodeId> = right.iter().copied().filter(|&x| self.is_live(x)).collect();
        if live_left.is_empty() || live_right.is_empty() {
            return;
        }
        for (side, other) in [(&live_left, &live_right), (&live_right, &live_left)] {
            for &x in side.iter() {
                let p = self.live_pos(x).expect("`x` was filtered live");
                let mut list = self.neighbor_vec(x);
                let mut grew = false;
                for &y in other.iter() {
                    if y == x {
                        continue;
                    }
                    if let Err(at) = list.binary_search(&y) {
                        list.insert(at, y);
                        grew = true;
                    }
                }
                if grew {
                    self.rewrite_slice(p, list, info);
                }
            }
        }
    }

}

// Compaction.
impl Graph {

    /// Checks if enough removals accumulated since the last compaction to make a `rebuild`
    /// worthwhile.
    pub fn should_rebuild(&self, info: &ReduceInfo) -> bool {
        info.nodes_removed * 4 > self.slots.len() || info.edges_removed * 2 > self.nbuf.len()
    }

    /// Full compaction: constructs a fresh slot table, mapping and neighbor buffer holding only
    /// live nodes and live edges, and clears the counters of `info`. Nodes found with zero live
    /// degree are harvested instead of kept.
    pub fn rebuild(&mut self, info: &mut ReduceInfo) {
        let mut slots = Vec::with_capacity(self.live_count);
        let mut nbuf = Vec::new();
        let mut id_of = Vec::with_capacity(self.live_count);
        let mut pos_of = fxhash::FxHashMap::default();
        for p in 0..self.slots.len() {
            if self.slots[p].removed {
                continue;
            }
            let id = self.id_at(p);
            let list = self.neighbor_vec(id);
            if list.is_empty() {
                self.isolated.push(id);
                self.live_count -= 1;
                continue;
            }
            pos_of.insert(id, slots.len());
            id_of.push(id);
            slots.push(Slot { off: nbuf.len(), len: list.len(), live: list.len(), removed: false });
            nbuf.extend(list);
        }
        self.slots = slots;
        self.nbuf = nbuf;
        self.map = Some((id_of, pos_of));
        info.clear();
    }

    /// Compaction restricted to `subset`: returns a fresh graph over the live members of
    /// `subset` and the edges among them, keeping identifiers. Used to split off a component
    /// after a cut was found.
    pub fn rebuild_from_nodes(&self, subset: &FxHashSet<NodeId>) -> Graph {
        let members: Vec<NodeId> = subset
            .iter()
            .copied()
            .filter(|&id| self.is_live(id))
            .sorted()
            .collect();
        let mut slots = Vec::with_capacity(members.len());
        let mut nbuf = Vec::new();
        let mut id_of = Vec::with_capacity(members.len());
        let mut pos_of = fxhash::FxHashMap::default();
        let mut isolated = Vec::new();
        let mut live_count = 0;
        for &id in &members {
            let list: Vec<NodeId> =
                self.neighbors(id).filter(|nid| subset.contains(nid)).collect();
            let removed = list.is_empty();
            if removed {
                isolated.push(id);
            } else {
                live_count += 1;
            }
            pos_of.insert(id, slots.len());
            id_of.push(id);
            slots.push(Slot { off: nbuf.len(), len: list.len(), live: list.len(), removed });
            nbuf.extend(list);
        }
        Graph { slots, nbuf, map: Some((id_of, pos_of)), live_count, isolated }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;

    fn path4() -> Graph {
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap()
    }

    #[test]
    fn read_graph_test() {
        let input = IoCursor::new(
            "% generated\n% undirected\n% Nodes: 5 Edges: 4\n0 1\n1 2\n2 3\n3 4\n",
        );
        let graph = Graph::read_graph(input);
        assert!(graph.is_ok());
        let graph = graph.unwrap();
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.degree(2), Some(2));
        assert!(graph.edge_exists(3, 4));
        assert!(!graph.edge_exists(0, 4));
    }

    #[test]
    fn read_graph_truncated_test() {
        let input = IoCursor::new("%\n%\n% Nodes: 3 Edges: 3\n0 1\n1 2\n");
        assert!(Graph::read_graph(input).is_err());
    }

    #[test]
    fn out_of_range_test() {
        assert!(Graph::from_edges(3, &[(0, 5)]).is_err());
    }

    #[test]
    fn isolated_at_construction_test() {
        let graph = Graph::from_edge_list(&[0, 4], &[1, 5]).unwrap();
        // Nodes 2 and 3 carry no edge and are harvested right away.
        assert_eq!(graph.num_nodes(), 4);
        assert_eq!(graph.isolated(), &[2, 3]);
    }

    #[test]
    fn remove_and_harvest_test() {
        let mut graph = path4();
        let mut info = ReduceInfo::default();
        assert!(graph.remove(1, &mut info));
        // Node 0 lost its only neighbor and was harvested.
        assert_eq!(graph.isolated(), &[0]);
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.degree(2), Some(1));
        assert!(!graph.edge_exists(1, 2));
        assert!(info.nodes_removed >= 1);
    }

    #[test]
    fn remove_set_no_self_harvest_test() {
        // Removing both endpoints of an edge must not harvest either of them.
        let mut graph = Graph::from_edges(4, &[(0, 1), (0, 2), (1, 3)]).unwrap();
        let mut info = ReduceInfo::default();
        graph.remove_set(&[0, 1], &mut info);
        assert_eq!(graph.isolated(), &[2, 3]);
        assert!(graph.is_empty());
    }

    #[test]
    fn contract_test() {
        // Fold the degree-2 node 1 with neighbors {0, 2} on a path 0-1-2-3.
        let mut graph = path4();
        let mut info = ReduceInfo::default();
        let new_id = graph.contract_to_single_node(&[1], &[0, 2], 4, &mut info);
        assert_eq!(new_id, 4);
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.neighbor_vec(3), vec![4]);
        assert_eq!(graph.neighbor_vec(4), vec![3]);
        assert!(graph.edge_exists(3, 4));
        assert!(!graph.is_live(1));
    }

    #[test]
    fn contract_dedup_test() {
        // Both absorbed neighbors reach node 3, which must end up with a single edge to the
        // contraction result.
        let mut graph = Graph::from_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]).unwrap();
        let mut info = ReduceInfo::default();
        graph.contract_to_single_node(&[0], &[1, 2], 4, &mut info);
        assert_eq!(graph.neighbor_vec(3), vec![4]);
        assert_eq!(graph.degree(4), Some(1));
    }

    #[test]
    fn contract_isolating_test() {
        // Folding a triangle-free star center whose neighbors have no outside edges isolates
        // the fresh node.
        let mut graph = Graph::from_edges(3, &[(0, 1), (0, 2)]).unwrap();
        let mut info = ReduceInfo::default();
        graph.contract_to_single_node(&[0], &[1, 2], 3, &mut info);
        assert!(graph.is_empty());
        assert_eq!(graph.isolated(), &[3]);
    }

    #[test]
    fn join_neighborhoods_test() {
        let mut graph = Graph::from_edges(5, &[(0, 1), (2, 3), (3, 4)]).unwrap();
        let mut info = ReduceInfo::default();
        graph.join_neighborhoods(&[0, 1], &[2, 4], &mut info);
        assert!(graph.edge_exists(0, 2));
        assert!(graph.edge_exists(0, 4));
        assert!(graph.edge_exists(1, 2));
        assert!(graph.edge_exists(1, 4));
        assert!(!graph.edge_exists(0, 3));
    }

    #[test]
    fn rebuild_test() {
        let mut graph = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap();
        let mut info = ReduceInfo::default();
        graph.remove_set(&[0, 3], &mut info);
        graph.rebuild(&mut info);
        assert_eq!(info, ReduceInfo::default());
        assert_eq!(graph.num_nodes(), 4);
        assert!(graph.edge_exists(1, 2));
        assert!(graph.edge_exists(4, 5));
        assert!(!graph.edge_exists(0, 1));
        assert_eq!(graph.degree(1), Some(1));
    }

    #[test]
    fn rebuild_from_nodes_test() {
        let graph = Graph::from_edges(6, &[(0, 1), (1, 2), (3, 4), (4, 5), (2, 3)]).unwrap();
        let subset: FxHashSet<NodeId> = [0, 1, 2].into_iter().collect();
        let sub = graph.rebuild_from_nodes(&subset);
        assert_eq!(sub.num_nodes(), 3);
        assert!(sub.edge_exists(0, 1));
        assert!(sub.edge_exists(1, 2));
        assert!(!sub.edge_exists(2, 3));
    }

    #[test]
    fn common_neighbors_test() {
        let graph = Graph::from_edges(5, &[(0, 2), (0, 3), (0, 4), (1, 2), (1, 3)]).unwrap();
        assert_eq!(graph.common_neighbors(0, 1), vec![2, 3]);
        assert!(graph.has_common_neighbors(0, 1, 2));
        assert!(!graph.has_common_neighbors(0, 1, 3));
    }

    #[test]
    fn components_test() {
        let graph = Graph::from_edges(6, &[(0, 1), (1, 2), (3, 4), (4, 5)]).unwrap();
        let mut comps = graph.components();
        comps.sort_by_key(|c| c[0]);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 3);
        assert_eq!(comps[1].len(), 3);
    }

    #[test]
    fn max_degree_bound_test() {
        let graph = Graph::from_edges(6, &[(0, 1), (0, 2), (0, 3), (0, 4), (4, 5)]).unwrap();
        assert_eq!(graph.max_degree(None), 4);
        // With a bound the scan may stop at the first degree reaching it.
        assert!(graph.max_degree(Some(3)) >= 3);
        assert_eq!(graph.max_degree(Some(10)), 4);
    }

    #[test]
    fn neighborhood_structure_test() {
        // Neighborhood of 0 is {1, 2, 3} with the single edge 1-2.
        let graph = Graph::from_edges(5, &[(0, 1), (0, 2), (0, 3), (1, 2), (3, 4)]).unwrap();
        assert_eq!(graph.neighborhood_edge_count(0), 1);
        let histogram = graph.neighbor_degree_histogram(0, 8);
        assert_eq!(histogram[2], 3);
        assert_eq!(histogram.iter().sum::<usize>(), 3);
    }

    #[test]
    fn cursor_test() {
        let graph = path4();
        let mut cur = graph.cursor(1).unwrap();
        assert_eq!(graph.advance(&mut cur), Some(0));
        assert_eq!(graph.advance(&mut cur), Some(2));
        assert_eq!(graph.advance(&mut cur), None);
    }

}
