//! Storage for every nucleotide node of a tube.
//!
//! Nodes are addressed by [`NodeId`] handles. `next`/`prev` form the backbone
//! of a strand; `partner` is the base pairing with a node on another strand.
//! All pairing goes through [`NodeArena::pair`] and [`NodeArena::unpair`],
//! which keep it symmetric.

use crate::{
    error::{LabError, LabResult},
    nucleotide::Nucleotide,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    base: Nucleotide,
    next: Option<NodeId>,
    prev: Option<NodeId>,
    partner: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds an unlinked node.
    pub fn push(&mut self, base: Nucleotide) -> NodeId {
        self.nodes.push(Node {
            base,
            next: None,
            prev: None,
            partner: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    #[inline(always)]
    pub fn base(&self, id: NodeId) -> Nucleotide {
        self.nodes[id.0].base
    }

    #[inline(always)]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    #[inline(always)]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev
    }

    #[inline(always)]
    pub fn partner(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].partner
    }

    /// Links `from -> to` on the backbone, updating both sides.
    pub fn link(&mut self, from: NodeId, to: NodeId) {
        debug_assert!(self.nodes[from.0].next.is_none());
        debug_assert!(self.nodes[to.0].prev.is_none());
        self.nodes[from.0].next = Some(to);
        self.nodes[to.0].prev = Some(from);
    }

    /// Base-pairs two nodes. Any previous partner of either node is released.
    pub fn pair(&mut self, a: NodeId, b: NodeId) {
        self.unpair(a);
        self.unpair(b);
        self.nodes[a.0].partner = Some(b);
        self.nodes[b.0].partner = Some(a);
    }

    pub fn unpair(&mut self, id: NodeId) {
        if let Some(other) = self.nodes[id.0].partner.take() {
            if self.nodes[other.0].partner == Some(id) {
                self.nodes[other.0].partner = None;
            }
        }
    }

    /// Walks `next` links starting at `from` (inclusive).
    pub fn walk_forward(&self, from: NodeId) -> ChainIter<'_> {
        ChainIter {
            arena: self,
            current: Some(from),
            forward: true,
        }
    }

    /// Walks `prev` links starting at `from` (inclusive).
    pub fn walk_backward(&self, from: NodeId) -> ChainIter<'_> {
        ChainIter {
            arena: self,
            current: Some(from),
            forward: false,
        }
    }

    /// Up to `len` bases starting at `from`, following `next`.
    pub fn window(&self, from: NodeId, len: usize) -> Vec<Nucleotide> {
        self.walk_forward(from)
            .take(len)
            .map(|id| self.base(id))
            .collect()
    }

    /// Checks pairing symmetry, complement correctness, backbone
    /// consistency and that no chain closes on itself.
    pub fn check_invariants(&self) -> LabResult<()> {
        for (idx, node) in self.nodes.iter().enumerate() {
            let id = NodeId(idx);
            if let Some(partner) = node.partner {
                let other = &self.nodes[partner.0];
                if other.partner != Some(id) {
                    return Err(LabError::structural(format!(
                        "Node {idx} pairs with node {} which does not pair back",
                        partner.0
                    )));
                }
                if !node.base.pairs_with(other.base) {
                    return Err(LabError::structural(format!(
                        "Node {idx} ({}) pairs with non-complementary node {} ({})",
                        node.base, partner.0, other.base
                    )));
                }
            }
            if let Some(next) = node.next {
                if self.nodes[next.0].prev != Some(id) {
                    return Err(LabError::structural(format!(
                        "Node {idx} links to node {} whose prev link differs",
                        next.0
                    )));
                }
            }
            if let Some(prev) = node.prev {
                if self.nodes[prev.0].next != Some(id) {
                    return Err(LabError::structural(format!(
                        "Node {idx} has prev node {} which does not link back",
                        prev.0
                    )));
                }
            }
        }

        // With consistent links every acyclic chain starts at a node without
        // `prev`; nodes not reachable from such a head sit on a ring.
        let mut reached = vec![false; self.nodes.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.prev.is_some() {
                continue;
            }
            let mut current = Some(NodeId(idx));
            while let Some(id) = current {
                if reached[id.0] {
                    break;
                }
                reached[id.0] = true;
                current = self.nodes[id.0].next;
            }
        }
        if let Some(idx) = reached.iter().position(|r| !r) {
            return Err(LabError::structural(format!(
                "Node {idx} lies on a circular chain"
            )));
        }
        Ok(())
    }
}

pub struct ChainIter<'a> {
    arena: &'a NodeArena,
    current: Option<NodeId>,
    forward: bool,
}

impl Iterator for ChainIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = if self.forward {
            self.arena.next(id)
        } else {
            self.arena.prev(id)
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(arena: &mut NodeArena, bases: &[Nucleotide]) -> Vec<NodeId> {
        let ids: Vec<NodeId> = bases.iter().map(|b| arena.push(*b)).collect();
        for w in ids.windows(2) {
            arena.link(w[0], w[1]);
        }
        ids
    }

    #[test]
    fn test_walk_and_window() {
        let mut arena = NodeArena::new();
        let ids = chain(
            &mut arena,
            &[Nucleotide::A, Nucleotide::T, Nucleotide::G, Nucleotide::C],
        );
        assert_eq!(arena.walk_forward(ids[0]).count(), 4);
        assert_eq!(arena.walk_backward(ids[3]).collect::<Vec<_>>(), {
            let mut r = ids.clone();
            r.reverse();
            r
        });
        assert_eq!(
            arena.window(ids[1], 10),
            vec![Nucleotide::T, Nucleotide::G, Nucleotide::C]
        );
        assert!(arena.check_invariants().is_ok());
    }

    #[test]
    fn test_pair_is_symmetric_and_releases_old_partner() {
        let mut arena = NodeArena::new();
        let a = arena.push(Nucleotide::A);
        let t1 = arena.push(Nucleotide::T);
        let t2 = arena.push(Nucleotide::T);
        arena.pair(a, t1);
        assert_eq!(arena.partner(a), Some(t1));
        assert_eq!(arena.partner(t1), Some(a));
        arena.pair(a, t2);
        assert_eq!(arena.partner(t1), None);
        assert_eq!(arena.partner(t2), Some(a));
        assert!(arena.check_invariants().is_ok());
        arena.unpair(t2);
        assert_eq!(arena.partner(a), None);
    }

    #[test]
    fn test_invariant_detects_ring() {
        let mut arena = NodeArena::new();
        let ids = chain(
            &mut arena,
            &[Nucleotide::A, Nucleotide::C, Nucleotide::G],
        );
        assert!(arena.check_invariants().is_ok());
        arena.link(ids[2], ids[0]);
        let err = arena.check_invariants().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::StructuralInconsistency);
        assert!(err.message.contains("circular"));
    }

    #[test]
    fn test_invariant_detects_mismatched_pair() {
        let mut arena = NodeArena::new();
        let a = arena.push(Nucleotide::A);
        let g = arena.push(Nucleotide::G);
        arena.pair(a, g);
        let err = arena.check_invariants().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::StructuralInconsistency);
    }
}
