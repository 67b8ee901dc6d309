use crate::{
    arena::{ChainIter, NodeArena, NodeId},
    error::LabResult,
    nucleotide::{BASE, HALF_BASE, parse_sequence},
    primer::{Primer, PrimerMatch},
};
use itertools::Itertools;

/// Default wrap width of [`Strand::render_duplex`].
pub const PRINT_LEN: usize = 100;

/// A single-stranded molecule: a chain of nodes in a [`NodeArena`].
///
/// `free` holds the anchor nodes where ligation may start. They are fixed at
/// construction: the first node, plus the node at offset `BASE / 2` for
/// ordinary strands or `BASE` for starting strands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strand {
    first: NodeId,
    last: NodeId,
    free: Vec<NodeId>,
}

impl Strand {
    pub fn from_sequence(arena: &mut NodeArena, sequence: &str, starting: bool) -> LabResult<Self> {
        let bases = parse_sequence(sequence)?;
        let anchor_offset = if starting { BASE } else { HALF_BASE };
        let first = arena.push(bases[0]);
        let mut free = vec![first];
        let mut last = first;
        for (i, base) in bases.iter().enumerate().skip(1) {
            let node = arena.push(*base);
            arena.link(last, node);
            last = node;
            if i == anchor_offset {
                free.push(node);
            }
        }
        Ok(Self { first, last, free })
    }

    /// Wraps an already linked chain, e.g. one synthesized by polymerase.
    pub fn from_chain(first: NodeId, last: NodeId) -> Self {
        Self {
            first,
            last,
            free: vec![],
        }
    }

    #[inline(always)]
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// Last node of the chain. Kept current when ligation merges fragments
    /// onto this strand.
    #[inline(always)]
    pub fn last(&self) -> NodeId {
        self.last
    }

    #[inline(always)]
    pub fn free_anchors(&self) -> &[NodeId] {
        &self.free
    }

    pub(crate) fn take_free_anchors(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.free)
    }

    /// Takes over the anchors of a fragment now linked into this chain.
    pub(crate) fn absorb(&mut self, anchors: Vec<NodeId>) {
        self.free.extend(anchors);
    }

    pub(crate) fn set_last(&mut self, last: NodeId) {
        self.last = last;
    }

    pub fn nodes<'a>(&self, arena: &'a NodeArena) -> ChainIter<'a> {
        arena.walk_forward(self.first)
    }

    pub fn len(&self, arena: &NodeArena) -> usize {
        self.nodes(arena).count()
    }

    pub fn sequence(&self, arena: &NodeArena) -> String {
        self.nodes(arena)
            .map(|id| arena.base(id).letter() as char)
            .collect()
    }

    /// Heat: breaks every base pair along the chain.
    pub fn denaturation(&self, arena: &mut NodeArena) {
        let ids = self.nodes(arena).collect::<Vec<_>>();
        for id in ids {
            arena.unpair(id);
        }
    }

    /// Cool: reports every `BASE` window equal to `primer1` (forward, anchored
    /// at the window start) or `primer2` (backward, anchored at the window end).
    /// Windows are consecutive and do not overlap.
    pub fn annealing(
        &self,
        arena: &NodeArena,
        primer1: &Primer,
        primer2: &Primer,
    ) -> Vec<PrimerMatch> {
        let ids = self.nodes(arena).collect::<Vec<_>>();
        let mut ret = vec![];
        for window in ids.chunks_exact(BASE) {
            let bases = window.iter().map(|id| arena.base(*id)).collect::<Vec<_>>();
            if bases == primer1.bases() {
                ret.push(PrimerMatch::forward(window[0]));
            } else if bases == primer2.bases() {
                ret.push(PrimerMatch::backward(window[BASE - 1]));
            }
        }
        ret
    }

    /// Three-row picture: the strand, bond marks, and the paired bases.
    pub fn render_duplex(&self, arena: &NodeArena, width: usize) -> String {
        let width = width.max(1);
        let mut top = String::new();
        let mut bonds = String::new();
        let mut bottom = String::new();
        for id in self.nodes(arena) {
            top.push(arena.base(id).letter() as char);
            top.push(if arena.next(id).is_some() { '-' } else { ' ' });
            match arena.partner(id) {
                Some(partner) => {
                    bonds.push_str("| ");
                    bottom.push(arena.base(partner).letter() as char);
                    bottom.push(if arena.next(partner).is_some() { '-' } else { ' ' });
                }
                None => {
                    bonds.push_str("  ");
                    bottom.push_str("  ");
                }
            }
        }
        let rows = [top, bonds, bottom];
        let chars = rows.iter().map(|r| r.chars().collect::<Vec<_>>()).collect::<Vec<_>>();
        let total = chars[0].len();
        let mut blocks = vec![];
        let mut pos = 0;
        while pos < total {
            let to = total.min(pos + width);
            blocks.push(
                chars
                    .iter()
                    .map(|row| row[pos..to].iter().collect::<String>().trim_end().to_string())
                    .join("\n"),
            );
            pos = to;
        }
        blocks.join("\n")
    }
}
