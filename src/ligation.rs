//! Sticky-end pairing of free anchors and backbone repair.

use crate::{
    arena::{NodeArena, NodeId},
    nucleotide::{BASE, HALF_BASE, Nucleotide},
};
use rand::{Rng, seq::SliceRandom};
use std::collections::HashMap;

/// Overlap between two windows read from their anchors: `BASE` when the
/// whole window is complementary, `BASE / 2` when at least the first half is,
/// 0 otherwise.
pub fn overlap_of(first: &[Nucleotide], second: &[Nucleotide]) -> usize {
    let run = first
        .iter()
        .zip(second)
        .take(BASE)
        .take_while(|(a, b)| a.pairs_with(**b))
        .count();
    if run >= BASE {
        BASE
    } else if run >= HALF_BASE {
        HALF_BASE
    } else {
        0
    }
}

pub fn complementary_overlap(arena: &NodeArena, first: NodeId, second: NodeId) -> usize {
    overlap_of(&arena.window(first, BASE), &arena.window(second, BASE))
}

#[derive(Debug, Clone, Default)]
pub struct LigationOutcome {
    pub pairs: Vec<(NodeId, NodeId, usize)>,
    pub remaining: Vec<NodeId>,
}

/// Shuffles the pool, then pairs each anchor with the first later anchor it
/// overlaps with. Paired anchors leave the pool. The scan is greedy in
/// shuffled order, not an optimal matching.
pub fn pair_anchors<R: Rng + ?Sized>(
    arena: &mut NodeArena,
    mut pool: Vec<NodeId>,
    rng: &mut R,
) -> LigationOutcome {
    pool.shuffle(rng);
    let windows = pool
        .iter()
        .map(|id| arena.window(*id, BASE))
        .collect::<Vec<_>>();

    // Any overlap needs the first half complementary, so candidates are
    // bucketed by their leading half window. Buckets keep scan order.
    let mut buckets: HashMap<&[Nucleotide], Vec<usize>> = HashMap::new();
    for (idx, window) in windows.iter().enumerate() {
        if window.len() >= HALF_BASE {
            buckets.entry(&window[..HALF_BASE]).or_default().push(idx);
        }
    }

    let mut consumed = vec![false; pool.len()];
    let mut pairs = vec![];
    for i in 0..pool.len() {
        if consumed[i] || windows[i].len() < HALF_BASE {
            continue;
        }
        let wanted = windows[i][..HALF_BASE]
            .iter()
            .map(|n| n.complement())
            .collect::<Vec<_>>();
        let Some(candidates) = buckets.get(wanted.as_slice()) else {
            continue;
        };
        let start = candidates.partition_point(|&j| j <= i);
        let found = candidates[start..].iter().copied().find_map(|j| {
            if consumed[j] {
                return None;
            }
            let length = overlap_of(&windows[i], &windows[j]);
            (length > 0).then_some((j, length))
        });
        if let Some((j, length)) = found {
            consumed[i] = true;
            consumed[j] = true;
            pairs.push((pool[i], pool[j], length));
        }
    }

    for &(first, second, length) in &pairs {
        connect(arena, first, second, length);
    }

    let remaining = pool
        .into_iter()
        .zip(consumed)
        .filter_map(|(id, used)| (!used).then_some(id))
        .collect();
    LigationOutcome { pairs, remaining }
}

/// Base-pairs `length` consecutive nodes of both chains.
fn connect(arena: &mut NodeArena, first: NodeId, second: NodeId, length: usize) {
    let mut a = Some(first);
    let mut b = Some(second);
    for _ in 0..length {
        let (Some(x), Some(y)) = (a, b) else {
            break;
        };
        arena.pair(x, y);
        a = arena.next(x);
        b = arena.next(y);
    }
}

/// Joins the fragment ending at `last` to the fragment that continues on
/// the other side of its partner: `last.next = last.partner.next.partner`.
/// Returns the node linked to, if any.
pub fn repair_backbone(arena: &mut NodeArena, last: NodeId) -> Option<NodeId> {
    if arena.next(last).is_some() {
        return None;
    }
    let partner = arena.partner(last)?;
    let partner_next = arena.next(partner)?;
    let target = arena.partner(partner_next)?;
    if arena.prev(target).is_some() {
        return None;
    }
    if arena.walk_forward(target).any(|id| id == last) {
        return None;
    }
    arena.link(last, target);
    Some(target)
}
