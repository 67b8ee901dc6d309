use crate::{
    arena::{NodeArena, NodeId},
    config::LabParameters,
    encoder::SequenceTable,
    error::{LabError, LabResult},
    ligation,
    nucleotide::{BASE, parse_sequence, sequence_to_string},
    primer::{Orientation, Primer, PrimerMatch},
    strand::Strand,
};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

pub type OpId = String;
pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    Ligation,
    Pcr {
        primer1: String,
        primer2: String,
    },
    GelElectrophoresis {
        multiplier: usize,
    },
    MagneticSeparation {
        clauses: Vec<Vec<String>>,
    },
    SetParameter {
        name: String,
        value: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub run_id: RunId,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    pub strands_before: usize,
    pub strands_after: usize,
    pub created_strands: usize,
    pub removed_strands: usize,
    pub pool_before: usize,
    pub pool_after: usize,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub run_id: RunId,
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub deterministic_operation_log: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LigationStats {
    /// Anchor pairs that annealed.
    pub pairs: usize,
    /// Backbone gaps closed.
    pub joined: usize,
    /// Strands absorbed into the strand they were joined to.
    pub merged: usize,
}

pub trait LabEngine {
    fn apply(&mut self, op: Operation) -> LabResult<OpResult>;
    fn apply_workflow(&mut self, wf: Workflow) -> LabResult<Vec<OpResult>>;
}

/// The reaction vessel: every strand of one experiment, the nodes they are
/// made of, and the pool of free anchors still available for ligation.
///
/// Nodes of discarded strands stay in the arena until the tube is dropped.
#[derive(Debug, Clone)]
pub struct TestTube {
    arena: NodeArena,
    strands: Vec<Strand>,
    pool: Vec<NodeId>,
    parameters: LabParameters,
    rng: StdRng,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl Default for TestTube {
    fn default() -> Self {
        Self::new(LabParameters::default())
    }
}

impl TestTube {
    pub fn new(parameters: LabParameters) -> Self {
        let rng = match parameters.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(parameters, rng)
    }

    pub fn with_rng(parameters: LabParameters, rng: StdRng) -> Self {
        Self {
            arena: NodeArena::new(),
            strands: vec![],
            pool: vec![],
            parameters,
            rng,
            journal: vec![],
            op_counter: 0,
        }
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_operations: vec![
                "Ligation".to_string(),
                "Pcr".to_string(),
                "GelElectrophoresis".to_string(),
                "MagneticSeparation".to_string(),
                "SetParameter".to_string(),
            ],
            deterministic_operation_log: true,
        }
    }

    /// Adds one strand; its free anchors join the pairing pool.
    pub fn add_strand(&mut self, sequence: &str, starting: bool) -> LabResult<()> {
        let strand = Strand::from_sequence(&mut self.arena, sequence, starting)?;
        self.pool.extend_from_slice(strand.free_anchors());
        self.strands.push(strand);
        Ok(())
    }

    pub fn add_copies(&mut self, sequence: &str, starting: bool, copies: usize) -> LabResult<()> {
        for _ in 0..copies {
            self.add_strand(sequence, starting)?;
        }
        Ok(())
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn strands(&self) -> &[Strand] {
        &self.strands
    }

    pub fn pool(&self) -> &[NodeId] {
        &self.pool
    }

    pub fn parameters(&self) -> &LabParameters {
        &self.parameters
    }

    pub fn operation_log(&self) -> &[OperationRecord] {
        &self.journal
    }

    pub fn sequences(&self) -> Vec<String> {
        self.strands
            .par_iter()
            .map(|s| s.sequence(&self.arena))
            .collect()
    }

    /// Strand count per length, the bands a gel would show.
    pub fn length_histogram(&self) -> BTreeMap<usize, usize> {
        let mut ret = BTreeMap::new();
        for strand in &self.strands {
            *ret.entry(strand.len(&self.arena)).or_insert(0) += 1;
        }
        ret
    }

    pub fn check_invariants(&self) -> LabResult<()> {
        self.arena.check_invariants()?;
        let owned: HashSet<NodeId> = self
            .strands
            .iter()
            .flat_map(|s| s.free_anchors().iter().copied())
            .collect();
        if let Some(orphan) = self.pool.iter().find(|id| !owned.contains(id)) {
            return Err(LabError::structural(format!(
                "Pool anchor {} belongs to no strand in the tube",
                orphan.index()
            )));
        }
        Ok(())
    }

    pub fn denaturation(&mut self) {
        for strand in &self.strands {
            strand.denaturation(&mut self.arena);
        }
    }

    pub fn annealing(&self, primer1: &str, primer2: &str) -> LabResult<Vec<PrimerMatch>> {
        let primer1 = Primer::new(primer1)?;
        let primer2 = Primer::new(primer2)?;
        Ok(self.annealing_with(&primer1, &primer2))
    }

    fn annealing_with(&self, primer1: &Primer, primer2: &Primer) -> Vec<PrimerMatch> {
        self.strands
            .par_iter()
            .flat_map_iter(|s| s.annealing(&self.arena, primer1, primer2))
            .collect()
    }

    /// Extends every match with complementary nodes until the template is
    /// already paired or ends. Each synthesized chain becomes a new strand.
    pub fn polymerase(&mut self, matches: &[PrimerMatch]) -> usize {
        let mut created = 0;
        for m in matches {
            if let Some(strand) = self.extend(*m) {
                self.strands.push(strand);
                created += 1;
            }
        }
        created
    }

    fn extend(&mut self, m: PrimerMatch) -> Option<Strand> {
        let mut current = Some(m.anchor);
        let mut head: Option<NodeId> = None;
        let mut tail: Option<NodeId> = None;
        while let Some(template) = current {
            if self.arena.partner(template).is_some() {
                break;
            }
            let copy = self.arena.push(self.arena.base(template).complement());
            self.arena.pair(template, copy);
            match (m.orientation, tail) {
                (Orientation::Forward, Some(previous)) => self.arena.link(previous, copy),
                (Orientation::Backward, Some(previous)) => self.arena.link(copy, previous),
                (_, None) => head = Some(copy),
            }
            tail = Some(copy);
            current = match m.orientation {
                Orientation::Forward => self.arena.next(template),
                Orientation::Backward => self.arena.prev(template),
            };
        }
        let (head, tail) = (head?, tail?);
        Some(match m.orientation {
            Orientation::Forward => Strand::from_chain(head, tail),
            Orientation::Backward => Strand::from_chain(tail, head),
        })
    }

    /// Anneals free anchors pairwise, then closes backbone gaps so that
    /// fragments held together by a splint become one strand.
    pub fn ligation(&mut self) -> LigationStats {
        let pool = std::mem::take(&mut self.pool);
        let outcome = ligation::pair_anchors(&mut self.arena, pool, &mut self.rng);
        self.pool = outcome.remaining;

        let mut joined = 0;
        for strand in &self.strands {
            if ligation::repair_backbone(&mut self.arena, strand.last()).is_some() {
                joined += 1;
            }
        }
        let merged = self.merge_joined_strands();
        LigationStats {
            pairs: outcome.pairs.len(),
            joined,
            merged,
        }
    }

    /// Strands whose first node now has a predecessor are part of another
    /// strand's chain; their anchors move to the strand heading that chain,
    /// whose `last` moves to the new chain end.
    fn merge_joined_strands(&mut self) -> usize {
        let heads: HashMap<NodeId, usize> = self
            .strands
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.first(), idx))
            .collect();
        let mut absorbed = vec![false; self.strands.len()];
        let mut owners: HashSet<usize> = HashSet::new();
        for idx in 0..self.strands.len() {
            let first = self.strands[idx].first();
            if self.arena.prev(first).is_none() {
                continue;
            }
            let Some(head) = self.arena.walk_backward(first).last() else {
                continue;
            };
            let Some(&owner) = heads.get(&head) else {
                continue;
            };
            if owner == idx {
                continue;
            }
            let anchors = self.strands[idx].take_free_anchors();
            self.strands[owner].absorb(anchors);
            absorbed[idx] = true;
            owners.insert(owner);
        }
        for owner in owners {
            let first = self.strands[owner].first();
            if let Some(end) = self.arena.walk_forward(first).last() {
                self.strands[owner].set_last(end);
            }
        }
        let merged = absorbed.iter().filter(|a| **a).count();
        if merged > 0 {
            let keep = absorbed.iter().map(|a| !a).collect::<Vec<_>>();
            self.retain_strands(&keep);
        }
        merged
    }

    pub fn pcr(&mut self, primer1: &str, primer2: &str) -> LabResult<usize> {
        let primer1 = Primer::new(primer1)?;
        let primer2 = Primer::new(primer2)?;
        let mut created = 0;
        for cycle in 0..self.parameters.pcr_cycles {
            self.denaturation();
            let matches = self.annealing_with(&primer1, &primer2);
            let made = self.polymerase(&matches);
            log::debug!(
                "PCR cycle {}: {} primer matches, {made} new strands",
                cycle + 1,
                matches.len()
            );
            created += made;
        }
        Ok(created)
    }

    /// Keeps strands exactly `BASE * multiplier` long. Returns how many were removed.
    /// A length that overflows `usize` matches no strand.
    pub fn gel_electrophoresis(&mut self, multiplier: usize) -> usize {
        let target = BASE.checked_mul(multiplier);
        let keep = self
            .strands
            .par_iter()
            .map(|s| Some(s.len(&self.arena)) == target)
            .collect::<Vec<_>>();
        self.retain_strands(&keep)
    }

    /// Keeps strands that contain, for every clause, at least one of the
    /// clause's sequences. Returns how many were removed.
    pub fn magnetic_separation(&mut self, clauses: &[Vec<String>]) -> LabResult<usize> {
        let clauses = clauses
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|s| parse_sequence(s).map(|b| sequence_to_string(&b)))
                    .collect::<LabResult<Vec<_>>>()
            })
            .collect::<LabResult<Vec<_>>>()?;
        let keep = self
            .strands
            .par_iter()
            .map(|s| {
                let sequence = s.sequence(&self.arena);
                clauses
                    .iter()
                    .all(|clause| clause.iter().any(|probe| sequence.contains(probe.as_str())))
            })
            .collect::<Vec<_>>();
        Ok(self.retain_strands(&keep))
    }

    fn retain_strands(&mut self, keep: &[bool]) -> usize {
        let before = self.strands.len();
        let strands = std::mem::take(&mut self.strands);
        self.strands = strands
            .into_iter()
            .zip(keep)
            .filter_map(|(s, k)| k.then_some(s))
            .collect();
        let owned: HashSet<NodeId> = self
            .strands
            .iter()
            .flat_map(|s| s.free_anchors().iter().copied())
            .collect();
        self.pool.retain(|id| owned.contains(id));
        before - self.strands.len()
    }

    /// Names encoded by each distinct surviving strand. Strands that do not
    /// split entirely into known sequences are left out.
    pub fn translate(&self, table: &SequenceTable) -> Vec<Vec<String>> {
        let mut done: HashSet<String> = HashSet::new();
        let mut ret = vec![];
        for sequence in self.sequences() {
            if !done.insert(sequence.clone()) {
                continue;
            }
            if let Some(decoded) = table.decode(&sequence) {
                ret.push(decoded);
            }
        }
        ret
    }

    /// Ligation, PCR, size selection and clause filtering, in that order.
    pub fn solve(
        &mut self,
        primer1: &str,
        primer2: &str,
        clauses: &[Vec<String>],
        multiplier: usize,
    ) -> LabResult<Vec<OpResult>> {
        Primer::new(primer1)?;
        Primer::new(primer2)?;
        let wf = Workflow {
            run_id: "solve".to_string(),
            ops: vec![
                Operation::Ligation,
                Operation::Pcr {
                    primer1: primer1.to_string(),
                    primer2: primer2.to_string(),
                },
                Operation::GelElectrophoresis { multiplier },
                Operation::MagneticSeparation {
                    clauses: clauses.to_vec(),
                },
            ],
        };
        let results = self.apply_workflow(wf)?;
        log::info!(
            "Solve finished with {} strands of {multiplier} x {BASE} bases",
            self.strands.len()
        );
        Ok(results)
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    fn apply_internal(&mut self, op: &Operation) -> LabResult<OpResult> {
        let mut result = OpResult {
            op_id: self.next_op_id(),
            strands_before: self.strands.len(),
            pool_before: self.pool.len(),
            ..OpResult::default()
        };
        match op {
            Operation::Ligation => {
                let stats = self.ligation();
                result.removed_strands = stats.merged;
                result.messages.push(format!(
                    "Annealed {} anchor pairs, closed {} gaps, merged {} strands",
                    stats.pairs, stats.joined, stats.merged
                ));
            }
            Operation::Pcr { primer1, primer2 } => {
                result.created_strands = self.pcr(primer1, primer2)?;
                result.messages.push(format!(
                    "{} PCR cycle(s) synthesized {} strands",
                    self.parameters.pcr_cycles, result.created_strands
                ));
            }
            Operation::GelElectrophoresis { multiplier } => {
                if *multiplier == 0 {
                    return Err(LabError::invalid_input(
                        "Gel electrophoresis multiplier must be at least 1",
                    ));
                }
                result.removed_strands = self.gel_electrophoresis(*multiplier);
                result.messages.push(format!(
                    "Kept strands of {multiplier} x {BASE} bases, removed {}",
                    result.removed_strands
                ));
            }
            Operation::MagneticSeparation { clauses } => {
                result.removed_strands = self.magnetic_separation(clauses)?;
                result.messages.push(format!(
                    "Filtered by {} clauses, removed {}",
                    clauses.len(),
                    result.removed_strands
                ));
            }
            Operation::SetParameter { name, value } => {
                self.parameters.set(name, value)?;
                if name == "seed" {
                    if let Some(seed) = self.parameters.seed {
                        self.rng = StdRng::seed_from_u64(seed);
                    }
                }
                result.messages.push(format!("Set parameter '{name}' to {value}"));
            }
        }
        result.strands_after = self.strands.len();
        result.pool_after = self.pool.len();
        debug_assert!(
            self.check_invariants().is_ok(),
            "tube invariants broken after {op:?}"
        );
        log::debug!(
            "{} {:?}: strands {} -> {}, pool {} -> {}",
            result.op_id,
            op,
            result.strands_before,
            result.strands_after,
            result.pool_before,
            result.pool_after
        );
        Ok(result)
    }
}

impl LabEngine for TestTube {
    fn apply(&mut self, op: Operation) -> LabResult<OpResult> {
        let run_id = "interactive".to_string();
        let result = self.apply_internal(&op)?;
        self.journal.push(OperationRecord {
            run_id,
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    fn apply_workflow(&mut self, wf: Workflow) -> LabResult<Vec<OpResult>> {
        let mut results = Vec::new();
        for op in &wf.ops {
            let result = self.apply_internal(op)?;
            self.journal.push(OperationRecord {
                run_id: wf.run_id.clone(),
                op: op.clone(),
                result: result.clone(),
            });
            results.push(result);
        }
        Ok(results)
    }
}

impl fmt::Display for TestTube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for strand in &self.strands {
            writeln!(
                f,
                "{}\n\n",
                strand.render_duplex(&self.arena, self.parameters.print_width)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, nucleotide::complement_sequence};
    use serde_json::json;

    const P1: &str = "ACGTACGTACGTACGTACGT";
    const P2: &str = "GGGGCCCCAAAATTTTGGCC";

    fn tube() -> TestTube {
        TestTube::new(LabParameters {
            seed: Some(11),
            ..LabParameters::default()
        })
    }

    fn comp(s: &str) -> String {
        complement_sequence(s).unwrap()
    }

    #[test]
    fn test_polymerase_forward_from_start() {
        let mut tube = tube();
        tube.add_strand(P1, false).unwrap();
        let created = tube.pcr(P1, P2).unwrap();
        assert_eq!(created, 1);
        assert_eq!(tube.sequences(), vec![P1.to_string(), comp(P1)]);
        let template = &tube.strands()[0];
        assert!(
            template
                .nodes(tube.arena())
                .all(|id| tube.arena().partner(id).is_some())
        );
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_polymerase_forward_from_middle() {
        let mut tube = tube();
        let lead = "TTTTTTTTTTTTTTTTTTTT";
        tube.add_strand(&format!("{lead}{P1}"), false).unwrap();
        assert_eq!(tube.pcr(P1, P2).unwrap(), 1);
        assert_eq!(tube.sequences()[1], comp(P1));
    }

    #[test]
    fn test_polymerase_backward_walks_to_start() {
        let mut tube = tube();
        let lead = "TTTTTTTTTTTTTTTTTTTT";
        let template = format!("{lead}{P2}");
        tube.add_strand(&template, false).unwrap();
        let matches = tube.annealing(P1, P2).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].orientation, Orientation::Backward);
        assert_eq!(tube.polymerase(&matches), 1);
        assert_eq!(tube.sequences()[1], comp(&template));
        // a second extension from the same match finds everything paired
        assert_eq!(tube.polymerase(&matches), 0);
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_annealing_rejects_bad_primers() {
        let mut tube = tube();
        tube.add_strand(P1, false).unwrap();
        tube.denaturation();
        let err = tube.annealing("ACGT", P2).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(tube.annealing(P1, &format!("{P2}A")).is_err());
        assert!(tube.pcr(P1, "").is_err());
        assert_eq!(tube.annealing(P1, P2).unwrap().len(), 1);
    }

    #[test]
    fn test_gel_electrophoresis_selects_length() {
        let mut tube = tube();
        tube.add_strand(&"A".repeat(BASE), false).unwrap();
        tube.add_strand(&"C".repeat(2 * BASE), false).unwrap();
        tube.add_strand(&"G".repeat(2 * BASE), false).unwrap();
        tube.add_strand(&"T".repeat(3 * BASE), false).unwrap();
        assert_eq!(tube.length_histogram().get(&(2 * BASE)), Some(&2));
        let removed = tube.gel_electrophoresis(2);
        assert_eq!(removed, 2);
        assert!(tube.sequences().iter().all(|s| s.len() == 2 * BASE));
        assert_eq!(tube.pool().len(), 4);
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_magnetic_separation_all_clauses_any_literal() {
        let x = "AAAAACCCCC";
        let y = "GGGGGTTTTT";
        let z = "ACACACACAC";
        let mut tube = tube();
        tube.add_strand(&format!("{x}{z}"), false).unwrap();
        tube.add_strand(&format!("{y}{z}"), false).unwrap();
        tube.add_strand(&format!("{x}{y}"), false).unwrap();
        tube.add_strand(&format!("{z}{z}"), false).unwrap();
        let clauses = vec![
            vec![x.to_string(), y.to_string()],
            vec![z.to_string()],
        ];
        let removed = tube.magnetic_separation(&clauses).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            tube.sequences(),
            vec![format!("{x}{z}"), format!("{y}{z}")]
        );
        let bad = vec![vec!["ACGN".to_string()]];
        assert!(tube.magnetic_separation(&bad).is_err());
    }

    #[test]
    fn test_magnetic_separation_without_clauses_keeps_all() {
        let mut tube = tube();
        tube.add_strand(P1, false).unwrap();
        assert_eq!(tube.magnetic_separation(&[]).unwrap(), 0);
        assert_eq!(tube.strands().len(), 1);
    }

    #[test]
    fn test_translate_dedupes_and_skips_unknown() {
        let mut table = SequenceTable::new();
        table.insert("a", P1).unwrap();
        table.insert("b", P2).unwrap();
        let mut tube = tube();
        tube.add_strand(&format!("{P1}{P2}"), false).unwrap();
        tube.add_strand(&format!("{P1}{P2}"), false).unwrap();
        tube.add_strand(&format!("{P2}{}", "T".repeat(BASE)), false)
            .unwrap();
        tube.add_strand(&format!("{P2}AC"), false).unwrap();
        assert_eq!(
            tube.translate(&table),
            vec![vec!["a".to_string(), "b".to_string()]]
        );
    }

    #[test]
    fn test_ligation_joins_fragments() {
        let (x2, y1, y2, z1) = ("ACGTACGTAC", "GGATCCAAGT", "CTTGAACGTA", "TTGACCAGTC");
        let mut tube = tube();
        tube.add_strand(&format!("{x2}{y1}"), false).unwrap();
        tube.add_strand(&comp(&format!("{y1}{y2}")), false).unwrap();
        tube.add_strand(&format!("{y2}{z1}"), false).unwrap();
        assert_eq!(tube.pool().len(), 6);

        let stats = tube.ligation();
        assert_eq!(
            stats,
            LigationStats {
                pairs: 2,
                joined: 1,
                merged: 1
            }
        );
        assert_eq!(tube.strands().len(), 2);
        assert_eq!(tube.pool().len(), 2);
        assert_eq!(tube.sequences()[0], format!("{x2}{y1}{y2}{z1}"));
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_second_ligation_extends_merged_chain() {
        let (x2, y1, y2, z1) = ("ACGTACGTAC", "GGATCCAAGT", "CTTGAACGTA", "TTGACCAGTC");
        let (w1, v) = ("CAGTTGCAAC", "GAGAGAGAGA");
        let mut tube = tube();
        tube.add_strand(&format!("{x2}{y1}"), false).unwrap();
        tube.add_strand(&comp(&format!("{y1}{y2}")), false).unwrap();
        tube.add_strand(&format!("{y2}{z1}"), false).unwrap();
        tube.ligation();
        let head = &tube.strands()[0];
        assert_eq!(
            Some(head.last()),
            tube.arena().walk_forward(head.first()).last()
        );

        tube.add_strand(&comp(&format!("{z1}{w1}")), false).unwrap();
        tube.add_strand(&format!("{w1}{v}"), false).unwrap();
        let stats = tube.ligation();
        assert_eq!(
            stats,
            LigationStats {
                pairs: 2,
                joined: 2,
                merged: 2
            }
        );
        assert_eq!(tube.strands().len(), 2);
        assert_eq!(tube.sequences()[0], format!("{x2}{y1}{y2}{z1}{w1}{v}"));
        assert_eq!(tube.sequences()[1], comp(&format!("{y1}{y2}{z1}{w1}")));
        for strand in tube.strands() {
            assert_eq!(
                Some(strand.last()),
                tube.arena().walk_forward(strand.first()).last()
            );
        }
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_ligation_does_not_close_rings() {
        // the splint would join the strand's end back onto its own start
        let (u1, u2) = ("ACGTACGTAC", "GGATCCAAGT");
        let mut tube = tube();
        tube.add_strand(&format!("{u1}{u2}"), false).unwrap();
        tube.add_strand(&comp(&format!("{u2}{u1}")), false).unwrap();
        let stats = tube.ligation();
        assert_eq!(
            stats,
            LigationStats {
                pairs: 2,
                joined: 0,
                merged: 0
            }
        );
        assert_eq!(tube.strands().len(), 2);
        assert!(tube.sequences().iter().all(|s| s.len() == BASE));
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_gel_electrophoresis_huge_multiplier_keeps_nothing() {
        let mut tube = tube();
        tube.add_strand(&"A".repeat(BASE), false).unwrap();
        assert_eq!(tube.gel_electrophoresis(usize::MAX), 1);
        assert!(tube.strands().is_empty());
        assert!(tube.pool().is_empty());
        let res = tube
            .apply(Operation::GelElectrophoresis {
                multiplier: usize::MAX,
            })
            .unwrap();
        assert_eq!(res.removed_strands, 0);
    }

    #[test]
    fn test_apply_journals_operations() {
        let mut tube = tube();
        tube.add_strand(P1, false).unwrap();
        tube.add_strand(&"A".repeat(3 * BASE), false).unwrap();
        let res = tube
            .apply(Operation::SetParameter {
                name: "pcr_cycles".to_string(),
                value: json!(2),
            })
            .unwrap();
        assert!(res.messages.iter().any(|m| m.contains("pcr_cycles")));
        assert_eq!(tube.parameters().pcr_cycles, 2);

        let res = tube
            .apply(Operation::GelElectrophoresis { multiplier: 1 })
            .unwrap();
        assert_eq!(res.op_id, "op-2");
        assert_eq!(res.strands_before, 2);
        assert_eq!(res.strands_after, 1);
        assert_eq!(tube.operation_log().len(), 2);

        let err = tube
            .apply(Operation::GelElectrophoresis { multiplier: 0 })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(tube.operation_log().len(), 2);
    }

    #[test]
    fn test_solve_with_no_survivors_is_not_an_error() {
        let mut tube = tube();
        tube.add_strand(&"A".repeat(BASE), false).unwrap();
        let results = tube
            .solve(P1, P2, &[vec![P2.to_string()]], 5)
            .unwrap();
        assert_eq!(results.len(), 4);
        assert!(tube.strands().is_empty());
        assert!(tube.to_string().is_empty());
        assert!(tube.solve("ACGT", P2, &[], 1).is_err());
    }

    #[test]
    fn test_capabilities() {
        let caps = TestTube::capabilities();
        assert!(caps.supported_operations.contains(&"Pcr".to_string()));
    }
}
