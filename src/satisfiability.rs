//! 3-SAT through path search in the Lipton graph.
//!
//! For variables `x1 .. xn` the graph has connector vertices `a1 .. a(n+1)`
//! and two parallel edges through every variable: `a(k) -> x(k) -> a(k+1)`
//! and `a(k) -> x(k)' -> a(k+1)`. Each path from `a1` to `a(n+1)` picks one
//! literal per variable, i.e. one assignment.

use crate::{
    config::LabParameters,
    encoder::{SequenceTable, create_edges, create_random_sequences},
    error::{LabError, LabResult},
    nucleotide::complement_sequence,
    test_tube::{OpResult, TestTube},
};
use dnalab_protocol::{Assignment, EdgeSequence, Formula, Literal, SolveReport};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashSet;

pub const CONNECTOR_PREFIX: &str = "a";

#[derive(Debug, Clone)]
pub struct SatInstance {
    formula: Formula,
    variables: Vec<String>,
    connectors: Vec<String>,
    edges: Vec<(String, String)>,
}

/// Vertex and edge sequences of one instance.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub vertices: SequenceTable,
    pub edges: Vec<EdgeSequence>,
}

impl SatInstance {
    pub fn new(formula: Formula) -> LabResult<Self> {
        let variables = formula.variable_names().map_err(LabError::invalid_input)?;
        if variables.is_empty() {
            return Err(LabError::invalid_input("Formula has no variables"));
        }
        let connectors = (1..=variables.len() + 1)
            .map(|i| format!("{CONNECTOR_PREFIX}{i}"))
            .collect::<Vec<_>>();
        if let Some(clash) = variables.iter().find(|v| connectors.contains(v)) {
            return Err(LabError::invalid_input(format!(
                "Variable '{clash}' collides with a connector vertex name"
            )));
        }
        let negated = variables
            .iter()
            .map(|v| Literal {
                variable: v.clone(),
                negated: true,
            })
            .map(|l| l.name())
            .collect::<Vec<_>>();

        // The two edges leaving a1 come first; they are the starting strands.
        let mut edges = vec![
            (connectors[0].clone(), variables[0].clone()),
            (connectors[0].clone(), negated[0].clone()),
        ];
        for k in 1..variables.len() {
            edges.push((connectors[k].clone(), variables[k].clone()));
        }
        for k in 1..variables.len() {
            edges.push((connectors[k].clone(), negated[k].clone()));
        }
        for (k, v) in variables.iter().enumerate() {
            edges.push((v.clone(), connectors[k + 1].clone()));
        }
        for (k, v) in negated.iter().enumerate() {
            edges.push((v.clone(), connectors[k + 1].clone()));
        }

        Ok(Self {
            formula,
            variables,
            connectors,
            edges,
        })
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn connectors(&self) -> &[String] {
        &self.connectors
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn start_vertex(&self) -> &str {
        &self.connectors[0]
    }

    pub fn end_vertex(&self) -> &str {
        &self.connectors[self.connectors.len() - 1]
    }

    /// Variables, then their negations, then the connectors.
    pub fn vertices(&self) -> Vec<String> {
        let mut ret = self.variables.clone();
        ret.extend(self.variables.iter().map(|v| {
            Literal {
                variable: v.clone(),
                negated: true,
            }
            .name()
        }));
        ret.extend(self.connectors.iter().cloned());
        ret
    }

    /// Length of a full path in `BASE` units.
    pub fn multiplier(&self) -> usize {
        2 * self.variables.len() + 1
    }

    pub fn encode<R: Rng + ?Sized>(&self, rng: &mut R) -> LabResult<Encoding> {
        let vertices = create_random_sequences(&self.vertices(), rng)?;
        let edges = create_edges(self.start_vertex(), self.end_vertex(), &self.edges, &vertices)?;
        Ok(Encoding { vertices, edges })
    }

    /// Forward primer is the start vertex, backward primer the complement
    /// of the end vertex.
    pub fn primers(&self, encoding: &Encoding) -> LabResult<(String, String)> {
        let start = self.sequence_of(encoding, self.start_vertex())?;
        let end = self.sequence_of(encoding, self.end_vertex())?;
        Ok((start.to_string(), complement_sequence(end)?))
    }

    pub fn clauses_in_dna(&self, encoding: &Encoding) -> LabResult<Vec<Vec<String>>> {
        self.formula
            .literals()
            .map_err(LabError::invalid_input)?
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|lit| self.sequence_of(encoding, &lit.name()).map(str::to_string))
                    .collect()
            })
            .collect()
    }

    /// Puts the seed population into the tube: `copies` vertex splints,
    /// another `copies` of every connector splint, and `copies` of every
    /// edge. Returns the number of strands added.
    pub fn seed(&self, tube: &mut TestTube, encoding: &Encoding, copies: usize) -> LabResult<usize> {
        let connectors: HashSet<&str> = self.connectors.iter().map(String::as_str).collect();
        let before = tube.strands().len();
        for entry in encoding.vertices.entries() {
            let splint = complement_sequence(&entry.sequence)?;
            tube.add_copies(&splint, false, copies)?;
            if connectors.contains(entry.name.as_str()) {
                tube.add_copies(&splint, false, copies)?;
            }
        }
        for edge in encoding.edges.iter().skip(2) {
            tube.add_copies(&edge.sequence, false, copies)?;
        }
        for edge in encoding.edges.iter().take(2) {
            tube.add_copies(&edge.sequence, true, copies)?;
        }
        Ok(tube.strands().len() - before)
    }

    fn sequence_of<'a>(&self, encoding: &'a Encoding, name: &str) -> LabResult<&'a str> {
        encoding
            .vertices
            .get(name)
            .ok_or_else(|| LabError::invalid_input(format!("Unknown vertex '{name}'")))
    }
}

/// Reads the variable vertices of a decoded path, which sit between the
/// connectors at odd positions.
pub fn interpret<S: AsRef<str>>(decoded: &[S]) -> Assignment {
    let literals = decoded.iter().skip(1).step_by(2).collect::<Vec<_>>();
    Assignment::from_literal_names(&literals)
}

/// A finished solve: the report plus the tube it ran in.
#[derive(Debug)]
pub struct SatRun {
    pub report: SolveReport,
    pub tube: TestTube,
    pub results: Vec<OpResult>,
}

pub fn solve_formula(formula: &Formula, parameters: &LabParameters) -> LabResult<SatRun> {
    let instance = SatInstance::new(formula.clone())?;
    let mut rng = match parameters.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let encoding = instance.encode(&mut rng)?;
    let (primer1, primer2) = instance.primers(&encoding)?;
    let clauses = instance.clauses_in_dna(&encoding)?;

    let mut tube = TestTube::with_rng(parameters.clone(), rng);
    let seed_strand_count = instance.seed(&mut tube, &encoding, parameters.copies)?;
    log::info!(
        "Seeded {seed_strand_count} strands for {} variables and {} clauses",
        instance.variables().len(),
        formula.clauses.len()
    );

    let results = tube.solve(&primer1, &primer2, &clauses, instance.multiplier())?;
    let decoded = tube.translate(&encoding.vertices);
    let mut assignments: Vec<Assignment> = vec![];
    for path in &decoded {
        let assignment = interpret(path);
        if !assignments.contains(&assignment) {
            assignments.push(assignment);
        }
    }
    if assignments.is_empty() {
        log::warn!("No strand survived decoding; the formula looks unsatisfiable");
    }

    let report = SolveReport {
        formula: formula.clone(),
        seed: parameters.seed,
        vertex_sequences: encoding.vertices.entries().to_vec(),
        edge_sequences: encoding.edges,
        seed_strand_count,
        surviving_strand_count: tube.strands().len(),
        decoded,
        assignments,
    };
    Ok(SatRun {
        report,
        tube,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, nucleotide::BASE};

    fn formula(text: &str) -> Formula {
        Formula::parse_clauses(text).unwrap()
    }

    fn params(seed: u64, copies: usize) -> LabParameters {
        LabParameters {
            copies,
            seed: Some(seed),
            ..LabParameters::default()
        }
    }

    #[test]
    fn test_graph_shape() {
        let inst = SatInstance::new(formula("x,y; x',z")).unwrap();
        assert_eq!(inst.variables(), &["x", "y", "z"]);
        assert_eq!(inst.connectors(), &["a1", "a2", "a3", "a4"]);
        assert_eq!(inst.multiplier(), 7);
        assert_eq!(inst.edges().len(), 4 * 3);
        assert_eq!(inst.edges()[0], ("a1".to_string(), "x".to_string()));
        assert_eq!(inst.edges()[1], ("a1".to_string(), "x'".to_string()));
        assert!(inst.edges().contains(&("a3".to_string(), "z'".to_string())));
        assert!(inst.edges().contains(&("z'".to_string(), "a4".to_string())));
        assert_eq!(inst.vertices().len(), 3 + 3 + 4);
        assert_eq!(inst.end_vertex(), "a4");
    }

    #[test]
    fn test_rejects_bad_formulas() {
        let err = SatInstance::new(Formula::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(SatInstance::new(formula("a2, y")).is_err());
        let missing = formula("x, y").with_variables(vec!["x".to_string()]);
        assert!(SatInstance::new(missing).is_err());
    }

    #[test]
    fn test_encoding_primers_and_clauses() {
        let inst = SatInstance::new(formula("x,y; y'")).unwrap();
        let enc = inst.encode(&mut StdRng::seed_from_u64(5)).unwrap();
        let (p1, p2) = inst.primers(&enc).unwrap();
        assert_eq!(p1, enc.vertices.get("a1").unwrap());
        assert_eq!(complement_sequence(&p2).unwrap(), enc.vertices.get("a3").unwrap());
        let clauses = inst.clauses_in_dna(&enc).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1], vec![enc.vertices.get("y'").unwrap().to_string()]);
        // start edges carry the whole start vertex
        assert_eq!(enc.edges[0].sequence.len(), BASE + BASE / 2);
        assert!(enc.edges[0].sequence.starts_with(&p1));
    }

    #[test]
    fn test_seed_population() {
        let inst = SatInstance::new(formula("x,y")).unwrap();
        let enc = inst.encode(&mut StdRng::seed_from_u64(5)).unwrap();
        let mut tube = TestTube::new(params(1, 2));
        let added = inst.seed(&mut tube, &enc, 2).unwrap();
        // 7 vertices + 3 extra connectors + 8 edges, twice each
        assert_eq!(added, 2 * (7 + 3 + 8));
        assert_eq!(tube.pool().len(), 2 * added);
        assert!(tube.check_invariants().is_ok());
    }

    #[test]
    fn test_interpret() {
        let path = ["a1", "x", "a2", "y'", "a3"];
        let assignment = interpret(&path);
        assert_eq!(assignment.get("x"), Some(true));
        assert_eq!(assignment.get("y"), Some(false));
        assert_eq!(assignment.to_string(), "x true y false");
    }

    #[test]
    fn test_solve_finds_satisfying_assignments() {
        let f = formula("x,y; x,y'");
        let run = solve_formula(&f, &params(42, 4)).unwrap();
        let report = &run.report;
        assert!(report.is_satisfiable());
        assert!(report.assignments.iter().all(|a| f.evaluate(a)));
        assert!(report.assignments.iter().all(|a| a.get("x") == Some(true)));
        assert!(
            report
                .decoded
                .iter()
                .all(|path| path.len() == 5 && path[0] == "a1" && path[4] == "a3")
        );
        assert_eq!(run.results.len(), 4);
        assert!(run.tube.check_invariants().is_ok());
        assert!(run.tube.sequences().iter().all(|s| s.len() == 5 * BASE));
    }

    #[test]
    fn test_seeded_solve_is_reproducible() {
        let f = formula("x,y; x',y");
        let a = solve_formula(&f, &params(7, 3)).unwrap().report;
        let b = solve_formula(&f, &params(7, 3)).unwrap().report;
        assert_eq!(a.vertex_sequences, b.vertex_sequences);
        assert_eq!(a.decoded, b.decoded);
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.surviving_strand_count, b.surviving_strand_count);
    }
}
