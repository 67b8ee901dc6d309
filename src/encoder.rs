//! Maps graph vertices and edges onto DNA sequences.
//!
//! Every vertex gets a random `BASE`-long sequence. An edge `v1 -> v2` is the
//! second half of `v1` followed by the first half of `v2`, except that the
//! start and end vertices contribute their whole sequence. Complement strands
//! of the vertices then act as splints joining consecutive edges.

use crate::{
    error::{LabError, LabResult},
    nucleotide::{BASE, HALF_BASE, Nucleotide, parse_sequence},
};
use dnalab_protocol::{EdgeSequence, NamedSequence};
use rand::Rng;
use std::collections::HashMap;

/// Named sequences in insertion order, searchable by name and by sequence.
#[derive(Debug, Clone, Default)]
pub struct SequenceTable {
    entries: Vec<NamedSequence>,
    by_name: HashMap<String, usize>,
    by_sequence: HashMap<String, usize>,
}

impl SequenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, sequence: &str) -> LabResult<()> {
        let sequence = parse_sequence(sequence)
            .map_err(|e| LabError::invalid_input(format!("Sequence for '{name}': {}", e.message)))?
            .iter()
            .map(|n| n.letter() as char)
            .collect::<String>();
        if self.by_name.contains_key(name) {
            return Err(LabError::invalid_input(format!(
                "Sequence name '{name}' is already taken"
            )));
        }
        let idx = self.entries.len();
        self.by_name.insert(name.to_string(), idx);
        self.by_sequence.entry(sequence.clone()).or_insert(idx);
        self.entries.push(NamedSequence {
            name: name.to_string(),
            sequence,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|idx| self.entries[*idx].sequence.as_str())
    }

    /// Name of the first entry holding exactly `sequence`.
    pub fn name_of(&self, sequence: &str) -> Option<&str> {
        self.by_sequence
            .get(sequence)
            .map(|idx| self.entries[*idx].name.as_str())
    }

    /// Splits `sequence` into `BASE`-long chunks and names each one. Any
    /// unknown or incomplete chunk makes the whole sequence undecodable.
    pub fn decode(&self, sequence: &str) -> Option<Vec<String>> {
        if sequence.is_empty() || sequence.len() % BASE != 0 {
            return None;
        }
        sequence
            .as_bytes()
            .chunks(BASE)
            .map(|chunk| {
                std::str::from_utf8(chunk)
                    .ok()
                    .and_then(|c| self.name_of(c))
                    .map(str::to_string)
            })
            .collect()
    }

    pub fn entries(&self) -> &[NamedSequence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn random_sequence<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| Nucleotide::ALL[rng.random_range(0..Nucleotide::ALL.len())].letter() as char)
        .collect()
}

pub fn create_random_sequences<R: Rng + ?Sized, S: AsRef<str>>(
    vertices: &[S],
    rng: &mut R,
) -> LabResult<SequenceTable> {
    let mut table = SequenceTable::new();
    for vertex in vertices {
        table.insert(vertex.as_ref(), &random_sequence(rng, BASE))?;
    }
    Ok(table)
}

pub fn create_edges(
    start_vertex: &str,
    end_vertex: &str,
    edges: &[(String, String)],
    vertices: &SequenceTable,
) -> LabResult<Vec<EdgeSequence>> {
    edges
        .iter()
        .map(|(v1, v2)| {
            let (Some(s1), Some(s2)) = (vertices.get(v1), vertices.get(v2)) else {
                return Err(LabError::invalid_input(format!(
                    "Illegal vertex in edge ({v1}, {v2})"
                )));
            };
            if s1.len() != BASE || s2.len() != BASE {
                return Err(LabError::invalid_input(format!(
                    "Vertices of edge ({v1}, {v2}) must be {BASE} bases long"
                )));
            }
            let mut sequence = String::with_capacity(2 * BASE);
            if v1 == start_vertex {
                sequence.push_str(s1);
            } else {
                sequence.push_str(&s1[HALF_BASE..]);
            }
            if v2 == end_vertex {
                sequence.push_str(s2);
            } else {
                sequence.push_str(&s2[..HALF_BASE]);
            }
            Ok(EdgeSequence {
                from: v1.clone(),
                to: v2.clone(),
                sequence,
            })
        })
        .collect()
}
