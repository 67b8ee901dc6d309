use crate::{
    arena::NodeId,
    error::{LabError, LabResult},
    nucleotide::{BASE, Nucleotide, parse_sequence, sequence_to_string},
};
use std::fmt;

/// Direction in which polymerase extends from a matched primer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Extends along `next` links.
    Forward,
    /// Extends along `prev` links.
    Backward,
}

/// A primer bound to a strand: where extension starts and which way it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimerMatch {
    pub anchor: NodeId,
    pub orientation: Orientation,
}

impl PrimerMatch {
    pub fn forward(anchor: NodeId) -> Self {
        Self {
            anchor,
            orientation: Orientation::Forward,
        }
    }

    pub fn backward(anchor: NodeId) -> Self {
        Self {
            anchor,
            orientation: Orientation::Backward,
        }
    }
}

/// A validated primer sequence of exactly `BASE` bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Primer {
    bases: Vec<Nucleotide>,
}

impl Primer {
    pub fn new(sequence: &str) -> LabResult<Self> {
        let bases = parse_sequence(sequence)
            .map_err(|e| LabError::invalid_input(format!("Invalid primer: {}", e.message)))?;
        if bases.len() != BASE {
            return Err(LabError::invalid_input(format!(
                "Primers should be of len {BASE}, got {}",
                bases.len()
            )));
        }
        Ok(Self { bases })
    }

    #[inline(always)]
    pub fn bases(&self) -> &[Nucleotide] {
        &self.bases
    }
}

impl fmt::Display for Primer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", sequence_to_string(&self.bases))
    }
}
