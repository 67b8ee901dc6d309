use crate::error::{LabError, LabResult};
use bio::alphabets::dna;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit length of every encoded vertex, in bases.
pub const BASE: usize = 20;
pub const HALF_BASE: usize = BASE / 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nucleotide {
    A,
    T,
    G,
    C,
}

impl Nucleotide {
    pub const ALL: [Nucleotide; 4] = [Self::A, Self::T, Self::G, Self::C];

    #[inline(always)]
    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            b'A' => Some(Self::A),
            b'T' => Some(Self::T),
            b'G' => Some(Self::G),
            b'C' => Some(Self::C),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn letter(self) -> u8 {
        match self {
            Self::A => b'A',
            Self::T => b'T',
            Self::G => b'G',
            Self::C => b'C',
        }
    }

    #[inline(always)]
    pub fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::G => Self::C,
            Self::C => Self::G,
        }
    }

    #[inline(always)]
    pub fn pairs_with(self, other: Self) -> bool {
        self.complement() == other
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter() as char)
    }
}

/// Trims, uppercases and validates a sequence against the `ATGC` alphabet.
pub fn parse_sequence(sequence: &str) -> LabResult<Vec<Nucleotide>> {
    let upper = sequence.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(LabError::invalid_input("DNA sequence should not be empty"));
    }
    if !dna::alphabet().is_word(upper.as_bytes()) {
        let bad = upper
            .chars()
            .find(|c| !c.is_ascii() || Nucleotide::from_letter(*c as u8).is_none())
            .unwrap_or('?');
        return Err(LabError::invalid_input(format!(
            "DNA sequence should contain only A, T, G, C (found '{bad}')"
        )));
    }
    Ok(upper
        .bytes()
        .filter_map(Nucleotide::from_letter)
        .collect())
}

pub fn complement_sequence(sequence: &str) -> LabResult<String> {
    Ok(parse_sequence(sequence)?
        .into_iter()
        .map(|n| n.complement().letter() as char)
        .collect())
}

pub fn sequence_to_string(bases: &[Nucleotide]) -> String {
    bases.iter().map(|n| n.letter() as char).collect()
}
