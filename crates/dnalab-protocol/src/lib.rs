//! Machine-readable contracts shared between the dnalab library and its
//! front ends: formulas, literals and the report of a solve run.

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};

/// Suffix marking a negated literal, e.g. `x'`.
pub const NEGATION_MARK: char = '\'';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub variable: String,
    pub negated: bool,
}

impl Literal {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (variable, negated) = match text.strip_suffix(NEGATION_MARK) {
            Some(stripped) => (stripped.trim(), true),
            None => (text, false),
        };
        if variable.is_empty() || variable.contains(NEGATION_MARK) {
            return None;
        }
        Some(Self {
            variable: variable.to_string(),
            negated,
        })
    }

    /// The vertex name used for this literal in the encoded graph.
    pub fn name(&self) -> String {
        if self.negated {
            format!("{}{NEGATION_MARK}", self.variable)
        } else {
            self.variable.clone()
        }
    }

    pub fn is_satisfied_by(&self, value: bool) -> bool {
        value != self.negated
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A CNF formula. `variables` fixes the variable order of the encoded graph;
/// when empty, variables are taken in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formula {
    pub variables: Vec<String>,
    pub clauses: Vec<Vec<String>>,
}

impl Formula {
    pub fn new(clauses: Vec<Vec<String>>) -> Self {
        Self {
            variables: vec![],
            clauses,
        }
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    /// Parses `x,y,z; x',y` into clauses. Clauses are separated by `;`,
    /// literals by `,` or whitespace.
    pub fn parse_clauses(text: &str) -> Result<Self, String> {
        let mut clauses = vec![];
        for (idx, raw) in text.split(';').enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let clause = raw
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    Literal::parse(s)
                        .map(|l| l.name())
                        .ok_or_else(|| format!("Invalid literal '{s}' in clause {}", idx + 1))
                })
                .collect::<Result<Vec<_>, _>>()?;
            clauses.push(clause);
        }
        if clauses.is_empty() {
            return Err("Formula has no clauses".to_string());
        }
        Ok(Self::new(clauses))
    }

    pub fn from_json_str(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Could not parse formula JSON: {e}"))
    }

    pub fn literals(&self) -> Result<Vec<Vec<Literal>>, String> {
        self.clauses
            .iter()
            .enumerate()
            .map(|(idx, clause)| {
                if clause.is_empty() {
                    return Err(format!("Clause {} is empty", idx + 1));
                }
                clause
                    .iter()
                    .map(|s| {
                        Literal::parse(s)
                            .ok_or_else(|| format!("Invalid literal '{s}' in clause {}", idx + 1))
                    })
                    .collect()
            })
            .collect()
    }

    pub fn variable_names(&self) -> Result<Vec<String>, String> {
        let literals = self.literals()?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut ret: Vec<String> = vec![];
        for name in &self.variables {
            let lit = Literal::parse(name)
                .filter(|l| !l.negated)
                .ok_or_else(|| format!("Invalid variable name '{name}'"))?;
            if !seen.insert(lit.variable.clone()) {
                return Err(format!("Variable '{name}' is listed twice"));
            }
            ret.push(lit.variable);
        }
        let explicit = !ret.is_empty();
        for lit in literals.iter().flatten() {
            if seen.contains(&lit.variable) {
                continue;
            }
            if explicit {
                return Err(format!(
                    "Literal '{lit}' uses a variable missing from the variable list"
                ));
            }
            seen.insert(lit.variable.clone());
            ret.push(lit.variable.clone());
        }
        Ok(ret)
    }

    /// Truth-table evaluation. Variables missing from the assignment make
    /// their literals unsatisfied.
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        let Ok(literals) = self.literals() else {
            return false;
        };
        literals.iter().all(|clause| {
            clause.iter().any(|lit| {
                assignment
                    .get(&lit.variable)
                    .map(|v| lit.is_satisfied_by(v))
                    .unwrap_or(false)
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    pub variable: String,
    pub value: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub values: Vec<VariableValue>,
}

impl Assignment {
    /// Reads literal vertex names (`x` = true, `x'` = false) in order.
    pub fn from_literal_names<S: AsRef<str>>(names: &[S]) -> Self {
        let values = names
            .iter()
            .filter_map(|n| Literal::parse(n.as_ref()))
            .map(|lit| VariableValue {
                variable: lit.variable,
                value: !lit.negated,
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, variable: &str) -> Option<bool> {
        self.values
            .iter()
            .find(|v| v.variable == variable)
            .map(|v| v.value)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .values
            .iter()
            .map(|v| format!("{} {}", v.variable, v.value))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSequence {
    pub name: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSequence {
    pub from: String,
    pub to: String,
    pub sequence: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveReport {
    pub formula: Formula,
    pub seed: Option<u64>,
    pub vertex_sequences: Vec<NamedSequence>,
    pub edge_sequences: Vec<EdgeSequence>,
    pub seed_strand_count: usize,
    pub surviving_strand_count: usize,
    pub decoded: Vec<Vec<String>>,
    pub assignments: Vec<Assignment>,
}

impl SolveReport {
    pub fn is_satisfiable(&self) -> bool {
        !self.assignments.is_empty()
    }
}
