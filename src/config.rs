use crate::{
    error::{ErrorCode, LabError, LabResult},
    strand::PRINT_LEN,
};
use serde::{Deserialize, Serialize};

pub const NUM_OF_REPS: usize = 1;
pub const AMOUNT: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabParameters {
    /// Copies of every seed strand put into the tube.
    pub copies: usize,
    /// Denature/anneal/extend rounds of one PCR.
    pub pcr_cycles: usize,
    /// Seed of the tube's random generator; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Wrap width of duplex renderings.
    pub print_width: usize,
}

impl Default for LabParameters {
    fn default() -> Self {
        Self {
            copies: AMOUNT,
            pcr_cycles: NUM_OF_REPS,
            seed: None,
            print_width: PRINT_LEN,
        }
    }
}

impl LabParameters {
    pub fn load_from_path(path: &str) -> LabResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LabError::new(
                ErrorCode::Io,
                format!("Could not read parameter file '{path}': {e}"),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            LabError::invalid_input(format!("Could not parse parameter JSON '{path}': {e}"))
        })
    }

    pub fn save_to_path(&self, path: &str) -> LabResult<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| {
            LabError::new(
                ErrorCode::Internal,
                format!("Could not serialize parameters: {e}"),
            )
        })?;
        std::fs::write(path, text).map_err(|e| {
            LabError::new(
                ErrorCode::Io,
                format!("Could not write parameter file '{path}': {e}"),
            )
        })
    }

    /// Sets one parameter by name from a JSON value.
    pub fn set(&mut self, name: &str, value: &serde_json::Value) -> LabResult<()> {
        let as_count = |value: &serde_json::Value| {
            value
                .as_u64()
                .map(|v| v as usize)
                .ok_or_else(|| LabError::invalid_input(format!("{name} requires a non-negative integer")))
        };
        match name {
            "copies" => self.copies = as_count(value)?,
            "pcr_cycles" => self.pcr_cycles = as_count(value)?,
            "print_width" => {
                let width = as_count(value)?;
                if width == 0 {
                    return Err(LabError::invalid_input("print_width must be at least 1"));
                }
                self.print_width = width;
            }
            "seed" => {
                self.seed = if value.is_null() {
                    None
                } else {
                    Some(value.as_u64().ok_or_else(|| {
                        LabError::invalid_input("seed requires a non-negative integer or null")
                    })?)
                }
            }
            _ => {
                return Err(LabError::invalid_input(format!(
                    "Unknown parameter '{name}'"
                )));
            }
        }
        Ok(())
    }
}
