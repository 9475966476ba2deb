// src/config.rs - solver run settings

//! Run settings for the solver: worker count, trim rounds, and the solution
//! buffer capacity. Graph geometry lives in [`crate::solver::Params`]; the
//! knobs here only decide how hard and how wide one solve runs.

use serde::{Deserialize, Serialize};

/// Settings for one solver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Worker threads; 0 means one per logical CPU.
    pub threads: u32,
    /// Trim rounds; 0 derives the count from the partitioning factor.
    pub trims: u32,
    /// Solution buffer capacity.
    pub max_sols: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threads: 1,
            trims: 0,
            max_sols: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.threads, 1);
        assert_eq!(s.trims, 0);
        assert_eq!(s.max_sols, 8);
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Settings {
            threads: 4,
            trims: 11,
            max_sols: 2,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(s, serde_json::from_str(&json).unwrap());
    }
}
