// src/lib.rs - crate root for the ruckoo solver

//! Ruckoo - lean-memory Cuckoo Cycle solver
//!
//! A CPU solver for Cuckoo Cycle, the memory-hard graph-theoretic
//! proof-of-work. Given a 32-byte header the solver derives a bipartite graph
//! of pseudorandom edges, repeatedly trims edges that cannot lie on a cycle,
//! and searches the survivors for simple cycles of a fixed target length.
//! Each solution is a set of edge indices, the proof.
//!
//! # Version History
//! - 0.1.0: Initial single-threaded port of the two-phase solver
//! - 0.2.0: Parallel trimming and cycle finding, runtime graph geometry
//! - 0.2.1: Overload and path-overflow conditions surfaced as errors

#![warn(missing_docs)]
// Note: the only unsafe in the crate is the advisory prefetch in the degree counter
#![allow(unsafe_code)]

pub mod config;
pub mod solver;

// Re-export main types for convenience
pub use config::Settings;
pub use solver::{digest_header, Params, Proof, Solver, SolverError};

use thiserror::Error;

/// Main error type for Ruckoo
#[derive(Error, Debug)]
pub enum RuckooError {
    /// Solver-core errors
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// IO operation errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hex decoding errors
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Ruckoo operations
pub type Result<T> = std::result::Result<T, RuckooError>;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize tracing for the binaries.
///
/// Libraries embedding the solver install their own subscriber instead; the
/// core only ever emits through the `tracing` macros.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("{} v{} - {}", NAME, VERSION, DESCRIPTION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: RuckooError = SolverError::MaxPathExceeded.into();
        assert!(matches!(err, RuckooError::Solver(_)));

        let err: RuckooError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, RuckooError::Hex(_)));
    }

    #[test]
    fn test_crate_metadata() {
        assert_eq!(NAME, "ruckoo");
        assert!(!VERSION.is_empty());
    }
}
