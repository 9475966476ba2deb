// src/solver/mod.rs - two-phase Cuckoo Cycle solver core

//! Two-phase solver core.
//!
//! A solve runs in two phases over the same shrinking set of alive edges.
//! Phase one trims: repeated parallel leaf elimination shrinks the edge set
//! until a compact table can hold the survivors. Phase two walks the
//! survivors through the cuckoo table and reports every cycle it closes,
//! recovering proofs for cycles of the target length.
//!
//! Peak memory is the alive bitset plus the larger of the degree counter and
//! the cuckoo table. The two are sized to match and never coexist: the
//! counter is dropped before the table is allocated.

pub mod alive;
pub mod cuckoo;
mod cycle;
pub mod siphash;
mod trim;
pub mod twice;

use std::sync::{Barrier, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;
use alive::ShrinkingSet;
use cuckoo::CuckooHash;
use siphash::SipHasher;
use twice::TwiceSet;

pub use siphash::digest_header;

/// Alive load threshold, in percent of cuckoo-table capacity, above which a
/// solve gives up after trimming.
const OVERLOAD_PCT: u64 = 90;

/// Graph geometry, fixed for the lifetime of a solver.
///
/// Everything here derives from three inputs: the size exponent, the target
/// cycle length, and the degree-counter partitioning factor. The derived
/// values are precomputed once so the kernels stay arithmetic-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// log2 of the node space; the graph has `2^(sizeshift-1)` candidate edges.
    pub sizeshift: u32,
    /// Target cycle length.
    pub proof_size: usize,
    /// log2 of the number of degree-counter partitions per side.
    pub part_bits: u32,
    /// Node space size, `2^sizeshift`.
    pub size: u64,
    /// Candidate edge count and per-side node count, `size / 2`.
    pub halfsize: u64,
    /// Mask selecting a node index, `halfsize - 1`.
    pub node_mask: u64,
    /// Mask selecting a node's partition.
    pub part_mask: u64,
    /// Shift from a node to its cuckoo-table home slot, `part_bits + 6`.
    pub idxshift: u32,
    /// Cuckoo table capacity, `size >> idxshift`.
    pub cuckoo_size: u64,
    /// Bits of a node surviving the key shift, `64 - sizeshift`.
    pub keybits: u32,
    /// Mask selecting a cuckoo key.
    pub keymask: u64,
    /// Upper bound on linear-probe displacement from a key's home slot.
    pub maxdrift: u64,
    /// Safety bound on cuckoo-path length, `8 << (sizeshift / 3)`.
    pub maxpathlen: usize,
    /// Shift packing a nonce above a partition-local node index.
    pub nonceshift: u32,
    /// Mask selecting a partition-local node index.
    pub node_part_mask: u64,
    /// Nodes per degree-counter partition, `halfsize >> part_bits`.
    pub once_bits: u64,
}

impl Params {
    /// Validate and derive the full geometry.
    pub fn new(sizeshift: u32, proof_size: usize, part_bits: u32) -> Result<Self, SolverError> {
        if !(12..=32).contains(&sizeshift) {
            return Err(SolverError::InvalidParams(format!(
                "sizeshift {} outside 12..=32",
                sizeshift
            )));
        }
        if proof_size < 2 || proof_size % 2 != 0 {
            return Err(SolverError::InvalidParams(format!(
                "proof size {} must be even and at least 2",
                proof_size
            )));
        }
        if part_bits > 5 {
            return Err(SolverError::InvalidParams(format!(
                "part_bits {} above 5",
                part_bits
            )));
        }
        // the cuckoo table shrinks with partitioning; keep it at 64+ slots
        if part_bits + 12 > sizeshift {
            return Err(SolverError::InvalidParams(format!(
                "part_bits {} too large for sizeshift {}",
                part_bits, sizeshift
            )));
        }
        let size = 1u64 << sizeshift;
        let halfsize = size >> 1;
        let idxshift = part_bits + 6;
        let keybits = 64 - sizeshift;
        Ok(Self {
            sizeshift,
            proof_size,
            part_bits,
            size,
            halfsize,
            node_mask: halfsize - 1,
            part_mask: (1u64 << part_bits) - 1,
            idxshift,
            cuckoo_size: size >> idxshift,
            keybits,
            keymask: (1u64 << keybits) - 1,
            maxdrift: 1u64 << (keybits - idxshift),
            maxpathlen: 8usize << (sizeshift / 3),
            nonceshift: sizeshift - 1 - part_bits,
            node_part_mask: (halfsize - 1) >> part_bits,
            once_bits: halfsize >> part_bits,
        })
    }

    /// Trim rounds used when the caller does not pick a count.
    ///
    /// Grows with the partitioning factor, since each partition pass only
    /// sees its own slice of the updates.
    pub fn default_trims(&self) -> u32 {
        1 + (self.part_bits + 3) * (self.part_bits + 4) / 2
    }

    /// Peak heap footprint of a solve in bytes.
    ///
    /// The alive bitset plus the degree counter (whose geometry makes it the
    /// same size as the cuckoo table that replaces it).
    pub fn byte_count(&self) -> u64 {
        self.halfsize / 8 + (self.once_bits / 4).max(self.cuckoo_size * 8)
    }
}

/// A solution: `proof_size` edge nonces whose edges form one simple cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Edge nonces in ascending order.
    pub nonces: Vec<u64>,
}

/// Fatal and configuration errors surfaced by the solver.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A cuckoo-table walk ran past the path bound without terminating.
    #[error("maximum path length exceeded")]
    MaxPathExceeded,
    /// A cuckoo-table walk ran into a stale cycle left behind by an earlier
    /// partial insertion.
    #[error("illegal {length}-cycle in cuckoo table")]
    IllegalCycle {
        /// Length of the stale cycle.
        length: usize,
    },
    /// Trimming left more alive edges than the cuckoo table can absorb.
    #[error("overloaded: alive load {load}% of cuckoo capacity")]
    Overloaded {
        /// Alive edges after trimming, in percent of table capacity.
        load: u32,
    },
    /// The recovery scan did not find exactly the cycle's edges.
    #[error("proof recovery found {found} of {expected} cycle edges")]
    Recovery {
        /// Edges recovered by the scan.
        found: usize,
        /// Edges the cycle must have.
        expected: usize,
    },
    /// Rejected solver geometry or settings.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// Solver context: geometry plus run settings.
pub struct Solver {
    params: Params,
    threads: usize,
    trims: u32,
    max_sols: usize,
}

impl Solver {
    /// Build a solver from validated geometry and run settings.
    pub fn new(params: Params, settings: &Settings) -> Result<Self, SolverError> {
        if settings.max_sols == 0 {
            return Err(SolverError::InvalidParams(
                "max_sols must be at least 1".into(),
            ));
        }
        let threads = if settings.threads == 0 {
            num_cpus::get()
        } else {
            settings.threads as usize
        };
        let trims = if settings.trims == 0 {
            params.default_trims()
        } else {
            settings.trims
        };
        Ok(Self {
            params,
            threads,
            trims,
            max_sols: settings.max_sols as usize,
        })
    }

    /// The geometry this solver runs with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Search the graph seeded by `header` for cycles of the target length.
    ///
    /// Returns every proof found, at most `max_sols` of them; a clean search
    /// with no cycles returns an empty vector. An overloaded trim or a
    /// corrupt cuckoo path aborts the solve with an error.
    pub fn solve(&self, header: &[u8; 32]) -> Result<Vec<Proof>, SolverError> {
        let p = &self.params;
        let oracle = SipHasher::new(header, p.node_mask);
        let alive = ShrinkingSet::new(p.halfsize, self.threads);
        info!("initial load {}%", 100 * p.halfsize / p.cuckoo_size);

        // phase one: trim. The degree counter lives only inside this block;
        // it must be gone before the cuckoo table below is allocated.
        {
            let nonleaf = TwiceSet::new(p.once_bits);
            let barrier = Barrier::new(self.threads);
            let shared = trim::TrimShared {
                params: p,
                oracle: &oracle,
                alive: &alive,
                nonleaf: &nonleaf,
                barrier: &barrier,
                nthreads: self.threads,
                ntrims: self.trims,
            };
            thread::scope(|s| {
                for id in 0..self.threads {
                    let shared = &shared;
                    s.spawn(move || trim::run(id, shared));
                }
            });
        }

        let load = 100 * alive.count() / p.cuckoo_size;
        if load >= OVERLOAD_PCT {
            warn!("overloaded! exiting...");
            return Err(SolverError::Overloaded { load: load as u32 });
        }

        // phase two: find cycles among the survivors
        let cuckoo = CuckooHash::new(p);
        let sols = Mutex::new(Vec::new());
        let shared = cycle::CycleShared {
            params: p,
            oracle: &oracle,
            alive: &alive,
            cuckoo: &cuckoo,
            sols: &sols,
            nthreads: self.threads,
            max_sols: self.max_sols,
        };
        let results: Vec<Result<(), SolverError>> = thread::scope(|s| {
            let handles: Vec<_> = (0..self.threads)
                .map(|id| {
                    let shared = &shared;
                    s.spawn(move || cycle::run(id, shared))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("cycle worker panicked"))
                .collect()
        });
        for r in results {
            r?;
        }
        Ok(sols.into_inner().expect("solution buffer poisoned"))
    }
}
