// src/solver/cycle.rs - cycle finding over the trimmed graph

//! Cycle finding over the trimmed graph.
//!
//! The cuckoo table records at most one outgoing mapping per node, which
//! turns the surviving graph into a forest carrying at most one cycle per
//! component. For every alive edge both endpoints are walked to the end of
//! their chains; if the walks meet, that edge closes a cycle whose length is
//! read off the two paths. Cycles of the target length are recovered into
//! proofs by rescanning the whole alive set.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{debug, info};

use super::alive::ShrinkingSet;
use super::cuckoo::CuckooHash;
use super::siphash::SipHasher;
use super::{Params, Proof, SolverError};

/// State shared by every cycle-finding worker.
pub(crate) struct CycleShared<'a> {
    pub(crate) params: &'a Params,
    pub(crate) oracle: &'a SipHasher,
    pub(crate) alive: &'a ShrinkingSet,
    pub(crate) cuckoo: &'a CuckooHash,
    pub(crate) sols: &'a Mutex<Vec<Proof>>,
    pub(crate) nthreads: usize,
    pub(crate) max_sols: usize,
}

/// Walk the chain starting at `u`, recording nodes into `nodes[1..]`.
///
/// `nodes[0]` holds the walk's origin, set by the caller. Returns the index
/// of the chain's final node. A walk that exceeds the path bound means the
/// table holds a stale cycle from an earlier partial insertion; the walk is
/// backtracked to size that cycle before reporting it as fatal.
fn path(cuckoo: &CuckooHash, mut u: u64, nodes: &mut [u64]) -> Result<usize, SolverError> {
    let mut n = 0;
    while u != 0 {
        n += 1;
        if n >= nodes.len() {
            let mut k = n;
            loop {
                if k == 0 {
                    return Err(SolverError::MaxPathExceeded);
                }
                k -= 1;
                if nodes[k] == u {
                    return Err(SolverError::IllegalCycle { length: n - k });
                }
            }
        }
        nodes[n] = u;
        u = cuckoo.get(u);
    }
    Ok(n)
}

/// Cycle-finder worker: sweep this thread's interleaved share of alive edges.
pub(crate) fn run(id: usize, sh: &CycleShared<'_>) -> Result<(), SolverError> {
    let p = sh.params;
    let mut us = vec![0u64; p.maxpathlen];
    let mut vs = vec![0u64; p.maxpathlen];
    let mut block = (id as u64) * 64;
    while block < p.halfsize {
        let mut alive64 = sh.alive.block(block);
        while alive64 != 0 {
            let nonce = block + alive64.trailing_zeros() as u64;
            alive64 &= alive64 - 1;
            let u0 = sh.oracle.sipnode(nonce, 0);
            let v0 = sh.oracle.sipnode(nonce, 1);
            // node 0 stays out of the table so it can act as the sentinel
            if u0 == 0 {
                continue;
            }
            us[0] = u0;
            vs[0] = v0;
            let mut nu = path(sh.cuckoo, sh.cuckoo.get(u0), &mut us)?;
            let mut nv = path(sh.cuckoo, sh.cuckoo.get(v0), &mut vs)?;
            if us[nu] == vs[nv] {
                // both chains end at the same root: this edge closes a cycle
                let min = nu.min(nv);
                nu -= min;
                nv -= min;
                while us[nu] != vs[nv] {
                    nu += 1;
                    nv += 1;
                }
                let len = nu + nv + 1;
                info!("{}-cycle found at {}:{}%", len, id, nonce * 100 / p.halfsize);
                if len == p.proof_size
                    && sh.sols.lock().expect("solution buffer poisoned").len() < sh.max_sols
                {
                    record_solution(sh, &us[..=nu], &vs[..=nv])?;
                }
                continue;
            }
            // no cycle: reverse the shorter chain into the table so the new
            // edge's endpoint becomes its anchor
            if nu < nv {
                for k in (0..nu).rev() {
                    sh.cuckoo.set(us[k + 1], us[k]);
                }
                sh.cuckoo.set(u0, v0);
            } else {
                for k in (0..nv).rev() {
                    sh.cuckoo.set(vs[k + 1], vs[k]);
                }
                sh.cuckoo.set(v0, u0);
            }
        }
        block += (sh.nthreads as u64) * 64;
    }
    Ok(())
}

/// Recover the edges of a found cycle into a proof.
///
/// `us` and `vs` are the two paths up to and including their meeting node.
/// The cycle's node pairs are collected into a set, then the whole alive set
/// is rescanned to map them back to nonces, in ascending nonce order.
fn record_solution(sh: &CycleShared<'_>, us: &[u64], vs: &[u64]) -> Result<(), SolverError> {
    let p = sh.params;
    let mut cycle = HashSet::with_capacity(p.proof_size);
    cycle.insert((us[0], vs[0]));
    for k in (0..us.len() - 1).rev() {
        // U nodes sit at even path indices, V nodes at odd
        cycle.insert((us[(k + 1) & !1], us[k | 1]));
    }
    for k in (0..vs.len() - 1).rev() {
        // mirrored on the V path, where the parity runs the other way
        cycle.insert((vs[k | 1], vs[(k + 1) & !1]));
    }
    let mut nonces = Vec::with_capacity(p.proof_size);
    let mut block = 0u64;
    while block < p.halfsize {
        let mut alive64 = sh.alive.block(block);
        while alive64 != 0 {
            let nonce = block + alive64.trailing_zeros() as u64;
            alive64 &= alive64 - 1;
            let e = (sh.oracle.sipnode(nonce, 0), sh.oracle.sipnode(nonce, 1));
            if cycle.contains(&e) {
                debug!("e({:x})=({:x},{:x})", nonce, e.0, e.1);
                nonces.push(nonce);
                if p.proof_size > 2 {
                    // duplicate endpoints are rare but real; never match an
                    // edge pair twice
                    cycle.remove(&e);
                }
            }
        }
        block += 64;
    }
    if nonces.len() != p.proof_size {
        return Err(SolverError::Recovery {
            found: nonces.len(),
            expected: p.proof_size,
        });
    }
    let mut sols = sh.sols.lock().expect("solution buffer poisoned");
    if sols.len() < sh.max_sols {
        sols.push(Proof { nonces });
    }
    Ok(())
}
