// src/solver/trim.rs - parallel leaf-edge trimming

//! Edge trimming, the memory-hard phase.
//!
//! Each round processes both sides and every degree-counter partition. A pass
//! runs two kernels under the shared barrier: the first tallies node degrees
//! into the twice-set, the second kills every edge whose endpoint stayed
//! below degree 2. A leaf edge cannot lie on a cycle, so the alive set only
//! ever loses edges no proof could use.
//!
//! Workers sweep interleaved 64-edge blocks (`id*64`, `id*64 + nthreads*64`,
//! and so on), which keeps all alive-set writes word-disjoint across threads.

use std::sync::Barrier;

use tracing::info;

use super::alive::ShrinkingSet;
use super::siphash::SipHasher;
use super::twice::TwiceSet;
use super::Params;

/// State shared by every trimming worker.
pub(crate) struct TrimShared<'a> {
    pub(crate) params: &'a Params,
    pub(crate) oracle: &'a SipHasher,
    pub(crate) alive: &'a ShrinkingSet,
    pub(crate) nonleaf: &'a TwiceSet,
    pub(crate) barrier: &'a Barrier,
    pub(crate) nthreads: usize,
    pub(crate) ntrims: u32,
}

/// Trimming worker body.
///
/// Thread 0 doubles as coordinator: it resets the degree counter before each
/// pass and reports the load after it. The barrier after the counting kernel
/// is what makes the killing kernel's reads of the counter well defined.
pub(crate) fn run(id: usize, sh: &TrimShared<'_>) {
    for round in 1..=sh.ntrims {
        for uorv in 0..2u64 {
            for part in 0..=sh.params.part_mask {
                if id == 0 {
                    sh.nonleaf.reset();
                }
                sh.barrier.wait();
                count_node_deg(id, sh, uorv, part);
                sh.barrier.wait();
                kill_leaf_edges(id, sh, uorv, part);
                sh.barrier.wait();
                if id == 0 {
                    let load = 100 * sh.alive.count() / sh.params.cuckoo_size;
                    info!(
                        "round {} part {}{} load {}%",
                        round,
                        if uorv == 0 { 'U' } else { 'V' },
                        part,
                        load
                    );
                }
            }
        }
    }
}

/// Kernel A: tally the degree of every alive `uorv`-endpoint within `part`.
///
/// Nodes are buffered per block and their counter lines prefetched before any
/// counter is touched; the buffer hides the counter's cache misses behind the
/// siphash work. Not cosmetic: dropping it costs a large factor at real
/// graph sizes.
fn count_node_deg(id: usize, sh: &TrimShared<'_>, uorv: u64, part: u64) {
    let p = sh.params;
    let mut buf = [0u64; 64];
    let mut block = (id as u64) * 64;
    while block < p.halfsize {
        let mut bsize = 0;
        let mut alive64 = sh.alive.block(block);
        while alive64 != 0 {
            let nonce = block + alive64.trailing_zeros() as u64;
            alive64 &= alive64 - 1;
            let u = sh.oracle.sipnode_masked(nonce, uorv);
            if u & p.part_mask == part {
                buf[bsize] = u >> p.part_bits;
                sh.nonleaf.prefetch(u >> p.part_bits);
                bsize += 1;
            }
        }
        for &u in &buf[..bsize] {
            sh.nonleaf.set(u);
        }
        block += (sh.nthreads as u64) * 64;
    }
}

/// Kernel B: kill every edge whose buffered endpoint stayed below degree 2.
///
/// A buffer entry packs the nonce above the partition-local node index so the
/// degree test needs no second hash.
fn kill_leaf_edges(id: usize, sh: &TrimShared<'_>, uorv: u64, part: u64) {
    let p = sh.params;
    let mut buf = [0u64; 64];
    let mut block = (id as u64) * 64;
    while block < p.halfsize {
        let mut bsize = 0;
        let mut alive64 = sh.alive.block(block);
        while alive64 != 0 {
            let nonce = block + alive64.trailing_zeros() as u64;
            alive64 &= alive64 - 1;
            let u = sh.oracle.sipnode_masked(nonce, uorv);
            if u & p.part_mask == part {
                buf[bsize] = nonce << p.nonceshift | u >> p.part_bits;
                sh.nonleaf.prefetch(u >> p.part_bits);
                bsize += 1;
            }
        }
        for &entry in &buf[..bsize] {
            if sh.nonleaf.test(entry & p.node_part_mask) == 0 {
                sh.alive.kill(block | entry >> p.nonceshift, id);
            }
        }
        block += (sh.nthreads as u64) * 64;
    }
}
