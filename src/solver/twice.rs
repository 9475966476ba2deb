// src/solver/twice.rs - saturating 2-bit degree counter

//! Transient degree counter, two saturating bits per node.
//!
//! Records, for every node of one side and partition, whether it has been
//! seen zero times, once, or at least twice during a counting kernel. Leaf
//! detection only ever asks for the "at least twice" bit. Updates are
//! monotonic relaxed ORs; every (round, side, part) pass is bracketed by
//! barriers, so no stronger ordering is needed.

use std::sync::atomic::{AtomicU32, Ordering::Relaxed};

/// 2-bit-per-node counter over one partition of one side.
pub struct TwiceSet {
    bits: Vec<AtomicU32>,
}

impl TwiceSet {
    /// Counter for `nodes` nodes, all at zero. `nodes` is a multiple of 16
    /// (16 two-bit slots per word).
    pub fn new(nodes: u64) -> Self {
        debug_assert_eq!(nodes % 16, 0);
        let nwords = (nodes / 16) as usize;
        Self {
            bits: (0..nwords).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Clear every counter. Runs on one thread between barriers.
    pub fn reset(&self) {
        for word in &self.bits {
            word.store(0, Relaxed);
        }
    }

    /// Hint the cache line holding `u`'s counter into cache.
    ///
    /// The trimming kernels buffer node indices and prefetch them while still
    /// enumerating nonces; at real graph sizes the counter array misses cache
    /// on nearly every touch and this hides the latency behind the hashing.
    #[inline]
    pub fn prefetch(&self, u: u64) {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_NTA};
            _mm_prefetch(
                self.bits.as_ptr().add((u / 16) as usize) as *const i8,
                _MM_HINT_NTA,
            );
        }
        #[cfg(not(target_arch = "x86_64"))]
        let _ = u;
    }

    /// Count one sighting of node `u`: 0 to 1 to 2, saturating at 2.
    ///
    /// Two-step fetch-or: if the once bit was already set by anyone, a second
    /// fetch-or raises the twice bit. The encoding never needs 0b11 as a
    /// distinct state.
    #[inline]
    pub fn set(&self, u: u64) {
        let word = &self.bits[(u / 16) as usize];
        let bit = 1u32 << (2 * (u % 16));
        let old = word.fetch_or(bit, Relaxed);
        if old & bit != 0 {
            word.fetch_or(bit << 1, Relaxed);
        }
    }

    /// Nonzero iff `u` has been seen at least twice.
    #[inline]
    pub fn test(&self, u: u64) -> u32 {
        self.bits[(u / 16) as usize].load(Relaxed) >> (2 * (u % 16)) & 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_count() {
        let set = TwiceSet::new(1024);
        assert_eq!(set.test(5), 0);
        set.set(5);
        assert_eq!(set.test(5), 0);
        set.set(5);
        assert_ne!(set.test(5), 0);
        set.set(5);
        assert_ne!(set.test(5), 0);
    }

    #[test]
    fn test_slots_are_independent() {
        let set = TwiceSet::new(1024);
        set.set(4);
        set.set(4);
        assert_ne!(set.test(4), 0);
        // neighbors in the same word stay untouched
        assert_eq!(set.test(3), 0);
        assert_eq!(set.test(5), 0);
        // same slot index in the next word too
        assert_eq!(set.test(4 + 16), 0);
    }

    #[test]
    fn test_reset_clears() {
        let set = TwiceSet::new(1024);
        for u in 0..32 {
            set.set(u);
            set.set(u);
        }
        set.reset();
        for u in 0..32 {
            assert_eq!(set.test(u), 0);
        }
    }

    #[test]
    fn test_prefetch_is_harmless() {
        let set = TwiceSet::new(1024);
        set.prefetch(0);
        set.prefetch(1023);
        assert_eq!(set.test(0), 0);
    }
}
