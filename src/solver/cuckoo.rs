// src/solver/cuckoo.rs - open-addressed node-to-node table

//! Open-addressed node-to-node table, the "cuckoo table".
//!
//! Each 64-bit cell packs a key (the upper `64 - sizeshift` bits of the
//! source node) above a value (the destination node, in the low `sizeshift`
//! bits). Zero is the empty sentinel, so node 0 is reserved and never stored.
//! Lookups probe linearly from the node's home slot `u >> idxshift` with
//! wraparound; a present entry always sits within `maxdrift` slots of home.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

use super::Params;

/// Fixed-capacity concurrent map from node to node.
pub struct CuckooHash {
    cells: Vec<AtomicU64>,
    sizeshift: u32,
    idxshift: u32,
    mask: u64,
    keymask: u64,
    maxdrift: u64,
    valmask: u64,
}

impl CuckooHash {
    /// Empty table sized to the graph geometry.
    pub fn new(params: &Params) -> Self {
        Self {
            cells: (0..params.cuckoo_size).map(|_| AtomicU64::new(0)).collect(),
            sizeshift: params.sizeshift,
            idxshift: params.idxshift,
            mask: params.cuckoo_size - 1,
            keymask: params.keymask,
            maxdrift: params.maxdrift,
            valmask: params.size - 1,
        }
    }

    /// Install or update the mapping `u -> v`.
    ///
    /// Empty cells are claimed with a compare-and-swap so concurrent inserts
    /// stay per-cell linearizable. A key match is a plain overwrite: only one
    /// logical chain owns a key, which is how chain extension re-anchors an
    /// existing entry.
    pub fn set(&self, u: u64, v: u64) {
        let entry = u << self.sizeshift | v;
        let mut ui = u >> self.idxshift;
        loop {
            match self.cells[ui as usize].compare_exchange(0, entry, Relaxed, Relaxed) {
                Ok(_) => return,
                Err(old) => {
                    if old >> self.sizeshift == u & self.keymask {
                        self.cells[ui as usize].store(entry, Relaxed);
                        return;
                    }
                }
            }
            ui = (ui + 1) & self.mask;
        }
    }

    /// The node `u` maps to, or 0 when no mapping is present.
    pub fn get(&self, u: u64) -> u64 {
        let mut ui = u >> self.idxshift;
        loop {
            let cell = self.cells[ui as usize].load(Relaxed);
            if cell == 0 {
                return 0;
            }
            if cell >> self.sizeshift == u & self.keymask {
                debug_assert!(ui.wrapping_sub(u >> self.idxshift) & self.mask < self.maxdrift);
                return cell & self.valmask;
            }
            ui = (ui + 1) & self.mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CuckooHash {
        CuckooHash::new(&Params::new(12, 6, 0).unwrap())
    }

    #[test]
    fn test_absent_is_zero() {
        let t = table();
        assert_eq!(t.get(2), 0);
        assert_eq!(t.get(4095), 0);
    }

    #[test]
    fn test_set_get_roundtrip() {
        let t = table();
        t.set(2, 4);
        t.set(700, 1234);
        assert_eq!(t.get(2), 4);
        assert_eq!(t.get(700), 1234);
        assert_eq!(t.get(3), 0);
    }

    #[test]
    fn test_same_key_overwrites() {
        let t = table();
        t.set(2, 4);
        t.set(2, 9);
        assert_eq!(t.get(2), 9);
    }

    #[test]
    fn test_home_collisions_probe() {
        let t = table();
        // 64..127 share home slot 1 with idxshift 6
        t.set(64, 100);
        t.set(65, 101);
        t.set(66, 102);
        assert_eq!(t.get(64), 100);
        assert_eq!(t.get(65), 101);
        assert_eq!(t.get(66), 102);
        assert_eq!(t.get(67), 0);
    }

    #[test]
    fn test_probe_wraps_around() {
        let t = table();
        // home slot of 4032.. is 63, the last; its neighbors spill into slot 0
        t.set(4032, 7);
        t.set(4033, 8);
        assert_eq!(t.get(4032), 7);
        assert_eq!(t.get(4033), 8);
    }
}
