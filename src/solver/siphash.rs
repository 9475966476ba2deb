// src/solver/siphash.rs - keyed SipHash-2-4 edge oracle

//! SipHash-2-4 edge oracle.
//!
//! Every candidate edge of the search graph is derived pseudorandomly from the
//! 32-byte header: edge `nonce` has endpoint `sipnode(nonce, 0)` on the U side
//! and `sipnode(nonce, 1)` on the V side. The oracle is the only part of the
//! solver that is sensitive to cross-implementation compatibility: proofs
//! verify elsewhere only if the node derivation matches bit for bit.

use blake2::{
    digest::{Update, VariableOutput},
    Blake2bVar,
};

/// Keyed SipHash-2-4 state seeding the edge space for one header.
#[derive(Clone, Debug)]
pub struct SipHasher {
    k0: u64,
    k1: u64,
    node_mask: u64,
}

impl SipHasher {
    /// Seed the oracle from a 32-byte header.
    ///
    /// The first 16 header bytes become the two 64-bit SipHash keys,
    /// little-endian. Callers holding raw material of another length digest
    /// it to 32 bytes first, see [`digest_header`].
    pub fn new(header: &[u8; 32], node_mask: u64) -> Self {
        let k0 = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let k1 = u64::from_le_bytes(header[8..16].try_into().unwrap());
        Self { k0, k1, node_mask }
    }

    /// Endpoint of edge `nonce` on side `uorv`, without the side bit.
    ///
    /// This is the raw masked form the trimming kernels use; they still need
    /// the low node bits for their partition test before shifting them away.
    #[inline]
    pub fn sipnode_masked(&self, nonce: u64, uorv: u64) -> u64 {
        self.siphash24(2 * nonce + uorv) & self.node_mask
    }

    /// Endpoint of edge `nonce` on side `uorv`, side bit folded into bit 0.
    ///
    /// U nodes come out even and V nodes odd, so the two sides of the
    /// bipartition never collide in the cuckoo table's key space.
    #[inline]
    pub fn sipnode(&self, nonce: u64, uorv: u64) -> u64 {
        self.sipnode_masked(nonce, uorv) << 1 | uorv
    }

    /// SipHash-2-4 over a single 64-bit word.
    fn siphash24(&self, input: u64) -> u64 {
        let mut v0 = 0x736f6d6570736575u64 ^ self.k0;
        let mut v1 = 0x646f72616e646f6du64 ^ self.k1;
        let mut v2 = 0x6c7967656e657261u64 ^ self.k0;
        let mut v3 = 0x7465646279746573u64 ^ self.k1;

        v3 ^= input;
        for _ in 0..2 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }

        v0 ^= input;
        v2 ^= 0xff;
        for _ in 0..4 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }

        v0 ^ v1 ^ v2 ^ v3
    }
}

/// Single round of SipHash
#[inline]
fn sipround(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

/// Digest arbitrary-length bytes into a 32-byte header with Blake2b-256.
///
/// Convenience for callers that start from a text header; anything already
/// holding 32 bytes passes them to [`SipHasher::new`] verbatim.
pub fn digest_header(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2bVar::new(32).unwrap();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize_variable(&mut out).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: u64 = (1 << 15) - 1;

    #[test]
    fn test_keys_from_header() {
        let mut header = [0u8; 32];
        header[0] = 0x42;
        let a = SipHasher::new(&header, MASK);
        let b = SipHasher::new(&header, MASK);
        assert_eq!(a.k0, b.k0);
        assert_eq!(a.k1, b.k1);
        assert_eq!(a.k0, 0x42);

        header[8] = 1;
        let c = SipHasher::new(&header, MASK);
        assert_eq!(c.k0, a.k0);
        assert_ne!(c.k1, a.k1);
    }

    #[test]
    fn test_node_determinism() {
        let hasher = SipHasher::new(&[0x12u8; 32], MASK);
        assert_eq!(hasher.sipnode(42, 0), hasher.sipnode(42, 0));
        assert_eq!(hasher.sipnode(42, 1), hasher.sipnode(42, 1));
        assert_ne!(
            (hasher.sipnode(42, 0), hasher.sipnode(42, 1)),
            (hasher.sipnode(43, 0), hasher.sipnode(43, 1))
        );
    }

    #[test]
    fn test_node_range_and_parity() {
        let hasher = SipHasher::new(&[7u8; 32], MASK);
        for nonce in 0..256 {
            let raw = hasher.sipnode_masked(nonce, 0);
            assert!(raw <= MASK);
            // side bit lands in bit 0
            assert_eq!(hasher.sipnode(nonce, 0), raw << 1);
            assert_eq!(hasher.sipnode(nonce, 0) & 1, 0);
            assert_eq!(hasher.sipnode(nonce, 1) & 1, 1);
        }
    }

    #[test]
    fn test_sides_hash_independently() {
        let hasher = SipHasher::new(&[0u8; 32], MASK);
        // the two sides hash different inputs (2n vs 2n+1)
        let differs =
            (0..16).any(|n| hasher.sipnode_masked(n, 0) != hasher.sipnode_masked(n, 1));
        assert!(differs);
    }

    #[test]
    fn test_header_sensitivity() {
        let a = SipHasher::new(&[0u8; 32], MASK);
        let mut header = [0u8; 32];
        header[15] = 1;
        let b = SipHasher::new(&header, MASK);
        let differs = (0..64).any(|n| a.sipnode(n, 0) != b.sipnode(n, 0));
        assert!(differs);
    }

    #[test]
    fn test_digest_header() {
        let a = digest_header(b"test-a");
        let b = digest_header(b"test-a");
        let c = digest_header(b"test-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, [0u8; 32]);
    }
}
