use crate::kmerpump::kmer::{Kmer, Nucleotide};
use crate::{Result, SketchError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Byte-aligned 8-bit window of the packed representation starting at bit
/// `2k`, i.e. covering positions `k..k+4`. Assembled from at most two
/// bytes; valid for every `k <= len - 4`.
#[inline(always)]
fn window(bytes: &[u8], k: usize) -> u8 {
    let bit = 2 * k;
    let shift = (bit % 8) as u32;
    let byte = bit / 8;
    if shift == 0 {
        bytes[byte]
    } else {
        (bytes[byte] << shift) | (bytes[byte + 1] >> (8 - shift))
    }
}

/// Tabulation hash over the 8-bit windows of a packed k-mer.
///
/// `hash(K) = XOR over k in [0, L-4] of table[window(k)].rotate_left(k)`.
/// K-mers shorter than one full window hash to 0.
///
/// The rotation ties each window's contribution to its position, which is
/// what makes the O(1) rolling updates below possible: a shift moves every
/// surviving window by one position, i.e. one rotation of the whole sum.
pub struct KmerHasher {
    table: [u64; 256],
}

impl KmerHasher {
    /// Fill the 256-entry table from a deterministic PRNG.
    pub fn new(seed: u64) -> KmerHasher {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut table = [0u64; 256];
        for entry in table.iter_mut() {
            *entry = rng.gen();
        }
        KmerHasher { table }
    }

    /// Hash from scratch, O(len).
    pub fn hash(&self, kmer: &Kmer) -> u64 {
        let len = kmer.len();
        if len < 4 {
            return 0;
        }
        let bytes = kmer.bytes();
        let mut h = 0u64;
        for k in 0..=len - 4 {
            h ^= self.table[window(bytes, k) as usize].rotate_left(k as u32);
        }
        h
    }

    /// Advance `kmer` by one position (drop position 0, append `incoming`)
    /// and return the updated hash in O(1).
    ///
    /// Every surviving window moves from position k to k-1, so its rotated
    /// contribution rotates right by one; the first window's contribution
    /// is XORed out before the rotation and the new final window is XORed
    /// in after it.
    pub fn roll_forward(&self, hash: u64, kmer: &mut Kmer, incoming: Nucleotide) -> u64 {
        let len = kmer.len();
        if len < 4 {
            kmer.shift_left(incoming);
            return 0;
        }
        let first = window(kmer.bytes(), 0);
        kmer.shift_left(incoming);
        let last = window(kmer.bytes(), len - 4);
        (hash ^ self.table[first as usize]).rotate_right(1)
            ^ self.table[last as usize].rotate_left((len - 4) as u32)
    }

    /// Mirror of [`Self::roll_forward`]: drop position len-1, prepend
    /// `incoming` at position 0, update the hash in O(1).
    pub fn roll_backward(&self, hash: u64, kmer: &mut Kmer, incoming: Nucleotide) -> u64 {
        let len = kmer.len();
        if len < 4 {
            kmer.shift_right(incoming);
            return 0;
        }
        let last = window(kmer.bytes(), len - 4);
        kmer.shift_right(incoming);
        let first = window(kmer.bytes(), 0);
        (hash ^ self.table[last as usize].rotate_left((len - 4) as u32)).rotate_left(1)
            ^ self.table[first as usize]
    }

    /// Hash of `kmer` with position `pos` replaced by `n_new`, without
    /// touching the k-mer. A substitution affects at most four windows,
    /// `k in [max(0, pos-3), min(len-4, pos)]`; each new window differs
    /// from the old one by the nucleotide diff at its in-window offset.
    pub fn substitution_hash(
        &self,
        hash: u64,
        kmer: &Kmer,
        pos: usize,
        n_new: Nucleotide,
    ) -> Result<u64> {
        let len = kmer.len();
        if pos >= len {
            return Err(SketchError::OutOfBounds { pos, len });
        }
        if len < 4 {
            return Ok(0);
        }
        let diff = kmer.get(pos)?.code() ^ n_new.code();
        if diff == 0 {
            return Ok(hash);
        }
        let bytes = kmer.bytes();
        let lo = pos.saturating_sub(3);
        let hi = pos.min(len - 4);
        let mut h = hash;
        for k in lo..=hi {
            let w_old = window(bytes, k);
            let w_new = w_old ^ (diff << (6 - 2 * (pos - k)));
            h ^= (self.table[w_old as usize] ^ self.table[w_new as usize]).rotate_left(k as u32);
        }
        Ok(h)
    }
}

/// Generic `u64 -> u64` tabulation hash: eight 256-entry tables, one per
/// byte of the input. This is the indexer role of the sketch tables; each
/// table of a sketch owns one with a distinct seed.
pub struct ValueHasher {
    tables: Box<[[u64; 256]; 8]>,
}

impl ValueHasher {
    pub fn new(seed: u64) -> ValueHasher {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tables = Box::new([[0u64; 256]; 8]);
        for table in tables.iter_mut() {
            for entry in table.iter_mut() {
                *entry = rng.gen();
            }
        }
        ValueHasher { tables }
    }

    #[inline(always)]
    pub fn hash(&self, value: u64) -> u64 {
        let mut h = 0u64;
        let mut v = value;
        for table in self.tables.iter() {
            h ^= table[(v & 0xFF) as usize];
            v >>= 8;
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_kmers_hash_to_zero() {
        let hasher = KmerHasher::new(0);
        for s in ["A", "AC", "ACG"] {
            assert_eq!(hasher.hash(&Kmer::from_str(s).unwrap()), 0);
        }
        assert_ne!(hasher.hash(&Kmer::from_str("ACGT").unwrap()), 0);
    }

    #[test]
    fn window_straddles_byte_boundaries() {
        // "ACGTA" packs to 0b00011011_00xxxxxx; the window at k=1 starts
        // at bit 2 and must pull its low bits from byte 1.
        let k = Kmer::from_str("ACGTA").unwrap();
        assert_eq!(window(k.bytes(), 0), 0b0001_1011);
        assert_eq!(window(k.bytes(), 1), 0b0110_1100);
    }

    #[test]
    fn value_hasher_is_deterministic_per_seed() {
        let a = ValueHasher::new(7);
        let b = ValueHasher::new(7);
        let c = ValueHasher::new(8);
        assert_eq!(a.hash(0xDEAD_BEEF), b.hash(0xDEAD_BEEF));
        assert_ne!(a.hash(0xDEAD_BEEF), c.hash(0xDEAD_BEEF));
    }
}
