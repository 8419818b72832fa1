use crate::kmerpump::kmer::Kmer;
use crate::Result;
use std::hash::{Hash, Hasher};

/// Payload a sketch cell can aggregate: anything with an XOR group
/// structure and a 64-bit identifying hash.
///
/// `item_hash` doubles as the purity probe: a cell is considered pure when
/// re-indexing its aggregated hash lands back on the cell itself, so the
/// hash of the neutral element must be 0.
pub trait SketchItem: Clone + Send + Sync {
    /// Fold `other` into `self`. Must be commutative and associative, and
    /// self-inverse (`x.xor_with(x)` yields the neutral element).
    fn xor_with(&mut self, other: &Self);

    /// The 64-bit hash that identifies this item inside a sketch.
    fn item_hash(&self) -> u64;

    /// Whether `other` can share a sketch with `self` (same payload shape).
    fn shape_matches(&self, _other: &Self) -> bool {
        true
    }
}

impl SketchItem for u64 {
    #[inline(always)]
    fn xor_with(&mut self, other: &u64) {
        *self ^= other;
    }

    #[inline(always)]
    fn item_hash(&self) -> u64 {
        *self
    }
}

/// Integer side-channel carried along with every k-mer. XOR-closed so that
/// cell aggregation and set-difference work field-wise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Window position: `base_offset + i` for the i-th window of a sequence.
    pub index: u64,
    /// Which input set the k-mer came from.
    pub set_id: u64,
    /// 1-based mutation offset inside the k-mer; 0 means unannotated.
    pub mutation_index: u64,
    /// 2-bit code of the replacement nucleotide at `mutation_index`.
    pub mutation_value: u64,
}

impl Metadata {
    #[inline]
    fn xor_with(&mut self, other: &Metadata) {
        self.index ^= other.index;
        self.set_id ^= other.set_id;
        self.mutation_index ^= other.mutation_index;
        self.mutation_value ^= other.mutation_value;
    }
}

/// A packed k-mer together with its tabulation hash and metadata.
///
/// Equality and `Hash` go through the 64-bit hash alone: two k-mers that
/// collide are collapsed. This keeps set deduplication consistent with how
/// cells identify their contents; the collision probability is the usual
/// birthday bound on 64 bits.
#[derive(Debug, Clone)]
pub struct KmerData {
    pub kmer: Kmer,
    pub hash: u64,
    pub meta: Metadata,
}

impl KmerData {
    pub fn new(kmer: Kmer, hash: u64, meta: Metadata) -> KmerData {
        KmerData { kmer, hash, meta }
    }

    /// The neutral cell value for a sketch of `len`-mers: an all-zero
    /// k-mer, hash 0, zero metadata. Fixed byte size, so cells never
    /// reallocate after construction.
    pub fn neutral(len: usize) -> Result<KmerData> {
        Ok(KmerData {
            kmer: Kmer::new(len)?,
            hash: 0,
            meta: Metadata::default(),
        })
    }
}

impl PartialEq for KmerData {
    fn eq(&self, other: &KmerData) -> bool {
        self.hash == other.hash
    }
}

impl Eq for KmerData {}

impl Hash for KmerData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl SketchItem for KmerData {
    #[inline]
    fn xor_with(&mut self, other: &KmerData) {
        self.kmer.xor_in_place(&other.kmer);
        self.hash ^= other.hash;
        self.meta.xor_with(&other.meta);
    }

    #[inline(always)]
    fn item_hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn shape_matches(&self, other: &KmerData) -> bool {
        self.kmer.len() == other.kmer.len()
    }
}
