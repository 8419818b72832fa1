use crate::kmerpump::item::{KmerData, Metadata};
use crate::kmerpump::kmer::{Kmer, Nucleotide};
use crate::kmerpump::tabulation::KmerHasher;
use crate::{Result, SketchError};
use rand::rngs::StdRng;
use rand::Rng;

/// An ordered run of nucleotides with the bookkeeping its k-mers inherit:
/// `base_offset` numbers the windows globally, `set_id` tags which input
/// set they belong to.
#[derive(Debug, Clone)]
pub struct Sequence {
    bases: Vec<Nucleotide>,
    base_offset: u64,
    set_id: u64,
}

impl Sequence {
    pub fn new(bases: Vec<Nucleotide>, base_offset: u64, set_id: u64) -> Result<Sequence> {
        if bases.is_empty() {
            return Err(SketchError::InvalidInput("empty sequence".into()));
        }
        Ok(Sequence {
            bases,
            base_offset,
            set_id,
        })
    }

    pub fn from_str(s: &str, base_offset: u64, set_id: u64) -> Result<Sequence> {
        let bases = s
            .chars()
            .map(Nucleotide::from_char)
            .collect::<Result<Vec<_>>>()?;
        Sequence::new(bases, base_offset, set_id)
    }

    /// Uniform random sequence of length `len`.
    pub fn random(len: usize, base_offset: u64, set_id: u64, rng: &mut StdRng) -> Result<Sequence> {
        if len == 0 {
            return Err(SketchError::InvalidInput("empty sequence".into()));
        }
        let bases = (0..len)
            .map(|_| Nucleotide::from_code(rng.gen_range(0..4)))
            .collect();
        Sequence::new(bases, base_offset, set_id)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn get(&self, pos: usize) -> Result<Nucleotide> {
        self.bases
            .get(pos)
            .copied()
            .ok_or(SketchError::OutOfBounds {
                pos,
                len: self.bases.len(),
            })
    }

    pub fn set_id(&self) -> u64 {
        self.set_id
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Lazy one-shot stream of every `k`-window as [`KmerData`], with the
    /// rolling hash maintained between consecutive windows. Yields nothing
    /// when the sequence is shorter than `k`.
    pub fn kmers<'a>(&'a self, k: usize, hasher: &'a KmerHasher) -> KmerIter<'a> {
        KmerIter {
            seq: self,
            hasher,
            k,
            next_start: 0,
            state: None,
        }
    }
}

/// Iterator behind [`Sequence::kmers`]. The first window is hashed from
/// scratch; every later one is a forward roll.
pub struct KmerIter<'a> {
    seq: &'a Sequence,
    hasher: &'a KmerHasher,
    k: usize,
    next_start: usize,
    state: Option<(Kmer, u64)>,
}

impl<'a> Iterator for KmerIter<'a> {
    type Item = KmerData;

    fn next(&mut self) -> Option<KmerData> {
        if self.k == 0 || self.next_start + self.k > self.seq.len() {
            return None;
        }
        let start = self.next_start;
        let (kmer, hash) = match self.state.take() {
            None => {
                let kmer = Kmer::from_nucleotides(&self.seq.bases[..self.k])
                    .expect("window length validated");
                let hash = self.hasher.hash(&kmer);
                (kmer, hash)
            }
            Some((mut kmer, hash)) => {
                let incoming = self.seq.bases[start + self.k - 1];
                let hash = self.hasher.roll_forward(hash, &mut kmer, incoming);
                (kmer, hash)
            }
        };
        let out = KmerData::new(
            kmer.clone(),
            hash,
            Metadata {
                index: self.seq.base_offset + start as u64,
                set_id: self.seq.set_id,
                mutation_index: 0,
                mutation_value: 0,
            },
        );
        self.state = Some((kmer, hash));
        self.next_start += 1;
        Some(out)
    }
}

/// A random sequence and a clone differing at position `len / 2` by the
/// cyclic-successor nucleotide: the seed material for the mutation
/// pipeline.
#[derive(Debug, Clone)]
pub struct SequencePair {
    pub original: Sequence,
    pub mutated: Sequence,
    pub mutation_pos: usize,
    pub mutation_value: Nucleotide,
}

impl SequencePair {
    pub fn random(
        len: usize,
        base_offset: u64,
        set_id: u64,
        rng: &mut StdRng,
    ) -> Result<SequencePair> {
        let original = Sequence::random(len, base_offset, set_id, rng)?;
        let mutation_pos = len / 2;
        let mutation_value = original.bases[mutation_pos].rotated();
        let mut mutated = original.clone();
        mutated.bases[mutation_pos] = mutation_value;
        Ok(SequencePair {
            original,
            mutated,
            mutation_pos,
            mutation_value,
        })
    }
}
