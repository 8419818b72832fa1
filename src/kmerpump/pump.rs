use crate::kmerpump::item::{KmerData, Metadata, SketchItem};
use crate::kmerpump::kmer::Nucleotide;
use crate::kmerpump::sketch::Sketch;
use crate::kmerpump::tabulation::KmerHasher;
use crate::Result;
use fxhash::FxHashSet;

/// Expand decoded seed k-mers into every k-mer whose hash was recovered,
/// by walking rolling-hash edges.
///
/// Depth-first: each popped k-mer tries its four forward extensions in
/// A,C,G,T order and takes the first one whose hash is still in `hashes`,
/// then does the same for the four reverse extensions. Every hash is
/// consumed (removed from `hashes`) at most once, so the walk does
/// O(|hashes|) rolling updates in total. A false-positive hash in the set
/// is harmless here: it almost never has a rolling neighbor, so the walk
/// simply never reaches it.
pub fn pump(
    seeds: &[KmerData],
    hashes: &mut FxHashSet<u64>,
    hasher: &KmerHasher,
) -> Vec<KmerData> {
    let mut reconstructed = Vec::new();
    let mut stack: Vec<KmerData> = Vec::with_capacity(seeds.len());

    for seed in seeds {
        if hashes.remove(&seed.hash) {
            stack.push(seed.clone());
            reconstructed.push(seed.clone());
        }
    }

    while let Some(current) = stack.pop() {
        // Forward: at most one neighbor is expected; first match wins.
        for n in Nucleotide::ALL {
            let mut kmer = current.kmer.clone();
            let hash = hasher.roll_forward(current.hash, &mut kmer, n);
            if hashes.remove(&hash) {
                let next = KmerData::new(
                    kmer,
                    hash,
                    Metadata {
                        index: current.meta.index.wrapping_add(1),
                        set_id: current.meta.set_id,
                        mutation_index: 0,
                        mutation_value: 0,
                    },
                );
                reconstructed.push(next.clone());
                stack.push(next);
                break;
            }
        }
        // Reverse, independently of whether forward matched.
        for n in Nucleotide::ALL {
            let mut kmer = current.kmer.clone();
            let hash = hasher.roll_backward(current.hash, &mut kmer, n);
            if hashes.remove(&hash) {
                let next = KmerData::new(
                    kmer,
                    hash,
                    Metadata {
                        index: current.meta.index.wrapping_sub(1),
                        set_id: current.meta.set_id,
                        mutation_index: 0,
                        mutation_value: 0,
                    },
                );
                reconstructed.push(next.clone());
                stack.push(next);
                break;
            }
        }
    }

    reconstructed
}

/// Pump, then squeeze the residual out of a compressed sketch that holds
/// the full input: XOR the freshly reconstructed items out of it, peel the
/// now-sparser sketch for leftovers, pump those as new seeds, and repeat
/// until a round adds nothing.
///
/// Items emitted by the compressed sketch's own decode are already peeled
/// out of its cells, so only the items found by rolling are re-encoded in
/// the following round.
pub fn iterated_pump(
    compressed: &mut Sketch<KmerData>,
    seeds: &[KmerData],
    hashes: &mut FxHashSet<u64>,
    hasher: &KmerHasher,
) -> Result<Vec<KmerData>> {
    let reconstructed = pump(seeds, hashes, hasher);
    residual_pump(compressed, reconstructed, hashes, hasher)
}

/// The residual loop behind [`iterated_pump`], entered with an already
/// accumulated reconstruction (possibly empty, in which case the first
/// round just peels the compressed sketch as-is).
pub fn residual_pump(
    compressed: &mut Sketch<KmerData>,
    mut reconstructed: Vec<KmerData>,
    hashes: &mut FxHashSet<u64>,
    hasher: &KmerHasher,
) -> Result<Vec<KmerData>> {
    let mut fresh = reconstructed.clone();

    loop {
        if !fresh.is_empty() {
            compressed.encode(&fresh)?;
        }
        let leftovers = compressed.decode();
        if leftovers.is_empty() {
            break;
        }
        let pumped = pump(&leftovers, hashes, hasher);
        if pumped.is_empty() {
            break;
        }
        // The leftovers left the sketch via its decode; everything found
        // by rolling is still in there and must be XORed out next round.
        let leftover_hashes: FxHashSet<u64> = leftovers.iter().map(|l| l.item_hash()).collect();
        fresh = pumped
            .iter()
            .filter(|kd| !leftover_hashes.contains(&kd.hash))
            .cloned()
            .collect();
        reconstructed.extend(pumped);
    }

    Ok(reconstructed)
}
