use crate::cli::counters::{MutationCounters, ReconstructionCounters};
use crate::kmerpump::item::KmerData;
use crate::kmerpump::kmer::Nucleotide;
use crate::kmerpump::pump::{iterated_pump, pump, residual_pump};
use crate::kmerpump::sequence::SequencePair;
use crate::kmerpump::sketch::Sketch;
use crate::kmerpump::tabulation::KmerHasher;
use anyhow::{ensure, Context, Result};
use fxhash::FxHashSet;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sizing knobs shared by every sketch a pipeline builds.
#[derive(Debug, Clone, Copy)]
pub struct SketchParams {
    pub n_tables: usize,
    /// Cells per expected item; 1.3-1.5 is the usual working range, the
    /// pipelines default higher to keep decode failures out of sweeps.
    pub overhead: f64,
    pub seed: u64,
}

impl SketchParams {
    pub fn cells_for(&self, expected_items: usize) -> usize {
        ((expected_items as f64 * self.overhead).ceil() as usize).max(1)
    }
}

impl Default for SketchParams {
    fn default() -> SketchParams {
        SketchParams {
            n_tables: 3,
            overhead: 1.5,
            seed: 0,
        }
    }
}

/// Parameters of the single-stage "kmer" reconstruction pipeline.
#[derive(Debug, Clone, Copy)]
pub struct KmerPipelineConfig {
    /// Keep k-mers with `hash % sample_modulus == 0` as pump seeds.
    pub sample_modulus: u64,
    /// Residual sketch size as a fraction of the input count.
    pub compressed_fraction: f64,
    pub sketch: SketchParams,
}

/// Parameters of the staged "hashset-extended" pipeline.
#[derive(Debug, Clone, Copy)]
pub struct HashsetPipelineConfig {
    pub stages: usize,
    /// Stage i samples at modulus `ceil(sample_base * shrink^i)`.
    pub sample_base: u64,
    pub shrink: f64,
    pub compressed_fraction: f64,
    pub sketch: SketchParams,
}

/// Parameters of the mutation-detection pipeline.
#[derive(Debug, Clone, Copy)]
pub struct MutationPipelineConfig {
    pub kmer_len: usize,
    /// Probe window length; the half-length h-mer by convention.
    pub hmer_len: usize,
    pub sketch: SketchParams,
}

/// Collapse duplicate k-mers by hash. Hash-equality makes this line up
/// with how the sketch cells cancel repeated insertions.
pub fn dedup_items(items: &[KmerData]) -> Vec<KmerData> {
    let set: FxHashSet<&KmerData> = items.iter().collect();
    set.into_iter().cloned().collect()
}

/// "kmer" pipeline: hash-only sketch of every hash, one sampled k-mer
/// sketch for seeds, and a compressed sketch of the full input that the
/// iterated pump squeezes for residuals.
pub fn run_kmer_pipeline(
    items: &[KmerData],
    hasher: &KmerHasher,
    cfg: &KmerPipelineConfig,
) -> Result<ReconstructionCounters> {
    let items = dedup_items(items);
    ensure!(!items.is_empty(), "kmer pipeline needs a non-empty input");
    ensure!(cfg.sample_modulus > 0, "zero sampling modulus");
    let kmer_len = items[0].kmer.len();
    let n = items.len();
    let mut seed_rng = StdRng::seed_from_u64(cfg.sketch.seed);

    let input_hashes: Vec<u64> = items.iter().map(|kd| kd.hash).collect();
    let mut hash_sketch = Sketch::hashes(
        cfg.sketch.n_tables,
        cfg.sketch.cells_for(n),
        seed_rng.gen(),
    )
    .context("building hash sketch")?;
    hash_sketch.encode(&input_hashes)?;

    let expected_sampled = n / cfg.sample_modulus as usize + 1;
    let mut sampled = Sketch::kmers(
        cfg.sketch.n_tables,
        kmer_len,
        cfg.sketch.cells_for(expected_sampled),
        seed_rng.gen(),
    )
    .context("building sampled sketch")?;
    sampled.encode_sampled(&items, cfg.sample_modulus)?;

    let expected_residual = (n as f64 * cfg.compressed_fraction).ceil() as usize;
    let mut compressed = Sketch::kmers(
        cfg.sketch.n_tables,
        kmer_len,
        cfg.sketch.cells_for(expected_residual),
        seed_rng.gen(),
    )
    .context("building compressed sketch")?;
    compressed.encode(&items)?;

    let mut recovered: FxHashSet<u64> = hash_sketch.decode().into_iter().collect();
    let recovered_hashes = recovered.len() as u64;
    let seeds = sampled.decode();
    debug!(
        "kmer pipeline: {} items, {} recovered hashes, {} seeds",
        n,
        recovered_hashes,
        seeds.len()
    );

    let out = iterated_pump(&mut compressed, &seeds, &mut recovered, hasher)?;
    Ok(tally_reconstruction(
        &input_hashes,
        recovered_hashes,
        seeds.len() as u64,
        &out,
    ))
}

/// "hashset-extended" pipeline: geometrically sparser sampled sketches
/// decoded stage by stage, the accumulated reconstruction XORed out of each
/// stage before its decode, and a final residual pass through a compressed
/// sketch of the whole input.
pub fn run_hashset_pipeline(
    items: &[KmerData],
    hasher: &KmerHasher,
    cfg: &HashsetPipelineConfig,
) -> Result<ReconstructionCounters> {
    let items = dedup_items(items);
    ensure!(!items.is_empty(), "hashset pipeline needs a non-empty input");
    ensure!(cfg.stages > 0, "hashset pipeline needs at least one stage");
    ensure!(cfg.sample_base > 0, "zero sampling base");
    let kmer_len = items[0].kmer.len();
    let n = items.len();
    let mut seed_rng = StdRng::seed_from_u64(cfg.sketch.seed);

    let input_hashes: Vec<u64> = items.iter().map(|kd| kd.hash).collect();
    let mut hash_sketch = Sketch::hashes(
        cfg.sketch.n_tables,
        cfg.sketch.cells_for(n),
        seed_rng.gen(),
    )
    .context("building hash sketch")?;
    hash_sketch.encode(&input_hashes)?;

    let moduli = stage_moduli(cfg.sample_base, cfg.shrink, cfg.stages);
    let mut stages = Vec::with_capacity(cfg.stages);
    for &modulus in &moduli {
        let expected = n / modulus as usize + 1;
        let mut stage = Sketch::kmers(
            cfg.sketch.n_tables,
            kmer_len,
            cfg.sketch.cells_for(expected),
            seed_rng.gen(),
        )
        .context("building stage sketch")?;
        stage.encode_sampled(&items, modulus)?;
        stages.push(stage);
    }

    let expected_residual = (n as f64 * cfg.compressed_fraction).ceil() as usize;
    let mut compressed = Sketch::kmers(
        cfg.sketch.n_tables,
        kmer_len,
        cfg.sketch.cells_for(expected_residual),
        seed_rng.gen(),
    )
    .context("building compressed sketch")?;
    compressed.encode(&items)?;

    let mut recovered: FxHashSet<u64> = hash_sketch.decode().into_iter().collect();
    let recovered_hashes = recovered.len() as u64;

    let mut reconstructed: Vec<KmerData> = Vec::new();
    let mut total_seeds = 0u64;
    for (stage, modulus) in stages.iter_mut().zip(moduli.iter()) {
        // What was already found would decode out of this stage again;
        // cancel it first so the stage only yields still-missing seeds.
        if !reconstructed.is_empty() {
            stage.encode_sampled(&reconstructed, *modulus)?;
        }
        let seeds = stage.decode();
        total_seeds += seeds.len() as u64;
        debug!(
            "hashset stage modulus {}: {} seeds, {} hashes left",
            modulus,
            seeds.len(),
            recovered.len()
        );
        let pumped = pump(&seeds, &mut recovered, hasher);
        reconstructed.extend(pumped);
    }

    let out = residual_pump(&mut compressed, reconstructed, &mut recovered, hasher)?;
    Ok(tally_reconstruction(
        &input_hashes,
        recovered_hashes,
        total_seeds,
        &out,
    ))
}

/// Mutation-detection pipeline: per pair, both versions' k-mers cancel in
/// one shared sketch except the windows straddling the mutation; those are
/// recovered and probed against the recovered h-mer hash difference by
/// single-nucleotide substitution.
pub fn run_mutation_pipeline(
    pairs: &[SequencePair],
    hasher: &KmerHasher,
    cfg: &MutationPipelineConfig,
) -> Result<MutationCounters> {
    ensure!(!pairs.is_empty(), "mutation pipeline needs input pairs");
    ensure!(
        cfg.hmer_len >= 4 && cfg.hmer_len <= cfg.kmer_len,
        "h-mer length must be in [4, kmer_len]"
    );
    ensure!(
        pairs.iter().all(|p| p.original.len() >= cfg.kmer_len),
        "sequences shorter than the k-mer length"
    );
    let k = cfg.kmer_len;
    let h = cfg.hmer_len;
    let mut seed_rng = StdRng::seed_from_u64(cfg.sketch.seed);

    let mut main_items: Vec<KmerData> = Vec::new();
    let mut hmer_hashes: Vec<u64> = Vec::new();
    let mut straddling = 0u64;
    for pair in pairs {
        let mutation_pos = pair.mutation_pos as u64;
        let offset = pair.original.base_offset();
        for mut kd in pair.original.kmers(k, hasher) {
            // Window start relative to the sequence, not the global index.
            let start = kd.meta.index - offset;
            let straddles = (start..start + k as u64).contains(&mutation_pos);
            if straddles {
                // 1-based offset; 0 stays reserved for "unannotated".
                kd.meta.mutation_index = mutation_pos - start + 1;
                kd.meta.mutation_value = pair.mutation_value.code() as u64;
                straddling += 1;
            }
            main_items.push(kd);
        }
        main_items.extend(pair.mutated.kmers(k, hasher));
        hmer_hashes.extend(pair.original.kmers(h, hasher).map(|kd| kd.hash));
        hmer_hashes.extend(pair.mutated.kmers(h, hasher).map(|kd| kd.hash));
    }
    // Both versions of every straddling window survive the cancellation.
    let expected_diff = (straddling * 2) as usize;
    let expected_hmer_diff = pairs.len() * 2 * h.min(pairs[0].original.len() - h + 1);

    let mut main_sketch = Sketch::kmers(
        cfg.sketch.n_tables,
        k,
        cfg.sketch.cells_for(expected_diff),
        seed_rng.gen(),
    )
    .context("building main k-mer sketch")?;
    main_sketch.encode(&main_items)?;

    let mut hmer_sketch = Sketch::hashes(
        cfg.sketch.n_tables,
        cfg.sketch.cells_for(expected_hmer_diff),
        seed_rng.gen(),
    )
    .context("building h-mer hash sketch")?;
    hmer_sketch.encode(&hmer_hashes)?;

    let recovered = main_sketch.decode();
    let hmer_set: FxHashSet<u64> = hmer_sketch.decode().into_iter().collect();
    debug!(
        "mutation pipeline: {} recovered diff k-mers, {} diff h-mer hashes",
        recovered.len(),
        hmer_set.len()
    );

    let mut counters = MutationCounters {
        pairs: pairs.len() as u64,
        straddling,
        recovered: recovered.len() as u64,
        ..MutationCounters::default()
    };
    for kd in &recovered {
        if kd.meta.mutation_index == 0 || kd.meta.mutation_index > k as u64 {
            continue;
        }
        counters.annotated += 1;
        let truth = (
            (kd.meta.mutation_index - 1) as usize,
            Nucleotide::from_code((kd.meta.mutation_value & 3) as u8),
        );
        match probe_substitution(kd, h, hasher, &hmer_set)? {
            Some(found) if found == truth => counters.matched += 1,
            Some(_) => counters.mismatched += 1,
            None => counters.unmatched += 1,
        }
    }
    Ok(counters)
}

/// Slide the h-mer window across a recovered k-mer (rolling the hash
/// between windows) and try every single-nucleotide substitution against
/// the recovered h-mer hash set. First hit wins.
fn probe_substitution(
    kd: &KmerData,
    hmer_len: usize,
    hasher: &KmerHasher,
    hmer_set: &FxHashSet<u64>,
) -> crate::Result<Option<(usize, Nucleotide)>> {
    let k = kd.kmer.len();
    let mut hmer = kd.kmer.subwindow(0, hmer_len)?;
    let mut hash = hasher.hash(&hmer);
    for window in 0..=k - hmer_len {
        if window > 0 {
            let incoming = kd.kmer.get(window + hmer_len - 1)?;
            hash = hasher.roll_forward(hash, &mut hmer, incoming);
        }
        for offset in 0..hmer_len {
            let current = hmer.get(offset)?;
            for n in Nucleotide::ALL {
                if n == current {
                    continue;
                }
                let candidate = hasher.substitution_hash(hash, &hmer, offset, n)?;
                if hmer_set.contains(&candidate) {
                    return Ok(Some((window + offset, n)));
                }
            }
        }
    }
    Ok(None)
}

fn stage_moduli(sample_base: u64, shrink: f64, stages: usize) -> Vec<u64> {
    (0..stages)
        .map(|i| ((sample_base as f64 * shrink.powi(i as i32)).ceil() as u64).max(1))
        .collect()
}

fn tally_reconstruction(
    input_hashes: &[u64],
    recovered_hashes: u64,
    seeds: u64,
    out: &[KmerData],
) -> ReconstructionCounters {
    let input: FxHashSet<u64> = input_hashes.iter().copied().collect();
    let out_set: FxHashSet<u64> = out.iter().map(|kd| kd.hash).collect();
    ReconstructionCounters {
        input: input.len() as u64,
        recovered_hashes,
        seeds,
        reconstructed: out_set.len() as u64,
        false_positives: out_set.difference(&input).count() as u64,
        missing: input.difference(&out_set).count() as u64,
    }
}
