use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kmerpump::cli::counters::{MutationCounters, ReconstructionCounters};
use kmerpump::cli::opts::{SamplingArgs, SequenceArgs, SketchArgs};
use kmerpump::kmerpump::item::KmerData;
use kmerpump::kmerpump::pipeline::{
    run_hashset_pipeline, run_kmer_pipeline, run_mutation_pipeline, HashsetPipelineConfig,
    KmerPipelineConfig, MutationPipelineConfig, SketchParams,
};
use kmerpump::kmerpump::sequence::{Sequence, SequencePair};
use kmerpump::kmerpump::tabulation::KmerHasher;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pipeline {
    /// Hash sketch + one sampled seed sketch + iterated pump
    Kmer,
    /// Staged sampled sketches + residual pass
    HashsetExtended,
    /// Symmetric-difference sketches + substitution probe
    Mutation,
}

/// Command-line options for the reconstruction experiment driver
#[derive(Parser)]
#[command(
    name = "kmerpump",
    about = "Reconstruct k-mer sets from invertible sketches",
    long_about = "Reconstruct k-mer sets from invertible sketches.


EXAMPLES:
    // Kmer pipeline over 200 random sequences, 4 threads
    $ kmerpump -p kmer -n 200 -l 100 -k 31 -t 4

    // Staged pipeline sweep of 10 independent seeds, results to TSV
    $ kmerpump -p hashset-extended --runs 10 -o results/
    ",
    version = "0.1.0"
)]
struct Cli {
    /// Which pipeline to run
    #[clap(short = 'p', long, value_enum, help_heading = "Core")]
    pub pipeline: Pipeline,

    /// Number of independent runs; run i uses seed + i [integer]
    #[clap(long, default_value = "1", help_heading = "Core")]
    pub runs: u64,

    /// Number of threads to use [integer]
    #[clap(short = 't', long, default_value = "1", help_heading = "Core")]
    pub n_threads: usize,

    /// Optional output directory for per-run TSV results [path]
    #[clap(short = 'o', long, value_parser, help_heading = "Core")]
    pub output_dir: Option<PathBuf>,

    #[clap(flatten)]
    pub sequences: SequenceArgs,

    #[clap(flatten)]
    pub sketch: SketchArgs,

    #[clap(flatten)]
    pub sampling: SamplingArgs,
}

enum RunResult {
    Reconstruction(ReconstructionCounters),
    Mutation(MutationCounters),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
    std::process::exit(0);
}

fn run() -> Result<()> {
    let start_time = Instant::now();
    let opt = Cli::parse();

    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("initializing logger")?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.n_threads)
        .build_global()
        .context("building Rayon thread pool")?;

    let pb = Arc::new(ProgressBar::new(opt.runs));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("       {bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    info!(
        "Start: {} runs of the {:?} pipeline",
        opt.runs, opt.pipeline
    );
    pb.set_position(0);

    let results: Vec<RunResult> = (0..opt.runs)
        .into_par_iter()
        .map(|run_idx| -> Result<RunResult> {
            let out = run_once(&opt, opt.sketch.seed + run_idx)?;
            pb.inc(1);
            Ok(out)
        })
        .collect::<Result<_>>()?; // short-circuits on the first Err

    pb.finish_with_message("| Finished runs");

    report(&opt, &results)?;

    let elapsed = start_time.elapsed();
    info!("Elapsed time: {:.2?}", elapsed);
    Ok(())
}

/* ---------- per-run experiment -------------------------------------- */

fn run_once(opt: &Cli, seed: u64) -> Result<RunResult> {
    let hasher = KmerHasher::new(seed);
    let sketch = SketchParams {
        n_tables: opt.sketch.n_tables as usize,
        overhead: opt.sketch.overhead,
        seed,
    };
    let k = opt.sequences.kmer_len as usize;
    let len = opt.sequences.seq_len as usize;
    let mut rng = StdRng::seed_from_u64(seed);

    match opt.pipeline {
        Pipeline::Kmer => {
            let items = generate_items(&opt.sequences, &hasher, &mut rng, false)?;
            let cfg = KmerPipelineConfig {
                sample_modulus: opt.sampling.sample_modulus,
                compressed_fraction: opt.sampling.compressed_fraction,
                sketch,
            };
            Ok(RunResult::Reconstruction(run_kmer_pipeline(
                &items, &hasher, &cfg,
            )?))
        }
        Pipeline::HashsetExtended => {
            let items = generate_items(&opt.sequences, &hasher, &mut rng, true)?;
            let cfg = HashsetPipelineConfig {
                stages: opt.sampling.stages as usize,
                sample_base: opt.sampling.sample_modulus,
                shrink: opt.sampling.shrink,
                compressed_fraction: opt.sampling.compressed_fraction,
                sketch,
            };
            Ok(RunResult::Reconstruction(run_hashset_pipeline(
                &items, &hasher, &cfg,
            )?))
        }
        Pipeline::Mutation => {
            let mut pairs = Vec::with_capacity(opt.sequences.num_sequences as usize);
            for i in 0..opt.sequences.num_sequences {
                pairs.push(SequencePair::random(len, i * len as u64, i, &mut rng)?);
            }
            let cfg = MutationPipelineConfig {
                kmer_len: k,
                hmer_len: opt.sampling.hmer_len.unwrap_or(opt.sequences.kmer_len / 2) as usize,
                sketch,
            };
            Ok(RunResult::Mutation(run_mutation_pipeline(
                &pairs, &hasher, &cfg,
            )?))
        }
    }
}

/// K-mers of `num_sequences` random sequences; double-sequence pairs when
/// `paired` (the hashset-extended pipeline input of the sweeps).
fn generate_items(
    args: &SequenceArgs,
    hasher: &KmerHasher,
    rng: &mut StdRng,
    paired: bool,
) -> Result<Vec<KmerData>> {
    let len = args.seq_len as usize;
    let k = args.kmer_len as usize;
    let mut items = Vec::new();
    for i in 0..args.num_sequences {
        let offset = i * 2 * len as u64;
        if paired {
            let pair = SequencePair::random(len, offset, i, rng)?;
            items.extend(pair.original.kmers(k, hasher));
            items.extend(pair.mutated.kmers(k, hasher));
        } else {
            let seq = Sequence::random(len, offset, i, rng)?;
            items.extend(seq.kmers(k, hasher));
        }
    }
    Ok(items)
}

/* ---------- reporting ------------------------------------------------ */

fn report(opt: &Cli, results: &[RunResult]) -> Result<()> {
    let mut recon_total = ReconstructionCounters::default();
    let mut mut_total = MutationCounters::default();
    for r in results {
        match r {
            RunResult::Reconstruction(c) => recon_total += *c,
            RunResult::Mutation(c) => mut_total += *c,
        }
    }
    match opt.pipeline {
        Pipeline::Kmer | Pipeline::HashsetExtended => {
            info!(
                "Totals over {} run(s): input={} recovered_hashes={} seeds={} \
                 reconstructed={} false_positives={} missing={}",
                results.len(),
                recon_total.input,
                recon_total.recovered_hashes,
                recon_total.seeds,
                recon_total.reconstructed,
                recon_total.false_positives,
                recon_total.missing
            );
        }
        Pipeline::Mutation => {
            info!(
                "Totals over {} run(s): pairs={} straddling={} recovered={} \
                 annotated={} matched={} mismatched={} unmatched={}",
                results.len(),
                mut_total.pairs,
                mut_total.straddling,
                mut_total.recovered,
                mut_total.annotated,
                mut_total.matched,
                mut_total.mismatched,
                mut_total.unmatched
            );
        }
    }

    if let Some(dir) = &opt.output_dir {
        create_dir_all(dir).context("Cannot create output_dir")?;
        let path = dir.join("runs.tsv");
        let mut w = BufWriter::new(File::create(&path).context("Create tsv fail")?);
        match opt.pipeline {
            Pipeline::Kmer | Pipeline::HashsetExtended => {
                writeln!(
                    w,
                    "run\tinput\trecovered_hashes\tseeds\treconstructed\tfalse_positives\tmissing"
                )?;
                for (i, r) in results.iter().enumerate() {
                    if let RunResult::Reconstruction(c) = r {
                        writeln!(
                            w,
                            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                            i,
                            c.input,
                            c.recovered_hashes,
                            c.seeds,
                            c.reconstructed,
                            c.false_positives,
                            c.missing
                        )?;
                    }
                }
            }
            Pipeline::Mutation => {
                writeln!(
                    w,
                    "run\tpairs\tstraddling\trecovered\tannotated\tmatched\tmismatched\tunmatched"
                )?;
                for (i, r) in results.iter().enumerate() {
                    if let RunResult::Mutation(c) = r {
                        writeln!(
                            w,
                            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                            i,
                            c.pairs,
                            c.straddling,
                            c.recovered,
                            c.annotated,
                            c.matched,
                            c.mismatched,
                            c.unmatched
                        )?;
                    }
                }
            }
        }
        info!("Wrote per-run results to {:?}", path);
    }
    Ok(())
}
