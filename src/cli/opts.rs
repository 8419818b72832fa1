use clap::{value_parser, Args};

#[derive(Debug, Args)]
pub struct SequenceArgs {
    /// Number of random sequences (or sequence pairs) to generate [integer]
    #[clap(short = 'n', long, default_value = "200", value_parser = value_parser!(u64).range(1..), help_heading = "Input")]
    pub num_sequences: u64,

    /// Length of each generated sequence [integer]
    #[clap(short = 'l', long, default_value = "100", value_parser = value_parser!(u64).range(1..), help_heading = "Input")]
    pub seq_len: u64,

    /// K-mer length [integer]
    #[clap(short = 'k', long, default_value = "31", value_parser = value_parser!(u64).range(4..), help_heading = "Input")]
    pub kmer_len: u64,
}

#[derive(Debug, Args)]
pub struct SketchArgs {
    /// Number of tables per sketch [integer]
    #[clap(long, default_value = "3", value_parser = value_parser!(u64).range(1..), help_heading = "Sketch")]
    pub n_tables: u64,

    /// Cells per expected item [float]
    ///
    /// 1.3-1.5 is the working range for peeling; higher values trade
    /// space for decode reliability.
    #[clap(long, default_value = "1.5", help_heading = "Sketch")]
    pub overhead: f64,

    /// Master seed for hashers and generated data [integer]
    #[clap(short = 's', long, default_value = "0", help_heading = "Sketch")]
    pub seed: u64,
}

#[derive(Debug, Args)]
pub struct SamplingArgs {
    /// Seed-sampling modulus of the kmer pipeline [integer]
    #[clap(long, default_value = "15", value_parser = value_parser!(u64).range(1..), help_heading = "Sampling")]
    pub sample_modulus: u64,

    /// Number of sampled stages of the hashset-extended pipeline [integer]
    #[clap(long, default_value = "3", value_parser = value_parser!(u64).range(1..), help_heading = "Sampling")]
    pub stages: u64,

    /// Stage modulus growth factor [float]
    #[clap(long, default_value = "1.5", help_heading = "Sampling")]
    pub shrink: f64,

    /// Residual sketch size as a fraction of the input count [float]
    #[clap(long, default_value = "0.3", help_heading = "Sampling")]
    pub compressed_fraction: f64,

    /// Probe window length of the mutation pipeline; defaults to half the
    /// k-mer length when omitted [integer]
    #[clap(long, value_parser = value_parser!(u64).range(4..), help_heading = "Sampling")]
    pub hmer_len: Option<u64>,
}
