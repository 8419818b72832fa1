#[derive(Debug, Default, Clone, Copy)]
pub struct ReconstructionCounters {
    pub input: u64,
    pub recovered_hashes: u64,
    pub seeds: u64,
    pub reconstructed: u64,
    pub false_positives: u64,
    pub missing: u64,
}

impl std::ops::AddAssign for ReconstructionCounters {
    fn add_assign(&mut self, other: Self) {
        self.input += other.input;
        self.recovered_hashes += other.recovered_hashes;
        self.seeds += other.seeds;
        self.reconstructed += other.reconstructed;
        self.false_positives += other.false_positives;
        self.missing += other.missing;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MutationCounters {
    pub pairs: u64,
    pub straddling: u64,
    pub recovered: u64,
    pub annotated: u64,
    pub matched: u64,
    pub mismatched: u64,
    pub unmatched: u64,
}

impl std::ops::AddAssign for MutationCounters {
    fn add_assign(&mut self, other: Self) {
        self.pairs += other.pairs;
        self.straddling += other.straddling;
        self.recovered += other.recovered;
        self.annotated += other.annotated;
        self.matched += other.matched;
        self.mismatched += other.mismatched;
        self.unmatched += other.unmatched;
    }
}
