use kmerpump::kmerpump::kmer::{Kmer, Nucleotide};
use kmerpump::kmerpump::sequence::Sequence;
use kmerpump::kmerpump::tabulation::KmerHasher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bases(len: usize, rng: &mut StdRng) -> Vec<Nucleotide> {
    (0..len)
        .map(|_| Nucleotide::from_code(rng.gen_range(0..4)))
        .collect()
}

/* --------------------------------------------------------------------- */
/*  rolling == recompute                                                 */
/* --------------------------------------------------------------------- */

#[test]
fn forward_roll_matches_scratch_hash() {
    let hasher = KmerHasher::new(0);
    let mut rng = StdRng::seed_from_u64(11);
    for k in [4, 5, 8, 16, 31, 33] {
        let bases = random_bases(k + 20, &mut rng);
        let mut kmer = Kmer::from_nucleotides(&bases[..k]).unwrap();
        let mut hash = hasher.hash(&kmer);
        for start in 1..=20 {
            hash = hasher.roll_forward(hash, &mut kmer, bases[start + k - 1]);
            let fresh = Kmer::from_nucleotides(&bases[start..start + k]).unwrap();
            assert_eq!(kmer, fresh, "k={k} start={start}");
            assert_eq!(hash, hasher.hash(&fresh), "k={k} start={start}");
        }
    }
}

#[test]
fn backward_roll_matches_scratch_hash() {
    let hasher = KmerHasher::new(0);
    let mut rng = StdRng::seed_from_u64(12);
    for k in [4, 5, 8, 16, 31, 33] {
        let bases = random_bases(k + 20, &mut rng);
        // Start at the last window and walk back to the first.
        let mut kmer = Kmer::from_nucleotides(&bases[20..20 + k]).unwrap();
        let mut hash = hasher.hash(&kmer);
        for start in (0..20).rev() {
            hash = hasher.roll_backward(hash, &mut kmer, bases[start]);
            let fresh = Kmer::from_nucleotides(&bases[start..start + k]).unwrap();
            assert_eq!(kmer, fresh, "k={k} start={start}");
            assert_eq!(hash, hasher.hash(&fresh), "k={k} start={start}");
        }
    }
}

#[test]
fn forward_then_backward_restores_the_hash() {
    let hasher = KmerHasher::new(5);
    let mut rng = StdRng::seed_from_u64(13);
    let bases = random_bases(32, &mut rng);
    let kmer0 = Kmer::from_nucleotides(&bases[..31]).unwrap();
    let hash0 = hasher.hash(&kmer0);

    let mut kmer = kmer0.clone();
    let dropped = kmer.get(0).unwrap();
    let hash1 = hasher.roll_forward(hash0, &mut kmer, bases[31]);
    let hash2 = hasher.roll_backward(hash1, &mut kmer, dropped);
    assert_eq!(kmer, kmer0);
    assert_eq!(hash2, hash0);
}

#[test]
fn substitution_matches_scratch_hash_at_every_position() {
    let hasher = KmerHasher::new(0);
    let mut rng = StdRng::seed_from_u64(14);
    for k in [4, 6, 15, 31] {
        let bases = random_bases(k, &mut rng);
        let kmer = Kmer::from_nucleotides(&bases).unwrap();
        let hash = hasher.hash(&kmer);
        for pos in 0..k {
            for n in Nucleotide::ALL {
                let rolled = hasher.substitution_hash(hash, &kmer, pos, n).unwrap();
                let mut edited = kmer.clone();
                edited.set(pos, n).unwrap();
                assert_eq!(rolled, hasher.hash(&edited), "k={k} pos={pos} n={n:?}");
            }
        }
    }
}

#[test]
fn substitution_with_same_base_is_identity() {
    let hasher = KmerHasher::new(0);
    let kmer = Kmer::from_str("ACGTACGTACGT").unwrap();
    let hash = hasher.hash(&kmer);
    for pos in 0..12 {
        let same = kmer.get(pos).unwrap();
        assert_eq!(
            hasher.substitution_hash(hash, &kmer, pos, same).unwrap(),
            hash
        );
    }
    assert!(hasher
        .substitution_hash(hash, &kmer, 12, Nucleotide::A)
        .is_err());
}

/* --------------------------------------------------------------------- */
/*  hardcoded scenario                                                   */
/* --------------------------------------------------------------------- */

#[test]
fn rolling_acgt_to_cgta() {
    // s = "ACGTACGTAC", L = 4: rolling "ACGT" forward by the next 'A'
    // must equal the from-scratch hash of "CGTA".
    let hasher = KmerHasher::new(0);
    let mut kmer = Kmer::from_str("ACGT").unwrap();
    let hash = hasher.hash(&kmer);
    let rolled = hasher.roll_forward(hash, &mut kmer, Nucleotide::A);
    assert_eq!(kmer.to_string(), "CGTA");
    assert_eq!(rolled, hasher.hash(&Kmer::from_str("CGTA").unwrap()));
}

/* --------------------------------------------------------------------- */
/*  seeding + stream consistency                                         */
/* --------------------------------------------------------------------- */

#[test]
fn same_seed_same_hash_different_seed_different_hash() {
    let kmer = Kmer::from_str("ACGGTTACGTACCGTAGGATACGGTTACGTA").unwrap();
    let a = KmerHasher::new(17).hash(&kmer);
    let b = KmerHasher::new(17).hash(&kmer);
    let c = KmerHasher::new(18).hash(&kmer);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn kmer_stream_hashes_match_scratch_hashes() {
    let hasher = KmerHasher::new(0);
    let mut rng = StdRng::seed_from_u64(15);
    let seq = Sequence::random(80, 0, 0, &mut rng).unwrap();
    for kd in seq.kmers(21, &hasher) {
        assert_eq!(kd.hash, hasher.hash(&kd.kmer), "window {}", kd.meta.index);
    }
}
