use kmerpump::kmerpump::kmer::{Kmer, Nucleotide};
use kmerpump::SketchError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_dna(len: usize, rng: &mut StdRng) -> String {
    (0..len)
        .map(|_| Nucleotide::from_code(rng.gen_range(0..4)).to_char())
        .collect()
}

/* --------------------------------------------------------------------- */
/*  round trips                                                          */
/* --------------------------------------------------------------------- */

#[test]
fn from_str_to_string_roundtrip_all_lengths() {
    let mut rng = StdRng::seed_from_u64(1);
    for len in 1..=64 {
        let s = random_dna(len, &mut rng);
        let kmer = Kmer::from_str(&s).unwrap();
        assert_eq!(kmer.to_string(), s, "length {len}");
        assert_eq!(kmer.len(), len);
        assert_eq!(kmer.bytes().len(), (2 * len + 7) / 8);
    }
}

#[test]
fn trailing_bits_are_always_zero() {
    let mut rng = StdRng::seed_from_u64(2);
    for len in 1..=64 {
        let s = random_dna(len, &mut rng);
        let kmer = Kmer::from_str(&s).unwrap();
        let used = 2 * len - 8 * (kmer.bytes().len() - 1);
        let tail = kmer.bytes()[kmer.bytes().len() - 1] & !(0xFFu8 << (8 - used) as u32);
        assert_eq!(tail, 0, "length {len}");
    }
}

#[test]
fn from_nucleotides_matches_from_str() {
    let bases = [Nucleotide::T, Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::G];
    let a = Kmer::from_nucleotides(&bases).unwrap();
    let b = Kmer::from_str("TACGG").unwrap();
    assert_eq!(a, b);
}

#[test]
fn get_and_set_are_positional() {
    let mut kmer = Kmer::from_str("AAAAAAAAA").unwrap();
    kmer.set(0, Nucleotide::T).unwrap();
    kmer.set(4, Nucleotide::G).unwrap();
    kmer.set(8, Nucleotide::C).unwrap();
    assert_eq!(kmer.to_string(), "TAAAGAAAC");
    assert_eq!(kmer.get(0).unwrap(), Nucleotide::T);
    assert_eq!(kmer.get(4).unwrap(), Nucleotide::G);
    assert_eq!(kmer.get(8).unwrap(), Nucleotide::C);
    assert_eq!(kmer.get(1).unwrap(), Nucleotide::A);
}

/* --------------------------------------------------------------------- */
/*  shifts                                                               */
/* --------------------------------------------------------------------- */

#[test]
fn shift_left_and_right_hardcoded() {
    // Both directions, from the same starting point.
    let mut left = Kmer::from_str("ACGTACGT").unwrap();
    left.shift_left(Nucleotide::A);
    assert_eq!(left.to_string(), "CGTACGTA");

    let mut right = Kmer::from_str("ACGTACGT").unwrap();
    right.shift_right(Nucleotide::T);
    assert_eq!(right.to_string(), "TACGTACG");
}

#[test]
fn shifts_match_string_semantics_on_random_kmers() {
    let mut rng = StdRng::seed_from_u64(3);
    for len in [1, 2, 3, 4, 5, 7, 8, 9, 16, 31, 32, 33, 64] {
        let s = random_dna(len, &mut rng);
        let n = Nucleotide::from_code(rng.gen_range(0..4));

        let mut left = Kmer::from_str(&s).unwrap();
        left.shift_left(n);
        let expected_left = format!("{}{}", &s[1..], n.to_char());
        assert_eq!(left.to_string(), expected_left, "shift_left len {len}");

        let mut right = Kmer::from_str(&s).unwrap();
        right.shift_right(n);
        let expected_right = format!("{}{}", n.to_char(), &s[..len - 1]);
        assert_eq!(right.to_string(), expected_right, "shift_right len {len}");
    }
}

#[test]
fn repeated_shifts_walk_a_sequence() {
    let source = "ACGGTTACGTACCGTA";
    let k = 6;
    let mut kmer = Kmer::from_str(&source[..k]).unwrap();
    for start in 1..=source.len() - k {
        let incoming = Nucleotide::from_char(source.as_bytes()[start + k - 1] as char).unwrap();
        kmer.shift_left(incoming);
        assert_eq!(kmer.to_string(), &source[start..start + k]);
    }
}

/* --------------------------------------------------------------------- */
/*  xor algebra                                                          */
/* --------------------------------------------------------------------- */

#[test]
fn xor_is_self_inverse() {
    let mut rng = StdRng::seed_from_u64(4);
    for len in [1, 4, 8, 31, 64] {
        let a = Kmer::from_str(&random_dna(len, &mut rng)).unwrap();
        let b = Kmer::from_str(&random_dna(len, &mut rng)).unwrap();
        assert_eq!(a.xor(&b).unwrap().xor(&b).unwrap(), a);
        assert_eq!(a.xor(&b).unwrap(), b.xor(&a).unwrap());
    }
}

#[test]
fn xor_with_self_is_all_zero() {
    let a = Kmer::from_str("GATTACA").unwrap();
    let zero = a.xor(&a).unwrap();
    assert_eq!(zero, Kmer::new(7).unwrap());
    assert_eq!(zero.to_string(), "AAAAAAA");
}

#[test]
fn xor_rejects_unequal_lengths() {
    let a = Kmer::from_str("ACGT").unwrap();
    let b = Kmer::from_str("ACGTT").unwrap();
    assert_eq!(
        a.xor(&b),
        Err(SketchError::LengthMismatch { left: 4, right: 5 })
    );
}

/* --------------------------------------------------------------------- */
/*  subwindow + errors                                                   */
/* --------------------------------------------------------------------- */

#[test]
fn subwindow_matches_string_slice() {
    let s = "ACGGTTACGTACCGTAGGAT";
    let kmer = Kmer::from_str(s).unwrap();
    for start in [0, 3, 5, 12] {
        let sub = kmer.subwindow(start, 7).unwrap();
        assert_eq!(sub.to_string(), &s[start..start + 7]);
    }
    assert!(kmer.subwindow(15, 7).is_err());
    assert!(kmer.subwindow(0, 0).is_err());
}

#[test]
fn construction_rejects_bad_input() {
    assert!(matches!(Kmer::new(0), Err(SketchError::InvalidInput(_))));
    assert!(matches!(
        Kmer::from_str(""),
        Err(SketchError::InvalidInput(_))
    ));
    assert!(matches!(
        Kmer::from_str("ACGN"),
        Err(SketchError::InvalidInput(_))
    ));
}

#[test]
fn out_of_bounds_positions_are_rejected() {
    let mut kmer = Kmer::from_str("ACGT").unwrap();
    assert_eq!(
        kmer.get(4),
        Err(SketchError::OutOfBounds { pos: 4, len: 4 })
    );
    assert_eq!(
        kmer.set(9, Nucleotide::A),
        Err(SketchError::OutOfBounds { pos: 9, len: 4 })
    );
}
