use denovoseek::vocab::PROTON;
use denovoseek::{
    BeamSearchDecoder,
    DecodeDirection,
    DecoderConfig,
    IdentityEncoder,
    NextTokenScorer,
    Precursor,
    ReplayScorer,
    Spectrum,
    TokenId,
    VocabSource,
};

fn two_residue_config() -> DecoderConfig {
    DecoderConfig {
        vocab: VocabSource::Custom {
            residues: vec![
                ("A".to_string(), 71.037113805),
                ("G".to_string(), 57.021463735),
            ],
        },
        max_length: 10,
        max_charge: 3,
        precursor_mass_tol_ppm: 50.0,
        isotope_error_range: (0, 1),
        min_peptide_len: 2,
        n_beams: 1,
        top_match: 1,
        direction: DecodeDirection::Forward,
    }
}

/// Score rows as log-probabilities so the softmax in the scoring path
/// recovers the intended per-token probabilities exactly.
fn ln_rows(rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
    rows.iter()
        .map(|row| row.iter().map(|p| p.ln()).collect())
        .collect()
}

fn precursor_at(mz: f64, charge: u8) -> Precursor {
    Precursor {
        mass: (mz - PROTON) * f64::from(charge),
        charge,
        mz,
    }
}

/// Greedy decode where the running peptide hits the precursor mass: the beam
/// is finished by the mass fit before a stop token is ever predicted, so the
/// missing stop contributes an explicit 0.0 residue score.
#[test]
fn test_greedy_decode_finishes_on_mass_fit() {
    let decoder = BeamSearchDecoder::new(two_residue_config()).unwrap();
    let vocab = decoder.vocab();
    let a = vocab.token_of("A").unwrap();
    let g = vocab.token_of("G").unwrap();

    // pad, A, G, stop
    let table = ln_rows(&[
        vec![0.02, 0.90, 0.05, 0.03],
        vec![0.05, 0.10, 0.80, 0.05],
        vec![0.01, 0.02, 0.02, 0.95],
    ]);
    let mz = vocab.peptide_mz(&[a, g], None, 2).unwrap();
    let precursor = precursor_at(mz, 2);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert_eq!(matches.len(), 1);
    let top = &matches[0];
    assert_eq!(top.peptide, "AG");

    let expected_score = (0.9 + 0.8 + 0.0) / 3.0;
    assert!((top.peptide_score - expected_score).abs() < 1e-4);
    assert_eq!(top.residue_scores.len(), 2);
    assert!((top.residue_scores[0] - (0.9 + expected_score) / 2.0).abs() < 1e-4);
    assert!((top.residue_scores[1] - (0.8 + expected_score) / 2.0).abs() < 1e-4);
}

/// Greedy decode of A, G, stop against a precursor the peptide can never
/// reach: the stop token finishes the beam and the precursor-fit penalty
/// lowers the peptide score by 1.
#[test]
fn test_greedy_decode_finishes_on_stop_with_penalty() {
    let decoder = BeamSearchDecoder::new(two_residue_config()).unwrap();

    let table = ln_rows(&[
        vec![0.02, 0.90, 0.05, 0.03],
        vec![0.05, 0.10, 0.80, 0.05],
        vec![0.01, 0.02, 0.02, 0.95],
    ]);
    // Far above anything a 2-residue peptide can weigh.
    let precursor = precursor_at(500.0, 1);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert_eq!(matches.len(), 1);
    let top = &matches[0];
    assert_eq!(top.peptide, "AG");

    let expected_score = (0.9 + 0.8 + 0.95) / 3.0 - 1.0;
    assert!((top.peptide_score - expected_score).abs() < 1e-4);
}

/// A beam that exceeds the precursor tolerance without a stop token and
/// without any negative-mass residue available is force-finished and cached
/// with the penalty applied.
#[test]
fn test_force_finish_on_uncorrectable_mass_excess() {
    let config = DecoderConfig {
        min_peptide_len: 1,
        ..two_residue_config()
    };
    let decoder = BeamSearchDecoder::new(config).unwrap();
    let vocab = decoder.vocab();
    let g = vocab.token_of("G").unwrap();

    // One row repeated forever: always G.
    let table = ln_rows(&[vec![0.05, 0.05, 0.85, 0.05]]);
    // Three glycines fall 5 Da short, four overshoot by ~52 Da.
    let mz = vocab.peptide_mz(&[g, g, g], None, 1).unwrap() + 5.0;
    let precursor = precursor_at(mz, 1);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert_eq!(matches.len(), 1);
    let top = &matches[0];
    assert_eq!(top.peptide, "GGGG");
    assert_eq!(top.residue_scores.len(), 4);

    let expected_score = (4.0 * 0.85 + 0.0) / 5.0 - 1.0;
    assert!((top.peptide_score - expected_score).abs() < 1e-4);
}

/// A finished peptide below the minimum length is discarded, never cached.
#[test]
fn test_short_peptide_is_discarded() {
    let config = DecoderConfig {
        min_peptide_len: 6,
        ..two_residue_config()
    };
    let decoder = BeamSearchDecoder::new(config).unwrap();

    // A, G, A, stop: a 3-residue candidate against min_peptide_len = 6.
    let table = ln_rows(&[
        vec![0.02, 0.90, 0.05, 0.03],
        vec![0.05, 0.10, 0.80, 0.05],
        vec![0.02, 0.90, 0.05, 0.03],
        vec![0.01, 0.02, 0.02, 0.95],
    ]);
    let precursor = precursor_at(500.0, 1);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert!(matches.is_empty());
}

fn three_beam_config() -> DecoderConfig {
    DecoderConfig {
        min_peptide_len: 1,
        n_beams: 3,
        top_match: 2,
        ..two_residue_config()
    }
}

fn three_beam_table() -> Vec<Vec<f32>> {
    // Seeds A, G and the stop token; afterwards the stop token dominates.
    ln_rows(&[
        vec![0.05, 0.50, 0.30, 0.15],
        vec![0.02, 0.04, 0.04, 0.90],
    ])
}

/// Multi-beam run: the stop-seeded beam dies on the minimum length, the
/// other slots are recycled, and the result list respects `top_match` and
/// descending score order.
#[test]
fn test_multi_beam_top_matches_sorted() {
    let decoder = BeamSearchDecoder::new(three_beam_config()).unwrap();
    let precursor = precursor_at(500.0, 1);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &three_beam_table(), &precursor)
        .unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].peptide, "A");
    assert_eq!(matches[1].peptide, "G");
    assert!(matches[0].peptide_score >= matches[1].peptide_score);

    let expected_a = (0.5 + 0.9) / 2.0 - 1.0;
    let expected_g = (0.3 + 0.9) / 2.0 - 1.0;
    assert!((matches[0].peptide_score - expected_a).abs() < 1e-4);
    assert!((matches[1].peptide_score - expected_g).abs() < 1e-4);
}

/// Identical inputs and a deterministic scorer give identical outputs.
#[test]
fn test_decode_is_idempotent() {
    let decoder = BeamSearchDecoder::new(three_beam_config()).unwrap();
    let precursor = precursor_at(500.0, 1);
    let table = three_beam_table();

    let first = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    let second = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert_eq!(first, second);
}

/// Under reverse decoding the emission order is C->N, so the rendered
/// peptide string is flipped.
#[test]
fn test_reverse_direction_renders_n_to_c() {
    let config = DecoderConfig {
        direction: DecodeDirection::Reverse,
        ..two_residue_config()
    };
    let decoder = BeamSearchDecoder::new(config).unwrap();
    let vocab = decoder.vocab();
    let a = vocab.token_of("A").unwrap();
    let g = vocab.token_of("G").unwrap();

    let table = ln_rows(&[
        vec![0.02, 0.90, 0.05, 0.03],
        vec![0.05, 0.10, 0.80, 0.05],
    ]);
    let mz = vocab.peptide_mz(&[a, g], None, 2).unwrap();
    let precursor = precursor_at(mz, 2);

    let matches = decoder
        .decode_spectrum(&ReplayScorer, &table, &precursor)
        .unwrap();
    assert_eq!(matches[0].peptide, "GA");
}

/// Fixed-table scorer that takes the raw spectrum as its encoded input, for
/// exercising the encoder + batch path.
struct FixedScorer {
    table: Vec<Vec<f32>>,
}

impl NextTokenScorer for FixedScorer {
    type Encoded = Spectrum;

    fn score(
        &self,
        prior: Option<&[TokenId]>,
        precursor: &Precursor,
        _encoded: &Spectrum,
    ) -> Vec<Vec<f32>> {
        ReplayScorer.score(prior, precursor, &self.table)
    }
}

#[test]
fn test_decode_batch_parallel() {
    let decoder = BeamSearchDecoder::new(two_residue_config()).unwrap();
    let scorer = FixedScorer {
        table: ln_rows(&[
            vec![0.02, 0.90, 0.05, 0.03],
            vec![0.05, 0.10, 0.80, 0.05],
            vec![0.01, 0.02, 0.02, 0.95],
        ]),
    };
    let spectra = vec![Spectrum::default(), Spectrum::default()];
    let precursors = vec![precursor_at(500.0, 1), precursor_at(500.0, 1)];

    let results = decoder
        .decode_batch(&IdentityEncoder, &scorer, &spectra, &precursors)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0][0].peptide, "AG");

    let err = decoder
        .decode_batch(&IdentityEncoder, &scorer, &spectra, &precursors[..1])
        .unwrap_err();
    assert!(matches!(
        err,
        denovoseek::errors::DecodeError::MismatchedBatch { .. }
    ));
}
