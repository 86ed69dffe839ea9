use super::beam::{
    Beam,
    FinishRules,
};
use super::cache::{
    finalize_candidate,
    SpectrumCache,
};
use super::scorer::{
    NextTokenScorer,
    SpectrumEncoder,
};
use crate::config::DecoderConfig;
use crate::errors::{
    DecodeError,
    Result,
};
use crate::models::{
    PeptideMatch,
    Precursor,
    Spectrum,
};
use crate::vocab::{
    ResidueVocab,
    TokenId,
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

/// One candidate continuation in the per-step (beam x vocabulary) selection.
#[derive(Debug, Clone, Copy)]
struct Continuation {
    /// Nan-aware running mean of the realized token scores.
    mean: f32,
    slot: usize,
    token: TokenId,
}

/// Constrained beam-search decoder over an external next-token scorer.
///
/// Built once from a validated configuration; the vocabulary and its derived
/// classification sets are immutable afterwards. Spectra are decoded
/// independently, so batches parallelize with no shared mutable state.
#[derive(Debug)]
pub struct BeamSearchDecoder {
    config: DecoderConfig,
    vocab: ResidueVocab,
}

impl BeamSearchDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        let vocab = ResidueVocab::from_source(&config.vocab)?;
        config.validate(vocab.len())?;
        Ok(Self { config, vocab })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn vocab(&self) -> &ResidueVocab {
        &self.vocab
    }

    /// Decode one spectrum into up to `top_match` peptide predictions,
    /// highest peptide score first. An empty list means every beam was
    /// discarded.
    pub fn decode_spectrum<S: NextTokenScorer>(
        &self,
        scorer: &S,
        encoded: &S::Encoded,
        precursor: &Precursor,
    ) -> Result<Vec<PeptideMatch>> {
        self.decode_spectrum_with_deadline(scorer, encoded, precursor, None)
    }

    /// Same as [`decode_spectrum`](Self::decode_spectrum), but gives up on
    /// still-active beams once the deadline passes. The check happens once
    /// per step, so already-finished beams are still reported.
    pub fn decode_spectrum_with_deadline<S: NextTokenScorer>(
        &self,
        scorer: &S,
        encoded: &S::Encoded,
        precursor: &Precursor,
        deadline: Option<Instant>,
    ) -> Result<Vec<PeptideMatch>> {
        if precursor.charge < 1 || precursor.charge > self.config.max_charge {
            return Err(DecodeError::InvalidPrecursor {
                charge: precursor.charge,
                max_charge: self.config.max_charge,
            });
        }

        let n_beams = self.config.n_beams;
        let vocab_len = self.vocab.len();
        let stop = self.vocab.stop_token();
        let rules = FinishRules {
            vocab: &self.vocab,
            tol_ppm: self.config.precursor_mass_tol_ppm,
            isotope_range: self.config.isotope_error_range,
            min_peptide_len: self.config.min_peptide_len,
        };
        let mut cache = SpectrumCache::new(n_beams);

        // Seed the beams from the first distribution.
        let first = scorer.score(None, precursor, encoded);
        self.check_rows(&first, 1)?;
        let mut order: Vec<TokenId> = (0..vocab_len).collect();
        order.sort_by(|&a, &b| {
            finite_or_min(first[0][b])
                .total_cmp(&finite_or_min(first[0][a]))
                .then(a.cmp(&b))
        });
        let mut slots: Vec<Beam> = order[..n_beams]
            .iter()
            .map(|&t| Beam::seeded(t, first[0].clone()))
            .collect();

        for step in 0..self.config.max_length {
            // Classify every active beam with a single consistent view of
            // this step's scores, diverting finished ones into the cache.
            for beam in slots.iter_mut().filter(|b| b.active) {
                let outcome = rules.classify(beam, step, precursor);
                if outcome.finished && !outcome.discarded {
                    let (peptide, residue_scores, peptide_score) = finalize_candidate(
                        &beam.tokens,
                        &beam.scores,
                        stop,
                        outcome.fits_precursor,
                    );
                    cache.admit(peptide_score, residue_scores, peptide);
                }
                if outcome.finished || outcome.discarded {
                    beam.active = false;
                }
            }

            let n_active = slots.iter().filter(|b| b.active).count();
            if n_active == 0 {
                debug!(step, "all beams finished or discarded");
                break;
            }
            if step + 1 == self.config.max_length {
                debug!("maximum peptide length reached with active beams");
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!(step, n_active, "decode deadline hit, dropping active beams");
                    break;
                }
            }

            // Refresh the score rows of every active beam.
            for beam in slots.iter_mut().filter(|b| b.active) {
                let rows = scorer.score(Some(&beam.tokens), precursor, encoded);
                self.check_rows(&rows, beam.tokens.len() + 1)?;
                beam.scores = rows;
            }

            // Joint (beam x vocabulary) top-k over the running mean score.
            // Pad is not a valid continuation for an active beam; slots whose
            // beams stopped advancing are recycled for the next-best
            // continuations.
            let mut continuations: Vec<Continuation> =
                Vec::with_capacity(n_active * (vocab_len - 1));
            for (slot, beam) in slots.iter().enumerate().filter(|(_, b)| b.active) {
                let mut sum = 0.0_f32;
                let mut count = 0_usize;
                for (pos, &token) in beam.tokens.iter().enumerate() {
                    let s = beam.scores[pos][token];
                    if !s.is_nan() {
                        sum += s;
                        count += 1;
                    }
                }
                let next_row = &beam.scores[beam.tokens.len()];
                for token in 1..vocab_len {
                    let s = next_row[token];
                    let (sum, count) = if s.is_nan() { (sum, count) } else { (sum + s, count + 1) };
                    let mean = if count == 0 {
                        f32::NEG_INFINITY
                    } else {
                        sum / count as f32
                    };
                    continuations.push(Continuation { mean, slot, token });
                }
            }
            continuations.sort_by(|a, b| {
                b.mean
                    .total_cmp(&a.mean)
                    .then(a.slot.cmp(&b.slot))
                    .then(a.token.cmp(&b.token))
            });
            continuations.truncate(n_beams);

            slots = continuations
                .iter()
                .map(|c| slots[c.slot].extended(c.token))
                .collect();
        }

        let reversed = self.config.direction.is_reverse();
        Ok(cache
            .top_matches(self.config.top_match)
            .into_iter()
            .map(|c| PeptideMatch {
                peptide_score: c.peptide_score,
                residue_scores: c.residue_scores.clone(),
                peptide: self.vocab.peptide_string(&c.tokens, reversed),
            })
            .collect())
    }

    /// Decode a batch of spectra, parallelized across spectra.
    pub fn decode_batch<E, S>(
        &self,
        encoder: &E,
        scorer: &S,
        spectra: &[Spectrum],
        precursors: &[Precursor],
    ) -> Result<Vec<Vec<PeptideMatch>>>
    where
        E: SpectrumEncoder + Sync,
        S: NextTokenScorer<Encoded = E::Encoded> + Sync,
    {
        if spectra.len() != precursors.len() {
            return Err(DecodeError::MismatchedBatch {
                spectra: spectra.len(),
                precursors: precursors.len(),
            });
        }
        let start = Instant::now();
        let results: Result<Vec<_>> = spectra
            .par_iter()
            .zip(precursors.par_iter())
            .map(|(spectrum, precursor)| {
                let encoded = encoder.encode(spectrum);
                self.decode_spectrum(scorer, &encoded, precursor)
            })
            .collect();
        let results = results?;
        info!(
            n_spectra = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decoded spectrum batch"
        );
        Ok(results)
    }

    fn check_rows(&self, rows: &[Vec<f32>], expected_positions: usize) -> Result<()> {
        if rows.len() != expected_positions {
            return Err(DecodeError::ScorerOutput {
                expected_positions,
                got_positions: rows.len(),
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != self.vocab.len()) {
            return Err(DecodeError::ScorerDistributionWidth {
                expected: self.vocab.len(),
                got: bad.len(),
            });
        }
        Ok(())
    }
}

fn finite_or_min(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeDirection;
    use crate::decoding::scorer::ReplayScorer;
    use crate::errors::ConfigError;
    use crate::vocab::VocabSource;

    fn small_config() -> DecoderConfig {
        DecoderConfig {
            vocab: VocabSource::Custom {
                residues: vec![
                    ("G".to_string(), 57.021463735),
                    ("A".to_string(), 71.037113805),
                ],
            },
            max_length: 10,
            max_charge: 3,
            precursor_mass_tol_ppm: 50.0,
            isotope_error_range: (0, 1),
            min_peptide_len: 1,
            n_beams: 1,
            top_match: 1,
            direction: DecodeDirection::Forward,
        }
    }

    #[test]
    fn test_construction_validates_config() {
        let config = DecoderConfig {
            n_beams: 0,
            ..small_config()
        };
        let err = BeamSearchDecoder::new(config).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Config(ConfigError::InvalidBeamCount { n_beams: 0 })
        );
    }

    #[test]
    fn test_invalid_precursor_rejected() {
        let decoder = BeamSearchDecoder::new(small_config()).unwrap();
        let table = vec![vec![0.0; decoder.vocab().len()]];
        let bad = Precursor {
            mass: 100.0,
            charge: 9,
            mz: 101.0,
        };
        assert_eq!(
            decoder.decode_spectrum(&ReplayScorer, &table, &bad),
            Err(DecodeError::InvalidPrecursor {
                charge: 9,
                max_charge: 3
            })
        );
    }

    #[test]
    fn test_scorer_contract_enforced() {
        let decoder = BeamSearchDecoder::new(small_config()).unwrap();
        let precursor = Precursor {
            mass: 1000.0,
            charge: 1,
            mz: 1001.0,
        };
        // Distribution of the wrong width.
        let table = vec![vec![0.0; 2]];
        assert!(matches!(
            decoder.decode_spectrum(&ReplayScorer, &table, &precursor),
            Err(DecodeError::ScorerDistributionWidth { .. })
        ));
    }
}
