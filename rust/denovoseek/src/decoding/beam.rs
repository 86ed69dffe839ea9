use crate::mass_error::{
    exceeds_tolerance,
    fits_tolerance,
};
use crate::models::Precursor;
use crate::vocab::{
    ResidueVocab,
    TokenId,
    PAD_TOKEN,
};

/// One beam-search hypothesis for a single spectrum.
///
/// `tokens` holds the emitted token ids in decode order; `scores` holds one
/// vocabulary-sized score row per decoded position, refreshed on every scorer
/// call. Both grow in lockstep, one entry per step.
#[derive(Debug, Clone)]
pub struct Beam {
    pub tokens: Vec<TokenId>,
    pub scores: Vec<Vec<f32>>,
    pub active: bool,
}

impl Beam {
    pub fn seeded(token: TokenId, first_row: Vec<f32>) -> Self {
        Self {
            tokens: vec![token],
            scores: vec![first_row],
            active: true,
        }
    }

    /// Child hypothesis continuing this beam with one more token. The score
    /// rows are inherited; the row for the new position was already produced
    /// by the scorer call that ranked the continuation.
    pub fn extended(&self, token: TokenId) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        Self {
            tokens,
            scores: self.scores.clone(),
            active: true,
        }
    }
}

/// Per-step classification result for one beam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub finished: bool,
    pub fits_precursor: bool,
    pub discarded: bool,
}

/// Chemistry-derived termination and discard rules, with the vocabulary's
/// classification sets resolved once at decoder construction.
#[derive(Debug)]
pub(crate) struct FinishRules<'v> {
    pub vocab: &'v ResidueVocab,
    pub tol_ppm: f64,
    pub isotope_range: (i32, i32),
    pub min_peptide_len: usize,
}

impl FinishRules<'_> {
    /// Classify one active beam at decode step `step` (0-indexed).
    ///
    /// Order of evaluation: stop token, pad token, modification placement,
    /// precursor mass, minimum length. Pad wins over stop; a minimum-length
    /// violation downgrades a finished beam to discarded.
    pub fn classify(&self, beam: &Beam, step: usize, precursor: &Precursor) -> StepOutcome {
        let tokens = &beam.tokens[..=step];
        let stop = self.vocab.stop_token();

        let ends_stop = tokens[step] == stop;
        let mut finished = ends_stop;
        let mut fits_precursor = false;
        let mut discarded = tokens[step] == PAD_TOKEN;

        // Invalid N-terminal modification placement, only relevant once the
        // peptide is long enough to have internal positions.
        if step > 1 {
            let final_pos = if ends_stop { step - 1 } else { step };
            let multiple_mods = self.vocab.is_n_terminal_mod(tokens[final_pos])
                && self.vocab.is_n_terminal_mod(tokens[final_pos - 1]);
            let internal_mods = tokens[..final_pos]
                .iter()
                .any(|&t| self.vocab.is_n_terminal_mod(t));
            if multiple_mods || internal_mods {
                discarded = true;
            }
        }
        if discarded {
            return StepOutcome {
                finished,
                fits_precursor: false,
                discarded: true,
            };
        }

        // Candidate peptide with the just-emitted stop token stripped.
        let content: &[TokenId] = if ends_stop { &tokens[..step] } else { tokens };
        let charge = precursor.charge;

        match self.vocab.peptide_mz(content, None, charge) {
            Some(calc_mz) => {
                if finished {
                    // Beams that emitted a stop token only get the two-sided
                    // tolerance check against the as-is peptide.
                    fits_precursor = fits_tolerance(
                        calc_mz,
                        precursor.mz,
                        charge,
                        self.tol_ppm,
                        self.isotope_range,
                    );
                } else if fits_tolerance(
                    calc_mz,
                    precursor.mz,
                    charge,
                    self.tol_ppm,
                    self.isotope_range,
                ) {
                    finished = true;
                    fits_precursor = true;
                } else {
                    // Terminate only when no future negative-mass residue can
                    // bring the peptide back into tolerance. Without any
                    // negative-mass token the as-is peptide itself is the only
                    // variant to check.
                    let negs = self.vocab.negative_mass_tokens();
                    let uncorrectable = if negs.is_empty() {
                        exceeds_tolerance(
                            calc_mz,
                            precursor.mz,
                            charge,
                            self.tol_ppm,
                            self.isotope_range,
                        )
                    } else {
                        negs.iter().all(|&t| {
                            match self.vocab.peptide_mz(content, Some(t), charge) {
                                Some(mz) => exceeds_tolerance(
                                    mz,
                                    precursor.mz,
                                    charge,
                                    self.tol_ppm,
                                    self.isotope_range,
                                ),
                                None => false,
                            }
                        })
                    };
                    if uncorrectable {
                        finished = true;
                    }
                }
            }
            // Unrecognized token: mass evaluation is indeterminate. The beam
            // is not terminated by this signal alone.
            None => {}
        }

        if finished && content.len() < self.min_peptide_len {
            discarded = true;
        }

        StepOutcome {
            finished,
            fits_precursor,
            discarded,
        }
    }
}
