use crate::vocab::TokenId;
use std::collections::HashSet;

/// A completed peptide prediction for one spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedCandidate {
    pub peptide_score: f32,
    pub residue_scores: Vec<f32>,
    /// Peptide tokens in emission order, stop token stripped.
    pub tokens: Vec<TokenId>,
    /// Admission counter, used to keep insertion order on score ties.
    seq: u64,
}

/// Bounded max-retaining cache of finished beams for one spectrum.
///
/// Holds at most `capacity` (= the beam count) candidates with pairwise
/// distinct token sequences. A hash set mirrors the stored sequences so the
/// dedup check is O(1) instead of a scan over the entries.
#[derive(Debug)]
pub struct SpectrumCache {
    capacity: usize,
    entries: Vec<FinishedCandidate>,
    seen: HashSet<Vec<TokenId>>,
    next_seq: u64,
}

impl SpectrumCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, tokens: &[TokenId]) -> bool {
        self.seen.contains(tokens)
    }

    /// Offer a finished candidate. Returns whether it was stored.
    ///
    /// Duplicated token sequences are dropped (the earliest copy wins,
    /// scores are never merged). Under capacity everything distinct is
    /// stored; at capacity the candidate replaces the current minimum only
    /// when strictly above it. Unorderable (NaN) scores are never admitted.
    pub fn admit(
        &mut self,
        peptide_score: f32,
        residue_scores: Vec<f32>,
        tokens: Vec<TokenId>,
    ) -> bool {
        if peptide_score.is_nan() || self.capacity == 0 {
            return false;
        }
        if self.seen.contains(tokens.as_slice()) {
            return false;
        }

        if self.entries.len() < self.capacity {
            self.seen.insert(tokens.clone());
            self.entries.push(FinishedCandidate {
                peptide_score,
                residue_scores,
                tokens,
                seq: self.next_seq,
            });
            self.next_seq += 1;
            return true;
        }

        // Eviction victim: lowest score; among tied minima the newest entry
        // goes, so the earliest-inserted one survives.
        let victim = self
            .entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.peptide_score
                    .total_cmp(&b.peptide_score)
                    .then(b.seq.cmp(&a.seq))
            })
            .map(|(i, _)| i);
        let Some(victim) = victim else {
            return false;
        };
        if peptide_score <= self.entries[victim].peptide_score {
            return false;
        }

        self.seen.insert(tokens.clone());
        let evicted = std::mem::replace(
            &mut self.entries[victim],
            FinishedCandidate {
                peptide_score,
                residue_scores,
                tokens,
                seq: self.next_seq,
            },
        );
        self.seen.remove(evicted.tokens.as_slice());
        self.next_seq += 1;
        true
    }

    /// The stored candidates by descending peptide score, ties in insertion
    /// order, at most `top_match` of them.
    pub fn top_matches(&self, top_match: usize) -> Vec<&FinishedCandidate> {
        let mut out: Vec<&FinishedCandidate> = self.entries.iter().collect();
        out.sort_by(|a, b| {
            b.peptide_score
                .total_cmp(&a.peptide_score)
                .then(a.seq.cmp(&b.seq))
        });
        out.truncate(top_match);
        out
    }
}

/// Derive the cacheable candidate from a finished beam.
///
/// `tokens`/`score_rows` are the beam's emission-order buffers. Residue
/// scores are the softmax probabilities of the realized tokens; a stop token
/// that was never predicted (mass-only termination) contributes an explicit
/// 0.0. The precursor-fit penalty lowers the peptide score by 1.0 before the
/// residue scores are blended with it; the stop slot is dropped from the
/// blended result.
pub(crate) fn finalize_candidate(
    tokens: &[TokenId],
    score_rows: &[Vec<f32>],
    stop_token: TokenId,
    fits_precursor: bool,
) -> (Vec<TokenId>, Vec<f32>, f32) {
    let has_stop = tokens.last() == Some(&stop_token);
    let peptide: &[TokenId] = if has_stop {
        &tokens[..tokens.len() - 1]
    } else {
        tokens
    };

    let mut residue_scores: Vec<f32> = tokens
        .iter()
        .zip(score_rows)
        .map(|(&t, row)| softmax_prob(row, t))
        .collect();
    if !has_stop {
        residue_scores.push(0.0);
    }

    let mut peptide_score =
        residue_scores.iter().sum::<f32>() / residue_scores.len() as f32;
    if !fits_precursor {
        peptide_score -= 1.0;
    }
    for s in &mut residue_scores {
        *s = (*s + peptide_score) / 2.0;
    }
    residue_scores.pop();

    (peptide.to_vec(), residue_scores, peptide_score)
}

/// Numerically stable softmax probability of one entry of a score row.
fn softmax_prob(row: &[f32], token: TokenId) -> f32 {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let denom: f32 = row.iter().map(|&s| (s - max).exp()).sum();
    (row[token] - max).exp() / denom
}
