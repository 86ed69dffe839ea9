use crate::models::{
    Precursor,
    Spectrum,
};
use crate::vocab::TokenId;

/// Turns raw peak arrays into whatever representation the scorer consumes.
///
/// The encoded value is opaque to the decoding core; any peak validity mask
/// the scorer needs travels inside it.
pub trait SpectrumEncoder {
    type Encoded;

    fn encode(&self, spectrum: &Spectrum) -> Self::Encoded;
}

/// The external next-token scoring function.
///
/// Given the token history of one beam (`None` before anything was decoded),
/// the precursor and the encoded spectrum, returns one vocabulary-sized score
/// row per decoded position plus one for the next position: `prior.len() + 1`
/// rows in total. Rows for already-decoded positions are refreshed on every
/// call.
///
/// The decoder's output is reproducible only if this function is
/// deterministic for identical inputs.
pub trait NextTokenScorer {
    type Encoded;

    fn score(
        &self,
        prior: Option<&[TokenId]>,
        precursor: &Precursor,
        encoded: &Self::Encoded,
    ) -> Vec<Vec<f32>>;
}

/// Encoder for scorers that consume the peak arrays as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEncoder;

impl SpectrumEncoder for IdentityEncoder {
    type Encoded = Spectrum;

    fn encode(&self, spectrum: &Spectrum) -> Spectrum {
        spectrum.clone()
    }
}

/// Deterministic scorer replaying a precomputed score matrix.
///
/// The encoded form of a spectrum is a matrix with one vocabulary-sized row
/// per decode step (exported model outputs, or hand-written fixtures in
/// tests). The returned distribution for position `i` is row `i`,
/// independent of the token history; histories longer than the matrix repeat
/// the last row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayScorer;

impl NextTokenScorer for ReplayScorer {
    type Encoded = Vec<Vec<f32>>;

    fn score(
        &self,
        prior: Option<&[TokenId]>,
        _precursor: &Precursor,
        table: &Self::Encoded,
    ) -> Vec<Vec<f32>> {
        let n_positions = prior.map_or(0, <[TokenId]>::len) + 1;
        if table.is_empty() {
            return vec![Vec::new(); n_positions];
        }
        (0..n_positions)
            .map(|i| table[i.min(table.len() - 1)].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precursor() -> Precursor {
        Precursor {
            mass: 500.0,
            charge: 2,
            mz: 251.0,
        }
    }

    #[test]
    fn test_replay_row_count() {
        let table = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let scorer = ReplayScorer;

        let rows = scorer.score(None, &precursor(), &table);
        assert_eq!(rows, vec![vec![0.1, 0.2]]);

        let rows = scorer.score(Some(&[1]), &precursor(), &table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![0.3, 0.4]);

        // Histories past the end of the matrix repeat the last row.
        let rows = scorer.score(Some(&[1, 1, 1]), &precursor(), &table);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], vec![0.3, 0.4]);
    }
}
