use crate::errors::ConfigError;
use crate::vocab::VocabSource;
use serde::{
    Deserialize,
    Serialize,
};

/// Whether peptides are decoded N->C (forward) or C->N (reverse). Reverse is
/// the default: the C-terminus is the better-constrained end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DecodeDirection {
    #[serde(rename = "forward")]
    Forward,
    #[default]
    #[serde(rename = "reverse")]
    Reverse,
}

impl DecodeDirection {
    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// Construction-time configuration of the beam-search decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecoderConfig {
    #[serde(default)]
    pub vocab: VocabSource,
    pub max_length: usize,
    pub max_charge: u8,
    pub precursor_mass_tol_ppm: f64,
    /// Inclusive range of C13 isotope offsets to try when matching the
    /// precursor m/z.
    pub isotope_error_range: (i32, i32),
    pub min_peptide_len: usize,
    pub n_beams: usize,
    pub top_match: usize,
    #[serde(default)]
    pub direction: DecodeDirection,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            vocab: VocabSource::default(),
            max_length: 100,
            max_charge: 5,
            precursor_mass_tol_ppm: 50.0,
            isotope_error_range: (0, 1),
            min_peptide_len: 6,
            n_beams: 1,
            top_match: 1,
            direction: DecodeDirection::default(),
        }
    }
}

impl DecoderConfig {
    /// Reject malformed configuration before any decoding happens.
    /// `vocab_len` is the size of the already-built residue vocabulary.
    pub fn validate(&self, vocab_len: usize) -> Result<(), ConfigError> {
        if self.n_beams < 1 {
            return Err(ConfigError::InvalidBeamCount {
                n_beams: self.n_beams,
            });
        }
        if self.top_match < 1 {
            return Err(ConfigError::InvalidTopMatch {
                top_match: self.top_match,
            });
        }
        if self.min_peptide_len < 1 || self.max_length < self.min_peptide_len {
            return Err(ConfigError::InvalidPeptideLengths {
                min_peptide_len: self.min_peptide_len,
                max_length: self.max_length,
            });
        }
        if self.max_charge < 1 {
            return Err(ConfigError::InvalidCharge {
                max_charge: self.max_charge,
            });
        }
        if !(self.precursor_mass_tol_ppm > 0.0) {
            return Err(ConfigError::InvalidTolerance {
                tol_ppm: self.precursor_mass_tol_ppm,
            });
        }
        if self.isotope_error_range.0 > self.isotope_error_range.1 {
            return Err(ConfigError::InvalidIsotopeRange {
                lo: self.isotope_error_range.0,
                hi: self.isotope_error_range.1,
            });
        }
        if self.n_beams > vocab_len {
            return Err(ConfigError::BeamCountExceedsVocabulary {
                n_beams: self.n_beams,
                vocab_len,
            });
        }
        Ok(())
    }
}
