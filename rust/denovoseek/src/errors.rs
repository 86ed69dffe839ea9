use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidBeamCount {
        n_beams: usize,
    },
    InvalidTopMatch {
        top_match: usize,
    },
    InvalidPeptideLengths {
        min_peptide_len: usize,
        max_length: usize,
    },
    InvalidCharge {
        max_charge: u8,
    },
    InvalidTolerance {
        tol_ppm: f64,
    },
    InvalidIsotopeRange {
        lo: i32,
        hi: i32,
    },
    BeamCountExceedsVocabulary {
        n_beams: usize,
        vocab_len: usize,
    },
    EmptyVocabulary,
    DuplicateResidue {
        name: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBeamCount { n_beams } => {
                write!(f, "n_beams must be at least 1, got {}", n_beams)
            }
            Self::InvalidTopMatch { top_match } => {
                write!(f, "top_match must be at least 1, got {}", top_match)
            }
            Self::InvalidPeptideLengths {
                min_peptide_len,
                max_length,
            } => write!(
                f,
                "max_length ({}) must be at least min_peptide_len ({}), and min_peptide_len at least 1",
                max_length, min_peptide_len
            ),
            Self::InvalidCharge { max_charge } => {
                write!(f, "max_charge must be at least 1, got {}", max_charge)
            }
            Self::InvalidTolerance { tol_ppm } => {
                write!(f, "precursor_mass_tol_ppm must be positive, got {}", tol_ppm)
            }
            Self::InvalidIsotopeRange { lo, hi } => {
                write!(f, "isotope_error_range ({}, {}) is not a valid inclusive range", lo, hi)
            }
            Self::BeamCountExceedsVocabulary { n_beams, vocab_len } => write!(
                f,
                "n_beams ({}) cannot exceed the vocabulary size ({})",
                n_beams, vocab_len
            ),
            Self::EmptyVocabulary => write!(f, "the residue vocabulary is empty"),
            Self::DuplicateResidue { name } => {
                write!(f, "duplicate residue name in vocabulary: {}", name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Config(ConfigError),
    /// The precursor does not satisfy the constraints the decoder was built
    /// with. Checked at decode entry since it is a per-spectrum input.
    InvalidPrecursor {
        charge: u8,
        max_charge: u8,
    },
    /// The external scorer broke its contract (wrong number of positions or
    /// a distribution of the wrong width).
    ScorerOutput {
        expected_positions: usize,
        got_positions: usize,
    },
    ScorerDistributionWidth {
        expected: usize,
        got: usize,
    },
    MismatchedBatch {
        spectra: usize,
        precursors: usize,
    },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::InvalidPrecursor { charge, max_charge } => write!(
                f,
                "precursor charge {} outside the supported range 1..={}",
                charge, max_charge
            ),
            Self::ScorerOutput {
                expected_positions,
                got_positions,
            } => write!(
                f,
                "scorer returned {} position distributions, expected {}",
                got_positions, expected_positions
            ),
            Self::ScorerDistributionWidth { expected, got } => write!(
                f,
                "scorer distribution has width {}, expected vocabulary size {}",
                got, expected
            ),
            Self::MismatchedBatch { spectra, precursors } => write!(
                f,
                "batch has {} spectra but {} precursors",
                spectra, precursors
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for DecodeError {}

impl From<ConfigError> for DecodeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
