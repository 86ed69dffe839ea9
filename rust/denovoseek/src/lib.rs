pub mod config;
pub mod decoding;
pub mod errors;
pub mod mass_error;
pub mod models;
pub mod vocab;

pub use config::{
    DecodeDirection,
    DecoderConfig,
};
pub use decoding::{
    BeamSearchDecoder,
    IdentityEncoder,
    NextTokenScorer,
    ReplayScorer,
    SpectrumEncoder,
};
pub use models::{
    PeptideMatch,
    Precursor,
    Spectrum,
};
pub use vocab::{
    ResidueVocab,
    TokenId,
    VocabSource,
    PAD_TOKEN,
};
