pub mod beam;
pub mod cache;
pub mod driver;
pub mod scorer;

pub use beam::{
    Beam,
    StepOutcome,
};
pub use cache::SpectrumCache;
pub use driver::BeamSearchDecoder;
pub use scorer::{
    IdentityEncoder,
    NextTokenScorer,
    ReplayScorer,
    SpectrumEncoder,
};
