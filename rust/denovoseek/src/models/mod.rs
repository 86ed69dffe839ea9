use serde::{
    Deserialize,
    Serialize,
};

/// One MS/MS measurement as parallel peak arrays.
///
/// The decoding core never inspects the peaks itself; they only exist to be
/// handed to the external spectrum encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    pub mz: Vec<f64>,
    pub intensity: Vec<f32>,
}

impl Spectrum {
    pub fn new(mz: Vec<f64>, intensity: Vec<f32>) -> Self {
        Self { mz, intensity }
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

/// The intact peptide ion observed before fragmentation.
///
/// Immutable once decoding starts; the measured m/z and charge constrain
/// which decodings are physically plausible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precursor {
    pub mass: f64,
    pub charge: u8,
    pub mz: f64,
}

/// A single peptide-spectrum match emitted by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideMatch {
    pub peptide_score: f32,
    pub residue_scores: Vec<f32>,
    pub peptide: String,
}
