use crate::errors::ConfigError;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// Index into the scorer's output distribution. Index 0 is the pad token by
/// convention and is never a valid emitted residue.
pub type TokenId = usize;

pub const PAD_TOKEN: TokenId = 0;

/// Name of the stop token in residue tables.
pub const STOP_NAME: &str = "$";

pub const HYDROGEN: f64 = 1.007825035;
pub const OXYGEN: f64 = 15.99491463;
pub const H2O: f64 = 2.0 * HYDROGEN + OXYGEN;
pub const PROTON: f64 = 1.00727646688;

/// The 20 proteogenic residues, with cysteine carried as its
/// carbamidomethylated form.
const CANONICAL: &[(&str, f64)] = &[
    ("G", 57.021463735),
    ("A", 71.037113805),
    ("S", 87.032028435),
    ("P", 97.052763875),
    ("V", 99.068413945),
    ("T", 101.047678505),
    ("C+57.02146", 160.030648505),
    ("L", 113.084064015),
    ("I", 113.084064015),
    ("N", 114.042927470),
    ("D", 115.026943065),
    ("Q", 128.058577540),
    ("K", 128.094963050),
    ("E", 129.042593135),
    ("M", 131.040484645),
    ("H", 137.058911875),
    ("F", 147.068413945),
    ("R", 156.101111050),
    ("Y", 163.063328575),
    ("W", 186.079312980),
];

/// Variable modifications on top of the canonical table: Met oxidation,
/// Asn/Gln deamidation, and the N-terminal modifications (acetylation,
/// carbamylation, ammonia loss, and their combination). Ammonia loss is the
/// one token with a negative mass.
const EXTENDED_MODS: &[(&str, f64)] = &[
    ("M+15.995", 147.035399645),
    ("N+0.984", 115.026943470),
    ("Q+0.984", 129.042593540),
    ("+42.011", 42.010565),
    ("+43.006", 43.005814),
    ("-17.027", -17.026549),
    ("+43.006-17.027", 25.979265),
];

/// Where the residue table comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum VocabSource {
    #[serde(rename = "canonical")]
    Canonical,
    #[default]
    #[serde(rename = "extended")]
    Extended,
    #[serde(rename = "custom")]
    Custom { residues: Vec<(String, f64)> },
}

#[derive(Debug, Clone)]
struct ResidueEntry {
    name: String,
    /// None for the pad and stop tokens, which carry no mass.
    mass: Option<f64>,
    is_n_term_mod: bool,
}

/// Immutable token <-> mass table.
///
/// Token ids are dense: 0 = pad, 1..=n = residues in table order, n + 1 =
/// stop. The N-terminal-modification and negative-mass token sets are
/// computed once here and never per decoding step.
#[derive(Debug, Clone)]
pub struct ResidueVocab {
    entries: Vec<ResidueEntry>,
    by_name: HashMap<String, TokenId>,
    stop: TokenId,
    negative_mass: Vec<TokenId>,
}

impl ResidueVocab {
    pub fn from_source(source: &VocabSource) -> Result<Self, ConfigError> {
        match source {
            VocabSource::Canonical => Self::from_table(CANONICAL.iter().copied()),
            VocabSource::Extended => {
                Self::from_table(CANONICAL.iter().chain(EXTENDED_MODS.iter()).copied())
            }
            VocabSource::Custom { residues } => {
                Self::from_table(residues.iter().map(|(n, m)| (n.as_str(), *m)))
            }
        }
    }

    fn from_table<'a>(table: impl Iterator<Item = (&'a str, f64)>) -> Result<Self, ConfigError> {
        let mut entries = vec![ResidueEntry {
            name: String::new(),
            mass: None,
            is_n_term_mod: false,
        }];
        let mut by_name = HashMap::new();
        let mut negative_mass = Vec::new();

        for (name, mass) in table {
            let id = entries.len();
            if by_name.insert(name.to_string(), id).is_some() {
                return Err(ConfigError::DuplicateResidue {
                    name: name.to_string(),
                });
            }
            if mass < 0.0 {
                negative_mass.push(id);
            }
            entries.push(ResidueEntry {
                name: name.to_string(),
                mass: Some(mass),
                is_n_term_mod: name.starts_with(['+', '-']),
            });
        }
        if entries.len() == 1 {
            return Err(ConfigError::EmptyVocabulary);
        }

        let stop = entries.len();
        by_name.insert(STOP_NAME.to_string(), stop);
        entries.push(ResidueEntry {
            name: STOP_NAME.to_string(),
            mass: None,
            is_n_term_mod: false,
        });

        Ok(Self {
            entries,
            by_name,
            stop,
            negative_mass,
        })
    }

    /// Number of token ids, including pad and stop. This is the width the
    /// external scorer's distributions must have.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stop_token(&self) -> TokenId {
        self.stop
    }

    pub fn pad_token(&self) -> TokenId {
        PAD_TOKEN
    }

    /// Monoisotopic residue mass; None for pad, stop, and out-of-table ids.
    pub fn mass_of(&self, token: TokenId) -> Option<f64> {
        self.entries.get(token).and_then(|e| e.mass)
    }

    pub fn name_of(&self, token: TokenId) -> Option<&str> {
        self.entries.get(token).map(|e| e.name.as_str())
    }

    pub fn token_of(&self, name: &str) -> Option<TokenId> {
        self.by_name.get(name).copied()
    }

    pub fn is_n_terminal_mod(&self, token: TokenId) -> bool {
        self.entries
            .get(token)
            .map(|e| e.is_n_term_mod)
            .unwrap_or(false)
    }

    /// Tokens whose mass correction is negative (neutral losses).
    pub fn negative_mass_tokens(&self) -> &[TokenId] {
        &self.negative_mass
    }

    /// Calculated m/z of the peptide (optionally with one extra residue
    /// appended), at the given charge. None when any token has no mass.
    pub fn peptide_mz(
        &self,
        tokens: &[TokenId],
        extra: Option<TokenId>,
        charge: u8,
    ) -> Option<f64> {
        let mut sum = 0.0;
        for &t in tokens.iter().chain(extra.as_ref()) {
            sum += self.mass_of(t)?;
        }
        Some((sum + H2O) / f64::from(charge) + PROTON)
    }

    /// Render the peptide in N->C order. `reversed` is true when decoding ran
    /// C->N, in which case the emission order is flipped for display.
    pub fn peptide_string(&self, tokens: &[TokenId], reversed: bool) -> String {
        let mut out = String::new();
        let render = |t: &TokenId, out: &mut String| {
            if let Some(name) = self.name_of(*t) {
                out.push_str(name);
            }
        };
        if reversed {
            tokens.iter().rev().for_each(|t| render(t, &mut out));
        } else {
            tokens.iter().for_each(|t| render(t, &mut out));
        }
        out
    }
}
