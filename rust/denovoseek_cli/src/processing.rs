use super::config::OutputConfig;
use crate::errors::CliError;
use denovoseek::{
    BeamSearchDecoder,
    PeptideMatch,
    Precursor,
    ReplayScorer,
    Spectrum,
};
use indicatif::{
    ParallelProgressIterator,
    ProgressStyle,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{
    error,
    info,
};

/// One spectrum of a replay file: the measurement plus the per-step score
/// matrix its model produced.
#[derive(Debug, Deserialize)]
pub struct ReplaySpectrum {
    pub precursor: Precursor,
    #[serde(default)]
    pub peaks: Spectrum,
    pub step_scores: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ReplayFile {
    pub spectra: Vec<ReplaySpectrum>,
}

#[derive(Debug, Serialize)]
struct SpectrumResult {
    index: usize,
    precursor_mz: f64,
    matches: Vec<PeptideMatch>,
}

pub fn process_replay(
    path: PathBuf,
    decoder: &BeamSearchDecoder,
    output: &OutputConfig,
) -> std::result::Result<(), CliError> {
    info!("Loading replay file {:?}", path);
    let st = Instant::now();
    let file = File::open(&path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    let replay: ReplayFile =
        serde_json::from_reader(file).map_err(|e| CliError::ParseError { msg: e.to_string() })?;
    info!(
        "Loading replay file of {} spectra took: {:?} for {}",
        replay.spectra.len(),
        st.elapsed(),
        path.display()
    );

    let start = Instant::now();
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap();
    let results: Vec<SpectrumResult> = replay
        .spectra
        .par_iter()
        .enumerate()
        .progress_with_style(style)
        .map(|(index, spectrum)| {
            // A bad precursor skips the spectrum instead of aborting the run.
            let matches = match decoder.decode_spectrum(
                &ReplayScorer,
                &spectrum.step_scores,
                &spectrum.precursor,
            ) {
                Ok(matches) => matches,
                Err(e) => {
                    error!("Skipping spectrum {}: {}", index, e);
                    Vec::new()
                }
            };
            SpectrumResult {
                index,
                precursor_mz: spectrum.precursor.mz,
                matches,
            }
        })
        .collect();

    let nwritten: usize = results.iter().map(|r| r.matches.len()).sum();
    let out_path = output.directory.join("results.json");
    let out_file = File::create(&out_path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(out_path.to_string_lossy().to_string()),
    })?;
    serde_json::to_writer_pretty(out_file, &results)
        .map_err(|e| CliError::ParseError { msg: e.to_string() })?;

    println!(
        "Decoded {} spectra, wrote {} matches",
        results.len(),
        nwritten
    );
    println!("Finished decoding in {:?}", start.elapsed());
    Ok(())
}
