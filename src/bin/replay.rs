//! Reconstructs a WAV file by concatenating the base64-decoded PCM fields of a timeline log, in
//! event order. Proves the timeline is a lossless capture of the audio an orchestrator produced.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cadence::timeline::parse_timeline_log;
use cadence::wav;

/// Rebuild a WAV file from a recorded timeline log.
#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Reconstruct a WAV file from a cadence timeline log")]
struct Params {
    /// Path to a timeline log: either a JSON array of events, or one event per line.
    log: PathBuf,

    /// Where to write the reconstructed WAV file.
    #[arg(short = 'o', long = "output", default_value = "out.wav")]
    output: PathBuf,

    /// Sample rate to stamp on the output WAV, in Hz.
    #[arg(long = "sample-rate", default_value_t = 16_000)]
    sample_rate: u32,
}

fn main() -> ExitCode {
    let params = Params::parse();
    match run(params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("replay: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(params: Params) -> Result<()> {
    let contents = std::fs::read_to_string(&params.log)
        .with_context(|| format!("failed to read timeline log: {}", params.log.display()))?;

    let events = parse_timeline_log(&contents).context("failed to parse timeline log")?;

    let mut pcm = Vec::new();
    for event in &events {
        let bytes = event
            .decode_pcm()
            .with_context(|| format!("chunk {}: malformed base64 pcm field", event.chunk_id))?;
        pcm.extend_from_slice(&bytes);
    }

    wav::write_wav_file(&params.output, params.sample_rate, &pcm)
        .with_context(|| format!("failed to write wav file: {}", params.output.display()))?;

    println!(
        "replay: wrote {} bytes of pcm from {} events to {}",
        pcm.len(),
        events.len(),
        params.output.display()
    );
    Ok(())
}
