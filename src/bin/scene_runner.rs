//! Drives one named scene against a fresh orchestrator and writes its `scene.json`/`scene.wav`
//! artifacts — a standalone, runnable counterpart to the scene harness' unit tests, for manual
//! audits of orchestrator behavior.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Parser;

use cadence::scene::{SceneOptions, run_barge_in_scene, run_scene, stream_scene};
use cadence::scene::mock::{BreathingAdapter, ColdStartAdapter, LongReadAdapter, SwapAdapter};

/// Run a single deterministic cadence scene and write its audit artifacts.
#[derive(Parser, Debug)]
#[command(name = "scene-runner")]
#[command(about = "Run a deterministic cadence scene and write its scene.json/scene.wav artifacts")]
struct Params {
    /// Which scene to run.
    #[arg(value_enum)]
    scene: SceneName,

    /// Directory to write `{scene}.wav` / `{scene}.json` into.
    #[arg(long = "out-dir", default_value = "scenes-out")]
    out_dir: PathBuf,

    /// Sample rate to stamp on the scene's WAV artifact, in Hz.
    #[arg(long = "sample-rate", default_value_t = 16_000)]
    sample_rate: u32,

    /// Stream a live WAV (unknown-length header followed by PCM frames as they're produced) to
    /// stdout instead of finalizing a `{scene}.wav` file. `{scene}.json` is still written under
    /// `--out-dir`. Not supported for the barge-in scene.
    #[arg(long = "stream", default_value_t = false)]
    stream: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum SceneName {
    ColdStart,
    LongRead,
    MidStreamSwap,
    BargeIn,
    BreathingRoom,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cadence::logging::init();
    let params = Params::parse();
    match run(params).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scene-runner: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(params: Params) -> Result<()> {
    let opts = SceneOptions::new(params.out_dir, params.sample_rate);

    if params.stream {
        return run_streaming(params.scene, &opts).await;
    }

    let (name, events, wav_path, json_path) = match params.scene {
        SceneName::ColdStart => {
            let result = run_scene("cold_start", ColdStartAdapter::default(), &opts).await?;
            ("cold_start", result.events.len(), result.wav_path, result.json_path)
        }
        SceneName::LongRead => {
            let result = run_scene("long_read", LongReadAdapter::default(), &opts).await?;
            ("long_read", result.events.len(), result.wav_path, result.json_path)
        }
        SceneName::MidStreamSwap => {
            let result = run_scene("mid_stream_swap", SwapAdapter::default(), &opts).await?;
            ("mid_stream_swap", result.events.len(), result.wav_path, result.json_path)
        }
        SceneName::BargeIn => {
            let result = run_barge_in_scene(&opts).await?;
            if !result.reset_called {
                bail!("barge-in scene completed without the adapter ever being reset");
            }
            (
                "barge_in",
                result.base.events.len(),
                result.base.wav_path,
                result.base.json_path,
            )
        }
        SceneName::BreathingRoom => {
            let result = run_scene("breathing_room", BreathingAdapter::default(), &opts).await?;
            ("breathing_room", result.events.len(), result.wav_path, result.json_path)
        }
    };

    println!(
        "scene-runner: {name} produced {events} events -> {} / {}",
        wav_path.display(),
        json_path.display()
    );
    Ok(())
}

/// The `--stream` path: write a live, unknown-length WAV straight to stdout as the orchestrator
/// produces it, instead of collecting audio in memory and finalizing a file. Status messages go
/// to stderr so they never land in the WAV bytes on stdout.
async fn run_streaming(scene: SceneName, opts: &SceneOptions) -> Result<()> {
    let mut stdout = std::io::stdout();

    let (name, events) = match scene {
        SceneName::ColdStart => (
            "cold_start",
            stream_scene("cold_start", ColdStartAdapter::default(), opts, &mut stdout).await?,
        ),
        SceneName::LongRead => (
            "long_read",
            stream_scene("long_read", LongReadAdapter::default(), opts, &mut stdout).await?,
        ),
        SceneName::MidStreamSwap => (
            "mid_stream_swap",
            stream_scene("mid_stream_swap", SwapAdapter::default(), opts, &mut stdout).await?,
        ),
        SceneName::BreathingRoom => (
            "breathing_room",
            stream_scene("breathing_room", BreathingAdapter::default(), opts, &mut stdout).await?,
        ),
        SceneName::BargeIn => bail!(
            "scene-runner --stream does not support the barge-in scene; omit --stream to get the finalized file artifact"
        ),
    };

    stdout.flush()?;
    eprintln!("scene-runner: streamed {name} ({} events) to stdout", events.len());
    Ok(())
}
