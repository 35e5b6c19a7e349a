//! Scene driver: wires a mock adapter through a fresh [`Orchestrator`] and writes
//! `{name}.wav` / `{name}.json` artifacts, grounded on the original scene runner's
//! `run_scene` helper.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use futures_util::StreamExt;

use crate::adapter::Adapter;
use crate::chunk_ladder::ChunkLadder;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::playback_buffer::PlaybackBuffer;
use crate::timeline::EnrichedTimelineEvent;
use crate::wav;

/// Options shared by every scene run.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub out_dir: PathBuf,
    pub sample_rate: u32,
    /// Signal barge-in once this many chunks have been yielded.
    pub barge_in_at: Option<u64>,
}

impl SceneOptions {
    pub fn new(out_dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            out_dir: out_dir.into(),
            sample_rate,
            barge_in_at: None,
        }
    }

    pub fn with_barge_in_at(mut self, chunk_id: u64) -> Self {
        self.barge_in_at = Some(chunk_id);
        self
    }
}

/// Artifacts produced by one scene run.
#[derive(Debug, Clone)]
pub struct SceneResult {
    pub events: Vec<EnrichedTimelineEvent>,
    pub wav_path: PathBuf,
    pub json_path: PathBuf,
}

/// Drive `adapter` through a fresh orchestrator, recording an enriched timeline and writing
/// `{name}.wav` / `{name}.json` under `opts.out_dir`.
pub async fn run_scene<A: Adapter>(name: &str, adapter: A, opts: &SceneOptions) -> Result<SceneResult> {
    let buffer = PlaybackBuffer::new(1000.0);
    let mut orch = Orchestrator::new(adapter, buffer, None).with_ladder(ChunkLadder::default());
    let barge_in = orch.barge_in_handle();
    let barge_in_at = opts.barge_in_at;

    let start = Instant::now();
    let mut audio_bytes = Vec::new();
    let mut chunk_id: u64 = 0;

    {
        let mut stream = Box::pin(orch.stream(|_event| {}));
        while let Some(result) = stream.next().await {
            let chunk = result?;
            audio_bytes.extend_from_slice(&chunk.pcm);
            if barge_in_at == Some(chunk_id) {
                barge_in.signal();
            }
            chunk_id += 1;
        }
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let events = enrich(orch.events(), elapsed_ms);

    std::fs::create_dir_all(&opts.out_dir)?;
    let wav_path = opts.out_dir.join(format!("{name}.wav"));
    wav::write_wav_file(&wav_path, opts.sample_rate, &audio_bytes)?;

    let json_path = opts.out_dir.join(format!("{name}.json"));
    std::fs::write(&json_path, serde_json::to_string_pretty(&events)?)?;

    Ok(SceneResult {
        events,
        wav_path,
        json_path,
    })
}

/// Drive `adapter` through a fresh orchestrator, writing a *streamed* WAV — the unknown-length
/// header from [`wav::write_streaming_header`] followed by each chunk's PCM as it's yielded — to
/// `out`, instead of collecting audio in memory and finalizing a file the way [`run_scene`] does.
///
/// This is the live-client path: a host forwarding PCM straight to a socket or pipe writes the
/// header once, then streams frames as the orchestrator produces them, never knowing the total
/// length up front. `{name}.json` is still written under `opts.out_dir` for the same audit
/// trail `run_scene` leaves behind, but no `{name}.wav` file is written — the frames went to
/// `out` instead.
pub async fn stream_scene<A: Adapter, W: std::io::Write>(
    name: &str,
    adapter: A,
    opts: &SceneOptions,
    out: &mut W,
) -> Result<Vec<EnrichedTimelineEvent>> {
    let buffer = PlaybackBuffer::new(1000.0);
    let mut orch = Orchestrator::new(adapter, buffer, None).with_ladder(ChunkLadder::default());

    wav::write_streaming_header(out, opts.sample_rate)?;

    let start = Instant::now();
    {
        let mut stream = Box::pin(orch.stream(|_event| {}));
        while let Some(result) = stream.next().await {
            let chunk = result?;
            out.write_all(&chunk.pcm)?;
        }
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let events = enrich(orch.events(), elapsed_ms);

    std::fs::create_dir_all(&opts.out_dir)?;
    let json_path = opts.out_dir.join(format!("{name}.json"));
    std::fs::write(&json_path, serde_json::to_string_pretty(&events)?)?;

    Ok(events)
}

/// Scene-specific extras returned alongside the base [`SceneResult`] for the barge-in scenario.
#[derive(Debug, Clone)]
pub struct BargeInSceneResult {
    pub base: SceneResult,
    pub reset_called: bool,
    pub planned_chunks: u32,
}

fn enrich(events: &[crate::timeline::TimelineEvent], total_elapsed_ms: f64) -> Vec<EnrichedTimelineEvent> {
    // A single post-hoc pass, not per-chunk wall-clock capture: the harness doesn't need
    // microsecond timestamp fidelity, just a monotonically increasing schedule proportional to
    // each chunk's rendered duration, which is sufficient for the audit artifacts this produces.
    let mut timestamp_ms = 0.0;
    let mut buffer_ms = 0.0;
    events
        .iter()
        .map(|event| {
            let chunk_render_ms = event.render_ms.max(0.0);
            timestamp_ms = (timestamp_ms + chunk_render_ms).min(total_elapsed_ms.max(timestamp_ms));
            let pcm_len = event.decode_pcm().map(|b| b.len()).unwrap_or(0);
            let duration_ms = crate::ring_buffer::bytes_to_ms(pcm_len, 16_000);
            buffer_ms += duration_ms;
            EnrichedTimelineEvent {
                event: event.clone(),
                timestamp_ms,
                duration_ms,
                buffer_ms,
            }
        })
        .collect()
}

/// Run the barge-in scenario specifically, returning its extra `reset_called`/`planned_chunks`
/// fields alongside the base timeline/WAV artifacts.
pub async fn run_barge_in_scene(opts: &SceneOptions) -> Result<BargeInSceneResult> {
    let adapter = crate::scene::mock::BargeAdapter::default();
    let reset_flag = adapter.reset_flag();
    let planned_chunks = adapter.total();
    let mut opts = opts.clone();
    opts.barge_in_at = Some(opts.barge_in_at.unwrap_or(2));

    let base = run_scene("barge_in", adapter, &opts).await?;
    Ok(BargeInSceneResult {
        base,
        reset_called: reset_flag.load(std::sync::atomic::Ordering::SeqCst),
        planned_chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mock::{BargeAdapter, BreathingAdapter, ColdStartAdapter};

    #[tokio::test]
    async fn cold_start_scene_produces_three_events_and_a_wav() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SceneOptions::new(dir.path(), 16_000);
        let result = run_scene("cold_start", ColdStartAdapter::default(), &opts)
            .await
            .unwrap();
        assert_eq!(result.events.len(), 3);
        assert!(result.wav_path.exists());
        assert!(result.json_path.exists());
        assert!(result.events.iter().all(|e| e.buffer_ms >= 0.0));
    }

    #[tokio::test]
    async fn breathing_room_scene_has_exactly_two_events_and_320_byte_wav_payload() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SceneOptions::new(dir.path(), 16_000);
        let result = run_scene("breathing_room", BreathingAdapter::default(), &opts)
            .await
            .unwrap();
        assert_eq!(result.events.len(), 2);

        let mut reader = hound::WavReader::open(&result.wav_path).unwrap();
        let sample_count = reader.samples::<i16>().count();
        assert_eq!(sample_count * 2, 320);
    }

    #[tokio::test]
    async fn barge_in_scene_stops_early_and_resets_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SceneOptions::new(dir.path(), 16_000).with_barge_in_at(2);
        let adapter = BargeAdapter::new(5);
        let reset_flag = adapter.reset_flag();

        let result = run_scene("barge_in", adapter, &opts).await.unwrap();
        assert!(result.events.len() < 5);
        assert!(reset_flag.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn run_barge_in_scene_reports_reset_and_planned_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SceneOptions::new(dir.path(), 16_000);
        let result = run_barge_in_scene(&opts).await.unwrap();
        assert!(result.reset_called);
        assert_eq!(result.planned_chunks, 5);
        assert!(result.base.events.len() < 5);
    }

    #[tokio::test]
    async fn stream_scene_writes_header_then_pcm_frames_with_no_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SceneOptions::new(dir.path(), 16_000);
        let mut out = Vec::new();

        let events = stream_scene("breathing_room", BreathingAdapter::default(), &opts, &mut out)
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes(out[4..8].try_into().unwrap()),
            0xFFFF_FFFF
        );
        // Two 10ms chunks at 16kHz, 160 samples each: 320 bytes of PCM after the 44-byte header.
        assert_eq!(out.len(), 44 + 320);
        assert!(!dir.path().join("breathing_room.wav").exists());
        assert!(dir.path().join("breathing_room.json").exists());
    }
}
