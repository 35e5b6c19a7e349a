//! The serialized record of each successful pull, and the on-disk timeline artifact.
//!
//! `TimelineEvent` is deliberately lossless with respect to PCM: replaying every event's
//! `pcm` field in order reconstructs the exact byte stream the orchestrator produced (see the
//! `replay` binary and [`crate::wav`]).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::adapter::AudioChunk;
use crate::error::{Error, Result};

/// One pull's worth of observability data, sufficient to reconstruct its audio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    /// Monotonically increasing, starting at 0, one per successful pull.
    pub chunk_id: u64,

    /// The adapter's name at the time of this pull (see [`crate::adapter::Adapter::name`]).
    pub adapter: String,

    /// The window requested of the adapter for this pull.
    pub token_window: u32,

    /// Wall-clock time spent inside `adapter.pull`, in milliseconds.
    pub render_ms: f64,

    /// Base64-encoded PCM bytes of the yielded chunk.
    #[serde(rename = "pcm")]
    pub pcm_b64: String,
}

impl TimelineEvent {
    pub(crate) fn new(chunk_id: u64, adapter: String, token_window: u32, render_ms: f64, chunk: &AudioChunk) -> Self {
        Self {
            chunk_id,
            adapter,
            token_window,
            render_ms,
            pcm_b64: BASE64.encode(&chunk.pcm),
        }
    }

    /// Decode this event's base64 `pcm` field back into raw bytes.
    pub fn decode_pcm(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.pcm_b64)
            .map_err(|err| Error::Encoding(format!("chunk {}: {err}", self.chunk_id)))
    }
}

/// A harness-augmented [`TimelineEvent`], with scene-recording fields appended.
///
/// Produced by the scene harness (and, more generally, any consumer that wants wall-clock
/// timing and buffer depth alongside the bare pull record).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedTimelineEvent {
    #[serde(flatten)]
    pub event: TimelineEvent,

    /// Milliseconds since the scene/stream started.
    pub timestamp_ms: f64,

    /// Duration of the emitted chunk, in milliseconds.
    pub duration_ms: f64,

    /// Playback buffer depth immediately after this chunk was routed, in milliseconds.
    pub buffer_ms: f64,
}

/// The on-disk timeline artifact written by [`crate::orchestrator::Orchestrator::save_timeline`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineArtifact {
    pub events: Vec<TimelineEvent>,
    pub metrics: TimelineMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineMetrics {
    pub events: usize,
}

impl TimelineArtifact {
    pub(crate) fn new(events: Vec<TimelineEvent>) -> Self {
        let metrics = TimelineMetrics {
            events: events.len(),
        };
        Self { events, metrics }
    }
}

/// One logged transcript entry, written to the sibling `transcripts.json` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Unix epoch seconds.
    pub timestamp: f64,
    pub text: String,
}

/// Parse a timeline log that is either a JSON array of events or newline-delimited events.
///
/// Used by the `replay` binary; exposed here so the parsing logic is unit-testable without
/// spawning a process.
pub fn parse_timeline_log(contents: &str) -> Result<Vec<TimelineEvent>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(Error::from);
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|err| Error::Encoding(format!("invalid timeline record: {err}")))
        })
        .collect()
}
