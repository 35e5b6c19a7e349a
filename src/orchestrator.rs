//! The state machine that drives an [`Adapter`], paces it with a [`ChunkLadder`], and yields a
//! stream of [`AudioChunk`]s while recording a replayable [`TimelineEvent`] per pull.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use futures_util::Stream;
use futures_util::stream;
use tokio::sync::Notify;
use tracing::warn;

use crate::adapter::{Adapter, AudioChunk};
use crate::chunk_ladder::{ChunkLadder, DEFAULT_COMFORT_BAND};
use crate::error::{Error, Result};
use crate::playback_buffer::PlaybackBuffer;
use crate::ring_buffer::RingBuffer;
use crate::timeline::{TimelineArtifact, TimelineEvent, TranscriptEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrchestratorState {
    Streaming,
    BargeResetting,
    Terminal,
}

/// A clonable, `Send + Sync` handle that lets any task interrupt a running [`Orchestrator`].
///
/// Obtained via [`Orchestrator::barge_in_handle`] *before* calling [`Orchestrator::stream`] —
/// the handle only shares the signal's atomics, never the orchestrator itself, so it sidesteps
/// the borrow conflict a `&self` method would otherwise have with `stream`'s `&mut self`.
#[derive(Clone)]
pub struct BargeIn {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl BargeIn {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Raise the one-shot signal. Idempotent: signalling twice before it is observed has the
    /// same effect as signalling once.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// A record of a barge-in driven reset, kept alongside the ordinary pull timeline.
///
/// Not part of [`TimelineEvent`] or the JSON timeline artifact — the artifact's schema is
/// reserved for replayable pull records (see §6 of the contract this crate implements) — but
/// exposed so callers and tests can assert a reset happened exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BargeInReset {
    /// The chunk id that had most recently been yielded when the reset occurred.
    pub last_chunk_id: Option<u64>,
}

/// Drives one utterance: pulls from `A`, paces via a [`ChunkLadder`], tracks queued depth via a
/// [`PlaybackBuffer`] (or [`RingBuffer`] if routed through one), and yields a stream of
/// [`AudioChunk`]s.
///
/// Generic over the concrete adapter rather than `dyn`-dispatched, so a single orchestrator
/// instance never pays for dynamic dispatch on its hot path.
pub struct Orchestrator<A: Adapter> {
    adapter: A,
    buffer: PlaybackBuffer,
    ladder: ChunkLadder,
    ring: Option<RingBuffer>,
    comfort_band: (f64, f64),
    barge_in: BargeIn,
    events: Vec<TimelineEvent>,
    transcript: Vec<TranscriptEntry>,
    resets: Vec<BargeInReset>,
    next_chunk_id: u64,
}

impl<A: Adapter> Orchestrator<A> {
    /// Build a new orchestrator for one utterance.
    ///
    /// `ladder` defaults to [`ChunkLadder::default`] and `comfort_band` to
    /// [`DEFAULT_COMFORT_BAND`] when not overridden via [`Self::with_ladder`] /
    /// [`Self::with_comfort_band`].
    pub fn new(adapter: A, buffer: PlaybackBuffer, ring: Option<RingBuffer>) -> Self {
        Self {
            adapter,
            buffer,
            ladder: ChunkLadder::default(),
            ring,
            comfort_band: DEFAULT_COMFORT_BAND,
            barge_in: BargeIn::new(),
            events: Vec::new(),
            transcript: Vec::new(),
            resets: Vec::new(),
            next_chunk_id: 0,
        }
    }

    pub fn with_ladder(mut self, ladder: ChunkLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_comfort_band(mut self, band: (f64, f64)) -> Self {
        self.comfort_band = band;
        self
    }

    /// All timeline events recorded so far, in `chunk_id` order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// All barge-in driven resets recorded so far.
    pub fn barge_in_resets(&self) -> &[BargeInReset] {
        &self.resets
    }

    /// The playback buffer's current state.
    pub fn buffer(&self) -> &PlaybackBuffer {
        &self.buffer
    }

    /// The ring buffer, if this orchestrator routes PCM through one.
    pub fn ring(&self) -> Option<&RingBuffer> {
        self.ring.as_ref()
    }

    /// A clonable handle that can raise the barge-in signal from any task.
    ///
    /// Take this *before* calling [`Self::stream`], since `stream` borrows `self` mutably for
    /// its whole lifetime.
    pub fn barge_in_handle(&self) -> BargeIn {
        self.barge_in.clone()
    }

    /// Raise the barge-in signal directly, when no concurrent access to `self` is needed.
    pub fn signal_barge_in(&self) {
        self.barge_in.signal();
    }

    /// Append a transcript entry, stamped with the current wall-clock time.
    pub fn log_transcript(&mut self, text: impl Into<String>) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.transcript.push(TranscriptEntry {
            timestamp,
            text: text.into(),
        });
    }

    /// Write the timeline artifact to `path` as pretty-printed JSON, and the accumulated
    /// transcript to a sibling `transcripts.json`. Parent directories are created as needed.
    pub fn save_timeline(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let artifact = TimelineArtifact::new(self.events.clone());
        std::fs::write(path, serde_json::to_string_pretty(&artifact)?)?;

        let transcripts_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("transcripts.json");
        std::fs::write(transcripts_path, serde_json::to_string_pretty(&self.transcript)?)?;
        Ok(())
    }

    /// Drive synthesis, yielding chunks as they're produced.
    ///
    /// `on_event` is invoked synchronously after each event is recorded and before the chunk's
    /// PCM is routed downstream, matching the ordering contract: record → callback → route →
    /// yield → adapt.
    pub fn stream<'a, F>(&'a mut self, mut on_event: F) -> impl Stream<Item = Result<AudioChunk>> + 'a
    where
        F: FnMut(&TimelineEvent) + 'a,
    {
        stream::unfold(
            (self, OrchestratorState::Streaming),
            move |(orch, mut state)| {
                let on_event = &mut on_event;
                async move {
                    loop {
                        match state {
                            OrchestratorState::Terminal => return None,
                            OrchestratorState::BargeResetting => {
                                orch.apply_barge_reset().await;
                                state = OrchestratorState::Terminal;
                            }
                            OrchestratorState::Streaming => {
                                if orch.barge_in.take() {
                                    state = OrchestratorState::BargeResetting;
                                    continue;
                                }
                                match orch.pull_one(on_event).await {
                                    Ok((chunk, next_state)) => {
                                        state = next_state;
                                        return Some((Ok(chunk), (orch, state)));
                                    }
                                    Err(err) => {
                                        return Some((Err(err), (orch, OrchestratorState::Terminal)));
                                    }
                                }
                            }
                        }
                    }
                }
            },
        )
    }

    async fn pull_one<F>(&mut self, on_event: &mut F) -> Result<(AudioChunk, OrchestratorState)>
    where
        F: FnMut(&TimelineEvent),
    {
        let window = self.ladder.current();
        // Snapshot the adapter's name before pulling: an adapter that changes identity mid-pull
        // (see the mid-stream-swap scene) should have that transition visible starting on the
        // *next* event, not retroactively applied to the one currently in flight.
        let adapter_name = self.adapter.name();
        let start = Instant::now();
        let chunk = self
            .adapter
            .pull(window)
            .await
            .map_err(Error::adapter_pull)?;
        let render_ms = start.elapsed().as_secs_f64() * 1000.0;

        let event = TimelineEvent::new(self.next_chunk_id, adapter_name, window, render_ms, &chunk);
        self.next_chunk_id += 1;
        self.events.push(event.clone());
        on_event(&event);

        if let Some(ring) = self.ring.as_mut() {
            ring.write(&chunk.pcm);
        } else {
            self.buffer.add(chunk.duration_ms);
        }

        let next_state = if chunk.eos {
            OrchestratorState::Terminal
        } else {
            self.ladder.adapt(self.buffer.depth_ms(), self.comfort_band);
            OrchestratorState::Streaming
        };

        Ok((chunk, next_state))
    }

    async fn apply_barge_reset(&mut self) {
        if let Err(err) = self.adapter.reset().await {
            warn!(error = %err, "adapter reset failed during barge-in");
        }
        self.buffer.reset();
        if let Some(ring) = self.ring.as_mut() {
            ring.reset();
        }
        self.barge_in.take();
        self.resets.push(BargeInReset {
            last_chunk_id: self.next_chunk_id.checked_sub(1),
        });
    }
}
