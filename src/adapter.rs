//! The pull-based contract every synthesis backend must satisfy.
//!
//! Backends are never referenced by name or concrete type in this crate — the orchestrator
//! only ever sees them through the [`Adapter`] trait. Concrete backends (remote LLM-driven
//! synthesis, local vocoders, ...) live outside this crate entirely; see the scene harness'
//! [`crate::scene::mock`] module for the toy adapters used in tests and audits.

use std::any::type_name;

use serde_json::Value;

/// A unit of PCM audio returned by an adapter.
///
/// `pcm` is mono 16-bit signed little-endian PCM. The orchestrator treats it as opaque bytes:
/// it never interprets individual samples except inside the [`crate::stitcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Raw PCM16 little-endian audio data.
    pub pcm: Vec<u8>,

    /// Duration of `pcm` in milliseconds.
    pub duration_ms: f64,

    /// Optional backend-specific metadata (e.g. word boundaries).
    ///
    /// Opaque to the orchestrator and stitcher alike; only `emit_markers` on the stitcher
    /// decides whether this is forwarded to an emitted chunk, never what it contains.
    pub markers: Option<Value>,

    /// End-of-stream marker. When `true` the adapter has no further audio for this prompt.
    pub eos: bool,
}

impl AudioChunk {
    /// Convenience constructor for a non-final chunk with no markers.
    pub fn new(pcm: Vec<u8>, duration_ms: f64) -> Self {
        Self {
            pcm,
            duration_ms,
            markers: None,
            eos: false,
        }
    }

    /// Convenience constructor for the terminal chunk of a stream.
    pub fn eos() -> Self {
        Self {
            pcm: Vec::new(),
            duration_ms: 0.0,
            markers: None,
            eos: true,
        }
    }
}

/// Pluggable synthesis backend used by [`crate::orchestrator::Orchestrator`].
///
/// The orchestrator drives synthesis by repeatedly calling [`Adapter::pull`] with a target
/// chunk size drawn from its [`crate::chunk_ladder::ChunkLadder`]. Implementations must return
/// as soon as a chunk is ready; they may return smaller chunks than requested but must never
/// block waiting for an entire utterance.
///
/// Expressed with native `async fn` in traits rather than `dyn Adapter` + `async-trait`: the
/// orchestrator is generic over a concrete `A: Adapter`, mirroring how this crate's ancestor
/// kept backend dispatch monomorphic instead of reaching for trait objects.
pub trait Adapter: Send {
    /// Produce the next chunk of audio.
    ///
    /// `window` is a positive integer drawn from the chunk ladder, in adapter-native units
    /// (tokens for token-level backends, milliseconds for waveform backends). Adapters may
    /// return less but should never exceed it materially.
    fn pull(&mut self, window: u32) -> impl Future<Output = anyhow::Result<AudioChunk>> + Send;

    /// Abandon all in-flight state so a new pull starts a fresh synthesis of the same prompt.
    ///
    /// Must be idempotent: calling `reset` on an adapter that has nothing to reset is a no-op,
    /// not an error.
    fn reset(&mut self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// An opaque name used for observability (timeline `adapter` field).
    ///
    /// Defaults to a short form of the concrete type name, mirroring the original's
    /// `getattr(adapter, "name", adapter.__class__.__name__)` fallback.
    fn name(&self) -> String {
        short_type_name::<Self>()
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Toy;

    impl Adapter for Toy {
        async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
            Ok(AudioChunk::eos())
        }

        async fn reset(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_name_uses_short_type_name() {
        assert_eq!(Toy.name(), "Toy");
    }

    #[test]
    fn eos_chunk_has_no_pcm() {
        let chunk = AudioChunk::eos();
        assert!(chunk.pcm.is_empty());
        assert!(chunk.eos);
    }
}
