//! Overlap-add joiner that turns chunked PCM into a continuous waveform.
//!
//! The stitcher is a synchronous, stateful filter rather than an async boundary: callers decide
//! whether to run it inline (one [`Stitcher::push`] call per chunk as the orchestrator yields
//! them) or as a batch pass over an already-collected sequence — see the scene harness for the
//! latter.

use crate::adapter::AudioChunk;

/// Overlap-add joiner.
///
/// Holds the trailing samples ("tail") of the most recently emitted window so the next chunk
/// can be crossfaded against them.
pub struct Stitcher {
    sample_rate: u32,
    overlap_samples: usize,
    emit_markers: bool,
    tail: Vec<i16>,
}

impl Stitcher {
    /// Create a stitcher with no crossfade overlap and markers suppressed.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            overlap_samples: 0,
            emit_markers: false,
            tail: Vec::new(),
        }
    }

    /// Set the crossfade overlap, in milliseconds.
    pub fn with_overlap_ms(mut self, overlap_ms: f64) -> Self {
        self.overlap_samples = (overlap_ms * self.sample_rate as f64 / 1000.0) as usize;
        self
    }

    /// Forward input markers to emitted chunks when `emit` is true; suppress them otherwise.
    pub fn with_emit_markers(mut self, emit: bool) -> Self {
        self.emit_markers = emit;
        self
    }

    /// Feed one input chunk, returning zero or more chunks to emit downstream in order.
    ///
    /// Zero chunks come back exactly when the drift guard fires (an overlap-sized or smaller
    /// non-EOS chunk gets folded entirely into the tail). One chunk is the common case. An EOS
    /// input always yields exactly one final chunk and clears the stitcher's state.
    pub fn push(&mut self, chunk: &AudioChunk) -> Vec<AudioChunk> {
        let pcm = samples_from_bytes(&chunk.pcm);

        let working = if self.tail.is_empty() {
            pcm
        } else if self.overlap_samples > 0 {
            let ov = self.overlap_samples.min(self.tail.len()).min(pcm.len());
            crossfade_join(&self.tail, &pcm, ov)
        } else {
            let mut joined = std::mem::take(&mut self.tail);
            joined.extend_from_slice(&pcm);
            joined
        };

        if chunk.eos {
            self.tail.clear();
            return vec![self.emit(working, chunk, true)];
        }

        if self.overlap_samples > 0 {
            if working.len() <= self.overlap_samples {
                self.tail = working;
                return Vec::new();
            }
            let split = working.len() - self.overlap_samples;
            self.tail = working[split..].to_vec();
            vec![self.emit(working[..split].to_vec(), chunk, false)]
        } else {
            self.tail.clear();
            vec![self.emit(working, chunk, false)]
        }
    }

    /// Flush any buffered tail as a final EOS chunk, for streams that end without an explicit
    /// EOS marker. Returns `None` if there is nothing left to flush.
    pub fn finish(&mut self) -> Option<AudioChunk> {
        if self.tail.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.tail);
        let duration_ms = samples_to_ms(tail.len(), self.sample_rate);
        Some(AudioChunk {
            pcm: bytes_from_samples(&tail),
            duration_ms,
            markers: None,
            eos: true,
        })
    }

    fn emit(&self, samples: Vec<i16>, source: &AudioChunk, eos: bool) -> AudioChunk {
        let duration_ms = samples_to_ms(samples.len(), self.sample_rate);
        let markers = if self.emit_markers {
            source.markers.clone()
        } else {
            None
        };
        AudioChunk {
            pcm: bytes_from_samples(&samples),
            duration_ms,
            markers,
            eos,
        }
    }
}

fn samples_to_ms(n_samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    n_samples as f64 / sample_rate as f64 * 1000.0
}

fn samples_from_bytes(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

fn bytes_from_samples(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Join `tail` and `head` with an `ov`-sample linear crossfade at the seam.
///
/// Produces `tail[..len-ov] ++ crossfade(tail[-ov..], head[..ov]) ++ head[ov..]`. The crossfade
/// itself is computed in a widened `i32` accumulator so the two linear ramps (`(ov-i)/ov` and
/// `i/ov`) always sum to exactly `ov`, keeping the mix numerically exact before truncating back
/// to `i16`.
fn crossfade_join(tail: &[i16], head: &[i16], ov: usize) -> Vec<i16> {
    if ov == 0 {
        let mut out = Vec::with_capacity(tail.len() + head.len());
        out.extend_from_slice(tail);
        out.extend_from_slice(head);
        return out;
    }

    let keep_len = tail.len() - ov;
    let mut out = Vec::with_capacity(keep_len + ov + (head.len() - ov));
    out.extend_from_slice(&tail[..keep_len]);

    for i in 0..ov {
        let fade_out_weight = (ov - i) as i32;
        let fade_in_weight = i as i32;
        let mixed =
            (tail[keep_len + i] as i32 * fade_out_weight + head[i] as i32 * fade_in_weight)
                / ov as i32;
        out.push(mixed.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    out.extend_from_slice(&head[ov..]);
    out
}
