//! Deterministic mock adapters used by the scene harness, audits, and as orchestrator test
//! fixtures. Each scene owns its own concrete adapter type — no trait objects needed, since a
//! scene always constructs the adapter it runs.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::adapter::{Adapter, AudioChunk};

fn pcm16_tone(byte: u8, samples: usize) -> Vec<u8> {
    std::iter::repeat([byte, 0x00]).take(samples).flatten().collect()
}

/// Pauses 50ms before its first chunk (simulating backend warm-up), then emits `total` uniform
/// 10ms chunks before ending the stream.
pub struct ColdStartAdapter {
    total: u32,
    sent: u32,
}

impl ColdStartAdapter {
    pub fn new(total: u32) -> Self {
        Self { total, sent: 0 }
    }
}

impl Default for ColdStartAdapter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Adapter for ColdStartAdapter {
    async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
        if self.sent == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.sent >= self.total {
            return Ok(AudioChunk::eos());
        }
        self.sent += 1;
        let eos = self.sent >= self.total;
        Ok(AudioChunk {
            pcm: pcm16_tone(0x01, 160),
            duration_ms: 10.0,
            markers: None,
            eos,
        })
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "cold_start".to_owned()
    }
}

/// Emits many uniform 10ms chunks to simulate a long narration.
pub struct LongReadAdapter {
    total: u32,
    sent: u32,
}

impl LongReadAdapter {
    pub fn new(total: u32) -> Self {
        Self { total, sent: 0 }
    }
}

impl Default for LongReadAdapter {
    fn default() -> Self {
        Self::new(60)
    }
}

impl Adapter for LongReadAdapter {
    async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
        if self.sent >= self.total {
            return Ok(AudioChunk::eos());
        }
        self.sent += 1;
        let eos = self.sent >= self.total;
        Ok(AudioChunk {
            pcm: pcm16_tone(0x02, 160),
            duration_ms: 10.0,
            markers: None,
            eos,
        })
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "long_read".to_owned()
    }
}

/// Changes its reported name from `adapter_a` to `adapter_b` partway through a fixed-length
/// stream, simulating a backend handoff mid-utterance.
pub struct SwapAdapter {
    name: String,
    switch_after: u32,
    total: u32,
    sent: u32,
}

impl SwapAdapter {
    pub fn new(switch_after: u32, total: u32) -> Self {
        Self {
            name: "adapter_a".to_owned(),
            switch_after,
            total,
            sent: 0,
        }
    }
}

impl Default for SwapAdapter {
    fn default() -> Self {
        Self::new(3, 6)
    }
}

impl Adapter for SwapAdapter {
    async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
        if self.sent >= self.total {
            return Ok(AudioChunk::eos());
        }
        self.sent += 1;
        let byte = if self.name == "adapter_a" { 0x03 } else { 0x04 };
        let pcm = pcm16_tone(byte, 160);
        if self.sent == self.switch_after {
            self.name = "adapter_b".to_owned();
        }
        let eos = self.sent >= self.total;
        Ok(AudioChunk {
            pcm,
            duration_ms: 10.0,
            markers: None,
            eos,
        })
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Emits chunks forever (until the harness signals barge-in) and records whether it was reset.
pub struct BargeAdapter {
    total: u32,
    sent: u32,
    reset_called: Arc<AtomicBool>,
}

impl BargeAdapter {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            sent: 0,
            reset_called: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clone of the reset flag, to be kept by the caller before handing the adapter over to
    /// an [`crate::orchestrator::Orchestrator`] (which takes ownership of it).
    pub fn reset_flag(&self) -> Arc<AtomicBool> {
        self.reset_called.clone()
    }

    /// The number of chunks this adapter was configured to emit before EOS.
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl Default for BargeAdapter {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Adapter for BargeAdapter {
    async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
        if self.sent >= self.total {
            return Ok(AudioChunk::eos());
        }
        self.sent += 1;
        Ok(AudioChunk::new(pcm16_tone(0x05, 160), 10.0))
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        self.reset_called.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> String {
        "barge_in".to_owned()
    }
}

/// Emits exactly two short chunks, the second carrying `eos`, then goes silent.
pub struct BreathingAdapter {
    chunks: VecDeque<AudioChunk>,
}

impl Default for BreathingAdapter {
    fn default() -> Self {
        let mut chunks = VecDeque::new();
        chunks.push_back(AudioChunk::new(pcm16_tone(0x01, 160), 10.0));
        chunks.push_back(AudioChunk {
            pcm: pcm16_tone(0x01, 160),
            duration_ms: 10.0,
            markers: None,
            eos: true,
        });
        Self { chunks }
    }
}

impl Adapter for BreathingAdapter {
    async fn pull(&mut self, _window: u32) -> anyhow::Result<AudioChunk> {
        Ok(self.chunks.pop_front().unwrap_or_else(AudioChunk::eos))
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "breathing_room".to_owned()
    }
}
