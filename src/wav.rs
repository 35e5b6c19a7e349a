//! WAV framing: a manual RIFF header builder for streaming output of unknown length, and a
//! `hound`-backed writer for the finalized files the scene harness and `replay` binary produce.

use std::io::Write;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const CHANNELS: u16 = 1;
const BLOCK_ALIGN: u16 = (CHANNELS as u32 * BITS_PER_SAMPLE as u32 / 8) as u16;

/// Build a 44-byte RIFF/WAVE header for a stream of unknown total length.
///
/// Both the RIFF chunk size and the `data` chunk size are set to `0xFFFFFFFF`, the conventional
/// placeholder for "length not yet known" — a consumer reading this header live must keep
/// reading PCM frames until the connection closes rather than relying on the declared length.
pub fn streaming_header(sample_rate: u32) -> [u8; HEADER_LEN] {
    build_header(sample_rate, 0xFFFF_FFFF, 0xFFFF_FFFF)
}

/// Write the unknown-length streaming header to `writer`, for hosts that forward PCM to a live
/// client as it's produced rather than waiting to finalize a file.
///
/// Call this once, before writing any PCM frames; the caller then writes each [`crate::AudioChunk`]'s
/// `pcm` bytes to the same writer as the orchestrator yields them (see
/// [`crate::scene::stream_scene`]).
pub fn write_streaming_header(writer: &mut impl Write, sample_rate: u32) -> Result<()> {
    writer.write_all(&streaming_header(sample_rate))?;
    Ok(())
}

/// Build a 44-byte RIFF/WAVE header with the correct, final lengths for `data_len` bytes of PCM.
pub fn finalized_header(sample_rate: u32, data_len: u32) -> [u8; HEADER_LEN] {
    let riff_len = data_len.saturating_add(HEADER_LEN as u32 - 8);
    build_header(sample_rate, riff_len, data_len)
}

fn build_header(sample_rate: u32, riff_len: u32, data_len: u32) -> [u8; HEADER_LEN] {
    let byte_rate = sample_rate * BLOCK_ALIGN as u32;
    let mut header = [0u8; HEADER_LEN];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_len.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM format tag
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// Write `pcm` (mono PCM16 little-endian) to `path` as a finalized WAV file.
pub fn write_wav_file(path: impl AsRef<Path>, sample_rate: u32, pcm: &[u8]) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(hound_to_io)?;
    for frame in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([frame[0], frame[1]]);
        writer.write_sample(sample).map_err(hound_to_io)?;
    }
    writer.finalize().map_err(hound_to_io)?;
    Ok(())
}

/// Write a finalized WAV (header + PCM) to an in-memory buffer, for callers that want bytes
/// rather than a file (the `replay` binary's stdout mode, and unit tests).
pub fn write_wav_bytes(sample_rate: u32, pcm: &[u8]) -> Vec<u8> {
    let header = finalized_header(sample_rate, pcm.len() as u32);
    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(pcm);
    out
}

fn hound_to_io(err: hound::Error) -> crate::error::Error {
    crate::error::Error::Io(std::io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_header_uses_unknown_length_sentinels() {
        let header = streaming_header(16_000);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 0xFFFF_FFFF);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 0xFFFF_FFFF);
    }

    #[test]
    fn write_streaming_header_then_frames_is_header_followed_by_pcm() {
        let mut out = Vec::new();
        write_streaming_header(&mut out, 16_000).unwrap();
        out.write_all(&[1, 0, 2, 0]).unwrap();

        assert_eq!(out.len(), HEADER_LEN + 4);
        assert_eq!(&out[..HEADER_LEN], &streaming_header(16_000)[..]);
        assert_eq!(&out[HEADER_LEN..], &[1, 0, 2, 0]);
    }

    #[test]
    fn streaming_header_encodes_fmt_chunk_correctly() {
        let header = streaming_header(16_000);
        assert_eq!(u32::from_le_bytes(header[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(header[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(header[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(header[24..28].try_into().unwrap()), 16_000);
        assert_eq!(u32::from_le_bytes(header[28..32].try_into().unwrap()), 32_000);
        assert_eq!(u16::from_le_bytes(header[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(header[34..36].try_into().unwrap()), 16);
    }

    #[test]
    fn finalized_header_matches_replay_scenario() {
        // Two events of PCM b"\x01\x00" and b"\x02\x00" at 16kHz: a 44-byte header followed by
        // the 4 bytes of concatenated PCM.
        let pcm = [1u8, 0, 2, 0];
        let bytes = write_wav_bytes(16_000, &pcm);
        assert_eq!(bytes.len(), 44 + 4);
        assert_eq!(&bytes[44..], &pcm);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 4);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 4);
    }

    #[test]
    fn write_wav_file_round_trips_through_hound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let pcm = [1u8, 0, 2, 0, 3, 0];
        write_wav_file(&path, 8_000, &pcm).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3]);
    }
}
