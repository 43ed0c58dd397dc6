use std::io::Cursor;

use crate::error::{MockviewError, Result};

use super::backend::AudioChunk;

/// Rolling chunk policy
#[derive(Debug, Clone)]
pub struct ChunkPolicy {
    /// Duration of each completed chunk (default: 2000 ms)
    pub chunk_duration_ms: u64,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_duration_ms: 2000,
        }
    }
}

/// Rolling audio chunker
///
/// Accumulates PCM from the capture stream and cuts it into fixed-duration
/// chunks. Only the most recent completed chunk is retained; earlier chunks
/// are discarded, not queued. An upload tick takes whatever chunk finished
/// last (last-value-wins).
pub struct RollingChunker {
    policy: ChunkPolicy,
    pending: Vec<i16>,
    pending_started_ms: Option<u64>,
    sample_rate: u32,
    channels: u16,
    latest: Option<AudioChunk>,
    chunks_completed: usize,
}

impl RollingChunker {
    pub fn new(policy: ChunkPolicy) -> Self {
        Self {
            policy,
            pending: Vec::new(),
            pending_started_ms: None,
            sample_rate: 0,
            channels: 0,
            latest: None,
            chunks_completed: 0,
        }
    }

    /// Feed a PCM slice from the capture stream
    pub fn push(&mut self, frame: AudioChunk) {
        if self.pending.is_empty() {
            self.pending_started_ms = Some(frame.timestamp_ms);
            self.sample_rate = frame.sample_rate;
            self.channels = frame.channels;
        }
        self.pending.extend_from_slice(&frame.samples);

        if self.pending_duration_ms() >= self.policy.chunk_duration_ms {
            let started = self.pending_started_ms.take().unwrap_or(frame.timestamp_ms);
            self.latest = Some(AudioChunk {
                samples: std::mem::take(&mut self.pending),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: started,
            });
            self.chunks_completed += 1;
        }
    }

    fn pending_duration_ms(&self) -> u64 {
        let channels = self.channels.max(1) as u64;
        let rate = self.sample_rate.max(1) as u64;
        (self.pending.len() as u64 / channels) * 1000 / rate
    }

    /// Most recent completed chunk, if any
    pub fn latest(&self) -> Option<&AudioChunk> {
        self.latest.as_ref()
    }

    /// Number of chunks completed so far
    pub fn chunks_completed(&self) -> usize {
        self.chunks_completed
    }

    /// Most recent completed chunk packaged as an in-memory WAV blob
    pub fn latest_wav(&self) -> Result<Option<Vec<u8>>> {
        let Some(chunk) = &self.latest else {
            return Ok(None);
        };
        Ok(Some(encode_wav(chunk)?))
    }
}

/// Package an audio chunk as a 16-bit PCM WAV blob
pub fn encode_wav(chunk: &AudioChunk) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: chunk.channels.max(1),
        sample_rate: chunk.sample_rate.max(1),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut writer =
            hound::WavWriter::new(cursor, spec).map_err(|e| MockviewError::ChunkEncode {
                message: e.to_string(),
            })?;

        for &sample in &chunk.samples {
            writer
                .write_sample(sample)
                .map_err(|e| MockviewError::ChunkEncode {
                    message: e.to_string(),
                })?;
        }

        writer.finalize().map_err(|e| MockviewError::ChunkEncode {
            message: e.to_string(),
        })?;
    }

    Ok(buf)
}
