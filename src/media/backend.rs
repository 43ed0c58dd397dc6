use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{MockviewError, Result};

/// A single camera frame (RGB8, row-major, interleaved).
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// False while the source is still warming up and has not buffered a full frame
    pub ready: bool,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

/// A slice of microphone audio (i16 PCM, interleaved).
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioChunk {
    /// Chunk duration derived from the sample count
    pub fn duration_ms(&self) -> u64 {
        let channels = self.channels.max(1) as u64;
        let rate = self.sample_rate.max(1) as u64;
        (self.samples.len() as u64 / channels) * 1000 / rate
    }
}

/// Frames emitted by a media backend.
#[derive(Debug, Clone)]
pub enum MediaFrame {
    Video(VideoFrame),
    Audio(AudioChunk),
}

/// Configuration for a media backend
#[derive(Debug, Clone)]
pub struct MediaBackendConfig {
    pub video_width: u32,
    pub video_height: u32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Cadence of emitted frames (affects latency)
    pub frame_interval_ms: u64,
}

impl Default for MediaBackendConfig {
    fn default() -> Self {
        Self {
            video_width: 640,
            video_height: 360,
            sample_rate: 16000,
            channels: 1,
            frame_interval_ms: 100,
        }
    }
}

/// Combined camera + microphone capture backend trait
///
/// Implementations:
/// - Synthetic: deterministic frame/tone generator (tests, demos, headless runs)
/// - Platform device backends plug in behind the same trait
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Start capturing
    ///
    /// Returns a channel receiver that will receive interleaved video and audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<MediaFrame>>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if the backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Media source type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    /// Real camera + microphone
    Device,
    /// Generated frames and silence
    Synthetic,
}

impl MediaSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "device" => Some(Self::Device),
            "synthetic" => Some(Self::Synthetic),
            _ => None,
        }
    }
}

/// Media backend factory
pub struct MediaBackendFactory;

impl MediaBackendFactory {
    /// Create a media backend for the requested source
    pub fn create(source: MediaSource, config: MediaBackendConfig) -> Result<Box<dyn MediaBackend>> {
        match source {
            MediaSource::Device => Err(MockviewError::MediaAccess {
                message: "no camera/microphone backend is available on this build".to_string(),
            }),
            MediaSource::Synthetic => Ok(Box::new(SyntheticBackend::new(config))),
        }
    }
}

/// Deterministic media source emitting gray frames and silent PCM.
///
/// Failure injection mirrors what a real device backend can do: denied
/// permission on start, or a source that never produces a ready frame.
pub struct SyntheticBackend {
    config: MediaBackendConfig,
    is_capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    fail_start: Option<String>,
    /// Frames emitted before the video reports ready
    warmup_frames: u64,
}

impl SyntheticBackend {
    pub fn new(config: MediaBackendConfig) -> Self {
        Self {
            config,
            is_capturing: Arc::new(AtomicBool::new(false)),
            task: None,
            fail_start: None,
            warmup_frames: 1,
        }
    }

    /// Configure the backend to fail on start with the given message
    pub fn with_start_failure(mut self, message: &str) -> Self {
        self.fail_start = Some(message.to_string());
        self
    }

    /// Configure how many frames are emitted before the video is ready
    pub fn with_warmup_frames(mut self, frames: u64) -> Self {
        self.warmup_frames = frames;
        self
    }
}

#[async_trait::async_trait]
impl MediaBackend for SyntheticBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<MediaFrame>> {
        if let Some(message) = &self.fail_start {
            return Err(MockviewError::MediaAccess {
                message: message.clone(),
            });
        }

        let (tx, rx) = mpsc::channel(64);
        self.is_capturing.store(true, Ordering::SeqCst);

        let capturing = Arc::clone(&self.is_capturing);
        let config = self.config.clone();
        let warmup = self.warmup_frames;

        let task = tokio::spawn(async move {
            let interval = Duration::from_millis(config.frame_interval_ms.max(1));
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let pixel_count = (config.video_width * config.video_height * 3) as usize;
            let samples_per_frame =
                (config.sample_rate as u64 * config.channels.max(1) as u64
                    * config.frame_interval_ms
                    / 1000) as usize;

            let mut elapsed_ms: u64 = 0;
            let mut frame_count: u64 = 0;

            loop {
                ticker.tick().await;
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let video = VideoFrame {
                    rgb: vec![0x80; pixel_count],
                    width: config.video_width,
                    height: config.video_height,
                    ready: frame_count >= warmup,
                    timestamp_ms: elapsed_ms,
                };
                if tx.send(MediaFrame::Video(video)).await.is_err() {
                    break;
                }

                let audio = AudioChunk {
                    samples: vec![0i16; samples_per_frame],
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms: elapsed_ms,
                };
                if tx.send(MediaFrame::Audio(audio)).await.is_err() {
                    break;
                }

                elapsed_ms += config.frame_interval_ms;
                frame_count += 1;
            }

            info!("Synthetic media source stopped");
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

impl Drop for SyntheticBackend {
    fn drop(&mut self) {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
