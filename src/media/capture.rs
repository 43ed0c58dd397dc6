use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::Result;

use super::backend::{MediaBackend, MediaFrame, VideoFrame};
use super::chunk::{ChunkPolicy, RollingChunker};

/// Scoped camera + microphone acquisition
///
/// `start()` acquires the backend stream and spawns a consumer task that
/// retains only the latest ready video frame and the most recent completed
/// audio chunk. `stop()` releases the backend on every exit path so the
/// device never stays held by a finished session.
pub struct MediaCapture {
    backend: Arc<Mutex<Box<dyn MediaBackend>>>,

    /// Whether capture is currently active
    is_capturing: Arc<AtomicBool>,

    /// Latest ready video frame (older frames are replaced, never queued)
    latest_frame: Arc<Mutex<Option<VideoFrame>>>,

    /// Rolling recorder holding the most recent completed audio chunk
    chunker: Arc<Mutex<RollingChunker>>,

    /// Handle for the stream consumer task
    consumer_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MediaCapture {
    pub fn new(backend: Box<dyn MediaBackend>, chunk_policy: ChunkPolicy) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            is_capturing: Arc::new(AtomicBool::new(false)),
            latest_frame: Arc::new(Mutex::new(None)),
            chunker: Arc::new(Mutex::new(RollingChunker::new(chunk_policy))),
            consumer_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Acquire the media stream and begin retaining frames
    ///
    /// Fails with a media-access error when the backend cannot open the
    /// device; the underlying message is preserved for the caller to surface.
    pub async fn start(&self) -> Result<()> {
        if self.is_capturing.load(Ordering::SeqCst) {
            warn!("Media capture already started");
            return Ok(());
        }

        let mut rx = {
            let mut backend = self.backend.lock().await;
            backend.start().await?
        };

        self.is_capturing.store(true, Ordering::SeqCst);

        let is_capturing = Arc::clone(&self.is_capturing);
        let latest_frame = Arc::clone(&self.latest_frame);
        let chunker = Arc::clone(&self.chunker);

        let consumer = tokio::spawn(async move {
            info!("Media consumer task started");

            while let Some(frame) = rx.recv().await {
                if !is_capturing.load(Ordering::SeqCst) {
                    break;
                }

                match frame {
                    MediaFrame::Video(video) => {
                        if video.ready {
                            let mut latest = latest_frame.lock().await;
                            *latest = Some(video);
                        }
                    }
                    MediaFrame::Audio(audio) => {
                        let mut chunker = chunker.lock().await;
                        chunker.push(audio);
                    }
                }
            }

            info!("Media consumer task stopped");
        });

        {
            let mut handle = self.consumer_handle.lock().await;
            *handle = Some(consumer);
        }

        Ok(())
    }

    /// Release the device and stop the consumer task
    pub async fn stop(&self) -> Result<()> {
        if !self.is_capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        {
            let mut backend = self.backend.lock().await;
            if let Err(e) = backend.stop().await {
                error!("Failed to stop media backend: {}", e);
            }
        }

        {
            let mut handle = self.consumer_handle.lock().await;
            if let Some(task) = handle.take() {
                task.abort();
            }
        }

        info!("Media capture released");

        Ok(())
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    /// Latest ready video frame, if the source has produced one
    pub async fn latest_ready_frame(&self) -> Option<VideoFrame> {
        let latest = self.latest_frame.lock().await;
        latest.clone()
    }

    /// Most recent completed audio chunk as a WAV blob, if any
    pub async fn latest_audio_wav(&self) -> Result<Option<Vec<u8>>> {
        let chunker = self.chunker.lock().await;
        chunker.latest_wav()
    }

    /// Number of audio chunks completed so far
    pub async fn chunks_completed(&self) -> usize {
        let chunker = self.chunker.lock().await;
        chunker.chunks_completed()
    }
}
