use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{MockviewError, Result};
use crate::media::{encode_jpeg, MediaCapture};
use crate::scoring::{
    LiveInsights, MetricSmoother, MetricsSnapshot, ScoringBackend, ScoringEnvelope, ScoringRequest,
};
use crate::store::{LocalStore, QuestionRef, Rubric, Session, SessionMode, SessionPatch};

use super::sequencer::{Advance, QuestionSequencer, QUESTION_DURATION_SECS};

/// Configuration for one live interview run
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Unique session identifier
    pub session_id: String,
    pub mode: SessionMode,
    /// Behavioral prompts; an empty list falls back to the defaults
    pub questions: Vec<String>,
    /// Answer window per question, in seconds
    pub question_duration_secs: u64,
    /// Interval between frame samples
    pub sample_interval: Duration,
    /// Cadence of the countdown driver
    pub countdown_interval: Duration,
    /// Tail of the running transcript sent with each sample
    pub transcript_tail_chars: usize,
    /// JPEG quality for uploaded frames
    pub jpeg_quality: u8,
    pub smoothing_alpha: f64,
    pub metric_history_cap: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", Uuid::new_v4()),
            mode: SessionMode::Behavioral,
            questions: Vec::new(),
            question_duration_secs: QUESTION_DURATION_SECS,
            sample_interval: Duration::from_millis(2000),
            countdown_interval: Duration::from_secs(1),
            transcript_tail_chars: 1000,
            jpeg_quality: 70,
            smoothing_alpha: crate::scoring::SMOOTHING_ALPHA,
            metric_history_cap: crate::scoring::METRIC_HISTORY_CAP,
        }
    }
}

/// Point-in-time view of a live session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub session_id: String,
    pub mode: SessionMode,
    pub running: bool,
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub question_index: Option<usize>,
    pub question_count: usize,
    pub current_question: Option<String>,
    pub remaining_secs: u64,
    pub metrics: MetricsSnapshot,
    pub insights: Option<LiveInsights>,
    pub transcript_chars: usize,
    pub samples_scored: usize,
    pub last_error: Option<String>,
}

/// Running transcript, kept both per-question and session-wide.
///
/// The per-question buffer is what answers capture and what the scorer sees
/// as context; it is cleared at every advance. The session-wide buffer feeds
/// the final rubric.
#[derive(Default)]
struct TranscriptLog {
    current: String,
    full: String,
}

impl TranscriptLog {
    fn append(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.current.is_empty() {
            self.current.push(' ');
        }
        self.current.push_str(text);
        if !self.full.is_empty() {
            self.full.push(' ');
        }
        self.full.push_str(text);
    }

    fn clear_current(&mut self) {
        self.current.clear();
    }
}

struct LiveInner {
    config: LiveConfig,
    capture: MediaCapture,
    scoring: Arc<dyn ScoringBackend>,
    store: Arc<LocalStore>,
    started_at: Mutex<DateTime<Utc>>,
    /// Guard flag: scoring results landing after stop are discarded
    running: AtomicBool,
    /// Finalization runs at most once; late callers wait, then observe done
    finalize_done: Mutex<bool>,
    samples_scored: AtomicUsize,
    transcript: Mutex<TranscriptLog>,
    smoother: Mutex<MetricSmoother>,
    sequencer: Mutex<QuestionSequencer>,
    insights: Mutex<Option<LiveInsights>>,
    last_error: Mutex<Option<String>>,
}

/// A live behavioral interview session
///
/// Runs two independent timers: the sampling tick uploads a (frame, audio,
/// transcript) bundle for scoring every couple of seconds, and the countdown
/// tick drives the question sequencer at 1 Hz. Reaching the end of the
/// question list finalizes the session: media is released, the score and
/// duration are computed, and the session record plus aggregate stats are
/// persisted.
pub struct LiveInterview {
    inner: Arc<LiveInner>,
    sampler_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
    countdown_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LiveInterview {
    pub fn new(
        config: LiveConfig,
        capture: MediaCapture,
        scoring: Arc<dyn ScoringBackend>,
        store: Arc<LocalStore>,
    ) -> Self {
        let sequencer =
            QuestionSequencer::with_budget(config.questions.clone(), config.question_duration_secs);
        let smoother =
            MetricSmoother::with_tuning(config.smoothing_alpha, config.metric_history_cap);

        Self {
            inner: Arc::new(LiveInner {
                capture,
                scoring,
                store,
                started_at: Mutex::new(Utc::now()),
                running: AtomicBool::new(false),
                finalize_done: Mutex::new(false),
                samples_scored: AtomicUsize::new(0),
                transcript: Mutex::new(TranscriptLog::default()),
                smoother: Mutex::new(smoother),
                sequencer: Mutex::new(sequencer),
                insights: Mutex::new(None),
                last_error: Mutex::new(None),
                config,
            }),
            sampler_handle: std::sync::Mutex::new(None),
            countdown_handle: std::sync::Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.config.session_id
    }

    /// Acquire media, open the first question window, and start both timers
    ///
    /// Media-access failures abort the start and carry the device's own
    /// message so the caller can surface it.
    pub async fn start(&self) -> Result<()> {
        if self.inner.running.load(Ordering::SeqCst) {
            warn!("Interview session already started");
            return Ok(());
        }
        if *self.inner.finalize_done.lock().await {
            return Err(MockviewError::Other(
                "interview session already finished".to_string(),
            ));
        }

        info!(
            "Starting interview session: {}",
            self.inner.config.session_id
        );

        // Make sure a durable record exists before the run mutates it
        if self
            .inner
            .store
            .get_session(self.inner.config.mode, &self.inner.config.session_id)
            .is_none()
        {
            let question_refs: Vec<QuestionRef> = {
                let sequencer = self.inner.sequencer.lock().await;
                (0..sequencer.question_count())
                    .filter_map(|i| {
                        sequencer.question_at(i).map(|prompt| QuestionRef {
                            id: format!("q-{}", i + 1),
                            prompt: prompt.to_string(),
                            difficulty: None,
                            kind: Some("behavioral".to_string()),
                            category: None,
                        })
                    })
                    .collect()
            };
            self.inner.store.push_session(Session::new(
                self.inner.config.session_id.clone(),
                self.inner.config.mode,
                question_refs,
            ))?;
        }

        self.inner.capture.start().await?;

        *self.inner.started_at.lock().await = Utc::now();
        self.inner.running.store(true, Ordering::SeqCst);
        {
            let mut sequencer = self.inner.sequencer.lock().await;
            sequencer.begin();
        }

        // Sampling task: one independent scoring upload per tick
        let inner = Arc::clone(&self.inner);
        let sampler = tokio::spawn(async move {
            let period = inner.config.sample_interval;
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            info!("Sampling task started");

            loop {
                ticker.tick().await;
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }
                sample_once(Arc::clone(&inner)).await;
            }

            info!("Sampling task stopped");
        });

        // Countdown task: drives the question sequencer
        let inner = Arc::clone(&self.inner);
        let countdown = tokio::spawn(async move {
            let period = inner.config.countdown_interval;
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            info!("Countdown task started");

            loop {
                ticker.tick().await;
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }

                let transcript = {
                    let log = inner.transcript.lock().await;
                    log.current.clone()
                };
                let advance = {
                    let mut sequencer = inner.sequencer.lock().await;
                    sequencer.tick(&transcript)
                };

                match advance {
                    Some(Advance::Question(index)) => {
                        info!("Answer window expired, advancing to question {}", index + 1);
                        let mut log = inner.transcript.lock().await;
                        log.clear_current();
                    }
                    Some(Advance::Finished) => {
                        info!("Final answer window expired, finishing session");
                        if let Err(e) = finalize(&inner).await {
                            error!("Failed to finalize session: {}", e);
                        }
                        break;
                    }
                    None => {}
                }
            }

            info!("Countdown task stopped");
        });

        *lock_handle(&self.sampler_handle) = Some(sampler);
        *lock_handle(&self.countdown_handle) = Some(countdown);

        info!("Interview session started");

        Ok(())
    }

    /// Manual advance, same transition as a countdown timeout
    pub async fn next_question(&self) -> Result<Advance> {
        if !self.inner.running.load(Ordering::SeqCst) {
            return Err(MockviewError::Other(
                "interview session is not running".to_string(),
            ));
        }

        let transcript = {
            let log = self.inner.transcript.lock().await;
            log.current.clone()
        };
        let advance = {
            let mut sequencer = self.inner.sequencer.lock().await;
            sequencer.advance(&transcript)
        };

        match advance {
            Advance::Question(index) => {
                info!("Advancing to question {}", index + 1);
                let mut log = self.inner.transcript.lock().await;
                log.clear_current();
            }
            Advance::Finished => {
                finalize(&self.inner).await?;
            }
        }

        Ok(advance)
    }

    /// Finish the session and persist the record
    pub async fn stop(&self) -> Result<Session> {
        finalize(&self.inner).await?;

        // Both timers have seen the stopped flag or are idle ticks; reap them
        if let Some(task) = lock_handle(&self.sampler_handle).take() {
            task.abort();
        }
        if let Some(task) = lock_handle(&self.countdown_handle).take() {
            task.abort();
        }

        self.inner
            .store
            .get_session(self.inner.config.mode, &self.inner.config.session_id)
            .ok_or_else(|| {
                MockviewError::Other("finished session missing from store".to_string())
            })
    }

    pub async fn stats(&self) -> LiveStats {
        let (question_index, question_count, current_question, remaining_secs) = {
            let sequencer = self.inner.sequencer.lock().await;
            (
                sequencer.current_index(),
                sequencer.question_count(),
                sequencer.current_question().map(str::to_string),
                sequencer.remaining_secs(),
            )
        };

        LiveStats {
            session_id: self.inner.config.session_id.clone(),
            mode: self.inner.config.mode,
            running: self.inner.running.load(Ordering::SeqCst),
            finished: *self.inner.finalize_done.lock().await,
            started_at: *self.inner.started_at.lock().await,
            question_index,
            question_count,
            current_question,
            remaining_secs,
            metrics: self.inner.smoother.lock().await.snapshot(),
            insights: self.inner.insights.lock().await.clone(),
            transcript_chars: self.inner.transcript.lock().await.full.chars().count(),
            samples_scored: self.inner.samples_scored.load(Ordering::SeqCst),
            last_error: self.inner.last_error.lock().await.clone(),
        }
    }

    /// Session-wide transcript accumulated so far
    pub async fn transcript(&self) -> String {
        self.inner.transcript.lock().await.full.clone()
    }

    /// Smoothed snapshots retained for the history display
    pub async fn metric_history(&self) -> Vec<MetricsSnapshot> {
        self.inner
            .smoother
            .lock()
            .await
            .history()
            .iter()
            .copied()
            .collect()
    }
}

impl Drop for LiveInterview {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(task) = lock_handle(&self.sampler_handle).take() {
            task.abort();
        }
        if let Some(task) = lock_handle(&self.countdown_handle).take() {
            task.abort();
        }
    }
}

fn lock_handle(
    handle: &std::sync::Mutex<Option<JoinHandle<()>>>,
) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}

/// One sampling tick: grab the latest frame, bundle it, and fire an
/// independent scoring request
async fn sample_once(inner: Arc<LiveInner>) {
    // Source not ready yet: skip the tick silently
    let Some(frame) = inner.capture.latest_ready_frame().await else {
        return;
    };

    let frame_jpeg = match encode_jpeg(&frame, inner.config.jpeg_quality) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode frame: {}", e);
            let mut last_error = inner.last_error.lock().await;
            *last_error = Some(e.to_string());
            return;
        }
    };

    let audio_wav = match inner.capture.latest_audio_wav().await {
        Ok(wav) => wav,
        Err(e) => {
            warn!("Failed to package audio chunk: {}", e);
            None
        }
    };

    let transcript_tail = {
        let log = inner.transcript.lock().await;
        tail_chars(&log.current, inner.config.transcript_tail_chars)
    };

    let request = ScoringRequest {
        session_id: inner.config.session_id.clone(),
        frame_jpeg,
        audio_wav,
        transcript_tail,
    };

    // No queueing and no cancellation: a slow response never delays the next
    // tick, and out-of-order completion is accepted
    tokio::spawn(async move {
        match inner.scoring.score(request).await {
            Ok(envelope) => apply_envelope(&inner, envelope).await,
            Err(e) => {
                warn!("Scoring call failed: {}", e);
                let mut last_error = inner.last_error.lock().await;
                *last_error = Some(e.to_string());
            }
        }
    });
}

async fn apply_envelope(inner: &Arc<LiveInner>, envelope: ScoringEnvelope) {
    // A result landing after stop is discarded
    if !inner.running.load(Ordering::SeqCst) {
        debug!("Discarding scoring result for stopped session");
        return;
    }

    if !envelope.ok {
        // Failed analysis: the zeroed metrics it carries are not an observation
        let message = envelope
            .error
            .unwrap_or_else(|| "scoring endpoint reported failure".to_string());
        warn!("Scoring endpoint error: {}", message);
        let mut last_error = inner.last_error.lock().await;
        *last_error = Some(message);
        return;
    }

    let observation = envelope.data.metrics.observation();
    {
        let mut smoother = inner.smoother.lock().await;
        smoother.observe(observation);
    }
    inner.samples_scored.fetch_add(1, Ordering::SeqCst);

    if let Some(text) = &envelope.data.transcript {
        let mut log = inner.transcript.lock().await;
        log.append(text);
    }

    if let Some(insights) = envelope.data.insights() {
        let mut slot = inner.insights.lock().await;
        *slot = Some(insights);
    }
}

/// Finish the session: release media, compute score and duration, persist
/// the record, and fold it into the aggregate stats. Runs at most once.
async fn finalize(inner: &Arc<LiveInner>) -> Result<()> {
    inner.running.store(false, Ordering::SeqCst);

    let mut done = inner.finalize_done.lock().await;
    if *done {
        return Ok(());
    }

    info!("Finalizing interview session: {}", inner.config.session_id);

    if let Err(e) = inner.capture.stop().await {
        error!("Failed to release media capture: {}", e);
    }

    let ended_at = Utc::now();
    let started_at = *inner.started_at.lock().await;
    let elapsed_ms = (ended_at - started_at).num_milliseconds().max(0) as f64;
    let duration_min = duration_minutes(elapsed_ms);

    let snapshot = {
        let smoother = inner.smoother.lock().await;
        smoother.snapshot()
    };
    let score = behavioral_score(&snapshot);

    let transcript_full = {
        let log = inner.transcript.lock().await;
        log.full.clone()
    };
    let answers = {
        let mut sequencer = inner.sequencer.lock().await;
        sequencer.take_answers()
    };

    let patch = SessionPatch {
        ended_at: Some(ended_at),
        duration_min: Some(duration_min),
        score: Some(score),
        rubric: Some(Rubric {
            metrics: snapshot,
            transcript: transcript_full,
            question_answers: answers,
        }),
    };

    let updated =
        inner
            .store
            .update_session(inner.config.mode, &inner.config.session_id, patch)?;
    if !updated {
        warn!(
            "Session {} was missing from the store at finalization",
            inner.config.session_id
        );
    }

    let stats = inner.store.record_completion(score, duration_min)?;
    info!(
        "Session {} finished: score={}, duration={}min ({} sessions completed)",
        inner.config.session_id, score, duration_min, stats.completed
    );

    *done = true;
    Ok(())
}

/// Behavioral-mode score: unweighted mean of the three speech-facing
/// channels, rounded to an integer
pub fn behavioral_score(metrics: &MetricsSnapshot) -> u32 {
    let mean = (metrics.speech_clarity + metrics.tone_confidence + metrics.engagement) / 3.0;
    mean.round() as u32
}

/// Wall-clock minutes for a finished session, never reported as zero
pub fn duration_minutes(elapsed_ms: f64) -> u64 {
    ((elapsed_ms / 60_000.0).round() as u64).max(1)
}

/// Last `max_chars` characters of the running transcript
fn tail_chars(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}
