// Integration tests for the live interview pipeline
//
// A synthetic media backend feeds the sampler and a scripted scoring backend
// stands in for the external endpoint, so these tests exercise the real
// timers, the running/stopped guard, and finalization end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockview::error::{MockviewError, Result as MvResult};
use mockview::interview::{Advance, LiveConfig, LiveInterview};
use mockview::media::{ChunkPolicy, MediaBackendConfig, MediaCapture, SyntheticBackend};
use mockview::scoring::{ScoringBackend, ScoringEnvelope, ScoringRequest};
use mockview::store::{LocalStore, SessionMode};
use serde_json::json;
use tempfile::TempDir;

/// Scripted scoring endpoint stand-in
struct MockScoring {
    calls: AtomicUsize,
    /// 1-indexed calls that fail with a transport error
    fail_on: Vec<usize>,
    /// 1-indexed call after which every response is an ok:false envelope
    reject_after: Option<usize>,
    /// Metric value reported on every successful call
    value: f64,
    delay: Duration,
}

impl MockScoring {
    fn steady(value: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Vec::new(),
            reject_after: None,
            value,
            delay: Duration::ZERO,
        }
    }

    fn failing_on(mut self, calls: Vec<usize>) -> Self {
        self.fail_on = calls;
        self
    }

    fn rejecting_after(mut self, call: usize) -> Self {
        self.reject_after = Some(call);
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ScoringBackend for MockScoring {
    async fn score(&self, request: ScoringRequest) -> MvResult<ScoringEnvelope> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail_on.contains(&call) {
            return Err(MockviewError::Scoring {
                message: format!("injected failure on call {call}"),
            });
        }

        if matches!(self.reject_after, Some(after) if call > after) {
            let body = json!({
                "ok": false,
                "error": "analysis failed",
                "data": {
                    "metrics": {
                        "speechClarity": 0, "toneConfidence": 0,
                        "emotionalStability": 0, "eyeContact": 0,
                        "expressions": 0, "engagement": 0
                    }
                },
                "sessionId": request.session_id
            });
            return Ok(serde_json::from_value(body).unwrap());
        }

        let body = json!({
            "ok": true,
            "data": {
                "metrics": {
                    "speechClarity": self.value, "toneConfidence": self.value,
                    "emotionalStability": self.value, "eyeContact": self.value,
                    "expressions": self.value, "engagement": self.value
                },
                "transcript": "hello",
                "observations": "steady presence",
                "topStrength": "clarity",
                "topWeakness": "pace"
            },
            "sessionId": request.session_id
        });
        Ok(serde_json::from_value(body).unwrap())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn prompts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Question {}", i + 1)).collect()
}

fn live_session<S: ScoringBackend + 'static>(
    store: Arc<LocalStore>,
    scoring: Arc<S>,
    questions: usize,
    budget_secs: u64,
) -> LiveInterview {
    let backend = Box::new(SyntheticBackend::new(MediaBackendConfig {
        video_width: 64,
        video_height: 36,
        frame_interval_ms: 10,
        ..Default::default()
    }));
    let capture = MediaCapture::new(
        backend,
        ChunkPolicy {
            chunk_duration_ms: 40,
        },
    );

    let config = LiveConfig {
        session_id: "test-session".to_string(),
        mode: SessionMode::Behavioral,
        questions: prompts(questions),
        question_duration_secs: budget_secs,
        sample_interval: Duration::from_millis(25),
        countdown_interval: Duration::from_millis(25),
        ..Default::default()
    };

    LiveInterview::new(config, capture, scoring, store)
}

/// Poll until the live session has scored at least `samples` uploads
async fn wait_for_samples(session: &LiveInterview, samples: usize) {
    for _ in 0..200 {
        if session.stats().await.samples_scored >= samples {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {samples} scored samples");
}

#[tokio::test]
async fn test_finalization_persists_session_and_stats() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(80.0));

    let session = live_session(Arc::clone(&store), scoring, 2, 120);
    session.start().await?;
    wait_for_samples(&session, 2).await;

    assert_eq!(session.next_question().await?, Advance::Question(1));
    assert_eq!(session.next_question().await?, Advance::Finished);

    let record = store
        .get_session(SessionMode::Behavioral, "test-session")
        .expect("finished session should be persisted");
    assert!(record.ended_at.is_some());
    assert_eq!(record.duration_min, Some(1));
    assert!(record.score.is_some());

    let rubric = record.rubric.expect("rubric should be attached");
    assert_eq!(rubric.question_answers.len(), 2);
    assert_eq!(rubric.question_answers[0].question, "Question 1");
    assert!(rubric.transcript.contains("hello"));

    let stats = store.user_stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.practice_minutes, 1);
    assert!((stats.avg_score - record.score.unwrap() as f64).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_transcript_accumulates_space_joined() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(70.0));

    let session = live_session(Arc::clone(&store), scoring, 1, 120);
    session.start().await?;
    wait_for_samples(&session, 3).await;

    let transcript = session.transcript().await;
    assert!(transcript.contains("hello hello"), "got: {transcript}");

    let stats = session.stats().await;
    assert_eq!(
        stats.insights.as_ref().map(|i| i.top_strength.as_str()),
        Some("clarity")
    );

    session.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_scoring_failure_does_not_break_the_next_tick() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(75.0).failing_on(vec![1]));

    let session = live_session(Arc::clone(&store), Arc::clone(&scoring), 1, 120);
    session.start().await?;

    // The first upload fails; later ticks must keep scoring normally
    wait_for_samples(&session, 2).await;

    let stats = session.stats().await;
    assert!(stats.samples_scored >= 2);
    assert!(scoring.call_count() >= 3);
    assert!(stats.metrics.speech_clarity > 0.0);

    session.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_rejected_envelope_is_not_an_observation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(80.0).rejecting_after(1));

    let session = live_session(Arc::clone(&store), Arc::clone(&scoring), 1, 120);
    session.start().await?;

    wait_for_samples(&session, 1).await;
    let after_success = session.stats().await.metrics.speech_clarity;
    assert!((after_success - 32.0).abs() < 1e-6, "0.6*0 + 0.4*80");

    // Let several ok:false responses land; the zeroed metrics they carry
    // must not drag the average down
    for _ in 0..100 {
        if scoring.call_count() >= 4 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = session.stats().await;
    assert_eq!(stats.samples_scored, 1);
    assert!((stats.metrics.speech_clarity - after_success).abs() < 1e-6);
    assert_eq!(stats.last_error.as_deref(), Some("analysis failed"));

    session.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_in_flight_result_is_discarded_after_stop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(90.0).delayed(Duration::from_millis(300)));

    let session = live_session(Arc::clone(&store), Arc::clone(&scoring), 1, 120);
    session.start().await?;

    // Give the first tick time to fire its (slow) upload, then stop while it
    // is still in flight
    for _ in 0..100 {
        if scoring.call_count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(scoring.call_count() >= 1, "a tick should have fired");

    let record = session.stop().await?;
    assert_eq!(record.score, Some(0));

    // The delayed response resolves after stop and must be ignored
    tokio::time::sleep(Duration::from_millis(400)).await;
    let stats = session.stats().await;
    assert_eq!(stats.samples_scored, 0);
    assert_eq!(stats.metrics.speech_clarity, 0.0);

    Ok(())
}

#[tokio::test]
async fn test_countdown_timeout_finishes_the_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(65.0));

    // One question with a 2-tick budget and a 25 ms countdown: the session
    // finishes on its own without a manual advance
    let session = live_session(Arc::clone(&store), scoring, 1, 2);
    session.start().await?;

    let mut finished = false;
    for _ in 0..200 {
        if session.stats().await.finished {
            finished = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(finished, "countdown should finish the session");

    let record = store
        .get_session(SessionMode::Behavioral, "test-session")
        .expect("auto-finished session should be persisted");
    assert!(record.ended_at.is_some());
    assert_eq!(record.rubric.expect("rubric").question_answers.len(), 1);
    assert_eq!(store.user_stats().completed, 1);

    Ok(())
}

#[tokio::test]
async fn test_media_access_error_surfaces_the_device_message() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(50.0));

    let backend = Box::new(
        SyntheticBackend::new(MediaBackendConfig::default())
            .with_start_failure("Permission denied by user"),
    );
    let capture = MediaCapture::new(backend, ChunkPolicy::default());
    let config = LiveConfig {
        session_id: "denied-session".to_string(),
        questions: prompts(1),
        ..Default::default()
    };
    let session = LiveInterview::new(config, capture, scoring, store);

    let err = session.start().await.expect_err("start must fail");
    assert!(
        err.to_string().contains("Permission denied by user"),
        "the underlying message must surface, got: {err}"
    );

    Ok(())
}

#[tokio::test]
async fn test_double_finalization_is_a_single_completion() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(LocalStore::open(temp_dir.path())?);
    let scoring = Arc::new(MockScoring::steady(70.0));

    let session = live_session(Arc::clone(&store), scoring, 1, 120);
    session.start().await?;

    assert_eq!(session.next_question().await?, Advance::Finished);
    // Stopping an already-finished session must not count it twice
    session.stop().await?;

    let stats = store.user_stats();
    assert_eq!(stats.completed, 1);

    Ok(())
}
