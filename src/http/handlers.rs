use super::state::AppState;
use crate::interview::{questions_for_session, Advance, LiveConfig, LiveInterview, LiveStats};
use crate::media::{ChunkPolicy, MediaBackendConfig, MediaBackendFactory, MediaCapture, MediaSource};
use crate::store::{Session, SessionMode, UserStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Optional session ID (if not provided, generate one)
    pub session_id: Option<String>,

    /// Practice mode (default: behavioral)
    pub mode: Option<SessionMode>,

    /// Media source: "device" or "synthetic" (default: device)
    pub source: Option<String>,

    /// Explicit question prompts; omitted means the stored session's
    /// behavioral questions, or the built-in defaults
    pub questions: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub status: String,
    pub question_count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NextQuestionResponse {
    pub session_id: String,
    pub status: String,
    pub question_index: Option<usize>,
    pub remaining_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StopInterviewResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    pub session: Session,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Start a new live interview session
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", Uuid::new_v4()));
    let mode = req.mode.unwrap_or(SessionMode::Behavioral);

    info!("Starting interview session: {}", session_id);

    // Check if already live
    {
        let live = state.live.read().await;
        if live.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} is already running", session_id),
                }),
            )
                .into_response();
        }
    }

    let source = match req.source.as_deref() {
        None => MediaSource::Device,
        Some(name) => match MediaSource::parse(name) {
            Some(source) => source,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Unknown media source: {}", name),
                    }),
                )
                    .into_response();
            }
        },
    };

    let questions = req
        .questions
        .filter(|qs| !qs.is_empty())
        .unwrap_or_else(|| questions_for_session(&state.store, mode, &session_id));

    let backend_config = MediaBackendConfig {
        video_width: state.config.capture.video_width,
        video_height: state.config.capture.video_height,
        sample_rate: state.config.capture.sample_rate,
        channels: state.config.capture.channels,
        ..Default::default()
    };

    let backend = match MediaBackendFactory::create(source, backend_config) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to create media backend: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let capture = MediaCapture::new(
        backend,
        ChunkPolicy {
            chunk_duration_ms: state.config.capture.chunk_duration_ms,
        },
    );

    let live_config = LiveConfig {
        session_id: session_id.clone(),
        mode,
        questions,
        question_duration_secs: state.config.interview.question_duration_secs,
        sample_interval: Duration::from_millis(state.config.scoring.sample_interval_ms),
        transcript_tail_chars: state.config.scoring.transcript_tail_chars,
        jpeg_quality: state.config.capture.jpeg_quality,
        smoothing_alpha: state.config.interview.smoothing_alpha,
        metric_history_cap: state.config.interview.metric_history_cap,
        ..Default::default()
    };

    let session = Arc::new(LiveInterview::new(
        live_config,
        capture,
        Arc::clone(&state.scoring),
        Arc::clone(&state.store),
    ));

    if let Err(e) = session.start().await {
        error!("Failed to start interview: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    let question_count = session.stats().await.question_count;

    {
        let mut live = state.live.write().await;
        live.insert(session_id.clone(), session);
    }

    info!("Interview session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            session_id: session_id.clone(),
            status: "running".to_string(),
            question_count,
            message: format!("Interview started for session {}", session_id),
        }),
    )
        .into_response()
}

/// POST /interviews/next/:session_id
/// Manually advance to the next question
pub async fn next_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = {
        let live = state.live.read().await;
        live.get(&session_id).cloned()
    };

    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response();
    };

    match session.next_question().await {
        Ok(advance) => {
            let stats = session.stats().await;
            let status = match advance {
                Advance::Question(_) => "running",
                Advance::Finished => "finished",
            };
            (
                StatusCode::OK,
                Json(NextQuestionResponse {
                    session_id,
                    status: status.to_string(),
                    question_index: stats.question_index,
                    remaining_secs: stats.remaining_secs,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to advance question: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /interviews/stop/:session_id
/// Finish a session and persist its record
pub async fn stop_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping interview session: {}", session_id);

    // Find and remove the session
    let session = {
        let mut live = state.live.write().await;
        live.remove(&session_id)
    };

    match session {
        Some(session) => match session.stop().await {
            Ok(record) => {
                info!("Interview session stopped: {}", session_id);
                (
                    StatusCode::OK,
                    Json(StopInterviewResponse {
                        session_id,
                        status: "stopped".to_string(),
                        message: "Interview finished and saved".to_string(),
                        session: record,
                    }),
                )
                    .into_response()
            }
            Err(e) => {
                error!("Failed to stop interview: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
                    .into_response()
            }
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /interviews/:session_id/status
pub async fn interview_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let live = state.live.read().await;

    match live.get(&session_id) {
        Some(session) => {
            let stats: LiveStats = session.stats().await;
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /interviews/:session_id/transcript
pub async fn interview_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let live = state.live.read().await;

    match live.get(&session_id) {
        Some(session) => {
            let transcript = session.transcript().await;
            (
                StatusCode::OK,
                Json(TranscriptResponse {
                    session_id,
                    transcript,
                }),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /sessions/:mode
/// Stored session records for a mode, most recent first
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> impl IntoResponse {
    match SessionMode::parse(&mode) {
        Some(mode) => {
            let sessions = state.store.sessions(mode);
            (StatusCode::OK, Json(sessions)).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown mode: {}", mode),
            }),
        )
            .into_response(),
    }
}

/// GET /stats
/// Aggregate practice counters
pub async fn user_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats: UserStats = state.store.user_stats();
    (StatusCode::OK, Json(stats)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
